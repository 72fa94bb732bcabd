// Rust guideline compliant 2026-10-16

//! Producer component -- generates synthetic transfer events and submits them
//! to a `TransferSink` port.
//!
//! Most events are random transfers between distinct accounts; with a
//! configurable probability the producer instead plays out a ping-pong burst
//! between two accounts so downstream detectors have something to find.
//!
//! Entry points: [`Producer::generate_event`], [`Producer::produce_once`],
//! [`Producer::run`]. Configuration via [`ProducerConfig::builder`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use domain::{IngestError, TransferSink};
use rand::{Rng, SeedableRng, rngs::StdRng};

// ---------------------------------------------------------------------------
// ProducerError
// ---------------------------------------------------------------------------

/// Errors that can occur during transfer production.
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    /// The supplied configuration is invalid.
    #[error("invalid producer configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The sink rejected a submitted event.
    #[error("submit error: {source}")]
    Submit {
        /// The underlying ingestion error.
        #[from]
        source: IngestError,
    },
}

// ---------------------------------------------------------------------------
// ProducerConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`Producer`].
///
/// Construct via [`ProducerConfig::builder`].
#[derive(Debug)]
pub struct ProducerConfig {
    /// Size of the synthetic account population (`ACC-000` ..).
    pub n_accounts: usize,
    /// Delay between successive events.
    pub poll_interval: Duration,
    /// Optional upper bound on the number of events. `None` means infinite.
    pub iterations: Option<u64>,
    /// Optional RNG seed for reproducible events. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Probability that a fresh event starts a ping-pong burst.
    pub burst_probability: f64,
}

/// Builder for [`ProducerConfig`].
///
/// Obtain via [`ProducerConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct ProducerConfigBuilder {
    n_accounts: usize,
    poll_interval: Duration,
    iterations: Option<u64>,
    seed: Option<u64>,
    burst_probability: f64,
}

impl ProducerConfig {
    /// Create a builder. `n_accounts` is the only required parameter.
    ///
    /// Default values: `poll_interval = 100 ms`, `iterations = None`,
    /// `seed = None`, `burst_probability = 0.02`.
    #[must_use]
    pub fn builder(n_accounts: usize) -> ProducerConfigBuilder {
        ProducerConfigBuilder {
            n_accounts,
            // 100 ms chosen as a reasonable demo cadence; lower for tests.
            poll_interval: Duration::from_millis(100),
            iterations: None,
            seed: None,
            burst_probability: 0.02,
        }
    }
}

impl ProducerConfigBuilder {
    /// Override the inter-event delay.
    #[must_use]
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set a finite event count. Without this the producer runs until its
    /// future is dropped or a submit fails.
    #[must_use]
    pub fn iterations(mut self, n: u64) -> Self {
        self.iterations = Some(n);
        self
    }

    /// Fix the RNG seed for deterministic output (useful in tests).
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Override the probability that an event starts a ping-pong burst.
    #[must_use]
    pub fn burst_probability(mut self, p: f64) -> Self {
        self.burst_probability = p;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProducerError::InvalidConfig`] when `n_accounts < 2` or
    /// `burst_probability` is outside `[0, 1]`.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ProducerConfig, ProducerError> {
        if self.n_accounts < 2 {
            return Err(ProducerError::InvalidConfig {
                reason: "n_accounts must be >= 2".to_owned(),
            });
        }
        if !(0.0..=1.0).contains(&self.burst_probability) {
            return Err(ProducerError::InvalidConfig {
                reason: format!("burst_probability must be in [0, 1], got {}", self.burst_probability),
            });
        }
        Ok(ProducerConfig {
            n_accounts: self.n_accounts,
            poll_interval: self.poll_interval,
            iterations: self.iterations,
            seed: self.seed,
            burst_probability: self.burst_probability,
        })
    }
}

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

/// Number of transfers in one ping-pong burst (alternating directions).
const BURST_LEN: usize = 6;

/// One synthetic transfer, not yet timestamped.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferEvent {
    /// Sender identifier.
    pub from: String,
    /// Receiver identifier.
    pub to: String,
    /// Amount in `[1.00, 2_000.00]`.
    pub amount: f64,
}

/// External identifier of synthetic account `index`.
#[must_use]
pub fn account_id(index: usize) -> String {
    format!("ACC-{index:03}")
}

/// Generates synthetic transfer events and forwards them to a [`TransferSink`].
///
/// Generic over `S: TransferSink` per call; holds no sink reference.
/// Events are timestamped with the wall clock at submission.
#[derive(Debug)]
pub struct Producer {
    config: ProducerConfig,
    /// Interior mutability required because all public methods take `&self`.
    rng: RefCell<StdRng>,
    /// Remaining events of a burst in progress.
    pending: RefCell<VecDeque<TransferEvent>>,
}

impl Producer {
    /// Create a new producer from `config`.
    ///
    /// Seeds the RNG from `config.seed` if set, otherwise from the OS.
    #[must_use]
    pub fn new(config: ProducerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng: RefCell::new(rng),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    /// Produce the next synthetic event.
    ///
    /// Drains a burst in progress first. Otherwise, with probability
    /// `burst_probability`, queues a fresh burst of alternating transfers
    /// between two accounts (amounts in `[1_000, 2_000]`); else returns one
    /// random transfer between two distinct accounts.
    #[must_use]
    pub fn generate_event(&self) -> TransferEvent {
        if let Some(event) = self.pending.borrow_mut().pop_front() {
            return event;
        }

        let mut rng = self.rng.borrow_mut();
        let (a, b) = self.random_pair(&mut rng);

        if rng.random_bool(self.config.burst_probability) {
            let mut burst: VecDeque<TransferEvent> = (0..BURST_LEN)
                .map(|i| {
                    let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
                    TransferEvent {
                        from: account_id(from),
                        to: account_id(to),
                        amount: random_amount(&mut rng, 100_000, 200_000),
                    }
                })
                .collect();
            tracing::debug!(from = %account_id(a), to = %account_id(b), "producer.burst.started");
            let first = burst.pop_front();
            *self.pending.borrow_mut() = burst;
            if let Some(first) = first {
                return first;
            }
        }

        TransferEvent {
            from: account_id(a),
            to: account_id(b),
            amount: random_amount(&mut rng, 100, 200_000),
        }
    }

    /// Two distinct account indices in `[0, n_accounts)`.
    fn random_pair(&self, rng: &mut StdRng) -> (usize, usize) {
        let from = rng.random_range(0..self.config.n_accounts);
        // Draw from n-1 slots and skip `from` so the pair is always distinct.
        let mut to = rng.random_range(0..self.config.n_accounts - 1);
        if to >= from {
            to += 1;
        }
        (from, to)
    }

    /// Generate one event and submit it to `sink`.
    ///
    /// # Errors
    ///
    /// Propagates any [`IngestError`] wrapped in [`ProducerError::Submit`].
    pub fn produce_once<S: TransferSink>(&self, sink: &S) -> Result<(), ProducerError> {
        let event = self.generate_event();
        let transfer = sink.submit(&event.from, &event.to, event.amount, Utc::now())?;
        tracing::debug!(seq = transfer.seq, from = %event.from, to = %event.to, amount = event.amount, "producer.event.submitted");
        Ok(())
    }

    /// Run the production loop until stopped.
    ///
    /// Calls [`produce_once`](Self::produce_once) repeatedly, sleeping
    /// `config.poll_interval` between events. Stops cleanly when
    /// `config.iterations` events have been submitted; otherwise runs until
    /// the returned future is dropped (e.g. by a `tokio::select!` on CTRL+C).
    ///
    /// # Errors
    ///
    /// Returns [`ProducerError::Submit`] on the first rejected event.
    pub async fn run<S: TransferSink>(&self, sink: &S) -> Result<(), ProducerError> {
        let mut count = 0u64;
        loop {
            self.produce_once(sink)?;

            count += 1;
            if count % 100 == 0 {
                tracing::info!(events = count, "producer.progress");
            }

            if let Some(max) = self.config.iterations
                && count >= max
            {
                tracing::info!(events = count, "producer.run.stopped: iteration limit reached");
                return Ok(());
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

/// Amount drawn as integer cents in `[lo_cents, hi_cents]`, then divided by 100.
///
/// Integer cents avoid float-rounding during generation; every value up to
/// 200_000 is exactly representable as `f64`.
fn random_amount(rng: &mut StdRng, lo_cents: u32, hi_cents: u32) -> f64 {
    f64::from(rng.random_range(lo_cents..=hi_cents)) / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
