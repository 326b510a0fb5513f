//! Trial execution
//!
//! One trial resets the backend to known state, releases a burst of
//! simultaneous charge calls, and checks the aggregated outcome against the
//! expected admission count. The burst is held at a barrier until every task
//! has arrived, so the calls hit the backend together instead of as a
//! staggered sequence — the property under test is the backend's behavior
//! under actual contention.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Barrier;

use crate::backend::Backend;
use crate::client::{ChargeClient, ChargeResponse, ClientError};

/// Configuration for a single trial
#[derive(Clone, Debug)]
pub struct TrialConfig {
    /// Number of charge calls released simultaneously
    pub concurrency: usize,
    /// Number of those calls the backend must admit
    pub expected_authorized: u32,
}

impl Default for TrialConfig {
    /// 21 simultaneous attempts against a balance that covers exactly 20
    /// charges, so exactly one must be rejected.
    fn default() -> Self {
        TrialConfig {
            concurrency: 21,
            expected_authorized: 20,
        }
    }
}

/// Outcome counters shared by the concurrent charge tasks of one trial.
///
/// Tasks only ever increment; the runner reads the totals after every task
/// has joined, which happens-after every increment.
#[derive(Debug, Default)]
pub struct TrialAggregate {
    authorized: AtomicU32,
    negative_balance: AtomicU32,
}

impl TrialAggregate {
    /// Fold one decoded charge response into the counters.
    ///
    /// The two checks are independent: a single response may bump both
    /// counters, either one, or neither.
    pub fn record(&self, response: &ChargeResponse) {
        if response.is_authorized {
            self.authorized.fetch_add(1, Ordering::SeqCst);
        }
        if response.remaining_balance < 0 {
            self.negative_balance.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Number of attempts the backend admitted
    pub fn authorized(&self) -> u32 {
        self.authorized.load(Ordering::SeqCst)
    }

    /// Number of responses that reported a negative remaining balance
    pub fn negative_balance(&self) -> u32 {
        self.negative_balance.load(Ordering::SeqCst)
    }
}

/// A detected correctness failure of the backend under test.
///
/// A single observed violation is conclusive evidence of a race or logic
/// defect in the backend; it is never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The admitted count differed from the expected admission count
    #[error("expected {expected} authorized charges, got {observed}")]
    AuthorizedCount { expected: u32, observed: u32 },
    /// At least one response reported a balance below zero
    #[error("expected no negative balances, got {observed}")]
    NegativeBalance { observed: u32 },
}

/// Error from one trial.
///
/// `Client` is a harness-side fatal condition; `Invariant` is a verdict on
/// the backend. Both abort the enclosing campaign.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    /// A charge task panicked or was cancelled before completing
    #[error("charge task failed to complete: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Counters observed by one passing trial
#[derive(Debug, Clone)]
pub struct TrialReport {
    pub authorized: u32,
    pub negative_balance: u32,
    pub duration: Duration,
}

/// Run one trial against a backend: reset, burst, check.
///
/// The reset is awaited before any task is spawned, so every task observes
/// the same post-reset balance. Each task then parks at the release barrier
/// until the full set has arrived. The aggregate is inspected only after all
/// tasks have joined; no partial reads.
pub async fn run_trial(
    client: &ChargeClient,
    backend: &Backend,
    config: &TrialConfig,
) -> Result<TrialReport, TrialError> {
    let start = Instant::now();

    client.reset(backend).await?;

    let aggregate = Arc::new(TrialAggregate::default());
    let barrier = Arc::new(Barrier::new(config.concurrency));

    let mut handles = Vec::with_capacity(config.concurrency);
    for _ in 0..config.concurrency {
        let client = client.clone();
        let backend = backend.clone();
        let aggregate = Arc::clone(&aggregate);
        let barrier = Arc::clone(&barrier);

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let response = client.charge(&backend).await?;
            aggregate.record(&response);
            Ok::<(), ClientError>(())
        }));
    }

    for joined in futures::future::join_all(handles).await {
        joined??;
    }

    let authorized = aggregate.authorized();
    let negative_balance = aggregate.negative_balance();
    check_invariants(config, authorized, negative_balance)?;

    Ok(TrialReport {
        authorized,
        negative_balance,
        duration: start.elapsed(),
    })
}

/// The admitted count must match exactly and no balance may go negative.
fn check_invariants(
    config: &TrialConfig,
    authorized: u32,
    negative_balance: u32,
) -> Result<(), InvariantViolation> {
    if authorized != config.expected_authorized {
        return Err(InvariantViolation::AuthorizedCount {
            expected: config.expected_authorized,
            observed: authorized,
        });
    }
    if negative_balance != 0 {
        return Err(InvariantViolation::NegativeBalance {
            observed: negative_balance,
        });
    }
    Ok(())
}
