//! Campaign execution
//!
//! A campaign runs trials back-to-back against one backend, emitting a
//! progress line at a fixed interval. There is no accumulation of failures:
//! the first trial that does not pass ends the campaign, carrying the
//! backend label and the failing trial index.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::backend::Backend;
use crate::client::ChargeClient;
use crate::runner::{run_trial, TrialConfig, TrialError};

/// Configuration for one campaign
#[derive(Clone, Debug)]
pub struct CampaignConfig {
    /// Number of trials to run
    pub trials: usize,
    /// Emit a progress line every this many trials (0 disables)
    pub progress_interval: usize,
    /// Per-trial settings
    pub trial: TrialConfig,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        CampaignConfig {
            trials: 100,
            progress_interval: 10,
            trial: TrialConfig::default(),
        }
    }
}

/// The first trial that did not pass, and why
#[derive(Debug, Error)]
#[error("trial {trial} against backend {backend}: {source}")]
pub struct CampaignError {
    /// Label of the backend the campaign ran against
    pub backend: String,
    /// Zero-based index of the failing trial
    pub trial: usize,
    #[source]
    pub source: TrialError,
}

/// Summary of a completed campaign
#[derive(Debug)]
pub struct CampaignReport {
    pub trials_run: usize,
    pub duration: Duration,
}

/// Run `config.trials` trials against one backend, stopping at the first
/// failure.
///
/// # Example
///
/// ```ignore
/// use charge_verifier::{run_campaign, Backend, CampaignConfig, ChargeClient};
///
/// let client = ChargeClient::new(None)?;
/// let backend = Backend::new(
///     "fast",
///     "http://127.0.0.1:8080/charge",
///     "http://127.0.0.1:8080/reset",
/// );
///
/// let report = run_campaign(&client, &backend, &CampaignConfig::default()).await?;
/// assert_eq!(report.trials_run, 100);
/// ```
pub async fn run_campaign(
    client: &ChargeClient,
    backend: &Backend,
    config: &CampaignConfig,
) -> Result<CampaignReport, CampaignError> {
    let start = Instant::now();

    for trial in 0..config.trials {
        if config.progress_interval != 0 && trial % config.progress_interval == 0 {
            info!(backend = %backend.name, trial, "iteration");
        }

        run_trial(client, backend, &config.trial)
            .await
            .map_err(|source| CampaignError {
                backend: backend.name.clone(),
                trial,
                source,
            })?;
    }

    Ok(CampaignReport {
        trials_run: config.trials,
        duration: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::InvariantViolation;

    #[test]
    fn test_config_default() {
        let config = CampaignConfig::default();
        assert_eq!(config.trials, 100);
        assert_eq!(config.progress_interval, 10);
        assert_eq!(config.trial.concurrency, 21);
    }

    #[test]
    fn test_error_names_backend_and_trial() {
        let error = CampaignError {
            backend: "fast".to_string(),
            trial: 7,
            source: TrialError::Invariant(InvariantViolation::AuthorizedCount {
                expected: 20,
                observed: 21,
            }),
        };
        let message = error.to_string();
        assert!(message.contains("trial 7"));
        assert!(message.contains("fast"));
    }
}
