//! HTTP client for the charge service
//!
//! Wraps a reqwest HTTP client and enforces the strict response contract of
//! the charge endpoint. There are no retries anywhere: the invariant under
//! test concerns the backend's behavior under concurrency, and masking a
//! transport or protocol failure would invalidate the trial.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::backend::Backend;

/// Error from a single reset or charge call. Every variant is fatal for the
/// enclosing run.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection-level failure (refused, reset, timed out)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The endpoint answered with a status outside its contract
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The response body did not decode as the charge contract
    #[error("contract violation ({reason}) in response body: {body}")]
    Contract { body: String, reason: String },
}

/// Decoded charge response.
///
/// The contract is strict: exactly these three fields. Missing or unknown
/// fields fail the call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChargeResponse {
    /// Balance left after this attempt. Negative only when the backend's
    /// concurrency control admitted a charge it should have rejected.
    pub remaining_balance: i64,
    /// Amount applied by this attempt (0 when the attempt was rejected)
    pub charges: i64,
    /// Whether this attempt was admitted against the balance
    pub is_authorized: bool,
}

/// HTTP client shared by all concurrent charge tasks.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ChargeClient {
    http: reqwest::Client,
}

impl ChargeClient {
    /// Create a client. `request_timeout` bounds each individual call; with
    /// `None` only the transport's default connection handling applies, so a
    /// hung remote call blocks its trial indefinitely.
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(ChargeClient {
            http: builder.build()?,
        })
    }

    /// Reset the backend's balance and charge counters to their initial
    /// values.
    ///
    /// Any success status is accepted and the body is ignored. A non-success
    /// status is an error: the harness cannot tell a failed reset from a
    /// benign one, and running a trial against unknown state would be
    /// meaningless.
    pub async fn reset(&self, backend: &Backend) -> Result<(), ClientError> {
        let response = self.http.post(&backend.reset_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus { status, body });
        }
        Ok(())
    }

    /// Issue one charge attempt and decode the strict response contract.
    ///
    /// The full body is read before the status check so that every failure
    /// path carries the raw body as diagnostic.
    pub async fn charge(&self, backend: &Backend) -> Result<ChargeResponse, ClientError> {
        let response = self.http.post(&backend.charge_url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            return Err(ClientError::UnexpectedStatus { status, body });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Contract {
            body,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_response() {
        let body = r#"{"remainingBalance":95,"charges":5,"isAuthorized":true}"#;
        let response: ChargeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response,
            ChargeResponse {
                remaining_balance: 95,
                charges: 5,
                is_authorized: true,
            }
        );
    }

    #[test]
    fn test_decode_negative_balance() {
        let body = r#"{"remainingBalance":-5,"charges":5,"isAuthorized":true}"#;
        let response: ChargeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.remaining_balance, -5);
    }

    #[test]
    fn test_decode_rejects_extra_field() {
        let body = r#"{"remainingBalance":5,"charges":3,"isAuthorized":true,"extra":1}"#;
        let result = serde_json::from_str::<ChargeResponse>(body);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let body = r#"{"charges":3,"isAuthorized":true}"#;
        let result = serde_json::from_str::<ChargeResponse>(body);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_type() {
        let body = r#"{"remainingBalance":"95","charges":5,"isAuthorized":true}"#;
        let result = serde_json::from_str::<ChargeResponse>(body);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_creation() {
        assert!(ChargeClient::new(None).is_ok());
        assert!(ChargeClient::new(Some(Duration::from_secs(2))).is_ok());
    }
}
