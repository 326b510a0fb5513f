//! Backend deployment descriptors
//!
//! The service under test exists as two deployments behind the same
//! protocol, differing only in the storage implementation that enforces the
//! balance. Each is identified by its two endpoints.

/// One deployment of the charge service.
///
/// Constructed once at startup and shared read-only across all trials;
/// nothing in the harness mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    /// Label used in progress output and failure diagnostics
    pub name: String,
    /// Endpoint that applies one charge against the balance
    pub charge_url: String,
    /// Endpoint that restores the balance to its initial value
    pub reset_url: String,
}

impl Backend {
    /// Create a new backend descriptor
    pub fn new(
        name: impl Into<String>,
        charge_url: impl Into<String>,
        reset_url: impl Into<String>,
    ) -> Self {
        Backend {
            name: name.into(),
            charge_url: charge_url.into(),
            reset_url: reset_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_creation() {
        let backend = Backend::new(
            "fast",
            "http://127.0.0.1:8080/charge",
            "http://127.0.0.1:8080/reset",
        );
        assert_eq!(backend.name, "fast");
        assert_eq!(backend.charge_url, "http://127.0.0.1:8080/charge");
        assert_eq!(backend.reset_url, "http://127.0.0.1:8080/reset");
    }
}
