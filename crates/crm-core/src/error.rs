// ── Core error types ──
//
// User-facing errors from crm-core. Consumers never see HTTP status codes
// or JSON parse failures: every transport-layer failure collapses into
// `RequestFailed`, which is all the view layer needs to render an error.

use thiserror::Error;

use crate::model::ValidationErrors;

/// Unified error type for the core crate.
///
/// `Clone` so a single failure can be shared by every subscriber of a
/// cache entry.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Request errors ───────────────────────────────────────────────
    /// Any non-2xx response, transport failure, or undecodable body.
    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Invalid contact: {0}")]
    Validation(#[from] ValidationErrors),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Cache store has been shut down")]
    Shutdown,
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<crm_api::Error> for CoreError {
    fn from(err: crm_api::Error) -> Self {
        match err {
            crm_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid backend URL: {e}"),
            },
            crm_api::Error::Tls(message) => CoreError::Config { message },
            other if other.is_unreachable() => CoreError::RequestFailed {
                message: format!("backend unreachable: {other}"),
            },
            other => CoreError::RequestFailed {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_failures_collapse_into_request_failed() {
        let err = CoreError::from(crm_api::Error::RequestFailed { status: 404 });
        assert!(matches!(err, CoreError::RequestFailed { .. }));

        let err = CoreError::from(crm_api::Error::RequestFailed { status: 503 });
        assert!(matches!(err, CoreError::RequestFailed { .. }));
    }

    #[test]
    fn decoding_failures_are_request_failures() {
        let err = CoreError::from(crm_api::Error::Deserialization {
            message: "expected a sequence".into(),
            body: "{}".into(),
        });
        assert!(matches!(err, CoreError::RequestFailed { .. }));
    }

    #[test]
    fn client_construction_failures_are_config_errors() {
        let err = CoreError::from(crm_api::Error::Tls("invalid CA cert".into()));
        assert!(matches!(err, CoreError::Config { .. }));
    }
}
