//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use crm_config::ConfigError;
use crm_core::{CoreError, ValidationErrors};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Requests ─────────────────────────────────────────────────────

    /// Any failed backend request. The message stays generic; `reason`
    /// is attached as help text at `-v` and above.
    #[error("An error has occurred.")]
    #[diagnostic(code(crm::request_failed))]
    RequestFailed {
        #[help]
        reason: Option<String>,
    },

    #[error("Operation cancelled")]
    #[diagnostic(code(crm::cancelled))]
    Cancelled,

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid contact")]
    #[diagnostic(code(crm::invalid_contact), help("{details}"))]
    InvalidContact { details: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(crm::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(crm::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: crm config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(crm::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidContact { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Drop the request failure reason, leaving only the generic message.
    pub fn without_detail(self) -> Self {
        match self {
            Self::RequestFailed { .. } => Self::RequestFailed { reason: None },
            other => other,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ValidationErrors> for CliError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Self::InvalidContact { details }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RequestFailed { message } => Self::RequestFailed {
                reason: Some(message),
            },
            CoreError::Validation(errors) => errors.into(),
            CoreError::Config { message } => Self::Validation {
                field: "backend".into(),
                reason: message,
            },
            CoreError::Shutdown => Self::Cancelled,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crm_core::Contact;

    use super::*;

    #[test]
    fn request_failures_read_generically() {
        let err = CliError::from(CoreError::RequestFailed {
            message: "HTTP 500".into(),
        });
        assert_eq!(err.to_string(), "An error has occurred.");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert!(matches!(
            err.without_detail(),
            CliError::RequestFailed { reason: None }
        ));
    }

    #[test]
    fn validation_lists_every_field() {
        let Err(errors) = Contact::new("Al", "", "nope").validate() else {
            panic!("expected validation failure");
        };
        let err = CliError::from(CoreError::Validation(errors));
        assert_eq!(err.exit_code(), exit_code::USAGE);
        let CliError::InvalidContact { details } = err else {
            panic!("expected InvalidContact");
        };
        assert_eq!(details.lines().count(), 3);
        assert!(details.contains("last_name is a required field"));
    }
}
