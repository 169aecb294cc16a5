//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `ConfigError` and API errors into user-facing errors
//! with actionable help text. Every error exits the process with 1.

use miette::Diagnostic;
use thiserror::Error;

use metalctl_config::ConfigError;
use metalctl_core::CoreError;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("no API URL configured")]
    #[diagnostic(
        code(metalctl::no_api_url),
        help(
            "Add a context with: metalctl context add <name> --url <api-url>\n\
             Or pass --api-url / set METALCTL_API_URL."
        )
    )]
    NoApiUrl,

    #[error("request to the metal-api failed")]
    #[diagnostic(code(metalctl::api))]
    Api(#[source] metal_api::Error),

    // ── Authentication ───────────────────────────────────────────────
    #[error("authentication failed: {message}")]
    #[diagnostic(
        code(metalctl::auth_failed),
        help("Check your token with: metalctl whoami\nRefresh it with: metalctl login")
    )]
    AuthFailed { message: String },

    #[error("no token available for context '{context}'")]
    #[diagnostic(
        code(metalctl::no_token),
        help("Log in with: metalctl login --token <id-token>\nOr pass --api-token.")
    )]
    NoToken { context: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("not found: {message}")]
    #[diagnostic(code(metalctl::not_found))]
    NotFound { message: String },

    #[error("already exists: {message}")]
    #[diagnostic(
        code(metalctl::conflict),
        help("Use `apply` to update entities that already exist.")
    )]
    Conflict { message: String },

    #[error("{operation} is not supported for {entity}")]
    #[diagnostic(code(metalctl::unsupported))]
    Unsupported {
        entity: &'static str,
        operation: &'static str,
    },

    #[error("{failed} of {total} document(s) failed to apply")]
    #[diagnostic(code(metalctl::apply_failed))]
    ApplyFailed { failed: usize, total: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("invalid value for {field}: {reason}")]
    #[diagnostic(code(metalctl::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(metalctl::engine))]
    Core(CoreError),

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(metalctl::config),
        help("List the configured contexts with: metalctl context list")
    )]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(metalctl::confirmation_required),
        help("Use --force to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresForce { action: String },

    #[error("aborted")]
    #[diagnostic(code(metalctl::aborted))]
    Aborted,

    #[error("failed to run {program}: {reason}")]
    #[diagnostic(code(metalctl::exec))]
    Exec { program: String, reason: String },

    // ── Output / IO ──────────────────────────────────────────────────
    #[error("rendering output failed: {0}")]
    #[diagnostic(code(metalctl::output))]
    Output(String),

    #[error("self-update failed: {0}")]
    #[diagnostic(code(metalctl::update))]
    Update(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── Lower-layer mappings ─────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { message } => Self::NotFound { message },
            CoreError::AlreadyExists { message } => Self::Conflict { message },
            CoreError::Unauthenticated { message } => Self::AuthFailed { message },
            CoreError::NotSupported { entity, operation } => {
                Self::Unsupported { entity, operation }
            }
            CoreError::InvalidArgument(reason) => Self::Validation {
                field: "argument".into(),
                reason,
            },
            CoreError::Remote(e) => Self::Api(e),
            other => Self::Core(other),
        }
    }
}

impl From<metal_api::Error> for CliError {
    fn from(err: metal_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<minijinja::Error> for CliError {
    fn from(err: minijinja::Error) -> Self {
        Self::Output(format!("template: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_and_not_found_keep_their_kind() {
        let err: CliError = metal_api::Error::Conflict {
            message: "exists".into(),
        }
        .into();
        assert!(matches!(err, CliError::Conflict { .. }));

        let err: CliError = CoreError::NotFound {
            message: "gone".into(),
        }
        .into();
        assert_eq!(err.to_string(), "not found: gone");
    }

    #[test]
    fn document_errors_stay_wrapped() {
        let err: CliError = CoreError::MissingId {
            index: 2,
            field: "id".into(),
        }
        .into();
        assert!(matches!(err, CliError::Core(_)));
        assert!(err.to_string().contains("document 2"));
    }
}
