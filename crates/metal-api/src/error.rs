use thiserror::Error;

/// Top-level error type for the `metal-api` crate.
///
/// HTTP status codes that the command engine branches on (409, 404) get
/// their own variants so callers never have to match on message text.
/// `metalctl-core` maps these into user-facing error kinds.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The API rejected the presented token or HMAC signature.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    /// A header value could not be built from the configured credentials.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("cannot build HTTP client: {0}")]
    ClientBuild(String),

    // ── Remote API ──────────────────────────────────────────────────
    /// The entity to create already exists (HTTP 409).
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The addressed entity does not exist (HTTP 404).
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Any other non-success answer from the API.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Local IO ────────────────────────────────────────────────────
    /// Reading a local file for upload failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error signals that the entity already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error a user may simply retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status code, where one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Conflict { .. } => Some(409),
            Self::NotFound { .. } => Some(404),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
