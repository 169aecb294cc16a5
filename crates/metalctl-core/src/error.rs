// ── Core error types ──
//
// What the command engine reports to the CLI. Transport errors from
// metal-api are translated so that callers branch on kinds
// (`AlreadyExists`, `NotFound`) and never on HTTP status codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── User input ───────────────────────────────────────────────────
    #[error("{0}")]
    InvalidArgument(String),

    #[error("document {index}: {message}")]
    Decode { index: usize, message: String },

    #[error("document {index} does not exist, the stream has {len} document(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("document {index} has no '{field}' to identify the entity")]
    MissingId { index: usize, field: String },

    // ── Remote outcomes ──────────────────────────────────────────────
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("already exists: {message}")]
    AlreadyExists { message: String },

    #[error("authentication failed: {message}")]
    Unauthenticated { message: String },

    #[error("{operation} is not supported for {entity}")]
    NotSupported {
        entity: &'static str,
        operation: &'static str,
    },

    #[error("API request failed: {0}")]
    Remote(#[source] metal_api::Error),

    // ── Local ────────────────────────────────────────────────────────
    #[error("editor failed: {0}")]
    Editor(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// An error raised while processing one document of a bulk stream.
    #[error("document {index}: {source}")]
    Document {
        index: usize,
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn at(index: usize, err: Self) -> Self {
        Self::Document {
            index,
            source: Box::new(err),
        }
    }

    /// The innermost error, looking through document wrappers.
    pub fn root(&self) -> &Self {
        match self {
            Self::Document { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self.root(), Self::AlreadyExists { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }

    /// HTTP status of the underlying API error, where known.
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::AlreadyExists { .. } => Some(409),
            Self::NotFound { .. } => Some(404),
            Self::Remote(e) => e.status(),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<metal_api::Error> for CoreError {
    fn from(err: metal_api::Error) -> Self {
        match err {
            metal_api::Error::Conflict { message } => Self::AlreadyExists { message },
            metal_api::Error::NotFound { message } => Self::NotFound { message },
            metal_api::Error::Authentication { message, .. } => Self::Unauthenticated { message },
            other => Self::Remote(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_becomes_already_exists() {
        let err: CoreError = metal_api::Error::Conflict {
            message: "exists".into(),
        }
        .into();
        assert!(err.is_already_exists());
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn document_wrapper_is_transparent_for_kinds() {
        let inner: CoreError = metal_api::Error::NotFound {
            message: "gone".into(),
        }
        .into();
        let err = CoreError::at(3, inner);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document 3: not found: gone");
    }
}
