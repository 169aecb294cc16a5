//! Configuration for metalctl.
//!
//! A YAML file of named endpoint contexts plus top-level defaults,
//! layered with `METALCTL_` environment variables, and the
//! kubeconfig-style token file written by `metalctl login`. The CLI adds
//! flag-aware resolution on top.

mod context;
pub mod kubeconfig;
mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use context::{ConfigFile, Context};
pub use store::{LoadedConfig, default_config_path, load, save, search_paths};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path} does not exist")]
    Missing { path: PathBuf },

    #[error("context '{name}' not found")]
    UnknownContext { name: String },

    #[error("context '{name}' already exists")]
    DuplicateContext { name: String },

    #[error("no previous context to switch to")]
    NoPreviousContext,

    #[error("no context configured; add one with `metalctl context add`")]
    NoContext,

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
