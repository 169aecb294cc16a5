// ── Config file discovery, loading and atomic saving ──

use std::io::Write;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use tracing::debug;

use crate::{ConfigError, ConfigFile};

/// Top-level keys that `METALCTL_*` variables may override.
const ENV_KEYS: &[&str] = &[
    "api-url",
    "api-token",
    "hmac",
    "output-format",
    "template",
    "no-headers",
    "debug",
    "force-color",
    "kubeconfig",
];

/// A config file together with where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// The file contents exactly as on disk (no env overlay), safe to save back.
    pub file: ConfigFile,
    /// The file that was read; `None` when no config file exists yet.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Where mutations are written: the loaded file, else the per-user default.
    pub fn save_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_config_path)
    }

    /// The file overlaid with `METALCTL_` environment variables.
    pub fn effective(&self) -> Result<ConfigFile, ConfigError> {
        Ok(Figment::from(Serialized::defaults(&self.file))
            .merge(
                Env::prefixed("METALCTL_")
                    .map(|k| k.as_str().replace('_', "-").into())
                    .only(ENV_KEYS),
            )
            .extract()?)
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = self.save_path();
        save(&self.file, &path)?;
        Ok(path)
    }
}

/// `$HOME/.metalctl/config.yaml`
pub fn default_config_path() -> PathBuf {
    BaseDirs::new().map_or_else(
        || PathBuf::from(".metalctl").join("config.yaml"),
        |dirs| dirs.home_dir().join(".metalctl").join("config.yaml"),
    )
}

/// Implicit config locations, highest priority first.
pub fn search_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/etc/metalctl/config.yaml"),
        default_config_path(),
        PathBuf::from("config.yaml"),
    ]
}

/// Load the config file.
///
/// An explicit path must exist and parse. Otherwise the first existing
/// search path is used, and no file at all yields an empty config.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(ConfigError::Missing { path: path.into() });
            }
            Some(path.to_path_buf())
        }
        None => search_paths().into_iter().find(|p| p.is_file()),
    };

    let Some(path) = path else {
        debug!("no config file found, using empty config");
        return Ok(LoadedConfig::default());
    };

    debug!(path = %path.display(), "loading config");
    let file: ConfigFile = Figment::from(Serialized::defaults(ConfigFile::default()))
        .merge(Yaml::file_exact(&path))
        .extract()?;

    Ok(LoadedConfig {
        file,
        path: Some(path),
    })
}

/// Write the config atomically: temp file in the target directory, then rename.
pub fn save(file: &ConfigFile, path: &Path) -> Result<(), ConfigError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;

    let yaml = serde_yaml::to_string(file)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| ConfigError::io(parent, e))?;
    tmp.write_all(yaml.as_bytes())
        .map_err(|e| ConfigError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| ConfigError::io(path, e.error))?;

    debug!(path = %path.display(), "config saved");
    Ok(())
}
