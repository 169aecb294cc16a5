//! Token storage in a kubeconfig-style YAML file.
//!
//! `metalctl login` stores the OIDC id-token under the user
//! `metal-stack-<context>` using the `oidc` auth-provider layout, so the
//! same file works with kubectl. Unrelated entries are preserved.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::ConfigError;

/// Kubeconfig user name for a metalctl context.
pub fn user_name(context: &str) -> String {
    format!("metal-stack-{context}")
}

/// Resolve the kubeconfig path: explicit, else first `$KUBECONFIG` entry,
/// else `$HOME/.kube/config`.
pub fn resolve_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(first) = std::env::var_os("KUBECONFIG")
        .as_deref()
        .and_then(|v| std::env::split_paths(v).next())
        .filter(|p| !p.as_os_str().is_empty())
    {
        return first;
    }
    BaseDirs::new().map_or_else(
        || PathBuf::from(".kube").join("config"),
        |dirs| dirs.home_dir().join(".kube").join("config"),
    )
}

/// OIDC provider settings stored next to the token.
#[derive(Debug, Clone, Default)]
pub struct OidcProvider<'a> {
    pub issuer_url: Option<&'a str>,
    pub client_id: Option<&'a str>,
    pub client_secret: Option<&'a str>,
}

fn read(path: &Path) -> Result<Option<Value>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => Ok(Some(serde_yaml::from_str(&raw)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::io(path, e)),
    }
}

fn users(doc: &Value) -> impl Iterator<Item = &Value> {
    doc.get("users")
        .and_then(Value::as_sequence)
        .into_iter()
        .flatten()
}

/// Read the id-token stored for `context`. A missing file or user is `None`.
pub fn read_id_token(path: &Path, context: &str) -> Result<Option<String>, ConfigError> {
    let Some(doc) = read(path)? else {
        return Ok(None);
    };
    let wanted = user_name(context);
    let token = users(&doc)
        .find(|u| u.get("name").and_then(Value::as_str) == Some(wanted.as_str()))
        .and_then(|u| u.get("user"))
        .and_then(|u| u.get("auth-provider"))
        .and_then(|p| p.get("config"))
        .and_then(|c| c.get("id-token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);
    Ok(token)
}

/// Store `token` for `context`, replacing any earlier entry for that user.
pub fn write_id_token(
    path: &Path,
    context: &str,
    token: &str,
    provider: &OidcProvider<'_>,
) -> Result<(), ConfigError> {
    let mut doc = read(path)?.unwrap_or_else(empty_kubeconfig);
    let name = user_name(context);

    let mut config = Mapping::new();
    config.insert("id-token".into(), token.into());
    if let Some(issuer) = provider.issuer_url {
        config.insert("idp-issuer-url".into(), issuer.into());
    }
    if let Some(client_id) = provider.client_id {
        config.insert("client-id".into(), client_id.into());
    }
    if let Some(secret) = provider.client_secret {
        config.insert("client-secret".into(), secret.into());
    }

    let mut auth_provider = Mapping::new();
    auth_provider.insert("name".into(), "oidc".into());
    auth_provider.insert("config".into(), Value::Mapping(config));
    let mut user = Mapping::new();
    user.insert("auth-provider".into(), Value::Mapping(auth_provider));
    let mut entry = Mapping::new();
    entry.insert("name".into(), name.as_str().into());
    entry.insert("user".into(), Value::Mapping(user));

    let users = users_mut(&mut doc)?;
    users.retain(|u| u.get("name").and_then(Value::as_str) != Some(name.as_str()));
    users.push(Value::Mapping(entry));

    write(path, &doc)
}

/// Remove the stored token for `context`. Returns whether an entry existed.
pub fn remove_user(path: &Path, context: &str) -> Result<bool, ConfigError> {
    let Some(mut doc) = read(path)? else {
        return Ok(false);
    };
    let name = user_name(context);
    let users = users_mut(&mut doc)?;
    let before = users.len();
    users.retain(|u| u.get("name").and_then(Value::as_str) != Some(name.as_str()));
    if users.len() == before {
        return Ok(false);
    }
    write(path, &doc)?;
    Ok(true)
}

fn empty_kubeconfig() -> Value {
    let mut doc = Mapping::new();
    doc.insert("apiVersion".into(), "v1".into());
    doc.insert("kind".into(), "Config".into());
    doc.insert("users".into(), Value::Sequence(Vec::new()));
    Value::Mapping(doc)
}

fn users_mut(doc: &mut Value) -> Result<&mut Vec<Value>, ConfigError> {
    let map = doc.as_mapping_mut().ok_or_else(|| ConfigError::Validation {
        field: "kubeconfig".into(),
        reason: "top level is not a mapping".into(),
    })?;
    let users = map
        .entry("users".into())
        .or_insert_with(|| Value::Sequence(Vec::new()));
    if users.is_null() {
        *users = Value::Sequence(Vec::new());
    }
    users.as_sequence_mut().ok_or_else(|| ConfigError::Validation {
        field: "kubeconfig users".into(),
        reason: "not a list".into(),
    })
}

fn write(path: &Path, doc: &Value) -> Result<(), ConfigError> {
    debug!(path = %path.display(), "writing kubeconfig");
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    let yaml = serde_yaml::to_string(doc)?;
    std::fs::write(path, yaml).map_err(|e| ConfigError::io(path, e))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kube").join("config");

        assert_eq!(read_id_token(&path, "prod").unwrap(), None);

        let provider = OidcProvider {
            issuer_url: Some("https://dex"),
            ..OidcProvider::default()
        };
        write_id_token(&path, "prod", "tok-1", &provider).unwrap();
        write_id_token(&path, "dev", "tok-dev", &provider).unwrap();
        write_id_token(&path, "prod", "tok-2", &provider).unwrap();

        assert_eq!(read_id_token(&path, "prod").unwrap().as_deref(), Some("tok-2"));
        assert_eq!(read_id_token(&path, "dev").unwrap().as_deref(), Some("tok-dev"));

        assert!(remove_user(&path, "prod").unwrap());
        assert!(!remove_user(&path, "prod").unwrap());
        assert_eq!(read_id_token(&path, "prod").unwrap(), None);
        assert_eq!(read_id_token(&path, "dev").unwrap().as_deref(), Some("tok-dev"));
    }

    #[test]
    fn foreign_entries_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(
            &path,
            "apiVersion: v1\nkind: Config\nclusters:\n- name: k8s\nusers:\n- name: admin\n  user:\n    token: abc\n",
        )
        .unwrap();

        write_id_token(&path, "prod", "tok", &OidcProvider::default()).unwrap();

        let doc: Value = serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["clusters"][0]["name"].as_str(), Some("k8s"));
        assert_eq!(doc["users"].as_sequence().unwrap().len(), 2);
    }
}
