// ── Config file model and context mutations ──

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Top-level YAML configuration.
///
/// Besides the context map, a handful of top-level keys act as defaults
/// for the matching global flags (`api-url`, `output-format`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub previous: String,

    #[serde(default)]
    pub contexts: BTreeMap<String, Context>,

    // ── Flag defaults ──
    #[serde(rename = "api-url", default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(rename = "api-token", default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmac: Option<String>,

    #[serde(rename = "output-format", default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(rename = "no-headers", default, skip_serializing_if = "Option::is_none")]
    pub no_headers: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,

    #[serde(rename = "force-color", default, skip_serializing_if = "Option::is_none")]
    pub force_color: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<String>,
}

/// A named API endpoint with its credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Context {
    pub url: String,

    #[serde(rename = "api-v2-url", default, skip_serializing_if = "Option::is_none")]
    pub api_v2_url: Option<String>,

    #[serde(rename = "issuer_url", default, skip_serializing_if = "Option::is_none")]
    pub oidc_issuer_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmac: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmac_auth_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_v2_token: Option<String>,
}

impl Context {
    pub fn api_token(&self) -> Option<SecretString> {
        non_empty_secret(self.api_token.as_deref())
    }

    pub fn api_v2_token(&self) -> Option<SecretString> {
        non_empty_secret(self.api_v2_token.as_deref())
    }

    pub fn hmac(&self) -> Option<SecretString> {
        non_empty_secret(self.hmac.as_deref())
    }

    /// OIDC is configured when the context names an issuer.
    pub fn has_oidc(&self) -> bool {
        self.oidc_issuer_url.as_deref().is_some_and(|s| !s.is_empty())
    }
}

fn non_empty_secret(value: Option<&str>) -> Option<SecretString> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| SecretString::from(v.to_owned()))
}

impl ConfigFile {
    /// Resolve the active context: explicit override, else `current`.
    pub fn active_context(&self, name_override: Option<&str>) -> Result<(&str, &Context), ConfigError> {
        let name = match name_override.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None if self.current.is_empty() => return Err(ConfigError::NoContext),
            None => self.current.as_str(),
        };
        self.contexts
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownContext { name: name.into() })
    }

    /// Make `name` the current context; `-` swaps current and previous.
    pub fn set_current(&mut self, name: &str) -> Result<(), ConfigError> {
        if name == "-" {
            if self.previous.is_empty() {
                return Err(ConfigError::NoPreviousContext);
            }
            std::mem::swap(&mut self.current, &mut self.previous);
            return Ok(());
        }

        if !self.contexts.contains_key(name) {
            return Err(ConfigError::UnknownContext { name: name.into() });
        }
        if self.current == name {
            return Ok(());
        }
        self.previous = std::mem::replace(&mut self.current, name.to_owned());
        Ok(())
    }

    /// Add a new context, optionally activating it.
    pub fn add_context(
        &mut self,
        name: &str,
        context: Context,
        activate: bool,
    ) -> Result<(), ConfigError> {
        if name.is_empty() || name == "-" {
            return Err(ConfigError::Validation {
                field: "name".into(),
                reason: format!("'{name}' is not a valid context name"),
            });
        }
        if context.url.is_empty() {
            return Err(ConfigError::Validation {
                field: "url".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.contexts.contains_key(name) {
            return Err(ConfigError::DuplicateContext { name: name.into() });
        }
        self.contexts.insert(name.to_owned(), context);
        if activate || self.current.is_empty() {
            self.set_current(name)?;
        }
        Ok(())
    }

    /// Remove a context; pointers referencing it are cleared.
    pub fn remove_context(&mut self, name: &str) -> Result<Context, ConfigError> {
        let removed = self
            .contexts
            .remove(name)
            .ok_or_else(|| ConfigError::UnknownContext { name: name.into() })?;
        if self.current == name {
            self.current.clear();
        }
        if self.previous == name {
            self.previous.clear();
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn ctx(url: &str) -> Context {
        Context {
            url: url.into(),
            ..Context::default()
        }
    }

    fn two_contexts() -> ConfigFile {
        let mut cfg = ConfigFile::default();
        cfg.contexts.insert("a".into(), ctx("https://a"));
        cfg.contexts.insert("b".into(), ctx("https://b"));
        cfg.current = "b".into();
        cfg
    }

    #[test]
    fn set_then_dash_restores_current() {
        let mut cfg = two_contexts();

        cfg.set_current("a").unwrap();
        assert_eq!(cfg.current, "a");
        assert_eq!(cfg.previous, "b");

        cfg.set_current("-").unwrap();
        assert_eq!(cfg.current, "b");
        assert_eq!(cfg.previous, "a");
    }

    #[test]
    fn dash_without_previous_fails() {
        let mut cfg = two_contexts();
        assert!(matches!(
            cfg.set_current("-"),
            Err(ConfigError::NoPreviousContext)
        ));
    }

    #[test]
    fn set_unknown_context_fails() {
        let mut cfg = two_contexts();
        assert!(matches!(
            cfg.set_current("zzz"),
            Err(ConfigError::UnknownContext { .. })
        ));
        assert_eq!(cfg.current, "b");
    }

    #[test]
    fn remove_clears_pointers() {
        let mut cfg = two_contexts();
        cfg.set_current("a").unwrap();

        cfg.remove_context("b").unwrap();
        assert_eq!(cfg.current, "a");
        assert_eq!(cfg.previous, "");

        cfg.remove_context("a").unwrap();
        assert_eq!(cfg.current, "");
        assert!(cfg.contexts.is_empty());
    }

    #[test]
    fn first_added_context_becomes_current() {
        let mut cfg = ConfigFile::default();
        cfg.add_context("dev", ctx("https://dev"), false).unwrap();
        assert_eq!(cfg.current, "dev");

        cfg.add_context("prod", ctx("https://prod"), false).unwrap();
        assert_eq!(cfg.current, "dev");

        assert!(matches!(
            cfg.add_context("prod", ctx("https://x"), false),
            Err(ConfigError::DuplicateContext { .. })
        ));
    }

    #[test]
    fn active_context_honors_override() {
        let cfg = two_contexts();
        assert_eq!(cfg.active_context(None).unwrap().0, "b");
        assert_eq!(cfg.active_context(Some("a")).unwrap().1.url, "https://a");
        assert!(ConfigFile::default().active_context(None).is_err());
    }

    #[test]
    fn yaml_keys_match_file_format() {
        let yaml = r"
current: prod
contexts:
  prod:
    url: https://api.example.com/metal
    api-v2-url: https://v2.example.com
    issuer_url: https://dex.example.com
    client_id: metal
    hmac_auth_type: Metal-View
api-url: https://override
no-headers: true
";
        let cfg: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        let prod = &cfg.contexts["prod"];

        assert_eq!(prod.api_v2_url.as_deref(), Some("https://v2.example.com"));
        assert!(prod.has_oidc());
        assert_eq!(cfg.api_url.as_deref(), Some("https://override"));
        assert_eq!(cfg.no_headers, Some(true));
    }
}
