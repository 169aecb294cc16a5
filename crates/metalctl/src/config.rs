//! Runtime configuration for one invocation.
//!
//! Built once from the global flags and the config file, then handed to
//! every command. Resolves the active context, the API endpoint and
//! credentials, and hands out clients and printers.

use std::path::PathBuf;

use secrecy::SecretString;
use tracing::debug;

use metal_api::{Credentials, MetalClient, TransportConfig, V2Client};
use metalctl_config::{ConfigError, ConfigFile, Context, LoadedConfig, kubeconfig};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{OutputSpec, Printer, should_color};

#[derive(Debug)]
pub struct Config {
    opts: GlobalOpts,
    loaded: LoadedConfig,
    /// The file with `METALCTL_*` overrides applied.
    file: ConfigFile,
    context: Option<(String, Context)>,
}

impl Config {
    pub fn new(opts: GlobalOpts) -> Result<Self, CliError> {
        let loaded = metalctl_config::load(opts.config.as_deref())?;
        let file = loaded.effective()?;
        let context = match file.active_context(opts.context.as_deref()) {
            Ok((name, ctx)) => Some((name.to_owned(), ctx.clone())),
            Err(ConfigError::NoContext) => None,
            Err(e) => return Err(e.into()),
        };
        debug!(
            path = ?loaded.path,
            context = context.as_ref().map(|(n, _)| n.as_str()),
            "configuration loaded"
        );
        Ok(Self {
            opts,
            loaded,
            file,
            context,
        })
    }

    /// Configuration for dynamic completion: environment and config file only.
    pub fn from_env() -> Result<Self, CliError> {
        Self::new(GlobalOpts::from_env())
    }

    /// The config file as on disk, for context mutations.
    pub fn loaded(&self) -> &LoadedConfig {
        &self.loaded
    }

    pub fn context_name(&self) -> Option<&str> {
        self.context.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref().map(|(_, ctx)| ctx)
    }

    pub fn force(&self) -> bool {
        self.opts.force
    }

    /// `--debug`, or `debug: true` in the config file.
    pub fn debug(&self) -> bool {
        self.opts.debug || self.file.debug.unwrap_or(false)
    }

    // ── Endpoint & credentials ───────────────────────────────────────

    pub fn api_url(&self) -> Option<String> {
        resolve_api_url(
            self.opts.api_url.as_deref(),
            self.file.api_url.as_deref(),
            self.context().map(|c| c.url.as_str()),
        )
    }

    pub fn kubeconfig_path(&self) -> PathBuf {
        kubeconfig::resolve_path(
            self.opts
                .kubeconfig
                .as_deref()
                .or(self.file.kubeconfig.as_deref()),
        )
    }

    /// Token precedence: flag or env, config default, context, then the
    /// id-token stored by `login` when the context uses OIDC.
    pub fn api_token(&self) -> Result<Option<SecretString>, CliError> {
        if let Some(token) = first_non_empty(&[
            self.opts.api_token.as_deref(),
            self.file.api_token.as_deref(),
        ]) {
            return Ok(Some(SecretString::from(token.to_owned())));
        }
        let Some((name, ctx)) = &self.context else {
            return Ok(None);
        };
        if let Some(token) = ctx.api_token() {
            return Ok(Some(token));
        }
        if ctx.has_oidc() {
            let path = self.kubeconfig_path();
            debug!(path = %path.display(), context = %name, "reading OIDC token");
            return Ok(kubeconfig::read_id_token(&path, name)?.map(SecretString::from));
        }
        Ok(None)
    }

    fn hmac(&self) -> Option<SecretString> {
        first_non_empty(&[self.opts.hmac.as_deref(), self.file.hmac.as_deref()])
            .map(|h| SecretString::from(h.to_owned()))
            .or_else(|| self.context().and_then(Context::hmac))
    }

    pub fn credentials(&self) -> Result<Credentials, CliError> {
        Ok(Credentials::resolve(
            self.api_token()?,
            self.hmac(),
            self.context().and_then(|c| c.hmac_auth_type.clone()),
        ))
    }

    pub fn transport() -> TransportConfig {
        TransportConfig::default().with_user_agent(concat!("metalctl/", env!("CARGO_PKG_VERSION")))
    }

    pub fn client(&self) -> Result<MetalClient, CliError> {
        let url = self.api_url().ok_or(CliError::NoApiUrl)?;
        debug!(%url, "building metal-api client");
        Ok(MetalClient::new(
            &url,
            self.credentials()?,
            &Self::transport(),
        )?)
    }

    /// The v2 client, when a v2 URL is configured.
    pub fn v2_client(&self) -> Result<Option<V2Client>, CliError> {
        let Some(url) = first_non_empty(&[
            self.opts.api_v2_url.as_deref(),
            self.context().and_then(|c| c.api_v2_url.as_deref()),
        ]) else {
            return Ok(None);
        };
        let token = match first_non_empty(&[self.opts.api_v2_token.as_deref()]) {
            Some(t) => Some(SecretString::from(t.to_owned())),
            None => match self.context().and_then(Context::api_v2_token) {
                Some(t) => Some(t),
                None => self.api_token()?,
            },
        };
        debug!(%url, "building v2 client");
        Ok(Some(V2Client::new(url, token, &Self::transport())?))
    }

    // ── Output ───────────────────────────────────────────────────────

    fn output_spec(&self, fallback: OutputFormat) -> OutputSpec {
        let template = self
            .opts
            .template
            .clone()
            .or_else(|| self.file.template.clone());
        let configured = self.opts.output_format.or_else(|| {
            self.file
                .output_format
                .as_deref()
                .and_then(OutputFormat::parse_config)
        });
        let format = configured.unwrap_or(if template.is_some() {
            OutputFormat::Template
        } else {
            fallback
        });
        OutputSpec {
            format,
            template,
            no_headers: self.opts.no_headers || self.file.no_headers.unwrap_or(false),
            color: should_color(self.opts.force_color.or(self.file.force_color)),
        }
    }

    /// Printer for lists and command results; tables by default.
    pub fn printer(&self) -> Printer {
        Printer::new(self.output_spec(OutputFormat::Table))
    }

    /// Printer for `describe`; YAML unless a format was chosen.
    pub fn describe_printer(&self) -> Printer {
        Printer::new(self.output_spec(OutputFormat::Yaml))
    }
}

/// API URL precedence: flag or env, then config `api-url`, then the context.
pub fn resolve_api_url(
    flag_or_env: Option<&str>,
    config: Option<&str>,
    context: Option<&str>,
) -> Option<String> {
    first_non_empty(&[flag_or_env, config, context]).map(str::to_owned)
}

fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_precedence() {
        let ctx = Some("https://ctx");
        assert_eq!(
            resolve_api_url(Some("https://flag"), Some("https://cfg"), ctx).as_deref(),
            Some("https://flag")
        );
        assert_eq!(
            resolve_api_url(None, Some("https://cfg"), ctx).as_deref(),
            Some("https://cfg")
        );
        assert_eq!(resolve_api_url(None, Some(""), ctx).as_deref(), Some("https://ctx"));
        assert_eq!(resolve_api_url(None, None, None), None);
    }
}
