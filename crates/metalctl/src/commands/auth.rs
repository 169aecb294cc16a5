//! `metalctl login`, `logout` and `whoami`

use std::io::{IsTerminal, Read};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use clap::{Arg, ArgMatches, Command};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use metalctl_config::kubeconfig::{self, OidcProvider};

use crate::commands::util::one;
use crate::config::Config;
use crate::error::CliError;
use crate::output::{Style, TableRow};

/// Claims of an id-token that matter to a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub iss: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Decode the payload of a JWT without verifying it.
pub fn decode_claims(token: &str) -> Result<TokenClaims, CliError> {
    let invalid = |reason: String| CliError::validation("token", reason);
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(invalid("not a JWT".into())),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| invalid(format!("payload is not base64: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| invalid(format!("payload is not JSON: {e}")))
}

impl TableRow for TokenClaims {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["SUBJECT", "NAME", "EMAIL", "EXPIRES"];
        if wide {
            header.extend(["ISSUER", "GROUPS"]);
        }
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let expires = match self.expires_at() {
            Some(at) if at <= Utc::now() => style.red(&format!("{} (expired)", at.to_rfc3339())),
            Some(at) => at.to_rfc3339(),
            None => String::new(),
        };
        let mut row = vec![
            self.sub.clone(),
            self.name.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
            expires,
        ];
        if wide {
            row.extend([self.iss.clone(), self.groups.join("\n")]);
        }
        row
    }
}

fn current_context(cfg: &Config) -> Result<&str, CliError> {
    cfg.context_name()
        .ok_or(CliError::Config(metalctl_config::ConfigError::NoContext))
}

pub fn login_command() -> Command {
    Command::new("login")
        .about("Store an OIDC id-token for the current context")
        .long_about(
            "Store an OIDC id-token in the kubeconfig user metal-stack-<context>.\n\n\
             Pass the token with --token or pipe it on stdin.",
        )
        .arg(
            Arg::new("token")
                .long("token")
                .value_name("ID-TOKEN")
                .help("The id-token, read from stdin when omitted"),
        )
}

pub fn run_login(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let context = current_context(cfg)?;
    let token = match one(m, "token") {
        Some(token) => token,
        None => {
            if std::io::stdin().is_terminal() {
                return Err(CliError::validation("token", "pass --token or pipe it on stdin"));
            }
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw.trim().to_owned()
        }
    };
    let claims = decode_claims(&token)?;

    let ctx = cfg.context();
    let provider = OidcProvider {
        issuer_url: ctx.and_then(|c| c.oidc_issuer_url.as_deref()),
        client_id: ctx.and_then(|c| c.client_id.as_deref()),
        client_secret: ctx.and_then(|c| c.client_secret.as_deref()),
    };
    let path = cfg.kubeconfig_path();
    debug!(path = %path.display(), context, "storing id-token");
    kubeconfig::write_id_token(&path, context, &token, &provider)?;
    eprintln!(
        "logged in as {} to context {context}",
        claims.name.as_deref().unwrap_or(&claims.sub)
    );
    Ok(())
}

pub fn logout_command() -> Command {
    Command::new("logout").about("Remove the stored id-token of the current context")
}

pub fn run_logout(cfg: &Config) -> Result<(), CliError> {
    let context = current_context(cfg)?;
    if kubeconfig::remove_user(&cfg.kubeconfig_path(), context)? {
        eprintln!("logged out of context {context}");
    } else {
        eprintln!("no token stored for context {context}");
    }
    Ok(())
}

pub fn whoami_command() -> Command {
    Command::new("whoami").about("Show the claims of the active token")
}

pub fn run_whoami(cfg: &Config) -> Result<(), CliError> {
    let token = cfg.api_token()?.ok_or_else(|| CliError::NoToken {
        context: cfg.context_name().unwrap_or("-").to_owned(),
    })?;
    let claims = decode_claims(token.expose_secret())?;
    cfg.describe_printer().print_one(&claims)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn claims_are_decoded_from_the_payload() {
        let token = jwt(
            r#"{"sub":"u-1","name":"Jo Doe","iss":"https://dex","groups":["admins"],"exp":1700000000}"#,
        );
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.name.as_deref(), Some("Jo Doe"));
        assert_eq!(claims.groups, vec!["admins"]);
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn claims_serialize_without_empty_fields() {
        let claims = TokenClaims {
            sub: "u-1".into(),
            iss: "https://dex".into(),
            ..TokenClaims::default()
        };
        insta::assert_json_snapshot!(claims, @r#"
        {
          "sub": "u-1",
          "iss": "https://dex"
        }
        "#);
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(decode_claims("abc").is_err());
        assert!(decode_claims("a.b.c.d").is_err());
        assert!(decode_claims("a.!!!.c").is_err());
    }

    #[test]
    fn expired_tokens_are_marked() {
        let claims = TokenClaims {
            sub: "u".into(),
            exp: Some(1),
            ..TokenClaims::default()
        };
        let row = claims.row(false, &Style::plain());
        assert!(row[3].ends_with("(expired)"));
    }
}
