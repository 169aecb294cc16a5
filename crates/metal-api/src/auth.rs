use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::Error;

/// Header carrying the signing timestamp for HMAC requests.
pub const DATE_HEADER: &str = "X-Date";

/// HMAC auth type used when a context configures a key but no type.
pub const DEFAULT_HMAC_AUTH_TYPE: &str = "Metal-Admin";

/// Credentials for authenticating against the metal-api.
///
/// Each variant carries the secret material needed for its auth flow.
/// A bearer token wins over an HMAC key when both are configured.
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    /// No authentication (health/version endpoints, tests).
    #[default]
    Anonymous,

    /// OIDC id-token or static API token, sent as `Authorization: Bearer`.
    Bearer { token: SecretString },

    /// Shared-secret HMAC signature over the request timestamp and method.
    Hmac {
        key: SecretString,
        auth_type: String,
    },
}

impl Credentials {
    /// Pick the credential flavour from the resolved token and HMAC settings.
    pub fn resolve(
        token: Option<SecretString>,
        hmac: Option<SecretString>,
        hmac_auth_type: Option<String>,
    ) -> Self {
        if let Some(token) = token.filter(|t| !t.expose_secret().is_empty()) {
            return Self::Bearer { token };
        }
        if let Some(key) = hmac.filter(|k| !k.expose_secret().is_empty()) {
            return Self::Hmac {
                key,
                auth_type: hmac_auth_type
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| DEFAULT_HMAC_AUTH_TYPE.into()),
            };
        }
        Self::Anonymous
    }

    /// Attach the auth headers for one request.
    pub(crate) fn apply(
        &self,
        builder: reqwest::RequestBuilder,
        method: &reqwest::Method,
    ) -> Result<reqwest::RequestBuilder, Error> {
        match self {
            Self::Anonymous => Ok(builder),
            Self::Bearer { token } => {
                let mut value =
                    HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                        .map_err(|e| Error::InvalidCredentials(format!("bearer token: {e}")))?;
                value.set_sensitive(true);
                Ok(builder.header(AUTHORIZATION, value))
            }
            Self::Hmac { key, auth_type } => {
                let (authz, date) = hmac_headers(key, auth_type, method.as_str(), Utc::now())?;
                let mut value = HeaderValue::from_str(&authz)
                    .map_err(|e| Error::InvalidCredentials(format!("hmac header: {e}")))?;
                value.set_sensitive(true);
                Ok(builder.header(AUTHORIZATION, value).header(DATE_HEADER, date))
            }
        }
    }
}

/// Compute the `Authorization` and `X-Date` header values for an HMAC request.
///
/// The MAC is HMAC-SHA256 over the RFC 3339 timestamp followed by the HTTP
/// method, rendered as lowercase hex.
pub fn hmac_headers(
    key: &SecretString,
    auth_type: &str,
    method: &str,
    at: DateTime<Utc>,
) -> Result<(String, String), Error> {
    let ts = at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut mac = Hmac::<Sha256>::new_from_slice(key.expose_secret().as_bytes())
        .map_err(|e| Error::InvalidCredentials(format!("hmac key: {e}")))?;
    mac.update(ts.as_bytes());
    mac.update(method.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(hex, "{byte:02x}");
    }

    Ok((format!("{auth_type} {hex}"), ts))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn bearer_wins_over_hmac() {
        let creds = Credentials::resolve(
            Some("tok".to_string().into()),
            Some("key".to_string().into()),
            None,
        );
        assert!(matches!(creds, Credentials::Bearer { .. }));
    }

    #[test]
    fn empty_token_falls_back_to_hmac_with_default_type() {
        let creds = Credentials::resolve(
            Some(String::new().into()),
            Some("key".to_string().into()),
            None,
        );
        match creds {
            Credentials::Hmac { auth_type, .. } => assert_eq!(auth_type, DEFAULT_HMAC_AUTH_TYPE),
            other => panic!("expected hmac credentials, got {other:?}"),
        }
    }

    #[test]
    fn nothing_configured_is_anonymous() {
        assert!(matches!(
            Credentials::resolve(None, None, Some("Metal-View".into())),
            Credentials::Anonymous
        ));
    }

    #[test]
    fn hmac_headers_are_stable_for_a_timestamp() {
        let key: SecretString = "secret".to_string().into();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let (authz, date) = hmac_headers(&key, "Metal-Edit", "GET", at).unwrap();
        let (again, _) = hmac_headers(&key, "Metal-Edit", "GET", at).unwrap();
        let (other_method, _) = hmac_headers(&key, "Metal-Edit", "POST", at).unwrap();

        assert_eq!(date, "2024-01-02T03:04:05Z");
        assert!(authz.starts_with("Metal-Edit "));
        assert_eq!(authz.len(), "Metal-Edit ".len() + 64);
        assert_eq!(authz, again);
        assert_ne!(authz, other_method);
    }
}
