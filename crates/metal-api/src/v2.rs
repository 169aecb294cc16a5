// Client for the metal-stack v2 API.
//
// The v2 surface speaks the connect protocol; with the JSON codec every
// call is a `POST <base>/<package>.<Service>/<Method>` with a JSON body.
// Only the calls metalctl needs are implemented.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const CONNECT_PROTOCOL_VERSION: &str = "Connect-Protocol-Version";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2Version {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default, rename = "gitSha1")]
    pub git_sha1: String,
    #[serde(default, rename = "buildDate")]
    pub build_date: String,
}

#[derive(Debug, Deserialize)]
struct VersionServiceGetResponse {
    #[serde(default)]
    version: Option<V2Version>,
}

#[derive(Debug, Deserialize)]
struct ConnectError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Connect-JSON client for the v2 API, authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct V2Client {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl V2Client {
    pub fn new(
        api_url: &str,
        token: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Self::with_client(api_url, transport.build_client()?, token)
    }

    pub fn with_client(
        api_url: &str,
        http: reqwest::Client,
        token: Option<SecretString>,
    ) -> Result<Self, Error> {
        let mut base_url = Url::parse(api_url)?;
        let path = base_url.path().trim_end_matches('/').to_owned();
        base_url.set_path(&format!("{path}/"));
        Ok(Self {
            http,
            base_url,
            token: token.filter(|t| !t.expose_secret().is_empty()),
        })
    }

    /// Invoke one unary procedure, e.g. `metalstack.api.v2.VersionService/Get`.
    async fn call<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        procedure: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.base_url.join(procedure)?;
        debug!("POST {url} (connect)");

        let mut req = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONNECT_PROTOCOL_VERSION, "1")
            .json(body);
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::InvalidCredentials(format!("v2 token: {e}")))?;
            value.set_sensitive(true);
            req = req.header(AUTHORIZATION, value);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ConnectError>(&text)
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or(text);
            return Err(match status.as_u16() {
                401 | 403 => Error::Authentication {
                    status: status.as_u16(),
                    message,
                },
                404 => Error::NotFound { message },
                409 => Error::Conflict { message },
                code => Error::Api {
                    status: code,
                    message,
                },
            });
        }

        serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: text,
        })
    }

    /// Server version of the v2 API.
    pub async fn version(&self) -> Result<V2Version, Error> {
        let resp: VersionServiceGetResponse = self
            .call(
                "metalstack.api.v2.VersionService/Get",
                &serde_json::json!({}),
            )
            .await?;
        Ok(resp.version.unwrap_or_default())
    }
}
