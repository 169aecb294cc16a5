// Hand-crafted async HTTP client for the metal-api v1 REST surface.
//
// Base path: <api-url>/v1/
// Auth: bearer token or HMAC signature, computed per request.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

// ── Error response shape from the metal-api ──────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the metal-api.
///
/// Endpoint groups (machines, networks, …) are implemented as inherent
/// methods in the `resources` modules; this module only knows about
/// transport mechanics: URL construction, auth, and response decoding.
#[derive(Debug, Clone)]
pub struct MetalClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl MetalClient {
    /// Build a client for `api_url` using the given credentials.
    pub fn new(
        api_url: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(api_url, http, credentials)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        api_url: &str,
        http: reqwest::Client,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(api_url)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Ensure the base URL ends with a slash so relative joins keep the path.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The API base URL (always slash-terminated).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"v1/machine"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, url: Url) -> Result<reqwest::RequestBuilder, Error> {
        let builder = self.http.request(method.clone(), url);
        self.credentials.apply(builder, &method)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.request(Method::GET, url)?.send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.request(Method::GET, url)?.query(params).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.request(Method::POST, url)?.json(body).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.request(Method::PUT, url)?.json(body).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn put_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url} (multipart)");

        let resp = self.request(Method::PUT, url)?.multipart(form).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.request(Method::DELETE, url)?.send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn delete_empty(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.request(Method::DELETE, url)?.send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        match status.as_u16() {
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
        }
    }
}

/// Percent-encode a single path segment (IDs may contain `/` or `:`).
pub(crate) fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
