//! # API Transport
//!
//! The request interface every store talks through.
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Transport                                   │
//! │                                                                         │
//! │   Store action                                                          │
//! │       │  api.get_json::<Cart>("/carts/1")                               │
//! │       ▼                                                                 │
//! │   dyn Api ── request(method, path, body) -> serde_json::Value           │
//! │       │                                                                 │
//! │       ├── HttpApi      reqwest, base URL, timeout, User-Agent           │
//! │       └── FakeBackend  in-memory (testkit)                              │
//! │                                                                         │
//! │   Non-2xx responses become ClientError::Status with the backend's      │
//! │   message, timeouts become ClientError::Timeout.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

// =============================================================================
// Method
// =============================================================================

/// HTTP verbs the backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

// =============================================================================
// Api Trait
// =============================================================================

/// Generic JSON request interface.
///
/// Implementations return the decoded response body (`Value::Null` for an
/// empty body) and fail on any non-2xx status.
#[async_trait]
pub trait Api: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ClientResult<Value>;

    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.request(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.request(Method::Post, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.request(Method::Put, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.request(Method::Delete, path, None).await
    }
}

/// Typed helpers layered over the raw [`Api`] calls.
impl<'a> dyn Api + 'a {
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        decode(self.get(path).await?)
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        decode(self.post(path, body).await?)
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        decode(self.put(path, body).await?)
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> ClientResult<Value> {
    serde_json::to_value(body).map_err(|e| ClientError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> ClientResult<T> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`Api`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpApi {
    /// Builds a client for an absolute base URL.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> ClientResult<Self> {
        let parsed = url::Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "Base URL must use http:// or https://, got: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(HttpApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    /// Builds a client from loaded configuration.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let base_url = config.api.resolved_base_url()?;
        Self::new(&base_url, config.api.timeout_secs, &config.api.user_agent)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout_secs)
        } else {
            ClientError::from(err)
        }
    }
}

#[async_trait]
impl Api for HttpApi {
    #[instrument(skip(self, body), fields(base = %self.base_url))]
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ClientResult<Value> {
        let url = self.url_for(path);
        debug!(%method, %url, "Sending request");

        let mut request = self.client.request(method.into(), &url);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            debug!(%method, %url, status = status.as_u16(), "Request rejected");
            return Err(ClientError::from_status(status.as_u16(), &bytes));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
