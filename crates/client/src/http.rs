//! HTTP seam for repository calls and static resources.
//!
//! The orchestrator only ever needs "send a JSON request, give me status and
//! body", so that is the whole trait. Production uses [`ReqwestClient`];
//! tests swap in canned fakes.
//!
//! Failure policy: a non-success status is an error, uniformly. There is no
//! falsy-sentinel path - callers use `?`, never truthiness checks.

use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// Status plus parsed JSON body (`Null` when the body is empty or not JSON).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

/// Object-safe HTTP seam.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
    ) -> Result<HttpResponse>;

    /// Fetches a static resource as raw bytes.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed production client.
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
    ) -> Result<HttpResponse> {
        let mut builder = match method {
            HttpMethod::Get => self.inner.get(url),
            HttpMethod::Post => self.inner.post(url),
            HttpMethod::Put => self.inner.put(url),
            HttpMethod::Delete => self.inner.delete(url),
        };
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|error| Error::Http(error.to_string()))?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        Ok(HttpResponse { status, body })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|error| Error::Http(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("{url} returned status {status}")));
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|error| Error::Http(error.to_string()))
    }
}
