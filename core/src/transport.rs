//! The HTTP transport the client delegates I/O to.
//!
//! `ReqwestTransport` is the default handle. Connection reuse, concurrency
//! and cancellation all belong to `reqwest`; the client only builds requests
//! and interprets responses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ProxyConfig;
use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Sends one request and returns the status, headers and fully read body.
///
/// A non-2xx status is a successful send; only failures to complete the
/// exchange are errors here.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        (**self).send(request).await
    }
}

/// `reqwest`-backed transport, built once per client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the handle.
    ///
    /// Without an explicit proxy the system proxy from the environment
    /// (`HTTP_PROXY`, `HTTPS_PROXY`, `NO_PROXY`) applies. An explicit proxy
    /// with a username sends basic credentials on every request.
    pub fn new(proxy: Option<&ProxyConfig>, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();

        if let Some(proxy) = proxy {
            let mut resolved = reqwest::Proxy::all(&proxy.url)
                .map_err(|e| ClientError::Build(format!("invalid proxy '{}': {e}", proxy.url)))?;
            if let Some(username) = &proxy.username {
                resolved = resolved.basic_auth(username, proxy.password.as_deref().unwrap_or_default());
            }
            builder = builder.proxy(resolved);
        }

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    /// Handle that ignores proxies, including the system proxy.
    pub fn direct(timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method.into(), &url).headers(headers);
        builder = match (method, body) {
            (_, Some(body)) => builder.body(body),
            // Bodiless POST/PUT still announce a zero-length payload.
            (HttpMethod::Post | HttpMethod::Put, None) => builder.body(Vec::new()),
            (HttpMethod::Get, None) => builder,
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
