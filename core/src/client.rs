//! Typed request/response pipeline over a long-lived transport.
//!
//! # Design
//! `RestApiClient` owns exactly one transport handle for its lifetime plus
//! the configuration every request is built from: base address, request and
//! response media types, JSON settings, and default headers. Each verb
//! validates its arguments, encodes the model, sends, runs the response
//! through `HttpResponse::ensure_success`, and only then decodes the body.
//!
//! Verbs borrow `&self`, so independent requests can run concurrently over
//! the shared handle. Mutators borrow `&mut self`, which rules out changing
//! default headers while a request built from them is in flight.

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::codec::{Codec, EncodedBody, JsonSettings};
use crate::config::{ProxyConfig, RestClientConfig};
use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::media_type::MediaType;
use crate::transport::{ReqwestTransport, Transport};

/// REST client with content negotiation and typed bodies.
///
/// `T` is the transport; the default is a `reqwest` handle built from the
/// proxy settings at construction.
#[derive(Debug)]
pub struct RestApiClient<T: Transport = ReqwestTransport> {
    base_address: Url,
    content_type: MediaType,
    accept_type: MediaType,
    codec: Codec,
    headers: HeaderMap,
    transport: Option<T>,
}

impl RestApiClient<ReqwestTransport> {
    /// Client bound to `base_address`, sending and decoding JSON. No
    /// `Accept` header is installed until `set_accept_type` is called.
    ///
    /// Without `proxy` the system proxy applies.
    pub fn new(base_address: &str, proxy: Option<&ProxyConfig>) -> Result<Self, ClientError> {
        Self::with_transport(base_address, ReqwestTransport::new(proxy, None)?)
    }

    /// Client with explicit request and response media types. The `Accept`
    /// header is installed immediately.
    pub fn with_media_types(
        base_address: &str,
        content_type: MediaType,
        accept_type: MediaType,
        proxy: Option<&ProxyConfig>,
    ) -> Result<Self, ClientError> {
        let mut client = Self::new(base_address, proxy)?;
        client.set_content_type(content_type).set_accept_type(accept_type);
        Ok(client)
    }

    pub fn from_config(config: &RestClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.proxy.as_ref(), config.timeout())?;
        let mut client = Self::with_transport(&config.base_address, transport)?;
        client.set_content_type(config.content_type);
        if let Some(accept_type) = config.accept_type {
            client.set_accept_type(accept_type);
        }
        Ok(client)
    }
}

impl<T: Transport> RestApiClient<T> {
    /// Client over a caller-supplied transport.
    pub fn with_transport(base_address: &str, transport: T) -> Result<Self, ClientError> {
        Ok(Self {
            base_address: parse_base_address(base_address)?,
            content_type: MediaType::default(),
            accept_type: MediaType::default(),
            codec: Codec::default(),
            headers: HeaderMap::new(),
            transport: Some(transport),
        })
    }

    pub fn base_address(&self) -> &Url {
        &self.base_address
    }

    pub fn content_type(&self) -> MediaType {
        self.content_type
    }

    pub fn accept_type(&self) -> MediaType {
        self.accept_type
    }

    /// Headers sent with every request.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_disposed(&self) -> bool {
        self.transport.is_none()
    }

    // -----------------------------------------------------------------------
    // Verbs
    // -----------------------------------------------------------------------

    /// POST `model` and decode the response.
    pub async fn post<Req, Resp>(&self, uri: &str, model: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        require_uri(uri)?;
        let body = self.codec.encode(model, self.content_type)?;
        let response = self.send(HttpMethod::Post, uri, Some(body)).await?;
        self.read_model(response)
    }

    /// POST without a body and decode the response.
    pub async fn post_empty<Resp>(&self, uri: &str) -> Result<Resp, ClientError>
    where
        Resp: DeserializeOwned,
    {
        require_uri(uri)?;
        let response = self.send(HttpMethod::Post, uri, None).await?;
        self.read_model(response)
    }

    /// PUT `model`, discarding the response body.
    pub async fn put<Req>(&self, uri: &str, model: &Req) -> Result<(), ClientError>
    where
        Req: Serialize + ?Sized,
    {
        require_uri(uri)?;
        let body = self.codec.encode(model, self.content_type)?;
        self.send(HttpMethod::Put, uri, Some(body)).await?;
        Ok(())
    }

    /// PUT `model` and decode the response.
    pub async fn put_with_response<Req, Resp>(&self, uri: &str, model: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        require_uri(uri)?;
        let body = self.codec.encode(model, self.content_type)?;
        let response = self.send(HttpMethod::Put, uri, Some(body)).await?;
        self.read_model(response)
    }

    /// PUT without a body, discarding the response body.
    pub async fn put_empty(&self, uri: &str) -> Result<(), ClientError> {
        require_uri(uri)?;
        self.send(HttpMethod::Put, uri, None).await?;
        Ok(())
    }

    /// PUT without a body and decode the response.
    pub async fn put_empty_with_response<Resp>(&self, uri: &str) -> Result<Resp, ClientError>
    where
        Resp: DeserializeOwned,
    {
        require_uri(uri)?;
        let response = self.send(HttpMethod::Put, uri, None).await?;
        self.read_model(response)
    }

    /// GET and decode the response.
    pub async fn get<Resp>(&self, uri: &str) -> Result<Resp, ClientError>
    where
        Resp: DeserializeOwned,
    {
        require_uri_format(uri)?;
        let response = self.send(HttpMethod::Get, uri, None).await?;
        self.read_model(response)
    }

    /// GET and return the payload bytes exactly as received.
    pub async fn get_raw_bytes(&self, uri: &str) -> Result<Vec<u8>, ClientError> {
        require_uri_format(uri)?;
        let response = self.send(HttpMethod::Get, uri, None).await?;
        Ok(response.body)
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Set a header sent with every request, replacing any existing value
    /// under the same (case-insensitive) name.
    pub fn set_custom_header(&mut self, name: &str, value: &str) -> Result<&mut Self, ClientError> {
        if name.is_empty() {
            return Err(ClientError::InvalidArgument("name"));
        }
        if value.is_empty() {
            return Err(ClientError::InvalidArgument("value"));
        }
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
        trace!(header = %header, "custom header set");
        self.headers.insert(header, value);
        Ok(self)
    }

    /// Send `token` as the `Authorization` header value, verbatim. Include
    /// the scheme (`Bearer ...`) if the server expects one.
    pub fn set_access_token(&mut self, token: &str) -> Result<&mut Self, ClientError> {
        if token.is_empty() {
            return Err(ClientError::InvalidArgument("access_token"));
        }
        let mut value = HeaderValue::from_str(token)
            .map_err(|e| ClientError::InvalidHeader(format!("authorization: {e}")))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        trace!("access token set");
        Ok(self)
    }

    /// Format used for request bodies and for decoding responses. Applies
    /// from the next request on.
    pub fn set_content_type(&mut self, content_type: MediaType) -> &mut Self {
        self.content_type = content_type;
        self
    }

    /// Replace the `Accept` header with `accept_type`.
    pub fn set_accept_type(&mut self, accept_type: MediaType) -> &mut Self {
        self.accept_type = accept_type;
        self.headers.insert(ACCEPT, HeaderValue::from_static(accept_type.mime()));
        trace!(accept = accept_type.mime(), "accept type set");
        self
    }

    pub fn set_json_serializer_settings(&mut self, settings: JsonSettings) -> &mut Self {
        self.codec.set_serializer_settings(settings);
        self
    }

    pub fn set_json_deserializer_settings(&mut self, settings: JsonSettings) -> &mut Self {
        self.codec.set_deserializer_settings(settings);
        self
    }

    /// Release the transport handle. Later calls are no-ops; verbs invoked
    /// afterwards fail with `ClientError::Disposed`. Dropping the client
    /// releases the handle as well.
    pub fn dispose(&mut self) {
        if self.transport.take().is_some() {
            debug!(base_address = %self.base_address, "transport released");
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn send(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<EncodedBody>,
    ) -> Result<HttpResponse, ClientError> {
        let transport = self.transport.as_ref().ok_or(ClientError::Disposed)?;
        let url = self.resolve(uri)?;

        let mut headers = self.headers.clone();
        let body = body.map(|encoded| {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(encoded.content_type()));
            encoded.bytes
        });

        debug!(method = method.as_str(), url = %url, "sending request");
        let response = transport
            .send(HttpRequest {
                method,
                url,
                headers,
                body,
            })
            .await?;
        debug!(method = method.as_str(), status = response.status, "response received");

        response.ensure_success()
    }

    fn read_model<Resp>(&self, response: HttpResponse) -> Result<Resp, ClientError>
    where
        Resp: DeserializeOwned,
    {
        self.codec.decode(response.into_text(), self.content_type)
    }

    /// Absolute `http(s)` URIs are used as-is; anything else is appended to
    /// the base address.
    fn resolve(&self, uri: &str) -> Result<String, ClientError> {
        let trimmed = uri.trim();
        let lower = trimmed.to_ascii_lowercase();
        let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_address.as_str().trim_end_matches('/'),
                trimmed.trim_start_matches('/')
            )
        };
        Url::parse(&candidate)
            .map(String::from)
            .map_err(|e| ClientError::InvalidUri(format!("{uri}: {e}")))
    }
}

/// Presence check used by POST and PUT: rejects empty and whitespace-only URIs.
fn require_uri(uri: &str) -> Result<(), ClientError> {
    if uri.trim().is_empty() {
        return Err(ClientError::InvalidArgument("request_uri"));
    }
    Ok(())
}

/// Format check used by GET: an empty URI cannot address anything.
fn require_uri_format(uri: &str) -> Result<(), ClientError> {
    if uri.is_empty() {
        return Err(ClientError::InvalidUri("request uri must not be empty".to_string()));
    }
    Ok(())
}

/// Accepts a bare host (`api.example.com`) by assuming `http`.
fn parse_base_address(base_address: &str) -> Result<Url, ClientError> {
    let trimmed = base_address.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidUri("base address must not be empty".to_string()));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    Url::parse(&candidate).map_err(|e| ClientError::InvalidUri(format!("{base_address}: {e}")))
}
