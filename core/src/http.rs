//! HTTP requests and responses as plain data.
//!
//! # Design
//! The client builds an `HttpRequest` and hands it to a `Transport`, which
//! returns an `HttpResponse` with the body fully read. Keeping both sides as
//! plain values lets tests substitute the transport and inspect exactly what
//! would have been sent.

use http::HeaderMap;

use crate::error::ClientError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute; relative request URIs are resolved against the base
/// address before the request is built.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// An HTTP response with its body fully buffered.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences. Valid bodies are
    /// moved, not copied.
    pub fn into_text(self) -> String {
        match String::from_utf8(self.body) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    /// Pass a 2xx response through unchanged; turn anything else into
    /// `ClientError::Http` carrying the status and the body text.
    ///
    /// The response is consumed either way, so a failed body is read once
    /// and never reaches a decoder.
    pub fn ensure_success(self) -> Result<Self, ClientError> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.status;
        Err(ClientError::Http {
            status,
            body: self.into_text(),
        })
    }
}
