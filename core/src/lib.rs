//! Generic REST client with JSON/XML content negotiation.
//!
//! # Overview
//! `RestApiClient` wraps one long-lived HTTP transport and adds typed
//! request/response bodies, default and custom headers, proxy configuration,
//! and uniform translation of non-2xx responses into `ClientError::Http`.
//!
//! # Design
//! - `MediaType` is a closed enum; MIME strings and codec branches match on
//!   it exhaustively.
//! - `Codec` encodes models and decodes bodies, letting string payloads
//!   through untouched in both directions. XML top-level sequences travel
//!   wrapped in an `ArrayOf<Item>` root element.
//! - `HttpResponse::ensure_success` runs before any decode, so a failed
//!   response never reaches the codec.
//! - The transport sits behind the `Transport` trait. `ReqwestTransport` is
//!   the default; tests substitute a recording transport.
//!
//! ```no_run
//! use restapi_core::{MediaType, RestApiClient};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct NewItem { name: String }
//!
//! #[derive(Deserialize)]
//! struct Item { id: u64, name: String }
//!
//! # async fn example() -> Result<(), restapi_core::ClientError> {
//! let mut client = RestApiClient::with_media_types(
//!     "https://api.example.com",
//!     MediaType::Json,
//!     MediaType::Json,
//!     None,
//! )?;
//! client.set_access_token("Bearer token")?;
//!
//! let item: Item = client.post("/items", &NewItem { name: "x".into() }).await?;
//! # let _ = (item.id, item.name);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod media_type;
mod shape;
pub mod transport;
mod xml;

pub use client::RestApiClient;
pub use codec::{Codec, EncodedBody, JsonSettings};
pub use config::{ProxyConfig, RestClientConfig};
pub use error::ClientError;
pub use self::http::{HttpMethod, HttpRequest, HttpResponse};
pub use media_type::{MediaType, APPLICATION_JSON, APPLICATION_XML};
pub use transport::{ReqwestTransport, Transport};
