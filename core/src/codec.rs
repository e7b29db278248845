//! Body encoding and decoding for each supported media type.
//!
//! # Design
//! Strings bypass structured serialization in both directions. A request
//! model that serializes as a bare string (`String`, `&str`, `Cow<str>`) is
//! sent as its UTF-8 bytes, and an owned-string response type receives the
//! body text verbatim. Both checks inspect the model's serde impl at runtime,
//! so generic callers need no separate method for raw payloads and models may
//! borrow.
//!
//! JSON goes through `serde_json` with per-direction `JsonSettings`; XML goes
//! through the `xml` module.

use serde::de::value::{Error as ValueError, StringDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::media_type::MediaType;
use crate::shape::{expects, shape_of, Expects, Shape};
use crate::xml;

/// Options applied to JSON bodies. Encode and decode directions are
/// configured independently; `indented` only affects encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonSettings {
    /// Pretty-print encoded bodies.
    pub indented: bool,
    /// Drop object members whose value is `null`. On decode this lets
    /// `#[serde(default)]` fields fall back to their defaults.
    pub ignore_null_values: bool,
}

/// An encoded request body tagged with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl EncodedBody {
    /// Value for the `Content-Type` header.
    pub fn content_type(&self) -> &'static str {
        self.media_type.mime()
    }
}

/// Serializer configuration shared by every request of a client.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    serializer: JsonSettings,
    deserializer: JsonSettings,
}

impl Codec {
    pub fn new(serializer: JsonSettings, deserializer: JsonSettings) -> Self {
        Self {
            serializer,
            deserializer,
        }
    }

    pub fn serializer_settings(&self) -> JsonSettings {
        self.serializer
    }

    pub fn deserializer_settings(&self) -> JsonSettings {
        self.deserializer
    }

    pub fn set_serializer_settings(&mut self, settings: JsonSettings) {
        self.serializer = settings;
    }

    pub fn set_deserializer_settings(&mut self, settings: JsonSettings) {
        self.deserializer = settings;
    }

    /// Encode `value` as `media_type`.
    ///
    /// A model that serializes to nothing (`None`, `()`) is treated as
    /// missing and rejected with `InvalidArgument`.
    pub fn encode<T>(&self, value: &T, media_type: MediaType) -> Result<EncodedBody, ClientError>
    where
        T: Serialize + ?Sized,
    {
        let bytes = match (shape_of(value), media_type) {
            (Shape::Str(raw), _) => raw.into_bytes(),
            (_, MediaType::Json) => self.encode_json(value)?,
            (_, MediaType::Xml) => xml::encode(value)?,
        };
        Ok(EncodedBody { bytes, media_type })
    }

    /// Decode `text` into `T` as `media_type`. A `String` target receives
    /// `text` unchanged.
    pub fn decode<T>(&self, text: String, media_type: MediaType) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        if expects::<T>() == Expects::String {
            let raw: StringDeserializer<ValueError> = text.into_deserializer();
            return T::deserialize(raw).map_err(deserialization);
        }
        match media_type {
            MediaType::Json => self.decode_json(&text),
            MediaType::Xml => xml::decode(&text),
        }
    }

    fn encode_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, ClientError> {
        let settings = self.serializer;
        let bytes = if settings.ignore_null_values {
            let mut tree = serde_json::to_value(value).map_err(serialization)?;
            if tree.is_null() {
                return Err(ClientError::InvalidArgument("request_model"));
            }
            strip_nulls(&mut tree);
            write_json(&tree, settings.indented)?
        } else {
            write_json(value, settings.indented)?
        };
        if bytes == b"null" {
            return Err(ClientError::InvalidArgument("request_model"));
        }
        Ok(bytes)
    }

    fn decode_json<T: DeserializeOwned>(&self, text: &str) -> Result<T, ClientError> {
        // An empty body reads as `null`, so `()` and `Option<_>` targets accept it.
        let text = if text.trim().is_empty() { "null" } else { text };
        if self.deserializer.ignore_null_values {
            let mut tree: Value = serde_json::from_str(text).map_err(deserialization)?;
            strip_nulls(&mut tree);
            return serde_json::from_value(tree).map_err(deserialization);
        }
        serde_json::from_str(text).map_err(deserialization)
    }
}

fn write_json<T: Serialize + ?Sized>(value: &T, indented: bool) -> Result<Vec<u8>, ClientError> {
    if indented {
        serde_json::to_vec_pretty(value).map_err(serialization)
    } else {
        serde_json::to_vec(value).map_err(serialization)
    }
}

/// Remove `null` object members at every depth. Array elements are kept so
/// positions stay stable.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

pub(crate) fn serialization(e: impl std::fmt::Display) -> ClientError {
    ClientError::Serialization(e.to_string())
}

pub(crate) fn deserialization(e: impl std::fmt::Display) -> ClientError {
    ClientError::Deserialization(e.to_string())
}
