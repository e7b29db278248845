//! Media types understood by the client.
//!
//! # Design
//! `MediaType` is a closed set. Every place that needs a MIME string or a
//! codec branch matches on it exhaustively, so adding a format means adding a
//! variant and letting the compiler point at every dispatch site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// JavaScript Object Notation, RFC 4627.
pub const APPLICATION_JSON: &str = "application/json";

/// Extensible Markup Language, RFC 3023.
pub const APPLICATION_XML: &str = "application/xml";

/// Body format of a request or response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Json,
    Xml,
}

impl MediaType {
    /// Canonical MIME string sent in `Content-Type` and `Accept` headers.
    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Json => APPLICATION_JSON,
            MediaType::Xml => APPLICATION_XML,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Parses either the short name (`json`) or a MIME string
/// (`application/json; charset=utf-8`). Matching is case-insensitive.
impl FromStr for MediaType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("json") || essence.eq_ignore_ascii_case(APPLICATION_JSON) {
            return Ok(MediaType::Json);
        }
        if essence.eq_ignore_ascii_case("xml") || essence.eq_ignore_ascii_case(APPLICATION_XML) {
            return Ok(MediaType::Xml);
        }
        Err(ClientError::UnsupportedMediaType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_strings_match_registered_tokens() {
        assert_eq!(MediaType::Json.mime(), "application/json");
        assert_eq!(MediaType::Xml.mime(), "application/xml");
    }

    #[test]
    fn default_is_json() {
        assert_eq!(MediaType::default(), MediaType::Json);
    }

    #[test]
    fn display_uses_mime_string() {
        assert_eq!(MediaType::Xml.to_string(), "application/xml");
    }

    #[test]
    fn parses_short_names_and_mime_strings() {
        assert_eq!("json".parse::<MediaType>().unwrap(), MediaType::Json);
        assert_eq!("XML".parse::<MediaType>().unwrap(), MediaType::Xml);
        assert_eq!(
            "application/json; charset=utf-8".parse::<MediaType>().unwrap(),
            MediaType::Json
        );
        assert_eq!(" Application/XML ".parse::<MediaType>().unwrap(), MediaType::Xml);
    }

    #[test]
    fn rejects_unknown_media_type() {
        let err = "text/csv".parse::<MediaType>().unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedMediaType(ref s) if s == "text/csv"));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&MediaType::Xml).unwrap(), r#""xml""#);
        let parsed: MediaType = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(parsed, MediaType::Json);
    }
}
