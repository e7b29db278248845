use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Payload served by `GET /blob`; deliberately not valid UTF-8.
pub const BLOB: &[u8] = &[0x00, 0x9f, 0x92, 0x96, 0xff, 0x10, 0x20];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Item")]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewItem {
    pub name: String,
}

pub type Db = Arc<RwLock<HashMap<String, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/items", post(create_item))
        .route("/items/{id}", get(get_item).put(update_item))
        .route("/items/{id}/archive", put(archive_item))
        .route("/items/{id}/copy", post(copy_item))
        .route("/headers", get(echo_headers))
        .route("/blob", get(blob))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Xml,
}

impl Format {
    /// Reads `name` from `headers`; anything mentioning xml is XML,
    /// everything else (including a missing header) is JSON.
    fn from_header(headers: &HeaderMap, name: HeaderName) -> Self {
        let is_xml = headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains("xml"));
        if is_xml {
            Format::Xml
        } else {
            Format::Json
        }
    }

    fn mime(self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "application/xml",
        }
    }
}

type Rejection = (StatusCode, String);

fn read_body<T: DeserializeOwned>(headers: &HeaderMap, body: &[u8]) -> Result<T, Rejection> {
    let text = std::str::from_utf8(body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("body is not UTF-8: {e}")))?;
    let parsed = match Format::from_header(headers, header::CONTENT_TYPE) {
        Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        Format::Xml => quick_xml::de::from_str(text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, format!("invalid body: {e}")))
}

/// Encode `value` in the format named by the request's `Accept` header.
fn negotiate<T: Serialize>(headers: &HeaderMap, status: StatusCode, value: &T) -> Response {
    let format = Format::from_header(headers, header::ACCEPT);
    let encoded = match format {
        Format::Json => serde_json::to_string(value).map_err(|e| e.to_string()),
        Format::Xml => quick_xml::se::to_string(value).map_err(|e| e.to_string()),
    };
    match encoded {
        Ok(body) => (status, [(header::CONTENT_TYPE, format.mime())], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e).into_response(),
    }
}

fn not_found(id: &str) -> Rejection {
    (StatusCode::NOT_FOUND, format!("item {id} not found"))
}

async fn create_item(State(db): State<Db>, headers: HeaderMap, body: Bytes) -> Result<Response, Rejection> {
    let input: NewItem = read_body(&headers, &body)?;
    let item = Item {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        archived: false,
    };
    db.write().await.insert(item.id.clone(), item.clone());
    tracing::debug!(id = %item.id, "item created");
    Ok(negotiate(&headers, StatusCode::CREATED, &item))
}

async fn get_item(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Rejection> {
    let items = db.read().await;
    let item = items.get(&id).ok_or_else(|| not_found(&id))?;
    Ok(negotiate(&headers, StatusCode::OK, item))
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, Rejection> {
    let input: NewItem = read_body(&headers, &body)?;
    let mut items = db.write().await;
    let item = items.get_mut(&id).ok_or_else(|| not_found(&id))?;
    item.name = input.name;
    Ok(negotiate(&headers, StatusCode::OK, &*item))
}

async fn archive_item(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Rejection> {
    let mut items = db.write().await;
    let item = items.get_mut(&id).ok_or_else(|| not_found(&id))?;
    item.archived = true;
    Ok(negotiate(&headers, StatusCode::OK, &*item))
}

async fn copy_item(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Rejection> {
    let mut items = db.write().await;
    let source = items.get(&id).ok_or_else(|| not_found(&id))?;
    let copy = Item {
        id: Uuid::new_v4().to_string(),
        name: source.name.clone(),
        archived: false,
    };
    items.insert(copy.id.clone(), copy.clone());
    Ok(negotiate(&headers, StatusCode::CREATED, &copy))
}

/// Echo request headers as a JSON object, joining repeated values with ", ".
async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    let mut echoed: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        echoed
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    Json(echoed)
}

async fn blob() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/octet-stream")], BLOB)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item {
            id: Uuid::nil().to_string(),
            name: "Test".to_string(),
            archived: false,
        }
    }

    #[test]
    fn item_serializes_to_json() {
        let json = serde_json::to_value(item()).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Test");
        assert_eq!(json["archived"], false);
    }

    #[test]
    fn item_serializes_to_xml() {
        let xml = quick_xml::se::to_string(&item()).unwrap();
        assert_eq!(
            xml,
            "<Item><id>00000000-0000-0000-0000-000000000000</id><name>Test</name><archived>false</archived></Item>"
        );
    }

    #[test]
    fn format_defaults_to_json() {
        let headers = HeaderMap::new();
        assert_eq!(Format::from_header(&headers, header::ACCEPT), Format::Json);
    }

    #[test]
    fn format_detects_xml() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "Application/XML".parse().unwrap());
        assert_eq!(Format::from_header(&headers, header::CONTENT_TYPE), Format::Xml);
    }

    #[test]
    fn read_body_rejects_missing_name() {
        let headers = HeaderMap::new();
        let err = read_body::<NewItem>(&headers, br#"{"title":1}"#).unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn read_body_parses_xml() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/xml".parse().unwrap());
        let input: NewItem = read_body(&headers, b"<NewItem><name>x</name></NewItem>").unwrap();
        assert_eq!(input.name, "x");
    }
}
