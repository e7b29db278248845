use httpmock::prelude::*;
use restapi_core::{ClientError, MediaType, ReqwestTransport, RestApiClient};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize)]
struct NewItem {
    name: String,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Item {
    id: u32,
    name: String,
}

fn client_for(server: &MockServer, content_type: MediaType, accept_type: MediaType) -> RestApiClient {
    let transport = ReqwestTransport::direct(None).unwrap();
    let mut client = RestApiClient::with_transport(&server.base_url(), transport).unwrap();
    client.set_content_type(content_type).set_accept_type(accept_type);
    client
}

#[tokio::test]
async fn post_sends_json_and_decodes_created_item() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/items")
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json_body(json!({"name": "x"}));
        then.status(201)
            .header("Content-Type", "application/json")
            .body(r#"{"id":1,"name":"x"}"#);
    });

    let client = client_for(&server, MediaType::Json, MediaType::Json);
    let item: Item = client
        .post("/items", &NewItem { name: "x".to_string() })
        .await
        .unwrap();

    assert_eq!(item, Item { id: 1, name: "x".to_string() });
    mock.assert();
}

#[tokio::test]
async fn not_found_becomes_http_fault() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/items/404");
        then.status(404).body("not found");
    });

    let client = client_for(&server, MediaType::Json, MediaType::Json);
    let err = client.get::<Item>("/items/404").await.unwrap_err();

    match err {
        ClientError::Http { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert();
}

#[tokio::test]
async fn xml_accept_and_content_type_are_sent() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/items/1")
            .header("Accept", "application/xml")
            .header("Content-Type", "application/xml")
            .body("<NewItem><name>x</name></NewItem>");
        then.status(200)
            .header("Content-Type", "application/xml")
            .body("<Item><id>1</id><name>x</name></Item>");
    });

    let client = client_for(&server, MediaType::Xml, MediaType::Xml);
    let item: Item = client
        .put_with_response("/items/1", &NewItem { name: "x".to_string() })
        .await
        .unwrap();

    assert_eq!(item, Item { id: 1, name: "x".to_string() });
    mock.assert();
}

#[tokio::test]
async fn token_and_custom_headers_are_sent() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/items/1/archive")
            .header("Authorization", "Bearer test-token")
            .header("X-Api-Key", "second");
        then.status(204);
    });

    let mut client = client_for(&server, MediaType::Json, MediaType::Json);
    client
        .set_access_token("Bearer test-token")
        .unwrap()
        .set_custom_header("X-Api-Key", "first")
        .unwrap()
        .set_custom_header("X-Api-Key", "second")
        .unwrap();

    client.put_empty("/items/1/archive").await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn server_error_body_is_preserved() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST).path("/items");
        then.status(503)
            .header("Content-Type", "application/json")
            .body(r#"{"error":"maintenance"}"#);
    });

    let client = client_for(&server, MediaType::Json, MediaType::Json);
    let err = client
        .post::<_, Item>("/items", &NewItem { name: "x".to_string() })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("maintenance"));
    mock.assert();
}
