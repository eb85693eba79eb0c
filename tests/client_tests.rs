/// Client construction and HTTP transport tests
///
/// The HTTP tests run against a local axum server and are skipped when the
/// sandbox does not allow binding a socket.
/// Run with: cargo test --test client_tests

mod common;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::get;
use axum::{Json, Router};
use common::{LOCATION_ID, MockTransport, PRODUCT_ID, product_json};
use rustdirectus::models::{Location, Product};
use rustdirectus::{Client, ClientConfig, Error};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn test_failed_health_check_prevents_client() {
    let transport = MockTransport::new();
    transport.set_ping_status(503);

    let result = common::builder(transport.clone())
        .with_bundled_models()
        .connect()
        .await;

    assert!(matches!(result, Err(Error::HealthCheck(_))));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_ping() {
    let transport = MockTransport::new();
    let result = Client::builder(ClientConfig::new("localhost:8055"))
        .transport(transport)
        .connect()
        .await;
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[tokio::test]
async fn test_unregistered_record_type_is_configuration_error() {
    let transport = MockTransport::new();
    let client = common::builder(transport)
        .register::<Product>()
        .connect()
        .await
        .unwrap();

    assert!(client.collection::<Product>().is_ok());
    assert!(matches!(client.collection::<Location>(), Err(Error::Configuration(_))));
}

#[derive(Clone, Default)]
struct Seen {
    ping_auth: Arc<Mutex<Vec<Option<String>>>>,
    item_auth: Arc<Mutex<Vec<Option<String>>>>,
    patches: Arc<Mutex<Vec<(String, Value)>>>,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn ping(State(seen): State<Seen>, headers: HeaderMap) -> &'static str {
    seen.ping_auth.lock().unwrap().push(bearer(&headers));
    "pong"
}

async fn get_product(
    State(seen): State<Seen>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let auth = bearer(&headers);
    seen.item_auth.lock().unwrap().push(auth.clone());
    if auth.as_deref() != Some("Bearer secret") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"errors": [{"message": "Invalid user credentials."}]})),
        );
    }
    (StatusCode::OK, Json(json!({ "data": product_json(&id, 9.5) })))
}

async fn patch_product(
    State(seen): State<Seen>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    seen.patches.lock().unwrap().push((id, body.clone()));
    Json(json!({ "data": body }))
}

async fn patch_location(Path(_id): Path<String>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"errors": [{"message": "You don't have permission to access this."}]})),
    )
}

async fn start_server(seen: Seen) -> Option<SocketAddr> {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Skipping HTTP transport test: {}", e);
            return None;
        }
    };
    let addr = listener.local_addr().ok()?;

    let app = Router::new()
        .route("/server/ping", get(ping))
        .route("/items/product/:id", get(get_product).patch(patch_product))
        .route("/items/location/:id", axum::routing::patch(patch_location))
        .with_state(seen);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Server error: {}", e);
        }
    });
    Some(addr)
}

async fn connect(addr: SocketAddr, token: &str) -> Client {
    Client::builder(ClientConfig::new(&format!("http://{}", addr)).token(token))
        .register::<Product>()
        .register::<Location>()
        .connect()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_http_round_trip_with_bearer_auth() {
    let seen = Seen::default();
    let Some(addr) = start_server(seen.clone()).await else {
        return;
    };
    let client = connect(addr, "secret").await;

    let product = client
        .collection::<Product>()
        .unwrap()
        .load_by_id(PRODUCT_ID)
        .await
        .unwrap();
    product.update(|p| p.price = 11.0).unwrap();
    let report = client.commit().await.unwrap();

    assert_eq!(report.patched, 1);
    assert_eq!(*seen.ping_auth.lock().unwrap(), vec![None]);
    assert_eq!(
        *seen.item_auth.lock().unwrap(),
        vec![Some("Bearer secret".to_string())]
    );
    assert_eq!(
        *seen.patches.lock().unwrap(),
        vec![(PRODUCT_ID.to_string(), json!({"price": 11.0}))]
    );
}

#[tokio::test]
async fn test_http_remote_error_message_is_surfaced() {
    let seen = Seen::default();
    let Some(addr) = start_server(seen.clone()).await else {
        return;
    };
    let client = connect(addr, "stale").await;

    let err = client
        .collection::<Product>()
        .unwrap()
        .load_by_id(PRODUCT_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Remote(ref msg) if msg == "Invalid user credentials."));
}

#[tokio::test]
async fn test_http_patch_failure_becomes_persistence_error() {
    let seen = Seen::default();
    let Some(addr) = start_server(seen.clone()).await else {
        return;
    };
    let client = connect(addr, "secret").await;

    let product = client
        .collection::<Product>()
        .unwrap()
        .load_by_id(PRODUCT_ID)
        .await
        .unwrap();
    let location = product.read().unwrap().location.clone().unwrap();
    location.update(|l| l.code = "fr".into()).unwrap();

    let err = client.commit().await.unwrap_err();
    match err {
        Error::Persistence { collection, id, .. } => {
            assert_eq!(collection, "location");
            assert_eq!(id, LOCATION_ID);
        }
        other => panic!("expected persistence error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_health_check_against_missing_route() {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Skipping test_http_health_check_against_missing_route: {}", e);
            return;
        }
    };
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, Router::new()).await;
    });

    let result = Client::connect(ClientConfig::new(&format!("http://{}", addr))).await;
    assert!(matches!(result, Err(Error::HealthCheck(ref msg)) if msg.contains("404")));
}
