#![allow(dead_code)]

use async_trait::async_trait;
use rustdirectus::transport::{Method, Transport, TransportRequest, TransportResponse};
use rustdirectus::{Client, ClientBuilder, ClientConfig, Error, NoopObserver, Result};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

rustdirectus::directus_record! {
    pub struct Author in "author" {
        key id: i64 => "id";
        field name: String => "name";
        relations books: Book => "books";
    }
}

rustdirectus::directus_record! {
    pub struct Book in "book" {
        key id: i64 => "id";
        field title: String => "title";
        relation author: Author => "author";
    }
}

pub const PRODUCT_ID: &str = "00996200-b4d6-4fcf-b6ac-ad6ce25139cc";
pub const LOCATION_ID: &str = "5b7d1c2e-0a7e-4b53-9a61-3f1c2b8d9e10";

pub fn product_json(id: &str, price: f64) -> Value {
    json!({
        "id": id,
        "name": "Basic",
        "description": "monthly",
        "duration": 30,
        "price": price,
        "location": {"id": LOCATION_ID, "code": "de", "name": "Frankfurt"}
    })
}

/// Scripted in-memory transport recording every request.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(Method, String), TransportResponse>>,
    failing: Mutex<HashSet<String>>,
    requests: Mutex<Vec<TransportRequest>>,
    ping_status: Mutex<Option<u16>>,
    patch_gate: Mutex<Option<Arc<Notify>>>,
    patch_entered: Notify,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert((method, path.to_string()), TransportResponse::json(status, &body));
    }

    pub fn respond_data(&self, method: Method, path: &str, data: Value) {
        self.respond(method, path, 200, json!({ "data": data }));
    }

    pub fn respond_raw(&self, method: Method, path: &str, response: TransportResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert((method, path.to_string()), response);
    }

    /// Makes PATCH requests to `path` fail with a remote error.
    pub fn fail_patch(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn set_ping_status(&self, status: u16) {
        *self.ping_status.lock().unwrap() = Some(status);
    }

    /// Holds every PATCH until the returned gate is notified.
    pub fn hold_patches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.patch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Resolves once a held PATCH has been received.
    pub async fn patch_entered(&self) {
        self.patch_entered.notified().await;
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `(path, body)` of every PATCH sent, including failed ones.
    pub fn patches(&self) -> Vec<(String, Value)> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == Method::Patch)
            .map(|request| (request.path(), request.body.unwrap_or(Value::Null)))
            .collect()
    }

    pub fn patches_to(&self, path: &str) -> Vec<Value> {
        self.patches()
            .into_iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let path = request.path();

        if request.method == Method::Patch {
            let gate = self.patch_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                self.patch_entered.notify_one();
                gate.notified().await;
            }
        }

        if request.method == Method::Patch && self.failing.lock().unwrap().contains(&path) {
            return Ok(TransportResponse::json(
                403,
                &json!({"errors": [{"message": "You don't have permission to access this."}]}),
            ));
        }

        if let Some(response) = self
            .responses
            .lock()
            .unwrap()
            .get(&(request.method, path.clone()))
        {
            return Ok(response.clone());
        }

        match request.method {
            Method::Patch => Ok(TransportResponse::json(
                200,
                &json!({ "data": request.body.clone().unwrap_or(Value::Null) }),
            )),
            Method::Get => Ok(TransportResponse::json(
                404,
                &json!({"errors": [{"message": format!("Route {} doesn't exist.", path)}]}),
            )),
        }
    }

    async fn ping(&self) -> Result<()> {
        match *self.ping_status.lock().unwrap() {
            None | Some(200) => Ok(()),
            Some(status) => Err(Error::HealthCheck(format!("unexpected status code: {}", status))),
        }
    }
}

pub fn builder(transport: Arc<MockTransport>) -> ClientBuilder {
    Client::builder(ClientConfig::default())
        .transport(transport)
        .observer(Arc::new(NoopObserver))
}

/// Client with the bundled models plus `Author` and `Book`.
pub async fn client(transport: Arc<MockTransport>) -> Client {
    builder(transport)
        .with_bundled_models()
        .register::<Author>()
        .register::<Book>()
        .connect()
        .await
        .unwrap()
}
