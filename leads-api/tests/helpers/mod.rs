//! Shared helpers for leads-api integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use http_body_util::BodyExt;
use leads_api::services::GenderizeClient;
use leads_api::AppState;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "leads-test-boundary";

/// Unreachable genderize endpoint for tests that never enrich
pub const NO_GENDERIZE: &str = "http://127.0.0.1:9";

/// Test app with an in-memory database and a temp upload directory
pub struct TestApp {
    pub state: AppState,
    pub pool: SqlitePool,
    pub upload_dir: TempDir,
    _data_dir: Option<TempDir>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_genderize(NO_GENDERIZE).await
    }

    pub async fn with_genderize(url: &str) -> Self {
        let pool = leads_common::db::init_memory_database()
            .await
            .expect("Failed to create in-memory database");
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let genderize = GenderizeClient::new(url).expect("Failed to build genderize client");
        let state = AppState::new(pool.clone(), upload_dir.path().to_path_buf(), genderize);

        Self {
            state,
            pool,
            upload_dir,
            _data_dir: None,
        }
    }

    /// Test app backed by a database file with a multi-connection pool
    pub async fn with_database_file() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create data dir");
        let pool = leads_common::db::init_database(&data_dir.path().join("leads.db"))
            .await
            .expect("Failed to open database file");
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let genderize =
            GenderizeClient::new(NO_GENDERIZE).expect("Failed to build genderize client");
        let state = AppState::new(pool.clone(), upload_dir.path().to_path_buf(), genderize);

        Self {
            state,
            pool,
            upload_dir,
            _data_dir: Some(data_dir),
        }
    }

    pub fn router(&self) -> Router {
        leads_api::build_router(self.state.clone())
    }

    /// Send one request and decode the JSON body (`Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.expect("Request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response is not JSON")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, body)).await
    }

    /// Create a lead through the API and return its id
    pub async fn create_lead(&self, body: Value) -> i64 {
        let (status, lead) = self.post_json("/leads", body).await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", lead);
        lead["id"].as_i64().expect("lead id")
    }

    pub async fn upload_csv(&self, content: &str) -> (StatusCode, Value) {
        self.send(multipart_request("leads.csv", "text/csv", content.as_bytes()))
            .await
    }

    pub async fn lead_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM leads")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub fn upload_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.upload_dir.path())
            .unwrap()
            .next()
            .is_none()
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// multipart/form-data body with a single `file` part
pub fn multipart_request(filename: &str, content_type: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    multipart_with_body(body)
}

/// multipart/form-data request from a prebuilt body
pub fn multipart_with_body(body: Vec<u8>) -> Request<Body> {
    Request::post("/leads/import-csv")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// How the fake genderize service answers
#[derive(Clone, Copy, PartialEq)]
pub enum FakeMode {
    /// Array of predictions aligned with the request
    Normal,
    /// Single object (first name only) instead of an array
    SingleObject,
    /// 503 for every request
    Unavailable,
}

#[derive(Clone)]
struct FakeGenderize {
    mode: FakeMode,
    genders: Arc<HashMap<String, String>>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

async fn fake_predict(
    State(fake): State<FakeGenderize>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let names: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| key == "name[]")
        .map(|(_, value)| value)
        .collect();
    fake.batches.lock().unwrap().push(names.clone());

    let predict = |name: &String| match fake.genders.get(name) {
        Some(gender) => json!({"name": name, "gender": gender, "probability": 0.97, "count": 100}),
        None => json!({"name": name, "gender": null, "probability": 0.0, "count": 0}),
    };

    match fake.mode {
        FakeMode::Unavailable => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        FakeMode::SingleObject => Json(predict(&names[0])).into_response(),
        FakeMode::Normal => Json(Value::Array(names.iter().map(predict).collect())).into_response(),
    }
}

/// Handle to a running fake genderize server
pub struct FakeGenderizeServer {
    pub url: String,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeGenderizeServer {
    /// Name batches received so far, in arrival order
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

/// Serve a fake genderize API on an ephemeral local port
pub async fn spawn_fake_genderize(mode: FakeMode, genders: &[(&str, &str)]) -> FakeGenderizeServer {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeGenderize {
        mode,
        genders: Arc::new(
            genders
                .iter()
                .map(|(name, gender)| (name.to_string(), gender.to_string()))
                .collect(),
        ),
        batches: batches.clone(),
    };

    let app = Router::new().route("/", get(fake_predict)).with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeGenderizeServer {
        url: format!("http://{}/", addr),
        batches,
    }
}
