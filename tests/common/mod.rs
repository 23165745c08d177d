use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use tokio::sync::Notify;

use formrelay::config::{Config, SinkConfig};
use formrelay::models::FormType;
use formrelay::sink::{DeliveryError, SubmissionSink};
use formrelay::state::SharedState;
use formrelay::store::MemoryStorage;

/// Stand-in backend that can be switched offline or held mid-request.
pub struct FakeSink {
    online: AtomicBool,
    hold: AtomicBool,
    release: Notify,
    attempts: AtomicUsize,
    delivered: Mutex<Vec<(FormType, Map<String, Value>)>>,
}

#[allow(dead_code)]
impl FakeSink {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            hold: AtomicBool::new(false),
            release: Notify::new(),
            attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Park every delivery until `release_held` is called.
    pub fn hold_requests(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release_held(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
        self.release.notify_one();
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<(FormType, Map<String, Value>)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionSink for FakeSink {
    async fn submit(
        &self,
        form_type: FormType,
        payload: &Map<String, Value>,
    ) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        if !self.online.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("connection refused".to_string()));
        }

        self.delivered
            .lock()
            .unwrap()
            .push((form_type, payload.clone()));
        Ok(())
    }
}

/// A running test server backed by in-memory storage and a fake sink.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
    pub sink: Arc<FakeSink>,
}

#[allow(dead_code)]
impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit a JSON form, return (body, status).
    pub async fn submit_json(&self, form_type: &str, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/v1/forms/{form_type}")))
            .json(data)
            .send()
            .await
            .expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit form-urlencoded data, return (body, status).
    pub async fn submit_form(&self, form_type: &str, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/v1/forms/{form_type}")))
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit a valid contact form while the sink is offline so it lands in
    /// the pending queue. Returns the pending id.
    pub async fn queue_contact(&self, email: &str) -> String {
        let (body, status) = self
            .submit_json(
                "contact",
                &json!({ "name": "Lead", "email": email, "message": "Need a site" }),
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED, "expected queued submission: {body}");
        body["pending_id"].as_str().unwrap().to_string()
    }
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        data_dir: PathBuf::from("unused"),
        sink: SinkConfig {
            url: "http://localhost:0".to_string(),
            api_key: "test-key".to_string(),
        },
        retry_interval: Duration::from_secs(3600),
        delivery_timeout: Duration::from_secs(2),
        max_body_size: 65_536,
        allowed_origins: vec![],
        trusted_proxies: vec![],
        honeypot_field: Some("website".to_string()),
        rate_limit: 100,
        rate_limit_window: Duration::from_secs(60),
        log_level: "warn".to_string(),
    }
}

/// Spawn a test app whose backend starts offline.
#[allow(dead_code)]
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), false).await
}

pub async fn spawn_app_with(config: Config, online: bool) -> TestApp {
    let sink = Arc::new(FakeSink::new(online));
    let (app, state) = formrelay::build_app(config, Arc::new(MemoryStorage::new()), sink.clone());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        state,
        sink,
    }
}
