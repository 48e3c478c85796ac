use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::Request,
    response::Response,
    Router,
};
use serde::de::DeserializeOwned;
use venue_booking_backend::{
    app::build_router,
    otp::{ManualClock, MemoryOtpStore, Notifier, OtpService, OtpSettings},
};

pub const START_MS: u64 = 1_700_000_000_000;

/// Notifier which keeps the codes instead of mailing them
#[derive(Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl CapturingNotifier {
    pub fn last_code_for(&self, address: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter()
            .rev()
            .find(|(to, _)| to == address)
            .map(|(_, code)| code.clone())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send(&self, address: &str, code: &str) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((address.to_owned(), code.to_owned()));
        true
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryOtpStore>,
    pub notifier: Arc<CapturingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryOtpStore::new());
        let notifier = Arc::new(CapturingNotifier::default());
        let clock = Arc::new(ManualClock::new(START_MS));
        let settings = OtpSettings {
            hash_cost: 4,
            ..OtpSettings::default()
        };
        let service = OtpService::new(store.clone(), notifier.clone(), clock.clone(), settings);
        let router = build_router(Arc::new(service));
        Self {
            router,
            store,
            notifier,
            clock,
        }
    }
}

pub fn build_post_request(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

pub fn build_get_request(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

pub async fn read_body<T: DeserializeOwned>(res: Response) -> T {
    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
