use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use serde_json::Value;
use tokio::time::Instant;

use super::HarmonyApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Put,
    Post,
}

#[derive(Debug, Clone)]
pub struct ApiCall {
    pub method: Method,
    pub path: String,
    pub repeat: u32,
    pub at: Instant,
}

/// In-memory hub API. Answers GETs from canned responses and records every command.
#[derive(Debug, Clone, Default)]
pub struct RecordingApi {
    responses: Arc<Mutex<HashMap<String, Value>>>,
    calls: Arc<Mutex<Vec<ApiCall>>>,
    get_delay: Arc<Mutex<Duration>>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, value: Value) {
        self.responses.lock().unwrap().insert(path.to_string(), value);
    }

    /// Every following GET answers only after `delay`, like a hub that is slow to respond.
    pub fn delay_gets(&self, delay: Duration) {
        *self.get_delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<ApiCall> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    fn record(&self, method: Method, path: &str, repeat: u32) {
        self.calls.lock().unwrap().push(ApiCall {
            method,
            path: path.to_string(),
            repeat,
            at: Instant::now(),
        });
    }
}

impl HarmonyApi for RecordingApi {
    async fn get(&self, path: &str) -> Value {
        let delay = *self.get_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    async fn put(&self, path: &str, repeat: u32) {
        self.record(Method::Put, path, repeat);
    }

    async fn post(&self, path: &str, repeat: u32) {
        self.record(Method::Post, path, repeat);
    }
}
