//! In-memory transport for exercising the API/endpoint layer in tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::ApiError;
use crate::transport::Transport;

/// Route `log` output through the test harness when a test opts in.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fake [`Transport`] serving queued canned responses and recording every
/// call it receives. An empty queue answers with a transport error, which
/// doubles as the "network is down" fixture.
#[derive(Default)]
pub struct FakeTransport {
    get_responses: Mutex<VecDeque<Value>>,
    post_responses: Mutex<VecDeque<Value>>,
    get_log: Mutex<Vec<Vec<(String, String)>>>,
    post_log: Mutex<Vec<Value>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_get(&self, response: Value) {
        self.get_responses.lock().unwrap().push_back(response);
    }

    pub fn push_post(&self, response: Value) {
        self.post_responses.lock().unwrap().push_back(response);
    }

    pub fn get_calls(&self) -> Vec<Vec<(String, String)>> {
        self.get_log.lock().unwrap().clone()
    }

    pub fn post_calls(&self) -> Vec<Value> {
        self.post_log.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.get_log.lock().unwrap().len()
    }

    pub fn post_call_count(&self) -> usize {
        self.post_log.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, params: &[(String, String)]) -> Result<Value, ApiError> {
        self.get_log.lock().unwrap().push(params.to_vec());
        self.get_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no queued GET response".to_string()))
    }

    async fn post(&self, body: &Value) -> Result<Value, ApiError> {
        self.post_log.lock().unwrap().push(body.clone());
        self.post_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no queued POST response".to_string()))
    }
}
