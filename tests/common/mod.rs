//! Scripted transport shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use vtiger_cli::api::{Credentials, Transport, TransportError, TransportRequest, TransportResponse, VtigerClient};
use vtiger_cli::config::ClientOptions;

pub const BASE_URL: &str = "http://vtiger.local";
pub const USERNAME: &str = "admin";
pub const ACCESS_KEY: &str = "k3y";

#[derive(Clone)]
enum Scripted {
    Response(TransportResponse),
    Failure(String),
}

/// Answers by operation name; the last scripted answer for an operation repeats
#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, operation: &str, body: impl Into<String>) {
        self.push(operation, Scripted::Response(TransportResponse::ok(body)));
    }

    pub fn respond_status(&self, operation: &str, status: u16, body: impl Into<String>) {
        self.push(
            operation,
            Scripted::Response(TransportResponse {
                status,
                body: body.into(),
            }),
        );
    }

    /// Successful envelope wrapping `result`
    pub fn respond_result(&self, operation: &str, result: Value) {
        self.respond(operation, json!({"success": true, "result": result}).to_string());
    }

    pub fn fail(&self, operation: &str, message: &str) {
        self.push(operation, Scripted::Failure(message.to_string()));
    }

    /// Challenge valid for five more minutes plus a login for user 19x1
    pub fn script_login(&self) {
        self.respond_result(
            "getchallenge",
            json!({
                "token": "fakeToken00000",
                "serverTime": now(),
                "expireTime": now() + 300
            }),
        );
        self.respond_result(
            "login",
            json!({
                "sessionName": "sess-1",
                "userId": "19x1",
                "version": "0.22",
                "vtigerVersion": "7.1.0"
            }),
        );
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, operation: &str) -> Vec<TransportRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.param("operation").as_deref() == Some(operation))
            .collect()
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.requests_for(operation).len()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn push(&self, operation: &str, answer: Scripted) {
        self.script
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(answer);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let operation = request.param("operation").unwrap_or_default();
        let answer = {
            let mut script = self.script.lock().unwrap();
            let queue = script.get_mut(&operation);
            match queue {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match answer {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Failure(message)) => Err(TransportError::new(message)),
            None => Err(TransportError::new(format!("no scripted answer for '{}'", operation))),
        }
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn options() -> ClientOptions {
    ClientOptions::new(BASE_URL, Credentials::new(USERNAME, ACCESS_KEY).unwrap())
}

pub fn client(transport: &Arc<FakeTransport>) -> VtigerClient {
    VtigerClient::with_transport(options(), transport.clone()).unwrap()
}
