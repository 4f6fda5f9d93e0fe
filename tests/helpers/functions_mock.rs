//! Mock callable functions server
//!
//! Simulates the hosted `sendInquiryReply` and `triggerStatsSync` functions
//! with wiremock.

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const FUNCTIONS_PATH: &str = "/idmc-2026/us-central1";

pub struct FunctionsMockServer {
    pub server: MockServer,
}

impl FunctionsMockServer {
    pub async fn new() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Base URL to put in `FunctionsConfig`
    pub fn base_url(&self) -> String {
        format!("{}{}", self.server.uri(), FUNCTIONS_PATH)
    }

    fn function_path(name: &str) -> String {
        format!("{}/{}", FUNCTIONS_PATH, name)
    }

    /// Respond to `name` with `{"result": result}`
    pub async fn mock_result(&self, name: &str, result: Value) {
        Mock::given(method("POST"))
            .and(path(Self::function_path(name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
            .mount(&self.server)
            .await;
    }

    /// Respond to `name` with a callable error status
    pub async fn mock_error(&self, name: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(Self::function_path(name)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": { "status": "INTERNAL", "message": "boom" }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_send_inquiry_reply(&self) {
        self.mock_result("sendInquiryReply", json!({ "success": true, "messageId": "msg-1" }))
            .await;
    }

    pub async fn mock_trigger_stats_sync(&self) {
        self.mock_result(
            "triggerStatsSync",
            json!({ "success": true, "syncedAt": "2026-01-15T08:00:00Z" }),
        )
        .await;
    }

    /// Request bodies received so far
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }
}
