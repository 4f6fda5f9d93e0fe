//! Remote callable functions client
//!
//! Invokes the hosted functions `sendInquiryReply` and `triggerStatsSync`.
//! Calls use the callable protocol: POST `{"data": ...}` to
//! `{base_url}/{name}` and read the `result` field of the response.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::config::settings::FunctionsConfig;
use crate::utils::errors::{FunctionsError, IdmcError, Result};
use crate::utils::logging::log_api_error;

pub const SEND_INQUIRY_REPLY: &str = "sendInquiryReply";
pub const TRIGGER_STATS_SYNC: &str = "triggerStatsSync";

#[derive(Debug, Serialize)]
struct CallableRequest<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Debug, Deserialize)]
struct CallableResponse<R> {
    result: Option<R>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InquiryReplyPayload {
    pub inquiry_id: String,
    pub to: String,
    pub subject: String,
    pub message: String,
    pub replied_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InquiryReplyResult {
    pub success: bool,
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsSyncResult {
    pub success: bool,
    pub synced_at: Option<String>,
}

/// Client for the hosted callable functions
#[derive(Clone, Debug)]
pub struct FunctionsClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl FunctionsClient {
    pub fn new(config: &FunctionsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("idmc-registration/1.0")
            .build()?;

        // Url::join drops the last path segment unless it ends in '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            api_key: config.api_key.clone(),
        })
    }

    /// Invoke a callable function by name
    pub async fn call<T, R>(&self, name: &str, data: &T) -> Result<R>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(name)?;
        debug!(function = name, url = %url, "Invoking callable function");

        let mut request = self.client.post(url).json(&CallableRequest { data });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log_api_error(name, &format!("status {}", status), Some(&body));
            return Err(FunctionsError::RequestFailed {
                name: name.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let payload: CallableResponse<R> = response.json().await.map_err(|e| {
            IdmcError::from(FunctionsError::InvalidResponse {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })?;

        payload.result.ok_or_else(|| {
            FunctionsError::InvalidResponse {
                name: name.to_string(),
                reason: "missing result".to_string(),
            }
            .into()
        })
    }

    pub async fn send_inquiry_reply(&self, payload: &InquiryReplyPayload) -> Result<InquiryReplyResult> {
        let result: InquiryReplyResult = self.call(SEND_INQUIRY_REPLY, payload).await?;
        info!(inquiry_id = %payload.inquiry_id, success = result.success, "Inquiry reply dispatched");
        Ok(result)
    }

    pub async fn trigger_stats_sync(&self) -> Result<StatsSyncResult> {
        let result: StatsSyncResult = self.call(TRIGGER_STATS_SYNC, &serde_json::json!({})).await?;
        info!(success = result.success, "Stats sync triggered");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_path() {
        let config = FunctionsConfig {
            base_url: "http://localhost:5001/idmc-2026/us-central1".to_string(),
            timeout_seconds: 5,
            api_key: None,
        };
        let client = FunctionsClient::new(&config).unwrap();
        let url = client.base_url.join(SEND_INQUIRY_REPLY).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/idmc-2026/us-central1/sendInquiryReply");
    }

    #[test]
    fn test_reply_payload_is_camel_case() {
        let payload = InquiryReplyPayload {
            inquiry_id: "inq-1".into(),
            to: "guest@example.com".into(),
            subject: "Re: Parking".into(),
            message: "Yes".into(),
            replied_by: "admin@idmc.org".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["inquiryId"], "inq-1");
        assert_eq!(json["repliedBy"], "admin@idmc.org");
    }
}
