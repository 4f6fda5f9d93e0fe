//! Contact inquiry service
//!
//! Replies are sent by the hosted `sendInquiryReply` function; the inquiry is
//! only marked replied once that call succeeds.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::database::store::InquiryStore;
use crate::models::activity::NewActivityLogEntry;
use crate::models::inquiry::{ContactInquiry, InquiryStatus, SubmitInquiryRequest};
use crate::services::activity::ActivityService;
use crate::services::functions::{FunctionsClient, InquiryReplyPayload, SEND_INQUIRY_REPLY};
use crate::utils::errors::{FunctionsError, IdmcError, Result};
use crate::utils::helpers::{generate_uuid, is_valid_email, normalize_email, normalize_whitespace};

#[derive(Clone)]
pub struct InquiryService {
    inquiries: Arc<dyn InquiryStore>,
    functions: FunctionsClient,
    activity: ActivityService,
}

impl InquiryService {
    pub fn new(inquiries: Arc<dyn InquiryStore>, functions: FunctionsClient, activity: ActivityService) -> Self {
        Self { inquiries, functions, activity }
    }

    pub async fn submit_inquiry(&self, request: SubmitInquiryRequest) -> Result<ContactInquiry> {
        let name = normalize_whitespace(&request.name);
        let email = normalize_email(&request.email);
        let subject = normalize_whitespace(&request.subject);
        let message = request.message.trim().to_string();

        if name.is_empty() || message.is_empty() {
            return Err(IdmcError::Validation("Name and message are required".to_string()));
        }
        if !is_valid_email(&email) {
            return Err(IdmcError::Validation(format!("Invalid email: {}", email)));
        }

        let now = Utc::now();
        let inquiry = ContactInquiry {
            id: generate_uuid(),
            name,
            email,
            subject,
            message,
            status: InquiryStatus::New,
            reply: None,
            replied_by: None,
            replied_at: None,
            created_at: now,
            updated_at: now,
        };

        self.inquiries.insert(&inquiry).await?;
        info!(inquiry_id = %inquiry.id, "Inquiry received");
        Ok(inquiry)
    }

    pub async fn list_inquiries(&self, status: Option<InquiryStatus>) -> Result<Vec<ContactInquiry>> {
        self.inquiries.list(status).await
    }

    async fn get(&self, inquiry_id: &str) -> Result<ContactInquiry> {
        self.inquiries
            .find_by_id(inquiry_id)
            .await?
            .ok_or_else(|| IdmcError::InquiryNotFound { inquiry_id: inquiry_id.to_string() })
    }

    /// Mark a new inquiry as read; other statuses are left alone
    pub async fn mark_read(&self, inquiry_id: &str) -> Result<ContactInquiry> {
        let mut inquiry = self.get(inquiry_id).await?;
        if inquiry.status == InquiryStatus::New {
            inquiry.status = InquiryStatus::Read;
            inquiry.updated_at = Utc::now();
            self.inquiries.update(&inquiry).await?;
        }
        Ok(inquiry)
    }

    pub async fn archive(&self, inquiry_id: &str, admin: &str) -> Result<ContactInquiry> {
        let mut inquiry = self.get(inquiry_id).await?;
        inquiry.status = InquiryStatus::Archived;
        inquiry.updated_at = Utc::now();
        self.inquiries.update(&inquiry).await?;

        self.activity
            .log(NewActivityLogEntry::new(admin, "archive_inquiry", "inquiry", Some(inquiry_id)))
            .await;
        Ok(inquiry)
    }

    pub async fn reply(&self, inquiry_id: &str, message: &str, admin: &str) -> Result<ContactInquiry> {
        let message = message.trim();
        if message.is_empty() {
            return Err(IdmcError::Validation("Reply message is required".to_string()));
        }

        let mut inquiry = self.get(inquiry_id).await?;
        let subject = if inquiry.subject.is_empty() {
            "Re: Your inquiry".to_string()
        } else {
            format!("Re: {}", inquiry.subject)
        };

        let result = self
            .functions
            .send_inquiry_reply(&InquiryReplyPayload {
                inquiry_id: inquiry.id.clone(),
                to: inquiry.email.clone(),
                subject,
                message: message.to_string(),
                replied_by: admin.to_string(),
            })
            .await?;

        if !result.success {
            return Err(FunctionsError::InvalidResponse {
                name: SEND_INQUIRY_REPLY.to_string(),
                reason: "reply was not sent".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        inquiry.status = InquiryStatus::Replied;
        inquiry.reply = Some(message.to_string());
        inquiry.replied_by = Some(admin.to_string());
        inquiry.replied_at = Some(now);
        inquiry.updated_at = now;
        self.inquiries.update(&inquiry).await?;

        self.activity
            .log(NewActivityLogEntry::new(admin, "reply_inquiry", "inquiry", Some(inquiry_id)))
            .await;
        Ok(inquiry)
    }
}
