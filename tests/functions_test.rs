//! Tests for the callable functions integration and dashboard stats

mod helpers;

use assert_matches::assert_matches;
use idmc_registration::models::{InquiryStatus, RegistrationStatus, SubmitInquiryRequest};
use idmc_registration::utils::errors::FunctionsError;
use idmc_registration::IdmcError;
use serde_json::json;

use helpers::*;

fn inquiry_request(email: &str) -> SubmitInquiryRequest {
    SubmitInquiryRequest {
        name: "Pastor Ramon Dela Cruz".to_string(),
        email: email.to_string(),
        subject: "Group discount".to_string(),
        message: "Do you offer discounts for groups of 20?".to_string(),
    }
}

#[tokio::test]
async fn test_reply_marks_inquiry_replied() {
    let ctx = TestContext::with_functions_mock().await;
    let mock = ctx.functions.as_ref().unwrap();
    mock.mock_send_inquiry_reply().await;

    let inquiries = &ctx.services.inquiry_service;
    let inquiry = inquiries.submit_inquiry(inquiry_request(" Ramon@Church.ph ")).await.unwrap();
    assert_eq!(inquiry.status, InquiryStatus::New);
    assert_eq!(inquiry.email, "ramon@church.ph");

    let replied = inquiries
        .reply(&inquiry.id, "Yes, groups of 10 or more get 10% off.", TEST_ADMIN)
        .await
        .unwrap();

    assert_eq!(replied.status, InquiryStatus::Replied);
    assert_eq!(replied.replied_by.as_deref(), Some(TEST_ADMIN));
    assert!(replied.replied_at.is_some());

    let bodies = mock.received_bodies().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["data"]["inquiryId"], json!(inquiry.id));
    assert_eq!(bodies[0]["data"]["to"], "ramon@church.ph");
    assert_eq!(bodies[0]["data"]["subject"], "Re: Group discount");
}

#[tokio::test]
async fn test_failed_reply_leaves_inquiry_untouched() {
    let ctx = TestContext::with_functions_mock().await;
    ctx.functions.as_ref().unwrap().mock_error("sendInquiryReply", 500).await;

    let inquiries = &ctx.services.inquiry_service;
    let inquiry = inquiries.submit_inquiry(inquiry_request("guest@example.com")).await.unwrap();
    inquiries.mark_read(&inquiry.id).await.unwrap();

    let result = inquiries.reply(&inquiry.id, "Thanks!", TEST_ADMIN).await;
    assert_matches!(
        result,
        Err(IdmcError::Functions(FunctionsError::RequestFailed { status: 500, .. }))
    );
    assert!(result.unwrap_err().is_recoverable());

    let stored = inquiries.list_inquiries(Some(InquiryStatus::Read)).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].reply.is_none());
}

#[tokio::test]
async fn test_unsuccessful_reply_result_is_an_error() {
    let ctx = TestContext::with_functions_mock().await;
    ctx.functions
        .as_ref()
        .unwrap()
        .mock_result("sendInquiryReply", json!({ "success": false }))
        .await;

    let inquiries = &ctx.services.inquiry_service;
    let inquiry = inquiries.submit_inquiry(inquiry_request("guest@example.com")).await.unwrap();

    assert_matches!(
        inquiries.reply(&inquiry.id, "Thanks!", TEST_ADMIN).await,
        Err(IdmcError::Functions(FunctionsError::InvalidResponse { .. }))
    );
}

#[tokio::test]
async fn test_reply_requires_message() {
    let ctx = TestContext::with_functions_mock().await;
    let inquiries = &ctx.services.inquiry_service;
    let inquiry = inquiries.submit_inquiry(inquiry_request("guest@example.com")).await.unwrap();

    assert_matches!(
        inquiries.reply(&inquiry.id, "   ", TEST_ADMIN).await,
        Err(IdmcError::Validation(_))
    );
    assert!(ctx.functions.as_ref().unwrap().received_bodies().await.is_empty());
}

#[tokio::test]
async fn test_trigger_stats_sync() {
    let ctx = TestContext::with_functions_mock().await;
    ctx.functions.as_ref().unwrap().mock_trigger_stats_sync().await;

    let result = ctx.services.stats_service.trigger_stats_sync().await.unwrap();
    assert!(result.success);
    assert_eq!(result.synced_at.as_deref(), Some("2026-01-15T08:00:00Z"));
}

#[tokio::test]
async fn test_dashboard_stats_without_cache() {
    let ctx = TestContext::new().await;
    let workshop = ctx
        .services
        .workshop_service
        .create_session(create_workshop_request("Preaching", Some(1)), TEST_ADMIN)
        .await
        .unwrap();

    let confirmed = ctx.create_confirmed_registration("one@example.com", 1).await;
    ctx.services
        .check_in_service
        .check_in_attendee(&confirmed.id, 0, TEST_VOLUNTEER)
        .await
        .unwrap();

    let registrations = &ctx.services.registration_service;
    registrations
        .create_registration(with_workshop(create_registration_request("two@example.com"), 0, &workshop.id))
        .await
        .unwrap();
    registrations
        .create_registration(with_workshop(create_registration_request("three@example.com"), 0, &workshop.id))
        .await
        .unwrap();
    let cancelled = registrations
        .create_registration(create_registration_request("four@example.com"))
        .await
        .unwrap();
    registrations
        .update_status(&cancelled.id, RegistrationStatus::Cancelled, TEST_ADMIN)
        .await
        .unwrap();

    ctx.services
        .inquiry_service
        .submit_inquiry(inquiry_request("guest@example.com"))
        .await
        .unwrap();

    let stats = ctx.services.stats_service.dashboard_stats().await.unwrap();

    assert_eq!(stats.total_registrations, 4);
    assert_eq!(stats.by_status["confirmed"], 1);
    assert_eq!(stats.by_status["pending_payment"], 2);
    assert_eq!(stats.by_status["cancelled"], 1);
    assert_eq!(stats.by_status["refunded"], 0);
    assert_eq!(stats.active_attendees, 4);
    assert_eq!(stats.confirmed_attendees, 2);
    assert_eq!(stats.confirmed_revenue, 3000);
    assert_eq!(stats.pending_revenue, 3000);
    assert_eq!(stats.check_in.checked_in_attendees, 1);
    assert_eq!(stats.check_in.partially_checked_in, 1);
    assert_eq!(stats.inquiries_awaiting_reply, 1);

    assert_eq!(stats.workshops.len(), 1);
    assert_eq!(stats.workshops[0].registered_count, 1);
    assert_eq!(stats.workshops[0].waitlisted, 1);
}
