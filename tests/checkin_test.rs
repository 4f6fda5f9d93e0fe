//! Check-in integration tests
//!
//! Per-attendee check-in, the legacy aggregate flag, QR payloads, lookup and
//! concurrent writers, all against the in-memory store.

mod helpers;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use idmc_registration::config::Settings;
use idmc_registration::database::{MemoryStore, RegistrationStore};
use idmc_registration::models::{Registration, RegistrationFilter, RegistrationStatus};
use idmc_registration::services::{
    are_all_attendees_checked_in, initialize_attendee_check_ins, ActivityService, CheckInService, MatchKind,
};
use idmc_registration::IdmcError;

use helpers::*;

#[tokio::test]
async fn test_checking_in_same_attendee_twice_fails() {
    let ctx = TestContext::new().await;
    let registration = ctx.create_confirmed_registration("maria@example.com", 1).await;
    let checkin = &ctx.services.check_in_service;

    checkin.check_in_attendee(&registration.id, 1, TEST_VOLUNTEER).await.unwrap();
    let second = checkin.check_in_attendee(&registration.id, 1, TEST_VOLUNTEER).await;

    assert_matches!(second, Err(IdmcError::AttendeeAlreadyCheckedIn { index: 1 }));
    assert_eq!(second.unwrap_err().code(), "ATTENDEE_ALREADY_CHECKED_IN");
}

#[tokio::test]
async fn test_check_in_requires_confirmed_registration() {
    let ctx = TestContext::new().await;
    let pending = ctx
        .services
        .registration_service
        .create_registration(create_registration_request("pending@example.com"))
        .await
        .unwrap();

    assert_matches!(
        ctx.services.check_in_service.check_in_attendee(&pending.id, 0, TEST_VOLUNTEER).await,
        Err(IdmcError::RegistrationNotConfirmed { .. })
    );
}

#[tokio::test]
async fn test_check_in_rejects_out_of_range_index() {
    let ctx = TestContext::new().await;
    let registration = ctx.create_confirmed_registration("solo@example.com", 0).await;

    assert_matches!(
        ctx.services.check_in_service.check_in_attendee(&registration.id, 1, TEST_VOLUNTEER).await,
        Err(IdmcError::InvalidAttendeeIndex { index: 1, total: 1 })
    );
}

#[tokio::test]
async fn test_unknown_registration() {
    let ctx = TestContext::new().await;
    assert_matches!(
        ctx.services.check_in_service.check_in_all("REG-2026-ZZZZZZ", TEST_VOLUNTEER).await,
        Err(IdmcError::RegistrationNotFound { .. })
    );
}

#[tokio::test]
async fn test_legacy_flag_follows_every_slot() {
    let ctx = TestContext::new().await;
    let registration = ctx.create_confirmed_registration("pair@example.com", 1).await;
    let checkin = &ctx.services.check_in_service;

    let after_first = checkin.check_in_attendee(&registration.id, 0, TEST_VOLUNTEER).await.unwrap();
    assert!(!after_first.checked_in);
    assert!(after_first.checked_in_at.is_none());
    assert_eq!(after_first.attendee_check_ins[0].checked_in_by.as_deref(), Some(TEST_VOLUNTEER));

    let after_second = checkin.check_in_attendee(&registration.id, 1, TEST_VOLUNTEER).await.unwrap();
    assert!(after_second.checked_in);
    assert!(after_second.checked_in_at.is_some());
    assert!(are_all_attendees_checked_in(&after_second));

    let undone = checkin.undo_check_in(&registration.id, Some(0), TEST_ADMIN).await.unwrap();
    assert!(!undone.checked_in);
    assert!(undone.checked_in_at.is_none());
    assert!(!undone.attendee_check_ins[0].checked_in);
    assert!(undone.attendee_check_ins[1].checked_in);
}

#[tokio::test]
async fn test_check_in_all_then_already_checked_in() {
    let ctx = TestContext::new().await;
    let registration = ctx.create_confirmed_registration("group@example.com", 2).await;
    let checkin = &ctx.services.check_in_service;

    checkin.check_in_attendee(&registration.id, 1, TEST_VOLUNTEER).await.unwrap();
    let all = checkin.check_in_all(&registration.id, TEST_VOLUNTEER).await.unwrap();
    assert_eq!(all.checked_in_count(), 3);
    assert!(all.checked_in);

    assert_matches!(
        checkin.check_in_all(&registration.id, TEST_VOLUNTEER).await,
        Err(IdmcError::AlreadyCheckedIn { .. })
    );
}

#[tokio::test]
async fn test_undo_requires_checked_in_slot() {
    let ctx = TestContext::new().await;
    let registration = ctx.create_confirmed_registration("undo@example.com", 1).await;

    assert_matches!(
        ctx.services.check_in_service.undo_check_in(&registration.id, Some(1), TEST_ADMIN).await,
        Err(IdmcError::AttendeeNotCheckedIn { index: 1 })
    );

    let checkin = &ctx.services.check_in_service;
    checkin.check_in_all(&registration.id, TEST_VOLUNTEER).await.unwrap();
    let cleared = checkin.undo_check_in(&registration.id, None, TEST_ADMIN).await.unwrap();
    assert_eq!(cleared.checked_in_count(), 0);
    assert!(!cleared.checked_in);
}

#[tokio::test]
async fn test_qr_payload_checks_in_named_slot() {
    let ctx = TestContext::new().await;
    let registration = ctx.create_confirmed_registration("qr@example.com", 1).await;
    let checkin = &ctx.services.check_in_service;

    let payload = format!("{}-1", registration.id.to_lowercase());
    let updated = checkin.check_in_from_qr(&payload, TEST_VOLUNTEER).await.unwrap();
    assert!(!updated.attendee_check_ins[0].checked_in);
    assert!(updated.attendee_check_ins[1].checked_in);

    let json = format!(r#"{{"registrationId":"{}"}}"#, registration.id);
    let updated = checkin.check_in_from_qr(&json, TEST_VOLUNTEER).await.unwrap();
    assert!(updated.checked_in);

    assert_matches!(
        checkin.check_in_from_qr("garbage", TEST_VOLUNTEER).await,
        Err(IdmcError::InvalidQrCode)
    );
}

#[tokio::test]
async fn test_legacy_document_carries_flag_into_slots() {
    let ctx = TestContext::new().await;
    let mut legacy = create_stored_registration("LEGACY", 1, RegistrationStatus::Confirmed);
    legacy.checked_in = true;
    legacy.checked_in_at = Some(chrono::Utc::now());
    RegistrationStore::insert(ctx.store.as_ref(), &legacy).await.unwrap();

    let slots = initialize_attendee_check_ins(&legacy);
    assert_eq!(slots.len(), 2);
    assert!(slots.iter().all(|slot| slot.checked_in));

    assert_matches!(
        ctx.services.check_in_service.check_in_attendee(&legacy.id, 0, TEST_VOLUNTEER).await,
        Err(IdmcError::AttendeeAlreadyCheckedIn { index: 0 })
    );
}

#[tokio::test]
async fn test_all_checked_in_needs_a_slot_per_attendee() {
    let mut registration = create_stored_registration("ABCDEF", 1, RegistrationStatus::Confirmed);
    assert!(!are_all_attendees_checked_in(&registration));

    registration.attendee_check_ins = initialize_attendee_check_ins(&registration);
    registration.attendee_check_ins[0].checked_in = true;
    assert!(!are_all_attendees_checked_in(&registration));

    registration.attendee_check_ins[1].checked_in = true;
    assert!(are_all_attendees_checked_in(&registration));

    registration.attendee_check_ins.pop();
    assert!(!are_all_attendees_checked_in(&registration));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_check_ins_of_different_attendees_all_land() {
    let mut settings = Settings::default();
    settings.event.check_in_retries = 10;
    let ctx = TestContext::with_settings(settings).await;
    let registration = ctx.create_confirmed_registration("family@example.com", 3).await;

    let handles: Vec<_> = (0..4)
        .map(|index| {
            let checkin = ctx.services.check_in_service.clone();
            let id = registration.id.clone();
            tokio::spawn(async move { checkin.check_in_attendee(&id, index, TEST_VOLUNTEER).await })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.expect("task panicked").expect("check-in failed");
    }

    let stored = ctx.services.registration_service.get_registration(&registration.id).await.unwrap();
    assert_eq!(stored.checked_in_count(), 4);
    assert!(stored.checked_in);
}

/// Store whose conditional writes always lose
struct AlwaysConflicting(MemoryStore);

#[async_trait]
impl RegistrationStore for AlwaysConflicting {
    async fn insert(&self, registration: &Registration) -> idmc_registration::Result<()> {
        RegistrationStore::insert(&self.0, registration).await
    }
    async fn find_by_id(&self, id: &str) -> idmc_registration::Result<Option<Registration>> {
        RegistrationStore::find_by_id(&self.0, id).await
    }
    async fn find_by_short_code(&self, code: &str) -> idmc_registration::Result<Option<Registration>> {
        RegistrationStore::find_by_short_code(&self.0, code).await
    }
    async fn find_by_suffix(&self, suffix: &str) -> idmc_registration::Result<Vec<Registration>> {
        RegistrationStore::find_by_suffix(&self.0, suffix).await
    }
    async fn find_by_email(&self, email: &str) -> idmc_registration::Result<Vec<Registration>> {
        RegistrationStore::find_by_email(&self.0, email).await
    }
    async fn primary_email_exists(&self, email: &str) -> idmc_registration::Result<bool> {
        RegistrationStore::primary_email_exists(&self.0, email).await
    }
    async fn short_code_exists(&self, code: &str) -> idmc_registration::Result<bool> {
        RegistrationStore::short_code_exists(&self.0, code).await
    }
    async fn list(&self, filter: &RegistrationFilter) -> idmc_registration::Result<Vec<Registration>> {
        RegistrationStore::list(&self.0, filter).await
    }
    async fn list_waitlisted(&self, session_id: &str) -> idmc_registration::Result<Vec<Registration>> {
        RegistrationStore::list_waitlisted(&self.0, session_id).await
    }
    async fn replace(&self, _registration: &Registration) -> idmc_registration::Result<bool> {
        Ok(false)
    }
    async fn delete_all(&self) -> idmc_registration::Result<u64> {
        RegistrationStore::delete_all(&self.0).await
    }
    async fn count(&self) -> idmc_registration::Result<i64> {
        RegistrationStore::count(&self.0).await
    }
}

#[tokio::test]
async fn test_gives_up_after_repeated_conflicts() {
    let inner = MemoryStore::new();
    let registration = create_stored_registration("RACEME", 0, RegistrationStatus::Confirmed);
    RegistrationStore::insert(&inner, &registration).await.unwrap();

    let store = Arc::new(AlwaysConflicting(inner));
    let service = CheckInService::new(store, ActivityService::new(Arc::new(MemoryStore::new())), 3);

    let result = service.check_in_attendee(&registration.id, 0, TEST_VOLUNTEER).await;
    assert_matches!(result, Err(IdmcError::ConcurrentModification { .. }));
    assert_eq!(result.unwrap_err().code(), "CONCURRENT_MODIFICATION");
}

#[tokio::test]
async fn test_search_picks_lookup_by_query_shape() {
    let ctx = TestContext::new().await;
    let registration = ctx.create_confirmed_registration("lookup@example.com", 1).await;
    let lookup = &ctx.services.lookup_service;

    let by_id = lookup.search_registrations(&format!("  {}  ", registration.id)).await.unwrap();
    assert_eq!(by_id.matched_by, MatchKind::RegistrationId);
    assert_eq!(by_id.registrations[0].id, registration.id);

    let by_email = lookup.search_registrations("LOOKUP@Example.com").await.unwrap();
    assert_eq!(by_email.matched_by, MatchKind::Email);

    let companion_email = registration.additional_attendees[0].email.to_uppercase();
    let by_companion = lookup.search_registrations(&companion_email).await.unwrap();
    assert_eq!(by_companion.registrations[0].id, registration.id);

    let by_code = lookup.search_registrations(&registration.short_code.to_lowercase()).await.unwrap();
    assert_eq!(by_code.matched_by, MatchKind::ShortCode);

    let by_suffix = lookup.search_registrations(&registration.short_code_suffix).await.unwrap();
    assert_eq!(by_suffix.matched_by, MatchKind::Suffix);
    assert!(by_suffix.registrations.iter().any(|r| r.id == registration.id));

    let by_text = lookup.search_registrations("community church").await.unwrap();
    assert_eq!(by_text.matched_by, MatchKind::Text);

    let empty = lookup.search_registrations("   ").await.unwrap();
    assert_eq!(empty.matched_by, MatchKind::None);
    assert!(empty.registrations.is_empty());
}

#[tokio::test]
async fn test_exact_miss_falls_through_to_text_scan() {
    let ctx = TestContext::new().await;
    // "Cruz" is a valid suffix shape, but only matches as a surname
    let registration = create_stored_registration("HJKMNP", 0, RegistrationStatus::Confirmed);
    RegistrationStore::insert(ctx.store.as_ref(), &registration).await.unwrap();

    let result = ctx.services.lookup_service.search_registrations("Cruz").await.unwrap();
    assert_eq!(result.matched_by, MatchKind::Text);
    assert_eq!(result.registrations.len(), 1);
}

#[tokio::test]
async fn test_check_in_stats() {
    let ctx = TestContext::new().await;
    let full = ctx.create_confirmed_registration("full@example.com", 1).await;
    let partial = ctx.create_confirmed_registration("partial@example.com", 1).await;
    ctx.create_confirmed_registration("none@example.com", 0).await;
    ctx.services
        .registration_service
        .create_registration(create_registration_request("pending@example.com"))
        .await
        .unwrap();

    let checkin = &ctx.services.check_in_service;
    checkin.check_in_all(&full.id, TEST_VOLUNTEER).await.unwrap();
    checkin.check_in_attendee(&partial.id, 0, TEST_VOLUNTEER).await.unwrap();

    let stats = checkin.get_check_in_stats().await.unwrap();
    assert_eq!(stats.confirmed_registrations, 3);
    assert_eq!(stats.total_attendees, 5);
    assert_eq!(stats.checked_in_attendees, 3);
    assert_eq!(stats.fully_checked_in, 1);
    assert_eq!(stats.partially_checked_in, 1);
    assert_eq!(stats.not_checked_in, 1);
    assert!((stats.percentage - 60.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_check_in_writes_activity_log() {
    let ctx = TestContext::new().await;
    let registration = ctx.create_confirmed_registration("audit@example.com", 0).await;
    ctx.services
        .check_in_service
        .check_in_attendee(&registration.id, 0, TEST_VOLUNTEER)
        .await
        .unwrap();

    let entries = ctx.services.activity_service.recent(10).await.unwrap();
    let entry = entries.iter().find(|e| e.action == "check_in").expect("check-in logged");
    assert_eq!(entry.admin, TEST_VOLUNTEER);
    assert_eq!(entry.target_id.as_deref(), Some(registration.id.as_str()));
}
