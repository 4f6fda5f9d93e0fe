//! Test data helpers for creating registrations, attendees and sessions

use chrono::{Duration, Utc};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;

use idmc_registration::models::{
    Attendee, AttendeeCategory, CommunicationFlags, CreateRegistrationRequest, CreateSessionRequest, Payment,
    PaymentMethod, PaymentStatus, Registration, RegistrationStatus, SessionType, WorkshopChoice,
};
use idmc_registration::utils::helpers::{generate_uuid, short_code_suffix};

pub const TEST_ADMIN: &str = "admin@idmc.org";
pub const TEST_VOLUNTEER: &str = "volunteer@idmc.org";

pub fn create_test_attendee(first_name: &str, last_name: &str, email: &str) -> Attendee {
    Attendee {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        middle_name: None,
        email: email.to_string(),
        phone: "09171234567".to_string(),
        ministry_role: None,
    }
}

/// Attendee with a generated name and a unique email
pub fn create_random_attendee() -> Attendee {
    let first: String = FirstName().fake();
    let last: String = LastName().fake();
    let email = format!(
        "{}.{}.{}@example.com",
        first.to_lowercase().replace(' ', ""),
        last.to_lowercase().replace(' ', ""),
        &generate_uuid()[..8]
    );
    create_test_attendee(&first, &last, &email)
}

pub fn create_registration_request(email: &str) -> CreateRegistrationRequest {
    CreateRegistrationRequest {
        primary_attendee: create_test_attendee("Maria", "Santos", email),
        additional_attendees: vec![],
        category: AttendeeCategory::Regular,
        church_name: "Grace Community Church".to_string(),
        church_city: Some("Quezon City".to_string()),
        workshop_choices: vec![],
        payment_method: Some(PaymentMethod::Gcash),
        payment_reference: None,
        proof_url: None,
    }
}

/// Request with `companions` generated additional attendees
pub fn create_group_request(email: &str, companions: usize) -> CreateRegistrationRequest {
    let mut request = create_registration_request(email);
    request.additional_attendees = (0..companions).map(|_| create_random_attendee()).collect();
    request
}

pub fn with_workshop(mut request: CreateRegistrationRequest, attendee_index: usize, session_id: &str) -> CreateRegistrationRequest {
    request.workshop_choices.push(WorkshopChoice {
        attendee_index,
        session_id: session_id.to_string(),
    });
    request
}

pub fn create_workshop_request(title: &str, capacity: Option<i32>) -> CreateSessionRequest {
    CreateSessionRequest {
        title: title.to_string(),
        description: None,
        session_type: SessionType::Workshop,
        speaker_ids: vec![],
        venue: Some("Function Room 1".to_string()),
        starts_at: None,
        ends_at: None,
        capacity,
        time_slot: Some("Workshop Block A".to_string()),
    }
}

/// A stored registration built directly, bypassing the service. Used to
/// model documents as an older client wrote them.
pub fn create_stored_registration(short_code: &str, companions: usize, status: RegistrationStatus) -> Registration {
    let now = Utc::now();
    Registration {
        id: format!("REG-2026-{}", short_code),
        short_code: short_code.to_string(),
        short_code_suffix: short_code_suffix(short_code),
        primary_attendee: create_test_attendee("Juan", "Cruz", &format!("{}@example.com", short_code.to_lowercase())),
        additional_attendees: (0..companions).map(|_| create_random_attendee()).collect(),
        category: AttendeeCategory::Regular,
        church_name: "Living Word Fellowship".to_string(),
        church_city: None,
        workshop_selections: vec![],
        payment: Payment {
            method: Some(PaymentMethod::BankTransfer),
            reference: None,
            proof_url: None,
            status: PaymentStatus::Verified,
            amount: 1500 * (1 + companions as i64),
            currency: "PHP".to_string(),
            submitted_at: None,
            verified_at: None,
            verified_by: None,
        },
        invoice: None,
        status,
        attendee_check_ins: vec![],
        checked_in: false,
        checked_in_at: None,
        communications: CommunicationFlags::default(),
        payment_deadline: now + Duration::days(7),
        version: 0,
        created_at: now,
        updated_at: now,
    }
}
