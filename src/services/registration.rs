//! Registration service implementation
//!
//! This service handles new registrations, payment proof submission, the
//! admin status lifecycle (verification, invoicing, cancellation) and the
//! workshop seats each registration holds.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::settings::EventConfig;
use crate::database::store::{update_registration, RegistrationStore};
use crate::models::activity::NewActivityLogEntry;
use crate::models::registration::{
    Attendee, CommunicationFlag, CommunicationFlags, CreateRegistrationRequest, Payment, PaymentMethod,
    PaymentStatus, Registration, RegistrationFilter, RegistrationStatus, SeatStatus, WorkshopChoice,
    WorkshopSelection,
};
use crate::models::session::SeatReservation;
use crate::services::activity::ActivityService;
use crate::services::checkin::initialize_attendee_check_ins;
use crate::services::content::ContentService;
use crate::services::invoice::InvoiceService;
use crate::services::workshop::WorkshopService;
use crate::utils::errors::{IdmcError, Result};
use crate::utils::helpers::{
    generate_short_code, is_valid_email, is_valid_phone, normalize_email, normalize_phone, normalize_whitespace,
    registration_id, short_code_suffix,
};
use crate::utils::logging::log_registration_event;

/// Registration service for the public form and the admin dashboard
#[derive(Clone)]
pub struct RegistrationService {
    registrations: Arc<dyn RegistrationStore>,
    workshops: WorkshopService,
    invoices: InvoiceService,
    content: ContentService,
    activity: ActivityService,
    event: EventConfig,
    waitlist_enabled: bool,
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| normalize_whitespace(&v))
        .filter(|v| !v.is_empty())
}

/// Trim and normalise one attendee. The primary attendee must give an email
/// and phone; additional attendees may leave them blank.
fn normalize_attendee(attendee: Attendee, label: &str, contact_required: bool) -> Result<Attendee> {
    let first_name = normalize_whitespace(&attendee.first_name);
    let last_name = normalize_whitespace(&attendee.last_name);
    if first_name.is_empty() || last_name.is_empty() {
        return Err(IdmcError::Validation(format!("{}: first and last name are required", label)));
    }

    let email = normalize_email(&attendee.email);
    if email.is_empty() {
        if contact_required {
            return Err(IdmcError::Validation(format!("{}: email is required", label)));
        }
    } else if !is_valid_email(&email) {
        return Err(IdmcError::Validation(format!("{}: invalid email {}", label, email)));
    }

    let phone = normalize_phone(&attendee.phone);
    if phone.is_empty() {
        if contact_required {
            return Err(IdmcError::Validation(format!("{}: phone is required", label)));
        }
    } else if !is_valid_phone(&phone) {
        return Err(IdmcError::Validation(format!("{}: invalid phone {}", label, attendee.phone.trim())));
    }

    Ok(Attendee {
        first_name,
        last_name,
        middle_name: optional_text(attendee.middle_name),
        email,
        phone,
        ministry_role: optional_text(attendee.ministry_role),
    })
}

impl RegistrationService {
    pub fn new(
        registrations: Arc<dyn RegistrationStore>,
        workshops: WorkshopService,
        invoices: InvoiceService,
        content: ContentService,
        activity: ActivityService,
        event: EventConfig,
        waitlist_enabled: bool,
    ) -> Self {
        Self {
            registrations,
            workshops,
            invoices,
            content,
            activity,
            event,
            waitlist_enabled,
        }
    }

    /// Create a registration from the public form
    pub async fn create_registration(&self, request: CreateRegistrationRequest) -> Result<Registration> {
        let primary = normalize_attendee(request.primary_attendee, "Primary attendee", true)?;
        let additional = request
            .additional_attendees
            .into_iter()
            .enumerate()
            .map(|(i, attendee)| normalize_attendee(attendee, &format!("Attendee {}", i + 2), false))
            .collect::<Result<Vec<_>>>()?;

        let church_name = normalize_whitespace(&request.church_name);
        if church_name.is_empty() {
            return Err(IdmcError::Validation("Church name is required".to_string()));
        }

        let mut seen = HashSet::new();
        for email in std::iter::once(&primary.email)
            .chain(additional.iter().map(|a| &a.email))
            .filter(|email| !email.is_empty())
        {
            if !seen.insert(email.as_str()) {
                return Err(IdmcError::DuplicateEmail { email: email.clone() });
            }
        }

        if self.registrations.primary_email_exists(&primary.email).await? {
            debug!(email = %primary.email, "Primary email already registered");
            return Err(IdmcError::DuplicateEmail { email: primary.email });
        }

        let total_attendees = 1 + additional.len();
        let mut chosen = HashSet::new();
        for choice in &request.workshop_choices {
            if choice.attendee_index >= total_attendees {
                return Err(IdmcError::InvalidAttendeeIndex {
                    index: choice.attendee_index,
                    total: total_attendees,
                });
            }
            if !chosen.insert((choice.attendee_index, choice.session_id.as_str())) {
                return Err(IdmcError::Validation(format!(
                    "Workshop {} selected twice for attendee {}",
                    choice.session_id, choice.attendee_index
                )));
            }
        }

        let short_code = self.allocate_short_code().await?;
        let id = registration_id(self.event.year, &short_code);

        let now = Utc::now();
        let payment_deadline = Duration::try_days(self.event.payment_deadline_days)
            .and_then(|days| now.checked_add_signed(days))
            .ok_or_else(|| {
                IdmcError::Config(format!(
                    "payment_deadline_days {} is out of range",
                    self.event.payment_deadline_days
                ))
            })?;
        let pricing = self.content.get_pricing().await?;
        let amount = pricing.price_for(request.category, now) * total_attendees as i64;

        let proof_url = optional_text(request.proof_url);
        let (status, payment_status, submitted_at) = match &proof_url {
            Some(_) => (RegistrationStatus::PendingVerification, PaymentStatus::Submitted, Some(now)),
            None => (RegistrationStatus::PendingPayment, PaymentStatus::Pending, None),
        };

        let workshop_selections = self.reserve_workshops(&request.workshop_choices).await?;

        let mut registration = Registration {
            id,
            short_code_suffix: short_code_suffix(&short_code),
            short_code,
            primary_attendee: primary,
            additional_attendees: additional,
            category: request.category,
            church_name,
            church_city: optional_text(request.church_city),
            workshop_selections,
            payment: Payment {
                method: request.payment_method,
                reference: optional_text(request.payment_reference),
                proof_url,
                status: payment_status,
                amount,
                currency: pricing.currency,
                submitted_at,
                verified_at: None,
                verified_by: None,
            },
            invoice: None,
            status,
            attendee_check_ins: Vec::new(),
            checked_in: false,
            checked_in_at: None,
            communications: CommunicationFlags::default(),
            payment_deadline,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        registration.attendee_check_ins = initialize_attendee_check_ins(&registration);

        if let Err(e) = self.registrations.insert(&registration).await {
            self.release_reserved(&registration.workshop_selections).await;
            return Err(e);
        }

        log_registration_event(&registration.id, "created", Some(registration.status.as_str()));
        info!(
            registration_id = %registration.id,
            attendees = total_attendees,
            amount = amount,
            "Registration created"
        );

        Ok(registration)
    }

    async fn allocate_short_code(&self) -> Result<String> {
        for attempt in 1..=self.event.short_code_attempts.max(1) {
            let code = generate_short_code();
            if !self.registrations.short_code_exists(&code).await? {
                return Ok(code);
            }
            debug!(attempt = attempt, "Short code collision, regenerating");
        }
        Err(IdmcError::ShortCodeExhausted)
    }

    /// Reserve a seat per workshop choice. A full workshop waitlists the
    /// choice when the waitlist is enabled, otherwise every seat taken so far
    /// is given back and the request fails.
    async fn reserve_workshops(&self, choices: &[WorkshopChoice]) -> Result<Vec<WorkshopSelection>> {
        let mut selections = Vec::with_capacity(choices.len());

        for choice in choices {
            let session = match self.workshops.get_session(&choice.session_id).await {
                Ok(session) if session.is_workshop() => session,
                Ok(_) => {
                    self.release_reserved(&selections).await;
                    return Err(IdmcError::Validation(format!("{} is not a workshop", choice.session_id)));
                }
                Err(e) => {
                    self.release_reserved(&selections).await;
                    return Err(e);
                }
            };

            let status = match self.workshops.reserve_seat(&session.id).await {
                Ok(SeatReservation::Reserved) => SeatStatus::Reserved,
                Ok(SeatReservation::Full) if self.waitlist_enabled => SeatStatus::Waitlisted,
                Ok(SeatReservation::Full) => {
                    self.release_reserved(&selections).await;
                    return Err(IdmcError::WorkshopFull { session_id: session.id });
                }
                Err(e) => {
                    self.release_reserved(&selections).await;
                    return Err(e);
                }
            };

            selections.push(WorkshopSelection {
                attendee_index: choice.attendee_index,
                session_id: session.id,
                time_slot: session.time_slot,
                status,
            });
        }

        Ok(selections)
    }

    /// Best-effort release of reserved seats
    async fn release_reserved(&self, selections: &[WorkshopSelection]) {
        for selection in selections.iter().filter(|s| s.status == SeatStatus::Reserved) {
            if let Err(e) = self.workshops.release_seat(&selection.session_id).await {
                warn!(session_id = %selection.session_id, error = %e, "Failed to release workshop seat");
            }
        }
    }

    pub async fn get_registration(&self, registration_id: &str) -> Result<Registration> {
        self.registrations
            .find_by_id(registration_id)
            .await?
            .ok_or_else(|| IdmcError::RegistrationNotFound {
                registration_id: registration_id.to_string(),
            })
    }

    pub async fn list_registrations(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        self.registrations.list(filter).await
    }

    /// Attach proof of payment and move the registration to verification
    pub async fn submit_payment_proof(
        &self,
        registration_id: &str,
        method: PaymentMethod,
        reference: Option<String>,
        proof_url: &str,
    ) -> Result<Registration> {
        let proof_url = proof_url.trim().to_string();
        if proof_url.is_empty() {
            return Err(IdmcError::Validation("Proof of payment is required".to_string()));
        }
        let reference = optional_text(reference);

        let registration = update_registration(
            self.registrations.as_ref(),
            registration_id,
            self.event.check_in_retries,
            |registration, now| {
                if !matches!(
                    registration.status,
                    RegistrationStatus::PendingPayment | RegistrationStatus::PendingVerification
                ) {
                    return Err(IdmcError::InvalidStatusTransition {
                        from: registration.status.to_string(),
                        to: RegistrationStatus::PendingVerification.to_string(),
                    });
                }

                registration.payment.method = Some(method);
                registration.payment.reference = reference.clone();
                registration.payment.proof_url = Some(proof_url.clone());
                registration.payment.status = PaymentStatus::Submitted;
                registration.payment.submitted_at = Some(now);
                registration.status = RegistrationStatus::PendingVerification;
                Ok(())
            },
        )
        .await?;

        log_registration_event(registration_id, "payment_submitted", None);
        Ok(registration)
    }

    /// Move a registration along the status lifecycle.
    ///
    /// Confirming verifies the payment and attaches an invoice in the same
    /// write; confirming an already confirmed registration that has no
    /// invoice only attaches the invoice. Leaving the seat-holding statuses
    /// gives back reserved workshop seats and promotes the oldest waitlisted
    /// registration for each seat freed.
    pub async fn update_status(
        &self,
        registration_id: &str,
        new_status: RegistrationStatus,
        admin: &str,
    ) -> Result<Registration> {
        let current = self.get_registration(registration_id).await?;

        // The invoice number is taken before the write so a confirmed
        // registration never lands without one.
        let confirming = new_status == RegistrationStatus::Confirmed;
        let invoice = if confirming
            && current.invoice.is_none()
            && (current.status == RegistrationStatus::Confirmed || current.status.can_transition_to(new_status))
        {
            Some(self.invoices.issue_invoice(&current).await?)
        } else {
            None
        };

        // Status the winning write actually moved away from
        let from_status = Mutex::new(current.status);

        let updated = update_registration(
            self.registrations.as_ref(),
            registration_id,
            self.event.check_in_retries,
            |registration, now| {
                let repairing_invoice =
                    confirming && registration.status == RegistrationStatus::Confirmed && registration.invoice.is_none();
                if !repairing_invoice && !registration.status.can_transition_to(new_status) {
                    return Err(IdmcError::InvalidStatusTransition {
                        from: registration.status.to_string(),
                        to: new_status.to_string(),
                    });
                }
                *from_status.lock().unwrap_or_else(PoisonError::into_inner) = registration.status;

                if confirming {
                    registration.invoice = registration.invoice.take().or_else(|| invoice.clone());
                    if registration.invoice.is_none() {
                        return Err(IdmcError::ConcurrentModification {
                            registration_id: registration.id.clone(),
                        });
                    }
                }
                if repairing_invoice {
                    return Ok(());
                }

                match new_status {
                    RegistrationStatus::Confirmed => {
                        registration.payment.status = PaymentStatus::Verified;
                        registration.payment.verified_at = Some(now);
                        registration.payment.verified_by = Some(admin.to_string());
                    }
                    RegistrationStatus::PendingPayment => {
                        registration.payment.status = PaymentStatus::Rejected;
                    }
                    RegistrationStatus::Refunded => {
                        registration.payment.status = PaymentStatus::Refunded;
                    }
                    RegistrationStatus::PendingVerification | RegistrationStatus::Cancelled => {}
                }

                registration.status = new_status;
                Ok(())
            },
        )
        .await?;

        let from = *from_status.lock().unwrap_or_else(PoisonError::into_inner);
        if from.holds_seats() && !new_status.holds_seats() {
            for selection in updated
                .workshop_selections
                .iter()
                .filter(|s| s.status == SeatStatus::Reserved)
            {
                self.workshops.release_seat(&selection.session_id).await?;
                self.promote_waitlist(&selection.session_id).await?;
            }
        }

        log_registration_event(registration_id, "status_changed", Some(new_status.as_str()));
        self.activity
            .log(
                NewActivityLogEntry::new(admin, "update_status", "registration", Some(registration_id)).with_details(
                    serde_json::json!({
                        "from": from.as_str(),
                        "to": new_status.as_str(),
                        "invoice": updated.invoice.as_ref().map(|i| i.number.clone()),
                    }),
                ),
            )
            .await;

        Ok(updated)
    }

    /// Give a freed seat to the oldest waitlisted registration that still
    /// holds seats. Returns the promoted registration id, if any.
    pub async fn promote_waitlist(&self, session_id: &str) -> Result<Option<String>> {
        let candidates = self.registrations.list_waitlisted(session_id).await?;

        for candidate in candidates.into_iter().filter(|r| r.status.holds_seats()) {
            if self.workshops.reserve_seat(session_id).await? == SeatReservation::Full {
                return Ok(None);
            }

            let promoted = update_registration(
                self.registrations.as_ref(),
                &candidate.id,
                self.event.check_in_retries,
                |registration, _| {
                    if !registration.status.holds_seats() {
                        return Err(IdmcError::Validation("Registration no longer holds seats".to_string()));
                    }
                    let selection = registration
                        .workshop_selections
                        .iter_mut()
                        .find(|s| s.session_id == session_id && s.status == SeatStatus::Waitlisted)
                        .ok_or_else(|| IdmcError::Validation("Selection no longer waitlisted".to_string()))?;
                    selection.status = SeatStatus::Reserved;
                    Ok(())
                },
            )
            .await;

            match promoted {
                Ok(registration) => {
                    info!(registration_id = %registration.id, session_id = session_id, "Promoted from waitlist");
                    log_registration_event(&registration.id, "waitlist_promoted", Some(session_id));
                    return Ok(Some(registration.id));
                }
                Err(e) => {
                    debug!(registration_id = %candidate.id, error = %e, "Skipping waitlist candidate");
                    self.workshops.release_seat(session_id).await?;
                }
            }
        }

        Ok(None)
    }

    /// Record that an outbound message went out
    pub async fn mark_communication_sent(&self, registration_id: &str, flag: CommunicationFlag) -> Result<Registration> {
        update_registration(
            self.registrations.as_ref(),
            registration_id,
            self.event.check_in_retries,
            |registration, _| {
                registration.communications.set(flag);
                Ok(())
            },
        )
        .await
    }

    /// Registrations still awaiting payment after their deadline
    pub async fn overdue_registrations(&self, at: DateTime<Utc>) -> Result<Vec<Registration>> {
        let pending = self
            .registrations
            .list(&RegistrationFilter {
                status: Some(RegistrationStatus::PendingPayment),
                limit: None,
            })
            .await?;

        Ok(pending.into_iter().filter(|r| r.payment_deadline < at).collect())
    }
}
