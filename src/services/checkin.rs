//! Attendee check-in service
//!
//! Each registration carries one check-in slot per attendee (slot 0 is the
//! primary attendee). A slot moves from not checked in to checked in only
//! while the registration is confirmed; undo moves it back. The legacy
//! `checked_in` flag on the registration is always the AND of all slots.
//!
//! Writes go through the store's conditional `replace`, so two volunteers
//! checking in different attendees of the same registration never overwrite
//! each other: the loser re-reads and re-applies its change.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::database::store::{update_registration, RegistrationStore};
use crate::models::activity::NewActivityLogEntry;
use crate::models::registration::{AttendeeCheckIn, Registration, RegistrationFilter, RegistrationStatus};
use crate::services::activity::ActivityService;
use crate::utils::errors::{IdmcError, Result};
use crate::utils::logging::log_check_in;

/// Result of decoding a badge or confirmation QR code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrParseResult {
    pub valid: bool,
    pub registration_id: Option<String>,
    pub attendee_index: Option<usize>,
}

impl QrParseResult {
    pub fn invalid() -> Self {
        Self { valid: false, registration_id: None, attendee_index: None }
    }

    fn valid(registration_id: String, attendee_index: Option<usize>) -> Self {
        Self { valid: true, registration_id: Some(registration_id), attendee_index }
    }
}

fn qr_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(REG-\d{4}-[A-Z0-9]{6})(?:-(\d{1,3}))?$").expect("QR pattern is a valid regex")
    })
}

/// Decode a QR payload.
///
/// Accepts `REG-YYYY-CODE`, `REG-YYYY-CODE-N` where `N` is the attendee slot,
/// or a JSON object with `registrationId` (or `id`) and optional
/// `attendeeIndex`. Everything else is invalid.
pub fn parse_qr_code(payload: &str) -> QrParseResult {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return QrParseResult::invalid();
    }

    if trimmed.starts_with('{') {
        return parse_qr_json(trimmed);
    }

    let normalized = trimmed.to_uppercase();
    match qr_pattern().captures(&normalized) {
        Some(captures) => {
            let registration_id = captures[1].to_string();
            let attendee_index = match captures.get(2) {
                Some(index) => match index.as_str().parse::<usize>() {
                    Ok(index) => Some(index),
                    Err(_) => return QrParseResult::invalid(),
                },
                None => None,
            };
            QrParseResult::valid(registration_id, attendee_index)
        }
        None => QrParseResult::invalid(),
    }
}

fn parse_qr_json(payload: &str) -> QrParseResult {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) else {
        return QrParseResult::invalid();
    };

    let Some(id) = value
        .get("registrationId")
        .or_else(|| value.get("id"))
        .and_then(|id| id.as_str())
    else {
        return QrParseResult::invalid();
    };

    let normalized = id.trim().to_uppercase();
    let Some(captures) = qr_pattern().captures(&normalized) else {
        return QrParseResult::invalid();
    };
    if captures.get(2).is_some() {
        return QrParseResult::invalid();
    }

    let attendee_index = match value.get("attendeeIndex") {
        None | Some(serde_json::Value::Null) => None,
        Some(index) => match index.as_u64() {
            Some(index) => Some(index as usize),
            None => return QrParseResult::invalid(),
        },
    };

    QrParseResult::valid(captures[1].to_string(), attendee_index)
}

/// Build the check-in slots for a registration.
///
/// Existing slots are kept. Missing slots (documents written before
/// per-attendee check-in existed, or attendees added later) inherit the
/// legacy aggregate flag.
pub fn initialize_attendee_check_ins(registration: &Registration) -> Vec<AttendeeCheckIn> {
    (0..registration.total_attendees())
        .map(|index| {
            let name = registration
                .attendee(index)
                .map(|attendee| attendee.full_name())
                .unwrap_or_default();

            match registration
                .attendee_check_ins
                .iter()
                .find(|slot| slot.attendee_index == index)
            {
                Some(existing) => AttendeeCheckIn { name, ..existing.clone() },
                None => AttendeeCheckIn {
                    attendee_index: index,
                    name,
                    checked_in: registration.checked_in,
                    checked_in_at: if registration.checked_in { registration.checked_in_at } else { None },
                    checked_in_by: None,
                },
            }
        })
        .collect()
}

/// True iff there is exactly one slot per attendee and every slot is checked in
pub fn are_all_attendees_checked_in(registration: &Registration) -> bool {
    registration.attendee_check_ins.len() == registration.total_attendees()
        && registration.attendee_check_ins.iter().all(|slot| slot.checked_in)
}

/// Recompute the legacy aggregate flag after a slot change
fn derive_legacy_flag(registration: &mut Registration, now: DateTime<Utc>) {
    let all = are_all_attendees_checked_in(registration);
    if all && !registration.checked_in {
        registration.checked_in_at = Some(now);
    } else if !all {
        registration.checked_in_at = None;
    }
    registration.checked_in = all;
}

fn ensure_slots(registration: &mut Registration) {
    if registration.attendee_check_ins.len() != registration.total_attendees()
        || registration
            .attendee_check_ins
            .iter()
            .enumerate()
            .any(|(i, slot)| slot.attendee_index != i)
    {
        registration.attendee_check_ins = initialize_attendee_check_ins(registration);
    }
}

fn require_confirmed(registration: &Registration) -> Result<()> {
    if registration.status != RegistrationStatus::Confirmed {
        return Err(IdmcError::RegistrationNotConfirmed {
            registration_id: registration.id.clone(),
            status: registration.status.to_string(),
        });
    }
    Ok(())
}

fn require_index(registration: &Registration, index: usize) -> Result<()> {
    let total = registration.total_attendees();
    if index >= total {
        return Err(IdmcError::InvalidAttendeeIndex { index, total });
    }
    Ok(())
}

/// Aggregate check-in figures over confirmed registrations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckInStats {
    pub confirmed_registrations: usize,
    pub total_attendees: usize,
    pub checked_in_attendees: usize,
    pub fully_checked_in: usize,
    pub partially_checked_in: usize,
    pub not_checked_in: usize,
    pub percentage: f64,
}

pub fn compute_check_in_stats(registrations: &[Registration]) -> CheckInStats {
    let mut stats = CheckInStats::default();

    for registration in registrations
        .iter()
        .filter(|r| r.status == RegistrationStatus::Confirmed)
    {
        let slots = initialize_attendee_check_ins(registration);
        let checked = slots.iter().filter(|slot| slot.checked_in).count();

        stats.confirmed_registrations += 1;
        stats.total_attendees += slots.len();
        stats.checked_in_attendees += checked;

        if checked == 0 {
            stats.not_checked_in += 1;
        } else if checked == slots.len() {
            stats.fully_checked_in += 1;
        } else {
            stats.partially_checked_in += 1;
        }
    }

    if stats.total_attendees > 0 {
        let ratio = stats.checked_in_attendees as f64 / stats.total_attendees as f64;
        stats.percentage = (ratio * 1000.0).round() / 10.0;
    }

    stats
}

#[derive(Clone)]
pub struct CheckInService {
    registrations: Arc<dyn RegistrationStore>,
    activity: ActivityService,
    max_attempts: u32,
}

impl CheckInService {
    pub fn new(registrations: Arc<dyn RegistrationStore>, activity: ActivityService, max_attempts: u32) -> Self {
        Self { registrations, activity, max_attempts }
    }

    async fn update<F>(&self, registration_id: &str, apply: F) -> Result<Registration>
    where
        F: Fn(&mut Registration, DateTime<Utc>) -> Result<()> + Send + Sync,
    {
        update_registration(self.registrations.as_ref(), registration_id, self.max_attempts, apply).await
    }

    /// Check in a single attendee slot
    pub async fn check_in_attendee(&self, registration_id: &str, attendee_index: usize, by: &str) -> Result<Registration> {
        let registration = self
            .update(registration_id, |registration, now| {
                require_confirmed(registration)?;
                require_index(registration, attendee_index)?;
                ensure_slots(registration);

                let slot = &mut registration.attendee_check_ins[attendee_index];
                if slot.checked_in {
                    return Err(IdmcError::AttendeeAlreadyCheckedIn { index: attendee_index });
                }
                slot.checked_in = true;
                slot.checked_in_at = Some(now);
                slot.checked_in_by = Some(by.to_string());

                derive_legacy_flag(registration, now);
                Ok(())
            })
            .await?;

        log_check_in(registration_id, Some(attendee_index), true, by);
        self.activity
            .log(
                NewActivityLogEntry::new(by, "check_in", "registration", Some(registration_id)).with_details(
                    serde_json::json!({
                        "attendeeIndex": attendee_index,
                        "allCheckedIn": registration.checked_in,
                    }),
                ),
            )
            .await;

        Ok(registration)
    }

    /// Check in every attendee that is not yet checked in
    pub async fn check_in_all(&self, registration_id: &str, by: &str) -> Result<Registration> {
        let registration = self
            .update(registration_id, |registration, now| {
                require_confirmed(registration)?;
                ensure_slots(registration);

                if are_all_attendees_checked_in(registration) {
                    return Err(IdmcError::AlreadyCheckedIn {
                        registration_id: registration.id.clone(),
                    });
                }

                for slot in registration.attendee_check_ins.iter_mut().filter(|slot| !slot.checked_in) {
                    slot.checked_in = true;
                    slot.checked_in_at = Some(now);
                    slot.checked_in_by = Some(by.to_string());
                }

                derive_legacy_flag(registration, now);
                Ok(())
            })
            .await?;

        log_check_in(registration_id, None, true, by);
        self.activity
            .log(
                NewActivityLogEntry::new(by, "check_in_all", "registration", Some(registration_id))
                    .with_details(serde_json::json!({ "attendees": registration.total_attendees() })),
            )
            .await;

        Ok(registration)
    }

    /// Decode a QR payload and check in the slot it names, or every
    /// remaining slot when it names none
    pub async fn check_in_from_qr(&self, payload: &str, by: &str) -> Result<Registration> {
        let parsed = parse_qr_code(payload);
        let registration_id = match (parsed.valid, parsed.registration_id) {
            (true, Some(id)) => id,
            _ => return Err(IdmcError::InvalidQrCode),
        };

        match parsed.attendee_index {
            Some(index) => self.check_in_attendee(&registration_id, index, by).await,
            None => self.check_in_all(&registration_id, by).await,
        }
    }

    /// Undo check-in for one slot, or for every slot when `attendee_index` is `None`
    pub async fn undo_check_in(
        &self,
        registration_id: &str,
        attendee_index: Option<usize>,
        by: &str,
    ) -> Result<Registration> {
        let registration = self
            .update(registration_id, |registration, now| {
                ensure_slots(registration);

                match attendee_index {
                    Some(index) => {
                        require_index(registration, index)?;
                        let slot = &mut registration.attendee_check_ins[index];
                        if !slot.checked_in {
                            return Err(IdmcError::AttendeeNotCheckedIn { index });
                        }
                        slot.checked_in = false;
                        slot.checked_in_at = None;
                        slot.checked_in_by = None;
                    }
                    None => {
                        for slot in registration.attendee_check_ins.iter_mut() {
                            slot.checked_in = false;
                            slot.checked_in_at = None;
                            slot.checked_in_by = None;
                        }
                    }
                }

                derive_legacy_flag(registration, now);
                Ok(())
            })
            .await?;

        log_check_in(registration_id, attendee_index, false, by);
        self.activity
            .log(
                NewActivityLogEntry::new(by, "undo_check_in", "registration", Some(registration_id))
                    .with_details(serde_json::json!({ "attendeeIndex": attendee_index })),
            )
            .await;

        Ok(registration)
    }

    /// Check-in figures across all confirmed registrations
    pub async fn get_check_in_stats(&self) -> Result<CheckInStats> {
        let confirmed = self
            .registrations
            .list(&RegistrationFilter {
                status: Some(RegistrationStatus::Confirmed),
                limit: None,
            })
            .await?;

        Ok(compute_check_in_stats(&confirmed))
    }
}
