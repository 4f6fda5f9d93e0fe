//! Registration model
//!
//! A registration is the unit of payment and check-in: one primary attendee,
//! zero or more additional attendees, and one check-in slot per attendee.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::errors::IdmcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    PendingPayment,
    PendingVerification,
    Confirmed,
    Cancelled,
    Refunded,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 5] = [
        RegistrationStatus::PendingPayment,
        RegistrationStatus::PendingVerification,
        RegistrationStatus::Confirmed,
        RegistrationStatus::Cancelled,
        RegistrationStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::PendingPayment => "pending_payment",
            RegistrationStatus::PendingVerification => "pending_verification",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Refunded => "refunded",
        }
    }

    /// Whether an admin may move a registration from `self` to `next`
    pub fn can_transition_to(&self, next: RegistrationStatus) -> bool {
        use RegistrationStatus::*;
        matches!(
            (self, next),
            (PendingPayment, PendingVerification)
                | (PendingPayment, Confirmed)
                | (PendingPayment, Cancelled)
                | (PendingVerification, Confirmed)
                | (PendingVerification, PendingPayment)
                | (PendingVerification, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, Refunded)
                | (Cancelled, Refunded)
        )
    }

    /// Statuses that hold workshop seats
    pub fn holds_seats(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled | RegistrationStatus::Refunded)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = IdmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegistrationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| IdmcError::Validation(format!("Unknown registration status: {}", s)))
    }
}

/// Pricing category selected on the registration form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeCategory {
    Regular,
    Student,
    Senior,
}

impl AttendeeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendeeCategory::Regular => "regular",
            AttendeeCategory::Student => "student",
            AttendeeCategory::Senior => "senior",
        }
    }
}

impl FromStr for AttendeeCategory {
    type Err = IdmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(AttendeeCategory::Regular),
            "student" => Ok(AttendeeCategory::Student),
            "senior" => Ok(AttendeeCategory::Senior),
            other => Err(IdmcError::Validation(format!("Unknown category: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub ministry_role: Option<String>,
}

impl Attendee {
    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) if !middle.trim().is_empty() => {
                format!("{} {} {}", self.first_name, middle, self.last_name)
            }
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Reserved,
    Waitlisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkshopSelection {
    pub attendee_index: usize,
    pub session_id: String,
    pub time_slot: Option<String>,
    pub status: SeatStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Gcash,
    Maya,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Submitted,
    Verified,
    Rejected,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub proof_url: Option<String>,
    pub status: PaymentStatus,
    pub amount: i64,
    pub currency: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub number: String,
    pub amount: i64,
    pub issued_at: DateTime<Utc>,
}

/// Per-attendee check-in slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendeeCheckIn {
    pub attendee_index: usize,
    pub name: String,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_in_by: Option<String>,
}

/// Outbound communication tracking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationFlags {
    pub confirmation_email_sent: bool,
    pub payment_reminder_sent: bool,
    pub invoice_sent: bool,
    pub qr_sent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicationFlag {
    ConfirmationEmail,
    PaymentReminder,
    Invoice,
    QrCode,
}

impl CommunicationFlags {
    pub fn set(&mut self, flag: CommunicationFlag) {
        match flag {
            CommunicationFlag::ConfirmationEmail => self.confirmation_email_sent = true,
            CommunicationFlag::PaymentReminder => self.payment_reminder_sent = true,
            CommunicationFlag::Invoice => self.invoice_sent = true,
            CommunicationFlag::QrCode => self.qr_sent = true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub short_code: String,
    pub short_code_suffix: String,
    pub primary_attendee: Attendee,
    pub additional_attendees: Vec<Attendee>,
    pub category: AttendeeCategory,
    pub church_name: String,
    pub church_city: Option<String>,
    pub workshop_selections: Vec<WorkshopSelection>,
    pub payment: Payment,
    pub invoice: Option<Invoice>,
    pub status: RegistrationStatus,
    pub attendee_check_ins: Vec<AttendeeCheckIn>,
    /// Legacy aggregate flag: true iff every attendee slot is checked in
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub communications: CommunicationFlags,
    pub payment_deadline: DateTime<Utc>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn total_attendees(&self) -> usize {
        1 + self.additional_attendees.len()
    }

    /// Attendee by slot index; 0 is the primary attendee
    pub fn attendee(&self, index: usize) -> Option<&Attendee> {
        if index == 0 {
            Some(&self.primary_attendee)
        } else {
            self.additional_attendees.get(index - 1)
        }
    }

    pub fn attendees(&self) -> impl Iterator<Item = &Attendee> {
        std::iter::once(&self.primary_attendee).chain(self.additional_attendees.iter())
    }

    pub fn checked_in_count(&self) -> usize {
        self.attendee_check_ins.iter().filter(|slot| slot.checked_in).count()
    }

    /// Case-insensitive substring match over the searchable fields.
    /// `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        if self.short_code.to_lowercase().contains(needle)
            || self.id.to_lowercase().contains(needle)
            || self.church_name.to_lowercase().contains(needle)
        {
            return true;
        }

        self.attendees().any(|attendee| {
            attendee.full_name().to_lowercase().contains(needle)
                || attendee.email.contains(needle)
                || attendee.phone.contains(needle)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopChoice {
    pub attendee_index: usize,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegistrationRequest {
    pub primary_attendee: Attendee,
    pub additional_attendees: Vec<Attendee>,
    pub category: AttendeeCategory,
    pub church_name: String,
    pub church_city: Option<String>,
    pub workshop_choices: Vec<WorkshopChoice>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    pub proof_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatus>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for status in RegistrationStatus::ALL {
            assert_eq!(status.as_str().parse::<RegistrationStatus>().unwrap(), status);
        }
        assert!("approved".parse::<RegistrationStatus>().is_err());
    }

    #[test]
    fn test_status_transitions() {
        use RegistrationStatus::*;
        assert!(PendingPayment.can_transition_to(PendingVerification));
        assert!(PendingVerification.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Refunded));
        assert!(!Confirmed.can_transition_to(PendingPayment));
        assert!(!Refunded.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Confirmed));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&RegistrationStatus::PendingVerification).unwrap();
        assert_eq!(json, "\"pending_verification\"");
    }

    #[test]
    fn test_full_name_skips_blank_middle_name() {
        let attendee = Attendee {
            first_name: "Maria".into(),
            last_name: "Santos".into(),
            middle_name: Some("  ".into()),
            email: "maria@example.com".into(),
            phone: "+639171234567".into(),
            ministry_role: None,
        };
        assert_eq!(attendee.full_name(), "Maria Santos");
    }
}
