//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod registration;
pub mod admin;
pub mod session;
pub mod activity;
pub mod inquiry;
pub mod content;
pub mod settings;

// Re-export commonly used models
pub use registration::{
    Registration, RegistrationStatus, RegistrationFilter, Attendee, AttendeeCategory, AttendeeCheckIn,
    WorkshopSelection, WorkshopChoice, SeatStatus, Payment, PaymentMethod, PaymentStatus, Invoice,
    CommunicationFlags, CommunicationFlag, CreateRegistrationRequest,
};
pub use admin::{AdminUser, AdminRole, AdminStatus, Permission, InviteAdminRequest};
pub use session::{Session, SessionType, SeatReservation, CreateSessionRequest, UpdateSessionRequest};
pub use activity::{ActivityLogEntry, NewActivityLogEntry};
pub use inquiry::{ContactInquiry, InquiryStatus, SubmitInquiryRequest};
pub use content::{ContentItem, ContentKind, UpsertContentRequest};
pub use settings::{PricingSettings, CategoryPrice, SettingEntry, PRICING_KEY};
