//! Session and workshop model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Plenary,
    Workshop,
    Break,
    Other,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Plenary => "plenary",
            SessionType::Workshop => "workshop",
            SessionType::Break => "break",
            SessionType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub session_type: SessionType,
    pub speaker_ids: Vec<String>,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Workshop-only: seat limit, `None` for unlimited
    pub capacity: Option<i32>,
    /// Workshop-only: seats currently reserved
    pub registered_count: i32,
    /// Workshop-only: parallel track label, e.g. "Workshop Block A"
    pub time_slot: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_workshop(&self) -> bool {
        self.session_type == SessionType::Workshop
    }

    pub fn remaining_seats(&self) -> Option<i32> {
        self.capacity.map(|capacity| (capacity - self.registered_count).max(0))
    }

    pub fn is_full(&self) -> bool {
        self.remaining_seats() == Some(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
    pub description: Option<String>,
    pub session_type: SessionType,
    pub speaker_ids: Vec<String>,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub time_slot: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub time_slot: Option<String>,
    pub speaker_ids: Option<Vec<String>>,
}

/// Outcome of a conditional seat reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatReservation {
    Reserved,
    Full,
}
