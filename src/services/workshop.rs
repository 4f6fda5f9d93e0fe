//! Session and workshop service

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::database::store::SessionStore;
use crate::models::activity::NewActivityLogEntry;
use crate::models::session::{CreateSessionRequest, SeatReservation, Session, UpdateSessionRequest};
use crate::services::activity::ActivityService;
use crate::utils::errors::{IdmcError, Result};
use crate::utils::helpers::{generate_uuid, normalize_whitespace};

#[derive(Clone)]
pub struct WorkshopService {
    sessions: Arc<dyn SessionStore>,
    activity: ActivityService,
}

fn validate_capacity(capacity: Option<i32>) -> Result<()> {
    match capacity {
        Some(capacity) if capacity < 0 => Err(IdmcError::Validation(format!(
            "Capacity cannot be negative: {}",
            capacity
        ))),
        _ => Ok(()),
    }
}

impl WorkshopService {
    pub fn new(sessions: Arc<dyn SessionStore>, activity: ActivityService) -> Self {
        Self { sessions, activity }
    }

    pub async fn create_session(&self, request: CreateSessionRequest, admin: &str) -> Result<Session> {
        let title = normalize_whitespace(&request.title);
        if title.is_empty() {
            return Err(IdmcError::Validation("Session title is required".to_string()));
        }
        validate_capacity(request.capacity)?;
        if let (Some(start), Some(end)) = (request.starts_at, request.ends_at) {
            if end < start {
                return Err(IdmcError::Validation("Session ends before it starts".to_string()));
            }
        }

        let now = Utc::now();
        let session = Session {
            id: generate_uuid(),
            title,
            description: request.description,
            session_type: request.session_type,
            speaker_ids: request.speaker_ids,
            venue: request.venue,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            capacity: request.capacity,
            registered_count: 0,
            time_slot: request.time_slot,
            created_at: now,
            updated_at: now,
        };

        self.sessions.insert(&session).await?;
        info!(session_id = %session.id, session_type = session.session_type.as_str(), "Session created");
        self.activity
            .log(NewActivityLogEntry::new(admin, "create_session", "session", Some(&session.id)))
            .await;

        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| IdmcError::WorkshopNotFound { session_id: session_id.to_string() })
    }

    /// Sessions in schedule order
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.sessions.list().await
    }

    pub async fn list_workshops(&self) -> Result<Vec<Session>> {
        Ok(self
            .sessions
            .list()
            .await?
            .into_iter()
            .filter(Session::is_workshop)
            .collect())
    }

    pub async fn update_session(&self, session_id: &str, update: UpdateSessionRequest, admin: &str) -> Result<Session> {
        let mut session = self.get_session(session_id).await?;

        if let Some(title) = update.title {
            let title = normalize_whitespace(&title);
            if title.is_empty() {
                return Err(IdmcError::Validation("Session title is required".to_string()));
            }
            session.title = title;
        }
        if let Some(capacity) = update.capacity {
            validate_capacity(Some(capacity))?;
            if capacity < session.registered_count {
                return Err(IdmcError::Validation(format!(
                    "Capacity {} is below the {} seats already taken",
                    capacity, session.registered_count
                )));
            }
            session.capacity = Some(capacity);
        }
        if update.description.is_some() {
            session.description = update.description;
        }
        if update.venue.is_some() {
            session.venue = update.venue;
        }
        if update.starts_at.is_some() {
            session.starts_at = update.starts_at;
        }
        if update.ends_at.is_some() {
            session.ends_at = update.ends_at;
        }
        if update.time_slot.is_some() {
            session.time_slot = update.time_slot;
        }
        if let Some(speaker_ids) = update.speaker_ids {
            session.speaker_ids = speaker_ids;
        }
        session.updated_at = Utc::now();

        self.sessions.update(&session).await?;
        debug!(session_id = session_id, "Session updated");
        self.activity
            .log(NewActivityLogEntry::new(admin, "update_session", "session", Some(session_id)))
            .await;

        Ok(session)
    }

    pub async fn delete_session(&self, session_id: &str, admin: &str) -> Result<()> {
        if !self.sessions.delete(session_id).await? {
            return Err(IdmcError::WorkshopNotFound { session_id: session_id.to_string() });
        }
        info!(session_id = session_id, "Session deleted");
        self.activity
            .log(NewActivityLogEntry::new(admin, "delete_session", "session", Some(session_id)))
            .await;
        Ok(())
    }

    /// Take one seat, bounded by capacity
    pub async fn reserve_seat(&self, session_id: &str) -> Result<SeatReservation> {
        let reservation = self.sessions.reserve_seat(session_id).await?;
        debug!(session_id = session_id, reservation = ?reservation, "Seat reservation attempted");
        Ok(reservation)
    }

    pub async fn release_seat(&self, session_id: &str) -> Result<()> {
        self.sessions.release_seat(session_id).await?;
        debug!(session_id = session_id, "Seat released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::session::SessionType;
    use assert_matches::assert_matches;

    fn service() -> WorkshopService {
        let store = Arc::new(MemoryStore::new());
        WorkshopService::new(store.clone(), ActivityService::new(store))
    }

    fn workshop(capacity: Option<i32>) -> CreateSessionRequest {
        CreateSessionRequest {
            title: "Youth Ministry Workshop".to_string(),
            description: None,
            session_type: SessionType::Workshop,
            speaker_ids: vec![],
            venue: Some("Room 2".to_string()),
            starts_at: None,
            ends_at: None,
            capacity,
            time_slot: Some("Workshop Block A".to_string()),
        }
    }

    #[tokio::test]
    async fn test_reserve_stops_at_capacity() {
        let service = service();
        let session = service.create_session(workshop(Some(2)), "admin@idmc.org").await.unwrap();

        assert_eq!(service.reserve_seat(&session.id).await.unwrap(), SeatReservation::Reserved);
        assert_eq!(service.reserve_seat(&session.id).await.unwrap(), SeatReservation::Reserved);
        assert_eq!(service.reserve_seat(&session.id).await.unwrap(), SeatReservation::Full);

        service.release_seat(&session.id).await.unwrap();
        assert_eq!(service.get_session(&session.id).await.unwrap().registered_count, 1);
    }

    #[tokio::test]
    async fn test_release_never_goes_negative() {
        let service = service();
        let session = service.create_session(workshop(None), "admin@idmc.org").await.unwrap();
        service.release_seat(&session.id).await.unwrap();
        assert_eq!(service.get_session(&session.id).await.unwrap().registered_count, 0);
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_taken_seats() {
        let service = service();
        let session = service.create_session(workshop(Some(5)), "admin@idmc.org").await.unwrap();
        service.reserve_seat(&session.id).await.unwrap();
        service.reserve_seat(&session.id).await.unwrap();

        let update = UpdateSessionRequest { capacity: Some(1), ..Default::default() };
        assert_matches!(
            service.update_session(&session.id, update, "admin@idmc.org").await,
            Err(IdmcError::Validation(_))
        );
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let service = service();
        assert_matches!(
            service.reserve_seat("missing").await,
            Err(IdmcError::WorkshopNotFound { .. })
        );
    }
}
