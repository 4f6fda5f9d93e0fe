//! Dashboard statistics
//!
//! Figures are computed from the stores. When the stats cache is enabled the
//! result is kept in Redis; any cache failure falls back to recomputation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::database::store::{InquiryStore, RegistrationStore, SessionStore};
use crate::models::inquiry::InquiryStatus;
use crate::models::registration::{RegistrationFilter, RegistrationStatus, SeatStatus};
use crate::services::checkin::{compute_check_in_stats, CheckInStats};
use crate::services::functions::{FunctionsClient, StatsSyncResult};
use crate::services::redis::RedisService;
use crate::utils::errors::Result;

pub const DASHBOARD_CACHE_KEY: &str = "stats:dashboard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopStats {
    pub session_id: String,
    pub title: String,
    pub capacity: Option<i32>,
    pub registered_count: i32,
    pub waitlisted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_registrations: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Attendees on registrations that are not cancelled or refunded
    pub active_attendees: usize,
    pub confirmed_attendees: usize,
    pub confirmed_revenue: i64,
    pub pending_revenue: i64,
    pub check_in: CheckInStats,
    pub workshops: Vec<WorkshopStats>,
    pub inquiries_awaiting_reply: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct StatsService {
    registrations: Arc<dyn RegistrationStore>,
    sessions: Arc<dyn SessionStore>,
    inquiries: Arc<dyn InquiryStore>,
    functions: FunctionsClient,
    cache: Option<RedisService>,
}

impl StatsService {
    pub fn new(
        registrations: Arc<dyn RegistrationStore>,
        sessions: Arc<dyn SessionStore>,
        inquiries: Arc<dyn InquiryStore>,
        functions: FunctionsClient,
        cache: Option<RedisService>,
    ) -> Self {
        Self { registrations, sessions, inquiries, functions, cache }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        if let Some(cache) = &self.cache {
            match cache.get::<DashboardStats>(DASHBOARD_CACHE_KEY).await {
                Ok(Some(entry)) => {
                    debug!(generated_at = %entry.data.generated_at, "Dashboard stats served from cache");
                    return Ok(entry.data);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Stats cache read failed, recomputing"),
            }
        }

        let stats = self.compute().await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(DASHBOARD_CACHE_KEY, &stats, None).await {
                warn!(error = %e, "Stats cache write failed");
            }
        }

        Ok(stats)
    }

    /// Drop the cached figures so the next read recomputes
    pub async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete(DASHBOARD_CACHE_KEY).await {
                warn!(error = %e, "Stats cache invalidation failed");
            }
        }
    }

    async fn compute(&self) -> Result<DashboardStats> {
        let filter = RegistrationFilter::default();
        let (registrations, sessions, inquiries) = futures::try_join!(
            self.registrations.list(&filter),
            self.sessions.list(),
            self.inquiries.list(None),
        )?;

        let mut by_status: BTreeMap<String, usize> = RegistrationStatus::ALL
            .iter()
            .map(|status| (status.as_str().to_string(), 0))
            .collect();
        let mut active_attendees = 0;
        let mut confirmed_attendees = 0;
        let mut confirmed_revenue = 0;
        let mut pending_revenue = 0;

        for registration in &registrations {
            *by_status.entry(registration.status.as_str().to_string()).or_default() += 1;

            if registration.status.holds_seats() {
                active_attendees += registration.total_attendees();
            }
            match registration.status {
                RegistrationStatus::Confirmed => {
                    confirmed_attendees += registration.total_attendees();
                    confirmed_revenue += registration.payment.amount;
                }
                RegistrationStatus::PendingPayment | RegistrationStatus::PendingVerification => {
                    pending_revenue += registration.payment.amount;
                }
                RegistrationStatus::Cancelled | RegistrationStatus::Refunded => {}
            }
        }

        let workshops = sessions
            .into_iter()
            .filter(|session| session.is_workshop())
            .map(|session| {
                let waitlisted = registrations
                    .iter()
                    .filter(|r| r.status.holds_seats())
                    .flat_map(|r| r.workshop_selections.iter())
                    .filter(|s| s.session_id == session.id && s.status == SeatStatus::Waitlisted)
                    .count();
                WorkshopStats {
                    session_id: session.id,
                    title: session.title,
                    capacity: session.capacity,
                    registered_count: session.registered_count,
                    waitlisted,
                }
            })
            .collect();

        let inquiries_awaiting_reply = inquiries
            .iter()
            .filter(|i| matches!(i.status, InquiryStatus::New | InquiryStatus::Read))
            .count();

        Ok(DashboardStats {
            total_registrations: registrations.len(),
            by_status,
            active_attendees,
            confirmed_attendees,
            confirmed_revenue,
            pending_revenue,
            check_in: compute_check_in_stats(&registrations),
            workshops,
            inquiries_awaiting_reply,
            generated_at: Utc::now(),
        })
    }

    /// Ask the hosted functions to rebuild their aggregate counters
    pub async fn trigger_stats_sync(&self) -> Result<StatsSyncResult> {
        let result = self.functions.trigger_stats_sync().await?;
        self.invalidate().await;
        Ok(result)
    }
}
