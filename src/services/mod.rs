//! Services module
//!
//! This module contains business logic services

pub mod activity;
pub mod admin;
pub mod checkin;
pub mod content;
pub mod functions;
pub mod inquiry;
pub mod invoice;
pub mod lookup;
pub mod redis;
pub mod registration;
pub mod seed;
pub mod stats;
pub mod workshop;

// Re-export commonly used services
pub use activity::ActivityService;
pub use admin::AdminService;
pub use checkin::{
    are_all_attendees_checked_in, initialize_attendee_check_ins, parse_qr_code, CheckInService, CheckInStats,
    QrParseResult,
};
pub use content::ContentService;
pub use functions::{FunctionsClient, InquiryReplyPayload, InquiryReplyResult, StatsSyncResult};
pub use inquiry::InquiryService;
pub use invoice::InvoiceService;
pub use lookup::{LookupService, MatchKind, SearchResult};
pub use redis::{CacheEntry, RedisService};
pub use registration::RegistrationService;
pub use seed::{SeedOptions, SeedOutcome, Seeder};
pub use stats::{DashboardStats, StatsService};
pub use workshop::WorkshopService;

use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub database: DatabaseService,
    pub activity_service: ActivityService,
    pub admin_service: AdminService,
    pub check_in_service: CheckInService,
    pub content_service: ContentService,
    pub inquiry_service: InquiryService,
    pub invoice_service: InvoiceService,
    pub lookup_service: LookupService,
    pub registration_service: RegistrationService,
    pub stats_service: StatsService,
    pub workshop_service: WorkshopService,
    redis_service: Option<RedisService>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized.
    ///
    /// Redis is only connected when the stats cache feature is on.
    pub fn new(settings: &Settings, database: DatabaseService) -> Result<Self> {
        let redis_service = if settings.features.stats_cache {
            Some(RedisService::new(settings.redis.clone())?)
        } else {
            None
        };
        let functions = FunctionsClient::new(&settings.functions)?;

        let activity_service = ActivityService::new(database.activity.clone());
        let workshop_service = WorkshopService::new(database.sessions.clone(), activity_service.clone());
        let invoice_service = InvoiceService::new(database.settings.clone());
        let content_service = ContentService::new(
            database.settings.clone(),
            database.content.clone(),
            activity_service.clone(),
        );

        let registration_service = RegistrationService::new(
            database.registrations.clone(),
            workshop_service.clone(),
            invoice_service.clone(),
            content_service.clone(),
            activity_service.clone(),
            settings.event.clone(),
            settings.features.workshop_waitlist,
        );
        let check_in_service = CheckInService::new(
            database.registrations.clone(),
            activity_service.clone(),
            settings.event.check_in_retries,
        );
        let lookup_service = LookupService::new(database.registrations.clone(), settings.event.search_scan_limit);
        let admin_service = AdminService::new(database.admins.clone(), activity_service.clone());
        let inquiry_service = InquiryService::new(database.inquiries.clone(), functions.clone(), activity_service.clone());
        let stats_service = StatsService::new(
            database.registrations.clone(),
            database.sessions.clone(),
            database.inquiries.clone(),
            functions,
            redis_service.clone(),
        );

        Ok(Self {
            database,
            activity_service,
            admin_service,
            check_in_service,
            content_service,
            inquiry_service,
            invoice_service,
            lookup_service,
            registration_service,
            stats_service,
            workshop_service,
            redis_service,
        })
    }

    pub fn seeder(&self) -> Seeder {
        Seeder::new(
            self.database.clone(),
            self.registration_service.clone(),
            self.workshop_service.clone(),
        )
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = self.database.registrations.count().await.is_ok();
        let redis_healthy = match &self.redis_service {
            Some(redis) => Some(redis.health_check().await.unwrap_or(false)),
            None => None,
        };

        ServiceHealthStatus { database_healthy, redis_healthy }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    /// `None` when the stats cache is disabled
    pub redis_healthy: Option<bool>,
}

impl ServiceHealthStatus {
    /// Redis is optional; only the database is critical
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if self.redis_healthy == Some(false) {
            issues.push("Redis connection failed".to_string());
        }
        issues
    }
}
