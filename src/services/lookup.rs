//! Registration lookup for the check-in desk
//!
//! The query shape picks the lookup: full registration id, email, short code,
//! short-code suffix, and finally a bounded substring scan over the most
//! recent registrations. An exact lookup that finds nothing falls through to
//! the scan.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::database::store::RegistrationStore;
use crate::models::registration::{Registration, RegistrationFilter};
use crate::services::checkin::parse_qr_code;
use crate::utils::errors::Result;
use crate::utils::helpers::{is_short_code_charset, normalize_email, SHORT_CODE_LENGTH, SHORT_CODE_SUFFIX_LENGTH};

/// Which lookup produced the results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    RegistrationId,
    Email,
    ShortCode,
    Suffix,
    Text,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub matched_by: MatchKind,
    pub registrations: Vec<Registration>,
}

impl SearchResult {
    fn empty() -> Self {
        Self { matched_by: MatchKind::None, registrations: Vec::new() }
    }
}

#[derive(Clone)]
pub struct LookupService {
    registrations: Arc<dyn RegistrationStore>,
    scan_limit: i64,
}

impl LookupService {
    pub fn new(registrations: Arc<dyn RegistrationStore>, scan_limit: i64) -> Self {
        Self { registrations, scan_limit }
    }

    pub async fn search_registrations(&self, query: &str) -> Result<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResult::empty());
        }

        if let Some((kind, found)) = self.exact_lookup(query).await? {
            if !found.is_empty() {
                debug!(query = query, kind = ?kind, hits = found.len(), "Exact lookup matched");
                return Ok(SearchResult { matched_by: kind, registrations: found });
            }
        }

        let needle = query.to_lowercase();
        let recent = self
            .registrations
            .list(&RegistrationFilter { status: None, limit: Some(self.scan_limit) })
            .await?;

        let registrations: Vec<Registration> = recent
            .into_iter()
            .filter(|registration| registration.matches_text(&needle))
            .collect();

        debug!(query = query, scanned_limit = self.scan_limit, hits = registrations.len(), "Text scan finished");

        if registrations.is_empty() {
            Ok(SearchResult::empty())
        } else {
            Ok(SearchResult { matched_by: MatchKind::Text, registrations })
        }
    }

    async fn exact_lookup(&self, query: &str) -> Result<Option<(MatchKind, Vec<Registration>)>> {
        let parsed = parse_qr_code(query);
        if let (true, Some(id)) = (parsed.valid, parsed.registration_id) {
            let found = self.registrations.find_by_id(&id).await?;
            return Ok(Some((MatchKind::RegistrationId, found.into_iter().collect())));
        }

        if query.contains('@') {
            let found = self.registrations.find_by_email(&normalize_email(query)).await?;
            return Ok(Some((MatchKind::Email, found)));
        }

        let upper = query.to_uppercase();
        if upper.len() == SHORT_CODE_LENGTH && is_short_code_charset(&upper) {
            let found = self.registrations.find_by_short_code(&upper).await?;
            return Ok(Some((MatchKind::ShortCode, found.into_iter().collect())));
        }

        if upper.len() == SHORT_CODE_SUFFIX_LENGTH && is_short_code_charset(&upper) {
            let found = self.registrations.find_by_suffix(&upper).await?;
            return Ok(Some((MatchKind::Suffix, found)));
        }

        Ok(None)
    }
}
