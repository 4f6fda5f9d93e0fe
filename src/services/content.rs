//! Pricing settings and simple content collections

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::database::store::{ContentStore, SettingsStore};
use crate::models::activity::NewActivityLogEntry;
use crate::models::content::{ContentItem, ContentKind, UpsertContentRequest};
use crate::models::settings::{PricingSettings, PRICING_KEY};
use crate::services::activity::ActivityService;
use crate::utils::errors::{IdmcError, Result};
use crate::utils::helpers::{generate_uuid, normalize_whitespace};

#[derive(Clone)]
pub struct ContentService {
    settings: Arc<dyn SettingsStore>,
    content: Arc<dyn ContentStore>,
    activity: ActivityService,
}

impl ContentService {
    pub fn new(settings: Arc<dyn SettingsStore>, content: Arc<dyn ContentStore>, activity: ActivityService) -> Self {
        Self { settings, content, activity }
    }

    /// Stored pricing, or the defaults when none has been saved yet
    pub async fn get_pricing(&self) -> Result<PricingSettings> {
        match self.settings.get(PRICING_KEY).await? {
            Some(entry) => Ok(serde_json::from_value(entry.value)?),
            None => {
                debug!("No pricing saved, using defaults");
                Ok(PricingSettings::default())
            }
        }
    }

    pub async fn update_pricing(&self, pricing: PricingSettings, admin: &str) -> Result<PricingSettings> {
        for (label, price) in [("regular", &pricing.regular), ("student", &pricing.student), ("senior", &pricing.senior)] {
            if price.regular < 0 || price.early_bird < 0 {
                return Err(IdmcError::Validation(format!("Price for {} cannot be negative", label)));
            }
        }
        if pricing.currency.trim().is_empty() {
            return Err(IdmcError::Validation("Currency is required".to_string()));
        }

        self.settings
            .put(PRICING_KEY, serde_json::to_value(&pricing)?, Some(admin))
            .await?;

        info!(admin = admin, "Pricing updated");
        self.activity
            .log(
                NewActivityLogEntry::new(admin, "update_pricing", "settings", Some(PRICING_KEY))
                    .with_details(serde_json::to_value(&pricing)?),
            )
            .await;

        Ok(pricing)
    }

    pub async fn list_content(&self, kind: ContentKind, published_only: bool) -> Result<Vec<ContentItem>> {
        self.content.list(kind, published_only).await
    }

    /// Create or replace a content item. New items go to the end of their list.
    pub async fn upsert_content(&self, request: UpsertContentRequest, admin: &str) -> Result<ContentItem> {
        let title = normalize_whitespace(&request.title);
        if title.is_empty() {
            return Err(IdmcError::Validation("Content title is required".to_string()));
        }

        let existing = match &request.id {
            Some(id) => self.content.find_by_id(id).await?,
            None => None,
        };

        let sort_order = match (request.sort_order, &existing) {
            (Some(order), _) => order,
            (None, Some(item)) => item.sort_order,
            (None, None) => {
                let items = self.content.list(request.kind, false).await?;
                items.iter().map(|item| item.sort_order).max().map_or(0, |max| max + 1)
            }
        };

        let item = ContentItem {
            id: request.id.unwrap_or_else(generate_uuid),
            kind: request.kind,
            title,
            data: request.data,
            sort_order,
            published: request.published,
            updated_by: Some(admin.to_string()),
            updated_at: Utc::now(),
        };

        self.content.upsert(&item).await?;
        let action = if existing.is_some() { "update_content" } else { "create_content" };
        self.activity
            .log(
                NewActivityLogEntry::new(admin, action, item.kind.as_str(), Some(&item.id))
                    .with_details(serde_json::json!({ "title": item.title })),
            )
            .await;

        Ok(item)
    }

    pub async fn delete_content(&self, id: &str, admin: &str) -> Result<bool> {
        let deleted = self.content.delete(id).await?;
        if deleted {
            self.activity
                .log(NewActivityLogEntry::new(admin, "delete_content", "content", Some(id)))
                .await;
        }
        Ok(deleted)
    }

    /// Rewrite `sort_order` to follow `ordered_ids`
    pub async fn reorder_content(&self, kind: ContentKind, ordered_ids: &[String], admin: &str) -> Result<()> {
        let now = Utc::now();
        for (position, id) in ordered_ids.iter().enumerate() {
            if !self.content.set_sort_order(id, position as i32, now).await? {
                return Err(IdmcError::Validation(format!("Unknown content item: {}", id)));
            }
        }

        self.activity
            .log(
                NewActivityLogEntry::new(admin, "reorder_content", kind.as_str(), None)
                    .with_details(serde_json::json!({ "order": ordered_ids })),
            )
            .await;
        Ok(())
    }
}
