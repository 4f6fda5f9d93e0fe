//! Admin-editable settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::registration::AttendeeCategory;

/// Settings key under which pricing is stored
pub const PRICING_KEY: &str = "pricing";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrice {
    pub regular: i64,
    pub early_bird: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSettings {
    pub currency: String,
    pub early_bird_deadline: Option<DateTime<Utc>>,
    pub regular: CategoryPrice,
    pub student: CategoryPrice,
    pub senior: CategoryPrice,
}

impl PricingSettings {
    pub fn price_for(&self, category: AttendeeCategory, at: DateTime<Utc>) -> i64 {
        let prices = match category {
            AttendeeCategory::Regular => &self.regular,
            AttendeeCategory::Student => &self.student,
            AttendeeCategory::Senior => &self.senior,
        };

        match self.early_bird_deadline {
            Some(deadline) if at <= deadline => prices.early_bird,
            _ => prices.regular,
        }
    }
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            currency: "PHP".to_string(),
            early_bird_deadline: None,
            regular: CategoryPrice { regular: 1500, early_bird: 1200 },
            student: CategoryPrice { regular: 1000, early_bird: 800 },
            senior: CategoryPrice { regular: 1000, early_bird: 800 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_early_bird_pricing() {
        let now = Utc::now();
        let pricing = PricingSettings {
            early_bird_deadline: Some(now + Duration::days(1)),
            ..PricingSettings::default()
        };
        assert_eq!(pricing.price_for(AttendeeCategory::Regular, now), 1200);
        assert_eq!(pricing.price_for(AttendeeCategory::Regular, now + Duration::days(2)), 1500);
        assert_eq!(pricing.price_for(AttendeeCategory::Student, now + Duration::days(2)), 1000);
    }
}
