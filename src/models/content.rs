//! Simple content collections shown on the public site
//!
//! Speakers, FAQs, bank accounts, downloads, the what-to-bring list and the
//! food menu are all ordered lists of small documents edited by admins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Speaker,
    Faq,
    BankAccount,
    Download,
    WhatToBring,
    FoodMenu,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Speaker => "speaker",
            ContentKind::Faq => "faq",
            ContentKind::BankAccount => "bank_account",
            ContentKind::Download => "download",
            ContentKind::WhatToBring => "what_to_bring",
            ContentKind::FoodMenu => "food_menu",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "speaker" => Some(ContentKind::Speaker),
            "faq" => Some(ContentKind::Faq),
            "bank_account" => Some(ContentKind::BankAccount),
            "download" => Some(ContentKind::Download),
            "what_to_bring" => Some(ContentKind::WhatToBring),
            "food_menu" => Some(ContentKind::FoodMenu),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    pub data: serde_json::Value,
    pub sort_order: i32,
    pub published: bool,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertContentRequest {
    pub id: Option<String>,
    pub kind: ContentKind,
    pub title: String,
    pub data: serde_json::Value,
    pub sort_order: Option<i32>,
    pub published: bool,
}
