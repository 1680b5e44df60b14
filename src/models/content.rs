use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post, page or product known to the host site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub post_type: String,
    pub slug: String,
    pub title: String,
    pub status: String,
    pub permalink: String,
    pub translation_group: Option<String>,
    pub default_language: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub legacy_en: Option<String>,
    pub legacy_de: Option<String>,
    pub fields: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Category and tag names, the input to language detection.
    pub fn term_names(&self) -> BTreeSet<String> {
        self.categories
            .iter()
            .chain(self.tags.iter())
            .cloned()
            .collect()
    }

    pub fn is_published(&self) -> bool {
        self.status == "publish"
    }

    /// Legacy flat URL fields, in fixed en/de order.
    pub fn legacy_urls(&self) -> Vec<(&'static str, &str)> {
        let mut urls = Vec::new();
        if let Some(url) = self.legacy_en.as_deref().filter(|u| !u.is_empty()) {
            urls.push(("en", url));
        }
        if let Some(url) = self.legacy_de.as_deref().filter(|u| !u.is_empty()) {
            urls.push(("de", url));
        }
        urls
    }

    /// Original (untranslated) value of a translatable field.
    pub fn field_value(&self, field_name: &str) -> Option<&str> {
        // Product field names read the same columns as posts
        let key = match field_name {
            "title" | "product_name" => return Some(self.title.as_str()),
            "product_description" => "content",
            "product_short_description" => "excerpt",
            other => other,
        };
        self.fields.get(key).map(|v| v.as_str())
    }
}

/// Content as submitted by the host (or imported from JSON).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContent {
    pub id: i64,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub permalink: String,
    #[serde(default)]
    pub translation_group: Option<String>,
    #[serde(default)]
    pub default_language: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub legacy_en: Option<String>,
    #[serde(default)]
    pub legacy_de: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

fn default_post_type() -> String {
    "post".to_string()
}

fn default_status() -> String {
    "publish".to_string()
}
