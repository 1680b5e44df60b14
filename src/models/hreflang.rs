use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Write precedence of an hreflang row.
///
/// Lower numeric value wins: a write only replaces a stored row of equal or
/// lower precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Entered by an editor
    Manual = 1,
    /// Pushed from a sibling when that sibling was saved
    Propagated = 2,
    /// Pulled from siblings into the item being saved
    AutoSynced = 3,
    /// Legacy fields, taxonomy derivation and automatic fixes
    Derived = 4,
}

impl Priority {
    pub fn rank(self) -> i64 {
        self as i64
    }

    pub fn from_rank(rank: i64) -> Self {
        match rank {
            1 => Self::Manual,
            2 => Self::Propagated,
            3 => Self::AutoSynced,
            _ => Self::Derived,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Propagated => "propagated",
            Self::AutoSynced => "auto-synced",
            Self::Derived => "derived",
        }
    }
}

/// One stored alternate URL of a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HreflangEntry {
    pub id: i64,
    pub content_id: i64,
    pub language_code: String,
    pub url: String,
    pub is_default: bool,
    pub translation_group: Option<String>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHreflang {
    pub content_id: i64,
    pub language_code: String,
    pub url: String,
    pub translation_group: Option<String>,
    pub priority: Priority,
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HreflangStats {
    pub total_entries: i64,
    pub total_posts: i64,
    pub total_groups: i64,
    pub languages: Vec<(String, i64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering_follows_precedence() {
        assert!(Priority::Manual < Priority::Propagated);
        assert!(Priority::Propagated < Priority::AutoSynced);
        assert!(Priority::AutoSynced < Priority::Derived);
    }

    #[test]
    fn test_priority_rank_round_trip_and_unknown() {
        assert_eq!(Priority::from_rank(Priority::Propagated.rank()), Priority::Propagated);
        assert_eq!(Priority::from_rank(0), Priority::Derived);
    }
}
