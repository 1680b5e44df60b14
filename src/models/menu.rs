use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Language of a navigation menu and the menus that translate it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuTranslation {
    pub menu_id: i64,
    pub language: String,
    pub translations: BTreeMap<String, i64>,
}

/// A rendered navigation menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub classes: Vec<String>,
}
