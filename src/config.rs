use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{default_languages, LanguageDescriptor, LanguageRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuFlagsDisplay {
    #[default]
    Row,
    Column,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub auto_detect: bool,

    #[serde(default = "default_true")]
    pub enable_json_ld: bool,

    #[serde(default = "default_true")]
    pub show_flags: bool,

    #[serde(default)]
    pub auto_menu_flags: bool,

    #[serde(default)]
    pub menu_flags_display: MenuFlagsDisplay,

    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default = "default_site_locale")]
    pub site_locale: String,

    #[serde(default)]
    pub site_name: String,

    #[serde(default)]
    pub home_url: String,

    #[serde(default = "default_true")]
    pub enable_validation: bool,

    #[serde(default)]
    pub check_url_accessibility: bool,

    #[serde(default = "default_url_check_timeout")]
    pub url_check_timeout_secs: u64,

    #[serde(default = "default_post_types")]
    pub enabled_post_types: Vec<String>,

    pub editor_token: Option<String>,

    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageDescriptor>,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("langlinks");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("langlinks.db").to_string_lossy().to_string()
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

fn default_site_locale() -> String {
    "en_US".to_string()
}

fn default_url_check_timeout() -> u64 {
    5
}

fn default_post_types() -> Vec<String> {
    vec!["post".to_string(), "page".to_string(), "product".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            enabled: true,
            auto_detect: true,
            enable_json_ld: true,
            show_flags: true,
            auto_menu_flags: false,
            menu_flags_display: MenuFlagsDisplay::Row,
            default_language: default_language(),
            site_locale: default_site_locale(),
            site_name: String::new(),
            home_url: String::new(),
            enable_validation: true,
            check_url_accessibility: false,
            url_check_timeout_secs: default_url_check_timeout(),
            enabled_post_types: default_post_types(),
            editor_token: None,
            languages: default_languages(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read the config at `path`, writing defaults there if it does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("langlinks")
            .join("config.toml")
    }

    pub fn registry(&self) -> LanguageRegistry {
        LanguageRegistry::new(self.languages.clone())
    }

    pub fn is_post_type_enabled(&self, post_type: &str) -> bool {
        self.enabled_post_types.iter().any(|t| t == post_type)
    }

    fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(AppError::Config("at least one language must be configured".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for lang in &self.languages {
            if lang.code.trim().is_empty() {
                return Err(AppError::Config("language code must not be empty".into()));
            }
            if !seen.insert(lang.code.as_str()) {
                return Err(AppError::Config(format!(
                    "language code '{}' is configured twice",
                    lang.code
                )));
            }
        }
        Ok(())
    }
}
