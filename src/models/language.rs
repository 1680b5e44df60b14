use serde::{Deserialize, Serialize};

/// A language the site publishes in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDescriptor {
    /// Short code used as the hreflang value (e.g. "en", "de")
    pub code: String,

    /// Display name, also matched against category and tag names
    pub name: String,

    /// Flag glyph shown by switchers and menus
    #[serde(default)]
    pub flag: String,
}

impl LanguageDescriptor {
    pub fn new(code: &str, name: &str, flag: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            flag: flag.to_string(),
        }
    }
}

/// Ordered list of configured languages.
///
/// Order matters: language detection tries languages in registry order and
/// the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRegistry {
    languages: Vec<LanguageDescriptor>,
}

impl LanguageRegistry {
    pub fn new(languages: Vec<LanguageDescriptor>) -> Self {
        Self { languages }
    }

    pub fn get_by_code(&self, code: &str) -> Option<&LanguageDescriptor> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageDescriptor> {
        self.languages.iter()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.languages.iter().map(|lang| lang.code.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new(default_languages())
    }
}

pub fn default_languages() -> Vec<LanguageDescriptor> {
    vec![
        LanguageDescriptor::new("en", "English", "🇺🇸"),
        LanguageDescriptor::new("de", "Deutsch", "🇩🇪"),
    ]
}

const LOCALES: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("de", "de-DE"),
    ("fr", "fr-FR"),
    ("es", "es-ES"),
    ("it", "it-IT"),
    ("pt", "pt-PT"),
    ("nl", "nl-NL"),
    ("pl", "pl-PL"),
    ("ru", "ru-RU"),
    ("ja", "ja-JP"),
    ("zh", "zh-CN"),
    ("ko", "ko-KR"),
    ("ar", "ar-SA"),
    ("tr", "tr-TR"),
    ("sv", "sv-SE"),
    ("da", "da-DK"),
    ("no", "no-NO"),
    ("fi", "fi-FI"),
    ("cs", "cs-CZ"),
    ("hu", "hu-HU"),
    ("ro", "ro-RO"),
    ("el", "el-GR"),
    ("he", "he-IL"),
    ("th", "th-TH"),
    ("vi", "vi-VN"),
    ("id", "id-ID"),
    ("uk", "uk-UA"),
    ("hr", "hr-HR"),
    ("sk", "sk-SK"),
    ("bg", "bg-BG"),
];

/// Map a language code to a BCP 47 locale ("de" -> "de-DE").
///
/// Unknown codes fall back to `code-CODE`.
pub fn locale_for(code: &str) -> String {
    LOCALES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, locale)| locale.to_string())
        .unwrap_or_else(|| format!("{}-{}", code, code.to_uppercase()))
}

/// Convert a site locale such as "de_DE" into "de-DE".
pub fn site_locale_tag(site_locale: &str) -> Option<String> {
    let mut parts = site_locale.split('_');
    let lang = parts.next().filter(|p| !p.is_empty())?;
    let region = parts.next().filter(|p| !p.is_empty())?;
    Some(format!("{}-{}", lang, region.to_uppercase()))
}

/// The language part of a site locale ("de_DE" -> "de").
pub fn site_locale_language(site_locale: &str) -> &str {
    site_locale.split(['_', '-']).next().unwrap_or(site_locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = LanguageRegistry::default();
        assert_eq!(registry.codes(), vec!["en", "de"]);
        assert_eq!(registry.get_by_code("de").unwrap().name, "Deutsch");
        assert!(registry.get_by_code("fr").is_none());
    }

    #[test]
    fn test_locale_for_known_and_unknown() {
        assert_eq!(locale_for("en"), "en-US");
        assert_eq!(locale_for("ja"), "ja-JP");
        assert_eq!(locale_for("eo"), "eo-EO");
    }

    #[test]
    fn test_site_locale_helpers() {
        assert_eq!(site_locale_tag("de_DE").as_deref(), Some("de-DE"));
        assert_eq!(site_locale_tag("en"), None);
        assert_eq!(site_locale_language("de_DE"), "de");
        assert_eq!(site_locale_language("fr"), "fr");
    }
}
