use serde_json::{json, Value};

use crate::config::Config;
use crate::error::Result;
use crate::hreflang::detect::detect_content_language;
use crate::models::{locale_for, site_locale_tag, HreflangEntry, LanguageRegistry};

use super::{escape, Page};

/// `<link rel="alternate">` tags: one per row, then the x-default.
pub fn head_tags(entries: &[HreflangEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&link_tag(&entry.language_code, &entry.url));
    }
    if let Some(default) = entries.iter().find(|e| e.is_default) {
        out.push_str(&link_tag("x-default", &default.url));
    }
    out
}

fn link_tag(hreflang: &str, href: &str) -> String {
    format!(
        "<link rel=\"alternate\" hreflang=\"{}\" href=\"{}\" />\n",
        escape(hreflang),
        escape(href)
    )
}

/// Locale of the page: detected language, else the site locale, else en-US.
pub fn page_locale(page: &Page, registry: &LanguageRegistry, config: &Config) -> String {
    detect_content_language(page.item, registry)
        .map(|code| locale_for(&code))
        .or_else(|| site_locale_tag(&config.site_locale))
        .unwrap_or_else(|| "en-US".to_string())
}

/// JSON-LD `WebPage` block, only for pages with more than one language.
pub fn json_ld(page: &Page, registry: &LanguageRegistry, config: &Config) -> Result<Option<String>> {
    if page.entries.len() <= 1 {
        return Ok(None);
    }

    let mut doc = json!({
        "@context": "https://schema.org",
        "@type": "WebPage",
        "@id": page.item.permalink,
        "url": page.item.permalink,
        "name": page.item.title,
        "inLanguage": page_locale(page, registry, config),
        "isPartOf": {
            "@type": "WebSite",
            "url": config.home_url,
            "name": config.site_name,
        },
    });

    let translations: Vec<Value> = page
        .entries
        .iter()
        .filter(|e| !page.is_current(e))
        .map(|e| {
            json!({
                "@type": "WebPage",
                "url": e.url,
                "inLanguage": locale_for(&e.language_code),
            })
        })
        .collect();
    if !translations.is_empty() {
        doc["translationOfWork"] = Value::Array(translations);
    }

    // a literal "</script>" inside a string must not close the block
    let body = serde_json::to_string_pretty(&doc)?.replace("</", "<\\/");
    Ok(Some(format!(
        "<script type=\"application/ld+json\">\n{body}\n</script>\n"
    )))
}

/// Value for the document's `lang` attribute, e.g. `lang="de-DE"`.
///
/// Without a detected language, a page that only links the other of
/// en/de is taken to be in the remaining one.
pub fn html_lang(page: &Page, registry: &LanguageRegistry) -> Option<String> {
    if let Some(code) = detect_content_language(page.item, registry) {
        return Some(format!("lang=\"{}\"", locale_for(&code)));
    }

    let has = |code: &str| page.entries.iter().any(|e| e.language_code == code);
    match (has("en"), has("de")) {
        (true, false) => Some("lang=\"de-DE\"".to_string()),
        (false, true) => Some("lang=\"en-US\"".to_string()),
        _ => None,
    }
}

/// Everything the page head gets, honoring the output toggles.
pub fn render_head(page: &Page, registry: &LanguageRegistry, config: &Config) -> Result<String> {
    if !config.enabled || page.entries.is_empty() {
        return Ok(String::new());
    }

    let mut out = head_tags(page.entries);
    if config.enable_json_ld {
        if let Some(block) = json_ld(page, registry, config)? {
            out.push_str(&block);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures::{entry, item};

    fn config() -> Config {
        Config {
            db_path: ":memory:".into(),
            site_name: "Example".into(),
            home_url: "https://example.com".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_head_tags_append_x_default() {
        let entries = vec![
            entry("en", "https://example.com/hello/", true),
            entry("de", "https://example.com/hallo/", false),
        ];

        let html = head_tags(&entries);

        assert_eq!(
            html,
            "<link rel=\"alternate\" hreflang=\"en\" href=\"https://example.com/hello/\" />\n\
             <link rel=\"alternate\" hreflang=\"de\" href=\"https://example.com/hallo/\" />\n\
             <link rel=\"alternate\" hreflang=\"x-default\" href=\"https://example.com/hello/\" />\n"
        );
    }

    #[test]
    fn test_head_tags_escape_attributes() {
        let entries = vec![entry("en", "https://example.com/?a=1&b=\"x\"", false)];
        let html = head_tags(&entries);
        assert!(html.contains("href=\"https://example.com/?a=1&amp;b=&quot;x&quot;\""));
        assert!(!html.contains("x-default"));
    }

    #[test]
    fn test_json_ld_lists_other_languages() {
        let item = item("https://example.com/hello/", &["English"]);
        let entries = vec![
            entry("en", "https://example.com/hello/", true),
            entry("de", "https://example.com/hallo/", false),
        ];
        let registry = LanguageRegistry::default();

        let block = json_ld(&Page::new(&item, &entries), &registry, &config())
            .unwrap()
            .unwrap();

        let json = block
            .trim_start_matches("<script type=\"application/ld+json\">\n")
            .trim_end_matches("\n</script>\n");
        let doc: Value = serde_json::from_str(json).unwrap();
        assert_eq!(doc["inLanguage"], "en-US");
        assert_eq!(doc["isPartOf"]["name"], "Example");
        let translations = doc["translationOfWork"].as_array().unwrap();
        assert_eq!(translations.len(), 1);
        assert_eq!(translations[0]["inLanguage"], "de-DE");
    }

    #[test]
    fn test_json_ld_skipped_for_single_language() {
        let item = item("https://example.com/hello/", &[]);
        let entries = vec![entry("en", "https://example.com/hello/", true)];
        let registry = LanguageRegistry::default();
        assert!(json_ld(&Page::new(&item, &entries), &registry, &config())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_html_lang() {
        let registry = LanguageRegistry::default();
        let detected = item("https://example.com/hallo/", &["Deutsch"]);
        assert_eq!(
            html_lang(&Page::new(&detected, &[]), &registry).as_deref(),
            Some("lang=\"de-DE\"")
        );

        let unknown = item("https://example.com/x/", &[]);
        let only_en = vec![entry("en", "https://example.com/en/", false)];
        assert_eq!(
            html_lang(&Page::new(&unknown, &only_en), &registry).as_deref(),
            Some("lang=\"de-DE\"")
        );
        assert_eq!(html_lang(&Page::new(&unknown, &[]), &registry), None);
    }

    #[test]
    fn test_render_head_respects_toggles() {
        let item = item("https://example.com/hello/", &["English"]);
        let entries = vec![
            entry("en", "https://example.com/hello/", false),
            entry("de", "https://example.com/hallo/", false),
        ];
        let registry = LanguageRegistry::default();
        let page = Page::new(&item, &entries);

        let full = render_head(&page, &registry, &config()).unwrap();
        assert!(full.contains("application/ld+json"));

        let no_json = Config {
            enable_json_ld: false,
            ..config()
        };
        assert!(!render_head(&page, &registry, &no_json).unwrap().contains("ld+json"));

        let disabled = Config {
            enabled: false,
            ..config()
        };
        assert!(render_head(&page, &registry, &disabled).unwrap().is_empty());
    }
}
