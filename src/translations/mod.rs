use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::hreflang::sync::is_valid_absolute_url;
use crate::models::{ContentItem, FieldTranslation, FieldType, LanguageRegistry, NewFieldTranslation};
use crate::products;

/// Fields every content type exposes for translation.
pub const CORE_FIELDS: [(&str, FieldType); 3] = [
    ("title", FieldType::Text),
    ("content", FieldType::Textarea),
    ("excerpt", FieldType::Textarea),
];

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static PARAGRAPH_REGEX: OnceLock<Regex> = OnceLock::new();

/// Clean a submitted value for storage.
pub fn sanitize(value: &str, field_type: FieldType) -> String {
    match field_type {
        FieldType::Text => {
            let re = TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
            re.replace_all(value, "")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        }
        // Allowlisted markup only; script and style bodies go with their tags
        FieldType::Textarea => ammonia::clean(value).trim().to_string(),
        FieldType::Url => {
            let url = value.trim();
            if is_valid_absolute_url(url) {
                url.to_string()
            } else {
                String::new()
            }
        }
        FieldType::Email => {
            let re = EMAIL_REGEX.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
            let email = value.trim();
            if re.is_match(email) {
                email.to_string()
            } else {
                String::new()
            }
        }
        FieldType::Number => match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => n.to_string(),
            _ => "0".to_string(),
        },
    }
}

/// Render a stored value as HTML.
pub fn format_for_display(value: &str, field_type: FieldType) -> String {
    match field_type {
        FieldType::Textarea => paragraphs(&ammonia::clean(value)),
        _ => htmlescape::encode_minimal(value),
    }
}

/// Blank lines split paragraphs; single newlines become line breaks.
fn paragraphs(value: &str) -> String {
    let re = PARAGRAPH_REGEX.get_or_init(|| Regex::new(r"\n\s*\n").unwrap());
    let normalized = value.replace("\r\n", "\n");
    re.split(normalized.trim())
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>", p.trim().replace('\n', "<br />\n")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fields of `item` that can carry translations, with their types. Meta keys
/// count as text; products have their own set.
pub fn translatable_fields(item: &ContentItem) -> Vec<(String, FieldType)> {
    if products::is_product(item) {
        return products::product_fields(item);
    }
    let mut fields: Vec<(String, FieldType)> = CORE_FIELDS
        .iter()
        .map(|(name, field_type)| (name.to_string(), *field_type))
        .collect();
    for name in item.fields.keys() {
        if !fields.iter().any(|(f, _)| f == name) {
            fields.push((name.clone(), FieldType::Text));
        }
    }
    fields
}

pub struct TranslationManager<'a> {
    repo: &'a Repository,
    registry: &'a LanguageRegistry,
}

impl<'a> TranslationManager<'a> {
    pub fn new(repo: &'a Repository, registry: &'a LanguageRegistry) -> Self {
        Self { repo, registry }
    }

    fn check(&self, field_name: &str, language_code: &str) -> Result<()> {
        if field_name.trim().is_empty() {
            return Err(AppError::InvalidInput("field name must not be empty".into()));
        }
        if !self.registry.contains(language_code) {
            return Err(AppError::InvalidInput(format!(
                "language '{language_code}' is not configured"
            )));
        }
        Ok(())
    }

    /// Store one translation; returns the sanitized value actually saved.
    pub async fn save(
        &self,
        content_id: i64,
        field_name: &str,
        field_type: FieldType,
        language_code: &str,
        value: &str,
        translation_group: Option<String>,
    ) -> Result<String> {
        self.check(field_name, language_code)?;
        let value = sanitize(value, field_type);
        self.repo
            .save_field_translations(vec![NewFieldTranslation {
                content_id,
                field_name: field_name.to_string(),
                field_type,
                language_code: language_code.to_string(),
                value: value.clone(),
                translation_group,
            }])
            .await?;
        tracing::debug!(
            "Saved {} translation of '{}' for content {}",
            language_code,
            field_name,
            content_id
        );
        Ok(value)
    }

    /// Store several fields of one language in a single transaction.
    pub async fn bulk_save(
        &self,
        content_id: i64,
        language_code: &str,
        values: BTreeMap<String, String>,
        field_type: FieldType,
        translation_group: Option<String>,
    ) -> Result<usize> {
        let mut batch = Vec::with_capacity(values.len());
        for (field_name, value) in values {
            self.check(&field_name, language_code)?;
            batch.push(NewFieldTranslation {
                content_id,
                value: sanitize(&value, field_type),
                field_name,
                field_type,
                language_code: language_code.to_string(),
                translation_group: translation_group.clone(),
            });
        }
        let saved = batch.len();
        self.repo.save_field_translations(batch).await?;
        Ok(saved)
    }

    pub async fn get(&self, content_id: i64, field_name: &str, language_code: &str) -> Result<Option<String>> {
        self.repo
            .get_field_translation(content_id, field_name, language_code)
            .await
    }

    pub async fn has(&self, content_id: i64, field_name: &str, language_code: &str) -> Result<bool> {
        Ok(self.get(content_id, field_name, language_code).await?.is_some())
    }

    /// The translation when one exists and is not empty, else the original.
    pub async fn translated_or_original(
        &self,
        item: &ContentItem,
        field_name: &str,
        language_code: &str,
    ) -> Result<Option<String>> {
        let translated = self
            .get(item.id, field_name, language_code)
            .await?
            .filter(|v| !v.is_empty());
        Ok(translated.or_else(|| item.field_value(field_name).map(str::to_string)))
    }

    pub async fn display_value(
        &self,
        item: &ContentItem,
        field_name: &str,
        field_type: FieldType,
        language_code: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .translated_or_original(item, field_name, language_code)
            .await?
            .map(|v| format_for_display(&v, field_type)))
    }

    pub async fn for_content(&self, content_id: i64, language_code: Option<String>) -> Result<Vec<FieldTranslation>> {
        self.repo.field_translations(content_id, language_code).await
    }

    pub async fn translated_fields(&self, content_id: i64) -> Result<Vec<String>> {
        self.repo.translated_fields(content_id).await
    }

    pub async fn delete(&self, content_id: i64, field_name: &str, language_code: &str) -> Result<bool> {
        self.repo
            .delete_field_translation(content_id, field_name, language_code)
            .await
    }

    pub async fn delete_all(&self, content_id: i64) -> Result<usize> {
        self.repo.delete_field_translations(content_id).await
    }

    /// Number of translated fields per language.
    pub async fn stats(&self, content_id: i64) -> Result<Vec<(String, i64)>> {
        self.repo.field_translation_stats(content_id).await
    }

    pub async fn content_by_language(&self, language_code: &str) -> Result<Vec<i64>> {
        self.repo.posts_with_field_language(language_code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewContent;

    #[test]
    fn test_sanitize_by_type() {
        assert_eq!(sanitize("  <b>Hello</b>\n  world ", FieldType::Text), "Hello world");
        assert_eq!(
            sanitize("<p>Hi</p><script>alert(1)</script>", FieldType::Textarea),
            "<p>Hi</p>"
        );
        assert_eq!(sanitize(" https://example.com/de ", FieldType::Url), "https://example.com/de");
        assert_eq!(sanitize("javascript:alert(1)", FieldType::Url), "");
        assert_eq!(sanitize("info@example.com", FieldType::Email), "info@example.com");
        assert_eq!(sanitize("not an email", FieldType::Email), "");
        assert_eq!(sanitize("2.50", FieldType::Number), "2.5");
        assert_eq!(sanitize("12", FieldType::Number), "12");
        assert_eq!(sanitize("abc", FieldType::Number), "0");
    }

    #[test]
    fn test_textarea_strips_handlers_and_unclosed_script() {
        let stored = sanitize(
            "Hi <img src=x onerror=alert(1)> <script>alert(2)",
            FieldType::Textarea,
        );
        assert!(stored.starts_with("Hi <img"), "{stored}");
        assert!(!stored.contains("onerror"), "{stored}");
        assert!(!stored.contains("<script"), "{stored}");
        assert!(!stored.contains("alert(2)"), "{stored}");

        let html = format_for_display(
            "<b onclick=\"steal()\">bold</b>\n\n<iframe src=\"https://evil.example/\"></iframe><script>bad()",
            FieldType::Textarea,
        );
        assert!(html.starts_with("<p><b>bold</b></p>"), "{html}");
        assert!(!html.contains("onclick"), "{html}");
        assert!(!html.contains("<iframe"), "{html}");
        assert!(!html.contains("bad()"), "{html}");
    }

    #[test]
    fn test_format_for_display() {
        assert_eq!(
            format_for_display("One\nline\n\nTwo", FieldType::Textarea),
            "<p>One<br />\nline</p>\n<p>Two</p>"
        );
        assert_eq!(format_for_display("a < b", FieldType::Text), "a &lt; b");
    }

    #[test]
    fn test_translatable_fields_include_meta_keys() {
        let mut item = crate::render::fixtures::item("https://example.com/p/", &[]);
        item.fields.insert("price_note".into(), "Incl. VAT".into());
        item.fields.insert("excerpt".into(), "Short".into());
        assert_eq!(
            translatable_fields(&item),
            vec![
                ("title".to_string(), FieldType::Text),
                ("content".to_string(), FieldType::Textarea),
                ("excerpt".to_string(), FieldType::Textarea),
                ("price_note".to_string(), FieldType::Text),
            ]
        );

        item.post_type = "product".into();
        item.fields.insert("attribute_size".into(), "42".into());
        let names: Vec<String> = translatable_fields(&item).into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "product_name",
                "product_description",
                "product_short_description",
                "attribute_size"
            ]
        );
    }

    #[tokio::test]
    async fn test_save_get_and_fallback() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(NewContent {
            id: 4,
            slug: "shoe".into(),
            title: "Shoe".into(),
            permalink: "https://example.com/shoe/".into(),
            post_type: "product".into(),
            status: "publish".into(),
            ..NewContent::default()
        })
        .await
        .unwrap();
        let registry = LanguageRegistry::default();
        let manager = TranslationManager::new(&repo, &registry);
        let item = repo.get_content(4).await.unwrap().unwrap();

        let saved = manager
            .save(4, "title", FieldType::Text, "de", "<i>Schuh</i>", None)
            .await
            .unwrap();
        assert_eq!(saved, "Schuh");

        assert!(manager.has(4, "title", "de").await.unwrap());
        assert_eq!(
            manager.translated_or_original(&item, "title", "de").await.unwrap().as_deref(),
            Some("Schuh")
        );
        assert_eq!(
            manager.translated_or_original(&item, "title", "en").await.unwrap().as_deref(),
            Some("Shoe")
        );
        assert_eq!(manager.translated_or_original(&item, "excerpt", "de").await.unwrap(), None);

        assert!(matches!(
            manager.save(4, "title", FieldType::Text, "xx", "?", None).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_bulk_save_stats_and_delete() {
        let repo = Repository::in_memory().await.unwrap();
        let registry = LanguageRegistry::default();
        let manager = TranslationManager::new(&repo, &registry);

        let mut values = BTreeMap::new();
        values.insert("title".to_string(), "Hallo".to_string());
        values.insert("excerpt".to_string(), "Kurz".to_string());
        assert_eq!(
            manager
                .bulk_save(9, "de", values, FieldType::Text, Some("g".into()))
                .await
                .unwrap(),
            2
        );
        manager
            .save(9, "title", FieldType::Text, "en", "Hello", None)
            .await
            .unwrap();

        assert_eq!(
            manager.stats(9).await.unwrap(),
            vec![("de".to_string(), 2), ("en".to_string(), 1)]
        );
        assert_eq!(manager.translated_fields(9).await.unwrap(), vec!["excerpt", "title"]);
        assert_eq!(manager.for_content(9, Some("de".into())).await.unwrap().len(), 2);
        assert_eq!(manager.content_by_language("de").await.unwrap(), vec![9]);

        assert!(manager.delete(9, "title", "en").await.unwrap());
        assert!(!manager.delete(9, "title", "en").await.unwrap());
        assert_eq!(manager.delete_all(9).await.unwrap(), 2);
    }
}
