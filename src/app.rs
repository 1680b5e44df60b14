use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::hreflang::{
    language_or_default, GroupSynchronizer, HreflangResolver, SaveRequest, SyncReport,
    ValidationReport, Validator,
};
use crate::models::{
    ContentItem, FieldType, HreflangEntry, HreflangStats, LanguageRegistry, MenuItem, NewContent,
    NewFieldTranslation,
};
use crate::products::{InventorySync, StockLevel};
use crate::render::{head, menu, shortcode, Page};
use crate::security;
use crate::translations::TranslationManager;

pub struct App {
    pub config: Config,
    pub registry: LanguageRegistry,
    pub repository: Repository,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(config: Config, repository: Repository) -> Self {
        let registry = config.registry();
        Self {
            config,
            registry,
            repository,
        }
    }

    pub fn resolver(&self) -> HreflangResolver<'_> {
        HreflangResolver::new(&self.repository, &self.registry, &self.config)
    }

    pub fn synchronizer(&self) -> GroupSynchronizer<'_> {
        GroupSynchronizer::new(&self.repository, &self.registry, &self.config)
    }

    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.repository, &self.registry, &self.config)
    }

    pub fn translations(&self) -> TranslationManager<'_> {
        TranslationManager::new(&self.repository, &self.registry)
    }

    fn authorize(&self, token: Option<&str>) -> Result<()> {
        security::authorize(self.config.editor_token.as_deref(), token)
    }

    // Content catalog

    pub async fn add_content(&self, content: NewContent, token: Option<&str>) -> Result<()> {
        self.authorize(token)?;
        if !self.config.is_post_type_enabled(&content.post_type) {
            tracing::warn!(
                "Post type '{}' is not enabled; content {} will render without hreflang",
                content.post_type,
                content.id
            );
        }
        let id = content.id;
        self.repository.upsert_content(content).await?;
        tracing::info!("Stored content {}", id);
        Ok(())
    }

    /// Import a JSON array of content items; returns how many were stored.
    pub async fn import_content(&self, path: &Path, token: Option<&str>) -> Result<usize> {
        self.authorize(token)?;
        let items: Vec<NewContent> = read_json(path)?;

        let mut stored = 0;
        for item in items {
            let id = item.id;
            match self.repository.upsert_content(item).await {
                Ok(()) => stored += 1,
                Err(e) => tracing::warn!("Failed to import content {}: {}", id, e),
            }
        }
        Ok(stored)
    }

    pub async fn content(&self, id: i64) -> Result<ContentItem> {
        self.repository
            .get_content(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("content {id}")))
    }

    /// Remove a content item. Its hreflang rows wait for the orphan sweep
    /// unless `with_links` is set.
    pub async fn delete_content(&self, id: i64, with_links: bool, token: Option<&str>) -> Result<bool> {
        self.authorize(token)?;
        let deleted = self.repository.delete_content(id).await?;
        if deleted {
            self.repository.delete_field_translations(id).await?;
            if with_links {
                let rows = self.repository.delete_for_content(id).await?;
                tracing::debug!("Removed {} hreflang rows of content {}", rows, id);
            }
            tracing::info!("Deleted content {}", id);
        }
        Ok(deleted)
    }

    // Hreflang

    pub async fn save(&self, request: SaveRequest) -> Result<SyncReport> {
        self.synchronizer().save(request).await
    }

    /// Rows to render for a content item; empty for disabled post types.
    pub async fn entries(&self, item: &ContentItem) -> Result<Vec<HreflangEntry>> {
        if !self.config.is_post_type_enabled(&item.post_type) {
            return Ok(Vec::new());
        }
        self.resolver().resolve(item.id).await
    }

    pub async fn resolve(&self, id: i64) -> Result<Vec<HreflangEntry>> {
        let item = self.content(id).await?;
        self.entries(&item).await
    }

    pub async fn group_urls(&self, group: &str, current_id: i64) -> Result<BTreeMap<String, String>> {
        self.synchronizer().group_urls(group, current_id).await
    }

    // Rendering

    pub async fn render_head(&self, id: i64) -> Result<String> {
        let item = self.content(id).await?;
        let entries = self.entries(&item).await?;
        head::render_head(&Page::new(&item, &entries), &self.registry, &self.config)
    }

    pub async fn html_lang(&self, id: i64) -> Result<Option<String>> {
        let item = self.content(id).await?;
        let entries = self.entries(&item).await?;
        Ok(head::html_lang(&Page::new(&item, &entries), &self.registry))
    }

    pub async fn render_shortcode(&self, id: i64, name: &str, attrs: &str) -> Result<String> {
        let item = self.content(id).await?;
        let entries = self.entries(&item).await?;
        shortcode::render_shortcode(
            name,
            attrs,
            &Page::new(&item, &entries),
            &self.registry,
            &self.config,
        )
    }

    /// Rendered menu items with flags appended when automatic flags are on.
    pub async fn render_menu_html(&self, id: i64, items_html: &str) -> Result<String> {
        if !self.config.auto_menu_flags {
            return Ok(items_html.to_string());
        }
        let item = self.content(id).await?;
        let entries = self.entries(&item).await?;
        Ok(menu::auto_menu_flags(
            items_html,
            &Page::new(&item, &entries),
            &self.registry,
            self.config.menu_flags_display,
        ))
    }

    pub async fn render_menu_items(&self, id: Option<i64>, items: Vec<MenuItem>) -> Result<Vec<MenuItem>> {
        let display = self.config.menu_flags_display;
        let Some(id) = id else {
            return Ok(menu::replace_menu_placeholder(items, None, &self.registry, display));
        };
        let item = self.content(id).await?;
        let entries = self.entries(&item).await?;
        Ok(menu::replace_menu_placeholder(
            items,
            Some(&Page::new(&item, &entries)),
            &self.registry,
            display,
        ))
    }

    // Field translations

    /// Store one translated field; returns the sanitized value.
    pub async fn save_translation(&self, translation: NewFieldTranslation, token: Option<&str>) -> Result<String> {
        self.authorize(token)?;
        self.translations()
            .save(
                translation.content_id,
                &translation.field_name,
                translation.field_type,
                &translation.language_code,
                &translation.value,
                translation.translation_group,
            )
            .await
    }

    /// Store a JSON object of `field -> value` for one language.
    pub async fn import_translations(
        &self,
        content_id: i64,
        language_code: &str,
        path: &Path,
        field_type: FieldType,
        translation_group: Option<String>,
        token: Option<&str>,
    ) -> Result<usize> {
        self.authorize(token)?;
        let values: BTreeMap<String, String> = read_json(path)?;
        self.translations()
            .bulk_save(content_id, language_code, values, field_type, translation_group)
            .await
    }

    pub async fn delete_translation(
        &self,
        content_id: i64,
        field_name: &str,
        language_code: &str,
        token: Option<&str>,
    ) -> Result<bool> {
        self.authorize(token)?;
        self.translations()
            .delete(content_id, field_name, language_code)
            .await
    }

    pub async fn delete_translations(&self, content_id: i64, token: Option<&str>) -> Result<usize> {
        self.authorize(token)?;
        self.translations().delete_all(content_id).await
    }

    // Products

    /// Set a product's stock and copy it to its translations.
    pub async fn set_stock(&self, product_id: i64, level: StockLevel, token: Option<&str>) -> Result<Vec<i64>> {
        self.authorize(token)?;
        InventorySync::new(&self.repository)
            .set_stock(product_id, level)
            .await
    }

    // Menu translations

    pub async fn set_menu_translation(
        &self,
        menu_id: i64,
        language: &str,
        translations: BTreeMap<String, i64>,
        token: Option<&str>,
    ) -> Result<()> {
        self.authorize(token)?;
        let mapping = menu::menu_translation(menu_id, language, translations)
            .ok_or_else(|| AppError::InvalidInput("menu language must not be empty".into()))?;
        self.repository.save_menu_translation(mapping).await
    }

    /// Menu to show in place of `menu_id` on the given content item's page.
    pub async fn resolve_menu(&self, menu_id: i64, content_id: Option<i64>) -> Result<i64> {
        let language = match content_id {
            Some(id) => {
                let item = self.content(id).await?;
                language_or_default(&item, &self.registry, &self.config.default_language)
            }
            None => self.config.default_language.clone(),
        };
        let menus = self.repository.menu_translations().await?;
        Ok(menu::translate_menu(&menus, menu_id, &language))
    }

    // Maintenance

    pub async fn validate(&self) -> Result<ValidationReport> {
        self.validator().validate_all().await
    }

    pub async fn auto_fix(&self, token: Option<&str>) -> Result<Vec<String>> {
        self.authorize(token)?;
        self.validator().auto_fix().await
    }

    pub async fn statistics(&self) -> Result<HreflangStats> {
        self.repository.statistics().await
    }

    pub async fn translation_groups(&self) -> Result<Vec<String>> {
        self.repository.translation_groups().await
    }

    pub async fn cleanup(&self, token: Option<&str>) -> Result<usize> {
        self.authorize(token)?;
        let orphans = self.repository.orphaned_content_ids().await?;
        if !orphans.is_empty() {
            tracing::debug!("Orphaned content ids: {:?}", orphans);
        }
        let removed = self.repository.cleanup_orphaned_entries().await?;
        tracing::info!("Removed {} orphaned hreflang rows", removed);
        Ok(removed)
    }

    /// Drop everything this tool stored.
    pub async fn purge(&self, token: Option<&str>) -> Result<usize> {
        self.authorize(token)?;
        let removed = self.repository.purge_all().await?;
        tracing::info!("Purged {} rows", removed);
        Ok(removed)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path.display(), e))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::StockStatus;

    async fn app(config: Config) -> App {
        App::with_repository(config, Repository::in_memory().await.unwrap())
    }

    fn config() -> Config {
        Config {
            db_path: ":memory:".into(),
            ..Config::default()
        }
    }

    fn content(id: i64, slug: &str, post_type: &str, language: &str, group: &str) -> NewContent {
        NewContent {
            id,
            post_type: post_type.into(),
            slug: slug.into(),
            title: slug.into(),
            status: "publish".into(),
            permalink: format!("https://example.com/{slug}/"),
            translation_group: Some(group.into()),
            categories: vec![language.into()],
            ..NewContent::default()
        }
    }

    #[tokio::test]
    async fn test_save_then_render_head() {
        let app = app(config()).await;
        app.add_content(content(1, "hello", "post", "English", "g"), None).await.unwrap();
        app.add_content(content(2, "hallo", "post", "Deutsch", "g"), None).await.unwrap();

        app.save(SaveRequest {
            content_id: 1,
            default_language: Some("en".into()),
            urls: BTreeMap::from([("en".to_string(), "https://example.com/hello/".to_string())]),
            ..SaveRequest::default()
        })
        .await
        .unwrap();

        let head = app.render_head(1).await.unwrap();
        assert!(head.contains("hreflang=\"en\" href=\"https://example.com/hello/\""));
        assert!(head.contains("hreflang=\"de\" href=\"https://example.com/hallo/\""));
        assert!(head.contains("hreflang=\"x-default\" href=\"https://example.com/hello/\""));
        assert!(head.contains("translationOfWork"));
    }

    #[tokio::test]
    async fn test_disabled_post_type_renders_nothing() {
        let app = app(Config {
            enabled_post_types: vec!["post".into()],
            ..config()
        })
        .await;
        let mut page = content(5, "about", "page", "English", "g");
        page.legacy_de = Some("https://example.com/ueber/".into());
        app.add_content(page, None).await.unwrap();

        assert!(app.resolve(5).await.unwrap().is_empty());
        assert!(app.render_head(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_menu_translation_round_trip() {
        let app = app(config()).await;
        app.add_content(content(1, "hallo", "post", "Deutsch", "g"), None).await.unwrap();
        app.set_menu_translation(3, "en", BTreeMap::from([("de".to_string(), 4)]), None)
            .await
            .unwrap();

        assert_eq!(app.resolve_menu(3, Some(1)).await.unwrap(), 4);
        assert_eq!(app.resolve_menu(3, None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_write_paths_require_token_when_configured() {
        let app = app(Config {
            editor_token: Some("s3cret".into()),
            ..config()
        })
        .await;
        assert!(matches!(
            app.add_content(content(1, "hello", "post", "English", "g"), None).await,
            Err(AppError::Unauthorized(_))
        ));
        app.add_content(content(1, "hello", "post", "English", "g"), Some("s3cret"))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            app.import_content(&path, Some("nope")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(app.cleanup(None).await, Err(AppError::Unauthorized(_))));
        assert_eq!(tokio_test::assert_ok!(app.cleanup(Some("s3cret")).await), 0);

        let translation = NewFieldTranslation {
            content_id: 1,
            field_name: "title".into(),
            field_type: FieldType::Text,
            language_code: "de".into(),
            value: "Hallo".into(),
            translation_group: None,
        };
        assert!(matches!(
            app.save_translation(translation.clone(), None).await,
            Err(AppError::Unauthorized(_))
        ));
        assert_eq!(app.save_translation(translation, Some("s3cret")).await.unwrap(), "Hallo");
        assert!(matches!(
            app.delete_translation(1, "title", "de", None).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(app.delete_translations(1, None).await, Err(AppError::Unauthorized(_))));
        let level = StockLevel {
            quantity: Some(1),
            status: StockStatus::InStock,
        };
        assert!(matches!(app.set_stock(1, level, None).await, Err(AppError::Unauthorized(_))));

        assert!(matches!(app.purge(None).await, Err(AppError::Unauthorized(_))));
        assert!(matches!(
            app.delete_content(1, false, Some("nope")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(tokio_test::assert_ok!(app.delete_content(1, false, Some("s3cret")).await));
        assert!(matches!(app.resolve(1).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_import_content_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(
            &path,
            r#"[
  {"id": 1, "slug": "hello", "permalink": "https://example.com/hello/", "categories": ["English"]},
  {"id": 2, "slug": "hallo", "permalink": "https://example.com/hallo/", "tags": ["deutsch-version"]}
]"#,
        )
        .unwrap();
        let app = app(config()).await;

        assert_eq!(app.import_content(&path, None).await.unwrap(), 2);
        assert!(matches!(
            app.import_content(&dir.path().join("missing.json"), None).await,
            Err(AppError::Other(_))
        ));

        let fields = dir.path().join("de.json");
        std::fs::write(&fields, r#"{"title": "Hallo", "excerpt": "<b>Kurz</b>"}"#).unwrap();
        assert_eq!(
            app.import_translations(2, "de", &fields, FieldType::Text, None, None)
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            app.translations().get(2, "excerpt", "de").await.unwrap().as_deref(),
            Some("Kurz")
        );
        let item = app.content(2).await.unwrap();
        assert_eq!(item.post_type, "post");
        assert!(item.is_published());
    }
}
