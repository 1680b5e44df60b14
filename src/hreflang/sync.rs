use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{ContentItem, LanguageRegistry, NewHreflang, Priority};
use crate::security;

use super::detect::detect_content_language;

/// Group members considered by the sync helper when the store knows nothing.
const GROUP_URLS_MEMBER_LIMIT: usize = 10;

/// An editor's save of one content item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveRequest {
    pub content_id: i64,
    #[serde(default)]
    pub token: Option<String>,
    /// `None` keeps the stored group, an empty string clears it
    #[serde(default)]
    pub translation_group: Option<String>,
    /// `None` keeps the stored preference, an empty string clears it
    #[serde(default)]
    pub default_language: Option<String>,
    /// Submitted URL per language code; empty or invalid values delete the row
    #[serde(default)]
    pub urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub manual_written: usize,
    pub manual_removed: usize,
    pub propagated: usize,
    pub pulled: usize,
    pub warnings: Vec<String>,
}

impl SyncReport {
    pub fn changes(&self) -> usize {
        self.manual_written + self.manual_removed + self.propagated + self.pulled
    }
}

/// Absolute http(s) URL with a host.
pub fn is_valid_absolute_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Pushes an item's own URL to its group siblings and pulls theirs back.
/// Manual rows survive both directions.
pub struct GroupSynchronizer<'a> {
    repo: &'a Repository,
    registry: &'a LanguageRegistry,
    config: &'a Config,
}

impl<'a> GroupSynchronizer<'a> {
    pub fn new(repo: &'a Repository, registry: &'a LanguageRegistry, config: &'a Config) -> Self {
        Self {
            repo,
            registry,
            config,
        }
    }

    pub async fn save(&self, request: SaveRequest) -> Result<SyncReport> {
        security::authorize(self.config.editor_token.as_deref(), request.token.as_deref())?;

        let mut item = self
            .repo
            .get_content(request.content_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("content {}", request.content_id)))?;
        let mut report = SyncReport::default();

        if let Some(group) = request.translation_group {
            let group = Some(group.trim().to_string()).filter(|g| !g.is_empty());
            if group != item.translation_group {
                self.repo.set_content_group(item.id, group.clone()).await?;
                item.translation_group = group;
            }
        }

        if let Some(default) = &request.default_language {
            let default = Some(default.trim().to_string()).filter(|d| !d.is_empty());
            if default != item.default_language {
                self.repo
                    .set_content_default_language(item.id, default.clone())
                    .await?;
                item.default_language = default;
            }
        }

        let mut submitted = BTreeSet::new();
        for (code, raw) in &request.urls {
            if !self.registry.contains(code) {
                report
                    .warnings
                    .push(format!("Ignoring URL for unregistered language '{code}'"));
                continue;
            }

            let url = raw.trim();
            if is_valid_absolute_url(url) {
                submitted.insert(code.clone());
                let changed = self
                    .repo
                    .upsert_entry(NewHreflang {
                        content_id: item.id,
                        language_code: code.clone(),
                        url: url.to_string(),
                        translation_group: item.translation_group.clone(),
                        priority: Priority::Manual,
                    })
                    .await?;
                if changed {
                    report.manual_written += 1;
                }
            } else {
                if !url.is_empty() {
                    tracing::warn!("Dropping invalid {} URL for content {}: {:?}", code, item.id, url);
                    report
                        .warnings
                        .push(format!("Invalid URL for '{code}' removed: {url}"));
                }
                report.manual_removed += self.repo.delete_entry(item.id, code).await?;
            }
        }

        if let Some(default) = request
            .default_language
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            if !self.repo.set_x_default(item.id, default).await? {
                report.warnings.push(format!(
                    "No URL stored for default language '{default}', x-default unchanged"
                ));
            }
        }

        if let Some(group) = item.translation_group.clone() {
            let synced = self.sync_group(&item, &group, &submitted).await?;
            report.propagated = synced.propagated;
            report.pulled = synced.pulled;
            report.warnings.extend(synced.warnings);
        }

        tracing::info!(
            "Saved content {}: {} manual written, {} removed, {} propagated, {} pulled",
            item.id,
            report.manual_written,
            report.manual_removed,
            report.propagated,
            report.pulled
        );
        Ok(report)
    }

    /// Outbound propagation followed by inbound pull for `item` in `group`.
    ///
    /// `submitted` holds the languages the editor entered a URL for in this
    /// save; the pull leaves those alone.
    pub async fn sync_group(
        &self,
        item: &ContentItem,
        group: &str,
        submitted: &BTreeSet<String>,
    ) -> Result<SyncReport> {
        let siblings = self.repo.group_members(group, Some(item.id)).await?;
        let mut report = SyncReport::default();

        if siblings.is_empty() {
            report.warnings.push(format!(
                "Translation group '{group}' has fewer than 2 members"
            ));
            return Ok(report);
        }

        report.propagated = self.propagate(item, group, &siblings).await?;
        report.pulled = self.pull(item, group, &siblings, submitted).await?;
        Ok(report)
    }

    async fn propagate(
        &self,
        item: &ContentItem,
        group: &str,
        siblings: &[ContentItem],
    ) -> Result<usize> {
        let Some(language) = detect_content_language(item, self.registry) else {
            tracing::debug!(
                "Language of content {} unknown, nothing to propagate in '{}'",
                item.id,
                group
            );
            return Ok(0);
        };

        let mut changed = 0;
        for sibling in siblings {
            let written = self
                .repo
                .upsert_entry(NewHreflang {
                    content_id: sibling.id,
                    language_code: language.clone(),
                    url: item.permalink.clone(),
                    translation_group: Some(group.to_string()),
                    priority: Priority::Propagated,
                })
                .await?;
            if written {
                tracing::debug!(
                    "Propagated {} URL of content {} to content {}",
                    language,
                    item.id,
                    sibling.id
                );
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn pull(
        &self,
        item: &ContentItem,
        group: &str,
        siblings: &[ContentItem],
        submitted: &BTreeSet<String>,
    ) -> Result<usize> {
        let mut changed = 0;
        for sibling in siblings {
            let Some(language) = detect_content_language(sibling, self.registry) else {
                tracing::debug!("Skipping content {} in '{}': language unknown", sibling.id, group);
                continue;
            };
            if submitted.contains(&language) || sibling.permalink.is_empty() {
                continue;
            }

            let written = self
                .repo
                .upsert_entry(NewHreflang {
                    content_id: item.id,
                    language_code: language,
                    url: sibling.permalink.clone(),
                    translation_group: Some(group.to_string()),
                    priority: Priority::AutoSynced,
                })
                .await?;
            if written {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Language to URL map for the editor's sync button.
    ///
    /// Stored rows of the group win; otherwise the languages of published
    /// group members are detected.
    pub async fn group_urls(
        &self,
        group: &str,
        current_id: i64,
    ) -> Result<BTreeMap<String, String>> {
        let group = group.trim();
        if group.is_empty() {
            return Err(AppError::InvalidInput("translation group is empty".into()));
        }

        let mut urls = BTreeMap::new();
        let rows = self.repo.list_for_group(group).await?;
        if !rows.is_empty() {
            for row in rows.into_iter().filter(|r| r.content_id != current_id) {
                urls.entry(row.language_code).or_insert(row.url);
            }
        } else {
            let members = self.repo.group_members(group, Some(current_id)).await?;
            for member in members
                .iter()
                .filter(|m| m.is_published())
                .take(GROUP_URLS_MEMBER_LIMIT)
            {
                if let Some(code) = detect_content_language(member, self.registry) {
                    urls.entry(code).or_insert_with(|| member.permalink.clone());
                }
            }
        }

        if urls.is_empty() {
            return Err(AppError::NotFound(format!(
                "no related translations in group '{group}'"
            )));
        }
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hreflang::resolver::HreflangResolver;
    use crate::models::NewContent;

    fn config() -> Config {
        Config {
            db_path: ":memory:".into(),
            ..Config::default()
        }
    }

    fn post(id: i64, slug: &str, language: &str, group: Option<&str>) -> NewContent {
        NewContent {
            id,
            slug: slug.into(),
            title: slug.into(),
            post_type: "post".into(),
            status: "publish".into(),
            permalink: format!("https://example.com/{slug}/"),
            translation_group: group.map(str::to_string),
            categories: vec![language.to_string()],
            ..NewContent::default()
        }
    }

    fn save_request(content_id: i64) -> SaveRequest {
        SaveRequest {
            content_id,
            ..SaveRequest::default()
        }
    }

    #[test]
    fn test_url_validation() {
        assert!(is_valid_absolute_url("https://example.com/de/"));
        assert!(is_valid_absolute_url("http://example.com"));
        assert!(!is_valid_absolute_url("example.com/de"));
        assert!(!is_valid_absolute_url("not a url"));
        assert!(!is_valid_absolute_url("ftp://example.com/file"));
        assert!(!is_valid_absolute_url("mailto:editor@example.com"));
    }

    #[tokio::test]
    async fn test_launch_scenario_propagates_to_sibling() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(post(1, "launch", "English", None)).await.unwrap();
        repo.upsert_content(post(2, "start", "Deutsch", Some("launch")))
            .await
            .unwrap();
        let config = config();
        let registry = config.registry();
        let sync = GroupSynchronizer::new(&repo, &registry, &config);

        let report = sync
            .save(SaveRequest {
                translation_group: Some("launch".into()),
                ..save_request(1)
            })
            .await
            .unwrap();

        assert_eq!(report.propagated, 1);
        assert_eq!(report.pulled, 1);
        assert!(report.warnings.is_empty());

        let resolver = HreflangResolver::new(&repo, &registry, &config);
        let b_rows = resolver.resolve(2).await.unwrap();
        let en = b_rows.iter().find(|e| e.language_code == "en").unwrap();
        assert_eq!(en.url, "https://example.com/launch/");
        assert_eq!(en.priority, Priority::Propagated);

        let a_rows = repo.list_for_content(1).await.unwrap();
        assert_eq!(a_rows.len(), 1);
        assert_eq!(a_rows[0].language_code, "de");
        assert_eq!(a_rows[0].priority, Priority::AutoSynced);
        assert_eq!(
            repo.get_content(1).await.unwrap().unwrap().translation_group.as_deref(),
            Some("launch")
        );
    }

    #[tokio::test]
    async fn test_group_sync_is_idempotent() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(post(1, "a", "English", Some("g"))).await.unwrap();
        repo.upsert_content(post(2, "b", "Deutsch", Some("g"))).await.unwrap();
        repo.upsert_content(post(3, "c", "fr", Some("g"))).await.unwrap();
        let config = config();
        let registry = config.registry();
        let sync = GroupSynchronizer::new(&repo, &registry, &config);
        let item = repo.get_content(1).await.unwrap().unwrap();

        let first = sync.sync_group(&item, "g", &BTreeSet::new()).await.unwrap();
        let before = repo.all_entries().await.unwrap();
        let second = sync.sync_group(&item, "g", &BTreeSet::new()).await.unwrap();
        let after = repo.all_entries().await.unwrap();

        assert!(first.changes() > 0);
        assert_eq!(second.changes(), 0);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_malformed_manual_url_deletes_row() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(post(1, "a", "English", None)).await.unwrap();
        let config = config();
        let registry = config.registry();
        let sync = GroupSynchronizer::new(&repo, &registry, &config);

        let mut urls = BTreeMap::new();
        urls.insert("de".to_string(), "https://example.com/de/".to_string());
        sync.save(SaveRequest {
            urls: urls.clone(),
            ..save_request(1)
        })
        .await
        .unwrap();
        assert_eq!(repo.list_for_content(1).await.unwrap().len(), 1);

        urls.insert("de".to_string(), "example dot com".to_string());
        let report = sync
            .save(SaveRequest {
                urls,
                ..save_request(1)
            })
            .await
            .unwrap();

        assert_eq!(report.manual_removed, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(repo.list_for_content(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manual_rows_survive_propagation_and_pull() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(post(1, "a", "English", Some("g"))).await.unwrap();
        repo.upsert_content(post(2, "b", "Deutsch", Some("g"))).await.unwrap();
        let config = config();
        let registry = config.registry();
        let sync = GroupSynchronizer::new(&repo, &registry, &config);

        // editor pins B's English URL by hand
        let mut urls = BTreeMap::new();
        urls.insert("en".to_string(), "https://example.com/pinned/".to_string());
        sync.save(SaveRequest {
            urls,
            ..save_request(2)
        })
        .await
        .unwrap();

        // saving A would propagate its permalink to B's English row
        sync.save(save_request(1)).await.unwrap();

        let rows = repo.list_for_content(2).await.unwrap();
        let en = rows.iter().find(|e| e.language_code == "en").unwrap();
        assert_eq!(en.url, "https://example.com/pinned/");
        assert_eq!(en.priority, Priority::Manual);
    }

    #[tokio::test]
    async fn test_pull_skips_submitted_languages() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(post(1, "a", "English", Some("g"))).await.unwrap();
        repo.upsert_content(post(2, "b", "Deutsch", Some("g"))).await.unwrap();
        let config = config();
        let registry = config.registry();
        let sync = GroupSynchronizer::new(&repo, &registry, &config);

        let mut urls = BTreeMap::new();
        urls.insert("de".to_string(), "https://other.example/de/".to_string());
        let report = sync
            .save(SaveRequest {
                urls,
                default_language: Some("de".into()),
                ..save_request(1)
            })
            .await
            .unwrap();

        assert_eq!(report.pulled, 0);
        let rows = repo.list_for_content(1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url, "https://other.example/de/");
        assert!(rows[0].is_default);
    }

    #[tokio::test]
    async fn test_single_member_group_warns() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(post(1, "a", "English", None)).await.unwrap();
        let config = config();
        let registry = config.registry();
        let sync = GroupSynchronizer::new(&repo, &registry, &config);

        let report = sync
            .save(SaveRequest {
                translation_group: Some("lonely".into()),
                ..save_request(1)
            })
            .await
            .unwrap();

        assert_eq!(report.changes(), 0);
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_save_writes_nothing() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(post(1, "a", "English", None)).await.unwrap();
        let config = Config {
            editor_token: Some("s3cret".into()),
            ..config()
        };
        let registry = config.registry();
        let sync = GroupSynchronizer::new(&repo, &registry, &config);

        let mut urls = BTreeMap::new();
        urls.insert("de".to_string(), "https://example.com/de/".to_string());
        let result = sync
            .save(SaveRequest {
                token: Some("wrong".into()),
                urls,
                ..save_request(1)
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert!(repo.all_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_group_urls_from_store_then_members() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(post(1, "a", "English", Some("g"))).await.unwrap();
        repo.upsert_content(post(2, "b", "Deutsch", Some("g"))).await.unwrap();
        let config = config();
        let registry = config.registry();
        let sync = GroupSynchronizer::new(&repo, &registry, &config);

        let from_members = sync.group_urls("g", 1).await.unwrap();
        assert_eq!(from_members.len(), 1);
        assert_eq!(from_members["de"], "https://example.com/b/");

        repo.upsert_entry(NewHreflang {
            content_id: 2,
            language_code: "fr".into(),
            url: "https://example.com/fr/".into(),
            translation_group: Some("g".into()),
            priority: Priority::Manual,
        })
        .await
        .unwrap();
        let from_store = sync.group_urls("g", 1).await.unwrap();
        assert_eq!(from_store.keys().collect::<Vec<_>>(), vec!["fr"]);

        assert!(matches!(
            sync.group_urls("missing", 1).await,
            Err(AppError::NotFound(_))
        ));
    }
}
