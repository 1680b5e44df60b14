use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Serialize;

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{ContentItem, HreflangEntry, LanguageRegistry, NewHreflang, Priority};

use super::detect::detect_content_language;
use super::sync::is_valid_absolute_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    #[default]
    Pass,
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total_issues: usize,
    pub total_warnings: usize,
    pub total_posts: i64,
    pub total_entries: i64,
    pub total_groups: i64,
    pub status: ValidationStatus,
}

/// Problems found in the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Problems that make the published hreflang set wrong
    pub issues: Vec<String>,

    /// Things worth a look that do not break output
    pub warnings: Vec<String>,

    pub summary: ValidationSummary,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.warnings.is_empty()
    }
}

/// Store contents loaded once per validation run.
#[derive(Debug, Default)]
struct Snapshot {
    entries: BTreeMap<i64, Vec<HreflangEntry>>,
    items: BTreeMap<i64, ContentItem>,
}

impl Snapshot {
    async fn load(repo: &Repository) -> Result<Self> {
        let mut entries: BTreeMap<i64, Vec<HreflangEntry>> = BTreeMap::new();
        for entry in repo.all_entries().await? {
            entries.entry(entry.content_id).or_default().push(entry);
        }

        let mut items = BTreeMap::new();
        for id in entries.keys() {
            if let Some(item) = repo.get_content(*id).await? {
                items.insert(*id, item);
            }
        }
        Ok(Self { entries, items })
    }

    fn title(&self, content_id: i64) -> &str {
        self.items
            .get(&content_id)
            .map(|item| item.title.as_str())
            .unwrap_or("Unknown")
    }

    fn groups(&self) -> BTreeMap<&str, Vec<&HreflangEntry>> {
        let mut groups: BTreeMap<&str, Vec<&HreflangEntry>> = BTreeMap::new();
        for entry in self.entries.values().flatten() {
            if let Some(group) = entry.translation_group.as_deref().filter(|g| !g.is_empty()) {
                groups.entry(group).or_default().push(entry);
            }
        }
        groups
    }

    fn languages_of(&self, content_id: i64) -> BTreeSet<&str> {
        self.entries
            .get(&content_id)
            .map(|rows| rows.iter().map(|e| e.language_code.as_str()).collect())
            .unwrap_or_default()
    }
}

struct UrlTarget {
    title: String,
    language_code: String,
    url: String,
}

pub struct Validator<'a> {
    repo: &'a Repository,
    registry: &'a LanguageRegistry,
    config: &'a Config,
}

impl<'a> Validator<'a> {
    pub fn new(repo: &'a Repository, registry: &'a LanguageRegistry, config: &'a Config) -> Self {
        Self {
            repo,
            registry,
            config,
        }
    }

    pub async fn validate_all(&self) -> Result<ValidationReport> {
        let snapshot = Snapshot::load(self.repo).await?;
        let mut report = ValidationReport::new();

        let targets = check_urls(&snapshot, &mut report);
        if self.config.enable_validation && self.config.check_url_accessibility {
            self.check_accessibility(targets, &mut report).await?;
        }
        check_group_symmetry(&snapshot, &mut report);
        check_groups(&snapshot, self.registry, &mut report);
        check_x_defaults(&snapshot, &mut report);
        check_self_references(&snapshot, self.registry, &mut report);
        check_orphans(&snapshot, &mut report);

        for (content_id, language_code, _) in self.repo.duplicate_pairs().await? {
            report.issues.push(format!(
                "Duplicate entries found for \"{}\" (ID: {}), language {}",
                snapshot.title(content_id),
                content_id,
                language_code
            ));
        }

        let stats = self.repo.statistics().await?;
        report.summary = ValidationSummary {
            total_issues: report.issues.len(),
            total_warnings: report.warnings.len(),
            total_posts: stats.total_posts,
            total_entries: stats.total_entries,
            total_groups: stats.total_groups,
            status: if report.issues.is_empty() {
                ValidationStatus::Pass
            } else {
                ValidationStatus::Fail
            },
        };

        tracing::debug!(
            "Validation finished: {} issues, {} warnings",
            report.summary.total_issues,
            report.summary.total_warnings
        );
        Ok(report)
    }

    /// URL format problems of one content item.
    pub async fn validate_content(&self, content_id: i64) -> Result<Vec<String>> {
        let entries = self.repo.list_for_content(content_id).await?;
        Ok(entries
            .iter()
            .filter(|e| !is_valid_absolute_url(&e.url))
            .map(|e| format!("Invalid URL for {}: {}", e.language_code, e.url))
            .collect())
    }

    /// HEAD every well-formed URL, five at a time.
    async fn check_accessibility(
        &self,
        targets: Vec<UrlTarget>,
        report: &mut ValidationReport,
    ) -> Result<()> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.url_check_timeout_secs))
            .user_agent("langlinks/1.0")
            .build()?;

        let results: Vec<_> = stream::iter(targets)
            .map(|target| {
                let client = &client;
                async move {
                    let response = client.head(&target.url).send().await;
                    (target, response)
                }
            })
            .buffer_unordered(5)
            .collect()
            .await;

        let mut warnings = Vec::new();
        let mut issues = Vec::new();
        for (target, response) in results {
            match response {
                Err(e) => {
                    tracing::warn!("URL check failed for {}: {}", target.url, e);
                    warnings.push(format!(
                        "URL not accessible for {} (language: {}): {}",
                        target.title, target.language_code, target.url
                    ));
                }
                Ok(resp) if resp.status().as_u16() >= 400 => {
                    issues.push(format!(
                        "URL returns error {} for {} (language: {}): {}",
                        resp.status().as_u16(),
                        target.title,
                        target.language_code,
                        target.url
                    ));
                }
                Ok(_) => {}
            }
        }
        // completion order is arbitrary
        warnings.sort();
        issues.sort();
        report.warnings.extend(warnings);
        report.issues.extend(issues);
        Ok(())
    }

    /// Apply safe repairs; returns one message per kind of fix applied.
    pub async fn auto_fix(&self) -> Result<Vec<String>> {
        let mut fixes = Vec::new();

        let orphans = self.repo.cleanup_orphaned_entries().await?;
        if orphans > 0 {
            fixes.push(format!("Removed {orphans} orphaned entries"));
        }

        let added = self.add_missing_self_references().await?;
        if added > 0 {
            fixes.push(format!("Added {added} missing self-references"));
        }

        let defaults = self.set_missing_x_defaults().await?;
        if defaults > 0 {
            fixes.push(format!("Set {defaults} missing x-default values"));
        }

        tracing::info!("Auto-fix applied {} kinds of fixes", fixes.len());
        Ok(fixes)
    }

    async fn add_missing_self_references(&self) -> Result<usize> {
        let mut added = 0;
        for content_id in self.repo.content_ids_with_hreflang().await? {
            let Some(item) = self.repo.get_content(content_id).await? else {
                continue;
            };
            let rows = self.repo.list_for_content(content_id).await?;
            if rows.is_empty() || rows.iter().any(|e| e.url == item.permalink) {
                continue;
            }
            let Some(language) = detect_content_language(&item, self.registry) else {
                continue;
            };

            let changed = self
                .repo
                .upsert_entry(NewHreflang {
                    content_id,
                    language_code: language,
                    url: item.permalink.clone(),
                    translation_group: item.translation_group.clone(),
                    priority: Priority::Derived,
                })
                .await?;
            if changed {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn set_missing_x_defaults(&self) -> Result<usize> {
        let mut set = 0;
        for content_id in self.repo.content_ids_with_hreflang().await? {
            let rows = self.repo.list_for_content(content_id).await?;
            if rows.len() < 2 || rows.iter().any(|e| e.is_default) {
                continue;
            }
            let code = rows
                .iter()
                .find(|e| e.language_code == "en")
                .unwrap_or(&rows[0])
                .language_code
                .clone();
            if self.repo.set_x_default(content_id, &code).await? {
                set += 1;
            }
        }
        Ok(set)
    }
}

fn check_urls(snapshot: &Snapshot, report: &mut ValidationReport) -> Vec<UrlTarget> {
    let mut targets = Vec::new();
    for (content_id, rows) in &snapshot.entries {
        let Some(item) = snapshot.items.get(content_id) else {
            report.issues.push(format!(
                "Content ID {content_id} no longer exists but has hreflang entries"
            ));
            continue;
        };
        for entry in rows {
            if is_valid_absolute_url(&entry.url) {
                targets.push(UrlTarget {
                    title: item.title.clone(),
                    language_code: entry.language_code.clone(),
                    url: entry.url.clone(),
                });
            } else {
                report.issues.push(format!(
                    "Invalid URL format for {} (language: {}): {}",
                    item.title, entry.language_code, entry.url
                ));
            }
        }
    }
    targets
}

/// Every language of a group should be covered equally, and every member
/// should reference every other language of the group.
fn check_group_symmetry(snapshot: &Snapshot, report: &mut ValidationReport) {
    for (group, entries) in snapshot.groups() {
        let mut by_language: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
        for entry in &entries {
            by_language
                .entry(entry.language_code.as_str())
                .or_default()
                .push(entry.content_id);
        }

        let counts: BTreeSet<usize> = by_language.values().map(Vec::len).collect();
        if counts.len() > 1 {
            report.issues.push(format!(
                "Translation group \"{group}\" has inconsistent language coverage"
            ));
        }

        let members: BTreeSet<i64> = entries.iter().map(|e| e.content_id).collect();
        for content_id in members {
            let referenced = snapshot.languages_of(content_id);
            for language in by_language.keys().filter(|l| !referenced.contains(*l)) {
                report.warnings.push(format!(
                    "\"{}\" (ID: {}) is missing reference to {} language",
                    snapshot.title(content_id),
                    content_id,
                    language
                ));
            }
        }
    }
}

/// Member count per group, and members sharing a detected language.
fn check_groups(snapshot: &Snapshot, registry: &LanguageRegistry, report: &mut ValidationReport) {
    for (group, entries) in snapshot.groups() {
        let members: BTreeSet<i64> = entries.iter().map(|e| e.content_id).collect();
        if members.len() < 2 {
            report.warnings.push(format!(
                "Translation group \"{group}\" has only {} member(s)",
                members.len()
            ));
        }

        let mut by_language: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
        for content_id in &members {
            let detected = snapshot
                .items
                .get(content_id)
                .and_then(|item| detect_content_language(item, registry));
            if let Some(language) = detected {
                by_language.entry(language).or_default().insert(*content_id);
            }
        }
        for (language, ids) in by_language {
            if ids.len() > 1 {
                report.issues.push(format!(
                    "Translation group \"{group}\" has multiple items for language {language}"
                ));
            }
        }
    }
}

fn check_x_defaults(snapshot: &Snapshot, report: &mut ValidationReport) {
    for (content_id, rows) in &snapshot.entries {
        let defaults = rows.iter().filter(|e| e.is_default).count();
        if defaults > 1 {
            report.issues.push(format!(
                "\"{}\" (ID: {}) has multiple x-default entries",
                snapshot.title(*content_id),
                content_id
            ));
        }
        if rows.len() > 1 && defaults == 0 {
            report.warnings.push(format!(
                "\"{}\" (ID: {}) has multiple languages but no x-default set",
                snapshot.title(*content_id),
                content_id
            ));
        }
    }
}

fn check_self_references(
    snapshot: &Snapshot,
    registry: &LanguageRegistry,
    report: &mut ValidationReport,
) {
    for (content_id, rows) in &snapshot.entries {
        let Some(item) = snapshot.items.get(content_id) else {
            continue;
        };
        let Some(detected) = detect_content_language(item, registry) else {
            continue;
        };

        let mut self_reference_found = false;
        for entry in rows.iter().filter(|e| e.url == item.permalink) {
            self_reference_found = true;
            if entry.language_code != detected {
                report.warnings.push(format!(
                    "\"{}\" detected as {} but self-references as {}",
                    item.title, detected, entry.language_code
                ));
            }
        }
        if !self_reference_found && !rows.is_empty() {
            report.warnings.push(format!(
                "\"{}\" has hreflang tags but no self-reference",
                item.title
            ));
        }
    }
}

fn check_orphans(snapshot: &Snapshot, report: &mut ValidationReport) {
    let orphaned = snapshot
        .entries
        .keys()
        .filter(|id| !snapshot.items.contains_key(id))
        .count();
    if orphaned > 0 {
        report.issues.push(format!(
            "{orphaned} orphaned hreflang entries found (content no longer exists)"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::NewContent;

    fn config() -> Config {
        Config {
            db_path: ":memory:".into(),
            ..Config::default()
        }
    }

    fn content(id: i64, slug: &str, language: &str, group: Option<&str>) -> NewContent {
        NewContent {
            id,
            slug: slug.into(),
            title: slug.into(),
            permalink: format!("https://example.com/{slug}/"),
            post_type: "post".into(),
            status: "publish".into(),
            translation_group: group.map(str::to_string),
            categories: vec![language.to_string()],
            ..NewContent::default()
        }
    }

    fn row(content_id: i64, lang: &str, url: &str, group: Option<&str>) -> NewHreflang {
        NewHreflang {
            content_id,
            language_code: lang.into(),
            url: url.into(),
            translation_group: group.map(str::to_string),
            priority: Priority::Manual,
        }
    }

    fn entry(content_id: i64, lang: &str, is_default: bool) -> HreflangEntry {
        HreflangEntry {
            id: 0,
            content_id,
            language_code: lang.into(),
            url: format!("https://example.com/{content_id}/{lang}/"),
            is_default,
            translation_group: None,
            priority: Priority::Manual,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(id: i64, language: &str) -> ContentItem {
        ContentItem {
            id,
            post_type: "post".into(),
            slug: format!("item-{id}"),
            title: format!("Item {id}"),
            status: "publish".into(),
            permalink: format!("https://example.com/item-{id}/"),
            translation_group: Some("g".into()),
            default_language: None,
            categories: vec![language.to_string()],
            tags: Vec::new(),
            legacy_en: None,
            legacy_de: None,
            fields: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn consistent_pair(repo: &Repository) {
        repo.upsert_content(content(1, "hello", "English", Some("g"))).await.unwrap();
        repo.upsert_content(content(2, "hallo", "Deutsch", Some("g"))).await.unwrap();
        for id in [1, 2] {
            repo.upsert_entry(row(id, "en", "https://example.com/hello/", Some("g")))
                .await
                .unwrap();
            repo.upsert_entry(row(id, "de", "https://example.com/hallo/", Some("g")))
                .await
                .unwrap();
            repo.set_x_default(id, "en").await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_consistent_store_passes() {
        let repo = Repository::in_memory().await.unwrap();
        consistent_pair(&repo).await;
        let config = config();
        let registry = config.registry();

        let report = Validator::new(&repo, &registry, &config)
            .validate_all()
            .await
            .unwrap();

        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.summary.status, ValidationStatus::Pass);
        assert_eq!(report.summary.total_entries, 4);
        assert_eq!(report.summary.total_groups, 1);
    }

    #[tokio::test]
    async fn test_reports_invalid_url_and_orphans() {
        let repo = Repository::in_memory().await.unwrap();
        consistent_pair(&repo).await;
        repo.upsert_entry(row(1, "fr", "not-a-url", Some("g"))).await.unwrap();
        repo.upsert_entry(row(77, "en", "https://example.com/gone/", None))
            .await
            .unwrap();
        let config = config();
        let registry = config.registry();

        let report = Validator::new(&repo, &registry, &config)
            .validate_all()
            .await
            .unwrap();

        assert_eq!(report.summary.status, ValidationStatus::Fail);
        assert!(report.issues.iter().any(|i| i.contains("Invalid URL format")));
        assert!(report.issues.iter().any(|i| i.contains("Content ID 77")));
        assert!(report.issues.iter().any(|i| i.contains("1 orphaned")));
        // fr is only covered by one member of the group
        assert!(report.issues.iter().any(|i| i.contains("inconsistent language coverage")));
        assert!(report.warnings.iter().any(|w| w.contains("missing reference to fr")));
    }

    #[tokio::test]
    async fn test_validate_content_lists_bad_urls() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_entry(row(3, "en", "https://example.com/", None)).await.unwrap();
        repo.upsert_entry(row(3, "de", "/relative/", None)).await.unwrap();
        let config = config();
        let registry = config.registry();

        let problems = Validator::new(&repo, &registry, &config)
            .validate_content(3)
            .await
            .unwrap();

        assert_eq!(problems, vec!["Invalid URL for de: /relative/".to_string()]);
    }

    #[test]
    fn test_x_default_checks() {
        let mut snapshot = Snapshot::default();
        snapshot
            .entries
            .insert(1, vec![entry(1, "en", true), entry(1, "de", true)]);
        snapshot
            .entries
            .insert(2, vec![entry(2, "en", false), entry(2, "de", false)]);
        snapshot.entries.insert(3, vec![entry(3, "en", false)]);
        let mut report = ValidationReport::new();

        check_x_defaults(&snapshot, &mut report);

        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("(ID: 1) has multiple x-default"));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("(ID: 2)"));
    }

    #[test]
    fn test_group_with_two_items_for_one_language() {
        let mut snapshot = Snapshot::default();
        for id in [1, 2] {
            let mut en = entry(id, "en", false);
            en.translation_group = Some("g".into());
            let mut de = entry(id, "de", false);
            de.translation_group = Some("g".into());
            snapshot.entries.insert(id, vec![en, de]);
            snapshot.items.insert(id, item(id, "English"));
        }
        let mut report = ValidationReport::new();

        check_groups(&snapshot, &LanguageRegistry::default(), &mut report);

        assert_eq!(
            report.issues,
            vec!["Translation group \"g\" has multiple items for language en".to_string()]
        );
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_auto_fix_repairs_and_settles() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(content(1, "hello", "English", None)).await.unwrap();
        repo.upsert_entry(row(1, "de", "https://example.com/hallo/", None))
            .await
            .unwrap();
        repo.upsert_entry(row(99, "en", "https://example.com/gone/", None))
            .await
            .unwrap();
        let config = config();
        let registry = config.registry();
        let validator = Validator::new(&repo, &registry, &config);

        let fixes = validator.auto_fix().await.unwrap();

        assert_eq!(
            fixes,
            vec![
                "Removed 1 orphaned entries".to_string(),
                "Added 1 missing self-references".to_string(),
                "Set 1 missing x-default values".to_string(),
            ]
        );
        let rows = repo.list_for_content(1).await.unwrap();
        let en = rows.iter().find(|e| e.language_code == "en").unwrap();
        assert_eq!(en.url, "https://example.com/hello/");
        assert_eq!(en.priority, Priority::Derived);
        assert!(en.is_default);

        assert!(validator.auto_fix().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_url_is_a_warning() {
        let repo = Repository::in_memory().await.unwrap();
        repo.upsert_content(content(1, "hello", "English", None)).await.unwrap();
        repo.upsert_entry(row(1, "en", "http://127.0.0.1:9/", None)).await.unwrap();
        let config = Config {
            check_url_accessibility: true,
            url_check_timeout_secs: 2,
            ..config()
        };
        let registry = config.registry();

        let report = Validator::new(&repo, &registry, &config)
            .validate_all()
            .await
            .unwrap();

        assert!(report.warnings.iter().any(|w| w.contains("not accessible")));
        assert!(!report.issues.iter().any(|i| i.contains("returns error")));
    }
}
