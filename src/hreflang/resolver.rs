use regex::Regex;

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{
    site_locale_language, ContentItem, HreflangEntry, LanguageDescriptor, LanguageRegistry,
    NewHreflang, Priority,
};

use super::detect::detect_content_language;

/// Where a populated set of URLs came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationSource {
    LegacyFields,
    Taxonomy,
}

/// URLs derived for a content item that has no stored rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedUrls {
    pub source: DerivationSource,
    /// (language code, url) in registry order
    pub urls: Vec<(String, String)>,
    pub x_default: Option<String>,
}

/// Outcome of a populate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Population {
    pub derived: DerivedUrls,
    pub written: usize,
}

/// Stored rows first; a miss derives rows and writes them back.
pub struct HreflangResolver<'a> {
    repo: &'a Repository,
    registry: &'a LanguageRegistry,
    config: &'a Config,
}

impl<'a> HreflangResolver<'a> {
    pub fn new(repo: &'a Repository, registry: &'a LanguageRegistry, config: &'a Config) -> Self {
        Self {
            repo,
            registry,
            config,
        }
    }

    /// Alternate URLs of a content item, in canonical order.
    ///
    /// An empty result means single-language content, not an error.
    pub async fn resolve(&self, content_id: i64) -> Result<Vec<HreflangEntry>> {
        let stored = self.repo.list_for_content(content_id).await?;
        if !stored.is_empty() {
            return Ok(stored);
        }

        match self.populate(content_id).await? {
            Some(population) if population.written > 0 => {
                self.repo.list_for_content(content_id).await
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Derive URLs for an item without stored rows and persist them.
    ///
    /// Returns `None` when nothing could be derived.
    pub async fn populate(&self, content_id: i64) -> Result<Option<Population>> {
        let Some(item) = self.repo.get_content(content_id).await? else {
            tracing::debug!("No content item {}, nothing to derive", content_id);
            return Ok(None);
        };

        let Some(derived) = self.derive(&item).await? else {
            return Ok(None);
        };

        let mut written = 0;
        for (code, url) in &derived.urls {
            let changed = self
                .repo
                .upsert_entry(NewHreflang {
                    content_id,
                    language_code: code.clone(),
                    url: url.clone(),
                    translation_group: item.translation_group.clone(),
                    priority: Priority::Derived,
                })
                .await?;
            if changed {
                written += 1;
            }
        }

        if let Some(code) = &derived.x_default {
            self.repo.set_x_default(content_id, code).await?;
        }

        tracing::debug!(
            "Populated {} hreflang rows for content {} from {:?}",
            written,
            content_id,
            derived.source
        );

        Ok(Some(Population { derived, written }))
    }

    /// Candidate URLs for `item`, without touching the store.
    pub async fn derive(&self, item: &ContentItem) -> Result<Option<DerivedUrls>> {
        let legacy: Vec<(String, String)> = item
            .legacy_urls()
            .into_iter()
            .map(|(code, url)| (code.to_string(), url.to_string()))
            .collect();
        if !legacy.is_empty() {
            let x_default = self.choose_x_default(item, &legacy);
            return Ok(Some(DerivedUrls {
                source: DerivationSource::LegacyFields,
                urls: legacy,
                x_default,
            }));
        }

        if !self.config.auto_detect {
            return Ok(None);
        }

        let urls = self.taxonomy_urls(item).await?;
        if urls.is_empty() {
            return Ok(None);
        }
        let x_default = self.choose_x_default(item, &urls);
        Ok(Some(DerivedUrls {
            source: DerivationSource::Taxonomy,
            urls,
            x_default,
        }))
    }

    async fn taxonomy_urls(&self, item: &ContentItem) -> Result<Vec<(String, String)>> {
        let Some(current) = detect_content_language(item, self.registry) else {
            tracing::debug!("Language of content {} not detected", item.id);
            return Ok(Vec::new());
        };

        let mut urls = vec![(current.clone(), item.permalink.clone())];
        for lang in self.registry.iter().filter(|lang| lang.code != current) {
            if let Some(translation) = self.find_translation(item, lang).await? {
                urls.push((lang.code.clone(), translation.permalink));
            }
        }
        Ok(urls)
    }

    /// A published sibling of `item` in `target` language: first by shared
    /// translation group, then by slug pattern.
    async fn find_translation(
        &self,
        item: &ContentItem,
        target: &LanguageDescriptor,
    ) -> Result<Option<ContentItem>> {
        let is_candidate = |candidate: &ContentItem| {
            candidate.id != item.id
                && candidate.is_published()
                && candidate.post_type == item.post_type
                && detect_content_language(candidate, self.registry).as_deref()
                    == Some(target.code.as_str())
        };

        if let Some(group) = item.translation_group.as_deref() {
            let members = self.repo.group_members(group, Some(item.id)).await?;
            if let Some(found) = members.into_iter().find(|m| is_candidate(m)) {
                return Ok(Some(found));
            }
        }

        let target_slug = format!(
            "{}-{}",
            strip_language_suffix(&item.slug, self.registry),
            target.code
        );
        let candidates = self
            .repo
            .find_content_by_slug(&item.post_type, &target_slug, "publish")
            .await?;
        Ok(candidates.into_iter().find(|c| is_candidate(c)))
    }

    /// x-default: the item's own preference, then the site locale's
    /// language, then "en", then the first URL.
    pub fn choose_x_default(&self, item: &ContentItem, urls: &[(String, String)]) -> Option<String> {
        choose_x_default(
            urls,
            item.default_language.as_deref(),
            &self.config.site_locale,
        )
    }
}

pub fn choose_x_default(
    urls: &[(String, String)],
    preferred: Option<&str>,
    site_locale: &str,
) -> Option<String> {
    let has = |code: &str| urls.iter().any(|(c, _)| c == code);

    if let Some(code) = preferred.filter(|c| has(c)) {
        return Some(code.to_string());
    }
    let locale_language = site_locale_language(site_locale);
    if !locale_language.is_empty() && has(locale_language) {
        return Some(locale_language.to_string());
    }
    if has("en") {
        return Some("en".to_string());
    }
    urls.first().map(|(code, _)| code.clone())
}

/// Drop a trailing `-<code>` for any registered language code.
pub fn strip_language_suffix(slug: &str, registry: &LanguageRegistry) -> String {
    let codes: Vec<String> = registry.codes().into_iter().map(regex::escape).collect();
    if codes.is_empty() {
        return slug.to_string();
    }
    match Regex::new(&format!("-(?:{})$", codes.join("|"))) {
        Ok(re) => re.replace(slug, "").into_owned(),
        Err(e) => {
            tracing::warn!("Could not build language suffix pattern: {}", e);
            slug.to_string()
        }
    }
}
