use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{
    ContentItem, FieldTranslation, FieldType, HreflangEntry, HreflangStats, MenuTranslation,
    NewContent, NewFieldTranslation, NewHreflang, Priority,
};

use super::schema::{SCHEMA, TABLES};

const CONTENT_COLUMNS: &str = "id, post_type, slug, title, status, permalink, translation_group, \
     default_language, categories, tags, legacy_en, legacy_de, fields, created_at, updated_at";

const HREFLANG_COLUMNS: &str = "id, post_id, language_code, url, is_x_default, translation_group, \
     priority, created_at, updated_at";

const FIELD_COLUMNS: &str = "id, post_id, field_name, field_type, language_code, translated_value, \
     translation_group, created_at, updated_at";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    /// Fresh private database, used by tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Content operations

    pub async fn upsert_content(&self, content: NewContent) -> Result<()> {
        let categories = serde_json::to_string(&content.categories)?;
        let tags = serde_json::to_string(&content.tags)?;
        let fields = serde_json::to_string(&content.fields)?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO content_items (id, post_type, slug, title, status, permalink,
                           translation_group, default_language, categories, tags, legacy_en, legacy_de, fields)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                       ON CONFLICT(id) DO UPDATE SET
                           post_type = excluded.post_type,
                           slug = excluded.slug,
                           title = excluded.title,
                           status = excluded.status,
                           permalink = excluded.permalink,
                           translation_group = excluded.translation_group,
                           default_language = excluded.default_language,
                           categories = excluded.categories,
                           tags = excluded.tags,
                           legacy_en = excluded.legacy_en,
                           legacy_de = excluded.legacy_de,
                           fields = excluded.fields,
                           updated_at = datetime('now')"#,
                    params![
                        content.id,
                        content.post_type,
                        content.slug,
                        content.title,
                        content.status,
                        content.permalink,
                        content.translation_group.filter(|g| !g.is_empty()),
                        content.default_language.filter(|l| !l.is_empty()),
                        categories,
                        tags,
                        content.legacy_en,
                        content.legacy_de,
                        fields,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_content(&self, id: i64) -> Result<Option<ContentItem>> {
        let content = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CONTENT_COLUMNS} FROM content_items WHERE id = ?1"
                ))?;
                let content = stmt.query_row(params![id], content_from_row).optional()?;
                Ok(content)
            })
            .await?;
        Ok(content)
    }

    pub async fn list_content(&self) -> Result<Vec<ContentItem>> {
        let items = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CONTENT_COLUMNS} FROM content_items ORDER BY id"
                ))?;
                let items = stmt
                    .query_map([], content_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    /// Remove a content item. Its hreflang rows stay behind until the orphan sweep.
    pub async fn delete_content(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute("DELETE FROM content_items WHERE id = ?1", params![id])?;
                Ok(n > 0)
            })
            .await?;
        Ok(deleted)
    }

    pub async fn set_content_group(&self, id: i64, group: Option<String>) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE content_items SET translation_group = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![group, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_content_default_language(&self, id: i64, language: Option<String>) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE content_items SET default_language = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![language, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Merge `updates` into an item's field map; empty values remove the key.
    /// Returns false when the item doesn't exist.
    pub async fn set_content_fields(&self, id: i64, updates: BTreeMap<String, String>) -> Result<bool> {
        let Some(item) = self.get_content(id).await? else {
            return Ok(false);
        };
        let mut fields = item.fields;
        for (key, value) in updates {
            if value.is_empty() {
                fields.remove(&key);
            } else {
                fields.insert(key, value);
            }
        }
        let fields = serde_json::to_string(&fields)?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE content_items SET fields = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![fields, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(true)
    }

    /// Every item declaring `group`, whatever its status, optionally excluding one id.
    pub async fn group_members(&self, group: &str, exclude: Option<i64>) -> Result<Vec<ContentItem>> {
        let group = group.to_string();
        let items = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CONTENT_COLUMNS} FROM content_items
                     WHERE translation_group = ?1 AND (?2 IS NULL OR id != ?2)
                     ORDER BY id"
                ))?;
                let items = stmt
                    .query_map(params![group, exclude], content_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    pub async fn find_content_by_slug(
        &self,
        post_type: &str,
        slug: &str,
        status: &str,
    ) -> Result<Vec<ContentItem>> {
        let (post_type, slug, status) = (post_type.to_string(), slug.to_string(), status.to_string());
        let items = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CONTENT_COLUMNS} FROM content_items
                     WHERE post_type = ?1 AND slug = ?2 AND status = ?3
                     ORDER BY id"
                ))?;
                let items = stmt
                    .query_map(params![post_type, slug, status], content_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    // Hreflang operations

    /// Rows of one content item: highest precedence tier first, then language code.
    pub async fn list_for_content(&self, content_id: i64) -> Result<Vec<HreflangEntry>> {
        let entries = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {HREFLANG_COLUMNS} FROM hreflang
                     WHERE post_id = ?1
                     ORDER BY priority ASC, language_code ASC"
                ))?;
                let entries = stmt
                    .query_map(params![content_id], hreflang_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    pub async fn list_for_group(&self, group: &str) -> Result<Vec<HreflangEntry>> {
        let group = group.to_string();
        let entries = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {HREFLANG_COLUMNS} FROM hreflang
                     WHERE translation_group = ?1
                     ORDER BY post_id ASC, language_code ASC"
                ))?;
                let entries = stmt
                    .query_map(params![group], hreflang_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    pub async fn all_entries(&self) -> Result<Vec<HreflangEntry>> {
        let entries = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {HREFLANG_COLUMNS} FROM hreflang ORDER BY post_id, priority, language_code"
                ))?;
                let entries = stmt
                    .query_map([], hreflang_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    /// Insert a row, or update the existing (content, language) row when the
    /// incoming tier does not rank below the stored one.
    ///
    /// Returns true when a row was inserted or actually changed.
    pub async fn upsert_entry(&self, entry: NewHreflang) -> Result<bool> {
        let changed = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    r#"INSERT INTO hreflang (post_id, language_code, url, translation_group, priority)
                       VALUES (?1, ?2, ?3, ?4, ?5)
                       ON CONFLICT(post_id, language_code) DO UPDATE SET
                           url = excluded.url,
                           translation_group = excluded.translation_group,
                           priority = excluded.priority,
                           updated_at = datetime('now')
                       WHERE excluded.priority <= hreflang.priority
                         AND (hreflang.url IS NOT excluded.url
                              OR hreflang.translation_group IS NOT excluded.translation_group
                              OR hreflang.priority IS NOT excluded.priority)"#,
                    params![
                        entry.content_id,
                        entry.language_code,
                        entry.url,
                        entry.translation_group,
                        entry.priority.rank(),
                    ],
                )?;
                Ok(n > 0)
            })
            .await?;
        Ok(changed)
    }

    /// Make `language_code` the only x-default row of the content item.
    ///
    /// Nothing changes when the item has no row for that language.
    pub async fn set_x_default(&self, content_id: i64, language_code: &str) -> Result<bool> {
        let language_code = language_code.to_string();
        let set = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let exists: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM hreflang WHERE post_id = ?1 AND language_code = ?2",
                    params![content_id, language_code],
                    |row| row.get(0),
                )?;
                if exists == 0 {
                    return Ok(false);
                }
                tx.execute(
                    "UPDATE hreflang SET is_x_default = 0 WHERE post_id = ?1 AND is_x_default != 0",
                    params![content_id],
                )?;
                tx.execute(
                    "UPDATE hreflang SET is_x_default = 1, updated_at = datetime('now')
                     WHERE post_id = ?1 AND language_code = ?2",
                    params![content_id, language_code],
                )?;
                tx.commit()?;
                Ok(true)
            })
            .await?;
        Ok(set)
    }

    pub async fn delete_entry(&self, content_id: i64, language_code: &str) -> Result<usize> {
        let language_code = language_code.to_string();
        let n = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM hreflang WHERE post_id = ?1 AND language_code = ?2",
                    params![content_id, language_code],
                )?;
                Ok(n)
            })
            .await?;
        Ok(n)
    }

    pub async fn delete_for_content(&self, content_id: i64) -> Result<usize> {
        let n = self
            .conn
            .call(move |conn| {
                let n = conn.execute("DELETE FROM hreflang WHERE post_id = ?1", params![content_id])?;
                Ok(n)
            })
            .await?;
        Ok(n)
    }

    pub async fn content_ids_with_hreflang(&self) -> Result<Vec<i64>> {
        let ids = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT DISTINCT post_id FROM hreflang ORDER BY post_id DESC")?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<i64>, _>>()?;
                Ok(ids)
            })
            .await?;
        Ok(ids)
    }

    pub async fn translation_groups(&self) -> Result<Vec<String>> {
        let groups = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT translation_group FROM hreflang
                     WHERE translation_group IS NOT NULL AND translation_group != ''
                     ORDER BY translation_group ASC",
                )?;
                let groups = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(groups)
            })
            .await?;
        Ok(groups)
    }

    pub async fn statistics(&self) -> Result<HreflangStats> {
        let stats = self
            .conn
            .call(|conn| {
                let total_entries: i64 =
                    conn.query_row("SELECT COUNT(*) FROM hreflang", [], |row| row.get(0))?;
                let total_posts: i64 = conn.query_row(
                    "SELECT COUNT(DISTINCT post_id) FROM hreflang",
                    [],
                    |row| row.get(0),
                )?;
                let total_groups: i64 = conn.query_row(
                    "SELECT COUNT(DISTINCT translation_group) FROM hreflang
                     WHERE translation_group IS NOT NULL AND translation_group != ''",
                    [],
                    |row| row.get(0),
                )?;
                let mut stmt = conn.prepare(
                    "SELECT language_code, COUNT(*) AS count FROM hreflang
                     GROUP BY language_code ORDER BY count DESC, language_code ASC",
                )?;
                let languages = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<std::result::Result<Vec<(String, i64)>, _>>()?;
                Ok(HreflangStats {
                    total_entries,
                    total_posts,
                    total_groups,
                    languages,
                })
            })
            .await?;
        Ok(stats)
    }

    /// Content ids referenced by hreflang rows but missing from the catalog.
    pub async fn orphaned_content_ids(&self) -> Result<Vec<i64>> {
        let ids = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT post_id FROM hreflang
                     WHERE post_id NOT IN (SELECT id FROM content_items)
                     ORDER BY post_id",
                )?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<i64>, _>>()?;
                Ok(ids)
            })
            .await?;
        Ok(ids)
    }

    pub async fn cleanup_orphaned_entries(&self) -> Result<usize> {
        let n = self
            .conn
            .call(|conn| {
                let n = conn.execute(
                    "DELETE FROM hreflang WHERE post_id NOT IN (SELECT id FROM content_items)",
                    [],
                )?;
                Ok(n)
            })
            .await?;
        Ok(n)
    }

    /// (content id, language, count) for pairs stored more than once.
    pub async fn duplicate_pairs(&self) -> Result<Vec<(i64, String, i64)>> {
        let pairs = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT post_id, language_code, COUNT(*) AS count FROM hreflang
                     GROUP BY post_id, language_code
                     HAVING count > 1",
                )?;
                let pairs = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(pairs)
            })
            .await?;
        Ok(pairs)
    }

    /// Remove every row this tool ever stored.
    pub async fn purge_all(&self) -> Result<usize> {
        let n = self
            .conn
            .call(|conn| {
                let tx = conn.transaction()?;
                let mut total = 0;
                for table in TABLES {
                    total += tx.execute(&format!("DELETE FROM {table}"), [])?;
                }
                tx.commit()?;
                Ok(total)
            })
            .await?;
        Ok(n)
    }

    // Field translation operations

    pub async fn save_field_translations(&self, translations: Vec<NewFieldTranslation>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for t in translations {
                    tx.execute(
                        r#"INSERT INTO field_translations
                               (post_id, field_name, field_type, language_code, translated_value, translation_group)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                           ON CONFLICT(post_id, field_name, language_code) DO UPDATE SET
                               field_type = excluded.field_type,
                               translated_value = excluded.translated_value,
                               translation_group = excluded.translation_group,
                               updated_at = datetime('now')"#,
                        params![
                            t.content_id,
                            t.field_name,
                            t.field_type.as_str(),
                            t.language_code,
                            t.value,
                            t.translation_group,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_field_translation(
        &self,
        content_id: i64,
        field_name: &str,
        language_code: &str,
    ) -> Result<Option<String>> {
        let (field_name, language_code) = (field_name.to_string(), language_code.to_string());
        let value = self
            .conn
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT translated_value FROM field_translations
                         WHERE post_id = ?1 AND field_name = ?2 AND language_code = ?3",
                        params![content_id, field_name, language_code],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await?;
        Ok(value)
    }

    pub async fn field_translations(
        &self,
        content_id: i64,
        language_code: Option<String>,
    ) -> Result<Vec<FieldTranslation>> {
        let translations = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {FIELD_COLUMNS} FROM field_translations
                     WHERE post_id = ?1 AND (?2 IS NULL OR language_code = ?2)
                     ORDER BY language_code, field_name"
                ))?;
                let translations = stmt
                    .query_map(params![content_id, language_code], field_translation_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(translations)
            })
            .await?;
        Ok(translations)
    }

    pub async fn translated_fields(&self, content_id: i64) -> Result<Vec<String>> {
        let fields = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT field_name FROM field_translations
                     WHERE post_id = ?1 ORDER BY field_name",
                )?;
                let fields = stmt
                    .query_map(params![content_id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(fields)
            })
            .await?;
        Ok(fields)
    }

    pub async fn delete_field_translation(
        &self,
        content_id: i64,
        field_name: &str,
        language_code: &str,
    ) -> Result<bool> {
        let (field_name, language_code) = (field_name.to_string(), language_code.to_string());
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM field_translations
                     WHERE post_id = ?1 AND field_name = ?2 AND language_code = ?3",
                    params![content_id, field_name, language_code],
                )?;
                Ok(n > 0)
            })
            .await?;
        Ok(deleted)
    }

    pub async fn delete_field_translations(&self, content_id: i64) -> Result<usize> {
        let n = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM field_translations WHERE post_id = ?1",
                    params![content_id],
                )?;
                Ok(n)
            })
            .await?;
        Ok(n)
    }

    pub async fn field_translation_stats(&self, content_id: i64) -> Result<Vec<(String, i64)>> {
        let stats = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT language_code, COUNT(*) FROM field_translations
                     WHERE post_id = ?1 GROUP BY language_code ORDER BY language_code",
                )?;
                let stats = stmt
                    .query_map(params![content_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await?;
        Ok(stats)
    }

    pub async fn posts_with_field_language(&self, language_code: &str) -> Result<Vec<i64>> {
        let language_code = language_code.to_string();
        let ids = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT post_id FROM field_translations
                     WHERE language_code = ?1 ORDER BY post_id",
                )?;
                let ids = stmt
                    .query_map(params![language_code], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<i64>, _>>()?;
                Ok(ids)
            })
            .await?;
        Ok(ids)
    }

    // Menu translation operations

    pub async fn save_menu_translation(&self, menu: MenuTranslation) -> Result<()> {
        let translations = serde_json::to_string(&menu.translations)?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO menu_translations (menu_id, language, translations) VALUES (?1, ?2, ?3)",
                    params![menu.menu_id, menu.language, translations],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn menu_translations(&self) -> Result<Vec<MenuTranslation>> {
        let menus = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT menu_id, language, translations FROM menu_translations ORDER BY menu_id",
                )?;
                let menus = stmt
                    .query_map([], |row| {
                        let translations: String = row.get(2)?;
                        Ok(MenuTranslation {
                            menu_id: row.get(0)?,
                            language: row.get(1)?,
                            translations: parse_json_column::<BTreeMap<String, i64>>(&translations),
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(menus)
            })
            .await?;
        Ok(menus)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn timestamp(row: &Row, idx: usize) -> DateTime<Utc> {
    row.get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now)
}

fn parse_json_column<T: serde::de::DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed JSON column {:?}: {}", raw, e);
        T::default()
    })
}

fn content_from_row(row: &Row) -> rusqlite::Result<ContentItem> {
    let categories: String = row.get(8)?;
    let tags: String = row.get(9)?;
    let fields: String = row.get(12)?;
    Ok(ContentItem {
        id: row.get(0)?,
        post_type: row.get(1)?,
        slug: row.get(2)?,
        title: row.get(3)?,
        status: row.get(4)?,
        permalink: row.get(5)?,
        translation_group: row.get(6)?,
        default_language: row.get(7)?,
        categories: parse_json_column(&categories),
        tags: parse_json_column(&tags),
        legacy_en: row.get(10)?,
        legacy_de: row.get(11)?,
        fields: parse_json_column(&fields),
        created_at: timestamp(row, 13),
        updated_at: timestamp(row, 14),
    })
}

fn hreflang_from_row(row: &Row) -> rusqlite::Result<HreflangEntry> {
    Ok(HreflangEntry {
        id: row.get(0)?,
        content_id: row.get(1)?,
        language_code: row.get(2)?,
        url: row.get(3)?,
        is_default: row.get::<_, i64>(4)? != 0,
        translation_group: row.get(5)?,
        priority: Priority::from_rank(row.get(6)?),
        created_at: timestamp(row, 7),
        updated_at: timestamp(row, 8),
    })
}

fn field_translation_from_row(row: &Row) -> rusqlite::Result<FieldTranslation> {
    Ok(FieldTranslation {
        id: row.get(0)?,
        content_id: row.get(1)?,
        field_name: row.get(2)?,
        field_type: FieldType::parse(&row.get::<_, String>(3)?),
        language_code: row.get(4)?,
        value: row.get(5)?,
        translation_group: row.get(6)?,
        created_at: timestamp(row, 7),
        updated_at: timestamp(row, 8),
    })
}
