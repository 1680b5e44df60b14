pub const SCHEMA: &str = r#"
-- content_items table (posts, pages and products known to the host site)
CREATE TABLE IF NOT EXISTS content_items (
    id INTEGER PRIMARY KEY,
    post_type TEXT NOT NULL DEFAULT 'post',
    slug TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'publish',
    permalink TEXT NOT NULL,
    translation_group TEXT,
    default_language TEXT,
    categories TEXT NOT NULL DEFAULT '[]',
    tags TEXT NOT NULL DEFAULT '[]',
    legacy_en TEXT,
    legacy_de TEXT,
    fields TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_content_items_group ON content_items(translation_group);
CREATE INDEX IF NOT EXISTS idx_content_items_type_slug ON content_items(post_type, slug);

-- hreflang table (one row per content item and language)
CREATE TABLE IF NOT EXISTS hreflang (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL,
    language_code TEXT NOT NULL,
    url TEXT NOT NULL,
    is_x_default INTEGER NOT NULL DEFAULT 0,
    translation_group TEXT,
    priority INTEGER NOT NULL DEFAULT 4,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(post_id, language_code)
);

CREATE INDEX IF NOT EXISTS idx_hreflang_post_id ON hreflang(post_id);
CREATE INDEX IF NOT EXISTS idx_hreflang_language_code ON hreflang(language_code);
CREATE INDEX IF NOT EXISTS idx_hreflang_translation_group ON hreflang(translation_group);

-- field_translations table (translated values of individual fields)
CREATE TABLE IF NOT EXISTS field_translations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL,
    field_name TEXT NOT NULL,
    field_type TEXT NOT NULL DEFAULT 'text',
    language_code TEXT NOT NULL,
    translated_value TEXT NOT NULL,
    translation_group TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(post_id, field_name, language_code)
);

CREATE INDEX IF NOT EXISTS idx_field_translations_post_field ON field_translations(post_id, field_name);
CREATE INDEX IF NOT EXISTS idx_field_translations_language ON field_translations(language_code);

-- menu_translations table (navigation menu language links)
CREATE TABLE IF NOT EXISTS menu_translations (
    menu_id INTEGER PRIMARY KEY,
    language TEXT NOT NULL,
    translations TEXT NOT NULL DEFAULT '{}'
);
"#;

/// Tables removed by a full purge, in deletion order.
pub const TABLES: &[&str] = &[
    "hreflang",
    "field_translations",
    "menu_translations",
    "content_items",
];
