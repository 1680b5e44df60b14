use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod app;
mod config;
mod db;
mod error;
mod hreflang;
mod models;
mod products;
mod render;
mod security;
mod translations;

use app::App;
use config::Config;
use error::{AppError, Result};
use hreflang::SaveRequest;
use models::{ContentItem, FieldType, HreflangEntry, MenuItem, NewContent, NewFieldTranslation};
use products::{StockLevel, StockStatus};

#[derive(Parser)]
#[command(name = "langlinks")]
#[command(version, about = "Hreflang links and field translations for a content catalog", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Editor token for write commands
    #[arg(long, global = true, env = "LANGLINKS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the content catalog
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },

    /// Save editor input for a content item and sync its translation group
    Save {
        id: i64,

        /// Translation group ("" clears it)
        #[arg(long)]
        group: Option<String>,

        /// Preferred x-default language ("" clears it)
        #[arg(long)]
        default_language: Option<String>,

        /// Manual URL as lang=url; an empty or invalid url removes the row
        #[arg(long = "url", value_parser = parse_pair)]
        urls: Vec<(String, String)>,
    },

    /// Show the hreflang rows of a content item
    Resolve { id: i64 },

    /// Print head tags and JSON-LD for a content item
    Head {
        id: i64,

        /// Also print the document lang attribute
        #[arg(long)]
        lang: bool,
    },

    /// Render a shortcode (language_switcher, current_language, language_flags)
    Shortcode {
        id: i64,
        name: String,

        /// Attributes, e.g. 'show_flags="false" separator=" / "'
        #[arg(default_value = "")]
        attrs: String,
    },

    /// Apply menu integration to rendered items or a JSON item list
    Menu {
        /// Content item being viewed
        #[arg(long)]
        content: Option<i64>,

        /// Rendered <li> items to append flags to
        #[arg(long, conflicts_with = "items")]
        html: Option<String>,

        /// JSON file with menu items, placeholder included
        #[arg(long)]
        items: Option<PathBuf>,
    },

    /// URLs of a translation group, for filling the editor's fields
    GroupUrls {
        group: String,

        /// Content item being edited
        #[arg(long, default_value = "0")]
        current: i64,
    },

    /// Check the store for consistency problems
    Validate {
        /// Only check URL format of one content item
        #[arg(long)]
        content: Option<i64>,
    },

    /// Apply automatic fixes
    Fix,

    /// Show store statistics
    Stats,

    /// Remove rows of deleted content
    Cleanup,

    /// Set a product's stock and copy it to its translations
    Stock {
        id: i64,

        /// Stock quantity; omit for products that don't track one
        #[arg(long)]
        quantity: Option<i64>,

        /// instock, outofstock or onbackorder
        #[arg(long, default_value = "instock")]
        status: String,
    },

    /// Manage field translations
    Translate {
        #[command(subcommand)]
        action: TranslateAction,
    },

    /// Manage navigation menu translations
    Menus {
        #[command(subcommand)]
        action: MenusAction,
    },

    /// List configured languages
    Languages,

    /// Remove all stored data
    Purge {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ContentAction {
    /// Add or replace a content item
    Add {
        id: i64,
        #[arg(long)]
        slug: String,
        #[arg(long)]
        permalink: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "post")]
        post_type: String,
        #[arg(long, default_value = "publish")]
        status: String,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        default_language: Option<String>,
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        legacy_en: Option<String>,
        #[arg(long)]
        legacy_de: Option<String>,
        /// Field value as name=value
        #[arg(long = "field", value_parser = parse_pair)]
        fields: Vec<(String, String)>,
    },

    /// Show one content item
    Show { id: i64 },

    /// List all content items
    List,

    /// Delete a content item
    Delete {
        id: i64,
        /// Also remove its hreflang rows instead of leaving them to cleanup
        #[arg(long)]
        with_links: bool,
    },

    /// Import content items from a JSON array
    Import { path: PathBuf },
}

#[derive(Subcommand)]
enum TranslateAction {
    /// Store a translated field value
    Set {
        id: i64,
        field: String,
        lang: String,
        value: String,
        #[arg(long = "type", default_value = "text")]
        field_type: String,
        #[arg(long)]
        group: Option<String>,
    },

    /// Print a translated value, falling back to the original
    Get {
        id: i64,
        field: String,
        lang: String,
        /// Format for display as this field type
        #[arg(long = "type")]
        field_type: Option<String>,
    },

    /// List translations of a content item
    List {
        id: i64,
        #[arg(long)]
        lang: Option<String>,
    },

    /// Translatable fields of a content item
    Fields {
        id: i64,
        /// Mark which fields have a translation in this language
        #[arg(long)]
        lang: Option<String>,
    },

    /// Store several fields of one language from a JSON object
    Import {
        id: i64,
        lang: String,
        path: PathBuf,
        #[arg(long = "type", default_value = "text")]
        field_type: String,
        #[arg(long)]
        group: Option<String>,
    },

    /// Content items with at least one translation in a language
    ByLanguage { lang: String },

    /// Delete one translation, or all of a content item with --all
    Delete {
        id: i64,
        field: Option<String>,
        lang: Option<String>,
        #[arg(long, conflicts_with_all = ["field", "lang"])]
        all: bool,
    },
}

#[derive(Subcommand)]
enum MenusAction {
    /// Set a menu's language and its translated menus
    Set {
        menu_id: i64,
        language: String,
        /// Translated menu as lang=menu_id
        #[arg(long = "translation", value_parser = parse_pair)]
        translations: Vec<(String, String)>,
    },

    /// Which menu to show on a content item's page
    Resolve {
        menu_id: i64,
        #[arg(long)]
        content: Option<i64>,
    },
}

fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only show warnings and errors unless asked for more
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let app = App::new(config).await?;
    let token = cli.token.as_deref();

    match cli.command {
        Commands::Languages => print_languages(&app.config, cli.json)?,

        Commands::Content { action } => handle_content(&app, action, token, cli.json).await?,

        Commands::Save {
            id,
            group,
            default_language,
            urls,
        } => {
            let report = app
                .save(SaveRequest {
                    content_id: id,
                    token: cli.token.clone(),
                    translation_group: group,
                    default_language,
                    urls: urls.into_iter().collect(),
                })
                .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Manual: {} written, {} removed; group: {} propagated, {} pulled",
                    report.manual_written, report.manual_removed, report.propagated, report.pulled
                );
                if report.changes() == 0 {
                    println!("Nothing changed");
                }
                for warning in &report.warnings {
                    println!("warning: {warning}");
                }
            }
        }

        Commands::Resolve { id } => {
            let entries = app.resolve(id).await?;
            print_entries(&entries, cli.json)?;
        }

        Commands::Head { id, lang } => {
            if lang {
                if let Some(attr) = app.html_lang(id).await? {
                    println!("{attr}");
                }
            }
            print!("{}", app.render_head(id).await?);
        }

        Commands::Shortcode { id, name, attrs } => {
            println!("{}", app.render_shortcode(id, &name, &attrs).await?);
        }

        Commands::Menu {
            content,
            html,
            items,
        } => match (html, items) {
            (Some(html), _) => {
                let id = content.ok_or_else(|| {
                    AppError::InvalidInput("--content is required with --html".into())
                })?;
                println!("{}", app.render_menu_html(id, &html).await?);
            }
            (None, Some(path)) => {
                let raw = std::fs::read_to_string(path)?;
                let items: Vec<MenuItem> = serde_json::from_str(&raw)?;
                let items = app.render_menu_items(content, items).await?;
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
            (None, None) => {
                return Err(AppError::InvalidInput("pass --html or --items".into()));
            }
        },

        Commands::GroupUrls { group, current } => {
            let urls = app.group_urls(&group, current).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&urls)?);
            } else {
                for (code, url) in urls {
                    println!("{code}\t{url}");
                }
            }
        }

        Commands::Validate { content } => match content {
            Some(id) => {
                let problems = app.validator().validate_content(id).await?;
                if problems.is_empty() {
                    println!("No URL problems for content {id}");
                }
                for problem in problems {
                    println!("issue: {problem}");
                }
            }
            None => {
                let report = app.validate().await?;
                if report.is_clean() && !cli.json {
                    println!("All hreflang checks passed");
                } else if cli.json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    for issue in &report.issues {
                        println!("issue: {issue}");
                    }
                    for warning in &report.warnings {
                        println!("warning: {warning}");
                    }
                    let s = &report.summary;
                    println!(
                        "{:?}: {} issues, {} warnings ({} items, {} rows, {} groups)",
                        s.status,
                        s.total_issues,
                        s.total_warnings,
                        s.total_posts,
                        s.total_entries,
                        s.total_groups
                    );
                }
                if report.has_issues() {
                    std::process::exit(1);
                }
            }
        },

        Commands::Fix => {
            let fixes = app.auto_fix(token).await?;
            if fixes.is_empty() {
                println!("Nothing to fix");
            }
            for fix in fixes {
                println!("{fix}");
            }
        }

        Commands::Stats => {
            let stats = app.statistics().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Entries:  {}", stats.total_entries);
                println!("Items:    {}", stats.total_posts);
                println!("Groups:   {}", stats.total_groups);
                for (code, count) in &stats.languages {
                    println!("  {code}: {count}");
                }
                let groups = app.translation_groups().await?;
                if !groups.is_empty() {
                    println!("Group names: {}", groups.join(", "));
                }
            }
        }

        Commands::Cleanup => {
            println!("Removed {} orphaned entries", app.cleanup(token).await?);
        }

        Commands::Stock {
            id,
            quantity,
            status,
        } => {
            let level = StockLevel {
                quantity,
                status: StockStatus::parse(&status)?,
            };
            let synced = app.set_stock(id, level, token).await?;
            println!("Stock of {id} set to {}", level.status.as_str());
            for sibling in synced {
                println!("  synced to {sibling}");
            }
        }

        Commands::Translate { action } => handle_translate(&app, action, token, cli.json).await?,

        Commands::Menus { action } => match action {
            MenusAction::Set {
                menu_id,
                language,
                translations,
            } => {
                let mut mapping = BTreeMap::new();
                for (code, id) in translations {
                    let id = id.trim().parse::<i64>().map_err(|_| {
                        AppError::InvalidInput(format!("menu id for '{code}' must be a number"))
                    })?;
                    mapping.insert(code, id);
                }
                app.set_menu_translation(menu_id, &language, mapping, token)
                    .await?;
                println!("Saved menu {menu_id}");
            }
            MenusAction::Resolve { menu_id, content } => {
                println!("{}", app.resolve_menu(menu_id, content).await?);
            }
        },

        Commands::Purge { yes } => {
            if !yes {
                return Err(AppError::InvalidInput(
                    "purge removes all stored data; pass --yes to confirm".into(),
                ));
            }
            println!("Removed {} rows", app.purge(token).await?);
        }
    }

    Ok(())
}

async fn handle_content(app: &App, action: ContentAction, token: Option<&str>, json: bool) -> Result<()> {
    match action {
        ContentAction::Add {
            id,
            slug,
            permalink,
            title,
            post_type,
            status,
            group,
            default_language,
            categories,
            tags,
            legacy_en,
            legacy_de,
            fields,
        } => {
            app.add_content(
                NewContent {
                    id,
                    post_type,
                    slug,
                    title,
                    status,
                    permalink,
                    translation_group: group,
                    default_language,
                    categories,
                    tags,
                    legacy_en,
                    legacy_de,
                    fields: fields.into_iter().collect(),
                },
                token,
            )
            .await?;
            println!("Stored content {id}");
        }
        ContentAction::Show { id } => {
            let item = app.content(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&item)?);
            } else {
                print_content(&item);
            }
        }
        ContentAction::List => {
            let items = app.repository.list_content().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in &items {
                    println!(
                        "{:>6}  {:<8} {:<8} {}  {}",
                        item.id,
                        item.post_type,
                        item.status,
                        item.slug,
                        item.translation_group.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        ContentAction::Delete { id, with_links } => {
            if app.delete_content(id, with_links, token).await? {
                println!("Deleted content {id}");
            } else {
                println!("No content {id}");
            }
        }
        ContentAction::Import { path } => {
            let count = app.import_content(&path, token).await?;
            println!("Imported {count} content items from {path:?}");
        }
    }
    Ok(())
}

async fn handle_translate(
    app: &App,
    action: TranslateAction,
    token: Option<&str>,
    json: bool,
) -> Result<()> {
    let manager = app.translations();
    match action {
        TranslateAction::Set {
            id,
            field,
            lang,
            value,
            field_type,
            group,
        } => {
            let saved = app
                .save_translation(
                    NewFieldTranslation {
                        content_id: id,
                        field_name: field.clone(),
                        field_type: FieldType::parse(&field_type),
                        language_code: lang.clone(),
                        value,
                        translation_group: group,
                    },
                    token,
                )
                .await?;
            println!("Saved {lang} {field}: {saved}");
        }
        TranslateAction::Get {
            id,
            field,
            lang,
            field_type,
        } => {
            let item = app.content(id).await?;
            let value = match field_type {
                Some(t) => {
                    manager
                        .display_value(&item, &field, FieldType::parse(&t), &lang)
                        .await?
                }
                None => manager.translated_or_original(&item, &field, &lang).await?,
            };
            match value {
                Some(value) => println!("{value}"),
                None => return Err(AppError::NotFound(format!("field '{field}' of content {id}"))),
            }
        }
        TranslateAction::List { id, lang } => {
            let translations = manager.for_content(id, lang).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&translations)?);
            } else {
                for t in &translations {
                    println!(
                        "{}\t{}\t{}\t{}",
                        t.language_code,
                        t.field_name,
                        t.field_type.as_str(),
                        t.value
                    );
                }
                for (code, count) in manager.stats(id).await? {
                    println!("# {code}: {count} fields");
                }
            }
        }
        TranslateAction::Fields { id, lang } => {
            let item = app.content(id).await?;
            for (field, field_type) in translations::translatable_fields(&item) {
                let marked = match &lang {
                    Some(lang) => manager.has(id, &field, lang).await?,
                    None => false,
                };
                match (&lang, marked) {
                    (Some(lang), true) => println!("{field}\t{}\t[{lang}]", field_type.as_str()),
                    _ => println!("{field}\t{}", field_type.as_str()),
                }
            }
            let translated = manager.translated_fields(id).await?;
            if !translated.is_empty() {
                println!("# translated: {}", translated.join(", "));
            }
        }
        TranslateAction::Import {
            id,
            lang,
            path,
            field_type,
            group,
        } => {
            let saved = app
                .import_translations(id, &lang, &path, FieldType::parse(&field_type), group, token)
                .await?;
            println!("Saved {saved} {lang} fields for content {id}");
        }
        TranslateAction::ByLanguage { lang } => {
            for id in manager.content_by_language(&lang).await? {
                println!("{id}");
            }
        }
        TranslateAction::Delete {
            id,
            field,
            lang,
            all,
        } => {
            if all {
                println!("Deleted {} translations", app.delete_translations(id, token).await?);
            } else {
                let (Some(field), Some(lang)) = (field, lang) else {
                    return Err(AppError::InvalidInput("pass FIELD and LANG, or --all".into()));
                };
                if app.delete_translation(id, &field, &lang, token).await? {
                    println!("Deleted {lang} {field}");
                } else {
                    println!("No {lang} translation of {field}");
                }
            }
        }
    }
    Ok(())
}

fn print_entries(entries: &[HreflangEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No hreflang entries (single-language content)");
    }
    for e in entries {
        println!(
            "{:<4} {:<11} {}{}",
            e.language_code,
            e.priority.label(),
            e.url,
            if e.is_default { "  [x-default]" } else { "" }
        );
    }
    Ok(())
}

fn print_content(item: &ContentItem) {
    println!("ID:         {}", item.id);
    println!("Type:       {} ({})", item.post_type, item.status);
    println!("Slug:       {}", item.slug);
    println!("Title:      {}", item.title);
    println!("Permalink:  {}", item.permalink);
    println!("Group:      {}", item.translation_group.as_deref().unwrap_or("-"));
    println!("Default:    {}", item.default_language.as_deref().unwrap_or("-"));
    println!("Categories: {}", item.categories.join(", "));
    println!("Tags:       {}", item.tags.join(", "));
    for (code, url) in item.legacy_urls() {
        println!("Legacy {code}:  {url}");
    }
    for (name, value) in &item.fields {
        println!("Field {name}: {value}");
    }
}

fn print_languages(config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&config.languages)?);
        return Ok(());
    }
    for lang in config.registry().iter() {
        let marker = if lang.code == config.default_language {
            " (default)"
        } else {
            ""
        };
        println!("{} {}  {}{}", lang.flag, lang.code, lang.name, marker);
    }
    Ok(())
}
