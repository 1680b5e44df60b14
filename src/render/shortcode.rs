use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::hreflang::detect::detect_content_language;
use crate::models::{site_locale_language, ContentItem, LanguageRegistry};

use super::{escape, Page};

static ATTR_REGEX: OnceLock<Regex> = OnceLock::new();

/// Parse `key="value" other='x' flag=true` into a map.
pub fn parse_attributes(raw: &str) -> BTreeMap<String, String> {
    let re = ATTR_REGEX.get_or_init(|| {
        Regex::new(r#"(\w+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"']+))"#)
            .expect("attribute pattern is valid")
    });

    re.captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            (caps[1].to_lowercase(), value.to_string())
        })
        .collect()
}

fn flag(attrs: &BTreeMap<String, String>, key: &str, default: bool) -> bool {
    match attrs.get(key).map(|v| v.as_str()) {
        Some("true") => true,
        Some("false") => false,
        _ => default,
    }
}

fn text(attrs: &BTreeMap<String, String>, key: &str, default: &str) -> String {
    attrs
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitcherOptions {
    pub show_flags: bool,
    pub show_names: bool,
    pub separator: String,
    pub class: String,
    pub debug: bool,
}

impl SwitcherOptions {
    pub fn from_attrs(attrs: &BTreeMap<String, String>, config: &Config) -> Self {
        Self {
            show_flags: flag(attrs, "show_flags", config.show_flags),
            show_names: flag(attrs, "show_names", true),
            separator: text(attrs, "separator", " | "),
            class: text(attrs, "class", "langlinks-language-switcher"),
            debug: flag(attrs, "debug", false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurrentFormat {
    #[default]
    Name,
    Code,
    Flag,
}

impl CurrentFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "code" => Self::Code,
            "flag" => Self::Flag,
            _ => Self::Name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagsOptions {
    /// small, medium or large
    pub size: String,
    /// inline or block
    pub style: String,
    pub show_current: bool,
    pub class: String,
    pub debug: bool,
}

impl FlagsOptions {
    pub fn from_attrs(attrs: &BTreeMap<String, String>) -> Self {
        Self {
            size: text(attrs, "size", "medium"),
            style: text(attrs, "style", "inline"),
            show_current: flag(attrs, "show_current", true),
            class: text(attrs, "class", "langlinks-language-flags"),
            debug: flag(attrs, "debug", false),
        }
    }
}

/// Debug panel listing the rows a shortcode saw.
fn debug_panel(label: &str, color: &str, page: &Page) -> String {
    if page.entries.is_empty() {
        return format!(
            "<div style=\"color: red; border: 1px solid red; padding: 10px;\">DEBUG ({}): No hreflang data found for content ID {}</div>",
            escape(label),
            page.item.id
        );
    }

    let mut out = format!(
        "<div style=\"color: {color}; border: 1px solid {color}; padding: 10px; margin-bottom: 10px;\">\
         DEBUG ({}): Found {} hreflang entries for content ID {}<br>Current URL: {}<br>",
        escape(label),
        page.entries.len(),
        page.item.id,
        escape(&page.item.permalink)
    );
    for entry in page.entries {
        out.push_str(&format!(
            "Language: {}, URL: {}, X-default: {}<br>",
            escape(&entry.language_code),
            escape(&entry.url),
            if entry.is_default { "Yes" } else { "No" }
        ));
    }
    out.push_str("</div>");
    out
}

pub fn language_switcher(page: &Page, registry: &LanguageRegistry, opts: &SwitcherOptions) -> String {
    let debug = if opts.debug {
        debug_panel("Language Switcher", "green", page)
    } else {
        String::new()
    };
    if page.entries.is_empty() {
        return debug;
    }

    let links: Vec<String> = page
        .entries
        .iter()
        .map(|entry| {
            let mut label = String::new();
            if let Some(lang) = registry.get_by_code(&entry.language_code) {
                if opts.show_flags {
                    label.push_str(&format!(
                        "<span class=\"langlinks-flag\">{}</span> ",
                        escape(&lang.flag)
                    ));
                }
                if opts.show_names {
                    label.push_str(&escape(&lang.name));
                }
            }

            if page.is_current(entry) {
                format!("<span class=\"current-lang\">{label}</span>")
            } else {
                format!(
                    "<a href=\"{}\" hreflang=\"{}\">{label}</a>",
                    escape(&entry.url),
                    escape(&entry.language_code)
                )
            }
        })
        .collect();

    format!(
        "{debug}<div class=\"{}\">{}</div>",
        escape(&opts.class),
        links.join(&opts.separator)
    )
}

/// Language the page is in: detected, else the site locale's language when
/// registered, else the configured default.
pub fn current_language_code(item: &ContentItem, registry: &LanguageRegistry, config: &Config) -> String {
    if let Some(code) = detect_content_language(item, registry) {
        return code;
    }
    let locale_language = site_locale_language(&config.site_locale);
    if registry.contains(locale_language) {
        return locale_language.to_string();
    }
    config.default_language.clone()
}

pub fn current_language(
    item: &ContentItem,
    registry: &LanguageRegistry,
    config: &Config,
    format: CurrentFormat,
    debug: bool,
) -> String {
    let code = current_language_code(item, registry, config);
    let lang = registry.get_by_code(&code);

    let value = match format {
        CurrentFormat::Code => code.clone(),
        CurrentFormat::Flag => lang.map(|l| l.flag.clone()).unwrap_or_default(),
        CurrentFormat::Name => lang.map(|l| l.name.clone()).unwrap_or_else(|| code.clone()),
    };

    let mut out = String::new();
    if debug {
        out.push_str(&format!(
            "<div style=\"color: orange; border: 1px solid orange; padding: 10px; margin-bottom: 10px;\">\
             DEBUG (Current Language): Content ID {}<br>Terms: {}<br>Detected: {}<br>Site locale: {}<br></div>",
            item.id,
            escape(&item.term_names().into_iter().collect::<Vec<_>>().join(", ")),
            escape(&detect_content_language(item, registry).unwrap_or_else(|| "none".into())),
            escape(&config.site_locale)
        ));
    }
    out.push_str(&escape(&value));
    out
}

pub fn language_flags(page: &Page, registry: &LanguageRegistry, opts: &FlagsOptions) -> String {
    let debug = if opts.debug {
        debug_panel("Language Flags", "blue", page)
    } else {
        String::new()
    };
    if page.entries.is_empty() {
        return debug;
    }

    let flags: Vec<String> = page
        .entries
        .iter()
        .filter(|entry| opts.show_current || !page.is_current(entry))
        .map(|entry| {
            let (glyph, title) = registry
                .get_by_code(&entry.language_code)
                .map(|l| (l.flag.as_str(), l.name.as_str()))
                .unwrap_or(("", ""));
            if page.is_current(entry) {
                format!(
                    "<span class=\"current-flag\" title=\"{}\">{}</span>",
                    escape(title),
                    escape(glyph)
                )
            } else {
                format!(
                    "<a href=\"{}\" hreflang=\"{}\" class=\"other-flag\" title=\"{}\">{}</a>",
                    escape(&entry.url),
                    escape(&entry.language_code),
                    escape(title),
                    escape(glyph)
                )
            }
        })
        .collect();

    format!(
        "{debug}<div class=\"{} flag-{} flags-{}\">{}</div>",
        escape(&opts.class),
        escape(&opts.size),
        escape(&opts.style),
        flags.join(" ")
    )
}

/// Render a shortcode by name with its raw attribute string.
pub fn render_shortcode(
    name: &str,
    raw_attrs: &str,
    page: &Page,
    registry: &LanguageRegistry,
    config: &Config,
) -> Result<String> {
    let attrs = parse_attributes(raw_attrs);
    match name {
        "language_switcher" => Ok(language_switcher(
            page,
            registry,
            &SwitcherOptions::from_attrs(&attrs, config),
        )),
        "current_language" => Ok(current_language(
            page.item,
            registry,
            config,
            CurrentFormat::parse(&text(&attrs, "format", "name")),
            flag(&attrs, "debug", false),
        )),
        "language_flags" => Ok(language_flags(
            page,
            registry,
            &FlagsOptions::from_attrs(&attrs),
        )),
        other => Err(AppError::InvalidInput(format!("unknown shortcode '{other}'"))),
    }
}
