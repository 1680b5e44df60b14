use std::collections::BTreeMap;

use crate::config::MenuFlagsDisplay;
use crate::models::{LanguageRegistry, MenuItem, MenuTranslation};

use super::{escape, Page};

/// Menu link URL that marks where the flags go.
pub const FLAGS_PLACEHOLDER: &str = "#langlinks-language-flags";

/// Links to every language except the page's own, with a flag glyph.
fn other_language_links(page: &Page, registry: &LanguageRegistry, link_class: Option<&str>) -> String {
    let mut out = String::new();
    for entry in page.entries.iter().filter(|e| !page.is_current(e)) {
        let Some(lang) = registry.get_by_code(&entry.language_code) else {
            continue;
        };
        if lang.flag.is_empty() {
            continue;
        }
        let class = link_class
            .map(|c| format!(" class=\"{}\"", escape(c)))
            .unwrap_or_default();
        out.push_str(&format!(
            "<a href=\"{}\"{class} title=\"{}\" hreflang=\"{}\">{}</a>",
            escape(&entry.url),
            escape(&lang.name),
            escape(&entry.language_code),
            escape(&lang.flag)
        ));
    }
    out
}

/// Append a flags `<li>` to rendered menu items when the page has
/// translations.
pub fn auto_menu_flags(
    items_html: &str,
    page: &Page,
    registry: &LanguageRegistry,
    display: MenuFlagsDisplay,
) -> String {
    if page.entries.len() < 2 {
        return items_html.to_string();
    }

    let flags = other_language_links(page, registry, Some("langlinks-menu-flag-link"));
    if flags.is_empty() {
        return items_html.to_string();
    }

    let column = match display {
        MenuFlagsDisplay::Column => " langlinks-flags-column",
        MenuFlagsDisplay::Row => "",
    };
    format!(
        "{items_html}<li class=\"menu-item langlinks-menu-item-language-flags{column}\">{flags}</li>"
    )
}

/// Swap the placeholder item for the page's flags, or drop it when there is
/// nothing to show. `page` is `None` outside single content views.
pub fn replace_menu_placeholder(
    items: Vec<MenuItem>,
    page: Option<&Page>,
    registry: &LanguageRegistry,
    display: MenuFlagsDisplay,
) -> Vec<MenuItem> {
    let flags = page
        .filter(|p| p.entries.len() >= 2)
        .map(|p| other_language_links(p, registry, None))
        .filter(|html| !html.is_empty());

    items
        .into_iter()
        .filter_map(|mut item| {
            if item.url != FLAGS_PLACEHOLDER {
                return Some(item);
            }
            let flags = flags.as_ref()?;
            item.title = format!("<span class=\"langlinks-menu-flags-wrapper\">{flags}</span>");
            item.url = "#".to_string();
            item.classes.push("langlinks-language-flags-item".to_string());
            if display == MenuFlagsDisplay::Column {
                item.classes.push("langlinks-flags-column".to_string());
            }
            Some(item)
        })
        .collect()
}

/// Build a storable menu mapping, dropping blank languages and unset ids.
pub fn menu_translation(
    menu_id: i64,
    language: &str,
    translations: BTreeMap<String, i64>,
) -> Option<MenuTranslation> {
    let language = language.trim();
    if language.is_empty() {
        return None;
    }
    Some(MenuTranslation {
        menu_id,
        language: language.to_string(),
        translations: translations
            .into_iter()
            .filter(|(code, id)| !code.trim().is_empty() && *id > 0)
            .map(|(code, id)| (code.trim().to_string(), id))
            .collect(),
    })
}

/// The menu to show for `current_language` in place of `menu_id`.
pub fn translate_menu(menus: &[MenuTranslation], menu_id: i64, current_language: &str) -> i64 {
    menus
        .iter()
        .find(|m| m.menu_id == menu_id || m.translations.values().any(|id| *id == menu_id))
        .and_then(|m| m.translations.get(current_language).copied())
        .unwrap_or(menu_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures::{entry, item};

    fn placeholder() -> MenuItem {
        MenuItem {
            title: "Languages".into(),
            url: FLAGS_PLACEHOLDER.into(),
            classes: vec!["menu-item".into()],
        }
    }

    fn home() -> MenuItem {
        MenuItem {
            title: "Home".into(),
            url: "https://example.com/".into(),
            classes: Vec::new(),
        }
    }

    #[test]
    fn test_auto_menu_flags_appends_other_languages() {
        let item = item("https://example.com/hello/", &["English"]);
        let entries = vec![
            entry("en", "https://example.com/hello/", true),
            entry("de", "https://example.com/hallo/", false),
        ];
        let registry = LanguageRegistry::default();

        let html = auto_menu_flags(
            "<li>Home</li>",
            &Page::new(&item, &entries),
            &registry,
            MenuFlagsDisplay::Column,
        );

        assert_eq!(
            html,
            "<li>Home</li><li class=\"menu-item langlinks-menu-item-language-flags langlinks-flags-column\">\
             <a href=\"https://example.com/hallo/\" class=\"langlinks-menu-flag-link\" title=\"Deutsch\" hreflang=\"de\">🇩🇪</a></li>"
        );
    }

    #[test]
    fn test_auto_menu_flags_needs_two_rows() {
        let item = item("https://example.com/hello/", &[]);
        let entries = vec![entry("de", "https://example.com/hallo/", false)];
        let registry = LanguageRegistry::default();
        assert_eq!(
            auto_menu_flags("<li>Home</li>", &Page::new(&item, &entries), &registry, MenuFlagsDisplay::Row),
            "<li>Home</li>"
        );
    }

    #[test]
    fn test_placeholder_replaced_or_removed() {
        let item = item("https://example.com/hello/", &["English"]);
        let entries = vec![
            entry("en", "https://example.com/hello/", true),
            entry("de", "https://example.com/hallo/", false),
        ];
        let registry = LanguageRegistry::default();
        let page = Page::new(&item, &entries);

        let replaced = replace_menu_placeholder(
            vec![home(), placeholder()],
            Some(&page),
            &registry,
            MenuFlagsDisplay::Row,
        );
        assert_eq!(replaced.len(), 2);
        assert_eq!(replaced[1].url, "#");
        assert!(replaced[1].title.starts_with("<span class=\"langlinks-menu-flags-wrapper\">"));
        assert!(replaced[1].classes.contains(&"langlinks-language-flags-item".to_string()));

        let removed =
            replace_menu_placeholder(vec![home(), placeholder()], None, &registry, MenuFlagsDisplay::Row);
        assert_eq!(removed, vec![home()]);
    }

    #[test]
    fn test_translate_menu() {
        let mut translations = BTreeMap::new();
        translations.insert("de".to_string(), 12);
        translations.insert("fr".to_string(), 0);
        let menus = vec![menu_translation(10, "en", translations).unwrap()];
        assert!(!menus[0].translations.contains_key("fr"));

        assert_eq!(translate_menu(&menus, 10, "de"), 12);
        assert_eq!(translate_menu(&menus, 12, "de"), 12);
        assert_eq!(translate_menu(&menus, 10, "en"), 10);
        assert_eq!(translate_menu(&menus, 99, "de"), 99);
        assert!(menu_translation(11, " ", BTreeMap::new()).is_none());
    }
}
