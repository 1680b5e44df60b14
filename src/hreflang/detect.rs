use std::collections::BTreeSet;

use crate::models::{ContentItem, LanguageDescriptor, LanguageRegistry};

const VERSION_SUFFIXES: [&str; 2] = ["-version", "_version"];

/// Uppercase each letter that follows a non-letter and lowercase the rest,
/// keeping separators: "serbo-croatian" becomes "Serbo-Croatian".
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut after_letter = false;
    for c in name.chars() {
        if after_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    out
}

/// Every term name that marks content as being in `lang`.
pub fn language_variants(lang: &LanguageDescriptor) -> Vec<String> {
    let base = [
        lang.name.to_lowercase(),
        title_case(&lang.name),
        lang.name.clone(),
        lang.code.clone(),
        lang.code.to_lowercase(),
        lang.code.to_uppercase(),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(base.len() * 3);
    for var in base {
        if var.is_empty() {
            continue;
        }
        for suffixed in std::iter::once(var.clone())
            .chain(VERSION_SUFFIXES.iter().map(|suffix| format!("{var}{suffix}")))
        {
            if !variants.contains(&suffixed) {
                variants.push(suffixed);
            }
        }
    }
    variants
}

fn matches(term_names: &BTreeSet<String>, lang: &LanguageDescriptor) -> bool {
    language_variants(lang)
        .iter()
        .any(|variant| term_names.contains(variant))
}

/// The first registered language whose variants appear among `term_names`.
pub fn detect<'a>(
    term_names: &BTreeSet<String>,
    registry: &'a LanguageRegistry,
) -> Option<&'a LanguageDescriptor> {
    let mut found = registry.iter().filter(|lang| matches(term_names, lang));
    let first = found.next()?;

    let others: Vec<&str> = found.map(|lang| lang.code.as_str()).collect();
    if !others.is_empty() {
        tracing::debug!(
            "Terms {:?} match several languages; using '{}' over {:?}",
            term_names,
            first.code,
            others
        );
    }
    Some(first)
}

/// Language code detected from `term_names`, or `None` when nothing matches.
pub fn detect_language(term_names: &BTreeSet<String>, registry: &LanguageRegistry) -> Option<String> {
    detect(term_names, registry).map(|lang| lang.code.clone())
}

pub fn detect_content_language(item: &ContentItem, registry: &LanguageRegistry) -> Option<String> {
    detect_language(&item.term_names(), registry)
}

/// Detected language, falling back to the configured default code.
pub fn language_or_default(
    item: &ContentItem,
    registry: &LanguageRegistry,
    default_language: &str,
) -> String {
    detect_content_language(item, registry).unwrap_or_else(|| default_language.to_string())
}
