mod content;
mod hreflang;
mod language;
mod menu;
mod translation;

pub use content::{ContentItem, NewContent};
pub use hreflang::{HreflangEntry, HreflangStats, NewHreflang, Priority};
pub use language::{
    default_languages, locale_for, site_locale_language, site_locale_tag, LanguageDescriptor,
    LanguageRegistry,
};
pub use menu::{MenuItem, MenuTranslation};
pub use translation::{FieldTranslation, FieldType, NewFieldTranslation};
