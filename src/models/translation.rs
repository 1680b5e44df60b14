use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a translated field value is sanitized and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Url,
    Email,
    Number,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Url => "url",
            Self::Email => "email",
            Self::Number => "number",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "textarea" | "wysiwyg" => Self::Textarea,
            "url" => Self::Url,
            "email" => Self::Email,
            "number" => Self::Number,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTranslation {
    pub id: i64,
    pub content_id: i64,
    pub field_name: String,
    pub field_type: FieldType,
    pub language_code: String,
    pub value: String,
    pub translation_group: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFieldTranslation {
    pub content_id: i64,
    pub field_name: String,
    pub field_type: FieldType,
    pub language_code: String,
    pub value: String,
    pub translation_group: Option<String>,
}
