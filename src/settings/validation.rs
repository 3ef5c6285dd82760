use super::{
    object_of, take_bool, take_f64, take_non_empty_str, take_string_list, take_u32,
};
use crate::model::FieldType;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

pub const OTP_DEFAULT_LENGTH: u32 = 6;
pub const OTP_MIN_LENGTH: u32 = 4;
pub const OTP_MAX_LENGTH: u32 = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

// min <= max is not checked anywhere; see DESIGN.md open questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    pub integer_only: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpValidation {
    pub length: u32,
    pub numeric_only: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for OtpValidation {
    fn default() -> Self {
        Self {
            length: OTP_DEFAULT_LENGTH,
            numeric_only: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size_mb: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_types: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Validation bucket, one variant per family of field types.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationSettings {
    Text(TextValidation),
    Number(NumberValidation),
    Date(DateValidation),
    Otp(OtpValidation),
    Items(ItemsValidation),
    Media(MediaValidation),
    Generic(Map<String, JsonValue>),
}

impl ValidationSettings {
    pub fn to_json(&self) -> JsonValue {
        let v = match self {
            ValidationSettings::Text(s) => serde_json::to_value(s),
            ValidationSettings::Number(s) => serde_json::to_value(s),
            ValidationSettings::Date(s) => serde_json::to_value(s),
            ValidationSettings::Otp(s) => serde_json::to_value(s),
            ValidationSettings::Items(s) => serde_json::to_value(s),
            ValidationSettings::Media(s) => serde_json::to_value(s),
            ValidationSettings::Generic(m) => Ok(JsonValue::Object(m.clone())),
        };
        v.unwrap_or_else(|_| JsonValue::Object(Map::new()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Text,
    Number,
    Date,
    Otp,
    Items,
    Media,
    Generic,
}

fn family_of(field_type: FieldType) -> Family {
    use FieldType as F;
    match field_type {
        F::Text
        | F::Textarea
        | F::RichText
        | F::Markdown
        | F::Email
        | F::Password
        | F::Url
        | F::Phone
        | F::Slug
        | F::Mask
        | F::Autocomplete
        | F::Unknown => Family::Text,
        F::Number
        | F::Decimal
        | F::Currency
        | F::Percentage
        | F::Range
        | F::Rating => Family::Number,
        F::Date | F::Datetime | F::Time | F::Daterange => Family::Date,
        F::Otp => Family::Otp,
        F::Multiselect | F::CheckboxGroup | F::Tags | F::Repeater => Family::Items,
        F::Media | F::File | F::Gallery => Family::Media,
        F::Blocks
        | F::Uuid
        | F::Boolean
        | F::Toggle
        | F::Select
        | F::Radio
        | F::Color
        | F::Icon
        | F::Relation
        | F::Component
        | F::Json
        | F::Map => Family::Generic,
    }
}

pub fn normalize_validation(field_type: FieldType, raw: &JsonValue) -> ValidationSettings {
    let mut obj = object_of(raw.clone());
    // The general field flag owns `required`; the copy in this bucket is derived.
    if let Some(req) = obj.remove("required") {
        tracing::trace!(?req, "dropping validation.required in favour of the field flag");
    }
    match family_of(field_type) {
        Family::Text => {
            let mut s = TextValidation {
                min_length: take_u32(&mut obj, "minLength"),
                max_length: take_u32(&mut obj, "maxLength"),
                pattern: take_non_empty_str(&mut obj, "pattern"),
                pattern_message: take_non_empty_str(&mut obj, "patternMessage"),
                ..Default::default()
            };
            s.extra = obj;
            ValidationSettings::Text(s)
        }
        Family::Number => {
            let mut s = NumberValidation {
                min: take_f64(&mut obj, "min"),
                max: take_f64(&mut obj, "max"),
                step: take_f64(&mut obj, "step").filter(|v| *v > 0.0),
                integer_only: take_bool(&mut obj, "integerOnly").unwrap_or(false),
                ..Default::default()
            };
            s.extra = obj;
            ValidationSettings::Number(s)
        }
        Family::Date => {
            let mut s = DateValidation {
                min_date: take_non_empty_str(&mut obj, "minDate"),
                max_date: take_non_empty_str(&mut obj, "maxDate"),
                ..Default::default()
            };
            s.extra = obj;
            ValidationSettings::Date(s)
        }
        Family::Otp => {
            // An out-of-range length is kept as-is; the form rejects it at submit.
            let mut s = OtpValidation {
                length: take_u32(&mut obj, "length").unwrap_or(OTP_DEFAULT_LENGTH),
                numeric_only: take_bool(&mut obj, "numericOnly").unwrap_or(true),
                ..Default::default()
            };
            s.extra = obj;
            ValidationSettings::Otp(s)
        }
        Family::Items => {
            let mut s = ItemsValidation {
                min_items: take_u32(&mut obj, "minItems"),
                max_items: take_u32(&mut obj, "maxItems"),
                ..Default::default()
            };
            s.extra = obj;
            ValidationSettings::Items(s)
        }
        Family::Media => {
            let mut s = MediaValidation {
                max_size_mb: take_f64(&mut obj, "maxSizeMb").filter(|v| *v > 0.0),
                allowed_types: take_string_list(&mut obj, "allowedTypes").unwrap_or_default(),
                ..Default::default()
            };
            s.extra = obj;
            ValidationSettings::Media(s)
        }
        Family::Generic => ValidationSettings::Generic(obj),
    }
}
