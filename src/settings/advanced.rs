use super::{
    is_none_or_empty, object_of, take_bool, take_non_empty_str, take_str, take_string_list,
    take_u32,
};
use crate::model::FieldType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ButtonLayout {
    #[default]
    Stacked,
    Horizontal,
    Vertical,
}

impl ButtonLayout {
    pub const ALL: [ButtonLayout; 3] = [
        ButtonLayout::Stacked,
        ButtonLayout::Horizontal,
        ButtonLayout::Vertical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ButtonLayout::Stacked => "stacked",
            ButtonLayout::Horizontal => "horizontal",
            ButtonLayout::Vertical => "vertical",
        }
    }

    fn parse(raw: &str) -> ButtonLayout {
        ButtonLayout::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == raw)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAdvanced {
    #[serde(skip_serializing_if = "is_none_or_empty")]
    pub input_mask: Option<String>,
    #[serde(skip_serializing_if = "is_none_or_empty")]
    pub autocomplete: Option<String>,
    pub trim: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberAdvanced {
    #[serde(skip_serializing_if = "is_none_or_empty")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "is_none_or_empty")]
    pub suffix: Option<String>,
    pub locale: String,
    #[serde(skip_serializing_if = "is_none_or_empty")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
    pub use_grouping: bool,
    pub show_buttons: bool,
    pub button_layout: ButtonLayout,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAdvanced {
    pub date_format: String,
    pub allow_range_selection: bool,
    pub show_time: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationAdvanced {
    #[serde(skip_serializing_if = "is_none_or_empty")]
    pub target_collection: Option<String>,
    pub multiple: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceAdvanced {
    pub options: Vec<String>,
    pub allow_custom: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvancedSettings {
    Text(TextAdvanced),
    Number(NumberAdvanced),
    Date(DateAdvanced),
    Relation(RelationAdvanced),
    Choice(ChoiceAdvanced),
    Generic(Map<String, JsonValue>),
}

impl AdvancedSettings {
    pub fn to_json(&self) -> JsonValue {
        let v = match self {
            AdvancedSettings::Text(s) => serde_json::to_value(s),
            AdvancedSettings::Number(s) => serde_json::to_value(s),
            AdvancedSettings::Date(s) => serde_json::to_value(s),
            AdvancedSettings::Relation(s) => serde_json::to_value(s),
            AdvancedSettings::Choice(s) => serde_json::to_value(s),
            AdvancedSettings::Generic(m) => Ok(JsonValue::Object(m.clone())),
        };
        v.unwrap_or_else(|_| JsonValue::Object(Map::new()))
    }
}

pub const DEFAULT_LOCALE: &str = "en-US";

fn default_date_format(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Datetime => "yyyy-MM-dd HH:mm",
        FieldType::Time => "HH:mm",
        _ => "yyyy-MM-dd",
    }
}

pub fn normalize_advanced(field_type: FieldType, raw: &JsonValue) -> AdvancedSettings {
    use FieldType as F;
    let mut obj = object_of(raw.clone());
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
        | F::Otp
        | F::Unknown => {
            let mut s = TextAdvanced {
                input_mask: take_non_empty_str(&mut obj, "inputMask"),
                autocomplete: take_non_empty_str(&mut obj, "autocomplete"),
                trim: take_bool(&mut obj, "trim").unwrap_or(true),
                extra: Map::new(),
            };
            s.extra = obj;
            AdvancedSettings::Text(s)
        }
        F::Number | F::Decimal | F::Currency | F::Percentage | F::Range | F::Rating => {
            let default_currency = (field_type == F::Currency).then(|| "USD".to_string());
            let default_suffix = (field_type == F::Percentage).then(|| "%".to_string());
            let default_places = match field_type {
                F::Currency | F::Decimal => Some(2),
                _ => None,
            };
            let mut s = NumberAdvanced {
                prefix: take_non_empty_str(&mut obj, "prefix"),
                suffix: take_non_empty_str(&mut obj, "suffix").or(default_suffix),
                locale: take_non_empty_str(&mut obj, "locale")
                    .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
                currency: take_non_empty_str(&mut obj, "currency").or(default_currency),
                decimal_places: take_u32(&mut obj, "decimalPlaces").or(default_places),
                use_grouping: take_bool(&mut obj, "useGrouping").unwrap_or(true),
                show_buttons: take_bool(&mut obj, "showButtons").unwrap_or(false),
                button_layout: take_str(&mut obj, "buttonLayout")
                    .map(|b| ButtonLayout::parse(&b))
                    .unwrap_or_default(),
                extra: Map::new(),
            };
            s.extra = obj;
            AdvancedSettings::Number(s)
        }
        F::Date | F::Datetime | F::Time | F::Daterange => {
            let mut s = DateAdvanced {
                date_format: take_non_empty_str(&mut obj, "dateFormat")
                    .unwrap_or_else(|| default_date_format(field_type).to_string()),
                allow_range_selection: take_bool(&mut obj, "allowRangeSelection")
                    .unwrap_or(field_type == F::Daterange),
                show_time: take_bool(&mut obj, "showTime").unwrap_or(field_type == F::Datetime),
                extra: Map::new(),
            };
            s.extra = obj;
            AdvancedSettings::Date(s)
        }
        F::Relation => {
            let mut s = RelationAdvanced {
                target_collection: take_non_empty_str(&mut obj, "targetCollection"),
                multiple: take_bool(&mut obj, "multiple").unwrap_or(false),
                extra: Map::new(),
            };
            s.extra = obj;
            AdvancedSettings::Relation(s)
        }
        F::Select | F::Multiselect | F::Radio | F::CheckboxGroup | F::Tags | F::Autocomplete => {
            let mut s = ChoiceAdvanced {
                options: take_string_list(&mut obj, "options").unwrap_or_default(),
                allow_custom: take_bool(&mut obj, "allowCustom").unwrap_or(field_type == F::Tags),
                extra: Map::new(),
            };
            s.extra = obj;
            AdvancedSettings::Choice(s)
        }
        F::Blocks
        | F::Uuid
        | F::Boolean
        | F::Toggle
        | F::Color
        | F::Icon
        | F::Media
        | F::File
        | F::Gallery
        | F::Component
        | F::Repeater
        | F::Json
        | F::Map => AdvancedSettings::Generic(obj),
    }
}
