//! Typed field settings and the normalization that turns whatever the backend
//! (or an older client) stored into a complete, canonical shape.
//!
//! Each bucket is normalized independently. Normalization never fails: unknown
//! keys are carried through untouched, missing or ill-typed known keys get
//! their documented default.

pub mod advanced;
pub mod appearance;
pub mod validation;

#[cfg(test)]
mod tests;

use crate::model::{FieldType, RawSettings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

pub use advanced::{normalize_advanced, AdvancedSettings, ButtonLayout};
pub use appearance::{
    normalize_appearance, validate_ui_variant, AppearanceSettings, ColorRole, ThemePreset,
    UiVariant,
};
pub use validation::{normalize_validation, ValidationSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsBucket {
    Validation,
    Appearance,
    Advanced,
}

impl SettingsBucket {
    pub const ALL: [SettingsBucket; 3] = [
        SettingsBucket::Validation,
        SettingsBucket::Appearance,
        SettingsBucket::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingsBucket::Validation => "validation",
            SettingsBucket::Appearance => "appearance",
            SettingsBucket::Advanced => "advanced",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SettingsBucket::Validation => "Validation",
            SettingsBucket::Appearance => "Appearance",
            SettingsBucket::Advanced => "Advanced",
        }
    }
}

/// All three buckets for one field, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSettings {
    pub validation: ValidationSettings,
    pub appearance: AppearanceSettings,
    pub advanced: AdvancedSettings,
}

impl FieldSettings {
    pub fn defaults_for(field_type: FieldType) -> Self {
        Self {
            validation: normalize_validation(field_type, &JsonValue::Null),
            appearance: AppearanceSettings::default(),
            advanced: normalize_advanced(field_type, &JsonValue::Null),
        }
    }

    pub fn from_raw(field_type: FieldType, raw: &RawSettings) -> Self {
        Self {
            validation: normalize_validation(
                field_type,
                &JsonValue::Object(raw.validation.clone()),
            ),
            appearance: normalize_appearance(&JsonValue::Object(raw.appearance.clone())),
            advanced: normalize_advanced(field_type, &JsonValue::Object(raw.advanced.clone())),
        }
    }

    /// Wire form. `required` is mirrored into the validation bucket from the
    /// general field flag, which is the only writable copy.
    pub fn to_raw(&self, required: bool) -> RawSettings {
        RawSettings {
            validation: validation_wire(&self.validation, required),
            appearance: object_of(self.appearance.to_json()),
            advanced: object_of(self.advanced.to_json()),
        }
    }

    pub fn bucket_json(&self, bucket: SettingsBucket, required: bool) -> JsonValue {
        match bucket {
            SettingsBucket::Validation => {
                JsonValue::Object(validation_wire(&self.validation, required))
            }
            SettingsBucket::Appearance => self.appearance.to_json(),
            SettingsBucket::Advanced => self.advanced.to_json(),
        }
    }

    pub fn set_bucket(&mut self, bucket: SettingsBucket, field_type: FieldType, raw: &JsonValue) {
        match bucket {
            SettingsBucket::Validation => self.validation = normalize_validation(field_type, raw),
            SettingsBucket::Appearance => self.appearance = normalize_appearance(raw),
            SettingsBucket::Advanced => self.advanced = normalize_advanced(field_type, raw),
        }
    }
}

fn validation_wire(v: &ValidationSettings, required: bool) -> Map<String, JsonValue> {
    let mut obj = object_of(v.to_json());
    obj.insert("required".into(), JsonValue::Bool(required));
    obj
}

/// Normalize one bucket and hand back its canonical JSON.
pub fn normalize_bucket(
    bucket: SettingsBucket,
    field_type: FieldType,
    raw: &JsonValue,
) -> JsonValue {
    match bucket {
        SettingsBucket::Validation => normalize_validation(field_type, raw).to_json(),
        SettingsBucket::Appearance => normalize_appearance(raw).to_json(),
        SettingsBucket::Advanced => normalize_advanced(field_type, raw).to_json(),
    }
}

/// Shallow merge: top-level keys of `partial` replace those in `base`.
pub fn shallow_merge(base: &JsonValue, partial: &JsonValue) -> JsonValue {
    let mut out = object_of(base.clone());
    if let Some(p) = partial.as_object() {
        for (k, v) in p {
            out.insert(k.clone(), v.clone());
        }
    }
    JsonValue::Object(out)
}

// -------- extraction helpers ------------------------------------------------
// Each `take_*` removes the key so whatever is left over is passthrough.

pub(crate) fn object_of(v: JsonValue) -> Map<String, JsonValue> {
    match v {
        JsonValue::Object(m) => m,
        _ => Map::new(),
    }
}

pub(crate) fn take_str(obj: &mut Map<String, JsonValue>, key: &str) -> Option<String> {
    match obj.remove(key)? {
        JsonValue::String(s) => Some(s),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn take_non_empty_str(obj: &mut Map<String, JsonValue>, key: &str) -> Option<String> {
    take_str(obj, key).filter(|s| !s.trim().is_empty())
}

pub(crate) fn take_bool(obj: &mut Map<String, JsonValue>, key: &str) -> Option<bool> {
    match obj.remove(key)? {
        JsonValue::Bool(b) => Some(b),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        },
        JsonValue::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

pub(crate) fn take_f64(obj: &mut Map<String, JsonValue>, key: &str) -> Option<f64> {
    match obj.remove(key)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

pub(crate) fn take_u32(obj: &mut Map<String, JsonValue>, key: &str) -> Option<u32> {
    take_f64(obj, key)
        .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v.round() as u32)
}

pub(crate) fn take_string_list(obj: &mut Map<String, JsonValue>, key: &str) -> Option<Vec<String>> {
    match obj.remove(key)? {
        JsonValue::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|v| match v {
                    JsonValue::String(s) => Some(s),
                    JsonValue::Object(o) => o
                        .get("value")
                        .or_else(|| o.get("label"))
                        .and_then(|x| x.as_str())
                        .map(|s| s.to_string()),
                    JsonValue::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.trim().is_empty())
                .collect(),
        ),
        JsonValue::String(s) => Some(
            s.split(',')
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string())
                .collect(),
        ),
        _ => None,
    }
}

pub(crate) fn is_none_or_empty(v: &Option<String>) -> bool {
    v.as_deref().map(|s| s.is_empty()).unwrap_or(true)
}
