//! One settings editing session for one field. Panels get it by `&mut`; it
//! owns the three typed buckets and knows how to push a bucket to the backend.

use crate::model::{Field, FieldType, RawSettings};
use crate::services::CmsBackend;
use crate::settings::{shallow_merge, FieldSettings, SettingsBucket};
use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Local state changed; the parent should replace its copy of the field.
    LocalSave { field: Field },
    Notice { level: NoticeLevel, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta {
    pub collection_id: String,
    /// Empty until the field exists on the backend.
    pub field_id: String,
    pub field_type: FieldType,
    pub name: String,
    /// The single writable copy of `required`.
    pub required: bool,
}

/// A bucket save ready to run, possibly on another thread.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub bucket: SettingsBucket,
    pub collection_id: String,
    pub field_id: String,
    pub patch: JsonValue,
}

#[derive(Debug, Clone)]
pub struct SettingsSession {
    meta: FieldMeta,
    base: Field,
    settings: FieldSettings,
    saving: [bool; 3],
}

fn slot(bucket: SettingsBucket) -> usize {
    match bucket {
        SettingsBucket::Validation => 0,
        SettingsBucket::Appearance => 1,
        SettingsBucket::Advanced => 2,
    }
}

fn raw_bucket(raw: &RawSettings, bucket: SettingsBucket) -> &Map<String, JsonValue> {
    match bucket {
        SettingsBucket::Validation => &raw.validation,
        SettingsBucket::Appearance => &raw.appearance,
        SettingsBucket::Advanced => &raw.advanced,
    }
}

impl SettingsSession {
    pub fn open(collection_id: &str, field: &Field) -> Self {
        if let Some(flag) = field.settings.validation.get("required").and_then(|v| v.as_bool()) {
            if flag != field.required {
                tracing::info!(
                    field = %field.api_id,
                    general = field.required,
                    validation = flag,
                    "required flags disagree; using the field flag"
                );
            }
        }
        Self {
            meta: FieldMeta {
                collection_id: collection_id.to_string(),
                field_id: field.id.clone(),
                field_type: field.field_type,
                name: field.name.clone(),
                required: field.required,
            },
            base: field.clone(),
            settings: FieldSettings::from_raw(field.field_type, &field.settings),
            saving: [false; 3],
        }
    }

    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    pub fn field_type(&self) -> FieldType {
        self.meta.field_type
    }

    pub fn set_required(&mut self, required: bool) {
        self.meta.required = required;
    }

    pub fn set_name(&mut self, name: &str) {
        self.meta.name = name.to_string();
    }

    /// Called once the backend has assigned an id to a new field.
    pub fn attach(&mut self, field: &Field) {
        self.meta.field_id = field.id.clone();
        self.base = field.clone();
    }

    /// Switch type on an unsaved field. Validation and advanced go back to
    /// the new type's defaults; appearance does not depend on the type.
    pub fn reset_type(&mut self, field_type: FieldType) {
        self.meta.field_type = field_type;
        self.base.field_type = field_type;
        self.base.unknown_tag = None;
        let appearance = std::mem::take(&mut self.settings.appearance);
        self.settings = FieldSettings::defaults_for(field_type);
        self.settings.appearance = appearance;
    }

    /// The field as it currently looks locally.
    pub fn field(&self) -> Field {
        let mut f = self.base.clone();
        f.id = self.meta.field_id.clone();
        f.name = self.meta.name.clone();
        f.field_type = self.meta.field_type;
        f.required = self.meta.required;
        f.settings = self.settings.to_raw(self.meta.required);
        f
    }

    pub fn bucket_json(&self, bucket: SettingsBucket) -> JsonValue {
        self.settings.bucket_json(bucket, self.meta.required)
    }

    /// Shallow-merge `partial` into the bucket, re-normalize, no I/O.
    pub fn update(&mut self, bucket: SettingsBucket, partial: &JsonValue) -> SessionEvent {
        if bucket == SettingsBucket::Validation && partial.get("required").is_some() {
            tracing::debug!("ignoring validation.required; the field flag is canonical");
        }
        let merged = shallow_merge(&self.bucket_json(bucket), partial);
        self.settings.set_bucket(bucket, self.meta.field_type, &merged);
        SessionEvent::LocalSave {
            field: self.field(),
        }
    }

    pub fn update_validation(&mut self, partial: &JsonValue) -> SessionEvent {
        self.update(SettingsBucket::Validation, partial)
    }

    pub fn update_appearance(&mut self, partial: &JsonValue) -> SessionEvent {
        self.update(SettingsBucket::Appearance, partial)
    }

    pub fn update_advanced(&mut self, partial: &JsonValue) -> SessionEvent {
        self.update(SettingsBucket::Advanced, partial)
    }

    pub fn is_saving(&self, bucket: SettingsBucket) -> bool {
        self.saving[slot(bucket)]
    }

    /// Prepare a bucket save. A save already in flight does not block another.
    pub fn begin_save(&mut self, bucket: SettingsBucket) -> Result<SaveRequest> {
        if self.meta.field_id.is_empty() {
            return Err(anyhow!("save the field before saving its {} settings", bucket.as_str()));
        }
        self.saving[slot(bucket)] = true;
        Ok(SaveRequest {
            bucket,
            collection_id: self.meta.collection_id.clone(),
            field_id: self.meta.field_id.clone(),
            patch: json!({ "settings": { bucket.as_str(): self.bucket_json(bucket) } }),
        })
    }

    /// Apply the backend's answer. On success the bucket takes whatever the
    /// server sent back; on failure local edits stay as they are.
    pub fn finish_save(&mut self, bucket: SettingsBucket, result: Result<Field>) -> SessionEvent {
        self.saving[slot(bucket)] = false;
        match result {
            Ok(field) => {
                let returned = raw_bucket(&field.settings, bucket);
                if !returned.is_empty() {
                    self.settings.set_bucket(
                        bucket,
                        self.meta.field_type,
                        &JsonValue::Object(returned.clone()),
                    );
                }
                tracing::info!(
                    field = %self.meta.field_id,
                    bucket = bucket.as_str(),
                    "settings saved"
                );
                SessionEvent::Notice {
                    level: NoticeLevel::Success,
                    text: format!("{} settings saved", bucket.title()),
                }
            }
            Err(e) => {
                tracing::warn!(
                    field = %self.meta.field_id,
                    bucket = bucket.as_str(),
                    error = %format!("{e:#}"),
                    "settings save failed"
                );
                SessionEvent::Notice {
                    level: NoticeLevel::Error,
                    text: format!("Saving {} failed: {e}", bucket.as_str()),
                }
            }
        }
    }

    /// Synchronous save: exactly one `update_field` call.
    pub fn save_to_database(
        &mut self,
        bucket: SettingsBucket,
        backend: &dyn CmsBackend,
    ) -> SessionEvent {
        let req = match self.begin_save(bucket) {
            Ok(r) => r,
            Err(e) => {
                return SessionEvent::Notice {
                    level: NoticeLevel::Error,
                    text: e.to_string(),
                }
            }
        };
        let result = backend.update_field(&req.collection_id, &req.field_id, &req.patch);
        self.finish_save(bucket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryBackend;
    use crate::settings::{UiVariant, ValidationSettings};

    fn open_title(backend: &InMemoryBackend) -> SettingsSession {
        let field = backend.field("col_posts", "fld_title").unwrap();
        SettingsSession::open("col_posts", &field)
    }

    #[test]
    fn local_update_touches_no_backend() {
        let backend = InMemoryBackend::seeded();
        let mut s = open_title(&backend);
        let ev = s.update_appearance(&json!({"uiVariant": "pill"}));
        match ev {
            SessionEvent::LocalSave { field } => {
                assert_eq!(field.settings.appearance.get("uiVariant"), Some(&json!("pill")));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(s.settings().appearance.ui_variant, UiVariant::Pill);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn update_keeps_other_keys_of_the_bucket() {
        let backend = InMemoryBackend::seeded();
        let mut s = open_title(&backend);
        s.update_appearance(&json!({"theme": "modern"}));
        assert!(s.settings().appearance.show_char_count);
        assert_eq!(s.settings().appearance.ui_variant, UiVariant::Material);
    }

    #[test]
    fn save_to_database_makes_exactly_one_update_call() {
        let backend = InMemoryBackend::seeded();
        let mut s = open_title(&backend);
        s.update_appearance(&json!({"uiVariant": "borderless", "width": "50%"}));
        let ev = s.save_to_database(SettingsBucket::Appearance, &backend);
        assert!(matches!(ev, SessionEvent::Notice { level: NoticeLevel::Success, .. }));
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].op, "update_field");
        let payload = calls[0].payload.clone().unwrap();
        assert_eq!(
            payload["settings"]["appearance"],
            s.settings().appearance.to_json()
        );
        assert!(payload["settings"].get("validation").is_none());
        let stored = backend.field("col_posts", "fld_title").unwrap();
        assert_eq!(stored.settings.appearance.get("width"), Some(&json!("50%")));
    }

    #[test]
    fn failed_save_keeps_local_state_and_reports_error() {
        let backend = InMemoryBackend::seeded();
        let mut s = open_title(&backend);
        s.update_validation(&json!({"maxLength": 40}));
        let before = s.settings().clone();
        backend.fail_next("503 unavailable");
        let ev = s.save_to_database(SettingsBucket::Validation, &backend);
        match ev {
            SessionEvent::Notice { level, text } => {
                assert_eq!(level, NoticeLevel::Error);
                assert!(text.contains("503"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(s.settings(), &before);
        assert!(!s.is_saving(SettingsBucket::Validation));
    }

    #[test]
    fn begin_save_marks_in_flight_and_allows_a_second_save() {
        let backend = InMemoryBackend::seeded();
        let mut s = open_title(&backend);
        let a = s.begin_save(SettingsBucket::Advanced).unwrap();
        assert!(s.is_saving(SettingsBucket::Advanced));
        let b = s.begin_save(SettingsBucket::Advanced).unwrap();
        assert_eq!(a, b);
        let result = backend.update_field(&b.collection_id, &b.field_id, &b.patch);
        s.finish_save(SettingsBucket::Advanced, result);
        assert!(!s.is_saving(SettingsBucket::Advanced));
    }

    #[test]
    fn unsaved_field_cannot_save_a_bucket() {
        let backend = InMemoryBackend::seeded();
        let mut s = SettingsSession::open("col_posts", &Field {
            name: "Draft".into(),
            ..Default::default()
        });
        let ev = s.save_to_database(SettingsBucket::Appearance, &backend);
        assert!(matches!(ev, SessionEvent::Notice { level: NoticeLevel::Error, .. }));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn required_comes_from_the_field_flag() {
        let backend = InMemoryBackend::seeded();
        let mut s = open_title(&backend);
        s.update_validation(&json!({"required": false}));
        assert_eq!(s.bucket_json(SettingsBucket::Validation)["required"], json!(true));
        s.set_required(false);
        assert_eq!(s.field().settings.validation.get("required"), Some(&json!(false)));
    }

    #[test]
    fn reset_type_restores_defaults_but_keeps_appearance() {
        let mut s = SettingsSession::open("col_posts", &Field {
            name: "Code".into(),
            field_type: FieldType::Text,
            ..Default::default()
        });
        s.update_validation(&json!({"minLength": 4}));
        s.update_appearance(&json!({"uiVariant": "pill", "width": "50%"}));
        s.reset_type(FieldType::Otp);
        assert!(matches!(s.settings().validation, ValidationSettings::Otp(_)));
        assert_eq!(s.field().field_type, FieldType::Otp);
        assert_eq!(s.settings().appearance.ui_variant, UiVariant::Pill);
        assert_eq!(s.settings().appearance.width, "50%");
    }
}
