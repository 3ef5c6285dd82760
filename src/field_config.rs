//! Field type selection and the four-tab configuration panel, as a plain state
//! machine. The UI drives it; backend calls are either made directly
//! (`save`, `confirm_delete`) or split into request/finish pairs so they can
//! run on a worker thread.

use crate::model::{derive_api_id, Field, FieldType};
use crate::services::CmsBackend;
use crate::session::{NoticeLevel, SessionEvent, SettingsSession};
use crate::settings::{
    validation::{OTP_MAX_LENGTH, OTP_MIN_LENGTH},
    ValidationSettings,
};
use anyhow::Result;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTab {
    General,
    Validation,
    Appearance,
    Advanced,
}

impl ConfigTab {
    pub const ALL: [ConfigTab; 4] = [
        ConfigTab::General,
        ConfigTab::Validation,
        ConfigTab::Appearance,
        ConfigTab::Advanced,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ConfigTab::General => "General",
            ConfigTab::Validation => "Validation",
            ConfigTab::Appearance => "Appearance",
            ConfigTab::Advanced => "Advanced",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Browsing,
    ConfiguringNew { field_type: FieldType },
    EditingExisting { field_id: String, field_type: FieldType },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralSettings {
    pub name: String,
    pub api_id: String,
    pub description: String,
    pub help_text: String,
    pub placeholder: String,
    pub required: bool,
}

impl GeneralSettings {
    fn from_field(f: &Field) -> Self {
        Self {
            name: f.name.clone(),
            api_id: f.api_id.clone(),
            description: f.description.clone(),
            help_text: f.help_text.clone(),
            placeholder: f.placeholder.clone(),
            required: f.required,
        }
    }

    /// Set the display name. The api id follows it only while the api id is empty.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        if self.api_id.trim().is_empty() {
            self.api_id = derive_api_id(name);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldFormError {
    #[error("Name must be at least 2 characters")]
    NameTooShort,
    #[error("API ID must start with a letter and contain only letters, digits and _")]
    InvalidApiId,
    #[error("Code length must be between 4 and 12 (got {0})")]
    OtpLength(u32),
    #[error("Pattern is not a valid regular expression: {0}")]
    BadPattern(String),
}

impl FieldFormError {
    /// Form key the error is shown next to.
    pub fn key(&self) -> &'static str {
        match self {
            FieldFormError::NameTooShort => "name",
            FieldFormError::InvalidApiId => "apiId",
            FieldFormError::OtpLength(_) => "length",
            FieldFormError::BadPattern(_) => "pattern",
        }
    }

    pub fn tab(&self) -> ConfigTab {
        match self {
            FieldFormError::NameTooShort | FieldFormError::InvalidApiId => ConfigTab::General,
            FieldFormError::OtpLength(_) | FieldFormError::BadPattern(_) => ConfigTab::Validation,
        }
    }
}

fn api_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("static regex"))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRequest {
    Create {
        collection_id: String,
        payload: JsonValue,
        /// Draft the create was submitted from; see `FieldEditor::draft`.
        draft: u64,
    },
    Update {
        collection_id: String,
        field_id: String,
        payload: JsonValue,
    },
}

#[derive(Debug, Clone)]
pub struct FieldEditor {
    collection_id: String,
    mode: EditorMode,
    pub tab: ConfigTab,
    pub general: GeneralSettings,
    session: Option<SettingsSession>,
    errors: Vec<FieldFormError>,
    delete_pending: bool,
    draft: u64,
}

impl FieldEditor {
    pub fn new(collection_id: &str) -> Self {
        Self {
            collection_id: collection_id.to_string(),
            mode: EditorMode::Browsing,
            tab: ConfigTab::General,
            general: GeneralSettings::default(),
            session: None,
            errors: Vec::new(),
            delete_pending: false,
            draft: 0,
        }
    }

    /// Bumped whenever the editor starts on a different field, so a create
    /// reply can be matched to the draft it was submitted from.
    pub fn draft(&self) -> u64 {
        self.draft
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn field_type(&self) -> Option<FieldType> {
        match &self.mode {
            EditorMode::Browsing => None,
            EditorMode::ConfiguringNew { field_type }
            | EditorMode::EditingExisting { field_type, .. } => Some(*field_type),
        }
    }

    pub fn session(&self) -> Option<&SettingsSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut SettingsSession> {
        self.session.as_mut()
    }

    pub fn error_for(&self, key: &str) -> Option<&FieldFormError> {
        self.errors.iter().find(|e| e.key() == key)
    }

    pub fn is_delete_pending(&self) -> bool {
        self.delete_pending
    }

    /// Pick a type. Starts a new field from Browsing, swaps the type of an
    /// unsaved field, and is refused once the field exists.
    pub fn select_type(&mut self, field_type: FieldType) -> Result<(), SessionEvent> {
        match &self.mode {
            EditorMode::EditingExisting { field_type: current, .. } => {
                tracing::debug!(
                    current = current.tag(),
                    requested = field_type.tag(),
                    "type change refused"
                );
                Err(SessionEvent::Notice {
                    level: NoticeLevel::Error,
                    text: "The type of an existing field cannot be changed".into(),
                })
            }
            EditorMode::ConfiguringNew { .. } => {
                if let Some(s) = self.session.as_mut() {
                    s.reset_type(field_type);
                }
                self.mode = EditorMode::ConfiguringNew { field_type };
                self.errors.clear();
                Ok(())
            }
            EditorMode::Browsing => {
                let blank = Field {
                    field_type,
                    ..Default::default()
                };
                let mut session = SettingsSession::open(&self.collection_id, &blank);
                session.reset_type(field_type);
                self.session = Some(session);
                self.draft += 1;
                self.general = GeneralSettings::default();
                self.tab = ConfigTab::General;
                self.errors.clear();
                self.mode = EditorMode::ConfiguringNew { field_type };
                Ok(())
            }
        }
    }

    pub fn open_existing(&mut self, field: &Field) {
        self.draft += 1;
        self.general = GeneralSettings::from_field(field);
        self.session = Some(SettingsSession::open(&self.collection_id, field));
        self.mode = EditorMode::EditingExisting {
            field_id: field.id.clone(),
            field_type: field.field_type,
        };
        self.tab = ConfigTab::General;
        self.errors.clear();
        self.delete_pending = false;
    }

    pub fn set_tab(&mut self, tab: ConfigTab) {
        self.tab = tab;
    }

    pub fn set_name(&mut self, name: &str) {
        self.general.set_name(name);
        if let Some(s) = self.session.as_mut() {
            s.set_name(name.trim());
        }
    }

    pub fn set_required(&mut self, required: bool) {
        self.general.required = required;
        if let Some(s) = self.session.as_mut() {
            s.set_required(required);
        }
    }

    /// Submit-time checks. Errors are kept for inline display.
    pub fn validate(&mut self) -> Result<(), Vec<FieldFormError>> {
        let mut errors = Vec::new();
        if self.general.name.trim().chars().count() < 2 {
            errors.push(FieldFormError::NameTooShort);
        }
        if !api_id_re().is_match(self.general.api_id.trim()) {
            errors.push(FieldFormError::InvalidApiId);
        }
        if let Some(s) = &self.session {
            match &s.settings().validation {
                ValidationSettings::Otp(o)
                    if !(OTP_MIN_LENGTH..=OTP_MAX_LENGTH).contains(&o.length) =>
                {
                    errors.push(FieldFormError::OtpLength(o.length));
                }
                ValidationSettings::Text(t) => {
                    if let Some(p) = t.pattern.as_deref().filter(|p| !p.is_empty()) {
                        if let Err(e) = Regex::new(p) {
                            errors.push(FieldFormError::BadPattern(e.to_string()));
                        }
                    }
                }
                _ => {}
            }
        }
        self.errors = errors.clone();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The complete field as it would be sent to the backend.
    pub fn compose(&self) -> Option<Field> {
        let session = self.session.as_ref()?;
        let mut f = session.field();
        f.name = self.general.name.trim().to_string();
        f.api_id = self.general.api_id.trim().to_string();
        f.description = self.general.description.clone();
        f.help_text = self.general.help_text.clone();
        f.placeholder = self.general.placeholder.clone();
        f.required = self.general.required;
        f.settings = session.settings().to_raw(self.general.required);
        Some(f)
    }

    /// Validate and build the backend request for Save / Update Field.
    pub fn submit(&mut self) -> Result<SubmitRequest, Vec<FieldFormError>> {
        self.validate()?;
        let Some(field) = self.compose() else {
            return Err(Vec::new());
        };
        let mut payload = serde_json::to_value(&field).unwrap_or(JsonValue::Null);
        Ok(match &self.mode {
            EditorMode::EditingExisting { field_id, .. } => SubmitRequest::Update {
                collection_id: self.collection_id.clone(),
                field_id: field_id.clone(),
                payload,
            },
            _ => {
                if let Some(obj) = payload.as_object_mut() {
                    obj.remove("id");
                }
                SubmitRequest::Create {
                    collection_id: self.collection_id.clone(),
                    payload,
                    draft: self.draft,
                }
            }
        })
    }

    pub fn finish_submit(&mut self, result: Result<Field>) -> SessionEvent {
        match result {
            Ok(field) => {
                let created = matches!(self.mode, EditorMode::ConfiguringNew { .. });
                if let Some(s) = self.session.as_mut() {
                    s.attach(&field);
                }
                self.general.api_id = field.api_id.clone();
                self.mode = EditorMode::EditingExisting {
                    field_id: field.id.clone(),
                    field_type: field.field_type,
                };
                tracing::info!(field = %field.id, created, "field saved");
                SessionEvent::Notice {
                    level: NoticeLevel::Success,
                    text: if created {
                        format!("Field '{}' created", field.name)
                    } else {
                        format!("Field '{}' updated", field.name)
                    },
                }
            }
            Err(e) => SessionEvent::Notice {
                level: NoticeLevel::Error,
                text: format!("Saving field failed: {e}"),
            },
        }
    }

    pub fn save(&mut self, backend: &dyn CmsBackend) -> Result<SessionEvent, Vec<FieldFormError>> {
        let req = self.submit()?;
        let result = match &req {
            SubmitRequest::Create {
                collection_id,
                payload,
                ..
            } => backend.create_field(collection_id, payload),
            SubmitRequest::Update {
                collection_id,
                field_id,
                payload,
            } => backend.update_field(collection_id, field_id, payload),
        };
        Ok(self.finish_submit(result))
    }

    /// First step of delete; only existing fields can be deleted.
    pub fn request_delete(&mut self) -> bool {
        self.delete_pending = matches!(self.mode, EditorMode::EditingExisting { .. });
        self.delete_pending
    }

    pub fn cancel_delete(&mut self) {
        self.delete_pending = false;
    }

    /// Consume the pending confirmation and hand out what to delete.
    pub fn take_delete_request(&mut self) -> Option<(String, String)> {
        if !self.delete_pending {
            return None;
        }
        self.delete_pending = false;
        match &self.mode {
            EditorMode::EditingExisting { field_id, .. } => {
                Some((self.collection_id.clone(), field_id.clone()))
            }
            _ => None,
        }
    }

    pub fn finish_delete(&mut self, result: Result<()>) -> SessionEvent {
        match result {
            Ok(()) => {
                let name = self.general.name.clone();
                self.cancel();
                SessionEvent::Notice {
                    level: NoticeLevel::Success,
                    text: format!("Field '{name}' deleted"),
                }
            }
            Err(e) => SessionEvent::Notice {
                level: NoticeLevel::Error,
                text: format!("Deleting field failed: {e}"),
            },
        }
    }

    pub fn confirm_delete(&mut self, backend: &dyn CmsBackend) -> Option<SessionEvent> {
        let (collection_id, field_id) = self.take_delete_request()?;
        let result = backend.delete_field(&collection_id, &field_id);
        Some(self.finish_delete(result))
    }

    pub fn cancel(&mut self) {
        self.draft += 1;
        self.mode = EditorMode::Browsing;
        self.session = None;
        self.general = GeneralSettings::default();
        self.tab = ConfigTab::General;
        self.errors.clear();
        self.delete_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryBackend;
    use crate::settings::SettingsBucket;
    use serde_json::json;

    #[test]
    fn api_id_is_derived_only_while_empty() {
        let mut g = GeneralSettings::default();
        g.set_name("Hero Title");
        assert_eq!(g.api_id, "hero_title");
        g.set_name("Something else");
        assert_eq!(g.api_id, "hero_title");
        g.api_id.clear();
        g.set_name("Fresh");
        assert_eq!(g.api_id, "fresh");
    }

    #[test]
    fn select_type_moves_from_browsing_and_resets_buckets() {
        let mut ed = FieldEditor::new("col_posts");
        ed.select_type(FieldType::Text).unwrap();
        assert_eq!(ed.mode(), &EditorMode::ConfiguringNew { field_type: FieldType::Text });
        ed.session_mut()
            .unwrap()
            .update_validation(&json!({"minLength": 5}));
        ed.select_type(FieldType::Otp).unwrap();
        assert!(matches!(
            ed.session().unwrap().settings().validation,
            ValidationSettings::Otp(_)
        ));
    }

    #[test]
    fn type_is_locked_for_existing_fields() {
        let backend = InMemoryBackend::seeded();
        let mut ed = FieldEditor::new("col_posts");
        ed.open_existing(&backend.field("col_posts", "fld_title").unwrap());
        let err = ed.select_type(FieldType::Number).unwrap_err();
        assert!(matches!(err, SessionEvent::Notice { level: NoticeLevel::Error, .. }));
        assert_eq!(ed.field_type(), Some(FieldType::Text));
    }

    #[test]
    fn switching_tabs_keeps_every_bucket() {
        let mut ed = FieldEditor::new("col_posts");
        ed.select_type(FieldType::Text).unwrap();
        ed.set_name("Headline");
        ed.session_mut().unwrap().update_appearance(&json!({"uiVariant": "pill"}));
        for tab in ConfigTab::ALL {
            ed.set_tab(tab);
        }
        ed.set_tab(ConfigTab::General.prev());
        assert_eq!(ed.tab, ConfigTab::Advanced);
        let f = ed.compose().unwrap();
        assert_eq!(f.name, "Headline");
        assert_eq!(f.settings.appearance.get("uiVariant"), Some(&json!("pill")));
    }

    #[test]
    fn validate_reports_errors_inline_and_blocks_submit() {
        let backend = InMemoryBackend::seeded();
        let mut ed = FieldEditor::new("col_posts");
        ed.select_type(FieldType::Otp).unwrap();
        ed.set_name("x");
        ed.general.api_id = "9lives".into();
        ed.session_mut().unwrap().update_validation(&json!({"length": 20}));
        let errs = ed.save(&backend).unwrap_err();
        assert_eq!(errs.len(), 3);
        assert!(ed.error_for("name").is_some());
        assert!(ed.error_for("apiId").is_some());
        assert_eq!(ed.error_for("length"), Some(&FieldFormError::OtpLength(20)));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn bad_pattern_is_rejected_but_min_over_max_is_not() {
        let mut ed = FieldEditor::new("col_posts");
        ed.select_type(FieldType::Text).unwrap();
        ed.set_name("Code");
        ed.session_mut().unwrap().update_validation(&json!({"pattern": "([a-z"}));
        assert!(matches!(ed.validate().unwrap_err()[0], FieldFormError::BadPattern(_)));

        ed.select_type(FieldType::Number).unwrap();
        ed.session_mut().unwrap().update_validation(&json!({"min": 10, "max": 1}));
        assert!(ed.validate().is_ok());
    }

    #[test]
    fn save_creates_then_updates() {
        let backend = InMemoryBackend::seeded();
        let mut ed = FieldEditor::new("col_posts");
        ed.select_type(FieldType::Email).unwrap();
        ed.set_name("Contact email");
        ed.set_required(true);
        let ev = ed.save(&backend).unwrap();
        assert!(matches!(ev, SessionEvent::Notice { level: NoticeLevel::Success, .. }));
        let field_id = match ed.mode() {
            EditorMode::EditingExisting { field_id, .. } => field_id.clone(),
            other => panic!("unexpected {other:?}"),
        };
        let stored = backend.field("col_posts", &field_id).unwrap();
        assert_eq!(stored.api_id, "contact_email");
        assert!(stored.required);
        assert_eq!(stored.settings.validation.get("required"), Some(&json!(true)));

        // bucket saves now have an id to target
        let s = ed.session_mut().unwrap();
        s.update_appearance(&json!({"theme": "playful"}));
        s.save_to_database(SettingsBucket::Appearance, &backend);
        ed.general.description = "Where we reply".into();
        ed.save(&backend).unwrap();
        assert_eq!(backend.call_count("create_field"), 1);
        assert_eq!(backend.call_count("update_field"), 2);
        let stored = backend.field("col_posts", &field_id).unwrap();
        assert_eq!(stored.description, "Where we reply");
        assert_eq!(stored.settings.appearance.get("theme"), Some(&json!("playful")));
    }

    #[test]
    fn delete_needs_confirmation() {
        let backend = InMemoryBackend::seeded();
        let mut ed = FieldEditor::new("col_posts");
        assert!(ed.confirm_delete(&backend).is_none());
        ed.open_existing(&backend.field("col_posts", "fld_code").unwrap());
        assert!(ed.confirm_delete(&backend).is_none());
        assert!(ed.request_delete());
        ed.cancel_delete();
        assert!(ed.confirm_delete(&backend).is_none());
        assert!(backend.calls().is_empty());

        ed.request_delete();
        let ev = ed.confirm_delete(&backend).unwrap();
        assert!(matches!(ev, SessionEvent::Notice { level: NoticeLevel::Success, .. }));
        assert_eq!(ed.mode(), &EditorMode::Browsing);
        assert!(backend.field("col_posts", "fld_code").is_none());
    }

    #[test]
    fn failed_delete_keeps_the_editor_open() {
        let backend = InMemoryBackend::seeded();
        let mut ed = FieldEditor::new("col_posts");
        ed.open_existing(&backend.field("col_posts", "fld_code").unwrap());
        ed.request_delete();
        backend.fail_next("locked");
        let ev = ed.confirm_delete(&backend).unwrap();
        assert!(matches!(ev, SessionEvent::Notice { level: NoticeLevel::Error, .. }));
        assert!(matches!(ed.mode(), EditorMode::EditingExisting { .. }));
    }

    #[test]
    fn saving_a_field_of_unknown_type_keeps_its_tag() {
        let backend = InMemoryBackend::seeded();
        let created = backend
            .create_field(
                "col_posts",
                &json!({"name": "Where", "apiId": "where", "type": "geo_point"}),
            )
            .unwrap();
        let mut ed = FieldEditor::new("col_posts");
        ed.open_existing(&created);
        ed.set_name("Location");
        ed.save(&backend).unwrap();

        let sent = backend.calls().last().unwrap().payload.clone().unwrap();
        assert_eq!(sent["type"], "geo_point");
        let stored = backend.field("col_posts", &created.id).unwrap();
        assert_eq!(stored.type_tag(), "geo_point");
        assert_eq!(stored.name, "Location");
    }

    #[test]
    fn cancel_returns_to_browsing() {
        let mut ed = FieldEditor::new("col_posts");
        ed.select_type(FieldType::Slug).unwrap();
        ed.cancel();
        assert_eq!(ed.mode(), &EditorMode::Browsing);
        assert!(ed.session().is_none());
    }
}
