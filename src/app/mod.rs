//! Message/effect reducer. `update` only touches `AppState`; anything that
//! blocks (backend calls, the clipboard) comes back out as an `Effect` for
//! the UI loop to run.

mod keys;
pub mod modals;

use crate::field_config::{ConfigTab, EditorMode, FieldEditor};
use crate::services::jobs::{JobMsg, JobOutput, JobRequest};
use crate::session::{NoticeLevel, SessionEvent};
use crate::settings::SettingsBucket;
use crate::ui::{AppState, Section, ToastLevel, View};
use crossterm::event::KeyEvent;

pub enum AppMsg {
    Key(KeyEvent),
    Job(JobMsg),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RunJob(JobRequest),
    ShowToast {
        text: String,
        level: ToastLevel,
        seconds: u64,
    },
    CopyToClipboard(String),
    Quit,
}

pub fn update(state: &mut AppState, msg: AppMsg) -> Vec<Effect> {
    match msg {
        AppMsg::Key(key) => keys::handle_key(state, key),
        AppMsg::Job(job) => {
            state.in_flight = state.in_flight.saturating_sub(1);
            state.dbg(format!(
                "{} -> {}",
                job.request.label(),
                if job.outcome.is_ok() { "ok" } else { "error" }
            ));
            match job.outcome {
                Ok(out) => job_done(state, out),
                Err(e) => job_failed(state, job.request, e),
            }
        }
    }
}

pub(crate) fn toast(text: impl Into<String>, level: ToastLevel) -> Effect {
    let seconds = match level {
        ToastLevel::Error => 5,
        _ => 3,
    };
    Effect::ShowToast {
        text: text.into(),
        level,
        seconds,
    }
}

/// Notices become toasts; a local save needs nothing from the loop.
pub(crate) fn session_effect(ev: SessionEvent) -> Option<Effect> {
    match ev {
        SessionEvent::LocalSave { field } => {
            tracing::trace!(field = %field.api_id, "local state updated");
            None
        }
        SessionEvent::Notice { level, text } => Some(toast(
            text,
            match level {
                NoticeLevel::Success => ToastLevel::Success,
                NoticeLevel::Error => ToastLevel::Error,
            },
        )),
    }
}

pub(crate) fn editor_field_id(editor: &FieldEditor) -> Option<&str> {
    match editor.mode() {
        EditorMode::EditingExisting { field_id, .. } => Some(field_id.as_str()),
        _ => None,
    }
}

pub(crate) fn bucket_for(tab: ConfigTab) -> Option<SettingsBucket> {
    match tab {
        ConfigTab::General => None,
        ConfigTab::Validation => Some(SettingsBucket::Validation),
        ConfigTab::Appearance => Some(SettingsBucket::Appearance),
        ConfigTab::Advanced => Some(SettingsBucket::Advanced),
    }
}

/// Select a collection and start loading its fields.
pub(crate) fn open_collection(state: &mut AppState, collection_id: &str) -> Vec<Effect> {
    state.current_collection = Some(collection_id.to_string());
    state.editor = FieldEditor::new(collection_id);
    state.fields.clear();
    state.field_cursor = 0;
    state.view = View::Fields;
    vec![Effect::RunJob(JobRequest::FetchFields {
        collection_id: collection_id.to_string(),
    })]
}

fn refresh_fields(state: &AppState) -> Vec<Effect> {
    state
        .current_collection
        .clone()
        .map(|collection_id| Effect::RunJob(JobRequest::FetchFields { collection_id }))
        .into_iter()
        .collect()
}

fn job_done(state: &mut AppState, out: JobOutput) -> Vec<Effect> {
    let mut effects = Vec::new();
    match out {
        JobOutput::Collections(cols) => {
            state.panels.set_collections(
                cols.iter()
                    .map(|c| (c.id.clone(), c.name.clone()))
                    .collect(),
            );
            state.collections = cols;
            state.collection_cursor = state
                .collection_cursor
                .min(state.collections.len().saturating_sub(1));
            let wanted = state.config.default_collection.clone();
            if let (None, Some(id)) = (&state.current_collection, wanted) {
                if state.collections.iter().any(|c| c.id == id) {
                    effects.extend(open_collection(state, &id));
                } else {
                    effects.push(toast(
                        format!("Default collection '{id}' not found"),
                        ToastLevel::Error,
                    ));
                }
            }
        }
        JobOutput::Fields {
            collection_id,
            fields,
        } => {
            // a slow response for a collection we already left
            if state.current_collection.as_deref() == Some(collection_id.as_str()) {
                state.fields = fields;
                state.field_cursor = state.field_cursor.min(state.fields.len().saturating_sub(1));
            }
        }
        JobOutput::Content {
            collection_id,
            items,
        } => {
            if state.current_collection.as_deref() == Some(collection_id.as_str()) {
                state.content = items;
                state.content_cursor = 0;
            }
        }
        JobOutput::Created { field, draft } => {
            // the user may have left this draft and started another one
            let waiting = matches!(state.editor.mode(), EditorMode::ConfiguringNew { .. })
                && state.editor.draft() == draft;
            if waiting {
                let ev = state.editor.finish_submit(Ok(field));
                state.panels.general.form.clear_errors();
                effects.extend(session_effect(ev));
                sync_general_form(state);
            }
            effects.extend(refresh_fields(state));
        }
        JobOutput::Updated {
            field,
            bucket: Some(bucket),
        } => {
            if editor_field_id(&state.editor) == Some(field.id.as_str()) {
                if let Some(session) = state.editor.session_mut() {
                    let ev = session.finish_save(bucket, Ok(field));
                    effects.extend(session_effect(ev));
                }
            }
            effects.extend(refresh_fields(state));
        }
        JobOutput::Updated {
            field,
            bucket: None,
        } => {
            if editor_field_id(&state.editor) == Some(field.id.as_str()) {
                let ev = state.editor.finish_submit(Ok(field));
                effects.extend(session_effect(ev));
                sync_general_form(state);
            }
            effects.extend(refresh_fields(state));
        }
        JobOutput::Deleted { field_id } => {
            if editor_field_id(&state.editor) == Some(field_id.as_str()) {
                let ev = state.editor.finish_delete(Ok(()));
                effects.extend(session_effect(ev));
                if state.view == View::Editor {
                    state.view = View::Fields;
                }
            }
            effects.extend(refresh_fields(state));
        }
    }
    effects
}

fn job_failed(state: &mut AppState, request: JobRequest, err: String) -> Vec<Effect> {
    let mut effects = Vec::new();
    match request {
        JobRequest::UpdateField {
            field_id,
            bucket: Some(bucket),
            ..
        } => {
            if editor_field_id(&state.editor) == Some(field_id.as_str()) {
                if let Some(session) = state.editor.session_mut() {
                    let ev = session.finish_save(bucket, Err(anyhow::anyhow!(err.clone())));
                    effects.extend(session_effect(ev));
                    return effects;
                }
            }
            effects.push(toast(format!("Saving settings failed: {err}"), ToastLevel::Error));
        }
        JobRequest::CreateField { draft, .. } if draft != state.editor.draft() => {
            effects.push(toast(format!("Creating field failed: {err}"), ToastLevel::Error));
        }
        JobRequest::UpdateField { .. } | JobRequest::CreateField { .. } => {
            let ev = state.editor.finish_submit(Err(anyhow::anyhow!(err)));
            effects.extend(session_effect(ev));
        }
        JobRequest::DeleteField { .. } => {
            let ev = state.editor.finish_delete(Err(anyhow::anyhow!(err)));
            effects.extend(session_effect(ev));
        }
        other => {
            effects.push(toast(
                format!("Could not {}: {err}", other.label()),
                ToastLevel::Error,
            ));
        }
    }
    effects
}

/// The backend may rewrite the API id; show what it stored.
fn sync_general_form(state: &mut AppState) {
    let api_id = state.editor.general.api_id.clone();
    if let Some(f) = state.panels.general.form.field_mut("apiId") {
        f.set_text(&api_id);
    }
    crate::widgets::form::capture_initial(&mut state.panels.general.form);
}

/// The section a key press belongs to, for the status bar help line.
pub fn help_text(state: &AppState) -> String {
    if state.confirm.is_some() {
        return "y confirm  n cancel".into();
    }
    if state.modal.is_some() {
        return "↑/↓ move  Enter edit/save  Esc close".into();
    }
    match state.section {
        Section::Fields => match state.view {
            View::Collections => "↑/↓ move  Enter open  r reload  Tab section  q quit".into(),
            View::Fields => "↑/↓ move  Enter edit  n new field  c content  r reload  Esc back".into(),
            View::TypePicker => "↑/↓ move  Enter choose type  Esc back".into(),
            View::Editor => {
                let mut s = String::from(
                    "Tab tab  Enter edit  ^S local  ^D save bucket  ^F save field  ^X delete  p/m preview  t type  Esc close",
                );
                if state.editor.tab == ConfigTab::Appearance {
                    s.push_str("  1-4 sub-tab");
                }
                s
            }
            View::Content => "↑/↓ move  Esc back".into(),
        },
        Section::Components => {
            "↑/↓ move  n new  Enter edit  d delete  / search  f category  Tab section".into()
        }
        Section::Expenses => "↑/↓ move  p add person  n add expense  d remove  Tab section".into(),
        Section::Debug => "Tab section  q quit".into(),
    }
}
