use super::modals::{
    component_draft, component_form, expense_draft, expense_form, person_form, DraftError, Modal,
    ModalKind,
};
use super::{bucket_for, open_collection, session_effect, toast, Effect};
use crate::components::ComponentError;
use crate::expenses::ExpenseError;
use crate::field_config::{ConfigTab, EditorMode, SubmitRequest};
use crate::model::FieldType;
use crate::panels::AppearanceTab;
use crate::services::jobs::JobRequest;
use crate::ui::{visible_components, AppState, Confirm, Section, ToastLevel, View};
use crate::widgets::form::{capture_initial, validate_form, FormOutcome, FormState};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

fn move_cursor(cursor: &mut usize, len: usize, code: KeyCode) {
    match code {
        KeyCode::Up => *cursor = cursor.saturating_sub(1),
        KeyCode::Down if *cursor + 1 < len => *cursor += 1,
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = len.saturating_sub(1),
        _ => {}
    }
}

pub(super) fn handle_key(state: &mut AppState, key: KeyEvent) -> Vec<Effect> {
    if key.kind != KeyEventKind::Press {
        return Vec::new();
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return vec![Effect::Quit];
    }
    if state.confirm.is_some() {
        return confirm_key(state, key);
    }
    if state.modal.is_some() {
        return modal_key(state, key);
    }
    if state.section == Section::Components && state.query_editing {
        query_key(state, key);
        return Vec::new();
    }
    let in_editor = state.section == Section::Fields && state.view == View::Editor;
    // a form in edit mode owns every key
    if in_editor && state.panels.is_editing(state.editor.tab) {
        let outcome = state.panels.form_mut(state.editor.tab).on_key(key);
        return form_outcome(state, outcome);
    }
    match key.code {
        KeyCode::Char('q') if !ctrl => return vec![Effect::Quit],
        KeyCode::Tab | KeyCode::BackTab => {
            let back = key.code == KeyCode::BackTab;
            if in_editor {
                let tab = if back {
                    state.editor.tab.prev()
                } else {
                    state.editor.tab.next()
                };
                state.editor.set_tab(tab);
            } else {
                state.section = if back {
                    state.section.prev()
                } else {
                    state.section.next()
                };
            }
            return Vec::new();
        }
        _ => {}
    }
    match state.section {
        Section::Fields => fields_key(state, key),
        Section::Components => components_key(state, key),
        Section::Expenses => expenses_key(state, key),
        Section::Debug => Vec::new(),
    }
}

fn fields_key(state: &mut AppState, key: KeyEvent) -> Vec<Effect> {
    match state.view {
        View::Collections => match key.code {
            KeyCode::Enter => {
                let Some(id) = state
                    .collections
                    .get(state.collection_cursor)
                    .map(|c| c.id.clone())
                else {
                    return Vec::new();
                };
                open_collection(state, &id)
            }
            KeyCode::Char('r') => vec![Effect::RunJob(JobRequest::FetchCollections)],
            code => {
                move_cursor(&mut state.collection_cursor, state.collections.len(), code);
                Vec::new()
            }
        },
        View::Fields => match key.code {
            KeyCode::Enter => {
                let Some(field) = state.fields.get(state.field_cursor).cloned() else {
                    return Vec::new();
                };
                state.editor.open_existing(&field);
                state.panels.rebuild(&state.editor);
                state.view = View::Editor;
                Vec::new()
            }
            KeyCode::Char('n') => {
                state.editor.cancel();
                state.type_cursor = 0;
                state.view = View::TypePicker;
                Vec::new()
            }
            KeyCode::Char('c') => {
                let Some(collection_id) = state.current_collection.clone() else {
                    return Vec::new();
                };
                state.content.clear();
                state.view = View::Content;
                vec![Effect::RunJob(JobRequest::FetchContent { collection_id })]
            }
            KeyCode::Char('r') => super::refresh_fields(state),
            KeyCode::Esc => {
                state.view = View::Collections;
                Vec::new()
            }
            code => {
                move_cursor(&mut state.field_cursor, state.fields.len(), code);
                Vec::new()
            }
        },
        View::TypePicker => match key.code {
            KeyCode::Enter => {
                let idx = state.type_cursor.min(FieldType::ALL.len() - 1);
                choose_type(state, FieldType::ALL[idx])
            }
            KeyCode::Esc => {
                state.view = if state.editor.session().is_some() {
                    View::Editor
                } else {
                    View::Fields
                };
                Vec::new()
            }
            code => {
                move_cursor(&mut state.type_cursor, FieldType::ALL.len(), code);
                Vec::new()
            }
        },
        View::Editor => editor_key(state, key),
        View::Content => match key.code {
            KeyCode::Esc => {
                state.view = View::Fields;
                Vec::new()
            }
            KeyCode::Char('r') => state
                .current_collection
                .clone()
                .map(|collection_id| Effect::RunJob(JobRequest::FetchContent { collection_id }))
                .into_iter()
                .collect(),
            code => {
                move_cursor(&mut state.content_cursor, state.content.len(), code);
                Vec::new()
            }
        },
    }
}

fn choose_type(state: &mut AppState, field_type: FieldType) -> Vec<Effect> {
    match state.editor.select_type(field_type) {
        Ok(()) => {
            state.panels.rebuild(&state.editor);
            state.view = View::Editor;
            Vec::new()
        }
        Err(ev) => {
            if state.editor.session().is_some() {
                state.view = View::Editor;
            }
            session_effect(ev).into_iter().collect()
        }
    }
}

fn close_editor(state: &mut AppState) {
    state.editor.cancel();
    state.view = View::Fields;
}

fn editor_key(state: &mut AppState, key: KeyEvent) -> Vec<Effect> {
    let tab = state.editor.tab;
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => save_local(state),
            KeyCode::Char('d') => save_bucket(state),
            KeyCode::Char('f') => submit_field(state),
            KeyCode::Char('x') => request_delete(state),
            _ => Vec::new(),
        };
    }
    match key.code {
        KeyCode::Char('p') => {
            state.preview_state = state.preview_state.next();
            return Vec::new();
        }
        KeyCode::Char('m') => {
            state.preview_dark = !state.preview_dark;
            return Vec::new();
        }
        KeyCode::Char('t') => {
            return match state.editor.mode().clone() {
                EditorMode::EditingExisting { .. } => vec![toast(
                    "The type of an existing field cannot be changed",
                    ToastLevel::Error,
                )],
                EditorMode::ConfiguringNew { field_type } => {
                    state.type_cursor = FieldType::ALL
                        .iter()
                        .position(|t| *t == field_type)
                        .unwrap_or(0);
                    state.view = View::TypePicker;
                    Vec::new()
                }
                EditorMode::Browsing => Vec::new(),
            };
        }
        KeyCode::Esc => {
            close_editor(state);
            return Vec::new();
        }
        _ => {}
    }
    if tab == ConfigTab::Appearance {
        if let Some(effects) = appearance_key(state, key) {
            return effects;
        }
    }
    let outcome = state.panels.form_mut(tab).on_key(key);
    form_outcome(state, outcome)
}

/// Sub-tab and snippet keys. `None` means the key was not one of them.
fn appearance_key(state: &mut AppState, key: KeyEvent) -> Option<Vec<Effect>> {
    let snippet_count = state.snippets.all().len();
    let effects = match key.code {
        KeyCode::Char(c @ '1'..='4') => {
            let sub = AppearanceTab::from_digit(c)?;
            let session = state.editor.session()?;
            state.panels.appearance.set_sub(sub, &session.settings().appearance);
            Vec::new()
        }
        KeyCode::Char('[') => {
            state.panels.appearance.move_snippet(-1, snippet_count);
            Vec::new()
        }
        KeyCode::Char(']') => {
            state.panels.appearance.move_snippet(1, snippet_count);
            Vec::new()
        }
        KeyCode::Char('a') => {
            let snippet = state.panels.appearance.selected_snippet(&state.snippets)?;
            let session = state.editor.session_mut()?;
            let ev = state.panels.appearance.apply_snippet(session, &snippet);
            let mut out: Vec<Effect> = session_effect(ev).into_iter().collect();
            out.push(toast(format!("Applied '{}'", snippet.name), ToastLevel::Info));
            out
        }
        KeyCode::Char('s') => {
            let session = state.editor.session()?;
            match state
                .panels
                .appearance
                .save_snippet(session, &mut state.snippets, state.store.as_mut())
            {
                Ok(s) => vec![toast(format!("Saved snippet '{}'", s.name), ToastLevel::Success)],
                Err(e) => vec![toast(format!("{e:#}"), ToastLevel::Error)],
            }
        }
        KeyCode::Char('x') => {
            match state
                .panels
                .appearance
                .delete_snippet(&mut state.snippets, state.store.as_mut())
            {
                Ok(s) => vec![toast(format!("Deleted snippet '{}'", s.name), ToastLevel::Success)],
                Err(e) => vec![toast(format!("{e:#}"), ToastLevel::Error)],
            }
        }
        KeyCode::Char('y') => {
            let css = state
                .editor
                .session()?
                .settings()
                .appearance
                .custom_css
                .clone();
            if css.trim().is_empty() {
                vec![toast("No custom CSS to copy", ToastLevel::Info)]
            } else {
                vec![Effect::CopyToClipboard(css)]
            }
        }
        _ => return None,
    };
    Some(effects)
}

fn form_outcome(state: &mut AppState, outcome: FormOutcome) -> Vec<Effect> {
    match outcome {
        FormOutcome::None => Vec::new(),
        FormOutcome::Changed(_) | FormOutcome::Reset => apply_tab(state, state.editor.tab),
        FormOutcome::Submit => {
            if state.editor.tab == ConfigTab::General {
                submit_field(state)
            } else {
                save_bucket(state)
            }
        }
        FormOutcome::Cancel => {
            close_editor(state);
            Vec::new()
        }
    }
}

fn apply_tab(state: &mut AppState, tab: ConfigTab) -> Vec<Effect> {
    state
        .panels
        .apply(tab, &mut state.editor)
        .and_then(session_effect)
        .into_iter()
        .collect()
}

fn save_local(state: &mut AppState) -> Vec<Effect> {
    let tab = state.editor.tab;
    if state.panels.form(tab).form.has_errors() {
        return vec![toast("Fix the highlighted inputs first", ToastLevel::Error)];
    }
    let mut effects = apply_tab(state, tab);
    capture_initial(&mut state.panels.form_mut(tab).form);
    effects.push(toast(format!("{} saved locally", tab.title()), ToastLevel::Info));
    effects
}

fn save_bucket(state: &mut AppState) -> Vec<Effect> {
    let tab = state.editor.tab;
    let Some(bucket) = bucket_for(tab) else {
        return submit_field(state);
    };
    let mut effects = apply_tab(state, tab);
    let Some(session) = state.editor.session_mut() else {
        return effects;
    };
    match session.begin_save(bucket) {
        Ok(req) => effects.push(Effect::RunJob(JobRequest::UpdateField {
            collection_id: req.collection_id,
            field_id: req.field_id,
            patch: req.patch,
            bucket: Some(req.bucket),
        })),
        Err(e) => effects.push(toast(e.to_string(), ToastLevel::Error)),
    }
    effects
}

fn submit_field(state: &mut AppState) -> Vec<Effect> {
    let mut effects = apply_tab(state, ConfigTab::General);
    match state.editor.submit() {
        Ok(req) => {
            state.panels.show_errors(&[]);
            effects.push(Effect::RunJob(match req {
                SubmitRequest::Create {
                    collection_id,
                    payload,
                    draft,
                } => JobRequest::CreateField {
                    collection_id,
                    payload,
                    draft,
                },
                SubmitRequest::Update {
                    collection_id,
                    field_id,
                    payload,
                } => JobRequest::UpdateField {
                    collection_id,
                    field_id,
                    patch: payload,
                    bucket: None,
                },
            }));
        }
        Err(errors) if errors.is_empty() => {
            effects.push(toast("Nothing to save", ToastLevel::Info));
        }
        Err(errors) => {
            state.panels.show_errors(&errors);
            let first = errors[0].tab();
            state.editor.set_tab(first);
            effects.push(toast(
                format!("{} problem(s) to fix before saving", errors.len()),
                ToastLevel::Error,
            ));
        }
    }
    effects
}

fn request_delete(state: &mut AppState) -> Vec<Effect> {
    if state.editor.request_delete() {
        state.confirm = Some(Confirm::DeleteField {
            name: state.editor.general.name.clone(),
        });
        Vec::new()
    } else {
        vec![toast("Only saved fields can be deleted", ToastLevel::Error)]
    }
}

fn confirm_key(state: &mut AppState, key: KeyEvent) -> Vec<Effect> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            let Some(confirm) = state.confirm.take() else {
                return Vec::new();
            };
            match confirm {
                Confirm::DeleteField { .. } => state
                    .editor
                    .take_delete_request()
                    .map(|(collection_id, field_id)| {
                        Effect::RunJob(JobRequest::DeleteField {
                            collection_id,
                            field_id,
                        })
                    })
                    .into_iter()
                    .collect(),
                Confirm::DeleteComponent(pending) => {
                    match state.components.confirm_delete(state.store.as_mut(), pending) {
                        Ok(c) => {
                            let len = visible_components(state).len();
                            state.component_cursor =
                                state.component_cursor.min(len.saturating_sub(1));
                            vec![toast(
                                format!("Component '{}' deleted", c.name),
                                ToastLevel::Success,
                            )]
                        }
                        Err(e) => vec![toast(e.to_string(), ToastLevel::Error)],
                    }
                }
                Confirm::RemoveExpense { id, description } => {
                    if !state.expenses.remove_expense(&id) {
                        return Vec::new();
                    }
                    state.expense_cursor = state
                        .expense_cursor
                        .min(state.expenses.expenses.len().saturating_sub(1));
                    match state.expenses.persist(state.store.as_mut()) {
                        Ok(()) => vec![toast(
                            format!("Removed '{description}'"),
                            ToastLevel::Success,
                        )],
                        Err(e) => vec![toast(format!("{e:#}"), ToastLevel::Error)],
                    }
                }
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            if let Some(Confirm::DeleteField { .. }) = state.confirm.take() {
                state.editor.cancel_delete();
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn query_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => state.component_query.push(c),
        KeyCode::Backspace => {
            state.component_query.pop();
        }
        KeyCode::Enter | KeyCode::Esc => state.query_editing = false,
        _ => {}
    }
    state.component_cursor = 0;
}

fn components_key(state: &mut AppState, key: KeyEvent) -> Vec<Effect> {
    let visible = visible_components(state);
    let selected = visible.get(state.component_cursor).cloned();
    match key.code {
        KeyCode::Char('n') => {
            state.modal = Some(Modal {
                kind: ModalKind::NewComponent,
                widget: component_form(None),
            });
        }
        KeyCode::Enter | KeyCode::Char('e') => {
            if let Some(id) = selected {
                let widget = component_form(state.components.get(&id));
                state.modal = Some(Modal {
                    kind: ModalKind::EditComponent(id),
                    widget,
                });
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(pending) = selected.and_then(|id| state.components.request_delete(&id)) {
                state.confirm = Some(Confirm::DeleteComponent(pending));
            }
        }
        KeyCode::Char('/') => state.query_editing = true,
        KeyCode::Char('f') => {
            let cats = state.components.categories();
            state.component_category = match &state.component_category {
                None => cats.first().cloned(),
                Some(cur) => cats
                    .iter()
                    .position(|c| c == cur)
                    .and_then(|i| cats.get(i + 1))
                    .cloned(),
            };
            state.component_cursor = 0;
        }
        KeyCode::Esc => {
            state.component_query.clear();
            state.component_category = None;
            state.component_cursor = 0;
        }
        code => move_cursor(&mut state.component_cursor, visible.len(), code),
    }
    Vec::new()
}

fn expenses_key(state: &mut AppState, key: KeyEvent) -> Vec<Effect> {
    match key.code {
        KeyCode::Char('p') => {
            state.modal = Some(Modal {
                kind: ModalKind::AddPerson,
                widget: person_form(),
            });
        }
        KeyCode::Char('n') => {
            if state.expenses.people.is_empty() {
                return vec![toast("Add a person first", ToastLevel::Info)];
            }
            let today = chrono::Local::now().date_naive();
            state.modal = Some(Modal {
                kind: ModalKind::AddExpense,
                widget: expense_form(&state.expenses, today),
            });
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(e) = state.expenses.expenses.get(state.expense_cursor) {
                state.confirm = Some(Confirm::RemoveExpense {
                    id: e.id.clone(),
                    description: e.description.clone(),
                });
            }
        }
        code => move_cursor(&mut state.expense_cursor, state.expenses.expenses.len(), code),
    }
    Vec::new()
}

enum ModalError {
    Field(&'static str, String),
    General(String),
}

impl From<DraftError> for ModalError {
    fn from(e: DraftError) -> Self {
        ModalError::Field(e.key(), e.to_string())
    }
}

impl From<ComponentError> for ModalError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::EmptyName => ModalError::Field("name", e.to_string()),
            ComponentError::EmptyFieldName(_) | ComponentError::DuplicateFieldNames(_) => {
                ModalError::Field("fields", e.to_string())
            }
            other => ModalError::General(other.to_string()),
        }
    }
}

impl From<ExpenseError> for ModalError {
    fn from(e: ExpenseError) -> Self {
        let key = match e {
            ExpenseError::EmptyDescription => "description",
            ExpenseError::NonPositiveAmount => "amount",
            ExpenseError::EmptyName => "name",
            ExpenseError::NoSplits | ExpenseError::UnknownPerson(_) => "participants",
            ExpenseError::SplitMismatch { .. } => "exact",
        };
        ModalError::Field(key, e.to_string())
    }
}

fn modal_key(state: &mut AppState, key: KeyEvent) -> Vec<Effect> {
    let Some(modal) = state.modal.as_mut() else {
        return Vec::new();
    };
    if key.code == KeyCode::Esc && !modal.widget.is_editing() {
        state.modal = None;
        return Vec::new();
    }
    match modal.widget.on_key(key) {
        FormOutcome::Submit => submit_modal(state),
        FormOutcome::Cancel => {
            state.modal = None;
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn submit_modal(state: &mut AppState) -> Vec<Effect> {
    let Some(modal) = state.modal.as_mut() else {
        return Vec::new();
    };
    if !validate_form(&mut modal.widget.form) {
        return vec![toast("Fix the highlighted inputs", ToastLevel::Error)];
    }
    let kind = modal.kind.clone();
    let form = modal.widget.form.clone();
    match commit_modal(state, &kind, &form) {
        Ok(msg) => {
            state.modal = None;
            vec![toast(msg, ToastLevel::Success)]
        }
        Err(ModalError::Field(key, msg)) => {
            if let Some(m) = state.modal.as_mut() {
                m.widget.form.set_error(key, &msg);
            }
            vec![toast(msg, ToastLevel::Error)]
        }
        Err(ModalError::General(msg)) => vec![toast(msg, ToastLevel::Error)],
    }
}

fn commit_modal(
    state: &mut AppState,
    kind: &ModalKind,
    form: &FormState,
) -> Result<String, ModalError> {
    match kind {
        ModalKind::NewComponent => {
            let draft = component_draft(form, None)?;
            let c = state.components.create(state.store.as_mut(), draft)?;
            Ok(format!("Component '{}' created", c.name))
        }
        ModalKind::EditComponent(id) => {
            let existing = state.components.get(id).cloned();
            let draft = component_draft(form, existing.as_ref())?;
            let c = state.components.update(state.store.as_mut(), id, draft)?;
            Ok(format!("Component '{}' updated", c.name))
        }
        ModalKind::AddPerson => {
            let p = state.expenses.add_person(form.text("name"))?;
            state
                .expenses
                .persist(state.store.as_mut())
                .map_err(|e| ModalError::General(format!("{e:#}")))?;
            Ok(format!("{} added", p.name))
        }
        ModalKind::AddExpense => {
            let draft = expense_draft(form, &state.expenses)?;
            let e = state.expenses.add_expense(draft)?;
            state
                .expenses
                .persist(state.store.as_mut())
                .map_err(|e| ModalError::General(format!("{e:#}")))?;
            Ok(format!("Added '{}' ({:.2})", e.description, e.amount))
        }
    }
}
