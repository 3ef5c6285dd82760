use crate::widgets::chrome::centered_rect;
use crate::widgets::form::{
    begin_edit, capture_initial, compute_dirty, draw_form, handle_key, FieldKind, FieldValue,
    FormOutcome, FormState,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear};
use std::collections::HashMap;
use tui_textarea::TextArea;

/// A form plus a multi-line editor overlay for its textarea fields.
pub struct FormWidget {
    pub form: FormState,
    ta_map: HashMap<String, TextArea<'static>>,
}

fn make_textarea(text: &str) -> TextArea<'static> {
    let mut ta = TextArea::default();
    if !text.is_empty() {
        ta.insert_str(text);
    }
    ta
}

impl FormWidget {
    pub fn new(mut form: FormState) -> Self {
        capture_initial(&mut form);
        let ta_map = form
            .fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::TextArea { .. }))
            .map(|f| (f.name.clone(), make_textarea(f.text_value())))
            .collect();
        Self { form, ta_map }
    }

    fn editing_textarea(&self) -> Option<String> {
        if !self.form.editing {
            return None;
        }
        self.form
            .fields
            .get(self.form.selected)
            .filter(|f| matches!(f.kind, FieldKind::TextArea { .. }))
            .map(|f| f.name.clone())
    }

    pub fn is_editing(&self) -> bool {
        self.form.editing
    }

    /// Copy the overlay's text back into the field and leave edit mode.
    pub fn commit_textarea(&mut self) -> Option<String> {
        let name = self.editing_textarea()?;
        let text = self.ta_map.get(&name)?.lines().join("\n");
        if let Some(fld) = self.form.field_mut(&name) {
            fld.value = FieldValue::Text(text);
        }
        self.form.editing = false;
        self.form.message = None;
        compute_dirty(&mut self.form);
        Some(name)
    }

    pub fn cancel_textarea(&mut self) -> bool {
        let Some(name) = self.editing_textarea() else {
            return false;
        };
        let text = self.form.text(&name).to_string();
        self.ta_map.insert(name, make_textarea(&text));
        self.form.editing = false;
        true
    }

    /// Replace a field's text from outside (for example a snippet append).
    pub fn set_text(&mut self, name: &str, text: &str) {
        if let Some(fld) = self.form.field_mut(name) {
            fld.set_text(text);
            if matches!(fld.kind, FieldKind::TextArea { .. }) {
                self.ta_map.insert(name.to_string(), make_textarea(text));
            }
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, tick: u64) {
        let overlay = self.editing_textarea();
        // the overlay has its own cursor
        let cursor_on = tick % 2 == 0 && overlay.is_none();
        draw_form(f, area, &self.form, focused, cursor_on);
        let Some(name) = overlay else {
            return;
        };
        let label = self
            .form
            .field(&name)
            .map(|fld| fld.label.clone())
            .unwrap_or_default();
        if let Some(ta) = self.ta_map.get_mut(&name) {
            ta.set_block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Editing: {label}  Ctrl+S save, Esc cancel")),
            );
            let rect = centered_rect(80, 70, area);
            f.render_widget(Clear, rect);
            f.render_widget(&*ta, rect);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> FormOutcome {
        if let Some(name) = self.editing_textarea() {
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            return match key.code {
                KeyCode::Char('s') if ctrl => self
                    .commit_textarea()
                    .map(FormOutcome::Changed)
                    .unwrap_or(FormOutcome::None),
                KeyCode::Esc => {
                    self.cancel_textarea();
                    FormOutcome::None
                }
                _ => {
                    if let Some(ta) = self.ta_map.get_mut(&name) {
                        let _ = ta.input(key);
                    }
                    FormOutcome::None
                }
            };
        }
        if !self.form.editing && key.code == KeyCode::Enter {
            let on_textarea = self
                .form
                .fields
                .get(self.form.selected)
                .filter(|f| matches!(f.kind, FieldKind::TextArea { .. }))
                .map(|f| (f.name.clone(), f.text_value().to_string()));
            if let Some((name, text)) = on_textarea {
                self.ta_map.insert(name, make_textarea(&text));
                begin_edit(&mut self.form);
                return FormOutcome::None;
            }
        }
        handle_key(&mut self.form, key.code)
    }
}
