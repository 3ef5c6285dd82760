//! Small form engine shared by the configuration panels and the modal
//! dialogs. A form is a flat list of fields followed by three buttons
//! (Save, Reset, Cancel). Field names may be dotted (`colors.border`), in
//! which case `to_json_object` nests them.

use crate::widgets::chrome::panel_block;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::*;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

#[derive(Clone, Debug)]
pub enum FieldKind {
    Text,
    TextArea {
        edit_lines: usize,
        offset: usize,
    },
    Number {
        is_integer: bool,
        minimum: Option<f64>,
    },
    // Comma-separated strings
    List,
    Checkbox,
    Select {
        options: Vec<String>,
        values: Vec<String>,
        cursor: usize,
        selected: usize,
        offset: usize,
    },
    // #rgb / #rrggbb, empty means unset
    Color,
}

pub const OPTIONS_VISIBLE: usize = 8;

#[derive(Clone, Debug)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub kind: FieldKind,
    pub value: FieldValue,
    pub error: Option<String>,
    pub hint: Option<String>,
    pub text_max_len: Option<usize>,
    pub textarea_max_lines: Option<usize>,
    pub group: Option<String>,
}

impl FormField {
    fn base(name: &str, label: &str, kind: FieldKind, value: FieldValue) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            required: false,
            kind,
            value,
            error: None,
            hint: None,
            text_max_len: None,
            textarea_max_lines: None,
            group: None,
        }
    }

    pub fn text(name: &str, label: &str, value: &str) -> Self {
        Self::base(name, label, FieldKind::Text, FieldValue::Text(value.to_string()))
    }

    pub fn textarea(name: &str, label: &str, value: &str) -> Self {
        let mut f = Self::base(
            name,
            label,
            FieldKind::TextArea {
                edit_lines: 6,
                offset: 0,
            },
            FieldValue::Text(value.to_string()),
        );
        f.textarea_max_lines = Some(4);
        f
    }

    pub fn number(name: &str, label: &str, value: Option<f64>, is_integer: bool) -> Self {
        let text = value.map(|v| format_number(v, is_integer)).unwrap_or_default();
        Self::base(
            name,
            label,
            FieldKind::Number {
                is_integer,
                minimum: None,
            },
            FieldValue::Text(text),
        )
    }

    pub fn list(name: &str, label: &str, items: &[String]) -> Self {
        Self::base(name, label, FieldKind::List, FieldValue::Text(items.join(", ")))
    }

    pub fn checkbox(name: &str, label: &str, value: bool) -> Self {
        Self::base(name, label, FieldKind::Checkbox, FieldValue::Bool(value))
    }

    /// `choices` are `(value, label)` pairs. An unknown `current` selects the first choice.
    pub fn select(name: &str, label: &str, choices: Vec<(String, String)>, current: &str) -> Self {
        let selected = choices.iter().position(|(v, _)| v == current).unwrap_or(0);
        let (values, options): (Vec<String>, Vec<String>) = choices.into_iter().unzip();
        Self::base(
            name,
            label,
            FieldKind::Select {
                options,
                values,
                cursor: selected,
                selected,
                offset: 0,
            },
            FieldValue::Text(current.to_string()),
        )
    }

    pub fn color(name: &str, label: &str, value: Option<&str>) -> Self {
        Self::base(
            name,
            label,
            FieldKind::Color,
            FieldValue::Text(value.unwrap_or_default().to_string()),
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    pub fn with_max_len(mut self, max: usize) -> Self {
        self.text_max_len = Some(max);
        self
    }

    pub fn with_minimum(mut self, min: f64) -> Self {
        if let FieldKind::Number { minimum, .. } = &mut self.kind {
            *minimum = Some(min);
        }
        self
    }

    pub fn text_value(&self) -> &str {
        match &self.value {
            FieldValue::Text(s) => s,
            FieldValue::Bool(_) => "",
        }
    }

    pub fn bool_value(&self) -> bool {
        matches!(self.value, FieldValue::Bool(true))
    }

    pub fn select_value(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Select {
                values, selected, ..
            } => values.get(*selected).map(String::as_str),
            _ => None,
        }
    }

    pub fn set_text(&mut self, text: &str) {
        self.value = FieldValue::Text(text.to_string());
    }

    /// JSON for a field that passed `validate_field_inline`.
    pub fn to_json(&self) -> JsonValue {
        let text = self.text_value().trim();
        match &self.kind {
            // custom CSS and friends are kept verbatim
            FieldKind::TextArea { .. } => JsonValue::String(self.text_value().to_string()),
            FieldKind::Text | FieldKind::Color => {
                if text.is_empty() {
                    JsonValue::Null
                } else {
                    JsonValue::String(text.to_string())
                }
            }
            FieldKind::Number { is_integer, .. } => match text.parse::<f64>() {
                Ok(n) if *is_integer => JsonValue::from(n as i64),
                Ok(n) => serde_json::Number::from_f64(n)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null),
                Err(_) => JsonValue::Null,
            },
            FieldKind::List => JsonValue::Array(
                split_list(text)
                    .into_iter()
                    .map(JsonValue::String)
                    .collect(),
            ),
            FieldKind::Checkbox => JsonValue::Bool(self.bool_value()),
            FieldKind::Select { .. } => self
                .select_value()
                .map(|v| JsonValue::String(v.to_string()))
                .unwrap_or(JsonValue::Null),
        }
    }
}

fn format_number(v: f64, is_integer: bool) -> String {
    if is_integer || v.fract() == 0.0 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v}")
    }
}

pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("static regex")
    })
}

#[derive(Clone, Debug, Default)]
pub struct FormState {
    pub title: String,
    pub fields: Vec<FormField>,
    pub selected: usize,
    pub editing: bool,
    pub message: Option<String>,
    pub submit_label: Option<String>,
    pub disabled: bool,
    pub dirty: bool,
    pub initial: Vec<FieldInitial>,
    // value of the field being edited, restored on Esc
    backup: Option<FieldValue>,
}

#[derive(Clone, Debug)]
pub struct FieldInitial {
    pub name: String,
    pub value: FieldValue,
    pub select_value: Option<String>,
}

/// What a key press did to the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormOutcome {
    None,
    Changed(String),
    Submit,
    Reset,
    Cancel,
}

impl FormState {
    pub fn new(title: &str, fields: Vec<FormField>) -> Self {
        let mut form = Self {
            title: title.to_string(),
            fields,
            ..Default::default()
        };
        capture_initial(&mut form);
        form
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn text(&self, name: &str) -> &str {
        self.field(name).map(FormField::text_value).unwrap_or("")
    }

    pub fn checked(&self, name: &str) -> bool {
        self.field(name).map(FormField::bool_value).unwrap_or(false)
    }

    pub fn set_error(&mut self, name: &str, msg: &str) -> bool {
        match self.field_mut(name) {
            Some(f) => {
                f.error = Some(msg.to_string());
                true
            }
            None => false,
        }
    }

    pub fn clear_errors(&mut self) {
        for f in &mut self.fields {
            f.error = None;
        }
    }

    pub fn has_errors(&self) -> bool {
        self.fields.iter().any(|f| f.error.is_some())
    }

    pub fn save_idx(&self) -> usize {
        self.fields.len()
    }
}

pub fn capture_initial(form: &mut FormState) {
    form.initial = form
        .fields
        .iter()
        .map(|f| FieldInitial {
            name: f.name.clone(),
            value: f.value.clone(),
            select_value: f.select_value().map(str::to_string),
        })
        .collect();
    form.dirty = false;
}

pub fn compute_dirty(form: &mut FormState) -> bool {
    let mut any = false;
    for f in &form.fields {
        if let Some(init) = form.initial.iter().find(|i| i.name == f.name) {
            let changed = match &f.kind {
                FieldKind::Select { .. } => {
                    f.select_value().map(str::to_string) != init.select_value
                }
                _ => f.value != init.value,
            };
            if changed {
                any = true;
                break;
            }
        }
    }
    form.dirty = any;
    any
}

pub fn reset_to_initial(form: &mut FormState) {
    for f in &mut form.fields {
        if let Some(init) = form.initial.iter().find(|i| i.name == f.name) {
            match &mut f.kind {
                FieldKind::Select {
                    values,
                    selected,
                    cursor,
                    offset,
                    ..
                } => {
                    if let Some(target) = &init.select_value {
                        if let Some(idx) = values.iter().position(|v| v == target) {
                            *selected = idx;
                        }
                    }
                    *cursor = *selected;
                    *offset = 0;
                }
                _ => {
                    f.value = init.value.clone();
                }
            }
            f.error = None;
        }
    }
    form.editing = false;
    form.backup = None;
    form.message = Some("Reset to last saved values".into());
    compute_dirty(form);
}

/// Per-field checks run while typing and again before a value is accepted.
pub fn validate_field_inline(fld: &mut FormField) -> bool {
    fld.error = None;
    let text = fld.text_value().trim().to_string();
    match &fld.kind {
        FieldKind::Text | FieldKind::TextArea { .. } => {
            if fld.required && text.is_empty() {
                fld.error = Some("This field is required".into());
            } else if let Some(maxl) = fld.text_max_len {
                if text.chars().count() > maxl {
                    fld.error = Some(format!("Must be at most {maxl} characters"));
                }
            }
        }
        FieldKind::Number {
            is_integer,
            minimum,
        } => {
            if text.is_empty() {
                if fld.required {
                    fld.error = Some("This field is required".into());
                }
            } else {
                match text.parse::<f64>() {
                    Err(_) => fld.error = Some("Enter a number".into()),
                    Ok(n) if !n.is_finite() => fld.error = Some("Enter a number".into()),
                    Ok(n) if *is_integer && n.fract() != 0.0 => {
                        fld.error = Some("Enter a whole number".into())
                    }
                    Ok(n) => {
                        if let Some(m) = minimum {
                            if n < *m {
                                fld.error = Some(format!("Must be at least {m}"));
                            }
                        }
                    }
                }
            }
        }
        FieldKind::Color => {
            if !text.is_empty() && !hex_re().is_match(&text) {
                fld.error = Some("Use #rgb or #rrggbb".into());
            }
        }
        FieldKind::List => {
            if fld.required && split_list(&text).is_empty() {
                fld.error = Some("Add at least one entry".into());
            }
        }
        FieldKind::Checkbox | FieldKind::Select { .. } => {}
    }
    fld.error.is_none()
}

/// Validate every field; true when the form can be submitted.
pub fn validate_form(form: &mut FormState) -> bool {
    let mut ok = true;
    for f in &mut form.fields {
        ok &= validate_field_inline(f);
    }
    ok
}

fn insert_path(obj: &mut Map<String, JsonValue>, path: &str, value: JsonValue) {
    match path.split_once('.') {
        Some((head, rest)) => {
            let entry = obj
                .entry(head.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !entry.is_object() {
                *entry = JsonValue::Object(Map::new());
            }
            if let Some(inner) = entry.as_object_mut() {
                insert_path(inner, rest, value);
            }
        }
        None => {
            obj.insert(path.to_string(), value);
        }
    }
}

/// Field values as a JSON object. Fields currently showing an error are left
/// out so a bad value never reaches the settings.
pub fn to_json_object(form: &FormState) -> JsonValue {
    let mut obj = Map::new();
    for f in form.fields.iter().filter(|f| f.error.is_none()) {
        insert_path(&mut obj, &f.name, f.to_json());
    }
    JsonValue::Object(obj)
}

fn step_number(fld: &mut FormField, dir: f64) {
    let FieldKind::Number {
        is_integer,
        minimum,
    } = fld.kind
    else {
        return;
    };
    let step = if is_integer { 1.0 } else { 0.1 };
    let cur = fld.text_value().trim().parse::<f64>().unwrap_or(0.0);
    let mut next = cur + step * dir;
    if let Some(m) = minimum {
        next = next.max(m);
    }
    if !is_integer {
        next = (next * 10.0).round() / 10.0;
    }
    fld.value = FieldValue::Text(format_number(next, is_integer));
}

fn finish_edit(form: &mut FormState) -> FormOutcome {
    let sel = form.selected;
    let Some(fld) = form.fields.get_mut(sel) else {
        form.editing = false;
        return FormOutcome::None;
    };
    if !validate_field_inline(fld) {
        // stay in edit mode with the error showing
        return FormOutcome::None;
    }
    let name = fld.name.clone();
    form.editing = false;
    form.backup = None;
    form.message = None;
    compute_dirty(form);
    FormOutcome::Changed(name)
}

fn cancel_edit(form: &mut FormState) {
    let sel = form.selected;
    if let (Some(fld), Some(prev)) = (form.fields.get_mut(sel), form.backup.take()) {
        fld.value = prev;
        fld.error = None;
    }
    form.editing = false;
}

/// Begin editing the selected field. Returns false for fields that are not
/// edited in place (checkbox) or when the selection is on a button.
pub fn begin_edit(form: &mut FormState) -> bool {
    let sel = form.selected;
    let Some(fld) = form.fields.get_mut(sel) else {
        return false;
    };
    match &mut fld.kind {
        FieldKind::Checkbox => false,
        FieldKind::Select {
            cursor, selected, ..
        } => {
            *cursor = *selected;
            form.editing = true;
            true
        }
        _ => {
            form.backup = Some(fld.value.clone());
            form.editing = true;
            true
        }
    }
}

/// Key handling for forms without a textarea overlay. Textareas edited here
/// take Enter as a newline and finish on Esc.
pub fn handle_key(form: &mut FormState, key: KeyCode) -> FormOutcome {
    if form.disabled {
        return FormOutcome::None;
    }
    if form.editing {
        return handle_editing_key(form, key);
    }
    let save_idx = form.save_idx();
    let reset_idx = save_idx + 1;
    let cancel_idx = save_idx + 2;
    match key {
        KeyCode::Up => {
            form.selected = form.selected.saturating_sub(1);
            FormOutcome::None
        }
        KeyCode::Down => {
            if form.selected < cancel_idx {
                form.selected += 1;
            }
            FormOutcome::None
        }
        KeyCode::Left | KeyCode::Right => {
            let forward = key == KeyCode::Right;
            if form.selected >= save_idx {
                form.selected = if forward {
                    (form.selected + 1).min(cancel_idx)
                } else {
                    form.selected.saturating_sub(1).max(save_idx)
                };
                return FormOutcome::None;
            }
            let sel = form.selected;
            if let Some(fld) = form.fields.get_mut(sel) {
                if let FieldKind::Select {
                    options,
                    selected,
                    cursor,
                    ..
                } = &mut fld.kind
                {
                    if options.is_empty() {
                        return FormOutcome::None;
                    }
                    *selected = if forward {
                        (*selected + 1) % options.len()
                    } else {
                        (*selected + options.len() - 1) % options.len()
                    };
                    *cursor = *selected;
                    let name = fld.name.clone();
                    compute_dirty(form);
                    return FormOutcome::Changed(name);
                }
            }
            FormOutcome::None
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            if form.selected == save_idx {
                return if key == KeyCode::Enter {
                    FormOutcome::Submit
                } else {
                    FormOutcome::None
                };
            }
            if form.selected == reset_idx {
                reset_to_initial(form);
                return FormOutcome::Reset;
            }
            if form.selected == cancel_idx {
                return FormOutcome::Cancel;
            }
            let sel = form.selected;
            let Some(fld) = form.fields.get_mut(sel) else {
                return FormOutcome::None;
            };
            if let FieldKind::Checkbox = fld.kind {
                fld.value = FieldValue::Bool(!fld.bool_value());
                let name = fld.name.clone();
                compute_dirty(form);
                return FormOutcome::Changed(name);
            }
            if key == KeyCode::Enter {
                begin_edit(form);
            }
            FormOutcome::None
        }
        _ => FormOutcome::None,
    }
}

fn handle_editing_key(form: &mut FormState, key: KeyCode) -> FormOutcome {
    let sel = form.selected;
    let Some(fld) = form.fields.get_mut(sel) else {
        form.editing = false;
        return FormOutcome::None;
    };
    if matches!(fld.kind, FieldKind::Number { .. }) && matches!(key, KeyCode::Up | KeyCode::Down) {
        step_number(fld, if key == KeyCode::Up { 1.0 } else { -1.0 });
        validate_field_inline(fld);
        return FormOutcome::None;
    }
    match &mut fld.kind {
        FieldKind::Select {
            options,
            cursor,
            selected,
            offset,
            ..
        } => match key {
            KeyCode::Up => {
                *cursor = cursor.saturating_sub(1);
                if *cursor < *offset {
                    *offset = *cursor;
                }
                FormOutcome::None
            }
            KeyCode::Down => {
                if *cursor + 1 < options.len() {
                    *cursor += 1;
                }
                if *cursor >= *offset + OPTIONS_VISIBLE {
                    *offset = *cursor + 1 - OPTIONS_VISIBLE;
                }
                FormOutcome::None
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                *selected = *cursor;
                let name = fld.name.clone();
                form.editing = false;
                compute_dirty(form);
                FormOutcome::Changed(name)
            }
            KeyCode::Esc => {
                *cursor = *selected;
                form.editing = false;
                FormOutcome::None
            }
            _ => FormOutcome::None,
        },
        FieldKind::TextArea { .. } => match key {
            KeyCode::Esc => finish_edit(form),
            KeyCode::Enter => {
                if let FieldValue::Text(s) = &mut fld.value {
                    s.push('\n');
                }
                FormOutcome::None
            }
            KeyCode::Backspace => {
                if let FieldValue::Text(s) = &mut fld.value {
                    s.pop();
                }
                FormOutcome::None
            }
            KeyCode::Char(c) => {
                if let FieldValue::Text(s) = &mut fld.value {
                    s.push(c);
                }
                FormOutcome::None
            }
            _ => FormOutcome::None,
        },
        _ => match key {
            KeyCode::Enter => finish_edit(form),
            KeyCode::Esc => {
                cancel_edit(form);
                FormOutcome::None
            }
            KeyCode::Backspace => {
                if let FieldValue::Text(s) = &mut fld.value {
                    s.pop();
                }
                validate_field_inline(fld);
                FormOutcome::None
            }
            KeyCode::Char(c) => {
                if let FieldValue::Text(s) = &mut fld.value {
                    s.push(c);
                }
                validate_field_inline(fld);
                FormOutcome::None
            }
            _ => FormOutcome::None,
        },
    }
}

fn value_style(form: &FormState, i: usize) -> Style {
    if i == form.selected {
        if form.editing {
            crate::theme::text_editing_bold()
        } else {
            crate::theme::text_active_bold()
        }
    } else {
        Style::default()
    }
}

pub fn draw_form(f: &mut Frame, area: Rect, form: &FormState, highlight: bool, cursor_on: bool) {
    let mut lines: Vec<Line> = Vec::new();
    let mut last_group: Option<String> = None;
    for (i, fld) in form.fields.iter().enumerate() {
        if let Some(g) = &fld.group {
            if last_group.as_ref() != Some(g) {
                lines.push(Line::from(Span::styled(
                    format!("-- {g} --"),
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                )));
                last_group = Some(g.clone());
            }
        }
        let sel = if i == form.selected { '›' } else { ' ' };
        let req = if fld.required { " *" } else { "" };
        let editing_this = form.editing && i == form.selected;
        match &fld.kind {
            FieldKind::Text | FieldKind::Number { .. } | FieldKind::List => {
                let mut val = fld.text_value().to_string();
                if editing_this && cursor_on {
                    val.push('▏');
                }
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(val, value_style(form, i)),
                ]));
            }
            FieldKind::Color => {
                let mut val = fld.text_value().to_string();
                if val.is_empty() && !editing_this {
                    val = "(theme)".into();
                }
                if editing_this && cursor_on {
                    val.push('▏');
                }
                let mut spans = vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(val, value_style(form, i)),
                ];
                if let Some(c) = crate::theme::parse_hex(fld.text_value()) {
                    spans.push(Span::raw(" "));
                    spans.push(Span::styled("■■", Style::default().fg(c)));
                }
                lines.push(Line::from(spans));
            }
            FieldKind::TextArea { edit_lines, offset } => {
                let style = value_style(form, i);
                lines.push(Line::from(vec![Span::raw(format!(
                    "{sel} {}{req}:",
                    fld.label
                ))]));
                let text = fld.text_value();
                let mut body: Vec<String> = if text.is_empty() {
                    vec![String::new()]
                } else {
                    text.lines().map(str::to_string).collect()
                };
                if editing_this {
                    let total = body.len();
                    let start = (*offset).min(total);
                    let end = (start + *edit_lines).min(total);
                    let mut window: Vec<String> = body[start..end].to_vec();
                    if cursor_on {
                        if let Some(last) = window.last_mut() {
                            last.push('▏');
                        }
                    }
                    for bl in window {
                        lines.push(Line::from(vec![Span::raw("  "), Span::styled(bl, style)]));
                    }
                    continue;
                }
                let mut more = 0;
                if let Some(maxl) = fld.textarea_max_lines {
                    if body.len() > maxl {
                        more = body.len() - maxl;
                        body.truncate(maxl);
                    }
                }
                for bl in body {
                    lines.push(Line::from(vec![Span::raw("  "), Span::styled(bl, style)]));
                }
                if more > 0 {
                    lines.push(Line::from(Span::styled(
                        format!("  … ({more} more line{})", if more == 1 { "" } else { "s" }),
                        crate::theme::text_muted(),
                    )));
                }
            }
            FieldKind::Checkbox => {
                let val = if fld.bool_value() { "[x]" } else { "[ ]" };
                let style = if i == form.selected {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(val.to_string(), style),
                ]));
            }
            FieldKind::Select {
                options,
                cursor,
                selected,
                offset,
                ..
            } => {
                let summary = options
                    .get(*selected)
                    .cloned()
                    .unwrap_or_else(|| "(none)".into());
                let hint = if i == form.selected && !form.editing {
                    "  ‹ ›"
                } else {
                    ""
                };
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(summary, value_style(form, i)),
                    Span::styled(hint, crate::theme::text_muted()),
                ]));
                if editing_this {
                    let start = (*offset).min(options.len());
                    let end = (start + OPTIONS_VISIBLE).min(options.len());
                    for (oi, opt) in options.iter().enumerate().take(end).skip(start) {
                        let mark = if oi == *selected { "(•)" } else { "( )" };
                        let cur = if oi == *cursor { '›' } else { ' ' };
                        let st = if oi == *cursor {
                            crate::theme::list_cursor_style()
                        } else {
                            crate::theme::text_muted()
                        };
                        lines.push(Line::from(vec![Span::styled(
                            format!("  {cur} {mark} {opt}"),
                            st,
                        )]));
                    }
                }
            }
        }
        if let Some(err) = &fld.error {
            lines.push(Line::from(Span::styled(
                format!("  ! {err}"),
                crate::theme::text_error(),
            )));
        } else if let Some(hint) = &fld.hint {
            lines.push(Line::from(Span::styled(
                format!("  · {hint}"),
                crate::theme::text_muted(),
            )));
        }
    }
    if !form.fields.is_empty() {
        lines.push(Line::from(""));
    }
    let save_idx = form.save_idx();
    let can_save = !form.disabled;
    let can_reset = form.dirty && !form.disabled;
    let save_label = format!("[ {} ]", form.submit_label.as_deref().unwrap_or("Save"));
    let mut save_style = if can_save {
        crate::theme::text_active_bold()
    } else {
        crate::theme::text_muted()
    };
    let mut reset_style = if can_reset {
        Style::default().fg(crate::theme::ACTIVE)
    } else {
        crate::theme::text_muted()
    };
    let mut cancel_style = crate::theme::text_muted();
    if form.selected == save_idx {
        save_style = if can_save {
            crate::theme::list_cursor_style()
        } else {
            Style::default()
                .fg(crate::theme::MUTED)
                .bg(crate::theme::ACCENT)
        };
    }
    if form.selected == save_idx + 1 {
        reset_style = crate::theme::list_cursor_style();
    }
    if form.selected == save_idx + 2 {
        cancel_style = crate::theme::list_cursor_style();
    }
    lines.push(Line::from(vec![
        Span::styled(format!("  {save_label}  "), save_style),
        Span::styled("Reset  ", reset_style),
        Span::styled("Cancel", cancel_style),
    ]));
    if let Some(msg) = &form.message {
        lines.push(Line::from(Span::styled(
            msg.clone(),
            crate::theme::text_muted(),
        )));
    }
    let title = if form.editing {
        format!("{} (editing)", form.title)
    } else {
        form.title.clone()
    };
    let block = panel_block(&title, highlight);
    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use serde_json::json;

    fn sample() -> FormState {
        FormState::new(
            "Sample",
            vec![
                FormField::text("name", "Name", "Title").required(),
                FormField::number("maxLength", "Max length", Some(120.0), true).with_minimum(0.0),
                FormField::checkbox("trim", "Trim", false),
                FormField::select(
                    "uiVariant",
                    "Variant",
                    vec![
                        ("standard".into(), "Standard".into()),
                        ("material".into(), "Material".into()),
                        ("pill".into(), "Pill".into()),
                    ],
                    "material",
                ),
                FormField::color("colors.border", "Border", None),
                FormField::list("allowedTypes", "Allowed types", &["image/png".to_string()]),
            ],
        )
    }

    fn type_text(form: &mut FormState, s: &str) {
        for c in s.chars() {
            handle_key(form, KeyCode::Char(c));
        }
    }

    #[test]
    fn dotted_names_nest_and_empty_text_is_null() {
        let mut form = sample();
        form.field_mut("name").unwrap().set_text("");
        let v = to_json_object(&form);
        assert_eq!(v["name"], JsonValue::Null);
        assert_eq!(v["maxLength"], json!(120));
        assert_eq!(v["trim"], json!(false));
        assert_eq!(v["uiVariant"], json!("material"));
        assert_eq!(v["colors"], json!({"border": null}));
        assert_eq!(v["allowedTypes"], json!(["image/png"]));
    }

    #[test]
    fn editing_text_commits_on_enter_and_reverts_on_esc() {
        let mut form = sample();
        assert_eq!(handle_key(&mut form, KeyCode::Enter), FormOutcome::None);
        assert!(form.editing);
        type_text(&mut form, "s!");
        assert_eq!(handle_key(&mut form, KeyCode::Enter), FormOutcome::Changed("name".into()));
        assert_eq!(form.text("name"), "Titles!");
        assert!(form.dirty);

        handle_key(&mut form, KeyCode::Enter);
        type_text(&mut form, "xyz");
        handle_key(&mut form, KeyCode::Esc);
        assert!(!form.editing);
        assert_eq!(form.text("name"), "Titles!");
    }

    #[test]
    fn invalid_hex_is_rejected_inline_and_left_out_of_json() {
        let mut form = sample();
        form.selected = 4;
        handle_key(&mut form, KeyCode::Enter);
        type_text(&mut form, "#12");
        assert_eq!(handle_key(&mut form, KeyCode::Enter), FormOutcome::None);
        assert!(form.editing);
        assert_eq!(
            form.field("colors.border").unwrap().error.as_deref(),
            Some("Use #rgb or #rrggbb")
        );
        assert!(to_json_object(&form).get("colors").is_none());
        type_text(&mut form, "3");
        assert_eq!(
            handle_key(&mut form, KeyCode::Enter),
            FormOutcome::Changed("colors.border".into())
        );
        assert_eq!(to_json_object(&form)["colors"]["border"], json!("#123"));
    }

    #[test]
    fn numbers_reject_fractions_and_values_below_minimum() {
        let mut form = sample();
        form.selected = 1;
        handle_key(&mut form, KeyCode::Enter);
        handle_key(&mut form, KeyCode::Backspace);
        handle_key(&mut form, KeyCode::Backspace);
        handle_key(&mut form, KeyCode::Backspace);
        type_text(&mut form, "1.5");
        assert_eq!(handle_key(&mut form, KeyCode::Enter), FormOutcome::None);
        assert!(form.field("maxLength").unwrap().error.is_some());
        handle_key(&mut form, KeyCode::Esc);
        assert_eq!(form.text("maxLength"), "120");
        assert!(form.field("maxLength").unwrap().error.is_none());

        let mut fld = FormField::number("n", "N", Some(-1.0), true).with_minimum(0.0);
        assert!(!validate_field_inline(&mut fld));
        assert_eq!(fld.error.as_deref(), Some("Must be at least 0"));
    }

    #[test]
    fn checkbox_and_select_change_without_edit_mode() {
        let mut form = sample();
        form.selected = 2;
        assert_eq!(handle_key(&mut form, KeyCode::Char(' ')), FormOutcome::Changed("trim".into()));
        assert!(form.checked("trim"));
        form.selected = 3;
        assert_eq!(handle_key(&mut form, KeyCode::Right), FormOutcome::Changed("uiVariant".into()));
        assert_eq!(form.field("uiVariant").unwrap().select_value(), Some("pill"));
        handle_key(&mut form, KeyCode::Right);
        assert_eq!(form.field("uiVariant").unwrap().select_value(), Some("standard"));
    }

    #[test]
    fn select_edit_mode_picks_with_enter() {
        let mut form = sample();
        form.selected = 3;
        handle_key(&mut form, KeyCode::Enter);
        assert!(form.editing);
        handle_key(&mut form, KeyCode::Up);
        assert_eq!(handle_key(&mut form, KeyCode::Enter), FormOutcome::Changed("uiVariant".into()));
        assert_eq!(form.field("uiVariant").unwrap().select_value(), Some("standard"));
    }

    #[test]
    fn buttons_submit_reset_and_cancel() {
        let mut form = sample();
        form.selected = 2;
        handle_key(&mut form, KeyCode::Char(' '));
        assert!(form.dirty);
        form.selected = form.save_idx();
        assert_eq!(handle_key(&mut form, KeyCode::Enter), FormOutcome::Submit);
        handle_key(&mut form, KeyCode::Right);
        assert_eq!(handle_key(&mut form, KeyCode::Enter), FormOutcome::Reset);
        assert!(!form.checked("trim"));
        assert!(!form.dirty);
        handle_key(&mut form, KeyCode::Right);
        assert_eq!(handle_key(&mut form, KeyCode::Enter), FormOutcome::Cancel);
        // the cursor never runs past Cancel
        handle_key(&mut form, KeyCode::Down);
        assert_eq!(form.selected, form.save_idx() + 2);
    }

    #[test]
    fn disabled_form_ignores_keys() {
        let mut form = sample();
        form.disabled = true;
        assert_eq!(handle_key(&mut form, KeyCode::Enter), FormOutcome::None);
        assert!(!form.editing);
    }

    #[test]
    fn required_text_reports_inline() {
        let mut form = sample();
        form.field_mut("name").unwrap().set_text("  ");
        assert!(!validate_form(&mut form));
        assert_eq!(form.field("name").unwrap().error.as_deref(), Some("This field is required"));
        assert!(form.has_errors());
        form.clear_errors();
        assert!(!form.has_errors());
    }

    #[test]
    fn renders_fields_hints_and_buttons() {
        let mut form = sample();
        form.fields[1].hint = Some("leave empty for no limit".into());
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| draw_form(f, f.area(), &form, true, false))
            .unwrap();
        let buf = terminal.backend().buffer().clone();
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Sample"));
        assert!(text.contains("› Name *: Title"));
        assert!(text.contains("Variant: Material"));
        assert!(text.contains("Border: (theme)"));
        assert!(text.contains("leave empty for no limit"));
        assert!(text.contains("[ Save ]"));
        assert!(text.contains("Cancel"));
    }
}
