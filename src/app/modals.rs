//! Dialog forms for the component library and the expense book, and the
//! parsing that turns their text inputs back into drafts.

use crate::components::{ComponentDraft, ComponentFieldDraft};
use crate::expenses::{split_equal, ExpenseBook, ExpenseDraft, PersonId, Split};
use crate::model::{Component, FieldType};
use crate::widgets::form::{FormField, FormState};
use crate::widgets::form_widget::FormWidget;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    NewComponent,
    EditComponent(String),
    AddPerson,
    AddExpense,
}

pub struct Modal {
    pub kind: ModalKind,
    pub widget: FormWidget,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("unknown field type '{0}'")]
    UnknownType(String),
    #[error("'{0}' is not name:type")]
    BadFieldSpec(String),
    #[error("no person called '{0}'")]
    UnknownParticipant(String),
    #[error("dates look like 2024-05-31")]
    BadDate,
    #[error("amount is not a number")]
    BadAmount,
    #[error("'{0}' is not name=amount")]
    BadSplit(String),
}

impl DraftError {
    /// Form input the error belongs to.
    pub fn key(&self) -> &'static str {
        match self {
            DraftError::UnknownType(_) | DraftError::BadFieldSpec(_) => "fields",
            DraftError::UnknownParticipant(_) => "participants",
            DraftError::BadSplit(_) => "exact",
            DraftError::BadDate => "date",
            DraftError::BadAmount => "amount",
        }
    }
}

/// `title:text*, body:rich_text` (a trailing `*` marks the field required).
pub fn format_field_specs(fields: &[ComponentFieldDraft]) -> String {
    fields
        .iter()
        .map(|f| {
            format!(
                "{}:{}{}",
                f.name,
                f.field_type.tag(),
                if f.required { "*" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn parse_field_specs(text: &str) -> Result<Vec<ComponentFieldDraft>, DraftError> {
    let mut out = Vec::new();
    for spec in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((name, tag)) = spec.split_once(':') else {
            return Err(DraftError::BadFieldSpec(spec.to_string()));
        };
        let tag = tag.trim();
        let (tag, required) = match tag.strip_suffix('*') {
            Some(t) => (t.trim(), true),
            None => (tag, false),
        };
        let field_type = FieldType::from_tag(tag);
        if field_type == FieldType::Unknown {
            return Err(DraftError::UnknownType(tag.to_string()));
        }
        out.push(ComponentFieldDraft {
            name: name.trim().to_string(),
            field_type,
            required,
            ..Default::default()
        });
    }
    Ok(out)
}

pub fn component_form(existing: Option<&Component>) -> FormWidget {
    let draft = existing.map(ComponentDraft::from_component).unwrap_or_default();
    let title = if existing.is_some() {
        "Edit component"
    } else {
        "New component"
    };
    let mut form = FormState::new(
        title,
        vec![
            FormField::text("name", "Name", &draft.name).required(),
            FormField::text("description", "Description", &draft.description),
            FormField::text("category", "Category", &draft.category),
            FormField::text("fields", "Fields", &format_field_specs(&draft.fields))
                .with_hint("name:type, e.g. title:text*, image:media"),
        ],
    );
    form.submit_label = Some("Save component".into());
    FormWidget::new(form)
}

/// Build a draft from the dialog. Existing field ids are kept by name so a
/// rename of the component does not reshuffle its fields.
pub fn component_draft(
    form: &FormState,
    existing: Option<&Component>,
) -> Result<ComponentDraft, DraftError> {
    let mut fields = parse_field_specs(form.text("fields"))?;
    if let Some(c) = existing {
        for f in &mut fields {
            f.id = c
                .fields
                .iter()
                .find(|old| old.name.eq_ignore_ascii_case(&f.name))
                .map(|old| old.id.clone());
            if let Some(old) = c.fields.iter().find(|old| Some(&old.id) == f.id.as_ref()) {
                f.config = old.config.clone();
            }
        }
    }
    Ok(ComponentDraft {
        name: form.text("name").trim().to_string(),
        description: form.text("description").trim().to_string(),
        category: form.text("category").trim().to_string(),
        fields,
    })
}

pub fn person_form() -> FormWidget {
    let mut form = FormState::new(
        "Add person",
        vec![FormField::text("name", "Name", "").required()],
    );
    form.submit_label = Some("Add".into());
    FormWidget::new(form)
}

pub fn expense_form(book: &ExpenseBook, today: NaiveDate) -> FormWidget {
    let payers: Vec<(String, String)> = book
        .people
        .iter()
        .map(|p| (p.id.clone(), p.name.clone()))
        .collect();
    let first = payers.first().map(|(id, _)| id.clone()).unwrap_or_default();
    let mut form = FormState::new(
        "Add expense",
        vec![
            FormField::text("description", "Description", "").required(),
            FormField::number("amount", "Amount", None, false)
                .required()
                .with_minimum(0.01),
            FormField::select("paidBy", "Paid by", payers, &first),
            FormField::text("participants", "Split between", "")
                .with_hint("names, comma separated; empty means everyone"),
            FormField::text("exact", "Exact amounts", "")
                .with_hint("name=amount, e.g. Ann=60, Bob=40; replaces the equal split"),
            FormField::text("date", "Date", &today.format("%Y-%m-%d").to_string()),
        ],
    );
    form.submit_label = Some("Add".into());
    FormWidget::new(form)
}

fn person_id(book: &ExpenseBook, name: &str) -> Result<PersonId, DraftError> {
    book.people
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| p.id.clone())
        .ok_or_else(|| DraftError::UnknownParticipant(name.to_string()))
}

fn resolve_participants(book: &ExpenseBook, text: &str) -> Result<Vec<PersonId>, DraftError> {
    let names: Vec<&str> = text.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if names.is_empty() {
        return Ok(book.people.iter().map(|p| p.id.clone()).collect());
    }
    names.into_iter().map(|n| person_id(book, n)).collect()
}

/// `Ann=60, Bob=40`. The total is not checked here; the book does that.
pub fn parse_exact_splits(book: &ExpenseBook, text: &str) -> Result<Vec<Split>, DraftError> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (name, amount) = entry
                .split_once('=')
                .ok_or_else(|| DraftError::BadSplit(entry.to_string()))?;
            let amount: f64 = amount
                .trim()
                .parse()
                .map_err(|_| DraftError::BadSplit(entry.to_string()))?;
            Ok(Split {
                person_id: person_id(book, name.trim())?,
                amount,
            })
        })
        .collect()
}

/// Exact amounts when given, otherwise an equal split over the named
/// participants.
pub fn expense_draft(form: &FormState, book: &ExpenseBook) -> Result<ExpenseDraft, DraftError> {
    let amount: f64 = form
        .text("amount")
        .trim()
        .parse()
        .map_err(|_| DraftError::BadAmount)?;
    let date = NaiveDate::parse_from_str(form.text("date").trim(), "%Y-%m-%d")
        .map_err(|_| DraftError::BadDate)?;
    let exact = form.text("exact").trim();
    let splits = if exact.is_empty() {
        split_equal(amount, &resolve_participants(book, form.text("participants"))?)
    } else {
        parse_exact_splits(book, exact)?
    };
    let paid_by = form
        .field("paidBy")
        .and_then(|f| f.select_value())
        .unwrap_or_default()
        .to_string();
    Ok(ExpenseDraft {
        description: form.text("description").trim().to_string(),
        amount,
        date,
        paid_by,
        splits,
    })
}
