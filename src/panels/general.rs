//! General tab: name, API id, texts and the required flag.

use crate::field_config::{FieldEditor, GeneralSettings};
use crate::session::SessionEvent;
use crate::widgets::form::{FormField, FormState};

pub fn build(general: &GeneralSettings) -> FormState {
    let mut form = FormState::new(
        "General",
        vec![
            FormField::text("name", "Name", &general.name)
                .required()
                .with_max_len(80),
            FormField::text("apiId", "API ID", &general.api_id)
                .with_hint("filled from the name while empty"),
            FormField::text("description", "Description", &general.description),
            FormField::text("helpText", "Help text", &general.help_text),
            FormField::text("placeholder", "Placeholder", &general.placeholder),
            FormField::checkbox("required", "Required", general.required),
        ],
    );
    form.submit_label = Some("Save field".into());
    form
}

/// Push the form into the editor. The API id is read before the name so a
/// cleared id is re-derived from the name, and the derived value is written
/// back into the form.
pub fn apply(form: &mut FormState, editor: &mut FieldEditor) -> Option<SessionEvent> {
    editor.general.api_id = form.text("apiId").trim().to_string();
    editor.general.description = form.text("description").to_string();
    editor.general.help_text = form.text("helpText").to_string();
    editor.general.placeholder = form.text("placeholder").to_string();
    let name = form.text("name").to_string();
    editor.set_name(&name);
    editor.set_required(form.checked("required"));
    let api_id = editor.general.api_id.clone();
    if let Some(f) = form.field_mut("apiId") {
        f.set_text(&api_id);
    }
    editor.compose().map(|field| SessionEvent::LocalSave { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;

    fn new_editor() -> FieldEditor {
        let mut ed = FieldEditor::new("col_posts");
        ed.select_type(FieldType::Text).unwrap();
        ed
    }

    #[test]
    fn name_fills_an_empty_api_id_once() {
        let mut ed = new_editor();
        let mut form = build(&ed.general);
        form.field_mut("name").unwrap().set_text("Hero Title");
        let ev = apply(&mut form, &mut ed);
        assert_eq!(ed.general.api_id, "hero_title");
        assert_eq!(form.text("apiId"), "hero_title");
        match ev {
            Some(SessionEvent::LocalSave { field }) => {
                assert_eq!(field.name, "Hero Title");
                assert_eq!(field.api_id, "hero_title");
            }
            other => panic!("unexpected {other:?}"),
        }

        form.field_mut("name").unwrap().set_text("Other");
        apply(&mut form, &mut ed);
        assert_eq!(ed.general.api_id, "hero_title");
    }

    #[test]
    fn required_flag_reaches_the_session() {
        let mut ed = new_editor();
        let mut form = build(&ed.general);
        form.field_mut("required").unwrap().value = crate::widgets::form::FieldValue::Bool(true);
        apply(&mut form, &mut ed);
        assert!(ed.general.required);
        assert!(ed.session().unwrap().meta().required);
    }
}
