//! Advanced tab: input behaviour and formatting, per type family.

use crate::session::{SessionEvent, SettingsSession};
use crate::settings::{AdvancedSettings, ButtonLayout};
use crate::widgets::form::{to_json_object, FormField, FormState};

fn opt(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("")
}

pub fn build(settings: &AdvancedSettings, collections: &[(String, String)]) -> FormState {
    let fields = match settings {
        AdvancedSettings::Text(t) => vec![
            FormField::text("inputMask", "Input mask", opt(&t.input_mask))
                .with_hint("9 digit, a letter, * any"),
            FormField::text("autocomplete", "Autocomplete", opt(&t.autocomplete)),
            FormField::checkbox("trim", "Trim whitespace", t.trim),
        ],
        AdvancedSettings::Number(n) => vec![
            FormField::text("prefix", "Prefix", opt(&n.prefix)).with_group("Format"),
            FormField::text("suffix", "Suffix", opt(&n.suffix)).with_group("Format"),
            FormField::text("locale", "Locale", &n.locale).with_group("Format"),
            FormField::text("currency", "Currency", opt(&n.currency)).with_group("Format"),
            FormField::number(
                "decimalPlaces",
                "Decimal places",
                n.decimal_places.map(f64::from),
                true,
            )
            .with_minimum(0.0)
            .with_group("Format"),
            FormField::checkbox("useGrouping", "Group thousands", n.use_grouping)
                .with_group("Format"),
            FormField::checkbox("showButtons", "Show +/- buttons", n.show_buttons)
                .with_group("Buttons"),
            FormField::select(
                "buttonLayout",
                "Button layout",
                ButtonLayout::ALL
                    .iter()
                    .map(|b| (b.as_str().to_string(), b.as_str().to_string()))
                    .collect(),
                n.button_layout.as_str(),
            )
            .with_group("Buttons"),
        ],
        AdvancedSettings::Date(d) => vec![
            FormField::text("dateFormat", "Date format", &d.date_format),
            FormField::checkbox(
                "allowRangeSelection",
                "Allow range selection",
                d.allow_range_selection,
            ),
            FormField::checkbox("showTime", "Show time", d.show_time),
        ],
        AdvancedSettings::Relation(r) => {
            let current = opt(&r.target_collection);
            let target = if collections.is_empty() {
                FormField::text("targetCollection", "Target collection", current)
            } else {
                let mut choices = vec![(String::new(), "(none)".to_string())];
                choices.extend(collections.iter().cloned());
                FormField::select("targetCollection", "Target collection", choices, current)
            };
            vec![
                target,
                FormField::checkbox("multiple", "Allow multiple", r.multiple),
            ]
        }
        AdvancedSettings::Choice(c) => vec![
            FormField::list("options", "Options", &c.options).with_hint("comma separated"),
            FormField::checkbox("allowCustom", "Allow custom values", c.allow_custom),
        ],
        AdvancedSettings::Generic(_) => Vec::new(),
    };
    let mut form = FormState::new("Advanced", fields);
    if matches!(settings, AdvancedSettings::Generic(_)) {
        form.message = Some("No advanced options for this type".into());
    }
    form
}

pub fn apply(form: &FormState, session: &mut SettingsSession) -> SessionEvent {
    session.update_advanced(&to_json_object(form))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, FieldType};
    use crate::settings::SettingsBucket;
    use crate::widgets::form::{handle_key, FormOutcome};
    use crossterm::event::KeyCode;
    use serde_json::json;

    fn session(ft: FieldType) -> SettingsSession {
        let f = Field {
            id: "f1".into(),
            name: "Field".into(),
            field_type: ft,
            ..Default::default()
        };
        SettingsSession::open("col", &f)
    }

    #[test]
    fn currency_defaults_show_in_the_form() {
        let s = session(FieldType::Currency);
        let form = build(&s.settings().advanced, &[]);
        assert_eq!(form.text("currency"), "USD");
        assert_eq!(form.text("decimalPlaces"), "2");
        assert_eq!(form.text("locale"), "en-US");
    }

    #[test]
    fn button_layout_select_cycles_and_applies() {
        let mut s = session(FieldType::Number);
        let mut form = build(&s.settings().advanced, &[]);
        form.selected = form
            .fields
            .iter()
            .position(|f| f.name == "buttonLayout")
            .unwrap();
        assert_eq!(
            handle_key(&mut form, KeyCode::Right),
            FormOutcome::Changed("buttonLayout".into())
        );
        apply(&form, &mut s);
        assert_eq!(
            s.bucket_json(SettingsBucket::Advanced)["buttonLayout"],
            json!("horizontal")
        );
    }

    #[test]
    fn choice_options_are_split_on_commas() {
        let mut s = session(FieldType::Select);
        let mut form = build(&s.settings().advanced, &[]);
        form.field_mut("options").unwrap().set_text("red, green ,, blue");
        apply(&form, &mut s);
        assert_eq!(
            s.bucket_json(SettingsBucket::Advanced)["options"],
            json!(["red", "green", "blue"])
        );
    }

    #[test]
    fn relation_target_is_a_select_when_collections_are_known() {
        let s = session(FieldType::Relation);
        let cols = vec![("col_authors".to_string(), "Authors".to_string())];
        let form = build(&s.settings().advanced, &cols);
        assert_eq!(form.field("targetCollection").unwrap().select_value(), Some(""));
    }
}
