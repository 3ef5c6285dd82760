//! Validation tab. The form shape follows the validation family of the field type.

use crate::session::{SessionEvent, SettingsSession};
use crate::settings::validation::{OTP_MAX_LENGTH, OTP_MIN_LENGTH};
use crate::settings::ValidationSettings;
use crate::widgets::form::{to_json_object, FormField, FormState};

fn num(v: Option<u32>) -> Option<f64> {
    v.map(f64::from)
}

pub fn build(settings: &ValidationSettings) -> FormState {
    let fields = match settings {
        ValidationSettings::Text(t) => vec![
            FormField::number("minLength", "Min length", num(t.min_length), true).with_minimum(0.0),
            FormField::number("maxLength", "Max length", num(t.max_length), true).with_minimum(0.0),
            FormField::text("pattern", "Pattern (regex)", t.pattern.as_deref().unwrap_or("")),
            FormField::text(
                "patternMessage",
                "Pattern message",
                t.pattern_message.as_deref().unwrap_or(""),
            ),
        ],
        ValidationSettings::Number(n) => vec![
            FormField::number("min", "Minimum", n.min, false),
            FormField::number("max", "Maximum", n.max, false),
            FormField::number("step", "Step", n.step, false),
            FormField::checkbox("integerOnly", "Whole numbers only", n.integer_only),
        ],
        ValidationSettings::Date(d) => vec![
            FormField::text("minDate", "Earliest date", d.min_date.as_deref().unwrap_or(""))
                .with_hint("YYYY-MM-DD"),
            FormField::text("maxDate", "Latest date", d.max_date.as_deref().unwrap_or(""))
                .with_hint("YYYY-MM-DD"),
        ],
        ValidationSettings::Otp(o) => vec![
            FormField::number("length", "Code length", Some(f64::from(o.length)), true)
                .with_minimum(f64::from(OTP_MIN_LENGTH))
                .with_hint(&format!("{OTP_MIN_LENGTH} to {OTP_MAX_LENGTH} digits")),
            FormField::checkbox("numericOnly", "Digits only", o.numeric_only),
        ],
        ValidationSettings::Items(i) => vec![
            FormField::number("minItems", "Min items", num(i.min_items), true).with_minimum(0.0),
            FormField::number("maxItems", "Max items", num(i.max_items), true).with_minimum(0.0),
        ],
        ValidationSettings::Media(m) => vec![
            FormField::number("maxSizeMb", "Max size (MB)", m.max_size_mb, false)
                .with_minimum(0.0),
            FormField::list("allowedTypes", "Allowed types", &m.allowed_types)
                .with_hint("comma separated, e.g. image/png, .pdf"),
        ],
        ValidationSettings::Generic(_) => Vec::new(),
    };
    let mut form = FormState::new("Validation", fields);
    if matches!(settings, ValidationSettings::Generic(_)) {
        form.message = Some("No validation options for this type".into());
    }
    if let Some(hint) = range_hint(settings) {
        form.message = Some(hint);
    }
    form
}

/// A lower bound above its upper bound is allowed but pointed out.
pub fn range_hint(settings: &ValidationSettings) -> Option<String> {
    let crossed =
        |lo: Option<f64>, hi: Option<f64>| matches!((lo, hi), (Some(a), Some(b)) if a > b);
    match settings {
        ValidationSettings::Text(t) if crossed(num(t.min_length), num(t.max_length)) => {
            Some("Min length is above max length".into())
        }
        ValidationSettings::Number(n) if crossed(n.min, n.max) => {
            Some("Minimum is above maximum".into())
        }
        ValidationSettings::Items(i) if crossed(num(i.min_items), num(i.max_items)) => {
            Some("Min items is above max items".into())
        }
        _ => None,
    }
}

/// Push the whole form as a partial update. Fields showing an inline error are
/// held back until they are fixed.
pub fn apply(form: &mut FormState, session: &mut SettingsSession) -> SessionEvent {
    let ev = session.update_validation(&to_json_object(form));
    form.message = range_hint(&session.settings().validation);
    ev
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, FieldType};
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
    fn text_form_round_trips_into_the_bucket() {
        let mut s = session(FieldType::Text);
        let mut form = build(&s.settings().validation);
        form.field_mut("maxLength").unwrap().set_text("120");
        form.field_mut("pattern").unwrap().set_text("^[a-z]+$");
        apply(&mut form, &mut s);
        let v = s.bucket_json(crate::settings::SettingsBucket::Validation);
        assert_eq!(v["maxLength"], json!(120));
        assert_eq!(v["pattern"], json!("^[a-z]+$"));
        assert!(v.get("minLength").is_none());
        assert_eq!(v["required"], json!(false));
    }

    #[test]
    fn crossed_bounds_are_hinted_not_rejected() {
        let mut s = session(FieldType::Number);
        let mut form = build(&s.settings().validation);
        form.field_mut("min").unwrap().set_text("10");
        form.field_mut("max").unwrap().set_text("5");
        apply(&mut form, &mut s);
        match &s.settings().validation {
            ValidationSettings::Number(n) => {
                assert_eq!(n.min, Some(10.0));
                assert_eq!(n.max, Some(5.0));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(form.message.as_deref(), Some("Minimum is above maximum"));
    }

    #[test]
    fn otp_form_shows_length() {
        let s = session(FieldType::Otp);
        let form = build(&s.settings().validation);
        assert_eq!(form.text("length"), "6");
        assert!(form.checked("numericOnly"));
    }

    #[test]
    fn generic_types_have_no_fields() {
        let s = session(FieldType::Boolean);
        let form = build(&s.settings().validation);
        assert!(form.fields.is_empty());
        assert_eq!(form.message.as_deref(), Some("No validation options for this type"));
    }
}
