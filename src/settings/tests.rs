use super::*;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn appearance_defaults_fill_every_key() {
    let a = normalize_appearance(&json!({}));
    assert_eq!(a.ui_variant, UiVariant::Standard);
    assert_eq!(a.theme, ThemePreset::Classic);
    assert!(!a.float_label);
    assert_eq!(a.width, "100%");
    let v = a.to_json();
    for key in [
        "uiVariant",
        "colors",
        "theme",
        "customCSS",
        "floatLabel",
        "filled",
        "width",
        "showCharCount",
        "hidden_in_forms",
    ] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn appearance_tolerates_non_object_input() {
    assert_eq!(normalize_appearance(&json!("nope")), AppearanceSettings::default());
    assert_eq!(normalize_appearance(&JsonValue::Null), AppearanceSettings::default());
    assert_eq!(normalize_appearance(&json!([1, 2])), AppearanceSettings::default());
}

#[test]
fn appearance_coerces_unknown_variant_and_keeps_unknown_keys() {
    let a = normalize_appearance(&json!({
        "uiVariant": "neon",
        "theme": "modern",
        "tooltip": {"placement": "top"}
    }));
    assert_eq!(a.ui_variant, UiVariant::Standard);
    assert_eq!(a.theme, ThemePreset::Modern);
    assert_eq!(a.extra.get("tooltip"), Some(&json!({"placement": "top"})));
    assert_eq!(a.to_json()["tooltip"]["placement"], "top");
}

#[test]
fn appearance_reads_legacy_shapes() {
    let a = normalize_appearance(&json!({
        "variant": "pill",
        "customCss": "color: red;",
        "borderColor": "#ff0000",
        "colors": {"text": "#111111"},
        "hiddenInForms": true
    }));
    assert_eq!(a.ui_variant, UiVariant::Pill);
    assert_eq!(a.custom_css, "color: red;");
    assert_eq!(a.colors.get(ColorRole::Border), Some("#ff0000"));
    assert_eq!(a.colors.get(ColorRole::Text), Some("#111111"));
    assert!(a.hidden_in_forms);
    let v = a.to_json();
    assert!(v.get("variant").is_none());
    assert!(v.get("customCss").is_none());
    assert!(v.get("borderColor").is_none());
}

#[test]
fn current_variant_key_wins_over_legacy() {
    let a = normalize_appearance(&json!({"variant": "pill", "uiVariant": "material"}));
    assert_eq!(a.ui_variant, UiVariant::Material);
}

#[test]
fn ill_typed_known_keys_fall_back_to_defaults() {
    let a = normalize_appearance(&json!({
        "floatLabel": {"x": 1},
        "filled": "yes",
        "theme": 42,
        "width": ""
    }));
    assert!(!a.float_label);
    assert!(a.filled);
    assert_eq!(a.theme, ThemePreset::Classic);
    assert_eq!(a.width, "100%");
}

#[test]
fn validation_family_follows_field_type() {
    let v = normalize_validation(FieldType::Number, &json!({"min": "1", "max": 10, "step": -1}));
    match v {
        ValidationSettings::Number(n) => {
            assert_eq!(n.min, Some(1.0));
            assert_eq!(n.max, Some(10.0));
            assert_eq!(n.step, None);
        }
        other => panic!("expected number validation, got {other:?}"),
    }
    let otp = normalize_validation(FieldType::Otp, &json!({}));
    match otp {
        ValidationSettings::Otp(o) => assert_eq!(o.length, 6),
        other => panic!("expected otp validation, got {other:?}"),
    }
    assert!(matches!(
        normalize_validation(FieldType::Boolean, &json!({"x": 1})),
        ValidationSettings::Generic(_)
    ));
}

#[test]
fn number_min_greater_than_max_is_kept_verbatim() {
    let v = normalize_validation(FieldType::Number, &json!({"min": 10, "max": 1}));
    match v {
        ValidationSettings::Number(n) => {
            assert_eq!(n.min, Some(10.0));
            assert_eq!(n.max, Some(1.0));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn required_is_derived_from_the_field_flag() {
    let s = FieldSettings::from_raw(
        FieldType::Text,
        &crate::model::RawSettings {
            validation: json!({"required": true, "minLength": 2})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            ..Default::default()
        },
    );
    let raw = s.to_raw(false);
    assert_eq!(raw.validation.get("required"), Some(&json!(false)));
    assert_eq!(raw.validation.get("minLength"), Some(&json!(2)));
}

#[test]
fn advanced_defaults_depend_on_type() {
    match normalize_advanced(FieldType::Currency, &json!({})) {
        AdvancedSettings::Number(n) => {
            assert_eq!(n.currency.as_deref(), Some("USD"));
            assert_eq!(n.decimal_places, Some(2));
            assert_eq!(n.locale, "en-US");
        }
        other => panic!("unexpected {other:?}"),
    }
    match normalize_advanced(FieldType::Daterange, &json!({})) {
        AdvancedSettings::Date(d) => assert!(d.allow_range_selection),
        other => panic!("unexpected {other:?}"),
    }
    match normalize_advanced(FieldType::Number, &json!({"buttonLayout": "diagonal"})) {
        AdvancedSettings::Number(n) => assert_eq!(n.button_layout, ButtonLayout::Stacked),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn choice_options_accept_objects_and_csv() {
    match normalize_advanced(
        FieldType::Select,
        &json!({"options": [{"label": "Red", "value": "red"}, "blue"]}),
    ) {
        AdvancedSettings::Choice(c) => assert_eq!(c.options, vec!["red", "blue"]),
        other => panic!("unexpected {other:?}"),
    }
    match normalize_advanced(FieldType::Tags, &json!({"options": "a, b,,c"})) {
        AdvancedSettings::Choice(c) => {
            assert_eq!(c.options, vec!["a", "b", "c"]);
            assert!(c.allow_custom);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn shallow_merge_replaces_top_level_keys_only() {
    let base = json!({"colors": {"border": "#000"}, "theme": "classic"});
    let merged = shallow_merge(&base, &json!({"colors": {"text": "#fff"}}));
    assert_eq!(merged["colors"], json!({"text": "#fff"}));
    assert_eq!(merged["theme"], "classic");
}

// -------- properties --------------------------------------------------------

fn arb_scalar() -> impl Strategy<Value = JsonValue> {
    prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        (-1000i64..1000).prop_map(|n| json!(n)),
        "[a-z#0-9 :;%-]{0,12}".prop_map(JsonValue::String),
    ]
}

fn arb_settings_object() -> impl Strategy<Value = JsonValue> {
    let keys = prop_oneof![
        Just("uiVariant".to_string()),
        Just("variant".to_string()),
        Just("theme".to_string()),
        Just("customCSS".to_string()),
        Just("customCss".to_string()),
        Just("floatLabel".to_string()),
        Just("filled".to_string()),
        Just("width".to_string()),
        Just("borderColor".to_string()),
        Just("hidden_in_forms".to_string()),
        Just("min".to_string()),
        Just("max".to_string()),
        Just("prefix".to_string()),
        Just("dateFormat".to_string()),
        Just("length".to_string()),
        Just("options".to_string()),
        "[a-z]{1,8}",
    ];
    let colors = prop::collection::btree_map(
        prop_oneof![
            Just("border".to_string()),
            Just("text".to_string()),
            Just("focus".to_string()),
            "[a-z]{1,5}"
        ],
        arb_scalar(),
        0..4,
    )
    .prop_map(|m| JsonValue::Object(m.into_iter().collect()));
    (
        prop::collection::btree_map(keys, arb_scalar(), 0..8),
        prop::option::of(colors),
    )
        .prop_map(|(m, colors)| {
            let mut obj: Map<String, JsonValue> = m.into_iter().collect();
            if let Some(c) = colors {
                obj.insert("colors".into(), c);
            }
            JsonValue::Object(obj)
        })
}

proptest! {
    #[test]
    fn normalize_appearance_is_idempotent(raw in arb_settings_object()) {
        let once = normalize_appearance(&raw);
        let twice = normalize_appearance(&once.to_json());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn every_bucket_normalization_is_idempotent(
        raw in arb_settings_object(),
        idx in 0usize..FieldType::ALL.len(),
    ) {
        let ft = FieldType::ALL[idx];
        for bucket in SettingsBucket::ALL {
            let once = normalize_bucket(bucket, ft, &raw);
            let twice = normalize_bucket(bucket, ft, &once);
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn unknown_variant_strings_become_standard(s in "\\PC{0,16}") {
        prop_assume!(!UiVariant::ALL.iter().any(|v| v.as_str() == s));
        prop_assert_eq!(validate_ui_variant(&s), UiVariant::Standard);
    }
}

#[test]
fn known_variants_pass_through_unchanged() {
    for v in UiVariant::ALL {
        assert_eq!(validate_ui_variant(v.as_str()), v);
    }
}
