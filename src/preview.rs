//! Live field preview. Pure: settings in, a description of the rendered input
//! out. The terminal renderer in `widgets::preview_view` draws from this, and the
//! markup string is what a web form would emit.

use crate::css::{parse_custom_css, style_to_inline, CssParseError, StyleMap};
use crate::model::{FieldType, TypeGroup};
use crate::settings::{AdvancedSettings, AppearanceSettings, ColorRole, ThemePreset, UiVariant};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Default,
    Hover,
    Focus,
    Disabled,
    Error,
}

impl PreviewState {
    pub const ALL: [PreviewState; 5] = [
        PreviewState::Default,
        PreviewState::Hover,
        PreviewState::Focus,
        PreviewState::Disabled,
        PreviewState::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PreviewState::Default => "default",
            PreviewState::Hover => "hover",
            PreviewState::Focus => "focus",
            PreviewState::Disabled => "disabled",
            PreviewState::Error => "error",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Input(&'static str),
    Textarea,
    Select { multiple: bool },
    Checkbox,
    Switch,
    Choices,
    Upload,
    Picker,
    Code,
}

impl ElementKind {
    pub fn for_type(ft: FieldType) -> Self {
        use FieldType as F;
        match ft {
            F::Textarea | F::RichText | F::Markdown | F::Blocks => ElementKind::Textarea,
            F::Email => ElementKind::Input("email"),
            F::Password => ElementKind::Input("password"),
            F::Url => ElementKind::Input("url"),
            F::Phone => ElementKind::Input("tel"),
            F::Number | F::Decimal | F::Currency | F::Percentage | F::Rating => {
                ElementKind::Input("number")
            }
            F::Range => ElementKind::Input("range"),
            F::Date | F::Daterange => ElementKind::Input("date"),
            F::Datetime => ElementKind::Input("datetime-local"),
            F::Time => ElementKind::Input("time"),
            F::Color => ElementKind::Input("color"),
            F::Boolean => ElementKind::Checkbox,
            F::Toggle => ElementKind::Switch,
            F::Select => ElementKind::Select { multiple: false },
            F::Multiselect | F::Tags => ElementKind::Select { multiple: true },
            F::Radio | F::CheckboxGroup => ElementKind::Choices,
            F::Media | F::File | F::Gallery => ElementKind::Upload,
            F::Relation | F::Component | F::Repeater | F::Icon | F::Map => ElementKind::Picker,
            F::Json => ElementKind::Code,
            _ => ElementKind::Input("text"),
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ElementKind::Input(_) | ElementKind::Checkbox | ElementKind::Switch => "input",
            ElementKind::Textarea | ElementKind::Code => "textarea",
            ElementKind::Select { .. } => "select",
            ElementKind::Choices | ElementKind::Upload | ElementKind::Picker => "div",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewLayer {
    Variant(UiVariant),
    Theme(ThemePreset),
    State(PreviewState),
    CustomCss,
}

/// What the preview needs to know about the field besides its type.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewInput {
    pub label: String,
    pub placeholder: String,
    pub help_text: String,
    pub required: bool,
    pub max_length: Option<u32>,
    pub appearance: AppearanceSettings,
    pub advanced: Option<AdvancedSettings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPreview {
    pub element: ElementKind,
    pub markup: String,
    pub attributes: BTreeMap<String, String>,
    pub style: StyleMap,
    pub label_style: StyleMap,
    pub layers: Vec<PreviewLayer>,
    pub css_error: Option<CssParseError>,
}

impl FieldPreview {
    pub fn is_disabled(&self) -> bool {
        self.attributes.contains_key("disabled")
    }
}

pub struct Palette {
    pub border: &'static str,
    pub text: &'static str,
    pub background: &'static str,
    pub focus: &'static str,
    pub label: &'static str,
    pub radius: &'static str,
    pub font: &'static str,
}

pub const ERROR_COLOR: &str = "#dc2626";

pub fn palette(theme: ThemePreset, dark: bool) -> Palette {
    match (theme, dark) {
        (ThemePreset::Classic, false) => Palette {
            border: "#d1d5db",
            text: "#111827",
            background: "#ffffff",
            focus: "#2563eb",
            label: "#374151",
            radius: "6px",
            font: "system-ui, sans-serif",
        },
        (ThemePreset::Classic, true) => Palette {
            border: "#4b5563",
            text: "#f9fafb",
            background: "#1f2937",
            focus: "#60a5fa",
            label: "#d1d5db",
            radius: "6px",
            font: "system-ui, sans-serif",
        },
        (ThemePreset::Modern, false) => Palette {
            border: "#e4e4e7",
            text: "#18181b",
            background: "#fafafa",
            focus: "#7c3aed",
            label: "#52525b",
            radius: "10px",
            font: "Inter, sans-serif",
        },
        (ThemePreset::Modern, true) => Palette {
            border: "#3f3f46",
            text: "#fafafa",
            background: "#18181b",
            focus: "#a78bfa",
            label: "#a1a1aa",
            radius: "10px",
            font: "Inter, sans-serif",
        },
        (ThemePreset::Playful, false) => Palette {
            border: "#f9a8d4",
            text: "#831843",
            background: "#fdf2f8",
            focus: "#ec4899",
            label: "#be185d",
            radius: "16px",
            font: "\"Comic Neue\", cursive",
        },
        (ThemePreset::Playful, true) => Palette {
            border: "#9d174d",
            text: "#fce7f3",
            background: "#500724",
            focus: "#f472b6",
            label: "#fbcfe8",
            radius: "16px",
            font: "\"Comic Neue\", cursive",
        },
        (ThemePreset::Minimal, false) => Palette {
            border: "#e5e5e5",
            text: "#171717",
            background: "#ffffff",
            focus: "#171717",
            label: "#737373",
            radius: "0",
            font: "system-ui, sans-serif",
        },
        (ThemePreset::Minimal, true) => Palette {
            border: "#404040",
            text: "#fafafa",
            background: "#0a0a0a",
            focus: "#fafafa",
            label: "#a3a3a3",
            radius: "0",
            font: "system-ui, sans-serif",
        },
        (ThemePreset::Corporate, false) => Palette {
            border: "#cbd5e1",
            text: "#0f172a",
            background: "#f8fafc",
            focus: "#0369a1",
            label: "#334155",
            radius: "4px",
            font: "\"IBM Plex Sans\", sans-serif",
        },
        (ThemePreset::Corporate, true) => Palette {
            border: "#475569",
            text: "#f1f5f9",
            background: "#0f172a",
            focus: "#38bdf8",
            label: "#cbd5e1",
            radius: "4px",
            font: "\"IBM Plex Sans\", sans-serif",
        },
    }
}

fn set(style: &mut StyleMap, k: &str, v: impl Into<String>) {
    style.insert(k.to_string(), v.into());
}

fn variant_layer(style: &mut StyleMap, a: &AppearanceSettings) {
    match a.ui_variant {
        UiVariant::Standard => {
            set(style, "border", "1px solid");
            set(style, "padding", "8px 12px");
        }
        UiVariant::Material => {
            set(style, "border", "none");
            set(style, "border-bottom", "2px solid");
            set(style, "border-radius", "4px 4px 0 0");
            set(style, "padding", "16px 12px 6px");
        }
        UiVariant::Pill => {
            set(style, "border", "1px solid");
            set(style, "border-radius", "9999px");
            set(style, "padding", "8px 18px");
        }
        UiVariant::Borderless => {
            set(style, "border", "none");
            set(style, "background-color", "transparent");
            set(style, "padding", "8px 0");
        }
        UiVariant::Underlined => {
            set(style, "border", "none");
            set(style, "border-bottom", "1px solid");
            set(style, "border-radius", "0");
            set(style, "padding", "6px 0");
        }
    }
    set(style, "width", a.width.clone());
}

fn theme_layer(style: &mut StyleMap, label: &mut StyleMap, a: &AppearanceSettings, dark: bool) {
    let p = palette(a.theme, dark);
    let c = |role: ColorRole, fallback: &'static str| -> String {
        a.colors.get(role).unwrap_or(fallback).to_string()
    };
    set(style, "border-color", c(ColorRole::Border, p.border));
    set(style, "color", c(ColorRole::Text, p.text));
    set(style, "font-family", p.font);
    if !style.contains_key("border-radius") {
        set(style, "border-radius", p.radius);
    }
    let transparent = style.get("background-color").map(|v| v == "transparent").unwrap_or(false);
    if a.filled || !transparent || a.colors.background.is_some() {
        set(style, "background-color", c(ColorRole::Background, p.background));
    }
    set(label, "color", c(ColorRole::Label, p.label));
    if a.float_label {
        set(label, "position", "absolute");
        set(label, "font-size", "0.75em");
    }
}

fn state_layer(
    style: &mut StyleMap,
    attrs: &mut BTreeMap<String, String>,
    a: &AppearanceSettings,
    state: PreviewState,
    dark: bool,
) {
    let focus = a
        .colors
        .get(ColorRole::Focus)
        .unwrap_or(palette(a.theme, dark).focus)
        .to_string();
    match state {
        PreviewState::Default => {}
        PreviewState::Hover => set(style, "border-color", focus),
        PreviewState::Focus => {
            set(style, "border-color", focus.clone());
            set(style, "outline", format!("2px solid {focus}"));
            set(style, "outline-offset", "1px");
        }
        PreviewState::Disabled => {
            set(style, "opacity", "0.6");
            set(style, "cursor", "not-allowed");
            attrs.insert("disabled".into(), String::new());
        }
        PreviewState::Error => {
            set(style, "border-color", ERROR_COLOR);
            attrs.insert("aria-invalid".into(), "true".into());
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn attrs_markup(attrs: &BTreeMap<String, String>) -> String {
    attrs
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                format!(" {k}")
            } else {
                format!(" {k}=\"{}\"", escape(v))
            }
        })
        .collect()
}

fn affixes(advanced: Option<&AdvancedSettings>) -> (Option<String>, Option<String>) {
    match advanced {
        Some(AdvancedSettings::Number(n)) => {
            let prefix = n.prefix.clone().or_else(|| n.currency.clone());
            (prefix, n.suffix.clone())
        }
        _ => (None, None),
    }
}

/// Layers, in order: variant, theme (palette then user colours), interaction
/// state, then custom CSS. A CSS parse failure leaves the CSS layer out.
pub fn render_preview(
    field_type: FieldType,
    input: &PreviewInput,
    state: PreviewState,
    dark: bool,
) -> FieldPreview {
    let a = &input.appearance;
    let element = ElementKind::for_type(field_type);
    let mut style = StyleMap::new();
    let mut label_style = StyleMap::new();
    let mut attributes = BTreeMap::new();
    let mut layers = Vec::with_capacity(4);

    variant_layer(&mut style, a);
    layers.push(PreviewLayer::Variant(a.ui_variant));

    theme_layer(&mut style, &mut label_style, a, dark);
    layers.push(PreviewLayer::Theme(a.theme));

    state_layer(&mut style, &mut attributes, a, state, dark);
    layers.push(PreviewLayer::State(state));

    let mut css_error = None;
    if !a.custom_css.trim().is_empty() {
        match parse_custom_css(&a.custom_css) {
            Ok(overlay) => {
                style.extend(overlay);
                layers.push(PreviewLayer::CustomCss);
            }
            Err(e) => {
                tracing::debug!(error = %e, "custom CSS ignored in preview");
                css_error = Some(e);
            }
        }
    }

    if let ElementKind::Input(kind) = element {
        attributes.insert("type".into(), kind.into());
    }
    match element {
        ElementKind::Checkbox => {
            attributes.insert("type".into(), "checkbox".into());
        }
        ElementKind::Switch => {
            attributes.insert("type".into(), "checkbox".into());
            attributes.insert("role".into(), "switch".into());
        }
        ElementKind::Select { multiple: true } => {
            attributes.insert("multiple".into(), String::new());
        }
        _ => {}
    }
    if !input.placeholder.is_empty() && !a.float_label {
        attributes.insert("placeholder".into(), input.placeholder.clone());
    }
    if input.required {
        attributes.insert("required".into(), String::new());
    }
    if let Some(max) = input.max_length {
        if field_type.group() == TypeGroup::Text {
            attributes.insert("maxlength".into(), max.to_string());
        }
    }
    if a.hidden_in_forms {
        attributes.insert("data-hidden-in-forms".into(), "true".into());
    }
    attributes.insert("data-variant".into(), a.ui_variant.as_str().into());

    let markup = build_markup(
        element,
        input,
        &attributes,
        &style,
        &label_style,
        affixes(input.advanced.as_ref()),
    );

    FieldPreview {
        element,
        markup,
        attributes,
        style,
        label_style,
        layers,
        css_error,
    }
}

fn build_markup(
    element: ElementKind,
    input: &PreviewInput,
    attrs: &BTreeMap<String, String>,
    style: &StyleMap,
    label_style: &StyleMap,
    (prefix, suffix): (Option<String>, Option<String>),
) -> String {
    let mut out = String::new();
    let star = if input.required { " *" } else { "" };
    out.push_str(&format!(
        "<label style=\"{}\">{}{star}</label>",
        escape(&style_to_inline(label_style)),
        escape(&input.label)
    ));
    if let Some(p) = prefix {
        out.push_str(&format!("<span class=\"prefix\">{}</span>", escape(&p)));
    }
    let tag = element.tag();
    let inline = escape(&style_to_inline(style));
    match tag {
        "input" => out.push_str(&format!("<input{} style=\"{inline}\" />", attrs_markup(attrs))),
        _ => out.push_str(&format!("<{tag}{} style=\"{inline}\"></{tag}>", attrs_markup(attrs))),
    }
    if let Some(s) = suffix {
        out.push_str(&format!("<span class=\"suffix\">{}</span>", escape(&s)));
    }
    if input.appearance.show_char_count {
        let max = input.max_length.map(|m| format!(" / {m}")).unwrap_or_default();
        out.push_str(&format!("<small class=\"char-count\">0{max}</small>"));
    }
    if !input.help_text.is_empty() {
        out.push_str(&format!("<small class=\"help\">{}</small>", escape(&input.help_text)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::normalize_appearance;
    use serde_json::json;

    fn input(appearance: AppearanceSettings) -> PreviewInput {
        PreviewInput {
            label: "Title".into(),
            placeholder: "Enter a title".into(),
            help_text: String::new(),
            required: true,
            max_length: Some(80),
            appearance,
            advanced: None,
        }
    }

    #[test]
    fn disabled_state_sets_attribute_without_touching_settings() {
        let appearance = normalize_appearance(&json!({"uiVariant": "pill"}));
        let before = appearance.clone();
        let inp = input(appearance);
        let p = render_preview(FieldType::Text, &inp, PreviewState::Disabled, false);
        assert!(p.is_disabled());
        assert!(p.markup.contains(" disabled"));
        assert_eq!(p.style.get("opacity").map(String::as_str), Some("0.6"));
        assert_eq!(inp.appearance, before);

        for state in [
            PreviewState::Default,
            PreviewState::Hover,
            PreviewState::Focus,
            PreviewState::Error,
        ] {
            assert!(!render_preview(FieldType::Text, &inp, state, false).is_disabled());
        }
    }

    #[test]
    fn layers_apply_in_order_and_user_colours_beat_theme() {
        let a = normalize_appearance(&json!({
            "uiVariant": "material",
            "theme": "modern",
            "colors": {"border": "#ff0000"},
            "customCSS": "border-color: #00ff00; letter-spacing: 1px"
        }));
        let p = render_preview(FieldType::Text, &input(a.clone()), PreviewState::Default, false);
        assert_eq!(
            p.layers,
            vec![
                PreviewLayer::Variant(UiVariant::Material),
                PreviewLayer::Theme(ThemePreset::Modern),
                PreviewLayer::State(PreviewState::Default),
                PreviewLayer::CustomCss,
            ]
        );
        // custom CSS is the last word
        assert_eq!(p.style.get("border-color").map(String::as_str), Some("#00ff00"));
        assert_eq!(p.style.get("letter-spacing").map(String::as_str), Some("1px"));

        let mut no_css = a;
        no_css.custom_css.clear();
        let p = render_preview(FieldType::Text, &input(no_css), PreviewState::Default, false);
        assert_eq!(p.style.get("border-color").map(String::as_str), Some("#ff0000"));
    }

    #[test]
    fn broken_css_reports_error_and_skips_overlay() {
        let a = normalize_appearance(&json!({"customCSS": "color red"}));
        let p = render_preview(FieldType::Email, &input(a), PreviewState::Focus, true);
        assert!(p.css_error.is_some());
        assert!(!p.layers.contains(&PreviewLayer::CustomCss));
        assert_eq!(p.attributes.get("type").map(String::as_str), Some("email"));
        assert_eq!(p.style.get("border-color").map(String::as_str), Some("#60a5fa"));
    }

    #[test]
    fn dark_mode_switches_palette() {
        let a = AppearanceSettings::default();
        let light = render_preview(
            FieldType::Text,
            &input(a.clone()),
            PreviewState::Default,
            false,
        );
        let dark = render_preview(FieldType::Text, &input(a), PreviewState::Default, true);
        assert_ne!(light.style.get("background-color"), dark.style.get("background-color"));
    }

    #[test]
    fn error_state_marks_input_invalid() {
        let p = render_preview(
            FieldType::Text,
            &input(AppearanceSettings::default()),
            PreviewState::Error,
            false,
        );
        assert_eq!(p.attributes.get("aria-invalid").map(String::as_str), Some("true"));
        assert_eq!(p.style.get("border-color").map(String::as_str), Some(ERROR_COLOR));
    }

    #[test]
    fn number_affixes_and_element_kinds() {
        let inp = PreviewInput {
            advanced: Some(crate::settings::normalize_advanced(FieldType::Currency, &json!({}))),
            ..input(AppearanceSettings::default())
        };
        let p = render_preview(FieldType::Currency, &inp, PreviewState::Default, false);
        assert!(p.markup.contains("<span class=\"prefix\">USD</span>"));
        assert_eq!(ElementKind::for_type(FieldType::Toggle), ElementKind::Switch);
        assert_eq!(ElementKind::for_type(FieldType::Tags), ElementKind::Select { multiple: true });
        assert_eq!(PreviewState::Error.next(), PreviewState::Default);
    }
}
