use super::{object_of, take_bool, take_non_empty_str, take_str};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UiVariant {
    #[default]
    Standard,
    Material,
    Pill,
    Borderless,
    Underlined,
}

impl UiVariant {
    pub const ALL: [UiVariant; 5] = [
        UiVariant::Standard,
        UiVariant::Material,
        UiVariant::Pill,
        UiVariant::Borderless,
        UiVariant::Underlined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UiVariant::Standard => "standard",
            UiVariant::Material => "material",
            UiVariant::Pill => "pill",
            UiVariant::Borderless => "borderless",
            UiVariant::Underlined => "underlined",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UiVariant::Standard => "Standard",
            UiVariant::Material => "Material",
            UiVariant::Pill => "Pill",
            UiVariant::Borderless => "Borderless",
            UiVariant::Underlined => "Underlined",
        }
    }
}

/// The single gate every `uiVariant` value passes through.
pub fn validate_ui_variant(raw: &str) -> UiVariant {
    match UiVariant::ALL.iter().find(|v| v.as_str() == raw) {
        Some(v) => *v,
        None => {
            tracing::warn!(variant = raw, "unknown uiVariant, falling back to standard");
            UiVariant::Standard
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreset {
    #[default]
    Classic,
    Modern,
    Playful,
    Minimal,
    Corporate,
}

impl ThemePreset {
    pub const ALL: [ThemePreset; 5] = [
        ThemePreset::Classic,
        ThemePreset::Modern,
        ThemePreset::Playful,
        ThemePreset::Minimal,
        ThemePreset::Corporate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreset::Classic => "classic",
            ThemePreset::Modern => "modern",
            ThemePreset::Playful => "playful",
            ThemePreset::Minimal => "minimal",
            ThemePreset::Corporate => "corporate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemePreset::Classic => "Classic",
            ThemePreset::Modern => "Modern",
            ThemePreset::Playful => "Playful",
            ThemePreset::Minimal => "Minimal",
            ThemePreset::Corporate => "Corporate",
        }
    }

    fn parse(raw: &str) -> ThemePreset {
        ThemePreset::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == raw)
            .unwrap_or_else(|| {
                tracing::debug!(theme = raw, "unknown theme preset, using classic");
                ThemePreset::Classic
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRole {
    Border,
    Text,
    Background,
    Focus,
    Label,
}

impl ColorRole {
    pub const ALL: [ColorRole; 5] = [
        ColorRole::Border,
        ColorRole::Text,
        ColorRole::Background,
        ColorRole::Focus,
        ColorRole::Label,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ColorRole::Border => "border",
            ColorRole::Text => "text",
            ColorRole::Background => "background",
            ColorRole::Focus => "focus",
            ColorRole::Label => "label",
        }
    }

    fn legacy_key(self) -> &'static str {
        match self {
            ColorRole::Border => "borderColor",
            ColorRole::Text => "textColor",
            ColorRole::Background => "backgroundColor",
            ColorRole::Focus => "focusColor",
            ColorRole::Label => "labelColor",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColorRoles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ColorRoles {
    pub fn get(&self, role: ColorRole) -> Option<&str> {
        match role {
            ColorRole::Border => self.border.as_deref(),
            ColorRole::Text => self.text.as_deref(),
            ColorRole::Background => self.background.as_deref(),
            ColorRole::Focus => self.focus.as_deref(),
            ColorRole::Label => self.label.as_deref(),
        }
    }

    pub fn set(&mut self, role: ColorRole, value: Option<String>) {
        let value = value.filter(|s| !s.trim().is_empty());
        match role {
            ColorRole::Border => self.border = value,
            ColorRole::Text => self.text = value,
            ColorRole::Background => self.background = value,
            ColorRole::Focus => self.focus = value,
            ColorRole::Label => self.label = value,
        }
    }
}

/// Canonical appearance bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppearanceSettings {
    #[serde(rename = "uiVariant")]
    pub ui_variant: UiVariant,
    pub colors: ColorRoles,
    pub theme: ThemePreset,
    #[serde(rename = "customCSS")]
    pub custom_css: String,
    #[serde(rename = "floatLabel")]
    pub float_label: bool,
    pub filled: bool,
    pub width: String,
    #[serde(rename = "showCharCount")]
    pub show_char_count: bool,
    pub hidden_in_forms: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

pub const DEFAULT_WIDTH: &str = "100%";

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            ui_variant: UiVariant::Standard,
            colors: ColorRoles::default(),
            theme: ThemePreset::Classic,
            custom_css: String::new(),
            float_label: false,
            filled: false,
            width: DEFAULT_WIDTH.to_string(),
            show_char_count: false,
            hidden_in_forms: false,
            extra: Map::new(),
        }
    }
}

impl AppearanceSettings {
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Map::new()))
    }
}

pub fn normalize_appearance(raw: &JsonValue) -> AppearanceSettings {
    let mut obj = object_of(raw.clone());
    let mut out = AppearanceSettings::default();

    // `uiVariant` wins over the legacy `variant`; both are consumed.
    let current = obj.remove("uiVariant");
    let legacy = obj.remove("variant");
    match current.filter(|v| !v.is_null()).or(legacy.filter(|v| !v.is_null())) {
        Some(JsonValue::String(s)) => out.ui_variant = validate_ui_variant(&s),
        Some(other) => out.ui_variant = validate_ui_variant(&other.to_string()),
        None => {}
    }

    let css = take_str(&mut obj, "customCSS");
    let legacy_css = take_str(&mut obj, "customCss");
    out.custom_css = css.or(legacy_css).unwrap_or_default();

    let mut colors = match obj.remove("colors") {
        Some(JsonValue::Object(m)) => m,
        _ => Map::new(),
    };
    for role in ColorRole::ALL {
        let value = take_non_empty_str(&mut colors, role.key());
        let legacy = take_non_empty_str(&mut obj, role.legacy_key());
        out.colors.set(role, value.or(legacy));
    }
    out.colors.extra = colors;

    if let Some(t) = take_str(&mut obj, "theme") {
        out.theme = ThemePreset::parse(&t);
    }
    if let Some(b) = take_bool(&mut obj, "floatLabel") {
        out.float_label = b;
    }
    if let Some(b) = take_bool(&mut obj, "filled") {
        out.filled = b;
    }
    if let Some(w) = take_non_empty_str(&mut obj, "width") {
        out.width = w;
    }
    if let Some(b) = take_bool(&mut obj, "showCharCount") {
        out.show_char_count = b;
    }
    let hidden = take_bool(&mut obj, "hidden_in_forms");
    let legacy_hidden = take_bool(&mut obj, "hiddenInForms");
    out.hidden_in_forms = hidden.or(legacy_hidden).unwrap_or(false);

    out.extra = obj;
    out
}
