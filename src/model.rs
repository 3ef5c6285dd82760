use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Every field type the content model knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    RichText,
    Markdown,
    Blocks,
    Number,
    Decimal,
    Currency,
    Percentage,
    Range,
    Rating,
    Email,
    Password,
    Url,
    Phone,
    Slug,
    Uuid,
    Otp,
    Mask,
    Autocomplete,
    Tags,
    Date,
    Datetime,
    Time,
    Daterange,
    Boolean,
    Toggle,
    Select,
    Multiselect,
    Radio,
    CheckboxGroup,
    Color,
    Icon,
    Media,
    File,
    Gallery,
    Relation,
    Component,
    Repeater,
    Json,
    Map,
    #[serde(other)]
    Unknown,
}

/// Groups shown in the type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeGroup {
    Text,
    Numbers,
    DateTime,
    Choice,
    Media,
    Relational,
    Special,
}

impl TypeGroup {
    pub fn label(self) -> &'static str {
        match self {
            TypeGroup::Text => "Text",
            TypeGroup::Numbers => "Numbers",
            TypeGroup::DateTime => "Date & Time",
            TypeGroup::Choice => "Choice",
            TypeGroup::Media => "Media",
            TypeGroup::Relational => "Relational",
            TypeGroup::Special => "Special",
        }
    }
}

impl FieldType {
    pub const ALL: [FieldType; 41] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::RichText,
        FieldType::Markdown,
        FieldType::Blocks,
        FieldType::Email,
        FieldType::Password,
        FieldType::Url,
        FieldType::Phone,
        FieldType::Slug,
        FieldType::Uuid,
        FieldType::Otp,
        FieldType::Mask,
        FieldType::Autocomplete,
        FieldType::Tags,
        FieldType::Number,
        FieldType::Decimal,
        FieldType::Currency,
        FieldType::Percentage,
        FieldType::Range,
        FieldType::Rating,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Time,
        FieldType::Daterange,
        FieldType::Boolean,
        FieldType::Toggle,
        FieldType::Select,
        FieldType::Multiselect,
        FieldType::Radio,
        FieldType::CheckboxGroup,
        FieldType::Color,
        FieldType::Media,
        FieldType::File,
        FieldType::Gallery,
        FieldType::Relation,
        FieldType::Component,
        FieldType::Repeater,
        FieldType::Json,
        FieldType::Icon,
        FieldType::Map,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::RichText => "rich_text",
            FieldType::Markdown => "markdown",
            FieldType::Blocks => "blocks",
            FieldType::Number => "number",
            FieldType::Decimal => "decimal",
            FieldType::Currency => "currency",
            FieldType::Percentage => "percentage",
            FieldType::Range => "range",
            FieldType::Rating => "rating",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Url => "url",
            FieldType::Phone => "phone",
            FieldType::Slug => "slug",
            FieldType::Uuid => "uuid",
            FieldType::Otp => "otp",
            FieldType::Mask => "mask",
            FieldType::Autocomplete => "autocomplete",
            FieldType::Tags => "tags",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Time => "time",
            FieldType::Daterange => "daterange",
            FieldType::Boolean => "boolean",
            FieldType::Toggle => "toggle",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Radio => "radio",
            FieldType::CheckboxGroup => "checkbox_group",
            FieldType::Color => "color",
            FieldType::Icon => "icon",
            FieldType::Media => "media",
            FieldType::File => "file",
            FieldType::Gallery => "gallery",
            FieldType::Relation => "relation",
            FieldType::Component => "component",
            FieldType::Repeater => "repeater",
            FieldType::Json => "json",
            FieldType::Map => "map",
            FieldType::Unknown => "unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldType::Text => "Short text",
            FieldType::Textarea => "Long text",
            FieldType::RichText => "Rich text",
            FieldType::Markdown => "Markdown",
            FieldType::Blocks => "Block editor",
            FieldType::Number => "Number",
            FieldType::Decimal => "Decimal",
            FieldType::Currency => "Currency",
            FieldType::Percentage => "Percentage",
            FieldType::Range => "Range slider",
            FieldType::Rating => "Rating",
            FieldType::Email => "Email",
            FieldType::Password => "Password",
            FieldType::Url => "URL",
            FieldType::Phone => "Phone",
            FieldType::Slug => "Slug",
            FieldType::Uuid => "UUID",
            FieldType::Otp => "One-time code",
            FieldType::Mask => "Masked input",
            FieldType::Autocomplete => "Autocomplete",
            FieldType::Tags => "Tags",
            FieldType::Date => "Date",
            FieldType::Datetime => "Date & time",
            FieldType::Time => "Time",
            FieldType::Daterange => "Date range",
            FieldType::Boolean => "Boolean",
            FieldType::Toggle => "Toggle",
            FieldType::Select => "Select",
            FieldType::Multiselect => "Multi-select",
            FieldType::Radio => "Radio group",
            FieldType::CheckboxGroup => "Checkbox group",
            FieldType::Color => "Color",
            FieldType::Icon => "Icon",
            FieldType::Media => "Media",
            FieldType::File => "File",
            FieldType::Gallery => "Gallery",
            FieldType::Relation => "Relation",
            FieldType::Component => "Component",
            FieldType::Repeater => "Repeater",
            FieldType::Json => "JSON",
            FieldType::Map => "Map location",
            FieldType::Unknown => "Unknown",
        }
    }

    pub fn group(self) -> TypeGroup {
        use FieldType as F;
        match self {
            F::Text
            | F::Textarea
            | F::RichText
            | F::Markdown
            | F::Blocks
            | F::Email
            | F::Password
            | F::Url
            | F::Phone
            | F::Slug
            | F::Uuid
            | F::Otp
            | F::Mask
            | F::Autocomplete
            | F::Tags
            | F::Unknown => TypeGroup::Text,
            F::Number
            | F::Decimal
            | F::Currency
            | F::Percentage
            | F::Range
            | F::Rating => TypeGroup::Numbers,
            F::Date | F::Datetime | F::Time | F::Daterange => TypeGroup::DateTime,
            F::Boolean
            | F::Toggle
            | F::Select
            | F::Multiselect
            | F::Radio
            | F::CheckboxGroup
            | F::Color => TypeGroup::Choice,
            F::Media | F::File | F::Gallery => TypeGroup::Media,
            F::Relation | F::Component | F::Repeater => TypeGroup::Relational,
            F::Json | F::Icon | F::Map => TypeGroup::Special,
        }
    }

    pub fn from_tag(tag: &str) -> FieldType {
        let t = tag.trim().to_ascii_lowercase();
        FieldType::ALL
            .iter()
            .copied()
            .find(|ft| ft.tag() == t)
            .unwrap_or(FieldType::Unknown)
    }
}

/// Raw settings buckets as they travel over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSettings {
    #[serde(default)]
    pub validation: Map<String, JsonValue>,
    #[serde(default)]
    pub appearance: Map<String, JsonValue>,
    #[serde(default)]
    pub advanced: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldWire", into = "FieldWire")]
pub struct Field {
    pub id: String,
    pub name: String,
    pub api_id: String,
    pub field_type: FieldType,
    /// The tag as the backend sent it when it is not one we know. Written
    /// back unchanged so saving such a field keeps its real type.
    pub unknown_tag: Option<String>,
    pub required: bool,
    pub description: String,
    pub help_text: String,
    pub placeholder: String,
    pub settings: RawSettings,
}

impl Field {
    pub fn type_tag(&self) -> &str {
        match (&self.field_type, &self.unknown_tag) {
            (FieldType::Unknown, Some(tag)) => tag.as_str(),
            (ft, _) => ft.tag(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldWire {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    api_id: String,
    #[serde(rename = "type")]
    type_tag: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: String,
    #[serde(default)]
    help_text: String,
    #[serde(default)]
    placeholder: String,
    #[serde(default)]
    settings: RawSettings,
}

impl From<FieldWire> for Field {
    fn from(w: FieldWire) -> Self {
        let field_type = FieldType::ALL
            .iter()
            .copied()
            .find(|ft| ft.tag() == w.type_tag)
            .unwrap_or(FieldType::Unknown);
        Field {
            id: w.id,
            name: w.name,
            api_id: w.api_id,
            field_type,
            unknown_tag: (field_type == FieldType::Unknown).then_some(w.type_tag),
            required: w.required,
            description: w.description,
            help_text: w.help_text,
            placeholder: w.placeholder,
            settings: w.settings,
        }
    }
}

impl From<Field> for FieldWire {
    fn from(f: Field) -> Self {
        FieldWire {
            type_tag: f.type_tag().to_string(),
            id: f.id,
            name: f.name,
            api_id: f.api_id,
            required: f.required,
            description: f.description,
            help_text: f.help_text,
            placeholder: f.placeholder,
            settings: f.settings,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub api_id: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub id: String,
    #[serde(default)]
    pub data: Map<String, JsonValue>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ContentEntry {
    // First string-ish value, used as the row title in listings
    pub fn title(&self) -> String {
        for key in ["title", "name", "label"] {
            if let Some(s) = self.data.get(key).and_then(|v| v.as_str()) {
                return s.to_string();
            }
        }
        self.data
            .values()
            .find_map(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| self.id.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub config: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub fields: Vec<ComponentField>,
    #[serde(default)]
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

/// Machine identifier derived from a display name: `"Hero Title!"` -> `"hero_title"`.
pub fn derive_api_id(name: &str) -> String {
    let mut out = String::new();
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    // identifiers must not start with a digit
    if out.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        out.insert(0, 'f');
        out.insert(1, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_type_tags_round_trip_through_from_tag() {
        for ft in FieldType::ALL {
            assert_eq!(FieldType::from_tag(ft.tag()), ft);
        }
        assert_eq!(FieldType::from_tag("hologram"), FieldType::Unknown);
    }

    #[test]
    fn unknown_type_on_the_wire_does_not_fail() {
        let f: Field = serde_json::from_value(json!({
            "id": "f1",
            "name": "Odd",
            "type": "hologram"
        }))
        .unwrap();
        assert_eq!(f.field_type, FieldType::Unknown);
        assert!(f.settings.appearance.is_empty());
    }

    #[test]
    fn unknown_type_tag_is_written_back_unchanged() {
        let f: Field = serde_json::from_value(json!({
            "id": "f1",
            "name": "Where",
            "type": "geo_point"
        }))
        .unwrap();
        assert_eq!(f.unknown_tag.as_deref(), Some("geo_point"));
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["type"], "geo_point");

        let known: Field = serde_json::from_value(json!({"name": "T", "type": "text"})).unwrap();
        assert_eq!(known.unknown_tag, None);
        assert_eq!(serde_json::to_value(&known).unwrap()["type"], "text");
    }

    #[test]
    fn field_wire_shape_uses_camel_case() {
        let f = Field {
            id: "f1".into(),
            name: "Title".into(),
            api_id: "title".into(),
            field_type: FieldType::RichText,
            help_text: "Shown below".into(),
            ..Default::default()
        };
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["apiId"], "title");
        assert_eq!(v["type"], "rich_text");
        assert_eq!(v["helpText"], "Shown below");
    }

    #[test]
    fn derive_api_id_slugs_names() {
        assert_eq!(derive_api_id("Hero Title!"), "hero_title");
        assert_eq!(derive_api_id("  SEO -- description "), "seo_description");
        assert_eq!(derive_api_id("3D model"), "f_3d_model");
        assert_eq!(derive_api_id("!!"), "");
    }

    #[test]
    fn content_entry_title_prefers_known_keys() {
        let e = ContentEntry {
            id: "c1".into(),
            data: json!({"body": "x", "title": "Hello"})
                .as_object()
                .cloned()
                .unwrap(),
            ..Default::default()
        };
        assert_eq!(e.title(), "Hello");
    }
}
