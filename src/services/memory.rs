//! Backend that keeps everything in process. Seeded with a small demo content
//! model so the studio is usable without a server; tests use its call log and
//! failure switches.

use super::backend::{apply_field_patch, CmsBackend};
use crate::model::{derive_api_id, Collection, ContentEntry, Field, FieldType};
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    pub op: &'static str,
    pub collection_id: Option<String>,
    pub field_id: Option<String>,
    pub payload: Option<JsonValue>,
}

#[derive(Default)]
struct State {
    collections: Vec<Collection>,
    fields: HashMap<String, Vec<Field>>,
    content: HashMap<String, Vec<ContentEntry>>,
    calls: Vec<BackendCall>,
    fail_next: Option<String>,
    offline: bool,
}

#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(self, collection: Collection, fields: Vec<Field>) -> Self {
        {
            let mut st = self.lock();
            st.fields.insert(collection.id.clone(), fields);
            st.collections.push(collection);
        }
        self
    }

    pub fn seeded() -> Self {
        let posts = Collection {
            id: "col_posts".into(),
            name: "Blog posts".into(),
            api_id: "blog_posts".into(),
            description: "Articles shown on the public site".into(),
        };
        let products = Collection {
            id: "col_products".into(),
            name: "Products".into(),
            api_id: "products".into(),
            description: "Catalogue items".into(),
        };
        let post_fields = vec![
            seed_field("fld_title", "Title", FieldType::Text, true, json!({
                "validation": {"minLength": 3, "maxLength": 120},
                "appearance": {"uiVariant": "material", "showCharCount": true}
            })),
            // older clients stored appearance in the flat legacy shape
            seed_field("fld_summary", "Summary", FieldType::Textarea, false, json!({
                "appearance": {"variant": "pill", "customCss": "font-style: italic;", "borderColor": "#7c3aed"}
            })),
            seed_field("fld_published", "Published on", FieldType::Date, false, json!({})),
            seed_field("fld_code", "Access code", FieldType::Otp, false, json!({
                "validation": {"length": 6, "numericOnly": true}
            })),
        ];
        let product_fields = vec![
            seed_field("fld_name", "Name", FieldType::Text, true, json!({})),
            seed_field("fld_price", "Price", FieldType::Currency, true, json!({
                "validation": {"min": 0},
                "advanced": {"currency": "EUR", "locale": "de-DE"}
            })),
            seed_field("fld_tags", "Tags", FieldType::Tags, false, json!({
                "advanced": {"options": ["new", "sale"]}
            })),
        ];
        let backend = Self::new()
            .with_collection(posts, post_fields)
            .with_collection(products, product_fields);
        {
            let mut st = backend.lock();
            st.content.insert(
                "col_posts".into(),
                vec![
                    seed_entry("ent_1", json!({"title": "Hello world", "summary": "First post"})),
                    seed_entry("ent_2", json!({"title": "Release notes", "summary": "What changed"})),
                ],
            );
            st.content.insert(
                "col_products".into(),
                vec![seed_entry("ent_3", json!({"name": "Desk lamp", "price": 39.9}))],
            );
        }
        backend
    }

    /// Make the next call fail with `message`.
    pub fn fail_next(&self, message: &str) {
        self.lock().fail_next = Some(message.to_string());
    }

    /// Every call fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }

    pub fn field(&self, collection_id: &str, field_id: &str) -> Option<Field> {
        self.lock()
            .fields
            .get(collection_id)?
            .iter()
            .find(|f| f.id == field_id)
            .cloned()
    }

    // A poisoned lock only means another test thread panicked; the data is still usable.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn begin(
        &self,
        op: &'static str,
        collection_id: Option<&str>,
        field_id: Option<&str>,
        payload: Option<&JsonValue>,
    ) -> Result<MutexGuard<'_, State>> {
        let mut st = self.lock();
        st.calls.push(BackendCall {
            op,
            collection_id: collection_id.map(str::to_string),
            field_id: field_id.map(str::to_string),
            payload: payload.cloned(),
        });
        tracing::debug!(op, ?collection_id, ?field_id, "memory backend call");
        if st.offline {
            return Err(anyhow!("backend is offline"));
        }
        if let Some(msg) = st.fail_next.take() {
            return Err(anyhow!(msg));
        }
        Ok(st)
    }
}

fn seed_field(id: &str, name: &str, ft: FieldType, required: bool, settings: JsonValue) -> Field {
    Field {
        id: id.into(),
        name: name.into(),
        api_id: derive_api_id(name),
        field_type: ft,
        required,
        settings: serde_json::from_value(settings).unwrap_or_default(),
        ..Default::default()
    }
}

fn seed_entry(id: &str, data: JsonValue) -> ContentEntry {
    ContentEntry {
        id: id.into(),
        data: data.as_object().cloned().unwrap_or_default(),
        created_at: Some("2024-01-01T00:00:00Z".into()),
        updated_at: None,
    }
}

fn fields_of<'a>(st: &'a mut State, collection_id: &str) -> Result<&'a mut Vec<Field>> {
    if !st.collections.iter().any(|c| c.id == collection_id) {
        return Err(anyhow!("collection '{collection_id}' not found"));
    }
    Ok(st.fields.entry(collection_id.to_string()).or_default())
}

impl CmsBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_collections(&self) -> Result<Vec<Collection>> {
        let st = self.begin("fetch_collections", None, None, None)?;
        Ok(st.collections.clone())
    }

    fn get_fields_for_collection(&self, collection_id: &str) -> Result<Vec<Field>> {
        let mut st = self.begin("get_fields_for_collection", Some(collection_id), None, None)?;
        Ok(fields_of(&mut st, collection_id)?.clone())
    }

    fn create_field(&self, collection_id: &str, field: &JsonValue) -> Result<Field> {
        let mut st = self.begin("create_field", Some(collection_id), None, Some(field))?;
        let mut new: Field =
            serde_json::from_value(field.clone()).context("decoding field payload")?;
        new.id = format!("fld_{}", uuid::Uuid::new_v4().simple());
        if new.api_id.is_empty() {
            new.api_id = derive_api_id(&new.name);
        }
        let fields = fields_of(&mut st, collection_id)?;
        if fields.iter().any(|f| f.api_id == new.api_id) {
            return Err(anyhow!("a field with apiId '{}' already exists", new.api_id));
        }
        fields.push(new.clone());
        Ok(new)
    }

    fn update_field(
        &self,
        collection_id: &str,
        field_id: &str,
        patch: &JsonValue,
    ) -> Result<Field> {
        let mut st = self.begin("update_field", Some(collection_id), Some(field_id), Some(patch))?;
        let fields = fields_of(&mut st, collection_id)?;
        let slot = fields
            .iter_mut()
            .find(|f| f.id == field_id)
            .ok_or_else(|| anyhow!("field '{field_id}' not found"))?;
        let updated = apply_field_patch(slot, patch)?;
        *slot = updated.clone();
        Ok(updated)
    }

    fn delete_field(&self, collection_id: &str, field_id: &str) -> Result<()> {
        let mut st = self.begin("delete_field", Some(collection_id), Some(field_id), None)?;
        let fields = fields_of(&mut st, collection_id)?;
        let before = fields.len();
        fields.retain(|f| f.id != field_id);
        if fields.len() == before {
            return Err(anyhow!("field '{field_id}' not found"));
        }
        Ok(())
    }

    fn get_content_items(&self, collection_id: &str) -> Result<Vec<ContentEntry>> {
        let st = self.begin("get_content_items", Some(collection_id), None, None)?;
        Ok(st.content.get(collection_id).cloned().unwrap_or_default())
    }
}
