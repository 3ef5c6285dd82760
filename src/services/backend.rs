use crate::config::BackendConfig;
use crate::model::{Collection, ContentEntry, Field};
use anyhow::Result;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Everything the studio needs from the CMS. Implementations are called from
/// worker threads, hence `Send + Sync`.
pub trait CmsBackend: Send + Sync {
    /// Short label for the status bar.
    fn name(&self) -> &str;

    fn fetch_collections(&self) -> Result<Vec<Collection>>;

    fn get_fields_for_collection(&self, collection_id: &str) -> Result<Vec<Field>>;

    /// `field` is the full wire object minus `id`.
    fn create_field(&self, collection_id: &str, field: &JsonValue) -> Result<Field>;

    /// Partial update. Top-level keys replace; `settings` is merged per bucket.
    fn update_field(&self, collection_id: &str, field_id: &str, patch: &JsonValue) -> Result<Field>;

    fn delete_field(&self, collection_id: &str, field_id: &str) -> Result<()>;

    fn get_content_items(&self, collection_id: &str) -> Result<Vec<ContentEntry>>;
}

pub type SharedBackend = Arc<dyn CmsBackend>;

pub fn build_backend(cfg: &BackendConfig) -> Result<SharedBackend> {
    Ok(match cfg {
        BackendConfig::Memory => Arc::new(super::memory::InMemoryBackend::seeded()),
        BackendConfig::Cli { command } => {
            Arc::new(super::cli_backend::CliBackend::new(command.clone())?)
        }
    })
}

/// Apply an update patch to a field's wire form. Used by backends that keep
/// fields locally; a remote server does its own merging.
pub fn apply_field_patch(current: &Field, patch: &JsonValue) -> Result<Field> {
    let mut base = serde_json::to_value(current)?;
    let (Some(obj), Some(p)) = (base.as_object_mut(), patch.as_object()) else {
        return Ok(current.clone());
    };
    for (k, v) in p {
        match (k.as_str(), obj.get_mut(k)) {
            ("id", _) => {}
            ("settings", Some(JsonValue::Object(existing))) if v.is_object() => {
                if let Some(buckets) = v.as_object() {
                    for (bucket, value) in buckets {
                        existing.insert(bucket.clone(), value.clone());
                    }
                }
            }
            _ => {
                obj.insert(k.clone(), v.clone());
            }
        }
    }
    Ok(serde_json::from_value(base)?)
}
