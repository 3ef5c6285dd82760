//! Reusable component library, kept entirely in the local store under
//! `components`. The backend never sees these.

use crate::model::{Component, ComponentField, FieldType};
use crate::store::KvStore;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

pub const COMPONENTS_KEY: &str = "components";

#[derive(Debug, Error, PartialEq)]
pub enum ComponentError {
    #[error("component name is required")]
    EmptyName,
    #[error("field #{0} has no name")]
    EmptyFieldName(usize),
    #[error("duplicate field names: {}", .0.join(", "))]
    DuplicateFieldNames(Vec<String>),
    #[error("component '{0}' not found")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentFieldDraft {
    pub id: Option<String>,
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub config: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub fields: Vec<ComponentFieldDraft>,
}

impl ComponentDraft {
    pub fn from_component(c: &Component) -> Self {
        Self {
            name: c.name.clone(),
            description: c.description.clone(),
            category: c.category.clone(),
            fields: c
                .fields
                .iter()
                .map(|f| ComponentFieldDraft {
                    id: Some(f.id.clone()),
                    name: f.name.clone(),
                    field_type: f.field_type,
                    required: f.required,
                    config: f.config.clone(),
                })
                .collect(),
        }
    }

    fn validate(&self) -> Result<(), ComponentError> {
        if self.name.trim().is_empty() {
            return Err(ComponentError::EmptyName);
        }
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut dups: BTreeSet<String> = BTreeSet::new();
        for (i, f) in self.fields.iter().enumerate() {
            let key = f.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(ComponentError::EmptyFieldName(i + 1));
            }
            if seen.insert(key, i).is_some() {
                dups.insert(f.name.trim().to_string());
            }
        }
        if !dups.is_empty() {
            return Err(ComponentError::DuplicateFieldNames(dups.into_iter().collect()));
        }
        Ok(())
    }

    fn into_fields(self) -> Vec<ComponentField> {
        self.fields
            .into_iter()
            .map(|f| ComponentField {
                id: f
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                name: f.name.trim().to_string(),
                field_type: f.field_type,
                required: f.required,
                config: f.config,
            })
            .collect()
    }
}

/// Proof that the user was asked before a delete. Only `request_delete` makes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    id: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct ComponentLibrary {
    items: Vec<Component>,
}

impl ComponentLibrary {
    /// Read everything from the store. Corrupt JSON is logged, cleared, and
    /// treated as an empty library.
    pub fn load(store: &mut dyn KvStore) -> Self {
        let items = match store.get(COMPONENTS_KEY) {
            None => Vec::new(),
            Some(text) => match serde_json::from_str::<Vec<Component>>(&text) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(error = %e, "components entry is corrupt; starting empty");
                    if let Err(e) = store.remove(COMPONENTS_KEY) {
                        tracing::warn!(error = %e, "could not clear corrupt components entry");
                    }
                    Vec::new()
                }
            },
        };
        tracing::debug!(count = items.len(), "component library loaded");
        Self { items }
    }

    pub fn list(&self) -> &[Component] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Component> {
        self.items.iter().find(|c| c.id == id)
    }

    pub fn create(
        &mut self,
        store: &mut dyn KvStore,
        draft: ComponentDraft,
    ) -> Result<Component, ComponentError> {
        draft.validate()?;
        let component = Component {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            category: draft.category.trim().to_string(),
            fields: draft.into_fields(),
            last_updated: Some(chrono::Utc::now()),
        };
        let mut next = self.items.clone();
        next.push(component.clone());
        self.commit(store, next)?;
        tracing::info!(id = %component.id, name = %component.name, "component created");
        Ok(component)
    }

    pub fn update(
        &mut self,
        store: &mut dyn KvStore,
        id: &str,
        draft: ComponentDraft,
    ) -> Result<Component, ComponentError> {
        draft.validate()?;
        let idx = self
            .items
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ComponentError::NotFound(id.to_string()))?;
        let component = Component {
            id: id.to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            category: draft.category.trim().to_string(),
            fields: draft.into_fields(),
            last_updated: Some(chrono::Utc::now()),
        };
        let mut next = self.items.clone();
        next[idx] = component.clone();
        self.commit(store, next)?;
        tracing::info!(id, "component updated");
        Ok(component)
    }

    pub fn request_delete(&self, id: &str) -> Option<PendingDelete> {
        self.get(id).map(|c| PendingDelete {
            id: c.id.clone(),
            name: c.name.clone(),
        })
    }

    pub fn confirm_delete(
        &mut self,
        store: &mut dyn KvStore,
        pending: PendingDelete,
    ) -> Result<Component, ComponentError> {
        let removed = self
            .get(&pending.id)
            .cloned()
            .ok_or_else(|| ComponentError::NotFound(pending.id.clone()))?;
        let next: Vec<Component> = self
            .items
            .iter()
            .filter(|c| c.id != pending.id)
            .cloned()
            .collect();
        self.commit(store, next)?;
        tracing::info!(id = %pending.id, "component deleted");
        Ok(removed)
    }

    /// Case-insensitive search over name and description, optional exact category.
    pub fn filter(&self, query: &str, category: Option<&str>) -> Vec<&Component> {
        let q = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|c| {
                q.is_empty()
                    || c.name.to_lowercase().contains(&q)
                    || c.description.to_lowercase().contains(&q)
            })
            .filter(|c| match category {
                Some(cat) if !cat.is_empty() => c.category.eq_ignore_ascii_case(cat),
                _ => true,
            })
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .items
            .iter()
            .map(|c| c.category.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        set.into_iter().collect()
    }

    fn commit(
        &mut self,
        store: &mut dyn KvStore,
        next: Vec<Component>,
    ) -> Result<(), ComponentError> {
        let text =
            serde_json::to_string(&next).map_err(|e| ComponentError::Storage(e.to_string()))?;
        store
            .set(COMPONENTS_KEY, &text)
            .map_err(|e| ComponentError::Storage(format!("{e:#}")))?;
        self.items = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn field(name: &str, ft: FieldType) -> ComponentFieldDraft {
        ComponentFieldDraft {
            name: name.into(),
            field_type: ft,
            ..Default::default()
        }
    }

    fn draft(name: &str, fields: Vec<ComponentFieldDraft>) -> ComponentDraft {
        ComponentDraft {
            name: name.into(),
            description: "Reusable block".into(),
            category: "Marketing".into(),
            fields,
        }
    }

    #[test]
    fn create_assigns_ids_and_persists() {
        let mut store = MemoryStore::default();
        let mut lib = ComponentLibrary::load(&mut store);
        let c = lib
            .create(
                &mut store,
                draft(
                    "Hero",
                    vec![field("Title", FieldType::Text), field("Image", FieldType::Media)],
                ),
            )
            .unwrap();
        assert!(!c.id.is_empty());
        assert!(c.fields.iter().all(|f| !f.id.is_empty()));
        assert!(c.last_updated.is_some());
        let reloaded = ComponentLibrary::load(&mut store);
        assert_eq!(reloaded.list(), &[c]);
    }

    #[test]
    fn duplicate_field_names_are_rejected_without_writing() {
        let mut store = MemoryStore::default();
        let mut lib = ComponentLibrary::load(&mut store);
        let err = lib
            .create(
                &mut store,
                draft(
                    "Card",
                    vec![
                        field("Title", FieldType::Text),
                        field("title ", FieldType::Textarea),
                    ],
                ),
            )
            .unwrap_err();
        assert_eq!(err, ComponentError::DuplicateFieldNames(vec!["title".into()]));
        assert!(err.to_string().contains("duplicate field names"));
        assert_eq!(store.writes(), 0);
        assert!(lib.list().is_empty());
    }

    #[test]
    fn update_replaces_by_id_and_keeps_field_ids() {
        let mut store = MemoryStore::default();
        let mut lib = ComponentLibrary::load(&mut store);
        let c = lib
            .create(&mut store, draft("Quote", vec![field("Text", FieldType::Textarea)]))
            .unwrap();
        let mut d = ComponentDraft::from_component(&c);
        d.name = "Pull quote".into();
        d.fields.push(field("Author", FieldType::Text));
        let u = lib.update(&mut store, &c.id, d).unwrap();
        assert_eq!(u.id, c.id);
        assert_eq!(u.fields[0].id, c.fields[0].id);
        assert_eq!(lib.list().len(), 1);
        assert_eq!(lib.list()[0].name, "Pull quote");
        assert!(matches!(
            lib.update(&mut store, "missing", draft("X", vec![])),
            Err(ComponentError::NotFound(_))
        ));
    }

    #[test]
    fn delete_requires_confirmation_and_removes_exactly_one() {
        let mut store = MemoryStore::default();
        let mut lib = ComponentLibrary::load(&mut store);
        let a = lib.create(&mut store, draft("A", vec![])).unwrap();
        let b = lib.create(&mut store, draft("B", vec![])).unwrap();
        assert!(lib.request_delete("nope").is_none());
        let pending = lib.request_delete(&a.id).unwrap();
        assert_eq!(pending.name, "A");
        // nothing happens until confirmed
        assert_eq!(lib.list().len(), 2);
        lib.confirm_delete(&mut store, pending.clone()).unwrap();
        assert_eq!(lib.list(), &[b.clone()]);
        let reloaded = ComponentLibrary::load(&mut store);
        assert_eq!(reloaded.list(), &[b]);
        assert!(matches!(
            lib.confirm_delete(&mut store, pending),
            Err(ComponentError::NotFound(_))
        ));
    }

    #[test]
    fn corrupt_store_recovers_empty_and_clears_key() {
        let mut store = MemoryStore::default();
        store.set(COMPONENTS_KEY, "[{oops").unwrap();
        let lib = ComponentLibrary::load(&mut store);
        assert!(lib.list().is_empty());
        assert!(store.get(COMPONENTS_KEY).is_none());
    }

    #[test]
    fn filter_by_query_and_category() {
        let mut store = MemoryStore::default();
        let mut lib = ComponentLibrary::load(&mut store);
        lib.create(&mut store, draft("Hero banner", vec![])).unwrap();
        let mut seo = draft("SEO", vec![]);
        seo.category = "Meta".into();
        seo.description = "Search metadata".into();
        lib.create(&mut store, seo).unwrap();
        assert_eq!(lib.filter("hero", None).len(), 1);
        assert_eq!(lib.filter("search", None).len(), 1);
        assert_eq!(lib.filter("", Some("meta")).len(), 1);
        assert_eq!(lib.filter("hero", Some("Meta")).len(), 0);
        assert_eq!(lib.categories(), vec!["Marketing", "Meta"]);
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut store = MemoryStore::default();
        let mut lib = ComponentLibrary::load(&mut store);
        assert_eq!(
            lib.create(&mut store, draft("  ", vec![])),
            Err(ComponentError::EmptyName)
        );
        assert_eq!(
            lib.create(&mut store, draft("X", vec![field(" ", FieldType::Text)])),
            Err(ComponentError::EmptyFieldName(1))
        );
    }
}
