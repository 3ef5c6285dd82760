//! Backend calls run off the UI thread. Each request gets its own short-lived
//! thread and reports back over the app's channel; there is no cancellation
//! and the last response to arrive wins.

use super::backend::{CmsBackend, SharedBackend};
use crate::model::{Collection, ContentEntry, Field};
use crate::settings::SettingsBucket;
use anyhow::Result;
use serde_json::Value as JsonValue;
use std::sync::mpsc::Sender;
use std::thread;

#[derive(Debug, Clone, PartialEq)]
pub enum JobRequest {
    FetchCollections,
    FetchFields {
        collection_id: String,
    },
    FetchContent {
        collection_id: String,
    },
    CreateField {
        collection_id: String,
        payload: JsonValue,
        /// Echoed back in `JobOutput::Created`.
        draft: u64,
    },
    UpdateField {
        collection_id: String,
        field_id: String,
        patch: JsonValue,
        /// Set when only one settings bucket is being saved.
        bucket: Option<SettingsBucket>,
    },
    DeleteField {
        collection_id: String,
        field_id: String,
    },
}

impl JobRequest {
    pub fn label(&self) -> &'static str {
        match self {
            JobRequest::FetchCollections => "load collections",
            JobRequest::FetchFields { .. } => "load fields",
            JobRequest::FetchContent { .. } => "load content",
            JobRequest::CreateField { .. } => "create field",
            JobRequest::UpdateField { bucket: Some(_), .. } => "save settings",
            JobRequest::UpdateField { .. } => "update field",
            JobRequest::DeleteField { .. } => "delete field",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    Collections(Vec<Collection>),
    Fields {
        collection_id: String,
        fields: Vec<Field>,
    },
    Content {
        collection_id: String,
        items: Vec<ContentEntry>,
    },
    Created {
        field: Field,
        draft: u64,
    },
    Updated {
        field: Field,
        bucket: Option<SettingsBucket>,
    },
    Deleted {
        field_id: String,
    },
}

/// What a worker thread sends back.
#[derive(Debug, Clone)]
pub struct JobMsg {
    pub request: JobRequest,
    pub outcome: Result<JobOutput, String>,
}

pub fn run_job(backend: &dyn CmsBackend, req: &JobRequest) -> Result<JobOutput> {
    Ok(match req {
        JobRequest::FetchCollections => JobOutput::Collections(backend.fetch_collections()?),
        JobRequest::FetchFields { collection_id } => JobOutput::Fields {
            collection_id: collection_id.clone(),
            fields: backend.get_fields_for_collection(collection_id)?,
        },
        JobRequest::FetchContent { collection_id } => JobOutput::Content {
            collection_id: collection_id.clone(),
            items: backend.get_content_items(collection_id)?,
        },
        JobRequest::CreateField {
            collection_id,
            payload,
            draft,
        } => JobOutput::Created {
            field: backend.create_field(collection_id, payload)?,
            draft: *draft,
        },
        JobRequest::UpdateField {
            collection_id,
            field_id,
            patch,
            bucket,
        } => JobOutput::Updated {
            field: backend.update_field(collection_id, field_id, patch)?,
            bucket: *bucket,
        },
        JobRequest::DeleteField {
            collection_id,
            field_id,
        } => {
            backend.delete_field(collection_id, field_id)?;
            JobOutput::Deleted {
                field_id: field_id.clone(),
            }
        }
    })
}

pub fn spawn_job(backend: SharedBackend, request: JobRequest, tx: Sender<JobMsg>) {
    thread::spawn(move || {
        let outcome = run_job(backend.as_ref(), &request).map_err(|e| {
            tracing::warn!(job = request.label(), error = %format!("{e:#}"), "backend job failed");
            format!("{e:#}")
        });
        let _ = tx.send(JobMsg { request, outcome });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryBackend;
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    #[test]
    fn spawned_job_reports_back_over_the_channel() {
        let backend: SharedBackend = Arc::new(InMemoryBackend::seeded());
        let (tx, rx) = mpsc::channel();
        spawn_job(
            backend,
            JobRequest::FetchFields {
                collection_id: "col_products".into(),
            },
            tx,
        );
        let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        match msg.outcome {
            Ok(JobOutput::Fields { collection_id, fields }) => {
                assert_eq!(collection_id, "col_products");
                assert_eq!(fields.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failures_become_error_strings() {
        let backend = InMemoryBackend::seeded();
        backend.fail_next("network down");
        let err = run_job(&backend, &JobRequest::FetchCollections).unwrap_err();
        assert_eq!(err.to_string(), "network down");
    }
}
