use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::document::Document;
use super::traits::{Collaborator, Collection};
use crate::error::{CrmError, Result};
use crate::taxonomy::CustomOptions;

/// In-memory collaborator for tests.
///
/// Writes can be made to fail globally or for selected record ids, to
/// exercise the error paths of the coordinator.
#[derive(Default)]
pub struct MemoryCollaborator {
    doc: Mutex<Document>,
    uploads: Mutex<Vec<(String, usize)>>,
    fail_writes: AtomicBool,
    failing_ids: Mutex<HashSet<String>>,
}

impl MemoryCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            doc: Mutex::new(doc),
            ..Self::default()
        }
    }

    /// Enable write error simulation for every mutating call.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.fail_writes.store(simulate, Ordering::SeqCst);
    }

    /// Make `replace` and `delete` fail for one record id.
    pub fn fail_writes_for(&self, id: &str) {
        if let Ok(mut ids) = self.failing_ids.lock() {
            ids.insert(id.to_string());
        }
    }

    /// Snapshot of the stored database.
    pub fn document(&self) -> Document {
        self.doc.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Names and sizes of uploaded files, in upload order.
    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Document>> {
        self.doc
            .lock()
            .map_err(|_| CrmError::Backend("memory store poisoned".into()))
    }

    fn check_write(&self, id: Option<&str>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CrmError::Backend("Simulated write error".into()));
        }
        if let Some(id) = id {
            let failing = self
                .failing_ids
                .lock()
                .map(|ids| ids.contains(id))
                .unwrap_or(false);
            if failing {
                return Err(CrmError::Backend(format!("Simulated write error for {}", id)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Collaborator for MemoryCollaborator {
    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(self.lock()?.list(collection))
    }

    async fn create(&self, collection: Collection, record: Value) -> Result<Value> {
        self.check_write(None)?;
        self.lock()?.create(collection, record)
    }

    async fn replace(&self, collection: Collection, id: &str, record: Value) -> Result<Value> {
        self.check_write(Some(id))?;
        self.lock()?.replace(collection, id, record)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.check_write(Some(id))?;
        self.lock()?.delete(collection, id)
    }

    async fn custom_options(&self) -> Result<CustomOptions> {
        self.lock()?.custom_options()
    }

    async fn put_custom_options(&self, options: &CustomOptions) -> Result<CustomOptions> {
        self.check_write(None)?;
        self.lock()?.set_custom_options(options)?;
        Ok(options.clone())
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        self.check_write(None)?;
        let mut uploads = self
            .uploads
            .lock()
            .map_err(|_| CrmError::Backend("memory store poisoned".into()))?;
        uploads.push((file_name.to_string(), bytes.len()));
        Ok(format!("/uploads/{}-{}", uploads.len(), file_name))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
