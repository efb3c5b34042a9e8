use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::document::Document;
use super::traits::{Collaborator, Collection};
use crate::error::Result;
use crate::taxonomy::CustomOptions;

/// Collaborator backed by a local JSON database file plus an uploads
/// directory.
pub struct FileCollaborator {
    data_file: PathBuf,
    uploads_dir: PathBuf,
    // Serializes read-modify-write cycles on the data file.
    lock: Mutex<()>,
}

impl FileCollaborator {
    pub fn new(data_file: impl Into<PathBuf>, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            uploads_dir: uploads_dir.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Document> {
        if !fs::try_exists(&self.data_file).await? {
            return Ok(Document::default());
        }
        let content = fs::read_to_string(&self.data_file).await?;
        if content.trim().is_empty() {
            return Ok(Document::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, doc: &Document) -> Result<()> {
        let content = serde_json::to_string_pretty(doc)?;
        let dir = match self.data_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await?;

        // Atomic write
        let tmp_file = dir.join(format!(".db-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content).await?;
        fs::rename(&tmp_file, &self.data_file).await?;

        debug!(path = %self.data_file.display(), "database written");
        Ok(())
    }

    async fn update<T: Send>(
        &self,
        change: impl FnOnce(&mut Document) -> Result<T> + Send,
    ) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let out = change(&mut doc)?;
        self.save(&doc).await?;
        Ok(out)
    }
}

/// `{millis}-{unique}{.ext}` keeping the original extension.
fn stored_name(file_name: &str) -> String {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    let unique = Uuid::new_v4().simple().to_string();
    format!("{}-{}{}", Utc::now().timestamp_millis(), &unique[..9], ext)
}

#[async_trait]
impl Collaborator for FileCollaborator {
    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(self.load().await?.list(collection))
    }

    async fn create(&self, collection: Collection, record: Value) -> Result<Value> {
        self.update(|doc| doc.create(collection, record)).await
    }

    async fn replace(&self, collection: Collection, id: &str, record: Value) -> Result<Value> {
        self.update(|doc| doc.replace(collection, id, record)).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.update(|doc| doc.delete(collection, id)).await
    }

    async fn custom_options(&self) -> Result<CustomOptions> {
        self.load().await?.custom_options()
    }

    async fn put_custom_options(&self, options: &CustomOptions) -> Result<CustomOptions> {
        self.update(|doc| doc.set_custom_options(options)).await?;
        Ok(options.clone())
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        fs::create_dir_all(&self.uploads_dir).await?;
        let name = stored_name(file_name);
        fs::write(self.uploads_dir.join(&name), bytes).await?;
        Ok(format!("/uploads/{}", name))
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
