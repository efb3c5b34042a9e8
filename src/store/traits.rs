use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::error::Result;
use crate::taxonomy::CustomOptions;

/// Named record collections served by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Properties,
    Clients,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Properties => "properties",
            Collection::Clients => "clients",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistence layer the CRM talks to.
///
/// Records travel as raw JSON objects so a backend never needs to know
/// the record schema. Every call is a single request/response; nothing
/// is retried.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// All records of a collection.
    async fn list(&self, collection: Collection) -> Result<Vec<Value>>;

    /// Stores a new record, assigning an `id` when it has none.
    async fn create(&self, collection: Collection, record: Value) -> Result<Value>;

    /// Replaces the whole record stored under `id`.
    async fn replace(&self, collection: Collection, id: &str, record: Value) -> Result<Value>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;

    /// The `customOptions` singleton.
    async fn custom_options(&self) -> Result<CustomOptions>;

    /// Replaces the `customOptions` singleton wholesale.
    async fn put_custom_options(&self, options: &CustomOptions) -> Result<CustomOptions>;

    /// Stores an image and returns the relative URL to keep on a record.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String>;

    /// Short backend name used in log lines.
    fn backend_name(&self) -> &'static str;
}
