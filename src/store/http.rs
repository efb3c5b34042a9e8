use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{Collaborator, Collection};
use crate::error::{CrmError, Result};
use crate::taxonomy::CustomOptions;

/// REST collaborator speaking json-server routes under a base URL such
/// as `http://localhost:3001/api`.
pub struct HttpCollaborator {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpCollaborator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("realty-crm/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Sends the request, turning a non-2xx answer into `Server`.
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "collaborator rejected request");
            return Err(CrmError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.send(request).await?.json().await?)
    }
}

#[async_trait]
impl Collaborator for HttpCollaborator {
    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        let url = self.url(collection.as_str());
        debug!(url = %url, "GET");
        self.send_json(self.client.get(&url)).await
    }

    async fn create(&self, collection: Collection, record: Value) -> Result<Value> {
        let url = self.url(collection.as_str());
        debug!(url = %url, "POST");
        self.send_json(self.client.post(&url).json(&record)).await
    }

    async fn replace(&self, collection: Collection, id: &str, record: Value) -> Result<Value> {
        let url = self.url(&format!("{}/{}", collection, id));
        debug!(url = %url, "PUT");
        self.send_json(self.client.put(&url).json(&record)).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let url = self.url(&format!("{}/{}", collection, id));
        debug!(url = %url, "DELETE");
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn custom_options(&self) -> Result<CustomOptions> {
        let url = self.url("customOptions");
        debug!(url = %url, "GET");
        self.send_json(self.client.get(&url)).await
    }

    async fn put_custom_options(&self, options: &CustomOptions) -> Result<CustomOptions> {
        let url = self.url("customOptions");
        debug!(url = %url, "PUT");
        self.send_json(self.client.put(&url).json(options)).await
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let url = self.url("upload");
        debug!(url = %url, size = bytes.len(), "POST multipart");
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("image", part);
        let resp: UploadResponse = self.send_json(self.client.post(&url).multipart(form)).await?;
        Ok(resp.url)
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
