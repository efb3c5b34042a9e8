use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::crm::{Crm, DEFAULT_SHARE_ORIGIN};
use crate::error::Result;
use crate::store::{Collaborator, FileCollaborator, HttpCollaborator};

/// Where the CRM keeps its data.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of a json-server style API. When unset the local JSON
    /// database is used.
    pub api_url: Option<String>,
    pub data_file: PathBuf,
    pub uploads_dir: PathBuf,
    /// Origin used to build public listing links.
    pub share_origin: String,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            data_file: PathBuf::from("db.json"),
            uploads_dir: PathBuf::from("uploads"),
            share_origin: DEFAULT_SHARE_ORIGIN.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Builds the collaborator this configuration points at.
    pub fn connect(&self) -> Result<Arc<dyn Collaborator>> {
        match self.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => {
                info!(url = %url, "using REST collaborator");
                let timeout = Duration::from_secs(self.request_timeout_secs);
                Ok(Arc::new(HttpCollaborator::new(url, timeout)?))
            }
            None => {
                info!(path = %self.data_file.display(), "using local JSON database");
                Ok(Arc::new(FileCollaborator::new(
                    self.data_file.clone(),
                    self.uploads_dir.clone(),
                )))
            }
        }
    }

    /// Connects and loads the full CRM state.
    pub async fn open(&self) -> Result<Crm> {
        let mut crm = Crm::new(self.connect()?).with_share_origin(self.share_origin.as_str());
        crm.load().await?;
        Ok(crm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_database() {
        let config = Config::default();
        assert_eq!(config.data_file, PathBuf::from("db.json"));
        assert_eq!(config.connect().unwrap().backend_name(), "file");
    }

    #[test]
    fn blank_api_url_means_local() {
        let config = Config {
            api_url: Some("  ".into()),
            ..Config::default()
        };
        assert_eq!(config.connect().unwrap().backend_name(), "file");

        let config = Config {
            api_url: Some("http://localhost:3001/api".into()),
            ..Config::default()
        };
        assert_eq!(config.connect().unwrap().backend_name(), "http");
    }
}
