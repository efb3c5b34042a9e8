use thiserror::Error;

use crate::editor::ValidationError;

/// Shown for every failure that is not a deliberate rejection.
pub const GENERIC_FAILURE: &str = "Операция не выполнена. Попробуйте ещё раз.";

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("'{value}' is a built-in {facet} value and cannot be removed")]
    ProtectedValue { facet: String, value: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{} of {total} record updates failed: {}", failed.len(), failed.join(", "))]
    PartialFanOut { failed: Vec<String>, total: usize },

    #[error("Backend error: {0}")]
    Backend(String),
}

impl CrmError {
    /// Text for a non-blocking notification.
    ///
    /// Rejections the user can act on keep their own wording; everything
    /// else collapses into one message.
    pub fn user_message(&self) -> String {
        match self {
            CrmError::ProtectedValue { value, .. } => {
                format!("«{}»: встроенное значение, его нельзя удалить", value)
            }
            CrmError::Validation(v) => v.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
