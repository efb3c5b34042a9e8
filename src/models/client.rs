use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient::{deserialize_id, deserialize_timestamp};

/// A buyer or tenant the agency keeps in touch with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub phone_number: String,
    /// Read from RFC 3339 or from a zone-less date-time input.
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_called: Option<DateTime<Utc>>,
    /// What the client is looking for, in free text.
    #[serde(default)]
    pub request: String,
}

impl Client {
    pub fn new(phone_number: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            client_name: String::new(),
            phone_number: phone_number.into(),
            last_called: Some(Utc::now()),
            request: request.into(),
        }
    }
}
