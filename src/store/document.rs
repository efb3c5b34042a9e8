use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::traits::Collection;
use crate::error::{CrmError, Result};
use crate::taxonomy::CustomOptions;

const CUSTOM_OPTIONS_KEY: &str = "customOptions";

/// The flat JSON database: one array per collection plus the
/// `customOptions` object, all at the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

/// Matches string ids and the numeric ids older databases carry.
pub(crate) fn has_id(record: &Value, id: &str) -> bool {
    match record.get("id") {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

impl Document {
    pub fn list(&self, collection: Collection) -> Vec<Value> {
        match self.0.get(collection.as_str()) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn records_mut(&mut self, collection: Collection) -> Result<&mut Vec<Value>> {
        let slot = self
            .0
            .entry(collection.as_str())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => Ok(items),
            _ => Err(CrmError::Backend(format!(
                "'{}' is not a collection",
                collection
            ))),
        }
    }

    pub fn create(&mut self, collection: Collection, mut record: Value) -> Result<Value> {
        let Value::Object(fields) = &mut record else {
            return Err(CrmError::Backend("record must be a JSON object".into()));
        };
        let missing = match fields.get("id") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            _ => false,
        };
        if missing {
            fields.insert(
                "id".into(),
                Value::String(Uuid::new_v4().simple().to_string()),
            );
        }

        self.records_mut(collection)?.push(record.clone());
        Ok(record)
    }

    pub fn replace(&mut self, collection: Collection, id: &str, mut record: Value) -> Result<Value> {
        let Value::Object(fields) = &mut record else {
            return Err(CrmError::Backend("record must be a JSON object".into()));
        };
        fields.insert("id".into(), Value::String(id.to_string()));

        let records = self.records_mut(collection)?;
        let slot = records
            .iter_mut()
            .find(|r| has_id(r, id))
            .ok_or_else(|| CrmError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        *slot = record.clone();
        Ok(record)
    }

    pub fn delete(&mut self, collection: Collection, id: &str) -> Result<()> {
        let records = self.records_mut(collection)?;
        let before = records.len();
        records.retain(|r| !has_id(r, id));
        if records.len() == before {
            return Err(CrmError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn custom_options(&self) -> Result<CustomOptions> {
        match self.0.get(CUSTOM_OPTIONS_KEY) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Ok(CustomOptions::default()),
        }
    }

    pub fn set_custom_options(&mut self, options: &CustomOptions) -> Result<()> {
        self.0
            .insert(CUSTOM_OPTIONS_KEY.into(), serde_json::to_value(options)?);
        Ok(())
    }
}
