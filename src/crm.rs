//! The coordinator owning listings, clients and the taxonomy.
//!
//! Every mutation goes to the collaborator first; local state only
//! changes after a successful answer, by re-fetching the whole
//! collection.
//!
//! Listing writes start from the stored JSON record, so keys this crate
//! does not model are written back untouched.

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::editor::{validate_client, PropertyDraft};
use crate::error::{CrmError, Result};
use crate::filter::{filter, FilterState};
use crate::models::{Category, Client, Details, Property, Status};
use crate::store::document::has_id;
use crate::store::{Collaborator, Collection};
use crate::taxonomy::{Facet, Taxonomy};

pub const DEFAULT_SHARE_ORIGIN: &str = "http://localhost:3001";

pub struct Crm {
    store: Arc<dyn Collaborator>,
    share_origin: String,
    listings: Vec<Property>,
    // Listing records as last fetched, unknown keys included.
    stored: Vec<Value>,
    clients: Vec<Client>,
    taxonomy: Taxonomy,
}

/// Decodes records one by one; a malformed record is skipped, not fatal.
fn decode_all<T: DeserializeOwned>(collection: Collection, raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection = %collection, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

/// Serializes a record for a create call, dropping an empty id so the
/// collaborator assigns one.
fn new_record<T: Serialize>(record: &T) -> Result<Value> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut value {
        if fields.get("id").and_then(Value::as_str) == Some("") {
            fields.remove("id");
        }
    }
    Ok(value)
}

/// Every key a `Property` of any category can write.
fn model_keys() -> BTreeSet<String> {
    let mut keys: BTreeSet<String> = ["id", "publicLink"].map(String::from).into();
    for category in Category::ALL {
        let blank = Property {
            details: Details::empty(category),
            ..Property::default()
        };
        if let Ok(Value::Object(fields)) = serde_json::to_value(&blank) {
            keys.extend(fields.into_iter().map(|(key, _)| key));
        }
    }
    keys
}

/// The edited listing written over its stored record: modelled keys come
/// from `property`, every other stored key is kept as is.
fn overlay(stored: &Value, property: &Property) -> Result<Value> {
    let typed = match serde_json::to_value(property)? {
        Value::Object(fields) => fields,
        other => return Ok(other),
    };
    let known = model_keys();
    let mut merged: Map<String, Value> = match stored {
        Value::Object(fields) => fields
            .iter()
            .filter(|(key, _)| !known.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        _ => Map::new(),
    };
    merged.extend(typed);
    Ok(Value::Object(merged))
}

impl Crm {
    pub fn new(store: Arc<dyn Collaborator>) -> Self {
        Self {
            store,
            share_origin: DEFAULT_SHARE_ORIGIN.to_string(),
            listings: Vec::new(),
            stored: Vec::new(),
            clients: Vec::new(),
            taxonomy: Taxonomy::default(),
        }
    }

    pub fn with_share_origin(mut self, origin: impl Into<String>) -> Self {
        self.share_origin = origin.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetches listings, clients and custom options.
    pub async fn load(&mut self) -> Result<()> {
        info!(backend = self.store.backend_name(), "loading CRM state");
        let (listings, clients, custom) = futures::try_join!(
            self.store.list(Collection::Properties),
            self.store.list(Collection::Clients),
            self.store.custom_options(),
        )?;

        self.stored = listings.clone();
        self.listings = decode_all(Collection::Properties, listings);
        self.clients = decode_all(Collection::Clients, clients);
        self.taxonomy.set_custom(custom);
        info!(
            listings = self.listings.len(),
            clients = self.clients.len(),
            "CRM state loaded"
        );
        Ok(())
    }

    async fn refresh_listings(&mut self) -> Result<()> {
        let raw = self.store.list(Collection::Properties).await?;
        self.stored = raw.clone();
        self.listings = decode_all(Collection::Properties, raw);
        debug!(count = self.listings.len(), "listings refreshed");
        Ok(())
    }

    async fn refresh_clients(&mut self) -> Result<()> {
        let raw = self.store.list(Collection::Clients).await?;
        self.clients = decode_all(Collection::Clients, raw);
        debug!(count = self.clients.len(), "clients refreshed");
        Ok(())
    }

    pub fn listings(&self) -> &[Property] {
        &self.listings
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Listings passing `criteria`, in stored order.
    pub fn visible(&self, criteria: &FilterState) -> Vec<&Property> {
        filter(&self.listings, criteria)
    }

    pub fn options(&self, facet: Facet) -> Vec<String> {
        self.taxonomy.available_options(facet, &self.listings)
    }

    pub fn get(&self, id: &str) -> Option<&Property> {
        self.listings.iter().find(|p| p.id == id)
    }

    fn require(&self, id: &str) -> Result<&Property> {
        self.get(id).ok_or_else(|| CrmError::NotFound {
            collection: Collection::Properties.to_string(),
            id: id.to_string(),
        })
    }

    /// The stored JSON record of a listing.
    fn stored_record(&self, id: &str) -> Result<Value> {
        self.stored
            .iter()
            .find(|record| has_id(record, id))
            .cloned()
            .ok_or_else(|| CrmError::NotFound {
                collection: Collection::Properties.to_string(),
                id: id.to_string(),
            })
    }

    /// A blank form with pickers preset from the current options.
    pub fn new_draft(&self) -> PropertyDraft {
        PropertyDraft::new(&self.taxonomy, &self.listings)
    }

    /// A form prefilled from a stored listing.
    pub fn edit_draft(&self, id: &str) -> Result<PropertyDraft> {
        Ok(PropertyDraft::from_property(self.require(id)?))
    }

    /// Creates the listing when the draft has no id, replaces it otherwise.
    pub async fn save_property(&mut self, draft: PropertyDraft) -> Result<Property> {
        let is_new = draft.id.as_deref().map_or(true, str::is_empty);
        let property = draft.into_property()?;

        let saved = if is_new {
            let record = serde_json::to_value(&property)?;
            self.store.create(Collection::Properties, record).await
        } else {
            let record = overlay(&self.stored_record(&property.id)?, &property)?;
            self.store
                .replace(Collection::Properties, &property.id, record)
                .await
        };
        let saved = saved.inspect_err(|e| {
            error!(id = %property.id, error = %e, "failed to save listing");
        })?;
        info!(id = %property.id, new = is_new, "listing saved");

        self.refresh_listings().await?;
        Ok(serde_json::from_value(saved).unwrap_or(property))
    }

    pub async fn delete_property(&mut self, id: &str) -> Result<()> {
        self.store
            .delete(Collection::Properties, id)
            .await
            .inspect_err(|e| error!(id = %id, error = %e, "failed to delete listing"))?;
        info!(id = %id, "listing deleted");
        self.refresh_listings().await
    }

    /// Writes back the stored record of a listing with one key changed.
    async fn patch_listing(&mut self, id: &str, key: &str, value: Value) -> Result<()> {
        let mut record = self.stored_record(id)?;
        if let Value::Object(fields) = &mut record {
            fields.insert(key.to_string(), value);
        }
        self.store
            .replace(Collection::Properties, id, record)
            .await
            .inspect_err(|e| error!(id = %id, error = %e, "failed to update listing"))?;
        self.refresh_listings().await
    }

    pub async fn set_status(&mut self, id: &str, status: Status) -> Result<()> {
        self.require(id)?;
        self.patch_listing(id, "status", json!(status.as_str())).await?;
        info!(id = %id, status = %status, "status changed");
        Ok(())
    }

    /// Stores and returns the read-only client link of a listing.
    pub async fn share_link(&mut self, id: &str) -> Result<String> {
        self.require(id)?;
        let link = format!("{}/property/{}?clientMode=true", self.share_origin, id);
        self.patch_listing(id, "publicLink", json!(link)).await?;
        info!(id = %id, "share link stored");
        Ok(link)
    }

    /// Uploads one image, returning the URL to put on a listing.
    pub async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let size = bytes.len();
        let url = self
            .store
            .upload(file_name, bytes)
            .await
            .inspect_err(|e| error!(file = %file_name, error = %e, "upload failed"))?;
        info!(file = %file_name, size, url = %url, "image uploaded");
        Ok(url)
    }

    /// Adds a custom option. `Ok(false)` when the value is blank or known.
    pub async fn add_custom_option(&mut self, facet: Facet, value: &str) -> Result<bool> {
        let mut next = self.taxonomy.clone();
        if !next.add_custom_option(facet, value) {
            debug!(facet = %facet, value = %value, "option already present");
            return Ok(false);
        }

        let stored = self.store.put_custom_options(next.custom()).await?;
        self.taxonomy.set_custom(stored);
        info!(facet = %facet, value = %value.trim(), "custom option added");
        Ok(true)
    }

    /// Removes a custom option. Seed values are rejected before any
    /// request is made.
    ///
    /// Removing a district also clears it on every listing that carries
    /// it. Those updates run concurrently and are not rolled back: the
    /// listings are re-fetched whatever happens, and any failed updates
    /// are reported together as `PartialFanOut`.
    pub async fn remove_custom_option(&mut self, facet: Facet, value: &str) -> Result<bool> {
        let mut next = self.taxonomy.clone();
        if !next.remove_custom_option(facet, value)? {
            return Ok(false);
        }

        let stored = self.store.put_custom_options(next.custom()).await?;
        self.taxonomy.set_custom(stored);
        info!(facet = %facet, value = %value, "custom option removed");

        if facet == Facet::Districts {
            self.clear_district(value).await?;
        }
        Ok(true)
    }

    async fn clear_district(&mut self, district: &str) -> Result<()> {
        let affected: Vec<(String, Value)> = self
            .listings
            .iter()
            .filter(|p| p.district == district)
            .filter_map(|p| self.stored_record(&p.id).ok().map(|r| (p.id.clone(), r)))
            .map(|(id, mut record)| {
                if let Value::Object(fields) = &mut record {
                    fields.insert("district".to_string(), json!(""));
                }
                (id, record)
            })
            .collect();
        if affected.is_empty() {
            return Ok(());
        }

        let total = affected.len();
        info!(district = %district, count = total, "clearing district on listings");
        let store = &self.store;
        let updates = affected.into_iter().map(|(id, record)| async move {
            match store.replace(Collection::Properties, &id, record).await {
                Ok(_) => Ok(()),
                Err(e) => {
                    warn!(id = %id, error = %e, "district update failed");
                    Err(id)
                }
            }
        });
        let failed: Vec<String> = join_all(updates)
            .await
            .into_iter()
            .filter_map(|r| r.err())
            .collect();

        self.refresh_listings().await?;

        if failed.is_empty() {
            Ok(())
        } else {
            error!(failed = failed.len(), total, "district fan-out incomplete");
            Err(CrmError::PartialFanOut { failed, total })
        }
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Creates the client when its id is empty, replaces it otherwise.
    pub async fn save_client(&mut self, client: Client) -> Result<Client> {
        validate_client(&client)?;

        let saved = if client.id.is_empty() {
            self.store
                .create(Collection::Clients, new_record(&client)?)
                .await?
        } else {
            let record = serde_json::to_value(&client)?;
            self.store
                .replace(Collection::Clients, &client.id, record)
                .await?
        };
        let saved: Client = serde_json::from_value(saved)?;
        info!(id = %saved.id, "client saved");

        self.refresh_clients().await?;
        Ok(saved)
    }

    pub async fn delete_client(&mut self, id: &str) -> Result<()> {
        self.store.delete(Collection::Clients, id).await?;
        info!(id = %id, "client deleted");
        self.refresh_clients().await
    }
}
