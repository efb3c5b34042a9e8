//! Selectable values per facet: built-in seeds, user-added custom values,
//! and whatever existing records already carry.

mod facet;

pub use facet::{Facet, HOUSE_TYPES, INITIAL_DISTRICTS, LAND_TYPES, ROOMS_OPTIONS};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{CrmError, Result};
use crate::models::Property;

/// The `customOptions` resource, replaced wholesale on every change.
///
/// Keys this crate does not know are kept untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomOptions(BTreeMap<String, Value>);

impl CustomOptions {
    /// Custom values of `facet`. Non-string entries are skipped.
    pub fn list(&self, facet: Facet) -> Vec<String> {
        match self.0.get(facet.key()) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set(&mut self, facet: Facet, values: Vec<String>) {
        let items = values.into_iter().map(Value::String).collect();
        self.0.insert(facet.key().to_string(), Value::Array(items));
    }
}

/// Seeds plus custom values for every facet.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    seeds: HashMap<Facet, Vec<String>>,
    custom: CustomOptions,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::new(CustomOptions::default())
    }
}

impl Taxonomy {
    pub fn new(custom: CustomOptions) -> Self {
        let seeds = Facet::ALL
            .into_iter()
            .map(|f| (f, f.seed().iter().map(|s| s.to_string()).collect()))
            .collect();
        Self { seeds, custom }
    }

    /// Replaces the built-in values of one facet.
    pub fn with_seed<I, S>(mut self, facet: Facet, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seeds
            .insert(facet, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn custom(&self) -> &CustomOptions {
        &self.custom
    }

    pub fn set_custom(&mut self, custom: CustomOptions) {
        self.custom = custom;
    }

    pub fn seed(&self, facet: Facet) -> &[String] {
        self.seeds.get(&facet).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_protected(&self, facet: Facet, value: &str) -> bool {
        self.seed(facet).iter().any(|s| s == value)
    }

    /// Picker candidates: seed ∪ custom ∪ values found on `listings`,
    /// sorted and without blanks.
    ///
    /// Values that only survive on records stay selectable after their
    /// custom entry is removed.
    pub fn available_options(&self, facet: Facet, listings: &[Property]) -> Vec<String> {
        let mut all: BTreeSet<String> = BTreeSet::new();
        all.extend(self.seed(facet).iter().cloned());
        all.extend(self.custom.list(facet));
        for listing in listings {
            all.extend(facet.values_of(listing).into_iter().map(str::to_string));
        }
        all.retain(|v| !v.trim().is_empty());
        all.into_iter().collect()
    }

    /// Adds a custom value. Returns `false` when the trimmed value is
    /// empty or already known as a seed or custom value.
    pub fn add_custom_option(&mut self, facet: Facet, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.is_protected(facet, value) {
            return false;
        }
        let mut custom = self.custom.list(facet);
        if custom.iter().any(|c| c == value) {
            return false;
        }
        custom.push(value.to_string());
        custom.sort();
        self.custom.set(facet, custom);
        true
    }

    /// Removes a custom value. Seed values are rejected; an unknown value
    /// is a no-op returning `false`.
    pub fn remove_custom_option(&mut self, facet: Facet, value: &str) -> Result<bool> {
        if self.is_protected(facet, value) {
            return Err(CrmError::ProtectedValue {
                facet: facet.key().to_string(),
                value: value.to_string(),
            });
        }
        let mut custom = self.custom.list(facet);
        let before = custom.len();
        custom.retain(|c| c != value);
        if custom.len() == before {
            return Ok(false);
        }
        self.custom.set(facet, custom);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(district: &str) -> Property {
        serde_json::from_value(json!({
            "id": district, "category": "apartments", "district": district
        }))
        .unwrap()
    }

    fn sample() -> Taxonomy {
        let mut custom = CustomOptions::default();
        custom.set(Facet::Districts, vec!["C".into()]);
        Taxonomy::new(custom).with_seed(Facet::Districts, ["A", "B"])
    }

    #[test]
    fn union_of_seed_custom_and_records() {
        let taxonomy = sample();
        let listings = vec![listing("D"), listing("A"), listing("")];
        assert_eq!(
            taxonomy.available_options(Facet::Districts, &listings),
            vec!["A", "B", "C", "D"]
        );
    }

    #[test]
    fn seed_values_are_protected() {
        let mut taxonomy = sample();
        let err = taxonomy
            .remove_custom_option(Facet::Districts, "A")
            .unwrap_err();
        assert!(matches!(err, CrmError::ProtectedValue { .. }));
        assert_eq!(taxonomy.custom().list(Facet::Districts), vec!["C"]);
    }

    #[test]
    fn add_trims_dedupes_and_sorts() {
        let mut taxonomy = sample();
        assert!(taxonomy.add_custom_option(Facet::Districts, "  Black  "));
        assert!(!taxonomy.add_custom_option(Facet::Districts, "Black"));
        assert!(!taxonomy.add_custom_option(Facet::Districts, "A"));
        assert!(!taxonomy.add_custom_option(Facet::Districts, "   "));
        assert_eq!(
            taxonomy.custom().list(Facet::Districts),
            vec!["Black", "C"]
        );
    }

    #[test]
    fn removed_value_survives_on_records() {
        let mut taxonomy = sample();
        assert!(taxonomy.remove_custom_option(Facet::Districts, "C").unwrap());
        assert!(!taxonomy.remove_custom_option(Facet::Districts, "C").unwrap());

        let listings = vec![listing("C")];
        assert!(taxonomy
            .available_options(Facet::Districts, &listings)
            .contains(&"C".to_string()));
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let raw = json!({ "districts": ["X"], "legacy": { "keep": true } });
        let mut custom: CustomOptions = serde_json::from_value(raw).unwrap();
        custom.set(Facet::TechOptions, vec!["Бойлер".into()]);

        let back = serde_json::to_value(&custom).unwrap();
        assert_eq!(back["legacy"]["keep"], true);
        assert_eq!(back["techOptions"], json!(["Бойлер"]));
        assert_eq!(custom.list(Facet::Districts), vec!["X"]);
    }

    #[test]
    fn builtin_seeds() {
        let taxonomy = Taxonomy::default();
        assert!(taxonomy.is_protected(Facet::LandTypes, "Сельхоз"));
        assert!(taxonomy.is_protected(Facet::Districts, "Киевский"));
        assert!(!taxonomy.is_protected(Facet::HeatingOptions, "Газ"));
    }
}
