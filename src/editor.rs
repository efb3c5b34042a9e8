//! Building and editing a single listing.
//!
//! Numeric input is coerced best-effort: anything that does not parse is
//! treated as absent. Required fields are checked only on submit.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::lenient::{deserialize_number, parse_number};
use crate::models::{
    Category, Client, Details, House, Land, ListingType, LocationType, Property, Residential,
    Status,
};
use crate::taxonomy::{Facet, Taxonomy, HOUSE_TYPES};

/// Cover used when a listing is saved without photos.
pub const PLACEHOLDER_IMAGE: &str = "data:image/svg+xml;charset=UTF-8,%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%20width%3D%22100%22%20height%3D%2275%22%20viewBox%3D%220%200%2024%2024%22%20fill%3D%22none%22%20stroke%3D%22%23cbd5e1%22%20stroke-width%3D%222%22%3E%3Cpath%20d%3D%22M3%209l9-7%209%207v11a2%202%200%200%201-2%202H5a2%202%200%200%201-2-2z%22%3E%3C%2Fpath%3E%3C%2Fsvg%3E";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Пожалуйста, укажите район")]
    MissingDistrict,
    #[error("Пожалуйста, укажите адрес")]
    MissingAddress,
    #[error("Пожалуйста, укажите телефон владельца")]
    MissingOwnerPhone,
    #[error("Пожалуйста, укажите цену")]
    MissingPrice,
    #[error("Пожалуйста, укажите телефон клиента")]
    MissingClientPhone,
    #[error("Пожалуйста, опишите запрос клиента")]
    MissingClientRequest,
}

/// Numeric inputs of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Price,
    Floor,
    TotalFloors,
    TotalArea,
    KitchenArea,
    PlotArea,
    DistanceFromCityKm,
    LandArea,
}

/// A listing under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub listing_type: ListingType,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub price: Option<f64>,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub owner_phone: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_link: Option<String>,
    #[serde(flatten)]
    pub details: Details,
}

impl PropertyDraft {
    /// Empty apartment form, pickers preset to the first known option.
    pub fn new(taxonomy: &Taxonomy, listings: &[Property]) -> Self {
        Self {
            id: None,
            listing_type: ListingType::Secondary,
            status: Status::Available,
            price: None,
            district: String::new(),
            address: String::new(),
            owner_phone: String::new(),
            description: String::new(),
            image_urls: Vec::new(),
            public_link: None,
            details: Details::Apartments(default_residential(taxonomy, listings)),
        }
    }

    pub fn from_property(property: &Property) -> Self {
        Self {
            id: Some(property.id.clone()),
            listing_type: property.listing_type,
            status: property.status,
            price: Some(property.price),
            district: property.district.clone(),
            address: property.address.clone(),
            owner_phone: property.owner_phone.clone(),
            description: property.description.clone(),
            image_urls: property.image_urls.clone(),
            public_link: property.public_link.clone(),
            details: property.details.clone(),
        }
    }

    pub fn category(&self) -> Category {
        self.details.category()
    }

    /// Switches category, clearing attributes the new category does not have.
    ///
    /// Shared building attributes carry over between apartments, houses
    /// and commercial premises; house-only and land-only fields never do.
    pub fn set_category(
        &mut self,
        category: Category,
        taxonomy: &Taxonomy,
        listings: &[Property],
    ) {
        if self.category() == category {
            return;
        }

        let carried = self
            .details
            .residential()
            .cloned()
            .unwrap_or_else(|| default_residential(taxonomy, listings));

        self.details = match category {
            Category::Land => Details::Land(Land::default()),
            Category::Apartments => Details::Apartments(carried),
            Category::Commercial => Details::Commercial(carried),
            Category::Houses => Details::Houses(House {
                residential: carried,
                house_subtype: HOUSE_TYPES[0].to_string(),
                location_type: LocationType::InCity,
                ..House::default()
            }),
        };
    }

    /// Stores a typed number. Returns `false` when the field does not
    /// belong to the current category.
    pub fn set_number(&mut self, field: NumericField, raw: &str) -> bool {
        let value = parse_number(raw);

        if field == NumericField::Price {
            self.price = value;
            return true;
        }

        match (&mut self.details, field) {
            (Details::Land(land), NumericField::LandArea) => land.land_area = value,
            (Details::Land(land), NumericField::DistanceFromCityKm) => {
                land.distance_from_city_km = value
            }
            (Details::Houses(house), NumericField::PlotArea) => house.plot_area = value,
            (Details::Houses(house), NumericField::DistanceFromCityKm) => {
                house.distance_from_city_km = value
            }
            (details, field) => {
                let Some(r) = details.residential_mut() else {
                    return false;
                };
                match field {
                    NumericField::Floor => r.floor = value,
                    NumericField::TotalFloors => r.total_floors = value,
                    NumericField::TotalArea => r.total_area = value.unwrap_or(0.0),
                    NumericField::KitchenArea => r.kitchen_area = value,
                    _ => return false,
                }
            }
        }
        true
    }

    /// In-city locations carry no distance.
    pub fn set_location_type(&mut self, location: LocationType) -> bool {
        let (current, distance) = match &mut self.details {
            Details::Houses(h) => (&mut h.location_type, &mut h.distance_from_city_km),
            Details::Land(l) => (&mut l.location_type, &mut l.distance_from_city_km),
            _ => return false,
        };
        *current = location;
        if location == LocationType::InCity {
            *distance = None;
        }
        true
    }

    pub fn add_image(&mut self, url: impl Into<String>) {
        self.image_urls.push(url.into());
    }

    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        (index < self.image_urls.len()).then(|| self.image_urls.remove(index))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.district.trim().is_empty() {
            return Err(ValidationError::MissingDistrict);
        }
        if self.address.trim().is_empty() {
            return Err(ValidationError::MissingAddress);
        }
        if self.owner_phone.trim().is_empty() {
            return Err(ValidationError::MissingOwnerPhone);
        }
        if self.price.is_none() {
            return Err(ValidationError::MissingPrice);
        }
        Ok(())
    }

    /// Validates and produces the record to persist. New drafts get an id.
    pub fn into_property(self) -> Result<Property, ValidationError> {
        self.validate()?;

        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let image_urls = if self.image_urls.is_empty() {
            vec![PLACEHOLDER_IMAGE.to_string()]
        } else {
            self.image_urls
        };

        Ok(Property {
            id,
            listing_type: self.listing_type,
            status: self.status,
            price: self.price.unwrap_or_default(),
            district: self.district,
            address: self.address,
            owner_phone: self.owner_phone,
            description: self.description,
            image_urls,
            public_link: self.public_link,
            details: self.details,
        })
    }
}

fn default_residential(taxonomy: &Taxonomy, listings: &[Property]) -> Residential {
    let first = |facet: Facet| {
        taxonomy
            .available_options(facet, listings)
            .into_iter()
            .next()
            .unwrap_or_default()
    };

    Residential {
        rooms: "1".to_string(),
        housing_class: first(Facet::HousingClasses),
        repair_type: first(Facet::RepairTypes),
        heating: first(Facet::HeatingOptions),
        year_built: first(Facet::YearBuiltOptions),
        wall_type: first(Facet::WallTypeOptions),
        bathroom_type: first(Facet::BathroomOptions),
        ..Residential::default()
    }
}

pub fn validate_client(client: &Client) -> Result<(), ValidationError> {
    if client.phone_number.trim().is_empty() {
        return Err(ValidationError::MissingClientPhone);
    }
    if client.request.trim().is_empty() {
        return Err(ValidationError::MissingClientRequest);
    }
    Ok(())
}
