use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::lenient::{deserialize_id, deserialize_number, deserialize_number_or_zero};

/// Top-level kind of a listing. Decides which attribute group applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Apartments,
    Houses,
    Commercial,
    Land,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Apartments,
        Category::Houses,
        Category::Commercial,
        Category::Land,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Apartments => "apartments",
            Category::Houses => "houses",
            Category::Commercial => "commercial",
            Category::Land => "land",
        }
    }

    /// Display label used by the catalog.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Apartments => "Квартиры",
            Category::Houses => "Дома",
            Category::Commercial => "Коммерция",
            Category::Land => "Земельные участки",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Market segment of the building.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum ListingType {
    #[default]
    #[serde(rename = "Secondary", alias = "secondary")]
    Secondary,
    #[serde(rename = "New Build", alias = "new-build")]
    NewBuild,
    #[serde(rename = "Construction", alias = "under-construction")]
    UnderConstruction,
}

impl FromStr for ListingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Secondary" | "secondary" => Ok(ListingType::Secondary),
            "New Build" | "new-build" => Ok(ListingType::NewBuild),
            "Construction" | "under-construction" => Ok(ListingType::UnderConstruction),
            other => Err(format!("unknown listing type '{}'", other)),
        }
    }
}

/// Sale lifecycle, independent of category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Available,
    Sold,
    Advance,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Available => "available",
            Status::Sold => "sold",
            Status::Advance => "advance",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Status::Available),
            "sold" => Ok(Status::Sold),
            "advance" => Ok(Status::Advance),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum LocationType {
    #[default]
    #[serde(rename = "inCity")]
    InCity,
    #[serde(rename = "outsideCity")]
    OutsideCity,
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inCity" | "in-city" => Ok(LocationType::InCity),
            "outsideCity" | "outside-city" => Ok(LocationType::OutsideCity),
            other => Err(format!("unknown location type '{}'", other)),
        }
    }
}

/// Attributes shared by apartments, houses and commercial premises.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Residential {
    #[serde(deserialize_with = "deserialize_number")]
    pub floor: Option<f64>,
    #[serde(deserialize_with = "deserialize_number")]
    pub total_floors: Option<f64>,
    /// Opaque token: "1", "2", "Студия", "5+".
    pub rooms: String,
    #[serde(deserialize_with = "deserialize_number_or_zero")]
    pub total_area: f64,
    #[serde(deserialize_with = "deserialize_number")]
    pub kitchen_area: Option<f64>,
    pub housing_class: String,
    pub has_furniture: bool,
    pub has_repair: bool,
    pub repair_type: String,
    pub heating: String,
    pub year_built: String,
    pub wall_type: String,
    pub bathroom_type: String,
    pub deal_type: String,
    pub planning_status: String,
    #[serde(rename = "isEOselya")]
    pub is_eoselya: bool,
    pub tech: Vec<String>,
    pub comfort: Vec<String>,
    pub comm: Vec<String>,
    pub infra: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct House {
    #[serde(flatten)]
    pub residential: Residential,
    pub house_subtype: String,
    pub location_type: LocationType,
    #[serde(deserialize_with = "deserialize_number")]
    pub distance_from_city_km: Option<f64>,
    #[serde(deserialize_with = "deserialize_number")]
    pub plot_area: Option<f64>,
    pub cadastral_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Land {
    /// Area in сотки (hundredths of a hectare).
    #[serde(deserialize_with = "deserialize_number")]
    pub land_area: Option<f64>,
    pub land_type: String,
    pub location_type: LocationType,
    #[serde(deserialize_with = "deserialize_number")]
    pub distance_from_city_km: Option<f64>,
    pub land_communications: Vec<String>,
    pub land_structures: Vec<String>,
    pub land_infrastructure: Vec<String>,
    pub land_landscape: Vec<String>,
}

/// Category-specific attribute group, tagged by `category` on the wire.
///
/// Stored records are flat JSON objects; any field that belongs to a
/// different category is dropped when the record is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum Details {
    Apartments(Residential),
    Houses(House),
    Commercial(Residential),
    Land(Land),
}

impl Details {
    /// Fresh attribute group for `category`.
    pub fn empty(category: Category) -> Self {
        match category {
            Category::Apartments => Details::Apartments(Residential::default()),
            Category::Houses => Details::Houses(House::default()),
            Category::Commercial => Details::Commercial(Residential::default()),
            Category::Land => Details::Land(Land::default()),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Details::Apartments(_) => Category::Apartments,
            Details::Houses(_) => Category::Houses,
            Details::Commercial(_) => Category::Commercial,
            Details::Land(_) => Category::Land,
        }
    }

    pub fn residential(&self) -> Option<&Residential> {
        match self {
            Details::Apartments(r) | Details::Commercial(r) => Some(r),
            Details::Houses(h) => Some(&h.residential),
            Details::Land(_) => None,
        }
    }

    pub fn residential_mut(&mut self) -> Option<&mut Residential> {
        match self {
            Details::Apartments(r) | Details::Commercial(r) => Some(r),
            Details::Houses(h) => Some(&mut h.residential),
            Details::Land(_) => None,
        }
    }
}

impl Default for Details {
    fn default() -> Self {
        Details::empty(Category::default())
    }
}

/// A listing as stored by the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub listing_type: ListingType,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "deserialize_number_or_zero")]
    pub price: f64,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub owner_phone: String,
    #[serde(default)]
    pub description: String,
    /// Ordered; the first entry is the cover image.
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_link: Option<String>,
    #[serde(flatten)]
    pub details: Details,
}

impl Property {
    pub fn category(&self) -> Category {
        self.details.category()
    }

    pub fn residential(&self) -> Option<&Residential> {
        self.details.residential()
    }

    pub fn house(&self) -> Option<&House> {
        match &self.details {
            Details::Houses(h) => Some(h),
            _ => None,
        }
    }

    pub fn land(&self) -> Option<&Land> {
        match &self.details {
            Details::Land(l) => Some(l),
            _ => None,
        }
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }

    /// Price per m² (per сотка for land), rounded to the nearest unit.
    ///
    /// Land without an area divides by one; a zero floor area yields `None`.
    pub fn price_per_unit(&self) -> Option<f64> {
        let divisor = match &self.details {
            Details::Land(l) => l.land_area.filter(|a| *a != 0.0).unwrap_or(1.0),
            other => other.residential().map(|r| r.total_area).unwrap_or(0.0),
        };
        if divisor == 0.0 {
            return None;
        }
        Some((self.price / divisor).round())
    }

    /// Area shown on cards: total area for buildings, land area for plots.
    pub fn display_area(&self) -> f64 {
        match &self.details {
            Details::Land(l) => l.land_area.unwrap_or(0.0),
            other => other.residential().map(|r| r.total_area).unwrap_or(0.0),
        }
    }

    pub fn area_unit(&self) -> &'static str {
        match self.category() {
            Category::Land => "сот",
            _ => "м²",
        }
    }
}
