use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::Property;

pub const INITIAL_DISTRICTS: &[&str] = &["Приморский", "Малиновский", "Суворовский", "Киевский"];

pub const LAND_TYPES: &[&str] = &["Под застройку", "Сельхоз", "Коммерческое"];

pub const HOUSE_TYPES: &[&str] = &[
    "Клубный дом",
    "Коттедж",
    "Дача",
    "Дуплекс",
    "Дом",
    "Часть дома",
    "Модульные дома",
    "Таунхаус",
];

pub const ROOMS_OPTIONS: &[&str] = &["Студия", "1", "2", "3", "4", "5+"];

/// A user-extensible attribute dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Facet {
    Districts,
    HousingClasses,
    RepairTypes,
    HeatingOptions,
    YearBuiltOptions,
    WallTypeOptions,
    BathroomOptions,
    LandTypes,
    DealTypeOptions,
    PlanningStatusOptions,
    HouseTypes,
    ComfortOptions,
    TechOptions,
    CommOptions,
    InfraOptions,
    LandCommunicationsOptions,
    LandStructuresOptions,
    LandInfrastructureOptions,
    LandLandscapeOptions,
}

impl Facet {
    pub const ALL: [Facet; 19] = [
        Facet::Districts,
        Facet::HousingClasses,
        Facet::RepairTypes,
        Facet::HeatingOptions,
        Facet::YearBuiltOptions,
        Facet::WallTypeOptions,
        Facet::BathroomOptions,
        Facet::LandTypes,
        Facet::DealTypeOptions,
        Facet::PlanningStatusOptions,
        Facet::HouseTypes,
        Facet::ComfortOptions,
        Facet::TechOptions,
        Facet::CommOptions,
        Facet::InfraOptions,
        Facet::LandCommunicationsOptions,
        Facet::LandStructuresOptions,
        Facet::LandInfrastructureOptions,
        Facet::LandLandscapeOptions,
    ];

    /// Key of this facet inside the `customOptions` resource.
    pub fn key(&self) -> &'static str {
        match self {
            Facet::Districts => "districts",
            Facet::HousingClasses => "housingClasses",
            Facet::RepairTypes => "repairTypes",
            Facet::HeatingOptions => "heatingOptions",
            Facet::YearBuiltOptions => "yearBuiltOptions",
            Facet::WallTypeOptions => "wallTypeOptions",
            Facet::BathroomOptions => "bathroomOptions",
            Facet::LandTypes => "landTypes",
            Facet::DealTypeOptions => "dealTypeOptions",
            Facet::PlanningStatusOptions => "planningStatusOptions",
            Facet::HouseTypes => "houseTypes",
            Facet::ComfortOptions => "comfortOptions",
            Facet::TechOptions => "techOptions",
            Facet::CommOptions => "commOptions",
            Facet::InfraOptions => "infraOptions",
            Facet::LandCommunicationsOptions => "landCommunicationsOptions",
            Facet::LandStructuresOptions => "landStructuresOptions",
            Facet::LandInfrastructureOptions => "landInfrastructureOptions",
            Facet::LandLandscapeOptions => "landLandscapeOptions",
        }
    }

    /// Built-in values. They can be referenced but never removed.
    pub fn seed(&self) -> &'static [&'static str] {
        match self {
            Facet::Districts => INITIAL_DISTRICTS,
            Facet::LandTypes => LAND_TYPES,
            Facet::HouseTypes => HOUSE_TYPES,
            _ => &[],
        }
    }

    /// Values of this facet carried by `property`. Empty when the facet
    /// does not belong to the property's category.
    pub fn values_of<'a>(&self, property: &'a Property) -> Vec<&'a str> {
        if let Facet::Districts = self {
            return vec![property.district.as_str()];
        }

        if let Some(land) = property.land() {
            return match self {
                Facet::LandTypes => vec![land.land_type.as_str()],
                Facet::LandCommunicationsOptions => strs(&land.land_communications),
                Facet::LandStructuresOptions => strs(&land.land_structures),
                Facet::LandInfrastructureOptions => strs(&land.land_infrastructure),
                Facet::LandLandscapeOptions => strs(&land.land_landscape),
                _ => Vec::new(),
            };
        }

        if let (Facet::HouseTypes, Some(house)) = (self, property.house()) {
            return vec![house.house_subtype.as_str()];
        }

        let Some(r) = property.residential() else {
            return Vec::new();
        };
        let field = match self {
            Facet::HousingClasses => &r.housing_class,
            Facet::RepairTypes => &r.repair_type,
            Facet::HeatingOptions => &r.heating,
            Facet::YearBuiltOptions => &r.year_built,
            Facet::WallTypeOptions => &r.wall_type,
            Facet::BathroomOptions => &r.bathroom_type,
            Facet::DealTypeOptions => &r.deal_type,
            Facet::PlanningStatusOptions => &r.planning_status,
            Facet::ComfortOptions => return strs(&r.comfort),
            Facet::TechOptions => return strs(&r.tech),
            Facet::CommOptions => return strs(&r.comm),
            Facet::InfraOptions => return strs(&r.infra),
            _ => return Vec::new(),
        };
        vec![field.as_str()]
    }
}

fn strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Facet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Facet::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| format!("unknown facet '{}'", s))
    }
}
