//! Catalog filtering.
//!
//! A listing passes when every applicable predicate passes. The category
//! gate runs first; everything after it is specific to that category and
//! never looks at fields the listing's category does not have.

mod criteria;

pub use criteria::{
    AllOf, AnyOf, FilterState, HouseCriteria, LandCriteria, RangeFilter, ResidentialCriteria,
    StatusFilter, TriState,
};

use crate::models::{Details, House, Land, LocationType, Property, Residential};
use criteria::tri_state_admits;

/// Listings that satisfy `criteria`, in their original order.
pub fn filter<'a>(listings: &'a [Property], criteria: &FilterState) -> Vec<&'a Property> {
    listings.iter().filter(|p| criteria.matches(p)).collect()
}

impl FilterState {
    pub fn matches(&self, property: &Property) -> bool {
        if property.category() != self.category {
            return false;
        }
        if !self.status.admits(property.status) {
            return false;
        }
        if !self.price.contains(property.price) {
            return false;
        }

        match &property.details {
            Details::Land(land) => self.matches_land(property, land),
            Details::Houses(house) => {
                self.matches_residential(property, &house.residential, Some(house))
                    && self.matches_location(house)
            }
            Details::Apartments(r) | Details::Commercial(r) => {
                self.matches_residential(property, r, None)
            }
        }
    }

    fn matches_keywords(&self, property: &Property) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let needle = self.keywords.to_lowercase();
        [
            &property.address,
            &property.description,
            &property.owner_phone,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_land(&self, property: &Property, land: &Land) -> bool {
        let c = &self.land;

        c.land_area.contains_or_zero(land.land_area)
            && self.matches_keywords(property)
            && self.districts.admits_str(&property.district)
            && c.land_type.admits_str(&land.land_type)
            && c.land_communications.satisfied_by(&land.land_communications)
            && c.land_structures.satisfied_by(&land.land_structures)
            && c.land_infrastructure.satisfied_by(&land.land_infrastructure)
            && c.land_landscape.satisfied_by(&land.land_landscape)
    }

    fn matches_residential(
        &self,
        property: &Property,
        r: &Residential,
        house: Option<&House>,
    ) -> bool {
        let c = &self.residential;

        // ranges
        if !(c.floor.contains_or_zero(r.floor)
            && c.total_floors.contains_or_zero(r.total_floors)
            && c.total_area.contains(r.total_area)
            && c.kitchen_area.contains_or_zero(r.kitchen_area))
        {
            return false;
        }

        if !self.matches_keywords(property) {
            return false;
        }

        // single value among accepted values
        if !(self.districts.admits_str(&property.district)
            && c.listing_type.admits(&property.listing_type)
            && c.rooms.admits_str(&r.rooms)
            && c.house_subtype
                .admits_opt(house.map(|h| h.house_subtype.as_str()))
            && c.housing_class.admits_str(&r.housing_class)
            && c.repair_type.admits_str(&r.repair_type)
            && c.heating.admits_str(&r.heating)
            && c.year_built.admits_str(&r.year_built)
            && c.wall_type.admits_str(&r.wall_type)
            && c.bathroom_type.admits_str(&r.bathroom_type)
            && c.deal_type.admits_str(&r.deal_type)
            && c.planning_status.admits_str(&r.planning_status))
        {
            return false;
        }

        // every requested value present
        if !(c.tech.satisfied_by(&r.tech)
            && c.comfort.satisfied_by(&r.comfort)
            && c.comm.satisfied_by(&r.comm)
            && c.infra.satisfied_by(&r.infra))
        {
            return false;
        }

        tri_state_admits(c.has_furniture, r.has_furniture)
            && tri_state_admits(c.has_repair, r.has_repair)
            && tri_state_admits(c.is_eoselya, r.is_eoselya)
    }

    fn matches_location(&self, house: &House) -> bool {
        let Some(wanted) = self.house.location_type else {
            return true;
        };
        if house.location_type != wanted {
            return false;
        }
        match (wanted, self.house.max_distance_km) {
            (LocationType::OutsideCity, Some(ceiling)) => house
                .distance_from_city_km
                .is_some_and(|distance| distance <= ceiling),
            _ => true,
        }
    }
}
