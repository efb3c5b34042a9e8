use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::lenient::{deserialize_number, parse_number};
use crate::models::{Category, ListingType, LocationType, Status};

/// Inclusive numeric range. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    #[serde(default, deserialize_with = "deserialize_number")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub max: Option<f64>,
}

impl RangeFilter {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Builds a range from text inputs. Empty or non-numeric text is no bound.
    pub fn from_bounds(min: &str, max: &str) -> Self {
        Self {
            min: parse_number(min),
            max: parse_number(max),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }

    /// Missing listing values compare as zero.
    pub fn contains_or_zero(&self, value: Option<f64>) -> bool {
        self.contains(value.unwrap_or(0.0))
    }
}

/// Accepted values for a single-valued field. Empty accepts everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnyOf<T: Ord = String>(pub BTreeSet<T>);

impl<T: Ord> Default for AnyOf<T> {
    fn default() -> Self {
        AnyOf(BTreeSet::new())
    }
}

impl<T: Ord> AnyOf<T> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn admits(&self, value: &T) -> bool {
        self.0.is_empty() || self.0.contains(value)
    }
}

impl AnyOf<String> {
    pub fn of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnyOf(values.into_iter().map(Into::into).collect())
    }

    pub fn admits_str(&self, value: &str) -> bool {
        self.0.is_empty() || self.0.contains(value)
    }

    /// A field the listing does not have only passes an empty filter.
    pub fn admits_opt(&self, value: Option<&str>) -> bool {
        match value {
            Some(v) => self.admits_str(v),
            None => self.0.is_empty(),
        }
    }
}

impl<T: Ord> FromIterator<T> for AnyOf<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        AnyOf(iter.into_iter().collect())
    }
}

/// Values that must all be present in a listing's set. Empty requires nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllOf(pub Vec<String>);

impl AllOf {
    pub fn of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllOf(values.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn satisfied_by(&self, present: &[String]) -> bool {
        self.0.iter().all(|wanted| present.contains(wanted))
    }
}

/// `None` leaves the flag unconstrained.
pub type TriState = Option<bool>;

pub(crate) fn tri_state_admits(wanted: TriState, actual: bool) -> bool {
    wanted.map_or(true, |w| w == actual)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Available,
    Sold,
    Advance,
}

impl StatusFilter {
    pub fn admits(&self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Available => status == Status::Available,
            StatusFilter::Sold => status == Status::Sold,
            StatusFilter::Advance => status == Status::Advance,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            other => other.parse::<Status>().map(|status| match status {
                Status::Available => StatusFilter::Available,
                Status::Sold => StatusFilter::Sold,
                Status::Advance => StatusFilter::Advance,
            }),
        }
    }
}

/// Criteria for apartments, houses and commercial premises.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResidentialCriteria {
    #[serde(rename = "type")]
    pub listing_type: AnyOf<ListingType>,
    pub rooms: AnyOf,
    pub floor: RangeFilter,
    pub total_floors: RangeFilter,
    pub total_area: RangeFilter,
    pub kitchen_area: RangeFilter,
    pub house_subtype: AnyOf,
    pub housing_class: AnyOf,
    pub repair_type: AnyOf,
    pub heating: AnyOf,
    pub year_built: AnyOf,
    pub wall_type: AnyOf,
    pub bathroom_type: AnyOf,
    pub deal_type: AnyOf,
    pub planning_status: AnyOf,
    pub tech: AllOf,
    pub comfort: AllOf,
    pub comm: AllOf,
    pub infra: AllOf,
    pub has_furniture: TriState,
    pub has_repair: TriState,
    #[serde(rename = "isEOselya")]
    pub is_eoselya: TriState,
}

/// Criteria that only make sense for houses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HouseCriteria {
    pub location_type: Option<LocationType>,
    /// Only applied together with `OutsideCity`.
    pub max_distance_km: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LandCriteria {
    pub land_area: RangeFilter,
    pub land_type: AnyOf,
    pub land_communications: AllOf,
    pub land_structures: AllOf,
    pub land_infrastructure: AllOf,
    pub land_landscape: AllOf,
}

/// A catalog query. Every constraint defaults to "unconstrained".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub category: Category,
    pub status: StatusFilter,
    /// Case-insensitive substring over address, description and owner phone.
    pub keywords: String,
    pub price: RangeFilter,
    pub districts: AnyOf,
    pub residential: ResidentialCriteria,
    pub house: HouseCriteria,
    pub land: LandCriteria,
}

impl FilterState {
    pub fn for_category(category: Category) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    /// Clears every constraint but keeps the selected category.
    pub fn reset(&mut self) {
        *self = Self::for_category(self.category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_garbage_bounds_are_unbounded() {
        assert!(RangeFilter::from_bounds("", "").is_unbounded());
        assert!(RangeFilter::from_bounds("  ", "abc").is_unbounded());
        assert_eq!(
            RangeFilter::from_bounds("100", ""),
            RangeFilter::new(Some(100.0), None)
        );
        assert_eq!(
            RangeFilter::from_bounds("", "2.5"),
            RangeFilter::new(None, Some(2.5))
        );
    }

    #[test]
    fn range_is_inclusive() {
        let range = RangeFilter::from_bounds("100", "200");
        assert!(range.contains(100.0));
        assert!(range.contains(200.0));
        assert!(!range.contains(99.0));
        assert!(!range.contains(201.0));
    }

    #[test]
    fn missing_value_compares_as_zero() {
        assert!(RangeFilter::from_bounds("", "3").contains_or_zero(None));
        assert!(!RangeFilter::from_bounds("1", "").contains_or_zero(None));
    }

    #[test]
    fn any_of_and_all_of_differ() {
        let classes = AnyOf::of(["Комфорт", "Бизнес"]);
        assert!(classes.admits_str("Комфорт"));
        assert!(!classes.admits_str("Эконом"));
        assert!(AnyOf::<String>::default().admits_str("anything"));
        assert!(!classes.admits_opt(None));

        let tech = AllOf::of(["Кондиционер"]);
        let listing = vec!["Кондиционер".to_string(), "Холодильник".to_string()];
        assert!(tech.satisfied_by(&listing));
        assert!(!AllOf::of(["Кондиционер", "Бойлер"]).satisfied_by(&listing));
        assert!(AllOf::default().satisfied_by(&[]));
    }

    #[test]
    fn criteria_json_accepts_string_or_number_bounds() {
        let state: FilterState = serde_json::from_str(
            r#"{
                "category": "land",
                "status": "sold",
                "price": { "min": "100", "max": 200 },
                "land": { "landArea": { "min": "" }, "landType": ["Сельхоз"] }
            }"#,
        )
        .unwrap();

        assert_eq!(state.category, Category::Land);
        assert_eq!(state.status, StatusFilter::Sold);
        assert_eq!(state.price, RangeFilter::new(Some(100.0), Some(200.0)));
        assert!(state.land.land_area.is_unbounded());
        assert!(state.land.land_type.admits_str("Сельхоз"));
        assert!(state.residential.tech.is_empty());
    }

    #[test]
    fn reset_keeps_category() {
        let mut state = FilterState::for_category(Category::Houses);
        state.keywords = "море".into();
        state.residential.has_repair = Some(true);
        state.reset();
        assert_eq!(state, FilterState::for_category(Category::Houses));
    }

    #[test]
    fn status_filter_parses_all() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!("advance".parse::<StatusFilter>(), Ok(StatusFilter::Advance));
        assert!("pending".parse::<StatusFilter>().is_err());
    }
}
