mod client;
pub(crate) mod lenient;
mod property;

pub use client::Client;
pub use lenient::{parse_number, parse_timestamp};
pub use property::{
    Category, Details, House, Land, ListingType, LocationType, Property, Residential, Status,
};
