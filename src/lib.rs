pub mod config;
pub mod crm;
pub mod editor;
pub mod error;
pub mod filter;
pub mod models;
pub mod store;
pub mod taxonomy;

pub use config::Config;
pub use crm::Crm;
pub use error::{CrmError, Result};
