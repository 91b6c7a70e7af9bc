pub mod client;
pub mod error;
pub mod ports;
pub mod types;

pub use client::PokeApiCatalog;
pub use error::CatalogError;
pub use ports::CatalogPort;
pub use types::{CatalogEntry, CatalogPage, CatalogSummary};
