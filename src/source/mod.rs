// Listings source module: where raw records come from.

pub mod fetcher;
pub mod traits;

pub use fetcher::{load_listings, source_from_config, FileListingsSource, HttpListingsSource};
pub use traits::ListingsSource;
