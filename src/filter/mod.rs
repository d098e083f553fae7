// Filter module: facility matching, predicate engine and tier ranking.

pub mod engine;
pub mod facility;
pub mod ranking;

pub use engine::{FilterEngine, ListingFilter};
pub use facility::{default_smart_filters, FacilityMatcher, SmartCategory};
pub use ranking::rank;
