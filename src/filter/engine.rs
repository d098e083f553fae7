use crate::filter::facility::FacilityMatcher;
use crate::model::{FilterState, Listing};

/// Trait defining the interface for a listing filter.
pub trait ListingFilter {
    /// Returns the listings passing every predicate of `state`, in input order.
    fn apply<'a>(&self, listings: &'a [Listing], state: &FilterState) -> Vec<&'a Listing>;
}

/// Implementation of the listings filter: text search, category equality,
/// facilities (all must match) and minimum-price band.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    matcher: FacilityMatcher,
}

impl FilterEngine {
    pub fn new(matcher: FacilityMatcher) -> Self {
        Self { matcher }
    }

    pub fn matches(&self, listing: &Listing, state: &FilterState) -> bool {
        matches_query(listing, &state.query)
            && matches_category(&listing.city, state.city.as_deref())
            && matches_category(&listing.direction, state.direction.as_deref())
            && matches_category(&listing.kind, state.kind.as_deref())
            && state
                .facilities
                .iter()
                .all(|requested| self.matcher.matches(&listing.facilities, requested))
            && matches_price(listing, state)
    }
}

impl ListingFilter for FilterEngine {
    fn apply<'a>(&self, listings: &'a [Listing], state: &FilterState) -> Vec<&'a Listing> {
        listings
            .iter()
            .filter(|listing| self.matches(listing, state))
            .collect()
    }
}

fn matches_query(listing: &Listing, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    listing.title.to_lowercase().contains(&query)
        || listing.id.to_lowercase().contains(&query)
        || listing.city.to_lowercase().contains(&query)
        || listing
            .facilities
            .iter()
            .any(|f| f.to_lowercase().contains(&query))
}

fn matches_category(value: &str, wanted: Option<&str>) -> bool {
    match FilterState::category(wanted).as_deref() {
        None => true,
        Some(wanted) => value == wanted,
    }
}

/// Listings without any valid price are exempt from the price band.
fn matches_price(listing: &Listing, state: &FilterState) -> bool {
    match listing.prices.min_price() {
        None => true,
        Some(min) => state.price_range.contains(min),
    }
}
