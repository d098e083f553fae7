use crate::model::{Listing, Tier};

/// Stable partition: verified listings first, each tier keeping its input order.
pub fn rank<'a>(listings: Vec<&'a Listing>) -> Vec<&'a Listing> {
    let (mut verified, standard): (Vec<_>, Vec<_>) = listings
        .into_iter()
        .partition(|listing| listing.tier == Tier::Verified);
    verified.extend(standard);
    verified
}
