// Core structs: Listing, FilterState, error types
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::utils::parse_price;

/// Subscription class of a listing. Verified listings rank first and carry a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Standard,
    Verified,
}

/// Raw price strings as they come from the spreadsheet. Empty means absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Prices {
    pub weekday: String,
    pub weekend: String,
    pub overnight: String,
    pub holidays: String,
}

impl Prices {
    /// All parseable, positive prices in field order.
    pub fn valid_prices(&self) -> Vec<f64> {
        [&self.weekday, &self.weekend, &self.overnight, &self.holidays]
            .into_iter()
            .filter_map(|raw| parse_price(raw))
            .collect()
    }

    /// Lowest valid price, or `None` when the listing carries no usable price data.
    pub fn min_price(&self) -> Option<f64> {
        self.valid_prices().into_iter().reduce(f64::min)
    }

    /// Price shown on the card: weekend, falling back to weekday, then "0".
    pub fn display_price(&self) -> &str {
        if !self.weekend.is_empty() {
            &self.weekend
        } else if !self.weekday.is_empty() {
            &self.weekday
        } else {
            "0"
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub city: String,
    pub direction: String,
    pub kind: String,
    pub facilities: Vec<String>,
    pub prices: Prices,
    pub tier: Tier,
    pub image_urls: Vec<String>,
    pub contact_handle: Option<String>,
}

impl Listing {
    pub fn is_verified(&self) -> bool {
        self.tier == Tier::Verified
    }

    pub fn top_facilities(&self, n: usize) -> &[String] {
        &self.facilities[..self.facilities.len().min(n)]
    }
}

/// Inclusive price band used by the price filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new(0.0, 5000.0)
    }
}

/// User-selected filters for one browsing session.
///
/// Category fields hold `None` for "no filter"; the UI sentinel `"all"` is
/// folded into `None` by [`FilterState::category`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub query: String,
    pub city: Option<String>,
    pub direction: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub facilities: BTreeSet<String>,
    pub price_range: PriceRange,
}

impl FilterState {
    pub const ALL: &'static str = "all";

    /// Folds empty strings and the "all" sentinel into an unset filter.
    pub fn category(value: Option<&str>) -> Option<String> {
        match value.map(str::trim) {
            None | Some("") | Some(Self::ALL) => None,
            Some(v) => Some(v.to_string()),
        }
    }

    pub fn with_price_range(range: PriceRange) -> Self {
        Self {
            price_range: range,
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    InvalidResponse(u16),
    #[error("failed to read listings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed listings payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no listings source configured")]
    NotConfigured,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("session value is not valid json: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("tracking request failed: {0}")]
    Api(#[from] reqwest::Error),
    #[error("tracking endpoint returned {0}")]
    Unreachable(u16),
    #[error("invalid contact link: {0}")]
    InvalidLink(String),
}
