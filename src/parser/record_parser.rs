// Spreadsheet record parsing: Arabic-keyed JSON rows into `Listing`
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::model::{Listing, Prices, Tier};

const KEY_ID: &str = "رقم العقار";
const KEY_NAME: &str = "اسم العقار";
const KEY_CITY: &str = "المنطقة";
const KEY_DIRECTION: &str = "الاتجاه";
const KEY_TYPE: &str = "النوع";
const KEY_FACILITIES: &str = "المرافق";
const KEY_PRICE_WEEKDAY: &str = "سعر وسط الأسبوع";
const KEY_PRICE_WEEKEND: &str = "سعر نهاية الأسبوع";
const KEY_PRICE_OVERNIGHT: &str = "سعر المبيت";
const KEY_PRICE_HOLIDAYS: &str = "سعر الإجازات";
const KEY_CONTACT: &str = "رقم الجوال";

pub trait Parser {
    fn parse(&self, records: &[Value]) -> Vec<Listing>;
}

/// Converts raw listing records, building image URLs from the object-storage base.
#[derive(Debug, Clone)]
pub struct RecordParser {
    image_base_url: String,
    images_per_listing: usize,
}

impl RecordParser {
    pub fn new(image_base_url: impl Into<String>, images_per_listing: usize) -> Self {
        Self {
            image_base_url: image_base_url.into().trim_end_matches('/').to_string(),
            images_per_listing,
        }
    }

    pub fn image_urls(&self, id: &str) -> Vec<String> {
        (1..=self.images_per_listing)
            .map(|n| format!("{}/{}/{}.jpg", self.image_base_url, id, n))
            .collect()
    }

    /// Parses one record; `None` when it carries no usable id.
    pub fn parse_record(&self, record: &Value) -> Option<Listing> {
        let id = text_field(record, KEY_ID);
        if id.is_empty() {
            return None;
        }
        let title = text_field(record, KEY_NAME);
        // A name of only whitespace is trimmed away and counts as missing.
        let tier = if title.is_empty() { Tier::Standard } else { Tier::Verified };
        let contact = text_field(record, KEY_CONTACT);

        Some(Listing {
            image_urls: self.image_urls(&id),
            city: text_field(record, KEY_CITY),
            direction: text_field(record, KEY_DIRECTION),
            kind: text_field(record, KEY_TYPE),
            facilities: parse_facilities(record.get(KEY_FACILITIES)),
            prices: Prices {
                weekday: text_field(record, KEY_PRICE_WEEKDAY),
                weekend: text_field(record, KEY_PRICE_WEEKEND),
                overnight: text_field(record, KEY_PRICE_OVERNIGHT),
                holidays: text_field(record, KEY_PRICE_HOLIDAYS),
            },
            contact_handle: (!contact.is_empty()).then_some(contact),
            id,
            title,
            tier,
        })
    }
}

impl Parser for RecordParser {
    fn parse(&self, records: &[Value]) -> Vec<Listing> {
        let mut seen = HashSet::new();
        let mut listings = Vec::with_capacity(records.len());
        for (row, record) in records.iter().enumerate() {
            let Some(listing) = self.parse_record(record) else {
                debug!("Skipping record {} without id", row);
                continue;
            };
            if !seen.insert(listing.id.clone()) {
                warn!("Duplicate listing id {} at record {}, keeping first", listing.id, row);
                continue;
            }
            listings.push(listing);
        }
        listings
    }
}

/// Reads a scalar field as trimmed text. Numbers are stringified, everything else is empty.
fn text_field(record: &Value, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Facilities arrive as a JSON array, a string holding a JSON array, or a
/// comma-separated string. Malformed arrays fall back to the comma split.
pub fn parse_facilities(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => clean(items.iter().map(value_text)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
                    return clean(items.iter().map(value_text));
                }
                debug!("Facilities field is not a valid JSON array, splitting on commas");
            }
            clean(
                trimmed
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .split([',', '،'])
                    .map(str::to_string),
            )
        }
        _ => Vec::new(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn clean(items: impl Iterator<Item = String>) -> Vec<String> {
    items
        .map(|item| item.replace('"', "").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parser() -> RecordParser {
        RecordParser::new("https://cdn.example/", 5)
    }

    #[test]
    fn parses_a_full_verified_record() {
        let record = json!({
            "رقم العقار": 10234,
            "اسم العقار": "استراحة الندى",
            "المنطقة": "بريدة",
            "الاتجاه": "شمال",
            "النوع": "قسمين",
            "المرافق": "مسبح, ملعب ,، تدفئة",
            "سعر وسط الأسبوع": 300,
            "سعر نهاية الأسبوع": "500",
            "رقم الجوال": "966500000000"
        });
        let listing = parser().parse_record(&record).unwrap();
        assert_eq!(listing.id, "10234");
        assert_eq!(listing.tier, Tier::Verified);
        assert_eq!(listing.facilities, vec!["مسبح", "ملعب", "تدفئة"]);
        assert_eq!(listing.prices.weekday, "300");
        assert_eq!(listing.prices.weekend, "500");
        assert_eq!(listing.prices.overnight, "");
        assert_eq!(listing.contact_handle.as_deref(), Some("966500000000"));
        assert_eq!(listing.image_urls.len(), 5);
        assert_eq!(listing.image_urls[0], "https://cdn.example/10234/1.jpg");
        assert_eq!(listing.image_urls[4], "https://cdn.example/10234/5.jpg");
    }

    #[test]
    fn missing_name_means_standard_tier() {
        let listing = parser()
            .parse_record(&json!({"رقم العقار": "7", "اسم العقار": "  "}))
            .unwrap();
        assert_eq!(listing.tier, Tier::Standard);
        assert!(listing.contact_handle.is_none());
        assert!(listing.facilities.is_empty());
    }

    #[test]
    fn facilities_accept_json_arrays_in_any_shape() {
        assert_eq!(
            parse_facilities(Some(&json!(["مسبح ", "", "ملعب"]))),
            vec!["مسبح", "ملعب"]
        );
        assert_eq!(
            parse_facilities(Some(&json!(r#"["مبيت","مكيف"]"#))),
            vec!["مبيت", "مكيف"]
        );
    }

    #[test]
    fn malformed_json_facilities_fall_back_to_comma_split() {
        assert_eq!(
            parse_facilities(Some(&json!(r#"["مبيت", "مكيف""#))),
            vec!["مبيت", "مكيف"]
        );
        assert!(parse_facilities(Some(&json!(42))).is_empty());
        assert!(parse_facilities(None).is_empty());
    }

    #[test]
    fn skips_records_without_id_and_duplicate_ids() {
        let records = vec![
            json!({"رقم العقار": "1", "المنطقة": "بريدة"}),
            json!({"المنطقة": "عنيزة"}),
            json!("not an object"),
            json!({"رقم العقار": "1", "المنطقة": "الرس"}),
            json!({"رقم العقار": 2}),
        ];
        let listings = parser().parse(&records);
        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(listings[0].city, "بريدة");
    }
}
