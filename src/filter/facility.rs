use serde::{Deserialize, Serialize};

use crate::normalizer::normalize;

/// One "smart" facility category and the keyword variants it expands to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartCategory {
    pub category: String,
    pub keywords: Vec<String>,
}

/// Static synonym table, loaded once at startup.
///
/// Adding a category is a matter of appending a row; nothing in the matcher
/// special-cases individual categories.
pub fn default_smart_filters() -> Vec<SmartCategory> {
    const TABLE: &[(&str, &[&str])] = &[
        ("مبيت", &["غرف نوم", "غرفة نوم", "نوم", "مبيت"]),
        ("شتاء", &["خيمة", "مشب", "تدفئة", "شتاء", "شتوية"]),
        ("صيف", &["مسبح", "ألعاب مائية", "مكيف", "صيف", "صيفية"]),
        ("مناسبات", &["قاعة", "صالة", "مناسبات", "حفلات"]),
        ("ألعاب", &["ملعب", "ألعاب", "ترامبولين", "زحليقة"]),
    ];
    TABLE
        .iter()
        .map(|(category, keywords)| SmartCategory {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}

#[derive(Debug, Clone)]
struct CompiledCategory {
    category: String,
    normalized_keywords: Vec<String>,
}

/// Decides whether a listing's facilities satisfy one requested facility.
#[derive(Debug, Clone)]
pub struct FacilityMatcher {
    categories: Vec<CompiledCategory>,
}

impl FacilityMatcher {
    pub fn new(table: &[SmartCategory]) -> Self {
        let categories = table
            .iter()
            .map(|row| CompiledCategory {
                category: row.category.clone(),
                normalized_keywords: row
                    .keywords
                    .iter()
                    .map(|k| normalize(k))
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { categories }
    }

    pub fn is_smart_category(&self, requested: &str) -> bool {
        self.keywords_for(requested).is_some()
    }

    fn keywords_for(&self, requested: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.category == requested)
            .map(|c| c.normalized_keywords.as_slice())
    }

    /// Direct membership first; otherwise substring match of any normalized
    /// keyword of the requested category against any normalized facility.
    pub fn matches(&self, listing_facilities: &[String], requested: &str) -> bool {
        if listing_facilities.iter().any(|f| f == requested) {
            return true;
        }
        let Some(keywords) = self.keywords_for(requested) else {
            return false;
        };
        listing_facilities.iter().any(|facility| {
            let facility = normalize(facility);
            keywords.iter().any(|keyword| facility.contains(keyword.as_str()))
        })
    }
}

impl Default for FacilityMatcher {
    fn default() -> Self {
        Self::new(&default_smart_filters())
    }
}
