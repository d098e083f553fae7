use serde::Deserialize;
use std::fs;

use crate::filter::{default_smart_filters, SmartCategory};
use crate::model::{ConfigError, PriceRange};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub initial_page_size: usize,
    pub page_increment: usize,
    pub scroll_threshold_px: f64,
    pub filter_fab_offset_px: f64,
    pub scroll_top_offset_px: f64,
    pub reset_on_filter_change: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            initial_page_size: 24,
            page_increment: 20,
            scroll_threshold_px: 400.0,
            filter_fab_offset_px: 200.0,
            scroll_top_offset_px: 400.0,
            reset_on_filter_change: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    pub fade_out_ms: u64,
    pub fade_in_ms: u64,
    pub swipe_threshold_px: f64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            fade_out_ms: 150,
            fade_in_ms: 50,
            swipe_threshold_px: 50.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub default_handle: String,
    pub deep_link_base: String,
    pub tracking_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            default_handle: "966533220646".to_string(),
            deep_link_base: "https://wa.me".to_string(),
            tracking_url: None,
            timeout_secs: 10,
        }
    }
}

/// Fixed option lists offered by the filter panel.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub cities: Vec<String>,
    pub directions: Vec<String>,
    pub types: Vec<String>,
    pub priority_facilities: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            cities: owned(&["بريدة", "عنيزة", "الرس", "البكيرية", "المذنب"]),
            directions: owned(&["شمال", "جنوب", "شرق", "غرب"]),
            types: owned(&["قسم", "قسمين"]),
            priority_facilities: owned(&[
                "مسبح",
                "بدون مسبح",
                "مبيت",
                "ألعاب مائية",
                "ملعب",
                "مناسبات",
                "شتاء",
                "صيف",
                "مكيف",
                "واي فاي",
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listings_url: Option<String>,
    pub listings_file: Option<String>,
    pub image_base_url: String,
    pub images_per_listing: usize,
    pub price_bounds: PriceRange,
    pub price_step: f64,
    pub smart_filters: Vec<SmartCategory>,
    pub catalog: CatalogConfig,
    pub window: WindowConfig,
    pub carousel: CarouselConfig,
    pub contact: ContactConfig,
    pub session_db: String,
    pub session_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listings_url: None,
            listings_file: None,
            image_base_url: "https://pub-e2fc1c0a598f4f0e91e47af63219848e.r2.dev".to_string(),
            images_per_listing: 5,
            price_bounds: PriceRange::default(),
            price_step: 50.0,
            smart_filters: default_smart_filters(),
            catalog: CatalogConfig::default(),
            window: WindowConfig::default(),
            carousel: CarouselConfig::default(),
            contact: ContactConfig::default(),
            session_db: "session.db".to_string(),
            session_id: "default".to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.initial_page_size == 0 {
            return Err(ConfigError::Invalid("window.initial_page_size must be > 0".into()));
        }
        if self.window.page_increment == 0 {
            return Err(ConfigError::Invalid("window.page_increment must be > 0".into()));
        }
        if self.price_bounds.min > self.price_bounds.max {
            return Err(ConfigError::Invalid("price_bounds.min exceeds price_bounds.max".into()));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
