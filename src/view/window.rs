//! Incremental "visible window" over the ranked results, plus the filter
//! state it is persisted alongside.
//!
//! The controller owns a [`SessionStore`]; every filter mutation and every
//! window growth is written through to it, and a new controller restores
//! from it. Storage failures and corrupt values are logged and replaced by
//! defaults, never returned to the caller.

use tracing::{debug, warn};

use crate::config::WindowConfig;
use crate::model::{FilterState, Listing, PriceRange};
use crate::storage::SessionStore;

pub const FILTERS_KEY: &str = "listing_filters";
pub const VISIBLE_COUNT_KEY: &str = "visible_count";
pub const SCROLL_POSITION_KEY: &str = "scroll_position";

/// Geometry of the scrollable viewport at one scroll event, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl ScrollMetrics {
    pub fn distance_to_bottom(&self) -> f64 {
        self.content_height - (self.offset + self.viewport_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub grew: bool,
    pub visible_count: usize,
    pub show_filter_button: bool,
    pub show_scroll_top: bool,
}

pub struct ViewWindowController<S: SessionStore> {
    store: S,
    config: WindowConfig,
    price_bounds: PriceRange,
    filters: FilterState,
    visible_count: usize,
}

impl<S: SessionStore> ViewWindowController<S> {
    /// Restores filters and window size from `store`, falling back to defaults.
    pub fn restore(store: S, config: WindowConfig, price_bounds: PriceRange) -> Self {
        let filters = restore_filters(&store, price_bounds);
        let visible_count = restore_visible_count(&store, config.initial_page_size);
        debug!("Restored window of {} with filters {:?}", visible_count, filters);
        Self {
            store,
            config,
            price_bounds,
            filters,
            visible_count,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn price_bounds(&self) -> PriceRange {
        self.price_bounds
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// The prefix of `ranked` currently rendered.
    pub fn visible<'r, 'a>(&self, ranked: &'r [&'a Listing]) -> &'r [&'a Listing] {
        &ranked[..ranked.len().min(self.visible_count)]
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filters.query = query.into();
        self.filters_changed();
    }

    pub fn set_city(&mut self, city: Option<&str>) {
        self.filters.city = FilterState::category(city);
        self.filters_changed();
    }

    pub fn set_direction(&mut self, direction: Option<&str>) {
        self.filters.direction = FilterState::category(direction);
        self.filters_changed();
    }

    pub fn set_type(&mut self, kind: Option<&str>) {
        self.filters.kind = FilterState::category(kind);
        self.filters_changed();
    }

    /// Adds the facility if absent, removes it if present.
    pub fn toggle_facility(&mut self, facility: &str) {
        if !self.filters.facilities.remove(facility) {
            self.filters.facilities.insert(facility.to_string());
        }
        self.filters_changed();
    }

    /// Sets the price band, clamped to the configured bounds and ordered.
    pub fn set_price_range(&mut self, min: f64, max: f64) {
        self.filters.price_range = clamp_range(min, max, self.price_bounds);
        self.filters_changed();
    }

    pub fn clear_filters(&mut self) {
        self.filters = FilterState::with_price_range(self.price_bounds);
        self.filters_changed();
    }

    /// Grows the window when the viewport nears the bottom of the content.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, total_ranked: usize) -> ScrollOutcome {
        let mut grew = false;
        if metrics.distance_to_bottom() <= self.config.scroll_threshold_px
            && self.visible_count < total_ranked
        {
            self.visible_count = (self.visible_count + self.config.page_increment).min(total_ranked);
            grew = true;
            self.persist_visible_count();
        }
        ScrollOutcome {
            grew,
            visible_count: self.visible_count,
            show_filter_button: metrics.offset > self.config.filter_fab_offset_px,
            show_scroll_top: metrics.offset > self.config.scroll_top_offset_px,
        }
    }

    /// Records the scroll offset before navigating to a detail view.
    pub fn remember_scroll(&mut self, offset: f64) {
        let offset = offset.max(0.0).round() as u64;
        if let Err(e) = self.store.set(SCROLL_POSITION_KEY, &offset.to_string()) {
            warn!("Failed to persist scroll position: {}", e);
        }
    }

    /// Returns the offset saved by [`remember_scroll`](Self::remember_scroll)
    /// exactly once, then forgets it.
    pub fn take_scroll_restore(&mut self) -> Option<u64> {
        let raw = match self.store.get(SCROLL_POSITION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read scroll position: {}", e);
                return None;
            }
        };
        if let Err(e) = self.store.remove(SCROLL_POSITION_KEY) {
            warn!("Failed to clear scroll position: {}", e);
        }
        match raw.trim().parse::<u64>() {
            Ok(offset) => Some(offset),
            Err(_) => {
                warn!("Ignoring malformed scroll position {:?}", raw);
                None
            }
        }
    }

    fn filters_changed(&mut self) {
        match serde_json::to_string(&self.filters) {
            Ok(json) => {
                if let Err(e) = self.store.set(FILTERS_KEY, &json) {
                    warn!("Failed to persist filters: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize filters: {}", e),
        }
        if self.config.reset_on_filter_change
            && self.visible_count != self.config.initial_page_size
        {
            self.visible_count = self.config.initial_page_size;
            self.persist_visible_count();
        }
    }

    fn persist_visible_count(&mut self) {
        if let Err(e) = self
            .store
            .set(VISIBLE_COUNT_KEY, &self.visible_count.to_string())
        {
            warn!("Failed to persist visible count: {}", e);
        }
    }
}

/// Clamps both ends into `bounds` and orders them.
fn clamp_range(min: f64, max: f64, bounds: PriceRange) -> PriceRange {
    let clamp = |v: f64| if v.is_nan() { bounds.min } else { v.clamp(bounds.min, bounds.max) };
    let (lo, hi) = (clamp(min), clamp(max));
    PriceRange::new(lo.min(hi), lo.max(hi))
}

fn restore_filters<S: SessionStore>(store: &S, price_bounds: PriceRange) -> FilterState {
    let defaults = FilterState::with_price_range(price_bounds);
    let raw = match store.get(FILTERS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return defaults,
        Err(e) => {
            warn!("Failed to read stored filters: {}", e);
            return defaults;
        }
    };
    let parsed = serde_json::from_str::<serde_json::Value>(&raw).and_then(|value| {
        let has_range = value.get("price_range").is_some();
        serde_json::from_value::<FilterState>(value).map(|state| (state, has_range))
    });
    match parsed {
        Ok((mut state, has_range)) => {
            state.city = FilterState::category(state.city.as_deref());
            state.direction = FilterState::category(state.direction.as_deref());
            state.kind = FilterState::category(state.kind.as_deref());
            state.price_range = if has_range {
                clamp_range(state.price_range.min, state.price_range.max, price_bounds)
            } else {
                price_bounds
            };
            state
        }
        Err(e) => {
            warn!("Stored filters are corrupt, using defaults: {}", e);
            defaults
        }
    }
}

fn restore_visible_count<S: SessionStore>(store: &S, initial: usize) -> usize {
    match store.get(VISIBLE_COUNT_KEY) {
        Ok(Some(raw)) => match raw.trim().parse::<usize>() {
            Ok(n) => n.max(initial),
            Err(_) => {
                warn!("Ignoring malformed visible count {:?}", raw);
                initial
            }
        },
        Ok(None) => initial,
        Err(e) => {
            warn!("Failed to read visible count: {}", e);
            initial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StorageError;
    use crate::storage::MemorySessionStore;

    fn controller(store: MemorySessionStore) -> ViewWindowController<MemorySessionStore> {
        ViewWindowController::restore(store, WindowConfig::default(), PriceRange::default())
    }

    fn near_bottom() -> ScrollMetrics {
        ScrollMetrics {
            offset: 2000.0,
            viewport_height: 800.0,
            content_height: 3000.0,
        }
    }

    fn far_from_bottom() -> ScrollMetrics {
        ScrollMetrics {
            offset: 100.0,
            viewport_height: 800.0,
            content_height: 3000.0,
        }
    }

    /// Store whose every operation fails, to prove failures stay local.
    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Database(rusqlite::Error::InvalidQuery))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Database(rusqlite::Error::InvalidQuery))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Database(rusqlite::Error::InvalidQuery))
        }
    }

    #[test]
    fn fresh_session_starts_with_defaults() {
        let window = controller(MemorySessionStore::new());
        assert_eq!(window.visible_count(), 24);
        assert_eq!(window.filters(), &FilterState::default());
    }

    #[test]
    fn scroll_near_bottom_grows_by_increment_clamped_to_total() {
        let mut window = controller(MemorySessionStore::new());
        let outcome = window.on_scroll(near_bottom(), 100);
        assert!(outcome.grew);
        assert_eq!(outcome.visible_count, 44);

        let outcome = window.on_scroll(near_bottom(), 50);
        assert_eq!(outcome.visible_count, 50);

        let outcome = window.on_scroll(near_bottom(), 50);
        assert!(!outcome.grew);
        assert_eq!(outcome.visible_count, 50);
    }

    #[test]
    fn scroll_far_from_bottom_does_not_grow() {
        let mut window = controller(MemorySessionStore::new());
        let outcome = window.on_scroll(far_from_bottom(), 100);
        assert!(!outcome.grew);
        assert_eq!(window.visible_count(), 24);
    }

    #[test]
    fn window_never_shrinks_across_scroll_events() {
        let mut window = controller(MemorySessionStore::new());
        let mut previous = window.visible_count();
        for (metrics, total) in [
            (near_bottom(), 30),
            (far_from_bottom(), 30),
            (near_bottom(), 10),
            (near_bottom(), 200),
            (near_bottom(), 5),
        ] {
            let outcome = window.on_scroll(metrics, total);
            assert!(outcome.visible_count >= previous);
            previous = outcome.visible_count;
        }
    }

    #[test]
    fn scroll_flags_follow_offset() {
        let mut window = controller(MemorySessionStore::new());
        let metrics = |offset| ScrollMetrics {
            offset,
            viewport_height: 800.0,
            content_height: 10_000.0,
        };
        let top = window.on_scroll(metrics(0.0), 0);
        assert!(!top.show_filter_button && !top.show_scroll_top);
        let middle = window.on_scroll(metrics(300.0), 0);
        assert!(middle.show_filter_button && !middle.show_scroll_top);
        let deep = window.on_scroll(metrics(900.0), 0);
        assert!(deep.show_filter_button && deep.show_scroll_top);
    }

    #[test]
    fn filters_and_window_survive_a_new_controller() {
        let mut window = controller(MemorySessionStore::new());
        window.set_query("مسبح");
        window.set_city(Some("بريدة"));
        window.toggle_facility("شتاء");
        window.set_price_range(100.0, 900.0);
        window.on_scroll(near_bottom(), 100);
        let expected = window.filters().clone();

        let restored = controller(window.into_store());
        assert_eq!(restored.filters(), &expected);
        assert_eq!(restored.visible_count(), 44);
    }

    #[test]
    fn filter_change_keeps_window_by_default() {
        let mut window = controller(MemorySessionStore::new());
        window.on_scroll(near_bottom(), 100);
        window.set_type(Some("قسم"));
        assert_eq!(window.visible_count(), 44);
    }

    #[test]
    fn filter_change_resets_window_when_configured() {
        let config = WindowConfig {
            reset_on_filter_change: true,
            ..WindowConfig::default()
        };
        let mut window =
            ViewWindowController::restore(MemorySessionStore::new(), config, PriceRange::default());
        window.on_scroll(near_bottom(), 100);
        window.toggle_facility("مسبح");
        assert_eq!(window.visible_count(), 24);
        let restored = controller(window.into_store());
        assert_eq!(restored.visible_count(), 24);
    }

    #[test]
    fn corrupt_storage_falls_back_to_defaults() {
        let mut store = MemorySessionStore::new();
        store.set(FILTERS_KEY, "{not json").unwrap();
        store.set(VISIBLE_COUNT_KEY, "lots").unwrap();
        let window = controller(store);
        assert_eq!(window.filters(), &FilterState::default());
        assert_eq!(window.visible_count(), 24);
    }

    #[test]
    fn restored_count_is_never_below_initial_page() {
        let mut store = MemorySessionStore::new();
        store.set(VISIBLE_COUNT_KEY, "3").unwrap();
        assert_eq!(controller(store).visible_count(), 24);
    }

    #[test]
    fn toggle_twice_removes_facility_and_clear_resets() {
        let mut window = controller(MemorySessionStore::new());
        window.toggle_facility("مبيت");
        window.toggle_facility("مبيت");
        assert!(window.filters().facilities.is_empty());

        window.set_query("x");
        window.set_direction(Some("غرب"));
        window.clear_filters();
        assert_eq!(window.filters(), &FilterState::default());
    }

    #[test]
    fn all_sentinel_unsets_category() {
        let mut window = controller(MemorySessionStore::new());
        window.set_city(Some("عنيزة"));
        window.set_city(Some("all"));
        assert_eq!(window.filters().city, None);
    }

    #[test]
    fn price_range_is_clamped_and_ordered() {
        let mut window = controller(MemorySessionStore::new());
        window.set_price_range(9000.0, -5.0);
        assert_eq!(window.filters().price_range, PriceRange::new(0.0, 5000.0));
        window.set_price_range(700.0, 200.0);
        assert_eq!(window.filters().price_range, PriceRange::new(200.0, 700.0));
    }

    #[test]
    fn restored_price_range_respects_configured_bounds() {
        let bounds = PriceRange::new(100.0, 2000.0);
        let restore = |raw: &str| {
            let mut store = MemorySessionStore::new();
            store.set(FILTERS_KEY, raw).unwrap();
            ViewWindowController::restore(store, WindowConfig::default(), bounds)
        };

        let window = restore(r#"{"price_range":{"min":4000,"max":50}}"#);
        assert_eq!(window.filters().price_range, PriceRange::new(100.0, 2000.0));

        let window = restore(r#"{"price_range":{"min":900,"max":300}}"#);
        assert_eq!(window.filters().price_range, PriceRange::new(300.0, 900.0));

        let window = restore(r#"{"query":"مسبح"}"#);
        assert_eq!(window.filters().query, "مسبح");
        assert_eq!(window.filters().price_range, bounds);
    }

    #[test]
    fn scroll_position_is_applied_once() {
        let mut window = controller(MemorySessionStore::new());
        window.remember_scroll(1834.6);
        let mut window = controller(window.into_store());
        assert_eq!(window.take_scroll_restore(), Some(1835));
        assert_eq!(window.take_scroll_restore(), None);
    }

    #[test]
    fn broken_store_never_surfaces_errors() {
        let mut window =
            ViewWindowController::restore(BrokenStore, WindowConfig::default(), PriceRange::default());
        window.set_query("مسبح");
        window.remember_scroll(10.0);
        assert_eq!(window.take_scroll_restore(), None);
        assert!(window.on_scroll(near_bottom(), 30).grew);
        assert_eq!(window.filters().query, "مسبح");
    }

    #[test]
    fn visible_slice_is_bounded_by_both_count_and_results() {
        let window = controller(MemorySessionStore::new());
        let listings: Vec<Listing> = (0..30)
            .map(|i| Listing {
                id: i.to_string(),
                title: String::new(),
                city: String::new(),
                direction: String::new(),
                kind: String::new(),
                facilities: Vec::new(),
                prices: Default::default(),
                tier: Default::default(),
                image_urls: Vec::new(),
                contact_handle: None,
            })
            .collect();
        let ranked: Vec<&Listing> = listings.iter().collect();
        assert_eq!(window.visible(&ranked).len(), 24);
        assert_eq!(window.visible(&ranked[..5]).len(), 5);
        assert!(window.visible(&[]).is_empty());
    }
}
