use crate::filter::{rank, FilterEngine, ListingFilter};
use crate::model::Listing;
use crate::storage::SessionStore;
use crate::view::carousel::{CarouselBoard, Clock};
use crate::view::window::{ScrollMetrics, ScrollOutcome, ViewWindowController};

const TOP_FACILITIES: usize = 3;

/// What one rendered card needs, derived from a listing and its carousel.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingCard {
    pub id: String,
    /// Only verified listings show their name.
    pub title: Option<String>,
    pub city: String,
    pub display_price: String,
    pub top_facilities: Vec<String>,
    pub verified: bool,
    pub image_url: Option<String>,
    pub image_index: usize,
    pub image_count: usize,
    pub transitioning: bool,
}

/// Page-level owner of the listings, the filter engine and the window.
/// Every render recomputes Filter -> Rank -> Window from scratch.
pub struct ListingsPage<S: SessionStore> {
    listings: Vec<Listing>,
    engine: FilterEngine,
    window: ViewWindowController<S>,
}

impl<S: SessionStore> ListingsPage<S> {
    pub fn new(engine: FilterEngine, window: ViewWindowController<S>) -> Self {
        Self {
            listings: Vec::new(),
            engine,
            window,
        }
    }

    /// Replaces the collection once the asynchronous fetch resolves.
    pub fn set_listings(&mut self, listings: Vec<Listing>) {
        self.listings = listings;
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn window(&self) -> &ViewWindowController<S> {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut ViewWindowController<S> {
        &mut self.window
    }

    pub fn ranked(&self) -> Vec<&Listing> {
        rank(self.engine.apply(&self.listings, self.window.filters()))
    }

    pub fn result_count(&self) -> usize {
        self.ranked().len()
    }

    pub fn visible(&self) -> Vec<&Listing> {
        let ranked = self.ranked();
        self.window.visible(&ranked).to_vec()
    }

    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> ScrollOutcome {
        let total = self.result_count();
        self.window.on_scroll(metrics, total)
    }

    /// Saves the scroll offset and returns the listing to show in detail.
    pub fn open_listing(&mut self, id: &str, scroll_offset: f64) -> Option<&Listing> {
        self.window.remember_scroll(scroll_offset);
        self.listings.iter().find(|listing| listing.id == id)
    }

    /// Mounts carousels for the visible cards, unmounts the rest, and
    /// projects each visible listing into a card.
    pub fn cards<C: Clock>(&self, carousels: &mut CarouselBoard<C>) -> Vec<ListingCard> {
        let visible = self.visible();
        carousels.retain_mounted(visible.iter().map(|l| l.id.as_str()));
        visible
            .into_iter()
            .map(|listing| {
                carousels.mount(&listing.id, listing.image_urls.len());
                let (image_index, transitioning) = carousels
                    .state(&listing.id)
                    .map(|s| (s.current_index(), s.is_transitioning()))
                    .unwrap_or((0, false));
                ListingCard {
                    id: listing.id.clone(),
                    title: listing.is_verified().then(|| listing.title.clone()),
                    city: listing.city.clone(),
                    display_price: listing.prices.display_price().to_string(),
                    top_facilities: listing.top_facilities(TOP_FACILITIES).to_vec(),
                    verified: listing.is_verified(),
                    image_url: listing.image_urls.get(image_index).cloned(),
                    image_index,
                    image_count: listing.image_urls.len(),
                    transitioning,
                }
            })
            .collect()
    }
}
