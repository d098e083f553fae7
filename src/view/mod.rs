// View module: visible window, per-card carousels and the page composing them.

pub mod carousel;
pub mod page;
pub mod window;

pub use carousel::{
    CarouselBoard, CarouselState, CarouselTiming, Clock, ManualClock, SharedBoard, TokioClock,
    Transition, TransitionDriver,
};
pub use page::{ListingCard, ListingsPage};
pub use window::{ScrollMetrics, ScrollOutcome, ViewWindowController};
