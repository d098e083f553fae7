//! Per-card image carousel with a fade-out / swap / fade-in choreography.
//!
//! Each card owns an independent [`CarouselState`]. States are plain finite
//! state machines stamped with times from a [`Clock`]; a [`CarouselBoard`]
//! keys them by listing id and advances the ones whose deadline has passed.
//! In the app a [`TransitionDriver`] task ticks the board on the tokio clock;
//! tests can tick it by hand with a [`ManualClock`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::CarouselConfig;

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Clock backed by tokio's timer, so paused-time tests drive it too.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselTiming {
    pub fade_out: Duration,
    pub fade_in: Duration,
    pub swipe_threshold_px: f64,
}

impl From<&CarouselConfig> for CarouselTiming {
    fn from(cfg: &CarouselConfig) -> Self {
        Self {
            fade_out: Duration::from_millis(cfg.fade_out_ms),
            fade_in: Duration::from_millis(cfg.fade_in_ms),
            swipe_threshold_px: cfg.swipe_threshold_px,
        }
    }
}

impl Default for CarouselTiming {
    fn default() -> Self {
        Self::from(&CarouselConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next,
    Prev,
    Goto(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    FadingOut { target: Transition, swap_at: Duration },
    FadingIn { settle_at: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselState {
    current: usize,
    image_count: usize,
    phase: Phase,
}

impl CarouselState {
    pub fn new(image_count: usize) -> Self {
        Self {
            current: 0,
            image_count,
            phase: Phase::Idle,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn image_count(&self) -> usize {
        self.image_count
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Starts a transition. No-op while another one is in flight or when
    /// there is nothing to rotate.
    fn begin(&mut self, transition: Transition, now: Duration, timing: &CarouselTiming) -> bool {
        if self.image_count == 0 || self.is_transitioning() {
            return false;
        }
        self.phase = Phase::FadingOut {
            target: transition,
            swap_at: now + timing.fade_out,
        };
        true
    }

    fn target_index(&self, transition: Transition) -> usize {
        match transition {
            Transition::Next => (self.current + 1) % self.image_count,
            Transition::Prev => (self.current + self.image_count - 1) % self.image_count,
            Transition::Goto(index) => index.min(self.image_count - 1),
        }
    }

    /// Applies every phase whose deadline is at or before `now`.
    fn poll(&mut self, now: Duration, timing: &CarouselTiming) -> bool {
        let mut changed = false;
        loop {
            match self.phase {
                Phase::FadingOut { target, swap_at } if now >= swap_at => {
                    self.current = self.target_index(target);
                    self.phase = Phase::FadingIn {
                        settle_at: swap_at + timing.fade_in,
                    };
                }
                Phase::FadingIn { settle_at } if now >= settle_at => {
                    self.phase = Phase::Idle;
                }
                _ => return changed,
            }
            changed = true;
        }
    }

    fn deadline(&self) -> Option<Duration> {
        match self.phase {
            Phase::Idle => None,
            Phase::FadingOut { swap_at, .. } => Some(swap_at),
            Phase::FadingIn { settle_at } => Some(settle_at),
        }
    }
}

/// Carousel states of the mounted cards, keyed by listing id.
pub struct CarouselBoard<C: Clock> {
    clock: C,
    timing: CarouselTiming,
    cards: HashMap<String, CarouselState>,
}

impl<C: Clock> CarouselBoard<C> {
    pub fn new(clock: C, timing: CarouselTiming) -> Self {
        Self {
            clock,
            timing,
            cards: HashMap::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Registers a card. Mounting an already mounted card keeps its state.
    pub fn mount(&mut self, id: &str, image_count: usize) {
        self.cards
            .entry(id.to_string())
            .or_insert_with(|| CarouselState::new(image_count));
    }

    /// Forgets the card, dropping any pending transition with it.
    pub fn unmount(&mut self, id: &str) {
        if self.cards.remove(id).is_some() {
            debug!("Carousel for {} unmounted", id);
        }
    }

    /// Keeps only the cards in `ids`.
    pub fn retain_mounted<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = ids.into_iter().collect();
        self.cards.retain(|id, _| keep.contains(id.as_str()));
    }

    pub fn state(&self, id: &str) -> Option<&CarouselState> {
        self.cards.get(id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn next(&mut self, id: &str) -> bool {
        self.begin(id, Transition::Next)
    }

    pub fn prev(&mut self, id: &str) -> bool {
        self.begin(id, Transition::Prev)
    }

    pub fn goto(&mut self, id: &str, index: usize) -> bool {
        self.begin(id, Transition::Goto(index))
    }

    /// Horizontal swipe from `start_x` to `end_x`. A drag toward the left
    /// goes back and a drag toward the right advances, following the
    /// right-to-left reading order.
    pub fn swipe(&mut self, id: &str, start_x: f64, end_x: f64) -> Option<Transition> {
        let state = self.cards.get(id)?;
        if state.image_count <= 1 {
            return None;
        }
        let diff = start_x - end_x;
        if diff.abs() <= self.timing.swipe_threshold_px {
            return None;
        }
        let transition = if diff > 0.0 {
            Transition::Prev
        } else {
            Transition::Next
        };
        self.begin(id, transition).then_some(transition)
    }

    fn begin(&mut self, id: &str, transition: Transition) -> bool {
        let now = self.clock.now();
        match self.cards.get_mut(id) {
            Some(state) => state.begin(transition, now, &self.timing),
            None => false,
        }
    }

    /// Advances every card whose deadline has passed; returns the ids that changed.
    pub fn tick(&mut self) -> Vec<String> {
        let now = self.clock.now();
        let timing = self.timing;
        self.cards
            .iter_mut()
            .filter_map(|(id, state)| state.poll(now, &timing).then(|| id.clone()))
            .collect()
    }

    /// Earliest pending deadline across all cards.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.cards.values().filter_map(CarouselState::deadline).min()
    }
}

pub type SharedBoard = Arc<Mutex<CarouselBoard<TokioClock>>>;

/// Background task ticking a shared board at its deadlines. Aborted on drop,
/// so tearing down the page cancels every pending timer.
pub struct TransitionDriver {
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl TransitionDriver {
    pub fn spawn(board: SharedBoard) -> Self {
        let wake = Arc::new(Notify::new());
        let handle = tokio::spawn(run_driver(board, wake.clone()));
        Self { wake, handle }
    }

    /// Must be called after starting a transition so the task picks up the new deadline.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for TransitionDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_driver(board: SharedBoard, wake: Arc<Notify>) {
    loop {
        let wait = {
            let mut guard = board.lock().await;
            let changed = guard.tick();
            if !changed.is_empty() {
                debug!("Carousel transitions advanced: {:?}", changed);
            }
            let now = guard.clock().now();
            guard.next_deadline().map(|deadline| deadline.saturating_sub(now))
        };
        match wait {
            Some(delay) => {
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = wake.notified() => {}
                }
            }
            None => wake.notified().await,
        }
    }
}
