use istiraha_listings::config::{load_config, AppConfig};
use istiraha_listings::contact::ContactNotifier;
use istiraha_listings::filter::{FacilityMatcher, FilterEngine};
use istiraha_listings::parser::RecordParser;
use istiraha_listings::source::{load_listings, source_from_config};
use istiraha_listings::storage::SqliteSessionStore;
use istiraha_listings::view::{
    CarouselBoard, CarouselTiming, ListingsPage, ScrollMetrics, SharedBoard, TokioClock,
    TransitionDriver, ViewWindowController,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type Page = ListingsPage<SqliteSessionStore>;

// Rough rendered height of one card, used to simulate scroll geometry.
const CARD_HEIGHT_PX: f64 = 320.0;
const VIEWPORT_HEIGHT_PX: f64 = 900.0;

const HELP: &str = "Available commands:
  list                      render the visible cards
  query <text>              free-text search (empty clears)
  city|dir|type <value|all> category filters
  fac <name>                toggle a facility or smart category
  price <min> <max>         set the price band
  clear                     reset all filters
  scroll <offset>           report a scroll position
  open <id> <offset>        open a listing, remembering scroll
  back                      return to the list, restoring scroll
  next|prev <id>            advance a card's carousel
  goto <id> <index>         jump a card's carousel
  swipe <id> <start> <end>  horizontal swipe on a card
  contact <id>              build the contact link for a listing
  catalog                   show filter options
  help                      this list
  quit                      exit";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let store = match SqliteSessionStore::open(&config.session_db, &config.session_id) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open session store: {}", e);
            return;
        }
    };
    let window = ViewWindowController::restore(store, config.window.clone(), config.price_bounds);
    let engine = FilterEngine::new(FacilityMatcher::new(&config.smart_filters));
    let mut page = ListingsPage::new(engine, window);

    let contact = match ContactNotifier::new(config.contact.clone()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to build contact client: {}", e);
            return;
        }
    };

    match source_from_config(&config) {
        Ok(source) => {
            let parser = RecordParser::new(config.image_base_url.clone(), config.images_per_listing);
            let listings = load_listings(source.as_ref(), &parser).await;
            info!("Loaded {} listings", listings.len());
            page.set_listings(listings);
        }
        Err(e) => warn!("No listings source available: {}", e),
    }

    let board: SharedBoard = Arc::new(Mutex::new(CarouselBoard::new(
        TokioClock::new(),
        CarouselTiming::from(&config.carousel),
    )));
    let driver = TransitionDriver::spawn(board.clone());

    if let Some(offset) = page.window_mut().take_scroll_restore() {
        info!("Restoring scroll position to {}px", offset);
    }
    render(&page, &board).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read command: {}", e);
                break;
            }
        };
        if !handle_command(line.trim(), &mut page, &board, &driver, &contact, &config).await {
            break;
        }
    }

    driver.stop();
    info!("Session closed");
}

/// Dispatches one input line. Returns `false` when the session should end.
async fn handle_command(
    line: &str,
    page: &mut Page,
    board: &SharedBoard,
    driver: &TransitionDriver,
    contact: &ContactNotifier,
    config: &AppConfig,
) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();
    info!("Handling command: {}", command);
    match command {
        "" => {}
        "quit" | "exit" => return false,
        "help" => println!("{}", HELP),
        "list" => render(page, board).await,
        "query" => {
            page.window_mut().set_query(rest.trim());
            render(page, board).await;
        }
        "city" | "dir" | "type" => {
            let value = args.first().copied();
            match command {
                "city" => page.window_mut().set_city(value),
                "dir" => page.window_mut().set_direction(value),
                _ => page.window_mut().set_type(value),
            }
            render(page, board).await;
        }
        "fac" => {
            let name = rest.trim();
            if name.is_empty() {
                warn!("fac needs a facility name");
            } else {
                page.window_mut().toggle_facility(name);
                render(page, board).await;
            }
        }
        "price" => match parse_pair(&args) {
            Some((min, max)) => {
                page.window_mut().set_price_range(min, max);
                render(page, board).await;
            }
            None => warn!("price needs two numbers"),
        },
        "clear" => {
            page.window_mut().clear_filters();
            render(page, board).await;
        }
        "scroll" => match args.first().and_then(|v| v.parse::<f64>().ok()) {
            Some(offset) => {
                let metrics = ScrollMetrics {
                    offset,
                    viewport_height: VIEWPORT_HEIGHT_PX,
                    content_height: page.window().visible_count() as f64 * CARD_HEIGHT_PX,
                };
                let outcome = page.on_scroll(metrics);
                println!(
                    "visible={} grew={} filter_button={} scroll_top={}",
                    outcome.visible_count,
                    outcome.grew,
                    outcome.show_filter_button,
                    outcome.show_scroll_top
                );
            }
            None => warn!("scroll needs an offset"),
        },
        "open" => {
            let (Some(id), offset) = (args.first(), args.get(1).and_then(|v| v.parse().ok()))
            else {
                warn!("open needs a listing id");
                return true;
            };
            match page.open_listing(id, offset.unwrap_or(0.0)) {
                Some(listing) => println!("{:#?}", listing),
                None => println!("Listing {} not found", id),
            }
        }
        "back" => {
            match page.window_mut().take_scroll_restore() {
                Some(offset) => println!("Restored scroll position: {}px", offset),
                None => println!("No saved scroll position"),
            }
            render(page, board).await;
        }
        "next" | "prev" | "goto" | "swipe" => {
            let Some(id) = args.first().copied() else {
                warn!("{} needs a listing id", command);
                return true;
            };
            let started = {
                let mut guard = board.lock().await;
                match command {
                    "next" => guard.next(id),
                    "prev" => guard.prev(id),
                    "goto" => match args.get(1).and_then(|v| v.parse().ok()) {
                        Some(index) => guard.goto(id, index),
                        None => false,
                    },
                    _ => match parse_pair(&args[1..]) {
                        Some((start, end)) => guard.swipe(id, start, end).is_some(),
                        None => false,
                    },
                }
            };
            if started {
                driver.wake();
            } else {
                info!("Carousel {} ignored {}", id, command);
            }
        }
        "contact" => {
            let Some(listing) = args.first().and_then(|id| page.listings().iter().find(|l| l.id == *id))
            else {
                warn!("contact needs a known listing id");
                return true;
            };
            match contact.contact(listing).await {
                Ok(url) => println!("{}", url),
                Err(e) => error!("Contact link failed: {}", e),
            }
        }
        "catalog" => {
            println!("Cities: {}", config.catalog.cities.join("، "));
            println!("Directions: {}", config.catalog.directions.join("، "));
            println!("Types: {}", config.catalog.types.join("، "));
            println!("Facilities: {}", config.catalog.priority_facilities.join("، "));
            let bounds = page.window().price_bounds();
            println!("Price: {} - {} (step {})", bounds.min, bounds.max, config.price_step);
        }
        other => println!("Unknown command: {} (try help)", other),
    }
    true
}

fn parse_pair(args: &[&str]) -> Option<(f64, f64)> {
    match args {
        [a, b, ..] => Some((a.parse().ok()?, b.parse().ok()?)),
        _ => None,
    }
}

async fn render(page: &Page, board: &SharedBoard) {
    let cards = {
        let mut guard = board.lock().await;
        page.cards(&mut *guard)
    };
    println!(
        "{} results, showing {}",
        page.result_count(),
        cards.len()
    );
    for card in cards {
        let badge = if card.verified { "✔" } else { " " };
        println!(
            "{} #{} {} | {} | {} ر.س | {} | image {}/{}",
            badge,
            card.id,
            card.title.as_deref().unwrap_or("-"),
            card.city,
            card.display_price,
            card.top_facilities.join("، "),
            card.image_index + 1,
            card.image_count.max(1),
        );
    }
}
