use istiraha_listings::config::WindowConfig;
use istiraha_listings::filter::FilterEngine;
use istiraha_listings::model::{FilterState, PriceRange};
use istiraha_listings::parser::{Parser, RecordParser};
use istiraha_listings::source::{load_listings, FileListingsSource};
use istiraha_listings::storage::{MemorySessionStore, SqliteSessionStore};
use istiraha_listings::view::{ListingsPage, ViewWindowController};
use serde_json::json;
use std::collections::BTreeSet;
use std::io::Write;

fn records() -> Vec<serde_json::Value> {
    vec![
        json!({
            "رقم العقار": "1",
            "اسم العقار": "استراحة الندى",
            "المنطقة": "بريدة",
            "المرافق": ["مسبح"],
            "سعر نهاية الأسبوع": "500"
        }),
        json!({
            "رقم العقار": "2",
            "المنطقة": "بريدة",
            "سعر وسط الأسبوع": "300"
        }),
    ]
}

fn window(initial: usize) -> ViewWindowController<MemorySessionStore> {
    ViewWindowController::restore(
        MemorySessionStore::new(),
        WindowConfig {
            initial_page_size: initial,
            ..WindowConfig::default()
        },
        PriceRange::default(),
    )
}

fn ids(page: &ListingsPage<MemorySessionStore>) -> Vec<String> {
    page.visible().iter().map(|l| l.id.clone()).collect()
}

#[test]
fn city_and_facility_filter_end_to_end() {
    let listings = RecordParser::new("https://cdn.example", 5).parse(&records());
    assert_eq!(listings.len(), 2);

    for initial in [1, 24] {
        let mut page = ListingsPage::new(FilterEngine::default(), window(initial));
        page.set_listings(listings.clone());
        page.window_mut().set_city(Some("بريدة"));
        page.window_mut().toggle_facility("مسبح");
        assert_eq!(ids(&page), vec!["1"]);
        assert_eq!(page.result_count(), 1);
    }
}

#[test]
fn unfiltered_results_put_verified_first() {
    let listings = RecordParser::new("https://cdn.example", 5).parse(&records());
    let mut page = ListingsPage::new(FilterEngine::default(), window(24));
    page.set_listings(listings);
    assert_eq!(ids(&page), vec!["1", "2"]);

    page.window_mut().set_price_range(200.0, 400.0);
    assert_eq!(ids(&page), vec!["2"]);
    page.window_mut().clear_filters();
    assert_eq!(page.result_count(), 2);
}

#[test]
fn filters_survive_a_new_controller_over_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("session.db");

    let mut first = ViewWindowController::restore(
        SqliteSessionStore::open(&db, "tab-1").unwrap(),
        WindowConfig::default(),
        PriceRange::default(),
    );
    first.set_query("مسبح");
    first.set_city(Some("بريدة"));
    first.toggle_facility("شتاء");
    first.set_price_range(100.0, 900.0);
    drop(first.into_store());

    let second = ViewWindowController::restore(
        SqliteSessionStore::open(&db, "tab-1").unwrap(),
        WindowConfig::default(),
        PriceRange::default(),
    );
    let expected = FilterState {
        query: "مسبح".into(),
        city: Some("بريدة".into()),
        facilities: BTreeSet::from(["شتاء".to_string()]),
        price_range: PriceRange::new(100.0, 900.0),
        ..FilterState::default()
    };
    assert_eq!(second.filters(), &expected);

    let other_tab = ViewWindowController::restore(
        SqliteSessionStore::open(&db, "tab-2").unwrap(),
        WindowConfig::default(),
        PriceRange::default(),
    );
    assert_eq!(other_tab.filters(), &FilterState::default());
}

#[tokio::test]
async fn file_source_feeds_the_page() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let payload = serde_json::Value::Array(records());
    write!(file, "{}", payload).unwrap();

    let source = FileListingsSource::new(file.path());
    let parser = RecordParser::new("https://cdn.example/", 2);
    let listings = load_listings(&source, &parser).await;

    assert_eq!(listings.len(), 2);
    assert_eq!(
        listings[0].image_urls,
        vec!["https://cdn.example/1/1.jpg", "https://cdn.example/1/2.jpg"]
    );
    assert_eq!(listings[1].prices.display_price(), "300");
}
