//! End-to-end crawl tests against scripted pages, writing real files.

use listing_collector::testing::{empty_page, listing_page, MockPageSource};
use listing_collector::{
    read_listings, CollectorConfig, CsvSink, DelayRange, ListingCollector, StopReason,
    NOT_AVAILABLE,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const BASE: &str = "https://cars.example/for-sale?page=";

fn url(page: u32) -> String {
    format!("{}{}", BASE, page)
}

fn config() -> CollectorConfig {
    CollectorConfig::new()
        .with_base_url(BASE)
        .with_delay(DelayRange::none())
        .with_page_wait(Duration::from_secs(1))
}

#[tokio::test]
async fn empty_third_page_ends_crawl_after_second() {
    let source = MockPageSource::new()
        .with_page(
            url(1),
            listing_page(&[("2019 Honda City", Some("RM 65,000")), ("2016 Perodua Axia", Some("RM 22,500"))]),
        )
        .with_page(url(2), listing_page(&[("2020 Toyota Vios", Some("RM 78,000"))]))
        .with_page(url(3), empty_page())
        .with_page(url(4), listing_page(&[("never fetched", Some("RM 1"))]));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("carlist_data.csv");

    let collector = ListingCollector::new(source.clone(), config()).unwrap();
    let mut sink = CsvSink::create(&path).unwrap();
    let report = collector
        .run(&mut sink, &CancellationToken::new())
        .await
        .unwrap();
    sink.finish().unwrap();

    assert_eq!(report.stop_reason, StopReason::NoListings { page: 3 });
    assert_eq!(report.rows_written, 3);
    assert_eq!(source.calls(), vec![url(1), url(2), url(3)]);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Car Name,Transmission,Mileage,Price,Location\n"));

    let rows = read_listings(&path).unwrap().listings;
    let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["2019 Honda City", "2016 Perodua Axia", "2020 Toyota Vios"]
    );
}

#[tokio::test]
async fn card_without_price_is_still_emitted() {
    let source = MockPageSource::new()
        .with_page(url(1), listing_page(&[("2015 Proton Saga", None)]))
        .with_page(url(2), empty_page());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("carlist_data.csv");

    let collector = ListingCollector::new(source, config()).unwrap();
    let mut sink = CsvSink::create(&path).unwrap();
    let report = collector
        .run(&mut sink, &CancellationToken::new())
        .await
        .unwrap();
    sink.finish().unwrap();

    assert_eq!(report.rows_written, 1);
    assert_eq!(report.substituted_fields, 1);

    let rows = read_listings(&path).unwrap().listings;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].price, NOT_AVAILABLE);
    assert_eq!(rows[0].name, "2015 Proton Saga");
    assert_eq!(rows[0].mileage, "50K km");
    assert_eq!(rows[0].transmission, "Automatic");
    assert_eq!(rows[0].location, "Kuala Lumpur");
}

#[tokio::test]
async fn first_page_failure_leaves_header_only_file() {
    let source = MockPageSource::new().with_failure(url(1), "connection reset");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("carlist_data.csv");

    let collector = ListingCollector::new(source, config()).unwrap();
    let mut sink = CsvSink::create(&path).unwrap();
    let report = collector
        .run(&mut sink, &CancellationToken::new())
        .await
        .unwrap();
    sink.finish().unwrap();

    assert!(matches!(report.stop_reason, StopReason::FetchFailed { page: 1, .. }));
    assert_eq!(report.pages_visited, 0);
    assert!(read_listings(&path).unwrap().listings.is_empty());
}
