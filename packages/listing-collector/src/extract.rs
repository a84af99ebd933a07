//! Card extraction from a results page.
//!
//! Selectors are compiled once per run. Each card field is looked up
//! independently so one missing element only blanks that field.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::{CollectError, CollectResult};
use crate::types::{FieldLookup, ListingSelectors, RawListing};

/// Selectors parsed and ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    container: Selector,
    name: Selector,
    price: Selector,
    mileage: Selector,
    transmission: Selector,
    location: Selector,
}

impl CompiledSelectors {
    pub fn compile(selectors: &ListingSelectors) -> CollectResult<Self> {
        Ok(Self {
            container: parse_selector(&selectors.container)?,
            name: parse_selector(&selectors.name)?,
            price: parse_selector(&selectors.price)?,
            mileage: parse_selector(&selectors.mileage)?,
            transmission: parse_selector(&selectors.transmission)?,
            location: parse_selector(&selectors.location)?,
        })
    }
}

fn parse_selector(selector: &str) -> CollectResult<Selector> {
    Selector::parse(selector).map_err(|e| CollectError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Listings found on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    pub listings: Vec<RawListing>,
    /// Fields replaced by the sentinel across all cards on the page
    pub substituted_fields: usize,
}

impl PageExtraction {
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Extract every listing card from a page's HTML.
///
/// Returns an empty extraction when no container matches, which the
/// collector reads as the end of results.
pub fn extract_page(html: &str, selectors: &CompiledSelectors) -> PageExtraction {
    let document = Html::parse_document(html);
    let mut extraction = PageExtraction::default();

    for card in document.select(&selectors.container) {
        let listing = extract_card(card, selectors);
        let missing = listing.missing_fields();
        if missing > 0 {
            debug!(
                name = %listing.name,
                missing_fields = missing,
                "Substituted sentinel for missing card fields"
            );
        }
        extraction.substituted_fields += missing;
        extraction.listings.push(listing);
    }

    extraction
}

/// Build one row from a card element.
pub fn extract_card(card: ElementRef<'_>, selectors: &CompiledSelectors) -> RawListing {
    RawListing::from_lookups(
        lookup(card, &selectors.name),
        lookup(card, &selectors.transmission),
        lookup(card, &selectors.mileage),
        lookup(card, &selectors.price),
        lookup(card, &selectors.location),
    )
}

fn lookup(card: ElementRef<'_>, selector: &Selector) -> FieldLookup {
    let text = card.select(selector).next().map(|el| {
        el.text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ")
    });
    FieldLookup::from_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NOT_AVAILABLE;

    fn card(name: &str, price: Option<&str>) -> String {
        let price = price
            .map(|p| format!(r#"<div class="listing__price">{}</div>"#, p))
            .unwrap_or_default();
        format!(
            r#"<article class="listing">
                <a class="listing__title">{name}</a>
                {price}
                <div class="listing__specs">
                    <div>45K km</div>
                    <div>Automatic</div>
                    <div>Petrol</div>
                    <div>Selangor</div>
                </div>
            </article>"#
        )
    }

    fn selectors() -> CompiledSelectors {
        CompiledSelectors::compile(&ListingSelectors::default()).unwrap()
    }

    #[test]
    fn extracts_all_fields_from_card() {
        let html = format!("<html><body>{}</body></html>", card("2019 Honda City", Some("RM 45,000")));
        let page = extract_page(&html, &selectors());

        assert_eq!(page.listings.len(), 1);
        let row = &page.listings[0];
        assert_eq!(row.name, "2019 Honda City");
        assert_eq!(row.price, "RM 45,000");
        assert_eq!(row.mileage, "45K km");
        assert_eq!(row.transmission, "Automatic");
        assert_eq!(row.location, "Selangor");
        assert_eq!(page.substituted_fields, 0);
    }

    #[test]
    fn missing_price_keeps_row() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            card("2015 Perodua Myvi", None),
            card("2020 Toyota Vios", Some("RM 70,000"))
        );
        let page = extract_page(&html, &selectors());

        assert_eq!(page.listings.len(), 2);
        assert_eq!(page.listings[0].price, NOT_AVAILABLE);
        assert_eq!(page.listings[0].name, "2015 Perodua Myvi");
        assert_eq!(page.listings[0].location, "Selangor");
        assert_eq!(page.listings[1].price, "RM 70,000");
        assert_eq!(page.substituted_fields, 1);
    }

    #[test]
    fn collapses_whitespace_in_field_text() {
        let html = r#"<div class="listing"><span class="listing__price">
            RM
              45,000 </span></div>"#;
        let page = extract_page(html, &selectors());
        assert_eq!(page.listings[0].price, "RM 45,000");
        assert_eq!(page.listings[0].name, NOT_AVAILABLE);
    }

    #[test]
    fn page_without_containers_is_empty() {
        let page = extract_page("<html><body><p>No results</p></body></html>", &selectors());
        assert!(page.is_empty());
    }

    #[test]
    fn invalid_selector_is_reported() {
        let selectors = ListingSelectors {
            container: "div[".to_string(),
            ..ListingSelectors::default()
        };
        assert!(matches!(
            CompiledSelectors::compile(&selectors),
            Err(CollectError::Selector { .. })
        ));
    }
}
