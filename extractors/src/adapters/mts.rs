use super::{first_text, AdapterReport, SourceAdapter};
use crate::text::{extract_data_volume, extract_minutes, extract_price};
use async_trait::async_trait;
use scraper::{Html, Selector};
use shared_types::{ExtractionError, OperatorCode, RawTariffRecord};

/// MTS tariff catalogue: one `div.card` per tariff.
pub struct MtsAdapter;

struct Selectors {
    card: Selector,
    title: Selector,
    description: Selector,
    price: Selector,
    features: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            card: Selector::parse("div.card").unwrap(),
            title: Selector::parse("a.card-title__link").unwrap(),
            description: Selector::parse("div.card-description").unwrap(),
            price: Selector::parse("span.price-text").unwrap(),
            features: Selector::parse("ul.features").unwrap(),
        }
    }
}

#[async_trait]
impl SourceAdapter for MtsAdapter {
    fn code(&self) -> OperatorCode {
        OperatorCode::Mts
    }

    fn contract_version(&self) -> &'static str {
        "mts-cards-v1"
    }

    fn parse(&self, body: &str) -> Result<AdapterReport, ExtractionError> {
        let document = Html::parse_document(body);
        let selectors = Selectors::new();

        let cards: Vec<_> = document.select(&selectors.card).collect();
        if cards.is_empty() {
            return Err(ExtractionError::StructureNotFound(
                "no div.card elements".to_string(),
            ));
        }

        let mut report = AdapterReport::default();

        for (index, card) in cards.iter().enumerate() {
            let Some(name) = first_text(card, &selectors.title) else {
                report.note(format!("card {index}: missing title, skipped"));
                continue;
            };

            let Some(price_text) = first_text(card, &selectors.price) else {
                report.note(format!("card {index} ({name}): missing price, skipped"));
                continue;
            };

            let features = card
                .select(&selectors.features)
                .next()
                .map(|el| el.inner_html())
                .unwrap_or_default();

            let mut record = RawTariffRecord::new(name);
            record.description = first_text(card, &selectors.description).unwrap_or_default();
            record.monthly_fee = extract_price(&price_text);
            record.data_volume = extract_data_volume(&features);
            record.minutes_volume = extract_minutes(&features);
            report.records.push(record);
        }

        Ok(report)
    }
}
