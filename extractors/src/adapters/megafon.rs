use super::{first_text, AdapterReport, SourceAdapter};
use crate::text::{extract_data_volume, extract_minutes, extract_price};
use async_trait::async_trait;
use scraper::{Html, Selector};
use shared_types::{ExtractionError, OperatorCode, RawTariffRecord};

/// MegaFon tariff catalogue: `div.tariff-card` blocks with optional overage rates.
pub struct MegafonAdapter;

const ARCHIVED_CLASS: &str = "tariff-card--archived";

struct Selectors {
    card: Selector,
    title: Selector,
    description: Selector,
    price: Selector,
    options: Selector,
    overage_data: Selector,
    overage_minutes: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            card: Selector::parse("div.tariff-card").unwrap(),
            title: Selector::parse(".tariff-card__title").unwrap(),
            description: Selector::parse(".tariff-card__description").unwrap(),
            price: Selector::parse(".tariff-card__price").unwrap(),
            options: Selector::parse(".tariff-card__options").unwrap(),
            overage_data: Selector::parse(".tariff-card__overage-data").unwrap(),
            overage_minutes: Selector::parse(".tariff-card__overage-minutes").unwrap(),
        }
    }
}

#[async_trait]
impl SourceAdapter for MegafonAdapter {
    fn code(&self) -> OperatorCode {
        OperatorCode::Megafon
    }

    fn contract_version(&self) -> &'static str {
        "megafon-tariff-card-v1"
    }

    fn parse(&self, body: &str) -> Result<AdapterReport, ExtractionError> {
        let document = Html::parse_document(body);
        let selectors = Selectors::new();

        let cards: Vec<_> = document.select(&selectors.card).collect();
        if cards.is_empty() {
            return Err(ExtractionError::StructureNotFound(
                "no div.tariff-card elements".to_string(),
            ));
        }

        let mut report = AdapterReport::default();

        for card in &cards {
            let Some(name) = first_text(card, &selectors.title) else {
                report.note("tariff card without title skipped");
                continue;
            };

            let Some(price) = first_text(card, &selectors.price) else {
                report.note(format!("{name}: missing price, skipped"));
                continue;
            };

            let options = card
                .select(&selectors.options)
                .next()
                .map(|el| el.inner_html())
                .unwrap_or_default();

            let mut record = RawTariffRecord::new(name);
            record.description = first_text(card, &selectors.description).unwrap_or_default();
            record.monthly_fee = extract_price(&price);
            record.data_volume = extract_data_volume(&options);
            record.minutes_volume = extract_minutes(&options);
            record.overage_data_price =
                first_text(card, &selectors.overage_data).map(|text| extract_price(&text));
            record.overage_minute_price =
                first_text(card, &selectors.overage_minutes).map(|text| extract_price(&text));
            record.is_archived = card.value().classes().any(|class| class == ARCHIVED_CLASS);

            report.records.push(record);
        }

        Ok(report)
    }
}
