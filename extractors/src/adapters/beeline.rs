use super::{AdapterReport, SourceAdapter};
use crate::text::{
    extract_data_volume, extract_minutes, extract_price, find_embedded_json, normalize_spaces,
    unescape_html,
};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use shared_types::{Allowance, ExtractionError, OperatorCode, RawTariffRecord};

/// Beeline renders its catalogue client-side; the tariffs live in the props
/// object passed to `React.createElement` inside an inline script.
pub struct BeelineAdapter;

const SCRIPT_MARKER: &str = "beeline.externalPages.TariffsCatalogLanding";
const PROPS_MARKER: &str = "React.createElement(beeline.externalPages.TariffsCatalogLanding";

#[derive(Debug, Deserialize)]
struct LandingProps {
    #[serde(default)]
    data: CatalogData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogData {
    #[serde(default)]
    tariffs_cards: Vec<TariffCard>,
    #[serde(default)]
    extra_tariffs_cards: Vec<ExtraSection>,
}

#[derive(Debug, Deserialize)]
struct ExtraSection {
    #[serde(default)]
    tariffs: Vec<TariffCard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TariffCard {
    card_title: Option<CardTitle>,
    preset_text: Option<String>,
    price_block: Option<PriceBlock>,
}

#[derive(Debug, Deserialize)]
struct CardTitle {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceBlock {
    price_with_discount: Option<Price>,
    price_without_discount: Option<Price>,
    conditions_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Price {
    price: Option<serde_json::Value>,
    unit: Option<String>,
}

impl Price {
    fn display(&self) -> Option<String> {
        let amount = match self.price.as_ref()? {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => return None,
            other => other.to_string(),
        };
        Some(format!("{} {}", amount, self.unit.as_deref().unwrap_or("")))
    }
}

impl TariffCard {
    fn into_record(self) -> Option<RawTariffRecord> {
        let name = self
            .card_title
            .and_then(|title| title.text)
            .map(|text| normalize_spaces(&unescape_html(&text)))
            .filter(|text| !text.is_empty())?;

        let preset = self.preset_text.unwrap_or_default();
        let (price, conditions) = match self.price_block {
            Some(block) => {
                let price = block
                    .price_with_discount
                    .as_ref()
                    .and_then(Price::display)
                    .or_else(|| block.price_without_discount.as_ref().and_then(Price::display))
                    .unwrap_or_else(|| "0 ₽".to_string());
                (price, unescape_html(&block.conditions_text.unwrap_or_default()))
            }
            None => ("0 ₽".to_string(), String::new()),
        };

        let mut data_volume = extract_data_volume(&conditions);
        if data_volume == Allowance::Bounded(0.0) {
            data_volume = extract_data_volume(&preset);
        }
        let mut minutes_volume = extract_minutes(&conditions);
        if minutes_volume == Allowance::Bounded(0) {
            minutes_volume = extract_minutes(&preset);
        }

        let mut record = RawTariffRecord::new(name);
        record.description = normalize_spaces(&unescape_html(&preset));
        record.monthly_fee = extract_price(&price);
        record.data_volume = data_volume;
        record.minutes_volume = minutes_volume;
        Some(record)
    }
}

#[async_trait]
impl SourceAdapter for BeelineAdapter {
    fn code(&self) -> OperatorCode {
        OperatorCode::Beeline
    }

    fn contract_version(&self) -> &'static str {
        "beeline-react-props-v1"
    }

    fn parse(&self, body: &str) -> Result<AdapterReport, ExtractionError> {
        let document = Html::parse_document(body);
        let script_selector = Selector::parse("script").unwrap();

        let script = document
            .select(&script_selector)
            .map(|el| el.text().collect::<String>())
            .find(|text| text.contains(SCRIPT_MARKER))
            .ok_or_else(|| ExtractionError::MarkerNotFound(SCRIPT_MARKER.to_string()))?;

        let json = find_embedded_json(&script, PROPS_MARKER)?;
        let props: LandingProps = serde_json::from_str(json)?;

        let cards = props.data.tariffs_cards.into_iter().chain(
            props
                .data
                .extra_tariffs_cards
                .into_iter()
                .flat_map(|section| section.tariffs),
        );

        let mut report = AdapterReport::default();
        for card in cards {
            match card.into_record() {
                Some(record) => report.records.push(record),
                None => report.note("tariff card without cardTitle.text skipped"),
            }
        }

        if report.records.is_empty() && report.diagnostics.is_empty() {
            report.note("catalogue props contained no tariff cards");
        }

        Ok(report)
    }
}
