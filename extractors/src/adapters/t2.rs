use super::{AdapterReport, SourceAdapter};
use crate::text::{
    extract_data_volume, extract_minutes, extract_price, find_embedded_json, normalize_spaces,
    unescape_html,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use shared_types::{ExtractionError, OperatorCode, RawTariffRecord};

/// T2 (Tele2) ships its catalogue as the `window.__INITIAL_STATE__` store.
pub struct T2Adapter;

const STATE_MARKER: &str = "window.__INITIAL_STATE__";

#[derive(Debug, Deserialize)]
struct InitialState {
    tariffs: Option<TariffsSlice>,
}

#[derive(Debug, Deserialize)]
struct TariffsSlice {
    #[serde(default)]
    items: Vec<TariffItem>,
}

#[derive(Debug, Deserialize)]
struct TariffItem {
    name: Option<String>,
    #[serde(default)]
    description: String,
    price: Option<PriceInfo>,
    internet: Option<TextBlock>,
    calls: Option<TextBlock>,
    overage: Option<Overage>,
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct PriceInfo {
    amount: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TextBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Overage {
    data: Option<String>,
    minutes: Option<String>,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SourceAdapter for T2Adapter {
    fn code(&self) -> OperatorCode {
        OperatorCode::T2
    }

    fn contract_version(&self) -> &'static str {
        "t2-initial-state-v1"
    }

    fn parse(&self, body: &str) -> Result<AdapterReport, ExtractionError> {
        let json = find_embedded_json(body, STATE_MARKER)?;
        let state: InitialState = serde_json::from_str(json)?;
        let items = state
            .tariffs
            .ok_or_else(|| ExtractionError::MissingField("tariffs".to_string()))?
            .items;

        let mut report = AdapterReport::default();

        for item in items {
            let Some(name) = item
                .name
                .map(|name| normalize_spaces(&unescape_html(&name)))
                .filter(|name| !name.is_empty())
            else {
                report.note("tariff item without name skipped");
                continue;
            };

            let Some(amount) = item.price.and_then(|price| price.amount) else {
                report.note(format!("{name}: missing price.amount, skipped"));
                continue;
            };

            let internet = item.internet.map(|block| block.text).unwrap_or_default();
            let calls = item.calls.map(|block| block.text).unwrap_or_default();

            let mut record = RawTariffRecord::new(name);
            record.description = normalize_spaces(&unescape_html(&item.description));
            record.monthly_fee = extract_price(&value_text(&amount));
            record.data_volume = extract_data_volume(&internet);
            record.minutes_volume = extract_minutes(&calls);
            if let Some(overage) = item.overage {
                record.overage_data_price = overage.data.as_deref().map(extract_price);
                record.overage_minute_price = overage.minutes.as_deref().map(extract_price);
            }
            record.is_archived = item.archived;

            report.records.push(record);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared_types::Allowance;
    use std::str::FromStr;

    const PAGE: &str = r#"
        <html><body>
        <div id="app"></div>
        <script>
          window.__INITIAL_STATE__ = {
            "region": "moscow",
            "tariffs": {"items": [
              {
                "name": "Мой онлайн",
                "description": "Популярный тариф Tele2 &amp; безлимит на соцсети",
                "price": {"amount": 350, "currency": "RUB"},
                "internet": {"text": "12 ГБ"},
                "calls": {"text": "400 минут"},
                "overage": {"data": "80 руб/ГБ", "minutes": "2,5 руб/мин"}
              },
              {
                "name": "Черный",
                "price": {"amount": "1 099,90"},
                "internet": {"text": "Безлимитный интернет"},
                "calls": {"text": "Безлимитные звонки на Т2"},
                "archived": true
              },
              {"name": "Без цены", "price": {}}
            ]}
          };
        </script>
        </body></html>
    "#;

    #[test]
    fn test_parse_state() {
        let report = T2Adapter.parse(PAGE).unwrap();
        assert_eq!(report.records.len(), 2);

        let online = &report.records[0];
        assert_eq!(online.name, "Мой онлайн");
        assert_eq!(online.description, "Популярный тариф Tele2 & безлимит на соцсети");
        assert_eq!(online.monthly_fee, Decimal::from(350));
        assert_eq!(online.data_volume, Allowance::Bounded(12.0));
        assert_eq!(online.minutes_volume, Allowance::Bounded(400));
        assert_eq!(online.overage_data_price, Some(Decimal::from(80)));
        assert_eq!(online.overage_minute_price, Some(Decimal::from_str("2.5").unwrap()));
        assert!(!online.is_archived);

        let black = &report.records[1];
        assert_eq!(black.monthly_fee, Decimal::from_str("1099.90").unwrap());
        assert_eq!(black.data_volume, Allowance::Unlimited);
        assert_eq!(black.minutes_volume, Allowance::Unlimited);
        assert_eq!(black.overage_data_price, None);
        assert!(black.is_archived);

        assert_eq!(report.diagnostics, vec!["Без цены: missing price.amount, skipped".to_string()]);
    }

    #[test]
    fn test_state_without_tariffs() {
        let page = r#"<script>window.__INITIAL_STATE__ = {"region": "spb"};</script>"#;
        assert_eq!(
            T2Adapter.parse(page),
            Err(ExtractionError::MissingField("tariffs".to_string()))
        );
    }

    #[test]
    fn test_missing_state() {
        assert!(matches!(
            T2Adapter.parse("<html></html>"),
            Err(ExtractionError::MarkerNotFound(_))
        ));
    }
}
