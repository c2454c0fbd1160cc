use crate::config::OperatorConfig;
use crate::database::{operators as operators_db, tariff_plans as plans_db, Database};
use crate::jobs::reconcile::{reconcile_operator, ReconcileSummary, WriteMode};
use anyhow::Result;
use extractors::{AdapterRegistry, Fetcher};
use futures::FutureExt;
use shared_types::{validate_color, Operator, DEFAULT_OPERATOR_COLOR};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct IngestionOptions {
    pub operator_filter: Option<String>,
    pub force: bool,
    pub dry_run: bool,
    pub clear: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorOutcome {
    Saved(ReconcileSummary),
    DryRun(ReconcileSummary),
    /// Ingested recently enough to skip
    Fresh,
    NoAdapter,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct OperatorReport {
    pub operator: Operator,
    pub outcome: OperatorOutcome,
    pub diagnostics: Vec<String>,
}

impl OperatorReport {
    pub fn status_line(&self) -> String {
        let name = &self.operator.name;
        match &self.outcome {
            OperatorOutcome::Saved(s) => format!(
                "{name}: {} created, {} updated, {} skipped",
                s.created, s.updated, s.skipped
            ),
            OperatorOutcome::DryRun(s) => format!(
                "{name} (dry run): {} would be created, {} updated, {} skipped",
                s.created, s.updated, s.skipped
            ),
            OperatorOutcome::Fresh => format!("{name}: fresh, skipped (use --force to re-fetch)"),
            OperatorOutcome::NoAdapter => {
                format!("{name}: no adapter registered for code {}", self.operator.code)
            }
            OperatorOutcome::Failed(e) => format!("{name}: failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestionSummary {
    pub reports: Vec<OperatorReport>,
    pub cleared: usize,
}

impl IngestionSummary {
    /// Plans saved (or that would be saved, in a dry run) across all operators
    pub fn total_saved(&self) -> usize {
        self.reports
            .iter()
            .map(|report| match &report.outcome {
                OperatorOutcome::Saved(s) | OperatorOutcome::DryRun(s) => s.saved(),
                _ => 0,
            })
            .sum()
    }

    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| matches!(report.outcome, OperatorOutcome::Failed(_)))
            .count()
    }
}

pub struct IngestionManager {
    db: Arc<Database>,
    registry: AdapterRegistry,
    fetcher: Arc<dyn Fetcher>,
    freshness_secs: i64,
}

impl IngestionManager {
    pub fn new(
        db: Arc<Database>,
        registry: AdapterRegistry,
        fetcher: Arc<dyn Fetcher>,
        freshness_secs: i64,
    ) -> Self {
        Self {
            db,
            registry,
            fetcher,
            freshness_secs,
        }
    }

    /// Upsert configured operators by code. Invalid colors fall back to the default.
    /// Entries whose display name is already taken by another code are logged and skipped.
    pub fn sync_operators(&self, configs: &[OperatorConfig]) -> Result<Vec<Operator>> {
        let conn = self.db.lock()?;
        let mut synced = Vec::with_capacity(configs.len());

        for config in configs {
            let color = match validate_color(&config.color) {
                Ok(()) => config.color.as_str(),
                Err(e) => {
                    tracing::warn!(operator = %config.code, "{}, using {}", e, DEFAULT_OPERATOR_COLOR);
                    DEFAULT_OPERATOR_COLOR
                }
            };

            match operators_db::upsert_operator(&conn, config.code, &config.name, &config.website, color) {
                Ok(operator) => synced.push(operator),
                Err(e) => {
                    tracing::error!(operator = %config.code, "Operator not synced: {:#}", e);
                }
            }
        }

        Ok(synced)
    }

    /// Run one ingestion batch. Per-operator failures are reported, never returned.
    pub async fn run(&self, options: &IngestionOptions) -> Result<IngestionSummary> {
        let now = chrono::Utc::now().timestamp();
        let filter = options.operator_filter.as_deref().unwrap_or("");

        let operators: Vec<Operator> = {
            let conn = self.db.lock()?;
            operators_db::list_operators(&conn)?
                .into_iter()
                .filter(|operator| operator.matches_filter(filter))
                .collect()
        };

        if operators.is_empty() {
            tracing::warn!("No operators match filter {:?}", filter);
        }

        let mut summary = IngestionSummary::default();

        if options.clear {
            if options.dry_run {
                tracing::warn!("Dry run: skipping clear of existing plans");
            } else {
                let ids: Vec<i64> = operators.iter().map(|operator| operator.id).collect();
                let conn = self.db.lock()?;
                summary.cleared = plans_db::delete_plans(&conn, &ids)?;
                tracing::info!("Cleared {} existing plans", summary.cleared);
            }
        }

        for operator in operators {
            let report = self.ingest_operator(operator, options, now).await;
            tracing::info!("{}", report.status_line());
            summary.reports.push(report);
        }

        Ok(summary)
    }

    async fn ingest_operator(
        &self,
        operator: Operator,
        options: &IngestionOptions,
        now: i64,
    ) -> OperatorReport {
        let mut report = OperatorReport {
            outcome: OperatorOutcome::Fresh,
            diagnostics: Vec::new(),
            operator,
        };

        if !options.force && !options.clear && report.operator.is_fresh(now, self.freshness_secs) {
            tracing::debug!("Skipping fresh operator {}", report.operator.name);
            return report;
        }

        let Some(adapter) = self.registry.get(report.operator.code) else {
            report.outcome = OperatorOutcome::NoAdapter;
            return report;
        };

        let fetched = AssertUnwindSafe(
            adapter.fetch_and_parse(self.fetcher.as_ref(), &report.operator.website),
        )
        .catch_unwind()
        .await;

        let adapter_report = match fetched {
            Ok(adapter_report) => adapter_report,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(operator = %report.operator.code, "Adapter panicked: {}", message);
                report.outcome = OperatorOutcome::Failed(format!("adapter panicked: {message}"));
                return report;
            }
        };

        for diagnostic in &adapter_report.diagnostics {
            tracing::warn!(operator = %report.operator.code, "{}", diagnostic);
        }
        report.diagnostics = adapter_report.diagnostics;

        if adapter_report.records.is_empty() && !report.diagnostics.is_empty() {
            report.outcome = OperatorOutcome::Failed(report.diagnostics.join("; "));
            return report;
        }

        let mode = if options.dry_run {
            WriteMode::DryRun
        } else {
            WriteMode::Commit
        };

        let reconciled = self.db.lock().and_then(|mut conn| {
            reconcile_operator(&mut conn, &report.operator, &adapter_report.records, now, mode)
        });

        report.outcome = match reconciled {
            Ok(summary) if options.dry_run => OperatorOutcome::DryRun(summary),
            Ok(summary) => OperatorOutcome::Saved(summary),
            Err(e) => {
                tracing::error!(operator = %report.operator.code, "Reconciliation failed: {:#}", e);
                OperatorOutcome::Failed(format!("{e:#}"))
            }
        };

        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use extractors::{AdapterReport, SourceAdapter, StaticFetcher, T2Adapter};
    use shared_types::{ExtractionError, FetchError, OperatorCode};

    const MTS_URL: &str = "https://mts.test/tariffs";
    const T2_URL: &str = "https://t2.test/tariffs";
    const BEELINE_URL: &str = "https://beeline.test/tariffs";

    const T2_PAGE: &str = r#"<script>window.__INITIAL_STATE__ = {"tariffs": {"items": [
        {"name": "Мой онлайн", "price": {"amount": 350}, "internet": {"text": "15 ГБ"}, "calls": {"text": "500 минут"}},
        {"name": "Мой разговор", "price": {"amount": "250"}, "internet": {"text": "5 ГБ"}, "calls": {"text": "800 мин"}}
    ]}};</script>"#;

    struct PanickingAdapter;

    #[async_trait]
    impl SourceAdapter for PanickingAdapter {
        fn code(&self) -> OperatorCode {
            OperatorCode::Mts
        }

        fn contract_version(&self) -> &'static str {
            "panics"
        }

        fn parse(&self, _body: &str) -> Result<AdapterReport, ExtractionError> {
            panic!("layout changed")
        }
    }

    fn operator_config(code: OperatorCode, name: &str, website: &str) -> OperatorConfig {
        OperatorConfig {
            code,
            name: name.to_string(),
            website: website.to_string(),
            color: "#123456".to_string(),
        }
    }

    fn manager(registry: AdapterRegistry) -> IngestionManager {
        let fetcher = StaticFetcher::new()
            .with_page(MTS_URL, "<html></html>")
            .with_page(T2_URL, T2_PAGE)
            .with_error(
                BEELINE_URL,
                FetchError::Timeout {
                    url: BEELINE_URL.to_string(),
                },
            );

        let manager = IngestionManager::new(
            Arc::new(Database::open_in_memory().unwrap()),
            registry,
            Arc::new(fetcher),
            24 * 3600,
        );
        manager
            .sync_operators(&[
                operator_config(OperatorCode::Mts, "МТС", MTS_URL),
                operator_config(OperatorCode::T2, "Т2", T2_URL),
                operator_config(OperatorCode::Beeline, "Билайн", BEELINE_URL),
            ])
            .unwrap();
        manager
    }

    fn plan_count(manager: &IngestionManager) -> usize {
        let conn = manager.db.lock().unwrap();
        plans_db::list_plans(&conn, true).unwrap().len()
    }

    fn outcome_for<'a>(summary: &'a IngestionSummary, code: OperatorCode) -> &'a OperatorOutcome {
        &summary
            .reports
            .iter()
            .find(|report| report.operator.code == code)
            .unwrap()
            .outcome
    }

    #[tokio::test]
    async fn test_panicking_adapter_does_not_stop_batch() {
        let mut registry = AdapterRegistry::with_defaults();
        registry.register(Arc::new(PanickingAdapter));
        let manager = manager(registry);

        let summary = manager.run(&IngestionOptions::default()).await.unwrap();

        assert!(matches!(
            outcome_for(&summary, OperatorCode::Mts),
            OperatorOutcome::Failed(message) if message.contains("layout changed")
        ));
        assert!(matches!(outcome_for(&summary, OperatorCode::Beeline), OperatorOutcome::Failed(_)));
        assert!(matches!(
            outcome_for(&summary, OperatorCode::T2),
            OperatorOutcome::Saved(s) if s.created == 2
        ));
        assert_eq!(summary.total_saved(), 2);
        assert_eq!(summary.failed(), 2);
        assert_eq!(plan_count(&manager), 2);
    }

    #[tokio::test]
    async fn test_fresh_operator_skipped_unless_forced() {
        let manager = manager(AdapterRegistry::with_defaults());
        let options = IngestionOptions {
            operator_filter: Some("t2".to_string()),
            ..Default::default()
        };

        manager.run(&options).await.unwrap();
        let second = manager.run(&options).await.unwrap();
        assert_eq!(outcome_for(&second, OperatorCode::T2), &OperatorOutcome::Fresh);

        let forced = manager
            .run(&IngestionOptions {
                force: true,
                ..options.clone()
            })
            .await
            .unwrap();
        assert!(matches!(
            outcome_for(&forced, OperatorCode::T2),
            OperatorOutcome::Saved(s) if s.updated == 2
        ));
        assert_eq!(plan_count(&manager), 2);
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive() {
        let manager = manager(AdapterRegistry::with_defaults());
        let summary = manager
            .run(&IngestionOptions {
                operator_filter: Some("БИЛ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].operator.code, OperatorCode::Beeline);
    }

    #[tokio::test]
    async fn test_dry_run_persists_nothing() {
        let manager = manager(AdapterRegistry::with_defaults());
        let summary = manager
            .run(&IngestionOptions {
                dry_run: true,
                clear: true,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(summary.cleared, 0);
        assert!(matches!(
            outcome_for(&summary, OperatorCode::T2),
            OperatorOutcome::DryRun(s) if s.created == 2
        ));
        assert_eq!(plan_count(&manager), 0);
    }

    #[tokio::test]
    async fn test_dry_run_reports_failed_fetch() {
        let manager = manager(AdapterRegistry::with_defaults());
        let summary = manager
            .run(&IngestionOptions {
                operator_filter: Some("beeline".to_string()),
                dry_run: true,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(matches!(
            outcome_for(&summary, OperatorCode::Beeline),
            OperatorOutcome::Failed(message) if message.contains("timed out")
        ));
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total_saved(), 0);
    }

    #[tokio::test]
    async fn test_clear_only_touches_selected_operators() {
        let manager = manager(AdapterRegistry::with_defaults());
        manager.run(&IngestionOptions::default()).await.unwrap();
        assert_eq!(plan_count(&manager), 2);

        let summary = manager
            .run(&IngestionOptions {
                operator_filter: Some("мтс".to_string()),
                clear: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(summary.cleared, 0);
        assert_eq!(plan_count(&manager), 2);

        let summary = manager
            .run(&IngestionOptions {
                operator_filter: Some("t2".to_string()),
                clear: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(summary.cleared, 2);
        assert!(matches!(
            outcome_for(&summary, OperatorCode::T2),
            OperatorOutcome::Saved(s) if s.created == 2
        ));
    }

    #[tokio::test]
    async fn test_missing_adapter_reported() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(T2Adapter));
        let manager = manager(registry);

        let summary = manager.run(&IngestionOptions::default()).await.unwrap();
        assert_eq!(outcome_for(&summary, OperatorCode::Mts), &OperatorOutcome::NoAdapter);
    }

    #[test]
    fn test_invalid_color_falls_back() {
        let manager = manager(AdapterRegistry::with_defaults());
        let mut config = operator_config(OperatorCode::Megafon, "МегаФон", "https://megafon.test");
        config.color = "green".to_string();

        let synced = manager.sync_operators(&[config]).unwrap();
        assert_eq!(synced[0].color, DEFAULT_OPERATOR_COLOR);
    }

    #[test]
    fn test_duplicate_operator_name_skipped() {
        let manager = manager(AdapterRegistry::with_defaults());

        let synced = manager
            .sync_operators(&[
                operator_config(OperatorCode::Megafon, "МегаФон", "https://megafon.test"),
                operator_config(OperatorCode::T2, "МТС", T2_URL),
            ])
            .unwrap();

        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].code, OperatorCode::Megafon);

        let conn = manager.db.lock().unwrap();
        let t2 = operators_db::get_operator_by_code(&conn, OperatorCode::T2).unwrap().unwrap();
        assert_eq!(t2.name, "Т2");
    }
}
