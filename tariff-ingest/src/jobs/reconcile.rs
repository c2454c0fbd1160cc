use anyhow::{Context, Result};
use rusqlite::Connection;
use shared_types::{Operator, RawTariffRecord};

use crate::database::{operators as operators_db, tariff_plans as plans_db};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl ReconcileSummary {
    pub fn saved(&self) -> usize {
        self.created + self.updated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Commit,
    /// Run every write, then roll the transaction back
    DryRun,
}

/// Upsert `records` for `operator` keyed by plan name.
///
/// A record that fails validation or its write is skipped and reported; the
/// rest of the batch continues. Runs against whatever transaction scope the
/// caller holds.
pub fn reconcile(
    conn: &Connection,
    operator: &Operator,
    records: &[RawTariffRecord],
    now: i64,
) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    for record in records {
        let tariff = match record.validate() {
            Ok(tariff) => tariff,
            Err(e) => {
                tracing::warn!(operator = %operator.code, plan = %record.name, "Skipping invalid record: {}", e);
                summary.skipped += 1;
                summary.errors.push(format!("{:?}: {}", record.name, e));
                continue;
            }
        };

        let result = match plans_db::find_by_operator_and_name(conn, operator.id, &tariff.name) {
            Ok(Some(existing)) => plans_db::update_plan(conn, existing.id, &tariff, now).map(|_| false),
            Ok(None) => plans_db::insert_plan(conn, operator.id, &tariff, now).map(|_| true),
            Err(e) => Err(e),
        };

        match result {
            Ok(true) => summary.created += 1,
            Ok(false) => summary.updated += 1,
            Err(e) => {
                tracing::warn!(operator = %operator.code, plan = %tariff.name, "Failed to save record: {}", e);
                summary.skipped += 1;
                summary.errors.push(format!("{:?}: {}", tariff.name, e));
            }
        }
    }

    summary
}

/// Reconcile one operator's batch inside its own transaction.
///
/// On commit the operator's `last_ingested_at` is stamped in the same
/// transaction, provided at least one record was saved.
pub fn reconcile_operator(
    conn: &mut Connection,
    operator: &Operator,
    records: &[RawTariffRecord],
    now: i64,
    mode: WriteMode,
) -> Result<ReconcileSummary> {
    let tx = conn
        .transaction()
        .with_context(|| format!("Failed to open transaction for {}", operator.name))?;

    let summary = reconcile(&tx, operator, records, now);

    match mode {
        WriteMode::Commit => {
            if summary.saved() > 0 {
                operators_db::mark_ingested(&tx, operator.id, now)?;
            }
            tx.commit()
                .with_context(|| format!("Failed to commit tariffs for {}", operator.name))?;
        }
        WriteMode::DryRun => {
            tx.rollback()?;
        }
    }

    Ok(summary)
}
