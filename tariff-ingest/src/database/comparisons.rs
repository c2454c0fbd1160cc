use anyhow::Result;
use rusqlite::{params, Connection};
use shared_types::ComparisonRecord;

use super::decimal_column;

pub fn insert_comparison(conn: &Connection, record: &ComparisonRecord) -> Result<i64> {
    let id: i64 = conn.query_row(
        "INSERT INTO tariff_comparisons (profile, tariff_plan_id, calculated_monthly_cost,
            user_data_input, user_minutes_input, is_recommended, compared_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING id",
        params![
            record.profile,
            record.tariff_plan_id,
            record.calculated_monthly_cost.to_string(),
            record.user_data_input,
            record.user_minutes_input,
            record.is_recommended,
            record.compared_at,
        ],
        |row| row.get(0),
    )?;

    Ok(id)
}

pub fn list_comparisons(conn: &Connection, profile: &str) -> Result<Vec<ComparisonRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, profile, tariff_plan_id, calculated_monthly_cost, user_data_input,
                user_minutes_input, is_recommended, compared_at
         FROM tariff_comparisons
         WHERE profile = ?
         ORDER BY compared_at DESC, id",
    )?;

    let records = stmt
        .query_map([profile], |row| {
            Ok(ComparisonRecord {
                id: row.get(0)?,
                profile: row.get(1)?,
                tariff_plan_id: row.get(2)?,
                calculated_monthly_cost: decimal_column(row, 3)?,
                user_data_input: row.get(4)?,
                user_minutes_input: row.get(5)?,
                is_recommended: row.get(6)?,
                compared_at: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{operators, tariff_plans, Database};
    use rust_decimal::Decimal;
    use shared_types::{OperatorCode, RawTariffRecord};
    use std::str::FromStr;

    #[test]
    fn test_insert_and_list() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        let op = operators::upsert_operator(&conn, OperatorCode::T2, "Т2", "https://t2.ru", "#1f2229").unwrap();
        let plan_id = tariff_plans::insert_plan(&conn, op.id, &RawTariffRecord::new("Мой онлайн").validate().unwrap(), 1).unwrap();

        let record = ComparisonRecord {
            id: 0,
            profile: "alice".to_string(),
            tariff_plan_id: plan_id,
            calculated_monthly_cost: Decimal::from_str("512.30").unwrap(),
            user_data_input: 12.5,
            user_minutes_input: 300,
            is_recommended: true,
            compared_at: 42,
        };
        let id = insert_comparison(&conn, &record).unwrap();

        let stored = list_comparisons(&conn, "alice").unwrap();
        assert_eq!(stored, vec![ComparisonRecord { id, ..record }]);
        assert!(list_comparisons(&conn, "bob").unwrap().is_empty());
    }
}
