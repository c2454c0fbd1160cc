use super::decimal_column;
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use shared_types::{Allowance, TariffPlan, ValidatedTariff};

const PLAN_COLUMNS: &str = "p.id, p.operator_id, o.name, p.name, p.description, p.monthly_fee,
    p.data_volume, p.data_unlimited, p.minutes_volume, p.minutes_unlimited,
    p.overage_data_price, p.overage_minute_price, p.is_archived, p.created_at, p.updated_at";

fn plan_from_row(row: &Row) -> rusqlite::Result<TariffPlan> {
    let data_unlimited: bool = row.get(7)?;
    let minutes_unlimited: bool = row.get(9)?;

    Ok(TariffPlan {
        id: row.get(0)?,
        operator_id: row.get(1)?,
        operator_name: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        monthly_fee: decimal_column(row, 5)?,
        data_volume: if data_unlimited {
            Allowance::Unlimited
        } else {
            Allowance::Bounded(row.get(6)?)
        },
        minutes_volume: if minutes_unlimited {
            Allowance::Unlimited
        } else {
            Allowance::Bounded(row.get(8)?)
        },
        overage_data_price: decimal_column(row, 10)?,
        overage_minute_price: decimal_column(row, 11)?,
        is_archived: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn volume_columns(tariff: &ValidatedTariff) -> (f64, bool, u32, bool) {
    (
        tariff.data_volume.bounded().copied().unwrap_or(0.0),
        tariff.data_volume.is_unlimited(),
        tariff.minutes_volume.bounded().copied().unwrap_or(0),
        tariff.minutes_volume.is_unlimited(),
    )
}

pub fn find_by_operator_and_name(
    conn: &Connection,
    operator_id: i64,
    name: &str,
) -> Result<Option<TariffPlan>> {
    let plan = conn
        .query_row(
            &format!(
                "SELECT {PLAN_COLUMNS}
                 FROM tariff_plans p JOIN operators o ON o.id = p.operator_id
                 WHERE p.operator_id = ?1 AND p.name = ?2"
            ),
            params![operator_id, name],
            plan_from_row,
        )
        .optional()?;

    Ok(plan)
}

pub fn insert_plan(
    conn: &Connection,
    operator_id: i64,
    tariff: &ValidatedTariff,
    now: i64,
) -> Result<i64> {
    let (data_volume, data_unlimited, minutes_volume, minutes_unlimited) = volume_columns(tariff);

    let id: i64 = conn.query_row(
        "INSERT INTO tariff_plans (operator_id, name, description, monthly_fee,
            data_volume, data_unlimited, minutes_volume, minutes_unlimited,
            overage_data_price, overage_minute_price, is_archived, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
         RETURNING id",
        params![
            operator_id,
            tariff.name,
            tariff.description,
            tariff.monthly_fee.to_string(),
            data_volume,
            data_unlimited,
            minutes_volume,
            minutes_unlimited,
            tariff.overage_data_price.to_string(),
            tariff.overage_minute_price.to_string(),
            tariff.is_archived,
            now,
        ],
        |row| row.get(0),
    )?;

    Ok(id)
}

/// Overwrite the mutable fields of an existing plan.
pub fn update_plan(conn: &Connection, plan_id: i64, tariff: &ValidatedTariff, now: i64) -> Result<()> {
    let (data_volume, data_unlimited, minutes_volume, minutes_unlimited) = volume_columns(tariff);

    conn.execute(
        "UPDATE tariff_plans SET
            description = ?1,
            monthly_fee = ?2,
            data_volume = ?3,
            data_unlimited = ?4,
            minutes_volume = ?5,
            minutes_unlimited = ?6,
            overage_data_price = ?7,
            overage_minute_price = ?8,
            is_archived = ?9,
            updated_at = ?10
         WHERE id = ?11",
        params![
            tariff.description,
            tariff.monthly_fee.to_string(),
            data_volume,
            data_unlimited,
            minutes_volume,
            minutes_unlimited,
            tariff.overage_data_price.to_string(),
            tariff.overage_minute_price.to_string(),
            tariff.is_archived,
            now,
            plan_id,
        ],
    )?;

    Ok(())
}

/// Delete every plan of the given operators. Returns the number of rows removed.
pub fn delete_plans(conn: &Connection, operator_ids: &[i64]) -> Result<usize> {
    if operator_ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; operator_ids.len()].join(", ");
    let deleted = conn.execute(
        &format!("DELETE FROM tariff_plans WHERE operator_id IN ({placeholders})"),
        params_from_iter(operator_ids.iter()),
    )?;

    Ok(deleted)
}

pub fn list_plans(conn: &Connection, include_archived: bool) -> Result<Vec<TariffPlan>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLAN_COLUMNS}
         FROM tariff_plans p JOIN operators o ON o.id = p.operator_id
         WHERE ?1 OR p.is_archived = 0
         ORDER BY o.name, p.name"
    ))?;

    let plans = stmt
        .query_map([include_archived], plan_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(plans)
}

pub fn count_for_operator(conn: &Connection, operator_id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM tariff_plans WHERE operator_id = ?",
        [operator_id],
        |row| row.get(0),
    )?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{operators, Database};
    use rust_decimal::Decimal;
    use shared_types::{OperatorCode, RawTariffRecord};
    use std::str::FromStr;

    fn tariff(name: &str, fee: &str) -> ValidatedTariff {
        let mut raw = RawTariffRecord::new(name);
        raw.monthly_fee = Decimal::from_str(fee).unwrap();
        raw.data_volume = Allowance::Unlimited;
        raw.minutes_volume = Allowance::Bounded(600);
        raw.overage_minute_price = Some(Decimal::from_str("1.5").unwrap());
        raw.validate().unwrap()
    }

    #[test]
    fn test_insert_find_update() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        let op = operators::upsert_operator(&conn, OperatorCode::Megafon, "МегаФон", "https://megafon.ru", "#00b956").unwrap();

        let id = insert_plan(&conn, op.id, &tariff("Включайся!", "400.00"), 100).unwrap();
        let plan = find_by_operator_and_name(&conn, op.id, "Включайся!").unwrap().unwrap();
        assert_eq!(plan.id, id);
        assert_eq!(plan.operator_name, "МегаФон");
        assert_eq!(plan.monthly_fee, Decimal::from_str("400.00").unwrap());
        assert_eq!(plan.data_volume, Allowance::Unlimited);
        assert_eq!(plan.minutes_volume, Allowance::Bounded(600));
        assert_eq!(plan.overage_minute_price, Decimal::from_str("1.5").unwrap());
        assert_eq!(plan.overage_data_price, Decimal::ZERO);

        update_plan(&conn, id, &tariff("Включайся!", "450.50"), 200).unwrap();
        let plan = find_by_operator_and_name(&conn, op.id, "Включайся!").unwrap().unwrap();
        assert_eq!(plan.monthly_fee, Decimal::from_str("450.50").unwrap());
        assert_eq!(plan.created_at, 100);
        assert_eq!(plan.updated_at, 200);

        assert!(find_by_operator_and_name(&conn, op.id, "Другой").unwrap().is_none());
    }

    #[test]
    fn test_name_unique_per_operator() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        let op = operators::upsert_operator(&conn, OperatorCode::T2, "Т2", "https://t2.ru", "#1f2229").unwrap();

        insert_plan(&conn, op.id, &tariff("Мой онлайн", "350"), 1).unwrap();
        assert!(insert_plan(&conn, op.id, &tariff("Мой онлайн", "360"), 2).is_err());
    }

    #[test]
    fn test_delete_scoped_to_operators() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        let mts = operators::upsert_operator(&conn, OperatorCode::Mts, "МТС", "https://mts.ru", "#e30611").unwrap();
        let t2 = operators::upsert_operator(&conn, OperatorCode::T2, "Т2", "https://t2.ru", "#1f2229").unwrap();

        insert_plan(&conn, mts.id, &tariff("Тариф А", "100"), 1).unwrap();
        insert_plan(&conn, mts.id, &tariff("Тариф Б", "200"), 1).unwrap();
        insert_plan(&conn, t2.id, &tariff("Тариф А", "300"), 1).unwrap();

        assert_eq!(delete_plans(&conn, &[mts.id]).unwrap(), 2);
        assert_eq!(delete_plans(&conn, &[]).unwrap(), 0);
        assert_eq!(count_for_operator(&conn, mts.id).unwrap(), 0);
        assert_eq!(count_for_operator(&conn, t2.id).unwrap(), 1);
    }

    #[test]
    fn test_list_hides_archived() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        let op = operators::upsert_operator(&conn, OperatorCode::Beeline, "Билайн", "https://beeline.ru", "#ffc800").unwrap();

        insert_plan(&conn, op.id, &tariff("UP", "550"), 1).unwrap();
        let mut old = tariff("Всё за 300", "300");
        old.is_archived = true;
        insert_plan(&conn, op.id, &old, 1).unwrap();

        assert_eq!(list_plans(&conn, false).unwrap().len(), 1);
        assert_eq!(list_plans(&conn, true).unwrap().len(), 2);
    }
}
