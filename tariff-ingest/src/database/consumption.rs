use anyhow::Result;
use rusqlite::{params, Connection};
use shared_types::{ConsumptionRecord, UsageExpectation};

/// Record a month of actual usage; re-entering the same month overwrites it.
pub fn upsert_consumption(conn: &Connection, record: &ConsumptionRecord) -> Result<i64> {
    record.validate()?;
    let now = chrono::Utc::now().timestamp();

    let id: i64 = conn.query_row(
        "INSERT INTO monthly_consumption (profile, year, month, actual_data_used, actual_minutes_used, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(profile, year, month) DO UPDATE SET
             actual_data_used = excluded.actual_data_used,
             actual_minutes_used = excluded.actual_minutes_used,
             recorded_at = excluded.recorded_at
         RETURNING id",
        params![
            record.profile.trim(),
            record.year,
            record.month,
            record.actual_data_used,
            record.actual_minutes_used,
            now,
        ],
        |row| row.get(0),
    )?;

    Ok(id)
}

pub fn list_consumption(conn: &Connection, profile: &str) -> Result<Vec<ConsumptionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, profile, year, month, actual_data_used, actual_minutes_used, recorded_at
         FROM monthly_consumption
         WHERE profile = ?
         ORDER BY year DESC, month DESC",
    )?;

    let records = stmt
        .query_map([profile.trim()], |row| {
            Ok(ConsumptionRecord {
                id: row.get(0)?,
                profile: row.get(1)?,
                year: row.get(2)?,
                month: row.get(3)?,
                actual_data_used: row.get(4)?,
                actual_minutes_used: row.get(5)?,
                recorded_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Average of the most recent `months` records, or `None` when the profile has none.
pub fn average_usage(conn: &Connection, profile: &str, months: u32) -> Result<Option<UsageExpectation>> {
    let recent: Vec<_> = list_consumption(conn, profile)?
        .into_iter()
        .take(months.max(1) as usize)
        .collect();

    if recent.is_empty() {
        return Ok(None);
    }

    let count = recent.len() as f64;
    let data_gb = recent.iter().map(|r| r.actual_data_used).sum::<f64>() / count;
    let minutes = recent.iter().map(|r| r.actual_minutes_used as f64).sum::<f64>() / count;

    Ok(Some(UsageExpectation {
        data_gb,
        minutes: minutes.round() as u32,
    }))
}
