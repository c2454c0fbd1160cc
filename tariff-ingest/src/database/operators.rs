use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use shared_types::{Operator, OperatorCode};

const OPERATOR_COLUMNS: &str = "id, code, name, website, color, last_ingested_at";

fn operator_from_row(row: &Row) -> rusqlite::Result<Operator> {
    let code: String = row.get(1)?;
    let code = code.parse::<OperatorCode>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Operator {
        id: row.get(0)?,
        code,
        name: row.get(2)?,
        website: row.get(3)?,
        color: row.get(4)?,
        last_ingested_at: row.get(5)?,
    })
}

/// Insert or refresh an operator keyed by its code. `last_ingested_at` is kept.
///
/// Display names are unique too; reusing another operator's name is an error.
pub fn upsert_operator(
    conn: &Connection,
    code: OperatorCode,
    name: &str,
    website: &str,
    color: &str,
) -> Result<Operator> {
    let now = chrono::Utc::now().timestamp();

    let operator = conn
        .query_row(
            &format!(
                "INSERT INTO operators (code, name, website, color, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(code) DO UPDATE SET
                     name = excluded.name,
                     website = excluded.website,
                     color = excluded.color,
                     updated_at = excluded.updated_at
                 RETURNING {OPERATOR_COLUMNS}"
            ),
            params![code.as_str(), name, website, color, now],
            operator_from_row,
        )
        .with_context(|| format!("Failed to upsert operator {code} ({name})"))?;

    Ok(operator)
}

pub fn list_operators(conn: &Connection) -> Result<Vec<Operator>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OPERATOR_COLUMNS} FROM operators ORDER BY name"
    ))?;

    let operators = stmt
        .query_map([], operator_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(operators)
}

pub fn get_operator_by_code(conn: &Connection, code: OperatorCode) -> Result<Option<Operator>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OPERATOR_COLUMNS} FROM operators WHERE code = ?"
    ))?;

    let mut rows = stmt.query_map([code.as_str()], operator_from_row)?;
    Ok(rows.next().transpose()?)
}

pub fn mark_ingested(conn: &Connection, operator_id: i64, at: i64) -> Result<()> {
    conn.execute(
        "UPDATE operators SET last_ingested_at = ?1 WHERE id = ?2",
        params![at, operator_id],
    )?;

    Ok(())
}
