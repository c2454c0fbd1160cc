use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS operators (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code VARCHAR NOT NULL UNIQUE,
            name VARCHAR NOT NULL UNIQUE,
            website VARCHAR NOT NULL,
            color VARCHAR NOT NULL DEFAULT '#007bff',
            last_ingested_at BIGINT,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    // Unlimited allowances are flagged explicitly; the volume column is then ignored
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tariff_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            operator_id INTEGER NOT NULL,
            name VARCHAR(200) NOT NULL,
            description VARCHAR NOT NULL DEFAULT '',
            monthly_fee VARCHAR NOT NULL,
            data_volume DOUBLE NOT NULL DEFAULT 0,
            data_unlimited BOOLEAN NOT NULL DEFAULT 0,
            minutes_volume INTEGER NOT NULL DEFAULT 0,
            minutes_unlimited BOOLEAN NOT NULL DEFAULT 0,
            overage_data_price VARCHAR NOT NULL DEFAULT '0',
            overage_minute_price VARCHAR NOT NULL DEFAULT '0',
            is_archived BOOLEAN NOT NULL DEFAULT 0,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL,
            FOREIGN KEY (operator_id) REFERENCES operators (id) ON DELETE CASCADE,
            UNIQUE(operator_id, name)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS monthly_consumption (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            profile VARCHAR NOT NULL,
            year INTEGER NOT NULL CHECK (year >= 2020),
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            actual_data_used DOUBLE NOT NULL,
            actual_minutes_used INTEGER NOT NULL,
            recorded_at BIGINT NOT NULL,
            UNIQUE(profile, year, month)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tariff_comparisons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            profile VARCHAR NOT NULL,
            tariff_plan_id INTEGER NOT NULL,
            calculated_monthly_cost VARCHAR NOT NULL,
            user_data_input DOUBLE NOT NULL,
            user_minutes_input INTEGER NOT NULL,
            is_recommended BOOLEAN NOT NULL DEFAULT 0,
            compared_at BIGINT NOT NULL,
            FOREIGN KEY (tariff_plan_id) REFERENCES tariff_plans (id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tariff_plans_operator ON tariff_plans(operator_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_comparisons_profile ON tariff_comparisons(profile, compared_at)",
        [],
    )?;

    Ok(())
}
