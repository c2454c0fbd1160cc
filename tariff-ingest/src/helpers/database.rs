use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::database::Database;

/// Returns the path to the tariff database based on the operating system
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/tariff-compare/db.sqlite`
/// - **Linux**: `~/.local/share/tariff-compare/db.sqlite`
/// - **Windows**: `%LOCALAPPDATA%\tariff-compare\db.sqlite`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("tariff-compare").join("db.sqlite"))
}

/// Open the database at `db_path`, creating it and its schema when missing
pub fn initialize_database(db_path: &Path) -> anyhow::Result<Arc<Database>> {
    tracing::debug!("Opening database at {:?}", db_path);
    let db = Database::new(db_path)?;
    Ok(Arc::new(db))
}
