use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use shared_types::{OperatorCode, DEFAULT_OPERATOR_COLOR};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct IngestConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default = "default_operators")]
    pub operators: Vec<OperatorConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout_secs: 15,
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct IngestionConfig {
    /// Operators ingested more recently than this are skipped unless forced
    pub freshness_hours: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self { freshness_hours: 24 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Months of recorded consumption averaged for a profile
    pub history_months: u32,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self { history_months: 3 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OperatorConfig {
    pub code: OperatorCode,
    pub name: String,
    pub website: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_OPERATOR_COLOR.to_string()
}

fn default_operators() -> Vec<OperatorConfig> {
    let operator = |code, name: &str, website: &str, color: &str| OperatorConfig {
        code,
        name: name.to_string(),
        website: website.to_string(),
        color: color.to_string(),
    };

    vec![
        operator(
            OperatorCode::Mts,
            "МТС",
            "https://moskva.mts.ru/personal/mobilnaya-svyaz/tarifi/vse-tarifi/mobile-tv-inet",
            "#e30611",
        ),
        operator(
            OperatorCode::Megafon,
            "МегаФон",
            "https://moscow.megafon.ru/tariffs/all/",
            "#00b956",
        ),
        operator(
            OperatorCode::Beeline,
            "Билайн",
            "https://moskva.beeline.ru/customers/products/mobile/tariffs/",
            "#ffc800",
        ),
        operator(OperatorCode::T2, "Т2", "https://msk.t2.ru/tariffs", "#1f2229"),
    ]
}

impl IngestConfig {
    /// Load the config file, writing a default one first if it is missing.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            let default_config = toml::to_string_pretty(&IngestConfig::with_default_operators())
                .map_err(|e| ConfigError::Message(format!("Failed to render default config: {e}")))?;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
            tracing::info!("Wrote default config to {:?}", config_path);
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: IngestConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    pub fn with_default_operators() -> Self {
        Self {
            operators: default_operators(),
            ..Self::default()
        }
    }

    pub fn freshness_secs(&self) -> i64 {
        (self.ingestion.freshness_hours as i64).saturating_mul(3600)
    }

    /// Database location from config, else the per-user data directory.
    pub fn db_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => crate::helpers::database::get_db_path(),
        }
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("tariff-compare").join("ingest.toml")
    } else {
        PathBuf::from("ingest.toml")
    }
}
