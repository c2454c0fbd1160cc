use anyhow::Context;
use clap::{Parser, Subcommand};
use extractors::AdapterRegistry;
use shared_types::{ComparisonRecord, ConsumptionRecord, Operator, TariffPlan, UsageExpectation};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use tariff_ingest::comparison::rank_plans;
use tariff_ingest::config::IngestConfig;
use tariff_ingest::database::{comparisons, consumption, operators, tariff_plans, Database};
use tariff_ingest::helpers::database::initialize_database;
use tariff_ingest::integrations::HttpFetcher;
use tariff_ingest::jobs::{IngestionManager, IngestionOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Mobile tariff ingestion and comparison", long_about = None)]
struct Args {
    #[arg(long, global = true)]
    log_file_path: Option<String>,

    /// Config file (default: <config dir>/tariff-compare/ingest.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides the config
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch operator tariffs and reconcile them into the store
    Ingest {
        /// Only operators whose name or code contains this text
        #[arg(long)]
        operator: Option<String>,
        /// Re-fetch even if the operator was ingested recently
        #[arg(long)]
        force: bool,
        /// Extract and count without persisting anything
        #[arg(long)]
        dry_run: bool,
        /// Delete existing plans of the selected operators first
        #[arg(long)]
        clear: bool,
    },
    /// Rank plans by monthly cost for a usage figure
    Compare {
        #[arg(long)]
        data_gb: Option<f64>,
        #[arg(long)]
        minutes: Option<i64>,
        #[arg(long)]
        operator: Option<String>,
        /// Use this profile's recorded consumption when usage is not given
        #[arg(long)]
        profile: Option<String>,
        /// Store the results as comparison records for the profile
        #[arg(long, requires = "profile")]
        record: bool,
        #[arg(long)]
        json: bool,
    },
    /// Monthly consumption records
    Consumption {
        #[command(subcommand)]
        action: ConsumptionAction,
    },
    /// List known operators
    Operators,
    /// List stored tariff plans
    Plans {
        #[arg(long)]
        operator: Option<String>,
        #[arg(long)]
        include_archived: bool,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConsumptionAction {
    Add {
        #[arg(long)]
        profile: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        data_gb: f64,
        #[arg(long)]
        minutes: u32,
    },
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("tariff-ingest.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn operators_matching(db: &Database, filter: Option<&str>) -> anyhow::Result<Vec<Operator>> {
    let conn = db.lock()?;
    Ok(operators::list_operators(&conn)?
        .into_iter()
        .filter(|operator| operator.matches_filter(filter.unwrap_or("")))
        .collect())
}

fn plans_matching(
    db: &Database,
    filter: Option<&str>,
    include_archived: bool,
) -> anyhow::Result<Vec<TariffPlan>> {
    let operator_ids: Vec<i64> = operators_matching(db, filter)?
        .iter()
        .map(|operator| operator.id)
        .collect();

    let conn = db.lock()?;
    Ok(tariff_plans::list_plans(&conn, include_archived)?
        .into_iter()
        .filter(|plan| operator_ids.contains(&plan.operator_id))
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path.as_deref());

    let (config, config_path) =
        IngestConfig::load(args.config.as_deref()).context("Failed to load config")?;
    tracing::debug!("Loaded config from {:?}", config_path);

    let db_path = match args.db_path {
        Some(path) => path,
        None => config.db_path()?,
    };
    let db = initialize_database(&db_path)
        .with_context(|| format!("Failed to open database at {:?}", db_path))?;

    match args.command {
        Command::Ingest {
            operator,
            force,
            dry_run,
            clear,
        } => {
            let fetcher = HttpFetcher::new(&config.http)?;
            let manager = IngestionManager::new(
                db.clone(),
                AdapterRegistry::with_defaults(),
                Arc::new(fetcher),
                config.freshness_secs(),
            );
            manager.sync_operators(&config.operators)?;

            let options = IngestionOptions {
                operator_filter: operator,
                force,
                dry_run,
                clear,
            };
            let summary = manager.run(&options).await?;

            if summary.cleared > 0 {
                println!("Cleared {} existing plans", summary.cleared);
            }
            for report in &summary.reports {
                println!("{}", report.status_line());
            }
            if dry_run {
                println!("Dry run: {} plans would be saved, nothing written", summary.total_saved());
            } else {
                println!(
                    "Total: {} plans saved, {} operators failed",
                    summary.total_saved(),
                    summary.failed()
                );
            }
        }
        Command::Compare {
            data_gb,
            minutes,
            operator,
            profile,
            record,
            json,
        } => {
            let baseline = match (&profile, data_gb, minutes) {
                (Some(profile), None, _) | (Some(profile), _, None) => {
                    let conn = db.lock()?;
                    consumption::average_usage(&conn, profile, config.comparison.history_months)?
                        .unwrap_or_else(|| {
                            tracing::warn!("No consumption recorded for {}, using defaults", profile);
                            UsageExpectation::default()
                        })
                }
                _ => UsageExpectation::default(),
            };
            let data_gb = data_gb.unwrap_or(baseline.data_gb);
            let minutes = minutes.unwrap_or(baseline.minutes as i64);

            let plans = plans_matching(&db, operator.as_deref(), false)?;
            let ranked = rank_plans(&plans, data_gb, minutes);

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else if ranked.is_empty() {
                println!("No plans stored yet, run `tariff-ingest ingest` first");
            } else {
                println!("Usage: {:.2} GB, {} minutes", data_gb, minutes);
                for cost in &ranked {
                    println!(
                        "{} {:>10} ₽  {} / {}",
                        if cost.is_recommended { "*" } else { " " },
                        cost.total_cost,
                        cost.plan.operator_name,
                        cost.plan.name
                    );
                }
            }

            if let (true, Some(profile)) = (record, profile) {
                let now = chrono::Utc::now().timestamp();
                let conn = db.lock()?;
                for cost in &ranked {
                    comparisons::insert_comparison(
                        &conn,
                        &ComparisonRecord {
                            id: 0,
                            profile: profile.clone(),
                            tariff_plan_id: cost.plan.id,
                            calculated_monthly_cost: cost.total_cost,
                            user_data_input: data_gb,
                            user_minutes_input: minutes.max(0) as u32,
                            is_recommended: cost.is_recommended,
                            compared_at: now,
                        },
                    )?;
                }
                tracing::info!("Recorded {} comparisons for {}", ranked.len(), profile);
            }
        }
        Command::Consumption {
            action:
                ConsumptionAction::Add {
                    profile,
                    year,
                    month,
                    data_gb,
                    minutes,
                },
        } => {
            let record = ConsumptionRecord {
                id: 0,
                profile,
                year,
                month,
                actual_data_used: data_gb,
                actual_minutes_used: minutes,
                recorded_at: 0,
            };
            let conn = db.lock()?;
            consumption::upsert_consumption(&conn, &record)?;
            println!(
                "Recorded {:04}-{:02} for {}: {} GB, {} minutes",
                year, month, record.profile, data_gb, minutes
            );
        }
        Command::Operators => {
            for operator in operators_matching(&db, None)? {
                let last = operator
                    .last_ingested_at
                    .and_then(|at| chrono::DateTime::from_timestamp(at, 0))
                    .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:<8} {:<10} {}  {}  last ingested: {}",
                    operator.code.as_str(), operator.name, operator.color, operator.website, last
                );
            }
        }
        Command::Plans {
            operator,
            include_archived,
            json,
        } => {
            let plans = plans_matching(&db, operator.as_deref(), include_archived)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plans)?);
            } else {
                for plan in &plans {
                    println!(
                        "{:<10} {:<30} {:>10} ₽  data: {}  minutes: {}{}",
                        plan.operator_name,
                        plan.name,
                        plan.monthly_fee,
                        plan.data_volume,
                        plan.minutes_volume,
                        if plan.is_archived { "  (archived)" } else { "" }
                    );
                }
                println!("{} plans", plans.len());
            }
        }
    }

    Ok(())
}
