use crate::infra;
use baujobs::config::{AppConfig, ConfigError};
use baujobs::error::AppError;
use baujobs::maintenance;
use baujobs::store::mongo;
use baujobs::telemetry;
use chrono::Utc;
use serde_json::json;

fn prepare() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn print_report(task: &str, report: serde_json::Value) {
    println!("{}", json!({ "task": task, "report": report }));
}

pub(crate) async fn purge_expired() -> Result<(), AppError> {
    let config = prepare()?;
    let backends = infra::backends(&config).await?;
    let report = maintenance::purge_expired(&backends, Utc::now()).await?;
    print_report("purge-expired", json!(report));
    Ok(())
}

pub(crate) async fn normalize_categories() -> Result<(), AppError> {
    let config = prepare()?;
    let db = connect(&config).await?;
    let report = mongo::normalize_categories(&db).await?;
    print_report("normalize-categories", json!(report));
    Ok(())
}

pub(crate) async fn migrate_legacy_listings() -> Result<(), AppError> {
    let config = prepare()?;
    let db = connect(&config).await?;
    let report = mongo::migrate_legacy_listings(&db).await?;
    print_report("migrate-legacy-listings", json!(report));
    Ok(())
}

/// Category and collection rewrites only make sense against a real database.
async fn connect(config: &AppConfig) -> Result<mongo::Database, AppError> {
    let uri = config
        .database
        .uri
        .as_deref()
        .ok_or(ConfigError::MissingVar("MONGODB_URI"))?;
    Ok(mongo::connect(uri, &config.database.name).await?)
}
