//! Reprocessing engine service entry point.
//!
//! Loads configuration, initializes tracing, connects to PostgreSQL, applies
//! migrations and wires the cycle engine to the database adapters.

use std::sync::Arc;

use tracing::info;

use reprocessing_engine::adapters::{
    PostgresAuditSink, PostgresCycleRepository, PostgresItemGateway, PostgresPhaseRepository,
    TracingDurationRecorder,
};
use reprocessing_engine::config::AppConfig;
use reprocessing_engine::telemetry::init_tracing;
use reprocessing_engine::{CycleEngine, EnginePorts};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_validated()?;
    init_tracing(&config.logging)?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Migrations applied");
    }

    let engine = CycleEngine::new(
        EnginePorts {
            cycles: Arc::new(PostgresCycleRepository::new(pool.clone())),
            phases: Arc::new(PostgresPhaseRepository::new(pool.clone())),
            items: Arc::new(PostgresItemGateway::new(pool.clone())),
            audit: Arc::new(PostgresAuditSink::new(pool.clone())),
            durations: Arc::new(TracingDurationRecorder::default()),
        },
        &config.engine,
    );

    info!(
        enforce_phase_order = config.engine.enforce_phase_order,
        early_exit_priority = config.engine.early_exit_priority,
        retry_attempts = config.retry.max_attempts,
        "Reprocessing engine ready"
    );

    // Keep the pool and engine alive until the process is asked to stop.
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    drop(engine);
    pool.close().await;
    Ok(())
}
