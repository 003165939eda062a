use gridwatch::api::{run_server, AppState};
use gridwatch::config::AppConfig;
use gridwatch::pipeline::ingest::LogIngestor;
use gridwatch::pipeline::MetricsPipeline;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Setup Logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting GridWatch...");

    // Load Configuration
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("⚠️ {} - falling back to defaults (stdin source)", e);
            AppConfig::default()
        }
    };
    info!("Loaded Configuration: {:?}", config);

    // One pipeline instance owns all mutable aggregate state; its lifecycle
    // is the process lifecycle.
    let pipeline = MetricsPipeline::new(&config);
    let query = pipeline.query_engine();
    let stats = pipeline.stats();

    // Start the single-writer ingestion path.
    let ingestor = LogIngestor::new(pipeline, config.source.clone());
    tokio::spawn(async move {
        match ingestor.run().await {
            Ok(()) => info!("Ingestion finished"),
            // Resource exhaustion surfaces here; supervision (systemd, the
            // host process) decides what to do with a dead ingest path.
            Err(e) => error!("Ingestion stopped: {}", e),
        }
    });

    // Start Query API Server
    info!(
        "Query API shaped for {}s dashboard polling over a {}s default range",
        config.server.poll_interval_secs, config.server.default_range_secs
    );
    let state = Arc::new(AppState {
        query,
        stats,
        server: config.server.clone(),
    });
    run_server(state, &config.server.bind_addr).await;

    Ok(())
}
