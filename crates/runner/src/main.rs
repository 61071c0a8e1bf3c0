use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tircache_core::{
    load_config, metrics, validate_config, Gc2Registry, ItisClient, NatureServeClient,
    PipelineRunner, ReferenceList, SanitizedConfig, SgcnAnnotator, TaxonomicGroupMap, TessClient,
    WormsClient,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TIRCACHE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        "Configuration loaded: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    // Registry store
    let registry = Arc::new(
        Gc2Registry::new(&config.registry).context("Failed to create registry client")?,
    );
    info!("Registry client initialized for {}", config.registry.table);

    // Name-search authorities
    let itis = Arc::new(
        ItisClient::new(config.itis.clone()).context("Failed to create ITIS client")?,
    );
    let worms = Arc::new(
        WormsClient::new(config.worms.clone()).context("Failed to create WoRMS client")?,
    );

    let mut runner = PipelineRunner::new(registry, itis, worms, config.pipeline.run_context())
        .with_encoding(config.pipeline.encoding);

    // Status authorities, when configured
    match &config.natureserve {
        Some(ns_config) => {
            let client = NatureServeClient::new(ns_config.clone())
                .context("Failed to create NatureServe client")?;
            runner = runner.with_natureserve(Arc::new(client));
        }
        None => warn!("No NatureServe access key configured; conservation step will be skipped"),
    }
    let tess =
        TessClient::new(config.tess.clone()).context("Failed to create TESS client")?;
    runner = runner.with_tess(Arc::new(tess));

    // SGCN reference data, when configured
    runner = runner.with_annotator(load_annotator(&config.sgcn)?);

    // Run the requested steps in order
    let summaries = runner.run_all(&config.pipeline.steps).await;
    for (step, summary) in &summaries {
        info!(
            "{}: processed={} written={} failures={}",
            step, summary.processed, summary.written, summary.failures
        );
    }

    println!("{}", metrics::dump());

    Ok(())
}

fn load_annotator(config: &tircache_core::SgcnConfig) -> Result<SgcnAnnotator> {
    let groups = match &config.taxonomic_group_mappings {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read group mappings from {:?}", path))?;
            TaxonomicGroupMap::from_csv(&text)
        }
        None => TaxonomicGroupMap::new(),
    };

    let swap2005 = match &config.swap2005_list {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read 2005 SWAP list from {:?}", path))?;
            ReferenceList::from_lines(&text)
        }
        None => ReferenceList::new(),
    };

    Ok(SgcnAnnotator::new(groups, swap2005))
}
