//! # fiscusd
//!
//! fiscus backend daemon — wires together all crates and starts the
//! HTTP/WebSocket server plus the indexing worker pool.

#![deny(unsafe_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use fiscus_chat::ChatPipeline;
use fiscus_embeddings::service::{HttpEmbeddingConfig, HttpEmbeddingService};
use fiscus_embeddings::EmbeddingIndexer;
use fiscus_llm::ollama::OllamaConfig;
use fiscus_llm::OllamaProvider;
use fiscus_server::{FiscusServer, ServerConfig};
use fiscus_settings::FiscusSettings;
use fiscus_store::connection::{new_file, ConnectionConfig, ConnectionPool};
use fiscus_tasks::{
    HandlerRegistry, IndexEntryJob, TaskQueue, WorkerPool, WorkerPoolConfig, INDEX_ENTRY_JOB,
};

/// fiscus backend server.
#[derive(Parser, Debug)]
#[command(name = "fiscusd", about = "fiscus backend server")]
struct Cli {
    /// Host to bind (overrides settings if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings if specified).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` database (overrides settings if specified).
    #[arg(long)]
    db_path: Option<String>,

    /// Log level when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn open_pool(settings: &FiscusSettings, override_path: Option<&str>) -> Result<ConnectionPool> {
    let path = override_path
        .map_or_else(|| settings.database.resolved_path(), ToString::to_string);
    ensure_parent_dir(&path)?;
    let pool = new_file(
        &path,
        &ConnectionConfig {
            pool_size: settings.database.pool_size,
            busy_timeout_ms: settings.database.busy_timeout_ms,
            ..ConnectionConfig::default()
        },
    )
    .with_context(|| format!("Failed to open database at {path}"))?;
    {
        let conn = pool.get().context("Failed to check out a connection")?;
        let _ = fiscus_store::migrations::run_migrations(&conn)
            .context("Failed to run migrations")?;
        let seeded = fiscus_store::CategoryRepository::seed_defaults(&conn)
            .context("Failed to seed default categories")?;
        if seeded > 0 {
            tracing::info!(seeded, "seeded default categories");
        }
    }
    tracing::info!(path, "database ready");
    Ok(pool)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    fiscus_logging::init_subscriber(&cli.log_level);

    let mut settings = fiscus_settings::load_settings().context("Failed to load settings")?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    let pool = open_pool(&settings, cli.db_path.as_deref())?;

    // Providers: explicitly constructed service objects, shared by Arc.
    let http = reqwest::Client::new();
    let embedding = Arc::new(HttpEmbeddingService::with_client(
        HttpEmbeddingConfig {
            base_url: settings.embedding.base_url.clone(),
            model: settings.embedding.model.clone(),
            dimensions: settings.embedding.dimensions,
            timeout: Duration::from_secs(settings.embedding.timeout_secs),
        },
        http.clone(),
    ));
    let generation = Arc::new(OllamaProvider::with_client(
        OllamaConfig {
            base_url: settings.generation.base_url.clone(),
            model: settings.generation.model.clone(),
            timeout: Duration::from_secs(settings.generation.timeout_secs),
        },
        http,
    ));

    // Out-of-band indexing: queue + worker pool.
    let queue = TaskQueue::new(pool.clone());
    let indexer = Arc::new(EmbeddingIndexer::new(pool.clone(), embedding.clone()));
    let mut registry = HandlerRegistry::new();
    registry.register(INDEX_ENTRY_JOB, Arc::new(IndexEntryJob::new(indexer)));
    let workers = WorkerPool::spawn(
        pool.clone(),
        &queue,
        Arc::new(registry),
        &WorkerPoolConfig {
            workers: settings.queue.workers,
            poll_interval: Duration::from_millis(settings.queue.poll_interval_ms),
            visibility_timeout_secs: settings.queue.visibility_timeout_secs,
        },
    );

    let pipeline = Arc::new(ChatPipeline::new(
        pool.clone(),
        generation,
        embedding,
        queue,
        settings.chat.top_k,
    ));

    let server = FiscusServer::new(
        ServerConfig::from_settings(&settings.server),
        pool,
        pipeline,
        &settings.auth.secret,
    );

    server
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("Server failed")?;

    workers.shutdown().await;
    tracing::info!("fiscusd stopped");
    Ok(())
}
