use anyhow::Context;
use clap::Parser;
use shortline_cache::BloomFilter;
use shortline_gateway::cli::{LogFormatArg, CLI};
use shortline_gateway::{App, AppState};
use shortline_shortener::{ShortenerService, WritePipeline};
use shortline_snowflake::Snowflake;
use shortline_storage::InMemoryRepository;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;
    init_tracing(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        public_base_url = %config.public_base_url,
        instance_id = config.instance_id,
        queue_capacity = config.queue_capacity,
        workers = config.workers,
        request_timeout_ms = config.request_timeout_ms,
        "starting shortline gateway"
    );

    let repository = Arc::new(InMemoryRepository::new());
    let filter = Arc::new(
        BloomFilter::new(config.bloom_filter_config()).context("failed to size bloom filter")?,
    );
    let generator = Snowflake::new(config.snowflake_settings())
        .context("failed to initialize snowflake generator")?;
    let pipeline = WritePipeline::spawn(
        config.pipeline_config(),
        Arc::clone(&repository),
        Arc::clone(&filter),
    )
    .context("failed to start write pipeline")?;

    let service = ShortenerService::new(
        repository,
        generator,
        filter,
        Arc::new(pipeline),
        config.shortener_config(),
    )
    .context("invalid shortener configuration")?;

    let state = AppState::new(Arc::new(service.clone()), config.public_base_url.clone())
        .with_request_timeout(config.request_timeout());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    let served = axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // in-flight requests are done; flush whatever they queued
    service.shutdown().await;

    if let Err(e) = served {
        error!(error = %e, "gateway server error");
        return Err(e.into());
    }

    info!("gateway shut down");
    Ok(())
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match format {
        LogFormatArg::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormatArg::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received SIGTERM"),
    }

    info!("shutdown signal received, draining requests");
}
