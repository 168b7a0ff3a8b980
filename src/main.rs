use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use site_analyst::api::{AppState, api_routes};
use site_analyst::config::AppConfig;
use site_analyst::llm::create_collaborators;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_tracing(&config);

    eprintln!("🏗  Site Analyst v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   History: {}", config.history_path.display());
    eprintln!(
        "   Template: {} ({:?})",
        config.template_path.display(),
        config.merge_mode
    );
    eprintln!(
        "   Vision: {}",
        if config.openai.api_key.is_some() {
            config.openai.vision_model.as_str()
        } else {
            "stub (OPENAI_API_KEY not set)"
        }
    );
    eprintln!(
        "   Realtime: {}",
        match (&config.realtime.model, &config.realtime.voice) {
            (Some(model), Some(voice)) => format!("{model} / {voice}"),
            _ => "not configured".to_string(),
        }
    );
    eprintln!("   External access via http://localhost:{}\n", config.host_port);

    let collaborators = create_collaborators(&config)?;
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let app = api_routes(AppState::new(config, collaborators));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "site-analyst.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
