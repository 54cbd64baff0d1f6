use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use uuid::Uuid;

use flourcraft_funnel::analytics::{Analytics, LogAnalytics, MeasurementProtocolAnalytics};
use flourcraft_funnel::channels::TerminalSession;
use flourcraft_funnel::channels::cli;
use flourcraft_funnel::checkout::{BrowserCheckout, LogCheckout};
use flourcraft_funnel::config::{FunnelConfig, RunMode};
use flourcraft_funnel::funnel::routes::funnel_routes;
use flourcraft_funnel::funnel::sessions::{self, SessionStore};
use flourcraft_funnel::funnel::{FunnelDeps, FunnelFlow};
use flourcraft_funnel::media::{HttpMediaProbe, MediaResolver};

/// Timeout for each image reachability probe.
const MEDIA_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FunnelConfig::from_env().context("Invalid configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(config.log_dir.as_deref());

    eprintln!("🥖 FlourCraft Funnel v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Offer: {} {} -> {}",
        config.offer.price, config.offer.currency, config.offer.checkout_url
    );

    let analytics: Arc<dyn Analytics> = match config.analytics.clone() {
        Some(measurement) => {
            eprintln!("   Analytics: GA4 ({})", measurement.measurement_id);
            MeasurementProtocolAnalytics::spawn(measurement)
        }
        None => {
            eprintln!("   Analytics: log only");
            Arc::new(LogAnalytics)
        }
    };

    match config.mode {
        RunMode::Serve => serve(&config, analytics).await,
        RunMode::Cli => run_terminal(&config, analytics).await,
    }
}

fn init_tracing(log_dir: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "flourcraft-funnel.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

async fn serve(config: &FunnelConfig, analytics: Arc<dyn Analytics>) -> anyhow::Result<()> {
    let deps = FunnelDeps::new(analytics, Arc::new(LogCheckout)).with_offer(config.offer.clone());
    let store = SessionStore::new(deps, config.session_idle_timeout);

    // Prune idle sessions (runs every 60s)
    let _expiry_handle = sessions::spawn_expiry_task(Arc::clone(&store));

    let media = config
        .probe_media
        .then(|| MediaResolver::new(Arc::new(HttpMediaProbe::new(MEDIA_PROBE_TIMEOUT))));

    eprintln!("   API: http://0.0.0.0:{}/api/funnel/sessions", config.port);
    eprintln!(
        "   Countdown WS: ws://0.0.0.0:{}/api/funnel/sessions/{{id}}/countdown/ws",
        config.port
    );
    eprintln!(
        "   Media probe: {}\n",
        if media.is_some() { "on" } else { "off" }
    );

    let app = funnel_routes(store, media);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Funnel server started");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_terminal(config: &FunnelConfig, analytics: Arc<dyn Analytics>) -> anyhow::Result<()> {
    eprintln!("   Pick with a number, type text, press Enter to continue, `buy` on the offer. /quit to exit.\n");

    let deps = FunnelDeps::new(analytics, Arc::new(BrowserCheckout::default())).with_offer(config.offer.clone());
    let session = TerminalSession::new(FunnelFlow::start(deps, Uuid::new_v4()));

    cli::run(session, cli::stdin_lines(), tokio::io::stdout()).await?;
    Ok(())
}
