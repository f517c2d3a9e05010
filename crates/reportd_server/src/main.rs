//! Report server entrypoint.

use chrono::Utc;
use reportd_core::config::env_flag_enabled;
use reportd_core::{EvictionPolicy, DEFAULT_PORT};
use reportd_server::{config::Config, db::Database, serve_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    sweep: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            "--sweep" => flags.sweep = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reportd=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let database = Database::open(&config.reports_dir)?;

    if cli_flags.sweep {
        run_sweep(&config, &database)?;
        return Ok(());
    }

    let state = AppState::new(config.clone(), database);

    let allow_public = env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    let bind_addr = reportd_server::resolve_bind_address(&config, allow_public);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("reportd running at http://{}", actual_addr);
    tracing::info!("Reports stored in {}", config.reports_dir);

    let scheduler = state.cleanup.clone();
    scheduler.start()?;

    let serve_result = serve_router(listener, state, allow_public, shutdown_signal()).await;

    if let Err(err) = scheduler.stop() {
        tracing::error!("Failed to stop cleanup job: {}", err);
    }
    tracing::info!("Server stopped");

    serve_result?;

    Ok(())
}

fn run_sweep(config: &Config, database: &Database) -> anyhow::Result<()> {
    let policy = EvictionPolicy::from_config(&config.cleanup);
    let summary = database.sweep_expired(&policy, Utc::now())?;
    println!(
        "Checked {} report(s): deleted {}, failed {}, remaining {}",
        summary.checked, summary.deleted, summary.failed, summary.remaining
    );
    if summary.failed > 0 {
        anyhow::bail!("{} report(s) could not be deleted", summary.failed);
    }
    Ok(())
}

fn print_help() {
    println!("reportd - HTML report server\n");
    println!("Usage: reportd [OPTIONS]\n");
    println!("Options:");
    println!("  --sweep           Run one eviction pass over the reports directory and exit");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  REPORTS_DIR       Report storage directory (default: ./reports)");
    println!("  PORT              Server port (default: {})", DEFAULT_PORT);
    println!("  PUBLIC_URL        Base URL used in serve_url (default: http://localhost:PORT)");
    println!("  MAX_REPORT_SIZE   Maximum request body size in bytes (default: 64MB)");
    println!("  CLEANUP_ENABLED   Enable scheduled eviction (default: true)");
    println!("  CLEANUP_INTERVAL  Scan interval in ms (default: 30 minutes)");
    println!("  MAX_IDLE_TIME     Evict reports not read for this many ms (default: 24 hours)");
    println!("  MAX_AGE           Evict reports older than this many ms (default: 7 days)");
    println!("  CLEANUP_STARTUP_DELAY  Delay before the first scan in ms (default: 5000)");
    println!("  ALLOW_PUBLIC_ACCESS  Allow CORS from any origin and non-loopback binds");
    println!(
        "  BIND              Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down");
}
