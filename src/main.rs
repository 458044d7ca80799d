use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use schoolbooks::app;
use schoolbooks::config::{Cli, Config};
use schoolbooks::db::Database;
use schoolbooks::handler::AppState;
use schoolbooks::report::run_overdue_report;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    let (config_path, data_dir) = args.resolve_paths();

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("schoolbooks.svc starting");

    let cfg = Config::new(&config_path).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });
    let db = Arc::new(Database::new(&cfg, &data_dir).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    }));

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let cancellation_token = CancellationToken::new();
    let mut background = Vec::new();

    if cfg.app.overdue_report_interval_seconds > 0 {
        background.push(tokio::spawn(run_overdue_report(
            db.clone(),
            Duration::from_secs(cfg.app.overdue_report_interval_seconds),
            cancellation_token.clone(),
        )));
    }

    let app = app(AppState::new(db, cfg.app.loan_period_days));

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("schoolbooks.svc running on {}", &address);
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                tracing::error!(error = %err, "server stopped unexpectedly");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
            cancellation_token.cancel();
        }
    }

    for task in background {
        let _ = task.await;
    }
    tracing::info!("schoolbooks.svc going off, graceful shutdown complete");
}
