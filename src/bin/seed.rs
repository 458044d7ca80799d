use clap::Parser;
use schoolbooks::config::{Cli, Config};
use schoolbooks::db::Database;
use schoolbooks::handler::today;
use schoolbooks::seed::seed;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    let (config_path, data_dir) = args.resolve_paths();

    tracing_subscriber::fmt().json().init();

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(error = %e, path = ?data_dir, "failed to create data directory");
        std::process::exit(1);
    }

    let cfg = Config::new(&config_path).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });
    let db = Database::new(&cfg, &data_dir).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    });

    match seed(&db, today()).await {
        Ok(stats) => {
            tracing::info!(
                created = stats.created,
                skipped = stats.skipped,
                failed = stats.failed,
                "demo data loaded"
            );
            if let Err(e) = db.sync().await {
                tracing::warn!(error = %e, "failed to push demo data to remote");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load demo data");
            std::process::exit(1);
        }
    }
}
