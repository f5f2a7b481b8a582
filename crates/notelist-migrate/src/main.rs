//! Bootstraps the notelist schema and exits.
//!
//! Opening the database applies every pending migration, so this binary is
//! what deployments run before starting anything that serves requests.
//!
//! Environment variables:
//!   DATABASE_URL and DATABASE_* pool settings, see `notelist_db::config`
//!   LOG_FORMAT  - "json" or "text" (default: "text")
//!   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
//!   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
//!   RUST_LOG    - standard env filter (default: "notelist_migrate=info,notelist_db=info")

use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notelist_db::{applied_migrations, Database, DatabaseConfig};

const DEFAULT_FILTER: &str = "notelist_migrate=info,notelist_db=info";

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    json: bool,
    file: Option<String>,
    ansi: Option<bool>,
}

impl LogSettings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            json: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            file: lookup("LOG_FILE").filter(|v| !v.is_empty()),
            ansi: lookup("LOG_ANSI").map(|v| v == "true" || v == "1"),
        }
    }
}

/// Install the global subscriber. The returned guard flushes file output on drop.
fn init_logging(settings: &LogSettings) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = settings.file {
        let path = Path::new(path);
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("notelist-migrate.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if settings.json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            // no ANSI in files unless asked for
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(settings.ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if settings.json {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = settings.ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = LogSettings::from_lookup(|key| std::env::var(key).ok());
    let _file_guard = init_logging(&settings);

    info!(
        log_format = if settings.json { "json" } else { "text" },
        log_file = settings.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = DatabaseConfig::from_env()?;

    info!("Connecting to database and applying migrations...");
    let db = Database::open_with_config(&config).await?;

    let applied = applied_migrations(db.pool()).await;
    db.close().await;

    for migration in applied? {
        info!(
            migration = %migration.name,
            applied_at = %migration.applied_at,
            "Migration recorded"
        );
    }

    info!("Schema is up to date");
    Ok(())
}
