//! Postgres pool for the video metadata store

use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tubely_core::Config;

const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

fn pool_options(config: &Config) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
}

/// Workspace `migrations/`, resolved from this crate's manifest.
fn migrations_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations")
}

async fn load_migrator() -> Result<Migrator> {
    let dir = migrations_dir();
    Migrator::new(dir.clone())
        .await
        .with_context(|| format!("Failed to load migrations from {}", dir.display()))
}

/// Bring the `videos` schema up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrator = load_migrator().await?;
    let known = migrator.iter().count();
    let latest = migrator.iter().map(|m| m.version).max();

    migrator
        .run(pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!(
        migrations = known,
        latest_version = ?latest,
        "Video schema up to date"
    );
    Ok(())
}

/// Connect to the metadata database and apply pending migrations.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    tracing::info!(
        max_connections = config.db_max_connections(),
        acquire_timeout_secs = config.db_timeout_seconds(),
        "Connecting to video metadata database"
    );
    let pool = pool_options(config)
        .connect(config.database_url())
        .await
        .context("Failed to connect to database")?;

    run_migrations(&pool).await?;

    tracing::info!(
        pool_size = pool.size(),
        idle_connections = pool.num_idle(),
        "Video metadata database ready"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_core::{ServerConfig, StorageBackend, TubelyConfig, UploadConfig};

    #[tokio::test]
    async fn test_videos_migration_is_bundled() {
        let migrator = load_migrator().await.unwrap();
        let descriptions: Vec<String> =
            migrator.iter().map(|m| m.description.to_string()).collect();
        assert!(
            descriptions.iter().any(|d| d.contains("videos")),
            "migrations: {:?}",
            descriptions
        );
    }

    fn config(max_connections: u32, timeout_secs: u64) -> Config {
        Config(Box::new(TubelyConfig {
            base: ServerConfig {
                server_port: 3000,
                cors_origins: vec!["*".to_string()],
                db_max_connections: max_connections,
                db_timeout_seconds: timeout_secs,
                jwt_secret: "unused".to_string(),
                environment: "test".to_string(),
            },
            database_url: "postgres://localhost/tubely".to_string(),
            storage_backend: Some(StorageBackend::Local),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: None,
            local_storage_base_url: None,
            local_storage_signing_key: None,
            upload: UploadConfig::default(),
        }))
    }

    #[test]
    fn test_pool_options_follow_config() {
        let options = pool_options(&config(7, 12));
        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(12));
        assert_eq!(options.get_idle_timeout(), Some(IDLE_TIMEOUT));
        assert_eq!(options.get_max_lifetime(), Some(MAX_LIFETIME));
    }
}
