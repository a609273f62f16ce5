use anyhow::{anyhow, Context, Result};
use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;

pub const MEMORY_DSN: &str = "sqlite::memory:";

const DEFAULT_MAX_CONNS: u32 = 10;
const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;

/// Connect to the configured database and return a SeaORM handle.
///
/// Relative SQLite paths are resolved against `base_dir`. In-memory databases
/// are pinned to a single long-lived connection, otherwise every pooled
/// connection would see its own empty database. File databases run in WAL
/// mode so readers never block the writer.
pub async fn connect(cfg: &DatabaseConfig, base_dir: &Path) -> Result<DatabaseConnection> {
    let dsn = cfg.url.trim();
    if dsn.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    detect_backend(dsn)?;

    let memory = is_memory_dsn(dsn);
    let final_dsn = if memory {
        MEMORY_DSN.to_string()
    } else {
        absolutize_sqlite_dsn(dsn, base_dir, true)?
    };

    let busy_timeout =
        Duration::from_millis(u64::from(cfg.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS)));
    let mut connect_opts = SqliteConnectOptions::from_str(&final_dsn)
        .with_context(|| format!("invalid SQLite DSN '{final_dsn}'"))?
        .create_if_missing(true)
        .busy_timeout(busy_timeout);
    if !memory {
        connect_opts = connect_opts
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let pool_opts = if memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(cfg.max_conns.unwrap_or(DEFAULT_MAX_CONNS))
            .acquire_timeout(Duration::from_secs(5))
    };

    tracing::info!(dsn = %final_dsn, "Connecting to database");
    let pool = pool_opts
        .connect_with(connect_opts)
        .await
        .with_context(|| format!("failed to connect to {final_dsn}"))?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// Only SQLite is wired; anything else is a configuration error.
fn detect_backend(dsn: &str) -> Result<()> {
    if is_memory_dsn(dsn) {
        return Ok(());
    }
    let url = url::Url::parse(dsn).map_err(|e| anyhow!("Invalid database DSN '{}': {}", dsn, e))?;
    match url.scheme() {
        "sqlite" | "sqlite3" => Ok(()),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

fn is_memory_dsn(dsn: &str) -> bool {
    dsn.eq_ignore_ascii_case(MEMORY_DSN)
        || dsn.eq_ignore_ascii_case("sqlite://:memory:")
        || dsn.contains("mode=memory")
}

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    let db_path = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite3://"))
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }
    if create_dirs {
        if let Some(dir) = p.parent() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnectionTrait;
    use tempfile::tempdir;

    #[test]
    fn relative_path_is_joined_onto_base_dir() {
        let tmp = tempdir().unwrap();
        let dsn = absolutize_sqlite_dsn("sqlite://data/blog.db?mode=rwc", tmp.path(), true).unwrap();
        assert!(dsn.starts_with("sqlite://"));
        assert!(dsn.ends_with("data/blog.db?mode=rwc"));
        assert!(tmp.path().join("data").is_dir());
    }

    #[test]
    fn empty_path_is_rejected() {
        let tmp = tempdir().unwrap();
        assert!(absolutize_sqlite_dsn("sqlite://", tmp.path(), false).is_err());
    }

    #[test]
    fn memory_variants_are_detected() {
        assert!(is_memory_dsn("sqlite::memory:"));
        assert!(is_memory_dsn("sqlite://:memory:"));
        assert!(is_memory_dsn("sqlite://x.db?mode=memory"));
        assert!(!is_memory_dsn("sqlite://x.db"));
    }

    #[test]
    fn non_sqlite_backends_are_rejected() {
        assert!(detect_backend("postgres://u:p@localhost/db").is_err());
        assert!(detect_backend("sqlite://blog.db").is_ok());
    }

    #[tokio::test]
    async fn connects_to_file_database() {
        let tmp = tempdir().unwrap();
        let cfg = DatabaseConfig {
            url: "sqlite://db/blog.db".to_string(),
            max_conns: Some(2),
            busy_timeout_ms: Some(1000),
        };
        let conn = connect(&cfg, tmp.path()).await.unwrap();
        conn.execute_unprepared("CREATE TABLE smoke (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();
        assert!(tmp.path().join("db/blog.db").exists());
    }

    #[tokio::test]
    async fn file_database_uses_wal() {
        let tmp = tempdir().unwrap();
        let cfg = DatabaseConfig {
            url: "sqlite://wal.db".to_string(),
            max_conns: Some(2),
            busy_timeout_ms: None,
        };
        let conn = connect(&cfg, tmp.path()).await.unwrap();
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(conn.get_sqlite_connection_pool())
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
