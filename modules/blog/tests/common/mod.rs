//! Shared fixture: a fresh in-memory SQLite database per test, migrated with
//! the real `Migrator` and seeded with a few identity records.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use blog::config::BlogConfig;
use blog::contract::client::BlogApi;
use blog::contract::model::{NewProject, Project, UserAccount};
use blog::infra::storage::SeaOrmBlogRepository;
use blog::BlogModule;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const CAROL: &str = "carol";
pub const DAVE: &str = "dave";
/// Exists, but is not a standard account.
pub const GUEST: &str = "guest";
/// Not registered at all.
pub const NOBODY: &str = "nobody";

pub struct Fixture {
    pub db: DatabaseConnection,
    pub module: BlogModule,
    pub api: Arc<dyn BlogApi>,
}

impl Fixture {
    /// Direct access to storage, bypassing the service.
    pub fn repo(&self) -> SeaOrmBlogRepository {
        SeaOrmBlogRepository::new(self.db.clone())
    }

    pub async fn project(&self, owner: &str, name: &str) -> Project {
        self.api
            .create_project(
                owner,
                NewProject {
                    name: name.to_string(),
                    display_name: format!("{name} display"),
                    description: format!("about {name}"),
                },
            )
            .await
            .expect("create project")
    }
}

/// Single pinned connection: every handle must see the same in-memory database.
pub async fn memory_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    opts.max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);
    Database::connect(opts)
        .await
        .expect("Failed to connect to test database")
}

pub async fn setup() -> Fixture {
    setup_with(BlogConfig::default()).await
}

/// A database file under `dir`, opened the way the app opens it: WAL mode and
/// a pool of several connections.
pub async fn file_db(dir: &Path, max_conns: u32) -> DatabaseConnection {
    let cfg = runtime::DatabaseConfig {
        url: "sqlite://blog.db".to_string(),
        max_conns: Some(max_conns),
        busy_timeout_ms: Some(10_000),
    };
    runtime::db::connect(&cfg, dir)
        .await
        .expect("Failed to open file database")
}

pub async fn setup_with(cfg: BlogConfig) -> Fixture {
    seed(memory_db().await, cfg).await
}

pub async fn setup_file(dir: &Path, cfg: BlogConfig) -> Fixture {
    seed(file_db(dir, 8).await, cfg).await
}

async fn seed(db: DatabaseConnection, cfg: BlogConfig) -> Fixture {
    let module = BlogModule::init(db.clone(), &cfg)
        .await
        .expect("Failed to run migrations");

    for (id, auth) in [
        (ALICE, "default"),
        (BOB, "default"),
        (CAROL, "default"),
        (DAVE, "default"),
        (GUEST, "guest"),
    ] {
        module
            .register_account(UserAccount {
                id: id.to_string(),
                name: id.to_uppercase(),
                auth: auth.to_string(),
            })
            .await
            .expect("seed account");
    }

    let api = module.client();
    Fixture { db, module, api }
}
