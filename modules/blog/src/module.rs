use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::config::BlogConfig;
use crate::contract::client::BlogApi;
use crate::contract::model::UserAccount;
use crate::domain::repo::{BlogRepository, BlogStore};
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::BlogLocalClient;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmBlogRepository;

/// Wiring for the blog core: repository, domain service and local client.
#[derive(Clone)]
pub struct BlogModule {
    repo: Arc<dyn BlogRepository>,
    api: Arc<dyn BlogApi>,
}

impl BlogModule {
    /// Key of this module's section under `modules:` in the app config.
    pub const NAME: &'static str = "blog";

    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running blog database migrations");
        Migrator::up(db, None).await?;
        info!("Blog database migrations completed successfully");
        Ok(())
    }

    /// Wire repository (infra) to domain service (port).
    pub fn new(db: DatabaseConnection, cfg: &BlogConfig) -> Self {
        debug!(
            "Loaded blog config: default_page_size={}, max_page_size={}, provision_profiles={}",
            cfg.default_page_size, cfg.max_page_size, cfg.provision_profiles
        );
        let repo: Arc<dyn BlogRepository> = Arc::new(SeaOrmBlogRepository::new(db));
        let service_config = ServiceConfig {
            max_page_size: cfg.max_page_size,
            provision_profiles: cfg.provision_profiles,
        };
        let service = Arc::new(Service::new(Arc::clone(&repo), service_config));
        let api: Arc<dyn BlogApi> = Arc::new(BlogLocalClient::new(service));
        Self { repo, api }
    }

    /// Migrate, then wire.
    pub async fn init(db: DatabaseConnection, cfg: &BlogConfig) -> anyhow::Result<Self> {
        info!("Initializing blog module");
        Self::migrate(&db).await?;
        Ok(Self::new(db, cfg))
    }

    pub fn client(&self) -> Arc<dyn BlogApi> {
        Arc::clone(&self.api)
    }

    /// Register or refresh an identity record on behalf of the identity system.
    pub async fn register_account(&self, account: UserAccount) -> anyhow::Result<()> {
        info!(user_id = %account.id, auth = %account.auth, "Registering account");
        self.repo.upsert_account(account).await
    }
}
