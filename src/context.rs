/// Application context and dependency injection
use crate::{
    account::AccountManager,
    bookmarks::BookmarkManager,
    config::ServerConfig,
    db,
    directory::ContractorDirectory,
    engagement::EngagementManager,
    error::ApiResult,
    identity::{GoogleVerifier, IdentityVerifier},
    image_store::{DiskImageBackend, ImageStore},
    notices::NoticeManager,
    posts::PostManager,
    tokens::TokenIssuer,
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub tokens: TokenIssuer,
    pub accounts: Arc<AccountManager>,
    pub directory: Arc<ContractorDirectory>,
    pub bookmarks: Arc<BookmarkManager>,
    pub posts: Arc<PostManager>,
    pub engagement: Arc<EngagementManager>,
    pub notices: Arc<NoticeManager>,
    pub images: ImageStore,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let images = ImageStore::new(
            Arc::new(DiskImageBackend::new(config.storage.image_directory.clone())),
            &config.storage,
            &config.service,
        );
        let identity: Arc<dyn IdentityVerifier> = Arc::new(GoogleVerifier::new(&config.identity));

        Ok(Self::from_parts(config, pool, identity, images))
    }

    /// Assemble a context from already-built parts
    ///
    /// Also used by integration tests to run against an in-memory database
    /// and a substitute identity verifier.
    pub fn from_parts(
        config: ServerConfig,
        pool: sqlx::SqlitePool,
        identity: Arc<dyn IdentityVerifier>,
        images: ImageStore,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.authentication);
        Self {
            tokens: tokens.clone(),
            accounts: Arc::new(AccountManager::new(pool.clone(), tokens)),
            directory: Arc::new(ContractorDirectory::new(pool.clone())),
            bookmarks: Arc::new(BookmarkManager::new(pool.clone())),
            posts: Arc::new(PostManager::new(pool.clone())),
            engagement: Arc::new(EngagementManager::new(pool.clone())),
            notices: Arc::new(NoticeManager::new(pool)),
            images,
            identity,
            config: Arc::new(config),
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> ApiResult<()> {
        for dir in [&config.storage.data_directory, &config.storage.image_directory] {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
