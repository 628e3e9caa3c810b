use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::{CookieSigner, SecretHasher, SessionResolver, TokenIssuer};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, AuthService, GigService, Mailer, NotificationSink, SeaOrmAccountService,
    SeaOrmAuthService, SeaOrmGigService, sink_from_config,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub signer: CookieSigner,

    pub resolver: SessionResolver,

    pub auth_service: Arc<dyn AuthService>,

    pub gig_service: Arc<dyn GigService>,

    pub account_service: Arc<dyn AccountService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let sink = sink_from_config(&config.mail)?;
        Self::with_sink(config, sink).await
    }

    /// Builds the state with a caller-supplied mail sink, e.g. an in-memory
    /// outbox in tests.
    pub async fn with_sink(
        config: Config,
        sink: Arc<dyn NotificationSink>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let hasher = SecretHasher::new(&config.security)?;
        let issuer = TokenIssuer::new(hasher.clone());
        let signer = CookieSigner::new(&config.server.secret_key, config.server.secure_cookies)?;
        let resolver = SessionResolver::new(store.clone(), signer.clone(), issuer.clone());
        let mailer = Mailer::new(sink, &config.server.base_url);

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            hasher,
            issuer,
            mailer,
        )) as Arc<dyn AuthService>;

        let gig_service = Arc::new(SeaOrmGigService::new(store.clone())) as Arc<dyn GigService>;

        let account_service =
            Arc::new(SeaOrmAccountService::new(store.clone())) as Arc<dyn AccountService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            signer,
            resolver,
            auth_service,
            gig_service,
            account_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
