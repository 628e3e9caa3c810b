use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::auth::{TokenPurpose, TokenRecord};
use crate::models::{Gig, GigInput, Role, User};

pub mod migrator;
pub mod repositories;

pub use repositories::user::NewUser;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        let in_memory = path_str.starts_with(":memory:");

        if !in_memory {
            if let Some(parent) = Path::new(path_str).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file {path_str}"))?;
            }
        }

        // Every pooled connection to `:memory:` would be its own database.
        let max_connections = if in_memory { 1 } else { max_connections };
        let min_connections = min_connections.min(max_connections);

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn gig_repo(&self) -> repositories::gig::GigRepository {
        repositories::gig::GigRepository::new(self.conn.clone())
    }

    fn remember_repo(&self) -> repositories::remember::RememberRepository {
        repositories::remember::RememberRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        self.user_repo().get_credentials_by_email(email).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>> {
        self.user_repo().list_by_role(role).await
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.user_repo().create(new_user).await
    }

    pub async fn user_token(&self, user_id: i32, purpose: TokenPurpose) -> Result<TokenRecord> {
        self.user_repo().token_record(user_id, purpose).await
    }

    pub async fn set_user_token(
        &self,
        user_id: i32,
        purpose: TokenPurpose,
        record: &TokenRecord,
    ) -> Result<()> {
        self.user_repo().set_token(user_id, purpose, record).await
    }

    pub async fn activate_user(&self, user_id: i32) -> Result<()> {
        self.user_repo().activate(user_id).await
    }

    pub async fn update_user_password(&self, user_id: i32, password_hash: String) -> Result<()> {
        self.user_repo()
            .update_password_hash(user_id, password_hash)
            .await
    }

    pub async fn update_user_profile(
        &self,
        user_id: i32,
        location: String,
        description: String,
    ) -> Result<User> {
        self.user_repo()
            .update_profile(user_id, location, description)
            .await
    }

    pub async fn delete_user(&self, user_id: i32) -> Result<bool> {
        self.user_repo().delete(user_id).await
    }

    // ------------------------------------------------------------------
    // Remember tokens
    // ------------------------------------------------------------------

    pub async fn add_remember_token(&self, user_id: i32, record: &TokenRecord) -> Result<()> {
        self.remember_repo().add(user_id, record).await
    }

    pub async fn remember_records(&self, user_id: i32) -> Result<Vec<TokenRecord>> {
        self.remember_repo().records_for_user(user_id).await
    }

    pub async fn forget_user(&self, user_id: i32) -> Result<u64> {
        self.remember_repo().delete_for_user(user_id).await
    }

    // ------------------------------------------------------------------
    // Gigs
    // ------------------------------------------------------------------

    pub async fn create_gig(&self, employer_id: i32, input: GigInput) -> Result<Gig> {
        self.gig_repo().create(employer_id, input).await
    }

    pub async fn get_gig_by_slug(&self, slug: &str) -> Result<Option<Gig>> {
        self.gig_repo().get_by_slug(slug).await
    }

    pub async fn gig_slug_exists(&self, slug: &str) -> Result<bool> {
        self.gig_repo().slug_exists(slug).await
    }

    pub async fn update_gig(&self, gig: &Gig, input: GigInput) -> Result<Gig> {
        self.gig_repo().update(gig, input).await
    }

    pub async fn delete_gig(&self, gig_id: i32) -> Result<()> {
        self.gig_repo().delete(gig_id).await
    }

    pub async fn list_gigs(&self) -> Result<Vec<Gig>> {
        self.gig_repo().list_all().await
    }

    pub async fn list_gigs_by_employer(&self, employer_id: i32) -> Result<Vec<Gig>> {
        self.gig_repo().list_by_employer(employer_id).await
    }

    pub async fn list_applied_gigs(&self, musician_id: i32) -> Result<Vec<Gig>> {
        self.gig_repo().list_applied(musician_id).await
    }

    /// Gigs shown on a user's page: an employer's own postings or the gigs a
    /// musician applied to. Admins have none.
    pub async fn gigs_for_user(&self, user: &User) -> Result<Vec<Gig>> {
        match user.role {
            Role::Employer => self.list_gigs_by_employer(user.id).await,
            Role::Musician => self.list_applied_gigs(user.id).await,
            Role::Admin => Ok(Vec::new()),
        }
    }

    pub async fn gig_applicants(&self, gig_id: i32) -> Result<Vec<User>> {
        self.gig_repo().applicants(gig_id).await
    }

    pub async fn is_applied(&self, gig_id: i32, musician_id: i32) -> Result<bool> {
        self.gig_repo().is_applied(gig_id, musician_id).await
    }

    pub async fn apply_to_gig(&self, gig_id: i32, musician_id: i32) -> Result<bool> {
        self.gig_repo().add_application(gig_id, musician_id).await
    }

    pub async fn withdraw_application(&self, gig_id: i32, musician_id: i32) -> Result<bool> {
        self.gig_repo().remove_application(gig_id, musician_id).await
    }
}
