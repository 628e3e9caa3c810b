//! Domain service for profiles, the home feed and account deletion.

use thiserror::Error;

use crate::auth::Principal;
use crate::models::{Gig, User};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub gigs: Vec<Gig>,
}

/// What the home page lists: gigs for musicians, musicians for employers.
#[derive(Debug, Clone, Default)]
pub struct HomeFeed {
    pub gigs: Option<Vec<Gig>>,
    pub musicians: Option<Vec<User>>,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    async fn home_feed(&self, principal: &Principal) -> Result<HomeFeed, AccountError>;

    /// # Errors
    ///
    /// Returns [`AccountError::NotFound`] for an unknown username.
    async fn profile(&self, username: &str) -> Result<Profile, AccountError>;

    async fn update_profile(
        &self,
        user: &User,
        location: String,
        description: String,
    ) -> Result<User, AccountError>;

    /// Deletes the account with its gigs, applications and remember tokens.
    async fn delete_account(&self, user: &User) -> Result<(), AccountError>;
}
