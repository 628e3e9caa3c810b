//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;

use crate::auth::Principal;
use crate::db::Store;
use crate::models::{Role, User};
use crate::services::account_service::{AccountError, AccountService, HomeFeed, Profile};

pub struct SeaOrmAccountService {
    store: Store,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn home_feed(&self, principal: &Principal) -> Result<HomeFeed, AccountError> {
        let Some(user) = principal.user() else {
            return Ok(HomeFeed::default());
        };

        let feed = match user.role {
            Role::Musician => HomeFeed {
                gigs: Some(self.store.list_gigs().await?),
                musicians: None,
            },
            Role::Employer => HomeFeed {
                gigs: None,
                musicians: Some(self.store.list_users_by_role(Role::Musician).await?),
            },
            Role::Admin => HomeFeed::default(),
        };

        Ok(feed)
    }

    async fn profile(&self, username: &str) -> Result<Profile, AccountError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AccountError::NotFound(username.to_string()))?;

        let gigs = self.store.gigs_for_user(&user).await?;
        Ok(Profile { user, gigs })
    }

    async fn update_profile(
        &self,
        user: &User,
        location: String,
        description: String,
    ) -> Result<User, AccountError> {
        let updated = self
            .store
            .update_user_profile(user.id, location, description)
            .await?;

        tracing::info!(user_id = user.id, "Profile updated");
        Ok(updated)
    }

    async fn delete_account(&self, user: &User) -> Result<(), AccountError> {
        if !self.store.delete_user(user.id).await? {
            return Err(AccountError::NotFound(user.username.clone()));
        }

        metrics::counter!("accounts_deleted_total").increment(1);
        tracing::info!(user_id = user.id, "Account deleted");
        Ok(())
    }
}
