use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::auth::{TokenPurpose, TokenRecord};
use crate::entities::{applications, gigs, prelude::*, remember_tokens, users};
use crate::models::{Role, User};

/// Fields needed to create an account. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub location: String,
    pub description: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn to_user(model: users::Model) -> Result<User> {
        User::try_from(model)
    }

    async fn find_model(&self, id: i32) -> Result<Option<users::Model>> {
        Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        self.find_model(id).await?.map(Self::to_user).transpose()
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        user.map(Self::to_user).transpose()
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .get_credentials_by_email(email)
            .await?
            .map(|(user, _)| user))
    }

    /// User by email together with the stored password hash, for login.
    pub async fn get_credentials_by_email(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        user.map(|u| {
            let password_hash = u.password_hash.clone();
            Ok((Self::to_user(u)?, password_hash))
        })
        .transpose()
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count = Users::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = Users::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        let rows = Users::find()
            .filter(users::Column::RoleId.eq(role.id()))
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::to_user).collect()
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            description: Set(new_user.description),
            location: Set(new_user.location),
            password_hash: Set(new_user.password_hash),
            role_id: Set(new_user.role.id()),
            activated: Set(new_user.role.activated_on_creation()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Self::to_user(model)
    }

    /// Stored record for a singular token purpose.
    pub async fn token_record(&self, id: i32, purpose: TokenPurpose) -> Result<TokenRecord> {
        let Some(user) = self.find_model(id).await? else {
            return Ok(TokenRecord::default());
        };

        let record = match purpose {
            TokenPurpose::Activation => {
                TokenRecord::from_columns(user.activation_hash, user.activation_sent_at.as_deref())
            }
            TokenPurpose::Reset => {
                TokenRecord::from_columns(user.reset_hash, user.reset_sent_at.as_deref())
            }
            TokenPurpose::Remember => {
                anyhow::bail!("Remember tokens are stored per device, not on the user row")
            }
        };

        Ok(record)
    }

    /// Overwrites the hash and issue time for `purpose`.
    pub async fn set_token(&self, id: i32, purpose: TokenPurpose, record: &TokenRecord) -> Result<()> {
        let mut active = users::ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        match purpose {
            TokenPurpose::Activation => {
                active.activation_hash = Set(record.hash.clone());
                active.activation_sent_at = Set(record.issued_at_rfc3339());
            }
            TokenPurpose::Reset => {
                active.reset_hash = Set(record.hash.clone());
                active.reset_sent_at = Set(record.issued_at_rfc3339());
            }
            TokenPurpose::Remember => {
                anyhow::bail!("Remember tokens are stored per device, not on the user row")
            }
        }

        active.update(&self.conn).await?;
        Ok(())
    }

    /// Marks the account activated and discards the activation secret.
    pub async fn activate(&self, id: i32) -> Result<()> {
        users::ActiveModel {
            id: Set(id),
            activated: Set(true),
            activation_hash: Set(None),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;
        Ok(())
    }

    /// Replaces the password hash and discards any pending reset secret.
    pub async fn update_password_hash(&self, id: i32, password_hash: String) -> Result<()> {
        users::ActiveModel {
            id: Set(id),
            password_hash: Set(password_hash),
            reset_hash: Set(None),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;
        Ok(())
    }

    pub async fn update_profile(
        &self,
        id: i32,
        location: String,
        description: String,
    ) -> Result<User> {
        let model = users::ActiveModel {
            id: Set(id),
            location: Set(location),
            description: Set(description),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;

        Self::to_user(model)
    }

    /// Deletes the account together with its gigs, applications and
    /// remember tokens in one transaction.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let owned_gigs: Vec<i32> = Gigs::find()
            .filter(gigs::Column::EmployerId.eq(id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();

        if !owned_gigs.is_empty() {
            Applications::delete_many()
                .filter(applications::Column::GigId.is_in(owned_gigs))
                .exec(&txn)
                .await?;
        }

        Applications::delete_many()
            .filter(applications::Column::MusicianId.eq(id))
            .exec(&txn)
            .await?;

        Gigs::delete_many()
            .filter(gigs::Column::EmployerId.eq(id))
            .exec(&txn)
            .await?;

        RememberTokens::delete_many()
            .filter(remember_tokens::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        let result = Users::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}
