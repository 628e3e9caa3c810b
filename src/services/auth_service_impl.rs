//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Utc;

use crate::auth::{SecretHasher, TokenIssuer, TokenPurpose};
use crate::db::{NewUser, Store};
use crate::models::{FieldErrors, Role, User};
use crate::services::auth_service::{AuthError, AuthService, LoginOutcome, Registration};
use crate::services::notifications::Mailer;

pub struct SeaOrmAuthService {
    store: Store,
    hasher: SecretHasher,
    issuer: TokenIssuer,
    mailer: Mailer,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        hasher: SecretHasher,
        issuer: TokenIssuer,
        mailer: Mailer,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
            mailer,
        }
    }

    async fn ensure_unique(&self, username: &str, email: &str) -> Result<(), AuthError> {
        let mut errors = FieldErrors::new();

        if self.store.username_exists(username).await? {
            errors.add("username", "Username already exists.");
        }
        if self.store.email_exists(email).await? {
            errors.add("email", "Email already exists.");
        }

        errors.into_result().map_err(AuthError::Fields)
    }

    async fn issue_activation(&self, user: &User) -> Result<(), AuthError> {
        let token = self
            .issuer
            .issue(TokenPurpose::Activation, Utc::now())
            .await?;
        self.store
            .set_user_token(user.id, TokenPurpose::Activation, &token.record)
            .await?;

        self.mailer.send_activation(user, &token.secret);
        Ok(())
    }

    async fn valid_reset_user(&self, token: &str, email: &str) -> Result<User, AuthError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            return Err(AuthError::InvalidResetLink);
        };

        let record = self.store.user_token(user.id, TokenPurpose::Reset).await?;
        if self
            .issuer
            .verify(TokenPurpose::Reset, &record, token, Utc::now())
            .await?
        {
            Ok(user)
        } else {
            Err(AuthError::InvalidResetLink)
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        self.ensure_unique(&registration.username, &registration.email)
            .await?;

        let password_hash = self.hasher.hash_blocking(registration.password).await?;

        let user = self
            .store
            .create_user(NewUser {
                username: registration.username,
                email: registration.email,
                password_hash,
                role: registration.role,
                location: registration.location,
                description: registration.description,
            })
            .await?;

        self.issue_activation(&user).await?;

        metrics::counter!("auth_registrations_total", "role" => user.role.to_string())
            .increment(1);
        tracing::info!(user_id = user.id, role = %user.role, "User registered");

        Ok(user)
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<LoginOutcome, AuthError> {
        let Some((user, password_hash)) = self.store.get_user_credentials(email).await? else {
            metrics::counter!("auth_logins_total", "outcome" => "unknown_email").increment(1);
            return Err(AuthError::field(
                "email",
                "There is no registered account with this email...",
            ));
        };

        if !SecretHasher::verify_blocking(password.to_string(), password_hash).await? {
            metrics::counter!("auth_logins_total", "outcome" => "wrong_password").increment(1);
            return Err(AuthError::field("password", "The password is not correct"));
        }

        let remember_secret = if remember {
            let token = self.issuer.issue(TokenPurpose::Remember, Utc::now()).await?;
            self.store.add_remember_token(user.id, &token.record).await?;
            Some(token.secret)
        } else {
            None
        };

        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);
        tracing::info!(user_id = user.id, remember, "User logged in");

        Ok(LoginOutcome {
            user,
            remember_secret,
        })
    }

    async fn forget(&self, user_id: i32) -> Result<(), AuthError> {
        let removed = self.store.forget_user(user_id).await?;
        tracing::debug!(user_id, removed, "Remember tokens removed");
        Ok(())
    }

    async fn activate(&self, user: &User, token: &str) -> Result<User, AuthError> {
        if user.activated {
            return Err(AuthError::AlreadyActivated);
        }

        let record = self.store.user_token(user.id, TokenPurpose::Activation).await?;
        let valid = self
            .issuer
            .verify(TokenPurpose::Activation, &record, token, Utc::now())
            .await?;

        if !valid {
            tracing::debug!(user_id = user.id, "Rejected activation token");
            return Err(AuthError::InvalidActivationLink);
        }

        self.store.activate_user(user.id).await?;
        tracing::info!(user_id = user.id, "Account activated");

        self.store
            .get_user(user.id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn send_activation(&self, user: &User) -> Result<(), AuthError> {
        if user.activated {
            return Err(AuthError::AlreadyActivated);
        }
        self.issue_activation(user).await
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            return Err(AuthError::field(
                "email",
                "There is no registered account with this email...",
            ));
        };

        let token = self.issuer.issue(TokenPurpose::Reset, Utc::now()).await?;
        self.store
            .set_user_token(user.id, TokenPurpose::Reset, &token.record)
            .await?;

        self.mailer.send_password_reset(&user, &token.secret);
        tracing::info!(user_id = user.id, "Password reset requested");
        Ok(())
    }

    async fn check_reset_link(&self, token: &str, email: &str) -> Result<User, AuthError> {
        self.valid_reset_user(token, email).await
    }

    async fn reset_password(
        &self,
        token: &str,
        email: &str,
        new_password: &str,
    ) -> Result<User, AuthError> {
        let user = self.valid_reset_user(token, email).await?;

        let password_hash = self.hasher.hash_blocking(new_password.to_string()).await?;
        self.store
            .update_user_password(user.id, password_hash)
            .await?;

        tracing::info!(user_id = user.id, "Password updated through reset link");
        Ok(user)
    }

    async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        self.ensure_unique(username, email).await?;

        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;

        let user = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::Admin,
                location: String::new(),
                description: String::new(),
            })
            .await?;

        tracing::info!(user_id = user.id, "Admin account created");
        Ok(user)
    }
}
