//! Domain service for registration, login and the token-based account flows
//! (activation, remember-me, password reset).

use thiserror::Error;

use crate::models::{FieldErrors, Role, User};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected with messages for individual form fields.
    #[error("{0}")]
    Fields(FieldErrors),

    #[error("The confirmation link is not valid or it has expired")]
    InvalidActivationLink,

    #[error("The password reset link is not valid or it has expired")]
    InvalidResetLink,

    #[error("Account is already activated")]
    AlreadyActivated,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Fields(FieldErrors::single(field, message))
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        Self::Fields(errors)
    }
}

/// A registration that already passed form validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub location: String,
    pub description: String,
}

/// Result of a successful login. `remember_secret` is set only when
/// "remember me" was requested and is the plaintext for the cookie.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub remember_secret: Option<String>,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates the account, issues an activation token and mails it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Fields`] if the username or email is taken.
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// Checks credentials and, if requested, issues a remember secret.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Fields`] on an unknown email or wrong password.
    async fn login(&self, email: &str, password: &str, remember: bool)
    -> Result<LoginOutcome, AuthError>;

    /// Deletes every remember secret of the user.
    async fn forget(&self, user_id: i32) -> Result<(), AuthError>;

    /// Activates `user` if `token` matches its unexpired activation secret.
    async fn activate(&self, user: &User, token: &str) -> Result<User, AuthError>;

    /// Issues a fresh activation token, replacing the old one, and mails it.
    async fn send_activation(&self, user: &User) -> Result<(), AuthError>;

    /// Issues a reset token for the account with `email` and mails it.
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Returns the account a reset link belongs to if the link is still valid.
    async fn check_reset_link(&self, token: &str, email: &str) -> Result<User, AuthError>;

    /// Sets a new password through a valid reset link and burns the link.
    async fn reset_password(
        &self,
        token: &str,
        email: &str,
        new_password: &str,
    ) -> Result<User, AuthError>;

    /// Seeds an already activated admin account.
    async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError>;
}
