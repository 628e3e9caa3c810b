//! Domain service for gig postings and applications.

use thiserror::Error;

use crate::models::{Gig, GigInput, User};

#[derive(Debug, Error)]
pub enum GigError {
    #[error("Gig not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for GigError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for GigError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// A gig with the musicians that applied to it.
#[derive(Debug, Clone)]
pub struct GigDetails {
    pub gig: Gig,
    pub applicants: Vec<User>,
}

#[async_trait::async_trait]
pub trait GigService: Send + Sync {
    async fn create(&self, employer: &User, input: GigInput) -> Result<Gig, GigError>;

    async fn details(&self, slug: &str) -> Result<GigDetails, GigError>;

    /// Updates the gig. The slug changes when the title does.
    async fn update(&self, slug: &str, input: GigInput) -> Result<Gig, GigError>;

    /// Deletes the gig and its applications.
    async fn delete(&self, slug: &str) -> Result<(), GigError>;

    /// Applies `musician` to the gig. Repeating the call changes nothing.
    async fn apply(&self, musician: &User, slug: &str) -> Result<Gig, GigError>;

    async fn withdraw(&self, musician: &User, slug: &str) -> Result<Gig, GigError>;

    async fn is_applied(&self, musician: &User, gig: &Gig) -> Result<bool, GigError>;

    /// Applied gigs for a musician, own gigs for an employer.
    async fn gigs_for(&self, user: &User) -> Result<Vec<Gig>, GigError>;
}
