//! `SeaORM` implementation of the `GigService` trait.

use async_trait::async_trait;

use crate::db::Store;
use crate::models::{Gig, GigInput, User};
use crate::services::gig_service::{GigDetails, GigError, GigService};

pub struct SeaOrmGigService {
    store: Store,
}

impl SeaOrmGigService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn find(&self, slug: &str) -> Result<Gig, GigError> {
        self.store
            .get_gig_by_slug(slug)
            .await?
            .ok_or_else(|| GigError::NotFound(slug.to_string()))
    }
}

#[async_trait]
impl GigService for SeaOrmGigService {
    async fn create(&self, employer: &User, input: GigInput) -> Result<Gig, GigError> {
        let gig = self.store.create_gig(employer.id, input).await?;

        metrics::counter!("gigs_created_total").increment(1);
        tracing::info!(gig_id = gig.id, slug = %gig.slug, employer_id = employer.id, "Gig created");
        Ok(gig)
    }

    async fn details(&self, slug: &str) -> Result<GigDetails, GigError> {
        let gig = self.find(slug).await?;
        let applicants = self.store.gig_applicants(gig.id).await?;
        Ok(GigDetails { gig, applicants })
    }

    async fn update(&self, slug: &str, input: GigInput) -> Result<Gig, GigError> {
        let gig = self.find(slug).await?;
        let updated = self.store.update_gig(&gig, input).await?;

        if updated.slug != gig.slug {
            tracing::info!(gig_id = gig.id, old = %gig.slug, new = %updated.slug, "Gig slug changed");
        }
        Ok(updated)
    }

    async fn delete(&self, slug: &str) -> Result<(), GigError> {
        let gig = self.find(slug).await?;
        self.store.delete_gig(gig.id).await?;

        tracing::info!(gig_id = gig.id, slug = %gig.slug, "Gig deleted");
        Ok(())
    }

    async fn apply(&self, musician: &User, slug: &str) -> Result<Gig, GigError> {
        let gig = self.find(slug).await?;

        if self.store.apply_to_gig(gig.id, musician.id).await? {
            metrics::counter!("gig_applications_total").increment(1);
            tracing::info!(gig_id = gig.id, musician_id = musician.id, "Applied to gig");
        }
        Ok(gig)
    }

    async fn withdraw(&self, musician: &User, slug: &str) -> Result<Gig, GigError> {
        let gig = self.find(slug).await?;

        if self.store.withdraw_application(gig.id, musician.id).await? {
            tracing::info!(gig_id = gig.id, musician_id = musician.id, "Application withdrawn");
        }
        Ok(gig)
    }

    async fn is_applied(&self, musician: &User, gig: &Gig) -> Result<bool, GigError> {
        Ok(self.store.is_applied(gig.id, musician.id).await?)
    }

    async fn gigs_for(&self, user: &User) -> Result<Vec<Gig>, GigError> {
        Ok(self.store.gigs_for_user(user).await?)
    }
}
