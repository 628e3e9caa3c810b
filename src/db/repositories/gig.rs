use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::sea_query::OnConflict;

use crate::constants::gigs::SLUG_ATTEMPTS;
use crate::entities::{applications, gigs, prelude::*, users};
use crate::models::gig::generate_slug;
use crate::models::{Gig, GigInput, User};

pub struct GigRepository {
    conn: DatabaseConnection,
}

impl GigRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn slug_taken<C: ConnectionTrait>(conn: &C, slug: &str) -> Result<bool> {
        let count = Gigs::find()
            .filter(gigs::Column::Slug.eq(slug))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    /// Picks an unused slug for `title`, retrying on the rare suffix collision.
    async fn unique_slug<C: ConnectionTrait>(conn: &C, title: &str) -> Result<String> {
        for _ in 0..SLUG_ATTEMPTS {
            let slug = generate_slug(title);
            if !Self::slug_taken(conn, &slug).await? {
                return Ok(slug);
            }
            tracing::debug!(slug = %slug, "Slug collision, retrying");
        }
        anyhow::bail!("Could not find a free slug for '{title}' after {SLUG_ATTEMPTS} attempts")
    }

    pub async fn create(&self, employer_id: i32, input: GigInput) -> Result<Gig> {
        let txn = self.conn.begin().await?;

        let slug = Self::unique_slug(&txn, &input.title).await?;

        let model = gigs::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            payment: Set(input.payment),
            location: Set(input.location),
            employer_id: Set(employer_id),
            slug: Set(slug),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert gig")?;

        txn.commit().await?;
        Ok(Gig::from(model))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Gig>> {
        let gig = Gigs::find()
            .filter(gigs::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query gig by slug")?;

        Ok(gig.map(Gig::from))
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Self::slug_taken(&self.conn, slug).await
    }

    /// Applies `input` to the gig. A changed title gets a fresh slug.
    pub async fn update(&self, gig: &Gig, input: GigInput) -> Result<Gig> {
        let txn = self.conn.begin().await?;

        let mut active = gigs::ActiveModel {
            id: Set(gig.id),
            description: Set(input.description),
            payment: Set(input.payment),
            location: Set(input.location),
            ..Default::default()
        };

        if input.title != gig.title {
            active.slug = Set(Self::unique_slug(&txn, &input.title).await?);
        }
        active.title = Set(input.title);

        let model = active.update(&txn).await?;

        txn.commit().await?;
        Ok(Gig::from(model))
    }

    /// Deletes the gig and every application to it.
    pub async fn delete(&self, id: i32) -> Result<()> {
        let txn = self.conn.begin().await?;

        Applications::delete_many()
            .filter(applications::Column::GigId.eq(id))
            .exec(&txn)
            .await?;

        Gigs::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<Gig>> {
        let rows = Gigs::find()
            .order_by_desc(gigs::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Gig::from).collect())
    }

    pub async fn list_by_employer(&self, employer_id: i32) -> Result<Vec<Gig>> {
        let rows = Gigs::find()
            .filter(gigs::Column::EmployerId.eq(employer_id))
            .order_by_desc(gigs::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Gig::from).collect())
    }

    /// Gigs the musician has applied to.
    pub async fn list_applied(&self, musician_id: i32) -> Result<Vec<Gig>> {
        let gig_ids: Vec<i32> = Applications::find()
            .filter(applications::Column::MusicianId.eq(musician_id))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|a| a.gig_id)
            .collect();

        if gig_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Gigs::find()
            .filter(gigs::Column::Id.is_in(gig_ids))
            .order_by_desc(gigs::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Gig::from).collect())
    }

    /// Musicians that applied to the gig.
    pub async fn applicants(&self, gig_id: i32) -> Result<Vec<User>> {
        let musician_ids: Vec<i32> = Applications::find()
            .filter(applications::Column::GigId.eq(gig_id))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|a| a.musician_id)
            .collect();

        if musician_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Users::find()
            .filter(users::Column::Id.is_in(musician_ids))
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    pub async fn is_applied(&self, gig_id: i32, musician_id: i32) -> Result<bool> {
        let row = Applications::find_by_id((gig_id, musician_id))
            .one(&self.conn)
            .await?;
        Ok(row.is_some())
    }

    /// Records an application. Applying again is a no-op; returns whether a
    /// new row was written.
    pub async fn add_application(&self, gig_id: i32, musician_id: i32) -> Result<bool> {
        let result = Applications::insert(applications::ActiveModel {
            gig_id: Set(gig_id),
            musician_id: Set(musician_id),
        })
        .on_conflict(
            OnConflict::columns([applications::Column::GigId, applications::Column::MusicianId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await?;

        Ok(result > 0)
    }

    /// Withdraws an application. Returns whether one existed.
    pub async fn remove_application(&self, gig_id: i32, musician_id: i32) -> Result<bool> {
        let result = Applications::delete_by_id((gig_id, musician_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
