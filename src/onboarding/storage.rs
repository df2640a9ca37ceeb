//! Draft persistence.
//!
//! Tables are described in `sql/schema.sql`: `registration_drafts` holds the
//! draft itself, `draft_organizations` (one per draft) and `draft_locations`
//! (ordered by `position`) hold the collected data.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, error};
use uuid::Uuid;

use super::types::{DraftLocation, DraftOrganization, DraftStatus, RegistrationDraft};

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn find_completed_by_user(&self, user_id: &str) -> Result<Option<RegistrationDraft>>;

    /// The user's open draft, `IN_PROGRESS` or `SUBMITTING`.
    async fn find_active_by_user(&self, user_id: &str) -> Result<Option<RegistrationDraft>>;

    /// New `IN_PROGRESS` draft at step 1, or the user's open draft if another
    /// caller created one first.
    async fn create(&self, user_id: &str) -> Result<RegistrationDraft>;

    async fn find_by_id(&self, draft_id: Uuid) -> Result<Option<RegistrationDraft>>;

    async fn upsert_organization(&self, draft_id: Uuid, org: &DraftOrganization) -> Result<()>;

    /// Replace every location of the draft, keeping the given order.
    async fn replace_locations(&self, draft_id: Uuid, locations: &[DraftLocation]) -> Result<()>;

    /// Raise the draft step. A lower step than the stored one is ignored.
    async fn update_step(&self, draft_id: Uuid, step: i32) -> Result<()>;

    /// Move an `IN_PROGRESS` draft to `SUBMITTING`. Returns `false` when the
    /// draft was in any other state.
    async fn claim_for_submit(&self, draft_id: Uuid) -> Result<bool>;

    /// Set the status; `org_id` is only written when given.
    async fn update_status(
        &self,
        draft_id: Uuid,
        status: DraftStatus,
        org_id: Option<i64>,
    ) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

const DRAFT_COLUMNS: &str = r#"
    id,
    ext_user_id,
    status,
    current_step,
    org_id,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

#[derive(Clone, Debug)]
pub struct PgDraftStore {
    pool: PgPool,
}

impl PgDraftStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, filter: &str, value: &str) -> Result<Option<RegistrationDraft>> {
        let query = format!(
            "SELECT {DRAFT_COLUMNS} FROM registration_drafts WHERE {filter} ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load registration draft")?;

        match row {
            Some(row) => Ok(Some(self.with_relations(&row).await?)),
            None => Ok(None),
        }
    }

    async fn with_relations(&self, row: &PgRow) -> Result<RegistrationDraft> {
        let id: Uuid = row.get("id");
        let raw_status: String = row.get("status");
        let status = DraftStatus::parse(&raw_status).with_context(|| {
            error!(draft = %id, status = %raw_status, "unknown draft status");
            format!("Unknown draft status: {raw_status}")
        })?;

        let organization = sqlx::query(
            r"
            SELECT name, inn, kpp, director, phone_number, plan
            FROM draft_organizations
            WHERE draft_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load draft organization")?
        .map(|row| DraftOrganization {
            name: row.get("name"),
            inn: row.get("inn"),
            kpp: row.get("kpp"),
            director: row.get("director"),
            phone_number: row.get("phone_number"),
            plan: row.get("plan"),
        });

        let locations = sqlx::query(
            r"
            SELECT name, address, phone, active_places
            FROM draft_locations
            WHERE draft_id = $1
            ORDER BY position
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load draft locations")?
        .into_iter()
        .map(|row| DraftLocation {
            name: row.get("name"),
            address: row.get("address"),
            phone: row.get("phone"),
            active_places: row.get("active_places"),
        })
        .collect();

        Ok(RegistrationDraft {
            id,
            ext_user_id: row.get("ext_user_id"),
            status,
            current_step: row.get("current_step"),
            org_id: row.get("org_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            organization,
            locations,
        })
    }
}

#[async_trait]
impl DraftStore for PgDraftStore {
    async fn find_completed_by_user(&self, user_id: &str) -> Result<Option<RegistrationDraft>> {
        self.fetch_one_where("ext_user_id = $1 AND status = 'COMPLETED'", user_id)
            .await
    }

    async fn find_active_by_user(&self, user_id: &str) -> Result<Option<RegistrationDraft>> {
        self.fetch_one_where(
            "ext_user_id = $1 AND status IN ('IN_PROGRESS', 'SUBMITTING')",
            user_id,
        )
        .await
    }

    async fn create(&self, user_id: &str) -> Result<RegistrationDraft> {
        // registration_drafts_one_open_per_user_idx turns a concurrent create
        // into a no-op; the winner's draft is read back below.
        let query = format!(
            "INSERT INTO registration_drafts (id, ext_user_id, status, current_step) \
             VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING RETURNING {DRAFT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(DraftStatus::InProgress.as_str())
            .bind(super::STEP_ACCOUNT)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to create registration draft")?;

        if let Some(row) = row {
            debug!(user = user_id, "registration draft created");
            return self.with_relations(&row).await;
        }

        debug!(user = user_id, "open registration draft already exists");
        self.find_active_by_user(user_id)
            .await?
            .context("Open registration draft disappeared after insert conflict")
    }

    async fn find_by_id(&self, draft_id: Uuid) -> Result<Option<RegistrationDraft>> {
        let query = format!("SELECT {DRAFT_COLUMNS} FROM registration_drafts WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(draft_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load registration draft")?;

        match row {
            Some(row) => Ok(Some(self.with_relations(&row).await?)),
            None => Ok(None),
        }
    }

    async fn upsert_organization(&self, draft_id: Uuid, org: &DraftOrganization) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO draft_organizations (draft_id, name, inn, kpp, director, phone_number, plan)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (draft_id) DO UPDATE SET
                name = EXCLUDED.name,
                inn = EXCLUDED.inn,
                kpp = EXCLUDED.kpp,
                director = EXCLUDED.director,
                phone_number = EXCLUDED.phone_number,
                plan = EXCLUDED.plan
            ",
        )
        .bind(draft_id)
        .bind(&org.name)
        .bind(&org.inn)
        .bind(&org.kpp)
        .bind(&org.director)
        .bind(&org.phone_number)
        .bind(&org.plan)
        .execute(&self.pool)
        .await
        .context("Failed to save draft organization")?;

        Ok(())
    }

    async fn replace_locations(&self, draft_id: Uuid, locations: &[DraftLocation]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        sqlx::query("DELETE FROM draft_locations WHERE draft_id = $1")
            .bind(draft_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete draft locations")?;

        for (position, location) in (0_i32..).zip(locations) {
            sqlx::query(
                r"
                INSERT INTO draft_locations (draft_id, position, name, address, phone, active_places)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(draft_id)
            .bind(position)
            .bind(&location.name)
            .bind(&location.address)
            .bind(&location.phone)
            .bind(location.active_places)
            .execute(&mut *tx)
            .await
            .context("Failed to insert draft location")?;
        }

        tx.commit().await.context("Failed to commit draft locations")?;

        Ok(())
    }

    async fn update_step(&self, draft_id: Uuid, step: i32) -> Result<()> {
        sqlx::query(
            r"
            UPDATE registration_drafts
            SET current_step = GREATEST(current_step, $2), updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(draft_id)
        .bind(step)
        .execute(&self.pool)
        .await
        .context("Failed to update draft step")?;

        Ok(())
    }

    async fn claim_for_submit(&self, draft_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE registration_drafts
            SET status = $2, updated_at = now()
            WHERE id = $1 AND status = $3
            ",
        )
        .bind(draft_id)
        .bind(DraftStatus::Submitting.as_str())
        .bind(DraftStatus::InProgress.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to claim registration draft")?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_status(
        &self,
        draft_id: Uuid,
        status: DraftStatus,
        org_id: Option<i64>,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE registration_drafts
            SET status = $2, org_id = COALESCE($3, org_id), updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(draft_id)
        .bind(status.as_str())
        .bind(org_id)
        .execute(&self.pool)
        .await
        .context("Failed to update draft status")?;

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }
}
