use sqlx::{MySqlPool, Row};

use crate::domain::{NewProposal, Proposal, ProposalKind, SavedOption};

const PROPOSAL_COLUMNS: &str = "id, trip_id, kind, option_id, proposed_by, name, location, \
     price, status, avg_ranking, created_at, updated_at";

#[derive(Clone)]
pub struct ProposalRepository {
    pub pool: MySqlPool,
}

impl ProposalRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, proposal_id: i64) -> Result<Option<Proposal>, sqlx::Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            "SELECT {} FROM proposals WHERE id = ?",
            PROPOSAL_COLUMNS
        ))
        .bind(proposal_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_option(&self, option_id: i64) -> Result<Option<SavedOption>, sqlx::Error> {
        sqlx::query_as::<_, SavedOption>(
            r#"
            SELECT id, trip_id, kind, name, location, price, external_ref, created_by, created_at
            FROM saved_options
            WHERE id = ?
            "#,
        )
        .bind(option_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_active_by_option(
        &self,
        trip_id: i64,
        kind: ProposalKind,
        option_id: i64,
    ) -> Result<Option<Proposal>, sqlx::Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            SELECT {} FROM proposals
            WHERE trip_id = ? AND kind = ? AND option_id = ? AND status = 'active'
            "#,
            PROPOSAL_COLUMNS
        ))
        .bind(trip_id)
        .bind(kind.as_str())
        .bind(option_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a new active proposal. The `(trip_id, kind, option_id,
    /// is_active)` unique key is the storage-level race guard; callers
    /// classify the unique-violation error.
    pub async fn insert(&self, new: &NewProposal) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO proposals
                (trip_id, kind, option_id, proposed_by, name, location, price,
                 status, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'active', 1, NOW(), NOW())
            "#,
        )
        .bind(new.trip_id)
        .bind(new.kind.as_str())
        .bind(new.option_id)
        .bind(new.proposed_by)
        .bind(&new.name)
        .bind(&new.location)
        .bind(new.price)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id() as i64)
    }

    pub async fn list_active(
        &self,
        trip_id: i64,
        kind: ProposalKind,
    ) -> Result<Vec<Proposal>, sqlx::Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            SELECT {} FROM proposals
            WHERE trip_id = ? AND kind = ? AND status = 'active'
            ORDER BY avg_ranking IS NULL, avg_ranking ASC, id ASC
            "#,
            PROPOSAL_COLUMNS
        ))
        .bind(trip_id)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
    }

    /// Every active proposal referencing the same saved option. Plural
    /// because the same option can sit in more than one still-active row
    /// across soft-delete history.
    pub async fn active_sharing_option(
        &self,
        trip_id: i64,
        kind: &str,
        option_id: i64,
    ) -> Result<Vec<Proposal>, sqlx::Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            SELECT {} FROM proposals
            WHERE trip_id = ? AND kind = ? AND option_id = ? AND status = 'active'
            ORDER BY id
            "#,
            PROPOSAL_COLUMNS
        ))
        .bind(trip_id)
        .bind(kind)
        .bind(option_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Overwrite semantics: one ranking row per (proposal, user), the
    /// latest submission wins.
    pub async fn upsert_ranking(
        &self,
        proposal_id: i64,
        user_id: i64,
        rank_value: i32,
        notes: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO proposal_rankings
                (proposal_id, user_id, rank_value, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            ON DUPLICATE KEY UPDATE
                rank_value = VALUES(rank_value), notes = VALUES(notes), updated_at = NOW()
            "#,
        )
        .bind(proposal_id)
        .bind(user_id)
        .bind(rank_value)
        .bind(notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn rank_values(&self, proposal_id: i64) -> Result<Vec<i32>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT rank_value FROM proposal_rankings WHERE proposal_id = ?
            "#,
        )
        .bind(proposal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("rank_value")).collect())
    }

    pub async fn update_avg(
        &self,
        proposal_id: i64,
        avg: Option<f64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE proposals SET avg_ranking = ?, updated_at = NOW() WHERE id = ?
            "#,
        )
        .bind(avg)
        .bind(proposal_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Soft cancel; rankings are retained for history. Clearing
    /// `is_active` to NULL releases the unique key for a future re-propose.
    pub async fn cancel(&self, proposal_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE proposals
            SET status = 'canceled', is_active = NULL, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(proposal_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
