use sqlx::{MySqlPool, Row};

use crate::domain::{promotion_candidate, should_promote, ActivityInvite, InviteStatus, RsvpRecord};

const INVITE_COLUMNS: &str =
    "id, activity_id, user_id, status, responded_at, created_at, updated_at";

/// What one RSVP transaction wrote: the responder's row and, when a slot
/// freed up, the single promoted row.
#[derive(Debug)]
pub struct RsvpWrite {
    pub invite: ActivityInvite,
    pub promoted: Option<ActivityInvite>,
}

#[derive(Clone)]
pub struct InviteRepository {
    pub pool: MySqlPool,
}

impl InviteRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_activity(
        &self,
        activity_id: i64,
    ) -> Result<Vec<ActivityInvite>, sqlx::Error> {
        sqlx::query_as::<_, ActivityInvite>(&format!(
            "SELECT {} FROM activity_invites WHERE activity_id = ? ORDER BY id",
            INVITE_COLUMNS
        ))
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await
    }

    /// The RSVP write and the waitlist promotion it may trigger, in one
    /// transaction. The activity row is locked first (`SELECT ... FOR
    /// UPDATE`) so concurrent responds on the same activity serialize and
    /// cannot double- or under-promote. At most one invite is promoted,
    /// picked by `promotion_candidate` over the waitlisted rows.
    ///
    /// Returns `None` when the activity is missing or canceled.
    pub async fn respond_with_promotion(
        &self,
        activity_id: i64,
        user_id: i64,
        new_status: InviteStatus,
    ) -> Result<Option<RsvpWrite>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query(
            r#"
            SELECT id, status, max_capacity
            FROM activities
            WHERE id = ?
            FOR UPDATE
            "#,
        )
        .bind(activity_id)
        .fetch_optional(&mut *tx)
        .await?;

        let max_capacity: Option<i32> = match locked {
            Some(row) if row.get::<String, _>("status") == "active" => row.get("max_capacity"),
            _ => {
                let _ = tx.rollback().await;
                return Ok(None);
            }
        };

        // A roster-verified member without an invite row gains one that
        // carries their response.
        sqlx::query(
            r#"
            INSERT INTO activity_invites
                (activity_id, user_id, status, responded_at, created_at, updated_at)
            VALUES (?, ?, ?, NOW(), NOW(), NOW())
            ON DUPLICATE KEY UPDATE
                status = VALUES(status), responded_at = NOW(), updated_at = NOW()
            "#,
        )
        .bind(activity_id)
        .bind(user_id)
        .bind(new_status.as_str())
        .execute(&mut *tx)
        .await?;

        let invite = sqlx::query_as::<_, ActivityInvite>(&format!(
            "SELECT {} FROM activity_invites WHERE activity_id = ? AND user_id = ?",
            INVITE_COLUMNS
        ))
        .bind(activity_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let accepted_count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM activity_invites
            WHERE activity_id = ? AND status = 'accepted'
            "#,
        )
        .bind(activity_id)
        .fetch_one(&mut *tx)
        .await?
        .get("count");

        let mut promoted = None;
        if should_promote(max_capacity, accepted_count) {
            let waitlisted = sqlx::query_as::<_, ActivityInvite>(&format!(
                "SELECT {} FROM activity_invites WHERE activity_id = ? AND status = 'waitlisted'",
                INVITE_COLUMNS
            ))
            .bind(activity_id)
            .fetch_all(&mut *tx)
            .await?;

            if let Some(candidate) = promotion_candidate(&waitlisted) {
                let candidate_id = candidate.id;
                sqlx::query(
                    r#"
                    UPDATE activity_invites
                    SET status = 'accepted', responded_at = NOW(), updated_at = NOW()
                    WHERE id = ?
                    "#,
                )
                .bind(candidate_id)
                .execute(&mut *tx)
                .await?;

                promoted = Some(
                    sqlx::query_as::<_, ActivityInvite>(&format!(
                        "SELECT {} FROM activity_invites WHERE id = ?",
                        INVITE_COLUMNS
                    ))
                    .bind(candidate_id)
                    .fetch_one(&mut *tx)
                    .await?,
                );
            }
        }

        tx.commit().await?;
        Ok(Some(RsvpWrite { invite, promoted }))
    }

    /// The RSVP audit trail; written by other parts of the system, read
    /// here for the history view.
    pub async fn history(&self, activity_id: i64) -> Result<Vec<RsvpRecord>, sqlx::Error> {
        sqlx::query_as::<_, RsvpRecord>(
            r#"
            SELECT id, activity_id, user_id, status, recorded_at
            FROM activity_responses
            WHERE activity_id = ?
            ORDER BY recorded_at DESC, id DESC
            "#,
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await
    }
}
