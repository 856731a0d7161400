use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};

use crate::domain::{Activity, NewActivity};

const ACTIVITY_COLUMNS: &str = "id, trip_id, posted_by, name, description, location, cost, \
     category, kind, status, starts_at, ends_at, max_capacity, created_at, updated_at";

/// Result of the atomic create: either the new activity id, or the set of
/// requested invitees that failed the in-transaction membership re-check.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(i64),
    RejectedNonMembers(Vec<i64>),
}

#[derive(Clone)]
pub struct ActivityRepository {
    pub pool: MySqlPool,
}

impl ActivityRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, activity_id: i64) -> Result<Option<Activity>, sqlx::Error> {
        sqlx::query_as::<_, Activity>(&format!(
            "SELECT {} FROM activities WHERE id = ?",
            ACTIVITY_COLUMNS
        ))
        .bind(activity_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Business-duplicate search: an active activity in the same trip with
    /// the same name and start time. Two NULL start times compare equal.
    pub async fn find_active_duplicate(
        &self,
        trip_id: i64,
        name: &str,
        starts_at: Option<DateTime<Utc>>,
    ) -> Result<Option<i64>, sqlx::Error> {
        let row = match starts_at {
            Some(ts) => {
                sqlx::query(
                    r#"
                    SELECT id FROM activities
                    WHERE trip_id = ? AND name = ? AND starts_at = ? AND status = 'active'
                    "#,
                )
                .bind(trip_id)
                .bind(name)
                .bind(ts)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id FROM activities
                    WHERE trip_id = ? AND name = ? AND starts_at IS NULL AND status = 'active'
                    "#,
                )
                .bind(trip_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?
            }
        };
        Ok(row.map(|r| r.get("id")))
    }

    /// Atomic create-with-invites: one transaction inserts the activity row
    /// and one pending invite per invitee. Membership is re-checked inside
    /// the transaction since the roster can change between the caller's
    /// check and this write. Any failure rolls the whole thing back; no
    /// commit is issued on any error path.
    pub async fn create_with_invites(
        &self,
        new: &NewActivity,
        poster_id: i64,
        invitee_ids: &[i64],
    ) -> Result<CreateOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO activities
                (trip_id, posted_by, name, description, location, cost, category,
                 kind, status, starts_at, ends_at, max_capacity, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'active', ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(new.trip_id)
        .bind(poster_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.location)
        .bind(new.cost)
        .bind(&new.category)
        .bind(new.kind.as_str())
        .bind(new.starts_at)
        .bind(new.ends_at)
        .bind(new.max_capacity)
        .execute(&mut *tx)
        .await;

        let activity_id = match result {
            Ok(result) => result.last_insert_id() as i64,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };

        // Membership re-check at the storage boundary, inside the
        // transaction that writes the invites.
        let allowed = match roster_user_ids(&mut tx, new.trip_id).await {
            Ok(allowed) => allowed,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };
        let rejected: Vec<i64> = invitee_ids
            .iter()
            .copied()
            .filter(|id| !allowed.contains(id))
            .collect();
        if !rejected.is_empty() {
            let _ = tx.rollback().await;
            return Ok(CreateOutcome::RejectedNonMembers(rejected));
        }

        for user_id in invitee_ids {
            let inserted = sqlx::query(
                r#"
                INSERT INTO activity_invites (activity_id, user_id, status, created_at, updated_at)
                VALUES (?, ?, 'pending', NOW(), NOW())
                "#,
            )
            .bind(activity_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await;

            if let Err(e) = inserted {
                let _ = tx.rollback().await;
                return Err(e);
            }
        }

        tx.commit().await?;
        Ok(CreateOutcome::Created(activity_id))
    }

    pub async fn set_scheduled(&self, activity_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE activities
            SET kind = 'scheduled', updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(activity_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_canceled(&self, activity_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE activities
            SET status = 'canceled', updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(activity_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

async fn roster_user_ids(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    trip_id: i64,
) -> Result<std::collections::HashSet<i64>, sqlx::Error> {
    let mut allowed: std::collections::HashSet<i64> = sqlx::query(
        r#"
        SELECT user_id FROM trip_members WHERE trip_id = ?
        "#,
    )
    .bind(trip_id)
    .fetch_all(&mut **tx)
    .await?
    .iter()
    .map(|row| row.get::<i64, _>("user_id"))
    .collect();

    let creator = sqlx::query(
        r#"
        SELECT creator_id FROM trips WHERE id = ?
        "#,
    )
    .bind(trip_id)
    .fetch_optional(&mut **tx)
    .await?;
    if let Some(row) = creator {
        allowed.insert(row.get("creator_id"));
    }

    Ok(allowed)
}
