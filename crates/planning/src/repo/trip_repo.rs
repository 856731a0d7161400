use sqlx::MySqlPool;

use crate::domain::{Trip, TripMember, TripRoster};

#[derive(Clone)]
pub struct TripRepository {
    pub pool: MySqlPool,
}

impl TripRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, trip_id: i64) -> Result<Option<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            r#"
            SELECT id, creator_id, name, starts_on, ends_on, created_at
            FROM trips
            WHERE id = ?
            "#,
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn members(&self, trip_id: i64) -> Result<Vec<TripMember>, sqlx::Error> {
        sqlx::query_as::<_, TripMember>(
            r#"
            SELECT id, trip_id, user_id, role, joined_at
            FROM trip_members
            WHERE trip_id = ?
            "#,
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn roster(&self, trip_id: i64) -> Result<Option<TripRoster>, sqlx::Error> {
        let trip = match self.get(trip_id).await? {
            Some(trip) => trip,
            None => return Ok(None),
        };
        let members = self.members(trip_id).await?;
        Ok(Some(TripRoster { trip, members }))
    }
}
