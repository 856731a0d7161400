use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Trip {
    pub id: i64,
    pub creator_id: i64,
    pub name: String,
    pub starts_on: Option<DateTime<Utc>>,
    pub ends_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TripMember {
    pub id: i64,
    pub trip_id: i64,
    pub user_id: i64,
    pub role: String, // owner, member
    pub joined_at: DateTime<Utc>,
}

/// Read model of the trip roster: the trip row plus its member rows.
/// A user belongs to the trip when they hold a member row or created it.
#[derive(Debug, Clone)]
pub struct TripRoster {
    pub trip: Trip,
    pub members: Vec<TripMember>,
}

impl TripRoster {
    pub fn contains(&self, user_id: i64) -> bool {
        self.trip.creator_id == user_id || self.members.iter().any(|m| m.user_id == user_id)
    }

    /// Ids from `user_ids` that are not on the roster, in input order.
    pub fn missing_from(&self, user_ids: &[i64]) -> Vec<i64> {
        user_ids
            .iter()
            .copied()
            .filter(|id| !self.contains(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn roster(creator_id: i64, member_ids: &[i64]) -> TripRoster {
        let now = Utc::now();
        TripRoster {
            trip: Trip {
                id: 1,
                creator_id,
                name: "Lisbon".to_string(),
                starts_on: None,
                ends_on: None,
                created_at: now,
            },
            members: member_ids
                .iter()
                .enumerate()
                .map(|(i, user_id)| TripMember {
                    id: i as i64 + 1,
                    trip_id: 1,
                    user_id: *user_id,
                    role: "member".to_string(),
                    joined_at: now,
                })
                .collect(),
        }
    }

    #[test]
    fn creator_counts_as_member_without_a_member_row() {
        let roster = roster(10, &[20, 30]);
        assert!(roster.contains(10));
        assert!(roster.contains(20));
        assert!(!roster.contains(99));
    }

    #[test]
    fn missing_from_reports_only_non_members() {
        let roster = roster(10, &[20, 30]);
        assert_eq!(roster.missing_from(&[20, 99, 10, 40]), vec![99, 40]);
        assert!(roster.missing_from(&[10, 20, 30]).is_empty());
    }
}
