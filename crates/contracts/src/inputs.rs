use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// One explicit input struct per engine operation. Client payloads have
// historically spelled the same field several ways (start_time /
// startDateTime / startsAt); the aliases normalize that here, once, at
// deserialization. Nothing past this boundary aliases.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivityInput {
    #[serde(alias = "tripId")]
    pub trip_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    /// "scheduled" or "propose".
    #[serde(default, alias = "activityType")]
    pub kind: Option<String>,
    #[serde(default, alias = "start_time", alias = "startDateTime", alias = "startsAt")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "end_time", alias = "endDateTime", alias = "endsAt")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "capacity", alias = "maxCapacity")]
    pub max_capacity: Option<i32>,
    #[serde(default, alias = "invitees", alias = "inviteeIds")]
    pub invitee_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsvpInput {
    #[serde(alias = "activityId")]
    pub activity_id: i64,
    /// "accepted", "declined" or "waitlisted".
    #[serde(alias = "response", alias = "rsvp")]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeInput {
    #[serde(alias = "tripId")]
    pub trip_id: i64,
    /// "hotel", "flight" or "restaurant".
    pub kind: String,
    #[serde(
        default,
        alias = "optionId",
        alias = "stayId",
        alias = "flightId",
        alias = "restaurantId"
    )]
    pub option_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankInput {
    #[serde(alias = "proposalId")]
    pub proposal_id: i64,
    #[serde(alias = "rank", alias = "rankValue")]
    pub rank_value: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_activity_accepts_aliased_start_time() {
        let snake: CreateActivityInput = serde_json::from_str(
            r#"{"trip_id": 1, "name": "Hike", "start_time": "2026-09-01T09:00:00Z", "invitee_ids": [2, 3]}"#,
        )
        .unwrap();
        let camel: CreateActivityInput = serde_json::from_str(
            r#"{"tripId": 1, "name": "Hike", "startDateTime": "2026-09-01T09:00:00Z", "inviteeIds": [2, 3]}"#,
        )
        .unwrap();

        assert_eq!(snake.starts_at, camel.starts_at);
        assert!(snake.starts_at.is_some());
        assert_eq!(snake.invitee_ids, camel.invitee_ids);
    }

    #[test]
    fn create_activity_capacity_alias() {
        let input: CreateActivityInput =
            serde_json::from_str(r#"{"trip_id": 1, "name": "Dinner", "capacity": 8}"#).unwrap();
        assert_eq!(input.max_capacity, Some(8));
        assert!(input.invitee_ids.is_empty());
    }

    #[test]
    fn propose_input_entity_id_aliases() {
        let input: ProposeInput =
            serde_json::from_str(r#"{"tripId": 4, "kind": "hotel", "stayId": 17}"#).unwrap();
        assert_eq!(input.option_id, Some(17));

        let input: ProposeInput =
            serde_json::from_str(r#"{"trip_id": 4, "kind": "flight", "flightId": 9}"#).unwrap();
        assert_eq!(input.option_id, Some(9));
    }

    #[test]
    fn rank_input_rank_alias() {
        let input: RankInput =
            serde_json::from_str(r#"{"proposalId": 3, "rank": 2}"#).unwrap();
        assert_eq!(input.rank_value, 2);
        assert!(input.notes.is_none());
    }
}
