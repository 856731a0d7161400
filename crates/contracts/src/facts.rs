use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Facts the engine emits after a state change has been durably written.
/// Consumers (notification persistence, realtime broadcast) receive them
/// fire-and-forget; `subject_user_id` is the user the fact is about, not
/// necessarily the one who should be notified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Fact {
    #[serde(rename = "activity_created")]
    ActivityCreated {
        trip_id: i64,
        activity_id: i64,
        subject_user_id: i64,
        occurred_at: DateTime<Utc>,
    },
    /// A non-poster accepted or declined; the activity's poster is the
    /// intended audience.
    #[serde(rename = "invite_updated")]
    InviteUpdated {
        trip_id: i64,
        activity_id: i64,
        subject_user_id: i64,
        poster_id: i64,
        status: String,
        occurred_at: DateTime<Utc>,
    },
    #[serde(rename = "invite_promoted")]
    InvitePromoted {
        trip_id: i64,
        activity_id: i64,
        subject_user_id: i64,
        occurred_at: DateTime<Utc>,
    },
    #[serde(rename = "activity_canceled")]
    ActivityCanceled {
        trip_id: i64,
        activity_id: i64,
        subject_user_id: i64,
        occurred_at: DateTime<Utc>,
    },
    /// Emitted once per existing invitee when a proposed activity lands on
    /// the calendar.
    #[serde(rename = "activity_converted")]
    ActivityConverted {
        trip_id: i64,
        activity_id: i64,
        subject_user_id: i64,
        occurred_at: DateTime<Utc>,
    },
    #[serde(rename = "proposal_created")]
    ProposalCreated {
        trip_id: i64,
        proposal_id: i64,
        subject_user_id: i64,
        occurred_at: DateTime<Utc>,
    },
    #[serde(rename = "proposal_updated")]
    ProposalUpdated {
        trip_id: i64,
        proposal_id: i64,
        subject_user_id: i64,
        occurred_at: DateTime<Utc>,
    },
    /// One fact per proposal whose cached average may have changed.
    #[serde(rename = "proposal_ranked")]
    ProposalRanked {
        trip_id: i64,
        proposal_id: i64,
        subject_user_id: i64,
        occurred_at: DateTime<Utc>,
    },
    #[serde(rename = "proposal_canceled")]
    ProposalCanceled {
        trip_id: i64,
        proposal_id: i64,
        subject_user_id: i64,
        occurred_at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn fact_serializes_with_type_tag() {
        let fact = Fact::InvitePromoted {
            trip_id: 1,
            activity_id: 2,
            subject_user_id: 3,
            occurred_at: Utc::now(),
        };

        let json = serde_json::to_value(&fact).unwrap();
        assert_eq!(json["type"], "invite_promoted");
        assert_eq!(json["trip_id"], 1);
        assert_eq!(json["activity_id"], 2);
        assert_eq!(json["subject_user_id"], 3);
    }

    #[test]
    fn ranked_fact_round_trips() {
        let fact = Fact::ProposalRanked {
            trip_id: 7,
            proposal_id: 42,
            subject_user_id: 9,
            occurred_at: Utc::now(),
        };

        let json = serde_json::to_string(&fact).unwrap();
        let back: Fact = serde_json::from_str(&json).unwrap();
        match back {
            Fact::ProposalRanked { proposal_id, .. } => assert_eq!(proposal_id, 42),
            other => panic!("unexpected fact: {:?}", other),
        }
    }
}
