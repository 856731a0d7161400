use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityInvite {
    pub id: i64,
    pub activity_id: i64,
    pub user_id: i64,
    pub status: String, // pending, accepted, declined, waitlisted
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the RSVP audit trail (`activity_responses`).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RsvpRecord {
    pub id: i64,
    pub activity_id: i64,
    pub user_id: i64,
    pub status: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
    Waitlisted,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Declined => "declined",
            InviteStatus::Waitlisted => "waitlisted",
        }
    }
}

impl From<String> for InviteStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "accepted" => InviteStatus::Accepted,
            "declined" => InviteStatus::Declined,
            "waitlisted" => InviteStatus::Waitlisted,
            _ => InviteStatus::Pending,
        }
    }
}

/// What an invitee can answer. `Pending` is not a valid answer, so it is
/// not representable here; re-answering later with a different variant is
/// always allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpResponse {
    Accept,
    Decline,
    Waitlist,
}

impl RsvpResponse {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accepted" | "accept" => Some(RsvpResponse::Accept),
            "declined" | "decline" => Some(RsvpResponse::Decline),
            "waitlisted" | "waitlist" => Some(RsvpResponse::Waitlist),
            _ => None,
        }
    }

    /// Total transition function: every response is legal from every
    /// current status, and the result depends only on the response.
    pub fn resulting_status(&self) -> InviteStatus {
        match self {
            RsvpResponse::Accept => InviteStatus::Accepted,
            RsvpResponse::Decline => InviteStatus::Declined,
            RsvpResponse::Waitlist => InviteStatus::Waitlisted,
        }
    }
}

/// Whether a freed slot exists. Promotion is skipped entirely for
/// uncapped activities.
pub fn should_promote(max_capacity: Option<i32>, accepted_count: i64) -> bool {
    match max_capacity {
        None => false,
        Some(cap) => accepted_count < cap as i64,
    }
}

/// The single invite to promote: the earliest waitlisted row, ordered by
/// the moment the user joined the waitlist (`responded_at`, falling back
/// to `created_at`), with id as the tiebreak. A user waitlisted earlier is
/// served first even if their row was inserted later.
pub fn promotion_candidate(invites: &[ActivityInvite]) -> Option<&ActivityInvite> {
    invites
        .iter()
        .filter(|i| i.status == InviteStatus::Waitlisted.as_str())
        .min_by_key(|i| (i.responded_at.unwrap_or(i.created_at), i.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn invite(id: i64, user_id: i64, status: InviteStatus, responded_offset: Option<i64>) -> ActivityInvite {
        let base = Utc::now();
        ActivityInvite {
            id,
            activity_id: 1,
            user_id,
            status: status.as_str().to_string(),
            responded_at: responded_offset.map(|s| base + Duration::seconds(s)),
            created_at: base,
            updated_at: base,
        }
    }

    #[test]
    fn every_response_maps_to_one_status_regardless_of_current() {
        // The transition is total: no current status makes any response
        // illegal, and the result depends only on the response.
        assert_eq!(RsvpResponse::Accept.resulting_status(), InviteStatus::Accepted);
        assert_eq!(RsvpResponse::Decline.resulting_status(), InviteStatus::Declined);
        assert_eq!(RsvpResponse::Waitlist.resulting_status(), InviteStatus::Waitlisted);
    }

    #[test]
    fn response_parse_rejects_pending() {
        assert!(RsvpResponse::parse("pending").is_none());
        assert!(RsvpResponse::parse("maybe").is_none());
        assert_eq!(RsvpResponse::parse("accepted"), Some(RsvpResponse::Accept));
    }

    #[test]
    fn promotion_skipped_without_capacity() {
        assert!(!should_promote(None, 0));
    }

    #[test]
    fn promotion_skipped_at_capacity() {
        assert!(!should_promote(Some(2), 2));
        assert!(!should_promote(Some(2), 3));
        assert!(should_promote(Some(2), 1));
    }

    #[test]
    fn earliest_waitlist_joiner_wins_over_row_order() {
        // U1's row was created first but they joined the waitlist later.
        let invites = vec![
            invite(1, 101, InviteStatus::Waitlisted, Some(2)),
            invite(2, 102, InviteStatus::Waitlisted, Some(1)),
        ];
        let picked = promotion_candidate(&invites).unwrap();
        assert_eq!(picked.user_id, 102);
    }

    #[test]
    fn promotion_ignores_non_waitlisted_rows() {
        let invites = vec![
            invite(1, 101, InviteStatus::Accepted, Some(0)),
            invite(2, 102, InviteStatus::Declined, Some(0)),
            invite(3, 103, InviteStatus::Pending, None),
        ];
        assert!(promotion_candidate(&invites).is_none());
    }

    #[test]
    fn id_breaks_ties_on_equal_timestamps() {
        let base = Utc::now();
        let mut a = invite(5, 101, InviteStatus::Waitlisted, None);
        let mut b = invite(3, 102, InviteStatus::Waitlisted, None);
        a.created_at = base;
        b.created_at = base;
        let invites = [a, b];
        let picked = promotion_candidate(&invites).unwrap();
        assert_eq!(picked.id, 3);
    }

    #[test]
    fn decline_frees_slot_for_waitlisted_user() {
        // max_capacity = 1, A just declined so the accepted count is 0.
        let invites = vec![
            invite(1, 101, InviteStatus::Declined, Some(0)),
            invite(2, 102, InviteStatus::Waitlisted, Some(1)),
        ];
        assert!(should_promote(Some(1), 0));
        assert_eq!(promotion_candidate(&invites).unwrap().user_id, 102);
    }
}
