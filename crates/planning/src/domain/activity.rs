use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::invite::ActivityInvite;
use crate::error::PlanningError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub trip_id: i64,
    pub posted_by: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cost: Option<f64>,
    pub category: Option<String>,
    pub kind: String,   // scheduled, propose
    pub status: String, // active, canceled
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub max_capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Scheduled,
    Propose,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Scheduled => "scheduled",
            ActivityKind::Propose => "propose",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(ActivityKind::Scheduled),
            "propose" => Some(ActivityKind::Propose),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    Active,
    Canceled,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Active => "active",
            ActivityStatus::Canceled => "canceled",
        }
    }
}

impl From<String> for ActivityStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "canceled" => ActivityStatus::Canceled,
            _ => ActivityStatus::Active,
        }
    }
}

/// Fields for a not-yet-persisted activity, normalized by the boundary.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub trip_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cost: Option<f64>,
    pub category: Option<String>,
    pub kind: ActivityKind,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub max_capacity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityView {
    pub activity: Activity,
    pub invites: Vec<ActivityInvite>,
}

impl Activity {
    pub fn is_active(&self) -> bool {
        self.status == ActivityStatus::Active.as_str()
    }

    /// Guard for flipping a proposed activity onto the calendar. Poster
    /// only; must be an active propose-kind row with a chosen start time.
    pub fn convert_guard(&self, user_id: i64) -> Result<(), PlanningError> {
        if !self.is_active() {
            return Err(PlanningError::not_found("activity"));
        }
        if self.posted_by != user_id {
            return Err(PlanningError::NotOwner);
        }
        if self.kind == ActivityKind::Scheduled.as_str() {
            return Err(PlanningError::precondition("activity is already scheduled"));
        }
        if self.kind != ActivityKind::Propose.as_str() {
            return Err(PlanningError::precondition("activity is not a proposal"));
        }
        if self.starts_at.is_none() {
            return Err(PlanningError::precondition(
                "a proposal without a start time cannot be scheduled",
            ));
        }
        Ok(())
    }

    /// Guard for a poster-only soft cancel.
    pub fn cancel_guard(&self, user_id: i64) -> Result<(), PlanningError> {
        if !self.is_active() {
            return Err(PlanningError::not_found("activity"));
        }
        if self.posted_by != user_id {
            return Err(PlanningError::NotOwner);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn activity(kind: ActivityKind, starts_at: Option<DateTime<Utc>>) -> Activity {
        let now = Utc::now();
        Activity {
            id: 1,
            trip_id: 1,
            posted_by: 10,
            name: "Surf lesson".to_string(),
            description: None,
            location: None,
            cost: None,
            category: None,
            kind: kind.as_str().to_string(),
            status: "active".to_string(),
            starts_at,
            ends_at: None,
            max_capacity: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn convert_requires_poster() {
        let a = activity(ActivityKind::Propose, Some(Utc::now()));
        assert!(matches!(a.convert_guard(99), Err(PlanningError::NotOwner)));
        assert!(a.convert_guard(10).is_ok());
    }

    #[test]
    fn convert_rejects_already_scheduled() {
        let a = activity(ActivityKind::Scheduled, Some(Utc::now()));
        assert!(matches!(
            a.convert_guard(10),
            Err(PlanningError::Precondition { .. })
        ));
    }

    #[test]
    fn convert_rejects_missing_start_time() {
        let a = activity(ActivityKind::Propose, None);
        assert!(matches!(
            a.convert_guard(10),
            Err(PlanningError::Precondition { .. })
        ));
    }

    #[test]
    fn convert_rejects_canceled_as_not_found() {
        let mut a = activity(ActivityKind::Propose, Some(Utc::now()));
        a.status = "canceled".to_string();
        assert!(matches!(
            a.convert_guard(10),
            Err(PlanningError::NotFound { .. })
        ));
    }

    #[test]
    fn cancel_guard_enforces_ownership() {
        let a = activity(ActivityKind::Scheduled, Some(Utc::now()));
        assert!(matches!(a.cancel_guard(11), Err(PlanningError::NotOwner)));
        assert!(a.cancel_guard(10).is_ok());
    }
}
