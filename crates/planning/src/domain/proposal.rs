use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlanningError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Proposal {
    pub id: i64,
    pub trip_id: i64,
    pub kind: String, // hotel, flight, restaurant
    pub option_id: Option<i64>,
    pub proposed_by: i64,
    pub name: String,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub status: String, // active, canceled
    pub avg_ranking: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    /// Guard for a proposer-only soft cancel.
    pub fn cancel_guard(&self, user_id: i64) -> Result<(), PlanningError> {
        if !self.is_active() {
            return Err(PlanningError::not_found("proposal"));
        }
        if self.proposed_by != user_id {
            return Err(PlanningError::NotOwner);
        }
        Ok(())
    }
}

/// A saved search candidate (hotel/flight/restaurant) written by the
/// search layer; descriptive fields are copied from it at proposal time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedOption {
    pub id: i64,
    pub trip_id: i64,
    pub kind: String,
    pub name: String,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub external_ref: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalKind {
    Hotel,
    Flight,
    Restaurant,
}

impl ProposalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalKind::Hotel => "hotel",
            ProposalKind::Flight => "flight",
            ProposalKind::Restaurant => "restaurant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hotel" => Some(ProposalKind::Hotel),
            "flight" => Some(ProposalKind::Flight),
            "restaurant" => Some(ProposalKind::Restaurant),
            _ => None,
        }
    }
}

/// Descriptive fields supplied by the caller, either to override what the
/// saved option carries or to describe an ad-hoc proposal outright.
#[derive(Debug, Clone, Default)]
pub struct ProposalDetails {
    pub name: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
}

/// Fields for a not-yet-persisted proposal.
#[derive(Debug, Clone)]
pub struct NewProposal {
    pub trip_id: i64,
    pub kind: ProposalKind,
    pub option_id: Option<i64>,
    pub proposed_by: i64,
    pub name: String,
    pub location: Option<String>,
    pub price: Option<f64>,
}

/// One ranking per (proposal, user); resubmitting overwrites. In-memory
/// statement of what the `uq_proposal_ranking` key plus `ON DUPLICATE KEY
/// UPDATE` enforce in `ProposalRepository::upsert_ranking`, kept here as
/// that statement's documented mirror.
pub fn apply_ranking(rankings: &mut Vec<(i64, i32)>, user_id: i64, rank_value: i32) {
    match rankings.iter_mut().find(|(u, _)| *u == user_id) {
        Some(entry) => entry.1 = rank_value,
        None => rankings.push((user_id, rank_value)),
    }
}

/// Arithmetic mean of all submitted rank values, recomputed from scratch
/// on every change. `None` clears the cached average.
pub fn average_rank(values: &[i32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|v| f64::from(*v)).sum();
    Some(sum / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn proposal(proposed_by: i64, status: &str) -> Proposal {
        let now = Utc::now();
        Proposal {
            id: 1,
            trip_id: 1,
            kind: "hotel".to_string(),
            option_id: Some(5),
            proposed_by,
            name: "Hotel Baia".to_string(),
            location: None,
            price: None,
            status: status.to_string(),
            avg_ranking: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn cancel_guard_rejects_non_proposer() {
        let p = proposal(10, "active");
        assert!(matches!(p.cancel_guard(11), Err(PlanningError::NotOwner)));
        assert!(p.cancel_guard(10).is_ok());
    }

    #[test]
    fn cancel_guard_rejects_canceled_as_not_found() {
        let p = proposal(10, "canceled");
        assert!(matches!(
            p.cancel_guard(10),
            Err(PlanningError::NotFound { .. })
        ));
    }

    #[test]
    fn resubmitted_ranking_overwrites_not_appends() {
        let mut rankings = Vec::new();
        apply_ranking(&mut rankings, 7, 2);
        apply_ranking(&mut rankings, 8, 4);
        apply_ranking(&mut rankings, 7, 5);

        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings.iter().find(|(u, _)| *u == 7).unwrap().1, 5);
    }

    #[test]
    fn average_reflects_latest_submission_only() {
        let mut rankings = Vec::new();
        apply_ranking(&mut rankings, 7, 1);
        apply_ranking(&mut rankings, 7, 3);

        let values: Vec<i32> = rankings.iter().map(|(_, v)| *v).collect();
        assert_eq!(average_rank(&values), Some(3.0));
    }

    #[test]
    fn average_of_2_4_3_is_3() {
        assert_eq!(average_rank(&[2, 4, 3]), Some(3.0));
    }

    #[test]
    fn average_of_empty_is_none() {
        assert_eq!(average_rank(&[]), None);
    }

    #[test]
    fn average_of_single_value() {
        assert_eq!(average_rank(&[5]), Some(5.0));
    }

    #[test]
    fn average_keeps_fractions() {
        assert_eq!(average_rank(&[1, 2]), Some(1.5));
    }

    #[test]
    fn kind_parse_round_trips() {
        for kind in [ProposalKind::Hotel, ProposalKind::Flight, ProposalKind::Restaurant] {
            assert_eq!(ProposalKind::parse(kind.as_str()), Some(kind));
        }
        assert!(ProposalKind::parse("cruise").is_none());
    }
}
