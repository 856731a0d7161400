use std::sync::Arc;

use contracts::inputs::{ProposeInput, RankInput};
use contracts::Fact;

use crate::dispatch::{fan_out, Dispatcher};
use crate::domain::{NewProposal, Proposal, ProposalDetails, ProposalKind};
use crate::error::PlanningError;
use crate::repo::{ProposalRepository, TripRepository};

#[derive(Debug)]
pub struct EnsureOutcome {
    pub proposal: Proposal,
    pub was_created: bool,
}

#[derive(Debug)]
pub struct RankOutcome {
    pub trip_id: i64,
    pub affected_proposal_ids: Vec<i64>,
}

#[derive(Clone)]
pub struct ProposalService {
    trips: TripRepository,
    proposals: ProposalRepository,
    dispatcher: Arc<dyn Dispatcher>,
}

impl ProposalService {
    pub fn new(
        trips: TripRepository,
        proposals: ProposalRepository,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            trips,
            proposals,
            dispatcher,
        }
    }

    pub async fn ensure_from_input(
        &self,
        input: ProposeInput,
        user_id: i64,
    ) -> Result<EnsureOutcome, PlanningError> {
        let kind = ProposalKind::parse(&input.kind)
            .ok_or_else(|| PlanningError::precondition("unknown proposal kind"))?;
        let details = Self::details_from_input(&input);
        self.ensure(kind, input.trip_id, user_id, input.option_id, details)
            .await
    }

    /// Idempotent propose, keyed on `(trip, kind, saved option)`. Two
    /// concurrent calls can both miss the existence check; the unique key
    /// on the proposals table breaks the tie, and the loser re-queries for
    /// the winner's row. One bounded creation retry covers the transient
    /// case where the re-query finds nothing.
    pub async fn ensure(
        &self,
        kind: ProposalKind,
        trip_id: i64,
        user_id: i64,
        option_id: Option<i64>,
        details: Option<ProposalDetails>,
    ) -> Result<EnsureOutcome, PlanningError> {
        let roster = self
            .trips
            .roster(trip_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("trip"))?;
        if !roster.contains(user_id) {
            return Err(PlanningError::NotTripMember { user_id });
        }

        let Some(option_id) = option_id else {
            return self.create_ad_hoc(kind, trip_id, user_id, details).await;
        };

        let option = self
            .proposals
            .get_option(option_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("saved option"))?;
        if option.trip_id != trip_id {
            return Err(PlanningError::OptionTripMismatch { option_id, trip_id });
        }
        if option.kind != kind.as_str() {
            return Err(PlanningError::precondition("saved option kind mismatch"));
        }

        let details = details.unwrap_or_default();
        let new = NewProposal {
            trip_id,
            kind,
            option_id: Some(option_id),
            proposed_by: user_id,
            name: details.name.unwrap_or(option.name),
            location: details.location.or(option.location),
            price: details.price.or(option.price),
        };

        let mut retried = false;
        loop {
            let existing = self
                .proposals
                .find_active_by_option(trip_id, kind, option_id)
                .await?;
            if let Some(outcome) = Self::reuse_existing(existing) {
                fan_out(
                    &self.dispatcher,
                    vec![Fact::ProposalUpdated {
                        trip_id,
                        proposal_id: outcome.proposal.id,
                        subject_user_id: user_id,
                        occurred_at: common::time::now(),
                    }],
                )
                .await;
                return Ok(outcome);
            }

            match self.proposals.insert(&new).await {
                Ok(id) => {
                    let proposal = self
                        .proposals
                        .get(id)
                        .await?
                        .ok_or_else(|| PlanningError::not_found("proposal"))?;
                    tracing::info!("proposal {} created for option {}", id, option_id);
                    fan_out(
                        &self.dispatcher,
                        vec![Fact::ProposalCreated {
                            trip_id,
                            proposal_id: id,
                            subject_user_id: user_id,
                            occurred_at: common::time::now(),
                        }],
                    )
                    .await;
                    return Ok(EnsureOutcome {
                        proposal,
                        was_created: true,
                    });
                }
                Err(e) if is_unique_violation(&e) && !retried => {
                    tracing::warn!(
                        "lost proposal-creation race for option {}, re-querying",
                        option_id
                    );
                    retried = true;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn create_ad_hoc(
        &self,
        kind: ProposalKind,
        trip_id: i64,
        user_id: i64,
        details: Option<ProposalDetails>,
    ) -> Result<EnsureOutcome, PlanningError> {
        let details = details
            .ok_or_else(|| PlanningError::precondition("ad-hoc proposal requires details"))?;
        let name = details
            .name
            .ok_or_else(|| PlanningError::precondition("ad-hoc proposal requires a name"))?;

        let new = NewProposal {
            trip_id,
            kind,
            option_id: None,
            proposed_by: user_id,
            name,
            location: details.location,
            price: details.price,
        };
        let id = self.proposals.insert(&new).await?;
        let proposal = self
            .proposals
            .get(id)
            .await?
            .ok_or_else(|| PlanningError::not_found("proposal"))?;

        tracing::info!("ad-hoc {} proposal {} created", kind.as_str(), id);
        fan_out(
            &self.dispatcher,
            vec![Fact::ProposalCreated {
                trip_id,
                proposal_id: id,
                subject_user_id: user_id,
                occurred_at: common::time::now(),
            }],
        )
        .await;

        Ok(EnsureOutcome {
            proposal,
            was_created: true,
        })
    }

    pub async fn rank_from_input(
        &self,
        input: RankInput,
        user_id: i64,
    ) -> Result<RankOutcome, PlanningError> {
        self.rank(input.proposal_id, user_id, input.rank_value, input.notes)
            .await
    }

    /// Upsert one member's ranking and recompute the cached average for
    /// every active proposal referencing the same saved option, since each
    /// of their displayed averages may have changed.
    pub async fn rank(
        &self,
        proposal_id: i64,
        user_id: i64,
        rank_value: i32,
        notes: Option<String>,
    ) -> Result<RankOutcome, PlanningError> {
        let proposal = self
            .proposals
            .get(proposal_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("proposal"))?;
        if !proposal.is_active() {
            return Err(PlanningError::not_found("proposal"));
        }

        let roster = self
            .trips
            .roster(proposal.trip_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("trip"))?;
        if !roster.contains(user_id) {
            return Err(PlanningError::NotTripMember { user_id });
        }

        self.proposals
            .upsert_ranking(proposal_id, user_id, rank_value, notes.as_deref())
            .await?;

        let affected = match proposal.option_id {
            Some(option_id) => {
                self.proposals
                    .active_sharing_option(proposal.trip_id, &proposal.kind, option_id)
                    .await?
            }
            None => vec![proposal.clone()],
        };

        let mut affected_proposal_ids = Vec::with_capacity(affected.len());
        for p in &affected {
            let values = self.proposals.rank_values(p.id).await?;
            let avg = crate::domain::average_rank(&values);
            self.proposals.update_avg(p.id, avg).await?;
            affected_proposal_ids.push(p.id);
        }

        tracing::info!(
            "user {} ranked proposal {}, {} averages recomputed",
            user_id,
            proposal_id,
            affected_proposal_ids.len()
        );

        let occurred_at = common::time::now();
        let facts = affected_proposal_ids
            .iter()
            .map(|id| Fact::ProposalRanked {
                trip_id: proposal.trip_id,
                proposal_id: *id,
                subject_user_id: user_id,
                occurred_at,
            })
            .collect();
        fan_out(&self.dispatcher, facts).await;

        Ok(RankOutcome {
            trip_id: proposal.trip_id,
            affected_proposal_ids,
        })
    }

    /// Proposer-only soft cancel; rankings stay for history.
    pub async fn cancel(&self, proposal_id: i64, user_id: i64) -> Result<Proposal, PlanningError> {
        let proposal = self
            .proposals
            .get(proposal_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("proposal"))?;
        proposal.cancel_guard(user_id)?;

        self.proposals.cancel(proposal_id).await?;
        let updated = self
            .proposals
            .get(proposal_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("proposal"))?;

        tracing::info!("proposal {} canceled", proposal_id);
        fan_out(
            &self.dispatcher,
            vec![Fact::ProposalCanceled {
                trip_id: proposal.trip_id,
                proposal_id,
                subject_user_id: user_id,
                occurred_at: common::time::now(),
            }],
        )
        .await;

        Ok(updated)
    }

    pub async fn list_active(
        &self,
        trip_id: i64,
        kind: ProposalKind,
    ) -> Result<Vec<Proposal>, PlanningError> {
        Ok(self.proposals.list_active(trip_id, kind).await?)
    }

    /// Idempotency decision: an already-existing active proposal for the
    /// key wins and creation is skipped; the caller learns it was not the
    /// one to create it.
    fn reuse_existing(existing: Option<Proposal>) -> Option<EnsureOutcome> {
        existing.map(|proposal| EnsureOutcome {
            proposal,
            was_created: false,
        })
    }

    fn details_from_input(input: &ProposeInput) -> Option<ProposalDetails> {
        if input.name.is_none() && input.location.is_none() && input.price.is_none() {
            return None;
        }
        Some(ProposalDetails {
            name: input.name.clone(),
            location: input.location.clone(),
            price: input.price,
        })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
