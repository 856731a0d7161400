use std::sync::Arc;

use contracts::inputs::CreateActivityInput;
use contracts::Fact;

use crate::dispatch::{fan_out, Dispatcher};
use crate::domain::{Activity, ActivityKind, ActivityView, NewActivity};
use crate::error::PlanningError;
use crate::repo::{ActivityRepository, CreateOutcome, InviteRepository, TripRepository};

#[derive(Clone)]
pub struct ActivityService {
    trips: TripRepository,
    activities: ActivityRepository,
    invites: InviteRepository,
    dispatcher: Arc<dyn Dispatcher>,
}

impl ActivityService {
    pub fn new(
        trips: TripRepository,
        activities: ActivityRepository,
        invites: InviteRepository,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            trips,
            activities,
            invites,
            dispatcher,
        }
    }

    /// Normalized-boundary entry point: turns a request payload into the
    /// engine's own types, then runs the atomic create.
    pub async fn create_from_input(
        &self,
        input: CreateActivityInput,
        poster_id: i64,
    ) -> Result<ActivityView, PlanningError> {
        let (new, invitee_ids) = Self::normalize_input(input)?;
        self.create_with_invites(new, poster_id, invitee_ids).await
    }

    /// Atomic create-with-invites. Roster checks and the duplicate search
    /// run before any write; the activity row and its invite rows then
    /// land in a single transaction or not at all.
    pub async fn create_with_invites(
        &self,
        new: NewActivity,
        poster_id: i64,
        invitee_ids: Vec<i64>,
    ) -> Result<ActivityView, PlanningError> {
        let roster = self
            .trips
            .roster(new.trip_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("trip"))?;
        if !roster.contains(poster_id) {
            return Err(PlanningError::NotTripMember { user_id: poster_id });
        }
        let missing = roster.missing_from(&invitee_ids);
        if !missing.is_empty() {
            return Err(PlanningError::InviteesNotMembers { user_ids: missing });
        }

        if let Some(existing_id) = self
            .activities
            .find_active_duplicate(new.trip_id, &new.name, new.starts_at)
            .await?
        {
            return Err(PlanningError::DuplicateActivity { existing_id });
        }

        let mut distinct = Vec::with_capacity(invitee_ids.len());
        for id in invitee_ids {
            if !distinct.contains(&id) {
                distinct.push(id);
            }
        }

        let activity_id = match self
            .activities
            .create_with_invites(&new, poster_id, &distinct)
            .await?
        {
            CreateOutcome::Created(id) => id,
            CreateOutcome::RejectedNonMembers(user_ids) => {
                return Err(PlanningError::InviteesNotMembers { user_ids });
            }
        };

        tracing::info!(
            "activity {} created in trip {} with {} invites",
            activity_id,
            new.trip_id,
            distinct.len()
        );

        let view = self.get(activity_id).await?;
        fan_out(
            &self.dispatcher,
            vec![Fact::ActivityCreated {
                trip_id: new.trip_id,
                activity_id,
                subject_user_id: poster_id,
                occurred_at: common::time::now(),
            }],
        )
        .await;

        Ok(view)
    }

    /// Flip a proposed activity onto the calendar; poster only. Every
    /// existing invitee gets a converted fact.
    pub async fn convert_to_scheduled(
        &self,
        activity_id: i64,
        user_id: i64,
    ) -> Result<Activity, PlanningError> {
        let activity = self
            .activities
            .get(activity_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("activity"))?;
        activity.convert_guard(user_id)?;

        self.activities.set_scheduled(activity_id).await?;
        let updated = self
            .activities
            .get(activity_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("activity"))?;

        tracing::info!("activity {} converted to scheduled", activity_id);

        let invites = self.invites.list_for_activity(activity_id).await?;
        let occurred_at = common::time::now();
        let facts = invites
            .iter()
            .map(|invite| Fact::ActivityConverted {
                trip_id: activity.trip_id,
                activity_id,
                subject_user_id: invite.user_id,
                occurred_at,
            })
            .collect();
        fan_out(&self.dispatcher, facts).await;

        Ok(updated)
    }

    /// Poster-only soft cancel; invite rows stay attributable.
    pub async fn cancel(&self, activity_id: i64, user_id: i64) -> Result<Activity, PlanningError> {
        let activity = self
            .activities
            .get(activity_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("activity"))?;
        activity.cancel_guard(user_id)?;

        self.activities.set_canceled(activity_id).await?;
        let updated = self
            .activities
            .get(activity_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("activity"))?;

        tracing::info!("activity {} canceled", activity_id);

        fan_out(
            &self.dispatcher,
            vec![Fact::ActivityCanceled {
                trip_id: activity.trip_id,
                activity_id,
                subject_user_id: user_id,
                occurred_at: common::time::now(),
            }],
        )
        .await;

        Ok(updated)
    }

    pub async fn get(&self, activity_id: i64) -> Result<ActivityView, PlanningError> {
        let activity = self
            .activities
            .get(activity_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("activity"))?;
        let invites = self.invites.list_for_activity(activity_id).await?;
        Ok(ActivityView { activity, invites })
    }

    fn normalize_input(
        input: CreateActivityInput,
    ) -> Result<(NewActivity, Vec<i64>), PlanningError> {
        let kind = match input.kind.as_deref() {
            None => ActivityKind::Scheduled,
            Some(s) => ActivityKind::parse(s)
                .ok_or_else(|| PlanningError::precondition("unknown activity kind"))?,
        };
        if kind == ActivityKind::Scheduled && input.starts_at.is_none() {
            return Err(PlanningError::precondition(
                "a scheduled activity requires a start time",
            ));
        }

        let new = NewActivity {
            trip_id: input.trip_id,
            name: input.name,
            description: input.description,
            location: input.location,
            cost: input.cost,
            category: input.category,
            kind,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            max_capacity: input.max_capacity,
        };
        Ok((new, input.invitee_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(kind: Option<&str>, starts_at: bool) -> CreateActivityInput {
        serde_json::from_str::<CreateActivityInput>(&format!(
            r#"{{"trip_id": 1, "name": "Kayaking"{}{}}}"#,
            kind.map(|k| format!(r#", "kind": "{}""#, k)).unwrap_or_default(),
            if starts_at {
                r#", "starts_at": "2026-09-01T09:00:00Z""#
            } else {
                ""
            }
        ))
        .unwrap()
    }

    #[test]
    fn kind_defaults_to_scheduled() {
        let (new, _) = ActivityService::normalize_input(input(None, true)).unwrap();
        assert_eq!(new.kind, ActivityKind::Scheduled);
    }

    #[test]
    fn scheduled_requires_start_time() {
        let err = ActivityService::normalize_input(input(None, false)).unwrap_err();
        assert!(matches!(err, PlanningError::Precondition { .. }));
    }

    #[test]
    fn propose_allows_missing_start_time() {
        let (new, _) = ActivityService::normalize_input(input(Some("propose"), false)).unwrap();
        assert_eq!(new.kind, ActivityKind::Propose);
        assert!(new.starts_at.is_none());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = ActivityService::normalize_input(input(Some("meetup"), true)).unwrap_err();
        assert!(matches!(err, PlanningError::Precondition { .. }));
    }
}
