use std::sync::Arc;

use contracts::inputs::RsvpInput;
use contracts::Fact;

use crate::dispatch::{fan_out, Dispatcher};
use crate::domain::{ActivityInvite, ActivityView, InviteStatus, RsvpRecord, RsvpResponse};
use crate::error::PlanningError;
use crate::repo::{ActivityRepository, InviteRepository, TripRepository};

#[derive(Debug)]
pub struct RespondOutcome {
    pub view: ActivityView,
    pub invite: ActivityInvite,
    pub promoted_user_id: Option<i64>,
}

#[derive(Clone)]
pub struct RsvpService {
    trips: TripRepository,
    activities: ActivityRepository,
    invites: InviteRepository,
    dispatcher: Arc<dyn Dispatcher>,
}

impl RsvpService {
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

    pub async fn respond_from_input(
        &self,
        input: RsvpInput,
        user_id: i64,
    ) -> Result<RespondOutcome, PlanningError> {
        let response = RsvpResponse::parse(&input.status)
            .ok_or_else(|| PlanningError::precondition("unknown rsvp status"))?;
        self.respond(input.activity_id, user_id, response).await
    }

    /// Record one member's RSVP and run waitlist promotion. The write and
    /// the promotion share a transaction keyed on the activity row, so at
    /// most one invite is promoted per call and concurrent responds
    /// serialize.
    pub async fn respond(
        &self,
        activity_id: i64,
        user_id: i64,
        response: RsvpResponse,
    ) -> Result<RespondOutcome, PlanningError> {
        let activity = self
            .activities
            .get(activity_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("activity"))?;
        if !activity.is_active() {
            return Err(PlanningError::not_found("activity"));
        }

        let roster = self
            .trips
            .roster(activity.trip_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("trip"))?;
        if !roster.contains(user_id) {
            return Err(PlanningError::NotTripMember { user_id });
        }

        let new_status = response.resulting_status();
        let write = self
            .invites
            .respond_with_promotion(activity_id, user_id, new_status)
            .await?
            .ok_or_else(|| PlanningError::not_found("activity"))?;

        tracing::info!(
            "user {} responded {} to activity {}",
            user_id,
            new_status.as_str(),
            activity_id
        );

        let occurred_at = common::time::now();
        let mut facts = Vec::new();
        if user_id != activity.posted_by
            && matches!(new_status, InviteStatus::Accepted | InviteStatus::Declined)
        {
            facts.push(Fact::InviteUpdated {
                trip_id: activity.trip_id,
                activity_id,
                subject_user_id: user_id,
                poster_id: activity.posted_by,
                status: new_status.as_str().to_string(),
                occurred_at,
            });
        }
        let promoted_user_id = write.promoted.as_ref().map(|p| p.user_id);
        if let Some(promoted) = &write.promoted {
            tracing::info!(
                "user {} promoted from waitlist on activity {}",
                promoted.user_id,
                activity_id
            );
            facts.push(Fact::InvitePromoted {
                trip_id: activity.trip_id,
                activity_id,
                subject_user_id: promoted.user_id,
                occurred_at,
            });
        }
        fan_out(&self.dispatcher, facts).await;

        // Refreshed view reflecting both the responder's change and any
        // promotion.
        let refreshed = self
            .activities
            .get(activity_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("activity"))?;
        let invites = self.invites.list_for_activity(activity_id).await?;

        Ok(RespondOutcome {
            view: ActivityView {
                activity: refreshed,
                invites,
            },
            invite: write.invite,
            promoted_user_id,
        })
    }

    /// Historical responses for an activity, oldest last.
    pub async fn history(&self, activity_id: i64) -> Result<Vec<RsvpRecord>, PlanningError> {
        self.activities
            .get(activity_id)
            .await?
            .ok_or_else(|| PlanningError::not_found("activity"))?;
        Ok(self.invites.history(activity_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_status_must_be_a_valid_response() {
        assert!(RsvpResponse::parse("accepted").is_some());
        assert!(RsvpResponse::parse("waitlist").is_some());
        assert!(RsvpResponse::parse("pending").is_none());
        assert!(RsvpResponse::parse("").is_none());
    }

    #[test]
    fn poster_notification_rule() {
        // Emitted only when a non-poster accepts or declines.
        let poster = 1;
        for (responder, status, expected) in [
            (2, InviteStatus::Accepted, true),
            (2, InviteStatus::Declined, true),
            (2, InviteStatus::Waitlisted, false),
            (1, InviteStatus::Accepted, false),
        ] {
            let emits = responder != poster
                && matches!(status, InviteStatus::Accepted | InviteStatus::Declined);
            assert_eq!(emits, expected, "responder {} status {:?}", responder, status);
        }
    }
}
