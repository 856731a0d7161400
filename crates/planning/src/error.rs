use thiserror::Error;

/// Error categories the embedding request layer branches on.
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("invitees are not members of the trip: {user_ids:?}")]
    InviteesNotMembers { user_ids: Vec<i64> },

    #[error("user {user_id} is not a member of the trip")]
    NotTripMember { user_id: i64 },

    #[error("an active activity with the same name and start time already exists (id {existing_id})")]
    DuplicateActivity { existing_id: i64 },

    #[error("only the owner may perform this action")]
    NotOwner,

    #[error("{what} not found")]
    NotFound { what: &'static str },

    #[error("precondition failed: {reason}")]
    Precondition { reason: &'static str },

    #[error("saved option {option_id} does not belong to trip {trip_id}")]
    OptionTripMismatch { option_id: i64, trip_id: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PlanningError {
    pub fn not_found(what: &'static str) -> Self {
        PlanningError::NotFound { what }
    }

    pub fn precondition(reason: &'static str) -> Self {
        PlanningError::Precondition { reason }
    }
}
