pub mod activity;
pub mod invite;
pub mod proposal;
pub mod trip;

pub use activity::{Activity, ActivityKind, ActivityStatus, ActivityView, NewActivity};
pub use invite::{
    promotion_candidate, should_promote, ActivityInvite, InviteStatus, RsvpRecord, RsvpResponse,
};
pub use proposal::{
    apply_ranking, average_rank, NewProposal, Proposal, ProposalDetails, ProposalKind, SavedOption,
};
pub use trip::{Trip, TripMember, TripRoster};
