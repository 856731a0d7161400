pub mod activity_service;
pub mod proposal_service;
pub mod rsvp_service;

pub use activity_service::ActivityService;
pub use proposal_service::{EnsureOutcome, ProposalService, RankOutcome};
pub use rsvp_service::{RespondOutcome, RsvpService};
