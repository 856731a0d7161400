pub mod activity_repo;
pub mod invite_repo;
pub mod proposal_repo;
pub mod trip_repo;

pub use activity_repo::{ActivityRepository, CreateOutcome};
pub use invite_repo::{InviteRepository, RsvpWrite};
pub use proposal_repo::ProposalRepository;
pub use trip_repo::TripRepository;
