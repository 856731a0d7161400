pub mod dispatch;
pub mod domain;
pub mod error;
pub mod repo;
pub mod service;

use std::sync::Arc;

use common::config::DbConfig;
use sqlx::MySqlPool;

use crate::dispatch::Dispatcher;
use crate::repo::{ActivityRepository, InviteRepository, ProposalRepository, TripRepository};
use crate::service::{ActivityService, ProposalService, RsvpService};

pub use crate::error::PlanningError;

/// Wiring facade: one pool, the repositories, and the three engine
/// services, with the side-effect dispatcher injected at construction.
#[derive(Clone)]
pub struct Planner {
    pub activities: ActivityService,
    pub rsvps: RsvpService,
    pub proposals: ProposalService,
    pool: MySqlPool,
}

impl Planner {
    pub fn new(pool: MySqlPool, dispatcher: Arc<dyn Dispatcher>) -> Self {
        let trip_repo = TripRepository::new(pool.clone());
        let activity_repo = ActivityRepository::new(pool.clone());
        let invite_repo = InviteRepository::new(pool.clone());
        let proposal_repo = ProposalRepository::new(pool.clone());

        Self {
            activities: ActivityService::new(
                trip_repo.clone(),
                activity_repo.clone(),
                invite_repo.clone(),
                dispatcher.clone(),
            ),
            rsvps: RsvpService::new(
                trip_repo.clone(),
                activity_repo.clone(),
                invite_repo.clone(),
                dispatcher.clone(),
            ),
            proposals: ProposalService::new(trip_repo, proposal_repo, dispatcher),
            pool,
        }
    }

    pub async fn connect(
        config: &DbConfig,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> anyhow::Result<Self> {
        let pool = db::create_pool(config).await?;
        Ok(Self::new(pool, dispatcher))
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}
