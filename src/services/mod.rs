//! Business logic services

pub mod admission;
pub mod audit;
pub mod check_in;
pub mod clock;
pub mod eligibility;
pub mod intake;
pub mod notifications;

use std::sync::Arc;

use crate::{config::AdmissionConfig, error::AppResult, repository::AdmissionStore};

pub use admission::{AdmissionController, Collaborators};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub admission: admission::AdmissionController,
    pub intake: intake::IntakeService,
    pub check_in: check_in::CheckInService,
    pub clock: Arc<dyn clock::Clock>,
    store: Arc<dyn AdmissionStore>,
}

impl Services {
    /// Create all services over the given store
    pub fn new(
        store: Arc<dyn AdmissionStore>,
        config: &AdmissionConfig,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            admission: admission::AdmissionController::new(store.clone(), config, collaborators.clone()),
            intake: intake::IntakeService::new(
                store.clone(),
                collaborators.clock.clone(),
                config.timezone,
            ),
            check_in: check_in::CheckInService::new(
                store.clone(),
                collaborators.audit.clone(),
                collaborators.clock.clone(),
                config.timezone,
            ),
            clock: collaborators.clock,
            store,
        }
    }

    /// Verify the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
