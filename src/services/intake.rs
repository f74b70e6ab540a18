//! Visitor intake: records new help requests in `Pending` status

use std::sync::Arc;

use chrono_tz::Tz;

use crate::{
    error::{AppError, AppResult},
    models::{HelpRequest, NewHelpRequest},
    repository::AdmissionStore,
    services::clock::{local_date, Clock},
};

/// Fresh references drawn before giving up on a colliding one
const REFERENCE_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn AdmissionStore>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
}

impl IntakeService {
    pub fn new(store: Arc<dyn AdmissionStore>, clock: Arc<dyn Clock>, timezone: Tz) -> Self {
        Self { store, clock, timezone }
    }

    /// Submit a new help request
    pub async fn submit(&self, data: &NewHelpRequest) -> AppResult<HelpRequest> {
        let now = self.clock.now();

        if let Some(day) = data.visit_day {
            if day < local_date(now, self.timezone) {
                return Err(AppError::Validation(format!(
                    "Visit day {} is in the past",
                    day
                )));
            }
        }

        let mut attempt = 1;
        let request = loop {
            let request = HelpRequest::new_pending(data, now);
            match self.store.insert_request(&request).await {
                Ok(()) => break request,
                Err(AppError::Conflict(_)) if attempt < REFERENCE_ATTEMPTS => {
                    tracing::warn!(reference = %request.reference, attempt, "Reference collision, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!(
            request_id = %request.id,
            reference = %request.reference,
            category = %request.category,
            "Help request submitted"
        );
        Ok(request)
    }
}
