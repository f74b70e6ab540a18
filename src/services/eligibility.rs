//! Visitor eligibility check consulted before approval

use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::AppResult, repository::visitors::VisitorsRepository};

/// Outcome of an eligibility check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityDecision {
    pub allowed: bool,
    pub reason: String,
}

impl EligibilityDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self { allowed: true, reason: reason.into() }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self { allowed: false, reason: reason.into() }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EligibilityGate: Send + Sync {
    async fn check(&self, visitor_id: Uuid) -> AppResult<EligibilityDecision>;
}

#[async_trait]
impl EligibilityGate for VisitorsRepository {
    async fn check(&self, visitor_id: Uuid) -> AppResult<EligibilityDecision> {
        let decision = match self.standing(visitor_id).await? {
            None => EligibilityDecision::deny("Visitor is not registered"),
            Some(s) if !s.is_active => EligibilityDecision::deny("Visitor account is inactive"),
            Some(s) if !s.documents_verified => {
                EligibilityDecision::deny("Visitor documents are not verified")
            }
            Some(_) => EligibilityDecision::allow("Visitor documents verified"),
        };
        Ok(decision)
    }
}
