//! In-process admission store.
//!
//! A single async mutex serialises transactions. Each transaction mutates a
//! private copy of the state which replaces the shared one on commit, so an
//! abandoned or failed transaction leaves nothing behind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{ensure_ticket_invariant, AdmissionStore, AdmissionTx};
use crate::{
    error::{AppError, AppResult},
    models::{
        CapacityDefaults, Category, HelpRequest, HelpRequestQuery, RequestStatus, VisitCapacity,
    },
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    requests: HashMap<Uuid, HelpRequest>,
    capacities: HashMap<NaiveDate, VisitCapacity>,
    sequences: HashMap<NaiveDate, i32>,
}

impl MemoryState {
    fn sorted<'a>(requests: impl Iterator<Item = &'a HelpRequest>) -> Vec<HelpRequest> {
        let mut out: Vec<HelpRequest> = requests.cloned().collect();
        out.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.reference.cmp(&b.reference))
        });
        out
    }

    fn find_by_ticket(&self, ticket_number: &str) -> Option<HelpRequest> {
        self.requests
            .values()
            .find(|r| r.ticket_number.as_deref() == Some(ticket_number))
            .cloned()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no transaction currently holds the store
    pub fn try_is_unlocked(&self) -> bool {
        self.state.try_lock().is_ok()
    }
}

#[async_trait]
impl AdmissionStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn AdmissionTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn insert_request(&self, request: &HelpRequest) -> AppResult<()> {
        ensure_ticket_invariant(request)?;
        let mut state = self.state.lock().await;
        if state.requests.contains_key(&request.id)
            || state.requests.values().any(|r| r.reference == request.reference)
        {
            return Err(AppError::Conflict("Help request reference already exists".to_string()));
        }
        state.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_request(&self, id: Uuid) -> AppResult<Option<HelpRequest>> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn list_requests(&self, query: &HelpRequestQuery) -> AppResult<Vec<HelpRequest>> {
        let state = self.state.lock().await;
        Ok(MemoryState::sorted(
            state.requests.values().filter(|r| query.matches(r)),
        ))
    }

    async fn find_capacity(&self, date: NaiveDate) -> AppResult<Option<VisitCapacity>> {
        Ok(self.state.lock().await.capacities.get(&date).cloned())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl AdmissionTx for MemoryTx {
    async fn lock_request(&mut self, id: Uuid) -> AppResult<Option<HelpRequest>> {
        Ok(self.working.requests.get(&id).cloned())
    }

    async fn lock_request_by_ticket(&mut self, ticket_number: &str) -> AppResult<Option<HelpRequest>> {
        Ok(self.working.find_by_ticket(ticket_number))
    }

    async fn lock_capacity(
        &mut self,
        date: NaiveDate,
        defaults: CapacityDefaults,
        now: DateTime<Utc>,
    ) -> AppResult<VisitCapacity> {
        Ok(self
            .working
            .capacities
            .entry(date)
            .or_insert_with(|| VisitCapacity::with_defaults(date, defaults, now))
            .clone())
    }

    async fn reserve_capacity(
        &mut self,
        date: NaiveDate,
        category: &Category,
        n: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VisitCapacity>> {
        let Some(capacity) = self.working.capacities.get_mut(&date) else {
            return Ok(None);
        };
        if !capacity.try_consume(category, n) {
            return Ok(None);
        }
        capacity.updated_at = now;
        Ok(Some(capacity.clone()))
    }

    async fn save_capacity(&mut self, capacity: &VisitCapacity) -> AppResult<()> {
        let stored = self
            .working
            .capacities
            .get_mut(&capacity.date)
            .ok_or_else(|| AppError::NotFound(format!("No capacity record for {}", capacity.date)))?;
        stored.max_food = capacity.max_food;
        stored.max_general = capacity.max_general;
        stored.is_operating_day = capacity.is_operating_day;
        stored.updated_at = capacity.updated_at;
        if !stored.within_bounds() {
            return Err(AppError::Internal(format!(
                "Capacity for {} would drop below consumed count",
                capacity.date
            )));
        }
        Ok(())
    }

    async fn next_ticket_sequence(&mut self, date: NaiveDate) -> AppResult<i32> {
        let seq = self.working.sequences.entry(date).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn lock_approved_candidates(
        &mut self,
        date: NaiveDate,
        category: &Category,
    ) -> AppResult<Vec<HelpRequest>> {
        Ok(MemoryState::sorted(self.working.requests.values().filter(|r| {
            r.status == RequestStatus::Approved
                && r.visit_day == Some(date)
                && &r.category == category
        })))
    }

    async fn save_request(&mut self, request: &HelpRequest) -> AppResult<()> {
        ensure_ticket_invariant(request)?;
        if !self.working.requests.contains_key(&request.id) {
            return Err(AppError::NotFound(format!(
                "Help request with id {} not found",
                request.id
            )));
        }
        if let Some(ticket) = request.ticket_number.as_deref() {
            let taken = self
                .working
                .requests
                .values()
                .any(|r| r.id != request.id && r.ticket_number.as_deref() == Some(ticket));
            if taken {
                return Err(AppError::Conflict("Ticket number already assigned".to_string()));
            }
        }
        self.working.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
