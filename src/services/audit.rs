//! Audit trail written after admission decisions commit

use async_trait::async_trait;

use crate::{error::AppResult, models::AuditEntry, repository::audit_logs::AuditLogsRepository};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> AppResult<()>;
}

#[async_trait]
impl AuditLog for AuditLogsRepository {
    async fn record(&self, entry: &AuditEntry) -> AppResult<()> {
        self.insert(entry).await
    }
}
