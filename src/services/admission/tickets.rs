//! Ticket numbers and check-in codes

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    config::AdmissionConfig,
    error::{AppError, AppResult},
    repository::AdmissionTx,
};

/// Action tag embedded in every check-in code
pub const CHECK_IN_ACTION: &str = "checkin";

#[derive(Debug, Clone)]
pub struct TicketIssuer {
    prefix: String,
    max_sequence: i32,
}

#[derive(Serialize)]
struct CheckInPayload<'a> {
    ticket: &'a str,
    action: &'a str,
    date: String,
}

impl TicketIssuer {
    pub fn new(prefix: impl Into<String>, max_sequence: i32) -> Self {
        Self {
            prefix: prefix.into(),
            max_sequence,
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(config.ticket_prefix.clone(), config.max_daily_tickets)
    }

    /// `{prefix}{YYYYMMDD}{seq:03}`. The sequence comes from the per-day
    /// counter advanced inside `tx`, never from counting issued tickets.
    pub async fn next_ticket_number(
        &self,
        tx: &mut dyn AdmissionTx,
        date: NaiveDate,
    ) -> AppResult<String> {
        let seq = tx.next_ticket_sequence(date).await?;
        if seq > self.max_sequence {
            return Err(AppError::SequenceExhausted(date));
        }
        Ok(self.format(date, seq))
    }

    fn format(&self, date: NaiveDate, seq: i32) -> String {
        format!("{}{}{:03}", self.prefix, date.format("%Y%m%d"), seq)
    }

    /// Deterministic payload rendered as the ticket's QR code
    pub fn derive_check_in_code(ticket_number: &str, date: NaiveDate) -> String {
        let payload = CheckInPayload {
            ticket: ticket_number,
            action: CHECK_IN_ACTION,
            date: date.format("%Y-%m-%d").to_string(),
        };
        // Serializing a struct of strings cannot fail.
        serde_json::to_string(&payload).unwrap_or_default()
    }
}
