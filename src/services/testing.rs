//! In-memory collaborators for exercising the query layer without a backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use crate::domain::identity::UserId;
use crate::domain::status::TicketStatus;
use crate::domain::ticket::{FieldUpdate, NewTicket, Ticket, TicketId, TicketPatch};
use crate::error::{AppError, AppResult};
use crate::services::{Notification, Notifier, TicketService};

#[derive(Default)]
pub struct InMemoryTicketService {
    rows: Mutex<Vec<Ticket>>,
    created: AtomicUsize,
    calls: AtomicUsize,
    list_calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    list_failure: Mutex<Option<String>>,
    create_gate: Option<Arc<Notify>>,
}

impl InMemoryTicketService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds every create until the returned handle is notified.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let service = Self {
            create_gate: Some(gate.clone()),
            ..Self::default()
        };
        (service, gate)
    }

    /// Makes every subsequent call fail with a backend error.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// Fails only list reads; mutations keep succeeding.
    pub fn fail_lists_with(&self, message: &str) {
        *self.list_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
        *self.list_failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(AppError::Backend(message)),
            None => Ok(()),
        }
    }

    fn next_timestamp(&self) -> (usize, DateTime<Utc>) {
        let sequence = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        (sequence, base + Duration::minutes(sequence as i64))
    }
}

#[async_trait]
impl TicketService for InMemoryTicketService {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.enter()?;
        if let Some(message) = self.list_failure.lock().unwrap().clone() {
            return Err(AppError::Backend(message));
        }
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create_ticket(&self, input: &NewTicket, owner: &UserId) -> AppResult<Ticket> {
        let draft = input.validate()?;
        if let Some(gate) = &self.create_gate {
            gate.notified().await;
        }
        self.enter()?;

        let (sequence, now) = self.next_timestamp();
        let ticket = Ticket {
            id: TicketId(format!("ticket-{sequence}")),
            user_id: owner.clone(),
            title: draft.title,
            description: draft.description,
            deadline: draft.deadline,
            status: TicketStatus::InProgress,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(ticket.clone());
        Ok(ticket)
    }

    async fn update_ticket(&self, id: &TicketId, patch: TicketPatch) -> AppResult<Ticket> {
        let patch = patch.validate()?;
        self.enter()?;

        let mut rows = self.rows.lock().unwrap();
        let ticket = rows
            .iter_mut()
            .find(|ticket| &ticket.id == id)
            .ok_or_else(|| AppError::NotFound(format!("ticket {id}")))?;

        if let Some(title) = patch.title {
            ticket.title = title;
        }
        match patch.description {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => ticket.description = None,
            FieldUpdate::Set(text) => ticket.description = Some(text),
        }
        if let Some(deadline) = patch.deadline {
            ticket.deadline = deadline;
        }
        if let Some(status) = patch.status {
            ticket.status = status;
        }
        ticket.updated_at = ticket.updated_at + Duration::seconds(1);
        Ok(ticket.clone())
    }

    async fn delete_ticket(&self, id: &TicketId) -> AppResult<()> {
        self.enter()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|ticket| &ticket.id != id);
        if rows.len() == before {
            return Err(AppError::NotFound(format!("ticket {id}")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().unwrap().push(notification);
    }
}
