use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::identity::UserId;
use crate::domain::status::{StatusFilter, TicketStatus};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Past its deadline and not completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.deadline < now && self.status != TicketStatus::Completed
    }

    pub fn is_due_today(&self, now: DateTime<Utc>) -> bool {
        self.deadline.date_naive() == now.date_naive()
    }
}

/// Raw create input as typed by a user.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<String>,
}

/// Create input that passed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
}

impl NewTicket {
    pub fn validate(&self) -> AppResult<TicketDraft> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }

        let deadline = match self.deadline.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_deadline(raw)?,
            _ => return Err(AppError::Validation("deadline is required".to_string())),
        };

        Ok(TicketDraft {
            title: title.to_string(),
            description: normalize_description(self.description.as_deref()),
            deadline,
        })
    }
}

/// Three-way field change: leave as is, clear to null, or replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Keep
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldUpdate::Keep)
    }
}

/// Partial update. Only supplied fields change on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: FieldUpdate<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<TicketStatus>,
}

impl TicketPatch {
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_keep()
            && self.deadline.is_none()
            && self.status.is_none()
    }

    /// Trims text fields and rejects patches that would break ticket invariants.
    pub fn validate(self) -> AppResult<TicketPatch> {
        if self.is_empty() {
            return Err(AppError::Validation("no fields to update".to_string()));
        }

        let title = match self.title {
            Some(title) => {
                let trimmed = title.trim();
                if trimmed.is_empty() {
                    return Err(AppError::Validation("title cannot be empty".to_string()));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };

        let description = match self.description {
            FieldUpdate::Set(text) => match normalize_description(Some(&text)) {
                Some(text) => FieldUpdate::Set(text),
                None => FieldUpdate::Clear,
            },
            other => other,
        };

        Ok(TicketPatch {
            title,
            description,
            deadline: self.deadline,
            status: self.status,
        })
    }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_deadline(raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::Validation(format!("invalid deadline '{raw}'")))
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn filter_tickets(tickets: &[Ticket], filter: StatusFilter) -> Vec<&Ticket> {
    tickets
        .iter()
        .filter(|ticket| filter.matches(ticket.status))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
}

impl StatusCounts {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let mut counts = Self::default();
        for ticket in tickets {
            match ticket.status {
                TicketStatus::InProgress => counts.in_progress += 1,
                TicketStatus::Completed => counts.completed += 1,
                TicketStatus::Blocked => counts.blocked += 1,
            }
        }
        counts
    }

    pub fn get(&self, status: TicketStatus) -> usize {
        match status {
            TicketStatus::InProgress => self.in_progress,
            TicketStatus::Completed => self.completed,
            TicketStatus::Blocked => self.blocked,
        }
    }
}
