use async_trait::async_trait;

use crate::domain::identity::UserId;
use crate::domain::ticket::{NewTicket, Ticket, TicketId, TicketPatch};
use crate::error::AppResult;

/// Typed CRUD over the caller's tickets. One backend round trip per call.
#[async_trait]
pub trait TicketService: Send + Sync {
    /// All tickets visible to the caller, newest first.
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>>;
    /// Persists a new ticket owned by `owner`; status always starts as in progress.
    async fn create_ticket(&self, input: &NewTicket, owner: &UserId) -> AppResult<Ticket>;
    async fn update_ticket(&self, id: &TicketId, patch: TicketPatch) -> AppResult<Ticket>;
    async fn delete_ticket(&self, id: &TicketId) -> AppResult<()>;
}
