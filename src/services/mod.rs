pub mod auth;
pub mod notifier;
pub mod ticket_service;

pub use auth::AuthService;
pub use notifier::{Notification, Notifier, Severity};
pub use ticket_service::TicketService;

#[cfg(test)]
pub mod testing;
