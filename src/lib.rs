//! Personal ticket tracker over a hosted PostgREST backend.
//!
//! [`services::TicketService`] maps CRUD intents to backend calls and
//! [`query::TicketQueryClient`] keeps a cached ticket list consistent with
//! the server after every mutation.

pub mod auth;
pub mod cache;
pub mod cmd;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod infra;
pub mod query;
pub mod services;
