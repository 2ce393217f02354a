pub mod client;
pub mod mutation;

pub use client::TicketQueryClient;
pub use mutation::{MutationKind, MutationState, MutationStatus};
