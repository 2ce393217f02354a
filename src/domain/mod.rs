pub mod identity;
pub mod status;
pub mod ticket;
