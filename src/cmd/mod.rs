pub mod auth;
pub mod config;
pub mod prompt;
pub mod ticket;

/// How a command finished when it did not return an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Failed after the failure was already reported to the user.
    Failed,
}
