use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationState {
    pub status: MutationStatus,
    pub error: Option<String>,
}

impl MutationState {
    fn idle() -> Self {
        Self {
            status: MutationStatus::Idle,
            error: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }
}

/// Identifies one invocation handed out by [`MutationTracker::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation(u64);

/// Publishes `idle -> pending -> success | error` for one kind of mutation.
///
/// Each invocation restarts from pending; nothing is retried in place.
/// Only the most recent invocation may settle the published state, so an
/// older call finishing late never hides a newer one that is still pending.
#[derive(Debug)]
pub struct MutationTracker {
    kind: MutationKind,
    latest: AtomicU64,
    state: watch::Sender<MutationState>,
}

impl MutationTracker {
    pub fn new(kind: MutationKind) -> Self {
        let (state, _) = watch::channel(MutationState::idle());
        Self {
            kind,
            latest: AtomicU64::new(0),
            state,
        }
    }

    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    pub(crate) fn start(&self) -> Invocation {
        let invocation = Invocation(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
        tracing::debug!(kind = ?self.kind, invocation = invocation.0, "mutation pending");
        self.state.send_replace(MutationState {
            status: MutationStatus::Pending,
            error: None,
        });
        invocation
    }

    pub(crate) fn succeed(&self, invocation: Invocation) {
        tracing::debug!(kind = ?self.kind, invocation = invocation.0, "mutation succeeded");
        self.settle(
            invocation,
            MutationState {
                status: MutationStatus::Success,
                error: None,
            },
        );
    }

    pub(crate) fn fail(&self, invocation: Invocation, message: String) {
        tracing::debug!(kind = ?self.kind, invocation = invocation.0, error = %message, "mutation failed");
        self.settle(
            invocation,
            MutationState {
                status: MutationStatus::Error,
                error: Some(message),
            },
        );
    }

    fn settle(&self, invocation: Invocation, next: MutationState) {
        self.state.send_if_modified(|current| {
            if self.latest.load(Ordering::SeqCst) != invocation.0 {
                tracing::debug!(kind = ?self.kind, invocation = invocation.0, "superseded; state left as is");
                return false;
            }
            *current = next;
            true
        });
    }
}
