use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, watch};

use crate::auth::AuthContext;
use crate::cache::{QueryCache, QueryKey, QuerySnapshot};
use crate::domain::ticket::{NewTicket, Ticket, TicketId, TicketPatch};
use crate::error::AppResult;
use crate::query::mutation::{MutationKind, MutationState, MutationTracker};
use crate::services::{Notification, Notifier, TicketService};

/// Keeps the cached ticket list consistent with the server across mutations.
pub struct TicketQueryClient {
    service: Arc<dyn TicketService>,
    notifier: Arc<dyn Notifier>,
    auth: AuthContext,
    cache: Mutex<QueryCache<Vec<Ticket>>>,
    create: MutationTracker,
    update: MutationTracker,
    delete: MutationTracker,
}

impl TicketQueryClient {
    pub fn new(
        service: Arc<dyn TicketService>,
        notifier: Arc<dyn Notifier>,
        auth: AuthContext,
    ) -> Self {
        Self {
            service,
            notifier,
            auth,
            cache: Mutex::new(QueryCache::new()),
            create: MutationTracker::new(MutationKind::Create),
            update: MutationTracker::new(MutationKind::Update),
            delete: MutationTracker::new(MutationKind::Delete),
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    fn list_key(&self) -> QueryKey {
        QueryKey::tickets(self.auth.current_user().map(|identity| &identity.id))
    }

    /// The ticket list, served from cache while fresh.
    pub async fn tickets(&self) -> AppResult<Vec<Ticket>> {
        let key = self.list_key();
        if let Some(cached) = self.cache.lock().await.fresh(&key) {
            tracing::debug!(%key, "ticket list served from cache");
            return Ok(cached);
        }
        self.refetch_tickets().await
    }

    pub async fn refetch_tickets(&self) -> AppResult<Vec<Ticket>> {
        let key = self.list_key();
        tracing::debug!(%key, "fetching ticket list");

        match self.service.list_tickets().await {
            Ok(tickets) => {
                self.cache
                    .lock()
                    .await
                    .store(&key, tickets.clone(), Utc::now());
                Ok(tickets)
            }
            Err(err) => {
                self.cache.lock().await.store_error(&key, err.to_string());
                Err(err)
            }
        }
    }

    /// Marks the list stale and refetches it unconditionally.
    pub async fn invalidate_tickets(&self) {
        let key = self.list_key();
        self.cache.lock().await.invalidate(&key);
        tracing::debug!(%key, "ticket list invalidated");

        if let Err(err) = self.refetch_tickets().await {
            tracing::warn!(error = %err, "failed to refresh tickets after mutation");
        }
    }

    pub async fn tickets_snapshot(&self) -> QuerySnapshot<Vec<Ticket>> {
        let key = self.list_key();
        self.cache.lock().await.snapshot(&key)
    }

    pub fn mutation_state(&self, kind: MutationKind) -> MutationState {
        self.tracker(kind).state()
    }

    pub fn subscribe(&self, kind: MutationKind) -> watch::Receiver<MutationState> {
        self.tracker(kind).subscribe()
    }

    fn tracker(&self, kind: MutationKind) -> &MutationTracker {
        match kind {
            MutationKind::Create => &self.create,
            MutationKind::Update => &self.update,
            MutationKind::Delete => &self.delete,
        }
    }

    pub async fn create_ticket(&self, input: NewTicket) -> AppResult<Ticket> {
        let call = async {
            let owner = self.auth.require_user()?;
            self.service.create_ticket(&input, &owner.id).await
        };
        self.mutate(
            MutationKind::Create,
            call,
            Notification::info("Ticket created", "Your ticket was created successfully"),
        )
        .await
    }

    pub async fn update_ticket(&self, id: TicketId, patch: TicketPatch) -> AppResult<Ticket> {
        let call = self.service.update_ticket(&id, patch);
        self.mutate(
            MutationKind::Update,
            call,
            Notification::info("Ticket updated", "Your changes were saved"),
        )
        .await
    }

    pub async fn delete_ticket(&self, id: TicketId) -> AppResult<()> {
        let call = self.service.delete_ticket(&id);
        self.mutate(
            MutationKind::Delete,
            call,
            Notification::info("Ticket deleted", "The ticket was deleted"),
        )
        .await
    }

    async fn mutate<T>(
        &self,
        kind: MutationKind,
        call: impl Future<Output = AppResult<T>>,
        confirmation: Notification,
    ) -> AppResult<T> {
        let tracker = self.tracker(kind);
        let invocation = tracker.start();

        match call.await {
            Ok(value) => {
                self.invalidate_tickets().await;
                self.notifier.notify(confirmation);
                tracker.succeed(invocation);
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(kind = ?kind, error = %err, "mutation failed");
                let message = err.to_string();
                self.notifier.notify(Notification::error(message.clone()));
                tracker.fail(invocation, message);
                Err(err)
            }
        }
    }
}
