use std::sync::Arc;

use crate::config::AppConfig;
use crate::infra::session::SessionStore;
use crate::query::TicketQueryClient;
use crate::services::AuthService;

pub struct AppContext {
    pub config: AppConfig,
    pub sessions: SessionStore,
    pub auth_service: Arc<dyn AuthService>,
    pub tickets: TicketQueryClient,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        sessions: SessionStore,
        auth_service: Arc<dyn AuthService>,
        tickets: TicketQueryClient,
    ) -> Self {
        Self {
            config,
            sessions,
            auth_service,
            tickets,
        }
    }
}
