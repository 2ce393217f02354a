use async_trait::async_trait;

use crate::domain::identity::Session;
use crate::error::AppResult;

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session>;
    async fn sign_out(&self, session: &Session) -> AppResult<()>;
}
