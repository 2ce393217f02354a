use crate::domain::identity::{Identity, Session};
use crate::error::{AppError, AppResult};
use crate::infra::session::identity_from_token;

/// Who is signed in for this run, if anyone.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    session: Option<Session>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// An explicit token wins over the stored session.
    pub fn resolve(stored: Option<Session>, token_override: Option<&str>) -> AppResult<Self> {
        match token_override {
            Some(token) => {
                let identity = identity_from_token(token)?;
                Ok(Self::signed_in(Session {
                    access_token: token.trim().to_string(),
                    identity,
                }))
            }
            None => Ok(Self { session: stored }),
        }
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.session.as_ref().map(|session| &session.identity)
    }

    pub fn require_user(&self) -> AppResult<&Identity> {
        self.current_user()
            .ok_or_else(|| AppError::Authentication("not signed in; run `ticketflow login`".to_string()))
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|session| session.access_token.as_str())
    }
}
