use std::fs;
use std::path::PathBuf;

use base64::prelude::{BASE64_URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;

use crate::config::{config_directory, write_private};
use crate::domain::identity::{Identity, Session, UserId};
use crate::error::{AppError, AppResult};

const SESSION_FILE_NAME: &str = "session.json";

/// The signed-in session, persisted next to the config file.
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    pub fn open() -> AppResult<Self> {
        Ok(Self::at(config_directory()?.join(SESSION_FILE_NAME)))
    }

    pub fn at(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn load(&self) -> AppResult<Option<Session>> {
        match fs::read_to_string(&self.file_path) {
            Ok(contents) => serde_json::from_str::<Session>(&contents)
                .map(Some)
                .map_err(|err| AppError::Configuration(format!("invalid session file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    /// Like [`load`](Self::load), but an unreadable file counts as signed out.
    pub fn load_or_forget(&self) -> Option<Session> {
        match self.load() {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(
                    path = %self.file_path.display(),
                    error = %err,
                    "ignoring unreadable session file"
                );
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> AppResult<()> {
        write_private(&self.file_path, session)
    }

    pub fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::Io(err)),
        }
    }
}

#[derive(Deserialize)]
struct AccessTokenClaims {
    sub: String,
    email: Option<String>,
}

/// Reads the identity carried by an access token.
///
/// The signature is not checked here; the backend verifies every request.
pub fn identity_from_token(token: &str) -> AppResult<Identity> {
    let invalid = |reason: &str| AppError::Authentication(format!("invalid access token: {reason}"));

    let payload = token
        .trim()
        .split('.')
        .nth(1)
        .ok_or_else(|| invalid("not a JWT"))?;
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| invalid("payload is not base64url"))?;
    let claims: AccessTokenClaims =
        serde_json::from_slice(&bytes).map_err(|_| invalid("missing subject claim"))?;

    Ok(Identity {
        id: UserId(claims.sub),
        email: claims.email,
    })
}
