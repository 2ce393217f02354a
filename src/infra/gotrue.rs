use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};

use crate::domain::identity::{Identity, Session, UserId};
use crate::error::{AppError, AppResult};
use crate::infra::supabase::{BackendFailure, SupabaseEndpoint, parse_error, transport_error};
use crate::services::AuthService;

/// Password sign-in against the hosted auth endpoint.
pub struct GoTrueClient {
    http: Client,
    endpoint: SupabaseEndpoint,
}

impl GoTrueClient {
    pub fn new(endpoint: SupabaseEndpoint) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl AuthService for GoTrueClient {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let (base_url, anon_key) = self.endpoint.api_details()?;
        let response = self
            .http
            .post(SupabaseEndpoint::url(base_url, "auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", anon_key)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&PasswordGrantRequest { email, password })
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let failure = BackendFailure::from_response(response).await;
            return Err(AppError::Authentication(failure.message));
        }

        let payload: TokenResponse = response.json().await.map_err(parse_error)?;
        tracing::info!(user = %payload.user.id, "signed in");

        Ok(Session {
            access_token: payload.access_token,
            identity: Identity {
                id: UserId(payload.user.id),
                email: payload.user.email,
            },
        })
    }

    async fn sign_out(&self, session: &Session) -> AppResult<()> {
        let (base_url, anon_key) = self.endpoint.api_details()?;
        let response = self
            .http
            .post(SupabaseEndpoint::url(base_url, "auth/v1/logout"))
            .header("apikey", anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", session.access_token))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(BackendFailure::from_response(response).await.into());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}
