use reqwest::{Response, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Project URL and public key shared by the REST and auth endpoints.
#[derive(Debug, Clone)]
pub struct SupabaseEndpoint {
    base_url: Option<String>,
    anon_key: Option<String>,
}

impl SupabaseEndpoint {
    pub fn new(base_url: Option<String>, anon_key: Option<String>) -> Self {
        Self { base_url, anon_key }
    }

    pub fn api_details(&self) -> AppResult<(&str, &str)> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("backend URL not configured".to_string()))?;
        let anon_key = self
            .anon_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("anon key not configured".to_string()))?;
        Ok((base_url, anon_key))
    }

    pub fn url(base_url: &str, path: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), path)
    }
}

/// A non-2xx answer, with the fields both PostgREST and GoTrue may send.
#[derive(Debug)]
pub struct BackendFailure {
    pub status: StatusCode,
    pub code: Option<String>,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

impl BackendFailure {
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        Self::parse(status, &body)
    }

    fn parse(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let code = parsed.as_ref().and_then(|err| {
            err.error_code.clone().or_else(|| match &err.code {
                Some(serde_json::Value::String(code)) => Some(code.clone()),
                _ => None,
            })
        });
        let message = parsed
            .and_then(|err| err.message.or(err.msg).or(err.error_description))
            .unwrap_or_else(|| format!("backend responded with {status}: {body}"));

        Self {
            status,
            code,
            message,
        }
    }

    pub fn has_code(&self, expected: &str) -> bool {
        self.code.as_deref() == Some(expected)
    }
}

impl From<BackendFailure> for AppError {
    fn from(failure: BackendFailure) -> Self {
        AppError::Backend(failure.message)
    }
}

pub fn transport_error(err: reqwest::Error) -> AppError {
    AppError::Backend(format!("failed to reach backend: {err}"))
}

pub fn parse_error(err: reqwest::Error) -> AppError {
    AppError::Backend(format!("failed to parse backend response: {err}"))
}
