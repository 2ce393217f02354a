use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    Client, Method, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;

use crate::domain::identity::UserId;
use crate::domain::status::TicketStatus;
use crate::domain::ticket::{FieldUpdate, NewTicket, Ticket, TicketId, TicketPatch};
use crate::error::{AppError, AppResult};
use crate::infra::supabase::{BackendFailure, SupabaseEndpoint, parse_error, transport_error};
use crate::services::TicketService;

const TICKETS_PATH: &str = "rest/v1/tickets";
const RETURN_REPRESENTATION: &str = "return=representation";
// Postgres rejects malformed ids before row-level security sees them.
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Ticket service over the PostgREST `tickets` relation.
pub struct PostgrestTicketClient {
    http: Client,
    endpoint: SupabaseEndpoint,
    access_token: Option<String>,
}

impl PostgrestTicketClient {
    pub fn new(endpoint: SupabaseEndpoint, access_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            access_token,
        }
    }

    fn request(&self, method: Method, query: &[(&str, &str)]) -> AppResult<RequestBuilder> {
        let (base_url, anon_key) = self.endpoint.api_details()?;
        let bearer = self.access_token.as_deref().unwrap_or(anon_key);

        Ok(self
            .http
            .request(method, SupabaseEndpoint::url(base_url, TICKETS_PATH))
            .query(query)
            .header("apikey", anon_key)
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
            .header(ACCEPT, "application/json"))
    }

    async fn send(request: RequestBuilder) -> Result<Response, SendError> {
        let response = request.send().await.map_err(SendError::Transport)?;
        if !response.status().is_success() {
            return Err(SendError::Rejected(
                BackendFailure::from_response(response).await,
            ));
        }
        Ok(response)
    }

    async fn rows(response: Response) -> AppResult<Vec<Ticket>> {
        response.json::<Vec<Ticket>>().await.map_err(parse_error)
    }

    fn id_filter(id: &TicketId) -> String {
        format!("eq.{}", id.as_str())
    }

    fn not_found(id: &TicketId) -> AppError {
        AppError::NotFound(format!("ticket {id}"))
    }

    /// Maps an update/delete failure, treating unaddressable ids as absent.
    fn targeted_error(id: &TicketId, err: SendError) -> AppError {
        match err {
            SendError::Rejected(failure) if failure.has_code(INVALID_TEXT_REPRESENTATION) => {
                Self::not_found(id)
            }
            other => other.into(),
        }
    }
}

enum SendError {
    Transport(reqwest::Error),
    Rejected(BackendFailure),
}

impl From<SendError> for AppError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::Transport(err) => transport_error(err),
            SendError::Rejected(failure) => failure.into(),
        }
    }
}

#[async_trait]
impl TicketService for PostgrestTicketClient {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>> {
        let request = self.request(
            Method::GET,
            &[("select", "*"), ("order", "created_at.desc")],
        )?;
        tracing::debug!("listing tickets");

        let response = Self::send(request).await?;
        let tickets = Self::rows(response).await?;
        tracing::debug!(count = tickets.len(), "tickets listed");
        Ok(tickets)
    }

    async fn create_ticket(&self, input: &NewTicket, owner: &UserId) -> AppResult<Ticket> {
        let draft = input.validate()?;
        let body = InsertTicketRow {
            user_id: owner,
            title: &draft.title,
            description: draft.description.as_deref(),
            deadline: draft.deadline,
            status: TicketStatus::InProgress,
        };

        let request = self
            .request(Method::POST, &[("select", "*")])?
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&body);
        tracing::debug!(title = %draft.title, "creating ticket");

        let response = Self::send(request).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Backend("backend returned no ticket after insert".to_string()))
    }

    async fn update_ticket(&self, id: &TicketId, patch: TicketPatch) -> AppResult<Ticket> {
        let patch = patch.validate()?;
        let body = UpdateTicketRow::from_patch(&patch);
        let filter = Self::id_filter(id);

        let request = self
            .request(Method::PATCH, &[("id", filter.as_str()), ("select", "*")])?
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&body);
        tracing::debug!(ticket = %id, "updating ticket");

        let response = Self::send(request)
            .await
            .map_err(|err| Self::targeted_error(id, err))?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn delete_ticket(&self, id: &TicketId) -> AppResult<()> {
        let filter = Self::id_filter(id);
        let request = self
            .request(Method::DELETE, &[("id", filter.as_str()), ("select", "id")])?
            .header("Prefer", RETURN_REPRESENTATION);
        tracing::debug!(ticket = %id, "deleting ticket");

        let response = Self::send(request)
            .await
            .map_err(|err| Self::targeted_error(id, err))?;
        let deleted: Vec<serde_json::Value> = response.json().await.map_err(parse_error)?;
        if deleted.is_empty() {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct InsertTicketRow<'a> {
    user_id: &'a UserId,
    title: &'a str,
    description: Option<&'a str>,
    deadline: DateTime<Utc>,
    status: TicketStatus,
}

#[derive(Serialize)]
struct UpdateTicketRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TicketStatus>,
}

impl<'a> UpdateTicketRow<'a> {
    fn from_patch(patch: &'a TicketPatch) -> Self {
        let description = match &patch.description {
            FieldUpdate::Keep => None,
            FieldUpdate::Clear => Some(None),
            FieldUpdate::Set(text) => Some(Some(text.as_str())),
        };
        Self {
            title: patch.title.as_deref(),
            description,
            deadline: patch.deadline,
            status: patch.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::{Value, json};

    use super::*;

    fn client(server: &ServerGuard) -> PostgrestTicketClient {
        PostgrestTicketClient::new(
            SupabaseEndpoint::new(Some(server.url()), Some("anon-key".to_string())),
            Some("user-token".to_string()),
        )
    }

    fn row(id: &str, status: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "user_id": "user-1",
            "title": "Write report",
            "description": null,
            "deadline": "2025-03-01T00:00:00+00:00",
            "status": status,
            "created_at": created_at,
            "updated_at": created_at,
        })
    }

    #[tokio::test]
    async fn lists_tickets_newest_first_with_auth_headers() {
        let mut server = Server::new_async().await;
        let body = json!([
            row("t3", "blocked", "2025-01-03T00:00:00+00:00"),
            row("t2", "completed", "2025-01-02T00:00:00+00:00"),
            row("t1", "in_progress", "2025-01-01T00:00:00+00:00"),
        ]);
        let mock = server
            .mock("GET", "/rest/v1/tickets")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".into(), "*".into()),
                Matcher::UrlEncoded("order".into(), "created_at.desc".into()),
            ]))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer user-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let tickets = client(&server).list_tickets().await.unwrap();

        mock.assert_async().await;
        let ids: Vec<&str> = tickets.iter().map(|ticket| ticket.id.as_str()).collect();
        assert_eq!(ids, vec!["t3", "t2", "t1"]);
        assert_eq!(tickets[0].status, TicketStatus::Blocked);
    }

    #[tokio::test]
    async fn list_failure_passes_message_through() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/tickets")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"code":"PGRST301","message":"JWT expired"}"#)
            .create_async()
            .await;

        let err = client(&server).list_tickets().await.unwrap_err();
        assert!(matches!(err, AppError::Backend(ref message) if message == "JWT expired"));
    }

    #[tokio::test]
    async fn rejects_unknown_status_from_backend() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/tickets")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!([row("t1", "archived", "2025-01-01T00:00:00+00:00")]).to_string())
            .create_async()
            .await;

        let err = client(&server).list_tickets().await.unwrap_err();
        assert!(matches!(err, AppError::Backend(_)));
    }

    #[tokio::test]
    async fn create_forces_in_progress_and_sends_owner() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/tickets")
            .match_query(Matcher::Any)
            .match_header("prefer", "return=representation")
            .match_body(Matcher::Json(json!({
                "user_id": "user-1",
                "title": "Write report",
                "description": null,
                "deadline": "2025-03-01T00:00:00Z",
                "status": "in_progress",
            })))
            .with_status(201)
            .with_body(json!([row("t1", "in_progress", "2025-01-01T00:00:00+00:00")]).to_string())
            .create_async()
            .await;

        let input = NewTicket {
            title: " Write report ".to_string(),
            description: None,
            deadline: Some("2025-03-01".to_string()),
        };
        let ticket = client(&server)
            .create_ticket(&input, &UserId("user-1".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.description, None);
        assert_eq!(ticket.title, "Write report");
    }

    #[tokio::test]
    async fn invalid_create_never_reaches_backend() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let input = NewTicket {
            title: String::new(),
            description: None,
            deadline: Some("2025-03-01".to_string()),
        };
        let err = client(&server)
            .create_ticket(&input, &UserId("user-1".to_string()))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn status_update_sends_only_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/rest/v1/tickets")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.t1".into()))
            .match_body(Matcher::Json(json!({ "status": "completed" })))
            .with_status(200)
            .with_body(json!([row("t1", "completed", "2025-01-01T00:00:00+00:00")]).to_string())
            .create_async()
            .await;

        let ticket = client(&server)
            .update_ticket(
                &TicketId("t1".to_string()),
                TicketPatch::status(TicketStatus::Completed),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(ticket.status, TicketStatus::Completed);
        assert_eq!(ticket.title, "Write report");
    }

    #[tokio::test]
    async fn clearing_description_sends_null() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/rest/v1/tickets")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({ "description": null })))
            .with_status(200)
            .with_body(json!([row("t1", "in_progress", "2025-01-01T00:00:00+00:00")]).to_string())
            .create_async()
            .await;

        let patch = TicketPatch {
            description: FieldUpdate::Clear,
            ..TicketPatch::default()
        };
        client(&server)
            .update_ticket(&TicketId("t1".to_string()), patch)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_of_hidden_row_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("PATCH", "/rest/v1/tickets")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = client(&server)
            .update_ticket(
                &TicketId("missing".to_string()),
                TicketPatch::status(TicketStatus::Blocked),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_reports_not_found_for_unknown_ids() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/rest/v1/tickets")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.gone".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        server
            .mock("DELETE", "/rest/v1/tickets")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.not-a-uuid".into()))
            .with_status(400)
            .with_body(r#"{"code":"22P02","message":"invalid input syntax for type uuid"}"#)
            .create_async()
            .await;

        let client = client(&server);
        let gone = client.delete_ticket(&TicketId("gone".to_string())).await;
        let malformed = client
            .delete_ticket(&TicketId("not-a-uuid".to_string()))
            .await;

        assert!(matches!(gone, Err(AppError::NotFound(_))));
        assert!(matches!(malformed, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_succeeds_when_a_row_is_returned() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/rest/v1/tickets")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.t1".into()))
            .with_status(200)
            .with_body(r#"[{"id":"t1"}]"#)
            .create_async()
            .await;

        client(&server)
            .delete_ticket(&TicketId("t1".to_string()))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_configuration_fails_before_request() {
        let client = PostgrestTicketClient::new(SupabaseEndpoint::new(None, None), None);
        let err = client.list_tickets().await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
