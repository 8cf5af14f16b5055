use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use ballot_core::{Ballot, PollResults};
use ballot_types::{Poll, PollId, Principal, Tally, Timestamp, VoterDetail};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{AuthProvider, Credentials, SessionStore};
use crate::error::{ServerError, ServerResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ballot: Arc<Ballot>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(ballot: Arc<Ballot>, sessions: Arc<SessionStore>) -> Self {
        Self { ballot, sessions }
    }

    async fn principal(&self, headers: &HeaderMap) -> ServerResult<Principal> {
        self.sessions
            .authenticate(&Credentials::from_headers(headers))
            .await
    }

    /// Run a core operation on the blocking pool; it may hash passwords or
    /// write files.
    async fn run<T, F>(&self, op: F) -> ServerResult<T>
    where
        F: FnOnce(&Ballot) -> ballot_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let ballot = Arc::clone(&self.ballot);
        tokio::task::spawn_blocking(move || op(&ballot))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?
            .map_err(ServerError::from)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub age: String,
    pub gender: String,
    pub city: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
    pub age: String,
    pub gender: String,
    pub city: String,
    pub registered_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_in_secs: u64,
    pub user: Principal,
}

#[derive(Debug, Deserialize)]
pub struct CreatePollRequest {
    pub question: String,
    /// Comma-separated option labels.
    pub options: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option: String,
}

#[derive(Debug, Serialize)]
pub struct PollView {
    pub id: PollId,
    pub question: String,
    pub options: Tally,
    pub total_votes: u64,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl PollView {
    fn new(id: PollId, poll: Poll) -> Self {
        Self {
            id,
            total_votes: poll.total_votes(),
            question: poll.question,
            options: poll.options,
            created_at: poll.created_at,
            created_by: poll.created_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TallyResponse {
    pub poll_id: PollId,
    pub options: Tally,
    pub total_votes: u64,
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ServerResult<(StatusCode, Json<UserResponse>)> {
    let email = req.email.clone();
    let record = state
        .run(move |ballot| {
            ballot
                .users()
                .register(&req.email, &req.name, &req.password, &req.age, &req.gender, &req.city)
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            email,
            name: record.name,
            age: record.age,
            gender: record.gender,
            city: record.city,
            registered_at: record.registered_at,
        }),
    ))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ServerResult<(StatusCode, Json<SessionResponse>)> {
    let principal = state
        .run(move |ballot| ballot.users().authenticate(&req.email, &req.password))
        .await?;
    let token = state.sessions.issue(principal.clone()).await;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            expires_in_secs: state.sessions.ttl().as_secs(),
            user: principal,
        }),
    ))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<StatusCode> {
    match Credentials::from_headers(&headers) {
        Credentials::Bearer(token) if state.sessions.revoke(&token).await => {
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(ServerError::Unauthenticated("unknown session token".into())),
    }
}

pub async fn list_polls_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<Vec<PollView>>> {
    let polls = state.run(|ballot| ballot.polls().list_polls()).await?;
    Ok(Json(
        polls
            .into_iter()
            .map(|(id, poll)| PollView::new(id, poll))
            .collect(),
    ))
}

pub async fn create_poll_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePollRequest>,
) -> ServerResult<(StatusCode, Json<PollView>)> {
    let principal = state.principal(&headers).await?;
    let (id, poll) = state
        .run(move |ballot| {
            ballot
                .polls()
                .create_poll(&req.question, &req.options, &principal.email)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(PollView::new(id, poll))))
}

pub async fn get_poll_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<PollView>> {
    let id = PollId::from(id);
    let lookup = id.clone();
    let poll = state.run(move |ballot| ballot.polls().get_poll(&lookup)).await?;
    Ok(Json(PollView::new(id, poll)))
}

pub async fn delete_poll_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    let principal = state.principal(&headers).await?;
    let id = PollId::from(id);
    state
        .run(move |ballot| ballot.polls().delete_poll(&id, &principal.email))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cast_vote_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> ServerResult<(StatusCode, Json<TallyResponse>)> {
    let principal = state.principal(&headers).await?;
    let id = PollId::from(id);
    let poll_id = id.clone();
    let options = state
        .run(move |ballot| {
            ballot
                .votes()
                .cast_vote(&poll_id, &principal.email, &req.option, principal.profile.clone())
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TallyResponse {
            poll_id: id,
            total_votes: options.values().sum(),
            options,
        }),
    ))
}

pub async fn results_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<PollResults>> {
    let id = PollId::from(id);
    let results = state.run(move |ballot| ballot.votes().results(&id)).await?;
    Ok(Json(results))
}

pub async fn voters_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ServerResult<Json<Vec<VoterDetail>>> {
    state.principal(&headers).await?;
    let id = PollId::from(id);
    let voters = state
        .run(move |ballot| ballot.votes().results(&id).map(|results| results.voters))
        .await?;
    Ok(Json(voters))
}
