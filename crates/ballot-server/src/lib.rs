//! HTTP server for Ballot.
//!
//! Exposes the user directory, poll registry and vote ledger as a JSON API.
//! Callers log in through `POST /v1/sessions` and send the returned token as
//! `Authorization: Bearer <token>`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use auth::{AuthProvider, Credentials, SessionStore};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use router::build_router;
pub use server::BallotServer;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use argon2::Params;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use ballot_core::{Argon2Hasher, Ballot};
    use ballot_store::InMemoryTableStore;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app() -> Router {
        let hasher = Argon2Hasher::with_params(Params::new(8, 1, 1, None).unwrap());
        let ballot = Ballot::open(Arc::new(InMemoryTableStore::new()), Arc::new(hasher)).unwrap();
        let sessions = SessionStore::new(Duration::from_secs(3600));
        build_router(AppState::new(Arc::new(ballot), Arc::new(sessions)))
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login_as(app: &Router, email: &str) -> String {
        let (status, _) = call(
            app,
            "POST",
            "/v1/users",
            None,
            Some(json!({
                "email": email, "name": "User", "password": "pw",
                "age": "30", "gender": "f", "city": "Oslo"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            app,
            "POST",
            "/v1/sessions",
            None,
            Some(json!({"email": email, "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_poll(app: &Router, token: &str, options: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/v1/polls",
            Some(token),
            Some(json!({"question": "Pick one", "options": options})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = app();
        let (status, body) = call(&app, "GET", "/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn vote_flow() {
        let app = app();
        let owner = login_as(&app, "owner@x.com").await;
        let voter = login_as(&app, "voter@x.com").await;
        let id = create_poll(&app, &owner, "Red, Blue").await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/v1/polls/{id}/votes"),
            Some(&voter),
            Some(json!({"option": "Blue"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["options"]["Blue"], 1);
        assert_eq!(body["total_votes"], 1);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/v1/polls/{id}/votes"),
            Some(&voter),
            Some(json!({"option": "Red"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "already_voted");

        let (status, body) = call(&app, "GET", &format!("/v1/polls/{id}/results"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["poll"]["options"]["Blue"], 1);
        assert_eq!(body["poll"]["options"]["Red"], 0);
        assert_eq!(body["voters"][0]["voter_email"], "voter@x.com");

        let (status, body) = call(&app, "GET", "/v1/polls", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn protected_routes_need_a_session() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/v1/polls",
            None,
            Some(json!({"question": "Q", "options": "a, b"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "authentication");

        let (status, _) = call(&app, "GET", "/v1/polls/1/voters", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let app = app();
        login_as(&app, "a@x.com").await;
        let (status, body) = call(
            &app,
            "POST",
            "/v1/sessions",
            None,
            Some(json!({"email": "a@x.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "authentication");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = app();
        login_as(&app, "a@x.com").await;
        let (status, body) = call(
            &app,
            "POST",
            "/v1/users",
            None,
            Some(json!({
                "email": "a@x.com", "name": "B", "password": "x",
                "age": "1", "gender": "m", "city": "Y"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "duplicate_user");
    }

    #[tokio::test]
    async fn invalid_poll_and_option_are_bad_requests() {
        let app = app();
        let token = login_as(&app, "a@x.com").await;

        let (status, body) = call(
            &app,
            "POST",
            "/v1/polls",
            Some(&token),
            Some(json!({"question": "Q", "options": "Red, Blue, Red"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");

        let id = create_poll(&app, &token, "Red, Blue").await;
        let (status, body) = call(
            &app,
            "POST",
            &format!("/v1/polls/{id}/votes"),
            Some(&token),
            Some(json!({"option": "Green"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_option");
    }

    #[tokio::test]
    async fn only_the_owner_can_delete() {
        let app = app();
        let owner = login_as(&app, "owner@x.com").await;
        let other = login_as(&app, "other@x.com").await;
        let id = create_poll(&app, &owner, "a, b").await;

        let uri = format!("/v1/polls/{id}");
        let (status, body) = call(&app, "GET", &format!("{uri}/voters"), Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = call(&app, "DELETE", &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "authorization");

        let (status, _) = call(&app, "DELETE", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, body) = call(&app, "GET", &format!("{uri}/voters"), Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let app = app();
        let token = login_as(&app, "a@x.com").await;

        let (status, _) = call(&app, "DELETE", "/v1/sessions", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, "DELETE", "/v1/sessions", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
