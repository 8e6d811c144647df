//! Client for the job board REST backend.
//!
//! Only the two calls the gate needs: the login exchange and the
//! current-account lookup used by session bootstrap.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GateError, Result};
use crate::models::{AccountData, ApiEnvelope, LoginData, UserSnapshot};

const LOGIN_PATH: &str = "/api/v1/auth/login";
const ACCOUNT_PATH: &str = "/api/v1/auth/account";

/// Source of the current account for a bearer token.
pub trait AccountFetcher: Send + Sync {
    fn fetch_account(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<UserSnapshot>> + Send;
}

/// HTTP client for the backend API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http_client: Client,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

impl BackendClient {
    /// Create a client for `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange credentials for an access token and the user snapshot.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginData> {
        let response = self
            .http_client
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        read_envelope(response, "login").await
    }

    /// Fetch the account behind `access_token`.
    pub async fn get_account(&self, access_token: &str) -> Result<UserSnapshot> {
        let response = self
            .http_client
            .get(self.url(ACCOUNT_PATH))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        let data: AccountData = read_envelope(response, "account").await?;
        Ok(data.user)
    }
}

impl AccountFetcher for BackendClient {
    async fn fetch_account(&self, access_token: &str) -> Result<UserSnapshot> {
        self.get_account(access_token).await
    }
}

/// Unwrap `{ statusCode, message, data }`, turning failures into `GateError::Backend`.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response, call: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    let envelope: Option<ApiEnvelope<T>> = serde_json::from_str(&body).ok();

    if !status.is_success() {
        let message = envelope
            .map(|e| e.message_text())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.chars().take(200).collect());
        tracing::debug!(call = call, status = status.as_u16(), "Backend call failed");
        return Err(GateError::Backend {
            status: status.as_u16(),
            message,
        });
    }

    let envelope = match envelope {
        Some(envelope) => envelope,
        // reparse to surface the real serde error
        None => serde_json::from_str::<ApiEnvelope<T>>(&body)?,
    };

    envelope.data.ok_or_else(|| GateError::Backend {
        status: status.as_u16(),
        message: format!("{} response carried no data", call),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn spawn_backend() -> String {
        let app = Router::new()
            .route(
                "/api/v1/auth/login",
                post(|Json(body): Json<Value>| async move {
                    if body["username"] == "admin@jobs.dev" && body["password"] == "123456" {
                        (
                            StatusCode::CREATED,
                            Json(json!({
                                "statusCode": 201,
                                "message": "User Login",
                                "data": {
                                    "access_token": "tok-1",
                                    "user": {
                                        "_id": "u1",
                                        "email": "admin@jobs.dev",
                                        "name": "Admin",
                                        "role": {"_id": "r1", "name": "ADMIN", "permissions": [
                                            {"apiPath": "/api/v1/users", "method": "GET", "module": "USERS"}
                                        ]}
                                    }
                                }
                            })),
                        )
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"statusCode": 401, "message": "Username/password is invalid"})),
                        )
                    }
                }),
            )
            .route(
                "/api/v1/auth/account",
                get(|headers: HeaderMap| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    if auth == "Bearer tok-1" {
                        (
                            StatusCode::OK,
                            Json(json!({
                                "statusCode": 200,
                                "message": "Get user information",
                                "data": {"user": {"_id": "u1", "email": "admin@jobs.dev", "role": {"name": "ADMIN", "permissions": []}}}
                            })),
                        )
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"statusCode": 401, "message": "Token expired"})),
                        )
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn login_returns_token_and_user() {
        let base = spawn_backend().await;
        let client = BackendClient::new(base, Duration::from_secs(5)).unwrap();

        let data = client.login("admin@jobs.dev", "123456").await.unwrap();
        assert_eq!(data.access_token, "tok-1");
        assert_eq!(data.user.role_name(), Some("ADMIN"));
        assert_eq!(data.user.permissions().len(), 1);
    }

    #[tokio::test]
    async fn login_failure_carries_backend_message() {
        let base = spawn_backend().await;
        let client = BackendClient::new(base, Duration::from_secs(5)).unwrap();

        let err = client.login("admin@jobs.dev", "wrong").await.unwrap_err();
        match err {
            GateError::Backend { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Username/password is invalid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn account_uses_bearer_token() {
        let base = spawn_backend().await;
        let client = BackendClient::new(base, Duration::from_secs(5)).unwrap();

        let user = client.fetch_account("tok-1").await.unwrap();
        assert_eq!(user.email, "admin@jobs.dev");

        let err = client.fetch_account("stale").await.unwrap_err();
        assert!(matches!(err, GateError::Backend { status: 401, .. }));
    }

    #[tokio::test]
    async fn unreachable_backend_is_http_error() {
        // port 9 (discard) is not served in test environments
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.fetch_account("tok-1").await.unwrap_err();
        assert!(matches!(err, GateError::Http(_)));
    }
}
