//! Web router: gated page serving plus the session API.
//!
//! Pages go through the [`GatekeeperLayer`]; `/api` routes are skipped by the
//! gate's matcher and check the credential cookies themselves.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};
use tower_http::services::{ServeDir, ServeFile};

use crate::backend::BackendClient;
use crate::config::GateConfig;
use crate::cookies::{
    get_cookie, login_cookies, logout_cookies, SessionCredentials, ROLE_NAME_COOKIE,
};
use crate::error::{ErrorContext, GateError, Result};
use crate::gatekeeper::{Gatekeeper, GatekeeperLayer};
use crate::health::health_handler;
use crate::models::{ModulePermissions, UserSnapshot};
use crate::oracle::{admin_menu, MenuItem, PermissionOracle};
use crate::routes::{RouteMatcher, ADMIN_FORBIDDEN_PATH, PUBLIC_FORBIDDEN_PATH};
use crate::session::AuthContext;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Access log for every request, including the ones the gate turns away.
#[derive(Clone)]
pub struct RequestLoggingLayer;

impl<S> Layer<S> for RequestLoggingLayer {
    type Service = RequestLoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggingService { inner }
    }
}

#[derive(Clone)]
pub struct RequestLoggingService<S> {
    inner: S,
}

impl<S> Service<Request> for RequestLoggingService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<
            dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>>
                + Send,
        >,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let role = get_cookie(req.headers(), ROLE_NAME_COOKIE);
        let started = std::time::Instant::now();

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            let status = response.status();
            // set for gate redirects and nothing else we serve
            let redirected_to = response
                .headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            tracing::info!(
                method = %method,
                path = %path,
                role = ?role,
                status = status.as_u16(),
                redirected_to = ?redirected_to,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Request served"
            );

            Ok(response)
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GateConfig>,
    pub gatekeeper: Arc<Gatekeeper>,
    pub backend: Arc<BackendClient>,
}

impl AppState {
    pub fn new(config: GateConfig) -> Result<Self> {
        let backend = BackendClient::new(config.backend_url.clone(), config.backend_timeout)?;
        let gatekeeper = Gatekeeper::new(config.roles.clone(), RouteMatcher::new()?);
        Ok(Self {
            config: Arc::new(config),
            gatekeeper: Arc::new(gatekeeper),
            backend: Arc::new(backend),
        })
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            request_id: None,
        }
    }

    /// Create an error response with a request ID for tracking
    pub fn with_request_id(error: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            request_id: Some(request_id.into()),
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserSnapshot,
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub user: UserSnapshot,
    pub menu: Vec<MenuItem>,
}

#[derive(Deserialize)]
pub struct PermissionsQuery {
    pub module: String,
}

#[derive(Serialize)]
pub struct PermissionsResponse {
    pub module: String,
    #[serde(flatten)]
    pub permissions: ModulePermissions,
}

fn error_response(status: StatusCode, msg: &str) -> ApiError {
    (status, Json(ErrorResponse::new(msg)))
}

/// Log a `GateError` with context and map it to a user-facing API error.
fn handle_error(error: GateError, context: ErrorContext) -> ApiError {
    error.log_with_context(&context);

    let status = match &error {
        GateError::Backend { status: 401, .. } => StatusCode::UNAUTHORIZED,
        GateError::Backend { status: 403, .. } => StatusCode::FORBIDDEN,
        GateError::Backend { status, .. } if (400..500).contains(status) => {
            StatusCode::BAD_REQUEST
        }
        GateError::Backend { .. } | GateError::Http(_) => StatusCode::BAD_GATEWAY,
        GateError::Cookie(_) | GateError::Json(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse::with_request_id(
            error.user_message(),
            context.request_id,
        )),
    )
}

fn set_cookie_headers(cookies: Vec<String>) -> std::result::Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    for cookie in cookies {
        let value = HeaderValue::from_str(&cookie).map_err(|_| {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to write session")
        })?;
        headers.append(header::SET_COOKIE, value);
    }
    Ok(headers)
}

/// The cookie user, or 401 when there is no session at all.
///
/// An unreadable `user_data` cookie yields an empty user, so the caller sees
/// no permissions rather than an error.
fn cookie_user(
    headers: &HeaderMap,
) -> std::result::Result<(SessionCredentials, UserSnapshot), ApiError> {
    let creds = SessionCredentials::from_headers(headers);
    if !creds.is_authenticated() {
        return Err(error_response(StatusCode::UNAUTHORIZED, "Not authenticated"));
    }
    let user = creds.user().unwrap_or_default();
    Ok((creds, user))
}

pub fn build_router(state: AppState) -> Router {
    let gate_layer = GatekeeperLayer::new(state.gatekeeper.clone());
    let logging_layer = RequestLoggingLayer;

    let static_dir = state.config.static_dir.clone();
    // unknown paths get the app shell with 200, client-side routing takes over
    let serve_dir = ServeDir::new(&static_dir)
        .fallback(ServeFile::new(format!("{}/index.html", static_dir)));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/login", post(auth_login))
        .route("/api/auth/logout", post(auth_logout))
        .route("/api/auth/account", get(auth_account))
        .route("/api/auth/permissions", get(auth_permissions))
        .route("/api/auth/menu", get(auth_menu))
        .route(PUBLIC_FORBIDDEN_PATH, get(forbidden_page))
        .route(ADMIN_FORBIDDEN_PATH, get(forbidden_page))
        .fallback_service(serve_dir)
        .layer(gate_layer)
        .layer(logging_layer)
        .with_state(state)
}

async fn auth_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> std::result::Result<Response, ApiError> {
    let context = ErrorContext::new("login").with_path("/api/auth/login");

    let data = state
        .backend
        .login(&req.username, &req.password)
        .await
        .map_err(|e| handle_error(e, context.clone()))?;

    let cookies = login_cookies(&data.access_token, &data.user, state.config.is_https())
        .map_err(|e| handle_error(e, context.clone()))?;

    tracing::info!(
        user_id = %data.user.id,
        role = ?data.user.role_name(),
        "User logged in"
    );

    let headers = set_cookie_headers(cookies)?;
    Ok((headers, Json(LoginResponse { user: data.user })).into_response())
}

async fn auth_logout() -> std::result::Result<Response, ApiError> {
    let headers = set_cookie_headers(logout_cookies())?;
    Ok((headers, Json(serde_json::json!({"success": true}))).into_response())
}

/// Revalidate the session against the backend and return the account with its menu.
async fn auth_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Json<AccountResponse>, ApiError> {
    let creds = SessionCredentials::from_headers(&headers);

    let session = AuthContext::new();
    session
        .bootstrap(state.backend.as_ref(), creds.access_token.as_deref())
        .await;

    let super_admin = state.config.roles.super_admin.as_str();
    let menu = session
        .with_oracle(|oracle| {
            oracle
                .with_super_admin(super_admin)
                .filter_menu(&admin_menu())
        })
        .await;

    match session.state().await.user() {
        Some(user) => Ok(Json(AccountResponse {
            user: user.clone(),
            menu,
        })),
        None => Err(error_response(StatusCode::UNAUTHORIZED, "Not authenticated")),
    }
}

async fn auth_permissions(
    headers: HeaderMap,
    Query(query): Query<PermissionsQuery>,
) -> std::result::Result<Json<PermissionsResponse>, ApiError> {
    let (_, user) = cookie_user(&headers)?;
    let oracle = PermissionOracle::new(user.permissions(), user.role_name());

    Ok(Json(PermissionsResponse {
        permissions: oracle.module_permissions(&query.module),
        module: query.module,
    }))
}

async fn auth_menu(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Json<Vec<MenuItem>>, ApiError> {
    let (creds, user) = cookie_user(&headers)?;
    // role-gated entries follow the role cookie, as the gatekeeper does
    let role = creds.role_name.as_deref().or(user.role_name());
    let oracle = PermissionOracle::new(user.permissions(), role)
        .with_super_admin(&state.config.roles.super_admin);

    Ok(Json(oracle.filter_menu(&admin_menu())))
}

async fn forbidden_page() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        Html("<h1>403</h1><p>You do not have access to this page.</p>"),
    )
}
