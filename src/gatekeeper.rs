//! Edge gatekeeper: decides, before a page is served, whether the request may
//! proceed or must be redirected to login or to the forbidden page.
//!
//! The decision is a pure function of the path and the credential cookies.
//! [`GatekeeperLayer`] applies it to every page request.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::Request,
    response::{IntoResponse, Redirect, Response},
};
use tower::{Layer, Service};

use crate::config::RolePolicy;
use crate::cookies::SessionCredentials;
use crate::models::Action;
use crate::routes::{
    canonical_path, is_admin, is_public, module_api_path, requirement_for, RouteMatcher,
    RouteRequirement, ADMIN_FORBIDDEN_PATH, LOGIN_PATH,
};

/// Outcome of the gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    RedirectToLogin,
    RedirectToForbidden,
}

impl GateDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateDecision::Proceed => "proceed",
            GateDecision::RedirectToLogin => "redirect_login",
            GateDecision::RedirectToForbidden => "redirect_forbidden",
        }
    }

    /// Redirect target, if any.
    pub fn location(&self) -> Option<&'static str> {
        match self {
            GateDecision::Proceed => None,
            GateDecision::RedirectToLogin => Some(LOGIN_PATH),
            GateDecision::RedirectToForbidden => Some(ADMIN_FORBIDDEN_PATH),
        }
    }
}

/// Path-based access gate.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    policy: RolePolicy,
    matcher: RouteMatcher,
}

impl Gatekeeper {
    pub fn new(policy: RolePolicy, matcher: RouteMatcher) -> Self {
        Self { policy, matcher }
    }

    /// Whether `path` is subject to the gate at all.
    pub fn applies_to(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// Decide the outcome for `path` given the request's credentials.
    ///
    /// The path is made canonical first, so trailing or repeated slashes and
    /// percent escapes cannot step around an exact table entry.
    pub fn evaluate(&self, path: &str, creds: &SessionCredentials) -> GateDecision {
        let path = canonical_path(path);
        let path = path.as_str();

        if creds.access_token.is_none() {
            return if is_public(path) {
                GateDecision::Proceed
            } else {
                GateDecision::RedirectToLogin
            };
        }

        // the forbidden page itself lives under the admin prefix
        if !is_admin(path) || path == ADMIN_FORBIDDEN_PATH {
            return GateDecision::Proceed;
        }

        let role = match creds.role_name.as_deref() {
            Some(role) if self.policy.is_admin_role(role) => role,
            _ => return GateDecision::RedirectToForbidden,
        };

        if self.policy.is_super_admin(role) {
            return GateDecision::Proceed;
        }

        match requirement_for(path) {
            None => GateDecision::Proceed,
            Some(RouteRequirement::Role(required)) => {
                if role == required {
                    GateDecision::Proceed
                } else {
                    GateDecision::RedirectToForbidden
                }
            }
            Some(RouteRequirement::Module { module, .. }) => {
                if can_read_module(creds, module) {
                    GateDecision::Proceed
                } else {
                    GateDecision::RedirectToForbidden
                }
            }
        }
    }
}

/// Page access only ever needs read rights, whatever action the table names.
fn can_read_module(creds: &SessionCredentials, module: &str) -> bool {
    let Some(user) = creds.user() else {
        return false;
    };
    let api_path = module_api_path(module);
    user.permissions()
        .iter()
        .any(|p| p.api_path == api_path && p.method == Action::Get.as_str())
}

/// Tower layer running the gatekeeper in front of the page router.
#[derive(Clone)]
pub struct GatekeeperLayer {
    gatekeeper: Arc<Gatekeeper>,
}

impl GatekeeperLayer {
    pub fn new(gatekeeper: Arc<Gatekeeper>) -> Self {
        Self { gatekeeper }
    }
}

impl<S> Layer<S> for GatekeeperLayer {
    type Service = GatekeeperService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GatekeeperService {
            inner,
            gatekeeper: self.gatekeeper.clone(),
        }
    }
}

/// Service that redirects requests the gatekeeper rejects.
#[derive(Clone)]
pub struct GatekeeperService<S> {
    inner: S,
    gatekeeper: Arc<Gatekeeper>,
}

impl<S> Service<Request> for GatekeeperService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let path = req.uri().path().to_string();

        if !self.gatekeeper.applies_to(&path) {
            return Box::pin(self.inner.call(req));
        }

        let creds = SessionCredentials::from_headers(req.headers());
        let decision = self.gatekeeper.evaluate(&path, &creds);

        match decision.location() {
            None => Box::pin(self.inner.call(req)),
            Some(location) => {
                tracing::warn!(
                    path = %path,
                    role = ?creds.role_name,
                    authenticated = creds.is_authenticated(),
                    outcome = decision.as_str(),
                    "Navigation blocked"
                );
                let response = Redirect::temporary(location).into_response();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
