//! Authenticated-session state for the application.
//!
//! Starts empty, is populated once by an asynchronous account fetch and is
//! cleared wholesale on logout. Readers never wait on the fetch: while it is
//! in flight they see no permissions.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use crate::backend::AccountFetcher;
use crate::models::{ModulePermissions, UserSnapshot};
use crate::oracle::PermissionOracle;

/// Lifecycle of the session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Empty,
    Loading,
    Authenticated(UserSnapshot),
    Unauthenticated,
}

impl AuthState {
    pub fn user(&self) -> Option<&UserSnapshot> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Shared session state. Wrap in an `Arc` to hand it around.
#[derive(Debug, Default)]
pub struct AuthContext {
    state: RwLock<AuthState>,
    /// Bumped on logout so a fetch that started earlier cannot repopulate the state.
    generation: AtomicU64,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the current account once.
    ///
    /// Without a token the state goes straight to `Unauthenticated`. A failed
    /// fetch is logged and also leaves the session unauthenticated; there is
    /// no retry.
    pub async fn bootstrap<F: AccountFetcher>(&self, fetcher: &F, access_token: Option<&str>) {
        let Some(token) = access_token else {
            *self.state.write().await = AuthState::Unauthenticated;
            return;
        };

        let generation = self.generation.load(Ordering::SeqCst);
        *self.state.write().await = AuthState::Loading;

        let result = fetcher.fetch_account(token).await;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding account fetched before logout");
            return;
        }

        *state = match result {
            Ok(user) => {
                tracing::info!(
                    user_id = %user.id,
                    role = ?user.role_name(),
                    permissions = user.permissions().len(),
                    "Session loaded"
                );
                AuthState::Authenticated(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Account fetch failed, continuing unauthenticated");
                AuthState::Unauthenticated
            }
        };
    }

    /// Drop the loaded account and any fetch still in flight.
    pub async fn logout(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.write().await = AuthState::Unauthenticated;
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(*self.state.read().await, AuthState::Authenticated(_))
    }

    /// Run `f` against an oracle over the current permissions.
    ///
    /// Outside `Authenticated` the oracle is empty.
    pub async fn with_oracle<R>(&self, f: impl FnOnce(PermissionOracle<'_>) -> R) -> R {
        let state = self.state.read().await;
        let oracle = match state.user() {
            Some(user) => PermissionOracle::new(user.permissions(), user.role_name()),
            None => PermissionOracle::default(),
        };
        f(oracle)
    }

    pub async fn has_permission(&self, module: &str, action: &str) -> bool {
        self.with_oracle(|oracle| oracle.has_permission(module, action))
            .await
    }

    pub async fn module_permissions(&self, module: &str) -> ModulePermissions {
        self.with_oracle(|oracle| oracle.module_permissions(module))
            .await
    }
}
