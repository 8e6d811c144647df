//! Configuration loading from environment.
//!
//! Reads the backend location, listen port and role names from environment
//! variables. The route requirement table itself is fixed at build time and
//! lives in [`crate::routes`].

use std::env;
use std::time::Duration;

use crate::error::{GateError, Result};
use crate::routes::{DEFAULT_ADMIN_ROLES, SUPER_ADMIN_ROLE};

/// Default port for the web server.
pub const DEFAULT_WEB_PORT: u16 = 3000;

/// Default backend request timeout.
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

/// Main configuration for the gate.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Base URL of the REST backend, without trailing slash.
    pub backend_url: String,
    /// Public URL the front end is served from.
    pub public_url: String,
    /// Port for the web server.
    pub web_port: u16,
    /// Directory served as the SPA fallback.
    pub static_dir: String,
    /// Timeout for backend calls.
    pub backend_timeout: Duration,
    /// Role policy used by the gatekeeper.
    pub roles: RolePolicy,
}

/// Which role names may enter the admin area, and which one bypasses every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    pub admin_roles: Vec<String>,
    pub super_admin: String,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self {
            admin_roles: DEFAULT_ADMIN_ROLES.iter().map(|r| r.to_string()).collect(),
            super_admin: SUPER_ADMIN_ROLE.to_string(),
        }
    }
}

impl RolePolicy {
    /// Whether `role` may enter the admin area at all.
    pub fn is_admin_role(&self, role: &str) -> bool {
        self.admin_roles.iter().any(|r| r == role)
    }

    pub fn is_super_admin(&self, role: &str) -> bool {
        self.super_admin == role
    }
}

impl GateConfig {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `BACKEND_URL`: base URL of the job board REST API
    ///
    /// Optional environment variables:
    /// - `PUBLIC_URL`: URL the site is served from (default: http://localhost:3000)
    /// - `WEB_PORT`: listen port (default: 3000)
    /// - `STATIC_DIR`: directory with the built front end (default: web)
    /// - `BACKEND_TIMEOUT_SECS`: backend request timeout (default: 10)
    /// - `ADMIN_ROLES`: comma-separated admin role allow-list
    /// - `SUPER_ADMIN_ROLE`: role that passes every check (default: SUPER_ADMIN)
    pub fn from_env() -> Result<Self> {
        let backend_url = env::var("BACKEND_URL")
            .map_err(|_| GateError::Config("BACKEND_URL not set".to_string()))?;
        let backend_url = normalize_base_url(&backend_url)?;

        let public_url = env::var("PUBLIC_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://localhost:{}", DEFAULT_WEB_PORT));

        let web_port = env::var("WEB_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_WEB_PORT);

        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "web".to_string());

        let backend_timeout = env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS));

        Ok(Self {
            backend_url,
            public_url,
            web_port,
            static_dir,
            backend_timeout,
            roles: load_role_policy(),
        })
    }

    /// Whether cookies should carry the `Secure` flag.
    pub fn is_https(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

/// Load the role policy, falling back to the built-in names.
fn load_role_policy() -> RolePolicy {
    let mut policy = RolePolicy::default();

    let admin_roles = parse_list("ADMIN_ROLES");
    if !admin_roles.is_empty() {
        policy.admin_roles = admin_roles;
    }

    if let Ok(super_admin) = env::var("SUPER_ADMIN_ROLE") {
        let super_admin = super_admin.trim();
        if !super_admin.is_empty() {
            policy.super_admin = super_admin.to_string();
        }
    }

    policy
}

/// Parse a comma-separated list from an environment variable.
fn parse_list(var_name: &str) -> Vec<String> {
    env::var(var_name)
        .ok()
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(GateError::Config(format!(
            "BACKEND_URL must be an http(s) URL, got '{}'",
            raw
        )));
    }
    Ok(trimmed.to_string())
}
