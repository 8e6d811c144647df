//! Health check endpoint.

use axum::Json;
use serde::Serialize;

/// Build information injected by `build.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub version: &'static str,
    pub build_timestamp: Option<&'static str>,
    pub build_profile: Option<&'static str>,
    pub git_commit: Option<&'static str>,
}

impl HealthInfo {
    pub fn current() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            build_timestamp: option_env!("BUILD_TIMESTAMP"),
            build_profile: option_env!("BUILD_PROFILE"),
            git_commit: option_env!("GIT_COMMIT"),
        }
    }
}

/// Health check handler - returns 200 OK with build info.
pub async fn health_handler() -> Json<HealthInfo> {
    Json(HealthInfo::current())
}
