//! Credential cookies: reading them off a request, writing them at login,
//! expiring them at logout.

use axum::http::{header, HeaderMap};

use crate::error::{GateError, Result};
use crate::models::UserSnapshot;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const ROLE_NAME_COOKIE: &str = "role_name";
pub const USER_DATA_COOKIE: &str = "user_data";

/// Lifetime of the credential cookies (7 days).
pub const SESSION_MAX_AGE_SECS: u64 = 604_800;

/// The three credential cookies as sent by the browser.
///
/// Empty values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_token: Option<String>,
    pub role_name: Option<String>,
    /// Raw, still URL-encoded `user_data` value.
    pub user_data: Option<String>,
}

impl SessionCredentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            access_token: get_cookie(headers, ACCESS_TOKEN_COOKIE),
            role_name: get_cookie(headers, ROLE_NAME_COOKIE).map(|raw| {
                urlencoding::decode(&raw)
                    .map(|role| role.into_owned())
                    .unwrap_or(raw)
            }),
            user_data: get_cookie(headers, USER_DATA_COOKIE),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Decode the `user_data` snapshot.
    ///
    /// Returns `None` when the cookie is missing or unreadable; callers treat
    /// both the same way (no permissions).
    pub fn user(&self) -> Option<UserSnapshot> {
        let raw = self.user_data.as_deref()?;
        match decode_user_data(raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable user_data cookie");
                None
            }
        }
    }
}

/// Find a cookie by exact name in the `Cookie` header(s).
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next()?;
            if key == name {
                Some(value.to_string())
            } else {
                None
            }
        })
        .filter(|v| !v.is_empty())
}

/// Decode a `user_data` cookie value into a snapshot.
pub fn decode_user_data(raw: &str) -> Result<UserSnapshot> {
    let decoded = urlencoding::decode(raw)
        .map_err(|e| GateError::Cookie(format!("user_data is not valid UTF-8: {}", e)))?;
    Ok(serde_json::from_str(&decoded)?)
}

/// Encode a snapshot as a `user_data` cookie value.
pub fn encode_user_data(user: &UserSnapshot) -> Result<String> {
    let json = serde_json::to_string(user)?;
    Ok(urlencoding::encode(&json).into_owned())
}

/// `Set-Cookie` values written after a successful login.
pub fn login_cookies(token: &str, user: &UserSnapshot, secure: bool) -> Result<Vec<String>> {
    let secure_flag = if secure { "; Secure" } else { "" };
    let role = user.role_name().unwrap_or_default();
    let user_data = encode_user_data(user)?;

    Ok(vec![
        format!(
            "{}={}; Path=/; HttpOnly{}; SameSite=Lax; Max-Age={}",
            ACCESS_TOKEN_COOKIE, token, secure_flag, SESSION_MAX_AGE_SECS
        ),
        format!(
            "{}={}; Path=/{}; SameSite=Lax; Max-Age={}",
            ROLE_NAME_COOKIE,
            urlencoding::encode(role),
            secure_flag,
            SESSION_MAX_AGE_SECS
        ),
        format!(
            "{}={}; Path=/{}; SameSite=Lax; Max-Age={}",
            USER_DATA_COOKIE, user_data, secure_flag, SESSION_MAX_AGE_SECS
        ),
    ])
}

/// `Set-Cookie` values that clear the session at logout.
pub fn logout_cookies() -> Vec<String> {
    [ACCESS_TOKEN_COOKIE, ROLE_NAME_COOKIE, USER_DATA_COOKIE]
        .iter()
        .map(|name| format!("{}=; Path=/; Max-Age=0", name))
        .collect()
}
