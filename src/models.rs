//! Core data models for the job board gate.

use serde::{Deserialize, Serialize};

/// The HTTP-verb-named actions a permission can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Get,
    Post,
    Put,
    Delete,
}

impl Action {
    /// All actions, in create/read/update/delete order.
    pub const ALL: [Action; 4] = [Action::Post, Action::Get, Action::Put, Action::Delete];

    /// Wire representation, as it appears in a permission's `method`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "GET",
            Action::Post => "POST",
            Action::Put => "PUT",
            Action::Delete => "DELETE",
        }
    }
}

/// A permission issued by the backend: "this role may invoke `method` on `api_path`".
///
/// `method` stays a plain string so that a record the gate doesn't know about
/// (e.g. `PATCH`) never makes the whole user snapshot unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default)]
    pub api_path: String,
    pub method: String,
    #[serde(default)]
    pub module: String,
}

impl Permission {
    pub fn new(
        api_path: impl Into<String>,
        method: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self {
            api_path: api_path.into(),
            method: method.into(),
            module: module.into(),
        }
    }
}

/// Role embedded in the user snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// User snapshot as serialized into the `user_data` cookie and returned by
/// the backend's account endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserSnapshot {
    /// Permissions granted through the embedded role (empty without a role).
    pub fn permissions(&self) -> &[Permission] {
        self.role
            .as_ref()
            .map(|r| r.permissions.as_slice())
            .unwrap_or(&[])
    }

    /// Name of the embedded role, if any.
    pub fn role_name(&self) -> Option<&str> {
        self.role
            .as_ref()
            .map(|r| r.name.as_str())
            .filter(|n| !n.is_empty())
    }
}

/// CRUD view of one module's permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePermissions {
    pub can_create: bool,
    pub can_read: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

/// Response envelope used by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status_code: Option<u16>,
    /// A string, or a list of validation messages.
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Flatten `message` into a single line.
    pub fn message_text(&self) -> String {
        match &self.message {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// Payload of the account endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountData {
    pub user: UserSnapshot,
}

/// Payload of the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub access_token: String,
    pub user: UserSnapshot,
}
