//! Route and permission gate for the job board web front end.
//!
//! Two checkpoints share one permission model:
//! - [`gatekeeper`] decides per page request, from the credential cookies,
//!   whether to serve the page or redirect to login or forbidden.
//! - [`oracle`] answers module/action questions over the loaded account's
//!   permissions, for action gating and menu filtering.

pub mod backend;
pub mod config;
pub mod cookies;
pub mod error;
pub mod gatekeeper;
pub mod health;
pub mod models;
pub mod oracle;
pub mod routes;
pub mod session;
pub mod web;
