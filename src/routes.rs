//! Static route tables: public paths, admin area, per-page requirements.
//!
//! Everything here is fixed at build time. Nothing is derived from data.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::models::Action;

/// Role that satisfies every requirement.
pub const SUPER_ADMIN_ROLE: &str = "SUPER_ADMIN";

/// Roles that may enter the admin area at all.
pub const DEFAULT_ADMIN_ROLES: &[&str] = &[SUPER_ADMIN_ROLE, "ADMIN", "HR"];

/// Prefix of the admin back-office.
pub const ADMIN_PREFIX: &str = "/admin";

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const PUBLIC_FORBIDDEN_PATH: &str = "/auth/forbidden";
pub const ADMIN_FORBIDDEN_PATH: &str = "/admin/ui/auth_forbidden";

/// Paths reachable without a session, including their sub-paths.
pub const PUBLIC_PATHS: &[&str] = &[
    "/",
    LOGIN_PATH,
    REGISTER_PATH,
    PUBLIC_FORBIDDEN_PATH,
    "/job",
    "/company",
];

/// What a UI path demands of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    /// The role's permission list must grant `action` on `module`.
    Module {
        module: &'static str,
        action: Action,
    },
    /// The role name must equal this value exactly.
    Role(&'static str),
}

impl RouteRequirement {
    const fn read(module: &'static str) -> Self {
        RouteRequirement::Module {
            module,
            action: Action::Get,
        }
    }
}

/// Backend API path a module's permissions are issued against.
pub fn module_api_path(module: &str) -> String {
    format!("/api/v1/{}", module.to_lowercase())
}

static ROUTE_REQUIREMENTS: LazyLock<HashMap<&'static str, RouteRequirement>> =
    LazyLock::new(|| {
        HashMap::from([
            ("/admin/ui/user", RouteRequirement::read("USERS")),
            ("/admin/ui/company", RouteRequirement::read("COMPANIES")),
            ("/admin/ui/job", RouteRequirement::read("JOBS")),
            ("/admin/ui/skill", RouteRequirement::read("SKILLS")),
            ("/admin/ui/resume", RouteRequirement::read("RESUMES")),
            ("/admin/ui/role", RouteRequirement::read("ROLES")),
            ("/admin/ui/permission", RouteRequirement::read("PERMISSIONS")),
            ("/admin/ui/form", RouteRequirement::Role(SUPER_ADMIN_ROLE)),
        ])
    });

/// Exact-match lookup of a path's requirement. Sub-paths are not covered.
pub fn requirement_for(path: &str) -> Option<RouteRequirement> {
    ROUTE_REQUIREMENTS.get(path).copied()
}

/// Whether `path` is `prefix` itself or lies below it.
///
/// `"/"` only matches itself, so the home page does not make every path public.
pub fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/') && !prefix.ends_with('/'))
}

/// The path as the static file server resolves it: percent-decoded, empty
/// and `.` segments dropped, no trailing slash.
///
/// `/admin/ui/form/`, `//admin/ui/form` and `/admin/ui/%66orm` all become
/// `/admin/ui/form`. A path that does not decode to UTF-8 is only collapsed.
pub fn canonical_path(path: &str) -> String {
    let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
    let segments: Vec<&str> = decoded
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| is_under(path, p))
}

pub fn is_admin(path: &str) -> bool {
    is_under(path, ADMIN_PREFIX)
}

/// Decides which request paths the gate looks at at all.
///
/// API routes, the health probe, framework assets and image/font files are
/// passed straight through.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    excluded: Regex,
}

const EXCLUDED_PATTERN: &str = r"(?i)^/(?:api|health|_next/static|_next/image)(?:/|$)|^/favicon\.ico$|\.(?:svg|png|jpe?g|gif|webp|ico|bmp|avif|woff2?|ttf|otf|eot)$";

impl RouteMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            excluded: Regex::new(EXCLUDED_PATTERN)?,
        })
    }

    /// True when the gate should evaluate `path`.
    pub fn matches(&self, path: &str) -> bool {
        !self.excluded.is_match(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_and_sub_paths() {
        assert!(is_public("/"));
        assert!(is_public("/auth/login"));
        assert!(is_public("/auth/register"));
        assert!(is_public("/job"));
        assert!(is_public("/job/65ab12"));
        assert!(is_public("/company/acme/jobs"));
        assert!(is_public("/auth/forbidden"));
    }

    #[test]
    fn home_does_not_cover_everything() {
        assert!(!is_public("/admin"));
        assert!(!is_public("/admin/ui/user"));
        assert!(!is_public("/profile"));
    }

    #[test]
    fn prefix_must_end_at_segment_boundary() {
        assert!(!is_public("/jobs"));
        assert!(!is_public("/companyx"));
        assert!(!is_admin("/administrator"));
        assert!(is_admin("/admin"));
        assert!(is_admin("/admin/ui/user"));
    }

    #[test]
    fn requirement_lookup_is_exact() {
        assert_eq!(
            requirement_for("/admin/ui/user"),
            Some(RouteRequirement::Module {
                module: "USERS",
                action: Action::Get
            })
        );
        assert_eq!(
            requirement_for("/admin/ui/form"),
            Some(RouteRequirement::Role("SUPER_ADMIN"))
        );
        assert_eq!(requirement_for("/admin/ui/user/123"), None);
        assert_eq!(requirement_for("/admin"), None);
    }

    #[test]
    fn module_api_path_lowercases() {
        assert_eq!(module_api_path("USERS"), "/api/v1/users");
        assert_eq!(module_api_path("Jobs"), "/api/v1/jobs");
    }

    #[test]
    fn canonical_path_collapses_slashes() {
        assert_eq!(canonical_path("/admin/ui/form/"), "/admin/ui/form");
        assert_eq!(canonical_path("//admin/ui/form"), "/admin/ui/form");
        assert_eq!(canonical_path("/admin//ui///user//"), "/admin/ui/user");
        assert_eq!(canonical_path("/admin/./ui/user"), "/admin/ui/user");
        assert_eq!(canonical_path("/"), "/");
        assert_eq!(canonical_path("//"), "/");
        assert_eq!(canonical_path("/job/42"), "/job/42");
    }

    #[test]
    fn canonical_path_decodes_percent_escapes() {
        assert_eq!(canonical_path("/admin/ui/%66orm"), "/admin/ui/form");
        assert_eq!(canonical_path("/admin%2Fui%2Fuser"), "/admin/ui/user");
        // invalid UTF-8 stays encoded
        assert_eq!(canonical_path("/admin/ui/x%FF/"), "/admin/ui/x%FF");
    }

    #[test]
    fn matcher_skips_api_and_assets() {
        let matcher = RouteMatcher::new().unwrap();
        assert!(!matcher.matches("/api/auth/login"));
        assert!(!matcher.matches("/api"));
        assert!(!matcher.matches("/health"));
        assert!(!matcher.matches("/_next/static/chunks/main.js"));
        assert!(!matcher.matches("/_next/image"));
        assert!(!matcher.matches("/favicon.ico"));
        assert!(!matcher.matches("/images/logo.PNG"));
        assert!(!matcher.matches("/fonts/inter.woff2"));
    }

    #[test]
    fn matcher_covers_pages() {
        let matcher = RouteMatcher::new().unwrap();
        assert!(matcher.matches("/"));
        assert!(matcher.matches("/admin/ui/user"));
        assert!(matcher.matches("/apidocs"));
        assert!(matcher.matches("/job/123"));
    }
}
