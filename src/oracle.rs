//! In-app permission lookups over the loaded account's permission list.
//!
//! The oracle answers "can this user do X on module M" for action gating and
//! menu filtering. It never replaces the backend's own checks: every API call
//! is still authorized server-side.

use serde::Serialize;

use crate::models::{Action, ModulePermissions, Permission};
use crate::routes::{requirement_for, RouteRequirement, SUPER_ADMIN_ROLE};

/// Borrowed view over a role name and its permissions.
///
/// An unauthenticated user is an oracle over an empty list with no role.
#[derive(Debug, Clone, Copy)]
pub struct PermissionOracle<'a> {
    permissions: &'a [Permission],
    role: Option<&'a str>,
    super_admin: &'a str,
}

impl Default for PermissionOracle<'_> {
    fn default() -> Self {
        Self::new(&[], None)
    }
}

impl<'a> PermissionOracle<'a> {
    pub fn new(permissions: &'a [Permission], role: Option<&'a str>) -> Self {
        Self {
            permissions,
            role,
            super_admin: SUPER_ADMIN_ROLE,
        }
    }

    /// Use a configured super-admin role name instead of `SUPER_ADMIN`.
    pub fn with_super_admin(mut self, super_admin: &'a str) -> Self {
        self.super_admin = super_admin;
        self
    }

    /// True iff some permission has exactly this module and method.
    ///
    /// No case folding: `"jobs"` does not match `"JOBS"`.
    pub fn has_permission(&self, module: &str, action: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p.module == module && p.method == action)
    }

    /// CRUD view of one module.
    pub fn module_permissions(&self, module: &str) -> ModulePermissions {
        let [create, read, update, delete] =
            Action::ALL.map(|action| self.has_permission(module, action.as_str()));
        ModulePermissions {
            can_create: create,
            can_read: read,
            can_update: update,
            can_delete: delete,
        }
    }

    /// Exact role-name check for role-gated entries.
    pub fn has_role(&self, role: &str) -> bool {
        self.role == Some(role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(self.super_admin)
    }

    /// Whether a page or menu requirement is satisfied.
    ///
    /// The super-admin role satisfies every requirement regardless of its
    /// permission list, as at the gate.
    pub fn allows(&self, requirement: &RouteRequirement) -> bool {
        if self.is_super_admin() {
            return true;
        }
        match requirement {
            RouteRequirement::Module { module, action } => {
                self.has_permission(module, action.as_str())
            }
            RouteRequirement::Role(role) => self.has_role(role),
        }
    }

    /// Keep only the menu entries this user may see.
    pub fn filter_menu(&self, items: &[MenuItem]) -> Vec<MenuItem> {
        items
            .iter()
            .filter(|item| {
                item.requirement
                    .as_ref()
                    .is_none_or(|requirement| self.allows(requirement))
            })
            .cloned()
            .collect()
    }
}

/// One navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
    #[serde(skip)]
    pub requirement: Option<RouteRequirement>,
}

impl MenuItem {
    /// An entry gated the same way as the page it links to.
    fn for_page(label: &'static str, path: &'static str) -> Self {
        Self {
            label,
            path,
            requirement: requirement_for(path),
        }
    }
}

/// The admin back-office navigation, in display order.
pub fn admin_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::for_page("Dashboard", "/admin"),
        MenuItem::for_page("Companies", "/admin/ui/company"),
        MenuItem::for_page("Users", "/admin/ui/user"),
        MenuItem::for_page("Jobs", "/admin/ui/job"),
        MenuItem::for_page("Skills", "/admin/ui/skill"),
        MenuItem::for_page("Resumes", "/admin/ui/resume"),
        MenuItem::for_page("Roles", "/admin/ui/role"),
        MenuItem::for_page("Permissions", "/admin/ui/permission"),
        MenuItem::for_page("Forms", "/admin/ui/form"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(module: &str, method: &str) -> Permission {
        Permission::new(format!("/api/v1/{}", module.to_lowercase()), method, module)
    }

    #[test]
    fn has_permission_exact_match() {
        let perms = vec![perm("JOBS", "GET")];
        let oracle = PermissionOracle::new(&perms, Some("HR"));
        assert!(oracle.has_permission("JOBS", "GET"));
        assert!(!oracle.has_permission("JOBS", "POST"));
        assert!(!oracle.has_permission("USERS", "GET"));
    }

    #[test]
    fn has_permission_empty_list() {
        let oracle = PermissionOracle::default();
        assert!(!oracle.has_permission("JOBS", "GET"));
    }

    #[test]
    fn has_permission_is_case_sensitive() {
        let perms = vec![perm("JOBS", "GET")];
        let oracle = PermissionOracle::new(&perms, None);
        assert!(!oracle.has_permission("jobs", "GET"));
        assert!(!oracle.has_permission("JOBS", "get"));
    }

    #[test]
    fn module_permissions_read_only() {
        let perms = vec![perm("JOBS", "GET")];
        let oracle = PermissionOracle::new(&perms, None);
        assert_eq!(
            oracle.module_permissions("JOBS"),
            ModulePermissions {
                can_create: false,
                can_read: true,
                can_update: false,
                can_delete: false,
            }
        );
    }

    #[test]
    fn module_permissions_full_crud() {
        let perms = vec![
            perm("SKILLS", "GET"),
            perm("SKILLS", "POST"),
            perm("SKILLS", "PUT"),
            perm("SKILLS", "DELETE"),
        ];
        let oracle = PermissionOracle::new(&perms, None);
        let crud = oracle.module_permissions("SKILLS");
        assert!(crud.can_create && crud.can_read && crud.can_update && crud.can_delete);
        assert_eq!(oracle.module_permissions("JOBS"), ModulePermissions::default());
    }

    #[test]
    fn has_role_exact() {
        let oracle = PermissionOracle::new(&[], Some("SUPER_ADMIN"));
        assert!(oracle.has_role("SUPER_ADMIN"));
        assert!(!oracle.has_role("ADMIN"));
        assert!(!PermissionOracle::default().has_role("SUPER_ADMIN"));
    }

    #[test]
    fn menu_hides_unreadable_modules() {
        let perms = vec![perm("JOBS", "GET"), perm("COMPANIES", "POST")];
        let oracle = PermissionOracle::new(&perms, Some("HR"));

        let visible: Vec<_> = oracle
            .filter_menu(&admin_menu())
            .into_iter()
            .map(|item| item.path)
            .collect();

        assert_eq!(visible, vec!["/admin", "/admin/ui/job"]);
    }

    #[test]
    fn menu_shows_role_gated_entry_to_matching_role() {
        let oracle = PermissionOracle::new(&[], Some("SUPER_ADMIN"));
        let visible = oracle.filter_menu(&admin_menu());
        assert!(visible.iter().any(|item| item.path == "/admin/ui/form"));

        let oracle = PermissionOracle::new(&[], Some("ADMIN"));
        let visible = oracle.filter_menu(&admin_menu());
        assert!(!visible.iter().any(|item| item.path == "/admin/ui/form"));
    }

    #[test]
    fn super_admin_sees_the_whole_menu_without_permissions() {
        let oracle = PermissionOracle::new(&[], Some("SUPER_ADMIN"));
        assert_eq!(oracle.filter_menu(&admin_menu()), admin_menu());
        assert!(oracle.allows(&RouteRequirement::Module {
            module: "USERS",
            action: Action::Delete,
        }));
        // the raw lookup stays exact
        assert!(!oracle.has_permission("USERS", "GET"));
    }

    #[test]
    fn configured_super_admin_replaces_the_default() {
        let oracle = PermissionOracle::new(&[], Some("OWNER")).with_super_admin("OWNER");
        assert!(oracle.is_super_admin());
        assert_eq!(oracle.filter_menu(&admin_menu()).len(), admin_menu().len());

        let oracle = PermissionOracle::new(&[], Some("SUPER_ADMIN")).with_super_admin("OWNER");
        assert!(!oracle.is_super_admin());
        let visible: Vec<_> = oracle
            .filter_menu(&admin_menu())
            .into_iter()
            .map(|item| item.path)
            .collect();
        // "Forms" is gated on the literal SUPER_ADMIN role name
        assert_eq!(visible, vec!["/admin", "/admin/ui/form"]);
    }

    #[test]
    fn no_role_is_never_super_admin() {
        assert!(!PermissionOracle::default().is_super_admin());
        assert!(!PermissionOracle::new(&[], None).with_super_admin("").is_super_admin());
    }

    #[test]
    fn admin_menu_mirrors_route_table() {
        for item in admin_menu() {
            assert_eq!(item.requirement, requirement_for(item.path));
        }
    }
}
