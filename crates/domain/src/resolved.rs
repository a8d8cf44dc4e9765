use std::collections::BTreeSet;

use serde::Serialize;

use crate::country::is_tenant_country_in_scope;
use crate::{AdminScope, Permission, Role, RoleGrants, ScopeType};

/// Effective permission and scope object for one actor.
///
/// This is the only authorization value consumed downstream by request
/// guards and menu filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPermissions {
    role: Role,
    permissions: BTreeSet<Permission>,
    scope: Option<AdminScope>,
    scope_type: ScopeType,
    is_super_admin: bool,
    is_global_scope: bool,
}

impl ResolvedPermissions {
    /// Combines role grants with a scope assignment.
    ///
    /// The assignment is dropped for global and tenant scoped roles.
    #[must_use]
    pub fn from_grants<G>(grants: &G, assignment: AdminScope) -> Self
    where
        G: RoleGrants + ?Sized,
    {
        let role = grants.role();
        let scope_type = grants.scope_type();
        let is_global_scope = scope_type == ScopeType::Global;
        let scope = match scope_type {
            ScopeType::Global | ScopeType::Tenant => None,
            ScopeType::Country | ScopeType::Region => Some(assignment),
        };

        Self {
            is_super_admin: role.is_super_admin(),
            role,
            permissions: grants.permissions().clone(),
            scope,
            scope_type,
            is_global_scope,
        }
    }

    /// Returns the resolved role.
    #[must_use]
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Returns the effective permission set.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    /// Returns the geographic assignment, absent for global and tenant roles.
    #[must_use]
    pub fn scope(&self) -> Option<&AdminScope> {
        self.scope.as_ref()
    }

    /// Returns the scope type of the resolved role.
    #[must_use]
    pub fn scope_type(&self) -> ScopeType {
        self.scope_type
    }

    /// Returns whether the actor is the super admin.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.is_super_admin
    }

    /// Returns whether the actor has global scope.
    #[must_use]
    pub fn is_global_scope(&self) -> bool {
        self.is_global_scope
    }

    /// Returns whether the permission is held.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Returns whether at least one of the permissions is held.
    #[must_use]
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions
            .iter()
            .any(|permission| self.permissions.contains(permission))
    }

    /// Returns whether the actor may act on the ISO country code.
    ///
    /// Codes compare ignoring ASCII case, like the country translator.
    #[must_use]
    pub fn can_access_country(&self, code: &str) -> bool {
        if self.is_global_scope {
            return true;
        }

        self.scope
            .as_ref()
            .is_none_or(|scope| contains_code(scope.country_ids(), code))
    }

    /// Returns whether the actor may act on the region code.
    ///
    /// Country assignments never satisfy a region check.
    #[must_use]
    pub fn can_access_region(&self, code: &str) -> bool {
        if self.is_global_scope {
            return true;
        }

        self.scope
            .as_ref()
            .is_none_or(|scope| contains_code(scope.region_ids(), code))
    }

    /// Returns whether the actor may act on a tenant stored with an internal
    /// country value.
    #[must_use]
    pub fn can_access_tenant_country(&self, internal_value: &str) -> bool {
        if self.is_global_scope {
            return true;
        }

        self.scope.as_ref().is_none_or(|scope| {
            is_tenant_country_in_scope(internal_value, scope.country_ids())
        })
    }
}

fn contains_code(assigned: &BTreeSet<String>, code: &str) -> bool {
    assigned
        .iter()
        .any(|assigned| assigned.eq_ignore_ascii_case(code))
}
