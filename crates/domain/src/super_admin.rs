use tenora_core::{AppError, AppResult};

use crate::{Permission, PlatformRole, RoleGrants, RoleRegistry};

/// Permissions only the super admin may ever hold.
///
/// Kept apart from the role matrix so the two can be audited independently.
pub const SUPER_ADMIN_EXCLUSIVE_PERMISSIONS: &[Permission] = &[
    Permission::DeleteTenants,
    Permission::ManagePlatformAdmins,
    Permission::ManageSystemSettings,
    Permission::ManageFeatureFlags,
    Permission::ImpersonateTenant,
];

/// Returns whether a permission is reserved for the super admin.
#[must_use]
pub fn is_super_admin_exclusive(permission: Permission) -> bool {
    SUPER_ADMIN_EXCLUSIVE_PERMISSIONS.contains(&permission)
}

/// Checks that no role other than the super admin holds an exclusive
/// permission, either through the platform matrix or a tenant template.
pub fn verify_super_admin_exclusivity(registry: &RoleRegistry) -> AppResult<()> {
    let mut violations = Vec::new();

    for definition in registry.definitions() {
        if definition.platform_role() == PlatformRole::SuperAdmin {
            continue;
        }
        for permission in definition.permissions() {
            if is_super_admin_exclusive(*permission) {
                violations.push(format!("{}:{permission}", definition.platform_role()));
            }
        }
    }

    for template in registry.templates() {
        for permission in template.permissions() {
            if is_super_admin_exclusive(*permission) {
                violations.push(format!("template {}:{permission}", template.key()));
            }
        }
    }

    if violations.is_empty() {
        return Ok(());
    }

    Err(AppError::Internal(format!(
        "super admin exclusive permissions granted to other roles: {}",
        violations.join(", ")
    )))
}
