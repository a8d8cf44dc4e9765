use std::str::FromStr;
use std::sync::Arc;

use tenora_core::AppResult;
use tenora_domain::{
    AdminScope, PlatformRole, ResolvedPermissions, RoleGrants, RoleRegistry, TenantRole,
    verify_super_admin_exclusivity,
};
use tracing::{debug, warn};

/// Turns a role and scope assignment into effective permissions.
///
/// Pure and synchronous; safe to share across request handlers.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    registry: Arc<RoleRegistry>,
}

impl PermissionResolver {
    /// Creates a resolver after running the registry self-checks.
    pub fn new(registry: Arc<RoleRegistry>) -> AppResult<Self> {
        verify_super_admin_exclusivity(&registry)?;
        Ok(Self { registry })
    }

    /// Returns the injected registry.
    #[must_use]
    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Resolves a platform role string.
    ///
    /// Unknown role strings resolve as the registry's fallback role instead
    /// of failing.
    #[must_use]
    pub fn resolve(&self, role: &str, assignment: AdminScope) -> ResolvedPermissions {
        let definition = PlatformRole::from_str(role)
            .ok()
            .and_then(|platform_role| self.registry.definition_for(platform_role).ok());

        let definition = match definition {
            Some(definition) => definition,
            None => {
                let fallback = self.registry.fallback_definition();
                warn!(
                    role = %role,
                    fallback = %fallback.platform_role(),
                    "unknown platform role resolved as fallback role"
                );
                fallback
            }
        };

        self.resolve_grants(definition, assignment)
    }

    /// Resolves a known platform role, failing when the registry lacks it.
    pub fn resolve_platform_role(
        &self,
        role: PlatformRole,
        assignment: AdminScope,
    ) -> AppResult<ResolvedPermissions> {
        let definition = self.registry.definition_for(role)?;
        Ok(self.resolve_grants(definition, assignment))
    }

    /// Resolves a stored tenant role. Tenant roles carry no geographic scope.
    #[must_use]
    pub fn resolve_tenant_role(&self, role: &TenantRole) -> ResolvedPermissions {
        self.resolve_grants(role, AdminScope::default())
    }

    fn resolve_grants<G>(&self, grants: &G, assignment: AdminScope) -> ResolvedPermissions
    where
        G: RoleGrants + ?Sized,
    {
        let resolved = ResolvedPermissions::from_grants(grants, assignment);
        debug!(
            role = %resolved.role(),
            scope_type = %resolved.scope_type(),
            permission_count = resolved.permissions().len(),
            "resolved permissions"
        );
        resolved
    }
}
