use std::sync::Arc;

use tenora_core::{AppError, AppResult, TenantId};
use tenora_domain::{
    AdminScope, MenuItem, Permission, ResolvedPermissions, TenantRoleId, filter_menu_items,
};
use tracing::debug;

use crate::{PermissionResolver, TenantRoleRepository};


/// Authenticated actor description handed over by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationRequest {
    /// Platform operator acting under a static role.
    Platform {
        /// Role identifier as stored on the operator account.
        role: String,
        /// Geographic assignment of the operator.
        scope: AdminScope,
    },
    /// Tenant actor acting under a known tenant role.
    TenantRole {
        /// Tenant the request is routed to.
        tenant_id: TenantId,
        /// Role the actor holds.
        role_id: TenantRoleId,
    },
    /// Staff member whose role is looked up from the staff record.
    Staff {
        /// Tenant the request is routed to.
        tenant_id: TenantId,
        /// Staff record identifier.
        staff_id: String,
    },
}

/// What a request needs before it may proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequirement {
    /// Permission the actor must hold.
    pub permission: Permission,
    /// ISO country code the request targets, if any.
    pub country: Option<String>,
    /// Region code the request targets, if any.
    pub region: Option<String>,
}

impl AccessRequirement {
    /// Requires a permission without a geographic target.
    #[must_use]
    pub fn permission(permission: Permission) -> Self {
        Self {
            permission,
            country: None,
            region: None,
        }
    }

    /// Adds a country target.
    #[must_use]
    pub fn in_country(mut self, code: impl Into<String>) -> Self {
        self.country = Some(code.into());
        self
    }

    /// Adds a region target.
    #[must_use]
    pub fn in_region(mut self, code: impl Into<String>) -> Self {
        self.region = Some(code.into());
        self
    }
}

/// Application service consumed by request guards and navigation builders.
///
/// Every call resolves from current state; decisions are never cached here.
#[derive(Clone)]
pub struct AuthorizationService {
    resolver: PermissionResolver,
    tenant_roles: Arc<dyn TenantRoleRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(resolver: PermissionResolver, tenant_roles: Arc<dyn TenantRoleRepository>) -> Self {
        Self {
            resolver,
            tenant_roles,
        }
    }

    /// Resolves the actor's effective permissions.
    ///
    /// Tenant actors whose role or staff record cannot be found are denied.
    pub async fn resolve(&self, request: &AuthorizationRequest) -> AppResult<ResolvedPermissions> {
        match request {
            AuthorizationRequest::Platform { role, scope } => {
                Ok(self.resolver.resolve(role, scope.clone()))
            }
            AuthorizationRequest::TenantRole { tenant_id, role_id } => {
                self.resolve_tenant_role(*tenant_id, *role_id).await
            }
            AuthorizationRequest::Staff {
                tenant_id,
                staff_id,
            } => {
                let role_id = self
                    .tenant_roles
                    .find_staff_role(*tenant_id, staff_id)
                    .await?
                    .ok_or_else(|| {
                        debug!(tenant_id = %tenant_id, staff_id = %staff_id, "staff has no role");
                        AppError::Forbidden(format!(
                            "staff '{staff_id}' has no role in tenant '{tenant_id}'"
                        ))
                    })?;

                self.resolve_tenant_role(*tenant_id, role_id).await
            }
        }
    }

    /// Resolves the actor and checks a requirement in one step.
    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
        requirement: &AccessRequirement,
    ) -> AppResult<ResolvedPermissions> {
        let resolved = self.resolve(request).await?;

        self.require_permission(&resolved, requirement.permission)?;
        if let Some(country) = requirement.country.as_deref() {
            self.require_country_access(&resolved, country)?;
        }
        if let Some(region) = requirement.region.as_deref() {
            self.require_region_access(&resolved, region)?;
        }

        Ok(resolved)
    }

    /// Returns the menu entries the actor may see.
    pub async fn navigation(
        &self,
        request: &AuthorizationRequest,
        items: &[MenuItem],
    ) -> AppResult<Vec<MenuItem>> {
        let resolved = self.resolve(request).await?;
        Ok(filter_menu_items(items, &resolved))
    }

    /// Ensures the resolved actor holds a permission.
    pub fn require_permission(
        &self,
        resolved: &ResolvedPermissions,
        permission: Permission,
    ) -> AppResult<()> {
        if resolved.has_permission(permission) {
            return Ok(());
        }

        debug!(role = %resolved.role(), permission = %permission, "permission denied");
        Err(AppError::Forbidden(format!(
            "role '{}' is missing permission '{permission}'",
            resolved.role()
        )))
    }

    /// Ensures the resolved actor may act on an ISO country code.
    pub fn require_country_access(
        &self,
        resolved: &ResolvedPermissions,
        code: &str,
    ) -> AppResult<()> {
        if resolved.can_access_country(code) {
            return Ok(());
        }

        debug!(role = %resolved.role(), country = %code, "country scope denied");
        Err(AppError::Forbidden(format!(
            "role '{}' has no access to country '{code}'",
            resolved.role()
        )))
    }

    /// Ensures the resolved actor may act on a region code.
    pub fn require_region_access(
        &self,
        resolved: &ResolvedPermissions,
        code: &str,
    ) -> AppResult<()> {
        if resolved.can_access_region(code) {
            return Ok(());
        }

        debug!(role = %resolved.role(), region = %code, "region scope denied");
        Err(AppError::Forbidden(format!(
            "role '{}' has no access to region '{code}'",
            resolved.role()
        )))
    }

    /// Ensures the resolved actor may act on a tenant stored with an internal
    /// country value.
    pub fn require_tenant_country_access(
        &self,
        resolved: &ResolvedPermissions,
        internal_value: &str,
    ) -> AppResult<()> {
        if resolved.can_access_tenant_country(internal_value) {
            return Ok(());
        }

        debug!(
            role = %resolved.role(),
            tenant_country = %internal_value,
            "tenant country scope denied"
        );
        Err(AppError::Forbidden(format!(
            "role '{}' has no access to tenants in '{internal_value}'",
            resolved.role()
        )))
    }

    async fn resolve_tenant_role(
        &self,
        tenant_id: TenantId,
        role_id: TenantRoleId,
    ) -> AppResult<ResolvedPermissions> {
        let role = self
            .tenant_roles
            .find_role(tenant_id, role_id)
            .await?
            .ok_or_else(|| {
                debug!(tenant_id = %tenant_id, role_id = %role_id, "tenant role not found");
                AppError::Forbidden(format!(
                    "role '{role_id}' does not exist in tenant '{tenant_id}'"
                ))
            })?;

        Ok(self.resolver.resolve_tenant_role(&role))
    }
}
