use std::sync::Arc;

use tenora_core::{AppError, AppResult, TenantId};
use tenora_domain::{Permission, ResolvedPermissions, RoleRegistry, TenantRole, TenantRoleId};
use tracing::debug;

use crate::TenantRoleRepository;

mod assignments;
mod roles;
mod seed;


/// Application service for tenant role administration and provisioning.
#[derive(Clone)]
pub struct TenantRoleService {
    repository: Arc<dyn TenantRoleRepository>,
    registry: Arc<RoleRegistry>,
}

impl TenantRoleService {
    /// Creates a new tenant role service.
    #[must_use]
    pub fn new(repository: Arc<dyn TenantRoleRepository>, registry: Arc<RoleRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    fn require_role_manage_permission(&self, actor: &ResolvedPermissions) -> AppResult<()> {
        if actor.has_permission(Permission::RolesManage) {
            return Ok(());
        }

        debug!(role = %actor.role(), "role administration denied");
        Err(AppError::Forbidden(format!(
            "role '{}' is missing permission '{}'",
            actor.role(),
            Permission::RolesManage
        )))
    }

    async fn find_existing_role(
        &self,
        tenant_id: TenantId,
        role_id: TenantRoleId,
    ) -> AppResult<TenantRole> {
        self.repository
            .find_role(tenant_id, role_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role '{role_id}' does not exist in tenant '{tenant_id}'"
                ))
            })
    }
}
