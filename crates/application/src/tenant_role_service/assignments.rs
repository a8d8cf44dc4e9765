use super::*;

use tracing::info;

impl TenantRoleService {
    /// Makes a role the tenant default, replacing the previous default.
    pub async fn set_default_role(
        &self,
        actor: &ResolvedPermissions,
        tenant_id: TenantId,
        role_id: TenantRoleId,
    ) -> AppResult<TenantRole> {
        self.require_role_manage_permission(actor)?;

        let mut role = self.find_existing_role(tenant_id, role_id).await?;
        self.repository.set_default_role(tenant_id, role_id).await?;
        role.set_default(true);

        info!(tenant_id = %tenant_id, role_id = %role_id, "tenant default role changed");
        Ok(role)
    }

    /// Points a staff member at a role, or at the tenant default when no role
    /// is given. Returns the assigned role.
    pub async fn assign_staff_role(
        &self,
        actor: &ResolvedPermissions,
        tenant_id: TenantId,
        staff_id: &str,
        role_id: Option<TenantRoleId>,
    ) -> AppResult<TenantRole> {
        self.require_role_manage_permission(actor)?;

        let staff_id = staff_id.trim();
        if staff_id.is_empty() {
            return Err(AppError::Validation(
                "staff id must not be empty".to_owned(),
            ));
        }

        let role = match role_id {
            Some(role_id) => self.find_existing_role(tenant_id, role_id).await?,
            None => self
                .repository
                .find_default_role(tenant_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("tenant '{tenant_id}' has no default role"))
                })?,
        };

        self.repository
            .assign_staff_role(tenant_id, staff_id, role.role_id())
            .await?;

        info!(
            tenant_id = %tenant_id,
            staff_id = %staff_id,
            role_id = %role.role_id(),
            "staff role assigned"
        );
        Ok(role)
    }
}
