use super::*;

use std::collections::BTreeSet;

use tenora_domain::RoleTemplate;
use tracing::info;

use crate::tenant_role_ports::{
    CloneTenantRoleInput, CreateTenantRoleInput, RoleSeed, UpdateTenantRoleInput,
};

impl TenantRoleService {
    /// Returns the templates offered when creating roles.
    pub fn list_templates(&self, actor: &ResolvedPermissions) -> AppResult<Vec<RoleTemplate>> {
        self.require_role_manage_permission(actor)?;
        Ok(self.registry.templates().cloned().collect())
    }

    /// Returns tenant roles ordered by name.
    pub async fn list_roles(
        &self,
        actor: &ResolvedPermissions,
        tenant_id: TenantId,
    ) -> AppResult<Vec<TenantRole>> {
        self.require_role_manage_permission(actor)?;
        self.repository.list_roles(tenant_id).await
    }

    /// Creates an editable role from a template or an explicit permission list.
    pub async fn create_role(
        &self,
        actor: &ResolvedPermissions,
        tenant_id: TenantId,
        input: CreateTenantRoleInput,
    ) -> AppResult<TenantRole> {
        self.require_role_manage_permission(actor)?;

        let permissions = self.seed_permissions(&input.seed)?;
        let role = TenantRole::new(tenant_id, input.name, input.description, permissions)?;
        self.repository.insert_role(tenant_id, role.clone()).await?;

        info!(
            tenant_id = %tenant_id,
            role_id = %role.role_id(),
            role_name = %role.name(),
            "tenant role created"
        );
        Ok(role)
    }

    /// Replaces name, description and permission set of an editable role.
    pub async fn update_role(
        &self,
        actor: &ResolvedPermissions,
        tenant_id: TenantId,
        role_id: TenantRoleId,
        input: UpdateTenantRoleInput,
    ) -> AppResult<TenantRole> {
        self.require_role_manage_permission(actor)?;

        let mut role = self.find_existing_role(tenant_id, role_id).await?;
        role.ensure_mutable()?;
        let permissions = Permission::parse_list(&input.permissions)?;
        role.update(input.name, input.description, permissions)?;
        self.repository.update_role(tenant_id, role.clone()).await?;

        info!(
            tenant_id = %tenant_id,
            role_id = %role_id,
            permission_count = role.permissions().len(),
            "tenant role updated"
        );
        Ok(role)
    }

    /// Copies an existing role into a new, independent editable role.
    pub async fn clone_role(
        &self,
        actor: &ResolvedPermissions,
        tenant_id: TenantId,
        input: CloneTenantRoleInput,
    ) -> AppResult<TenantRole> {
        self.require_role_manage_permission(actor)?;

        let source = self
            .find_existing_role(tenant_id, input.source_role_id)
            .await?;
        let role = source.duplicate(input.name, input.description)?;
        self.repository.insert_role(tenant_id, role.clone()).await?;

        info!(
            tenant_id = %tenant_id,
            source_role_id = %source.role_id(),
            role_id = %role.role_id(),
            "tenant role cloned"
        );
        Ok(role)
    }

    /// Deletes an editable role that no staff member references.
    pub async fn delete_role(
        &self,
        actor: &ResolvedPermissions,
        tenant_id: TenantId,
        role_id: TenantRoleId,
    ) -> AppResult<()> {
        self.require_role_manage_permission(actor)?;

        let role = self.find_existing_role(tenant_id, role_id).await?;
        ensure_deletable(&role)?;
        self.repository.delete_role(tenant_id, role_id).await?;

        info!(tenant_id = %tenant_id, role_id = %role_id, "tenant role deleted");
        Ok(())
    }

    /// Moves every holder of a role to a replacement role, then deletes it.
    ///
    /// Returns the number of reassigned staff members.
    pub async fn delete_role_with_reassignment(
        &self,
        actor: &ResolvedPermissions,
        tenant_id: TenantId,
        role_id: TenantRoleId,
        replacement_role_id: TenantRoleId,
    ) -> AppResult<u64> {
        self.require_role_manage_permission(actor)?;

        if role_id == replacement_role_id {
            return Err(AppError::Validation(
                "replacement role must differ from the deleted role".to_owned(),
            ));
        }

        let role = self.find_existing_role(tenant_id, role_id).await?;
        ensure_deletable(&role)?;
        self.find_existing_role(tenant_id, replacement_role_id)
            .await?;

        let reassigned = self
            .repository
            .delete_role_reassigning(tenant_id, role_id, replacement_role_id)
            .await?;

        info!(
            tenant_id = %tenant_id,
            role_id = %role_id,
            replacement_role_id = %replacement_role_id,
            reassigned,
            "tenant role deleted with reassignment"
        );
        Ok(reassigned)
    }

    fn seed_permissions(&self, seed: &RoleSeed) -> AppResult<BTreeSet<Permission>> {
        match seed {
            RoleSeed::Template(key) => Ok(self.registry.template_for(*key)?.permissions().clone()),
            RoleSeed::Permissions(values) => Permission::parse_list(values),
        }
    }
}

fn ensure_deletable(role: &TenantRole) -> AppResult<()> {
    role.ensure_mutable()?;

    if role.is_default() {
        return Err(AppError::Conflict(format!(
            "role '{}' is the tenant default; choose another default before deleting it",
            role.name()
        )));
    }

    Ok(())
}
