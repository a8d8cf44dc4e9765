use async_trait::async_trait;

use tenora_core::{AppResult, TenantId};
use tenora_domain::{RoleTemplateKey, TenantRole, TenantRoleId};

/// Where a new role's initial permission set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleSeed {
    /// Copy the permission set of a template.
    Template(RoleTemplateKey),
    /// Explicit permission selection in transport form.
    Permissions(Vec<String>),
}

/// Input payload for creating tenant roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTenantRoleInput {
    /// Unique role name in tenant scope.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Initial permission source.
    pub seed: RoleSeed,
}

/// Input payload for updating tenant roles. Permissions replace the stored set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTenantRoleInput {
    /// Unique role name in tenant scope.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Full replacement permission list in transport form.
    pub permissions: Vec<String>,
}

/// Input payload for cloning an existing tenant role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneTenantRoleInput {
    /// Role to copy permissions from.
    pub source_role_id: TenantRoleId,
    /// Name of the new role.
    pub name: String,
    /// Optional description of the new role.
    pub description: Option<String>,
}

/// Repository port for tenant roles and staff role references.
///
/// Implementations must make each call atomic: default swaps never leave zero
/// or two defaults, and deleting a role cannot race with a staff assignment
/// into a dangling reference.
#[async_trait]
pub trait TenantRoleRepository: Send + Sync {
    /// Lists tenant roles ordered by name.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<TenantRole>>;

    /// Finds one tenant role.
    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: TenantRoleId,
    ) -> AppResult<Option<TenantRole>>;

    /// Inserts a role. Fails with a conflict when the name is taken. When the
    /// role is flagged default, the previous default is cleared in the same step.
    async fn insert_role(&self, tenant_id: TenantId, role: TenantRole) -> AppResult<()>;

    /// Replaces name, description and permissions of an existing role.
    async fn update_role(&self, tenant_id: TenantId, role: TenantRole) -> AppResult<()>;

    /// Deletes a role. System roles are forbidden; the tenant default and any
    /// role still held by staff fail with a conflict. The checks run in the
    /// same atomic step as the delete.
    async fn delete_role(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()>;

    /// Moves every staff member holding `role_id` to `replacement_role_id`
    /// and deletes `role_id` in one step. Returns the number of moved staff.
    /// The system and default rules of [`Self::delete_role`] apply to `role_id`.
    async fn delete_role_reassigning(
        &self,
        tenant_id: TenantId,
        role_id: TenantRoleId,
        replacement_role_id: TenantRoleId,
    ) -> AppResult<u64>;

    /// Marks a role as the tenant default, clearing the previous default.
    async fn set_default_role(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()>;

    /// Finds the tenant default role.
    async fn find_default_role(&self, tenant_id: TenantId) -> AppResult<Option<TenantRole>>;

    /// Points a staff record at a role. Fails when the role does not exist.
    async fn assign_staff_role(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
        role_id: TenantRoleId,
    ) -> AppResult<()>;

    /// Returns the role a staff record references.
    async fn find_staff_role(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
    ) -> AppResult<Option<TenantRoleId>>;
}
