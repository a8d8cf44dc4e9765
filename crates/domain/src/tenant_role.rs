use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tenora_core::{AppError, AppResult, NonEmptyString, TenantId};
use uuid::Uuid;

use crate::{Permission, PermissionScope, Role, RoleGrants, ScopeType, TenantRoleRef};

/// Identifier of a stored tenant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantRoleId(Uuid);

impl TenantRoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantRoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TenantRoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for TenantRoleId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid role id '{value}': {error}")))
    }
}

/// Custom role owned by one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRole {
    role_id: TenantRoleId,
    tenant_id: TenantId,
    name: NonEmptyString,
    description: Option<String>,
    is_system: bool,
    is_default: bool,
    permissions: BTreeSet<Permission>,
}

impl TenantRole {
    /// Creates an editable tenant role with a fresh identifier.
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        description: Option<String>,
        permissions: BTreeSet<Permission>,
    ) -> AppResult<Self> {
        Self::restore(
            TenantRoleId::new(),
            tenant_id,
            name,
            description,
            false,
            false,
            permissions,
        )
    }

    /// Creates an immutable system role with a fresh identifier.
    pub fn new_system(
        tenant_id: TenantId,
        name: impl Into<String>,
        description: Option<String>,
        permissions: BTreeSet<Permission>,
    ) -> AppResult<Self> {
        Self::restore(
            TenantRoleId::new(),
            tenant_id,
            name,
            description,
            true,
            false,
            permissions,
        )
    }

    /// Rebuilds a role from stored values, re-checking its invariants.
    pub fn restore(
        role_id: TenantRoleId,
        tenant_id: TenantId,
        name: impl Into<String>,
        description: Option<String>,
        is_system: bool,
        is_default: bool,
        permissions: BTreeSet<Permission>,
    ) -> AppResult<Self> {
        ensure_tenant_assignable(&permissions)?;

        Ok(Self {
            role_id,
            tenant_id,
            name: NonEmptyString::new(name)?,
            description: normalize_description(description),
            is_system,
            is_default,
            permissions,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn role_id(&self) -> TenantRoleId {
        self.role_id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the role is system-managed.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Returns whether new staff receive this role by default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Returns the granted permission set.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    /// Returns a lightweight reference for resolved permissions.
    #[must_use]
    pub fn reference(&self) -> TenantRoleRef {
        TenantRoleRef {
            role_id: self.role_id,
            name: self.name.as_str().to_owned(),
        }
    }

    /// Fails with an authorization error when the role is system-managed.
    pub fn ensure_mutable(&self) -> AppResult<()> {
        if self.is_system {
            return Err(AppError::Forbidden(format!(
                "system role '{}' cannot be modified or deleted",
                self.name
            )));
        }

        Ok(())
    }

    /// Replaces name, description and the full permission set.
    pub fn update(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        permissions: BTreeSet<Permission>,
    ) -> AppResult<()> {
        self.ensure_mutable()?;
        ensure_tenant_assignable(&permissions)?;

        self.name = NonEmptyString::new(name)?;
        self.description = normalize_description(description);
        self.permissions = permissions;
        Ok(())
    }

    /// Copies this role's permission set into a new, independent role.
    pub fn duplicate(&self, name: impl Into<String>, description: Option<String>) -> AppResult<Self> {
        Self::new(self.tenant_id, name, description, self.permissions.clone())
    }

    /// Sets the default-role designation. Stores call this while swapping defaults.
    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

impl RoleGrants for TenantRole {
    fn role(&self) -> Role {
        Role::Tenant(self.reference())
    }

    fn scope_type(&self) -> ScopeType {
        ScopeType::Tenant
    }

    fn permissions(&self) -> &BTreeSet<Permission> {
        TenantRole::permissions(self)
    }
}

fn ensure_tenant_assignable(permissions: &BTreeSet<Permission>) -> AppResult<()> {
    let platform_only: Vec<&str> = permissions
        .iter()
        .filter(|permission| permission.scope() != PermissionScope::Tenant)
        .map(Permission::as_str)
        .collect();

    if platform_only.is_empty() {
        return Ok(());
    }

    Err(AppError::Validation(format!(
        "permissions cannot be granted to tenant roles: {}",
        platform_only.join(", ")
    )))
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}
