use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tenora_core::{AppError, AppResult, TenantId};
use tenora_domain::{
    AdminScope, Permission, ResolvedPermissions, RoleRegistry, TenantRole, TenantRoleId,
};

use crate::{PermissionResolver, TenantRoleRepository};

#[derive(Default)]
struct FakeState {
    roles: Vec<TenantRole>,
    staff: HashMap<(TenantId, String), TenantRoleId>,
}

impl FakeState {
    fn ensure_deletable(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()> {
        let Some(role) = self
            .roles
            .iter()
            .find(|role| role.tenant_id() == tenant_id && role.role_id() == role_id)
        else {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        };

        role.ensure_mutable()?;
        if role.is_default() {
            return Err(AppError::Conflict(format!("role '{role_id}' is the default")));
        }

        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeTenantRoleRepository {
    state: Mutex<FakeState>,
}

#[async_trait]
impl TenantRoleRepository for FakeTenantRoleRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<TenantRole>> {
        let state = self.state.lock().await;
        let mut roles: Vec<TenantRole> = state
            .roles
            .iter()
            .filter(|role| role.tenant_id() == tenant_id)
            .cloned()
            .collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: TenantRoleId,
    ) -> AppResult<Option<TenantRole>> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .iter()
            .find(|role| role.tenant_id() == tenant_id && role.role_id() == role_id)
            .cloned())
    }

    async fn insert_role(&self, tenant_id: TenantId, role: TenantRole) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state
            .roles
            .iter()
            .any(|existing| existing.tenant_id() == tenant_id && existing.name() == role.name())
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name()
            )));
        }

        if role.is_default() {
            for existing in state
                .roles
                .iter_mut()
                .filter(|existing| existing.tenant_id() == tenant_id)
            {
                existing.set_default(false);
            }
        }

        state.roles.push(role);
        Ok(())
    }

    async fn update_role(&self, tenant_id: TenantId, role: TenantRole) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let Some(existing) = state
            .roles
            .iter_mut()
            .find(|existing| existing.tenant_id() == tenant_id && existing.role_id() == role.role_id())
        else {
            return Err(AppError::NotFound(format!("role '{}' not found", role.role_id())));
        };

        *existing = role;
        Ok(())
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_deletable(tenant_id, role_id)?;
        let holders = state
            .staff
            .iter()
            .filter(|((tenant, _), role)| *tenant == tenant_id && **role == role_id)
            .count();
        if holders > 0 {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is assigned to {holders} staff member(s)"
            )));
        }

        state
            .roles
            .retain(|role| !(role.tenant_id() == tenant_id && role.role_id() == role_id));
        Ok(())
    }

    async fn delete_role_reassigning(
        &self,
        tenant_id: TenantId,
        role_id: TenantRoleId,
        replacement_role_id: TenantRoleId,
    ) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        state.ensure_deletable(tenant_id, role_id)?;
        let mut moved = 0_u64;
        for ((tenant, _), role) in state.staff.iter_mut() {
            if *tenant == tenant_id && *role == role_id {
                *role = replacement_role_id;
                moved += 1;
            }
        }

        state
            .roles
            .retain(|role| !(role.tenant_id() == tenant_id && role.role_id() == role_id));
        Ok(moved)
    }

    async fn set_default_role(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for role in state
            .roles
            .iter_mut()
            .filter(|role| role.tenant_id() == tenant_id)
        {
            let is_target = role.role_id() == role_id;
            role.set_default(is_target);
        }
        Ok(())
    }

    async fn find_default_role(&self, tenant_id: TenantId) -> AppResult<Option<TenantRole>> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .iter()
            .find(|role| role.tenant_id() == tenant_id && role.is_default())
            .cloned())
    }

    async fn assign_staff_role(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
        role_id: TenantRoleId,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state
            .staff
            .insert((tenant_id, staff_id.to_owned()), role_id);
        Ok(())
    }

    async fn find_staff_role(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
    ) -> AppResult<Option<TenantRoleId>> {
        let state = self.state.lock().await;
        Ok(state.staff.get(&(tenant_id, staff_id.to_owned())).copied())
    }
}

pub(crate) fn standard_registry() -> Arc<RoleRegistry> {
    let Ok(registry) = RoleRegistry::standard() else {
        panic!("standard registry must build");
    };
    Arc::new(registry)
}

pub(crate) fn standard_resolver() -> PermissionResolver {
    let Ok(resolver) = PermissionResolver::new(standard_registry()) else {
        panic!("standard registry must pass self-checks");
    };
    resolver
}

pub(crate) fn platform_actor(role: &str) -> ResolvedPermissions {
    standard_resolver().resolve(role, AdminScope::default())
}

pub(crate) fn tenant_actor(tenant_id: TenantId, permissions: &[Permission]) -> ResolvedPermissions {
    let Ok(role) = TenantRole::new(
        tenant_id,
        "Acting role",
        None,
        permissions.iter().copied().collect(),
    ) else {
        panic!("acting role must build");
    };
    standard_resolver().resolve_tenant_role(&role)
}
