use std::collections::HashMap;

use async_trait::async_trait;
use tenora_application::TenantRoleRepository;
use tenora_core::{AppError, AppResult, TenantId};
use tenora_domain::{TenantRole, TenantRoleId};
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Debug, Default)]
struct TenantRoleState {
    roles: HashMap<(TenantId, TenantRoleId), TenantRole>,
    staff_roles: HashMap<(TenantId, String), TenantRoleId>,
}

impl TenantRoleState {
    fn holders(&self, tenant_id: TenantId, role_id: TenantRoleId) -> u64 {
        let count = self
            .staff_roles
            .iter()
            .filter(|((stored_tenant_id, _), stored_role_id)| {
                *stored_tenant_id == tenant_id && **stored_role_id == role_id
            })
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }

    fn clear_default(&mut self, tenant_id: TenantId) {
        for ((stored_tenant_id, _), role) in &mut self.roles {
            if *stored_tenant_id == tenant_id {
                role.set_default(false);
            }
        }
    }

    fn ensure_exists(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()> {
        if self.roles.contains_key(&(tenant_id, role_id)) {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "role '{role_id}' does not exist in tenant '{tenant_id}'"
        )))
    }

    fn ensure_deletable(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()> {
        let Some(role) = self.roles.get(&(tenant_id, role_id)) else {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist in tenant '{tenant_id}'"
            )));
        };

        role.ensure_mutable()?;

        if role.is_default() {
            warn!(
                tenant_id = %tenant_id,
                role_id = %role_id,
                "refused to delete the tenant default role"
            );
            return Err(AppError::Conflict(format!(
                "role '{}' is the tenant default; choose another default before deleting it",
                role.name()
            )));
        }

        Ok(())
    }
}

/// In-memory tenant role store.
///
/// One lock guards roles and staff references together, so every call is atomic.
#[derive(Debug, Default)]
pub struct InMemoryTenantRoleRepository {
    state: RwLock<TenantRoleState>,
}

impl InMemoryTenantRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRoleRepository for InMemoryTenantRoleRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<TenantRole>> {
        let state = self.state.read().await;

        let mut roles: Vec<TenantRole> = state
            .roles
            .iter()
            .filter_map(|((stored_tenant_id, _), role)| {
                (stored_tenant_id == &tenant_id).then_some(role.clone())
            })
            .collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(roles)
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: TenantRoleId,
    ) -> AppResult<Option<TenantRole>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .get(&(tenant_id, role_id))
            .cloned())
    }

    async fn insert_role(&self, tenant_id: TenantId, role: TenantRole) -> AppResult<()> {
        let mut state = self.state.write().await;

        let name_taken = state.roles.iter().any(|((stored_tenant_id, _), existing)| {
            *stored_tenant_id == tenant_id && existing.name() == role.name()
        });
        if name_taken {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists for tenant '{tenant_id}'",
                role.name()
            )));
        }

        if role.is_default() {
            state.clear_default(tenant_id);
        }

        state.roles.insert((tenant_id, role.role_id()), role);
        Ok(())
    }

    async fn update_role(&self, tenant_id: TenantId, role: TenantRole) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.ensure_exists(tenant_id, role.role_id())?;

        let name_taken = state.roles.iter().any(|((stored_tenant_id, stored_role_id), existing)| {
            *stored_tenant_id == tenant_id
                && *stored_role_id != role.role_id()
                && existing.name() == role.name()
        });
        if name_taken {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists for tenant '{tenant_id}'",
                role.name()
            )));
        }

        let key = (tenant_id, role.role_id());
        let is_default = state
            .roles
            .get(&key)
            .is_some_and(TenantRole::is_default);
        let mut role = role;
        role.set_default(is_default);
        state.roles.insert(key, role);
        Ok(())
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.ensure_deletable(tenant_id, role_id)?;

        let holders = state.holders(tenant_id, role_id);
        if holders > 0 {
            warn!(
                tenant_id = %tenant_id,
                role_id = %role_id,
                holders,
                "refused to delete tenant role still assigned to staff"
            );
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is still assigned to {holders} staff member(s)"
            )));
        }

        state.roles.remove(&(tenant_id, role_id));
        Ok(())
    }

    async fn delete_role_reassigning(
        &self,
        tenant_id: TenantId,
        role_id: TenantRoleId,
        replacement_role_id: TenantRoleId,
    ) -> AppResult<u64> {
        if role_id == replacement_role_id {
            return Err(AppError::Validation(
                "replacement role must differ from the deleted role".to_owned(),
            ));
        }

        let mut state = self.state.write().await;
        state.ensure_deletable(tenant_id, role_id)?;
        state.ensure_exists(tenant_id, replacement_role_id)?;

        let mut reassigned = 0_u64;
        for ((stored_tenant_id, _), stored_role_id) in &mut state.staff_roles {
            if *stored_tenant_id == tenant_id && *stored_role_id == role_id {
                *stored_role_id = replacement_role_id;
                reassigned += 1;
            }
        }

        state.roles.remove(&(tenant_id, role_id));
        Ok(reassigned)
    }

    async fn set_default_role(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.ensure_exists(tenant_id, role_id)?;

        state.clear_default(tenant_id);
        if let Some(role) = state.roles.get_mut(&(tenant_id, role_id)) {
            role.set_default(true);
        }
        Ok(())
    }

    async fn find_default_role(&self, tenant_id: TenantId) -> AppResult<Option<TenantRole>> {
        let state = self.state.read().await;

        Ok(state
            .roles
            .iter()
            .find(|((stored_tenant_id, _), role)| {
                *stored_tenant_id == tenant_id && role.is_default()
            })
            .map(|(_, role)| role.clone()))
    }

    async fn assign_staff_role(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
        role_id: TenantRoleId,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.ensure_exists(tenant_id, role_id)?;

        state
            .staff_roles
            .insert((tenant_id, staff_id.to_owned()), role_id);
        Ok(())
    }

    async fn find_staff_role(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
    ) -> AppResult<Option<TenantRoleId>> {
        Ok(self
            .state
            .read()
            .await
            .staff_roles
            .get(&(tenant_id, staff_id.to_owned()))
            .copied())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use tenora_application::TenantRoleRepository;
    use tenora_core::{AppError, TenantId};
    use tenora_domain::{Permission, TenantRole};

    use super::InMemoryTenantRoleRepository;

    fn role(tenant_id: TenantId, name: &str) -> TenantRole {
        let Ok(role) = TenantRole::new(
            tenant_id,
            name,
            None,
            BTreeSet::from([Permission::BookingsView]),
        ) else {
            panic!("role must build");
        };
        role
    }

    #[tokio::test]
    async fn lists_roles_by_name_within_tenant() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let other_tenant = TenantId::new();

        for (tenant, name) in [(tenant_id, "Viewer"), (tenant_id, "Admin"), (other_tenant, "Owner")] {
            assert!(repository.insert_role(tenant, role(tenant, name)).await.is_ok());
        }

        let Ok(roles) = repository.list_roles(tenant_id).await else {
            panic!("roles must list");
        };
        let names: Vec<&str> = roles.iter().map(|role| role.name().as_str()).collect();
        assert_eq!(names, vec!["Admin", "Viewer"]);
    }

    #[tokio::test]
    async fn rejects_duplicate_names_per_tenant_only() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let other_tenant = TenantId::new();

        assert!(repository.insert_role(tenant_id, role(tenant_id, "Staff")).await.is_ok());
        let duplicate = repository.insert_role(tenant_id, role(tenant_id, "Staff")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
        assert!(repository
            .insert_role(other_tenant, role(other_tenant, "Staff"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn inserting_default_role_replaces_previous_default() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let mut first = role(tenant_id, "Staff");
        first.set_default(true);
        let mut second = role(tenant_id, "Viewer");
        second.set_default(true);
        let second_id = second.role_id();

        assert!(repository.insert_role(tenant_id, first).await.is_ok());
        assert!(repository.insert_role(tenant_id, second).await.is_ok());

        let Ok(roles) = repository.list_roles(tenant_id).await else {
            panic!("roles must list");
        };
        assert_eq!(roles.iter().filter(|role| role.is_default()).count(), 1);
        let default = repository.find_default_role(tenant_id).await;
        assert!(matches!(default, Ok(Some(role)) if role.role_id() == second_id));
    }

    #[tokio::test]
    async fn update_keeps_default_designation() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let mut stored = role(tenant_id, "Staff");
        stored.set_default(true);
        assert!(repository.insert_role(tenant_id, stored.clone()).await.is_ok());

        stored.set_default(false);
        let updated = stored.update("Team", None, BTreeSet::from([Permission::CustomersView]));
        assert!(updated.is_ok());
        assert!(repository.update_role(tenant_id, stored.clone()).await.is_ok());

        let found = repository.find_role(tenant_id, stored.role_id()).await;
        assert!(matches!(found, Ok(Some(role)) if role.is_default() && role.name().as_str() == "Team"));
    }

    #[tokio::test]
    async fn referenced_role_cannot_be_deleted() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let stored = role(tenant_id, "Staff");
        let role_id = stored.role_id();
        assert!(repository.insert_role(tenant_id, stored).await.is_ok());
        assert!(repository.assign_staff_role(tenant_id, "s-1", role_id).await.is_ok());
        assert!(repository.assign_staff_role(tenant_id, "s-2", role_id).await.is_ok());

        let result = repository.delete_role(tenant_id, role_id).await;
        assert!(matches!(result, Err(AppError::Conflict(message)) if message.contains("2 staff")));
        assert!(matches!(repository.find_role(tenant_id, role_id).await, Ok(Some(_))));
    }

    #[tokio::test]
    async fn assignment_to_missing_role_is_rejected() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();

        let result = repository
            .assign_staff_role(tenant_id, "s-1", role(tenant_id, "Ghost").role_id())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn reassignment_moves_every_holder() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let old = role(tenant_id, "Old");
        let new = role(tenant_id, "New");
        let (old_id, new_id) = (old.role_id(), new.role_id());
        assert!(repository.insert_role(tenant_id, old).await.is_ok());
        assert!(repository.insert_role(tenant_id, new).await.is_ok());
        for staff in ["a", "b", "c"] {
            assert!(repository.assign_staff_role(tenant_id, staff, old_id).await.is_ok());
        }

        let moved = repository
            .delete_role_reassigning(tenant_id, old_id, new_id)
            .await;
        assert!(matches!(moved, Ok(3)));
        assert!(matches!(repository.find_role(tenant_id, old_id).await, Ok(None)));
        for staff in ["a", "b", "c"] {
            let assigned = repository.find_staff_role(tenant_id, staff).await;
            assert!(matches!(assigned, Ok(Some(role_id)) if role_id == new_id));
        }
    }

    #[tokio::test]
    async fn system_role_cannot_be_deleted() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let Ok(owner) = TenantRole::new_system(tenant_id, "Owner", None, BTreeSet::new()) else {
            panic!("system role must build");
        };
        let viewer = role(tenant_id, "Viewer");
        let (owner_id, viewer_id) = (owner.role_id(), viewer.role_id());
        assert!(repository.insert_role(tenant_id, owner).await.is_ok());
        assert!(repository.insert_role(tenant_id, viewer).await.is_ok());

        let plain = repository.delete_role(tenant_id, owner_id).await;
        assert!(matches!(plain, Err(AppError::Forbidden(_))));
        let reassigning = repository
            .delete_role_reassigning(tenant_id, owner_id, viewer_id)
            .await;
        assert!(matches!(reassigning, Err(AppError::Forbidden(_))));
        assert!(matches!(repository.find_role(tenant_id, owner_id).await, Ok(Some(_))));
    }

    #[tokio::test]
    async fn default_role_cannot_be_deleted() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let staff = role(tenant_id, "Staff");
        let viewer = role(tenant_id, "Viewer");
        let (staff_id, viewer_id) = (staff.role_id(), viewer.role_id());
        assert!(repository.insert_role(tenant_id, staff).await.is_ok());
        assert!(repository.insert_role(tenant_id, viewer).await.is_ok());
        assert!(repository.set_default_role(tenant_id, staff_id).await.is_ok());

        let plain = repository.delete_role(tenant_id, staff_id).await;
        assert!(matches!(plain, Err(AppError::Conflict(_))));
        let reassigning = repository
            .delete_role_reassigning(tenant_id, staff_id, viewer_id)
            .await;
        assert!(matches!(reassigning, Err(AppError::Conflict(_))));

        let default = repository.find_default_role(tenant_id).await;
        assert!(matches!(default, Ok(Some(role)) if role.role_id() == staff_id));
    }

    #[tokio::test]
    async fn role_made_default_after_lookup_is_still_protected() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let staff = role(tenant_id, "Staff");
        let staff_id = staff.role_id();
        assert!(repository.insert_role(tenant_id, staff).await.is_ok());

        let looked_up = repository.find_role(tenant_id, staff_id).await;
        assert!(matches!(looked_up, Ok(Some(role)) if !role.is_default()));
        assert!(repository.set_default_role(tenant_id, staff_id).await.is_ok());

        let result = repository.delete_role(tenant_id, staff_id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(matches!(repository.find_default_role(tenant_id).await, Ok(Some(_))));
    }

    #[tokio::test]
    async fn reassignment_onto_the_deleted_role_is_rejected() {
        let repository = InMemoryTenantRoleRepository::new();
        let tenant_id = TenantId::new();
        let stored = role(tenant_id, "Manager");
        let role_id = stored.role_id();
        assert!(repository.insert_role(tenant_id, stored).await.is_ok());

        let result = repository
            .delete_role_reassigning(tenant_id, role_id, role_id)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(matches!(repository.find_role(tenant_id, role_id).await, Ok(Some(_))));
    }

    #[tokio::test]
    async fn concurrent_default_swaps_leave_one_default() {
        let repository = Arc::new(InMemoryTenantRoleRepository::new());
        let tenant_id = TenantId::new();
        let mut role_ids = Vec::new();
        for index in 0..8 {
            let stored = role(tenant_id, &format!("Role {index}"));
            role_ids.push(stored.role_id());
            assert!(repository.insert_role(tenant_id, stored).await.is_ok());
        }

        let mut handles = Vec::new();
        for role_id in role_ids {
            let repository = Arc::clone(&repository);
            handles.push(tokio::spawn(async move {
                repository.set_default_role(tenant_id, role_id).await
            }));
        }
        for handle in handles {
            assert!(matches!(handle.await, Ok(Ok(()))));
        }

        let Ok(roles) = repository.list_roles(tenant_id).await else {
            panic!("roles must list");
        };
        assert_eq!(roles.iter().filter(|role| role.is_default()).count(), 1);
    }
}
