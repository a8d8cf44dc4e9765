use std::collections::BTreeSet;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tenora_application::TenantRoleRepository;
use tenora_core::{AppError, TenantId};
use tenora_domain::{Permission, TenantRole};

use super::PostgresTenantRoleRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres tenant role tests: {error}");
    }

    Some(pool)
}

fn role(tenant_id: TenantId, name: &str, permissions: &[Permission]) -> TenantRole {
    let Ok(role) = TenantRole::new(
        tenant_id,
        name,
        Some(format!("{name} role")),
        permissions.iter().copied().collect::<BTreeSet<_>>(),
    ) else {
        panic!("role must build");
    };
    role
}

#[tokio::test]
async fn stored_roles_round_trip_with_permissions() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRoleRepository::new(pool);
    let tenant_id = TenantId::new();
    let stored = role(
        tenant_id,
        "Front desk",
        &[Permission::BookingsView, Permission::CustomersCreate],
    );
    let empty = role(tenant_id, "Custom", &[]);

    assert!(repository.insert_role(tenant_id, stored.clone()).await.is_ok());
    assert!(repository.insert_role(tenant_id, empty.clone()).await.is_ok());

    let listed = repository.list_roles(tenant_id).await;
    assert!(matches!(listed, Ok(roles) if roles == vec![empty.clone(), stored.clone()]));

    let found = repository.find_role(tenant_id, stored.role_id()).await;
    assert!(matches!(found, Ok(Some(role)) if role == stored));

    let other_tenant = repository.find_role(TenantId::new(), stored.role_id()).await;
    assert!(matches!(other_tenant, Ok(None)));
}

#[tokio::test]
async fn duplicate_names_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRoleRepository::new(pool);
    let tenant_id = TenantId::new();
    assert!(repository
        .insert_role(tenant_id, role(tenant_id, "Staff", &[]))
        .await
        .is_ok());

    let duplicate = repository
        .insert_role(tenant_id, role(tenant_id, "Staff", &[]))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn update_replaces_permissions() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRoleRepository::new(pool);
    let tenant_id = TenantId::new();
    let mut stored = role(
        tenant_id,
        "Staff",
        &[Permission::BookingsView, Permission::BookingsDelete],
    );
    assert!(repository.insert_role(tenant_id, stored.clone()).await.is_ok());

    let updated = stored.update("Staff", None, BTreeSet::from([Permission::BookingsView]));
    assert!(updated.is_ok());
    assert!(repository.update_role(tenant_id, stored.clone()).await.is_ok());

    let found = repository.find_role(tenant_id, stored.role_id()).await;
    assert!(matches!(
        found,
        Ok(Some(role)) if role.permissions() == &BTreeSet::from([Permission::BookingsView])
            && role.description().is_none()
    ));
}

#[tokio::test]
async fn default_swap_keeps_single_default() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRoleRepository::new(pool);
    let tenant_id = TenantId::new();
    let mut staff = role(tenant_id, "Staff", &[]);
    staff.set_default(true);
    let viewer = role(tenant_id, "Viewer", &[]);
    let viewer_id = viewer.role_id();
    assert!(repository.insert_role(tenant_id, staff).await.is_ok());
    assert!(repository.insert_role(tenant_id, viewer).await.is_ok());

    assert!(repository.set_default_role(tenant_id, viewer_id).await.is_ok());

    let default = repository.find_default_role(tenant_id).await;
    assert!(matches!(default, Ok(Some(role)) if role.role_id() == viewer_id));
    let Ok(roles) = repository.list_roles(tenant_id).await else {
        panic!("roles must list");
    };
    assert_eq!(roles.iter().filter(|role| role.is_default()).count(), 1);
}

#[tokio::test]
async fn referenced_role_deletion_conflicts_until_reassigned() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRoleRepository::new(pool);
    let tenant_id = TenantId::new();
    let manager = role(tenant_id, "Manager", &[Permission::ReportsView]);
    let viewer = role(tenant_id, "Viewer", &[]);
    let (manager_id, viewer_id) = (manager.role_id(), viewer.role_id());
    assert!(repository.insert_role(tenant_id, manager).await.is_ok());
    assert!(repository.insert_role(tenant_id, viewer).await.is_ok());
    assert!(repository
        .assign_staff_role(tenant_id, "staff-1", manager_id)
        .await
        .is_ok());

    let blocked = repository.delete_role(tenant_id, manager_id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(message)) if message.contains("1 staff")));

    let moved = repository
        .delete_role_reassigning(tenant_id, manager_id, viewer_id)
        .await;
    assert!(matches!(moved, Ok(1)));

    let staff_role = repository.find_staff_role(tenant_id, "staff-1").await;
    assert!(matches!(staff_role, Ok(Some(role_id)) if role_id == viewer_id));
    assert!(matches!(repository.find_role(tenant_id, manager_id).await, Ok(None)));
}

#[tokio::test]
async fn system_and_default_roles_cannot_be_deleted() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRoleRepository::new(pool);
    let tenant_id = TenantId::new();
    let Ok(owner) = TenantRole::new_system(tenant_id, "Owner", None, BTreeSet::new()) else {
        panic!("system role must build");
    };
    let staff = role(tenant_id, "Staff", &[]);
    let viewer = role(tenant_id, "Viewer", &[]);
    let (owner_id, staff_id, viewer_id) = (owner.role_id(), staff.role_id(), viewer.role_id());
    assert!(repository.insert_role(tenant_id, owner).await.is_ok());
    assert!(repository.insert_role(tenant_id, staff).await.is_ok());
    assert!(repository.insert_role(tenant_id, viewer).await.is_ok());
    assert!(repository.set_default_role(tenant_id, staff_id).await.is_ok());

    let system = repository.delete_role(tenant_id, owner_id).await;
    assert!(matches!(system, Err(AppError::Forbidden(_))));
    let system_reassigning = repository
        .delete_role_reassigning(tenant_id, owner_id, viewer_id)
        .await;
    assert!(matches!(system_reassigning, Err(AppError::Forbidden(_))));

    let default = repository.delete_role(tenant_id, staff_id).await;
    assert!(matches!(default, Err(AppError::Conflict(_))));
    let default_reassigning = repository
        .delete_role_reassigning(tenant_id, staff_id, viewer_id)
        .await;
    assert!(matches!(default_reassigning, Err(AppError::Conflict(_))));

    assert!(matches!(repository.find_role(tenant_id, owner_id).await, Ok(Some(_))));
    let current_default = repository.find_default_role(tenant_id).await;
    assert!(matches!(current_default, Ok(Some(role)) if role.role_id() == staff_id));
}

#[tokio::test]
async fn staff_cannot_reference_roles_of_another_tenant() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRoleRepository::new(pool);
    let owner_tenant = TenantId::new();
    let stored = role(owner_tenant, "Staff", &[]);
    let role_id = stored.role_id();
    assert!(repository.insert_role(owner_tenant, stored).await.is_ok());

    let result = repository
        .assign_staff_role(TenantId::new(), "staff-1", role_id)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
