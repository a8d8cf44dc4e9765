use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use tenora_application::TenantRoleRepository;
use tenora_core::{AppError, AppResult, TenantId};
use tenora_domain::{Permission, TenantRole, TenantRoleId};

mod staff_assignments;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed tenant role store.
///
/// Default swaps and role deletion lock the tenant's role rows for the length
/// of the transaction. A partial unique index keeps a single default per tenant
/// and a restricting foreign key keeps staff references valid.
#[derive(Clone)]
pub struct PostgresTenantRoleRepository {
    pool: PgPool,
}

impl PostgresTenantRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

#[derive(Debug, FromRow)]
struct LockedRoleRow {
    id: Uuid,
    name: String,
    is_system: bool,
    is_default: bool,
}

#[derive(Debug, FromRow)]
struct TenantRoleRow {
    role_id: Uuid,
    name: String,
    description: Option<String>,
    is_system: bool,
    is_default: bool,
    permission: Option<String>,
}

const SELECT_ROLES: &str = r#"
    SELECT
        roles.id AS role_id,
        roles.name,
        roles.description,
        roles.is_system,
        roles.is_default,
        permissions.permission
    FROM tenant_roles AS roles
    LEFT JOIN tenant_role_permissions AS permissions
        ON permissions.role_id = roles.id
"#;

#[async_trait]
impl TenantRoleRepository for PostgresTenantRoleRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<TenantRole>> {
        let rows = sqlx::query_as::<_, TenantRoleRow>(&format!(
            "{SELECT_ROLES} WHERE roles.tenant_id = $1 ORDER BY roles.name, roles.id, permissions.permission"
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list tenant roles: {error}")))?;

        aggregate_roles(rows, tenant_id)
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: TenantRoleId,
    ) -> AppResult<Option<TenantRole>> {
        let rows = sqlx::query_as::<_, TenantRoleRow>(&format!(
            "{SELECT_ROLES} WHERE roles.tenant_id = $1 AND roles.id = $2 ORDER BY permissions.permission"
        ))
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find tenant role: {error}")))?;

        Ok(aggregate_roles(rows, tenant_id)?.into_iter().next())
    }

    async fn insert_role(&self, tenant_id: TenantId, role: TenantRole) -> AppResult<()> {
        let mut transaction = self.begin().await?;

        if role.is_default() {
            lock_tenant_roles(&mut transaction, tenant_id).await?;
            clear_default(&mut transaction, tenant_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO tenant_roles (id, tenant_id, name, description, is_system, is_default)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(role.role_id().as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(role.name().as_str())
        .bind(role.description())
        .bind(role.is_system())
        .bind(role.is_default())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_role_write_error(error, role.name().as_str()))?;

        replace_permissions(&mut transaction, &role).await?;

        commit(transaction).await
    }

    async fn update_role(&self, tenant_id: TenantId, role: TenantRole) -> AppResult<()> {
        let mut transaction = self.begin().await?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE tenant_roles
            SET name = $3, description = $4, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.role_id().as_uuid())
        .bind(role.name().as_str())
        .bind(role.description())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_role_write_error(error, role.name().as_str()))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role '{}' does not exist in tenant '{tenant_id}'",
                role.role_id()
            )));
        }

        replace_permissions(&mut transaction, &role).await?;

        commit(transaction).await
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()> {
        let mut transaction = self.begin().await?;
        let locked = lock_roles(&mut transaction, tenant_id, &[role_id]).await?;
        ensure_deletable(&locked, tenant_id, role_id)?;

        let holders = count_holders(&mut transaction, tenant_id, role_id).await?;
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

        delete_role_row(&mut transaction, tenant_id, role_id).await?;

        commit(transaction).await
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

        let mut transaction = self.begin().await?;
        let locked = lock_roles(&mut transaction, tenant_id, &[role_id, replacement_role_id]).await?;
        ensure_deletable(&locked, tenant_id, role_id)?;

        let reassigned = sqlx::query(
            r#"
            UPDATE staff_role_assignments
            SET role_id = $3, assigned_at = NOW()
            WHERE tenant_id = $1 AND role_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(replacement_role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to reassign staff roles: {error}")))?
        .rows_affected();

        delete_role_row(&mut transaction, tenant_id, role_id).await?;

        commit(transaction).await?;
        Ok(reassigned)
    }

    async fn set_default_role(&self, tenant_id: TenantId, role_id: TenantRoleId) -> AppResult<()> {
        let mut transaction = self.begin().await?;
        lock_tenant_roles(&mut transaction, tenant_id).await?;
        clear_default(&mut transaction, tenant_id).await?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE tenant_roles
            SET is_default = TRUE, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to set default role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist in tenant '{tenant_id}'"
            )));
        }

        commit(transaction).await
    }

    async fn find_default_role(&self, tenant_id: TenantId) -> AppResult<Option<TenantRole>> {
        let rows = sqlx::query_as::<_, TenantRoleRow>(&format!(
            "{SELECT_ROLES} WHERE roles.tenant_id = $1 AND roles.is_default ORDER BY permissions.permission"
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find default role: {error}")))?;

        Ok(aggregate_roles(rows, tenant_id)?.into_iter().next())
    }

    async fn assign_staff_role(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
        role_id: TenantRoleId,
    ) -> AppResult<()> {
        self.assign_staff_role_impl(tenant_id, staff_id, role_id)
            .await
    }

    async fn find_staff_role(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
    ) -> AppResult<Option<TenantRoleId>> {
        self.find_staff_role_impl(tenant_id, staff_id).await
    }
}

fn aggregate_roles(rows: Vec<TenantRoleRow>, tenant_id: TenantId) -> AppResult<Vec<TenantRole>> {
    let mut grouped: Vec<(TenantRoleRow, BTreeSet<Permission>)> = Vec::new();

    for row in rows {
        let permission = row
            .permission
            .as_deref()
            .map(|value| {
                Permission::from_str(value).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid stored permission '{value}' for tenant '{tenant_id}': {error}"
                    ))
                })
            })
            .transpose()?;

        let continues_previous = grouped
            .last()
            .is_some_and(|(current, _)| current.role_id == row.role_id);
        if continues_previous {
            if let Some((_, permissions)) = grouped.last_mut() {
                permissions.extend(permission);
            }
        } else {
            grouped.push((row, permission.into_iter().collect()));
        }
    }

    grouped
        .into_iter()
        .map(|(row, permissions)| {
            TenantRole::restore(
                TenantRoleId::from_uuid(row.role_id),
                tenant_id,
                row.name,
                row.description,
                row.is_system,
                row.is_default,
                permissions,
            )
            .map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored role '{}' for tenant '{tenant_id}': {error}",
                    row.role_id
                ))
            })
        })
        .collect()
}

async fn lock_tenant_roles(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
) -> AppResult<()> {
    sqlx::query(
        r#"
        SELECT id
        FROM tenant_roles
        WHERE tenant_id = $1
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(tenant_id.as_uuid())
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to lock tenant roles: {error}")))?;

    Ok(())
}

async fn lock_roles(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    role_ids: &[TenantRoleId],
) -> AppResult<Vec<LockedRoleRow>> {
    let ids: Vec<Uuid> = role_ids.iter().map(TenantRoleId::as_uuid).collect();

    let locked = sqlx::query_as::<_, LockedRoleRow>(
        r#"
        SELECT id, name, is_system, is_default
        FROM tenant_roles
        WHERE tenant_id = $1 AND id = ANY($2)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(&ids)
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to lock tenant roles: {error}")))?;

    if let Some(missing) = ids
        .iter()
        .find(|id| !locked.iter().any(|row| row.id == **id))
    {
        return Err(AppError::NotFound(format!(
            "role '{missing}' does not exist in tenant '{tenant_id}'"
        )));
    }

    Ok(locked)
}

/// Checks deletion rules against role rows already locked by this transaction.
fn ensure_deletable(
    locked: &[LockedRoleRow],
    tenant_id: TenantId,
    role_id: TenantRoleId,
) -> AppResult<()> {
    let Some(row) = locked.iter().find(|row| row.id == role_id.as_uuid()) else {
        return Err(AppError::NotFound(format!(
            "role '{role_id}' does not exist in tenant '{tenant_id}'"
        )));
    };

    if row.is_system {
        return Err(AppError::Forbidden(format!(
            "system role '{}' cannot be modified or deleted",
            row.name
        )));
    }

    if row.is_default {
        warn!(
            tenant_id = %tenant_id,
            role_id = %role_id,
            "refused to delete the tenant default role"
        );
        return Err(AppError::Conflict(format!(
            "role '{}' is the tenant default; choose another default before deleting it",
            row.name
        )));
    }

    Ok(())
}

async fn clear_default(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE tenant_roles
        SET is_default = FALSE, updated_at = NOW()
        WHERE tenant_id = $1 AND is_default
        "#,
    )
    .bind(tenant_id.as_uuid())
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to clear default role: {error}")))?;

    Ok(())
}

async fn replace_permissions(
    transaction: &mut Transaction<'_, Postgres>,
    role: &TenantRole,
) -> AppResult<()> {
    sqlx::query("DELETE FROM tenant_role_permissions WHERE role_id = $1")
        .bind(role.role_id().as_uuid())
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear role permissions: {error}"))
        })?;

    for permission in role.permissions() {
        sqlx::query(
            r#"
            INSERT INTO tenant_role_permissions (role_id, permission)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission) DO NOTHING
            "#,
        )
        .bind(role.role_id().as_uuid())
        .bind(permission.as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist role permissions: {error}"))
        })?;
    }

    Ok(())
}

async fn count_holders(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    role_id: TenantRoleId,
) -> AppResult<u64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM staff_role_assignments
        WHERE tenant_id = $1 AND role_id = $2
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(role_id.as_uuid())
    .fetch_one(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to count role holders: {error}")))?;

    u64::try_from(count)
        .map_err(|error| AppError::Internal(format!("invalid role holder count: {error}")))
}

async fn delete_role_row(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    role_id: TenantRoleId,
) -> AppResult<()> {
    sqlx::query("DELETE FROM tenant_roles WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_role_write_error(error, &role_id.to_string()))?;

    Ok(())
}

async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

fn map_role_write_error(error: sqlx::Error, role: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            Some("23505") => {
                return AppError::Conflict(format!("role '{role}' already exists"));
            }
            Some("23503") => {
                return AppError::Conflict(format!(
                    "role '{role}' is still assigned to staff members"
                ));
            }
            _ => {}
        }
    }

    AppError::Internal(format!("failed to write role '{role}': {error}"))
}
