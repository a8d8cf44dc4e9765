use super::*;

impl PostgresTenantRoleRepository {
    pub(super) async fn assign_staff_role_impl(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
        role_id: TenantRoleId,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO staff_role_assignments (tenant_id, staff_id, role_id)
            SELECT roles.tenant_id, $2, roles.id
            FROM tenant_roles AS roles
            WHERE roles.tenant_id = $1 AND roles.id = $3
            ON CONFLICT (tenant_id, staff_id) DO UPDATE
            SET role_id = EXCLUDED.role_id, assigned_at = NOW()
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(staff_id)
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign staff role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist in tenant '{tenant_id}'"
            )));
        }

        Ok(())
    }

    pub(super) async fn find_staff_role_impl(
        &self,
        tenant_id: TenantId,
        staff_id: &str,
    ) -> AppResult<Option<TenantRoleId>> {
        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT role_id
            FROM staff_role_assignments
            WHERE tenant_id = $1 AND staff_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(staff_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find staff role: {error}")))?;

        Ok(role_id.map(TenantRoleId::from_uuid))
    }
}
