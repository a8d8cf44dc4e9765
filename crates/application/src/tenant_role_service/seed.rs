use super::*;

use tenora_domain::RoleTemplateKey;
use tracing::info;

/// Templates provisioned into every new tenant, in creation order.
const SEEDED_TEMPLATES: &[RoleTemplateKey] = &[
    RoleTemplateKey::Owner,
    RoleTemplateKey::Admin,
    RoleTemplateKey::Manager,
    RoleTemplateKey::Staff,
    RoleTemplateKey::Viewer,
];

/// Template whose seeded role new staff receive.
const SEEDED_DEFAULT_TEMPLATE: RoleTemplateKey = RoleTemplateKey::Staff;

impl TenantRoleService {
    /// Provisions the standard roles of a new tenant.
    ///
    /// Called by tenant creation rather than by an administrator, so no actor
    /// is checked. Roles whose name already exists are left untouched and a
    /// default is only designated when the tenant has none.
    pub async fn seed_tenant_roles(&self, tenant_id: TenantId) -> AppResult<Vec<TenantRole>> {
        let existing = self.repository.list_roles(tenant_id).await?;
        let mut has_default = existing.iter().any(TenantRole::is_default);
        let mut created = 0_usize;

        for key in SEEDED_TEMPLATES {
            let template = self.registry.template_for(*key)?;
            if existing
                .iter()
                .any(|role| role.name().as_str() == template.display_name())
            {
                continue;
            }

            let description = Some(template.description().to_owned());
            let permissions = template.permissions().clone();
            let mut role = if *key == RoleTemplateKey::Owner {
                TenantRole::new_system(tenant_id, template.display_name(), description, permissions)?
            } else {
                TenantRole::new(tenant_id, template.display_name(), description, permissions)?
            };

            if *key == SEEDED_DEFAULT_TEMPLATE && !has_default {
                role.set_default(true);
                has_default = true;
            }

            self.repository.insert_role(tenant_id, role).await?;
            created += 1;
        }

        if created > 0 {
            info!(tenant_id = %tenant_id, created, "tenant roles seeded");
        }

        self.repository.list_roles(tenant_id).await
    }
}
