use std::collections::{BTreeMap, BTreeSet};

use tenora_core::{AppError, AppResult};

use crate::role_template::standard_role_templates;
use crate::{Permission, PlatformRole, Role, RoleGrants, RoleTemplate, RoleTemplateKey, ScopeType};

/// Scope type and static permission set bound to one platform role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    role: PlatformRole,
    scope_type: ScopeType,
    permissions: BTreeSet<Permission>,
}

impl RoleDefinition {
    /// Creates a platform role definition.
    #[must_use]
    pub fn new(
        role: PlatformRole,
        scope_type: ScopeType,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            role,
            scope_type,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Returns the platform role.
    #[must_use]
    pub fn platform_role(&self) -> PlatformRole {
        self.role
    }
}

impl RoleGrants for RoleDefinition {
    fn role(&self) -> Role {
        Role::Platform(self.role)
    }

    fn scope_type(&self) -> ScopeType {
        self.scope_type
    }

    fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }
}

/// Role used when a role string is not recognized.
pub const DEFAULT_FALLBACK_ROLE: PlatformRole = PlatformRole::SupportTeam;

const PLATFORM_ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewTenants,
    Permission::ManageTenants,
    Permission::SuspendTenants,
    Permission::ViewAnalytics,
    Permission::ViewRevenue,
    Permission::ManageSubscriptions,
    Permission::ViewSupportTickets,
    Permission::ManageSupportTickets,
    Permission::ViewAuditLogs,
    Permission::ExportPlatformData,
];

const REGIONAL_MANAGER_PERMISSIONS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewTenants,
    Permission::ManageTenants,
    Permission::ViewAnalytics,
    Permission::ViewRevenue,
    Permission::ViewSupportTickets,
    Permission::ManageSupportTickets,
    Permission::ManageRegions,
];

const COUNTRY_MANAGER_PERMISSIONS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewTenants,
    Permission::ManageTenants,
    Permission::ViewAnalytics,
    Permission::ViewSupportTickets,
    Permission::ManageSupportTickets,
];

const SUPPORT_TEAM_PERMISSIONS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewTenants,
    Permission::ViewSupportTickets,
    Permission::ManageSupportTickets,
];

/// Immutable table of platform role definitions and tenant role templates.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: BTreeMap<PlatformRole, RoleDefinition>,
    templates: BTreeMap<RoleTemplateKey, RoleTemplate>,
    fallback: RoleDefinition,
}

impl RoleRegistry {
    /// Builds a registry from explicit definitions.
    ///
    /// Fails when two definitions share a role or template key, or when the
    /// fallback role is missing or globally scoped.
    pub fn new(
        definitions: impl IntoIterator<Item = RoleDefinition>,
        templates: impl IntoIterator<Item = RoleTemplate>,
        fallback_role: PlatformRole,
    ) -> AppResult<Self> {
        let mut roles = BTreeMap::new();
        for definition in definitions {
            let role = definition.platform_role();
            if roles.insert(role, definition).is_some() {
                return Err(AppError::Internal(format!(
                    "role registry defines platform role '{role}' more than once"
                )));
            }
        }

        let mut template_map = BTreeMap::new();
        for template in templates {
            let key = template.key();
            if template_map.insert(key, template).is_some() {
                return Err(AppError::Internal(format!(
                    "role registry defines template '{key}' more than once"
                )));
            }
        }

        let fallback = match roles.get(&fallback_role) {
            None => {
                return Err(AppError::Internal(format!(
                    "fallback role '{fallback_role}' is not defined in the role registry"
                )));
            }
            Some(definition) if definition.scope_type() == ScopeType::Global => {
                return Err(AppError::Internal(format!(
                    "fallback role '{fallback_role}' must not have global scope"
                )));
            }
            Some(definition) => definition.clone(),
        };

        Ok(Self {
            roles,
            templates: template_map,
            fallback,
        })
    }

    /// Builds the platform's standard role matrix and templates.
    pub fn standard() -> AppResult<Self> {
        Self::new(
            [
                RoleDefinition::new(
                    PlatformRole::SuperAdmin,
                    ScopeType::Global,
                    Permission::all()
                        .iter()
                        .copied()
                        .filter(|permission| {
                            permission.scope() == crate::PermissionScope::Platform
                        }),
                ),
                RoleDefinition::new(
                    PlatformRole::PlatformAdmin,
                    ScopeType::Country,
                    PLATFORM_ADMIN_PERMISSIONS.iter().copied(),
                ),
                RoleDefinition::new(
                    PlatformRole::RegionalManager,
                    ScopeType::Region,
                    REGIONAL_MANAGER_PERMISSIONS.iter().copied(),
                ),
                RoleDefinition::new(
                    PlatformRole::CountryManager,
                    ScopeType::Country,
                    COUNTRY_MANAGER_PERMISSIONS.iter().copied(),
                ),
                RoleDefinition::new(
                    PlatformRole::SupportTeam,
                    ScopeType::Country,
                    SUPPORT_TEAM_PERMISSIONS.iter().copied(),
                ),
            ],
            standard_role_templates(),
            DEFAULT_FALLBACK_ROLE,
        )
    }

    /// Returns the definition for a platform role.
    pub fn definition_for(&self, role: PlatformRole) -> AppResult<&RoleDefinition> {
        self.roles.get(&role).ok_or_else(|| {
            AppError::Internal(format!(
                "platform role '{role}' is not defined in the role registry"
            ))
        })
    }

    /// Returns the tenant role template for a key.
    pub fn template_for(&self, key: RoleTemplateKey) -> AppResult<&RoleTemplate> {
        self.templates.get(&key).ok_or_else(|| {
            AppError::Internal(format!(
                "role template '{key}' is not defined in the role registry"
            ))
        })
    }

    /// Returns the role used for unrecognized role strings.
    #[must_use]
    pub fn fallback_role(&self) -> PlatformRole {
        self.fallback.platform_role()
    }

    /// Returns the definition of the fallback role.
    #[must_use]
    pub fn fallback_definition(&self) -> &RoleDefinition {
        &self.fallback
    }

    /// Returns every platform role definition in role order.
    pub fn definitions(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.roles.values()
    }

    /// Returns every tenant role template in key order.
    pub fn templates(&self) -> impl Iterator<Item = &RoleTemplate> {
        self.templates.values()
    }
}
