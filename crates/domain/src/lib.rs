//! Domain entities and invariants of the authorization core.

#![forbid(unsafe_code)]

mod country;
mod menu;
mod permission;
mod resolved;
mod role;
mod role_registry;
mod role_template;
mod scope;
mod super_admin;
mod tenant_role;

pub use country::{TenantCountry, internal_to_iso, is_tenant_country_in_scope, iso_to_internal};
pub use menu::{MenuItem, filter_menu_items};
pub use permission::{Permission, PermissionScope, is_valid_permission};
pub use resolved::ResolvedPermissions;
pub use role::{PlatformRole, Role, RoleGrants, TenantRoleRef};
pub use role_registry::{DEFAULT_FALLBACK_ROLE, RoleDefinition, RoleRegistry};
pub use role_template::{RoleTemplate, RoleTemplateKey, standard_role_templates};
pub use scope::{AdminScope, ScopeType};
pub use super_admin::{
    SUPER_ADMIN_EXCLUSIVE_PERMISSIONS, is_super_admin_exclusive, verify_super_admin_exclusivity,
};
pub use tenant_role::{TenantRole, TenantRoleId};
