//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod permission_resolver;
mod tenant_role_ports;
mod tenant_role_service;

#[cfg(test)]
mod test_support;

pub use authorization_service::{AccessRequirement, AuthorizationRequest, AuthorizationService};
pub use permission_resolver::PermissionResolver;
pub use tenant_role_ports::{
    CloneTenantRoleInput, CreateTenantRoleInput, RoleSeed, TenantRoleRepository,
    UpdateTenantRoleInput,
};
pub use tenant_role_service::TenantRoleService;
