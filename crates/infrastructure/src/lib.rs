//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_tenant_role_repository;
mod postgres_tenant_role_repository;

pub use in_memory_tenant_role_repository::InMemoryTenantRoleRepository;
pub use postgres_tenant_role_repository::PostgresTenantRoleRepository;
