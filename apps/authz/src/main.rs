//! Tenora authorization core composition root.

#![forbid(unsafe_code)]

mod authz_config;

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tenora_application::{
    AuthorizationRequest, AuthorizationService, PermissionResolver, TenantRoleRepository,
    TenantRoleService,
};
use tenora_core::{AppError, AppResult, TenantId};
use tenora_domain::{RoleGrants, RoleRegistry};
use tenora_infrastructure::{InMemoryTenantRoleRepository, PostgresTenantRoleRepository};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::authz_config::AuthzConfig;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AuthzConfig::load()?;

    let registry = Arc::new(RoleRegistry::standard()?);
    let resolver = PermissionResolver::new(Arc::clone(&registry))?;
    log_role_matrix(&resolver);

    let repository: Arc<dyn TenantRoleRepository> = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = connect_and_migrate(database_url, config.database_max_connections).await?;
            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }
            Arc::new(PostgresTenantRoleRepository::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory tenant role store");
            Arc::new(InMemoryTenantRoleRepository::new())
        }
    };

    let authorization_service = AuthorizationService::new(resolver, Arc::clone(&repository));
    let tenant_role_service = TenantRoleService::new(repository, registry);

    if let Some(tenant_id) = config.seed_tenant_id {
        seed_tenant(&tenant_role_service, &authorization_service, tenant_id).await?;
    }

    info!("tenora-authz ready");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

async fn connect_and_migrate(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

fn log_role_matrix(resolver: &PermissionResolver) {
    let registry = resolver.registry();

    for definition in registry.definitions() {
        info!(
            role = %definition.platform_role(),
            scope_type = %definition.scope_type(),
            permission_count = definition.permissions().len(),
            "platform role loaded"
        );
    }

    info!(
        fallback = %registry.fallback_role(),
        permission_count = registry.fallback_definition().permissions().len(),
        template_count = registry.templates().count(),
        "role registry passed self-checks"
    );
}

async fn seed_tenant(
    tenant_role_service: &TenantRoleService,
    authorization_service: &AuthorizationService,
    tenant_id: TenantId,
) -> AppResult<()> {
    let roles = tenant_role_service.seed_tenant_roles(tenant_id).await?;

    for role in &roles {
        info!(
            tenant_id = %tenant_id,
            role = %role.name(),
            is_system = role.is_system(),
            is_default = role.is_default(),
            permission_count = role.permissions().len(),
            "tenant role available"
        );
    }

    if let Some(default_role) = roles.iter().find(|role| role.is_default()) {
        let resolved = authorization_service
            .resolve(&AuthorizationRequest::TenantRole {
                tenant_id,
                role_id: default_role.role_id(),
            })
            .await?;
        info!(
            tenant_id = %tenant_id,
            role = %resolved.role(),
            permission_count = resolved.permissions().len(),
            "default tenant role resolves"
        );
    }

    Ok(())
}
