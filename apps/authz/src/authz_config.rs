use std::env;

use tenora_core::{AppError, AppResult, TenantId};

const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzConfig {
    pub migrate_only: bool,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub seed_tenant_id: Option<TenantId>,
}

impl AuthzConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(env::args().nth(1).as_deref(), |name| env::var(name).ok())
    }

    fn from_lookup<F>(first_argument: Option<&str>, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let migrate_only = first_argument == Some("migrate");
        let database_url = lookup("DATABASE_URL").filter(|value| !value.trim().is_empty());

        if migrate_only && database_url.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required to run migrations".to_owned(),
            ));
        }

        let database_max_connections = match lookup("AUTHZ_DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse::<u32>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid AUTHZ_DATABASE_MAX_CONNECTIONS value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_DATABASE_MAX_CONNECTIONS,
        };
        if database_max_connections == 0 {
            return Err(AppError::Validation(
                "AUTHZ_DATABASE_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        let seed_tenant_id = lookup("AUTHZ_SEED_TENANT_ID")
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                uuid::Uuid::parse_str(value.trim())
                    .map(TenantId::from_uuid)
                    .map_err(|error| {
                        AppError::Validation(format!("invalid AUTHZ_SEED_TENANT_ID: {error}"))
                    })
            })
            .transpose()?;

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            seed_tenant_id,
        })
    }
}
