use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tenora_core::AppError;

use crate::{Permission, ScopeType, TenantRoleId};

/// Closed set of platform operator roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlatformRole {
    /// Unrestricted platform owner.
    SuperAdmin,
    /// Platform administrator for a set of countries.
    PlatformAdmin,
    /// Operator responsible for a set of regions.
    RegionalManager,
    /// Operator responsible for a set of countries.
    CountryManager,
    /// Support agent for a set of countries.
    SupportTeam,
}

impl PlatformRole {
    /// Returns all platform roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PlatformRole] = &[
            PlatformRole::SuperAdmin,
            PlatformRole::PlatformAdmin,
            PlatformRole::RegionalManager,
            PlatformRole::CountryManager,
            PlatformRole::SupportTeam,
        ];

        ALL
    }

    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::PlatformAdmin => "PLATFORM_ADMIN",
            Self::RegionalManager => "REGIONAL_MANAGER",
            Self::CountryManager => "COUNTRY_MANAGER",
            Self::SupportTeam => "SUPPORT_TEAM",
        }
    }
}

impl Display for PlatformRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PlatformRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown platform role '{value}'")))
    }
}

/// Reference to a stored tenant role, carried on resolved permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRoleRef {
    /// Stored role identifier.
    pub role_id: TenantRoleId,
    /// Role name, unique within its tenant.
    pub name: String,
}

/// The role an actor acts under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Role {
    /// Static platform role from the registry.
    Platform(PlatformRole),
    /// Custom role stored for a tenant.
    Tenant(TenantRoleRef),
}

impl Role {
    /// Returns the identifier used by role allow-lists.
    ///
    /// Platform roles use their storage value, tenant roles their name.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Platform(role) => role.as_str(),
            Self::Tenant(reference) => reference.name.as_str(),
        }
    }

    /// Returns whether this is the super admin platform role.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Self::Platform(PlatformRole::SuperAdmin))
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.identifier())
    }
}

/// Source of a role's scope type and permission set.
///
/// Implemented by registry-backed platform roles and stored tenant roles so
/// resolution is shared between both.
pub trait RoleGrants {
    /// Returns the role these grants belong to.
    fn role(&self) -> Role;

    /// Returns how scope assignments are interpreted for this role.
    fn scope_type(&self) -> ScopeType;

    /// Returns the static permission set.
    fn permissions(&self) -> &BTreeSet<Permission>;
}
