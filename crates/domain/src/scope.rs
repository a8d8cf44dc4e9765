use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tenora_core::AppError;

/// How a role's scope assignment is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeType {
    /// Unrestricted; assignment lists are ignored.
    Global,
    /// Restricted to the assigned country codes.
    Country,
    /// Restricted to the assigned region codes.
    Region,
    /// Restricted to one tenant, enforced by request routing.
    Tenant,
}

impl ScopeType {
    /// Returns a stable storage value for this scope type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "GLOBAL",
            Self::Country => "COUNTRY",
            Self::Region => "REGION",
            Self::Tenant => "TENANT",
        }
    }
}

impl Display for ScopeType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ScopeType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "GLOBAL" => Ok(Self::Global),
            "COUNTRY" => Ok(Self::Country),
            "REGION" => Ok(Self::Region),
            "TENANT" => Ok(Self::Tenant),
            _ => Err(AppError::Validation(format!(
                "unknown scope type value '{value}'"
            ))),
        }
    }
}

/// Geographic assignment of a scoped platform actor.
///
/// Country ids are ISO-3166 alpha-2 codes. Both sets are empty by default,
/// which grants no scoped access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminScope {
    #[serde(default)]
    country_ids: BTreeSet<String>,
    #[serde(default)]
    region_ids: BTreeSet<String>,
}

impl AdminScope {
    /// Creates a scope from country and region assignments.
    #[must_use]
    pub fn new<C, R>(country_ids: C, region_ids: R) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            country_ids: country_ids.into_iter().map(Into::into).collect(),
            region_ids: region_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a scope holding only country assignments.
    #[must_use]
    pub fn countries<C>(country_ids: C) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self::new(country_ids, std::iter::empty::<String>())
    }

    /// Builds a scope from optional inputs; missing lists become empty sets.
    #[must_use]
    pub fn from_optional(country_ids: Option<Vec<String>>, region_ids: Option<Vec<String>>) -> Self {
        Self::new(
            country_ids.unwrap_or_default(),
            region_ids.unwrap_or_default(),
        )
    }

    /// Returns assigned ISO country codes.
    #[must_use]
    pub fn country_ids(&self) -> &BTreeSet<String> {
        &self.country_ids
    }

    /// Returns assigned region codes.
    #[must_use]
    pub fn region_ids(&self) -> &BTreeSet<String> {
        &self.region_ids
    }

    /// Returns whether the scope grants nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.country_ids.is_empty() && self.region_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{AdminScope, ScopeType};

    #[test]
    fn scope_type_roundtrip_storage_value() {
        for scope_type in [
            ScopeType::Global,
            ScopeType::Country,
            ScopeType::Region,
            ScopeType::Tenant,
        ] {
            assert!(matches!(ScopeType::from_str(scope_type.as_str()), Ok(value) if value == scope_type));
        }
    }

    #[test]
    fn missing_assignments_become_empty_sets() {
        let scope = AdminScope::from_optional(None, None);
        assert!(scope.is_empty());
        assert!(scope.country_ids().is_empty());
        assert!(scope.region_ids().is_empty());
    }

    #[test]
    fn deserializes_with_missing_lists() {
        let scope: AdminScope =
            serde_json::from_str(r#"{"countryIds":["IN"]}"#).unwrap_or_default();
        assert!(scope.country_ids().contains("IN"));
        assert!(scope.region_ids().is_empty());
    }
}
