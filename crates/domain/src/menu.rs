use serde::{Deserialize, Serialize};

use crate::{Permission, ResolvedPermissions};

/// Declarative navigation entry gated by resolved permissions.
///
/// Absent constraints impose no restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Stable entry identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Navigation target.
    #[serde(default)]
    pub url: String,
    /// Icon name.
    #[serde(default)]
    pub icon: Option<String>,
    /// Single required permission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    /// Permissions of which at least one is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
    /// Restricts the entry to the super admin.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub super_admin_only: bool,
    /// Role identifiers allowed to see the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Nested entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    /// Creates an unrestricted entry.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            icon: None,
            permission: None,
            permissions: None,
            super_admin_only: false,
            roles: None,
            children: Vec::new(),
        }
    }

    /// Returns whether every present constraint on this entry passes.
    #[must_use]
    pub fn is_visible_to(&self, resolved: &ResolvedPermissions) -> bool {
        if self.super_admin_only && !resolved.is_super_admin() {
            return false;
        }

        if let Some(roles) = &self.roles
            && !roles
                .iter()
                .any(|role| role.as_str() == resolved.role().identifier())
        {
            return false;
        }

        if let Some(permission) = self.permission
            && !resolved.has_permission(permission)
        {
            return false;
        }

        if let Some(permissions) = &self.permissions
            && !resolved.has_any_permission(permissions)
        {
            return false;
        }

        true
    }
}

/// Filters a menu tree down to the entries visible to the actor.
///
/// Children are filtered recursively; a group entry whose children are all
/// filtered out is dropped as well.
#[must_use]
pub fn filter_menu_items(items: &[MenuItem], resolved: &ResolvedPermissions) -> Vec<MenuItem> {
    items
        .iter()
        .filter(|item| item.is_visible_to(resolved))
        .filter_map(|item| {
            if item.children.is_empty() {
                return Some(item.clone());
            }

            let children = filter_menu_items(&item.children, resolved);
            if children.is_empty() {
                return None;
            }

            Some(MenuItem {
                children,
                ..item.clone()
            })
        })
        .collect()
}
