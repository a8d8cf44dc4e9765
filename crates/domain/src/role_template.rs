use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tenora_core::AppError;

use crate::Permission;

/// Keys of the fixed tenant role templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleTemplateKey {
    /// Full tenant control.
    Owner,
    /// Full control except billing.
    Admin,
    /// Day-to-day operations lead.
    Manager,
    /// Front-line staff member.
    Staff,
    /// Read-only access.
    Viewer,
    /// Empty starting point for explicit selection.
    Custom,
}

impl RoleTemplateKey {
    /// Returns all template keys.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RoleTemplateKey] = &[
            RoleTemplateKey::Owner,
            RoleTemplateKey::Admin,
            RoleTemplateKey::Manager,
            RoleTemplateKey::Staff,
            RoleTemplateKey::Viewer,
            RoleTemplateKey::Custom,
        ];

        ALL
    }

    /// Returns a stable storage value for this key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Staff => "STAFF",
            Self::Viewer => "VIEWER",
            Self::Custom => "CUSTOM",
        }
    }
}

impl Display for RoleTemplateKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RoleTemplateKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown role template '{value}'")))
    }
}

/// Read-only seed used to pre-populate a new tenant role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTemplate {
    key: RoleTemplateKey,
    display_name: &'static str,
    description: &'static str,
    highlights: &'static [&'static str],
    permissions: BTreeSet<Permission>,
}

impl RoleTemplate {
    /// Creates a template from its parts.
    #[must_use]
    pub fn new(
        key: RoleTemplateKey,
        display_name: &'static str,
        description: &'static str,
        highlights: &'static [&'static str],
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            key,
            display_name,
            description,
            highlights,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Returns the template key.
    #[must_use]
    pub fn key(&self) -> RoleTemplateKey {
        self.key
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        self.display_name
    }

    /// Returns the description shown in the role picker.
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Returns short capability labels.
    #[must_use]
    pub fn highlights(&self) -> &'static [&'static str] {
        self.highlights
    }

    /// Returns the seed permission set.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }
}

const MANAGER_PERMISSIONS: &[Permission] = &[
    Permission::BookingsView,
    Permission::BookingsCreate,
    Permission::BookingsEdit,
    Permission::BookingsDelete,
    Permission::CustomersView,
    Permission::CustomersCreate,
    Permission::CustomersEdit,
    Permission::ServicesView,
    Permission::ServicesManage,
    Permission::StaffView,
    Permission::PaymentsView,
    Permission::ReportsView,
    Permission::SettingsView,
];

const STAFF_PERMISSIONS: &[Permission] = &[
    Permission::BookingsView,
    Permission::BookingsCreate,
    Permission::BookingsEdit,
    Permission::BookingsDelete,
    Permission::CustomersView,
    Permission::CustomersCreate,
    Permission::ServicesView,
];

const VIEWER_PERMISSIONS: &[Permission] = &[
    Permission::BookingsView,
    Permission::CustomersView,
    Permission::ServicesView,
    Permission::StaffView,
    Permission::ReportsView,
];

/// Returns the standard tenant role templates.
#[must_use]
pub fn standard_role_templates() -> Vec<RoleTemplate> {
    vec![
        RoleTemplate::new(
            RoleTemplateKey::Owner,
            "Owner",
            "Full control of the business, including billing and roles.",
            &["Everything", "Billing", "Role management"],
            Permission::tenant_assignable(),
        ),
        RoleTemplate::new(
            RoleTemplateKey::Admin,
            "Admin",
            "Runs the business day to day without access to billing.",
            &["Staff & roles", "Settings", "Refunds"],
            Permission::tenant_assignable()
                .filter(|permission| *permission != Permission::BillingManage),
        ),
        RoleTemplate::new(
            RoleTemplateKey::Manager,
            "Manager",
            "Manages bookings, customers and the service catalog.",
            &["Bookings", "Services", "Reports"],
            MANAGER_PERMISSIONS.iter().copied(),
        ),
        RoleTemplate::new(
            RoleTemplateKey::Staff,
            "Staff",
            "Handles bookings and customers at the front desk.",
            &["Bookings", "Customers"],
            STAFF_PERMISSIONS.iter().copied(),
        ),
        RoleTemplate::new(
            RoleTemplateKey::Viewer,
            "Viewer",
            "Read-only access to bookings, customers and reports.",
            &["Read only"],
            VIEWER_PERMISSIONS.iter().copied(),
        ),
        RoleTemplate::new(
            RoleTemplateKey::Custom,
            "Custom",
            "Start from scratch and pick permissions one by one.",
            &[],
            std::iter::empty(),
        ),
    ]
}
