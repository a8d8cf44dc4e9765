use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tenora_core::{AppError, AppResult};

/// Audience a permission is meaningful for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionScope {
    /// Only granted to platform operators through the static role matrix.
    Platform,
    /// Assignable to tenant roles.
    Tenant,
}

/// Every permission identifier used platform-wide and tenant-wide.
///
/// The variant list is the permission catalog: a permission string is valid
/// exactly when it parses into one of these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Allows opening the operator dashboard.
    ViewDashboard,
    /// Allows listing and inspecting tenants.
    ViewTenants,
    /// Allows editing tenant profiles and plans.
    ManageTenants,
    /// Allows suspending and reactivating tenants.
    SuspendTenants,
    /// Allows permanently deleting tenants.
    DeleteTenants,
    /// Allows reading platform analytics.
    ViewAnalytics,
    /// Allows reading platform revenue figures.
    ViewRevenue,
    /// Allows managing tenant subscriptions.
    ManageSubscriptions,
    /// Allows reading support tickets.
    ViewSupportTickets,
    /// Allows answering and closing support tickets.
    ManageSupportTickets,
    /// Allows reading platform audit logs.
    ViewAuditLogs,
    /// Allows exporting platform-wide data.
    ExportPlatformData,
    /// Allows editing region definitions.
    ManageRegions,
    /// Allows creating and removing platform operators.
    ManagePlatformAdmins,
    /// Allows changing global system settings.
    ManageSystemSettings,
    /// Allows toggling feature flags.
    ManageFeatureFlags,
    /// Allows acting as a tenant user.
    ImpersonateTenant,
    /// Allows reading bookings.
    BookingsView,
    /// Allows creating bookings.
    BookingsCreate,
    /// Allows editing bookings.
    BookingsEdit,
    /// Allows deleting bookings.
    BookingsDelete,
    /// Allows reading customers.
    CustomersView,
    /// Allows creating customers.
    CustomersCreate,
    /// Allows editing customers.
    CustomersEdit,
    /// Allows deleting customers.
    CustomersDelete,
    /// Allows reading the service catalog.
    ServicesView,
    /// Allows editing the service catalog.
    ServicesManage,
    /// Allows reading staff records.
    StaffView,
    /// Allows adding, editing and removing staff.
    StaffManage,
    /// Allows managing tenant roles and staff role assignments.
    RolesManage,
    /// Allows reading payments.
    PaymentsView,
    /// Allows issuing refunds.
    PaymentsRefund,
    /// Allows reading tenant reports.
    ReportsView,
    /// Allows reading tenant settings.
    SettingsView,
    /// Allows editing tenant settings.
    SettingsManage,
    /// Allows managing the tenant's own billing.
    BillingManage,
    /// Allows configuring customer notifications.
    NotificationsManage,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewDashboard => "VIEW_DASHBOARD",
            Self::ViewTenants => "VIEW_TENANTS",
            Self::ManageTenants => "MANAGE_TENANTS",
            Self::SuspendTenants => "SUSPEND_TENANTS",
            Self::DeleteTenants => "DELETE_TENANTS",
            Self::ViewAnalytics => "VIEW_ANALYTICS",
            Self::ViewRevenue => "VIEW_REVENUE",
            Self::ManageSubscriptions => "MANAGE_SUBSCRIPTIONS",
            Self::ViewSupportTickets => "VIEW_SUPPORT_TICKETS",
            Self::ManageSupportTickets => "MANAGE_SUPPORT_TICKETS",
            Self::ViewAuditLogs => "VIEW_AUDIT_LOGS",
            Self::ExportPlatformData => "EXPORT_PLATFORM_DATA",
            Self::ManageRegions => "MANAGE_REGIONS",
            Self::ManagePlatformAdmins => "MANAGE_PLATFORM_ADMINS",
            Self::ManageSystemSettings => "MANAGE_SYSTEM_SETTINGS",
            Self::ManageFeatureFlags => "MANAGE_FEATURE_FLAGS",
            Self::ImpersonateTenant => "IMPERSONATE_TENANT",
            Self::BookingsView => "BOOKINGS_VIEW",
            Self::BookingsCreate => "BOOKINGS_CREATE",
            Self::BookingsEdit => "BOOKINGS_EDIT",
            Self::BookingsDelete => "BOOKINGS_DELETE",
            Self::CustomersView => "CUSTOMERS_VIEW",
            Self::CustomersCreate => "CUSTOMERS_CREATE",
            Self::CustomersEdit => "CUSTOMERS_EDIT",
            Self::CustomersDelete => "CUSTOMERS_DELETE",
            Self::ServicesView => "SERVICES_VIEW",
            Self::ServicesManage => "SERVICES_MANAGE",
            Self::StaffView => "STAFF_VIEW",
            Self::StaffManage => "STAFF_MANAGE",
            Self::RolesManage => "ROLES_MANAGE",
            Self::PaymentsView => "PAYMENTS_VIEW",
            Self::PaymentsRefund => "PAYMENTS_REFUND",
            Self::ReportsView => "REPORTS_VIEW",
            Self::SettingsView => "SETTINGS_VIEW",
            Self::SettingsManage => "SETTINGS_MANAGE",
            Self::BillingManage => "BILLING_MANAGE",
            Self::NotificationsManage => "NOTIFICATIONS_MANAGE",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ViewDashboard,
            Permission::ViewTenants,
            Permission::ManageTenants,
            Permission::SuspendTenants,
            Permission::DeleteTenants,
            Permission::ViewAnalytics,
            Permission::ViewRevenue,
            Permission::ManageSubscriptions,
            Permission::ViewSupportTickets,
            Permission::ManageSupportTickets,
            Permission::ViewAuditLogs,
            Permission::ExportPlatformData,
            Permission::ManageRegions,
            Permission::ManagePlatformAdmins,
            Permission::ManageSystemSettings,
            Permission::ManageFeatureFlags,
            Permission::ImpersonateTenant,
            Permission::BookingsView,
            Permission::BookingsCreate,
            Permission::BookingsEdit,
            Permission::BookingsDelete,
            Permission::CustomersView,
            Permission::CustomersCreate,
            Permission::CustomersEdit,
            Permission::CustomersDelete,
            Permission::ServicesView,
            Permission::ServicesManage,
            Permission::StaffView,
            Permission::StaffManage,
            Permission::RolesManage,
            Permission::PaymentsView,
            Permission::PaymentsRefund,
            Permission::ReportsView,
            Permission::SettingsView,
            Permission::SettingsManage,
            Permission::BillingManage,
            Permission::NotificationsManage,
        ];

        ALL
    }

    /// Returns the audience this permission is meaningful for.
    #[must_use]
    pub fn scope(&self) -> PermissionScope {
        match self {
            Self::ViewDashboard
            | Self::ViewTenants
            | Self::ManageTenants
            | Self::SuspendTenants
            | Self::DeleteTenants
            | Self::ViewAnalytics
            | Self::ViewRevenue
            | Self::ManageSubscriptions
            | Self::ViewSupportTickets
            | Self::ManageSupportTickets
            | Self::ViewAuditLogs
            | Self::ExportPlatformData
            | Self::ManageRegions
            | Self::ManagePlatformAdmins
            | Self::ManageSystemSettings
            | Self::ManageFeatureFlags
            | Self::ImpersonateTenant => PermissionScope::Platform,
            _ => PermissionScope::Tenant,
        }
    }

    /// Returns every permission a tenant role may hold.
    pub fn tenant_assignable() -> impl Iterator<Item = Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|permission| permission.scope() == PermissionScope::Tenant)
    }

    /// Parses a list of transport values, reporting every unknown value at once.
    pub fn parse_list<I, S>(values: I) -> AppResult<BTreeSet<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut permissions = BTreeSet::new();
        let mut unknown = Vec::new();

        for value in values {
            match Self::from_str(value.as_ref()) {
                Ok(permission) => {
                    permissions.insert(permission);
                }
                Err(_) => unknown.push(format!("'{}'", value.as_ref())),
            }
        }

        if !unknown.is_empty() {
            return Err(AppError::Validation(format!(
                "unknown permission values: {}",
                unknown.join(", ")
            )));
        }

        Ok(permissions)
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

/// Returns whether the value names a permission in the catalog.
#[must_use]
pub fn is_valid_permission(value: &str) -> bool {
    Permission::from_str(value).is_ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use super::{Permission, PermissionScope, is_valid_permission};

    #[test]
    fn permission_roundtrip_storage_value() {
        for permission in Permission::all() {
            let restored = Permission::from_str(permission.as_str());
            assert!(matches!(restored, Ok(value) if value == *permission));
        }
    }

    #[test]
    fn storage_values_are_unique() {
        let values: HashSet<&str> = Permission::all().iter().map(Permission::as_str).collect();
        assert_eq!(values.len(), Permission::all().len());
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!(!is_valid_permission("BOOKINGS_ARCHIVE"));
        assert!(!is_valid_permission("bookings_delete"));
        assert!(is_valid_permission("BOOKINGS_DELETE"));
    }

    #[test]
    fn parse_list_reports_every_unknown_value() {
        let parsed = Permission::parse_list(["BOOKINGS_VIEW", "NOPE", "ALSO_NOPE"]);
        let Err(error) = parsed else {
            panic!("expected validation error");
        };
        let message = error.to_string();
        assert!(message.contains("'NOPE'"));
        assert!(message.contains("'ALSO_NOPE'"));
    }

    #[test]
    fn parse_list_deduplicates() {
        let parsed = Permission::parse_list(["BOOKINGS_VIEW", "BOOKINGS_VIEW"]).unwrap_or_default();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn serde_uses_storage_values() {
        let encoded = serde_json::to_string(&Permission::BookingsDelete).unwrap_or_default();
        assert_eq!(encoded, "\"BOOKINGS_DELETE\"");
    }

    #[test]
    fn tenant_assignable_excludes_platform_permissions() {
        assert!(Permission::tenant_assignable().all(|p| p.scope() == PermissionScope::Tenant));
        assert!(Permission::tenant_assignable().any(|p| p == Permission::RolesManage));
        assert!(!Permission::tenant_assignable().any(|p| p == Permission::ImpersonateTenant));
    }
}
