//! # Session and Menu Gating
//!
//! After a successful login the front end holds a [`Session`]. Every main
//! menu entry is tied to one permission flag; entries whose flag is missing
//! are shown disabled and refuse to run.
//!
//! ```text
//! login(username, password)
//!      │
//!      ▼
//! Session { user }
//!      │
//!      ├── menu()            → [(MenuAction, enabled)]
//!      └── require(flag)?    → Ok(()) | PermissionDenied
//! ```

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::permissions::Permission;
use crate::types::User;

/// Entries of the main menu, grouped by section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAction {
    // Storage
    ViewStock,
    ReceiveStock,
    // Products
    ViewProducts,
    AddProduct,
    EditCategories,
    EditCompanies,
    // Administration
    UserAdministration,
    ViewSalaries,
    // Header bar
    Notifications,
    // Clients
    ViewClients,
    // Orders
    AddOrder,
    ViewPendingOrders,
    ViewReadyOrders,
    ViewAllOrders,
    ChangeOrderState,
    // Bills
    SearchBill,
    ViewUnpaidBills,
    IssueInvoice,
}

impl MenuAction {
    pub const ALL: [MenuAction; 18] = [
        MenuAction::ViewStock,
        MenuAction::ReceiveStock,
        MenuAction::ViewProducts,
        MenuAction::AddProduct,
        MenuAction::EditCategories,
        MenuAction::EditCompanies,
        MenuAction::UserAdministration,
        MenuAction::ViewSalaries,
        MenuAction::Notifications,
        MenuAction::ViewClients,
        MenuAction::AddOrder,
        MenuAction::ViewPendingOrders,
        MenuAction::ViewReadyOrders,
        MenuAction::ViewAllOrders,
        MenuAction::ChangeOrderState,
        MenuAction::SearchBill,
        MenuAction::ViewUnpaidBills,
        MenuAction::IssueInvoice,
    ];

    /// The flag gating this entry.
    pub const fn required_permission(self) -> Permission {
        match self {
            MenuAction::ViewStock | MenuAction::ViewProducts => Permission::ViewStock,
            MenuAction::ReceiveStock => Permission::EditStock,
            MenuAction::AddProduct | MenuAction::EditCategories | MenuAction::EditCompanies => {
                Permission::AddProducts
            }
            MenuAction::UserAdministration => Permission::UserAdministration,
            MenuAction::ViewSalaries => Permission::ViewSalaries,
            MenuAction::Notifications => Permission::ViewNotifications,
            MenuAction::ViewClients => Permission::CreateClientList,
            MenuAction::AddOrder => Permission::AddOrders,
            MenuAction::ViewPendingOrders
            | MenuAction::ViewReadyOrders
            | MenuAction::ViewAllOrders => Permission::ViewOrders,
            MenuAction::ChangeOrderState => Permission::ChangeOrderState,
            MenuAction::SearchBill | MenuAction::ViewUnpaidBills => Permission::ViewBills,
            MenuAction::IssueInvoice => Permission::Invoice,
        }
    }

    pub const fn section(self) -> &'static str {
        match self {
            MenuAction::ViewStock | MenuAction::ReceiveStock => "Storage",
            MenuAction::ViewProducts
            | MenuAction::AddProduct
            | MenuAction::EditCategories
            | MenuAction::EditCompanies => "Products",
            MenuAction::UserAdministration | MenuAction::ViewSalaries => "Administration",
            MenuAction::Notifications => "Notifications",
            MenuAction::ViewClients => "Clients",
            MenuAction::AddOrder
            | MenuAction::ViewPendingOrders
            | MenuAction::ViewReadyOrders
            | MenuAction::ViewAllOrders
            | MenuAction::ChangeOrderState => "Orders",
            MenuAction::SearchBill | MenuAction::ViewUnpaidBills | MenuAction::IssueInvoice => {
                "Bills"
            }
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MenuAction::ViewStock => "View stock",
            MenuAction::ReceiveStock => "Add new receipt",
            MenuAction::ViewProducts => "View products",
            MenuAction::AddProduct => "Add new product",
            MenuAction::EditCategories => "Edit categories",
            MenuAction::EditCompanies => "Edit companies",
            MenuAction::UserAdministration => "User administration",
            MenuAction::ViewSalaries => "View seller salaries",
            MenuAction::Notifications => "Notifications",
            MenuAction::ViewClients => "View client list",
            MenuAction::AddOrder => "Add new order",
            MenuAction::ViewPendingOrders => "View pending orders",
            MenuAction::ViewReadyOrders => "View ready orders",
            MenuAction::ViewAllOrders => "View all orders",
            MenuAction::ChangeOrderState => "Change order state",
            MenuAction::SearchBill => "Search invoice",
            MenuAction::ViewUnpaidBills => "View unpaid invoices",
            MenuAction::IssueInvoice => "Issue invoice",
        }
    }
}

/// The authenticated user for the lifetime of one front-end invocation.
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Session { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Whether the user effectively holds `permission` (nesting respected).
    pub fn can(&self, permission: Permission) -> bool {
        self.user.permissions.allows(permission)
    }

    pub fn require(&self, permission: Permission) -> CoreResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied { permission })
        }
    }

    pub fn require_action(&self, action: MenuAction) -> CoreResult<()> {
        self.require(action.required_permission())
    }

    /// Every menu entry with its enabled state.
    pub fn menu(&self) -> Vec<(MenuAction, bool)> {
        MenuAction::ALL
            .into_iter()
            .map(|a| (a, self.can(a.required_permission())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::UserPermissions;

    fn session_with(perms: UserPermissions) -> Session {
        Session::new(User {
            id: 7,
            username: "maria".to_string(),
            password_hash: String::new(),
            full_name: "Maria P.".to_string(),
            permissions: perms,
        })
    }

    #[test]
    fn test_no_permissions_disables_everything() {
        let session = session_with(UserPermissions::default());
        assert!(session.menu().iter().all(|(_, enabled)| !enabled));
        assert!(matches!(
            session.require_action(MenuAction::ViewStock),
            Err(CoreError::PermissionDenied {
                permission: Permission::ViewStock
            })
        ));
    }

    #[test]
    fn test_menu_follows_flags() {
        let mut perms = UserPermissions::default();
        perms.set(Permission::ViewStock, true);
        perms.set(Permission::UserAdministration, true);
        let session = session_with(perms);

        let enabled: Vec<MenuAction> = session
            .menu()
            .into_iter()
            .filter(|(_, on)| *on)
            .map(|(a, _)| a)
            .collect();
        assert_eq!(
            enabled,
            vec![
                MenuAction::ViewStock,
                MenuAction::ViewProducts,
                MenuAction::UserAdministration
            ]
        );
    }

    #[test]
    fn test_child_flag_without_parent_is_not_effective() {
        let mut perms = UserPermissions::default();
        perms.set(Permission::EditStock, true);
        let session = session_with(perms);

        assert!(!session.can(Permission::EditStock));
        assert!(session.require_action(MenuAction::ReceiveStock).is_err());
    }

    #[test]
    fn test_every_action_has_a_section_and_label() {
        for action in MenuAction::ALL {
            assert!(!action.section().is_empty());
            assert!(!action.label().is_empty());
        }
    }
}
