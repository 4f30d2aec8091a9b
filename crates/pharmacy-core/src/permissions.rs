//! # Permission Flags
//!
//! Each user carries twelve booleans. Every flag gates exactly one group of
//! actions in the front end.
//!
//! ## Nesting
//! ```text
//! view_stock ──────────► edit_stock
//! view_orders ─────────► add_orders
//!              └───────► change_order_state
//! view_bills ──────────► invoice
//! ```
//! A child flag is only meaningful while its parent is granted. The storage
//! layer does not enforce this; [`UserPermissions::normalized`] does, and
//! callers apply it before saving.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewStock,
    EditStock,
    AddProducts,
    ViewNotifications,
    CreateClientList,
    ViewOrders,
    AddOrders,
    ChangeOrderState,
    ViewBills,
    Invoice,
    ViewSalaries,
    UserAdministration,
}

impl Permission {
    /// All flags, in the order the permission editor lists them.
    pub const ALL: [Permission; 12] = [
        Permission::ViewStock,
        Permission::EditStock,
        Permission::AddProducts,
        Permission::ViewNotifications,
        Permission::CreateClientList,
        Permission::ViewOrders,
        Permission::AddOrders,
        Permission::ChangeOrderState,
        Permission::ViewBills,
        Permission::Invoice,
        Permission::ViewSalaries,
        Permission::UserAdministration,
    ];

    /// Column name in the `user_permissions` table.
    pub const fn column(self) -> &'static str {
        match self {
            Permission::ViewStock => "view_stock",
            Permission::EditStock => "edit_stock",
            Permission::AddProducts => "add_products",
            Permission::ViewNotifications => "view_notifications",
            Permission::CreateClientList => "create_client_list",
            Permission::ViewOrders => "view_orders",
            Permission::AddOrders => "add_orders",
            Permission::ChangeOrderState => "change_order_state",
            Permission::ViewBills => "view_bills",
            Permission::Invoice => "invoice",
            Permission::ViewSalaries => "view_salaries",
            Permission::UserAdministration => "user_administration",
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Permission::ViewStock => "View stock",
            Permission::EditStock => "Edit stock",
            Permission::AddProducts => "Add/edit products",
            Permission::ViewNotifications => "View notifications",
            Permission::CreateClientList => "Create client list",
            Permission::ViewOrders => "View orders",
            Permission::AddOrders => "Register orders",
            Permission::ChangeOrderState => "Change order state",
            Permission::ViewBills => "View invoices",
            Permission::Invoice => "Issue invoices",
            Permission::ViewSalaries => "View seller salaries",
            Permission::UserAdministration => "User administration",
        }
    }

    /// The flag this one is nested under, if any.
    pub const fn parent(self) -> Option<Permission> {
        match self {
            Permission::EditStock => Some(Permission::ViewStock),
            Permission::AddOrders | Permission::ChangeOrderState => Some(Permission::ViewOrders),
            Permission::Invoice => Some(Permission::ViewBills),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Permission {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Permission::ALL
            .into_iter()
            .find(|p| p.column() == wanted)
            .ok_or_else(|| {
                ValidationError::invalid_format("permission", format!("unknown permission '{}'", s))
            })
    }
}

// =============================================================================
// UserPermissions
// =============================================================================

/// The full set of flags for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserPermissions {
    pub view_stock: bool,
    pub edit_stock: bool,
    pub add_products: bool,
    pub view_notifications: bool,
    pub create_client_list: bool,
    pub view_orders: bool,
    pub add_orders: bool,
    pub change_order_state: bool,
    pub view_bills: bool,
    pub invoice: bool,
    pub view_salaries: bool,
    pub user_administration: bool,
}

impl UserPermissions {
    /// Every flag granted. Used for the bootstrap administrator.
    pub fn all() -> Self {
        let mut perms = UserPermissions::default();
        for p in Permission::ALL {
            perms.set(p, true);
        }
        perms
    }

    /// Builds a set from flags ordered like [`Permission::ALL`].
    /// Missing trailing entries count as not granted.
    pub fn from_flags(flags: &[bool]) -> Self {
        let mut perms = UserPermissions::default();
        for (p, granted) in Permission::ALL.into_iter().zip(flags.iter().copied()) {
            perms.set(p, granted);
        }
        perms
    }

    pub fn get(&self, permission: Permission) -> bool {
        match permission {
            Permission::ViewStock => self.view_stock,
            Permission::EditStock => self.edit_stock,
            Permission::AddProducts => self.add_products,
            Permission::ViewNotifications => self.view_notifications,
            Permission::CreateClientList => self.create_client_list,
            Permission::ViewOrders => self.view_orders,
            Permission::AddOrders => self.add_orders,
            Permission::ChangeOrderState => self.change_order_state,
            Permission::ViewBills => self.view_bills,
            Permission::Invoice => self.invoice,
            Permission::ViewSalaries => self.view_salaries,
            Permission::UserAdministration => self.user_administration,
        }
    }

    pub fn set(&mut self, permission: Permission, granted: bool) {
        let slot = match permission {
            Permission::ViewStock => &mut self.view_stock,
            Permission::EditStock => &mut self.edit_stock,
            Permission::AddProducts => &mut self.add_products,
            Permission::ViewNotifications => &mut self.view_notifications,
            Permission::CreateClientList => &mut self.create_client_list,
            Permission::ViewOrders => &mut self.view_orders,
            Permission::AddOrders => &mut self.add_orders,
            Permission::ChangeOrderState => &mut self.change_order_state,
            Permission::ViewBills => &mut self.view_bills,
            Permission::Invoice => &mut self.invoice,
            Permission::ViewSalaries => &mut self.view_salaries,
            Permission::UserAdministration => &mut self.user_administration,
        };
        *slot = granted;
    }

    /// Flags currently granted, in display order.
    pub fn granted(&self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.get(*p))
            .collect()
    }

    /// Whether `permission` is effective: granted itself, and its parent too.
    pub fn allows(&self, permission: Permission) -> bool {
        self.get(permission) && permission.parent().map_or(true, |parent| self.get(parent))
    }

    /// Copy with every child flag cleared whose parent is not granted.
    pub fn normalized(mut self) -> Self {
        for p in Permission::ALL {
            if let Some(parent) = p.parent() {
                if !self.get(parent) {
                    self.set(p, false);
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_round_trip_through_from_str() {
        for p in Permission::ALL {
            assert_eq!(p.column().parse::<Permission>().unwrap(), p);
        }
        assert_eq!(
            "User-Administration".parse::<Permission>().unwrap(),
            Permission::UserAdministration
        );
        assert!("fly".parse::<Permission>().is_err());
    }

    #[test]
    fn test_set_and_get() {
        let mut perms = UserPermissions::default();
        assert!(perms.granted().is_empty());

        perms.set(Permission::Invoice, true);
        perms.set(Permission::ViewSalaries, true);
        assert!(perms.get(Permission::Invoice));
        assert_eq!(
            perms.granted(),
            vec![Permission::Invoice, Permission::ViewSalaries]
        );
    }

    #[test]
    fn test_from_flags_is_ordered_and_padded() {
        let perms = UserPermissions::from_flags(&[true, false, true]);
        assert!(perms.view_stock);
        assert!(!perms.edit_stock);
        assert!(perms.add_products);
        assert!(!perms.user_administration);
    }

    #[test]
    fn test_normalized_clears_orphaned_children() {
        let mut perms = UserPermissions::default();
        perms.set(Permission::EditStock, true);
        perms.set(Permission::AddOrders, true);
        perms.set(Permission::ChangeOrderState, true);
        perms.set(Permission::ViewBills, true);
        perms.set(Permission::Invoice, true);

        let normalized = perms.normalized();
        assert!(!normalized.edit_stock);
        assert!(!normalized.add_orders);
        assert!(!normalized.change_order_state);
        assert!(normalized.view_bills);
        assert!(normalized.invoice);
    }

    #[test]
    fn test_allows_requires_parent() {
        let mut perms = UserPermissions::default();
        perms.set(Permission::EditStock, true);
        assert!(!perms.allows(Permission::EditStock));

        perms.set(Permission::ViewStock, true);
        assert!(perms.allows(Permission::EditStock));
    }

    #[test]
    fn test_all_grants_everything() {
        let perms = UserPermissions::all();
        assert_eq!(perms.granted().len(), Permission::ALL.len());
        assert_eq!(perms, perms.normalized());
    }
}
