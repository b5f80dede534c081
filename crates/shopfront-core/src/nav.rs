//! # Navigation Menu
//!
//! Role-based menu shown by the admin shell.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Who is looking at the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// One menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Highlight only on an exact path match.
    #[serde(default)]
    pub exact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

impl NavItem {
    fn link(label: &str, to: &str, icon: &str) -> Self {
        NavItem {
            label: label.to_string(),
            to: Some(to.to_string()),
            exact: false,
            icon: Some(icon.to_string()),
            children: Vec::new(),
        }
    }
}

/// Menu entries for `role`. Shoppers get an empty menu.
pub fn nav_menu(role: Role) -> Vec<NavItem> {
    match role {
        Role::User => Vec::new(),
        Role::Admin => vec![
            NavItem {
                exact: true,
                ..NavItem::link("Dashboard", "/admin/dashboard", "mdi:view-dashboard-outline")
            },
            NavItem::link("Products", "/admin/product", "mdi:package-variant"),
            NavItem::link("Users", "/admin/users", "mdi:account-multiple-outline"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_menu() {
        let items = nav_menu(Role::Admin);
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Dashboard", "Products", "Users"]);
        assert!(items[0].exact);
        assert!(!items[1].exact);
        assert_eq!(items[2].to.as_deref(), Some("/admin/users"));
    }

    #[test]
    fn test_user_menu_is_empty() {
        assert!(nav_menu(Role::User).is_empty());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("guest".parse::<Role>().is_err());
    }
}
