//! Account records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database id of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl AccountId {
    /// Whether this id can refer to a stored account
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents an email account as listed in the account selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    /// Display name
    pub display_name: Option<String>,
    /// Email address
    pub email: String,
}

impl Account {
    pub fn new(id: AccountId, email: impl Into<String>) -> Self {
        Self {
            id,
            display_name: None,
            email: email.into(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Name shown in the title bar or dropdown: display name, else the address
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}
