//! Account selector shown in the title area

use duomail_core::{Account, AccountId};

/// How the title area presents the account list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountSelector {
    /// No account is set up; the host should start account setup
    NoAccounts,
    /// A single account: show its name as a plain title
    Single { account_id: AccountId, title: String },
    /// Several accounts: show a dropdown with the selected one preselected
    Dropdown {
        entries: Vec<(AccountId, String)>,
        default_position: usize,
    },
}

impl AccountSelector {
    /// Build the selector state for `accounts`, in display order
    pub fn from_accounts(accounts: &[Account], selected: Option<AccountId>) -> Self {
        match accounts {
            [] => AccountSelector::NoAccounts,
            [only] => AccountSelector::Single {
                account_id: only.id,
                title: only.label().to_string(),
            },
            _ => AccountSelector::Dropdown {
                entries: accounts
                    .iter()
                    .map(|a| (a.id, a.label().to_string()))
                    .collect(),
                default_position: selected
                    .and_then(|id| position_of(accounts, id))
                    .unwrap_or(0),
            },
        }
    }

    /// Account behind a dropdown position
    pub fn account_at(&self, position: usize) -> Option<AccountId> {
        match self {
            AccountSelector::NoAccounts => None,
            AccountSelector::Single { account_id, .. } => (position == 0).then_some(*account_id),
            AccountSelector::Dropdown { entries, .. } => entries.get(position).map(|(id, _)| *id),
        }
    }
}

/// Position of `account_id` in `accounts`
pub fn position_of(accounts: &[Account], account_id: AccountId) -> Option<usize> {
    accounts.iter().position(|a| a.id == account_id)
}
