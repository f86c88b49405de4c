//! Mailbox ids and kinds

use crate::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database id of a mailbox.
///
/// Ids -2 to -6 name virtual mailboxes that combine messages across accounts.
/// They have no server-side folder behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MailboxId(pub i64);

impl MailboxId {
    /// Combined inbox of all accounts
    pub const ALL_INBOXES: MailboxId = MailboxId(-2);
    /// Unread messages of all accounts
    pub const ALL_UNREAD: MailboxId = MailboxId(-3);
    /// Starred messages of all accounts
    pub const ALL_STARRED: MailboxId = MailboxId(-4);
    /// Drafts of all accounts
    pub const ALL_DRAFTS: MailboxId = MailboxId(-5);
    /// Outboxes of all accounts
    pub const ALL_OUTBOX: MailboxId = MailboxId(-6);

    pub fn is_virtual(self) -> bool {
        (MailboxId::ALL_OUTBOX.0..=MailboxId::ALL_INBOXES.0).contains(&self.0)
    }

    /// Whether this id can refer to a stored mailbox
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MailboxId::ALL_INBOXES => write!(f, "all-inboxes"),
            MailboxId::ALL_UNREAD => write!(f, "all-unread"),
            MailboxId::ALL_STARRED => write!(f, "all-starred"),
            MailboxId::ALL_DRAFTS => write!(f, "all-drafts"),
            MailboxId::ALL_OUTBOX => write!(f, "all-outbox"),
            MailboxId(id) => write!(f, "{}", id),
        }
    }
}

/// Database id of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type of mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailboxKind {
    /// Inbox folder
    Inbox,
    /// Regular user folder holding mail
    Mail,
    /// Folder that only holds other folders
    Parent,
    /// Local drafts
    Drafts,
    /// Messages waiting to be sent
    Outbox,
    /// Sent messages
    Sent,
    /// Trash/deleted messages
    Trash,
    /// Spam/junk
    Junk,
}

impl MailboxKind {
    /// Drafts and outbox only exist locally, so a server refresh has nothing to fetch
    pub fn is_refreshable(self) -> bool {
        !matches!(self, MailboxKind::Drafts | MailboxKind::Outbox)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MailboxKind::Inbox => "inbox",
            MailboxKind::Mail => "mail",
            MailboxKind::Parent => "parent",
            MailboxKind::Drafts => "drafts",
            MailboxKind::Outbox => "outbox",
            MailboxKind::Sent => "sent",
            MailboxKind::Trash => "trash",
            MailboxKind::Junk => "junk",
        }
    }

    /// Parse the stored column value. Unknown values fall back to `Mail`.
    pub fn from_db(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "inbox" => MailboxKind::Inbox,
            "parent" => MailboxKind::Parent,
            "drafts" => MailboxKind::Drafts,
            "outbox" => MailboxKind::Outbox,
            "sent" => MailboxKind::Sent,
            "trash" => MailboxKind::Trash,
            "junk" | "spam" => MailboxKind::Junk,
            _ => MailboxKind::Mail,
        }
    }
}

/// A mailbox belonging to an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub id: MailboxId,
    pub account_id: AccountId,
    pub display_name: String,
    pub kind: MailboxKind,
}
