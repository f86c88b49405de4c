//! Data store lookups needed before a refresh can be decided

use crate::{AccountId, CoreResult, MailboxId};
use async_trait::async_trait;

/// Read-only queries against the local mail store.
///
/// Implementations may block on IO, so callers run them off the UI thread.
#[async_trait]
pub trait MailStore: Send + Sync {
    /// Id of the account's inbox.
    ///
    /// Fails with `LookupFailure` when the account has no inbox yet.
    async fn resolve_inbox_id(&self, account_id: AccountId) -> CoreResult<MailboxId>;

    /// Whether the mailbox is backed by a real server-side folder.
    ///
    /// Virtual mailboxes, drafts and outbox are never refreshable.
    async fn is_mailbox_refreshable(&self, mailbox_id: MailboxId) -> CoreResult<bool>;
}
