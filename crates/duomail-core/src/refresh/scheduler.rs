//! Refresh eligibility for a user-initiated refresh
//!
//! Pressing refresh can trigger up to three refreshes:
//! 1. The current mailbox, if it is backed by a real server folder.
//! 2. The account's mailbox list, if it hasn't been refreshed in the last
//!    [`MAILBOX_REFRESH_MIN_INTERVAL`].
//! 3. The account's inbox, if it is not the current mailbox and hasn't been
//!    refreshed in the last [`INBOX_AUTO_REFRESH_MIN_INTERVAL`].
//!
//! Everything here is a pure function of its inputs; the lookups it needs live
//! in [`super::task`].

use crate::{AccountId, MailboxId};
use serde::{Deserialize, Serialize};

/// Minimum time between two mailbox list refreshes of one account, in milliseconds
pub const MAILBOX_REFRESH_MIN_INTERVAL: i64 = 30 * 1000;

/// Minimum time between two automatic inbox refreshes, in milliseconds
pub const INBOX_AUTO_REFRESH_MIN_INTERVAL: i64 = 10 * 1000;

/// Read access to refresh bookkeeping owned by the refresh manager
pub trait RefreshStatus {
    fn is_mailbox_list_refreshing(&self, account_id: AccountId) -> bool;
    /// Last time the account's mailbox list finished refreshing, `0` if never
    fn last_mailbox_list_refresh_time(&self, account_id: AccountId) -> i64;
    fn is_message_list_refreshing(&self, mailbox_id: MailboxId) -> bool;
    /// Last time the mailbox's message list finished refreshing, `0` if never
    fn last_message_list_refresh_time(&self, mailbox_id: MailboxId) -> i64;
}

/// A single refresh button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest {
    pub account_id: Option<AccountId>,
    pub mailbox_id: MailboxId,
    pub current_time_millis: i64,
}

impl RefreshRequest {
    pub fn new(account_id: Option<AccountId>, mailbox_id: MailboxId, now: i64) -> Self {
        Self {
            account_id,
            mailbox_id,
            current_time_millis: now,
        }
    }
}

/// Which refreshes a request should trigger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshDecision {
    pub refresh_current_mailbox: bool,
    pub refresh_mailbox_list: bool,
    pub refresh_inbox: bool,
}

impl RefreshDecision {
    pub fn is_empty(&self) -> bool {
        !(self.refresh_current_mailbox || self.refresh_mailbox_list || self.refresh_inbox)
    }
}

/// Eligibility intervals, configurable for tests and settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshIntervals {
    pub mailbox_list_min_interval_ms: i64,
    pub inbox_auto_refresh_min_interval_ms: i64,
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            mailbox_list_min_interval_ms: MAILBOX_REFRESH_MIN_INTERVAL,
            inbox_auto_refresh_min_interval_ms: INBOX_AUTO_REFRESH_MIN_INTERVAL,
        }
    }
}

/// Decides which refreshes fire
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshScheduler {
    intervals: RefreshIntervals,
}

impl RefreshScheduler {
    pub fn new(intervals: RefreshIntervals) -> Self {
        Self { intervals }
    }

    pub fn intervals(&self) -> RefreshIntervals {
        self.intervals
    }

    /// Compute the decision for `request`.
    ///
    /// `mailbox_refreshable` is `None` when the lookup failed, in which case no
    /// decision is produced. `inbox_id` is `None` when no account is selected.
    pub fn decide<S: RefreshStatus + ?Sized>(
        &self,
        request: &RefreshRequest,
        state: &S,
        mailbox_refreshable: Option<bool>,
        inbox_id: Option<MailboxId>,
    ) -> Option<RefreshDecision> {
        let refresh_current_mailbox = mailbox_refreshable?;

        let refresh_mailbox_list = request
            .account_id
            .is_some_and(|account_id| self.should_refresh_mailbox_list(request, state, account_id));

        let refresh_inbox = inbox_id
            .is_some_and(|inbox_id| self.should_auto_refresh_inbox(request, state, inbox_id));

        Some(RefreshDecision {
            refresh_current_mailbox,
            refresh_mailbox_list,
            refresh_inbox,
        })
    }

    fn should_refresh_mailbox_list<S: RefreshStatus + ?Sized>(
        &self,
        request: &RefreshRequest,
        state: &S,
        account_id: AccountId,
    ) -> bool {
        if state.is_mailbox_list_refreshing(account_id) {
            return false;
        }
        let next_refresh_time = state
            .last_mailbox_list_refresh_time(account_id)
            .saturating_add(self.intervals.mailbox_list_min_interval_ms);
        next_refresh_time <= request.current_time_millis
    }

    fn should_auto_refresh_inbox<S: RefreshStatus + ?Sized>(
        &self,
        request: &RefreshRequest,
        state: &S,
        inbox_id: MailboxId,
    ) -> bool {
        // Already covered by the current mailbox refresh
        if inbox_id == request.mailbox_id {
            return false;
        }
        if state.is_message_list_refreshing(inbox_id) {
            return false;
        }
        let next_refresh_time = state
            .last_message_list_refresh_time(inbox_id)
            .saturating_add(self.intervals.inbox_auto_refresh_min_interval_ms);
        next_refresh_time <= request.current_time_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct FakeStatus {
        list_refreshing: HashSet<AccountId>,
        list_last: HashMap<AccountId, i64>,
        messages_refreshing: HashSet<MailboxId>,
        messages_last: HashMap<MailboxId, i64>,
    }

    impl RefreshStatus for FakeStatus {
        fn is_mailbox_list_refreshing(&self, account_id: AccountId) -> bool {
            self.list_refreshing.contains(&account_id)
        }
        fn last_mailbox_list_refresh_time(&self, account_id: AccountId) -> i64 {
            self.list_last.get(&account_id).copied().unwrap_or(0)
        }
        fn is_message_list_refreshing(&self, mailbox_id: MailboxId) -> bool {
            self.messages_refreshing.contains(&mailbox_id)
        }
        fn last_message_list_refresh_time(&self, mailbox_id: MailboxId) -> i64 {
            self.messages_last.get(&mailbox_id).copied().unwrap_or(0)
        }
    }

    const ACCOUNT: AccountId = AccountId(1);
    const MAILBOX: MailboxId = MailboxId(10);
    const INBOX: MailboxId = MailboxId(5);

    fn decide(
        request: RefreshRequest,
        state: &FakeStatus,
        refreshable: Option<bool>,
        inbox: Option<MailboxId>,
    ) -> Option<RefreshDecision> {
        RefreshScheduler::default().decide(&request, state, refreshable, inbox)
    }

    #[test]
    fn test_unknown_refreshable_produces_no_decision() {
        let state = FakeStatus::default();
        let request = RefreshRequest::new(Some(ACCOUNT), MAILBOX, 1_000_000);
        assert_eq!(decide(request, &state, None, Some(INBOX)), None);
    }

    #[test]
    fn test_everything_due() {
        let state = FakeStatus::default();
        let request = RefreshRequest::new(Some(ACCOUNT), MAILBOX, 1_000_000);
        let decision = decide(request, &state, Some(true), Some(INBOX)).unwrap();
        assert_eq!(
            decision,
            RefreshDecision {
                refresh_current_mailbox: true,
                refresh_mailbox_list: true,
                refresh_inbox: true,
            }
        );
    }

    #[test]
    fn test_not_refreshable_mailbox() {
        let state = FakeStatus::default();
        let request = RefreshRequest::new(Some(ACCOUNT), MAILBOX, 1_000_000);
        let decision = decide(request, &state, Some(false), Some(INBOX)).unwrap();
        assert!(!decision.refresh_current_mailbox);
        assert!(decision.refresh_mailbox_list);
        assert!(decision.refresh_inbox);
    }

    #[test]
    fn test_no_account_never_refreshes_mailbox_list() {
        let state = FakeStatus::default();
        for now in [0, 29_999, 30_000, 1_000_000, i64::MAX] {
            let request = RefreshRequest::new(None, MailboxId::ALL_INBOXES, now);
            let decision = decide(request, &state, Some(false), None).unwrap();
            assert!(!decision.refresh_mailbox_list);
            assert!(!decision.refresh_inbox);
            assert!(decision.is_empty());
        }
    }

    #[test]
    fn test_mailbox_list_boundary() {
        let mut state = FakeStatus::default();
        state.list_last.insert(ACCOUNT, 1_000);

        let request = RefreshRequest::new(Some(ACCOUNT), MAILBOX, 31_000);
        assert!(decide(request, &state, Some(true), Some(INBOX)).unwrap().refresh_mailbox_list);

        let request = RefreshRequest::new(Some(ACCOUNT), MAILBOX, 30_999);
        assert!(!decide(request, &state, Some(true), Some(INBOX)).unwrap().refresh_mailbox_list);
    }

    #[test]
    fn test_mailbox_list_refreshing_blocks_regardless_of_time() {
        let mut state = FakeStatus::default();
        state.list_refreshing.insert(ACCOUNT);

        for now in [0, 30_000, 1_000_000_000] {
            let request = RefreshRequest::new(Some(ACCOUNT), MAILBOX, now);
            let decision = decide(request, &state, Some(true), Some(INBOX)).unwrap();
            assert!(!decision.refresh_mailbox_list);
        }
    }

    #[test]
    fn test_inbox_is_current_mailbox() {
        let mut state = FakeStatus::default();
        for now in [0, 10_000, 1_000_000] {
            let request = RefreshRequest::new(Some(ACCOUNT), INBOX, now);
            let decision = decide(request, &state, Some(true), Some(INBOX)).unwrap();
            assert!(!decision.refresh_inbox);
            assert!(decision.refresh_current_mailbox);
        }

        state.messages_last.insert(INBOX, -1_000_000);
        let request = RefreshRequest::new(Some(ACCOUNT), INBOX, 1_000_000);
        assert!(!decide(request, &state, Some(true), Some(INBOX)).unwrap().refresh_inbox);
    }

    #[test]
    fn test_inbox_refreshing_blocks() {
        let mut state = FakeStatus::default();
        state.messages_refreshing.insert(INBOX);
        let request = RefreshRequest::new(Some(ACCOUNT), MAILBOX, 1_000_000);
        assert!(!decide(request, &state, Some(true), Some(INBOX)).unwrap().refresh_inbox);
    }

    #[test]
    fn test_inbox_boundary_flips_exactly_at_deadline() {
        let mut state = FakeStatus::default();
        state.messages_last.insert(INBOX, 50_000);
        let deadline = 50_000 + INBOX_AUTO_REFRESH_MIN_INTERVAL;

        let mut flipped_at = None;
        for now in (deadline - 5)..=(deadline + 5) {
            let request = RefreshRequest::new(Some(ACCOUNT), MAILBOX, now);
            let due = decide(request, &state, Some(true), Some(INBOX)).unwrap().refresh_inbox;
            if due && flipped_at.is_none() {
                flipped_at = Some(now);
            }
            assert_eq!(due, now >= deadline);
        }
        assert_eq!(flipped_at, Some(deadline));
    }

    #[test]
    fn test_custom_intervals() {
        let scheduler = RefreshScheduler::new(RefreshIntervals {
            mailbox_list_min_interval_ms: 100,
            inbox_auto_refresh_min_interval_ms: 200,
        });
        let mut state = FakeStatus::default();
        state.list_last.insert(ACCOUNT, 1_000);
        state.messages_last.insert(INBOX, 1_000);

        let request = RefreshRequest::new(Some(ACCOUNT), MAILBOX, 1_150);
        let decision = scheduler
            .decide(&request, &state, Some(true), Some(INBOX))
            .unwrap();
        assert!(decision.refresh_mailbox_list);
        assert!(!decision.refresh_inbox);
    }

    #[test]
    fn test_default_intervals() {
        let intervals = RefreshIntervals::default();
        assert_eq!(intervals.mailbox_list_min_interval_ms, 30_000);
        assert_eq!(intervals.inbox_auto_refresh_min_interval_ms, 10_000);
    }
}
