//! Refresh bookkeeping shared by every screen
//!
//! Tracks which message lists and mailbox lists are being refreshed and when
//! each last finished. Refresh work itself is handed to the sync backend as
//! [`RefreshCommand`]s; the backend reports back through
//! [`RefreshManager::message_list_refreshed`] and
//! [`RefreshManager::mailbox_list_refreshed`].

use super::scheduler::RefreshStatus;
use crate::{AccountId, Clock, MailboxId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Work handed to the sync backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshCommand {
    /// Fetch new messages for a mailbox
    MessageList {
        account_id: AccountId,
        mailbox_id: MailboxId,
    },
    /// Fetch the folder list of an account
    MailboxList { account_id: AccountId },
}

/// Events sent to screens that show refresh progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// A refresh started or finished. `mailbox_id` is `None` for mailbox list refreshes.
    StatusChanged {
        account_id: AccountId,
        mailbox_id: Option<MailboxId>,
    },
    /// A refresh failed
    MessagingError {
        account_id: AccountId,
        mailbox_id: Option<MailboxId>,
        message: String,
    },
}

/// Starts refreshes
pub trait RefreshActuator {
    /// Start refreshing a mailbox. Returns `false` if it was already refreshing
    /// or the request could not be queued.
    fn refresh_message_list(&self, account_id: AccountId, mailbox_id: MailboxId) -> bool;

    /// Start refreshing an account's mailbox list, with the same return contract.
    fn refresh_mailbox_list(&self, account_id: AccountId) -> bool;
}

/// Everything a refresh task needs from the refresh manager
pub trait Refresher: RefreshStatus + RefreshActuator + Send + Sync {}

impl<T: RefreshStatus + RefreshActuator + Send + Sync + ?Sized> Refresher for T {}

#[derive(Debug, Default, Clone, Copy)]
struct Status {
    refreshing: bool,
    last_refresh_time: i64,
}

#[derive(Debug, Default)]
struct State {
    mailbox_lists: HashMap<AccountId, Status>,
    message_lists: HashMap<MailboxId, Status>,
}

/// Owns refresh state and queues refresh work
pub struct RefreshManager {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
    command_tx: mpsc::Sender<RefreshCommand>,
    event_tx: broadcast::Sender<RefreshEvent>,
}

impl RefreshManager {
    /// Create a manager that queues work on `command_tx`
    pub fn new(clock: Arc<dyn Clock>, command_tx: mpsc::Sender<RefreshCommand>) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(State::default()),
            clock,
            command_tx,
            event_tx,
        }
    }

    /// Register for refresh events. Dropping the receiver unregisters.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.event_tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: RefreshEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn enqueue(&self, command: RefreshCommand) -> bool {
        match self.command_tx.try_send(command) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(command)) => {
                warn!("Refresh queue full, dropping {:?}", command);
                false
            }
            Err(mpsc::error::TrySendError::Closed(command)) => {
                warn!("Refresh backend gone, dropping {:?}", command);
                false
            }
        }
    }

    /// Called by the sync backend when a message list refresh finishes
    pub fn message_list_refreshed(
        &self,
        account_id: AccountId,
        mailbox_id: MailboxId,
        result: Result<(), String>,
    ) {
        let now = self.clock.now_millis();
        {
            let mut state = self.lock();
            let status = state.message_lists.entry(mailbox_id).or_default();
            status.refreshing = false;
            status.last_refresh_time = now;
        }
        debug!("Message list refreshed: account={} mailbox={}", account_id, mailbox_id);

        if let Err(message) = result {
            warn!(
                "Refreshing mailbox {} of account {} failed: {}",
                mailbox_id, account_id, message
            );
            self.emit(RefreshEvent::MessagingError {
                account_id,
                mailbox_id: Some(mailbox_id),
                message,
            });
        }
        self.emit(RefreshEvent::StatusChanged {
            account_id,
            mailbox_id: Some(mailbox_id),
        });
    }

    /// Called by the sync backend when a mailbox list refresh finishes
    pub fn mailbox_list_refreshed(&self, account_id: AccountId, result: Result<(), String>) {
        let now = self.clock.now_millis();
        {
            let mut state = self.lock();
            let status = state.mailbox_lists.entry(account_id).or_default();
            status.refreshing = false;
            status.last_refresh_time = now;
        }
        debug!("Mailbox list refreshed: account={}", account_id);

        if let Err(message) = result {
            warn!("Refreshing mailbox list of account {} failed: {}", account_id, message);
            self.emit(RefreshEvent::MessagingError {
                account_id,
                mailbox_id: None,
                message,
            });
        }
        self.emit(RefreshEvent::StatusChanged {
            account_id,
            mailbox_id: None,
        });
    }
}

impl RefreshStatus for RefreshManager {
    fn is_mailbox_list_refreshing(&self, account_id: AccountId) -> bool {
        self.lock()
            .mailbox_lists
            .get(&account_id)
            .is_some_and(|s| s.refreshing)
    }

    fn last_mailbox_list_refresh_time(&self, account_id: AccountId) -> i64 {
        self.lock()
            .mailbox_lists
            .get(&account_id)
            .map_or(0, |s| s.last_refresh_time)
    }

    fn is_message_list_refreshing(&self, mailbox_id: MailboxId) -> bool {
        self.lock()
            .message_lists
            .get(&mailbox_id)
            .is_some_and(|s| s.refreshing)
    }

    fn last_message_list_refresh_time(&self, mailbox_id: MailboxId) -> i64 {
        self.lock()
            .message_lists
            .get(&mailbox_id)
            .map_or(0, |s| s.last_refresh_time)
    }
}

impl RefreshActuator for RefreshManager {
    fn refresh_message_list(&self, account_id: AccountId, mailbox_id: MailboxId) -> bool {
        {
            let mut state = self.lock();
            let status = state.message_lists.entry(mailbox_id).or_default();
            if status.refreshing {
                debug!("Mailbox {} already refreshing", mailbox_id);
                return false;
            }
            status.refreshing = true;
        }

        if !self.enqueue(RefreshCommand::MessageList {
            account_id,
            mailbox_id,
        }) {
            if let Some(status) = self.lock().message_lists.get_mut(&mailbox_id) {
                status.refreshing = false;
            }
            return false;
        }

        info!("Refreshing mailbox {} of account {}", mailbox_id, account_id);
        self.emit(RefreshEvent::StatusChanged {
            account_id,
            mailbox_id: Some(mailbox_id),
        });
        true
    }

    fn refresh_mailbox_list(&self, account_id: AccountId) -> bool {
        {
            let mut state = self.lock();
            let status = state.mailbox_lists.entry(account_id).or_default();
            if status.refreshing {
                debug!("Mailbox list of account {} already refreshing", account_id);
                return false;
            }
            status.refreshing = true;
        }

        if !self.enqueue(RefreshCommand::MailboxList { account_id }) {
            if let Some(status) = self.lock().mailbox_lists.get_mut(&account_id) {
                status.refreshing = false;
            }
            return false;
        }

        info!("Refreshing mailbox list of account {}", account_id);
        self.emit(RefreshEvent::StatusChanged {
            account_id,
            mailbox_id: None,
        });
        true
    }
}

/// Create the refresh command channel
/// Returns (command_sender, command_receiver)
pub fn create_refresh_channel(
    depth: usize,
) -> (mpsc::Sender<RefreshCommand>, mpsc::Receiver<RefreshCommand>) {
    mpsc::channel(depth.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    const ACCOUNT: AccountId = AccountId(1);
    const MAILBOX: MailboxId = MailboxId(10);

    fn setup(depth: usize) -> (Arc<ManualClock>, RefreshManager, mpsc::Receiver<RefreshCommand>) {
        let clock = Arc::new(ManualClock::new(5_000));
        let (tx, rx) = create_refresh_channel(depth);
        (clock.clone(), RefreshManager::new(clock, tx), rx)
    }

    #[test]
    fn test_never_refreshed_defaults() {
        let (_, manager, _rx) = setup(4);
        assert!(!manager.is_message_list_refreshing(MAILBOX));
        assert!(!manager.is_mailbox_list_refreshing(ACCOUNT));
        assert_eq!(manager.last_message_list_refresh_time(MAILBOX), 0);
        assert_eq!(manager.last_mailbox_list_refresh_time(ACCOUNT), 0);
    }

    #[test]
    fn test_refresh_message_list_queues_once() {
        let (_, manager, mut rx) = setup(4);

        assert!(manager.refresh_message_list(ACCOUNT, MAILBOX));
        assert!(manager.is_message_list_refreshing(MAILBOX));
        assert!(!manager.refresh_message_list(ACCOUNT, MAILBOX));

        assert_eq!(
            rx.try_recv().unwrap(),
            RefreshCommand::MessageList {
                account_id: ACCOUNT,
                mailbox_id: MAILBOX
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_completion_stamps_clock_and_clears_flag() {
        let (clock, manager, _rx) = setup(4);

        assert!(manager.refresh_mailbox_list(ACCOUNT));
        clock.set(42_000);
        manager.mailbox_list_refreshed(ACCOUNT, Ok(()));

        assert!(!manager.is_mailbox_list_refreshing(ACCOUNT));
        assert_eq!(manager.last_mailbox_list_refresh_time(ACCOUNT), 42_000);
        assert!(manager.refresh_mailbox_list(ACCOUNT));
    }

    #[test]
    fn test_full_queue_rolls_back() {
        let (_, manager, _rx) = setup(1);

        assert!(manager.refresh_message_list(ACCOUNT, MAILBOX));
        assert!(!manager.refresh_message_list(ACCOUNT, MailboxId(11)));
        assert!(!manager.is_message_list_refreshing(MailboxId(11)));
    }

    #[test]
    fn test_closed_backend_rolls_back() {
        let (_, manager, rx) = setup(4);
        drop(rx);

        assert!(!manager.refresh_mailbox_list(ACCOUNT));
        assert!(!manager.is_mailbox_list_refreshing(ACCOUNT));
    }

    #[tokio::test]
    async fn test_events() {
        let (clock, manager, _rx) = setup(4);
        let mut events = manager.subscribe();

        assert!(manager.refresh_message_list(ACCOUNT, MAILBOX));
        clock.advance(1_000);
        manager.message_list_refreshed(ACCOUNT, MAILBOX, Err("timed out".to_string()));

        let started = RefreshEvent::StatusChanged {
            account_id: ACCOUNT,
            mailbox_id: Some(MAILBOX),
        };
        assert_eq!(events.recv().await.unwrap(), started);
        assert_eq!(
            events.recv().await.unwrap(),
            RefreshEvent::MessagingError {
                account_id: ACCOUNT,
                mailbox_id: Some(MAILBOX),
                message: "timed out".to_string(),
            }
        );
        assert_eq!(events.recv().await.unwrap(), started);
        assert_eq!(manager.last_message_list_refresh_time(MAILBOX), 6_000);
    }
}
