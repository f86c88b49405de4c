//! Two-pane screen controller
//!
//! Holds what the screen is showing (account, mailbox, message), decides where
//! navigation goes, and starts refreshes. Rendering, menus and dialogs belong
//! to the host toolkit; it calls into the controller and reads back state.

use crate::account_selector::{position_of, AccountSelector};
use crate::message_order::{MessageOrder, MessageOrderChange};
use duomail_core::refresh::{
    RefreshContext, RefreshDecision, RefreshEvent, RefreshRequest, RefreshStatus, RefreshTask,
};
use duomail_core::{
    Account, AccountId, Clock, CoreError, CoreResult, MailboxId, MailboxKind, MessageId,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

/// What the screen currently shows
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub account_id: Option<AccountId>,
    pub mailbox_id: Option<MailboxId>,
    pub message_id: Option<MessageId>,
}

/// Result of the back key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackAction {
    /// A message was open; the message list is shown again
    ShowMailbox,
    /// Nothing to go back to; the host should close the screen
    Close,
}

/// How an opened message is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMessage {
    View(MessageId),
    /// Drafts open in the composer instead of the viewer
    EditDraft(MessageId),
}

/// A reply or forward of the open message, started in the composer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageResponse {
    Reply(MessageId),
    ReplyAll(MessageId),
    Forward(MessageId),
}

/// Messages the host should move once a destination was picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveMessages {
    pub mailbox_id: MailboxId,
    pub message_ids: Vec<MessageId>,
}

/// What the host redraws after refresh events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenUpdate {
    /// Refresh progress may have changed; re-read `is_progress_active`
    RefreshStatus,
    /// A refresh failed; show the message to the user
    Error(String),
}

/// Controller for the two-pane mail screen
pub struct ScreenController {
    context: RefreshContext,
    selection: Selection,
    message_order: Option<MessageOrder>,
    refresh_task: Option<RefreshTask>,
    refresh_events: Option<broadcast::Receiver<RefreshEvent>>,
}

impl ScreenController {
    pub fn new(context: RefreshContext) -> Self {
        Self {
            context,
            selection: Selection::default(),
            message_order: None,
            refresh_task: None,
            refresh_events: None,
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Open an account, optionally at a given mailbox.
    ///
    /// Without an account nothing is selected; the account selector picks one
    /// once the account list is loaded.
    pub fn open_account(
        &mut self,
        account_id: Option<AccountId>,
        mailbox_id: Option<MailboxId>,
    ) {
        debug!("Open account: {:?} {:?}", account_id, mailbox_id);
        if let Some(account_id) = account_id {
            self.select_account(account_id);
            if let Some(mailbox_id) = mailbox_id {
                self.select_mailbox(mailbox_id);
            }
        }
    }

    /// Open an account that must be in `accounts`
    pub fn open_listed_account(
        &mut self,
        accounts: &[Account],
        account_id: AccountId,
    ) -> CoreResult<()> {
        if position_of(accounts, account_id).is_none() {
            return Err(CoreError::AccountNotFound(account_id));
        }
        self.select_account(account_id);
        Ok(())
    }

    /// Open a specific mailbox of an account. Both ids are required.
    pub fn open_mailbox(
        &mut self,
        account_id: AccountId,
        mailbox_id: MailboxId,
    ) -> CoreResult<()> {
        if !account_id.is_valid() {
            return Err(CoreError::InvalidId(format!("account {}", account_id)));
        }
        if !(mailbox_id.is_valid() || mailbox_id.is_virtual()) {
            return Err(CoreError::InvalidId(format!("mailbox {}", mailbox_id)));
        }
        self.select_account(account_id);
        self.select_mailbox(mailbox_id);
        Ok(())
    }

    /// Switch account. Mailbox and message selection are cleared.
    pub fn select_account(&mut self, account_id: AccountId) {
        info!("Account selected: accountId={}", account_id);
        self.selection = Selection {
            account_id: Some(account_id),
            mailbox_id: None,
            message_id: None,
        };
        self.message_order = None;
    }

    /// Switch mailbox within the current account. The message selection is cleared.
    pub fn select_mailbox(&mut self, mailbox_id: MailboxId) {
        debug!("Mailbox selected: {}", mailbox_id);
        self.selection.mailbox_id = Some(mailbox_id);
        self.selection.message_id = None;
        if self
            .message_order
            .as_ref()
            .is_some_and(|order| order.mailbox_id() != mailbox_id)
        {
            self.message_order = None;
        }
    }

    /// A message was tapped in the message list
    pub fn open_message(
        &mut self,
        message_id: MessageId,
        mailbox_kind: MailboxKind,
    ) -> OpenMessage {
        if mailbox_kind == MailboxKind::Drafts {
            return OpenMessage::EditDraft(message_id);
        }
        self.select_message(message_id);
        OpenMessage::View(message_id)
    }

    pub fn select_message(&mut self, message_id: MessageId) {
        self.selection.message_id = Some(message_id);
        if let Some(order) = self.message_order.as_mut() {
            order.move_to(message_id);
        }
    }

    pub fn is_message_selected(&self) -> bool {
        self.selection.message_id.is_some()
    }

    /// Close the message view and show the message list again
    pub fn go_back_to_mailbox(&mut self) {
        self.selection.message_id = None;
        self.message_order = None;
    }

    pub fn on_back_pressed(&mut self) -> BackAction {
        if self.is_message_selected() {
            self.go_back_to_mailbox();
            BackAction::ShowMailbox
        } else {
            BackAction::Close
        }
    }

    /// Feed the message ids of a mailbox, newest first.
    ///
    /// Returns `None` if `mailbox_id` is not the open mailbox. If the open
    /// message disappeared the controller goes back to the mailbox.
    pub fn set_message_list(
        &mut self,
        mailbox_id: MailboxId,
        ids: Vec<MessageId>,
    ) -> Option<MessageOrderChange> {
        if self.selection.mailbox_id != Some(mailbox_id) {
            return None;
        }

        let change = match self.message_order.as_mut() {
            Some(order) => order.update(ids),
            None => {
                let mut order = MessageOrder::new(mailbox_id, ids);
                let change = match self.selection.message_id {
                    Some(message_id) if !order.move_to(message_id) => {
                        MessageOrderChange::CurrentMessageGone
                    }
                    _ => MessageOrderChange::Updated,
                };
                self.message_order = Some(order);
                change
            }
        };

        if change == MessageOrderChange::CurrentMessageGone {
            debug!("Current message gone from mailbox {}", mailbox_id);
            self.go_back_to_mailbox();
        }
        Some(change)
    }

    pub fn can_move_to_older(&self) -> bool {
        self.message_order
            .as_ref()
            .is_some_and(MessageOrder::can_move_to_older)
    }

    pub fn can_move_to_newer(&self) -> bool {
        self.message_order
            .as_ref()
            .is_some_and(MessageOrder::can_move_to_newer)
    }

    pub fn move_to_older(&mut self) -> bool {
        self.step(MessageOrder::move_to_older)
    }

    pub fn move_to_newer(&mut self) -> bool {
        self.step(MessageOrder::move_to_newer)
    }

    fn step(&mut self, mv: fn(&mut MessageOrder) -> bool) -> bool {
        if !self.is_message_selected() {
            return false;
        }
        let Some(order) = self.message_order.as_mut() else {
            return false;
        };
        if !mv(order) {
            return false;
        }
        self.selection.message_id = order.current();
        true
    }

    /// Step away from the open message before it is deleted.
    ///
    /// Returns the id the host should delete. When there is no neighbour to
    /// show the message list is shown instead.
    pub fn delete_current_message(&mut self) -> Option<MessageId> {
        let message_id = self.selection.message_id?;
        if !self.move_to_older() && !self.move_to_newer() {
            self.go_back_to_mailbox();
        }
        Some(message_id)
    }

    fn move_to_older_or_back(&mut self) {
        if !self.move_to_older() {
            self.go_back_to_mailbox();
        }
    }

    /// Unread button in the message view. Returns the message to mark unread;
    /// the message list is shown again.
    pub fn set_current_message_unread(&mut self) -> Option<MessageId> {
        let message_id = self.selection.message_id?;
        self.go_back_to_mailbox();
        Some(message_id)
    }

    /// The message view marked its message unread
    pub fn on_message_set_unread(&mut self) {
        self.go_back_to_mailbox();
    }

    /// The message view found its message deleted
    pub fn on_message_not_exists(&mut self) {
        self.go_back_to_mailbox();
    }

    /// A meeting invite was answered: show the next older message, or the
    /// list if there is none
    pub fn on_responded_to_invite(&mut self) {
        self.move_to_older_or_back();
    }

    /// Account and message for the move dialog
    pub fn move_dialog_target(&self) -> Option<(AccountId, MessageId)> {
        Some((self.selection.account_id?, self.selection.message_id?))
    }

    /// A destination was picked in the move dialog.
    ///
    /// Steps to the next older message first, like a delete; the message list
    /// is shown if there is none.
    pub fn on_move_to_mailbox_selected(
        &mut self,
        mailbox_id: MailboxId,
        message_ids: Vec<MessageId>,
    ) -> MoveMessages {
        info!("Moving {} message(s) to mailbox {}", message_ids.len(), mailbox_id);
        self.move_to_older_or_back();
        MoveMessages {
            mailbox_id,
            message_ids,
        }
    }

    /// Account a new message is composed from
    pub fn compose_target(&self) -> Option<AccountId> {
        self.selection.account_id
    }

    pub fn reply_target(&self, reply_all: bool) -> Option<MessageResponse> {
        let message_id = self.selection.message_id?;
        Some(if reply_all {
            MessageResponse::ReplyAll(message_id)
        } else {
            MessageResponse::Reply(message_id)
        })
    }

    pub fn forward_target(&self) -> Option<MessageResponse> {
        self.selection.message_id.map(MessageResponse::Forward)
    }

    /// Account whose settings the settings menu opens
    pub fn account_settings_target(&self) -> Option<AccountId> {
        self.selection.account_id
    }

    /// Selector state for a freshly loaded account list
    pub fn update_account_list(&self, accounts: &[Account]) -> AccountSelector {
        AccountSelector::from_accounts(accounts, self.selection.account_id)
    }

    /// An entry was picked in the account dropdown
    pub fn on_account_chosen(&mut self, selector: &AccountSelector, position: usize) -> bool {
        match selector.account_at(position) {
            Some(account_id) => {
                self.select_account(account_id);
                true
            }
            None => false,
        }
    }

    /// Refresh button pressed. Any refresh still looking things up is cancelled.
    pub fn on_refresh(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.cancel();
        }

        let Some(mailbox_id) = self.selection.mailbox_id else {
            debug!("Refresh ignored: no mailbox selected");
            return;
        };

        let request = RefreshRequest::new(
            self.selection.account_id,
            mailbox_id,
            self.context.clock.now_millis(),
        );
        self.refresh_task = Some(RefreshTask::spawn(self.context.clone(), request));
    }

    pub fn refresh_task(&self) -> Option<&RefreshTask> {
        self.refresh_task.as_ref()
    }

    /// Wait for the pending refresh and start what it decided, if anything
    pub async fn finish_refresh(&mut self) -> Option<RefreshDecision> {
        self.refresh_task.take()?.join().await.ok()
    }

    /// Whether the refresh indicator should spin for the open mailbox
    pub fn is_progress_active(&self) -> bool {
        self.selection.mailbox_id.is_some_and(|id| {
            !id.is_virtual() && self.context.refresher.is_message_list_refreshing(id)
        })
    }

    /// Start receiving refresh events, usually from `RefreshManager::subscribe`
    pub fn listen(&mut self, events: broadcast::Receiver<RefreshEvent>) {
        self.refresh_events = Some(events);
    }

    /// Drain the refresh events received since the last call
    pub fn poll_refresh_events(&mut self) -> Vec<ScreenUpdate> {
        let mut updates = Vec::new();
        let Some(events) = self.refresh_events.as_mut() else {
            return updates;
        };

        let mut closed = false;
        loop {
            let update = match events.try_recv() {
                Ok(RefreshEvent::StatusChanged { .. }) => ScreenUpdate::RefreshStatus,
                Ok(RefreshEvent::MessagingError {
                    account_id,
                    mailbox_id,
                    message,
                }) => {
                    debug!(
                        "Refresh error for account {} mailbox {:?}: {}",
                        account_id, mailbox_id, message
                    );
                    ScreenUpdate::Error(message)
                }
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("Missed {} refresh events", missed);
                    ScreenUpdate::RefreshStatus
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    closed = true;
                    break;
                }
            };
            if update != ScreenUpdate::RefreshStatus || !updates.contains(&update) {
                updates.push(update);
            }
        }

        if closed {
            self.refresh_events = None;
        }
        updates
    }

    /// Stop background work before the screen goes away
    pub fn shutdown(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.cancel();
        }
        self.refresh_events = None;
    }
}

impl Drop for ScreenController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
