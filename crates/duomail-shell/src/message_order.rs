//! Older/newer navigation inside the open mailbox
//!
//! Message ids are held newest first, so "older" moves towards the end.

use duomail_core::{MailboxId, MessageId};

/// What happened to the current message when the list was reloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrderChange {
    /// The current message is still there (or none was selected)
    Updated,
    /// The current message was deleted or moved away
    CurrentMessageGone,
}

/// Position of the open message in its mailbox
#[derive(Debug, Clone)]
pub struct MessageOrder {
    mailbox_id: MailboxId,
    ids: Vec<MessageId>,
    current: Option<usize>,
}

impl MessageOrder {
    pub fn new(mailbox_id: MailboxId, ids: Vec<MessageId>) -> Self {
        Self {
            mailbox_id,
            ids,
            current: None,
        }
    }

    pub fn mailbox_id(&self) -> MailboxId {
        self.mailbox_id
    }

    pub fn current(&self) -> Option<MessageId> {
        self.current.map(|i| self.ids[i])
    }

    /// Point at `message_id`. Returns `false` if it is not in this mailbox.
    pub fn move_to(&mut self, message_id: MessageId) -> bool {
        self.current = self.ids.iter().position(|id| *id == message_id);
        self.current.is_some()
    }

    pub fn can_move_to_older(&self) -> bool {
        self.current.is_some_and(|i| i + 1 < self.ids.len())
    }

    pub fn can_move_to_newer(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }

    pub fn move_to_older(&mut self) -> bool {
        match self.current {
            Some(i) if i + 1 < self.ids.len() => {
                self.current = Some(i + 1);
                true
            }
            _ => false,
        }
    }

    pub fn move_to_newer(&mut self) -> bool {
        match self.current {
            Some(i) if i > 0 => {
                self.current = Some(i - 1);
                true
            }
            _ => false,
        }
    }

    /// Replace the message list after the mailbox changed
    pub fn update(&mut self, ids: Vec<MessageId>) -> MessageOrderChange {
        let current = self.current();
        self.ids = ids;
        match current {
            None => MessageOrderChange::Updated,
            Some(id) if self.move_to(id) => MessageOrderChange::Updated,
            Some(_) => MessageOrderChange::CurrentMessageGone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<MessageId> {
        raw.iter().copied().map(MessageId).collect()
    }

    #[test]
    fn test_navigation() {
        let mut order = MessageOrder::new(MailboxId(1), ids(&[30, 20, 10]));
        assert_eq!(order.current(), None);
        assert!(!order.can_move_to_older());
        assert!(!order.move_to_newer());

        assert!(order.move_to(MessageId(20)));
        assert!(order.can_move_to_older());
        assert!(order.can_move_to_newer());

        assert!(order.move_to_older());
        assert_eq!(order.current(), Some(MessageId(10)));
        assert!(!order.can_move_to_older());
        assert!(!order.move_to_older());

        assert!(order.move_to_newer());
        assert!(order.move_to_newer());
        assert_eq!(order.current(), Some(MessageId(30)));
        assert!(!order.can_move_to_newer());
    }

    #[test]
    fn test_move_to_unknown_message() {
        let mut order = MessageOrder::new(MailboxId(1), ids(&[3, 2, 1]));
        assert!(order.move_to(MessageId(2)));
        assert!(!order.move_to(MessageId(99)));
        assert_eq!(order.current(), None);
    }

    #[test]
    fn test_update_keeps_current_message() {
        let mut order = MessageOrder::new(MailboxId(1), ids(&[3, 2, 1]));
        order.move_to(MessageId(2));

        assert_eq!(order.update(ids(&[4, 3, 2, 1])), MessageOrderChange::Updated);
        assert_eq!(order.current(), Some(MessageId(2)));
        assert!(order.move_to_newer());
        assert_eq!(order.current(), Some(MessageId(3)));
    }

    #[test]
    fn test_update_detects_gone_message() {
        let mut order = MessageOrder::new(MailboxId(1), ids(&[3, 2, 1]));
        order.move_to(MessageId(2));

        assert_eq!(order.update(ids(&[3, 1])), MessageOrderChange::CurrentMessageGone);
        assert_eq!(order.current(), None);
    }
}
