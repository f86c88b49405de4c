//! Core logic for duomail
//!
//! Provides account and mailbox records, the local store, and the refresh
//! scheduler shared by the two-pane screen.

mod account;
mod clock;
mod database;
mod error;
mod mailbox;
pub mod refresh;
mod store;

pub use account::{Account, AccountId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use mailbox::{Mailbox, MailboxId, MailboxKind, MessageId};
pub use store::MailStore;
