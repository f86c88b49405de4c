//! Two-pane screen logic for duomail
//!
//! Everything the mail screen decides on its own, independent of the toolkit
//! that draws it.

pub mod account_selector;
pub mod config;
pub mod controller;
pub mod message_order;

pub use account_selector::AccountSelector;
pub use config::Settings;
pub use controller::{
    BackAction, MessageResponse, MoveMessages, OpenMessage, ScreenController, ScreenUpdate,
    Selection,
};
pub use message_order::{MessageOrder, MessageOrderChange};
