//! Refresh scheduling and tracking

mod manager;
mod scheduler;
mod task;

pub use manager::{
    create_refresh_channel, RefreshActuator, RefreshCommand, RefreshEvent, RefreshManager,
    Refresher,
};
pub use scheduler::{
    RefreshDecision, RefreshIntervals, RefreshRequest, RefreshScheduler, RefreshStatus,
    INBOX_AUTO_REFRESH_MIN_INTERVAL, MAILBOX_REFRESH_MIN_INTERVAL,
};
pub use task::{apply, RefreshContext, RefreshLookup, RefreshTask};
