//! Background refresh task
//!
//! The store lookups a refresh decision depends on run on a spawned task.
//! Deciding and starting the refreshes happens in [`RefreshTask::join`], on
//! the task's owner, after the cancellation check. A cancelled task never
//! starts a refresh.

use super::manager::{RefreshActuator, Refresher};
use super::scheduler::{RefreshDecision, RefreshRequest, RefreshScheduler};
use crate::{Clock, CoreError, CoreResult, MailStore, MailboxId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Collaborators a refresh needs, injected by the owner of the screen
#[derive(Clone)]
pub struct RefreshContext {
    pub store: Arc<dyn MailStore>,
    pub refresher: Arc<dyn Refresher>,
    pub clock: Arc<dyn Clock>,
    pub scheduler: RefreshScheduler,
}

impl RefreshContext {
    pub fn new(
        store: Arc<dyn MailStore>,
        refresher: Arc<dyn Refresher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            refresher,
            clock,
            scheduler: RefreshScheduler::default(),
        }
    }

    pub fn with_scheduler(mut self, scheduler: RefreshScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }
}

/// What the background lookups found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshLookup {
    /// Inbox of the request's account, `None` without an account
    pub inbox_id: Option<MailboxId>,
    pub mailbox_refreshable: bool,
}

/// Handle to one in-flight refresh
pub struct RefreshTask {
    context: RefreshContext,
    request: RefreshRequest,
    cancelled: AtomicBool,
    handle: JoinHandle<CoreResult<RefreshLookup>>,
}

impl RefreshTask {
    /// Spawn the lookups for `request` on the current tokio runtime
    pub fn spawn(context: RefreshContext, request: RefreshRequest) -> Self {
        let lookup_context = context.clone();
        let handle = tokio::spawn(look_up(lookup_context, request));

        Self {
            context,
            request,
            cancelled: AtomicBool::new(false),
            handle,
        }
    }

    pub fn request(&self) -> &RefreshRequest {
        &self.request
    }

    /// Cancel the task. Whatever it has looked up so far is discarded.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!("Cancelling refresh of mailbox {}", self.request.mailbox_id);
        }
        self.handle.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the lookups are done and `join` will not wait
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the lookups, then decide and start the refreshes.
    ///
    /// Returns [`CoreError::Cancelled`] if the task was cancelled, whether the
    /// lookups had finished or not. Lookup failures abandon the refresh with
    /// the store's error. Either way nothing is refreshed.
    pub async fn join(mut self) -> CoreResult<RefreshDecision> {
        let result = match (&mut self.handle).await {
            Ok(lookup) => lookup.and_then(|lookup| self.finish(lookup)),
            Err(e) if e.is_cancelled() => Err(CoreError::Cancelled),
            Err(e) => {
                error!("Refresh task failed: {}", e);
                Err(CoreError::LookupFailure(e.to_string()))
            }
        };

        if let Err(e) = &result {
            log_abandoned(&self.request, e);
        }
        result
    }

    fn finish(&self, lookup: RefreshLookup) -> CoreResult<RefreshDecision> {
        if self.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let decision = self
            .context
            .scheduler
            .decide(
                &self.request,
                self.context.refresher.as_ref(),
                Some(lookup.mailbox_refreshable),
                lookup.inbox_id,
            )
            .ok_or_else(|| {
                CoreError::LookupFailure(format!(
                    "refreshability of mailbox {} unknown",
                    self.request.mailbox_id
                ))
            })?;

        apply(
            &decision,
            &self.request,
            lookup.inbox_id,
            self.context.refresher.as_ref(),
        );
        Ok(decision)
    }
}

async fn look_up(context: RefreshContext, request: RefreshRequest) -> CoreResult<RefreshLookup> {
    let inbox_id = resolve_inbox(&context, &request).await?;
    let mailbox_refreshable = context
        .store
        .is_mailbox_refreshable(request.mailbox_id)
        .await?;

    Ok(RefreshLookup {
        inbox_id,
        mailbox_refreshable,
    })
}

/// The inbox of the selected account, `None` without an account
async fn resolve_inbox(
    context: &RefreshContext,
    request: &RefreshRequest,
) -> CoreResult<Option<MailboxId>> {
    let Some(account_id) = request.account_id else {
        return Ok(None);
    };

    let inbox_id = context.store.resolve_inbox_id(account_id).await?;
    if !inbox_id.is_valid() {
        return Err(CoreError::LookupFailure(format!(
            "account {} resolved to inbox {}",
            account_id, inbox_id
        )));
    }
    Ok(Some(inbox_id))
}

fn log_abandoned(request: &RefreshRequest, e: &CoreError) {
    if e.is_silent() {
        debug!("Refresh of mailbox {} abandoned: {}", request.mailbox_id, e);
    } else {
        warn!("Refresh of mailbox {} abandoned: {}", request.mailbox_id, e);
    }
}

/// Start the refreshes a decision calls for
pub fn apply<A: RefreshActuator + ?Sized>(
    decision: &RefreshDecision,
    request: &RefreshRequest,
    inbox_id: Option<MailboxId>,
    actuator: &A,
) {
    let Some(account_id) = request.account_id else {
        if decision.refresh_current_mailbox {
            warn!(
                "Mailbox {} is refreshable but no account is selected",
                request.mailbox_id
            );
        }
        return;
    };

    if decision.refresh_current_mailbox {
        actuator.refresh_message_list(account_id, request.mailbox_id);
    }
    if decision.refresh_mailbox_list {
        actuator.refresh_mailbox_list(account_id);
    }
    if decision.refresh_inbox {
        if let Some(inbox_id) = inbox_id {
            actuator.refresh_message_list(account_id, inbox_id);
        }
    }

    info!(
        "Refresh applied: account={} mailbox={} decision={:?}",
        account_id, request.mailbox_id, decision
    );
}
