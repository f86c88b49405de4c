//! duomail - run one refresh of the two-pane mail screen from the command line

use anyhow::{Context, Result};
use clap::Parser;
use duomail_core::refresh::{
    create_refresh_channel, RefreshContext, RefreshManager, RefreshScheduler,
};
use duomail_core::{AccountId, Database, MailStore, MailboxId, SystemClock};
use duomail_shell::{AccountSelector, ScreenController, ScreenUpdate, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "duomail", about = "Refresh the open mailbox the way the mail screen does")]
struct Args {
    /// Settings file (defaults to the user config directory)
    #[arg(long, env = "DUOMAIL_CONFIG")]
    config: Option<PathBuf>,

    /// Account to open; the first account if omitted
    account_id: Option<i64>,

    /// Mailbox to open; the account's inbox if omitted
    mailbox_id: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("duomail=debug".parse()?)
                .add_directive("duomail_core=debug".parse()?)
                .add_directive("duomail_shell=debug".parse()?),
        )
        .init();

    tracing::info!("Starting duomail");

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    let database = Arc::new(
        Database::open(&settings.database_path)
            .await
            .context("Failed to open database")?,
    );

    let clock = Arc::new(SystemClock);
    let (command_tx, mut command_rx) = create_refresh_channel(settings.command_queue_depth);
    let manager = Arc::new(RefreshManager::new(clock.clone(), command_tx));
    let context = RefreshContext::new(database.clone(), manager.clone(), clock)
        .with_scheduler(RefreshScheduler::new(settings.refresh));
    let mut controller = ScreenController::new(context);
    controller.listen(manager.subscribe());

    let accounts = database.get_accounts().await?;
    if let Some(account_id) = args.account_id {
        controller
            .open_listed_account(&accounts, AccountId(account_id))
            .context("Requested account is not set up")?;
    }
    let selector = controller.update_account_list(&accounts);
    let account_id = match &selector {
        AccountSelector::NoAccounts => {
            println!("No account set up");
            return Ok(());
        }
        AccountSelector::Single { account_id, title } => {
            println!("Account: {}", title);
            *account_id
        }
        AccountSelector::Dropdown {
            entries,
            default_position,
        } => {
            for (position, (_, label)) in entries.iter().enumerate() {
                let marker = if position == *default_position { '*' } else { ' ' };
                println!("{} {}", marker, label);
            }
            selector
                .account_at(*default_position)
                .context("Account list changed while loading")?
        }
    };

    let mailbox_id = match args.mailbox_id {
        Some(id) => MailboxId(id),
        None => database.resolve_inbox_id(account_id).await?,
    };
    controller.open_mailbox(account_id, mailbox_id)?;
    controller.set_message_list(mailbox_id, database.get_message_ids(mailbox_id).await?);

    controller.on_refresh();
    match controller.finish_refresh().await {
        Some(decision) => println!(
            "Refresh current mailbox: {}\nRefresh mailbox list: {}\nRefresh inbox: {}",
            decision.refresh_current_mailbox, decision.refresh_mailbox_list, decision.refresh_inbox
        ),
        None => println!("Nothing refreshed"),
    }
    for update in controller.poll_refresh_events() {
        match update {
            ScreenUpdate::RefreshStatus => {
                println!("Refreshing: {}", controller.is_progress_active())
            }
            ScreenUpdate::Error(message) => println!("Refresh failed: {}", message),
        }
    }

    controller.shutdown();
    drop(controller);
    drop(manager);
    while let Some(command) = command_rx.recv().await {
        println!("Queued: {:?}", command);
    }

    Ok(())
}
