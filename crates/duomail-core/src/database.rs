//! Database storage using SQLite

use crate::{
    Account, AccountId, CoreError, CoreResult, MailStore, Mailbox, MailboxId, MailboxKind,
    MessageId,
};
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::path::Path;
use tracing::{debug, info};

/// Database account record
#[derive(Debug, Clone, sqlx::FromRow)]
struct DbAccount {
    id: i64,
    email_address: String,
    display_name: Option<String>,
}

impl From<DbAccount> for Account {
    fn from(row: DbAccount) -> Self {
        Account {
            id: AccountId(row.id),
            display_name: row.display_name,
            email: row.email_address,
        }
    }
}

/// Database mailbox record
#[derive(Debug, Clone, sqlx::FromRow)]
struct DbMailbox {
    id: i64,
    account_id: i64,
    display_name: String,
    kind: String,
}

impl From<DbMailbox> for Mailbox {
    fn from(row: DbMailbox) -> Self {
        Mailbox {
            id: MailboxId(row.id),
            account_id: AccountId(row.account_id),
            display_name: row.display_name,
            kind: MailboxKind::from_db(&row.kind),
        }
    }
}

/// Database connection pool
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());
        info!("Opening database at {}", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        let db = Self { pool };
        db.initialize().await?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub async fn open_memory() -> CoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.initialize().await?;

        Ok(db)
    }

    async fn initialize(&self) -> CoreResult<()> {
        debug!("Initializing database schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_address TEXT NOT NULL,
                display_name TEXT,
                created_at TEXT DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS mailboxes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                display_name TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'mail',
                created_at TEXT DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mailbox_id INTEGER NOT NULL REFERENCES mailboxes(id) ON DELETE CASCADE,
                subject TEXT,
                date_epoch INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_mailboxes_account ON mailboxes(account_id, kind);
            CREATE INDEX IF NOT EXISTS idx_messages_mailbox ON messages(mailbox_id, date_epoch DESC);
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database schema initialized");
        Ok(())
    }

    /// Add an account, returning its new id
    pub async fn insert_account(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> CoreResult<AccountId> {
        let result = sqlx::query("INSERT INTO accounts (email_address, display_name) VALUES (?, ?)")
            .bind(email)
            .bind(display_name)
            .execute(&self.pool)
            .await?;

        Ok(AccountId(result.last_insert_rowid()))
    }

    /// All accounts in selector order
    pub async fn get_accounts(&self) -> CoreResult<Vec<Account>> {
        let rows: Vec<DbAccount> =
            sqlx::query_as("SELECT id, email_address, display_name FROM accounts ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Add a mailbox to an account, returning its new id
    pub async fn insert_mailbox(
        &self,
        account_id: AccountId,
        display_name: &str,
        kind: MailboxKind,
    ) -> CoreResult<MailboxId> {
        let result =
            sqlx::query("INSERT INTO mailboxes (account_id, display_name, kind) VALUES (?, ?, ?)")
                .bind(account_id.0)
                .bind(display_name)
                .bind(kind.as_str())
                .execute(&self.pool)
                .await?;

        Ok(MailboxId(result.last_insert_rowid()))
    }

    /// Mailboxes of an account
    pub async fn get_mailboxes(&self, account_id: AccountId) -> CoreResult<Vec<Mailbox>> {
        let rows: Vec<DbMailbox> = sqlx::query_as(
            "SELECT id, account_id, display_name, kind FROM mailboxes WHERE account_id = ? ORDER BY id",
        )
        .bind(account_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Mailbox::from).collect())
    }

    /// Look up a single mailbox
    pub async fn get_mailbox(&self, mailbox_id: MailboxId) -> CoreResult<Option<Mailbox>> {
        let row: Option<DbMailbox> = sqlx::query_as(
            "SELECT id, account_id, display_name, kind FROM mailboxes WHERE id = ?",
        )
        .bind(mailbox_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Mailbox::from))
    }

    /// Add a message header to a mailbox
    pub async fn insert_message(
        &self,
        mailbox_id: MailboxId,
        subject: &str,
        date_epoch: i64,
    ) -> CoreResult<MessageId> {
        let result =
            sqlx::query("INSERT INTO messages (mailbox_id, subject, date_epoch) VALUES (?, ?, ?)")
                .bind(mailbox_id.0)
                .bind(subject)
                .bind(date_epoch)
                .execute(&self.pool)
                .await?;

        Ok(MessageId(result.last_insert_rowid()))
    }

    /// Message ids of a mailbox, newest first
    pub async fn get_message_ids(&self, mailbox_id: MailboxId) -> CoreResult<Vec<MessageId>> {
        let rows = sqlx::query(
            "SELECT id FROM messages WHERE mailbox_id = ? ORDER BY date_epoch DESC, id DESC",
        )
        .bind(mailbox_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| MessageId(row.get::<i64, _>("id")))
            .collect())
    }
}

#[async_trait]
impl MailStore for Database {
    async fn resolve_inbox_id(&self, account_id: AccountId) -> CoreResult<MailboxId> {
        if !account_id.is_valid() {
            return Err(CoreError::InvalidId(format!("account {}", account_id)));
        }

        let row = sqlx::query(
            "SELECT id FROM mailboxes WHERE account_id = ? AND kind = 'inbox' ORDER BY id LIMIT 1",
        )
        .bind(account_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(MailboxId(row.get::<i64, _>("id"))),
            None => Err(CoreError::LookupFailure(format!(
                "account {} has no inbox",
                account_id
            ))),
        }
    }

    async fn is_mailbox_refreshable(&self, mailbox_id: MailboxId) -> CoreResult<bool> {
        if mailbox_id.is_virtual() {
            return Ok(false);
        }
        if !mailbox_id.is_valid() {
            return Err(CoreError::InvalidId(format!("mailbox {}", mailbox_id)));
        }

        let mailbox = self
            .get_mailbox(mailbox_id)
            .await?
            .ok_or(CoreError::MailboxNotFound(mailbox_id))?;

        Ok(mailbox.kind.is_refreshable())
    }
}
