//! `SQLite` handler for persistent sender state.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use super::Handler;
use crate::Result;
use crate::sender::{Action, PatternRule, Reference, SenderRecord, StashEntry, StashId};

/// Handler backed by an `SQLite` database.
pub struct SqliteHandler {
    pool: SqlitePool,
}

impl SqliteHandler {
    /// Create a new handler with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let handler = Self { pool };
        handler.initialize().await?;
        debug!("Opened sender database at {database_path}");
        Ok(handler)
    }

    /// Create an in-memory handler for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let handler = Self { pool };
        handler.initialize().await?;
        Ok(handler)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS senders (
                email TEXT PRIMARY KEY NOT NULL,
                action TEXT NOT NULL,
                reference TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS patterns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pattern TEXT NOT NULL,
                action TEXT NOT NULL,
                reference TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS stash (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                recipients TEXT NOT NULL,
                stashed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Index for per-sender unstash
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_stash_email ON stash(email, id)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append a pattern rule after the existing ones.
    ///
    /// The pattern is stored as given; it is compiled when a sender resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn add_pattern(&self, rule: &PatternRule) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO patterns (pattern, action, reference)
            VALUES (?, ?, ?)
            ",
        )
        .bind(&rule.pattern)
        .bind(rule.action.as_str())
        .bind(rule.reference.as_ref().map(Reference::as_str))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete the explicit record for `email`. Returns `true` if one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn clear_sender(&self, email: &str) -> Result<bool> {
        let deleted = sqlx::query(
            r"
            DELETE FROM senders
            WHERE email = ?
            ",
        )
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(deleted.rows_affected() > 0)
    }

    /// Number of entries stashed for `email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stash_count(&self, email: &str) -> Result<usize> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) as total FROM stash WHERE email = ?
            ",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(row.get::<i64, _>("total") as usize)
    }
}

impl Handler for SqliteHandler {
    async fn get_action_for_sender(&self, email: &str) -> Result<Option<SenderRecord>> {
        let row = sqlx::query(
            r"
            SELECT action, reference
            FROM senders
            WHERE email = ?
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_record(&r)).transpose()
    }

    async fn get_patterns(&self) -> Result<Vec<PatternRule>> {
        let rows = sqlx::query(
            r"
            SELECT pattern, action, reference
            FROM patterns
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_pattern).collect()
    }

    async fn set_action_for_sender(
        &self,
        email: &str,
        action: Action,
        reference: &Reference,
    ) -> Result<Reference> {
        let row = sqlx::query(
            r"
            INSERT INTO senders (email, action, reference)
            VALUES (?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                action = excluded.action,
                reference = COALESCE(senders.reference, excluded.reference),
                updated_at = CURRENT_TIMESTAMP
            RETURNING reference
            ",
        )
        .bind(email)
        .bind(action.as_str())
        .bind(reference.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(Reference::new(row.get::<String, _>("reference")))
    }

    async fn stash_message_for_sender(
        &self,
        email: &str,
        message: &str,
        recipients: &[String],
    ) -> Result<StashId> {
        let recipients = serde_json::to_string(recipients)?;

        let result = sqlx::query(
            r"
            INSERT INTO stash (email, message, recipients)
            VALUES (?, ?, ?)
            ",
        )
        .bind(email)
        .bind(message)
        .bind(&recipients)
        .execute(&self.pool)
        .await?;

        Ok(StashId::new(result.last_insert_rowid()))
    }

    async fn stashed_ids_for_sender(&self, email: &str) -> Result<Vec<StashId>> {
        let rows = sqlx::query(
            r"
            SELECT id FROM stash
            WHERE email = ?
            ORDER BY id
            ",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| StashId::new(r.get::<i64, _>("id")))
            .collect())
    }

    async fn peek_stashed(&self, id: StashId) -> Result<Option<StashEntry>> {
        let row = sqlx::query(
            r"
            SELECT message, recipients FROM stash
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_entry(&r)).transpose()
    }

    async fn remove_stashed(&self, id: StashId) -> Result<bool> {
        let deleted = sqlx::query(
            r"
            DELETE FROM stash WHERE id = ?
            ",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn take_stashed(&self, id: StashId) -> Result<Option<StashEntry>> {
        let row = sqlx::query(
            r"
            DELETE FROM stash
            WHERE id = ?
            RETURNING message, recipients
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_entry(&r)).transpose()
    }
}

fn row_to_record(row: &SqliteRow) -> Result<SenderRecord> {
    let action: String = row.get("action");
    let reference: Option<String> = row.get("reference");
    Ok(SenderRecord::new(
        action.parse()?,
        reference.map(Reference::new),
    ))
}

fn row_to_pattern(row: &SqliteRow) -> Result<PatternRule> {
    let action: String = row.get("action");
    let reference: Option<String> = row.get("reference");
    Ok(PatternRule {
        pattern: row.get("pattern"),
        action: action.parse()?,
        reference: reference.map(Reference::new),
    })
}

fn row_to_entry(row: &SqliteRow) -> Result<StashEntry> {
    let recipients: String = row.get("recipients");
    Ok(StashEntry::new(
        row.get::<String, _>("message"),
        serde_json::from_str(&recipients)?,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get_record() {
        let handler = SqliteHandler::in_memory().await.unwrap();
        let reference = Reference::new("abc");

        handler
            .set_action_for_sender("a@example.com", Action::Confirm, &reference)
            .await
            .unwrap();
        handler
            .set_action_for_sender("a@example.com", Action::Accept, &reference)
            .await
            .unwrap();

        let record = handler
            .get_action_for_sender("a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.action, Action::Accept);
        assert_eq!(record.reference, Some(reference));
    }

    #[tokio::test]
    async fn test_upsert_keeps_stored_reference() {
        let handler = SqliteHandler::in_memory().await.unwrap();

        let first = handler
            .set_action_for_sender("a@example.com", Action::Confirm, &Reference::new("first"))
            .await
            .unwrap();
        let second = handler
            .set_action_for_sender("a@example.com", Action::Accept, &Reference::new("second"))
            .await
            .unwrap();
        assert_eq!(first, Reference::new("first"));
        assert_eq!(second, Reference::new("first"));

        let record = handler
            .get_action_for_sender("a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.action, Action::Accept);
        assert_eq!(record.reference, Some(Reference::new("first")));
    }

    #[tokio::test]
    async fn test_upsert_fills_missing_reference() {
        let handler = SqliteHandler::in_memory().await.unwrap();
        sqlx::query("INSERT INTO senders (email, action) VALUES ('a@example.com', 'reject')")
            .execute(&handler.pool)
            .await
            .unwrap();

        let stored = handler
            .set_action_for_sender("a@example.com", Action::Confirm, &Reference::new("new"))
            .await
            .unwrap();
        assert_eq!(stored, Reference::new("new"));
    }

    #[tokio::test]
    async fn test_missing_record() {
        let handler = SqliteHandler::in_memory().await.unwrap();
        assert!(
            handler
                .get_action_for_sender("nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_lookup_is_exact() {
        let handler = SqliteHandler::in_memory().await.unwrap();
        handler
            .set_action_for_sender("A@Example.com", Action::Reject, &Reference::new("r"))
            .await
            .unwrap();

        assert!(
            handler
                .get_action_for_sender("a@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unknown_stored_action_is_an_error() {
        let handler = SqliteHandler::in_memory().await.unwrap();
        sqlx::query("INSERT INTO senders (email, action) VALUES ('a@example.com', 'maybe')")
            .execute(&handler.pool)
            .await
            .unwrap();

        let err = handler
            .get_action_for_sender("a@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::UnknownAction(_)));
    }

    #[tokio::test]
    async fn test_patterns_in_declaration_order() {
        let handler = SqliteHandler::in_memory().await.unwrap();
        handler
            .add_pattern(&PatternRule::new("a@.*", Action::Reject))
            .await
            .unwrap();
        handler
            .add_pattern(&PatternRule::new(".*", Action::Accept).with_reference("any"))
            .await
            .unwrap();

        let patterns = handler.get_patterns().await.unwrap();
        assert_eq!(
            patterns,
            vec![
                PatternRule::new("a@.*", Action::Reject),
                PatternRule::new(".*", Action::Accept).with_reference("any"),
            ]
        );
    }

    #[tokio::test]
    async fn test_stash_take_and_peek() {
        let handler = SqliteHandler::in_memory().await.unwrap();
        let recipients = vec!["x@y.com".to_string(), "z@y.com".to_string()];

        let first = handler
            .stash_message_for_sender("a@example.com", "one", &recipients)
            .await
            .unwrap();
        let second = handler
            .stash_message_for_sender("a@example.com", "two", &[])
            .await
            .unwrap();
        assert_eq!(handler.stash_count("a@example.com").await.unwrap(), 2);

        let ids = handler.stashed_ids_for_sender("a@example.com").await.unwrap();
        assert_eq!(ids, vec![first, second]);

        let peeked = handler.peek_stashed(first).await.unwrap().unwrap();
        assert_eq!(peeked, StashEntry::new("one", recipients.clone()));

        let taken = handler.take_stashed(first).await.unwrap().unwrap();
        assert_eq!(taken, StashEntry::new("one", recipients));
        assert!(handler.take_stashed(first).await.unwrap().is_none());

        assert!(handler.remove_stashed(second).await.unwrap());
        assert_eq!(handler.stash_count("a@example.com").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_sender() {
        let handler = SqliteHandler::in_memory().await.unwrap();
        handler
            .set_action_for_sender("a@example.com", Action::Accept, &Reference::new("r"))
            .await
            .unwrap();

        assert!(handler.clear_sender("a@example.com").await.unwrap());
        assert!(!handler.clear_sender("a@example.com").await.unwrap());
    }
}
