//! Identity store used by the credential issuer.
//!
//! The issuer only needs lookups by id and by login identifier plus a
//! conflict-aware insert. `PgUserStore` backs deployments; `MemoryUserStore`
//! serves local runs without a DSN and the test suites.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::RwLock;
use tracing::Instrument;
use uuid::Uuid;

use crate::types::UserSnapshot;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Stored identity: public snapshot plus the password hash.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub user: UserSnapshot,
    pub password_hash: String,
}

/// Outcome when attempting to create a new identity.
#[derive(Debug)]
pub enum InsertOutcome {
    Created(UserRecord),
    Conflict,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new active identity; username and email must both be unused.
    async fn insert(&self, username: &str, email: &str, password_hash: &str)
        -> Result<InsertOutcome>;

    /// Look up by exact username, or by normalized email.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>>;

    /// Enable or disable an identity. Returns false when the id is unknown.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool>;
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<InsertOutcome> {
        let mut users = self
            .users
            .write()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;

        if users
            .iter()
            .any(|record| record.user.username == username || record.user.email == email)
        {
            return Ok(InsertOutcome::Conflict);
        }

        let now = Utc::now();
        let record = UserRecord {
            user: UserSnapshot {
                id: Uuid::new_v4(),
                username: username.to_string(),
                email: email.to_string(),
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            password_hash: password_hash.to_string(),
        };
        users.push(record.clone());
        Ok(InsertOutcome::Created(record))
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        let email = identifier.trim().to_lowercase();
        Ok(users
            .iter()
            .find(|record| record.user.username == identifier)
            .or_else(|| users.iter().find(|record| record.user.email == email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        Ok(users.iter().find(|record| record.user.id == id).cloned())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool> {
        let mut users = self
            .users
            .write()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        match users.iter_mut().find(|record| record.user.id == id) {
            Some(record) => {
                record.user.is_active = active;
                record.user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table when missing.
    ///
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        for (index, statement) in SCHEMA_SQL
            .split(';')
            .map(str::trim)
            .filter(|statement| !statement.is_empty())
            .enumerate()
        {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
        }
        Ok(())
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_active, created_at, updated_at";

fn user_from_row(row: &PgRow) -> Result<UserRecord> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
    Ok(UserRecord {
        user: UserSnapshot {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            is_active: row.try_get("is_active")?,
            created_at,
            updated_at,
        },
        password_hash: row.try_get("password_hash")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<InsertOutcome> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(InsertOutcome::Created(user_from_row(&row)?)),
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>> {
        // Exact username wins over an email match.
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = lower(trim($1)) \
             ORDER BY (username = $1) DESC LIMIT 1"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by identifier")?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by id")?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool> {
        let query = "UPDATE users SET is_active = $2, updated_at = now() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update user status")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_rejects_duplicate_username_or_email() {
        let store = MemoryUserStore::new();
        assert!(matches!(
            store.insert("johndoe", "john@example.com", "hash").await.unwrap(),
            InsertOutcome::Created(_)
        ));
        assert!(matches!(
            store.insert("johndoe", "other@example.com", "hash").await.unwrap(),
            InsertOutcome::Conflict
        ));
        assert!(matches!(
            store.insert("janedoe", "john@example.com", "hash").await.unwrap(),
            InsertOutcome::Conflict
        ));
    }

    #[tokio::test]
    async fn identifier_matches_username_or_email() {
        let store = MemoryUserStore::new();
        store.insert("johndoe", "john@example.com", "hash").await.unwrap();

        let by_name = store.find_by_identifier("johndoe").await.unwrap().unwrap();
        let by_email = store
            .find_by_identifier(" John@Example.com ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.user.id, by_email.user.id);
        assert!(store.find_by_identifier("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_active_toggles_flag() {
        let store = MemoryUserStore::new();
        let InsertOutcome::Created(record) =
            store.insert("johndoe", "john@example.com", "hash").await.unwrap()
        else {
            panic!("expected insert to succeed");
        };

        assert!(store.set_active(record.user.id, false).await.unwrap());
        let stored = store.find_by_id(record.user.id).await.unwrap().unwrap();
        assert!(!stored.user.is_active);
        assert!(!store.set_active(Uuid::new_v4(), false).await.unwrap());
    }

    #[test]
    fn schema_creates_users_table() {
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS users"));
    }

    #[test]
    fn schema_indexes_identities_only_through_unique_constraints() {
        assert!(SCHEMA_SQL.contains("username text NOT NULL UNIQUE"));
        assert!(SCHEMA_SQL.contains("email text NOT NULL UNIQUE"));
        assert!(!SCHEMA_SQL.to_uppercase().contains("CREATE INDEX"));
    }
}
