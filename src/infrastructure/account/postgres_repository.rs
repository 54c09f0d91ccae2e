//! PostgreSQL account repository implementation

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::account::{AccountRecord, AccountRepository};
use crate::domain::{Account, AccountId, DomainError};

const SELECT_COLUMNS: &str = r#"
    SELECT id, email, name, password_hash, login_token, reset_token, deleted,
           extra, created_at, updated_at
    FROM accounts
"#;

/// PostgreSQL implementation of AccountRepository
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn is_live(&self, id: &AccountId) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1 AND NOT deleted)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check account: {}", e)))
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1 AND NOT deleted", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(&format!(
            "{} WHERE email = $1 AND NOT deleted",
            SELECT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get account by email: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn create(&self, mut account: Account) -> Result<Account, DomainError> {
        let record = account.to_record();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, name, password_hash, login_token, reset_token,
                                  deleted, extra, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.password_hash)
        .bind(&record.login_token)
        .bind(&record.reset_token)
        .bind(record.deleted)
        .bind(Json(&record.extra))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("User exists")
            } else {
                DomainError::storage(format!("Failed to create account: {}", e))
            }
        })?;

        account.mark_persisted();
        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<Account, DomainError> {
        let record = account.to_record();

        // Only write if nobody spent or replaced the reset token since we read it
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = $2, name = $3, password_hash = $4, login_token = $5,
                reset_token = $6, deleted = $7, extra = $8, updated_at = $9
            WHERE id = $1 AND NOT deleted AND reset_token IS NOT DISTINCT FROM $10
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.password_hash)
        .bind(&record.login_token)
        .bind(&record.reset_token)
        .bind(record.deleted)
        .bind(Json(&record.extra))
        .bind(record.updated_at)
        .bind(account.persisted_reset_token())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("email exists already")
            } else {
                DomainError::storage(format!("Failed to update account: {}", e))
            }
        })?;

        if result.rows_affected() == 0 {
            if self.is_live(account.id()).await? {
                return Err(DomainError::conflict("account was modified concurrently"));
            }
            return Err(DomainError::not_found(format!(
                "Account '{}' not found",
                account.id()
            )));
        }

        let mut updated = account.clone();
        updated.mark_persisted();
        Ok(updated)
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<Account, DomainError> {
    let column = |e: sqlx::Error| DomainError::storage(format!("Invalid account row: {}", e));

    let id: Uuid = row.try_get("id").map_err(column)?;
    let extra: Json<Map<String, Value>> = row.try_get("extra").map_err(column)?;

    Ok(Account::restore(AccountRecord {
        id: AccountId::from(id),
        email: row.try_get("email").map_err(column)?,
        name: row.try_get("name").map_err(column)?,
        password_hash: row.try_get("password_hash").map_err(column)?,
        login_token: row.try_get("login_token").map_err(column)?,
        reset_token: row.try_get("reset_token").map_err(column)?,
        deleted: row.try_get("deleted").map_err(column)?,
        created_at: row.try_get("created_at").map_err(column)?,
        updated_at: row.try_get("updated_at").map_err(column)?,
        extra: extra.0,
    }))
}
