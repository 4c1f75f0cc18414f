use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::db::{classify, DbId, StoreError};

/// Bearer token row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Token {
    pub code: String,
    pub user_id: DbId,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the owner's unexpired token if there is one, otherwise stores
    /// `candidate`. Expired rows for the owner are dropped on the way.
    async fn reuse_or_insert(
        &self,
        candidate: Token,
        now: OffsetDateTime,
    ) -> Result<Token, StoreError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Token>, StoreError>;

    async fn delete_by_code(&self, code: &str) -> Result<bool, StoreError>;

    async fn delete_for_user(&self, user_id: DbId) -> Result<u64, StoreError>;

    /// Drops every token of `candidate.user_id` and stores `candidate`, atomically.
    async fn replace_for_user(&self, candidate: Token) -> Result<Token, StoreError>;
}

#[derive(Clone)]
pub struct PgTokenRepo {
    db: PgPool,
}

impl PgTokenRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

pub(crate) const INSERT_TOKEN: &str = r#"
    INSERT INTO tokens (code, user_id, expires_at, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING code, user_id, expires_at, created_at
"#;

#[async_trait]
impl TokenStore for PgTokenRepo {
    async fn reuse_or_insert(
        &self,
        candidate: Token,
        now: OffsetDateTime,
    ) -> Result<Token, StoreError> {
        let mut tx = self.db.begin().await?;

        // Row lock on the owner serialises concurrent logins of the same user.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(candidate.user_id)
            .fetch_optional(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND expires_at <= $2")
            .bind(candidate.user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, Token>(
            r#"
            SELECT code, user_id, expires_at, created_at
            FROM tokens
            WHERE user_id = $1 AND expires_at > $2
            ORDER BY expires_at DESC
            LIMIT 1
            "#,
        )
        .bind(candidate.user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let token = match existing {
            Some(token) => token,
            None => sqlx::query_as::<_, Token>(INSERT_TOKEN)
                .bind(&candidate.code)
                .bind(candidate.user_id)
                .bind(candidate.expires_at)
                .bind(candidate.created_at)
                .fetch_one(&mut *tx)
                .await
                .map_err(classify)?,
        };

        tx.commit().await?;
        Ok(token)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Token>, StoreError> {
        let token = sqlx::query_as::<_, Token>(
            r#"
            SELECT code, user_id, expires_at, created_at
            FROM tokens
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        Ok(token)
    }

    async fn delete_by_code(&self, code: &str) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM tokens WHERE code = $1")
            .bind(code)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: DbId) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }

    async fn replace_for_user(&self, candidate: Token) -> Result<Token, StoreError> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(candidate.user_id)
            .execute(&mut *tx)
            .await?;
        let token = sqlx::query_as::<_, Token>(INSERT_TOKEN)
            .bind(&candidate.code)
            .bind(candidate.user_id)
            .bind(candidate.expires_at)
            .bind(candidate.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(classify)?;
        tx.commit().await?;
        Ok(token)
    }
}
