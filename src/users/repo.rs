use async_trait::async_trait;
use sqlx::{postgres::PgArguments, query::QueryAs, FromRow, PgPool, Postgres};
use time::OffsetDateTime;

use crate::{
    auth::repo::{Token, INSERT_TOKEN},
    db::{classify, like_pattern, DbId, StoreError},
};

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub pseudo: Option<String>,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never serialized
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub pseudo: Option<String>,
    pub email: String,
    pub password_hash: String,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub pseudo: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.pseudo.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Substring match on `pseudo`.
    pub pseudo: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    /// Lookup by username or email.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError>;
    async fn find_many(&self, ids: &[DbId]) -> Result<Vec<User>, StoreError>;
    /// Applies `patch` and replaces every token of the user with `token`,
    /// committing both or neither. `None` when the user does not exist.
    async fn update_and_rotate(
        &self,
        id: DbId,
        patch: UserPatch,
        token: Token,
    ) -> Result<Option<User>, StoreError>;
    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;
    async fn count(&self, filter: &UserFilter) -> Result<i64, StoreError>;
    async fn list(
        &self,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str = "id, username, pseudo, email, password_hash, created_at";

const UPDATE_USER: &str = r#"
    UPDATE users
       SET username      = COALESCE($2, username),
           pseudo        = COALESCE($3, pseudo),
           email         = COALESCE($4, email),
           password_hash = COALESCE($5, password_hash)
     WHERE id = $1
    RETURNING id, username, pseudo, email, password_hash, created_at
"#;

fn bind_patch<'q>(
    query: QueryAs<'q, Postgres, User, PgArguments>,
    id: DbId,
    patch: &'q UserPatch,
) -> QueryAs<'q, Postgres, User, PgArguments> {
    query
        .bind(id)
        .bind(&patch.username)
        .bind(&patch.pseudo)
        .bind(&patch.email)
        .bind(&patch.password_hash)
}

#[async_trait]
impl UserStore for PgUserRepo {
    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, pseudo, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.username)
        .bind(&new.pseudo)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(classify)?;
        Ok(user)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = lower($1) LIMIT 1"
        ))
        .bind(login)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_many(&self, ids: &[DbId]) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn update_and_rotate(
        &self,
        id: DbId,
        patch: UserPatch,
        token: Token,
    ) -> Result<Option<User>, StoreError> {
        let mut tx = self.db.begin().await?;

        let Some(user) = bind_patch(sqlx::query_as::<_, User>(UPDATE_USER), id, &patch)
            .fetch_optional(&mut *tx)
            .await
            .map_err(classify)?
        else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(INSERT_TOKEN)
            .bind(&token.code)
            .bind(token.user_id)
            .bind(token.expires_at)
            .bind(token.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(user))
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        // tokens, videos and comments go with the user (ON DELETE CASCADE)
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count(&self, filter: &UserFilter) -> Result<i64, StoreError> {
        let pattern = filter.pseudo.as_deref().map(like_pattern);
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR pseudo LIKE $1)",
        )
        .bind(pattern)
        .fetch_one(&self.db)
        .await?;
        Ok(total)
    }

    async fn list(
        &self,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, StoreError> {
        let pattern = filter.pseudo.as_deref().map(like_pattern);
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::TEXT IS NULL OR pseudo LIKE $1)
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }
}
