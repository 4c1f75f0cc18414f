use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::error;

use crate::config::AppConfig;

/// Primary key type shared by every table.
pub type DbId = i64;

/// Failure reported by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; `field` names the column.
    #[error("{field} already taken")]
    Conflict { field: &'static str },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

/// Maps unique violations (SQLSTATE 23505) on the `uq_*` constraints to
/// [`StoreError::Conflict`] and pool exhaustion to [`StoreError::Unavailable`].
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let field = match db_err.constraint() {
                Some("uq_users_username") => Some("username"),
                Some("uq_users_email") => Some("email"),
                _ => None,
            };
            if let Some(field) = field {
                return StoreError::Conflict { field };
            }
            error!(constraint = ?db_err.constraint(), "unexpected unique violation");
        }
    }
    if matches!(err, sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) {
        return StoreError::Unavailable(err.to_string());
    }
    StoreError::Database(err)
}

/// Builds a `LIKE` pattern matching `needle` anywhere, with wildcards escaped.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
