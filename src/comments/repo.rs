use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::db::{DbId, StoreError};

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: DbId,
    pub body: String,
    pub video_id: DbId,
    pub user_id: DbId,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub body: String,
    pub video_id: DbId,
    pub user_id: DbId,
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert(&self, new: NewComment) -> Result<Comment, StoreError>;
    async fn count_for_video(&self, video_id: DbId) -> Result<i64, StoreError>;
    /// Oldest first.
    async fn list_for_video(
        &self,
        video_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, StoreError>;
}

#[derive(Clone)]
pub struct PgCommentRepo {
    db: PgPool,
}

impl PgCommentRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentStore for PgCommentRepo {
    async fn insert(&self, new: NewComment) -> Result<Comment, StoreError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (body, video_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, body, video_id, user_id, created_at
            "#,
        )
        .bind(&new.body)
        .bind(new.video_id)
        .bind(new.user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(comment)
    }

    async fn count_for_video(&self, video_id: DbId) -> Result<i64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }

    async fn list_for_video(
        &self,
        video_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, StoreError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, body, video_id, user_id, created_at
            FROM comments
            WHERE video_id = $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(video_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(comments)
    }
}
