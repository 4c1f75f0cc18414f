use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::db::{like_pattern, DbId, StoreError};

/// Width of the duration search window on either side, in seconds.
pub const DURATION_TOLERANCE_SECS: i32 = 10;

#[derive(Debug, Clone, FromRow)]
pub struct Video {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub source: String,
    pub duration: Option<i32>,
    pub views: i64,
    pub enabled: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub user_id: DbId,
    pub name: String,
    pub source: String,
    pub duration: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub user_id: Option<DbId>,
    /// Substring match on `name`.
    pub name: Option<String>,
    /// Matches durations within [`DURATION_TOLERANCE_SECS`] of this value.
    pub duration: Option<i32>,
}

impl VideoFilter {
    pub fn duration_range(&self) -> Option<(i32, i32)> {
        self.duration.map(|d| {
            (
                d.saturating_sub(DURATION_TOLERANCE_SECS),
                d.saturating_add(DURATION_TOLERANCE_SECS),
            )
        })
    }
}

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn insert(&self, new: NewVideo) -> Result<Video, StoreError>;
    async fn find_by_id(&self, id: DbId) -> Result<Option<Video>, StoreError>;
    /// Stored file paths of every video the user owns.
    async fn sources_for_user(&self, user_id: DbId) -> Result<Vec<String>, StoreError>;
    async fn rename(&self, id: DbId, name: &str) -> Result<Option<Video>, StoreError>;
    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;
    async fn count(&self, filter: &VideoFilter) -> Result<i64, StoreError>;
    async fn list(
        &self,
        filter: &VideoFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Video>, StoreError>;
}

#[derive(Clone)]
pub struct PgVideoRepo {
    db: PgPool,
}

impl PgVideoRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const VIDEO_COLUMNS: &str = "id, user_id, name, source, duration, views, enabled, created_at";

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &VideoFilter) {
    qb.push(" WHERE TRUE");
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(name) = &filter.name {
        qb.push(" AND name LIKE ").push_bind(like_pattern(name));
    }
    if let Some((low, high)) = filter.duration_range() {
        qb.push(" AND duration BETWEEN ")
            .push_bind(low)
            .push(" AND ")
            .push_bind(high);
    }
}

#[async_trait]
impl VideoStore for PgVideoRepo {
    async fn insert(&self, new: NewVideo) -> Result<Video, StoreError> {
        let video = sqlx::query_as::<_, Video>(&format!(
            r#"
            INSERT INTO videos (user_id, name, source, duration)
            VALUES ($1, $2, $3, $4)
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.source)
        .bind(new.duration)
        .fetch_one(&self.db)
        .await?;
        Ok(video)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Video>, StoreError> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(video)
    }

    async fn sources_for_user(&self, user_id: DbId) -> Result<Vec<String>, StoreError> {
        let sources = sqlx::query_scalar::<_, String>("SELECT source FROM videos WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(sources)
    }

    async fn rename(&self, id: DbId, name: &str) -> Result<Option<Video>, StoreError> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "UPDATE videos SET name = $2 WHERE id = $1 RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(video)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count(&self, filter: &VideoFilter) -> Result<i64, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM videos");
        push_filter(&mut qb, filter);
        let total = qb.build_query_scalar::<i64>().fetch_one(&self.db).await?;
        Ok(total)
    }

    async fn list(
        &self,
        filter: &VideoFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Video>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {VIDEO_COLUMNS} FROM videos"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let videos = qb.build_query_as::<Video>().fetch_all(&self.db).await?;
        Ok(videos)
    }
}
