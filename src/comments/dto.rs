use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::Comment;
use crate::{db::DbId, users::dto::UserSummary};

#[derive(Debug, Default, Deserialize)]
pub struct NewCommentRequest {
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: DbId,
    pub body: String,
    pub video_id: DbId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: UserSummary,
}

impl CommentView {
    pub fn new(comment: Comment, user: UserSummary) -> Self {
        Self {
            id: comment.id,
            body: comment.body,
            video_id: comment.video_id,
            created_at: comment.created_at,
            user,
        }
    }
}
