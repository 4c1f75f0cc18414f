use tracing::{info, instrument};

use super::{
    dto::CommentView,
    repo::{Comment, NewComment},
};
use crate::{
    db::DbId,
    error::{AppError, AppResult},
    pagination::{PageQuery, PageWindow, Paged},
    state::AppState,
    users,
};

async fn ensure_video(state: &AppState, video_id: DbId) -> AppResult<()> {
    state
        .videos
        .find_by_id(video_id)
        .await?
        .map(|_| ())
        .ok_or(AppError::VideoNotFound)
}

#[instrument(skip(state, body))]
pub async fn add_comment(
    state: &AppState,
    author: DbId,
    video_id: DbId,
    body: Option<String>,
) -> AppResult<CommentView> {
    let body = body
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::Validation("Comment body is required".into()))?;
    ensure_video(state, video_id).await?;
    let user = users::services::get_user(state, author).await?;

    let comment = state
        .comments
        .insert(NewComment {
            body,
            video_id,
            user_id: author,
        })
        .await?;
    info!(comment_id = comment.id, video_id, "comment added");
    Ok(CommentView::new(comment, (&user).into()))
}

pub async fn list_comments(
    state: &AppState,
    video_id: DbId,
    page: PageQuery,
) -> AppResult<Paged<CommentView>> {
    ensure_video(state, video_id).await?;

    let total = state.comments.count_for_video(video_id).await?;
    let window = PageWindow::for_query(page, total)?;
    let comments: Vec<Comment> = state
        .comments
        .list_for_video(video_id, window.limit(), window.offset)
        .await?;
    let page = window.into_page(comments)?;

    let ids: Vec<DbId> = page.items.iter().map(|c| c.user_id).collect();
    let authors = users::services::summaries(state, &ids).await?;
    let mut items = Vec::with_capacity(page.items.len());
    for comment in page.items {
        let author = authors
            .get(&comment.user_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("comment {} has no author", comment.id)))?;
        items.push(CommentView::new(comment, author));
    }
    Ok(Paged {
        items,
        current_page: page.current_page,
        total_pages: page.total_pages,
    })
}
