use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CommentView, NewCommentRequest},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    db::DbId,
    error::AppResult,
    extract::{JsonBody, Params, PathParam},
    pagination::PageQuery,
    response::ApiResponse,
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/video/:id/comment", post(add_comment))
        .route("/video/:id/comments", get(list_comments))
}

#[instrument(skip(state, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(video_id): PathParam<DbId>,
    JsonBody(payload): JsonBody<NewCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CommentView>>)> {
    let comment = services::add_comment(&state, caller, video_id, payload.body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(comment))))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    PathParam(video_id): PathParam<DbId>,
    Params(page): Params<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<CommentView>>>> {
    let page = services::list_comments(&state, video_id, page).await?;
    Ok(Json(page.into()))
}
