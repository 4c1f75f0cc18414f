use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{RenameVideoRequest, VideoSearch, VideoUpload, VideoView},
    services,
};
use crate::{
    auth::extractors::{AuthUser, OwnUser},
    db::DbId,
    error::{AppError, AppResult},
    extract::{JsonBody, Params, PathParam},
    pagination::PageQuery,
    response::ApiResponse,
    state::AppState,
};

pub fn video_routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/videos", get(search_videos))
        .route("/user/:id/videos", get(list_user_videos))
        .route(
            "/user/:id/video",
            post(upload_video).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/video/:id", put(rename_video).delete(delete_video))
}

#[instrument(skip(state))]
pub async fn search_videos(
    State(state): State<AppState>,
    Params(search): Params<VideoSearch>,
    Params(page): Params<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<VideoView>>>> {
    let page = services::search_videos(&state, search, page).await?;
    Ok(Json(page.into()))
}

#[instrument(skip(state))]
pub async fn list_user_videos(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    PathParam(user_id): PathParam<DbId>,
    Params(page): Params<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<VideoView>>>> {
    let page = services::list_user_videos(&state, user_id, page).await?;
    Ok(Json(page.into()))
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))
}

/// POST /user/:id/video (multipart: `name`, `source`)
#[instrument(skip(state, mp))]
pub async fn upload_video(
    State(state): State<AppState>,
    OwnUser(user_id): OwnUser,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<VideoView>>)> {
    let mut mp = mp.map_err(|e| AppError::Validation(e.body_text()))?;
    let mut upload = VideoUpload::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("name") => upload.name = Some(read_text(field).await?),
            Some("source") => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                upload.body = Some(data);
            }
            _ => {}
        }
    }

    let video = services::upload_video(&state, user_id, upload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(video))))
}

#[instrument(skip(state, payload))]
pub async fn rename_video(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(id): PathParam<DbId>,
    JsonBody(payload): JsonBody<RenameVideoRequest>,
) -> AppResult<Json<ApiResponse<VideoView>>> {
    let video = services::rename_video(&state, caller, id, payload.name).await?;
    Ok(Json(ApiResponse::ok(video)))
}

#[instrument(skip(state))]
pub async fn delete_video(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(id): PathParam<DbId>,
) -> AppResult<Json<ApiResponse<()>>> {
    services::delete_video(&state, caller, id).await?;
    Ok(Json(ApiResponse::ok(())))
}
