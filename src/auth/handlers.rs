use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    services,
};
use crate::{
    error::AppResult, extract::JsonBody, response::ApiResponse, state::AppState, users,
    users::dto::UserView,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user", post(register))
        .route("/auth", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserView>>)> {
    let user = users::services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserView::private(user))),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let (token, user) = services::login(&state, payload).await?;
    Ok(Json(ApiResponse::ok(AuthResponse {
        token,
        user: UserView::private(user),
    })))
}
