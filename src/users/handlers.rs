use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{UpdateUserRequest, UpdatedUser, UserSearch, UserView},
    services,
};
use crate::{
    auth::extractors::{AuthUser, OwnUser},
    db::DbId,
    error::AppResult,
    extract::{JsonBody, Params, PathParam},
    pagination::PageQuery,
    response::ApiResponse,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users)).route(
        "/user/:id",
        get(get_user).put(update_user).delete(delete_user),
    )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Params(search): Params<UserSearch>,
    Params(page): Params<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<UserView>>>> {
    let page = services::search_users(&state, search, page).await?;
    Ok(Json(page.map(UserView::public).into()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParam(id): PathParam<DbId>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let user = services::get_user(&state, id).await?;
    let view = if caller == user.id {
        UserView::private(user)
    } else {
        UserView::public(user)
    };
    Ok(Json(ApiResponse::ok(view)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    OwnUser(user_id): OwnUser,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UpdatedUser>>> {
    let (token, user) = services::update_user(&state, user_id, payload).await?;
    Ok(Json(ApiResponse::ok(UpdatedUser {
        token,
        user: UserView::private(user),
    })))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    OwnUser(user_id): OwnUser,
) -> AppResult<Json<ApiResponse<()>>> {
    services::delete_user(&state, user_id).await?;
    Ok(Json(ApiResponse::ok(())))
}
