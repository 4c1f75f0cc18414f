use std::{collections::HashMap, path::Path};

use tracing::{info, instrument, warn};

use super::{
    dto::{UpdateUserRequest, UserSearch, UserSummary},
    repo::{NewUser, User, UserFilter, UserPatch},
    validate::{
        normalize_email, normalize_pseudo, validate_email, validate_password, validate_pseudo,
        validate_username,
    },
};
use crate::{
    auth::{dto::RegisterRequest, password::hash_password_blocking},
    db::DbId,
    error::{AppError, AppResult},
    pagination::{PageQuery, PageWindow, Paged},
    state::AppState,
};

#[instrument(skip(state, req), fields(username = %req.username))]
pub async fn register(state: &AppState, req: RegisterRequest) -> AppResult<User> {
    let username = req.username.trim().to_string();
    let pseudo = normalize_pseudo(req.pseudo);
    let email = normalize_email(&req.email);

    validate_username(&username)?;
    if let Some(p) = &pseudo {
        validate_pseudo(p)?;
    }
    validate_email(&email)?;
    validate_password(&req.password)?;

    let password_hash = hash_password_blocking(req.password).await?;
    let user = state
        .users
        .insert(NewUser {
            username,
            pseudo,
            email,
            password_hash,
        })
        .await?;

    info!(user_id = user.id, "user registered");
    Ok(user)
}

pub async fn get_user(state: &AppState, id: DbId) -> AppResult<User> {
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::UserNotFound)
}

/// Applies the supplied fields and rotates the user's token in the same
/// transaction, so sessions opened before the change stop working. Returns
/// the fresh token.
#[instrument(skip(state, req))]
pub async fn update_user(
    state: &AppState,
    id: DbId,
    req: UpdateUserRequest,
) -> AppResult<(String, User)> {
    let mut patch = UserPatch::default();

    if let Some(username) = req.username {
        let username = username.trim().to_string();
        validate_username(&username)?;
        patch.username = Some(username);
    }
    if let Some(pseudo) = normalize_pseudo(req.pseudo) {
        validate_pseudo(&pseudo)?;
        patch.pseudo = Some(pseudo);
    }
    if let Some(email) = req.email {
        let email = normalize_email(&email);
        validate_email(&email)?;
        patch.email = Some(email);
    }
    if let Some(password) = req.password {
        validate_password(&password)?;
        patch.password_hash = Some(hash_password_blocking(password).await?);
    }
    if patch.is_empty() {
        return Err(AppError::NothingToUpdate);
    }

    let token = state.tokens.mint(id);
    let code = token.code.clone();
    let user = state
        .users
        .update_and_rotate(id, patch, token)
        .await?
        .ok_or(AppError::UserNotFound)?;

    info!(user_id = id, "user updated");
    Ok((code, user))
}

/// Deletes the account. Videos, comments and tokens go with the row; the
/// uploaded files are removed afterwards, best-effort.
#[instrument(skip(state))]
pub async fn delete_user(state: &AppState, id: DbId) -> AppResult<()> {
    let sources = state.videos.sources_for_user(id).await?;
    if !state.users.delete(id).await? {
        return Err(AppError::UserNotFound);
    }
    state.tokens.revoke_all(id).await?;

    for source in &sources {
        if let Err(e) = state.storage.delete_object(Path::new(source)).await {
            warn!(error = %e, user_id = id, "video file not removed");
        }
    }
    info!(user_id = id, videos = sources.len(), "user deleted");
    Ok(())
}

pub async fn search_users(
    state: &AppState,
    search: UserSearch,
    page: PageQuery,
) -> AppResult<Paged<User>> {
    let filter = UserFilter {
        pseudo: search.pseudo.filter(|p| !p.is_empty()),
    };
    let total = state.users.count(&filter).await?;
    let window = PageWindow::for_query(page, total)?;
    let users = state
        .users
        .list(&filter, window.limit(), window.offset)
        .await?;
    window.into_page(users)
}

/// Summaries for the given user ids, keyed by id.
pub async fn summaries(state: &AppState, ids: &[DbId]) -> AppResult<HashMap<DbId, UserSummary>> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = state.users.find_many(&ids).await?;
    Ok(users.iter().map(|u| (u.id, UserSummary::from(u))).collect())
}
