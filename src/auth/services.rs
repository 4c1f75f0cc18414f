use tracing::{info, instrument, warn};

use super::{dto::LoginRequest, password::verify_password_blocking};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users::repo::User,
};

/// Checks credentials and hands out the user's active token. An unknown
/// login and a wrong password are indistinguishable to the caller.
#[instrument(skip(state, req))]
pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<(String, User)> {
    let login = req.login.trim();
    if login.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Login and password are required".into()));
    }

    let Some(user) = state.users.find_by_login(login).await? else {
        warn!("login unknown user");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id).await?;
    info!(user_id = user.id, "user logged in");
    Ok((token, user))
}
