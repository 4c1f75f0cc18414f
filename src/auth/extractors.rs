use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::tokens::TokenError;
use crate::{
    db::DbId,
    error::{AppError, AppResult},
    state::AppState,
};

/// Any request carrying a valid token. Holds the token owner's id.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub DbId);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let code = token_code(&parts.headers).ok_or(TokenError::NotFound)?;
        let user_id = state.tokens.verify(code, None).await.map_err(|e| {
            warn!(error = %e, "token rejected");
            e
        })?;
        Ok(AuthUser(user_id))
    }
}

/// A valid token whose owner is the user named by the `:id` path segment.
/// Authentication failures stay 401; a different owner is 403.
#[derive(Debug, Clone, Copy)]
pub struct OwnUser(pub DbId);

#[async_trait]
impl FromRequestParts<AppState> for OwnUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        let Path(target) = Path::<DbId>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Validation("Invalid user id".into()))?;
        ensure_owner(user_id, target)?;
        Ok(OwnUser(user_id))
    }
}

pub fn ensure_owner(actor: DbId, owner: DbId) -> AppResult<()> {
    if actor != owner {
        warn!(actor, owner, "ownership check failed");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Token code from the `Authorization` header. A `Bearer` scheme prefix is
/// stripped; a bare value is taken as the code itself.
pub(crate) fn token_code(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let code = match raw.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if raw.eq_ignore_ascii_case("bearer") => "",
        _ => raw,
    };
    (!code.is_empty()).then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn strips_bearer_prefix() {
        assert_eq!(token_code(&headers("Bearer abc")), Some("abc"));
        assert_eq!(token_code(&headers("bearer  abc ")), Some("abc"));
    }

    #[test]
    fn accepts_raw_code() {
        assert_eq!(token_code(&headers("abc-123_x")), Some("abc-123_x"));
    }

    #[test]
    fn missing_or_blank_header_yields_none() {
        assert_eq!(token_code(&HeaderMap::new()), None);
        assert_eq!(token_code(&headers("   ")), None);
        assert_eq!(token_code(&headers("Bearer ")), None);
    }

    #[test]
    fn owner_check() {
        assert!(ensure_owner(3, 3).is_ok());
        assert!(matches!(ensure_owner(3, 4), Err(AppError::Forbidden)));
    }
}
