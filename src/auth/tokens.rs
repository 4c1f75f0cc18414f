//! Opaque bearer tokens: issuance with reuse, verification with lazy expiry,
//! rotation and revocation.
//!
//! A code is 32 bytes from the OS RNG, base64url-encoded without padding. It
//! carries no user data; the owning user and the expiry live in the store.

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error, warn};

use super::repo::{Token, TokenStore};
use crate::db::{DbId, StoreError};

const CODE_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token not found")]
    NotFound,

    #[error("Error while verifying token")]
    VerificationFailed,

    #[error("Token expired")]
    Expired,

    #[error("Error while creating token: {0}")]
    Creation(#[source] StoreError),

    #[error("token lookup failed: {0}")]
    Store(#[source] StoreError),
}

#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// A fresh, not yet stored token for `user_id`, valid for the configured TTL.
    pub fn mint(&self, user_id: DbId) -> Token {
        self.mint_at(user_id, OffsetDateTime::now_utc())
    }

    fn mint_at(&self, user_id: DbId, now: OffsetDateTime) -> Token {
        Token {
            code: generate_code(),
            user_id,
            expires_at: now + self.ttl,
            created_at: now,
        }
    }

    /// Returns the user's active token, creating one if none is valid.
    pub async fn issue(&self, user_id: DbId) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let candidate = self.mint_at(user_id, now);
        let token = self
            .store
            .reuse_or_insert(candidate, now)
            .await
            .map_err(|e| {
                error!(error = %e, %user_id, "token issue failed");
                TokenError::Creation(e)
            })?;
        debug!(%user_id, expires_at = %token.expires_at, "token issued");
        Ok(token.code)
    }

    /// Resolves `code` to its owner. With `expected_user_id`, a token owned by
    /// anyone else is reported exactly like an unknown one.
    pub async fn verify(
        &self,
        code: &str,
        expected_user_id: Option<DbId>,
    ) -> Result<DbId, TokenError> {
        if code.is_empty() {
            return Err(TokenError::NotFound);
        }
        let token = self
            .store
            .find_by_code(code)
            .await
            .map_err(TokenError::Store)?
            .ok_or(TokenError::VerificationFailed)?;

        if expected_user_id.is_some_and(|expected| expected != token.user_id) {
            return Err(TokenError::VerificationFailed);
        }

        if OffsetDateTime::now_utc() >= token.expires_at {
            if let Err(e) = self.store.delete_by_code(code).await {
                warn!(error = %e, user_id = token.user_id, "failed to drop expired token");
            }
            return Err(TokenError::Expired);
        }
        Ok(token.user_id)
    }

    /// Revokes every token of the user and issues a fresh one.
    pub async fn rotate(&self, user_id: DbId) -> Result<String, TokenError> {
        let candidate = self.mint(user_id);
        let token = self.store.replace_for_user(candidate).await.map_err(|e| {
            error!(error = %e, %user_id, "token rotation failed");
            TokenError::Creation(e)
        })?;
        debug!(%user_id, "token rotated");
        Ok(token.code)
    }

    pub async fn revoke_all(&self, user_id: DbId) -> Result<bool, TokenError> {
        let removed = self
            .store
            .delete_for_user(user_id)
            .await
            .map_err(TokenError::Store)?;
        debug!(%user_id, removed, "tokens revoked");
        Ok(true)
    }
}

pub fn generate_code() -> String {
    let mut bytes = [0u8; CODE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}
