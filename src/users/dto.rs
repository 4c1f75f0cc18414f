use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::User;
use crate::db::DbId;

/// User as returned to clients. `email` is only present on views of the
/// caller's own account.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: DbId,
    pub username: String,
    pub pseudo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserView {
    pub fn public(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            pseudo: user.pseudo,
            email: None,
            created_at: user.created_at,
        }
    }

    pub fn private(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            pseudo: user.pseudo,
            email: Some(user.email),
            created_at: user.created_at,
        }
    }
}

/// Owner/author block embedded in video and comment payloads.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: DbId,
    pub username: String,
    pub pseudo: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            pseudo: user.pseudo.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub pseudo: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedUser {
    pub token: String,
    pub user: UserView,
}

/// `GET /users` filters; paging comes from [`crate::pagination::PageQuery`].
#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    pub pseudo: Option<String>,
}
