use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::Video;
use crate::{db::DbId, users::dto::UserSummary};

/// Resolutions advertised in `format`. Every entry points at the uploaded
/// source until transcoding exists.
pub const FORMATS: [&str; 6] = ["1080", "720", "480", "360", "240", "144"];

#[derive(Debug, Serialize)]
pub struct VideoView {
    pub id: DbId,
    pub name: String,
    pub source: String,
    pub duration: Option<i32>,
    pub views: i64,
    pub enabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: UserSummary,
    pub format: BTreeMap<&'static str, String>,
}

impl VideoView {
    pub fn new(video: Video, user: UserSummary) -> Self {
        let format = FORMATS
            .iter()
            .map(|res| (*res, video.source.clone()))
            .collect();
        Self {
            id: video.id,
            name: video.name,
            source: video.source,
            duration: video.duration,
            views: video.views,
            enabled: video.enabled,
            created_at: video.created_at,
            user,
            format,
        }
    }
}

/// `GET /videos` filters. `user` is a numeric id or a username.
#[derive(Debug, Default, Deserialize)]
pub struct VideoSearch {
    pub name: Option<String>,
    pub user: Option<String>,
    pub duration: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameVideoRequest {
    pub name: Option<String>,
}

/// Multipart upload after field extraction.
#[derive(Debug, Default)]
pub struct VideoUpload {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Bytes>,
}
