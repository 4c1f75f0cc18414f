use tracing::{debug, info, instrument, warn};

use super::{
    dto::{VideoSearch, VideoUpload, VideoView},
    repo::{NewVideo, Video, VideoFilter},
};
use crate::{
    auth::extractors::ensure_owner,
    db::DbId,
    error::{AppError, AppResult},
    pagination::{PageQuery, PageWindow, Paged},
    state::AppState,
    users,
};

const MP4: &str = "video/mp4";

/// Resolves the `user` search parameter: digits are an id, anything else a
/// username.
async fn resolve_owner(state: &AppState, user: &str) -> AppResult<DbId> {
    let found = match user.parse::<DbId>() {
        Ok(id) => state.users.find_by_id(id).await?,
        Err(_) => state.users.find_by_username(user).await?,
    };
    found.map(|u| u.id).ok_or(AppError::UserNotFound)
}

async fn with_owners(state: &AppState, page: Paged<Video>) -> AppResult<Paged<VideoView>> {
    let ids: Vec<DbId> = page.items.iter().map(|v| v.user_id).collect();
    let owners = users::services::summaries(state, &ids).await?;

    let mut items = Vec::with_capacity(page.items.len());
    for video in page.items {
        let owner = owners
            .get(&video.user_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("video {} has no owner", video.id)))?;
        items.push(VideoView::new(video, owner));
    }
    Ok(Paged {
        items,
        current_page: page.current_page,
        total_pages: page.total_pages,
    })
}

async fn view(state: &AppState, video: Video) -> AppResult<VideoView> {
    let owner = users::services::get_user(state, video.user_id).await?;
    Ok(VideoView::new(video, (&owner).into()))
}

async fn list_filtered(
    state: &AppState,
    filter: VideoFilter,
    page: PageQuery,
) -> AppResult<Paged<VideoView>> {
    let total = state.videos.count(&filter).await?;
    let window = PageWindow::for_query(page, total)?;
    let videos = state
        .videos
        .list(&filter, window.limit(), window.offset)
        .await?;
    with_owners(state, window.into_page(videos)?).await
}

pub async fn search_videos(
    state: &AppState,
    search: VideoSearch,
    page: PageQuery,
) -> AppResult<Paged<VideoView>> {
    let user_id = match search.user.as_deref().map(str::trim) {
        Some(user) if !user.is_empty() => Some(resolve_owner(state, user).await?),
        _ => None,
    };
    let filter = VideoFilter {
        user_id,
        name: search.name.filter(|n| !n.is_empty()),
        duration: search.duration,
    };
    list_filtered(state, filter, page).await
}

pub async fn list_user_videos(
    state: &AppState,
    user_id: DbId,
    page: PageQuery,
) -> AppResult<Paged<VideoView>> {
    users::services::get_user(state, user_id).await?;
    let filter = VideoFilter {
        user_id: Some(user_id),
        ..Default::default()
    };
    list_filtered(state, filter, page).await
}

/// Stores the file, probes it for a duration and records the video. The
/// stored file is removed again if the record cannot be written.
#[instrument(skip(state, upload), fields(name = ?upload.name))]
pub async fn upload_video(
    state: &AppState,
    user_id: DbId,
    upload: VideoUpload,
) -> AppResult<VideoView> {
    let body = upload
        .body
        .filter(|b| !b.is_empty())
        .ok_or(AppError::MissingUploadField("source"))?;
    let name = upload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(AppError::MissingUploadField("name"))?;
    if upload.content_type.as_deref() != Some(MP4) {
        return Err(AppError::UnsupportedFormat);
    }

    let owner = users::services::get_user(state, user_id).await?;

    let file_name = upload.file_name.unwrap_or_else(|| "video.mp4".into());
    let path = state
        .storage
        .put_object(&file_name, body)
        .await
        .map_err(|e| AppError::Internal(format!("store upload: {e:#}")))?;

    let duration = match state.probe.probe(&path).await {
        Some(info) => {
            debug!(width = info.width, height = info.height, "probed upload");
            Some(info.duration_secs())
        }
        None => {
            warn!(path = %path.display(), "duration unavailable");
            None
        }
    };

    let inserted = state
        .videos
        .insert(NewVideo {
            user_id,
            name,
            source: path.to_string_lossy().into_owned(),
            duration,
        })
        .await;
    let video = match inserted {
        Ok(video) => video,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete_object(&path).await {
                warn!(error = %cleanup, "orphaned upload left on disk");
            }
            return Err(e.into());
        }
    };

    info!(video_id = video.id, user_id, "video uploaded");
    Ok(VideoView::new(video, (&owner).into()))
}

#[instrument(skip(state))]
pub async fn rename_video(
    state: &AppState,
    actor: DbId,
    id: DbId,
    name: Option<String>,
) -> AppResult<VideoView> {
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(AppError::NothingToUpdate)?;

    let video = state
        .videos
        .find_by_id(id)
        .await?
        .ok_or(AppError::VideoNotFound)?;
    ensure_owner(actor, video.user_id)?;

    let video = state
        .videos
        .rename(id, &name)
        .await?
        .ok_or(AppError::VideoNotFound)?;
    view(state, video).await
}

#[instrument(skip(state))]
pub async fn delete_video(state: &AppState, actor: DbId, id: DbId) -> AppResult<()> {
    let video = state
        .videos
        .find_by_id(id)
        .await?
        .ok_or(AppError::VideoNotFound)?;
    ensure_owner(actor, video.user_id)?;

    if !state.videos.delete(id).await? {
        return Err(AppError::VideoNotFound);
    }
    if let Err(e) = state
        .storage
        .delete_object(std::path::Path::new(&video.source))
        .await
    {
        warn!(error = %e, video_id = id, "video file not removed");
    }
    info!(video_id = id, "video deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_state, mp4_upload, FAKE_DURATION_SECS};

    #[tokio::test]
    async fn upload_records_probed_duration_and_owner() {
        let (state, store) = fake_state();
        let owner = store.seed_user("alice");

        let view = upload_video(&state, owner, mp4_upload("holiday"))
            .await
            .unwrap();
        assert_eq!(view.name, "holiday");
        assert_eq!(view.duration, Some(FAKE_DURATION_SECS));
        assert_eq!(view.user.id, owner);
        assert_eq!(view.format.len(), 6);
        assert_eq!(view.format["720"], view.source);
    }

    #[tokio::test]
    async fn upload_checks_source_then_name_then_type() {
        let (state, store) = fake_state();
        let owner = store.seed_user("alice");

        let mut upload = mp4_upload("clip");
        upload.body = None;
        upload.name = None;
        let err = upload_video(&state, owner, upload).await.unwrap_err();
        assert!(matches!(err, AppError::MissingUploadField("source")));
        assert_eq!(err.code(), 1002);

        let mut upload = mp4_upload("clip");
        upload.name = Some("  ".into());
        let err = upload_video(&state, owner, upload).await.unwrap_err();
        assert!(matches!(err, AppError::MissingUploadField("name")));

        let mut upload = mp4_upload("clip");
        upload.content_type = Some("video/webm".into());
        let err = upload_video(&state, owner, upload).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat));
        assert_eq!(err.code(), 1003);
    }

    #[tokio::test]
    async fn upload_for_missing_user_fails() {
        let (state, _store) = fake_state();
        let err = upload_video(&state, 999, mp4_upload("clip"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn rename_requires_name_then_video_then_ownership() {
        let (state, store) = fake_state();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");
        let video = upload_video(&state, alice, mp4_upload("clip")).await.unwrap();

        let err = rename_video(&state, alice, video.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::NothingToUpdate));

        let err = rename_video(&state, alice, 999, Some("x".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::VideoNotFound));

        let err = rename_video(&state, bob, video.id, Some("mine now".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let renamed = rename_video(&state, alice, video.id, Some("final cut".into()))
            .await
            .unwrap();
        assert_eq!(renamed.name, "final cut");
    }

    #[tokio::test]
    async fn delete_is_owner_only() {
        let (state, store) = fake_state();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");
        let video = upload_video(&state, alice, mp4_upload("clip")).await.unwrap();

        let err = delete_video(&state, bob, video.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        delete_video(&state, alice, video.id).await.unwrap();
        let err = delete_video(&state, alice, video.id).await.unwrap_err();
        assert!(matches!(err, AppError::VideoNotFound));
    }

    #[tokio::test]
    async fn search_by_user_name_and_duration() {
        let (state, store) = fake_state();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");
        upload_video(&state, alice, mp4_upload("cat video")).await.unwrap();
        upload_video(&state, alice, mp4_upload("dog video")).await.unwrap();
        upload_video(&state, bob, mp4_upload("cat again")).await.unwrap();

        let by_name = search_videos(
            &state,
            VideoSearch {
                name: Some("cat".into()),
                ..Default::default()
            },
            PageQuery::default(),
        )
        .await
        .unwrap();
        assert_eq!(by_name.items.len(), 2);

        for user in [alice.to_string(), "alice".to_string()] {
            let page = search_videos(
                &state,
                VideoSearch {
                    user: Some(user),
                    ..Default::default()
                },
                PageQuery::default(),
            )
            .await
            .unwrap();
            assert_eq!(page.items.len(), 2);
            assert!(page.items.iter().all(|v| v.user.id == alice));
        }

        let near = search_videos(
            &state,
            VideoSearch {
                duration: Some(FAKE_DURATION_SECS + 10),
                ..Default::default()
            },
            PageQuery::default(),
        )
        .await
        .unwrap();
        assert_eq!(near.items.len(), 3);

        let far = search_videos(
            &state,
            VideoSearch {
                duration: Some(FAKE_DURATION_SECS + 11),
                ..Default::default()
            },
            PageQuery::default(),
        )
        .await
        .unwrap();
        assert!(far.items.is_empty());
        assert_eq!(far.total_pages, 0);

        let err = search_videos(
            &state,
            VideoSearch {
                user: Some("nobody".into()),
                ..Default::default()
            },
            PageQuery::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn user_listing_paginates() {
        let (state, store) = fake_state();
        let alice = store.seed_user("alice");
        for i in 0..3 {
            upload_video(&state, alice, mp4_upload(&format!("clip {i}")))
                .await
                .unwrap();
        }

        let page = list_user_videos(&state, alice, PageQuery { page: 2, per_page: 2 })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 2);

        let err = list_user_videos(&state, alice, PageQuery { page: 3, per_page: 2 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PageNotFound));

        let err = list_user_videos(&state, 999, PageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }
}
