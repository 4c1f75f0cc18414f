use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{
        repo::{PgTokenRepo, TokenStore},
        tokens::TokenService,
    },
    comments::repo::{CommentStore, PgCommentRepo},
    config::AppConfig,
    media::{Ffprobe, MediaProbe},
    storage::{LocalStorage, StorageClient},
    users::repo::{PgUserRepo, UserStore},
    videos::repo::{PgVideoRepo, VideoStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub videos: Arc<dyn VideoStore>,
    pub comments: Arc<dyn CommentStore>,
    pub storage: Arc<dyn StorageClient>,
    pub probe: Arc<dyn MediaProbe>,
}

impl AppState {
    pub async fn init(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let storage = Arc::new(LocalStorage::new(&config.video_dir).await?) as Arc<dyn StorageClient>;
        let probe = Arc::new(Ffprobe::new(config.ffprobe_bin.clone())) as Arc<dyn MediaProbe>;
        let token_store = Arc::new(PgTokenRepo::new(db.clone())) as Arc<dyn TokenStore>;
        let tokens = TokenService::new(token_store, config.token_ttl());

        Ok(Self {
            users: Arc::new(PgUserRepo::new(db.clone())),
            videos: Arc::new(PgVideoRepo::new(db.clone())),
            comments: Arc::new(PgCommentRepo::new(db)),
            config: Arc::new(config),
            tokens,
            storage,
            probe,
        })
    }
}
