use std::path::PathBuf;

use anyhow::bail;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Lifetime of an issued bearer token.
    pub token_ttl_hours: i64,
    /// Directory uploaded videos are written to.
    pub video_dir: PathBuf,
    pub max_upload_mb: usize,
    pub ffprobe_bin: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parsed_var("APP_PORT").unwrap_or(8080),
            token_ttl_hours: parsed_var("TOKEN_TTL_HOURS").unwrap_or(3),
            video_dir: std::env::var("VIDEO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./public/videos")),
            max_upload_mb: parsed_var("MAX_UPLOAD_MB").unwrap_or(512),
            ffprobe_bin: std::env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".into()),
        }
        .validated()
    }

    fn validated(self) -> anyhow::Result<Self> {
        if self.token_ttl_hours <= 0 {
            bail!("TOKEN_TTL_HOURS must be positive, got {}", self.token_ttl_hours);
        }
        if self.max_upload_mb == 0 {
            bail!("MAX_UPLOAD_MB must be positive");
        }
        Ok(self)
    }

    pub fn token_ttl(&self) -> time::Duration {
        time::Duration::hours(self.token_ttl_hours)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
