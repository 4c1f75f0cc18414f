//! Video metadata extraction through `ffprobe`.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    /// Seconds.
    pub duration: f64,
}

impl MediaInfo {
    pub fn duration_secs(&self) -> i32 {
        self.duration.round().clamp(0.0, i32::MAX as f64) as i32
    }
}

#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// `None` when the file cannot be probed or has no video stream.
    async fn probe(&self, path: &Path) -> Option<MediaInfo>;
}

pub struct Ffprobe {
    bin: String,
}

impl Ffprobe {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl MediaProbe for Ffprobe {
    async fn probe(&self, path: &Path) -> Option<MediaInfo> {
        let output = Command::new(&self.bin)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .output()
            .await;

        let output = match output {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                warn!(path = %path.display(), status = %o.status, "ffprobe failed");
                return None;
            }
            Err(e) => {
                warn!(error = %e, bin = %self.bin, "ffprobe not runnable");
                return None;
            }
        };

        let info = parse_probe_output(&output.stdout);
        debug!(path = %path.display(), ?info, "probed video");
        info
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// First video stream of an `ffprobe -print_format json -show_streams` dump.
pub fn parse_probe_output(raw: &[u8]) -> Option<MediaInfo> {
    let parsed: ProbeOutput = serde_json::from_slice(raw).ok()?;
    let stream = parsed
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))?;
    Some(MediaInfo {
        width: stream.width?,
        height: stream.height?,
        duration: stream.duration?.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "audio", "duration": "12.0"},
            {"index": 1, "codec_type": "video", "width": 1920, "height": 1080, "duration": "61.533333"}
        ]
    }"#;

    #[test]
    fn picks_the_video_stream() {
        let info = parse_probe_output(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.duration_secs(), 62);
    }

    #[test]
    fn unavailable_when_no_video_stream_or_garbage() {
        assert!(parse_probe_output(br#"{"streams":[{"codec_type":"audio"}]}"#).is_none());
        assert!(parse_probe_output(b"{}").is_none());
        assert!(parse_probe_output(b"not json").is_none());
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let probe = Ffprobe::new("definitely-not-an-ffprobe-binary");
        assert!(probe.probe(Path::new("/tmp/none.mp4")).await.is_none());
    }
}
