//! Playback speed transform via ffmpeg

use std::path::{Path, PathBuf};

use tokio::process::Command;

use voice_relay_config::constants::speech;

use crate::PipelineError;

/// Largest factor a single `atempo` stage accepts on older ffmpeg builds
const ATEMPO_STAGE_MAX: f32 = 2.0;
const ATEMPO_STAGE_MIN: f32 = 0.5;

/// Re-encodes an audio file at a different tempo, pitch preserved
#[derive(Debug, Clone)]
pub struct SpeedAdjuster {
    ffmpeg_path: PathBuf,
    speed: f32,
}

impl SpeedAdjuster {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, speed: f32) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            speed: speed.clamp(speech::MIN_PLAYBACK_SPEED, speech::MAX_PLAYBACK_SPEED),
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn is_identity(&self) -> bool {
        (self.speed - 1.0).abs() < f32::EPSILON
    }

    /// Write `input` to `output` at the configured speed
    ///
    /// At speed 1.0 the file is renamed and ffmpeg is not invoked. `input`
    /// is left in place otherwise; the caller owns its cleanup.
    pub async fn apply(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        if self.is_identity() {
            tokio::fs::rename(input, output).await?;
            return Ok(());
        }

        let filter = atempo_filter(self.speed);
        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(input)
            .args(["-filter:a", &filter])
            .arg(output)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                PipelineError::Tts(format!(
                    "Failed to run {}: {}",
                    self.ffmpeg_path.display(),
                    e
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::error!(status = %result.status, stderr = %stderr.trim(), "ffmpeg speed-up failed");
            return Err(PipelineError::Tts(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Build an `atempo` chain whose stages each stay within [0.5, 2.0]
fn atempo_filter(speed: f32) -> String {
    let mut stages = Vec::new();
    let mut remaining = speed;

    while remaining > ATEMPO_STAGE_MAX {
        stages.push(ATEMPO_STAGE_MAX);
        remaining /= ATEMPO_STAGE_MAX;
    }
    while remaining < ATEMPO_STAGE_MIN {
        stages.push(ATEMPO_STAGE_MIN);
        remaining /= ATEMPO_STAGE_MIN;
    }
    stages.push(remaining);

    stages
        .iter()
        .map(|s| format!("atempo={}", s))
        .collect::<Vec<_>>()
        .join(",")
}
