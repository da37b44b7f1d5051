//! Video duration probing.

use std::path::Path;

use tokio::process::Command;
use traject_core::StageError;

/// Probe a video's duration in milliseconds using `ffprobe`.
pub async fn probe_duration_ms(video: &Path) -> Result<i64, StageError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(video)
        .output()
        .await?;

    if !output.status.success() {
        return Err(StageError::stage(
            "video",
            format!(
                "ffprobe failed for {}: {}",
                video.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    parse_duration_ms(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        StageError::stage(
            "video",
            format!("ffprobe reported no duration for {}", video.display()),
        )
    })
}

/// Pull the duration out of `ffprobe -print_format json -show_format`
/// output. The duration arrives as a decimal-seconds string.
#[allow(clippy::cast_possible_truncation)]
fn parse_duration_ms(stdout: &str) -> Option<i64> {
    let value: serde_json::Value = serde_json::from_str(stdout).ok()?;
    let seconds: f64 = value
        .get("format")?
        .get("duration")?
        .as_str()?
        .parse()
        .ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 1000.0).round() as i64)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
