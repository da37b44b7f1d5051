//! Still-frame extraction.

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

/// Extract the frame at `timestamp_ms` as JPEG bytes.
///
/// Returns `None` when ffmpeg fails or produces no file — seek glitches
/// near end-of-file are common and must not abort the surrounding
/// extraction loop.
pub async fn extract_frame(video: &Path, timestamp_ms: i64, scratch: &Path) -> Option<Vec<u8>> {
    let output_path = scratch.join(format!("frame_{timestamp_ms}.jpg"));
    let seek = format!("{}.{:03}", timestamp_ms / 1000, timestamp_ms % 1000);

    let result = Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &seek, "-i"])
        .arg(video)
        .args(["-frames:v", "1", "-y"])
        .arg(&output_path)
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => {}
        Ok(out) => {
            debug!(
                timestamp_ms,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "ffmpeg frame extraction failed"
            );
            return None;
        }
        Err(e) => {
            debug!(timestamp_ms, error = %e, "ffmpeg spawn failed");
            return None;
        }
    }

    let bytes = tokio::fs::read(&output_path).await.ok()?;
    let _ = tokio::fs::remove_file(&output_path).await;
    Some(bytes)
}
