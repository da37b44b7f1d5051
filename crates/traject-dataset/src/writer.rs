//! Newline-delimited JSON dataset output.

use std::path::Path;

use tracing::info;

use crate::errors::DatasetError;
use crate::schema::Conversation;

/// Write conversations as newline-delimited JSON, one `{"messages": [...]}`
/// object per line.
///
/// Budget enforcement happens before this point — callers only pass
/// conversations that already passed
/// [`TokenCounter::ensure_within_budget`](crate::tokens::TokenCounter::ensure_within_budget).
pub async fn write_dataset(
    path: &Path,
    conversations: &[Conversation],
) -> Result<(), DatasetError> {
    let mut out = String::new();
    for conversation in conversations {
        out.push_str(&serde_json::to_string(conversation)?);
        out.push('\n');
    }
    tokio::fs::write(path, out).await?;
    info!(
        path = %path.display(),
        conversations = conversations.len(),
        "dataset written"
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
