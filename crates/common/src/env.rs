//! Environment/runtime helpers
//!
//! Sanity checks to ensure the session file can be written at startup.

use std::path::Path;

use tracing::{debug, warn};

/// Ensure the parent directory of the persisted session file exists.
///
/// A bare file name (no parent) needs nothing; an unwritable parent is an error.
pub async fn ensure_session_dir(session_path: &str) -> anyhow::Result<()> {
    let parent = match Path::new(session_path).parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => {
            debug!(%session_path, "session file lives in working directory");
            return Ok(());
        }
    };
    if tokio::fs::metadata(parent).await.is_err() {
        warn!(dir = %parent.display(), "session directory missing; creating it");
    }
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    Ok(())
}
