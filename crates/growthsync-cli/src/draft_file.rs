//! Draft persistence as a JSON document

use anyhow::Context;
use growthsync_model::ExperimentDraft;
use std::path::Path;

/// Read the draft at `path`; a missing file is an empty draft
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> anyhow::Result<ExperimentDraft> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "draft file not found, starting empty");
        return Ok(ExperimentDraft::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading draft {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing draft {}", path.display()))
}

/// Write `draft` to `path`, replacing it in one rename
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save(path: &Path, draft: &ExperimentDraft) -> anyhow::Result<()> {
    let mut text = serde_json::to_string_pretty(draft).context("serialising draft")?;
    text.push('\n');

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    std::fs::write(&staging, text)
        .with_context(|| format!("writing {}", Path::new(&staging).display()))?;
    std::fs::rename(&staging, path).with_context(|| format!("replacing draft {}", path.display()))?;

    tracing::debug!(path = %path.display(), "draft saved");
    Ok(())
}
