//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Transcript settings
///
/// ```toml
/// [logging]
/// transcript_dir = "~/.local/share/llm-council/transcripts"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for JSONL transcripts; none are written when unset
    pub transcript_dir: Option<String>,
}

impl FileLoggingConfig {
    /// Transcript directory with a leading `~` expanded.
    pub fn transcript_dir(&self) -> Option<PathBuf> {
        let raw = self.transcript_dir.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(rest) = raw.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return Some(home.join(rest));
        }
        Some(PathBuf::from(raw))
    }
}
