//! Captured page snapshots.
//!
//! One JSON object per line:
//!
//! ```text
//! {"captured_at": "2024-03-02T10:15:00Z", "body": "John Smith\n45\n2h\nReply"}
//! {"body": "<div>...</div>", "format": "html"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use chrono::{DateTime, Utc};
use opal_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a snapshot body should be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFormat {
    /// Visible page text.
    #[default]
    Text,
    /// Raw page HTML.
    Html,
}

/// One fetch of an auction page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// When the page was fetched.
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
    /// Page content.
    pub body: String,
    /// Content format.
    #[serde(default)]
    pub format: SnapshotFormat,
}

impl PageSnapshot {
    /// Create a text snapshot without a timestamp.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            captured_at: None,
            body: body.into(),
            format: SnapshotFormat::Text,
        }
    }

    /// Create an HTML snapshot without a timestamp.
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            captured_at: None,
            body: body.into(),
            format: SnapshotFormat::Html,
        }
    }
}

/// Parse JSON-lines snapshots.
pub fn parse_snapshots(input: &str) -> Result<Vec<PageSnapshot>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::other(format!("snapshot line {}: {}", index + 1, e)))
        })
        .collect()
}

/// Load JSON-lines snapshots from a file.
pub fn load_snapshots(path: impl AsRef<Path>) -> Result<Vec<PageSnapshot>> {
    let input = std::fs::read_to_string(path)?;
    parse_snapshots(&input)
}
