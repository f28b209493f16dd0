//! Browsing history export and the date query tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::error::ToolError;
use crate::tool::{Tool, ToolContext, ToolDefinition, ToolResult};

/// Characters of page content shown per entry.
const PREVIEW_CHARS: usize = 200;

pub const DATE_FORMAT_HINT: &str =
    "Please use YYYY-MM-DD format or natural language like 'May 22nd, 2025'";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Invalid date format '{0}'. {hint}", hint = DATE_FORMAT_HINT)]
    InvalidDate(String),

    #[error("Failed to read history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse history file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<HistoryError> for ToolError {
    fn from(e: HistoryError) -> Self {
        match e {
            HistoryError::InvalidDate(_) => ToolError::ValidationFailed(e.to_string()),
            other => ToolError::ExecutionFailed(other.to_string()),
        }
    }
}

/// One page in the history export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    /// ISO-8601 timestamp, e.g. `2025-05-24T10:15:00`.
    pub timestamp: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub no_of_visits: u64,
}

impl HistoryEntry {
    /// Calendar date of the visit.
    pub fn date(&self) -> Option<NaiveDate> {
        let day = self.timestamp.split('T').next()?;
        NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d").ok()
    }

    /// First characters of the content, with `...` when truncated.
    pub fn preview(&self) -> String {
        if self.content.chars().count() > PREVIEW_CHARS {
            let head: String = self.content.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.content.clone()
        }
    }
}

/// Source of browsing history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    async fn entries_on(&self, date: NaiveDate) -> Result<Vec<HistoryEntry>, HistoryError> {
        let entries = self.entries().await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.date() == Some(date))
            .collect())
    }
}

/// History read from a `contents.json` export (a JSON array of entries).
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| HistoryError::Io {
                path: self.path.clone(),
                source,
            })?;
        let entries: Vec<HistoryEntry> =
            serde_json::from_str(&raw).map_err(|source| HistoryError::Parse {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), count = entries.len(), "Loaded history");
        Ok(entries)
    }
}

/// Parse `YYYY-MM-DD` or dates like `May 24th, 2025` / `24 May 2025`.
pub fn parse_query_date(input: &str) -> Result<NaiveDate, HistoryError> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    let cleaned = trimmed.replace(',', " ").to_lowercase();
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .map(strip_ordinal)
        .collect();
    let normalized = words.join(" ");

    ["%B %d %Y", "%b %d %Y", "%d %B %Y", "%d %b %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
        .ok_or_else(|| HistoryError::InvalidDate(input.to_string()))
}

fn strip_ordinal(word: &str) -> &str {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(number) = word.strip_suffix(suffix) {
            if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
                return number;
            }
        }
    }
    word
}

/// Render the entries found for `date`.
pub fn render_history(date: NaiveDate, entries: &[HistoryEntry]) -> String {
    let day = date.format("%Y-%m-%d");
    if entries.is_empty() {
        return format!("No browsing history found for {}", day);
    }

    let mut out = format!("Found {} pages visited on {}:\n\n", entries.len(), day);
    for entry in entries {
        out.push_str(&format!("URL: {}\n", entry.url));
        out.push_str(&format!("Visits: {}\n", entry.no_of_visits));
        out.push_str(&format!("Summary: {}\n\n", entry.preview()));
    }
    out
}

/// `query_history_by_date`: pages visited on a given day.
pub struct QueryHistoryTool {
    definition: ToolDefinition,
    store: Arc<dyn HistoryStore>,
}

impl QueryHistoryTool {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self {
            definition: ToolDefinition::new(
                "query_history_by_date",
                "Retrieve the browsing history for a specific date: every URL visited, \
                 how many times, and a short summary of its content. Use this for any \
                 question about websites visited, links opened or pages browsed on a day. \
                 Dates may be YYYY-MM-DD (e.g. '2025-05-24') or natural language \
                 (e.g. 'May 24th, 2025').",
            )
            .with_parameters_schema(json!({
                "type": "object",
                "properties": {
                    "date": {
                        "type": "string",
                        "description": "Date as YYYY-MM-DD or e.g. 'May 24th, 2025'"
                    }
                },
                "required": ["date"]
            })),
            store,
        }
    }
}

#[async_trait]
impl Tool for QueryHistoryTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, params: Value, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let raw = params
            .get("date")
            .and_then(Value::as_str)
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| {
                ToolError::ValidationFailed(format!(
                    "date parameter is required ({})",
                    DATE_FORMAT_HINT
                ))
            })?;

        let date = parse_query_date(raw)?;
        let entries = self.store.entries_on(date).await?;
        debug!(%date, matches = entries.len(), "History query");

        let data = json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "entries": entries,
        });
        Ok(ToolResult::success_json(render_history(date, &entries), data))
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
