//! Browsing analytics: visit counts per domain and per category.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;
use url::Url;

use crate::error::ToolError;
use crate::history::{HistoryEntry, HistoryError, HistoryStore};
use crate::tool::{Tool, ToolContext, ToolDefinition, ToolResult};

/// Domains listed in `domain_frequency`.
const TOP_DOMAINS: usize = 20;

const CATEGORIES: &[(&str, &[&str])] = &[
    ("Search", &["google.", "bing.com", "duckduckgo.com", "search.yahoo.com"]),
    (
        "Social Media",
        &["facebook.com", "twitter.com", "x.com", "instagram.com", "linkedin.com", "reddit.com"],
    ),
    ("Video", &["youtube.com", "netflix.com", "vimeo.com", "twitch.tv"]),
    (
        "Development",
        &["github.com", "gitlab.com", "stackoverflow.com", "docs.rs", "crates.io", "npmjs.com"],
    ),
    (
        "News",
        &["news.", "cnn.com", "bbc.", "nytimes.com", "reuters.com", "ycombinator.com"],
    ),
    ("Shopping", &["amazon.", "ebay.", "etsy.com"]),
    ("Reference", &["wikipedia.org", "medium.com"]),
    ("Email", &["mail.", "outlook."]),
];

/// Produces the analytics summary.
#[async_trait]
pub trait AnalyticsGenerator: Send + Sync {
    /// Compute the summary, write it to `output`, and return it.
    async fn generate(&self, output: &Path) -> Result<Value, HistoryError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainStat {
    pub domain: String,
    pub visits: u64,
    pub category: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub visits: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowsingAnalytics {
    pub domain_frequency: Vec<DomainStat>,
    pub category_breakdown: Vec<CategoryStat>,
}

/// Host without a leading `www.`.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Needles ending in `.` match a leading label (`google.` matches
/// `google.co.uk`); others match the domain or any of its subdomains.
fn host_matches(domain: &str, needle: &str) -> bool {
    if needle.ends_with('.') {
        domain.starts_with(needle) || domain.contains(&format!(".{}", needle))
    } else {
        domain == needle || domain.ends_with(&format!(".{}", needle))
    }
}

pub fn categorize(domain: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| host_matches(domain, n)))
        .map(|(category, _)| *category)
        .unwrap_or("Other")
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 10_000.0 / total as f64).round() / 100.0
}

/// Compute analytics over `entries`. Entries without a parseable host are skipped.
pub fn summarize(entries: &[HistoryEntry]) -> BrowsingAnalytics {
    let mut per_domain: HashMap<String, u64> = HashMap::new();
    for entry in entries {
        if let Some(domain) = domain_of(&entry.url) {
            let visits = per_domain.entry(domain).or_default();
            *visits = visits.saturating_add(entry.no_of_visits.max(1));
        }
    }
    let total = per_domain.values().copied().fold(0, u64::saturating_add);

    let mut per_category: HashMap<&'static str, u64> = HashMap::new();
    for (domain, visits) in &per_domain {
        let sum = per_category.entry(categorize(domain)).or_default();
        *sum = sum.saturating_add(*visits);
    }

    let mut domains: Vec<(String, u64)> = per_domain.into_iter().collect();
    domains.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let domain_frequency = domains
        .into_iter()
        .take(TOP_DOMAINS)
        .map(|(domain, visits)| DomainStat {
            category: categorize(&domain).to_string(),
            percentage: percentage(visits, total),
            domain,
            visits,
        })
        .collect();

    let mut categories: Vec<(&'static str, u64)> = per_category.into_iter().collect();
    categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let category_breakdown = categories
        .into_iter()
        .map(|(category, visits)| CategoryStat {
            category: category.to_string(),
            visits,
            percentage: percentage(visits, total),
        })
        .collect();

    BrowsingAnalytics {
        domain_frequency,
        category_breakdown,
    }
}

/// Analytics computed from a [`HistoryStore`].
pub struct HistoryAnalytics {
    store: Arc<dyn HistoryStore>,
}

impl HistoryAnalytics {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnalyticsGenerator for HistoryAnalytics {
    async fn generate(&self, output: &Path) -> Result<Value, HistoryError> {
        let entries = self.store.entries().await?;
        let summary = summarize(&entries);
        let value = json!(summary);

        let write_err = |source: std::io::Error| HistoryError::Write {
            path: output.to_path_buf(),
            source,
        };
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let pretty = serde_json::to_string_pretty(&value).map_err(|source| HistoryError::Parse {
            path: output.to_path_buf(),
            source,
        })?;
        tokio::fs::write(output, pretty).await.map_err(write_err)?;

        info!(
            path = %output.display(),
            domains = summary.domain_frequency.len(),
            "Wrote browsing analytics"
        );
        Ok(value)
    }
}

/// `generate_browsing_analytics`: domain and category visit breakdown.
pub struct AnalyticsTool {
    definition: ToolDefinition,
    generator: Arc<dyn AnalyticsGenerator>,
    default_output: PathBuf,
}

impl AnalyticsTool {
    pub fn new(generator: Arc<dyn AnalyticsGenerator>, default_output: PathBuf) -> Self {
        Self {
            definition: ToolDefinition::new(
                "generate_browsing_analytics",
                "Analyze browsing patterns: the most visited websites with visit counts, \
                 categories and percentages, plus a breakdown by website category. \
                 Useful for questions like 'Which websites do I visit most?' or \
                 'Show my browsing patterns by category'.",
            )
            .with_parameters_schema(json!({
                "type": "object",
                "properties": {
                    "output_file": {
                        "type": "string",
                        "description": "Where to save the analytics JSON"
                    }
                },
                "required": []
            })),
            generator,
            default_output,
        }
    }
}

#[async_trait]
impl Tool for AnalyticsTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, params: Value, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let output = params
            .get("output_file")
            .and_then(Value::as_str)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_output.clone());

        let value = self.generator.generate(&output).await?;
        let content = serde_json::to_string_pretty(&value)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(ToolResult::success_json(content, value))
    }
}

#[cfg(test)]
#[path = "analytics_tests.rs"]
mod tests;
