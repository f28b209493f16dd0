//! Top interests: the most frequent keywords across browsing history.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::history::HistoryStore;
use crate::tool::{Tool, ToolContext, ToolDefinition, ToolResult};

const TOP_INTERESTS: usize = 5;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and", "any",
    "are", "aren", "arent", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "couldn", "couldnt", "d", "did", "didn", "didnt", "do",
    "does", "doesn", "doesnt", "doing", "don", "dont", "down", "during", "each", "few", "for",
    "from", "further", "had", "hadn", "hadnt", "has", "hasn", "hasnt", "have", "haven", "havent",
    "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "if",
    "in", "into", "is", "isn", "isnt", "it", "its", "itself", "just", "ll", "m", "ma", "me",
    "mightn", "more", "most", "mustn", "my", "myself", "needn", "no", "nor", "not", "now", "o",
    "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over",
    "own", "re", "s", "same", "shan", "she", "shes", "should", "shouldn", "shouldnt", "so",
    "some", "such", "t", "than", "that", "thatll", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "ve", "very", "was", "wasn", "wasnt", "we", "were", "weren",
    "werent", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "won", "wont", "wouldn", "wouldnt", "y", "you", "youd", "youll", "your", "youre", "yours",
    "yourself", "yourselves", "youve",
];

/// Page boilerplate that says nothing about the reader.
const WEB_BOILERPLATE: &[&str] = &[
    "use", "using", "used", "like", "may", "also", "one", "two", "first", "new", "click", "get",
    "see", "help", "make", "can", "please", "many", "copyright", "rights", "reserved", "privacy",
    "policy", "terms", "search", "google", "com", "www", "https", "http", "html", "php",
];

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ENGLISH_STOP_WORDS
        .iter()
        .chain(WEB_BOILERPLATE)
        .copied()
        .collect()
});

/// Keywords of `text`: lower-cased, punctuation removed, stop words and
/// tokens of two characters or fewer dropped.
pub fn keywords(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().filter_map(|raw| {
        let word: String = raw
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .flat_map(char::to_lowercase)
            .collect();
        let keep = word.chars().count() > 2
            && word.chars().all(char::is_alphanumeric)
            && !STOP_WORDS.contains(word.as_str());
        keep.then_some(word)
    })
}

/// The `limit` most frequent keywords, ties broken alphabetically.
pub fn top_keywords<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<(String, u64)> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for text in texts {
        for word in keywords(text) {
            *counts.entry(word).or_default() += 1;
        }
    }
    let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn render_interests(top: &[(String, u64)]) -> String {
    if top.is_empty() {
        return "No significant interests found in browsing history".to_string();
    }
    let mut out = format!(
        "Your top {} interests based on browsing history:\n\n",
        TOP_INTERESTS
    );
    for (word, count) in top {
        out.push_str(&format!("• {}: mentioned {} times\n", title_case(word), count));
    }
    out
}

/// `query_top_interests`: keyword frequency over all history content.
pub struct TopInterestsTool {
    definition: ToolDefinition,
    store: Arc<dyn HistoryStore>,
}

impl TopInterestsTool {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self {
            definition: ToolDefinition::new(
                "query_top_interests",
                "Find the top 5 interests in the browsing history, based on the most \
                 frequent keywords across visited page content.",
            ),
            store,
        }
    }
}

#[async_trait]
impl Tool for TopInterestsTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _params: Value, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let entries = self.store.entries().await?;
        let top = top_keywords(entries.iter().map(|e| e.content.as_str()), TOP_INTERESTS);
        let data = json!(
            top.iter()
                .map(|(keyword, count)| json!({"keyword": keyword, "count": count}))
                .collect::<Vec<_>>()
        );
        Ok(ToolResult::success_json(render_interests(&top), data))
    }
}
