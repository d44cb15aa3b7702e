//! Topic and lookup result types shared by the fetcher and the formatter.

use std::fmt;
use thiserror::Error;

/// Number of disambiguation candidates kept in a result.
pub const MAX_OPTIONS: usize = 5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TopicError {
    #[error("Topic cannot be empty!")]
    Empty,
}

/// A trimmed, non-empty subject to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
    /// Trim the input and reject it if nothing is left.
    pub fn parse(input: &str) -> Result<Self, TopicError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TopicError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Split a comma-separated batch into topics, skipping blank entries.
    pub fn parse_batch(input: &str) -> Result<Vec<Self>, TopicError> {
        let topics: Vec<Topic> = input
            .split(',')
            .filter_map(|part| Topic::parse(part).ok())
            .collect();
        if topics.is_empty() {
            return Err(TopicError::Empty);
        }
        Ok(topics)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a single summary lookup.
///
/// Failures are not errors at this layer: each variant renders to text that
/// takes the place of the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryResult {
    /// The summary text, exactly as the provider returned it
    Found(String),
    /// The topic matches several pages
    Disambiguation { topic: String, options: Vec<String> },
    /// No page matches the topic
    NotFound { topic: String },
    /// Network, HTTP or decoding failure
    Failed { message: String },
}

impl SummaryResult {
    pub fn disambiguation(topic: &str, options: impl IntoIterator<Item = String>) -> Self {
        Self::Disambiguation {
            topic: topic.to_string(),
            options: options.into_iter().take(MAX_OPTIONS).collect(),
        }
    }

    pub fn not_found(topic: &str) -> Self {
        Self::NotFound {
            topic: topic.to_string(),
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self::Failed {
            message: error.to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The text that stands in for the summary when rendering.
    pub fn text(&self) -> String {
        match self {
            Self::Found(text) => text.clone(),
            Self::Disambiguation { topic, options } => format!(
                "Multiple options found for '{}'. Try more specific.\nOptions: {}",
                topic,
                options.join(", ")
            ),
            Self::NotFound { topic } => format!("No Wikipedia page found for '{}'.", topic),
            Self::Failed { message } => format!("Error fetching summary: {}", message),
        }
    }
}
