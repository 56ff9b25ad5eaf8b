use serde::{Deserialize, Serialize};

use crate::domain::catalog::ToolResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
    Assistant,
}

/// One role-tagged turn of dialogue. Immutable once created; an ordered
/// sequence of these forms the transcript for a single request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self { role: Role::Human, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn is_human(&self) -> bool {
        self.role == Role::Human
    }
}

/// Classified purpose of a user message. Set exactly once per request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Product,
    Order,
    Smalltalk,
    Unknown,
}

impl Intent {
    /// Maps a raw classifier reply onto the closed label set. Matching is
    /// whitespace-trimmed and case-insensitive; anything outside
    /// `product|order|smalltalk` collapses to `Unknown`.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "product" => Self::Product,
            "order" => Self::Order,
            "smalltalk" => Self::Smalltalk,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Order => "order",
            Self::Smalltalk => "smalltalk",
            Self::Unknown => "unknown",
        }
    }
}

/// Externally visible outcome of one pipeline run. `answer` is non-empty
/// whenever the pipeline returned without error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub intent: Option<Intent>,
    pub tool_result: Option<ToolResult>,
    pub answer: String,
}
