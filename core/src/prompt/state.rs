//! Companion snapshot handed in by the caller for one prompt build.
//!
//! Every field defaults when absent so partially populated profiles still
//! produce a usable prompt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::personality::Personality;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionState {
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub personality: Personality,
    /// Learn order; the oldest word comes first.
    #[serde(default)]
    pub vocabulary: Vec<VocabularyWord>,
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub facts: Vec<String>,
    /// Only the count is used.
    #[serde(default)]
    pub memories: Vec<Value>,
    #[serde(default)]
    pub recent_chat: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyWord {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learned_from: Option<String>,
}

impl VocabularyWord {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            learned_from: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl Concept {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            related: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "pal", alias = "assistant")]
    Companion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn companion(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Companion,
            text: text.into(),
        }
    }
}

impl CompanionState {
    pub fn with_level(level: u32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.iter().map(|w| w.word.as_str())
    }
}
