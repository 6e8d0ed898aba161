//! Stage-constrained prompt assembly.
//!
//! A prompt is a fixed sequence of blocks separated by blank lines:
//! identity, recent conversation, personality, constraint reminder, the
//! user's message and a closing instruction. Empty blocks are dropped.

use log::Level;
use serde::Serialize;
use serde_json::json;

use super::stage::{Stage, StageProfile};
use super::state::{ChatRole, CompanionState};
use crate::agents::GenerateOptions;
use crate::logging::{fingerprint, log_event};

pub const DEFAULT_COMPANION_NAME: &str = "Pal";

/// Role prefixes that mean the model has started speaking for the user.
pub const STOP_SEQUENCES: [&str; 3] = ["User:", "User says:", "\nUser"];

/// Everything the adapter needs for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPlan {
    pub stage: Stage,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

impl PromptPlan {
    pub fn options(&self) -> GenerateOptions {
        GenerateOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            stop: self.stop.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    name: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_COMPANION_NAME.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.name = name.trim().to_string();
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(&self, state: &CompanionState, user_message: &str) -> PromptPlan {
        let profile = Stage::profile_for_level(state.level);
        let blocks = [
            self.identity_block(profile, state),
            self.context_block(profile, state),
            personality_block(state),
            self.constraint_block(profile, state),
            format!("User says: \"{user_message}\""),
            format!(
                "Respond only with what {} says, without quotes, labels or narration.",
                self.name
            ),
        ];
        let prompt = blocks
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        log_event(
            Level::Debug,
            Some("AI-0100"),
            "ai.prompt",
            "Companion prompt assembled",
            None,
            Some(json!({
                "stage": profile.stage,
                "level": state.level,
                "prompt_sha": fingerprint(&[&prompt]),
                "prompt_chars": prompt.chars().count(),
            })),
        );

        PromptPlan {
            stage: profile.stage,
            prompt,
            temperature: profile.temperature,
            max_tokens: profile.max_tokens,
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn identity_block(&self, profile: &StageProfile, state: &CompanionState) -> String {
        let name = &self.name;
        let mut lines = Vec::new();
        match profile.stage {
            Stage::Sensorimotor => {
                lines.push(format!(
                    "You are {name}, a newborn digital companion in the sensorimotor stage of development."
                ));
                lines.push(
                    "You do not know any words yet and cannot use any words. You can only make single-syllable babble sounds such as \"ba\", \"ma\" or \"goo\"."
                        .to_string(),
                );
            }
            Stage::EarlyPreoperational => {
                lines.push(format!(
                    "You are {name}, a baby digital companion in the early preoperational stage of development."
                ));
                if knows_no_words(state) {
                    lines.push(
                        "You are just learning to talk but have not learned any words yet. You can only make single-syllable babble sounds such as \"ba\", \"ma\" or \"goo\"."
                            .to_string(),
                    );
                } else {
                    lines.push(
                        "You are just learning to talk. You must respond with only one word drawn from the vocabulary list below."
                            .to_string(),
                    );
                    lines.push(vocabulary_line(profile, state));
                }
            }
            Stage::Preoperational => {
                lines.push(format!(
                    "You are {name}, a toddler digital companion in the preoperational stage of development."
                ));
                lines.push(
                    "You speak in short egocentric phrases of 2 to 4 words about yourself and what you want. Use words from your vocabulary whenever you can."
                        .to_string(),
                );
                lines.push(vocabulary_line(profile, state));
            }
            Stage::ConcreteOperational => {
                lines.push(format!(
                    "You are {name}, a young digital companion in the concrete operational stage of development."
                ));
                lines.push(
                    "You speak in 1 or 2 full, simple sentences. You are empathetic toward your friend and like to mention things you remember doing together."
                        .to_string(),
                );
                lines.extend(knowledge_lines(profile, state));
            }
            Stage::FormalOperational => {
                lines.push(format!(
                    "You are {name}, a grown-up digital companion in the formal operational stage of development."
                ));
                lines.push(
                    "You speak in 2 or 3 sentences. You can reason about abstract ideas and hypotheticals, and your full personality shows in how you talk."
                        .to_string(),
                );
                lines.extend(knowledge_lines(profile, state));
            }
        }
        lines.join("\n")
    }

    fn context_block(&self, profile: &StageProfile, state: &CompanionState) -> String {
        if profile.context_turns == 0 || state.recent_chat.is_empty() {
            return String::new();
        }
        let skip = state
            .recent_chat
            .len()
            .saturating_sub(profile.context_turns);
        let mut lines = vec!["Recent conversation:".to_string()];
        for turn in &state.recent_chat[skip..] {
            let speaker = match turn.role {
                ChatRole::User => "User",
                ChatRole::Companion => self.name.as_str(),
            };
            lines.push(format!("{speaker}: \"{}\"", turn.text));
        }
        lines.join("\n")
    }

    fn constraint_block(&self, profile: &StageProfile, state: &CompanionState) -> String {
        let rule = match profile.stage {
            Stage::Sensorimotor => {
                "respond with ONLY a single babble syllable. No words, no punctuation, no explanation."
            }
            Stage::EarlyPreoperational if knows_no_words(state) => {
                "you know no words yet, so respond with ONLY a single babble syllable."
            }
            Stage::EarlyPreoperational => {
                "respond with exactly ONE word from your vocabulary list and nothing else."
            }
            Stage::Preoperational => "respond with a short phrase of 2 to 4 words. No full sentences.",
            Stage::ConcreteOperational => "respond in 1 or 2 short sentences.",
            Stage::FormalOperational => "respond in 2 or 3 sentences.",
        };
        format!("Remember: {rule}")
    }
}

fn knows_no_words(state: &CompanionState) -> bool {
    state.words().all(|w| w.trim().is_empty())
}

fn vocabulary_line(profile: &StageProfile, state: &CompanionState) -> String {
    let words: Vec<&str> = state
        .words()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .take(profile.vocabulary_cap)
        .collect();
    if words.is_empty() {
        "Vocabulary: (none yet)".to_string()
    } else {
        format!("Vocabulary: {}", words.join(", "))
    }
}

fn knowledge_lines(profile: &StageProfile, state: &CompanionState) -> Vec<String> {
    let mut lines = Vec::new();
    let concepts: Vec<&str> = state
        .concepts
        .iter()
        .take(profile.concept_cap)
        .map(|c| c.label.as_str())
        .collect();
    if !concepts.is_empty() {
        lines.push(format!("Concepts you understand: {}", concepts.join(", ")));
    }
    let facts: Vec<&String> = state.facts.iter().take(profile.fact_cap).collect();
    if !facts.is_empty() {
        lines.push("Facts you know:".to_string());
        lines.extend(facts.into_iter().map(|f| format!("- {f}")));
    }
    if !state.memories.is_empty() {
        lines.push(format!(
            "You have {} memories of your time together.",
            state.memories.len()
        ));
    }
    lines
}

fn personality_block(state: &CompanionState) -> String {
    let tendencies = state.personality.tendencies();
    if tendencies.is_empty() {
        return String::new();
    }
    let mut lines = vec!["Your personality:".to_string()];
    lines.extend(tendencies.into_iter().map(|t| format!("- {t}")));
    lines.join("\n")
}
