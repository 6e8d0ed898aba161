//! Developmental stages and the per-stage limits that shape a prompt.
//!
//! Stage selection is a lookup into [`STAGE_TABLE`], ordered by minimum
//! level, so every level maps to exactly one stage and a higher level never
//! maps to an earlier stage.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Sensorimotor,
    EarlyPreoperational,
    Preoperational,
    ConcreteOperational,
    FormalOperational,
}

/// Limits and generation defaults attached to a stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageProfile {
    pub stage: Stage,
    pub min_level: u32,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Turns of recent chat rendered into the context block; 0 omits it.
    pub context_turns: usize,
    pub vocabulary_cap: usize,
    pub concept_cap: usize,
    pub fact_cap: usize,
}

pub static STAGE_TABLE: [StageProfile; 5] = [
    StageProfile {
        stage: Stage::Sensorimotor,
        min_level: 0,
        temperature: 1.2,
        max_tokens: 10,
        context_turns: 0,
        vocabulary_cap: 0,
        concept_cap: 0,
        fact_cap: 0,
    },
    StageProfile {
        stage: Stage::EarlyPreoperational,
        min_level: 2,
        temperature: 1.0,
        max_tokens: 15,
        context_turns: 2,
        vocabulary_cap: 50,
        concept_cap: 0,
        fact_cap: 0,
    },
    StageProfile {
        stage: Stage::Preoperational,
        min_level: 4,
        temperature: 0.9,
        max_tokens: 30,
        context_turns: 3,
        vocabulary_cap: 100,
        concept_cap: 0,
        fact_cap: 0,
    },
    StageProfile {
        stage: Stage::ConcreteOperational,
        min_level: 7,
        temperature: 0.8,
        max_tokens: 60,
        context_turns: 6,
        vocabulary_cap: 0,
        concept_cap: 20,
        fact_cap: 10,
    },
    StageProfile {
        stage: Stage::FormalOperational,
        min_level: 11,
        temperature: 0.7,
        max_tokens: 100,
        context_turns: 10,
        vocabulary_cap: 0,
        concept_cap: 20,
        fact_cap: 10,
    },
];

impl Stage {
    pub fn from_level(level: u32) -> Stage {
        Self::profile_for_level(level).stage
    }

    pub fn profile_for_level(level: u32) -> &'static StageProfile {
        STAGE_TABLE
            .iter()
            .rev()
            .find(|p| level >= p.min_level)
            .unwrap_or(&STAGE_TABLE[0])
    }

    pub fn profile(self) -> &'static StageProfile {
        &STAGE_TABLE[self as usize]
    }

    pub fn id(self) -> &'static str {
        match self {
            Stage::Sensorimotor => "sensorimotor",
            Stage::EarlyPreoperational => "early_preoperational",
            Stage::Preoperational => "preoperational",
            Stage::ConcreteOperational => "concrete_operational",
            Stage::FormalOperational => "formal_operational",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_boundaries() {
        let cases = [
            (0, Stage::Sensorimotor),
            (1, Stage::Sensorimotor),
            (2, Stage::EarlyPreoperational),
            (3, Stage::EarlyPreoperational),
            (4, Stage::Preoperational),
            (6, Stage::Preoperational),
            (7, Stage::ConcreteOperational),
            (10, Stage::ConcreteOperational),
            (11, Stage::FormalOperational),
            (u32::MAX, Stage::FormalOperational),
        ];
        for (level, stage) in cases {
            assert_eq!(Stage::from_level(level), stage, "level {level}");
        }
    }

    #[test]
    fn stages_never_regress() {
        for level in 0..200 {
            assert!(Stage::from_level(level + 1) >= Stage::from_level(level));
        }
    }

    #[test]
    fn table_is_indexed_by_stage() {
        for (idx, profile) in STAGE_TABLE.iter().enumerate() {
            assert_eq!(profile.stage as usize, idx);
            assert_eq!(profile.stage.profile(), profile);
        }
    }

    #[test]
    fn token_ceilings_grow_and_temperature_cools() {
        let ceilings: Vec<u32> = STAGE_TABLE.iter().map(|p| p.max_tokens).collect();
        assert_eq!(ceilings, vec![10, 15, 30, 60, 100]);
        for pair in STAGE_TABLE.windows(2) {
            assert!(pair[1].max_tokens > pair[0].max_tokens);
            assert!(pair[1].temperature < pair[0].temperature);
            assert!(pair[1].min_level > pair[0].min_level);
        }
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&Stage::EarlyPreoperational).unwrap(),
            "\"early_preoperational\""
        );
        assert_eq!(Stage::ConcreteOperational.to_string(), "concrete_operational");
    }
}
