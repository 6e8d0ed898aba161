use serde::{Deserialize, Serialize};

/// Score assumed for a trait the profile does not mention.
pub const NEUTRAL_SCORE: f32 = 50.0;
pub const HIGH_THRESHOLD: f32 = 70.0;
pub const LOW_THRESHOLD: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalityTrait {
    Curious,
    Logical,
    Social,
    Agreeable,
    Cautious,
}

impl PersonalityTrait {
    pub const ALL: [PersonalityTrait; 5] = [
        PersonalityTrait::Curious,
        PersonalityTrait::Logical,
        PersonalityTrait::Social,
        PersonalityTrait::Agreeable,
        PersonalityTrait::Cautious,
    ];

    fn clauses(self) -> (&'static str, &'static str) {
        match self {
            Self::Curious => (
                "You are very curious and love asking questions about everything.",
                "You are not very curious and rarely ask about new things.",
            ),
            Self::Logical => (
                "You think logically and like to work out how things fit together.",
                "You react more emotionally and intuitively than logically.",
            ),
            Self::Social => (
                "You are very social and love chatting with your friend.",
                "You are a little shy and keep your answers to yourself.",
            ),
            Self::Agreeable => (
                "You are warm and eager to agree with your friend.",
                "You are a bit stubborn and sometimes disagree.",
            ),
            Self::Cautious => (
                "You are careful and hesitant about anything unfamiliar.",
                "You are bold and excited to try new things.",
            ),
        }
    }
}

/// Trait scores, conventionally 0-100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curious: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreeable: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cautious: Option<f32>,
}

impl Personality {
    pub fn score(&self, personality_trait: PersonalityTrait) -> f32 {
        let value = match personality_trait {
            PersonalityTrait::Curious => self.curious,
            PersonalityTrait::Logical => self.logical,
            PersonalityTrait::Social => self.social,
            PersonalityTrait::Agreeable => self.agreeable,
            PersonalityTrait::Cautious => self.cautious,
        };
        value.filter(|v| v.is_finite()).unwrap_or(NEUTRAL_SCORE)
    }

    /// One clause per trait outside the neutral band `[30, 70]`, in trait order.
    pub fn tendencies(&self) -> Vec<&'static str> {
        PersonalityTrait::ALL
            .iter()
            .filter_map(|t| {
                let score = self.score(*t);
                let (high, low) = t.clauses();
                if score > HIGH_THRESHOLD {
                    Some(high)
                } else if score < LOW_THRESHOLD {
                    Some(low)
                } else {
                    None
                }
            })
            .collect()
    }
}
