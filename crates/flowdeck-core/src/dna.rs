use serde::{Deserialize, Serialize};

pub const FALLBACK_AUDIENCE: &str = "General audience interested in the project";
pub const FALLBACK_PROBLEM: &str = "Turn the idea into a concrete, shippable first version";
pub const FALLBACK_TONE: &str = "Clear, direct and practical";
pub const FALLBACK_ANTI_GOALS: &str = "Avoid jargon, filler and scope creep";
pub const FALLBACK_STAKES: &str = "Momentum: a finished draft beats a perfect plan";

/// The project brief that steers every generated question, plan and draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDna {
    pub audience: String,
    pub problem: String,
    pub tone: String,
    pub anti_goals: String,
    pub stakes: String,
    pub raw_context: String,
}

/// Editable DNA fields, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnaField {
    Audience,
    Problem,
    Tone,
    AntiGoals,
    Stakes,
}

impl DnaField {
    pub fn all() -> [DnaField; 5] {
        [
            DnaField::Audience,
            DnaField::Problem,
            DnaField::Tone,
            DnaField::AntiGoals,
            DnaField::Stakes,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            DnaField::Audience => "Audience",
            DnaField::Problem => "Problem",
            DnaField::Tone => "Tone",
            DnaField::AntiGoals => "Anti-goals",
            DnaField::Stakes => "Stakes",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            DnaField::Audience => DnaField::Problem,
            DnaField::Problem => DnaField::Tone,
            DnaField::Tone => DnaField::AntiGoals,
            DnaField::AntiGoals => DnaField::Stakes,
            DnaField::Stakes => DnaField::Audience,
        }
    }

    fn fallback(&self) -> &'static str {
        match self {
            DnaField::Audience => FALLBACK_AUDIENCE,
            DnaField::Problem => FALLBACK_PROBLEM,
            DnaField::Tone => FALLBACK_TONE,
            DnaField::AntiGoals => FALLBACK_ANTI_GOALS,
            DnaField::Stakes => FALLBACK_STAKES,
        }
    }
}

impl ProjectDna {
    /// Default brief used when synthesis fails
    pub fn fallback(raw_context: impl Into<String>) -> Self {
        Self {
            audience: FALLBACK_AUDIENCE.to_string(),
            problem: FALLBACK_PROBLEM.to_string(),
            tone: FALLBACK_TONE.to_string(),
            anti_goals: FALLBACK_ANTI_GOALS.to_string(),
            stakes: FALLBACK_STAKES.to_string(),
            raw_context: raw_context.into(),
        }
    }

    pub fn get(&self, field: DnaField) -> &str {
        match field {
            DnaField::Audience => &self.audience,
            DnaField::Problem => &self.problem,
            DnaField::Tone => &self.tone,
            DnaField::AntiGoals => &self.anti_goals,
            DnaField::Stakes => &self.stakes,
        }
    }

    pub fn set(&mut self, field: DnaField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DnaField::Audience => self.audience = value,
            DnaField::Problem => self.problem = value,
            DnaField::Tone => self.tone = value,
            DnaField::AntiGoals => self.anti_goals = value,
            DnaField::Stakes => self.stakes = value,
        }
    }

    /// Replace blank fields with their fallback text
    pub fn normalize(mut self) -> Self {
        for field in DnaField::all() {
            if self.get(field).trim().is_empty() {
                self.set(field, field.fallback());
            }
        }
        self
    }

    /// Compact multi-line rendering used inside prompts
    pub fn as_prompt_block(&self) -> String {
        let mut block = String::new();
        for field in DnaField::all() {
            block.push_str(&format!("{}: {}\n", field.label(), self.get(field)));
        }
        block
    }
}
