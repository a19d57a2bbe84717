//! Coarse classification of a composite score.

use serde::Serialize;
use std::fmt;

pub const VERY_STRONG_THRESHOLD: f64 = 70.0;
pub const STRONG_THRESHOLD: f64 = 50.0;
pub const WEAK_THRESHOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    VeryStrong,
    Strong,
    Weak,
    VeryWeak,
}

impl StrengthLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= VERY_STRONG_THRESHOLD {
            StrengthLevel::VeryStrong
        } else if score >= STRONG_THRESHOLD {
            StrengthLevel::Strong
        } else if score >= WEAK_THRESHOLD {
            StrengthLevel::Weak
        } else {
            StrengthLevel::VeryWeak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrengthLevel::VeryStrong => "very_strong",
            StrengthLevel::Strong => "strong",
            StrengthLevel::Weak => "weak",
            StrengthLevel::VeryWeak => "very_weak",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            StrengthLevel::VeryStrong => "very strong market, deploying capital is reasonable",
            StrengthLevel::Strong => "strong market, follow the leading groups",
            StrengthLevel::Weak => "weak market, be careful",
            StrengthLevel::VeryWeak => "very weak market, limit trading",
        }
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
