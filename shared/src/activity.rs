use serde::{Deserialize, Serialize};

use crate::model::ActivityEvidence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    VeryActive,
    Active,
    Moderate,
    Low,
    Inactive,
    Unknown,
}

/// Coarse three-way grouping used for chips and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityBand {
    High,
    Medium,
    Low,
    Unknown,
}

impl ActivityLevel {
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            Self::Unknown
        } else if score >= 80.0 {
            Self::VeryActive
        } else if score >= 60.0 {
            Self::Active
        } else if score >= 45.0 {
            Self::Moderate
        } else if score >= 25.0 {
            Self::Low
        } else {
            Self::Inactive
        }
    }

    fn from_label(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "veryactive" => Self::VeryActive,
            "active" | "high" => Self::Active,
            "moderate" | "medium" => Self::Moderate,
            "low" => Self::Low,
            "inactive" => Self::Inactive,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryActive => "Very Active",
            Self::Active => "Active",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
            Self::Inactive => "Inactive",
            Self::Unknown => "Unknown",
        }
    }

    pub fn band(self) -> ActivityBand {
        match self {
            Self::VeryActive | Self::Active => ActivityBand::High,
            Self::Moderate => ActivityBand::Medium,
            Self::Low | Self::Inactive => ActivityBand::Low,
            Self::Unknown => ActivityBand::Unknown,
        }
    }

    /// Chip color as RGB bytes; Unknown is a flat grey so it never reads as a band.
    pub fn color_rgb(self) -> (u8, u8, u8) {
        match self {
            Self::VeryActive => (52, 211, 153),
            Self::Active => (110, 231, 183),
            Self::Moderate => (251, 191, 36),
            Self::Low => (249, 115, 22),
            Self::Inactive => (239, 68, 68),
            Self::Unknown => (120, 116, 112),
        }
    }
}

impl ActivityBand {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub level: ActivityLevel,
    pub band: ActivityBand,
    pub score: Option<f64>,
    pub color: (u8, u8, u8),
}

impl Activity {
    pub const UNKNOWN: Activity = Activity {
        level: ActivityLevel::Unknown,
        band: ActivityBand::Unknown,
        score: None,
        color: (120, 116, 112),
    };
}

/// Classify external evidence; a numeric score wins over a textual level.
pub fn classify_activity(evidence: Option<&ActivityEvidence>) -> Activity {
    let Some(evidence) = evidence else {
        return Activity::UNKNOWN;
    };

    let score = evidence
        .score
        .filter(|score| score.is_finite())
        .map(|score| score.clamp(0.0, 100.0));
    let level = match (score, evidence.level.as_deref()) {
        (Some(score), _) => ActivityLevel::from_score(score),
        (None, Some(label)) => ActivityLevel::from_label(label),
        (None, None) => ActivityLevel::Unknown,
    };

    Activity {
        level,
        band: level.band(),
        score,
        color: level.color_rgb(),
    }
}
