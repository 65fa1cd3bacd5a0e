use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The workout phase a log section represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SectionType {
    Warmup,
    Strength,
    Cardio,
    Conditioning,
    Mobility,
    Cooldown,
}

impl SectionType {
    pub const ALL: [SectionType; 6] = [
        SectionType::Warmup,
        SectionType::Strength,
        SectionType::Cardio,
        SectionType::Conditioning,
        SectionType::Mobility,
        SectionType::Cooldown,
    ];
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionType::Warmup => write!(f, "warmup"),
            SectionType::Strength => write!(f, "strength"),
            SectionType::Cardio => write!(f, "cardio"),
            SectionType::Conditioning => write!(f, "conditioning"),
            SectionType::Mobility => write!(f, "mobility"),
            SectionType::Cooldown => write!(f, "cooldown"),
        }
    }
}

impl FromStr for SectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warmup" => Ok(SectionType::Warmup),
            "strength" => Ok(SectionType::Strength),
            "cardio" => Ok(SectionType::Cardio),
            "conditioning" => Ok(SectionType::Conditioning),
            "mobility" => Ok(SectionType::Mobility),
            "cooldown" => Ok(SectionType::Cooldown),
            _ => Err(format!(
                "Invalid section type '{}'. Valid options: warmup, strength, cardio, conditioning, mobility, cooldown",
                s
            )),
        }
    }
}
