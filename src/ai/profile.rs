use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Full-tree depth on a 3x3 board.
pub const MAX_SEARCH_DEPTH: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
    Invincible,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
        Difficulty::Invincible,
    ];

    /// Maps a numeric level to a difficulty. Anything outside `1..=5` is `Hard`.
    pub fn from_level(level: i64) -> Self {
        match level {
            1 => Difficulty::Easy,
            2 => Difficulty::Medium,
            3 => Difficulty::Hard,
            4 => Difficulty::Expert,
            5 => Difficulty::Invincible,
            _ => Difficulty::default(),
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
            Difficulty::Expert => 4,
            Difficulty::Invincible => 5,
        }
    }

    pub fn profile(self) -> &'static StrengthProfile {
        &STRENGTH_PROFILES[self.level() as usize - 1]
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Hard
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(level) = s.parse::<i64>() {
            return match level {
                1..=5 => Ok(Difficulty::from_level(level)),
                _ => Err(()),
            };
        }
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "normal" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            "invincible" | "perfect" => Ok(Difficulty::Invincible),
            _ => Err(()),
        }
    }
}

/// Difficulty as a front end sends it: a level number or a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DifficultySelector {
    Level(i64),
    Name(String),
}

impl DifficultySelector {
    /// Never fails: unknown levels and names resolve to the default difficulty.
    pub fn resolve(&self) -> Difficulty {
        match self {
            DifficultySelector::Level(level) => Difficulty::from_level(*level),
            DifficultySelector::Name(name) => name.parse().unwrap_or_default(),
        }
    }
}

/// Search strength and display text for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthProfile {
    pub level: u8,
    pub max_depth: u8,
    /// Percentage of moves replaced by a uniformly random legal move.
    pub error_rate: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub win_rate: &'static str,
}

impl StrengthProfile {
    const fn new(
        level: u8,
        name: &'static str,
        description: &'static str,
        win_rate: &'static str,
    ) -> Self {
        Self {
            level,
            max_depth: depth_for_level(level),
            error_rate: error_rate_for_level(level),
            name,
            description,
            win_rate,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_level(self.level as i64)
    }

    /// Pause a front end should take before showing the move, capped at one second.
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis((200 * self.level as u64).min(1_000))
    }
}

const fn depth_for_level(level: u8) -> u8 {
    let depth = 2 * level - 1;
    if depth > MAX_SEARCH_DEPTH {
        MAX_SEARCH_DEPTH
    } else {
        depth
    }
}

const fn error_rate_for_level(level: u8) -> u8 {
    20u8.saturating_sub(5 * level)
}

pub static STRENGTH_PROFILES: [StrengthProfile; 5] = [
    StrengthProfile::new(
        1,
        "Easy",
        "AI makes many mistakes and only looks 1 move ahead.",
        "~85%",
    ),
    StrengthProfile::new(
        2,
        "Medium",
        "AI occasionally makes mistakes and looks 3 moves ahead.",
        "~90%",
    ),
    StrengthProfile::new(
        3,
        "Hard",
        "AI rarely makes mistakes and looks 5 moves ahead.",
        "~95%",
    ),
    StrengthProfile::new(
        4,
        "Expert",
        "AI doesn't make mistakes and looks 7 moves ahead.",
        "~99%",
    ),
    StrengthProfile::new(5, "Invincible", "Perfect AI, cannot be defeated.", "100%"),
];

/// All profiles, ordered by level.
pub fn strength_profiles() -> &'static [StrengthProfile] {
    &STRENGTH_PROFILES
}

/// Profile for a raw level; unknown levels resolve to level 3.
pub fn profile_for_level(level: i64) -> &'static StrengthProfile {
    Difficulty::from_level(level).profile()
}
