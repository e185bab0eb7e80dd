//! Move search and strength control.

pub mod minimax;
pub mod profile;

pub use minimax::{
    compute_move, compute_move_with_rng, AiAgent, AiConfig, DecisionKind, MoveDecision, Searcher,
};
pub use profile::{
    profile_for_level, strength_profiles, Difficulty, DifficultySelector, StrengthProfile,
    MAX_SEARCH_DEPTH, STRENGTH_PROFILES,
};
