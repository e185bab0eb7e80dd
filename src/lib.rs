pub mod ai;
pub mod error;
pub mod game;
pub mod utils;

use std::collections::BTreeMap;

use gloo_timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    compute_move, compute_move_with_rng, profile_for_level, strength_profiles, AiAgent, AiConfig,
    DecisionKind, Difficulty, DifficultySelector, MoveDecision, Searcher, StrengthProfile,
};
pub use error::EngineError;
pub use game::{evaluate, outcome, winner, Board, Cell, GameOutcome, Move, Player};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::init_logging();
}

/// Answer shape the browser game loop expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum MoveResponse {
    Move {
        #[serde(rename = "move")]
        index: usize,
        row: usize,
        col: usize,
    },
    NoMove {
        error: &'static str,
    },
}

impl From<Option<Move>> for MoveResponse {
    fn from(mv: Option<Move>) -> Self {
        match mv {
            Some(mv) => MoveResponse::Move {
                index: mv.index(),
                row: mv.row(),
                col: mv.col(),
            },
            None => MoveResponse::NoMove {
                error: "No valid moves",
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    board: Board,
    #[serde(default)]
    difficulty: Option<DifficultySelector>,
    #[serde(default)]
    mover: Option<Player>,
}

#[derive(Serialize)]
struct DifficultyInfo {
    name: &'static str,
    description: &'static str,
    win_rate: &'static str,
}

fn difficulty_info_map() -> BTreeMap<String, DifficultyInfo> {
    strength_profiles()
        .iter()
        .map(|profile| {
            (
                profile.level.to_string(),
                DifficultyInfo {
                    name: profile.name,
                    description: profile.description,
                    win_rate: profile.win_rate,
                },
            )
        })
        .collect()
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_plain_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn board_from_js(board: JsValue) -> Result<Board, JsValue> {
    from_value(board).map_err(JsValue::from)
}

fn difficulty_from_js(difficulty: JsValue) -> Difficulty {
    from_value::<Option<DifficultySelector>>(difficulty)
        .ok()
        .flatten()
        .map(|selector| selector.resolve())
        .unwrap_or_default()
}

fn mover_from_js(mover: Option<String>) -> Option<Player> {
    mover.as_deref().and_then(|value| value.parse().ok())
}

fn respond(board: &Board, difficulty: Difficulty, mover: Option<Player>) -> MoveResponse {
    AiAgent::new(AiConfig::from_difficulty(difficulty))
        .best_move(board, mover)
        .into()
}

/// `board` is a 9-element array of `"X"`, `"O"` or `null`; `difficulty` a
/// level or a name. Resolves to `{ move, row, col }` or `{ error }`.
#[wasm_bindgen(js_name = "computeMove")]
pub fn compute_move_js(
    board: JsValue,
    difficulty: JsValue,
    mover: Option<String>,
) -> Result<JsValue, JsValue> {
    let board = board_from_js(board)?;
    let response = respond(&board, difficulty_from_js(difficulty), mover_from_js(mover));
    to_plain_js(&response)
}

/// JSON flavour of [`compute_move_js`]: `{"board": [...], "difficulty": 3}`.
#[wasm_bindgen(js_name = "computeMoveJson")]
pub fn compute_move_json(request_json: &str) -> Result<String, JsValue> {
    let request: MoveRequest = serde_json::from_str(request_json).map_err(serde_to_js_error)?;
    let difficulty = request
        .difficulty
        .map(|selector| selector.resolve())
        .unwrap_or_default();
    let response = respond(&request.board, difficulty, request.mover);
    serde_json::to_string(&response).map_err(serde_to_js_error)
}

/// Like `computeMove`, after the profile's thinking pause.
#[wasm_bindgen(js_name = "thinkMove")]
pub fn think_move(
    board: JsValue,
    difficulty: JsValue,
    mover: Option<String>,
) -> Result<Promise, JsValue> {
    let board = board_from_js(board)?;
    let difficulty = difficulty_from_js(difficulty);
    let mover = mover_from_js(mover);
    let delay = difficulty.profile().think_delay().as_millis() as u32;

    Ok(future_to_promise(async move {
        if delay > 0 {
            TimeoutFuture::new(delay).await;
        }
        to_plain_js(&respond(&board, difficulty, mover))
    }))
}

#[wasm_bindgen(js_name = "strengthProfiles")]
pub fn strength_profiles_js() -> Result<JsValue, JsValue> {
    to_plain_js(&strength_profiles())
}

/// Display text keyed by level, `{"1": {name, description, win_rate}, ...}`.
#[wasm_bindgen(js_name = "difficultyInfo")]
pub fn difficulty_info() -> Result<JsValue, JsValue> {
    to_plain_js(&difficulty_info_map())
}

#[wasm_bindgen(js_name = "gameOutcome")]
pub fn game_outcome(board: JsValue) -> Result<JsValue, JsValue> {
    let board = board_from_js(board)?;
    to_plain_js(&outcome(&board))
}

/// A long-lived opponent for one game.
#[wasm_bindgen]
pub struct AiPlayer {
    agent: AiAgent<SmallRng>,
}

#[wasm_bindgen]
impl AiPlayer {
    #[wasm_bindgen(constructor)]
    pub fn new(difficulty: JsValue, player: Option<String>, seed: Option<u32>) -> AiPlayer {
        let player = mover_from_js(player).unwrap_or(Player::O);
        let config = AiConfig::from_difficulty(difficulty_from_js(difficulty)).with_player(player);
        let agent = match seed {
            Some(seed) => AiAgent::with_seed(config, u64::from(seed)),
            None => AiAgent::new(config),
        };
        AiPlayer { agent }
    }

    #[wasm_bindgen(getter)]
    pub fn level(&self) -> u8 {
        self.agent.config().profile.level
    }

    #[wasm_bindgen(js_name = "bestMove")]
    pub fn best_move(&mut self, board: JsValue) -> Result<JsValue, JsValue> {
        let board = board_from_js(board)?;
        let response: MoveResponse = self.agent.best_move(&board, None).into();
        to_plain_js(&response)
    }

    /// Full decision report: move, policy step, score, nodes searched.
    pub fn decide(&mut self, board: JsValue) -> Result<JsValue, JsValue> {
        let board = board_from_js(board)?;
        to_plain_js(&self.agent.decide(&board, None))
    }
}
