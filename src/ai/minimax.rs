use log::{debug, trace};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::profile::{Difficulty, StrengthProfile};
use crate::game::{evaluate, winner, Board, Move, Player, CENTER, CORNERS, WIN_SCORE};

/// Opening replies on an empty board: the four corners, then the center.
const FIRST_MOVES: [usize; 5] = [0, 2, 6, 8, CENTER];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AiConfig {
    /// The side the engine plays. Opening shortcuts only fire for this side.
    pub player: Player,
    pub profile: &'static StrengthProfile,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            player: Player::O,
            profile: difficulty.profile(),
        }
    }

    pub fn from_level(level: i64) -> Self {
        Self::from_difficulty(Difficulty::from_level(level))
    }

    pub fn with_player(mut self, player: Player) -> Self {
        self.player = player;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(Difficulty::default())
    }
}

/// Which step of the selection policy produced the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    /// Random legal move injected by the profile's error rate.
    Blunder,
    /// Only one empty cell was left.
    Forced,
    OpeningBook,
    Search,
    /// The board is full.
    NoMove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDecision {
    #[serde(rename = "move", skip_serializing_if = "Option::is_none")]
    pub mv: Option<Move>,
    pub kind: DecisionKind,
    /// Searched score of the chosen move, from the mover's side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<i32>,
    pub nodes: u64,
    pub depth: u8,
    pub level: u8,
}

/// Depth-limited minimax with alpha-beta pruning.
///
/// Scores are always taken from `reference`'s side, whichever player is to
/// move at a node, so the result is one of `-10`, `0` or `+10`.
#[derive(Debug, Clone)]
pub struct Searcher {
    reference: Player,
    nodes: u64,
}

impl Searcher {
    pub fn new(reference: Player) -> Self {
        Self {
            reference,
            nodes: 0,
        }
    }

    pub fn reference(&self) -> Player {
        self.reference
    }

    /// Nodes visited since construction.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn search(
        &mut self,
        board: &Board,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
        to_move: Player,
    ) -> i32 {
        self.nodes += 1;

        let score = evaluate(board, self.reference);
        if score != 0 || depth == 0 || board.is_full() {
            return score;
        }

        let next = to_move.opponent();
        if maximizing {
            let mut best = i32::MIN;
            for mv in board.legal_moves() {
                let child = board.with_move(mv, to_move);
                let value = self.search(&child, depth - 1, alpha, beta, false, next);
                best = best.max(value);
                alpha = alpha.max(best);
                if beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = i32::MAX;
            for mv in board.legal_moves() {
                let child = board.with_move(mv, to_move);
                let value = self.search(&child, depth - 1, alpha, beta, true, next);
                best = best.min(value);
                beta = beta.min(best);
                if beta <= alpha {
                    break;
                }
            }
            best
        }
    }
}

/// Move selector: error injection, opening book, then a full alpha-beta sweep
/// over the root moves.
///
/// The random source is a type parameter so tests can seed it or stub it.
pub struct AiAgent<R = SmallRng> {
    config: AiConfig,
    rng: R,
}

impl AiAgent<SmallRng> {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> AiAgent<R> {
    pub fn with_rng(config: AiConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Picks a move for `mover` (the engine's own side when `None`), or
    /// `None` when the board is full.
    pub fn best_move(&mut self, board: &Board, mover: Option<Player>) -> Option<Move> {
        self.decide(board, mover).mv
    }

    pub fn decide(&mut self, board: &Board, mover: Option<Player>) -> MoveDecision {
        let mover = mover.unwrap_or(self.config.player);
        let profile = self.config.profile;
        let legal = board.legal_moves();

        let roll: f64 = self.rng.gen_range(0.0..100.0);
        if roll < f64::from(profile.error_rate) {
            if let Some(&mv) = legal.choose(&mut self.rng) {
                debug!("level {}: random move {mv} (roll {roll:.1})", profile.level);
                return self.decision(Some(mv), DecisionKind::Blunder, None, 0, 0);
            }
        }

        match legal.as_slice() {
            [] => {
                debug!("level {}: board is full, no move", profile.level);
                return self.decision(None, DecisionKind::NoMove, None, 0, 0);
            }
            [only] => return self.decision(Some(*only), DecisionKind::Forced, None, 0, 0),
            _ => {}
        }

        if mover == self.config.player {
            if let Some(mv) = self.opening_move(board) {
                debug!("level {}: opening book move {mv}", profile.level);
                return self.decision(Some(mv), DecisionKind::OpeningBook, None, 0, 0);
            }
        }

        self.search_root(board, mover, &legal)
    }

    fn opening_move(&mut self, board: &Board) -> Option<Move> {
        match board.mark_count() {
            0 => FIRST_MOVES
                .choose(&mut self.rng)
                .and_then(|&index| Move::from_index(index)),
            1 => {
                let corner_taken = CORNERS
                    .iter()
                    .any(|&index| !board.cell_at(index).is_empty());
                let center_free = board.cell_at(CENTER).is_empty();
                if corner_taken && center_free {
                    return Move::from_index(CENTER);
                }
                if !center_free {
                    let free: Vec<usize> = CORNERS
                        .iter()
                        .copied()
                        .filter(|&index| board.cell_at(index).is_empty())
                        .collect();
                    return free
                        .choose(&mut self.rng)
                        .and_then(|&index| Move::from_index(index));
                }
                None
            }
            _ => None,
        }
    }

    fn search_root(&mut self, board: &Board, mover: Player, legal: &[Move]) -> MoveDecision {
        let profile = self.config.profile;
        // Shrinks as the board fills; always covers the remaining game at level 5.
        let depth = profile.max_depth.min(legal.len() as u8 + 1);

        // Every +10 ties under the row-major rule; an immediate win must beat a slower one.
        if let Some(&mv) = legal
            .iter()
            .find(|&&mv| winner(&board.with_move(mv, mover)) == Some(mover))
        {
            debug!("level {}: winning move {mv}", profile.level);
            return self.decision(
                Some(mv),
                DecisionKind::Search,
                Some(WIN_SCORE),
                legal.len() as u64,
                depth,
            );
        }

        let mut searcher = Searcher::new(mover);
        let mut best: Option<(Move, i32)> = None;
        for &mv in legal {
            let child = board.with_move(mv, mover);
            let score = searcher.search(&child, depth, i32::MIN, i32::MAX, false, mover.opponent());
            trace!("candidate {mv} scored {score}");
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
        }

        let (mv, score) = best.map_or((None, None), |(mv, score)| (Some(mv), Some(score)));
        debug!(
            "level {}: searched {} nodes at depth {depth}, chose {:?} ({:?})",
            profile.level,
            searcher.nodes(),
            mv,
            score
        );
        self.decision(mv, DecisionKind::Search, score, searcher.nodes(), depth)
    }

    fn decision(
        &self,
        mv: Option<Move>,
        kind: DecisionKind,
        evaluation: Option<i32>,
        nodes: u64,
        depth: u8,
    ) -> MoveDecision {
        MoveDecision {
            mv,
            kind,
            evaluation,
            nodes,
            depth,
            level: self.config.profile.level,
        }
    }
}

/// One-shot move computation with an entropy-seeded generator.
///
/// `difficulty` outside `1..=5` plays as level 3. `mover` defaults to the
/// engine's side, `O`. Returns `None` only when the board is full.
pub fn compute_move(board: &Board, difficulty: i64, mover: Option<Player>) -> Option<Move> {
    AiAgent::new(AiConfig::from_level(difficulty)).best_move(board, mover)
}

/// Same as [`compute_move`] with a caller-supplied random source.
pub fn compute_move_with_rng<R: Rng>(
    board: &Board,
    difficulty: i64,
    mover: Option<Player>,
    rng: &mut R,
) -> Option<Move> {
    AiAgent::with_rng(AiConfig::from_level(difficulty), rng).best_move(board, mover)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cell, LOSS_SCORE, NEUTRAL_SCORE};
    use rand::rngs::mock::StepRng;

    const E: Cell = Cell::Empty;
    const X: Cell = Cell::X;
    const O: Cell = Cell::O;

    fn mv(row: usize, col: usize) -> Move {
        Move::new(row, col).expect("in bounds")
    }

    fn agent(level: i64, seed: u64) -> AiAgent {
        AiAgent::with_seed(AiConfig::from_level(level), seed)
    }

    /// Draws 0.0 for every float and index 0 for every choice.
    fn low_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    /// Draws just under the top of every range.
    fn high_rng() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn searcher_returns_terminal_score_regardless_of_depth() {
        let board = Board::from_rows([[X, X, X], [O, O, E], [E, E, E]]);
        let mut searcher = Searcher::new(Player::X);
        assert_eq!(
            searcher.search(&board, 5, i32::MIN, i32::MAX, false, Player::O),
            WIN_SCORE
        );
        let mut searcher = Searcher::new(Player::O);
        assert_eq!(
            searcher.search(&board, 0, i32::MIN, i32::MAX, true, Player::O),
            LOSS_SCORE
        );
        assert_eq!(searcher.nodes(), 1);
    }

    #[test]
    fn searcher_with_no_depth_sees_nothing() {
        let board = Board::from_rows([[X, X, E], [O, O, E], [E, E, E]]);
        let mut searcher = Searcher::new(Player::X);
        assert_eq!(
            searcher.search(&board, 0, i32::MIN, i32::MAX, true, Player::X),
            NEUTRAL_SCORE
        );
    }

    #[test]
    fn searcher_finds_forced_loss_for_side_with_split_threats() {
        // O to move, X threatens both (0,2) and (2,0).
        let board = Board::from_rows([[X, X, E], [X, O, E], [E, E, O]]);
        let mut searcher = Searcher::new(Player::O);
        let score = searcher.search(&board, 9, i32::MIN, i32::MAX, true, Player::O);
        assert_eq!(score, LOSS_SCORE);
    }

    #[test]
    fn pruning_visits_fewer_nodes_than_the_full_tree() {
        let board = Board::new().with_move(mv(0, 0), Player::X);
        let mut searcher = Searcher::new(Player::O);
        let score = searcher.search(&board, 9, i32::MIN, i32::MAX, true, Player::O);
        assert_eq!(score, NEUTRAL_SCORE);
        // 8! leaf orderings without pruning.
        assert!(searcher.nodes() < 40_320);
    }

    /// Plain minimax over every branch, no bounds.
    fn unpruned(
        board: &Board,
        depth: u8,
        maximizing: bool,
        to_move: Player,
        reference: Player,
    ) -> i32 {
        let score = evaluate(board, reference);
        if score != 0 || depth == 0 || board.is_full() {
            return score;
        }
        let scores = board.legal_moves().into_iter().map(|mv| {
            let child = board.with_move(mv, to_move);
            unpruned(&child, depth - 1, !maximizing, to_move.opponent(), reference)
        });
        if maximizing {
            scores.max().expect("non-full board")
        } else {
            scores.min().expect("non-full board")
        }
    }

    #[test]
    fn pruned_scores_match_unpruned_minimax() {
        let positions = [
            (Board::new().with_move(mv(0, 0), Player::X), Player::O),
            (Board::new().with_move(mv(0, 1), Player::X), Player::O),
            (Board::from_rows([[X, E, E], [E, O, E], [E, E, X]]), Player::O),
            (Board::from_rows([[X, X, E], [X, O, E], [E, E, O]]), Player::O),
            (Board::from_rows([[O, X, E], [E, O, X], [E, X, E]]), Player::O),
            (Board::from_rows([[X, O, X], [E, O, E], [E, X, E]]), Player::O),
            (Board::from_rows([[X, E, E], [E, E, E], [E, E, E]]), Player::O),
            (Board::from_rows([[X, O, E], [E, X, E], [E, E, E]]), Player::O),
        ];
        for (board, to_move) in positions {
            for depth in [1, 2, 3, 5, 9] {
                for reference in [Player::X, Player::O] {
                    for maximizing in [true, false] {
                        let expected = unpruned(&board, depth, maximizing, to_move, reference);
                        let mut searcher = Searcher::new(reference);
                        let actual =
                            searcher.search(&board, depth, i32::MIN, i32::MAX, maximizing, to_move);
                        assert_eq!(
                            actual, expected,
                            "depth {depth}, reference {reference:?}, maximizing {maximizing}:\n{board}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn full_board_has_no_move() {
        let board = Board::from_rows([[X, O, X], [X, O, O], [O, X, X]]);
        for level in 1..=5 {
            let decision = agent(level, 7).decide(&board, None);
            assert_eq!(decision.mv, None);
            assert_eq!(decision.kind, DecisionKind::NoMove);
        }
    }

    #[test]
    fn single_empty_cell_is_always_played() {
        let board = Board::from_rows([[X, O, X], [X, O, O], [O, X, E]]);
        for level in 1..=5 {
            for seed in 0..20 {
                assert_eq!(agent(level, seed).best_move(&board, None), Some(mv(2, 2)));
            }
        }
    }

    #[test]
    fn empty_board_opens_in_a_corner_or_center() {
        let config = AiConfig::from_level(5).with_player(Player::X);
        for seed in 0..50 {
            let decision = AiAgent::with_seed(config, seed).decide(&Board::new(), None);
            assert_eq!(decision.kind, DecisionKind::OpeningBook);
            let index = decision.mv.expect("a move").index();
            assert!(FIRST_MOVES.contains(&index), "opened at {index}");
        }
    }

    #[test]
    fn corner_opening_is_answered_in_the_center() {
        for corner in CORNERS {
            let board = Board::new().with_move(Move::from_index(corner).expect("corner"), Player::X);
            assert_eq!(agent(5, 3).best_move(&board, None), Some(mv(1, 1)));
        }
    }

    #[test]
    fn center_opening_is_answered_in_a_corner() {
        let board = Board::new().with_move(mv(1, 1), Player::X);
        for seed in 0..30 {
            let reply = agent(5, seed).best_move(&board, None).expect("a move");
            assert!(reply.is_corner(), "replied {reply}");
        }
    }

    #[test]
    fn edge_opening_falls_through_to_search() {
        let board = Board::new().with_move(mv(0, 1), Player::X);
        let decision = agent(5, 0).decide(&board, None);
        assert_eq!(decision.kind, DecisionKind::Search);
        assert_eq!(decision.evaluation, Some(NEUTRAL_SCORE));
        assert!(decision.nodes > 0);
    }

    #[test]
    fn explicit_opponent_mover_skips_the_opening_book() {
        let decision = agent(5, 0).decide(&Board::new(), Some(Player::X));
        assert_eq!(decision.kind, DecisionKind::Search);
        // Every first move draws, so the first in row-major order wins the tie.
        assert_eq!(decision.mv, Some(mv(0, 0)));
        assert_eq!(decision.evaluation, Some(NEUTRAL_SCORE));
    }

    #[test]
    fn takes_immediate_win_over_slower_win() {
        // O wins now at (2,2); (0,2) comes first in row-major order and also
        // forces a win, two plies later.
        let board = Board::from_rows([[O, X, E], [E, O, X], [E, X, E]]);
        let decision = agent(5, 0).decide(&board, None);
        assert_eq!(decision.mv, Some(mv(2, 2)));
        assert_eq!(decision.evaluation, Some(WIN_SCORE));
    }

    #[test]
    fn blocks_an_open_threat() {
        let board = Board::from_rows([[X, X, E], [E, O, E], [E, E, E]]);
        assert_eq!(agent(5, 0).best_move(&board, None), Some(mv(0, 2)));
    }

    #[test]
    fn low_roll_injects_a_random_move_at_easy() {
        let board = Board::from_rows([[X, X, E], [E, O, E], [E, E, E]]);
        let decision = AiAgent::with_rng(AiConfig::from_level(1), low_rng()).decide(&board, None);
        assert_eq!(decision.kind, DecisionKind::Blunder);
        assert!(board.get(decision.mv.expect("a move")).is_empty());
    }

    #[test]
    fn zero_error_rate_never_blunders() {
        let board = Board::from_rows([[X, X, E], [E, O, E], [E, E, E]]);
        let decision = AiAgent::with_rng(AiConfig::from_level(4), low_rng()).decide(&board, None);
        assert_eq!(decision.kind, DecisionKind::Search);
        assert_eq!(decision.mv, Some(mv(0, 2)));
    }

    #[test]
    fn high_roll_never_blunders() {
        let board = Board::from_rows([[X, X, E], [E, O, E], [E, E, E]]);
        let decision = AiAgent::with_rng(AiConfig::from_level(1), high_rng()).decide(&board, None);
        assert_ne!(decision.kind, DecisionKind::Blunder);
    }

    #[test]
    fn blunder_on_full_board_still_reports_no_move() {
        let board = Board::from_rows([[X, O, X], [X, O, O], [O, X, X]]);
        let decision = AiAgent::with_rng(AiConfig::from_level(1), low_rng()).decide(&board, None);
        assert_eq!(decision.kind, DecisionKind::NoMove);
    }

    #[test]
    fn depth_budget_tracks_empty_cells() {
        let board = Board::from_rows([[X, O, X], [E, O, E], [E, X, E]]);
        let decision = agent(5, 0).decide(&board, None);
        assert_eq!(decision.depth, 5);
        let decision = agent(2, 0).decide(&board, Some(Player::O));
        assert!(decision.depth <= 3);
    }

    #[test]
    fn same_seed_same_move() {
        let board = Board::from_rows([[X, E, E], [E, O, E], [E, E, X]]);
        for level in 1..=5 {
            let first = agent(level, 99).best_move(&board, None);
            let second = agent(level, 99).best_move(&board, None);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn compute_move_with_rng_matches_agent() {
        let board = Board::new().with_move(mv(1, 1), Player::X);
        let mut rng = SmallRng::seed_from_u64(11);
        let via_fn = compute_move_with_rng(&board, 5, None, &mut rng);
        let via_agent = agent(5, 11).best_move(&board, None);
        assert_eq!(via_fn, via_agent);
    }

    #[test]
    fn decision_serializes_move_under_move_key() {
        let board = Board::new().with_move(mv(0, 0), Player::X);
        let decision = agent(5, 0).decide(&board, None);
        let json = serde_json::to_value(&decision).expect("serialize");
        assert_eq!(json["move"]["row"], 1);
        assert_eq!(json["move"]["col"], 1);
        assert_eq!(json["kind"], "openingbook");
        assert_eq!(json["level"], 5);
    }
}
