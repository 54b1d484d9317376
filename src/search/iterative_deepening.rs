//! Iterative deepening search with negamax alpha-beta pruning.
//!
//! The driver deepens from 1 until the depth ceiling, the time budget, the
//! external stop flag, or a forced mate. Each depth after the first opens an
//! aspiration window around the previous score and re-searches with a doubled
//! half-width on fail-low/high. Inside the tree: transposition-table cutoffs,
//! reverse futility, verified null-move, futility, and late-move reductions,
//! with MVV-LVA + killer + history move ordering and a quiescence search with
//! stand-pat and delta pruning at the leaves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::game_state::board::Board;
use crate::game_state::chess_types::{Color, PieceKind};
use crate::move_generation::legal_move_generator::{
    generate_legal, in_check, is_capture, is_draw_by_fifty_move_rule,
};
use crate::moves::move_encoding::{
    move_from, move_kind, move_to, promotion_kind, Move, MoveKind, MoveList, NULL_MOVE,
};
use crate::search::board_scoring::{BoardScorer, PIECE_VALUES};
use crate::search::transposition_table::{Bound, TranspositionTable};

pub const MATE_SCORE: i32 = 30_000;
pub const MAX_PLY: usize = 64;

const ASPIRATION_WINDOW: i32 = 50;
const DELTA_MARGIN: i32 = 200;

const FUTILITY_MAX_DEPTH: u8 = 3;
const FUTILITY_MARGINS: [i32; 4] = [0, 200, 350, 500];
const RFP_MARGINS: [i32; 4] = [0, 100, 250, 400];

const NULL_MOVE_MIN_DEPTH: u8 = 3;
const NULL_MOVE_VERIFY_DEPTH: u8 = 6;
const NULL_MOVE_MIN_MATERIAL: i32 = 400;

const LMR_MIN_DEPTH: u8 = 3;
const LMR_FULL_SEARCH_MOVES: usize = 3;

const TT_MOVE_SCORE: i32 = 10_000_000;
const CAPTURE_BASE: i32 = 1_000_000;
const KILLER1_SCORE: i32 = 900_000;
const KILLER2_SCORE: i32 = 800_000;

#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Depth ceiling; 0 means "as deep as MAX_PLY allows".
    pub max_depth: u8,
    pub movetime_ms: Option<u64>,
    pub stop_flag: Option<Arc<AtomicBool>>,
    /// Position hashes of the game so far, oldest first, for repetition
    /// detection across the game/search boundary.
    pub repetition_history: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: i32,
    pub reached_depth: u8,
    pub nodes: u64,
    pub elapsed_ms: u64,
}

/// Snapshot reported once per completed iteration, in depth order.
#[derive(Debug, Clone, Default)]
pub struct SearchInfo {
    pub depth: u8,
    pub score: i32,
    /// Mate distance in plies from the root; positive when the engine mates.
    pub mate_in: Option<i32>,
    pub nodes: u64,
    pub time_ms: u64,
    pub hashfull: u32,
    pub nps: u64,
    pub pv: Vec<Move>,
}

type HistoryTable = [[[i32; 64]; 64]; 2];

struct SearchState<'a> {
    scorer: &'a dyn BoardScorer,
    killers: [[Move; 2]; MAX_PLY],
    history: Box<HistoryTable>,
    repetition_history: Vec<u64>,
    deadline: Option<Instant>,
    stop_flag: Option<Arc<AtomicBool>>,
    stopped: bool,
    nodes: u64,
}

impl<'a> SearchState<'a> {
    fn new(scorer: &'a dyn BoardScorer, config: &SearchConfig, started_at: Instant) -> Self {
        SearchState {
            scorer,
            killers: [[NULL_MOVE; 2]; MAX_PLY],
            history: Box::new([[[0; 64]; 64]; 2]),
            repetition_history: config.repetition_history.clone(),
            deadline: config
                .movetime_ms
                .map(|ms| started_at + Duration::from_millis(ms.max(1))),
            stop_flag: config.stop_flag.clone(),
            stopped: false,
            nodes: 0,
        }
    }

    /// Cooperative cancellation point, polled at every node entry.
    #[inline]
    fn check_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if let Some(flag) = &self.stop_flag {
            if flag.load(Ordering::Relaxed) {
                self.stopped = true;
                return true;
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.stopped = true;
                return true;
            }
        }
        false
    }

    fn record_killer(&mut self, ply: usize, m: Move) {
        if ply >= MAX_PLY || self.killers[ply][0] == m {
            return;
        }
        self.killers[ply][1] = self.killers[ply][0];
        self.killers[ply][0] = m;
    }

    fn record_history(&mut self, side: Color, m: Move, depth: u8) {
        let bonus = i32::from(depth) * i32::from(depth);
        self.history[side.index()][move_from(m) as usize][move_to(m) as usize] += bonus;
    }
}

/// Run a full iterative-deepening search and return the final result.
pub fn iterative_deepening_search(
    board: &Board,
    scorer: &dyn BoardScorer,
    config: SearchConfig,
    tt: &mut TranspositionTable,
    mut info_callback: Option<&mut dyn FnMut(&SearchInfo)>,
) -> SearchResult {
    let started_at = Instant::now();
    let mut state = SearchState::new(scorer, &config, started_at);

    // The root position itself takes part in repetition counting.
    if state.repetition_history.last() != Some(&board.zobrist_key) {
        state.repetition_history.push(board.zobrist_key);
    }

    tt.new_search();

    let ceiling = if config.max_depth == 0 {
        MAX_PLY as u8
    } else {
        config.max_depth.min(MAX_PLY as u8)
    };

    let mut root = *board;
    let mut best = SearchResult::default();

    for depth in 1..=ceiling {
        let (best_move, score) = if depth <= 1 {
            search_root(&mut root, depth, -MATE_SCORE - 1, MATE_SCORE + 1, tt, &mut state)
        } else {
            search_root_with_aspiration(&mut root, depth, best.score, tt, &mut state)
        };

        if state.stopped {
            // A stopped iteration is discarded, except that depth 1 must
            // still publish a legal reply.
            if depth == 1 && best_move != NULL_MOVE {
                best.best_move = best_move;
                best.score = score;
                best.reached_depth = depth;
            }
            break;
        }

        best.best_move = best_move;
        best.score = score;
        best.reached_depth = depth;
        best.nodes = state.nodes;

        if let Some(callback) = info_callback.as_deref_mut() {
            let elapsed_ms = started_at.elapsed().as_millis() as u64;
            let mate_in = if score > MATE_SCORE - MAX_PLY as i32 {
                Some(MATE_SCORE - score)
            } else if score < -MATE_SCORE + MAX_PLY as i32 {
                Some(-(MATE_SCORE + score))
            } else {
                None
            };
            callback(&SearchInfo {
                depth,
                score,
                mate_in,
                nodes: state.nodes,
                time_ms: elapsed_ms,
                hashfull: tt.hashfull_permille(1000),
                nps: if elapsed_ms == 0 {
                    0
                } else {
                    state.nodes.saturating_mul(1000) / elapsed_ms
                },
                pv: extract_principal_variation(board, tt, depth as usize),
            });
        }

        // A forced mate cannot improve with more depth.
        if score.abs() > MATE_SCORE - MAX_PLY as i32 {
            break;
        }
    }

    best.nodes = state.nodes;
    best.elapsed_ms = started_at.elapsed().as_millis() as u64;
    best
}

fn search_root_with_aspiration(
    board: &mut Board,
    depth: u8,
    prev_score: i32,
    tt: &mut TranspositionTable,
    state: &mut SearchState,
) -> (Move, i32) {
    let mut delta = ASPIRATION_WINDOW;
    let mut alpha = (prev_score - delta).max(-MATE_SCORE - 1);
    let mut beta = (prev_score + delta).min(MATE_SCORE + 1);

    loop {
        let (best_move, score) = search_root(board, depth, alpha, beta, tt, state);
        if state.stopped {
            return (best_move, score);
        }

        if score <= alpha {
            alpha = (alpha - delta).max(-MATE_SCORE - 1);
            delta *= 2;
        } else if score >= beta {
            beta = (beta + delta).min(MATE_SCORE + 1);
            delta *= 2;
        } else {
            return (best_move, score);
        }
    }
}

fn search_root(
    board: &mut Board,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    tt: &mut TranspositionTable,
    state: &mut SearchState,
) -> (Move, i32) {
    let alpha_orig = alpha;
    let mut moves = generate_legal(board);

    if moves.is_empty() {
        if in_check(board) {
            return (NULL_MOVE, -MATE_SCORE);
        }
        return (NULL_MOVE, 0);
    }

    if is_threefold_repetition(board, &state.repetition_history) {
        // Drawn at the root; any legal move is as good as another.
        return (moves.get(0), 0);
    }

    let tt_move = tt.probe(board.zobrist_key).map_or(NULL_MOVE, |e| e.best_move);
    let mut scores = [0i32; 256];
    score_moves(board, &moves, &mut scores, tt_move, state, 0);

    let mut best_move = moves.get(0);
    let mut best_score = -MATE_SCORE - 1;

    for i in 0..moves.len() {
        pick_best(&mut moves, &mut scores, i);
        let m = moves.get(i);

        let undo = board.make_move(m);
        state.repetition_history.push(board.zobrist_key);
        let score = -negamax(board, depth - 1, -beta, -alpha, 1, true, tt, state);
        state.repetition_history.pop();
        board.unmake_move(m, &undo);

        if state.stopped {
            break;
        }

        if score > best_score {
            best_score = score;
            best_move = m;
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            break;
        }
    }

    if !state.stopped {
        let bound = if best_score <= alpha_orig {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        tt.store(
            board.zobrist_key,
            score_to_tt(best_score, 0),
            depth,
            bound,
            best_move,
        );
    }

    (best_move, best_score)
}

#[allow(clippy::too_many_arguments)]
fn negamax(
    board: &mut Board,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    ply: usize,
    allow_null: bool,
    tt: &mut TranspositionTable,
    state: &mut SearchState,
) -> i32 {
    if state.check_stop() {
        return 0;
    }
    state.nodes += 1;

    if is_threefold_repetition(board, &state.repetition_history)
        || is_draw_by_fifty_move_rule(board)
    {
        return 0;
    }

    let moves = generate_legal(board);
    if moves.is_empty() {
        if in_check(board) {
            return -MATE_SCORE + ply as i32;
        }
        return 0;
    }

    let mut tt_move = NULL_MOVE;
    if let Some(entry) = tt.probe(board.zobrist_key) {
        tt_move = entry.best_move;
        if entry.depth >= depth {
            let tt_score = score_from_tt(entry.score, ply);
            match entry.bound {
                Bound::Exact => return tt_score,
                Bound::Lower if tt_score >= beta => return tt_score,
                Bound::Upper if tt_score <= alpha => return tt_score,
                _ => {}
            }
        }
    }

    if depth == 0 {
        return quiescence(board, alpha, beta, ply, state);
    }

    let in_check_here = in_check(board);
    let is_pv = beta - alpha > 1;
    let static_eval = state.scorer.score(board);

    // Reverse futility: if the static eval beats beta by a depth-scaled
    // margin in a non-PV node, the full search will not come back under it.
    if !is_pv
        && !in_check_here
        && depth <= FUTILITY_MAX_DEPTH
        && beta.abs() < MATE_SCORE - MAX_PLY as i32
        && static_eval - RFP_MARGINS[depth as usize] >= beta
    {
        return static_eval - RFP_MARGINS[depth as usize];
    }

    if allow_null
        && !in_check_here
        && depth >= NULL_MOVE_MIN_DEPTH
        && non_pawn_material(board, board.side_to_move) >= NULL_MOVE_MIN_MATERIAL
    {
        let reduction = 2 + u8::from(depth > 6);
        let null_depth = depth.saturating_sub(1 + reduction);

        let undo = board.make_null_move();
        state.repetition_history.push(board.zobrist_key);
        let null_score = -negamax(board, null_depth, -beta, -beta + 1, ply + 1, false, tt, state);
        state.repetition_history.pop();
        board.unmake_null_move(&undo);

        if state.stopped {
            return 0;
        }

        if null_score >= beta {
            if depth >= NULL_MOVE_VERIFY_DEPTH {
                // Verify with a real (non-null) reduced-window search before
                // trusting the cutoff.
                let verify = negamax(board, depth - 1, beta - 1, beta, ply, false, tt, state);
                if state.stopped {
                    return 0;
                }
                if verify >= beta {
                    return beta;
                }
            } else {
                return beta;
            }
        }
    }

    let mut moves = moves;
    let mut scores = [0i32; 256];
    score_moves(board, &moves, &mut scores, tt_move, state, ply);

    let mut best_move = NULL_MOVE;
    let mut bound = Bound::Upper;

    for i in 0..moves.len() {
        pick_best(&mut moves, &mut scores, i);
        let m = moves.get(i);
        let capture = is_capture(board, m);
        let promotion = move_kind(m) == MoveKind::Promotion;

        // Futility: late quiet moves near the leaves cannot raise alpha when
        // the static eval is hopeless. Never prune the first move.
        if !is_pv
            && !in_check_here
            && depth <= FUTILITY_MAX_DEPTH
            && i > 0
            && !capture
            && !promotion
            && alpha.abs() < MATE_SCORE - MAX_PLY as i32
            && static_eval + FUTILITY_MARGINS[depth as usize] <= alpha
        {
            continue;
        }

        let undo = board.make_move(m);
        state.repetition_history.push(board.zobrist_key);

        let reduce = !in_check_here
            && depth >= LMR_MIN_DEPTH
            && i >= LMR_FULL_SEARCH_MOVES
            && !capture
            && !promotion;

        let score = if reduce {
            let reduction = lmr_reduction(depth, i).max(1);
            let reduced_depth = depth.saturating_sub(1 + reduction);

            // Reduced zero-window probe, then progressively wider re-searches.
            let mut score =
                -negamax(board, reduced_depth, -alpha - 1, -alpha, ply + 1, true, tt, state);
            if !state.stopped && score > alpha {
                score = -negamax(board, depth - 1, -alpha - 1, -alpha, ply + 1, true, tt, state);
            }
            if !state.stopped && score > alpha && score < beta {
                score = -negamax(board, depth - 1, -beta, -alpha, ply + 1, true, tt, state);
            }
            score
        } else {
            -negamax(board, depth - 1, -beta, -alpha, ply + 1, true, tt, state)
        };

        state.repetition_history.pop();
        board.unmake_move(m, &undo);

        if state.stopped {
            return 0;
        }

        if score >= beta {
            tt.store(board.zobrist_key, score_to_tt(score, ply), depth, Bound::Lower, m);
            if !capture {
                state.record_killer(ply, m);
                state.record_history(board.side_to_move, m, depth);
            }
            return beta;
        }
        if score > alpha {
            alpha = score;
            best_move = m;
            bound = Bound::Exact;
        }
    }

    tt.store(board.zobrist_key, score_to_tt(alpha, ply), depth, bound, best_move);
    alpha
}

fn quiescence(board: &mut Board, mut alpha: i32, beta: i32, ply: usize, state: &mut SearchState) -> i32 {
    if state.check_stop() {
        return 0;
    }
    state.nodes += 1;

    if is_threefold_repetition(board, &state.repetition_history) {
        return 0;
    }

    let in_check_here = in_check(board);
    let all_moves = generate_legal(board);

    let mut stand_pat = 0;
    let mut moves = MoveList::new();

    if in_check_here {
        // Evasions cannot stand pat; search every legal reply.
        moves = all_moves;
    } else {
        stand_pat = state.scorer.score(board);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        for &m in all_moves.iter() {
            if is_capture(board, m) || move_kind(m) == MoveKind::Promotion {
                moves.add(m);
            }
        }
    }

    if moves.is_empty() {
        if in_check_here {
            return -MATE_SCORE + ply as i32;
        }
        return alpha;
    }

    let mut scores = [0i32; 256];
    for i in 0..moves.len() {
        scores[i] = mvv_lva_score(board, moves.get(i));
    }

    for i in 0..moves.len() {
        pick_best(&mut moves, &mut scores, i);
        let m = moves.get(i);

        // Delta pruning: skip captures that cannot lift the stand-pat score
        // near alpha even with a safety margin.
        if !in_check_here && stand_pat + capture_gain(board, m) + DELTA_MARGIN < alpha {
            continue;
        }

        let undo = board.make_move(m);
        state.repetition_history.push(board.zobrist_key);
        let score = -quiescence(board, -beta, -alpha, ply + 1, state);
        state.repetition_history.pop();
        board.unmake_move(m, &undo);

        if state.stopped {
            return 0;
        }

        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

/// Walk the table's best-move chain from the root, validating each move.
pub fn extract_principal_variation(
    board: &Board,
    tt: &TranspositionTable,
    max_len: usize,
) -> Vec<Move> {
    let mut pv = Vec::new();
    let mut current = *board;

    for _ in 0..max_len {
        let Some(entry) = tt.probe(current.zobrist_key) else {
            break;
        };
        if entry.best_move == NULL_MOVE {
            break;
        }
        if !generate_legal(&current).contains(entry.best_move) {
            break;
        }
        pv.push(entry.best_move);
        current.make_move(entry.best_move);
    }

    pv
}

// ============================================================
// Helpers
// ============================================================

/// Mate scores enter the table as "distance from this node" so an entry read
/// back at a different ply still describes the same mate.
#[inline]
fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_SCORE - MAX_PLY as i32 {
        score + ply as i32
    } else if score < -MATE_SCORE + MAX_PLY as i32 {
        score - ply as i32
    } else {
        score
    }
}

#[inline]
fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_SCORE - MAX_PLY as i32 {
        score - ply as i32
    } else if score < -MATE_SCORE + MAX_PLY as i32 {
        score + ply as i32
    } else {
        score
    }
}

/// Threefold over the game-plus-search stack: the current key must appear
/// three times among positions with the same side to move, all within the
/// reversible window bounded by the halfmove clock.
fn is_threefold_repetition(board: &Board, history: &[u64]) -> bool {
    if board.halfmove_clock < 4 || history.is_empty() {
        return false;
    }

    let key = board.zobrist_key;
    let len = history.len();
    let max_back = (board.halfmove_clock as usize).min(len - 1);

    let mut count = 1u32;
    let mut back = 2usize;
    while back <= max_back {
        if history[len - 1 - back] == key {
            count += 1;
            if count >= 3 {
                return true;
            }
        }
        back += 2;
    }
    false
}

#[inline]
fn non_pawn_material(board: &Board, color: Color) -> i32 {
    let idx = color.index();
    let mut material = 0i32;
    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ] {
        material += board.pieces[idx][kind.index()].count_ones() as i32
            * PIECE_VALUES[kind.index()];
    }
    material
}

fn score_moves(
    board: &Board,
    moves: &MoveList,
    scores: &mut [i32; 256],
    tt_move: Move,
    state: &SearchState,
    ply: usize,
) {
    let side = board.side_to_move;
    for i in 0..moves.len() {
        let m = moves.get(i);
        scores[i] = if m == tt_move && tt_move != NULL_MOVE {
            TT_MOVE_SCORE
        } else if is_capture(board, m) {
            mvv_lva_score(board, m)
        } else if ply < MAX_PLY && m == state.killers[ply][0] {
            KILLER1_SCORE
        } else if ply < MAX_PLY && m == state.killers[ply][1] {
            KILLER2_SCORE
        } else {
            state.history[side.index()][move_from(m) as usize][move_to(m) as usize]
        };
    }
}

/// Incremental selection: float the best-scored remaining move to `index`.
fn pick_best(moves: &mut MoveList, scores: &mut [i32; 256], index: usize) {
    let mut best_index = index;
    for i in (index + 1)..moves.len() {
        if scores[i] > scores[best_index] {
            best_index = i;
        }
    }
    if best_index != index {
        moves.swap(index, best_index);
        scores.swap(index, best_index);
    }
}

fn mvv_lva_score(board: &Board, m: Move) -> i32 {
    let victim_value = if move_kind(m) == MoveKind::EnPassant {
        PIECE_VALUES[PieceKind::Pawn.index()]
    } else {
        board
            .piece_on(move_to(m))
            .map_or(0, |p| PIECE_VALUES[p.kind.index()])
    };
    let attacker_value = board
        .piece_on(move_from(m))
        .map_or(0, |p| PIECE_VALUES[p.kind.index()]);

    CAPTURE_BASE + victim_value * 10 - attacker_value
}

/// Captured material plus promotion gain, for delta pruning.
fn capture_gain(board: &Board, m: Move) -> i32 {
    let mut gain = if move_kind(m) == MoveKind::EnPassant {
        PIECE_VALUES[PieceKind::Pawn.index()]
    } else {
        board
            .piece_on(move_to(m))
            .map_or(0, |p| PIECE_VALUES[p.kind.index()])
    };
    if move_kind(m) == MoveKind::Promotion {
        gain += PIECE_VALUES[promotion_kind(m).index()] - PIECE_VALUES[PieceKind::Pawn.index()];
    }
    gain
}

static LMR_TABLE: OnceLock<[[u8; 64]; 64]> = OnceLock::new();

#[inline]
fn lmr_reduction(depth: u8, move_index: usize) -> u8 {
    let table = LMR_TABLE.get_or_init(|| {
        let mut table = [[0u8; 64]; 64];
        for (d, row) in table.iter_mut().enumerate().skip(1) {
            for (m, cell) in row.iter_mut().enumerate().skip(1) {
                *cell = (0.75 + (d as f64).ln() * (m as f64).ln() / 2.25) as u8;
            }
        }
        table
    });
    table[usize::from(depth - 1).min(63)][move_index.min(63)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::board::Board;
    use crate::move_generation::legal_move_generator::{is_checkmate, is_stalemate};
    use crate::search::board_scoring::TaperedScorer;
    use crate::utils::uci_moves::parse_uci_move;

    fn run_search(fen: &str, depth: u8) -> (Board, SearchResult) {
        let board = Board::from_fen(fen).expect("FEN should parse");
        let mut tt = TranspositionTable::new_with_mb(8);
        let result = iterative_deepening_search(
            &board,
            &TaperedScorer,
            SearchConfig {
                max_depth: depth,
                ..SearchConfig::default()
            },
            &mut tt,
            None,
        );
        (board, result)
    }

    #[test]
    fn finds_back_rank_mate_in_one() {
        let (board, result) = run_search("6k1/5ppp/8/8/8/8/8/K6Q w - - 0 1", 3);

        assert!(
            result.score > MATE_SCORE - 100,
            "expected a mate score, got {}",
            result.score
        );
        let mut after = board;
        after.make_move(result.best_move);
        assert!(is_checkmate(&after), "best move must deliver mate");
    }

    #[test]
    fn finds_scholars_mate() {
        let (board, result) = run_search(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
            3,
        );

        let mut after = board;
        after.make_move(result.best_move);
        assert!(is_checkmate(&after), "best move must deliver mate");
    }

    #[test]
    fn finds_mate_in_two() {
        let (_, result) = run_search("kbK5/pp6/1P6/8/8/8/8/R7 w - - 0 1", 5);
        assert!(
            result.score > MATE_SCORE - 100,
            "expected a mate score, got {}",
            result.score
        );
    }

    #[test]
    fn avoids_stalemate_when_winning() {
        let (board, result) = run_search("7k/8/5K2/6Q1/8/8/8/8 w - - 0 1", 4);

        assert!(
            result.score > MATE_SCORE - 100,
            "expected a mate score, got {}",
            result.score
        );
        let mut after = board;
        after.make_move(result.best_move);
        assert!(!is_stalemate(&after), "winning side must not stalemate");
    }

    #[test]
    fn quiet_rook_endgame_keeps_material_edge_through_quiescence() {
        let (_, result) = run_search("4k3/8/8/8/8/8/8/4KR2 w - - 0 1", 2);
        assert!(
            result.score > 200,
            "a clean extra rook must show, got {}",
            result.score
        );
    }

    #[test]
    fn recognizes_threefold_repetition_with_supplied_history() {
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/4KR2 w - - 0 1")
            .expect("FEN should parse");
        let mut history = vec![board.zobrist_key];

        for lan in ["f1f2", "e8e7", "f2f1", "e7e8", "f1f2", "e8e7", "f2f1", "e7e8"] {
            let m = parse_uci_move(&board, lan).expect("repetition move should parse");
            board.make_move(m);
            history.push(board.zobrist_key);
        }

        let mut tt = TranspositionTable::new_with_mb(8);
        let result = iterative_deepening_search(
            &board,
            &TaperedScorer,
            SearchConfig {
                max_depth: 4,
                repetition_history: history,
                ..SearchConfig::default()
            },
            &mut tt,
            None,
        );

        assert_eq!(result.score, 0, "threefold position is a draw");
        assert_ne!(result.best_move, NULL_MOVE, "a legal reply is still due");
    }

    #[test]
    fn mate_scores_normalize_through_the_table() {
        for ply in [0usize, 3, 17] {
            let mate_for_us = MATE_SCORE - 12;
            let mate_against = -MATE_SCORE + 9;
            assert_eq!(score_from_tt(score_to_tt(mate_for_us, ply), ply), mate_for_us);
            assert_eq!(score_from_tt(score_to_tt(mate_against, ply), ply), mate_against);
            assert_eq!(score_from_tt(score_to_tt(150, ply), ply), 150);
        }
    }

    #[test]
    fn lmr_reductions_grow_with_depth_and_index() {
        assert_eq!(lmr_reduction(3, 3), lmr_reduction(3, 3));
        assert!(lmr_reduction(12, 30) >= lmr_reduction(3, 3));
        assert!(lmr_reduction(20, 60) >= 2);
    }

    #[test]
    fn stop_flag_halts_the_search_quickly() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let board = Board::new_game();
        let stop = Arc::new(AtomicBool::new(true));
        let mut tt = TranspositionTable::new_with_mb(8);

        let result = iterative_deepening_search(
            &board,
            &TaperedScorer,
            SearchConfig {
                max_depth: 30,
                stop_flag: Some(stop),
                ..SearchConfig::default()
            },
            &mut tt,
            None,
        );

        // Depth 1 always publishes a legal move even under an immediate stop.
        assert_ne!(result.best_move, NULL_MOVE);
        assert!(generate_legal(&board).contains(result.best_move));
    }

    #[test]
    fn principal_variation_is_a_legal_line() {
        let board = Board::new_game();
        let mut tt = TranspositionTable::new_with_mb(8);
        iterative_deepening_search(
            &board,
            &TaperedScorer,
            SearchConfig {
                max_depth: 4,
                ..SearchConfig::default()
            },
            &mut tt,
            None,
        );

        let pv = extract_principal_variation(&board, &tt, 4);
        assert!(!pv.is_empty(), "a completed search must leave a PV");

        let mut replay = board;
        for &m in &pv {
            assert!(generate_legal(&replay).contains(m), "PV move must be legal");
            replay.make_move(m);
        }
    }

    #[test]
    fn deeper_search_does_not_lose_a_hanging_queen() {
        // White to move can simply capture the undefended queen on d5.
        let (board, result) = run_search("3k4/8/8/3q4/8/8/3R4/3K4 w - - 0 1", 4);
        let mut after = board;
        after.make_move(result.best_move);
        assert!(
            result.score > 300,
            "winning the queen must dominate, got {}",
            result.score
        );
    }
}
