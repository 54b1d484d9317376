//! Static evaluation: tapered handcrafted scoring plus the evaluator policy.
//!
//! The handcrafted path accumulates separate middlegame and endgame scores
//! (material + piece-square tables, pawn structure, bishop pair, rook files,
//! mobility, king safety) and interpolates them by remaining non-pawn
//! material. The PST tables are written in the conventional visual
//! orientation (a8 first), so light pieces index with `square ^ 56` and dark
//! pieces with the square directly.
//!
//! An external NNUE backend can be registered as an opaque callable; the
//! process-wide mode selector decides which path runs, silently falling back
//! to the handcrafted one when no backend is present.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use crate::game_state::board::Board;
use crate::game_state::chess_types::*;
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::sliding_moves::{bishop_attacks, queen_attacks, rook_attacks};

/// Simple piece values for move ordering, pruning margins, and material
/// thresholds (not the tapered evaluation weights).
pub const PIECE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 20_000];

pub trait BoardScorer: Send + Sync {
    /// Score in centipawns from the perspective of the side to move.
    fn score(&self, board: &Board) -> i32;
}

// ============================================================
// Evaluator policy
// ============================================================

/// Opaque external evaluator; must return a centipawn score from the side
/// to move's perspective.
pub trait NnueBackend: Send + Sync {
    fn evaluate(&self, board: &Board) -> i32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    Handcrafted,
    Nnue,
}

static EVAL_MODE: AtomicU8 = AtomicU8::new(0);
static NNUE_BACKEND: OnceLock<Box<dyn NnueBackend>> = OnceLock::new();

pub fn set_eval_mode(mode: EvalMode) {
    EVAL_MODE.store(mode as u8, Ordering::Relaxed);
}

pub fn eval_mode() -> EvalMode {
    match EVAL_MODE.load(Ordering::Relaxed) {
        1 => EvalMode::Nnue,
        _ => EvalMode::Handcrafted,
    }
}

/// Install the external evaluator. Fails if one is already registered.
pub fn register_nnue_backend(backend: Box<dyn NnueBackend>) -> Result<(), String> {
    NNUE_BACKEND
        .set(backend)
        .map_err(|_| "an NNUE backend is already registered".to_owned())
}

/// The evaluator the engine actually runs: dispatches on the mode selector
/// and falls back to the handcrafted path when no backend is registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineScorer;

impl BoardScorer for EngineScorer {
    fn score(&self, board: &Board) -> i32 {
        if eval_mode() == EvalMode::Nnue {
            if let Some(backend) = NNUE_BACKEND.get() {
                return backend.evaluate(board);
            }
        }
        TaperedScorer.score(board)
    }
}

/// Material-only scorer kept as a deterministic debugging mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl BoardScorer for MaterialScorer {
    fn score(&self, board: &Board) -> i32 {
        let mut white_minus_black = 0i32;
        for kind in ALL_PIECE_KINDS {
            if kind == PieceKind::King {
                continue;
            }
            let light = board.pieces[Color::Light.index()][kind.index()].count_ones() as i32;
            let dark = board.pieces[Color::Dark.index()][kind.index()].count_ones() as i32;
            white_minus_black += (light - dark) * PIECE_VALUES[kind.index()];
        }
        match board.side_to_move {
            Color::Light => white_minus_black,
            Color::Dark => -white_minus_black,
        }
    }
}

// ============================================================
// Handcrafted tapered evaluation
// ============================================================

const PHASE_WEIGHT: [i32; 6] = [0, 1, 1, 2, 4, 0];
const TOTAL_PHASE: i32 = 24;

const MG_PIECE_VALUE: [i32; 6] = [82, 337, 365, 477, 1025, 0];
const EG_PIECE_VALUE: [i32; 6] = [94, 281, 297, 512, 936, 0];

const DOUBLED_PAWN_PENALTY: (i32, i32) = (-10, -15);
const ISOLATED_PAWN_PENALTY: (i32, i32) = (-10, -15);
const PASSED_PAWN_MG: [i32; 8] = [0, 5, 10, 15, 25, 40, 65, 0];
const PASSED_PAWN_EG: [i32; 8] = [0, 10, 15, 25, 45, 75, 120, 0];

const BISHOP_PAIR_BONUS: (i32, i32) = (30, 50);
const ROOK_OPEN_FILE_BONUS: (i32, i32) = (20, 10);
const ROOK_SEMI_OPEN_FILE_BONUS: (i32, i32) = (10, 5);

const PAWN_SHIELD_PENALTY: i32 = -10;

const KNIGHT_MOBILITY_MG: [i32; 9] = [-25, -11, -3, 3, 7, 11, 15, 19, 23];
const KNIGHT_MOBILITY_EG: [i32; 9] = [-30, -14, -4, 2, 8, 12, 16, 20, 24];
const BISHOP_MOBILITY_MG: [i32; 14] =
    [-20, -12, -4, 0, 4, 8, 12, 15, 18, 21, 24, 26, 28, 30];
const BISHOP_MOBILITY_EG: [i32; 14] =
    [-24, -14, -6, 0, 6, 10, 14, 18, 22, 25, 28, 30, 32, 34];
const ROOK_MOBILITY_MG: [i32; 15] =
    [-16, -10, -6, -2, 0, 2, 5, 8, 11, 13, 15, 17, 19, 21, 23];
const ROOK_MOBILITY_EG: [i32; 15] =
    [-26, -14, -6, 0, 6, 12, 18, 24, 28, 32, 36, 39, 42, 45, 48];
const QUEEN_MOBILITY_MG: [i32; 28] = [
    -10, -7, -5, -3, -1, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18,
    19, 20, 21, 22,
];
const QUEEN_MOBILITY_EG: [i32; 28] = [
    -20, -14, -10, -6, -3, 0, 3, 6, 9, 12, 15, 18, 21, 24, 26, 28, 30, 32, 34, 36, 38, 40,
    42, 44, 46, 48, 50, 52,
];

/// Attacker weights by piece kind for the king-zone danger count.
const KING_ZONE_ATTACK_WEIGHT: [i32; 6] = [0, 2, 2, 3, 5, 0];

/// Danger penalty by accumulated attacker weight; rises from 0 to 500 and
/// accelerates through the middle of the range.
#[rustfmt::skip]
const KING_DANGER_TABLE: [i32; 100] = [
      0,   0,   1,   2,   3,   5,   7,   9,  12,  15,
     18,  22,  26,  30,  35,  39,  44,  50,  56,  62,
     68,  75,  82,  85,  89,  97, 105, 113, 122, 131,
    140, 150, 169, 180, 191, 202, 213, 225, 237, 248,
    260, 272, 283, 295, 307, 319, 330, 342, 354, 366,
    377, 389, 401, 412, 424, 436, 448, 459, 471, 483,
    494, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
];

// Piece-square tables, positional component only, visual orientation
// (index 0 = a8 .. index 63 = h1).

#[rustfmt::skip]
const MG_PAWN_TABLE: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     98, 134,  61,  95,  68, 126,  34, -11,
     -6,   7,  26,  31,  65,  56,  25, -20,
    -14,  13,   6,  21,  23,  12,  17, -23,
    -27,  -2,  -5,  12,  17,   6,  10, -25,
    -26,  -4,  -4, -10,   3,   3,  33, -12,
    -35,  -1, -20, -23, -15,  24,  38, -22,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const MG_KNIGHT_TABLE: [i32; 64] = [
   -167, -89, -34, -49,  61, -97, -15,-107,
    -73, -41,  72,  36,  23,  62,   7, -17,
    -47,  60,  37,  65,  84, 129,  73,  44,
     -9,  17,  19,  53,  37,  69,  18,  22,
    -13,   4,  16,  13,  28,  19,  21,  -8,
    -23,  -9,  12,  10,  19,  17,  25, -16,
    -29, -53, -12,  -3,  -1,  18, -14, -19,
   -105, -21, -58, -33, -17, -28, -19, -23,
];

#[rustfmt::skip]
const MG_BISHOP_TABLE: [i32; 64] = [
    -29,   4, -82, -37, -25, -42,   7,  -8,
    -26,  16, -18, -13,  30,  59,  18, -47,
    -16,  37,  43,  40,  35,  50,  37,  -2,
     -4,   5,  19,  50,  37,  37,   7,  -2,
     -6,  13,  13,  26,  34,  12,  10,   4,
      0,  15,  15,  15,  14,  27,  18,  10,
      4,  15,  16,   0,   7,  21,  33,   1,
    -33,  -3, -14, -21, -13, -12, -39, -21,
];

#[rustfmt::skip]
const MG_ROOK_TABLE: [i32; 64] = [
     32,  42,  32,  51,  63,   9,  31,  43,
     27,  32,  58,  62,  80,  67,  26,  44,
     -5,  19,  26,  36,  17,  45,  61,  16,
    -24, -11,   7,  26,  24,  35,  -8, -20,
    -36, -26, -12,  -1,   9,  -7,   6, -23,
    -45, -25, -16, -17,   3,   0,  -5, -33,
    -44, -16, -20,  -9,  -1,  11,  -6, -71,
    -19, -13,   1,  17,  16,   7, -37, -26,
];

#[rustfmt::skip]
const MG_QUEEN_TABLE: [i32; 64] = [
    -28,   0,  29,  12,  59,  44,  43,  45,
    -24, -39,  -5,   1, -16,  57,  28,  54,
    -13, -17,   7,   8,  29,  56,  47,  57,
    -27, -27, -16, -16,  -1,  17,  -2,   1,
     -9, -26,  -9, -10,  -2,  -4,   3,  -3,
    -14,   2, -11,  -2,  -5,   2,  14,   5,
    -35,  -8,  11,   2,   8,  15,  -3,   1,
     -1, -18,  -9,  10, -15, -25, -31, -50,
];

#[rustfmt::skip]
const MG_KING_TABLE: [i32; 64] = [
    -65,  23,  16, -15, -56, -34,   2,  13,
     29,  -1, -20,  -7,  -8,  -4, -38, -29,
     -9,  24,   2, -16, -20,   6,  22, -22,
    -17, -20, -12, -27, -30, -25, -14, -36,
    -49,  -1, -27, -39, -46, -44, -33, -51,
    -14, -14, -22, -46, -44, -30, -15, -27,
      1,   7,  -8, -64, -43, -16,   9,   8,
    -15,  36,  12, -54,   8, -28,  24,  14,
];

#[rustfmt::skip]
const EG_PAWN_TABLE: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
    178, 173, 158, 134, 147, 132, 165, 187,
     94, 100,  85,  67,  56,  53,  82,  84,
     32,  24,  13,   5,  -2,   4,  17,  17,
     13,   9,  -3,  -7,  -7,  -8,   3,  -1,
      4,   7,  -6,   1,   0,  -5,  -1,  -8,
     13,   8,   8, -10,  13,   0,   2,  -7,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const EG_KNIGHT_TABLE: [i32; 64] = [
    -58, -38, -13, -28, -31, -27, -63, -99,
    -25,  -8, -25,  -2,  -9, -25, -24, -52,
    -24, -20,  10,   9,  -1,  -9, -19, -41,
    -17,   3,  22,  22,  22,  11,   8, -18,
    -18,  -6,  16,  25,  16,  17,   4, -18,
    -23,  -3,  -1,  15,  10,  -3, -20, -22,
    -42, -20, -10,  -5,  -2, -20, -23, -44,
    -29, -51, -23, -15, -22, -18, -50, -64,
];

#[rustfmt::skip]
const EG_BISHOP_TABLE: [i32; 64] = [
    -14, -21, -11,  -8,  -7,  -9, -17, -24,
     -8,  -4,   7, -12,  -3, -13,  -4, -14,
      2,  -8,   0,  -1,  -2,   6,   0,   4,
     -3,   9,  12,   9,  14,  10,   3,   2,
     -6,   3,  13,  19,   7,  10,  -3,  -9,
    -12,  -3,   8,  10,  13,   3,  -7, -15,
    -14, -18,  -7,  -1,   4,  -9, -15, -27,
    -23,  -9, -23,  -5,  -9, -16,  -5, -17,
];

#[rustfmt::skip]
const EG_ROOK_TABLE: [i32; 64] = [
     13,  10,  18,  15,  12,  12,   8,   5,
     11,  13,  13,  11,  -3,   3,   8,   3,
      7,   7,   7,   5,   4,  -3,  -5,  -3,
      4,   3,  13,   1,   2,   1,  -1,   2,
      3,   5,   8,   4,  -5,  -6,  -8, -11,
     -4,   0,  -5,  -1,  -7, -12,  -8, -16,
     -6,  -6,   0,   2,  -9,  -9, -11,  -3,
     -9,   2,   3,  -1,  -5, -13,   4, -20,
];

#[rustfmt::skip]
const EG_QUEEN_TABLE: [i32; 64] = [
     -9,  22,  22,  27,  27,  19,  10,  20,
    -17,  20,  32,  41,  58,  25,  30,   0,
    -20,   6,   9,  49,  47,  35,  19,   9,
      3,  22,  24,  45,  57,  40,  57,  36,
    -18,  28,  19,  47,  31,  34,  39,  23,
    -16, -27,  15,   6,   9,  17,  10,   5,
    -22, -23, -30, -16, -16, -23, -36, -32,
    -33, -28, -22, -43,  -5, -32, -20, -41,
];

#[rustfmt::skip]
const EG_KING_TABLE: [i32; 64] = [
    -74, -35, -18, -18, -11,  15,   4, -17,
    -12,  17,  14,  17,  17,  38,  23,  11,
     10,  17,  23,  15,  20,  45,  44,  13,
     -8,  22,  24,  27,  26,  33,  26,   3,
    -18,  -4,  21,  24,  27,  23,   9, -11,
    -19,  -3,  11,  21,  23,  16,   7,  -9,
    -27, -11,   4,  13,  14,   4,  -5, -17,
    -53, -34, -21, -11, -28, -14, -24, -43,
];

const MG_PST: [&[i32; 64]; 6] = [
    &MG_PAWN_TABLE,
    &MG_KNIGHT_TABLE,
    &MG_BISHOP_TABLE,
    &MG_ROOK_TABLE,
    &MG_QUEEN_TABLE,
    &MG_KING_TABLE,
];

const EG_PST: [&[i32; 64]; 6] = [
    &EG_PAWN_TABLE,
    &EG_KNIGHT_TABLE,
    &EG_BISHOP_TABLE,
    &EG_ROOK_TABLE,
    &EG_QUEEN_TABLE,
    &EG_KING_TABLE,
];

/// Same-and-adjacent-file squares strictly ahead of each square, per color.
const PASSED_MASKS: [[u64; 64]; 2] = generate_passed_masks();
const ADJACENT_FILE_MASKS: [u64; 8] = generate_adjacent_file_masks();

const fn generate_adjacent_file_masks() -> [u64; 8] {
    let mut masks = [0u64; 8];
    let mut file = 0usize;
    while file < 8 {
        if file > 0 {
            masks[file] |= FILE_MASKS[file - 1];
        }
        if file < 7 {
            masks[file] |= FILE_MASKS[file + 1];
        }
        file += 1;
    }
    masks
}

const fn generate_passed_masks() -> [[u64; 64]; 2] {
    let mut masks = [[0u64; 64]; 2];
    let mut sq = 0usize;
    while sq < 64 {
        let file = sq % 8;
        let rank = sq / 8;
        let span = FILE_MASKS[file] | ADJACENT_FILE_MASKS[file];

        // Light pawns march toward rank 7, dark toward rank 0.
        let mut ahead_light = 0u64;
        let mut r = rank + 1;
        while r < 8 {
            ahead_light |= RANK_MASKS[r];
            r += 1;
        }
        let mut ahead_dark = 0u64;
        let mut r2 = 0usize;
        while r2 < rank {
            ahead_dark |= RANK_MASKS[r2];
            r2 += 1;
        }

        masks[0][sq] = span & ahead_light;
        masks[1][sq] = span & ahead_dark;
        sq += 1;
    }
    masks
}

/// The full handcrafted evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaperedScorer;

impl BoardScorer for TaperedScorer {
    fn score(&self, board: &Board) -> i32 {
        let mut mg = 0i32;
        let mut eg = 0i32;
        let mut phase = 0i32;

        for color in [Color::Light, Color::Dark] {
            let sign = if color == Color::Light { 1 } else { -1 };

            for kind in ALL_PIECE_KINDS {
                let k = kind.index();
                let mut bb = board.pieces[color.index()][k];
                while bb != 0 {
                    let sq = bb.trailing_zeros() as usize;
                    let idx = match color {
                        Color::Light => sq ^ 56,
                        Color::Dark => sq,
                    };
                    mg += sign * (MG_PIECE_VALUE[k] + MG_PST[k][idx]);
                    eg += sign * (EG_PIECE_VALUE[k] + EG_PST[k][idx]);
                    phase += PHASE_WEIGHT[k];
                    bb &= bb - 1;
                }
            }

            let (pawn_mg, pawn_eg) = pawn_structure_terms(board, color);
            let (piece_mg, piece_eg) = piece_placement_terms(board, color);
            let (mob_mg, mob_eg) = mobility_terms(board, color);
            let safety_mg = king_safety_term(board, color);

            mg += sign * (pawn_mg + piece_mg + mob_mg + safety_mg);
            eg += sign * (pawn_eg + piece_eg + mob_eg);
        }

        let phase = phase.min(TOTAL_PHASE);
        let score = (mg * phase + eg * (TOTAL_PHASE - phase)) / TOTAL_PHASE;

        match board.side_to_move {
            Color::Light => score,
            Color::Dark => -score,
        }
    }
}

fn pawn_structure_terms(board: &Board, color: Color) -> (i32, i32) {
    let own_pawns = board.pieces[color.index()][PieceKind::Pawn.index()];
    let enemy_pawns = board.pieces[color.opposite().index()][PieceKind::Pawn.index()];

    let mut mg = 0i32;
    let mut eg = 0i32;

    for file in 0..8usize {
        let on_file = (own_pawns & FILE_MASKS[file]).count_ones() as i32;
        if on_file > 1 {
            mg += (on_file - 1) * DOUBLED_PAWN_PENALTY.0;
            eg += (on_file - 1) * DOUBLED_PAWN_PENALTY.1;
        }
    }

    let mut bb = own_pawns;
    while bb != 0 {
        let sq = bb.trailing_zeros() as usize;
        let file = sq % 8;

        if own_pawns & ADJACENT_FILE_MASKS[file] == 0 {
            mg += ISOLATED_PAWN_PENALTY.0;
            eg += ISOLATED_PAWN_PENALTY.1;
        }

        if enemy_pawns & PASSED_MASKS[color.index()][sq] == 0 {
            let relative_rank = match color {
                Color::Light => sq / 8,
                Color::Dark => 7 - sq / 8,
            };
            mg += PASSED_PAWN_MG[relative_rank];
            eg += PASSED_PAWN_EG[relative_rank];
        }

        bb &= bb - 1;
    }

    (mg, eg)
}

fn piece_placement_terms(board: &Board, color: Color) -> (i32, i32) {
    let own = color.index();
    let mut mg = 0i32;
    let mut eg = 0i32;

    if board.pieces[own][PieceKind::Bishop.index()].count_ones() >= 2 {
        mg += BISHOP_PAIR_BONUS.0;
        eg += BISHOP_PAIR_BONUS.1;
    }

    let own_pawns = board.pieces[own][PieceKind::Pawn.index()];
    let all_pawns = own_pawns | board.pieces[color.opposite().index()][PieceKind::Pawn.index()];

    let mut rooks = board.pieces[own][PieceKind::Rook.index()];
    while rooks != 0 {
        let sq = rooks.trailing_zeros() as usize;
        let file_mask = FILE_MASKS[sq % 8];
        if all_pawns & file_mask == 0 {
            mg += ROOK_OPEN_FILE_BONUS.0;
            eg += ROOK_OPEN_FILE_BONUS.1;
        } else if own_pawns & file_mask == 0 {
            mg += ROOK_SEMI_OPEN_FILE_BONUS.0;
            eg += ROOK_SEMI_OPEN_FILE_BONUS.1;
        }
        rooks &= rooks - 1;
    }

    (mg, eg)
}

fn mobility_terms(board: &Board, color: Color) -> (i32, i32) {
    let own_occ = board.occupancy_by_color[color.index()];
    let occ = board.occupancy_all;
    let mut mg = 0i32;
    let mut eg = 0i32;

    let mut knights = board.pieces[color.index()][PieceKind::Knight.index()];
    while knights != 0 {
        let sq = knights.trailing_zeros() as Square;
        let count = (knight_attacks(sq) & !own_occ).count_ones() as usize;
        mg += KNIGHT_MOBILITY_MG[count.min(8)];
        eg += KNIGHT_MOBILITY_EG[count.min(8)];
        knights &= knights - 1;
    }

    let mut bishops = board.pieces[color.index()][PieceKind::Bishop.index()];
    while bishops != 0 {
        let sq = bishops.trailing_zeros() as Square;
        let count = (bishop_attacks(sq, occ) & !own_occ).count_ones() as usize;
        mg += BISHOP_MOBILITY_MG[count.min(13)];
        eg += BISHOP_MOBILITY_EG[count.min(13)];
        bishops &= bishops - 1;
    }

    let mut rooks = board.pieces[color.index()][PieceKind::Rook.index()];
    while rooks != 0 {
        let sq = rooks.trailing_zeros() as Square;
        let count = (rook_attacks(sq, occ) & !own_occ).count_ones() as usize;
        mg += ROOK_MOBILITY_MG[count.min(14)];
        eg += ROOK_MOBILITY_EG[count.min(14)];
        rooks &= rooks - 1;
    }

    let mut queens = board.pieces[color.index()][PieceKind::Queen.index()];
    while queens != 0 {
        let sq = queens.trailing_zeros() as Square;
        let count = (queen_attacks(sq, occ) & !own_occ).count_ones() as usize;
        mg += QUEEN_MOBILITY_MG[count.min(27)];
        eg += QUEEN_MOBILITY_EG[count.min(27)];
        queens &= queens - 1;
    }

    (mg, eg)
}

/// Middlegame-only king safety: pawn shield and king-zone attackers.
fn king_safety_term(board: &Board, color: Color) -> i32 {
    let Some(king_sq) = board.king_square(color) else {
        return 0;
    };
    let mut mg = 0i32;

    let king_file = i32::from(square_file(king_sq));
    let king_rank = square_rank(king_sq);
    let relative_rank = match color {
        Color::Light => king_rank,
        Color::Dark => 7 - king_rank,
    };

    if relative_rank <= 1 {
        let shield_rank = match color {
            Color::Light => king_rank + 1,
            Color::Dark => king_rank - 1,
        };
        let own_pawns = board.pieces[color.index()][PieceKind::Pawn.index()];
        for file in (king_file - 1)..=(king_file + 1) {
            if !(0..8).contains(&file) {
                continue;
            }
            let shield_sq = make_square(file as u8, shield_rank);
            if own_pawns & square_bb(shield_sq) == 0 {
                mg += PAWN_SHIELD_PENALTY;
            }
        }
    }

    let zone = square_bb(king_sq) | king_attacks(king_sq);
    let them = color.opposite().index();
    let occ = board.occupancy_all;
    let mut attacker_count = 0i32;
    let mut attack_weight = 0i32;

    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ] {
        let mut bb = board.pieces[them][kind.index()];
        while bb != 0 {
            let sq = bb.trailing_zeros() as Square;
            let attacks = match kind {
                PieceKind::Knight => knight_attacks(sq),
                PieceKind::Bishop => bishop_attacks(sq, occ),
                PieceKind::Rook => rook_attacks(sq, occ),
                _ => queen_attacks(sq, occ),
            };
            if attacks & zone != 0 {
                attacker_count += 1;
                attack_weight += KING_ZONE_ATTACK_WEIGHT[kind.index()];
            }
            bb &= bb - 1;
        }
    }

    if attacker_count >= 2 {
        mg -= KING_DANGER_TABLE[(attack_weight.min(99)) as usize];
    }

    mg
}
