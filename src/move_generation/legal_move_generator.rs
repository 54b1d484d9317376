//! Full legal move generation pipeline.
//!
//! Moves are emitted pseudo-legally from the attack tables, then filtered by
//! making each one on a scratch copy and rejecting those that leave the own
//! king attacked. Termination predicates live here as well.

use crate::game_state::board::Board;
use crate::game_state::chess_rules::FIFTY_MOVE_RULE_PLIES;
use crate::game_state::chess_types::*;
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::move_encoding::*;
use crate::moves::pawn_moves::pawn_attacks;
use crate::moves::sliding_moves::{bishop_attacks, queen_attacks, rook_attacks};

/// Generate every pseudo-legal move for the side to move into `moves`.
pub fn generate_pseudo_legal(board: &Board, moves: &mut MoveList) {
    generate_pawn_moves(board, moves);
    generate_piece_moves(board, moves);
}

/// Generate all strictly legal moves for the side to move.
pub fn generate_legal(board: &Board) -> MoveList {
    let mut pseudo = MoveList::new();
    generate_pseudo_legal(board, &mut pseudo);

    let us = board.side_to_move;
    let mut legal = MoveList::new();

    for &m in pseudo.iter() {
        let mut scratch = *board;
        scratch.make_move(m);
        let king_safe = match scratch.king_square(us) {
            Some(king_sq) => !scratch.is_square_attacked(king_sq, us.opposite()),
            None => false,
        };
        if king_safe {
            legal.add(m);
        }
    }

    legal
}

/// True iff the side to move's king is attacked.
#[inline]
pub fn in_check(board: &Board) -> bool {
    match board.king_square(board.side_to_move) {
        Some(king_sq) => board.is_square_attacked(king_sq, board.side_to_move.opposite()),
        None => false,
    }
}

pub fn is_checkmate(board: &Board) -> bool {
    in_check(board) && generate_legal(board).is_empty()
}

pub fn is_stalemate(board: &Board) -> bool {
    !in_check(board) && generate_legal(board).is_empty()
}

#[inline]
pub fn is_draw_by_fifty_move_rule(board: &Board) -> bool {
    board.halfmove_clock >= FIFTY_MOVE_RULE_PLIES
}

/// True for moves that take material, en passant included.
#[inline]
pub fn is_capture(board: &Board, m: Move) -> bool {
    board.piece_on(move_to(m)).is_some() || move_kind(m) == MoveKind::EnPassant
}

fn generate_pawn_moves(board: &Board, moves: &mut MoveList) {
    let us = board.side_to_move;
    let them = us.opposite();
    let occ = board.occupancy_all;
    let enemy = board.occupancy_by_color[them.index()];
    let pawns = board.pieces[us.index()][PieceKind::Pawn.index()];

    let (single_push, double_push, promo_rank) = match us {
        Color::Light => {
            let single = (pawns << 8) & !occ;
            let double = ((single & RANK_MASKS[2]) << 8) & !occ;
            (single, double, RANK_MASKS[7])
        }
        Color::Dark => {
            let single = (pawns >> 8) & !occ;
            let double = ((single & RANK_MASKS[5]) >> 8) & !occ;
            (single, double, RANK_MASKS[0])
        }
    };
    let push_back: i8 = match us {
        Color::Light => -8,
        Color::Dark => 8,
    };

    let mut plain_pushes = single_push & !promo_rank;
    while plain_pushes != 0 {
        let to = plain_pushes.trailing_zeros() as Square;
        let from = (to as i8 + push_back) as Square;
        moves.add(make_move(from, to));
        plain_pushes &= plain_pushes - 1;
    }

    let mut promo_pushes = single_push & promo_rank;
    while promo_pushes != 0 {
        let to = promo_pushes.trailing_zeros() as Square;
        let from = (to as i8 + push_back) as Square;
        add_promotions(moves, from, to);
        promo_pushes &= promo_pushes - 1;
    }

    let mut doubles = double_push;
    while doubles != 0 {
        let to = doubles.trailing_zeros() as Square;
        let from = (to as i8 + 2 * push_back) as Square;
        moves.add(make_move(from, to));
        doubles &= doubles - 1;
    }

    // Captures, with file-edge guards preventing wraps.
    let (left_caps, left_back, right_caps, right_back): (u64, i8, u64, i8) = match us {
        Color::Light => (
            ((pawns & !FILE_MASKS[0]) << 7) & enemy,
            -7,
            ((pawns & !FILE_MASKS[7]) << 9) & enemy,
            -9,
        ),
        Color::Dark => (
            ((pawns & !FILE_MASKS[7]) >> 7) & enemy,
            7,
            ((pawns & !FILE_MASKS[0]) >> 9) & enemy,
            9,
        ),
    };

    for (caps, back) in [(left_caps, left_back), (right_caps, right_back)] {
        let mut plain = caps & !promo_rank;
        while plain != 0 {
            let to = plain.trailing_zeros() as Square;
            let from = (to as i8 + back) as Square;
            moves.add(make_move(from, to));
            plain &= plain - 1;
        }

        let mut promos = caps & promo_rank;
        while promos != 0 {
            let to = promos.trailing_zeros() as Square;
            let from = (to as i8 + back) as Square;
            add_promotions(moves, from, to);
            promos &= promos - 1;
        }
    }

    if let Some(ep) = board.en_passant_square {
        // Own pawns attacking the ep target are exactly the pawns the enemy
        // pawn-attack table reaches from that square.
        let mut attackers = pawn_attacks(them, ep) & pawns;
        while attackers != 0 {
            let from = attackers.trailing_zeros() as Square;
            moves.add(make_move_with_kind(from, ep, MoveKind::EnPassant));
            attackers &= attackers - 1;
        }
    }
}

#[inline]
fn add_promotions(moves: &mut MoveList, from: Square, to: Square) {
    moves.add(make_promotion(from, to, PieceKind::Queen));
    moves.add(make_promotion(from, to, PieceKind::Rook));
    moves.add(make_promotion(from, to, PieceKind::Bishop));
    moves.add(make_promotion(from, to, PieceKind::Knight));
}

fn generate_piece_moves(board: &Board, moves: &mut MoveList) {
    let us = board.side_to_move;
    let own = board.occupancy_by_color[us.index()];
    let occ = board.occupancy_all;

    for (kind, attacks_of) in [
        (PieceKind::Knight, AttackFn::Fixed(knight_attacks)),
        (PieceKind::Bishop, AttackFn::Slider(bishop_attacks)),
        (PieceKind::Rook, AttackFn::Slider(rook_attacks)),
        (PieceKind::Queen, AttackFn::Slider(queen_attacks)),
        (PieceKind::King, AttackFn::Fixed(king_attacks)),
    ] {
        let mut sources = board.pieces[us.index()][kind.index()];
        while sources != 0 {
            let from = sources.trailing_zeros() as Square;
            let mut targets = attacks_of.call(from, occ) & !own;
            while targets != 0 {
                let to = targets.trailing_zeros() as Square;
                moves.add(make_move(from, to));
                targets &= targets - 1;
            }
            sources &= sources - 1;
        }
    }

    generate_castling_moves(board, moves);
}

enum AttackFn {
    Fixed(fn(Square) -> u64),
    Slider(fn(Square, u64) -> u64),
}

impl AttackFn {
    #[inline]
    fn call(&self, square: Square, occupancy: u64) -> u64 {
        match self {
            AttackFn::Fixed(f) => f(square),
            AttackFn::Slider(f) => f(square, occupancy),
        }
    }
}

fn generate_castling_moves(board: &Board, moves: &mut MoveList) {
    let us = board.side_to_move;
    let them = us.opposite();
    let occ = board.occupancy_all;

    let (kingside_right, queenside_right, king_from) = match us {
        Color::Light => (CASTLE_LIGHT_KINGSIDE, CASTLE_LIGHT_QUEENSIDE, 4u8),
        Color::Dark => (CASTLE_DARK_KINGSIDE, CASTLE_DARK_QUEENSIDE, 60u8),
    };

    if board.castling_rights & kingside_right != 0 {
        let between = square_bb(king_from + 1) | square_bb(king_from + 2);
        if occ & between == 0
            && !board.is_square_attacked(king_from, them)
            && !board.is_square_attacked(king_from + 1, them)
            && !board.is_square_attacked(king_from + 2, them)
        {
            moves.add(make_move_with_kind(king_from, king_from + 2, MoveKind::Castle));
        }
    }

    if board.castling_rights & queenside_right != 0 {
        let between =
            square_bb(king_from - 1) | square_bb(king_from - 2) | square_bb(king_from - 3);
        if occ & between == 0
            && !board.is_square_attacked(king_from, them)
            && !board.is_square_attacked(king_from - 1, them)
            && !board.is_square_attacked(king_from - 2, them)
        {
            moves.add(make_move_with_kind(king_from, king_from - 2, MoveKind::Castle));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_has_twenty_legal_moves() {
        let board = Board::new_game();
        assert_eq!(generate_legal(&board).len(), 20);
        assert!(!in_check(&board));
    }

    #[test]
    fn pinned_pieces_may_not_move_off_the_pin_line() {
        // The e4 knight is pinned against the light king by the e8 rook.
        let board =
            Board::from_fen("4r1k1/8/8/8/4N3/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let legal = generate_legal(&board);
        for &m in legal.iter() {
            assert_ne!(move_from(m), 28, "pinned knight must stay put");
        }
    }

    #[test]
    fn en_passant_is_rejected_when_it_exposes_the_king() {
        // Classic horizontal-pin trap: capturing en passant would open the
        // fifth rank to the rook.
        let board =
            Board::from_fen("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2").expect("FEN should parse");
        let legal = generate_legal(&board);
        for &m in legal.iter() {
            assert_ne!(move_kind(m), MoveKind::EnPassant);
        }
    }

    #[test]
    fn castling_is_blocked_through_attacked_squares() {
        // The d8 rook attacks d1, so queenside castling is out; kingside is fine.
        let board =
            Board::from_fen("3rk3/8/8/8/8/8/8/R3K2R w KQ - 0 1").expect("FEN should parse");
        let legal = generate_legal(&board);
        let kingside = make_move_with_kind(4, 6, MoveKind::Castle);
        let queenside = make_move_with_kind(4, 2, MoveKind::Castle);
        assert!(legal.contains(kingside));
        assert!(!legal.contains(queenside));
    }

    #[test]
    fn castling_requires_empty_between_squares() {
        let board = Board::new_game();
        let legal = generate_legal(&board);
        for &m in legal.iter() {
            assert_ne!(move_kind(m), MoveKind::Castle);
        }
    }

    #[test]
    fn checkmate_and_stalemate_predicates() {
        let mated =
            Board::from_fen("7k/5QQ1/8/8/8/8/8/K7 b - - 0 1").expect("FEN should parse");
        assert!(is_checkmate(&mated));
        assert!(!is_stalemate(&mated));

        let stale = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1")
            .expect("FEN should parse");
        assert!(is_stalemate(&stale));
        assert!(!is_checkmate(&stale));
    }

    #[test]
    fn fifty_move_rule_trips_at_one_hundred_plies() {
        let mut board = Board::new_game();
        assert!(!is_draw_by_fifty_move_rule(&board));
        board.halfmove_clock = 100;
        assert!(is_draw_by_fifty_move_rule(&board));
    }

    #[test]
    fn random_playouts_preserve_every_state_byte_across_make_unmake() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0xC0FFEE);

        for game in 0..40 {
            let mut board = Board::new_game();

            for _ply in 0..120 {
                let moves = generate_legal(&board);
                if moves.is_empty() {
                    break;
                }
                let m = moves.get(rng.random_range(0..moves.len()));

                let before = board;
                let undo = board.make_move(m);
                board
                    .validate_consistency()
                    .unwrap_or_else(|e| panic!("after make in game {game}: {e}"));

                let mut probe = board;
                probe.unmake_move(m, &undo);
                probe
                    .validate_consistency()
                    .unwrap_or_else(|e| panic!("after unmake in game {game}: {e}"));
                assert_eq!(probe.get_fen(), before.get_fen());
                assert_eq!(probe.zobrist_key, before.zobrist_key);
                assert_eq!(probe.mailbox, before.mailbox);
                assert_eq!(probe.pieces, before.pieces);
                assert_eq!(probe.castling_rights, before.castling_rights);
                assert_eq!(probe.halfmove_clock, before.halfmove_clock);
                assert_eq!(probe.fullmove_number, before.fullmove_number);
            }
        }
    }

    #[test]
    fn capture_detection_covers_en_passant() {
        let board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
                .expect("FEN should parse");
        let ep = make_move_with_kind(36, 43, MoveKind::EnPassant);
        assert!(is_capture(&board, ep));
        assert!(!is_capture(&board, make_move(36, 44)));
    }
}
