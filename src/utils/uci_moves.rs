//! UCI wire-format move decoding.
//!
//! A wire move is `<from><to>[promo]` (`e2e4`, `e7e8q`); decoding matches the
//! string against the legal moves of the given position so the packed kind
//! and promotion bits come out right. A missing promotion letter defaults to
//! queen when the matched move is a promotion.

use crate::game_state::board::Board;
use crate::game_state::chess_types::PieceKind;
use crate::move_generation::legal_move_generator::generate_legal;
use crate::moves::move_encoding::{
    move_from, move_kind, move_to, promotion_kind, Move, MoveKind,
};
use crate::utils::algebraic::algebraic_to_square;

/// Decode a wire move against the position's legal moves. Returns `None` for
/// malformed strings and for moves that are not legal here.
pub fn parse_uci_move(board: &Board, text: &str) -> Option<Move> {
    if text.len() < 4 || text.len() > 5 {
        return None;
    }

    let from = algebraic_to_square(&text[0..2]).ok()?;
    let to = algebraic_to_square(&text[2..4]).ok()?;

    let promotion = match text.as_bytes().get(4) {
        Some(b'n') => Some(PieceKind::Knight),
        Some(b'b') => Some(PieceKind::Bishop),
        Some(b'r') => Some(PieceKind::Rook),
        Some(b'q') => Some(PieceKind::Queen),
        Some(_) => return None,
        None => None,
    };

    let legal = generate_legal(board);
    for &m in legal.iter() {
        if move_from(m) != from || move_to(m) != to {
            continue;
        }
        if move_kind(m) == MoveKind::Promotion {
            // Missing letter picks the queen promotion.
            let wanted = promotion.unwrap_or(PieceKind::Queen);
            if promotion_kind(m) == wanted {
                return Some(m);
            }
        } else {
            return Some(m);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::parse_uci_move;
    use crate::game_state::board::Board;
    use crate::move_generation::legal_move_generator::generate_legal;
    use crate::moves::move_encoding::{move_to_uci, promotion_kind, MoveKind};
    use crate::moves::move_encoding::move_kind;
    use crate::game_state::chess_types::PieceKind;

    #[test]
    fn decodes_simple_opening_move() {
        let board = Board::new_game();
        let m = parse_uci_move(&board, "e2e4").expect("e2e4 should decode");
        assert_eq!(move_to_uci(m), "e2e4");
    }

    #[test]
    fn rejects_illegal_and_malformed_input() {
        let board = Board::new_game();
        assert!(parse_uci_move(&board, "e2e5").is_none());
        assert!(parse_uci_move(&board, "0000").is_none());
        assert!(parse_uci_move(&board, "e2").is_none());
        assert!(parse_uci_move(&board, "e2e4x").is_none());
    }

    #[test]
    fn promotion_letter_defaults_to_queen() {
        let board = Board::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").expect("FEN should parse");

        let queen = parse_uci_move(&board, "a7a8").expect("bare promotion should decode");
        assert_eq!(move_kind(queen), MoveKind::Promotion);
        assert_eq!(promotion_kind(queen), PieceKind::Queen);

        let knight = parse_uci_move(&board, "a7a8n").expect("knight promotion should decode");
        assert_eq!(promotion_kind(knight), PieceKind::Knight);
    }

    #[test]
    fn decode_inverts_encode_for_every_legal_move() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        ];

        for fen in fens {
            let board = Board::from_fen(fen).expect("FEN should parse");
            for &m in generate_legal(&board).iter() {
                let decoded = parse_uci_move(&board, &move_to_uci(m))
                    .expect("every legal move should decode from its own encoding");
                assert_eq!(decoded, m, "round trip failed in {fen}");
            }
        }
    }
}
