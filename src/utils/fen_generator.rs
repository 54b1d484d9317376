//! Board-to-FEN encoder; the exact inverse of the parser.

use crate::game_state::board::Board;
use crate::game_state::chess_types::*;
use crate::utils::algebraic::square_to_algebraic;

pub fn generate_fen(board: &Board) -> String {
    let mut fen = String::with_capacity(90);

    for rank in (0..8u8).rev() {
        let mut empty_run = 0u8;
        for file in 0..8u8 {
            match board.piece_on(make_square(file, rank)) {
                Some(piece) => {
                    if empty_run > 0 {
                        fen.push(char::from(b'0' + empty_run));
                        empty_run = 0;
                    }
                    fen.push(piece.to_fen_char());
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            fen.push(char::from(b'0' + empty_run));
        }
        if rank > 0 {
            fen.push('/');
        }
    }

    fen.push(' ');
    fen.push(match board.side_to_move {
        Color::Light => 'w',
        Color::Dark => 'b',
    });

    fen.push(' ');
    if board.castling_rights == 0 {
        fen.push('-');
    } else {
        if board.castling_rights & CASTLE_LIGHT_KINGSIDE != 0 {
            fen.push('K');
        }
        if board.castling_rights & CASTLE_LIGHT_QUEENSIDE != 0 {
            fen.push('Q');
        }
        if board.castling_rights & CASTLE_DARK_KINGSIDE != 0 {
            fen.push('k');
        }
        if board.castling_rights & CASTLE_DARK_QUEENSIDE != 0 {
            fen.push('q');
        }
    }

    fen.push(' ');
    match board.en_passant_square {
        Some(ep) => {
            fen.push_str(&square_to_algebraic(ep).unwrap_or_else(|_| "-".to_owned()))
        }
        None => fen.push('-'),
    }

    fen.push(' ');
    fen.push_str(&board.halfmove_clock.to_string());
    fen.push(' ');
    fen.push_str(&board.fullmove_number.to_string());

    fen
}
