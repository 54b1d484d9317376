use crate::game_state::chess_types::*;

/// Single undo record for `make_move` / `unmake_move`.
///
/// The captured square differs from the move's to-square only for en passant.
#[derive(Debug, Clone, Copy)]
pub struct UndoState {
    pub moved_piece: Piece,
    pub captured_piece: Option<Piece>,
    pub captured_square: Square,

    pub prev_castling_rights: CastlingRights,
    pub prev_en_passant_square: Option<Square>,
    pub prev_halfmove_clock: u16,
    pub prev_fullmove_number: u16,
    pub prev_zobrist_key: u64,
}

/// Undo record for `make_null_move` / `unmake_null_move`.
#[derive(Debug, Clone, Copy)]
pub struct NullUndo {
    pub prev_en_passant_square: Option<Square>,
    pub prev_halfmove_clock: u16,
    pub prev_zobrist_key: u64,
}
