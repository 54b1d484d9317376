//! Incremental board state: bitboards, mailbox, and Zobrist hash upkeep.
//!
//! `Board` is the engine's central model. Twelve piece bitboards and a
//! 64-entry mailbox are kept in lockstep by `put_piece`/`remove_piece`, the
//! only primitives allowed to touch placement state; make/unmake and the FEN
//! parser are built on top of them so the running hash can never drift from
//! the placement.

use crate::game_state::chess_rules::STARTING_POSITION_FEN;
use crate::game_state::chess_types::*;
use crate::game_state::undo_state::{NullUndo, UndoState};
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::move_encoding::{
    move_from, move_kind, move_to, promotion_kind, Move, MoveKind,
};
use crate::moves::pawn_moves::pawn_attacks;
use crate::moves::sliding_moves::{bishop_attacks, rook_attacks};
use crate::search::zobrist::{castling_key, en_passant_file_key, piece_square_key, side_to_move_key};
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

/// Castling-rights mask to AND in after a move touches `square`. Identity
/// everywhere except the rook and king home squares.
pub const CASTLING_UPDATE: [CastlingRights; 64] = generate_castling_update();

const fn generate_castling_update() -> [CastlingRights; 64] {
    let mut table = [CASTLE_ALL; 64];
    table[0] = CASTLE_ALL & !CASTLE_LIGHT_QUEENSIDE; // a1
    table[4] = CASTLE_ALL & !(CASTLE_LIGHT_KINGSIDE | CASTLE_LIGHT_QUEENSIDE); // e1
    table[7] = CASTLE_ALL & !CASTLE_LIGHT_KINGSIDE; // h1
    table[56] = CASTLE_ALL & !CASTLE_DARK_QUEENSIDE; // a8
    table[60] = CASTLE_ALL & !(CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE); // e8
    table[63] = CASTLE_ALL & !CASTLE_DARK_KINGSIDE; // h8
    table
}

/// Full position state. Copying is cheap and copies are independent, which
/// the legality filter and search rely on.
#[derive(Debug, Clone, Copy)]
pub struct Board {
    // [color][piece_kind]
    pub pieces: [[u64; 6]; 2],
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,
    pub mailbox: [Option<Piece>; 64],

    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,

    pub halfmove_clock: u16,
    pub fullmove_number: u16,

    pub zobrist_key: u64,
}

impl Default for Board {
    fn default() -> Self {
        Board {
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,
            mailbox: [None; 64],
            side_to_move: Color::Light,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            zobrist_key: 0,
        }
    }
}

impl Board {
    #[inline]
    pub fn new_empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn new_game() -> Self {
        parse_fen(STARTING_POSITION_FEN).expect("starting FEN should always parse")
    }

    #[inline]
    pub fn from_fen(fen: &str) -> Result<Self, String> {
        parse_fen(fen)
    }

    #[inline]
    pub fn get_fen(&self) -> String {
        generate_fen(self)
    }

    #[inline]
    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.mailbox[square as usize]
    }

    /// Place `piece` on an empty square, updating every placement view and
    /// the running hash together.
    #[inline]
    pub fn put_piece(&mut self, piece: Piece, square: Square) {
        debug_assert!(self.mailbox[square as usize].is_none());
        let bb = square_bb(square);
        self.pieces[piece.color.index()][piece.kind.index()] |= bb;
        self.occupancy_by_color[piece.color.index()] |= bb;
        self.occupancy_all |= bb;
        self.mailbox[square as usize] = Some(piece);
        self.zobrist_key ^= piece_square_key(piece, square);
    }

    /// Remove and return the piece on `square`.
    #[inline]
    pub fn remove_piece(&mut self, square: Square) -> Piece {
        let piece = self.mailbox[square as usize]
            .expect("remove_piece requires an occupied square");
        let bb = square_bb(square);
        self.pieces[piece.color.index()][piece.kind.index()] ^= bb;
        self.occupancy_by_color[piece.color.index()] ^= bb;
        self.occupancy_all ^= bb;
        self.mailbox[square as usize] = None;
        self.zobrist_key ^= piece_square_key(piece, square);
        piece
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let kings = self.pieces[color.index()][PieceKind::King.index()];
        if kings == 0 {
            None
        } else {
            Some(kings.trailing_zeros() as Square)
        }
    }

    /// True iff any piece of `attacker_color` attacks `square`, using the
    /// attack tables from the target square's viewpoint.
    pub fn is_square_attacked(&self, square: Square, attacker_color: Color) -> bool {
        let them = attacker_color.index();

        if pawn_attacks(attacker_color.opposite(), square)
            & self.pieces[them][PieceKind::Pawn.index()]
            != 0
        {
            return true;
        }
        if knight_attacks(square) & self.pieces[them][PieceKind::Knight.index()] != 0 {
            return true;
        }
        if king_attacks(square) & self.pieces[them][PieceKind::King.index()] != 0 {
            return true;
        }

        let bishops_queens = self.pieces[them][PieceKind::Bishop.index()]
            | self.pieces[them][PieceKind::Queen.index()];
        if bishop_attacks(square, self.occupancy_all) & bishops_queens != 0 {
            return true;
        }

        let rooks_queens = self.pieces[them][PieceKind::Rook.index()]
            | self.pieces[them][PieceKind::Queen.index()];
        rook_attacks(square, self.occupancy_all) & rooks_queens != 0
    }

    /// Apply a legal move in place and return the record needed to reverse
    /// it. Passing a move that is not legal in this position is a caller bug.
    pub fn make_move(&mut self, m: Move) -> UndoState {
        let from = move_from(m);
        let to = move_to(m);
        let kind = move_kind(m);
        let us = self.side_to_move;
        let moved = self
            .piece_on(from)
            .expect("make_move requires a piece on the from-square");

        let (captured_piece, captured_square) = match kind {
            MoveKind::EnPassant => {
                let cap_sq = make_square(square_file(to), square_rank(from));
                (self.piece_on(cap_sq), cap_sq)
            }
            MoveKind::Castle => (None, to),
            _ => (self.piece_on(to), to),
        };

        let undo = UndoState {
            moved_piece: moved,
            captured_piece,
            captured_square,
            prev_castling_rights: self.castling_rights,
            prev_en_passant_square: self.en_passant_square,
            prev_halfmove_clock: self.halfmove_clock,
            prev_fullmove_number: self.fullmove_number,
            prev_zobrist_key: self.zobrist_key,
        };

        self.zobrist_key ^= castling_key(self.castling_rights);
        if let Some(ep) = self.en_passant_square {
            self.zobrist_key ^= en_passant_file_key(square_file(ep));
        }
        self.en_passant_square = None;

        match kind {
            MoveKind::Normal => {
                if captured_piece.is_some() {
                    self.remove_piece(to);
                    self.halfmove_clock = 0;
                } else if moved.kind == PieceKind::Pawn {
                    self.halfmove_clock = 0;
                    if from.abs_diff(to) == 16 {
                        self.en_passant_square = Some((from + to) / 2);
                    }
                } else {
                    self.halfmove_clock = self.halfmove_clock.saturating_add(1);
                }
                self.remove_piece(from);
                self.put_piece(moved, to);
            }
            MoveKind::EnPassant => {
                self.remove_piece(captured_square);
                self.remove_piece(from);
                self.put_piece(moved, to);
                self.halfmove_clock = 0;
            }
            MoveKind::Castle => {
                self.remove_piece(from);
                self.put_piece(moved, to);
                let rank = square_rank(from);
                let (rook_from, rook_to) = if to > from {
                    (make_square(7, rank), make_square(5, rank))
                } else {
                    (make_square(0, rank), make_square(3, rank))
                };
                let rook = self.remove_piece(rook_from);
                self.put_piece(rook, rook_to);
                self.halfmove_clock = self.halfmove_clock.saturating_add(1);
            }
            MoveKind::Promotion => {
                if captured_piece.is_some() {
                    self.remove_piece(to);
                }
                self.remove_piece(from);
                self.put_piece(Piece::new(us, promotion_kind(m)), to);
                self.halfmove_clock = 0;
            }
        }

        self.castling_rights &=
            CASTLING_UPDATE[from as usize] & CASTLING_UPDATE[to as usize];

        if us == Color::Dark {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = us.opposite();
        self.zobrist_key ^= side_to_move_key();

        self.zobrist_key ^= castling_key(self.castling_rights);
        if let Some(ep) = self.en_passant_square {
            self.zobrist_key ^= en_passant_file_key(square_file(ep));
        }

        undo
    }

    /// Reverse `make_move`, restoring every byte of the prior state.
    pub fn unmake_move(&mut self, m: Move, undo: &UndoState) {
        let from = move_from(m);
        let to = move_to(m);
        let kind = move_kind(m);

        self.side_to_move = self.side_to_move.opposite();

        match kind {
            MoveKind::Normal | MoveKind::EnPassant => {
                let moved = self.remove_piece(to);
                self.put_piece(moved, from);
                if let Some(captured) = undo.captured_piece {
                    self.put_piece(captured, undo.captured_square);
                }
            }
            MoveKind::Castle => {
                let king = self.remove_piece(to);
                self.put_piece(king, from);
                let rank = square_rank(from);
                let (rook_from, rook_to) = if to > from {
                    (make_square(7, rank), make_square(5, rank))
                } else {
                    (make_square(0, rank), make_square(3, rank))
                };
                let rook = self.remove_piece(rook_to);
                self.put_piece(rook, rook_from);
            }
            MoveKind::Promotion => {
                self.remove_piece(to);
                self.put_piece(undo.moved_piece, from);
                if let Some(captured) = undo.captured_piece {
                    self.put_piece(captured, undo.captured_square);
                }
            }
        }

        self.castling_rights = undo.prev_castling_rights;
        self.en_passant_square = undo.prev_en_passant_square;
        self.halfmove_clock = undo.prev_halfmove_clock;
        self.fullmove_number = undo.prev_fullmove_number;
        self.zobrist_key = undo.prev_zobrist_key;
    }

    /// Pass the turn without moving; used by null-move pruning.
    pub fn make_null_move(&mut self) -> NullUndo {
        let undo = NullUndo {
            prev_en_passant_square: self.en_passant_square,
            prev_halfmove_clock: self.halfmove_clock,
            prev_zobrist_key: self.zobrist_key,
        };

        if let Some(ep) = self.en_passant_square {
            self.zobrist_key ^= en_passant_file_key(square_file(ep));
        }
        self.en_passant_square = None;
        self.side_to_move = self.side_to_move.opposite();
        self.zobrist_key ^= side_to_move_key();
        self.halfmove_clock = self.halfmove_clock.saturating_add(1);

        undo
    }

    pub fn unmake_null_move(&mut self, undo: &NullUndo) {
        self.side_to_move = self.side_to_move.opposite();
        self.en_passant_square = undo.prev_en_passant_square;
        self.halfmove_clock = undo.prev_halfmove_clock;
        self.zobrist_key = undo.prev_zobrist_key;
    }

    /// Cross-check every placement view against the others. Test support.
    pub fn validate_consistency(&self) -> Result<(), String> {
        let mut union_all = 0u64;
        for color in [Color::Light, Color::Dark] {
            let mut union_color = 0u64;
            for kind in ALL_PIECE_KINDS {
                let bb = self.pieces[color.index()][kind.index()];
                if bb & union_all != 0 {
                    return Err(format!("piece bitboards overlap for {color:?} {kind:?}"));
                }
                union_all |= bb;
                union_color |= bb;
            }
            if union_color != self.occupancy_by_color[color.index()] {
                return Err(format!("occupancy mismatch for {color:?}"));
            }
        }
        if union_all != self.occupancy_all {
            return Err("total occupancy mismatch".to_owned());
        }

        for sq in 0..64u8 {
            let from_mailbox = self.mailbox[sq as usize];
            let mut from_bitboards = None;
            for color in [Color::Light, Color::Dark] {
                for kind in ALL_PIECE_KINDS {
                    if self.pieces[color.index()][kind.index()] & square_bb(sq) != 0 {
                        from_bitboards = Some(Piece::new(color, kind));
                    }
                }
            }
            if from_mailbox != from_bitboards {
                return Err(format!("mailbox disagrees with bitboards on square {sq}"));
            }
        }

        let recomputed = crate::search::zobrist::compute_zobrist_key(self);
        if recomputed != self.zobrist_key {
            return Err("incremental hash differs from recomputed hash".to_owned());
        }

        Ok(())
    }
}
