pub mod board;
pub mod chess_rules;
pub mod chess_types;
pub mod undo_state;
