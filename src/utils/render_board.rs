//! ASCII rendering of a position for logs and test output.

use crate::game_state::board::Board;
use crate::game_state::chess_types::make_square;

pub fn render_board(board: &Board) -> String {
    let mut out = String::new();
    out.push_str("+---+---+---+---+---+---+---+---+\n");
    for rank in (0..8u8).rev() {
        for file in 0..8u8 {
            let cell = board
                .piece_on(make_square(file, rank))
                .map(|p| p.to_fen_char())
                .unwrap_or('.');
            out.push_str(&format!("| {cell} "));
        }
        out.push_str(&format!("| {}\n", rank + 1));
        out.push_str("+---+---+---+---+---+---+---+---+\n");
    }
    out.push_str("  a   b   c   d   e   f   g   h\n");
    out.push_str(&format!("FEN: {}\n", board.get_fen()));
    out
}

#[cfg(test)]
mod tests {
    use super::render_board;
    use crate::game_state::board::Board;

    #[test]
    fn render_includes_fen_line_and_all_ranks() {
        let rendered = render_board(&Board::new_game());
        assert!(rendered.contains("FEN: rnbqkbnr"));
        for rank in 1..=8 {
            assert!(rendered.contains(&format!("| {rank}\n")));
        }
    }
}
