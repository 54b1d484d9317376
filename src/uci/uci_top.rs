//! UCI protocol front-end and command loop.
//!
//! The loop owns the current position and the transposition table. A `go`
//! moves the table into a single worker thread for the duration of the
//! search and takes it back when the worker is joined, so table access is
//! never shared between threads. Cancellation is one relaxed atomic flag.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::game_state::board::Board;
use crate::moves::move_encoding::move_to_uci;
use crate::search::board_scoring::EngineScorer;
use crate::search::iterative_deepening::{
    iterative_deepening_search, SearchConfig, SearchInfo,
};
use crate::search::transposition_table::TranspositionTable;
use crate::uci::time_management::{resolve_time_budget, GoParams};
use crate::utils::render_board::render_board;
use crate::utils::uci_moves::parse_uci_move;

const ENGINE_NAME: &str = "Quince Chess";
const ENGINE_AUTHOR: &str = "Quince Chess contributors";

const DEFAULT_HASH_MB: usize = 64;
const MIN_HASH_MB: usize = 1;
const MAX_HASH_MB: usize = 4096;

/// Read commands from stdin until `quit`, writing responses to stdout.
pub fn run_stdio_loop() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut state = UciState::new();

    for line in stdin.lock().lines() {
        let line = line?;
        let should_quit = state.handle_command(&line, &mut stdout)?;
        stdout.flush()?;
        if should_quit {
            break;
        }
    }

    state.stop_and_join_worker();
    Ok(())
}

struct UciState {
    board: Board,
    /// Position hashes since the game start, oldest first, fed to the search
    /// for threefold detection.
    game_history: Vec<u64>,
    hash_mb: usize,
    /// `None` exactly while a worker owns the table.
    tt: Option<TranspositionTable>,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<TranspositionTable>>,
}

impl UciState {
    fn new() -> Self {
        let board = Board::new_game();
        UciState {
            game_history: vec![board.zobrist_key],
            board,
            hash_mb: DEFAULT_HASH_MB,
            tt: Some(TranspositionTable::new_with_mb(DEFAULT_HASH_MB)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    fn handle_command(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or_default();

        match cmd {
            "uci" => {
                writeln!(out, "id name {ENGINE_NAME}")?;
                writeln!(out, "id author {ENGINE_AUTHOR}")?;
                writeln!(
                    out,
                    "option name Hash type spin default {DEFAULT_HASH_MB} min {MIN_HASH_MB} max {MAX_HASH_MB}"
                )?;
                writeln!(out, "uciok")?;
            }
            "isready" => {
                writeln!(out, "readyok")?;
            }
            "setoption" => {
                if let Err(err) = self.handle_setoption(trimmed) {
                    writeln!(out, "info string setoption error: {err}")?;
                }
            }
            "ucinewgame" => {
                self.stop_and_join_worker();
                if let Some(tt) = self.tt.as_mut() {
                    tt.clear();
                }
                self.board = Board::new_game();
                self.game_history = vec![self.board.zobrist_key];
            }
            "position" => {
                if let Err(err) = self.handle_position(trimmed) {
                    writeln!(out, "info string position error: {err}")?;
                }
            }
            "go" => {
                self.handle_go(trimmed);
            }
            "stop" => {
                self.stop_and_join_worker();
            }
            "d" => {
                // Non-standard debug aid: print the current position.
                write!(out, "{}", render_board(&self.board))?;
            }
            "quit" => {
                return Ok(true);
            }
            _ => {
                // Unknown commands are ignored for UCI compatibility.
            }
        }

        Ok(false)
    }

    fn handle_setoption(&mut self, line: &str) -> Result<(), String> {
        let mut tokens = line.split_whitespace();
        let _ = tokens.next(); // setoption

        let mut name_tokens = Vec::<&str>::new();
        let mut value_tokens = Vec::<&str>::new();
        let mut mode = "";

        for tok in tokens {
            match tok {
                "name" => mode = "name",
                "value" => mode = "value",
                _ if mode == "name" => name_tokens.push(tok),
                _ if mode == "value" => value_tokens.push(tok),
                _ => {}
            }
        }

        let name = name_tokens.join(" ");
        let value = value_tokens.join(" ");

        if name.eq_ignore_ascii_case("Hash") {
            let parsed = value
                .parse::<usize>()
                .map_err(|_| format!("invalid Hash value '{value}'"))?;
            self.stop_and_join_worker();
            self.hash_mb = parsed.clamp(MIN_HASH_MB, MAX_HASH_MB);
            self.tt = Some(TranspositionTable::new_with_mb(self.hash_mb));
            Ok(())
        } else {
            Err(format!("unsupported option '{name}'"))
        }
    }

    fn handle_position(&mut self, line: &str) -> Result<(), String> {
        let mut tokens = line.split_whitespace().peekable();
        let _ = tokens.next(); // "position"

        let mut board = match tokens.next() {
            Some("startpos") => Board::new_game(),
            Some("fen") => {
                let mut fen_fields = Vec::<&str>::new();
                while let Some(&next) = tokens.peek() {
                    if next == "moves" {
                        break;
                    }
                    fen_fields.push(next);
                    let _ = tokens.next();
                }
                if fen_fields.is_empty() {
                    return Err("missing FEN after 'position fen'".to_owned());
                }
                Board::from_fen(&fen_fields.join(" "))?
            }
            Some(other) => return Err(format!("unsupported position token '{other}'")),
            None => return Err("incomplete position command".to_owned()),
        };

        let mut history = vec![board.zobrist_key];

        if tokens.peek().copied() == Some("moves") {
            let _ = tokens.next();
            for text in tokens {
                // An unrecognized move stops replay at that token.
                let Some(m) = parse_uci_move(&board, text) else {
                    break;
                };
                board.make_move(m);
                history.push(board.zobrist_key);
            }
        }

        self.board = board;
        self.game_history = history;
        Ok(())
    }

    fn handle_go(&mut self, line: &str) {
        self.stop_and_join_worker();

        let params = parse_go_params(line);
        let budget = resolve_time_budget(self.board.side_to_move, &params);
        let max_depth = params.depth.unwrap_or(0);

        self.stop_flag.store(false, Ordering::Relaxed);

        let board = self.board;
        let history = self.game_history.clone();
        let stop_flag = Arc::clone(&self.stop_flag);
        let mut tt = self
            .tt
            .take()
            .unwrap_or_else(|| TranspositionTable::new_with_mb(self.hash_mb));

        self.worker = Some(thread::spawn(move || {
            let mut out = io::stdout();

            let mut emit_info = |info: &SearchInfo| {
                let mut line = format!("info depth {}", info.depth);
                match info.mate_in {
                    Some(mate) => line.push_str(&format!(" score mate {mate}")),
                    None => line.push_str(&format!(" score cp {}", info.score)),
                }
                line.push_str(&format!(
                    " nodes {} time {} hashfull {} nps {}",
                    info.nodes, info.time_ms, info.hashfull, info.nps
                ));
                if !info.pv.is_empty() {
                    line.push_str(" pv");
                    for &m in &info.pv {
                        line.push(' ');
                        line.push_str(&move_to_uci(m));
                    }
                }
                let _ = writeln!(out, "{line}");
                let _ = out.flush();
            };

            let result = iterative_deepening_search(
                &board,
                &EngineScorer,
                SearchConfig {
                    max_depth,
                    movetime_ms: budget,
                    stop_flag: Some(stop_flag),
                    repetition_history: history,
                },
                &mut tt,
                Some(&mut emit_info),
            );

            let _ = writeln!(out, "bestmove {}", move_to_uci(result.best_move));
            let _ = out.flush();

            tt
        }));
    }

    /// Signal the worker to stop and take the table back.
    fn stop_and_join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.stop_flag.store(true, Ordering::Relaxed);
            if let Ok(tt) = handle.join() {
                self.tt = Some(tt);
            }
        }
    }
}

fn parse_go_params(line: &str) -> GoParams {
    let mut params = GoParams::default();
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let mut i = 0usize;
    while i < tokens.len() {
        match tokens[i] {
            "wtime" => {
                i += 1;
                params.wtime_ms = tokens.get(i).and_then(|x| x.parse().ok());
            }
            "btime" => {
                i += 1;
                params.btime_ms = tokens.get(i).and_then(|x| x.parse().ok());
            }
            "winc" => {
                i += 1;
                params.winc_ms = tokens.get(i).and_then(|x| x.parse().ok());
            }
            "binc" => {
                i += 1;
                params.binc_ms = tokens.get(i).and_then(|x| x.parse().ok());
            }
            "movestogo" => {
                i += 1;
                params.movestogo = tokens.get(i).and_then(|x| x.parse().ok());
            }
            "movetime" => {
                i += 1;
                params.movetime_ms = tokens.get(i).and_then(|x| x.parse().ok());
            }
            "depth" => {
                i += 1;
                params.depth = tokens.get(i).and_then(|x| x.parse().ok());
            }
            "infinite" => {
                params.infinite = true;
            }
            _ => {}
        }
        i += 1;
    }

    params
}

#[cfg(test)]
mod tests {
    use super::{parse_go_params, UciState};
    use crate::game_state::chess_types::Color;

    #[test]
    fn position_startpos_with_moves_updates_state() {
        let mut state = UciState::new();
        state
            .handle_position("position startpos moves e2e4 e7e5 g1f3")
            .expect("position command should parse");

        assert_eq!(state.board.side_to_move, Color::Dark);
        assert_eq!(state.game_history.len(), 4);
    }

    #[test]
    fn position_fen_without_moves_updates_state() {
        let mut state = UciState::new();
        state
            .handle_position("position fen 8/8/8/8/8/8/4P3/4K3 w - - 0 1")
            .expect("position fen should parse");

        assert_eq!(state.board.get_fen(), "8/8/8/8/8/8/4P3/4K3 w - - 0 1");
    }

    #[test]
    fn bad_fen_keeps_previous_state() {
        let mut state = UciState::new();
        let before = state.board.get_fen();
        assert!(state
            .handle_position("position fen not a fen at all 0 1")
            .is_err());
        assert_eq!(state.board.get_fen(), before);
    }

    #[test]
    fn unknown_move_stops_replay_at_that_token() {
        let mut state = UciState::new();
        state
            .handle_position("position startpos moves e2e4 zz9 e7e5")
            .expect("position command should parse");

        // Only e2e4 applies; the bogus token halts replay before e7e5.
        assert_eq!(state.board.side_to_move, Color::Dark);
        assert_eq!(state.game_history.len(), 2);
    }

    #[test]
    fn setoption_hash_clamps_to_supported_range() {
        let mut state = UciState::new();

        state
            .handle_setoption("setoption name Hash value 128")
            .expect("hash should parse");
        assert_eq!(state.hash_mb, 128);

        state
            .handle_setoption("setoption name Hash value 0")
            .expect("hash should parse");
        assert_eq!(state.hash_mb, 1);

        state
            .handle_setoption("setoption name Hash value 99999")
            .expect("hash should parse");
        assert_eq!(state.hash_mb, 4096);
    }

    #[test]
    fn go_params_parse_clocks_and_modes() {
        let params =
            parse_go_params("go wtime 120000 btime 60000 winc 1000 binc 2000 movestogo 24");
        assert_eq!(params.wtime_ms, Some(120_000));
        assert_eq!(params.btime_ms, Some(60_000));
        assert_eq!(params.winc_ms, Some(1_000));
        assert_eq!(params.binc_ms, Some(2_000));
        assert_eq!(params.movestogo, Some(24));
        assert!(!params.infinite);

        let params = parse_go_params("go depth 6 infinite");
        assert_eq!(params.depth, Some(6));
        assert!(params.infinite);

        let params = parse_go_params("go movetime 500");
        assert_eq!(params.movetime_ms, Some(500));
    }

    #[test]
    fn uci_handshake_lists_the_hash_option() {
        let mut state = UciState::new();
        let mut out = Vec::new();
        let quit = state
            .handle_command("uci", &mut out)
            .expect("command should run");
        let text = String::from_utf8(out).expect("output should be utf8");

        assert!(!quit);
        assert!(text.contains("id name"));
        assert!(text.contains("option name Hash type spin default 64 min 1 max 4096"));
        assert!(text.ends_with("uciok\n"));
    }

    #[test]
    fn isready_answers_readyok_and_quit_terminates() {
        let mut state = UciState::new();
        let mut out = Vec::new();
        assert!(!state
            .handle_command("isready", &mut out)
            .expect("command should run"));
        assert_eq!(String::from_utf8_lossy(&out), "readyok\n");

        let mut out = Vec::new();
        assert!(state
            .handle_command("quit", &mut out)
            .expect("command should run"));
    }
}
