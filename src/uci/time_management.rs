//! Per-move time budgeting for `go` commands.
//!
//! The UCI layer passes raw clock fields through; this module turns them into
//! a single optional millisecond budget for the search deadline.

use crate::game_state::chess_types::Color;

/// Fixed allowance for I/O and scheduling latency.
pub const MOVE_OVERHEAD_MS: u64 = 20;

const DEFAULT_MOVES_TO_GO: u64 = 30;

#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: Option<u64>,
    pub binc_ms: Option<u64>,
    pub movestogo: Option<u32>,
    pub movetime_ms: Option<u64>,
    pub depth: Option<u8>,
    pub infinite: bool,
}

/// Resolve the clock fields into a move budget; `None` means no time limit.
pub fn resolve_time_budget(side_to_move: Color, params: &GoParams) -> Option<u64> {
    if let Some(movetime) = params.movetime_ms {
        return Some(movetime.saturating_sub(MOVE_OVERHEAD_MS).max(1));
    }
    if params.infinite {
        return None;
    }

    let (own_time, own_inc) = match side_to_move {
        Color::Light => (params.wtime_ms, params.winc_ms),
        Color::Dark => (params.btime_ms, params.binc_ms),
    };
    let own_time = own_time?;

    let moves_to_go = params.movestogo.map_or(DEFAULT_MOVES_TO_GO, |n| u64::from(n.max(1)));
    let budget = own_time / moves_to_go + own_inc.unwrap_or(0) * 3 / 4;

    Some(budget.min(own_time.saturating_sub(MOVE_OVERHEAD_MS)).max(1))
}

#[cfg(test)]
mod tests {
    use super::{resolve_time_budget, GoParams, MOVE_OVERHEAD_MS};
    use crate::game_state::chess_types::Color;

    #[test]
    fn movetime_subtracts_overhead_and_floors_at_one() {
        let params = GoParams {
            movetime_ms: Some(1000),
            ..GoParams::default()
        };
        assert_eq!(
            resolve_time_budget(Color::Light, &params),
            Some(1000 - MOVE_OVERHEAD_MS)
        );

        let tiny = GoParams {
            movetime_ms: Some(5),
            ..GoParams::default()
        };
        assert_eq!(resolve_time_budget(Color::Light, &tiny), Some(1));
    }

    #[test]
    fn infinite_means_no_deadline() {
        let params = GoParams {
            infinite: true,
            wtime_ms: Some(60_000),
            ..GoParams::default()
        };
        assert_eq!(resolve_time_budget(Color::Light, &params), None);
    }

    #[test]
    fn clock_budget_divides_remaining_time_and_adds_increment() {
        let params = GoParams {
            wtime_ms: Some(60_000),
            btime_ms: Some(30_000),
            winc_ms: Some(1_000),
            binc_ms: Some(2_000),
            ..GoParams::default()
        };
        assert_eq!(
            resolve_time_budget(Color::Light, &params),
            Some(60_000 / 30 + 750)
        );
        assert_eq!(
            resolve_time_budget(Color::Dark, &params),
            Some(30_000 / 30 + 1_500)
        );
    }

    #[test]
    fn movestogo_overrides_the_default_divisor() {
        let params = GoParams {
            wtime_ms: Some(10_000),
            movestogo: Some(5),
            ..GoParams::default()
        };
        assert_eq!(resolve_time_budget(Color::Light, &params), Some(2_000));
    }

    #[test]
    fn budget_never_exceeds_remaining_clock_minus_overhead() {
        let params = GoParams {
            wtime_ms: Some(100),
            winc_ms: Some(60_000),
            movestogo: Some(1),
            ..GoParams::default()
        };
        assert_eq!(
            resolve_time_budget(Color::Light, &params),
            Some(100 - MOVE_OVERHEAD_MS)
        );
    }

    #[test]
    fn missing_clock_means_no_limit() {
        assert_eq!(resolve_time_budget(Color::Light, &GoParams::default()), None);
    }
}
