use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quince_chess::game_state::board::Board;
use quince_chess::search::board_scoring::TaperedScorer;
use quince_chess::search::iterative_deepening::{iterative_deepening_search, SearchConfig};
use quince_chess::search::transposition_table::TranspositionTable;

struct BenchCase {
    name: &'static str,
    fen: &'static str,
    depth: u8,
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "startpos",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        depth: 5,
    },
    BenchCase {
        name: "middlegame",
        fen: "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        depth: 4,
    },
    BenchCase {
        name: "rook_endgame",
        fen: "8/5pk1/6p1/8/3R4/6P1/5PK1/3r4 w - - 0 1",
        depth: 6,
    },
];

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(8));
    group.sample_size(10);

    for case in CASES {
        let board = Board::from_fen(case.fen).expect("benchmark FEN should parse");
        let bench_name = format!("{}_d{}", case.name, case.depth);

        group.bench_with_input(BenchmarkId::from_parameter(bench_name), &case.depth, |b, &depth| {
            b.iter(|| {
                // A fresh table per iteration keeps runs comparable.
                let mut tt = TranspositionTable::new_with_mb(16);
                let result = iterative_deepening_search(
                    black_box(&board),
                    &TaperedScorer,
                    SearchConfig {
                        max_depth: depth,
                        ..SearchConfig::default()
                    },
                    &mut tt,
                    None,
                );
                black_box(result.nodes)
            });
        });
    }

    group.finish();
}

criterion_group!(search_benches, bench_search);
criterion_main!(search_benches);
