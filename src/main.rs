use std::process::ExitCode;

fn main() -> ExitCode {
    match quince_chess::uci::uci_top::run_stdio_loop() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fatal: stdio loop failed: {err}");
            ExitCode::FAILURE
        }
    }
}
