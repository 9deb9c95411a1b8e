//! Binary entrypoint for the `trendlink` CLI.

use std::process::ExitCode;

use trendlink::RunStatus;

fn main() -> ExitCode {
    match trendlink::run(std::env::args()) {
        Ok(RunStatus::Clean) => ExitCode::SUCCESS,
        // Some items were skipped; the run itself completed.
        Ok(RunStatus::Partial) => ExitCode::from(2),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
