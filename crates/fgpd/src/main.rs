//! `fgpd` serves the bundled echo service.

use std::process::ExitCode;

use fgpd::{EchoService, run_daemon};

fn main() -> ExitCode {
    match run_daemon(&EchoService::create) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("fgpd: {error}");
            ExitCode::FAILURE
        }
    }
}
