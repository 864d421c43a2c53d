//! Binary entrypoint for the couchview view server.

use std::io::{self, Write};
use std::process::ExitCode;

use couchviewd::{SystemConfigLoader, launch};

fn main() -> ExitCode {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    match launch(&SystemConfigLoader, &mut input, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr().lock(), "couchviewd: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
