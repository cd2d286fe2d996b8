mod application;
mod presentation;

use std::process::ExitCode;

use tred_core::error::Result;

fn main() -> Result<ExitCode> {
    application::run()
}
