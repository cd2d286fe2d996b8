pub mod handlers;
pub mod logging;
pub mod secret;

use std::process::ExitCode;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use tred_core::error::Result;

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Encrypt {
            input,
            cipher,
            suffix,
            clean,
            recursive,
            all,
            workers,
            silent,
            report,
            key_file,
        } => {
            logging::init(silent);
            handlers::handle_encrypt(
                input, cipher, suffix, clean, recursive, all, workers, silent, report, key_file,
            )
        }
        Commands::Decrypt {
            input,
            cipher,
            suffix,
            clean,
            recursive,
            all,
            workers,
            silent,
            key_file,
        } => {
            logging::init(silent);
            handlers::handle_decrypt(
                input, cipher, suffix, clean, recursive, all, workers, silent, key_file,
            )
        }
        Commands::Shred {
            input,
            recursive,
            all,
            workers,
            silent,
            suffix,
        } => {
            logging::init(silent);
            handlers::handle_shred(input, recursive, all, workers, silent, suffix)
        }
        Commands::Key { size, encode } => handlers::handle_key(size, encode),
        Commands::Version => handlers::handle_version(),
    }
}
