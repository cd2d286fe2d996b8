use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tred_core::settings::DEFAULT_SUFFIX;

#[derive(Parser)]
#[command(
    name = "tredctl",
    author,
    version,
    about = "CLI for the 'Tamper Resistant Encrypted Data' protocol",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt provided file or directory
    #[command(visible_aliases = ["enc", "seal"])]
    Encrypt {
        input: PathBuf,

        /// cipher suite to use, 'chacha' or 'aes'
        #[arg(short, long, default_value = "chacha")]
        cipher: String,

        /// suffix to add on encrypted files
        #[arg(long, default_value = DEFAULT_SUFFIX)]
        suffix: String,

        /// remove original files after encrypt
        #[arg(short = 'd', long)]
        clean: bool,

        /// recursively process directories
        #[arg(short, long)]
        recursive: bool,

        /// include hidden files
        #[arg(short, long)]
        all: bool,

        /// number of workers to run for parallel processing
        #[arg(short, long)]
        workers: Option<usize>,

        /// suppress all output
        #[arg(short, long)]
        silent: bool,

        /// generate a JSON report of the process
        #[arg(long)]
        report: Option<PathBuf>,

        /// read the key from a file instead of prompting
        #[arg(long = "key-file")]
        key_file: Option<PathBuf>,
    },

    /// Decrypt provided file or directory
    #[command(visible_aliases = ["dec", "open"])]
    Decrypt {
        input: PathBuf,

        /// cipher suite to use, 'chacha' or 'aes'
        #[arg(short, long, default_value = "chacha")]
        cipher: String,

        /// suffix to remove from encrypted files
        #[arg(long, default_value = DEFAULT_SUFFIX)]
        suffix: String,

        /// remove sealed files after decrypt
        #[arg(short = 'd', long)]
        clean: bool,

        #[arg(short, long)]
        recursive: bool,

        #[arg(short, long)]
        all: bool,

        #[arg(short, long)]
        workers: Option<usize>,

        #[arg(short, long)]
        silent: bool,

        #[arg(long = "key-file")]
        key_file: Option<PathBuf>,
    },

    /// Securely delete files/directories while preventing contents recovery
    #[command(visible_aliases = ["del", "rm"])]
    Shred {
        input: PathBuf,

        #[arg(short, long)]
        recursive: bool,

        #[arg(short, long)]
        all: bool,

        #[arg(short, long)]
        workers: Option<usize>,

        #[arg(short, long)]
        silent: bool,

        /// suffix of the temporary ciphertext
        #[arg(long, default_value = DEFAULT_SUFFIX)]
        suffix: String,
    },

    /// Generate a random and secure key value
    Key {
        /// size (in bytes) for the key value
        #[arg(short, long, default_value_t = 128)]
        size: usize,

        /// encode the key in base64
        #[arg(short, long)]
        encode: bool,
    },

    /// Show version information
    #[command(visible_alias = "info")]
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn encrypt_defaults() {
        let cli = Cli::try_parse_from(["tredctl", "enc", "/tmp/x"]).unwrap();
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
                assert_eq!(input, PathBuf::from("/tmp/x"));
                assert_eq!(cipher, "chacha");
                assert_eq!(suffix, "_enc");
                assert!(!clean && !recursive && !all && !silent);
                assert_eq!(workers, None);
                assert!(report.is_none() && key_file.is_none());
            }
            _ => panic!("expected encrypt"),
        }
    }

    #[test]
    fn decrypt_short_flags() {
        let cli = Cli::try_parse_from(["tredctl", "open", "-drs", "-c", "aes", "-w", "3", "d"]).unwrap();
        match cli.command {
            Commands::Decrypt {
                cipher,
                clean,
                recursive,
                silent,
                workers,
                all,
                ..
            } => {
                assert_eq!(cipher, "aes");
                assert!(clean && recursive && silent && !all);
                assert_eq!(workers, Some(3));
            }
            _ => panic!("expected decrypt"),
        }
    }

    #[test]
    fn shred_and_key() {
        let cli = Cli::try_parse_from(["tredctl", "rm", "-ra", "dir"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Shred {
                recursive: true,
                all: true,
                ..
            }
        ));

        let cli = Cli::try_parse_from(["tredctl", "key", "-s", "32", "-e"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Key {
                size: 32,
                encode: true
            }
        ));
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["tredctl", "encrypt"]).is_err());
    }
}
