use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::collection::ImportOptions;

#[derive(Parser, Debug)]
#[command(name = "apkg-import")]
#[command(version)]
#[command(about = "Inspect and decode flashcard .apkg packages", long_about = None)]
#[command(after_help = "Examples:\n  \
  apkg-import list deck.apkg                 list archive entries\n  \
  apkg-import inspect *.apkg --check         count decks/notes/cards, report dangling ids\n  \
  apkg-import dump deck.apkg --pretty | less print the decoded package as JSON")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verify CRC-32 of every extracted entry
    #[arg(long, global = true)]
    pub verify_checksums: bool,

    /// Skip the media manifest
    #[arg(long, global = true)]
    pub no_media: bool,

    /// Give up on a package after this many seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List archive entries (reads only the central directory)
    List {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// List verbosely: sizes, method and timestamps
        #[arg(short = 'v')]
        verbose: bool,
    },

    /// Print a one-line summary per package
    Inspect {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Also report dangling note/model/deck references
        #[arg(long)]
        check: bool,
    },

    /// Print the decoded package as JSON
    Dump {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

impl Cli {
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            verify_checksums: self.verify_checksums,
            include_media: !self.no_media,
            ..ImportOptions::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.quiet {
            0 => "info",
            1 => "warn",
            _ => "error",
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "apkg-import",
            "inspect",
            "a.apkg",
            "b.apkg",
            "--verify-checksums",
            "--timeout",
            "5",
            "-qq",
        ])
        .unwrap();

        let options = cli.import_options();
        assert!(options.verify_checksums);
        assert!(options.include_media);
        assert_eq!(options.collection_entries, ImportOptions::default().collection_entries);
        assert_eq!(cli.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(cli.log_level(), "error");
        match cli.command {
            Command::Inspect { files, check } => {
                assert_eq!(files.len(), 2);
                assert!(!check);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inspect_needs_a_file() {
        assert!(Cli::try_parse_from(["apkg-import", "inspect"]).is_err());
    }

    #[test]
    fn no_media_flag() {
        let cli = Cli::try_parse_from(["apkg-import", "dump", "x.apkg", "--no-media"]).unwrap();
        assert!(!cli.import_options().include_media);
        assert!(!cli.is_quiet());
    }
}
