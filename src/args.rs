//! Command-line argument parsing
//!
//! # Examples
//!
//! ```no_run
//! use unspool::Args;
//! use clap::Parser;
//!
//! let args = Args::parse();
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Extract a zip archive, or one entry of it, with live progress
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:
  unspool archive.zip                         Extract all entries to current directory
  unspool -d /tmp archive.zip                 Extract to /tmp
  unspool archive.zip docs/readme.txt         Extract a single entry
  unspool archive.zip a.txt --rename b.txt    Extract a single entry under a new name
  unspool -b archive.zip                      Extract on a background thread, polling progress")]
pub struct Args {
    /// Path to the ZIP file to extract
    #[arg(value_name = "FILE")]
    pub zipfile: PathBuf,

    /// Entry to extract (default: all entries)
    #[arg(value_name = "ENTRY")]
    pub entry: Option<String>,

    /// Directory to extract files to (default: current directory)
    #[arg(short = 'd', long = "directory", value_name = "EXDIR")]
    pub output_dir: Option<PathBuf>,

    /// Write the selected entry under this name instead
    #[arg(long = "rename", value_name = "NAME", requires = "entry")]
    pub rename: Option<String>,

    /// Run extraction on a background thread and watch its progress
    #[arg(short = 'b', long = "background")]
    pub background: bool,

    /// Skip restoring file timestamps
    #[arg(short = 'D', long = "no-timestamps")]
    pub no_timestamps: bool,

    /// Skip restoring unix permissions
    #[arg(long = "no-permissions")]
    pub no_permissions: bool,

    /// Quiet mode (-q quieter, -qq quietest)
    #[arg(short = 'q', long = "quiet", action = clap::ArgAction::Count)]
    pub quiet: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_entry_with_rename() {
        let args = Args::try_parse_from([
            "unspool", "-d", "/tmp/out", "a.zip", "dir/a.txt", "--rename", "b.txt", "-qq",
        ])
        .unwrap();
        assert_eq!(args.zipfile, PathBuf::from("a.zip"));
        assert_eq!(args.entry.as_deref(), Some("dir/a.txt"));
        assert_eq!(args.rename.as_deref(), Some("b.txt"));
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(args.quiet, 2);
    }

    #[test]
    fn rename_requires_entry() {
        assert!(Args::try_parse_from(["unspool", "a.zip", "--rename", "b.txt"]).is_err());
    }
}
