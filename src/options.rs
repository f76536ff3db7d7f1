//! Per-run extraction options

use crate::args::Args;

/// Controls which stored metadata is restored onto extracted files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Leave modification times as written instead of restoring the archive's.
    pub ignore_timestamps: bool,
    /// Leave permissions at the process default instead of restoring unix modes.
    pub ignore_permissions: bool,
}

impl From<&Args> for ExtractOptions {
    fn from(args: &Args) -> Self {
        Self {
            ignore_timestamps: args.no_timestamps,
            ignore_permissions: args.no_permissions,
        }
    }
}
