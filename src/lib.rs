//! Archive extraction orchestrator with observable, cancellable progress

pub mod args;
pub mod engine;
pub mod entry;
pub mod error;
pub mod extract;
pub mod linux;
pub mod options;
pub mod paths;
pub mod progress;
pub mod utils;
pub mod work;

pub use args::Args;
pub use engine::{EntryEngine, EntryStream, ZipEngine};
pub use entry::{ArchiveModel, Entry, LargeSize};
pub use error::{Error, Result};
pub use extract::{Dispatch, Unzip};
pub use options::ExtractOptions;
pub use progress::{Operation, Outcome, ProgressMonitor, ProgressSnapshot, State};
pub use utils::format_size;
pub use work::total_work;
