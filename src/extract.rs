//! Extraction orchestration
//!
//! [`Unzip`] sequences whole-archive and single-entry extraction: it estimates
//! the work, prepares output directories, hands each file entry to an
//! [`EntryEngine`] and keeps the caller's [`ProgressMonitor`] current.
//!
//! # Synchronous and background runs
//!
//! Every operation takes a `run_async` flag. When it is `false` the work runs
//! on the calling thread and any failure is both recorded on the monitor and
//! returned. When it is `true` one detached thread is spawned per call and the
//! call returns at once with [`Dispatch::Background`]; failures inside that
//! thread are recorded on the monitor and go no further. Callers of background
//! runs learn the result by polling [`ProgressMonitor::snapshot`] or blocking
//! on [`ProgressMonitor::wait`].
//!
//! Entries of one run are always extracted one at a time, in archive order.
//! Cancellation is checked before each entry of a whole-archive run and leaves
//! what was already extracted in place.
//!
//! # Examples
//!
//! ```no_run
//! use unspool::{ExtractOptions, ProgressMonitor, Unzip};
//!
//! let unzip = Unzip::open("archive.zip")?;
//! let progress = ProgressMonitor::new();
//! unzip.extract_all(&ExtractOptions::default(), "out", &progress, false)?;
//! assert!(progress.outcome().unwrap().is_success());
//! # Ok::<(), unspool::Error>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::engine::{EntryEngine, ZipEngine};
use crate::entry::{ArchiveModel, Entry};
use crate::error::{Error, Result};
use crate::options::ExtractOptions;
use crate::paths;
use crate::progress::{Operation, ProgressMonitor};
use crate::work::total_work;

const WORKER_THREAD_NAME: &str = "unspool-extract";

/// How an extraction call was carried out.
#[derive(Debug)]
pub enum Dispatch {
    /// The run finished on the calling thread.
    Completed,
    /// The run continues on a detached thread.
    ///
    /// Dropping the handle does not stop or join the thread. Joining yields no
    /// error either; the outcome is on the progress monitor.
    Background(JoinHandle<()>),
}

impl Dispatch {
    pub fn is_background(&self) -> bool {
        matches!(self, Self::Background(_))
    }

    /// Block until a background run's thread exits. No-op for completed runs.
    pub fn join(self) {
        if let Self::Background(handle) = self
            && handle.join().is_err()
        {
            warn!("extraction thread panicked");
        }
    }
}

enum Completion {
    Finished,
    Cancelled,
}

/// Extraction orchestrator over a parsed archive.
#[derive(Debug)]
pub struct Unzip<E = ZipEngine> {
    model: Arc<ArchiveModel>,
    engine: Arc<E>,
}

impl<E> Clone for Unzip<E> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            engine: Arc::clone(&self.engine),
        }
    }
}

impl Unzip<ZipEngine> {
    /// Open a zip file and read its central directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_engine(ZipEngine::open(path)?)
    }

    pub fn with_engine(engine: ZipEngine) -> Result<Self> {
        let model = engine.read_model()?;
        Ok(Self::new(model, engine))
    }
}

impl<E: EntryEngine> Unzip<E> {
    pub fn new(model: ArchiveModel, engine: E) -> Self {
        Self {
            model: Arc::new(model),
            engine: Arc::new(engine),
        }
    }

    pub fn model(&self) -> &ArchiveModel {
        &self.model
    }

    /// Extract every entry under `base`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the archive has no entry directory
    /// - on the synchronous path, the first entry failure; remaining entries
    ///   are not attempted
    /// - [`Error::Spawn`] if a background run's thread cannot be started. This
    ///   is the only failure a background call returns; once the thread runs,
    ///   failures reach the monitor alone
    ///
    /// A cancellation request is not an error: the run stops before the next
    /// entry and the monitor records [`Outcome::Cancelled`].
    ///
    /// [`Outcome::Cancelled`]: crate::progress::Outcome::Cancelled
    pub fn extract_all(
        &self,
        options: &ExtractOptions,
        base: impl AsRef<Path>,
        progress: &ProgressMonitor,
        run_async: bool,
    ) -> Result<Dispatch> {
        let entries = self.model.entries().ok_or_else(|| {
            record(
                progress,
                Error::InvalidState("archive has no entry directory".into()),
            )
        })?;

        let total = total_work(Some(entries)).map_err(|e| record(progress, e))?;
        progress.begin(Operation::ExtractAll, total, None);
        info!(
            entries = entries.len(),
            total_work = total,
            background = run_async,
            "extracting archive"
        );

        if run_async {
            let this = self.clone();
            let options = *options;
            let base = base.as_ref().to_path_buf();
            let worker = progress.clone();
            return spawn(progress, move || {
                match this.run_all(&options, &base, &worker) {
                    Ok(Completion::Finished) => worker.end_success(),
                    Ok(Completion::Cancelled) => {},
                    // Already on the monitor
                    Err(e) => debug!("background extraction stopped: {e}"),
                }
            });
        }

        if let Completion::Finished = self.run_all(options, base.as_ref(), progress)? {
            progress.end_success();
        }
        Ok(Dispatch::Completed)
    }

    fn run_all(
        &self,
        options: &ExtractOptions,
        base: &Path,
        progress: &ProgressMonitor,
    ) -> Result<Completion> {
        for entry in self.model.entries().unwrap_or_default() {
            if progress.is_cancel_requested() {
                info!(next = %entry.name, "extraction cancelled");
                progress.end_cancelled();
                return Ok(Completion::Cancelled);
            }
            self.extract_one(entry, base, options, None, progress)?;
        }
        info!(base = %base.display(), "archive extracted");
        Ok(Completion::Finished)
    }

    /// Extract a single entry, optionally under a different name.
    ///
    /// `override_name` replaces the entry's own name relative to `base`; it may
    /// contain separators, and missing directories along it are created.
    ///
    /// The work total recorded for this run is the entry's *standard*
    /// compressed size field. Unlike [`extract_all`](Self::extract_all) it
    /// does not read through the large-size extension, so ZIP64 entries
    /// report the sentinel value as their total.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the entry has no name
    /// - on the synchronous path, any failure placing the entry
    /// - [`Error::Spawn`] if a background run's thread cannot be started; later
    ///   failures of that run are recorded on the monitor only
    pub fn extract_file(
        &self,
        entry: &Entry,
        base: impl AsRef<Path>,
        options: &ExtractOptions,
        override_name: Option<&str>,
        progress: &ProgressMonitor,
        run_async: bool,
    ) -> Result<Dispatch> {
        if entry.name.is_empty() {
            return Err(record(
                progress,
                Error::InvalidInput("entry has no name".into()),
            ));
        }

        progress.begin(
            Operation::ExtractEntry,
            u64::from(entry.compressed_size),
            Some(&entry.name),
        );
        debug!(entry = %entry.name, background = run_async, "extracting entry");

        if run_async {
            let this = self.clone();
            let entry = entry.clone();
            let base = base.as_ref().to_path_buf();
            let options = *options;
            let override_name = override_name.map(str::to_string);
            let worker = progress.clone();
            return spawn(progress, move || {
                match this.extract_one(&entry, &base, &options, override_name.as_deref(), &worker) {
                    Ok(()) => worker.end_success(),
                    Err(e) => debug!("background extraction stopped: {e}"),
                }
            });
        }

        self.extract_one(entry, base.as_ref(), options, override_name, progress)?;
        progress.end_success();
        Ok(Dispatch::Completed)
    }

    /// [`extract_file`](Self::extract_file) for the entry called `name`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if no entry has that name.
    pub fn extract_file_by_name(
        &self,
        name: &str,
        base: impl AsRef<Path>,
        options: &ExtractOptions,
        override_name: Option<&str>,
        progress: &ProgressMonitor,
        run_async: bool,
    ) -> Result<Dispatch> {
        if self.model.entries().is_none() {
            return Err(record(
                progress,
                Error::InvalidState("archive has no entry directory".into()),
            ));
        }
        let entry = self.model.find(name).ok_or_else(|| {
            record(
                progress,
                Error::InvalidInput(format!("no entry named '{name}'")),
            )
        })?;
        self.extract_file(entry, base, options, override_name, progress, run_async)
    }

    /// Open `entry` for reading its decompressed bytes.
    pub fn open_entry_stream(&self, entry: &Entry) -> Result<E::Stream> {
        if entry.name.is_empty() {
            return Err(Error::InvalidInput("entry has no name".into()));
        }
        self.engine.open_stream(entry)
    }

    /// Place one entry on disk. Any failure is recorded on `progress` before
    /// it is returned.
    fn extract_one(
        &self,
        entry: &Entry,
        base: &Path,
        options: &ExtractOptions,
        override_name: Option<&str>,
        progress: &ProgressMonitor,
    ) -> Result<()> {
        self.place_entry(entry, base, options, override_name, progress)
            .map_err(|e| {
                warn!(entry = %entry.name, "extraction failed: {e}");
                record(progress, e)
            })
    }

    fn place_entry(
        &self,
        entry: &Entry,
        base: &Path,
        options: &ExtractOptions,
        override_name: Option<&str>,
        progress: &ProgressMonitor,
    ) -> Result<()> {
        if entry.name.is_empty() {
            return Err(Error::InvalidInput("entry has no name".into()));
        }
        progress.set_file_name(&entry.name);
        let base: PathBuf = paths::normalize_base(base)?;

        if entry.is_dir {
            paths::ensure_dir_exists(&base, &entry.name)?;
            return Ok(());
        }

        let name = override_name
            .filter(|n| !n.is_empty())
            .unwrap_or(&entry.name);
        paths::ensure_parent_exists(&base, name)?;
        self.engine
            .extract(entry, &base, override_name, options, progress)?;
        Ok(())
    }
}

/// Record `error` as the run's outcome and hand it back for propagation.
fn record(progress: &ProgressMonitor, error: Error) -> Error {
    progress.end_error(error.clone());
    error
}

fn spawn(progress: &ProgressMonitor, job: impl FnOnce() + Send + 'static) -> Result<Dispatch> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(job)
        .map(Dispatch::Background)
        .map_err(|e| record(progress, Error::Spawn(Arc::new(e))))
}
