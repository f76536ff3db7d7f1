//! Per-entry extraction engine
//!
//! The orchestrator decides *what* to extract and *where*; an [`EntryEngine`]
//! moves one entry's decompressed bytes onto disk. [`ZipEngine`] is the
//! implementation backed by the `zip` crate.
//!
//! # Performance
//!
//! - The archive is memory-mapped once (files over 1 MiB) and shared between
//!   every clone of the engine, so background runs never contend on a reader
//! - 256KB output buffers matching typical filesystem block sizes
//! - Linux fallocate()/fadvise() hints when available

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::entry::{ArchiveModel, Entry};
use crate::error::{Error, Result};
use crate::linux::{fadvise_dontneed, fadvise_sequential, madvise_sequential, preallocate_file};
use crate::options::ExtractOptions;
use crate::paths;
use crate::progress::ProgressMonitor;
use crate::utils::datetime_to_filetime;

/// Buffer size for file I/O (256KB for better throughput)
const BUFFER_SIZE: usize = 256 * 1024;

/// Archives above this size are memory-mapped rather than read into memory.
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Extracts a single entry.
///
/// Implementations must be shareable with a background thread.
pub trait EntryEngine: Send + Sync + 'static {
    /// Handle for reading one entry's decompressed bytes.
    type Stream;

    /// Write `entry` to `base + (override_name or entry.name)`.
    ///
    /// The parent directory already exists. Work completed is reported on
    /// `progress` in the same units as [`Entry::work_size`]. Returns the
    /// number of bytes written.
    fn extract(
        &self,
        entry: &Entry,
        base: &Path,
        override_name: Option<&str>,
        options: &ExtractOptions,
        progress: &ProgressMonitor,
    ) -> Result<u64>;

    fn open_stream(&self, entry: &Entry) -> Result<Self::Stream>;
}

/// Archive bytes shared by every engine clone.
#[derive(Debug, Clone)]
enum ArchiveBytes {
    Mapped(Arc<Mmap>),
    Owned(Arc<[u8]>),
}

impl AsRef<[u8]> for ArchiveBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => map,
            Self::Owned(bytes) => bytes,
        }
    }
}

/// [`EntryEngine`] over a zip archive.
#[derive(Debug, Clone)]
pub struct ZipEngine {
    archive: ZipArchive<Cursor<ArchiveBytes>>,
}

impl ZipEngine {
    /// Open the zip file at `path`, memory-mapping it when it is large.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let file_size = file.metadata().map_err(|e| Error::io(path, e))?.len();

        fadvise_sequential(&file, file_size);

        let bytes = if file_size > MMAP_THRESHOLD {
            // SAFETY: the mapping is read-only; the archive must not be
            // truncated while it is being extracted
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(path, e))?;
            madvise_sequential(mmap.as_ptr(), mmap.len());
            ArchiveBytes::Mapped(Arc::new(mmap))
        } else {
            let mut buf = Vec::with_capacity(file_size as usize);
            (&file)
                .read_to_end(&mut buf)
                .map_err(|e| Error::io(path, e))?;
            ArchiveBytes::Owned(buf.into())
        };

        Self::from_archive_bytes(bytes, &path.display().to_string())
    }

    /// Engine over an in-memory archive.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        Self::from_archive_bytes(ArchiveBytes::Owned(bytes.into()), "<memory>")
    }

    fn from_archive_bytes(bytes: ArchiveBytes, label: &str) -> Result<Self> {
        let archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::archive(label, e))?;
        Ok(Self { archive })
    }

    /// Parse the central directory into an [`ArchiveModel`].
    pub fn read_model(&self) -> Result<ArchiveModel> {
        let mut archive = self.archive.clone();
        let model = ArchiveModel::read_directory(&mut archive)?;
        debug!(entries = model.len(), "read central directory");
        Ok(model)
    }
}

impl EntryEngine for ZipEngine {
    type Stream = EntryStream;

    fn extract(
        &self,
        entry: &Entry,
        base: &Path,
        override_name: Option<&str>,
        options: &ExtractOptions,
        progress: &ProgressMonitor,
    ) -> Result<u64> {
        let name = override_name
            .filter(|n| !n.is_empty())
            .unwrap_or(&entry.name);
        let outpath = paths::compose(base, name)?;

        let mut archive = self.archive.clone();
        let mut file = archive
            .by_index(entry.index)
            .map_err(|e| Error::archive(&entry.name, e))?;
        let written = write_entry(&mut file, &outpath, entry, progress)?;
        drop(file);

        finalize_extracted_file(&outpath, entry, options);
        debug!(entry = %entry.name, path = %outpath.display(), bytes = written, "extracted");
        Ok(written)
    }

    fn open_stream(&self, entry: &Entry) -> Result<EntryStream> {
        let mut archive = self.archive.clone();
        // Fail here rather than on first read if the entry is not in this archive
        archive
            .by_index_raw(entry.index)
            .map_err(|e| Error::archive(&entry.name, e))?;
        Ok(EntryStream {
            archive,
            index: entry.index,
            name: entry.name.clone(),
        })
    }
}

/// An opened archive entry.
///
/// Reading is two-step: the decompressor borrows the archive handle held
/// here, so [`open_reader`](Self::open_reader) hands out a fresh reader over
/// the entry's bytes each time it is called.
#[derive(Debug)]
pub struct EntryStream {
    archive: ZipArchive<Cursor<ArchiveBytes>>,
    index: usize,
    name: String,
}

impl EntryStream {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start reading the decompressed bytes from the beginning of the entry.
    pub fn open_reader(&mut self) -> Result<impl Read + '_> {
        self.archive
            .by_index(self.index)
            .map_err(|e| Error::archive(&self.name, e))
    }
}

/// Stream `reader` into a new file at `outpath`, reporting work as it goes.
fn write_entry<R: Read>(
    reader: &mut R,
    outpath: &Path,
    entry: &Entry,
    progress: &ProgressMonitor,
) -> Result<u64> {
    let size = entry.size();
    let work = entry.work_size();

    let outfile = File::create(outpath).map_err(|e| Error::io(outpath, e))?;
    preallocate_file(&outfile, size);

    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, outfile);
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut bytes_written = 0u64;
    let mut reported = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| Error::io(outpath, e))?;
        if bytes_read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..bytes_read])
            .map_err(|e| Error::io(outpath, e))?;
        bytes_written += bytes_read as u64;

        let done = scaled_work(bytes_written, size, work);
        progress.update_work_completed(done - reported);
        reported = done;
    }
    progress.update_work_completed(work.saturating_sub(reported));

    let inner_file = writer
        .into_inner()
        .map_err(|e| Error::io(outpath, e.into_error()))?;
    fadvise_dontneed(&inner_file, size);

    Ok(bytes_written)
}

/// Work units matching `written` of `size` output bytes, capped at `work`.
fn scaled_work(written: u64, size: u64, work: u64) -> u64 {
    if size == 0 {
        return 0;
    }
    let scaled = u128::from(work) * u128::from(written) / u128::from(size);
    (scaled as u64).min(work)
}

/// Restore modification time and unix mode. Failures are logged, not fatal.
fn finalize_extracted_file(outpath: &Path, entry: &Entry, options: &ExtractOptions) {
    if !options.ignore_timestamps
        && let Some(dt) = entry.last_modified
        && let Err(e) = filetime::set_file_mtime(outpath, datetime_to_filetime(dt))
    {
        warn!(path = %outpath.display(), "failed to restore modification time: {e}");
    }

    #[cfg(unix)]
    {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        if !options.ignore_permissions
            && let Some(mode) = entry.unix_mode
            && let Err(e) = fs::set_permissions(outpath, fs::Permissions::from_mode(mode))
        {
            warn!(path = %outpath.display(), "failed to restore permissions: {e}");
        }
    }
}
