//! Archive model: entry descriptors and the ordered entry directory
//!
//! The central directory itself is parsed by the `zip` crate. This module only
//! keeps what the orchestrator needs to size, place and locate each entry.
//!
//! # Large-size extension
//!
//! The classic zip header stores sizes in 32-bit fields. An entry whose true
//! size does not fit carries the `0xFFFFFFFF` sentinel there and records the
//! real sizes in its ZIP64 extended information, modelled here as
//! [`LargeSize`].

use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::error::{Error, Result};

/// Sentinel stored in a standard size field when the value lives in the extension.
pub const SIZE_SENTINEL: u32 = u32::MAX;

/// ZIP64 extended size record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LargeSize {
    pub compressed: u64,
    pub uncompressed: u64,
}

/// One archive member, file or directory.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    /// Standard compressed-size field.
    pub compressed_size: u32,
    /// Standard uncompressed-size field.
    pub uncompressed_size: u32,
    pub large_size: Option<LargeSize>,
    /// Position in the archive's central directory.
    pub index: usize,
    pub last_modified: Option<zip::DateTime>,
    pub unix_mode: Option<u32>,
}

impl Entry {
    pub fn file(name: impl Into<String>, compressed_size: u32) -> Self {
        Self {
            name: name.into(),
            compressed_size,
            uncompressed_size: compressed_size,
            ..Default::default()
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            ..Default::default()
        }
    }

    pub fn with_large_size(mut self, compressed: u64, uncompressed: u64) -> Self {
        self.large_size = Some(LargeSize {
            compressed,
            uncompressed,
        });
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Work units this entry contributes to a bulk estimate.
    ///
    /// The extension's compressed size wins only when the extension is present
    /// and records a positive uncompressed size.
    pub fn work_size(&self) -> u64 {
        match self.large_size {
            Some(large) if large.uncompressed > 0 => large.compressed,
            _ => u64::from(self.compressed_size),
        }
    }

    /// True uncompressed size, read through the extension when needed.
    pub fn size(&self) -> u64 {
        match self.large_size {
            Some(large) if self.uncompressed_size == SIZE_SENTINEL => large.uncompressed,
            _ => u64::from(self.uncompressed_size),
        }
    }

    /// Build a descriptor from the true sizes reported by the zip backend,
    /// restoring the on-disk split between standard fields and extension.
    fn from_true_sizes(name: String, is_dir: bool, compressed: u64, uncompressed: u64) -> Self {
        let needs_extension =
            compressed >= u64::from(SIZE_SENTINEL) || uncompressed >= u64::from(SIZE_SENTINEL);
        let narrow = |value: u64| u32::try_from(value).unwrap_or(SIZE_SENTINEL);

        Self {
            name,
            is_dir,
            compressed_size: if needs_extension { SIZE_SENTINEL } else { narrow(compressed) },
            uncompressed_size: if needs_extension { SIZE_SENTINEL } else { narrow(uncompressed) },
            large_size: needs_extension.then_some(LargeSize {
                compressed,
                uncompressed,
            }),
            ..Default::default()
        }
    }
}

/// Parsed archive: the ordered entry directory.
///
/// `Default` gives a model without a directory, which extraction rejects.
#[derive(Debug, Clone, Default)]
pub struct ArchiveModel {
    entries: Option<Vec<Entry>>,
}

impl ArchiveModel {
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries: Some(entries),
        }
    }

    pub fn read_directory<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Self> {
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            // Raw access skips decryption, only metadata is needed here
            let file = archive
                .by_index_raw(i)
                .map_err(|e| Error::archive(format!("#{i}"), e))?;
            let mut entry = Entry::from_true_sizes(
                file.name().to_string(),
                file.is_dir(),
                file.compressed_size(),
                file.size(),
            );
            entry.index = i;
            entry.last_modified = file.last_modified();
            entry.unix_mode = file.unix_mode();
            entries.push(entry);
        }
        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> Option<&[Entry]> {
        self.entries.as_deref()
    }

    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries()?.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries().map_or(0, <[Entry]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    #[test]
    fn work_size_prefers_extension_with_positive_uncompressed() {
        let entry =
            Entry::file("big.bin", SIZE_SENTINEL).with_large_size(6_000_000_000, 9_000_000_000);
        assert_eq!(entry.work_size(), 6_000_000_000);
    }

    #[test]
    fn work_size_ignores_extension_with_zero_uncompressed() {
        let entry = Entry::file("data.bin", 42).with_large_size(999, 0);
        assert_eq!(entry.work_size(), 42);
    }

    #[test]
    fn size_reads_through_sentinel() {
        let mut entry = Entry::file("big.bin", SIZE_SENTINEL).with_large_size(5, 7_000_000_000);
        entry.uncompressed_size = SIZE_SENTINEL;
        assert_eq!(entry.size(), 7_000_000_000);
        assert_eq!(Entry::file("small", 10).size(), 10);
    }

    #[test]
    fn oversized_entries_move_to_extension() {
        let entry = Entry::from_true_sizes("huge.iso".into(), false, 5_000_000_000, 8_000_000_000);
        assert_eq!(entry.compressed_size, SIZE_SENTINEL);
        assert_eq!(entry.uncompressed_size, SIZE_SENTINEL);
        assert_eq!(
            entry.large_size,
            Some(LargeSize {
                compressed: 5_000_000_000,
                uncompressed: 8_000_000_000,
            })
        );
        assert_eq!(entry.work_size(), 5_000_000_000);
        assert_eq!(entry.size(), 8_000_000_000);

        let small = Entry::from_true_sizes("a.txt".into(), false, 10, 20);
        assert_eq!((small.compressed_size, small.uncompressed_size), (10, 20));
        assert!(small.large_size.is_none());
    }

    #[test]
    fn default_model_has_no_directory() {
        let model = ArchiveModel::default();
        assert!(model.entries().is_none());
        assert!(model.is_empty());
    }

    #[test]
    fn reads_directory_in_archive_order() {
        let mut buf = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buf));
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            zip.add_directory("dir/", options).unwrap();
            zip.start_file("dir/a.txt", options).unwrap();
            zip.write_all(b"hello").unwrap();
            zip.start_file("b.txt", options).unwrap();
            zip.write_all(b"world!").unwrap();
            zip.finish().unwrap();
        }

        let mut archive = ZipArchive::new(Cursor::new(buf)).unwrap();
        let model = ArchiveModel::read_directory(&mut archive).unwrap();
        let entries = model.entries().unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["dir/", "dir/a.txt", "b.txt"]);
        assert!(entries[0].is_dir);
        assert_eq!(entries[1].compressed_size, 5);
        assert_eq!(entries[2].index, 2);
        assert!(entries[2].large_size.is_none());
        assert_eq!(model.find("b.txt").unwrap().size(), 6);
        assert!(model.find("missing").is_none());
    }
}
