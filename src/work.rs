//! Aggregate work estimation

use crate::entry::Entry;
use crate::error::{Error, Result};

/// Total work units (compressed bytes) across `entries`.
///
/// Each entry contributes [`Entry::work_size`]. The sum is kept in `u64` so
/// archives larger than the 32-bit size field still estimate correctly.
///
/// # Errors
///
/// [`Error::InvalidInput`] when the collection is absent. An empty collection
/// is fine and yields `0`.
pub fn total_work(entries: Option<&[Entry]>) -> Result<u64> {
    let entries = entries.ok_or_else(|| {
        Error::InvalidInput("entry collection is absent, cannot calculate total work".into())
    })?;

    Ok(entries
        .iter()
        .fold(0u64, |total, entry| total.saturating_add(entry.work_size())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::SIZE_SENTINEL;

    #[test]
    fn absent_collection_is_invalid_input() {
        assert!(matches!(total_work(None), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn empty_collection_is_zero() {
        assert_eq!(total_work(Some(&[] as &[Entry])).unwrap(), 0);
    }

    #[test]
    fn mixes_standard_and_extended_sizes() {
        let entries = [
            Entry::file("a", 100),
            Entry::file("b", SIZE_SENTINEL).with_large_size(5_000_000_000, 6_000_000_000),
            Entry::file("c", 42).with_large_size(7, 0),
            Entry::directory("d/"),
        ];
        assert_eq!(
            total_work(Some(entries.as_slice())).unwrap(),
            100 + 5_000_000_000 + 42
        );
    }

    #[test]
    fn sum_exceeds_standard_field_range() {
        let entries = vec![Entry::file("part", u32::MAX - 1); 4];
        let expected = 4 * u64::from(u32::MAX - 1);
        assert_eq!(total_work(Some(entries.as_slice())).unwrap(), expected);
    }
}
