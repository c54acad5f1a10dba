//! Entry layout for durable image storage.
//!
//! The backing store holds small key-value entries, so the bitmap is split
//! across sequential integer keys: every entry is exactly
//! [`MAX_ENTRY_BYTES`] long except the tail, which is exactly
//! `total % MAX_ENTRY_BYTES` bytes, with no padding. The functions here
//! are the single source of truth for that layout; the core's store glue
//! uses them for both directions so save and load can never disagree.

use core::ops::Range;

/// Maximum bytes per store entry (the backing store's per-entry cap)
pub const MAX_ENTRY_BYTES: usize = 256;

/// Number of entries needed for a buffer of `total` bytes
pub const fn entry_count(total: usize) -> usize {
    (total + MAX_ENTRY_BYTES - 1) / MAX_ENTRY_BYTES
}

/// Length of entry `index` for a buffer of `total` bytes.
///
/// Returns 0 for indexes past the end of the layout.
pub const fn entry_len(index: usize, total: usize) -> usize {
    let start = index * MAX_ENTRY_BYTES;
    if start >= total {
        return 0;
    }
    let remaining = total - start;
    if remaining < MAX_ENTRY_BYTES {
        remaining
    } else {
        MAX_ENTRY_BYTES
    }
}

/// Byte range covered by entry `index` for a buffer of `total` bytes
pub fn entry_range(index: usize, total: usize) -> Range<usize> {
    let start = index * MAX_ENTRY_BYTES;
    start..start + entry_len(index, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bitmap_layout() {
        // The 3360-byte bitmap needs 13 full entries and a 32-byte tail
        assert_eq!(entry_count(3360), 14);
        for index in 0..13 {
            assert_eq!(entry_len(index, 3360), 256);
        }
        assert_eq!(entry_len(13, 3360), 32);
        assert_eq!(entry_range(13, 3360), 3328..3360);
        assert_eq!(entry_len(14, 3360), 0);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        assert_eq!(entry_count(512), 2);
        assert_eq!(entry_len(1, 512), 256);
        assert_eq!(entry_len(2, 512), 0);
    }

    #[test]
    fn test_small_buffer() {
        assert_eq!(entry_count(32), 1);
        assert_eq!(entry_range(0, 32), 0..32);
    }

    proptest! {
        #[test]
        fn entries_partition_buffer(total in 1usize..50_000) {
            let count = entry_count(total);
            let mut covered = 0;
            for index in 0..count {
                let range = entry_range(index, total);
                prop_assert_eq!(range.start, covered);
                prop_assert!(!range.is_empty());
                prop_assert!(range.len() <= MAX_ENTRY_BYTES);
                covered = range.end;
            }
            prop_assert_eq!(covered, total);
            prop_assert_eq!(entry_len(count, total), 0);
        }
    }
}
