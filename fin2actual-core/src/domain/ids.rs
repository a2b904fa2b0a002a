//! Canonical identifiers
//!
//! Financier keys every document with a composite `_id` such as
//! `b_<budget>_account_<uuid>`. The trailing UUID is stable, so it doubles as
//! the provisional destination id and as the key into the identifier map.

/// Separator between the segments of a composite id
pub const SEPARATOR: char = '_';

/// Return the part of `composite` after the final separator.
///
/// An id without any separator is returned unchanged.
pub fn canonical_id(composite: &str) -> &str {
    match composite.rfind(SEPARATOR) {
        Some(idx) => &composite[idx + SEPARATOR.len_utf8()..],
        None => composite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_id_takes_last_segment() {
        assert_eq!(
            canonical_id("acct_2024-01-01_3fa85f64-5717-4562-b3fc-2c963f66afa6"),
            "3fa85f64-5717-4562-b3fc-2c963f66afa6"
        );
        assert_eq!(
            canonical_id("b_1111_master-category_2222"),
            "2222"
        );
    }

    #[test]
    fn test_canonical_id_without_separator() {
        assert_eq!(canonical_id("plain"), "plain");
    }
}
