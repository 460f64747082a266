//! Dotted version ordering.
//!
//! Versions are compared numerically segment by segment, so `1.10` sorts
//! after `1.9` and `1.2` equals `1.2.0`. Parsing never fails: anything
//! without a numeric segment degrades to `0`.

use std::cmp::Ordering;

/// Comparator for dotted version strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionComparator;

impl VersionComparator {
    /// Parses a version into its numeric segments.
    ///
    /// Segments that are not entirely ASCII digits (or overflow `u64`) are
    /// skipped. A version with no numeric segment parses to `[0]`.
    #[must_use]
    pub fn parse(version: &str) -> Vec<u64> {
        let segments: Vec<u64> = version
            .trim()
            .split('.')
            .filter(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|part| part.parse().ok())
            .collect();

        if segments.is_empty() { vec![0] } else { segments }
    }

    /// Compares two versions, padding the shorter one with zeros.
    #[must_use]
    pub fn compare(a: &str, b: &str) -> Ordering {
        let a = Self::parse(a);
        let b = Self::parse(b);
        let len = a.len().max(b.len());

        let padded = |v: &[u64], i: usize| v.get(i).copied().unwrap_or(0);

        (0..len)
            .map(|i| padded(&a, i).cmp(&padded(&b, i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Returns true if `available` is strictly newer than `current`.
    #[must_use]
    pub fn is_newer(current: &str, available: &str) -> bool {
        Self::compare(current, available) == Ordering::Less
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(VersionComparator::parse("3.0.2"), vec![3, 0, 2]);
        assert_eq!(VersionComparator::parse(""), vec![0]);
        assert_eq!(VersionComparator::parse("preview"), vec![0]);
        assert_eq!(VersionComparator::parse("2.1-beta.4"), vec![2, 4]);
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(VersionComparator::compare("1.9", "1.10"), Ordering::Less);
        assert_eq!(VersionComparator::compare("1.10", "1.9"), Ordering::Greater);
    }

    #[test]
    fn test_zero_padding() {
        assert_eq!(VersionComparator::compare("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(VersionComparator::compare("1.2.0.0", "1.2"), Ordering::Equal);
        assert_eq!(VersionComparator::compare("1.2", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn test_reflexive() {
        for v in ["", "0", "1.0.0", "garbage", "10.4.33"] {
            assert_eq!(VersionComparator::compare(v, v), Ordering::Equal, "{v}");
        }
    }

    #[test]
    fn test_is_newer() {
        assert!(VersionComparator::is_newer("2.0.0", "2.0.1"));
        assert!(!VersionComparator::is_newer("2.0.1", "2.0.1"));
        assert!(!VersionComparator::is_newer("3.0", "2.9.9"));
        assert!(VersionComparator::is_newer("", "1.0"));
    }
}
