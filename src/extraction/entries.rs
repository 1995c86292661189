//! Log entry segmentation.
//!
//! Home Assistant log records start with a `YYYY-MM-DD HH:MM:SS` timestamp
//! and may span several lines (tracebacks). An entry runs from one timestamp
//! to the next.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Timestamp prefix marking the start of a log record.
    static ref ENTRY_BOUNDARY: Regex = Regex::new(
        r"\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2}"
    ).unwrap();
}

/// Split raw log text into discrete entries.
///
/// Text before the first timestamp is not part of any entry, and a single
/// trailing newline at the very end of the input is not part of the last
/// entry. When no timestamp is present at all, the text is split on blank
/// line separators instead.
pub fn split_entries(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = ENTRY_BOUNDARY.find_iter(text).map(|m| m.start()).collect();

    if starts.is_empty() {
        return text.split("\n\n").collect();
    }

    let mut entries = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = match starts.get(i + 1) {
            Some(&next) => next,
            None => text.strip_suffix('\n').map_or(text.len(), |t| t.len().max(start)),
        };
        entries.push(&text[start..end]);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_timestamps() {
        let text = "2024-01-01 10:00:00 INFO first\n\
                    2024-01-01 10:00:01 ERROR second\n\
                    2024-01-01 10:00:02 INFO third\n";
        let entries = split_entries(text);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], "2024-01-01 10:00:00 INFO first\n");
        assert_eq!(entries[1], "2024-01-01 10:00:01 ERROR second\n");
        assert_eq!(entries[2], "2024-01-01 10:00:02 INFO third");
    }

    #[test]
    fn test_multiline_entry_kept_together() {
        let text = "2024-01-01 10:00:00 ERROR boom\nTraceback (most recent call last):\n  File \"x.py\"\n\
                    2024-01-01 10:00:05 INFO ok";
        let entries = split_entries(text);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].contains("Traceback"));
        assert!(entries[0].contains("x.py"));
    }

    #[test]
    fn test_leading_fragment_dropped() {
        let text = "tail of a previous record\n2024-01-01 10:00:00 INFO fresh";
        let entries = split_entries(text);
        assert_eq!(entries, vec!["2024-01-01 10:00:00 INFO fresh"]);
    }

    #[test]
    fn test_blank_line_fallback() {
        let text = "first block\nmore\n\nsecond block";
        let entries = split_entries(text);
        assert_eq!(entries, vec!["first block\nmore", "second block"]);
    }
}
