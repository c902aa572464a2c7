//! Raw log inspection: paging, keyword search with surrounding lines, and the
//! record window around a selected entry.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lines shown before and after each raw search hit
pub const DEFAULT_SEARCH_RADIUS: usize = 5;

/// Records shown before and after a selected entry
pub const DEFAULT_CONTEXT_RANGE: usize = 5;

/// A raw line with its 1-based number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    pub number: usize,
    pub text: String,
}

/// One page of the raw text and the total page count (at least 1).
/// Pages are 1-based; out-of-range pages are clamped.
pub fn page_lines(raw: &str, page: usize, per_page: usize) -> (Vec<RawLine>, usize) {
    let lines: Vec<&str> = raw.lines().collect();
    let per_page = per_page.max(1);
    let total_pages = lines.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(lines.len());
    let slice = lines
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, text)| RawLine {
            number: start + i + 1,
            text: text.to_string(),
        })
        .collect();

    (slice, total_pages)
}

/// Lines matching `keyword` plus `radius` lines around each hit, in file order
/// and without duplicates.
///
/// Matching is case-insensitive with runs of whitespace collapsed. In strict
/// mode the whole line must equal the keyword.
pub fn search_raw(raw: &str, keyword: &str, strict: bool, radius: usize) -> Vec<RawLine> {
    let needle = normalize(keyword);
    if needle.is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = raw.lines().collect();
    let mut selected = BTreeSet::new();
    for (index, line) in lines.iter().enumerate() {
        let haystack = normalize(line);
        let hit = if strict {
            haystack == needle
        } else {
            haystack.contains(&needle)
        };
        if hit {
            let end = (index + radius).min(lines.len() - 1);
            selected.extend(index.saturating_sub(radius)..=end);
        }
    }

    selected
        .into_iter()
        .map(|index| RawLine {
            number: index + 1,
            text: lines[index].to_string(),
        })
        .collect()
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A record in a context window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRecord {
    /// Position of the record in the whole file
    pub index: usize,
    pub text: String,
    pub selected: bool,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    pub matched_index: usize,
    pub records: Vec<ContextRecord>,
}

/// Splits raw text into multi-line records and finds the one holding an entry
pub struct ContextExtractor {
    record_start: Regex,
}

impl ContextExtractor {
    pub fn new() -> Self {
        Self {
            record_start: Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").unwrap(),
        }
    }

    /// A record is a timestamped line plus the continuation lines after it.
    /// Lines before the first timestamp form their own leading record.
    pub fn split_records(&self, raw: &str) -> Vec<String> {
        let mut records = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in raw.lines() {
            if self.record_start.is_match(line) && !current.is_empty() {
                records.push(current.join("\n"));
                current.clear();
            }
            current.push(line);
        }
        if !current.is_empty() {
            records.push(current.join("\n"));
        }

        records
    }

    /// The first record containing `message` (case-insensitive) and up to
    /// `range` records on either side
    pub fn entry_context(&self, raw: &str, message: &str, range: usize) -> Option<ContextWindow> {
        let needle = message.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let records = self.split_records(raw);
        let matched_index = records.iter().position(|r| r.to_lowercase().contains(&needle))?;

        let start = matched_index.saturating_sub(range);
        let end = matched_index.saturating_add(range).saturating_add(1).min(records.len());
        let window = records[start..end]
            .iter()
            .enumerate()
            .map(|(offset, text)| ContextRecord {
                index: start + offset,
                selected: start + offset == matched_index,
                is_error: text.to_uppercase().contains("[ERROR"),
                text: text.clone(),
            })
            .collect();

        Some(ContextWindow {
            matched_index,
            records: window,
        })
    }
}

impl Default for ContextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(count: usize) -> String {
        (1..=count).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_paging() {
        let raw = numbered(25);
        let (page, total) = page_lines(&raw, 3, 10);
        assert_eq!(total, 3);
        assert_eq!(page.len(), 5);
        assert_eq!(page[0], RawLine { number: 21, text: "line 21".to_string() });

        let (clamped, _) = page_lines(&raw, 99, 10);
        assert_eq!(clamped[0].number, 21);

        let (empty, total) = page_lines("", 1, 10);
        assert!(empty.is_empty());
        assert_eq!(total, 1);
    }

    #[test]
    fn test_search_returns_surrounding_lines_once() {
        let raw = numbered(30);
        let hits = search_raw(&raw, "LINE 10", false, 5);
        let numbers: Vec<usize> = hits.iter().map(|l| l.number).collect();
        assert_eq!(numbers, (5..=15).collect::<Vec<_>>());

        let overlapping = search_raw(&raw, "line 2", false, 1);
        // line 2, line 20..29 overlap into contiguous runs
        assert_eq!(overlapping.first().unwrap().number, 1);
        assert_eq!(overlapping.last().unwrap().number, 30);
        let unique: BTreeSet<usize> = overlapping.iter().map(|l| l.number).collect();
        assert_eq!(unique.len(), overlapping.len());
    }

    #[test]
    fn test_search_normalizes_whitespace_and_strict_mode() {
        let raw = "a\n  Cash   Dispenser   Jammed  \nb\ncash dispenser jammed again";
        assert_eq!(search_raw(raw, "cash dispenser jammed", false, 0).len(), 2);

        let strict = search_raw(raw, "CASH DISPENSER JAMMED", true, 0);
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].number, 2);

        assert!(search_raw(raw, "   ", false, 5).is_empty());
    }

    #[test]
    fn test_records_keep_continuation_lines() {
        let raw = "preamble\n\
                   2025-06-08 02:00:15 [INFO] (Core) - start\n\
                   2025-06-08 02:00:16 [ERROR] (Db) - query failed\n\
                   \tat Db.run\n\
                   \tat Main.main\n\
                   2025-06-08 02:00:17 [WARN ] (Core) - retrying";
        let extractor = ContextExtractor::new();
        let records = extractor.split_records(raw);
        assert_eq!(records.len(), 4);
        assert_eq!(records[2], "2025-06-08 02:00:16 [ERROR] (Db) - query failed\n\tat Db.run\n\tat Main.main");
    }

    #[test]
    fn test_entry_context_window() {
        let raw = (0..20)
            .map(|i| {
                let level = if i == 12 { "ERROR" } else { "INFO" };
                format!("2025-06-08 02:00:{:02} [{}] (Core) - event {}", i, level, i)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let window = ContextExtractor::new().entry_context(&raw, "EVENT 10", 2).unwrap();
        assert_eq!(window.matched_index, 10);
        let indices: Vec<usize> = window.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![8, 9, 10, 11, 12]);
        assert!(window.records[2].selected);
        assert!(window.records[4].is_error);
        assert!(!window.records[0].is_error);
    }

    #[test]
    fn test_entry_context_clamps_and_misses() {
        let raw = "2025-06-08 02:00:00 [ERROR] (Core) - first\n2025-06-08 02:00:01 [INFO] (Core) - second";
        let extractor = ContextExtractor::new();

        let window = extractor.entry_context(raw, "first", 5).unwrap();
        assert_eq!(window.records.len(), 2);
        assert!(window.records[0].selected && window.records[0].is_error);

        let wide = extractor.entry_context(raw, "second", usize::MAX).unwrap();
        assert_eq!(wide.records.len(), 2);
        assert!(wide.records[1].selected);

        assert!(extractor.entry_context(raw, "absent", 5).is_none());
        assert!(extractor.entry_context(raw, "", 5).is_none());
    }
}
