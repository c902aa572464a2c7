use crate::models::AnnotatedEntry;
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Selection criteria over annotated entries. Unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    files: Option<HashSet<String>>,
    levels: Option<HashSet<String>>,
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
    keyword: Option<String>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    /// Levels are compared uppercased
    pub fn with_levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.levels = Some(levels.into_iter().map(|l| l.as_ref().trim().to_uppercase()).collect());
        self
    }

    /// Inclusive time range over normalized timestamps
    pub fn with_time_range(mut self, since: Option<NaiveDateTime>, until: Option<NaiveDateTime>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    /// Case-insensitive match in the message or the solution text
    pub fn with_keyword(mut self, keyword: &str) -> Self {
        let keyword = keyword.trim().to_lowercase();
        self.keyword = if keyword.is_empty() { None } else { Some(keyword) };
        self
    }

    pub fn matches(&self, annotated: &AnnotatedEntry) -> bool {
        if let Some(files) = &self.files {
            if !files.contains(&annotated.filename) {
                return false;
            }
        }

        if let Some(levels) = &self.levels {
            if !levels.contains(&annotated.entry.level) {
                return false;
            }
        }

        if self.since.is_some() || self.until.is_some() {
            let instant = annotated.entry.instant();
            if self.since.is_some_and(|since| instant < since) || self.until.is_some_and(|until| instant > until) {
                return false;
            }
        }

        if let Some(keyword) = &self.keyword {
            let in_message = annotated.entry.message.to_lowercase().contains(keyword);
            let in_solution = annotated.solution_text().to_lowercase().contains(keyword);
            if !in_message && !in_solution {
                return false;
            }
        }

        true
    }

    pub fn apply<'a>(&self, entries: &'a [AnnotatedEntry]) -> Vec<&'a AnnotatedEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Compare names treating digit runs as numbers and text case-insensitively,
/// so "atm2.log" sorts before "atm10.log".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = natural_key(a);
    let right = natural_key(b);
    left.cmp(&right).then_with(|| a.cmp(b))
}

pub fn natural_sort(names: &mut [String]) {
    names.sort_by(|a, b| natural_cmp(a, b));
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    // Numbers sort before text at the same position
    Number(u128, usize),
    Text(String),
}

fn natural_key(s: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&c) = chars.peek() {
        let digits = c.is_ascii_digit();
        let mut run = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_digit() != digits {
                break;
            }
            run.push(next);
            chars.next();
        }

        if digits {
            let trimmed = run.trim_start_matches('0');
            match trimmed.parse::<u128>() {
                Ok(value) => chunks.push(Chunk::Number(value, run.len())),
                Err(_) if trimmed.is_empty() => chunks.push(Chunk::Number(0, run.len())),
                Err(_) => chunks.push(Chunk::Text(run)),
            }
        } else {
            chunks.push(Chunk::Text(run.to_lowercase()));
        }
    }

    chunks
}
