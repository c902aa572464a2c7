use crate::models::*;
use crate::parsers::LogParser;
use regex::Regex;

/// Parser for `[anything] LEVEL: message`. The bracketed timestamp is not validated.
#[derive(Clone)]
pub struct ColonLineParser {
    pattern: Regex,
}

impl ColonLineParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^\[(.*?)\]\s+(\w+):\s+(.*)$").unwrap(),
        }
    }
}

impl Default for ColonLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser for ColonLineParser {
    fn parse(&self, line: &str) -> Option<LogEntry> {
        let captures = self.pattern.captures(line.trim())?;
        Some(LogEntry::new(&captures[1], &captures[2], None, &captures[3]))
    }

    fn can_parse(&self, line: &str) -> bool {
        self.pattern.is_match(line.trim())
    }

    fn grammar(&self) -> Grammar {
        Grammar::ColonLine
    }
}
