use crate::models::*;
use crate::parsers::LogParser;
use regex::Regex;

/// Parser for `2025-06-08 02:00:15,015 [ERROR ] (Module) - Message`
#[derive(Clone)]
pub struct ModuleLineParser {
    pattern: Regex,
}

impl ModuleLineParser {
    pub fn new() -> Self {
        Self {
            // Seconds precision with an optional comma plus exactly three fraction digits.
            // The message starts after the first '-' following the module.
            pattern: Regex::new(
                r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:,\d{3})?)\s*\[\s*(\w+)\s*\]\s*\((.*?)\)\s*-\s*(.*)$"
            ).unwrap(),
        }
    }
}

impl Default for ModuleLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser for ModuleLineParser {
    fn parse(&self, line: &str) -> Option<LogEntry> {
        let captures = self.pattern.captures(line.trim())?;
        Some(LogEntry::new(
            &captures[1],
            &captures[2],
            Some(&captures[3]),
            &captures[4],
        ))
    }

    fn can_parse(&self, line: &str) -> bool {
        self.pattern.is_match(line.trim())
    }

    fn grammar(&self) -> Grammar {
        Grammar::ModuleLine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_line_with_millis() {
        let parser = ModuleLineParser::new();
        let entry = parser.parse("2025-06-08 02:00:15,015 [ERROR ] (Core) - db failed").unwrap();
        assert_eq!(entry, LogEntry {
            timestamp: "2025-06-08 02:00:15,015".to_string(),
            level: "ERROR".to_string(),
            module: Some("Core".to_string()),
            message: "db failed".to_string(),
        });
    }

    #[test]
    fn test_module_line_without_millis_and_padded_level() {
        let parser = ModuleLineParser::new();
        let entry = parser.parse("  2025-06-08 02:00:15 [  warn  ] ( Cash Dispenser ) -   cassette 2 low  ").unwrap();
        assert_eq!(entry.timestamp, "2025-06-08 02:00:15");
        assert_eq!(entry.level, "WARN");
        assert_eq!(entry.module.as_deref(), Some("Cash Dispenser"));
        assert_eq!(entry.message, "cassette 2 low");
    }

    #[test]
    fn test_message_keeps_later_separators() {
        let parser = ModuleLineParser::new();
        let entry = parser
            .parse("2025-06-08 02:00:15 [ERROR] (Update) - update failed - rollback initiated")
            .unwrap();
        assert_eq!(entry.message, "update failed - rollback initiated");
    }

    #[test]
    fn test_empty_module_and_message() {
        let parser = ModuleLineParser::new();
        let entry = parser.parse("2025-06-08 02:00:15 [INFO] () -").unwrap();
        assert_eq!(entry.module.as_deref(), Some(""));
        assert_eq!(entry.message, "");
    }

    #[test]
    fn test_rejects_other_fraction_widths_and_shapes() {
        let parser = ModuleLineParser::new();
        assert!(parser.parse("2025-06-08 02:00:15,01 [ERROR] (Core) - x").is_none());
        assert!(parser.parse("2025-06-08 02:00:15.015 [ERROR] (Core) - x").is_none());
        assert!(parser.parse("2025-06-08 02:00:15 [ERROR] Core - x").is_none());
        assert!(parser.parse("2025-06-08 02:00:15 [ERROR] (Core) x").is_none());
        assert!(parser.parse("2025-06-08 02:00:15 [BAD LEVEL] (Core) - x").is_none());
        assert!(!parser.can_parse("[08/06] ERROR: disk full"));
    }
}
