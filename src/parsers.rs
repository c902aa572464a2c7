use crate::models::*;

/// Common interface for the line grammars
pub trait LogParser: Send + Sync {
    /// Parse one line into a fully populated entry, or `None` when the grammar does not match
    fn parse(&self, line: &str) -> Option<LogEntry>;
    fn can_parse(&self, line: &str) -> bool;
    fn grammar(&self) -> Grammar;
}

pub mod colon_line_parser;
pub mod module_line_parser;

pub use colon_line_parser::ColonLineParser;
pub use module_line_parser::ModuleLineParser;

/// Tries the module-line grammar, then the colon-line grammar. First match wins.
#[derive(Clone, Default)]
pub struct LineParser {
    module_line: ModuleLineParser,
    colon_line: ColonLineParser,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&self, line: &str) -> Option<LogEntry> {
        self.parse_with_grammar(line).map(|(_, entry)| entry)
    }

    /// Like [`parse`](Self::parse), also reporting which grammar matched
    pub fn parse_with_grammar(&self, line: &str) -> Option<(Grammar, LogEntry)> {
        let parsers: [&dyn LogParser; 2] = [&self.module_line, &self.colon_line];
        parsers
            .iter()
            .find_map(|parser| parser.parse(line).map(|entry| (parser.grammar(), entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_module_line_wins_over_colon_line() {
        let parser = LineParser::new();
        let (grammar, entry) = parser
            .parse_with_grammar("2025-06-08 02:00:15,015 [ERROR ] (Core) - db failed")
            .unwrap();
        assert_eq!(grammar, Grammar::ModuleLine);
        assert_eq!(entry.timestamp, "2025-06-08 02:00:15,015");
        assert_eq!(entry.level, "ERROR");
        assert_eq!(entry.module.as_deref(), Some("Core"));
        assert_eq!(entry.message, "db failed");
    }

    #[test]
    fn test_colon_line_fallback() {
        let parser = LineParser::new();
        let (grammar, entry) = parser.parse_with_grammar("[08/06] ERROR: disk full").unwrap();
        assert_eq!(grammar, Grammar::ColonLine);
        assert_eq!(entry.timestamp, "08/06");
        assert_eq!(entry.level, "ERROR");
        assert_eq!(entry.module, None);
        assert_eq!(entry.message, "disk full");
    }

    #[test]
    fn test_unmatched_lines_are_dropped() {
        let parser = LineParser::new();
        assert!(parser.parse("").is_none());
        assert!(parser.parse("   ").is_none());
        assert!(parser.parse("\tat com.example.Service.run(Service.java:42)").is_none());
        assert!(parser.parse("Caused by: java.io.IOException").is_none());
        assert!(parser.parse("2025-06-08 02:00:15 ERROR missing brackets").is_none());
    }

    #[quickcheck]
    fn prop_parse_is_deterministic(line: String) -> bool {
        let parser = LineParser::new();
        parser.parse(&line) == parser.parse(&line)
    }

    #[quickcheck]
    fn prop_lines_without_known_prefix_never_match(line: String) -> TestResult {
        let trimmed = line.trim();
        if trimmed.starts_with('[') || trimmed.starts_with(char::is_numeric) {
            return TestResult::discard();
        }
        TestResult::from_bool(LineParser::new().parse(&line).is_none())
    }

    #[quickcheck]
    fn prop_module_line_fields_round_trip(level: String, module: String, message: String) -> TestResult {
        let level: String = level.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        let module: String = module.chars().filter(|c| c.is_ascii_alphanumeric() || *c == ' ').collect();
        let message: String = message.chars().filter(|c| !c.is_control()).collect();
        if level.is_empty() {
            return TestResult::discard();
        }

        let line = format!("2025-06-08 02:00:15 [ {} ] ( {} ) - {} ", level, module, message);
        match LineParser::new().parse(&line) {
            Some(entry) => TestResult::from_bool(
                entry.level == level.to_uppercase()
                    && entry.module.as_deref() == Some(module.trim())
                    && entry.message == message.trim(),
            ),
            None => TestResult::failed(),
        }
    }
}
