use crate::models::LogEntry;

/// Levels for which a solution is looked up
pub const ACTIONABLE_LEVELS: [&str; 3] = ["ERROR", "WARN", "DEBUG"];

/// Levels displayed as warnings
pub const WARNING_LEVELS: [&str; 2] = ["WARN", "WARNING"];

/// Whether resolution should be attempted for this entry
pub fn is_actionable(entry: &LogEntry) -> bool {
    ACTIONABLE_LEVELS.contains(&entry.level.as_str())
}

pub fn is_warning(entry: &LogEntry) -> bool {
    WARNING_LEVELS.contains(&entry.level.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: &str) -> LogEntry {
        LogEntry::new("2025-06-08 02:00:15", level, None, "message")
    }

    #[test]
    fn test_actionable_levels() {
        assert!(is_actionable(&entry("ERROR")));
        assert!(is_actionable(&entry("WARN")));
        assert!(is_actionable(&entry("DEBUG")));
        assert!(!is_actionable(&entry("INFO")));
        assert!(!is_actionable(&entry("WARNING")));
        assert!(!is_actionable(&entry("FATAL")));
    }

    #[test]
    fn test_warning_levels() {
        assert!(is_warning(&entry("WARN")));
        assert!(is_warning(&entry("WARNING")));
        assert!(!is_warning(&entry("ERROR")));
    }

    #[test]
    fn test_predicates_ignore_message() {
        let mut e = entry("INFO");
        e.message = "ERROR WARN DEBUG".to_string();
        assert!(!is_actionable(&e));
        assert!(!is_warning(&e));
    }

    #[test]
    fn test_level_is_normalized_by_constructor() {
        assert!(is_actionable(&entry("error")));
    }
}
