use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse failure category assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Network,
    Database,
    Timeout,
    Authentication,
    File,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Network,
        Category::Database,
        Category::Timeout,
        Category::Authentication,
        Category::File,
    ];

    /// Case-insensitive label lookup; unknown labels have no category
    pub fn from_label(label: &str) -> Option<Category> {
        match label.trim().to_lowercase().as_str() {
            "network" => Some(Category::Network),
            "database" => Some(Category::Database),
            "timeout" => Some(Category::Timeout),
            "authentication" => Some(Category::Authentication),
            "file" => Some(Category::File),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Network => "network",
            Category::Database => "database",
            Category::Timeout => "timeout",
            Category::Authentication => "authentication",
            Category::File => "file",
        }
    }

    /// Generic remediation sentence for this category
    pub fn fix(&self) -> &'static str {
        match self {
            Category::Network => "Check VPN, firewall, and DNS settings.",
            Category::Database => "Check DB credentials and host reachability.",
            Category::Timeout => "Increase timeout or investigate server delay.",
            Category::Authentication => "Verify user credentials and session configs.",
            Category::File => "Ensure the file exists and has proper permissions.",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fix text for a raw category label, if the label is in the table
pub fn fix_for_label(label: &str) -> Option<&'static str> {
    Category::from_label(label).map(|c| c.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_fix() {
        for category in Category::ALL {
            assert!(!category.fix().is_empty());
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
    }

    #[test]
    fn test_label_lookup_is_case_insensitive() {
        assert_eq!(fix_for_label(" Network "), Some("Check VPN, firewall, and DNS settings."));
        assert_eq!(Category::from_label("FILE"), Some(Category::File));
    }

    #[test]
    fn test_unknown_label_has_no_fix() {
        assert_eq!(fix_for_label("hardware"), None);
        assert_eq!(fix_for_label(""), None);
    }
}
