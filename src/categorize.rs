//! Grouping of canonical commands into usage categories.

use std::collections::{BTreeMap, HashMap};

/// Category reported for commands no configured category claims.
pub const UNCATEGORIZED: &str = "other";

#[derive(Debug, Clone, Default)]
pub struct Categories {
    by_command: HashMap<String, String>,
}

impl Categories {
    /// Invert a category -> commands map. When a command is listed under
    /// several categories the alphabetically first category wins.
    pub fn from_config(categories: &BTreeMap<String, Vec<String>>) -> Self {
        let mut by_command = HashMap::new();
        for (category, commands) in categories {
            for command in commands {
                by_command
                    .entry(command.clone())
                    .or_insert_with(|| category.clone());
            }
        }
        Self { by_command }
    }

    /// Category of a canonical command: exact match, then its first word.
    pub fn categorize(&self, canonical: &str) -> &str {
        if let Some(category) = self.by_command.get(canonical) {
            return category;
        }
        canonical
            .split_once(' ')
            .and_then(|(head, _)| self.by_command.get(head))
            .map_or(UNCATEGORIZED, String::as_str)
    }
}
