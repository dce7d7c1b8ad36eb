//! Semantic normalization: an extracted command's leading words to one
//! canonical identifier.

use std::collections::HashSet;

use crate::config::Commands;
use crate::parse::tokenize::base_name;

/// Known multi-word commands and subcommand-taking tools.
///
/// Immutable once built; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    phrases: HashSet<Vec<String>>,
    subcommand_tools: HashSet<String>,
    max_phrase_len: usize,
}

impl CommandTable {
    /// Build a table from whitespace-separated phrases and tool names.
    /// Phrases shorter than two words are ignored.
    pub fn new<P, T>(
        phrases: impl IntoIterator<Item = P>,
        subcommand_tools: impl IntoIterator<Item = T>,
    ) -> Self
    where
        P: AsRef<str>,
        T: Into<String>,
    {
        let phrases: HashSet<Vec<String>> = phrases
            .into_iter()
            .map(|p| p.as_ref().split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|words| words.len() >= 2)
            .collect();
        let max_phrase_len = phrases.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            phrases,
            subcommand_tools: subcommand_tools.into_iter().map(Into::into).collect(),
            max_phrase_len,
        }
    }

    pub fn from_config(commands: &Commands) -> Self {
        Self::new(&commands.phrases, commands.subcommand_tools.iter().cloned())
    }

    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let words: Vec<String> = phrase.split_whitespace().map(String::from).collect();
        self.phrases.contains(&words)
    }

    pub fn is_subcommand_tool(&self, name: &str) -> bool {
        self.subcommand_tools.contains(name)
    }

    /// Canonical identifier for one candidate word list.
    ///
    /// 1. The longest table phrase matching the leading words (first word
    ///    path-stripped), joined with single spaces.
    /// 2. A subcommand tool followed by a non-flag word: both words.
    /// 3. Otherwise the path-stripped first word.
    ///
    /// Matching is exact and case-sensitive. Returns `None` only for an
    /// empty list; a quoted empty first word (`'' ls`) yields `""`.
    pub fn canonicalize(&self, words: &[String]) -> Option<String> {
        let (first, rest) = words.split_first()?;
        let head = base_name(first);

        let limit = self.max_phrase_len.min(words.len());
        if limit >= 2 {
            let key: Vec<String> = std::iter::once(head.to_string())
                .chain(rest[..limit - 1].iter().cloned())
                .collect();
            for n in (2..=limit).rev() {
                if self.phrases.contains(&key[..n]) {
                    return Some(key[..n].join(" "));
                }
            }
        }

        if self.is_subcommand_tool(head)
            && let Some(sub) = rest.first()
            && !sub.is_empty()
            && !sub.starts_with('-')
        {
            return Some(format!("{head} {sub}"));
        }
        Some(head.to_string())
    }
}
