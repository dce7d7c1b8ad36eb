//! cmdseq: recover the ordered sequence of commands a shell invocation runs.
//!
//! A command string such as `cd src && mvn test 2>&1 | tee log` is lexed,
//! built into a syntax tree, and walked for every simple command reachable
//! through lists, pipelines and compound bodies. Each command's leading words
//! are normalized against a [`CommandTable`] of known multi-word commands,
//! giving `["cd", "mvn test", "tee"]`.
//!
//! Text inside command substitutions and here-documents is data, not a
//! command: `javac -cp "$(find . | head -1)" T.java` yields only `javac`.
//! Input the grammar rejects (an unterminated quote, a stray `fi`) goes to
//! a quote-unaware fallback splitter, so [`parse`] always returns a sequence.
//!
//! # Architecture
//!
//! - **[`parse`]**: Lexer, Grammar Builder, fallback splitter, tree types.
//! - **[`extract`]**: Command Extractor over the syntax tree.
//! - **[`normalize`]**: [`CommandTable`] and canonical identifiers.
//! - **[`sequence`]**: full and deduplicated output orderings.
//! - **[`categorize`]**: usage categories for reports.
//! - **[`config`]**: embedded defaults plus user overlay merge.
//! - **[`report`]**: usage statistics over tool-usage CSV exports.
//! - **[`logging`]**: stderr logger setup and the parse-record log.

/// Usage categories for canonical commands.
pub mod categorize;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Simple-command extraction from the syntax tree.
pub mod extract;
/// Logger initialisation and file-based parse records.
pub mod logging;
/// Canonical command identifiers.
pub mod normalize;
/// Shell lexing and grammar: token stream, syntax tree, fallback splitter.
pub mod parse;
/// Usage reports over CSV exports.
pub mod report;
/// Output ordering and deduplication.
pub mod sequence;

use std::sync::OnceLock;

use log::debug;

pub use normalize::CommandTable;
pub use parse::ParseError;

use config::{Config, DEFAULT_MAX_DEPTH};

/// A configured parser: command table plus nesting limit.
///
/// Immutable after construction and `Send + Sync`; one instance can serve
/// any number of threads.
#[derive(Debug, Clone)]
pub struct CommandParser {
    table: CommandTable,
    max_depth: usize,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::from_config(&Config::default_config())
    }
}

impl CommandParser {
    pub fn new(table: CommandTable) -> Self {
        Self {
            table,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(CommandTable::from_config(&config.commands))
            .with_max_depth(config.settings.max_depth)
    }

    /// Limit on nested compound commands and substitutions. Deeper input is
    /// handled by the fallback splitter.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parse through the grammar only, surfacing lexer and grammar errors.
    pub fn parse_strict(
        &self,
        command: &str,
        preserve_sequence: bool,
    ) -> Result<Vec<String>, ParseError> {
        if command.trim().is_empty() {
            return Ok(Vec::new());
        }
        let tree = parse::parse_tree(command, self.max_depth)?;
        Ok(self.finish(&extract::candidates(&tree), preserve_sequence))
    }

    /// Ordered canonical commands for `command`. Never fails: input the
    /// grammar rejects is split heuristically instead.
    pub fn parse(&self, command: &str, preserve_sequence: bool) -> Vec<String> {
        match self.parse_strict(command, preserve_sequence) {
            Ok(commands) => commands,
            Err(e) => {
                let preview: String = command.chars().take(50).collect();
                debug!("grammar parse failed for {preview:?}: {e}; using fallback");
                self.finish(&parse::fallback::candidates(command), preserve_sequence)
            }
        }
    }

    fn finish(&self, candidates: &[Vec<String>], preserve_sequence: bool) -> Vec<String> {
        let commands = candidates
            .iter()
            .filter_map(|words| self.table.canonicalize(words))
            .collect();
        sequence::sequence(commands, preserve_sequence)
    }
}

/// The parser built from the embedded default configuration.
pub fn default_parser() -> &'static CommandParser {
    static PARSER: OnceLock<CommandParser> = OnceLock::new();
    PARSER.get_or_init(CommandParser::default)
}

/// Parse with the default command table.
///
/// `preserve_sequence = true` keeps every occurrence; `false` keeps the
/// first occurrence of each command.
pub fn parse(command: &str, preserve_sequence: bool) -> Vec<String> {
    default_parser().parse(command, preserve_sequence)
}
