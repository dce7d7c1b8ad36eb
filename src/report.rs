//! Usage statistics over tool-usage CSV exports.
//!
//! Input rows carry `bug`, `command`, `count` and a tool column named either
//! `function_name` or `tool_name`. Only shell tool rows (`run_shell_command`,
//! `Bash`) are analysed.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CommandParser;
use crate::categorize::Categories;

/// Tool names whose rows hold shell commands.
pub const SHELL_TOOLS: &[&str] = &["run_shell_command", "Bash"];

/// Characters of a command kept in listings.
const PREVIEW_CHARS: usize = 100;

/// Example commands kept per category.
const EXAMPLES_PER_CATEGORY: usize = 5;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    bug: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    function_name: Option<String>,
    #[serde(default)]
    tool_name: Option<String>,
}

/// One shell command from the export, weighted by how often it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub bug: String,
    pub command: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyResult {
    pub bug: String,
    pub command: String,
}

/// A source command that contributed to a category, with its full sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryExample {
    pub bug: String,
    pub command: String,
    pub sequence: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageReport {
    pub total_commands: usize,
    pub with_results: usize,
    pub empty_results: usize,
    /// Canonical commands, weighted by row count, most frequent first.
    pub commands: Vec<Tally>,
    /// Categories of the canonical commands, weighted the same way.
    pub categories: Vec<Tally>,
    /// Up to five source commands per category, in input order.
    pub examples: BTreeMap<String, Vec<CategoryExample>>,
    pub empty: Vec<EmptyResult>,
}

/// Load shell commands from a CSV export on disk.
pub fn load_commands(path: &Path) -> Result<Vec<CommandRecord>, ReportError> {
    let file = std::fs::File::open(path).map_err(|e| ReportError::Csv {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    read_commands(file).map_err(|source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Read shell commands from CSV text. Rows for other tools and rows with an
/// empty command are skipped; a missing or blank count is 1.
pub fn read_commands<R: Read>(reader: R) -> Result<Vec<CommandRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let row: Row = row?;
        let tool = row
            .function_name
            .filter(|t| !t.is_empty())
            .or(row.tool_name)
            .unwrap_or_default();
        if !SHELL_TOOLS.contains(&tool.as_str()) {
            continue;
        }
        let command = row.command.unwrap_or_default().trim().to_string();
        if command.is_empty() {
            continue;
        }
        let count = match row.count.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("invalid count {raw:?}, using 1");
                1
            }),
        };
        records.push(CommandRecord {
            bug: row.bug.unwrap_or_else(|| "unknown".to_string()),
            command,
            count,
        });
    }
    Ok(records)
}

/// Parse every record and tally the results. Each occurrence of a canonical
/// command in a sequence adds the record's count.
pub fn analyze(
    parser: &CommandParser,
    categories: &Categories,
    records: &[CommandRecord],
) -> UsageReport {
    let mut report = UsageReport {
        total_commands: records.len(),
        ..Default::default()
    };
    let mut commands: HashMap<String, u64> = HashMap::new();
    let mut groups: HashMap<String, u64> = HashMap::new();

    for record in records {
        let sequence = parser.parse(&record.command, true);
        let preview: String = record.command.chars().take(PREVIEW_CHARS).collect();
        if sequence.is_empty() {
            report.empty_results += 1;
            report.empty.push(EmptyResult {
                bug: record.bug.clone(),
                command: preview,
            });
            continue;
        }
        report.with_results += 1;

        let mut seen: Vec<&str> = Vec::new();
        for canonical in &sequence {
            let category = categories.categorize(canonical);
            *groups.entry(category.to_string()).or_default() += record.count;
            *commands.entry(canonical.clone()).or_default() += record.count;

            if seen.contains(&category) {
                continue;
            }
            seen.push(category);
            let examples = report.examples.entry(category.to_string()).or_default();
            if examples.len() < EXAMPLES_PER_CATEGORY {
                examples.push(CategoryExample {
                    bug: record.bug.clone(),
                    command: preview.clone(),
                    sequence: sequence.clone(),
                });
            }
        }
    }

    report.commands = ranked(commands);
    report.categories = ranked(groups);
    report
}

/// Highest count first, ties by name.
fn ranked(counts: HashMap<String, u64>) -> Vec<Tally> {
    let mut tallies: Vec<Tally> = counts
        .into_iter()
        .map(|(name, count)| Tally { name, count })
        .collect();
    tallies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    tallies
}
