use std::collections::HashSet;

/// Final ordering of canonical commands.
///
/// With `preserve_sequence` every occurrence is kept; otherwise only the
/// first occurrence of each distinct command, in order.
pub fn sequence(commands: Vec<String>, preserve_sequence: bool) -> Vec<String> {
    if preserve_sequence {
        commands
    } else {
        dedup(commands)
    }
}

/// Order-preserving deduplication.
pub fn dedup(commands: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    commands
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}
