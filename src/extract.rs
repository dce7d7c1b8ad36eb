//! Command extraction: the leading words of every simple command reachable
//! through lists, pipelines and compound bodies, in source order.
//!
//! Word expansions, here-document bodies and case patterns are never
//! entered, so nothing inside `$(...)` or a heredoc reaches the output.

use log::trace;

use crate::parse::types::{Command, CompoundCommand, List, SimpleCommand};

/// One word list per simple command, assignments already excluded.
pub fn candidates(list: &List) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    walk_list(list, &mut out);
    out
}

fn walk_list(list: &List, out: &mut Vec<Vec<String>>) {
    for entry in &list.entries {
        for pipeline in entry.chain.pipelines() {
            for stage in &pipeline.stages {
                walk_command(stage, out);
            }
        }
    }
}

fn walk_command(command: &Command, out: &mut Vec<Vec<String>>) {
    match command {
        Command::Simple(simple) => push_simple(simple, out),
        // Redirections on a compound command never hold commands.
        Command::Compound(compound, _) => walk_compound(compound, out),
    }
}

fn walk_compound(compound: &CompoundCommand, out: &mut Vec<Vec<String>>) {
    match compound {
        CompoundCommand::If {
            branches,
            else_body,
        } => {
            for (condition, body) in branches {
                walk_list(condition, out);
                walk_list(body, out);
            }
            if let Some(body) = else_body {
                walk_list(body, out);
            }
        }
        CompoundCommand::While { condition, body } | CompoundCommand::Until { condition, body } => {
            walk_list(condition, out);
            walk_list(body, out);
        }
        CompoundCommand::For { body, .. } => walk_list(body, out),
        CompoundCommand::Case { arms, .. } => {
            for arm in arms {
                walk_list(&arm.body, out);
            }
        }
        CompoundCommand::Subshell(body) | CompoundCommand::Group(body) => walk_list(body, out),
        CompoundCommand::Function { body, .. } => walk_command(body, out),
        CompoundCommand::Arithmetic(_) => {}
    }
}

fn push_simple(simple: &SimpleCommand, out: &mut Vec<Vec<String>>) {
    if simple.words.is_empty() {
        return;
    }
    let words: Vec<String> = simple.words.iter().map(|w| w.text.clone()).collect();
    trace!("candidate: {words:?}");
    out.push(words);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_tree;

    fn heads(input: &str) -> Vec<String> {
        candidates(&parse_tree(input, 32).unwrap())
            .into_iter()
            .map(|words| words[0].clone())
            .collect()
    }

    #[test]
    fn list_and_pipeline_order() {
        assert_eq!(heads("a | b && c; d & e || f"), vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn full_word_list_kept() {
        let list = parse_tree("FOO=1 mvn -q test > log 2>&1", 32).unwrap();
        assert_eq!(candidates(&list), vec![vec!["mvn", "-q", "test"]]);
    }

    #[test]
    fn assignment_only_contributes_nothing() {
        assert!(heads("VAR=1").is_empty());
        assert_eq!(heads("A=1; B=$(pwd) ls"), vec!["ls"]);
    }

    #[test]
    fn substitutions_not_entered() {
        assert_eq!(heads("echo $(find . | head -1) `date` <(sort x)"), vec!["echo"]);
        assert_eq!(heads("X=$(git rev-parse HEAD) && make"), vec!["make"]);
    }

    #[test]
    fn heredoc_not_entered() {
        assert_eq!(heads("cat <<EOF | sh\nrm -rf x; reboot\nEOF\nls"), vec!["cat", "sh", "ls"]);
    }

    #[test]
    fn if_branches_in_source_order() {
        assert_eq!(
            heads("if test -f a; then make; elif b; then c; else d; fi; e"),
            vec!["test", "make", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn loop_bodies() {
        assert_eq!(
            heads("for f in $(ls); do javac $f; done; while read x; do echo; done < in"),
            vec!["javac", "read", "echo"]
        );
        assert_eq!(heads("until curl -s x; do sleep 1; done"), vec!["curl", "sleep"]);
    }

    #[test]
    fn case_arms_but_not_patterns() {
        assert_eq!(heads("case $x in build) make;; rm) ls;; esac"), vec!["make", "ls"]);
    }

    #[test]
    fn subshell_group_function() {
        assert_eq!(
            heads("(cd a && make); { pwd; }; f() { git status; }"),
            vec!["cd", "make", "pwd", "git"]
        );
    }

    #[test]
    fn arithmetic_command_yields_nothing() {
        assert_eq!(heads("(( i++ )); ls"), vec!["ls"]);
    }

    #[test]
    fn conditional_command_is_simple() {
        assert_eq!(heads("[[ -f a && -f b ]] && echo ok"), vec!["[[", "echo"]);
    }

    #[test]
    fn negation_not_a_word() {
        assert_eq!(heads("! grep -q x f"), vec!["grep"]);
    }
}
