//! Word-level helpers shared by the grammar path and the fallback path.

/// A valid shell variable name: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && s
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// `KEY=value` (or `KEY+=value`) with a valid name before the `=`.
pub fn is_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => is_name(name.strip_suffix('+').unwrap_or(name)),
        None => false,
    }
}

/// Drop leading `KEY=value` words, returning the rest.
pub fn strip_assignments(words: &[String]) -> &[String] {
    let skip = words.iter().take_while(|w| is_assignment(w)).count();
    &words[skip..]
}

/// Extract basename: /usr/bin/ls → ls, ./script.sh → script.sh
pub fn base_name(word: &str) -> &str {
    match word.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => name,
        _ => word,
    }
}

/// Tokenize a command segment into words using shlex (POSIX word splitting).
pub fn split_words(command: &str) -> Vec<String> {
    shlex::split(command).unwrap_or_else(|| {
        // Fallback: simple whitespace splitting if shlex can't parse
        command.split_whitespace().map(String::from).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &[&str]) -> Vec<String> {
        s.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn names() {
        assert!(is_name("FOO"));
        assert!(is_name("_x1"));
        assert!(!is_name("1x"));
        assert!(!is_name(""));
        assert!(!is_name("a-b"));
    }

    #[test]
    fn assignments() {
        assert!(is_assignment("FOO=bar"));
        assert!(is_assignment("FOO="));
        assert!(is_assignment("PATH+=:/opt"));
        assert!(!is_assignment("--flag=x"));
        assert!(!is_assignment("a.b=c"));
        assert!(!is_assignment("ls"));
    }

    #[test]
    fn strip_leading_assignments() {
        let w = words(&["A=1", "B=2", "cmd", "C=3"]);
        assert_eq!(strip_assignments(&w), &w[2..]);
    }

    #[test]
    fn strip_only_assignments() {
        let w = words(&["A=1"]);
        assert!(strip_assignments(&w).is_empty());
    }

    #[test]
    fn base_name_absolute_path() {
        assert_eq!(base_name("/usr/bin/java"), "java");
    }

    #[test]
    fn base_name_relative_path() {
        assert_eq!(base_name("./run_tests.sh"), "run_tests.sh");
    }

    #[test]
    fn base_name_tilde_path() {
        assert_eq!(base_name("~/dev/tool/target/release/tool"), "tool");
    }

    #[test]
    fn base_name_trailing_slash_kept() {
        assert_eq!(base_name("dir/"), "dir/");
    }

    #[test]
    fn base_name_plain() {
        assert_eq!(base_name("ls"), "ls");
    }

    #[test]
    fn split_words_quoted() {
        assert_eq!(split_words("echo 'hello world'"), vec!["echo", "hello world"]);
    }

    #[test]
    fn split_words_unbalanced_falls_back_to_whitespace() {
        assert_eq!(split_words("echo 'oops x"), vec!["echo", "'oops", "x"]);
    }
}
