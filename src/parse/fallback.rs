//! Degraded splitter used when the lexer or grammar rejects the input.
//!
//! Quoting is ignored while splitting, so an operator inside an unterminated
//! quote still splits. Every input yields some (possibly empty) list of
//! candidate word lists.

use super::lexer::RESERVED_WORDS;
use super::tokenize::{split_words, strip_assignments};

/// Leading-word candidates, one per operator-separated segment.
pub fn candidates(command: &str) -> Vec<Vec<String>> {
    let text = strip_heredocs(command).replace("\\\n", "");
    split_segments(&text)
        .iter()
        .filter_map(|segment| leading_words(segment))
        .collect()
}

/// Split at `&&`, `||`, `|&`, `|`, `;`, newlines and a standalone `&`.
/// `&` that is part of a redirect (`2>&1`, `&>`) does not split.
fn split_segments(command: &str) -> Vec<String> {
    let chars: Vec<char> = command.chars().collect();
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let width = match (c, next) {
            ('&', Some('&')) | ('|', Some('|')) | ('|', Some('&')) => 2,
            ('|' | ';' | '\n', _) => 1,
            ('&', _) if !matches!(prev, Some('<' | '>')) && next != Some('>') => 1,
            _ => 0,
        };
        if width == 0 {
            buf.push(c);
            i += 1;
            continue;
        }
        parts.push(std::mem::take(&mut buf));
        i += width;
    }
    parts.push(buf);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn is_structural(word: &str) -> bool {
    RESERVED_WORDS.contains(&word) || word.chars().all(|c| matches!(c, '(' | ')' | '{' | '}'))
}

/// Words of one segment with assignments, keywords and grouping punctuation
/// removed from the front.
fn leading_words(segment: &str) -> Option<Vec<String>> {
    let words = split_words(segment);
    let mut rest = words.as_slice();
    loop {
        let stripped = strip_assignments(rest);
        let skip = stripped.iter().take_while(|w| is_structural(w)).count();
        rest = &stripped[skip..];
        if skip == 0 {
            break;
        }
    }

    let (head, tail) = rest.split_first()?;
    let head = trim_closers(head.trim_start_matches(['(', '{']));
    if head.is_empty() {
        return None;
    }
    Some(
        std::iter::once(head.to_string())
            .chain(tail.iter().map(|w| trim_closers(w).to_string()))
            .collect(),
    )
}

/// Strip trailing `)` and `}` that close a group opened in another segment,
/// as in `ls)` from `(make && ls)`. Balanced text such as `$(date)` is kept.
fn trim_closers(word: &str) -> &str {
    let mut word = word;
    loop {
        let (open, close) = match word.chars().last() {
            Some(')') => ('(', ')'),
            Some('}') => ('{', '}'),
            _ => return word,
        };
        if word.matches(close).count() <= word.matches(open).count() {
            return word;
        }
        word = &word[..word.len() - 1];
    }
}

/// Remove here-documents: from the `<<` marker through its closing
/// delimiter line. An unterminated here-document removes everything from the
/// marker to the end of input.
fn strip_heredocs(command: &str) -> String {
    let mut result = command.to_string();
    let mut from = 0;
    while let Some((start, delimiter)) = find_heredoc(&result, from) {
        match closing_end(&result, start, &delimiter) {
            Some(end) => {
                result.replace_range(start..end, "");
                from = start;
            }
            None => {
                result.truncate(start);
                break;
            }
        }
    }
    result
}

/// Byte offset of the next `<<[-]DELIM` marker at or after `from`, with its
/// delimiter. Here-strings (`<<<`) are skipped.
fn find_heredoc(text: &str, from: usize) -> Option<(usize, String)> {
    let bytes = text.as_bytes();
    let mut i = from;
    while let Some(found) = text[i..].find("<<") {
        let start = i + found;
        let mut j = start + 2;
        i = j;
        if bytes.get(j) == Some(&b'<') {
            i = j + 1;
            continue;
        }
        if bytes.get(j) == Some(&b'-') {
            j += 1;
        }
        while bytes.get(j).is_some_and(|b| *b == b' ' || *b == b'\t') {
            j += 1;
        }
        let quote = bytes.get(j).copied().filter(|b| *b == b'\'' || *b == b'"');
        if quote.is_some() {
            j += 1;
        }
        let name_start = j;
        while bytes
            .get(j)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            j += 1;
        }
        if j == name_start {
            continue;
        }
        if let Some(q) = quote
            && bytes.get(j) != Some(&q)
        {
            continue;
        }
        return Some((start, text[name_start..j].to_string()));
    }
    None
}

/// Offset just past the closing delimiter line's text (its newline is kept).
fn closing_end(text: &str, start: usize, delimiter: &str) -> Option<usize> {
    let body_start = start + text[start..].find('\n')? + 1;
    let mut pos = body_start;
    for line in text[body_start..].split_inclusive('\n') {
        let end = pos + line.len();
        let content = line.trim_end_matches(['\n', '\r']).trim_start_matches('\t');
        if content == delimiter {
            return Some(end - usize::from(line.ends_with('\n')));
        }
        pos = end;
    }
    None
}
