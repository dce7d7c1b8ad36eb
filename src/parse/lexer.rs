//! Lexer: raw command text to a token stream.
//!
//! Handles single/double quoting, backslash escapes, line continuations,
//! comments, and here-documents. Substitutions (`$(...)`, backticks,
//! `<(...)`) are lexed recursively so their closing delimiter is found
//! correctly; their tokens ride along on the enclosing word and never
//! appear in the outer stream.

use std::collections::VecDeque;

use thiserror::Error;

use super::tokenize::is_name;
use super::types::{Operator, Quoting, RawPart, RedirectOp, Token, TokenKind};

/// Words that open or close compound-command structure.
pub const RESERVED_WORDS: &[&str] = &[
    "if", "then", "else", "elif", "fi", "do", "done", "for", "while", "until", "case", "esac",
    "function", "in", "{", "}", "!",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated {quote} quote starting at offset {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
    #[error("unterminated substitution starting at offset {offset}")]
    UnterminatedSubstitution { offset: usize },
    #[error("unbalanced parenthesis starting at offset {offset}")]
    UnbalancedParen { offset: usize },
    #[error("unterminated here-document (expected closing `{delimiter}`)")]
    UnterminatedHereDoc { delimiter: String },
    #[error("unterminated `[[` starting at offset {offset}")]
    UnterminatedConditional { offset: usize },
    #[error("substitutions nested deeper than {limit}")]
    NestingTooDeep { limit: usize },
}

/// Tokens plus the here-document bodies, in the order their `<<` appeared.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub heredocs: Vec<String>,
}

/// Tokenize a complete command string.
pub fn tokenize(input: &str, max_depth: usize) -> Result<TokenStream, LexError> {
    let chars: Vec<char> = input.chars().collect();
    let (stream, _) = Lexer::new(&chars, 0, 0, max_depth, Mode::TopLevel).run()?;
    Ok(stream)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    TopLevel,
    /// Inside `$(` or `<(`: stop at the first unbalanced `)`.
    Substitution,
}

/// Whether a character was produced outside quotes or inside double quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Unquoted,
    Double,
}

#[derive(Debug)]
struct PendingHereDoc {
    delimiter: String,
    strip_tabs: bool,
}

/// Accumulates one word's text, parts and quoting.
#[derive(Debug, Default)]
struct WordBuilder {
    text: String,
    parts: Vec<RawPart>,
    literal: String,
    unquoted: bool,
    single: bool,
    double: bool,
    escaped: bool,
    consumed: bool,
    /// Byte length of the leading plain (unquoted, unexpanded) text, once it ends.
    plain_prefix: Option<usize>,
}

impl WordBuilder {
    fn end_plain(&mut self) {
        if self.plain_prefix.is_none() {
            self.plain_prefix = Some(self.text.len());
        }
    }

    fn push_char(&mut self, c: char, ctx: Ctx) {
        match ctx {
            Ctx::Unquoted => self.unquoted = true,
            Ctx::Double => {
                self.end_plain();
                self.double = true;
            }
        }
        self.consumed = true;
        self.text.push(c);
        self.literal.push(c);
    }

    fn push_single(&mut self, s: &str) {
        self.end_plain();
        self.single = true;
        self.consumed = true;
        self.text.push_str(s);
        self.literal.push_str(s);
    }

    fn push_escaped(&mut self, c: char) {
        self.end_plain();
        self.escaped = true;
        self.consumed = true;
        self.text.push(c);
        self.literal.push(c);
    }

    fn open_double(&mut self) {
        self.end_plain();
        self.double = true;
        self.consumed = true;
    }

    fn push_part(&mut self, part: RawPart, source: &str, ctx: Ctx) {
        self.end_plain();
        match ctx {
            Ctx::Unquoted => self.unquoted = true,
            Ctx::Double => self.double = true,
        }
        self.consumed = true;
        self.flush_literal();
        self.text.push_str(source);
        self.parts.push(part);
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.parts.push(RawPart::Literal(std::mem::take(&mut self.literal)));
        }
    }

    /// Plain `NAME=` so far, i.e. an array literal may follow.
    fn is_assignment_prefix(&self) -> bool {
        self.plain_prefix.is_none()
            && self
                .text
                .strip_suffix('=')
                .is_some_and(|name| is_name(name.strip_suffix('+').unwrap_or(name)))
    }

    fn finish(mut self, offset: usize) -> Token {
        self.flush_literal();
        let quoting = match (self.unquoted, self.single, self.double, self.escaped) {
            (_, false, false, false) => Quoting::Unquoted,
            (false, true, false, false) => Quoting::Single,
            (false, false, true, false) => Quoting::Double,
            _ => Quoting::Mixed,
        };
        let plain_len = self.plain_prefix.unwrap_or(self.text.len());
        let is_assignment = self.text.find('=').is_some_and(|eq| {
            let name = &self.text[..eq];
            eq < plain_len && is_name(name.strip_suffix('+').unwrap_or(name))
        });
        Token {
            kind: if is_assignment {
                TokenKind::Assignment
            } else {
                TokenKind::Word
            },
            text: self.text,
            quoting,
            parts: self.parts,
            fd: None,
            offset,
        }
    }
}

struct Lexer<'a> {
    chars: &'a [char],
    pos: usize,
    origin: usize,
    depth: usize,
    max_depth: usize,
    mode: Mode,
    tokens: Vec<Token>,
    heredocs: Vec<String>,
    pending: VecDeque<PendingHereDoc>,
    paren_depth: usize,
    case_depth: usize,
    /// Offset of the open `[[`, while inside one.
    conditional: Option<usize>,
}

impl<'a> Lexer<'a> {
    fn new(chars: &'a [char], pos: usize, depth: usize, max_depth: usize, mode: Mode) -> Self {
        Self {
            chars,
            pos,
            origin: pos,
            depth,
            max_depth,
            mode,
            tokens: Vec::new(),
            heredocs: Vec::new(),
            pending: VecDeque::new(),
            paren_depth: 0,
            case_depth: 0,
            conditional: None,
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    /// Lex until end of input (top level) or the closing `)` (substitution).
    /// Returns the stream and the position just past the last consumed char.
    fn run(mut self) -> Result<(TokenStream, usize), LexError> {
        loop {
            self.skip_blanks();
            let Some(c) = self.peek(0) else {
                break;
            };
            match c {
                '\n' | ';' if self.conditional.is_some() => {
                    return Err(self.unterminated_conditional());
                }
                '\n' => {
                    self.push(Token::operator(Operator::Newline, self.pos));
                    self.pos += 1;
                    self.read_heredoc_bodies()?;
                }
                '#' => self.skip_comment(),
                ')' if self.mode == Mode::Substitution
                    && self.paren_depth == 0
                    && self.case_depth == 0
                    && self.conditional.is_none() =>
                {
                    self.pos += 1;
                    if let Some(heredoc) = self.pending.pop_front() {
                        return Err(LexError::UnterminatedHereDoc {
                            delimiter: heredoc.delimiter,
                        });
                    }
                    let end = self.pos;
                    return Ok((self.into_stream(), end));
                }
                '&' | '|' | '<' | '>' | '(' | ')' if self.conditional.is_some() => {
                    self.lex_conditional_operator()
                }
                '<' | '>' if self.peek(1) == Some('(') => self.lex_word()?,
                '&' | '|' | ';' | '(' | ')' | '<' | '>' => self.lex_operator()?,
                c if c.is_ascii_digit() && self.fd_redirect_ahead() => self.lex_fd_redirect()?,
                _ => self.lex_word()?,
            }
        }

        if self.conditional.is_some() {
            return Err(self.unterminated_conditional());
        }
        if let Some(heredoc) = self.pending.pop_front() {
            return Err(LexError::UnterminatedHereDoc {
                delimiter: heredoc.delimiter,
            });
        }
        if self.mode == Mode::Substitution {
            return Err(LexError::UnterminatedSubstitution {
                offset: self.origin.saturating_sub(2),
            });
        }
        let end = self.pos;
        Ok((self.into_stream(), end))
    }

    fn unterminated_conditional(&self) -> LexError {
        LexError::UnterminatedConditional {
            offset: self.conditional.unwrap_or(self.pos),
        }
    }

    fn into_stream(self) -> TokenStream {
        TokenStream {
            tokens: self.tokens,
            heredocs: self.heredocs,
        }
    }

    fn push(&mut self, token: Token) {
        let command_start = self.at_command_start();
        match token.kind {
            TokenKind::Operator(Operator::LParen) => self.paren_depth += 1,
            TokenKind::Operator(Operator::RParen) => {
                self.paren_depth = self.paren_depth.saturating_sub(1)
            }
            TokenKind::Word if token.quoting == Quoting::Unquoted => match token.text.as_str() {
                "case" if command_start => self.case_depth += 1,
                "esac" if command_start => self.case_depth = self.case_depth.saturating_sub(1),
                "[[" if command_start => self.conditional = Some(token.offset),
                "]]" => self.conditional = None,
                _ => {}
            },
            _ => {}
        }
        self.tokens.push(token);
    }

    /// The next word would be in command position.
    fn at_command_start(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(t) => match t.kind {
                TokenKind::Operator(_) => true,
                TokenKind::Word => {
                    t.quoting == Quoting::Unquoted && RESERVED_WORDS.contains(&t.text.as_str())
                }
                _ => false,
            },
        }
    }

    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek(0) {
            match c {
                ' ' | '\t' | '\r' => self.pos += 1,
                '\\' if self.peek(1) == Some('\n') => self.pos += 2,
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn nesting_check(&self) -> Result<(), LexError> {
        if self.depth + 1 > self.max_depth {
            return Err(LexError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    // ── Operators and redirections ──

    fn lex_operator(&mut self) -> Result<(), LexError> {
        let offset = self.pos;
        let (n1, n2) = (self.peek(1), self.peek(2));
        let (token, len) = match self.chars[self.pos] {
            '&' => match (n1, n2) {
                (Some('&'), _) => (Token::operator(Operator::And, offset), 2),
                (Some('>'), Some('>')) => (Token::redirect(RedirectOp::AppendAll, None, offset), 3),
                (Some('>'), _) => (Token::redirect(RedirectOp::OutputAll, None, offset), 2),
                _ => (Token::operator(Operator::Amp, offset), 1),
            },
            '|' => match n1 {
                Some('|') => (Token::operator(Operator::Or, offset), 2),
                Some('&') => (Token::operator(Operator::PipeErr, offset), 2),
                _ => (Token::operator(Operator::Pipe, offset), 1),
            },
            ';' => match (n1, n2) {
                (Some(';'), Some('&')) => (Token::operator(Operator::DSemiAmp, offset), 3),
                (Some(';'), _) => (Token::operator(Operator::DSemi, offset), 2),
                (Some('&'), _) => (Token::operator(Operator::SemiAmp, offset), 2),
                _ => (Token::operator(Operator::Semi, offset), 1),
            },
            '(' => {
                if n1 == Some('(')
                    && self.at_command_start()
                    && let Some(end) = self.matching_double_paren(self.pos + 2)
                {
                    return Ok(self.lex_arithmetic_command(end));
                }
                (Token::operator(Operator::LParen, offset), 1)
            }
            ')' => (Token::operator(Operator::RParen, offset), 1),
            _ => return self.lex_redirect(None),
        };
        self.pos += len;
        self.push(token);
        Ok(())
    }

    fn fd_redirect_ahead(&self) -> bool {
        let mut i = self.pos;
        while self.chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        matches!(self.chars.get(i), Some('<' | '>')) && self.chars.get(i + 1) != Some(&'(')
    }

    fn lex_fd_redirect(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        let fd = digits.parse().ok();
        self.lex_redirect(fd)
    }

    fn lex_redirect(&mut self, fd: Option<u32>) -> Result<(), LexError> {
        let offset = self.pos;
        let (op, len) = if self.chars[self.pos] == '<' {
            match (self.peek(1), self.peek(2)) {
                (Some('<'), Some('<')) => (RedirectOp::HereString, 3),
                (Some('<'), Some('-')) => (RedirectOp::HereDocStrip, 3),
                (Some('<'), _) => (RedirectOp::HereDoc, 2),
                (Some('&'), _) => (RedirectOp::DupInput, 2),
                (Some('>'), _) => (RedirectOp::ReadWrite, 2),
                _ => (RedirectOp::Input, 1),
            }
        } else {
            match self.peek(1) {
                Some('>') => (RedirectOp::Append, 2),
                Some('&') => (RedirectOp::DupOutput, 2),
                Some('|') => (RedirectOp::Clobber, 2),
                _ => (RedirectOp::Output, 1),
            }
        };
        self.pos += len;
        self.push(Token::redirect(op, fd, offset));
        if op.is_heredoc() {
            self.register_heredoc(op == RedirectOp::HereDocStrip);
        }
        Ok(())
    }

    /// Inside `[[ ... ]]`, operator characters are test arguments, not control operators.
    fn lex_conditional_operator(&mut self) {
        let offset = self.pos;
        let c = self.chars[self.pos];
        let len = if (c == '&' || c == '|') && self.peek(1) == Some(c) {
            2
        } else {
            1
        };
        let text: String = self.chars[self.pos..self.pos + len].iter().collect();
        self.pos += len;
        self.push(Token {
            kind: TokenKind::Word,
            text,
            quoting: Quoting::Unquoted,
            parts: Vec::new(),
            fd: None,
            offset,
        });
    }

    /// `(( expr ))` in command position.
    fn lex_arithmetic_command(&mut self, end: usize) {
        let offset = self.pos;
        let source: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        self.push(Token {
            kind: TokenKind::Word,
            text: source.clone(),
            quoting: Quoting::Unquoted,
            parts: vec![RawPart::Arithmetic(source)],
            fd: None,
            offset,
        });
    }

    /// Given the index just past an opening `((`, find the index just past its `))`.
    fn matching_double_paren(&self, from: usize) -> Option<usize> {
        let mut depth = 2usize;
        let mut i = from;
        while let Some(&c) = self.chars.get(i) {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 1 && self.chars.get(i + 1) != Some(&')') {
                        return None;
                    }
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    // ── Here-documents ──

    /// Look ahead at the delimiter word following `<<` without consuming it.
    /// An empty quoted delimiter (`<<''`) is closed by an empty line.
    fn register_heredoc(&mut self, strip_tabs: bool) {
        let mut i = self.pos;
        while matches!(self.chars.get(i), Some(' ' | '\t')) {
            i += 1;
        }
        let word_start = i;
        let mut delimiter = String::new();
        while let Some(&c) = self.chars.get(i) {
            if c.is_whitespace() || matches!(c, ';' | '<' | '>' | '&' | '|' | '(' | ')') {
                break;
            }
            match c {
                '\'' | '"' => {
                    i += 1;
                    while let Some(&q) = self.chars.get(i) {
                        i += 1;
                        if q == c {
                            break;
                        }
                        delimiter.push(q);
                    }
                }
                '\\' => {
                    if let Some(&next) = self.chars.get(i + 1) {
                        delimiter.push(next);
                    }
                    i += 2;
                }
                _ => {
                    delimiter.push(c);
                    i += 1;
                }
            }
        }
        if i > word_start {
            self.pending.push_back(PendingHereDoc {
                delimiter,
                strip_tabs,
            });
        }
    }

    /// Consume here-document bodies queued on the line just ended.
    fn read_heredoc_bodies(&mut self) -> Result<(), LexError> {
        while let Some(heredoc) = self.pending.pop_front() {
            let mut body = String::new();
            let mut closed = false;
            while self.pos < self.chars.len() {
                let line_start = self.pos;
                while self.peek(0).is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
                let line: String = self.chars[line_start..self.pos].iter().collect();
                if self.pos < self.chars.len() {
                    self.pos += 1;
                }
                let candidate = if heredoc.strip_tabs {
                    line.trim_start_matches('\t')
                } else {
                    line.as_str()
                };
                if candidate.trim_end_matches('\r') == heredoc.delimiter {
                    closed = true;
                    break;
                }
                body.push_str(&line);
                body.push('\n');
            }
            if !closed {
                return Err(LexError::UnterminatedHereDoc {
                    delimiter: heredoc.delimiter,
                });
            }
            self.heredocs.push(body);
        }
        Ok(())
    }

    // ── Words ──

    fn lex_word(&mut self) -> Result<(), LexError> {
        let offset = self.pos;
        let mut word = WordBuilder::default();
        while let Some(c) = self.peek(0) {
            match c {
                '(' if word.is_assignment_prefix() => self.read_array_literal(&mut word)?,
                ' ' | '\t' | '\r' | '\n' | ';' | '&' | '|' | '(' | ')' => break,
                '<' | '>' => {
                    if self.peek(1) != Some('(') {
                        break;
                    }
                    self.read_process_substitution(&mut word)?;
                }
                '\\' => match self.peek(1) {
                    Some('\n') => self.pos += 2,
                    Some(next) => {
                        word.push_escaped(next);
                        self.pos += 2;
                    }
                    None => {
                        word.push_char('\\', Ctx::Unquoted);
                        self.pos += 1;
                    }
                },
                '\'' => self.read_single_quoted(&mut word)?,
                '"' => self.read_double_quoted(&mut word)?,
                '`' => self.read_backtick(&mut word, Ctx::Unquoted)?,
                '$' => self.read_dollar(&mut word, Ctx::Unquoted)?,
                _ => {
                    word.push_char(c, Ctx::Unquoted);
                    self.pos += 1;
                }
            }
        }
        if !word.consumed {
            // Only a line continuation: nothing to emit.
            if self.pos == offset {
                self.pos += 1;
            }
            return Ok(());
        }
        let token = word.finish(offset);
        self.push(token);
        Ok(())
    }

    fn read_single_quoted(&mut self, word: &mut WordBuilder) -> Result<(), LexError> {
        let start = self.pos;
        let close = (start + 1..self.chars.len())
            .find(|&i| self.chars[i] == '\'')
            .ok_or(LexError::UnterminatedQuote {
                quote: '\'',
                offset: start,
            })?;
        let content: String = self.chars[start + 1..close].iter().collect();
        word.push_single(&content);
        self.pos = close + 1;
        Ok(())
    }

    fn read_double_quoted(&mut self, word: &mut WordBuilder) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        word.open_double();
        loop {
            let Some(c) = self.peek(0) else {
                return Err(LexError::UnterminatedQuote {
                    quote: '"',
                    offset: start,
                });
            };
            match c {
                '"' => {
                    self.pos += 1;
                    return Ok(());
                }
                '\\' => match self.peek(1) {
                    Some('\n') => self.pos += 2,
                    Some(next @ ('$' | '`' | '"' | '\\')) => {
                        word.push_char(next, Ctx::Double);
                        self.pos += 2;
                    }
                    _ => {
                        word.push_char('\\', Ctx::Double);
                        self.pos += 1;
                    }
                },
                '$' => self.read_dollar(word, Ctx::Double)?,
                '`' => self.read_backtick(word, Ctx::Double)?,
                _ => {
                    word.push_char(c, Ctx::Double);
                    self.pos += 1;
                }
            }
        }
    }

    fn read_dollar(&mut self, word: &mut WordBuilder, ctx: Ctx) -> Result<(), LexError> {
        let start = self.pos;
        match self.peek(1) {
            Some('(') => {
                if self.peek(2) == Some('(')
                    && let Some(end) = self.matching_double_paren(start + 3)
                {
                    let source: String = self.chars[start..end].iter().collect();
                    word.push_part(RawPart::Arithmetic(source.clone()), &source, ctx);
                    self.pos = end;
                    return Ok(());
                }
                self.nesting_check()?;
                let inner = Lexer::new(
                    self.chars,
                    start + 2,
                    self.depth + 1,
                    self.max_depth,
                    Mode::Substitution,
                );
                let (stream, end) = inner.run()?;
                let source: String = self.chars[start..end].iter().collect();
                word.push_part(RawPart::Command(source.clone(), Box::new(stream)), &source, ctx);
                self.pos = end;
            }
            Some('{') => {
                let end = self
                    .matching_brace(start + 2)
                    .ok_or(LexError::UnterminatedSubstitution { offset: start })?;
                let source: String = self.chars[start..end].iter().collect();
                word.push_part(RawPart::Parameter(source.clone()), &source, ctx);
                self.pos = end;
            }
            Some('\'') if ctx == Ctx::Unquoted => self.read_ansi_c_quoted(word)?,
            Some('"') if ctx == Ctx::Unquoted => self.pos += 1,
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                let mut end = start + 1;
                while self
                    .chars
                    .get(end)
                    .is_some_and(|c| *c == '_' || c.is_ascii_alphanumeric())
                {
                    end += 1;
                }
                let source: String = self.chars[start..end].iter().collect();
                word.push_part(RawPart::Parameter(source.clone()), &source, ctx);
                self.pos = end;
            }
            Some(c) if c.is_ascii_digit() || "@*#?$!-".contains(c) => {
                let source: String = self.chars[start..start + 2].iter().collect();
                word.push_part(RawPart::Parameter(source.clone()), &source, ctx);
                self.pos = start + 2;
            }
            _ => {
                word.push_char('$', ctx);
                self.pos += 1;
            }
        }
        Ok(())
    }

    /// `$'...'` with the common backslash escapes.
    fn read_ansi_c_quoted(&mut self, word: &mut WordBuilder) -> Result<(), LexError> {
        let start = self.pos;
        let mut i = start + 2;
        let mut content = String::new();
        loop {
            match self.chars.get(i) {
                None => {
                    return Err(LexError::UnterminatedQuote {
                        quote: '\'',
                        offset: start,
                    });
                }
                Some('\'') => break,
                Some('\\') => {
                    match self.chars.get(i + 1) {
                        Some('n') => content.push('\n'),
                        Some('t') => content.push('\t'),
                        Some(&c @ ('\\' | '\'' | '"')) => content.push(c),
                        Some(&c) => {
                            content.push('\\');
                            content.push(c);
                        }
                        None => content.push('\\'),
                    }
                    i += 2;
                }
                Some(&c) => {
                    content.push(c);
                    i += 1;
                }
            }
        }
        word.push_single(&content);
        self.pos = i + 1;
        Ok(())
    }

    fn read_backtick(&mut self, word: &mut WordBuilder, ctx: Ctx) -> Result<(), LexError> {
        let start = self.pos;
        let mut i = start + 1;
        let mut inner = Vec::new();
        loop {
            match self.chars.get(i) {
                None => {
                    return Err(LexError::UnterminatedQuote {
                        quote: '`',
                        offset: start,
                    });
                }
                Some('`') => break,
                Some('\\') => match self.chars.get(i + 1) {
                    Some(&c @ ('`' | '\\' | '$')) => {
                        inner.push(c);
                        i += 2;
                    }
                    _ => {
                        inner.push('\\');
                        i += 1;
                    }
                },
                Some(&c) => {
                    inner.push(c);
                    i += 1;
                }
            }
        }
        let end = i + 1;
        self.nesting_check()?;
        let (stream, _) =
            Lexer::new(&inner, 0, self.depth + 1, self.max_depth, Mode::TopLevel).run()?;
        let source: String = self.chars[start..end].iter().collect();
        word.push_part(RawPart::Backtick(source.clone(), Box::new(stream)), &source, ctx);
        self.pos = end;
        Ok(())
    }

    fn read_process_substitution(&mut self, word: &mut WordBuilder) -> Result<(), LexError> {
        let start = self.pos;
        self.nesting_check()?;
        let inner = Lexer::new(
            self.chars,
            start + 2,
            self.depth + 1,
            self.max_depth,
            Mode::Substitution,
        );
        let (stream, end) = inner.run()?;
        let source: String = self.chars[start..end].iter().collect();
        word.push_part(RawPart::Process(source.clone(), Box::new(stream)), &source, Ctx::Unquoted);
        self.pos = end;
        Ok(())
    }

    /// `NAME=(a b c)`: kept as literal text of the assignment value.
    fn read_array_literal(&mut self, word: &mut WordBuilder) -> Result<(), LexError> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut i = start;
        let mut quote: Option<char> = None;
        while let Some(&c) = self.chars.get(i) {
            match (quote, c) {
                (Some(q), _) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, '\\') => i += 1,
                (None, '(') => depth += 1,
                (None, ')') => {
                    depth -= 1;
                    if depth == 0 {
                        for &ch in &self.chars[start..=i] {
                            word.push_char(ch, Ctx::Unquoted);
                        }
                        self.pos = i + 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(LexError::UnbalancedParen { offset: start })
    }

    /// Given the index just past `${`, find the index just past the matching `}`.
    fn matching_brace(&self, from: usize) -> Option<usize> {
        let mut depth = 1usize;
        let mut i = from;
        let mut quote: Option<char> = None;
        while let Some(&c) = self.chars.get(i) {
            match (quote, c) {
                (Some(q), _) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, '\\') => i += 1,
                (None, '{') => depth += 1,
                (None, '}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }
}
