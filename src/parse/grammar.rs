//! Grammar builder: token stream to syntax tree.
//!
//! Recursive descent with the usual shell precedence: `|` binds tighter than
//! `&&`/`||`, which bind tighter than `;`/`&`/newline. Substitution payloads
//! are parsed here too, so a malformed `$(...)` fails the whole parse, but
//! the resulting sub-tree is stored on the word and never treated as a peer
//! of the surrounding commands.

use thiserror::Error;

use super::lexer::{RESERVED_WORDS, TokenStream};
use super::tokenize::is_name;
use super::types::{
    AndOr, Assignment, CaseArm, Command, CompoundCommand, Connector, Expansion, Fragment, List,
    ListEntry, Operator, Pipeline, Quoting, RawPart, Redirection, Separator, SimpleCommand, Token,
    TokenKind, Word,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("unexpected `{found}` at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("unexpected end of input, expected `{expected}`")]
    UnexpectedEnd { expected: &'static str },
    #[error("empty `{construct}` body")]
    EmptyBody { construct: &'static str },
    #[error("unsupported keyword `{0}`")]
    UnsupportedKeyword(String),
    #[error("commands nested deeper than {limit}")]
    NestingTooDeep { limit: usize },
}

/// Build the syntax tree for a complete token stream.
pub fn build(stream: &TokenStream, max_depth: usize) -> Result<List, GrammarError> {
    Grammar::new(stream, 0, max_depth).program()
}

struct Grammar<'a> {
    tokens: &'a [Token],
    heredocs: &'a [String],
    pos: usize,
    next_heredoc: usize,
    depth: usize,
    max_depth: usize,
}

fn unexpected(token: &Token) -> GrammarError {
    GrammarError::UnexpectedToken {
        found: token.text.clone(),
        offset: token.offset,
    }
}

fn is_word(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Word | TokenKind::Assignment)
}

impl<'a> Grammar<'a> {
    fn new(stream: &'a TokenStream, depth: usize, max_depth: usize) -> Self {
        Self {
            tokens: &stream.tokens,
            heredocs: &stream.heredocs,
            pos: 0,
            next_heredoc: 0,
            depth,
            max_depth,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn peek_operator(&self) -> Option<Operator> {
        match self.peek()?.kind {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// The next token as a reserved word, if it is one.
    fn keyword(&self) -> Option<&'a str> {
        let token = self.peek()?;
        (token.kind == TokenKind::Word
            && token.quoting == Quoting::Unquoted
            && RESERVED_WORDS.contains(&token.text.as_str()))
        .then_some(token.text.as_str())
    }

    fn skip_newlines(&mut self) {
        while self.peek_operator() == Some(Operator::Newline) {
            self.pos += 1;
        }
    }

    fn error_here(&self, expected: &'static str) -> GrammarError {
        match self.peek() {
            Some(token) => unexpected(token),
            None => GrammarError::UnexpectedEnd { expected },
        }
    }

    fn expect_keyword(&mut self, keyword: &'static str) -> Result<(), GrammarError> {
        if self.keyword() == Some(keyword) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here(keyword))
        }
    }

    fn expect_operator(&mut self, op: Operator, expected: &'static str) -> Result<(), GrammarError> {
        if self.peek_operator() == Some(op) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here(expected))
        }
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, GrammarError>,
    ) -> Result<T, GrammarError> {
        if self.depth + 1 > self.max_depth {
            return Err(GrammarError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn program(mut self) -> Result<List, GrammarError> {
        let list = self.list(&[])?;
        match self.peek() {
            Some(token) => Err(unexpected(token)),
            None => Ok(list),
        }
    }

    // ── Lists, chains, pipelines ──

    /// Parse list entries until end of input, `)`, a case terminator, or one
    /// of `terminators` in command position.
    fn list(&mut self, terminators: &[&str]) -> Result<List, GrammarError> {
        let mut list = List::default();
        loop {
            self.skip_newlines();
            match self.peek_operator() {
                Some(Operator::RParen) => break,
                Some(op) if op.is_case_terminator() => break,
                _ => {}
            }
            if self.peek().is_none() {
                break;
            }
            if let Some(keyword) = self.keyword()
                && terminators.contains(&keyword)
            {
                break;
            }

            let chain = self.and_or()?;
            let separator = match self.peek_operator() {
                Some(Operator::Semi | Operator::Newline) => Some(Separator::Sequential),
                Some(Operator::Amp) => Some(Separator::Background),
                _ => None,
            };
            if separator.is_some() {
                self.pos += 1;
            }
            list.entries.push(ListEntry { chain, separator });
            if separator.is_none() {
                break;
            }
        }
        Ok(list)
    }

    /// A list that must contain at least one entry.
    fn compound_list(
        &mut self,
        terminators: &[&'static str],
        construct: &'static str,
    ) -> Result<List, GrammarError> {
        let list = self.list(terminators)?;
        if list.is_empty() {
            return Err(match self.peek() {
                Some(_) => GrammarError::EmptyBody { construct },
                None => GrammarError::UnexpectedEnd {
                    expected: terminators.first().copied().unwrap_or(construct),
                },
            });
        }
        Ok(list)
    }

    fn and_or(&mut self) -> Result<AndOr, GrammarError> {
        let first = self.pipeline()?;
        let mut rest = Vec::new();
        loop {
            let connector = match self.peek_operator() {
                Some(Operator::And) => Connector::And,
                Some(Operator::Or) => Connector::Or,
                _ => break,
            };
            self.pos += 1;
            self.skip_newlines();
            rest.push((connector, self.pipeline()?));
        }
        Ok(AndOr { first, rest })
    }

    fn pipeline(&mut self) -> Result<Pipeline, GrammarError> {
        let mut negated = false;
        while self.keyword() == Some("!") {
            negated = !negated;
            self.pos += 1;
        }
        let mut stages = vec![self.command()?];
        while matches!(
            self.peek_operator(),
            Some(Operator::Pipe | Operator::PipeErr)
        ) {
            self.pos += 1;
            self.skip_newlines();
            stages.push(self.command()?);
        }
        Ok(Pipeline { negated, stages })
    }

    // ── Commands ──

    fn command(&mut self) -> Result<Command, GrammarError> {
        let Some(token) = self.peek() else {
            return Err(GrammarError::UnexpectedEnd {
                expected: "command",
            });
        };

        if token.kind == TokenKind::Word && token.quoting == Quoting::Unquoted {
            match token.text.as_str() {
                "if" => return self.compound(Self::if_clause),
                "while" => return self.compound(|g| g.loop_clause(true)),
                "until" => return self.compound(|g| g.loop_clause(false)),
                "for" => return self.compound(Self::for_clause),
                "case" => return self.compound(Self::case_clause),
                "{" => return self.compound(Self::group),
                "function" => return self.compound(Self::function_keyword),
                "select" | "coproc" => {
                    return Err(GrammarError::UnsupportedKeyword(token.text.clone()));
                }
                word if RESERVED_WORDS.contains(&word) && word != "!" => {
                    return Err(unexpected(token));
                }
                _ => {}
            }
            if let [RawPart::Arithmetic(source)] = token.parts.as_slice()
                && source.starts_with("((")
            {
                self.pos += 1;
                let arithmetic = CompoundCommand::Arithmetic(source.clone());
                let redirections = self.redirections()?;
                return Ok(Command::Compound(arithmetic, redirections));
            }
            if self.peek_at(1).is_some_and(|t| t.is_operator(Operator::LParen))
                && self.peek_at(2).is_some_and(|t| t.is_operator(Operator::RParen))
            {
                return self.compound(Self::function_parens);
            }
        }

        if token.is_operator(Operator::LParen) {
            return self.compound(Self::subshell);
        }
        self.simple().map(Command::Simple)
    }

    fn compound(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<CompoundCommand, GrammarError>,
    ) -> Result<Command, GrammarError> {
        let compound = self.nested(parse)?;
        let redirections = self.redirections()?;
        Ok(Command::Compound(compound, redirections))
    }

    fn simple(&mut self) -> Result<SimpleCommand, GrammarError> {
        let mut command = SimpleCommand::default();
        let mut consumed = false;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Assignment if command.words.is_empty() => {
                    self.pos += 1;
                    command.assignments.push(self.assignment(token)?);
                }
                TokenKind::Word | TokenKind::Assignment => {
                    self.pos += 1;
                    command.words.push(self.word(token)?);
                }
                TokenKind::Redirect(_) => command.redirections.push(self.redirection()?),
                TokenKind::Operator(_) => break,
            }
            consumed = true;
        }
        if !consumed {
            return Err(self.error_here("command"));
        }
        Ok(command)
    }

    fn redirections(&mut self) -> Result<Vec<Redirection>, GrammarError> {
        let mut redirections = Vec::new();
        while self
            .peek()
            .is_some_and(|t| matches!(t.kind, TokenKind::Redirect(_)))
        {
            redirections.push(self.redirection()?);
        }
        Ok(redirections)
    }

    fn redirection(&mut self) -> Result<Redirection, GrammarError> {
        let Some(token) = self.peek() else {
            return Err(GrammarError::UnexpectedEnd {
                expected: "redirection",
            });
        };
        let TokenKind::Redirect(op) = token.kind else {
            return Err(unexpected(token));
        };
        self.pos += 1;
        let target = match self.peek() {
            Some(t) if is_word(t) => {
                self.pos += 1;
                self.word(t)?
            }
            _ => return Err(self.error_here("redirection target")),
        };
        let body = if op.is_heredoc() {
            let body = self.heredocs.get(self.next_heredoc).cloned();
            self.next_heredoc += 1;
            body
        } else {
            None
        };
        Ok(Redirection {
            fd: token.fd,
            op,
            target,
            body,
        })
    }

    // ── Compound commands ──

    fn if_clause(&mut self) -> Result<CompoundCommand, GrammarError> {
        self.pos += 1;
        let mut branches = Vec::new();
        let condition = self.compound_list(&["then"], "if")?;
        self.expect_keyword("then")?;
        let body = self.compound_list(&["elif", "else", "fi"], "then")?;
        branches.push((condition, body));

        let mut else_body = None;
        loop {
            match self.keyword() {
                Some("elif") => {
                    self.pos += 1;
                    let condition = self.compound_list(&["then"], "elif")?;
                    self.expect_keyword("then")?;
                    let body = self.compound_list(&["elif", "else", "fi"], "then")?;
                    branches.push((condition, body));
                }
                Some("else") => {
                    self.pos += 1;
                    else_body = Some(self.compound_list(&["fi"], "else")?);
                    break;
                }
                _ => break,
            }
        }
        self.expect_keyword("fi")?;
        Ok(CompoundCommand::If {
            branches,
            else_body,
        })
    }

    /// `while` (or `until`) condition `do` body `done`.
    fn loop_clause(&mut self, is_while: bool) -> Result<CompoundCommand, GrammarError> {
        self.pos += 1;
        let construct = if is_while { "while" } else { "until" };
        let condition = self.compound_list(&["do"], construct)?;
        let body = self.do_group()?;
        Ok(if is_while {
            CompoundCommand::While { condition, body }
        } else {
            CompoundCommand::Until { condition, body }
        })
    }

    fn do_group(&mut self) -> Result<List, GrammarError> {
        self.expect_keyword("do")?;
        let body = self.compound_list(&["done"], "do")?;
        self.expect_keyword("done")?;
        Ok(body)
    }

    fn for_clause(&mut self) -> Result<CompoundCommand, GrammarError> {
        self.pos += 1;
        let variable = match self.peek() {
            Some(t) if is_word(t) && t.quoting == Quoting::Unquoted && is_name(&t.text) => {
                self.pos += 1;
                t.text.clone()
            }
            _ => return Err(self.error_here("loop variable")),
        };
        self.skip_newlines();

        let mut items = Vec::new();
        if self.keyword() == Some("in") {
            self.pos += 1;
            while let Some(t) = self.peek()
                && is_word(t)
            {
                self.pos += 1;
                items.push(self.word(t)?);
            }
            if matches!(
                self.peek_operator(),
                Some(Operator::Semi | Operator::Newline)
            ) {
                self.pos += 1;
            }
        } else if self.peek_operator() == Some(Operator::Semi) {
            self.pos += 1;
        }
        self.skip_newlines();

        let body = self.do_group()?;
        Ok(CompoundCommand::For {
            variable,
            items,
            body,
        })
    }

    fn case_clause(&mut self) -> Result<CompoundCommand, GrammarError> {
        self.pos += 1;
        let subject = match self.peek() {
            Some(t) if is_word(t) => {
                self.pos += 1;
                self.word(t)?
            }
            _ => return Err(self.error_here("case subject")),
        };
        self.skip_newlines();
        self.expect_keyword("in")?;

        let mut arms = Vec::new();
        loop {
            self.skip_newlines();
            if self.keyword() == Some("esac") {
                self.pos += 1;
                break;
            }
            if self.peek_operator() == Some(Operator::LParen) {
                self.pos += 1;
            }

            let mut patterns = Vec::new();
            loop {
                match self.peek() {
                    Some(t) if is_word(t) => {
                        self.pos += 1;
                        patterns.push(t.text.clone());
                    }
                    _ => return Err(self.error_here("esac")),
                }
                if self.peek_operator() != Some(Operator::Pipe) {
                    break;
                }
                self.pos += 1;
            }
            self.expect_operator(Operator::RParen, ")")?;

            let body = self.list(&["esac"])?;
            arms.push(CaseArm { patterns, body });

            match self.peek_operator() {
                Some(op) if op.is_case_terminator() => self.pos += 1,
                _ => {
                    self.skip_newlines();
                    self.expect_keyword("esac")?;
                    break;
                }
            }
        }
        Ok(CompoundCommand::Case { subject, arms })
    }

    fn subshell(&mut self) -> Result<CompoundCommand, GrammarError> {
        self.pos += 1;
        let body = self.compound_list(&[], "(")?;
        self.expect_operator(Operator::RParen, ")")?;
        Ok(CompoundCommand::Subshell(body))
    }

    fn group(&mut self) -> Result<CompoundCommand, GrammarError> {
        self.pos += 1;
        let body = self.compound_list(&["}"], "{")?;
        self.expect_keyword("}")?;
        Ok(CompoundCommand::Group(body))
    }

    /// `function name [()] body`
    fn function_keyword(&mut self) -> Result<CompoundCommand, GrammarError> {
        self.pos += 1;
        let name = match self.peek() {
            Some(t) if is_word(t) => {
                self.pos += 1;
                t.text.clone()
            }
            _ => return Err(self.error_here("function name")),
        };
        if self.peek_operator() == Some(Operator::LParen)
            && self.peek_at(1).is_some_and(|t| t.is_operator(Operator::RParen))
        {
            self.pos += 2;
        }
        self.function_body(name)
    }

    /// `name () body`
    fn function_parens(&mut self) -> Result<CompoundCommand, GrammarError> {
        let name = self.peek().map(|t| t.text.clone()).unwrap_or_default();
        self.pos += 3;
        self.function_body(name)
    }

    fn function_body(&mut self, name: String) -> Result<CompoundCommand, GrammarError> {
        self.skip_newlines();
        let body = self.command()?;
        Ok(CompoundCommand::Function {
            name,
            body: Box::new(body),
        })
    }

    // ── Words ──

    fn word(&self, token: &Token) -> Result<Word, GrammarError> {
        Ok(Word {
            text: token.text.clone(),
            quoting: token.quoting,
            fragments: self.fragments(&token.parts)?,
        })
    }

    fn assignment(&self, token: &Token) -> Result<Assignment, GrammarError> {
        let Some((name, value)) = token.text.split_once('=') else {
            return Err(unexpected(token));
        };
        let mut fragments = self.fragments(&token.parts)?;
        if let Some(Fragment::Literal(first)) = fragments.first_mut() {
            let prefix = name.len() + 1;
            if first.len() >= prefix {
                first.drain(..prefix);
            }
            if first.is_empty() {
                fragments.remove(0);
            }
        }
        Ok(Assignment {
            name: name.strip_suffix('+').unwrap_or(name).to_string(),
            value: Word {
                text: value.to_string(),
                quoting: token.quoting,
                fragments,
            },
        })
    }

    fn fragments(&self, parts: &[RawPart]) -> Result<Vec<Fragment>, GrammarError> {
        parts
            .iter()
            .map(|part| {
                Ok(match part {
                    RawPart::Literal(text) => Fragment::Literal(text.clone()),
                    RawPart::Parameter(source) => {
                        Fragment::Expansion(Expansion::Parameter(source.clone()))
                    }
                    RawPart::Arithmetic(source) => {
                        Fragment::Expansion(Expansion::Arithmetic(source.clone()))
                    }
                    RawPart::Command(_, stream) | RawPart::Backtick(_, stream) => {
                        Fragment::Expansion(Expansion::Command(Box::new(self.substitution(stream)?)))
                    }
                    RawPart::Process(_, stream) => {
                        Fragment::Expansion(Expansion::Process(Box::new(self.substitution(stream)?)))
                    }
                })
            })
            .collect()
    }

    fn substitution(&self, stream: &TokenStream) -> Result<List, GrammarError> {
        if self.depth + 1 > self.max_depth {
            return Err(GrammarError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        Grammar::new(stream, self.depth + 1, self.max_depth).program()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::lexer::tokenize;
    use crate::parse::types::RedirectOp;

    fn tree(input: &str) -> List {
        build(&tokenize(input, 32).unwrap(), 32).unwrap()
    }

    fn error(input: &str) -> GrammarError {
        build(&tokenize(input, 32).unwrap(), 32).unwrap_err()
    }

    fn simple(command: &Command) -> &SimpleCommand {
        match command {
            Command::Simple(simple) => simple,
            other => panic!("expected simple command, got {other:?}"),
        }
    }

    fn first_command(list: &List) -> &Command {
        &list.entries[0].chain.first.stages[0]
    }

    #[test]
    fn precedence_pipe_over_and_over_semi() {
        let list = tree("a | b && c ; d &");
        assert_eq!(list.entries.len(), 2);
        let first = &list.entries[0];
        assert_eq!(first.separator, Some(Separator::Sequential));
        assert_eq!(first.chain.first.stages.len(), 2);
        assert_eq!(first.chain.rest.len(), 1);
        assert_eq!(first.chain.rest[0].0, Connector::And);
        assert_eq!(list.entries[1].separator, Some(Separator::Background));
    }

    #[test]
    fn left_associative_chain() {
        let list = tree("a && b || c && d");
        let chain = &list.entries[0].chain;
        let connectors: Vec<_> = chain.rest.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            connectors,
            vec![Connector::And, Connector::Or, Connector::And]
        );
    }

    #[test]
    fn newline_after_operator_continues_chain() {
        let list = tree("a &&\n b |\n c");
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.entries[0].chain.rest[0].1.stages.len(), 2);
    }

    #[test]
    fn assignments_precede_words() {
        let list = tree("A=1 B=$(x) cmd C=3 > out");
        let cmd = simple(first_command(&list));
        assert_eq!(cmd.assignments.len(), 2);
        assert_eq!(cmd.assignments[0].name, "A");
        assert_eq!(cmd.assignments[0].value.text, "1");
        let words: Vec<_> = cmd.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, vec!["cmd", "C=3"]);
        assert_eq!(cmd.redirections.len(), 1);
        assert_eq!(cmd.redirections[0].target.text, "out");
    }

    #[test]
    fn assignment_value_keeps_substitution() {
        let list = tree("VAR=$(cat f | head -1)");
        let cmd = simple(first_command(&list));
        assert!(cmd.words.is_empty());
        assert!(matches!(
            cmd.assignments[0].value.fragments.as_slice(),
            [Fragment::Expansion(Expansion::Command(_))]
        ));
    }

    #[test]
    fn command_substitution_payload_is_parsed() {
        let list = tree("echo $(find . | head -1)");
        let cmd = simple(first_command(&list));
        match &cmd.words[1].fragments[0] {
            Fragment::Expansion(Expansion::Command(inner)) => {
                assert_eq!(inner.entries[0].chain.first.stages.len(), 2);
            }
            other => panic!("expected command expansion, got {other:?}"),
        }
    }

    #[test]
    fn heredoc_body_on_redirection() {
        let list = tree("cat <<EOF > out\nhello | world\nEOF\n");
        let cmd = simple(first_command(&list));
        assert_eq!(cmd.redirections[0].op, RedirectOp::HereDoc);
        assert_eq!(cmd.redirections[0].body.as_deref(), Some("hello | world\n"));
        assert_eq!(cmd.redirections[1].body, None);
    }

    #[test]
    fn if_elif_else() {
        let list = tree("if a; then b; elif c; then d; else e; fi");
        match first_command(&list) {
            Command::Compound(CompoundCommand::If { branches, else_body }, _) => {
                assert_eq!(branches.len(), 2);
                assert!(else_body.is_some());
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn multiline_if() {
        let list = tree("if [ -f x ]\nthen\n  cat x\nfi\necho done");
        assert_eq!(list.entries.len(), 2);
    }

    #[test]
    fn loops() {
        let list = tree("while read l; do echo $l; done < f; until false; do :; done");
        assert!(matches!(
            first_command(&list),
            Command::Compound(CompoundCommand::While { .. }, r) if r.len() == 1
        ));
        assert!(matches!(
            list.entries[1].chain.first.stages[0],
            Command::Compound(CompoundCommand::Until { .. }, _)
        ));
    }

    #[test]
    fn for_loop() {
        let list = tree("for f in *.java a b; do javac $f; done");
        match first_command(&list) {
            Command::Compound(CompoundCommand::For { variable, items, .. }, _) => {
                assert_eq!(variable, "f");
                assert_eq!(items.len(), 3);
            }
            other => panic!("expected for, got {other:?}"),
        }
    }

    #[test]
    fn for_without_in() {
        let list = tree("for x; do echo; done");
        assert!(matches!(
            first_command(&list),
            Command::Compound(CompoundCommand::For { items, .. }, _) if items.is_empty()
        ));
    }

    #[test]
    fn case_arms() {
        let list = tree("case $x in\n  a|b) echo ab;;\n  (*) ls ;;\nesac");
        match first_command(&list) {
            Command::Compound(CompoundCommand::Case { arms, .. }, _) => {
                assert_eq!(arms.len(), 2);
                assert_eq!(arms[0].patterns, vec!["a", "b"]);
                assert_eq!(arms[1].patterns, vec!["*"]);
            }
            other => panic!("expected case, got {other:?}"),
        }
    }

    #[test]
    fn case_last_arm_without_terminator() {
        let list = tree("case x in a) echo\nesac");
        assert!(matches!(
            first_command(&list),
            Command::Compound(CompoundCommand::Case { arms, .. }, _) if arms.len() == 1
        ));
    }

    #[test]
    fn subshell_and_group() {
        let list = tree("(cd a && make) ; { echo x; echo y; } > log");
        assert!(matches!(
            first_command(&list),
            Command::Compound(CompoundCommand::Subshell(_), _)
        ));
        assert!(matches!(
            list.entries[1].chain.first.stages[0],
            Command::Compound(CompoundCommand::Group(_), ref r) if r.len() == 1
        ));
    }

    #[test]
    fn function_definitions() {
        let list = tree("f() { echo a; }; function g { ls; }");
        assert!(matches!(
            first_command(&list),
            Command::Compound(CompoundCommand::Function { name, .. }, _) if name == "f"
        ));
        assert!(matches!(
            &list.entries[1].chain.first.stages[0],
            Command::Compound(CompoundCommand::Function { name, .. }, _) if name == "g"
        ));
    }

    #[test]
    fn negated_pipeline() {
        let list = tree("! grep -q x f");
        assert!(list.entries[0].chain.first.negated);
    }

    #[test]
    fn repeated_negation() {
        let list = tree("! ! grep x f");
        let pipeline = &list.entries[0].chain.first;
        assert!(!pipeline.negated);
        assert!(matches!(
            &pipeline.stages[0],
            Command::Simple(simple) if simple.words[0].text == "grep"
        ));
        assert!(tree("! ! ! true").entries[0].chain.first.negated);
    }

    #[test]
    fn arithmetic_command() {
        let list = tree("(( n > 3 )) && echo big");
        assert!(matches!(
            first_command(&list),
            Command::Compound(CompoundCommand::Arithmetic(_), _)
        ));
    }

    #[test]
    fn unmatched_paren() {
        assert!(matches!(
            error("(echo a"),
            GrammarError::UnexpectedEnd { .. }
        ));
        assert!(matches!(
            error("echo a)"),
            GrammarError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn unmatched_if_fi() {
        assert!(matches!(error("if a; then b"), GrammarError::UnexpectedEnd { .. }));
        assert!(matches!(error("fi"), GrammarError::UnexpectedToken { .. }));
        assert!(matches!(error("echo; done"), GrammarError::UnexpectedToken { .. }));
    }

    #[test]
    fn operator_at_list_start() {
        assert!(matches!(error("&& ls"), GrammarError::UnexpectedToken { .. }));
        assert!(matches!(error("; ls"), GrammarError::UnexpectedToken { .. }));
        assert!(matches!(error("| ls"), GrammarError::UnexpectedToken { .. }));
    }

    #[test]
    fn dangling_operator() {
        assert!(matches!(error("ls &&"), GrammarError::UnexpectedEnd { .. }));
    }

    #[test]
    fn empty_body() {
        assert!(matches!(
            error("if then fi"),
            GrammarError::EmptyBody { construct: "if" }
        ));
    }

    #[test]
    fn unsupported_keywords() {
        assert_eq!(
            error("select x in a b; do echo; done"),
            GrammarError::UnsupportedKeyword("select".into())
        );
    }

    #[test]
    fn arithmetic_for_rejected() {
        assert!(build(&tokenize("for ((i=0;i<3;i++)); do echo; done", 32).unwrap(), 32).is_err());
    }

    #[test]
    fn malformed_substitution_fails_parse() {
        assert!(build(&tokenize("echo $(if true)", 32).unwrap(), 32).is_err());
    }

    #[test]
    fn compound_nesting_limit() {
        let input = "{ { { echo; }; }; }";
        assert!(build(&tokenize(input, 32).unwrap(), 3).is_ok());
        assert_eq!(
            build(&tokenize(input, 32).unwrap(), 2).unwrap_err(),
            GrammarError::NestingTooDeep { limit: 2 }
        );
    }

    #[test]
    fn reserved_word_as_argument() {
        let list = tree("echo if then fi");
        assert_eq!(simple(first_command(&list)).words.len(), 4);
    }
}
