pub mod fallback;
pub mod grammar;
pub mod lexer;
pub mod tokenize;
pub mod types;

use thiserror::Error;

pub use grammar::GrammarError;
pub use lexer::{LexError, TokenStream, tokenize};
pub use types::List;

/// Either stage of the strict parse failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
}

/// Lex and build the syntax tree for `input`.
pub fn parse_tree(input: &str, max_depth: usize) -> Result<List, ParseError> {
    let stream = tokenize(input, max_depth)?;
    Ok(grammar::build(&stream, max_depth)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_errors_wrap() {
        assert!(matches!(
            parse_tree("echo 'x", 32),
            Err(ParseError::Lex(LexError::UnterminatedQuote { .. }))
        ));
    }

    #[test]
    fn grammar_errors_wrap() {
        assert!(matches!(
            parse_tree("fi", 32),
            Err(ParseError::Grammar(GrammarError::UnexpectedToken { .. }))
        ));
    }

    #[test]
    fn empty_input_is_empty_list() {
        assert!(parse_tree("", 32).unwrap().is_empty());
        assert!(parse_tree("  \n # just a comment\n", 32).unwrap().is_empty());
    }
}
