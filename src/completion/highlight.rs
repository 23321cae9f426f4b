/*!
 * Syntax highlighting for the input line
 */

use super::tokenizer::{tokenize, TokenKind};
use crate::database::Dialect;
use std::collections::HashSet;

const KEYWORD: &str = "\x1b[36m";
const STRING: &str = "\x1b[33m";
const NUMBER: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

pub struct SqlHighlighter {
    keywords: HashSet<&'static str>,
}

impl SqlHighlighter {
    pub fn new(dialect: &dyn Dialect) -> Self {
        Self {
            keywords: dialect.keywords().iter().copied().collect(),
        }
    }

    /// Colour keywords, string literals and numbers. Everything else is
    /// copied through untouched.
    pub fn highlight(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len() * 2);
        for token in tokenize(line) {
            let colour = match token.kind {
                TokenKind::Word if self.keywords.contains(token.upper().as_str()) => Some(KEYWORD),
                TokenKind::String => Some(STRING),
                TokenKind::Number => Some(NUMBER),
                _ => None,
            };
            match colour {
                Some(colour) => {
                    out.push_str(colour);
                    out.push_str(&token.value);
                    out.push_str(RESET);
                }
                None => out.push_str(&token.value),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MysqlDialect;
    use rstest::rstest;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[rstest]
    #[case("")]
    #[case("select * from users where id = 42;")]
    #[case("INSERT INTO t VALUES ('it''s', 3.14, \"x\")")]
    #[case("SELECT `order` FROM `t` WHERE name LIKE 'abc")]
    fn stripping_colours_gives_back_the_line(#[case] line: &str) {
        let highlighter = SqlHighlighter::new(&MysqlDialect::new());
        assert_eq!(strip_ansi(&highlighter.highlight(line)), line);
    }

    #[test]
    fn colours_by_token_kind() {
        let highlighter = SqlHighlighter::new(&MysqlDialect::new());
        assert_eq!(
            highlighter.highlight("select name, 7 from t where x = 'a'"),
            "\x1b[36mselect\x1b[0m name, \x1b[32m7\x1b[0m \x1b[36mfrom\x1b[0m t \
             \x1b[36mwhere\x1b[0m x = \x1b[33m'a'\x1b[0m"
        );
    }

    #[test]
    fn plain_identifiers_are_left_alone() {
        let highlighter = SqlHighlighter::new(&MysqlDialect::new());
        assert_eq!(highlighter.highlight("users"), "users");
    }
}
