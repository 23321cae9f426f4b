/*!
 * Lenient SQL tokenizer
 *
 * Splits raw input into typed tokens for completion and highlighting. It
 * never fails: unterminated strings and quoted identifiers run to the end of
 * input, and concatenating every token value reproduces the input exactly.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Operator,
    String,
    Number,
    Punctuation,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
}

impl Token {
    fn new(value: &[char], kind: TokenKind) -> Self {
        Self {
            value: value.iter().collect(),
            kind,
        }
    }

    /// Uppercased value, for keyword comparisons.
    pub fn upper(&self) -> String {
        self.value.to_uppercase()
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }
}

const PUNCTUATION: &[char] = &['(', ')', ',', ';', '*'];
const COMPARISON: &[char] = &['=', '<', '>', '!'];
const ARITHMETIC: &[char] = &['+', '-', '/', '%'];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        let kind = if c.is_whitespace() {
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            TokenKind::Whitespace
        } else if c == '\'' || c == '"' {
            i += 1;
            while i < chars.len() && chars[i] != c {
                // A backslash swallows the next char, even a quote
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(chars.len());
            TokenKind::String
        } else if c == '`' {
            i += 1;
            while i < chars.len() && chars[i] != '`' {
                i += 1;
            }
            i = (i + 1).min(chars.len());
            TokenKind::Word
        } else if c.is_alphabetic() || c == '_' {
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            TokenKind::Word
        } else if c.is_ascii_digit() {
            let mut seen_dot = false;
            while i < chars.len() {
                match chars[i] {
                    d if d.is_ascii_digit() => i += 1,
                    '.' if !seen_dot => {
                        seen_dot = true;
                        i += 1;
                    }
                    _ => break,
                }
            }
            TokenKind::Number
        } else if PUNCTUATION.contains(&c) {
            i += 1;
            TokenKind::Punctuation
        } else if COMPARISON.contains(&c) {
            while i < chars.len() && COMPARISON.contains(&chars[i]) {
                i += 1;
            }
            TokenKind::Operator
        } else if ARITHMETIC.contains(&c) {
            i += 1;
            TokenKind::Operator
        } else {
            i += 1;
            TokenKind::Punctuation
        };

        tokens.push(Token::new(&chars[start..i], kind));
    }

    tokens
}

/// Tokens with whitespace removed, in input order.
pub fn significant_tokens(input: &str) -> Vec<Token> {
    tokenize(input)
        .into_iter()
        .filter(|t| t.kind != TokenKind::Whitespace)
        .collect()
}

/// The trailing run of word characters and backticks: the prefix the user
/// is in the middle of typing. Not necessarily a whole token.
pub fn last_incomplete_word(input: &str) -> &str {
    let start = input
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c) || *c == '`')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    &input[start..]
}
