//! JSONPath tokenization
//!
//! A hand-written scanner producing the token stream consumed by the
//! parser. The identifiers with configurable text (root, current node,
//! filter context, current key, keys selector, pseudo root, union,
//! intersection) are matched longest first, so one configured token may
//! be a prefix of another. A configured token set to the empty string
//! is disabled.

mod numbers;
mod strings;

use crate::env::Environment;
use crate::error::{JsonPathError, JsonPathResult};
use crate::tokens::{Token, TokenKind};

/// Tokenize JSONPath query strings for one environment.
pub struct Lexer<'env> {
    env: &'env Environment,
    /// Configured identifier tokens, longest text first.
    configured: Vec<(String, TokenKind)>,
}

impl<'env> Lexer<'env> {
    #[must_use]
    pub fn new(env: &'env Environment) -> Self {
        let mut configured: Vec<(String, TokenKind)> = [
            (env.root_token.clone(), TokenKind::Root),
            (env.pseudo_root_token.clone(), TokenKind::PseudoRoot),
            (env.self_token.clone(), TokenKind::Current),
            (env.context_token.clone(), TokenKind::FilterContext),
            (env.key_token.clone(), TokenKind::CurrentKey),
            (env.keys_token.clone(), TokenKind::Keys),
            (env.union_token.clone(), TokenKind::Union),
            (env.intersection_token.clone(), TokenKind::Intersect),
        ]
        .into_iter()
        .filter(|(text, _)| !text.is_empty())
        .collect();
        configured.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        Self { env, configured }
    }

    /// Produce the token stream for `query`.
    ///
    /// The returned stream always ends with an EOF token.
    pub fn tokenize(&self, query: &str) -> JsonPathResult<Vec<Token>> {
        let mut scanner = Scanner::new(query);
        let mut tokens = Vec::new();

        while !scanner.at_end() {
            if scanner.skip_whitespace() {
                continue;
            }
            self.next_token(&mut scanner, &mut tokens)?;
        }

        tokens.push(Token::eof(scanner.pos, scanner.line, scanner.column));
        Ok(tokens)
    }

    fn next_token(&self, scanner: &mut Scanner, tokens: &mut Vec<Token>) -> JsonPathResult<()> {
        // Fixed multi-character operators take priority so that `&&`
        // and `||` are never split by the configured `&`/`|` tokens.
        const TWO_CHAR: [(&str, TokenKind); 8] = [
            ("..", TokenKind::DoubleDot),
            ("==", TokenKind::Eq),
            ("!=", TokenKind::Ne),
            ("<>", TokenKind::Lg),
            ("<=", TokenKind::Le),
            (">=", TokenKind::Ge),
            ("=~", TokenKind::ReMatch),
            ("&&", TokenKind::And),
        ];

        for (text, kind) in TWO_CHAR {
            if scanner.matches(text) {
                let token = scanner.take(text.chars().count(), kind);
                tokens.push(token);
                return Ok(());
            }
        }
        if scanner.matches("||") {
            tokens.push(scanner.take(2, TokenKind::Or));
            return Ok(());
        }

        // Configured identifiers, longest first.
        for (text, kind) in &self.configured {
            if scanner.matches(text) {
                // Word-shaped configured tokens must not swallow the
                // head of a longer bare name.
                if text.chars().all(is_name_char) {
                    let after = scanner.peek_at(text.chars().count());
                    if after.is_some_and(is_name_char) {
                        continue;
                    }
                }
                let mut token = scanner.take(text.chars().count(), *kind);
                // The keys selector directly followed by `?` is the
                // keys filter selector.
                if *kind == TokenKind::Keys && scanner.peek() == Some('?') {
                    scanner.bump();
                    token.kind = TokenKind::KeysFilter;
                    token.text.push('?');
                }
                tokens.push(token);
                return Ok(());
            }
        }

        let ch = match scanner.peek() {
            Some(ch) => ch,
            None => return Ok(()),
        };

        match ch {
            '.' => tokens.push(scanner.take(1, TokenKind::Dot)),
            '[' => tokens.push(scanner.take(1, TokenKind::LBracket)),
            ']' => tokens.push(scanner.take(1, TokenKind::RBracket)),
            '(' => tokens.push(scanner.take(1, TokenKind::LParen)),
            ')' => tokens.push(scanner.take(1, TokenKind::RParen)),
            ',' => tokens.push(scanner.take(1, TokenKind::Comma)),
            ':' => tokens.push(scanner.take(1, TokenKind::Colon)),
            '?' => tokens.push(scanner.take(1, TokenKind::Question)),
            '*' => tokens.push(scanner.take(1, TokenKind::Wild)),
            '<' => tokens.push(scanner.take(1, TokenKind::Lt)),
            '>' => tokens.push(scanner.take(1, TokenKind::Gt)),
            '!' => tokens.push(scanner.take(1, TokenKind::Not)),
            '\'' | '"' => tokens.push(strings::scan_string(scanner)?),
            '/' => strings::scan_regex(scanner, tokens)?,
            '-' => {
                if scanner.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    tokens.push(numbers::scan_number(scanner));
                } else {
                    return Err(unexpected(scanner, ch));
                }
            }
            _ if ch.is_ascii_digit() => tokens.push(numbers::scan_number(scanner)),
            _ if is_name_start(ch) => self.scan_word(scanner, tokens),
            _ => return Err(unexpected(scanner, ch)),
        }

        Ok(())
    }

    fn scan_word(&self, scanner: &mut Scanner, tokens: &mut Vec<Token>) {
        let start = scanner.mark();
        let mut word = String::new();
        while let Some(ch) = scanner.peek() {
            if is_name_char(ch) {
                word.push(ch);
                scanner.bump();
            } else {
                break;
            }
        }

        let kind = if word == self.env.and_word {
            TokenKind::And
        } else if word == self.env.or_word {
            TokenKind::Or
        } else if word == self.env.not_word {
            TokenKind::Not
        } else {
            match word.as_str() {
                "in" => TokenKind::In,
                "contains" => TokenKind::Contains,
                "true" | "True" => TokenKind::True,
                "false" | "False" => TokenKind::False,
                "null" | "Null" | "nil" | "Nil" | "none" | "None" => TokenKind::Null,
                "undefined" | "missing" => TokenKind::Undefined,
                _ => {
                    // A name directly followed by `(` is a function
                    // call; the open parenthesis is consumed here.
                    if scanner.peek() == Some('(') {
                        scanner.bump();
                        tokens.push(scanner.token_at(start, TokenKind::Function, word));
                        return;
                    }
                    TokenKind::BareName
                }
            }
        };

        tokens.push(scanner.token_at(start, kind, word));
    }
}

fn unexpected(scanner: &Scanner, ch: char) -> JsonPathError {
    JsonPathError::syntax(
        format!("unexpected character {ch:?}"),
        Token::new(
            TokenKind::Eof,
            ch.to_string(),
            scanner.pos,
            scanner.line,
            scanner.column,
        ),
    )
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch as u32 >= 0x80
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch as u32 >= 0x80
}

/// Character cursor with line and column tracking.
pub(crate) struct Scanner {
    pub(crate) chars: Vec<char>,
    pub(crate) pos: usize,
    pub(crate) line: u32,
    pub(crate) column: u32,
}

/// A saved scanner position, used to stamp tokens that were scanned
/// over several characters.
#[derive(Clone, Copy)]
pub(crate) struct Mark {
    pos: usize,
    line: u32,
    column: u32,
}

impl Scanner {
    fn new(query: &str) -> Self {
        Self {
            chars: query.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn matches(&self, text: &str) -> bool {
        let mut offset = 0;
        for ch in text.chars() {
            if self.peek_at(offset) != Some(ch) {
                return false;
            }
            offset += 1;
        }
        !text.is_empty()
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
            self.bump();
            skipped = true;
        }
        skipped
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Consume `count` characters and return them as a token.
    fn take(&mut self, count: usize, kind: TokenKind) -> Token {
        let start = self.mark();
        let mut text = String::with_capacity(count);
        for _ in 0..count {
            if let Some(ch) = self.bump() {
                text.push(ch);
            }
        }
        self.token_at(start, kind, text)
    }

    pub(crate) fn token_at(&self, start: Mark, kind: TokenKind, text: String) -> Token {
        Token::new(kind, text, start.pos, start.line, start.column)
    }
}
