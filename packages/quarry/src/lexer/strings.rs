//! String and regex literal tokenization
//!
//! Quoted strings are captured raw, without their quotes; escape
//! sequences are decoded later by the parser, which knows whether
//! UTF-16 escape handling is enabled.

use crate::error::{JsonPathError, JsonPathResult};
use crate::tokens::{Token, TokenKind};

use super::Scanner;

/// Scan a single or double quoted string literal.
pub(super) fn scan_string(scanner: &mut Scanner) -> JsonPathResult<Token> {
    let start = scanner.mark();
    let quote = scanner.bump().unwrap_or('"');
    let kind = if quote == '"' {
        TokenKind::DoubleQuoteString
    } else {
        TokenKind::SingleQuoteString
    };

    let mut body = String::new();
    loop {
        match scanner.peek() {
            None => {
                return Err(JsonPathError::syntax(
                    "unterminated string literal",
                    scanner.token_at(start, kind, body),
                ))
            }
            Some(ch) if ch == quote => {
                scanner.bump();
                return Ok(scanner.token_at(start, kind, body));
            }
            Some('\\') => {
                // Keep the escape sequence verbatim; decoding happens
                // in the parser. A trailing backslash before the quote
                // still consumes the next character so an escaped
                // quote does not terminate the literal.
                body.push('\\');
                scanner.bump();
                match scanner.bump() {
                    Some(next) => body.push(next),
                    None => {
                        return Err(JsonPathError::syntax(
                            "unterminated string literal",
                            scanner.token_at(start, kind, body),
                        ))
                    }
                }
            }
            Some(ch) => {
                body.push(ch);
                scanner.bump();
            }
        }
    }
}

/// Scan a `/pattern/flags` regex literal, pushing a pattern token and a
/// (possibly empty) flags token.
pub(super) fn scan_regex(scanner: &mut Scanner, tokens: &mut Vec<Token>) -> JsonPathResult<()> {
    let start = scanner.mark();
    scanner.bump(); // opening slash

    let mut pattern = String::new();
    loop {
        match scanner.peek() {
            None => {
                return Err(JsonPathError::syntax(
                    "unterminated regex literal",
                    scanner.token_at(start, TokenKind::RegexPattern, pattern),
                ))
            }
            Some('/') => {
                scanner.bump();
                break;
            }
            Some('\\') => {
                pattern.push('\\');
                scanner.bump();
                if let Some(next) = scanner.bump() {
                    pattern.push(next);
                }
            }
            Some(ch) => {
                pattern.push(ch);
                scanner.bump();
            }
        }
    }

    tokens.push(scanner.token_at(start, TokenKind::RegexPattern, pattern));

    let flags_start = scanner.mark();
    let mut flags = String::new();
    while let Some(ch) = scanner.peek() {
        if matches!(ch, 'a' | 'i' | 'm' | 's') {
            flags.push(ch);
            scanner.bump();
        } else {
            break;
        }
    }
    tokens.push(scanner.token_at(flags_start, TokenKind::RegexFlags, flags));

    Ok(())
}
