//! Numeric literal tokenization.

use crate::tokens::{Token, TokenKind};

use super::Scanner;

/// Scan an integer or float literal, optional exponent included.
///
/// A `.` followed by a name character is left alone so that the dot
/// reads as a child segment rather than a truncated fraction.
pub(super) fn scan_number(scanner: &mut Scanner) -> Token {
    let start = scanner.mark();
    let mut text = String::new();

    if scanner.peek() == Some('-') {
        text.push('-');
        scanner.bump();
    }
    push_digits(scanner, &mut text);

    let mut kind = TokenKind::Int;
    if scanner.peek() == Some('.') {
        let after = scanner.peek_at(1);
        let is_fraction = match after {
            Some(ch) => ch.is_ascii_digit() || ch == 'e' || ch == 'E',
            None => true,
        };
        if is_fraction {
            kind = TokenKind::Float;
            text.push('.');
            scanner.bump();
            push_digits(scanner, &mut text);
        }
    }

    if matches!(scanner.peek(), Some('e' | 'E')) {
        let mut offset = 1;
        if matches!(scanner.peek_at(1), Some('+' | '-')) {
            offset = 2;
        }
        if scanner.peek_at(offset).is_some_and(|c| c.is_ascii_digit()) {
            for _ in 0..offset {
                if let Some(ch) = scanner.bump() {
                    text.push(ch);
                }
            }
            push_digits(scanner, &mut text);
        }
    }

    scanner.token_at(start, kind, text)
}

fn push_digits(scanner: &mut Scanner, text: &mut String) {
    while let Some(ch) = scanner.peek() {
        if ch.is_ascii_digit() {
            text.push(ch);
            scanner.bump();
        } else {
            break;
        }
    }
}
