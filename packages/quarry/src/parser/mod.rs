//! The JSONPath parser
//!
//! Recursive descent over the token stream, producing [`Segment`]s and
//! [`Selector`]s. Filter expressions are parsed by the sibling
//! [`filter`] module with precedence climbing. Strict mode rejects the
//! non-standard selectors and tolerant forms; `well_typed` enables
//! compile-time checks of filter expressions.

mod filter;

use crate::ast::{Query, Segment, Selector};
use crate::env::Environment;
use crate::error::{JsonPathError, JsonPathResult};
use crate::tokens::{Token, TokenKind, TokenStream};
use crate::unescape;

/// A JSONPath parser bound to an [`Environment`].
pub struct Parser<'env> {
    pub(crate) env: &'env Environment,
}

/// A parsed top-level query and whether it was rooted at the pseudo
/// root identifier.
#[derive(Debug)]
pub struct ParsedQuery {
    pub query: Query,
    pub pseudo_root: bool,
}

impl<'env> Parser<'env> {
    #[must_use]
    pub fn new(env: &'env Environment) -> Self {
        Self { env }
    }

    /// Parse one query from the stream, stopping at EOF or a compound
    /// operator.
    pub fn parse(&self, stream: &mut TokenStream) -> JsonPathResult<ParsedQuery> {
        let mut pseudo_root = false;
        match stream.current().kind {
            TokenKind::Root => {
                stream.next_token();
            }
            TokenKind::PseudoRoot => {
                self.reject_strict("pseudo root queries", stream.current())?;
                stream.next_token();
                pseudo_root = true;
            }
            _ => {
                // The root identifier is prepended silently outside
                // strict mode.
                if self.env.strict {
                    return Err(JsonPathError::syntax(
                        "expected the root identifier",
                        stream.current().clone(),
                    ));
                }
            }
        }

        let segments = self.parse_segments(stream, false)?;

        match stream.current().kind {
            TokenKind::Eof | TokenKind::Union | TokenKind::Intersect => Ok(ParsedQuery {
                query: Query::new(segments),
                pseudo_root,
            }),
            _ => Err(JsonPathError::syntax(
                format!("unexpected token {}", stream.current()),
                stream.current().clone(),
            )),
        }
    }

    /// Parse a run of segments, stopping at the first token that cannot
    /// start one. Consumes everything it recognises.
    pub(crate) fn parse_segments(
        &self,
        stream: &mut TokenStream,
        in_filter: bool,
    ) -> JsonPathResult<Vec<Segment>> {
        let mut segments = Vec::new();

        loop {
            match stream.current().kind {
                TokenKind::Dot => {
                    stream.next_token();
                    // `.[...]` is tolerated outside strict mode.
                    if stream.current().kind == TokenKind::LBracket && !self.env.strict {
                        segments.push(Segment::Child(self.parse_bracketed(stream)?));
                    } else {
                        segments.push(Segment::Child(vec![self.parse_shorthand(stream)?]));
                    }
                }
                TokenKind::DoubleDot => {
                    let token = stream.next_token();
                    segments.push(self.parse_descendant(stream, &token)?);
                }
                TokenKind::LBracket => {
                    segments.push(Segment::Child(self.parse_bracketed(stream)?));
                }
                // Tolerated shorthand without a leading dot.
                TokenKind::BareName if !self.env.strict => {
                    let token = stream.next_token();
                    segments.push(Segment::Child(vec![Selector::Name(token.text)]));
                }
                TokenKind::Wild if !self.env.strict => {
                    stream.next_token();
                    segments.push(Segment::Child(vec![Selector::Wild]));
                }
                TokenKind::Keys if !self.env.strict && !in_filter => {
                    stream.next_token();
                    segments.push(Segment::Child(vec![self.parse_key_or_keys(stream)?]));
                }
                _ => break,
            }
        }

        Ok(segments)
    }

    /// A shorthand selector following `.` or `..`.
    fn parse_shorthand(&self, stream: &mut TokenStream) -> JsonPathResult<Selector> {
        match stream.current().kind {
            TokenKind::BareName => {
                let token = stream.next_token();
                Ok(Selector::Name(token.text))
            }
            TokenKind::Wild => {
                stream.next_token();
                Ok(Selector::Wild)
            }
            TokenKind::Keys => {
                self.reject_strict("the keys selector", stream.current())?;
                stream.next_token();
                self.parse_key_or_keys(stream)
            }
            TokenKind::Int => {
                self.reject_strict("dotted index shorthand", stream.current())?;
                let token = stream.next_token();
                self.check_leading_zero(&token)?;
                Ok(Selector::Index(self.parse_index(&token)?))
            }
            _ => Err(JsonPathError::syntax(
                format!(
                    "unexpected {} after '.'",
                    stream.current().kind.describe()
                ),
                stream.current().clone(),
            )),
        }
    }

    /// The keys selector, or the key selector when a name follows.
    fn parse_key_or_keys(&self, stream: &mut TokenStream) -> JsonPathResult<Selector> {
        match stream.current().kind {
            TokenKind::BareName => {
                let token = stream.next_token();
                Ok(Selector::Key(token.text))
            }
            TokenKind::SingleQuoteString | TokenKind::DoubleQuoteString => {
                let token = stream.next_token();
                Ok(Selector::Key(self.decode_string(&token)?))
            }
            _ => Ok(Selector::Keys),
        }
    }

    fn parse_descendant(
        &self,
        stream: &mut TokenStream,
        token: &Token,
    ) -> JsonPathResult<Segment> {
        match stream.current().kind {
            TokenKind::LBracket => Ok(Segment::Descendant(self.parse_bracketed(stream)?)),
            TokenKind::BareName | TokenKind::Wild | TokenKind::Keys | TokenKind::Int => {
                Ok(Segment::Descendant(vec![self.parse_shorthand(stream)?]))
            }
            _ => {
                // A bare trailing `..` is recursion to every value.
                self.reject_strict("a bare descendant segment", token)?;
                Ok(Segment::Descendant(vec![Selector::Wild]))
            }
        }
    }

    /// A comma separated, bracketed selector list. The opening bracket
    /// is current when called; the closing bracket is consumed.
    pub(crate) fn parse_bracketed(
        &self,
        stream: &mut TokenStream,
    ) -> JsonPathResult<Vec<Selector>> {
        let open = stream.next_token();
        let mut items: Vec<Selector> = Vec::new();

        loop {
            match stream.current().kind {
                TokenKind::RBracket => {
                    stream.next_token();
                    break;
                }
                TokenKind::Eof => {
                    return Err(JsonPathError::syntax(
                        "unexpected end of query",
                        stream.current().clone(),
                    ))
                }
                _ => {
                    items.push(self.parse_selector(stream)?);
                    match stream.current().kind {
                        TokenKind::Comma => {
                            let comma = stream.next_token();
                            if stream.current().kind == TokenKind::RBracket {
                                self.reject_strict("a trailing comma", &comma)?;
                            }
                        }
                        TokenKind::RBracket => {}
                        _ => {
                            return Err(JsonPathError::syntax(
                                format!(
                                    "expected ',' or ']', found {}",
                                    stream.current().kind.describe()
                                ),
                                stream.current().clone(),
                            ))
                        }
                    }
                }
            }
        }

        if items.is_empty() {
            return Err(JsonPathError::syntax("empty bracketed segment", open));
        }
        Ok(items)
    }

    /// One selector inside a bracketed list.
    fn parse_selector(&self, stream: &mut TokenStream) -> JsonPathResult<Selector> {
        match stream.current().kind {
            TokenKind::Int => {
                if stream.peek().kind == TokenKind::Colon {
                    return self.parse_slice(stream);
                }
                let token = stream.next_token();
                self.check_leading_zero(&token)?;
                Ok(Selector::Index(self.parse_index(&token)?))
            }
            TokenKind::Colon => self.parse_slice(stream),
            TokenKind::DoubleQuoteString | TokenKind::SingleQuoteString => {
                let token = stream.next_token();
                Ok(Selector::Name(self.decode_string(&token)?))
            }
            TokenKind::BareName => {
                self.reject_strict("unquoted name selectors", stream.current())?;
                let token = stream.next_token();
                Ok(Selector::Name(token.text))
            }
            TokenKind::Wild => {
                stream.next_token();
                Ok(Selector::Wild)
            }
            TokenKind::Keys => {
                self.reject_strict("the keys selector", stream.current())?;
                stream.next_token();
                self.parse_key_or_keys(stream)
            }
            TokenKind::KeysFilter => {
                self.reject_strict("the keys filter selector", stream.current())?;
                let token = stream.next_token();
                let predicate = self.parse_filter(stream, &token)?;
                Ok(Selector::KeysFilter(predicate))
            }
            TokenKind::Question => {
                let token = stream.next_token();
                let predicate = self.parse_filter(stream, &token)?;
                Ok(Selector::Filter(predicate))
            }
            TokenKind::Root => {
                self.reject_strict("embedded singular queries", stream.current())?;
                let token = stream.next_token();
                let segments = self.parse_segments(stream, true)?;
                let query = Query::new(segments);
                if !query.is_singular() {
                    return Err(JsonPathError::syntax(
                        "embedded query must be singular",
                        token,
                    ));
                }
                Ok(Selector::SingularQuery(query))
            }
            _ => Err(JsonPathError::syntax(
                format!(
                    "unexpected {} in bracketed selection",
                    stream.current().kind.describe()
                ),
                stream.current().clone(),
            )),
        }
    }

    /// A slice selector. The first integer, when present, is current.
    fn parse_slice(&self, stream: &mut TokenStream) -> JsonPathResult<Selector> {
        let mut start = None;
        let mut stop = None;
        let mut step = None;

        if stream.current().kind == TokenKind::Int {
            let token = stream.next_token();
            start = Some(self.parse_index(&token)?);
        }
        stream.expect(TokenKind::Colon)?;
        stream.next_token();

        if stream.current().kind == TokenKind::Int {
            let token = stream.next_token();
            stop = Some(self.parse_index(&token)?);
        }

        if stream.current().kind == TokenKind::Colon {
            stream.next_token();
            if stream.current().kind == TokenKind::Int {
                let token = stream.next_token();
                step = Some(self.parse_index(&token)?);
            }
        }

        if stream.current().kind == TokenKind::Colon {
            return Err(JsonPathError::syntax(
                "too many colons in slice",
                stream.current().clone(),
            ));
        }

        Ok(Selector::Slice { start, stop, step })
    }

    /// Parse an index selector literal, enforcing the environment's
    /// integer range.
    fn parse_index(&self, token: &Token) -> JsonPathResult<i64> {
        let value = if token.text.contains(['e', 'E']) {
            let float: f64 = token
                .text
                .parse()
                .map_err(|_| JsonPathError::index("malformed integer literal", token.clone()))?;
            if float.fract() != 0.0 || !float.is_finite() {
                return Err(JsonPathError::index(
                    "malformed integer literal",
                    token.clone(),
                ));
            }
            float as i64
        } else {
            token
                .text
                .parse::<i64>()
                .map_err(|_| JsonPathError::index("index out of range", token.clone()))?
        };

        if value < self.env.min_int_index || value > self.env.max_int_index {
            return Err(JsonPathError::index("index out of range", token.clone()));
        }
        Ok(value)
    }

    fn check_leading_zero(&self, token: &Token) -> JsonPathResult<()> {
        let digits = token.text.strip_prefix('-').unwrap_or(&token.text);
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(JsonPathError::syntax(
                "leading zero in index selector",
                token.clone(),
            ));
        }
        Ok(())
    }

    /// Decode a quoted string token, honouring `unicode_escape`.
    pub(crate) fn decode_string(&self, token: &Token) -> JsonPathResult<String> {
        if self.env.strict && token.text.chars().any(|c| (c as u32) < 0x20) {
            return Err(JsonPathError::syntax(
                "invalid character in string literal",
                token.clone(),
            ));
        }
        if !self.env.unicode_escape {
            return Ok(token.text.clone());
        }
        let quote = if token.kind == TokenKind::SingleQuoteString {
            '\''
        } else {
            '"'
        };
        unescape::decode_string(&token.text, quote)
            .map_err(|msg| JsonPathError::syntax(msg, token.clone()))
    }

    pub(crate) fn reject_strict(&self, feature: &str, token: &Token) -> JsonPathResult<()> {
        if self.env.strict {
            Err(JsonPathError::syntax(
                format!("{feature} are not allowed in strict mode"),
                token.clone(),
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Segment, Selector};
    use crate::env::Environment;
    use crate::lexer::Lexer;

    fn parse(query: &str) -> JsonPathResult<Query> {
        let env = Environment::new();
        let lexer = Lexer::new(&env);
        let mut stream = TokenStream::new(lexer.tokenize(query)?);
        Parser::new(&env).parse(&mut stream).map(|p| p.query)
    }

    #[test]
    fn shorthand_and_bracketed_agree() {
        assert_eq!(parse("$.a['b']").expect("parse").segments, vec![
            Segment::Child(vec![Selector::Name("a".to_string())]),
            Segment::Child(vec![Selector::Name("b".to_string())]),
        ]);
    }

    #[test]
    fn descendant_wildcard() {
        let query = parse("$..*").expect("parse");
        assert_eq!(
            query.segments,
            vec![Segment::Descendant(vec![Selector::Wild])]
        );
    }

    #[test]
    fn slice_defaults() {
        let query = parse("$[1:-1:2]").expect("parse");
        assert_eq!(
            query.segments,
            vec![Segment::Child(vec![Selector::Slice {
                start: Some(1),
                stop: Some(-1),
                step: Some(2),
            }])]
        );
        assert!(parse("$[1:2:3:4]").is_err());
    }

    #[test]
    fn multiple_selectors_keep_order() {
        let query = parse("$[0, 'a', *]").expect("parse");
        assert_eq!(
            query.segments,
            vec![Segment::Child(vec![
                Selector::Index(0),
                Selector::Name("a".to_string()),
                Selector::Wild,
            ])]
        );
    }

    #[test]
    fn empty_brackets_are_an_error() {
        assert!(parse("$[]").is_err());
    }

    #[test]
    fn leading_zero_is_an_error() {
        assert!(parse("$[01]").is_err());
    }

    #[test]
    fn huge_index_is_an_index_error() {
        let err = parse("$[9007199254740992]").expect_err("out of range");
        assert_eq!(err.kind, crate::error::ErrorKind::Index);
    }

    #[test]
    fn missing_root_is_prepended() {
        assert_eq!(
            parse("users.name").expect("parse"),
            parse("$.users.name").expect("parse")
        );
    }

    #[test]
    fn canonical_form_reparses() {
        for text in [
            "$.users[?@.score < 100].name",
            "$..['products'][?@.price < $.cap]",
            "$[1:9:2, 'a', *, ~'k']",
            "$[?match(#, '^ab.*') && length(@) > 0]",
        ] {
            let first = parse(text).expect("parse");
            let second = parse(&first.to_string()).expect("reparse");
            assert_eq!(first, second, "canonical text: {first}");
        }
    }
}
