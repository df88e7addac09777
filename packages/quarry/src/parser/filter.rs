//! Filter expression parsing
//!
//! Precedence climbing over the token stream. Logical negation binds
//! tighter than comparisons, comparisons tighter than `&&`, and `&&`
//! tighter than `||`. Membership operators sit between negation and
//! the comparisons. Compile-time well-typedness checks live here too.

use crate::filter::{
    ComparisonOp, FilterExpression, FilterPredicate, LogicalOp, MembershipOp, RegexLiteral,
};
use crate::functions::ExpressionType;
use crate::error::{JsonPathError, JsonPathResult};
use crate::tokens::{Token, TokenKind, TokenStream};

use super::Parser;

const PRECEDENCE_LOWEST: u8 = 1;
const PRECEDENCE_OR: u8 = 3;
const PRECEDENCE_AND: u8 = 4;
const PRECEDENCE_RELATIONAL: u8 = 5;
const PRECEDENCE_MEMBERSHIP: u8 = 6;
const PRECEDENCE_PREFIX: u8 = 7;

fn precedence(kind: TokenKind) -> u8 {
    match kind {
        TokenKind::Or => PRECEDENCE_OR,
        TokenKind::And => PRECEDENCE_AND,
        TokenKind::In | TokenKind::Contains => PRECEDENCE_MEMBERSHIP,
        kind if kind.is_comparison_operator() => PRECEDENCE_RELATIONAL,
        _ => PRECEDENCE_LOWEST,
    }
}

impl<'env> Parser<'env> {
    /// Parse the expression of a filter selector. `token` is the `?`
    /// or `~?` token, for error reporting.
    pub(crate) fn parse_filter(
        &self,
        stream: &mut TokenStream,
        token: &Token,
    ) -> JsonPathResult<FilterPredicate> {
        let expression = self.parse_filter_expression(stream, PRECEDENCE_LOWEST)?;

        if self.env.well_typed {
            if let FilterExpression::Function { name, .. } = &expression {
                if self.function_return_type(name) == Some(ExpressionType::Value) {
                    return Err(JsonPathError::typ(
                        format!("result of {name}() must be compared"),
                        token.clone(),
                    ));
                }
            }
        }

        Ok(FilterPredicate::new(expression))
    }

    fn parse_filter_expression(
        &self,
        stream: &mut TokenStream,
        min_precedence: u8,
    ) -> JsonPathResult<FilterExpression> {
        let mut left = self.parse_prefix(stream)?;

        loop {
            let kind = stream.current().kind;
            if !kind.is_binary_operator() || precedence(kind) < min_precedence {
                break;
            }
            left = self.parse_infix(stream, left)?;
        }

        Ok(left)
    }

    fn parse_prefix(&self, stream: &mut TokenStream) -> JsonPathResult<FilterExpression> {
        match stream.current().kind {
            TokenKind::True => {
                stream.next_token();
                Ok(FilterExpression::Boolean(true))
            }
            TokenKind::False => {
                stream.next_token();
                Ok(FilterExpression::Boolean(false))
            }
            TokenKind::Null => {
                stream.next_token();
                Ok(FilterExpression::Null)
            }
            TokenKind::Undefined => {
                self.reject_strict("undefined literals", stream.current())?;
                stream.next_token();
                Ok(FilterExpression::Undefined)
            }
            TokenKind::Int => {
                let token = stream.next_token();
                Ok(parse_number_literal(&token))
            }
            TokenKind::Float => {
                let token = stream.next_token();
                Ok(parse_number_literal(&token))
            }
            TokenKind::DoubleQuoteString | TokenKind::SingleQuoteString => {
                let token = stream.next_token();
                Ok(FilterExpression::Str(self.decode_string(&token)?))
            }
            TokenKind::RegexPattern => {
                self.reject_strict("regex literals", stream.current())?;
                self.parse_regex_literal(stream)
            }
            TokenKind::LBracket => {
                self.reject_strict("list literals", stream.current())?;
                self.parse_list_literal(stream)
            }
            TokenKind::LParen => self.parse_grouped(stream),
            TokenKind::Not => {
                stream.next_token();
                let inner = self.parse_filter_expression(stream, PRECEDENCE_PREFIX)?;
                Ok(FilterExpression::Not(Box::new(inner)))
            }
            TokenKind::Current => {
                stream.next_token();
                let segments = self.parse_segments(stream, true)?;
                Ok(FilterExpression::SelfQuery(crate::ast::Query::new(segments)))
            }
            TokenKind::Root => {
                stream.next_token();
                let segments = self.parse_segments(stream, true)?;
                Ok(FilterExpression::RootQuery(crate::ast::Query::new(segments)))
            }
            TokenKind::FilterContext => {
                self.reject_strict("filter context queries", stream.current())?;
                stream.next_token();
                let segments = self.parse_segments(stream, true)?;
                Ok(FilterExpression::ContextQuery(crate::ast::Query::new(
                    segments,
                )))
            }
            TokenKind::CurrentKey => {
                self.reject_strict("current key references", stream.current())?;
                stream.next_token();
                Ok(FilterExpression::CurrentKey)
            }
            TokenKind::Function => self.parse_function_call(stream),
            TokenKind::Eof | TokenKind::RBracket => Err(JsonPathError::syntax(
                "unexpected end of filter expression",
                stream.current().clone(),
            )),
            _ => Err(JsonPathError::syntax(
                format!("unexpected {}", stream.current()),
                stream.current().clone(),
            )),
        }
    }

    fn parse_infix(
        &self,
        stream: &mut TokenStream,
        left: FilterExpression,
    ) -> JsonPathResult<FilterExpression> {
        let token = stream.next_token();
        let right = self.parse_filter_expression(stream, precedence(token.kind) + 1)?;

        match token.kind {
            TokenKind::And => Ok(FilterExpression::Logical {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
            }),
            TokenKind::Or => Ok(FilterExpression::Logical {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
            }),
            TokenKind::In | TokenKind::Contains => {
                self.reject_strict("membership operators", &token)?;
                reject_nested_comparison(&left, &token)?;
                reject_nested_comparison(&right, &token)?;
                if self.env.well_typed {
                    self.check_singular_query(&left, &token)?;
                    self.check_singular_query(&right, &token)?;
                }
                let op = if token.kind == TokenKind::In {
                    MembershipOp::In
                } else {
                    MembershipOp::Contains
                };
                Ok(FilterExpression::Membership {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                })
            }
            TokenKind::ReMatch => {
                self.reject_strict("the '=~' operator", &token)?;
                reject_nested_comparison(&left, &token)?;
                reject_nested_comparison(&right, &token)?;
                if self.env.well_typed {
                    if !matches!(right, FilterExpression::Regex(_)) {
                        return Err(JsonPathError::typ(
                            "the right hand side of '=~' must be a regex literal",
                            token,
                        ));
                    }
                    self.check_comparable(&left, &token)?;
                }
                Ok(FilterExpression::Comparison {
                    left: Box::new(left),
                    op: ComparisonOp::Re,
                    right: Box::new(right),
                })
            }
            kind if kind.is_comparison_operator() => {
                if kind == TokenKind::Lg {
                    self.reject_strict("the '<>' operator", &token)?;
                }
                reject_nested_comparison(&left, &token)?;
                reject_nested_comparison(&right, &token)?;
                if self.env.well_typed {
                    self.check_comparable(&left, &token)?;
                    self.check_comparable(&right, &token)?;
                }
                let op = match kind {
                    TokenKind::Eq => ComparisonOp::Eq,
                    TokenKind::Ne | TokenKind::Lg => ComparisonOp::Ne,
                    TokenKind::Lt => ComparisonOp::Lt,
                    TokenKind::Le => ComparisonOp::Le,
                    TokenKind::Gt => ComparisonOp::Gt,
                    _ => ComparisonOp::Ge,
                };
                Ok(FilterExpression::Comparison {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                })
            }
            _ => Err(JsonPathError::syntax(
                format!("unexpected operator {token}"),
                token,
            )),
        }
    }

    fn parse_grouped(&self, stream: &mut TokenStream) -> JsonPathResult<FilterExpression> {
        stream.next_token();
        let expression = self.parse_filter_expression(stream, PRECEDENCE_LOWEST)?;
        if stream.current().kind == TokenKind::Eof {
            return Err(JsonPathError::syntax(
                "unbalanced parentheses",
                stream.current().clone(),
            ));
        }
        stream.expect(TokenKind::RParen)?;
        stream.next_token();
        Ok(expression)
    }

    fn parse_regex_literal(&self, stream: &mut TokenStream) -> JsonPathResult<FilterExpression> {
        let pattern_token = stream.next_token();
        stream.expect(TokenKind::RegexFlags)?;
        let flags_token = stream.next_token();

        let raw = pattern_token.text.clone();
        let source = raw.replace("\\/", "/");
        let mut builder = regex::RegexBuilder::new(&source);
        for flag in flags_token.text.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                _ => {
                    log::debug!("ignoring unsupported regex flag {flag:?}");
                }
            }
        }
        let pattern = builder.build().map_err(|err| {
            JsonPathError::typ(format!("invalid regex literal: {err}"), pattern_token.clone())
        })?;

        Ok(FilterExpression::Regex(RegexLiteral {
            pattern,
            raw,
            flags: flags_token.text,
        }))
    }

    /// A list literal: a bracketed, comma separated run of scalar
    /// literals, as used with `in` and `contains`.
    fn parse_list_literal(&self, stream: &mut TokenStream) -> JsonPathResult<FilterExpression> {
        stream.next_token();
        let mut items = Vec::new();

        loop {
            match stream.current().kind {
                TokenKind::RBracket => {
                    stream.next_token();
                    break;
                }
                TokenKind::Eof => {
                    return Err(JsonPathError::syntax(
                        "unexpected end of list literal",
                        stream.current().clone(),
                    ))
                }
                TokenKind::True => {
                    stream.next_token();
                    items.push(FilterExpression::Boolean(true));
                }
                TokenKind::False => {
                    stream.next_token();
                    items.push(FilterExpression::Boolean(false));
                }
                TokenKind::Null => {
                    stream.next_token();
                    items.push(FilterExpression::Null);
                }
                TokenKind::Int | TokenKind::Float => {
                    let token = stream.next_token();
                    items.push(parse_number_literal(&token));
                }
                TokenKind::DoubleQuoteString | TokenKind::SingleQuoteString => {
                    let token = stream.next_token();
                    items.push(FilterExpression::Str(self.decode_string(&token)?));
                }
                _ => {
                    return Err(JsonPathError::syntax(
                        format!("unexpected {} in list literal", stream.current()),
                        stream.current().clone(),
                    ))
                }
            }

            match stream.current().kind {
                TokenKind::Comma => {
                    stream.next_token();
                }
                TokenKind::RBracket => {}
                _ => {
                    return Err(JsonPathError::syntax(
                        format!("expected ',' or ']', found {}", stream.current()),
                        stream.current().clone(),
                    ))
                }
            }
        }

        Ok(FilterExpression::List(items))
    }

    fn parse_function_call(&self, stream: &mut TokenStream) -> JsonPathResult<FilterExpression> {
        let token = stream.next_token();
        let mut args = Vec::new();

        if stream.current().kind != TokenKind::RParen {
            loop {
                args.push(self.parse_filter_expression(stream, PRECEDENCE_LOWEST)?);
                match stream.current().kind {
                    TokenKind::Comma => {
                        stream.next_token();
                    }
                    TokenKind::RParen => break,
                    TokenKind::Eof => {
                        return Err(JsonPathError::syntax(
                            "unbalanced parentheses",
                            stream.current().clone(),
                        ))
                    }
                    _ => {
                        return Err(JsonPathError::syntax(
                            format!("unexpected {} in function call", stream.current()),
                            stream.current().clone(),
                        ))
                    }
                }
            }
        }
        stream.next_token();

        let Some(function) = self.env.function(&token.text) else {
            return Err(JsonPathError::name(
                format!("function {:?} is not defined", token.text),
                token,
            ));
        };
        function.validate(&args, &token)?;

        if self.env.well_typed {
            for (arg, declared) in args.iter().zip(function.arg_types().iter()) {
                self.check_function_argument(&token, arg, *declared)?;
            }
        }

        Ok(FilterExpression::Function {
            name: token.text,
            args,
        })
    }

    fn check_function_argument(
        &self,
        token: &Token,
        arg: &FilterExpression,
        declared: ExpressionType,
    ) -> JsonPathResult<()> {
        match declared {
            ExpressionType::Value => match arg {
                FilterExpression::SelfQuery(query)
                | FilterExpression::RootQuery(query)
                | FilterExpression::ContextQuery(query) => {
                    if !query.is_singular() {
                        return Err(JsonPathError::typ(
                            format!(
                                "{}() requires a singular query argument",
                                token.text
                            ),
                            token.clone(),
                        ));
                    }
                    Ok(())
                }
                FilterExpression::Function { name, .. } => {
                    if self.function_return_type(name) != Some(ExpressionType::Value) {
                        return Err(JsonPathError::typ(
                            format!("{name}() does not return a value", ),
                            token.clone(),
                        ));
                    }
                    Ok(())
                }
                FilterExpression::Logical { .. }
                | FilterExpression::Comparison { .. }
                | FilterExpression::Membership { .. }
                | FilterExpression::Not(_) => Err(JsonPathError::typ(
                    format!("{}() requires a value argument", token.text),
                    token.clone(),
                )),
                _ => Ok(()),
            },
            ExpressionType::Nodes => match arg {
                FilterExpression::SelfQuery(_)
                | FilterExpression::RootQuery(_)
                | FilterExpression::ContextQuery(_) => Ok(()),
                FilterExpression::Function { name, .. }
                    if self.function_return_type(name) == Some(ExpressionType::Nodes) =>
                {
                    Ok(())
                }
                _ => Err(JsonPathError::typ(
                    format!("{}() requires a query argument", token.text),
                    token.clone(),
                )),
            },
            ExpressionType::Logical => match arg {
                FilterExpression::Boolean(_)
                | FilterExpression::Null
                | FilterExpression::Undefined
                | FilterExpression::Int(_)
                | FilterExpression::Float(_)
                | FilterExpression::Str(_)
                | FilterExpression::Regex(_)
                | FilterExpression::List(_) => Err(JsonPathError::typ(
                    format!("{}() requires a test argument", token.text),
                    token.clone(),
                )),
                _ => Ok(()),
            },
        }
    }

    fn function_return_type(&self, name: &str) -> Option<ExpressionType> {
        self.env.function(name).map(|f| f.return_type())
    }

    /// Comparison operands must be value-typed: a literal, a singular
    /// query, or a function returning a value.
    fn check_comparable(&self, expr: &FilterExpression, token: &Token) -> JsonPathResult<()> {
        match expr {
            FilterExpression::SelfQuery(query)
            | FilterExpression::RootQuery(query)
            | FilterExpression::ContextQuery(query) => {
                if query.is_singular() {
                    Ok(())
                } else {
                    Err(JsonPathError::typ(
                        "non-singular query is not comparable",
                        token.clone(),
                    ))
                }
            }
            FilterExpression::Function { name, .. } => {
                if self.function_return_type(name) == Some(ExpressionType::Value) {
                    Ok(())
                } else {
                    Err(JsonPathError::typ(
                        format!("result of {name}() is not comparable"),
                        token.clone(),
                    ))
                }
            }
            FilterExpression::Logical { .. }
            | FilterExpression::Comparison { .. }
            | FilterExpression::Membership { .. }
            | FilterExpression::Not(_) => Err(JsonPathError::typ(
                "expression is not comparable",
                token.clone(),
            )),
            _ => Ok(()),
        }
    }

    fn check_singular_query(&self, expr: &FilterExpression, token: &Token) -> JsonPathResult<()> {
        match expr {
            FilterExpression::SelfQuery(query)
            | FilterExpression::RootQuery(query)
            | FilterExpression::ContextQuery(query) => {
                if query.is_singular() {
                    Ok(())
                } else {
                    Err(JsonPathError::typ(
                        "non-singular query is not comparable",
                        token.clone(),
                    ))
                }
            }
            _ => Ok(()),
        }
    }
}

/// Comparison and membership expressions are alternatives in the
/// grammar, never operands of one another, regardless of the
/// well-typedness setting.
fn reject_nested_comparison(expr: &FilterExpression, token: &Token) -> JsonPathResult<()> {
    if matches!(
        expr,
        FilterExpression::Comparison { .. } | FilterExpression::Membership { .. }
    ) {
        return Err(JsonPathError::syntax(
            "comparison expressions cannot be chained",
            token.clone(),
        ));
    }
    Ok(())
}

/// Parse an integer or float literal token. Integer text with an
/// exponent collapses to an integer when it is integral.
fn parse_number_literal(token: &Token) -> FilterExpression {
    if token.kind == TokenKind::Int && !token.text.contains(['e', 'E']) {
        if let Ok(value) = token.text.parse::<i64>() {
            return FilterExpression::Int(value);
        }
    }
    let value: f64 = token.text.parse().unwrap_or(f64::NAN);
    if value.is_finite() && value.fract() == 0.0 && token.kind == TokenKind::Int {
        FilterExpression::Int(value as i64)
    } else {
        FilterExpression::Float(value)
    }
}
