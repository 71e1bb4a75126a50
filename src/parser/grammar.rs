//! Action parser implementation using chumsky
//!
//! Each action body is parsed on its own into an [`Action`]; the builder then
//! assembles actions and literal text into nested blocks.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::document::Scalar;
use crate::error::ParseError;
use crate::parser::ast::*;
use crate::parser::lexer::{self, Token, VariableToken};

/// One action, before `if`/`range` blocks are matched with their `end`
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    If(Spanned<Expr>),
    ElseIf(Spanned<Expr>),
    Else,
    End,
    Range {
        index_var: Option<Spanned<Identifier>>,
        value_var: Option<Spanned<Identifier>>,
        source: Spanned<Expr>,
    },
    Declare {
        name: Spanned<Identifier>,
        value: Spanned<Expr>,
    },
    Assign {
        name: Spanned<Identifier>,
        value: Spanned<Expr>,
    },
    Output(Spanned<Expr>),
}

/// Parse one action body
///
/// `body_start` is the byte offset of `body` in the template and `span`
/// covers the whole action including delimiters.
pub fn parse_action(
    body: &str,
    body_start: usize,
    span: Span,
    max_nesting: usize,
) -> Result<Action, ParseError> {
    let tokens = lexer::lex_action(body, body_start)?;
    if tokens.is_empty() {
        return Err(ParseError::syntax(span, "empty action"));
    }
    check_paren_depth(&tokens, max_nesting)?;

    let eoi = body_start + body.len();
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((eoi..eoi).into(), |(t, s): (_, _)| (t, s));

    action_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| match errs.into_iter().next() {
            Some(err) => err.into(),
            None => ParseError::syntax(span, "invalid action"),
        })
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn field_chain(target: Spanned<Expr>, path: Vec<String>) -> Expr {
    Expr::Field {
        target: Box::new(target),
        path: path.into_iter().map(Identifier::new).collect(),
    }
}

fn check_paren_depth(tokens: &[(Token, Span)], max_nesting: usize) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for (tok, span) in tokens {
        match tok {
            Token::ParenOpen => {
                depth += 1;
                if depth > max_nesting {
                    return Err(ParseError::syntax(
                        span.clone(),
                        format!("parentheses nested deeper than {}", max_nesting),
                    ));
                }
            }
            Token::ParenClose | Token::ParenCloseChain(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn action_parser<'a, I>() -> impl Parser<'a, I, Action, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let expr = recursive(|expr| {
        let literal = select! {
            Token::True => Scalar::Bool(true),
            Token::False => Scalar::Bool(false),
            Token::Int(n) => Scalar::Int(n),
            Token::Float(x) => Scalar::Float(x),
            Token::String(s) => Scalar::String(s),
        }
        .map(Expr::Literal);

        let dot = just(Token::Dot).to(Expr::Dot);

        // `.a.b` is a chain rooted at the current value
        let field = select! {
            Token::Field(path) => path,
        }
        .map_with(|path, e| field_chain(Spanned::new(Expr::Dot, span_range(&e.span())), path));

        // `$x` or `$x.a.b`
        let variable = select! {
            Token::Variable(var) => var,
        }
        .map_with(|var: VariableToken, e| {
            let base = Expr::Var(Identifier::new(var.name));
            if var.path.is_empty() {
                base
            } else {
                field_chain(Spanned::new(base, span_range(&e.span())), var.path)
            }
        });

        // `(expr)` optionally followed by a field chain: `(index .a 0).name`
        let parenthesized = just(Token::ParenOpen)
            .ignore_then(expr.clone())
            .then(choice((
                just(Token::ParenClose).to(Vec::new()),
                select! { Token::ParenCloseChain(path) => path },
            )))
            .map(|(inner, path): (Spanned<Expr>, Vec<String>)| {
                if path.is_empty() {
                    inner.node
                } else {
                    field_chain(inner, path)
                }
            });

        let operand = choice((parenthesized, field, variable, dot, literal))
            .map_with(|expr, e| Spanned::new(expr, span_range(&e.span())));

        let index = just(Token::Index)
            .ignore_then(operand.clone())
            .then(operand.clone().repeated().at_least(1).collect::<Vec<_>>())
            .map(|(target, indices)| Expr::Index {
                target: Box::new(target),
                indices,
            });

        let logical = choice((
            just(Token::And).to(BoolOp::And),
            just(Token::Or).to(BoolOp::Or),
        ))
        .then(operand.clone().repeated().at_least(2).collect::<Vec<_>>())
        .map(|(op, operands)| Expr::Bool { op, operands });

        let not = just(Token::Not)
            .ignore_then(operand.clone())
            .map(|operand| Expr::Bool {
                op: BoolOp::Not,
                operands: vec![operand],
            });

        let compare = choice((
            just(Token::Eq).to(CompareOp::Eq),
            just(Token::Ne).to(CompareOp::Ne),
        ))
        .then(operand.clone())
        .then(operand.clone())
        .map(|((op, left), right)| Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        });

        choice((
            index,
            logical,
            not,
            compare,
            operand.map(|o: Spanned<Expr>| o.node),
        ))
        .map_with(|expr, e| Spanned::new(expr, span_range(&e.span())))
        .boxed()
    });

    // A declarable name: `$x`, never the root `$` and never a field chain
    let variable_name = select! {
        Token::Variable(var) => var,
    }
    .try_map(|var: VariableToken, span: SimpleSpan| {
        if var.name == "$" || !var.path.is_empty() {
            Err(Rich::custom(span, "expected a variable name such as '$x'"))
        } else {
            Ok(Spanned::new(Identifier::new(var.name), span_range(&span)))
        }
    });

    let if_action = just(Token::If).ignore_then(expr.clone()).map(Action::If);

    let else_action = just(Token::Else)
        .ignore_then(just(Token::If).ignore_then(expr.clone()).or_not())
        .map(|test| match test {
            Some(test) => Action::ElseIf(test),
            None => Action::Else,
        });

    let end_action = just(Token::End).to(Action::End);

    // `$v :=` or `$i, $v :=`
    let range_vars = variable_name
        .clone()
        .then(just(Token::Comma).ignore_then(variable_name.clone()).or_not())
        .then_ignore(just(Token::Declare))
        .map(|(first, second)| match second {
            Some(value) => (Some(first), Some(value)),
            None => (None, Some(first)),
        });

    let range_action = just(Token::Range)
        .ignore_then(range_vars.or_not())
        .then(expr.clone())
        .map(|(vars, source)| {
            let (index_var, value_var) = vars.unwrap_or((None, None));
            Action::Range {
                index_var,
                value_var,
                source,
            }
        });

    let declare = variable_name
        .clone()
        .then_ignore(just(Token::Declare))
        .then(expr.clone())
        .map(|(name, value)| Action::Declare { name, value });

    let assign = variable_name
        .then_ignore(just(Token::Assign))
        .then(expr.clone())
        .map(|(name, value)| Action::Assign { name, value });

    // Note: Order matters! Keyword actions first, then the variable forms,
    // and a bare expression last since `$x` alone is also an expression.
    choice((
        if_action,
        else_action,
        end_action,
        range_action,
        declare,
        assign,
        expr.map(Action::Output),
    ))
    .then_ignore(end())
}
