use crate::{
    ast::{
        ast::{
            ContainerKind, Identifier, IdentifierClass, Name, OperatorName, OperatorRef,
            SectionSide, Separator,
        },
        expressions::{NumberLiteral, NumberValue},
        runs::{Atom, ContainerBody, Run, RunItem},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Span,
};

use super::parser::Parser;

/// Which tokens end a run in the current position, beyond the ones that
/// always do (`;`, `,`, closing delimiters, `|`, `..`, `then`, `else`,
/// `where`, `otherwise`, declaration keywords, `:` and `EOF`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunContext {
    /// `=` ends the run instead of being the equality operator.
    pub stop_at_assignment: bool,
    /// A variable followed by `:` is not combined into a typed variable.
    pub stop_at_colon: bool,
    /// `if` after at least one item starts a guard.
    pub stop_at_guard: bool,
    /// `.` ends the run, for lambda parameter lists.
    pub stop_at_dot: bool,
}

impl RunContext {
    pub fn pattern() -> Self {
        RunContext {
            stop_at_assignment: true,
            stop_at_guard: true,
            ..Default::default()
        }
    }

    pub fn guarded() -> Self {
        RunContext {
            stop_at_guard: true,
            ..Default::default()
        }
    }

    pub fn with_colon(self) -> Self {
        RunContext {
            stop_at_colon: true,
            ..self
        }
    }
}

pub fn name_of(token: &Token) -> Name {
    let class = match token.kind {
        TokenKind::VariableIdentifier => IdentifierClass::Variable,
        _ => IdentifierClass::Function,
    };
    Name {
        text: token.value.clone(),
        class,
    }
}

pub fn identifier_of(token: &Token) -> Identifier {
    match &token.module {
        Some(module) => Identifier::Qualified(module.clone(), name_of(token)),
        None => Identifier::Unqualified(name_of(token)),
    }
}

pub fn parse_identifier(parser: &mut Parser, what: &str) -> Result<Identifier, Error> {
    if parser.current_token_kind().is_identifier() {
        let token = parser.advance().clone();
        Ok(identifier_of(&token))
    } else {
        Err(parser.unexpected(what))
    }
}

pub fn parse_unqualified_name(parser: &mut Parser, what: &str) -> Result<Name, Error> {
    let token = parser.current_token();
    if token.kind.is_identifier() && !token.is_qualified() {
        let token = parser.advance().clone();
        Ok(name_of(&token))
    } else {
        Err(parser.unexpected(what))
    }
}

pub fn parse_number(token: &Token) -> Result<NumberLiteral, Error> {
    let text = token.value.as_str();
    let error = || {
        Error::new(
            ErrorImpl::NumberParseError {
                token: text.to_string(),
            },
            token.span.clone(),
        )
    };

    let (radix, value) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let value = u128::from_str_radix(hex, 16).map_err(|_| error())?;
        (16, NumberValue::Integer(value))
    } else if text.contains(['.', 'e', 'E']) {
        let value = text.parse::<f64>().map_err(|_| error())?;
        (10, NumberValue::Float(value))
    } else if text.len() > 1 && text.starts_with('0') {
        let value = u128::from_str_radix(&text[1..], 8).map_err(|_| error())?;
        (8, NumberValue::Integer(value))
    } else {
        let value = text.parse::<u128>().map_err(|_| error())?;
        (10, NumberValue::Integer(value))
    };

    Ok(NumberLiteral {
        text: text.to_string(),
        radix,
        value,
    })
}

/// Tokens that stand for an operator inside a run.
pub fn is_operator_start(kind: TokenKind) -> bool {
    kind == TokenKind::OperatorSymbol || kind.is_keyword_operator() || kind.is_operator_punctuation()
}

/// Consumes one operator, joining `and then` and `or else`.
pub fn parse_operator(parser: &mut Parser) -> OperatorRef {
    let token = parser.advance().clone();

    let follower = match token.kind {
        TokenKind::And => Some((TokenKind::Then, "and then")),
        TokenKind::Or => Some((TokenKind::Else, "or else")),
        _ => None,
    };

    if let Some((next, symbol)) = follower {
        if parser.current_token_kind() == next {
            let second = parser.advance().clone();
            return OperatorRef {
                name: OperatorName::new(symbol),
                span: token.span.to(&second.span),
            };
        }
    }

    OperatorRef {
        name: OperatorName {
            symbol: token.value,
            module: token.module,
        },
        span: token.span,
    }
}

fn run_span(items: &[RunItem], fallback: &Span) -> Span {
    match (items.first(), items.last()) {
        (Some(first), Some(last)) => first.get_span().to(last.get_span()),
        _ => fallback.clone(),
    }
}

/// Collects a flat run of atoms and operators up to the first token that
/// cannot continue it. Nesting is left to resolution.
pub fn parse_run(parser: &mut Parser, ctx: RunContext) -> Result<Run, Error> {
    let start = Span::point(parser.get_position());
    let mut items: Vec<RunItem> = vec![];

    loop {
        let token = parser.current_token().clone();

        match token.kind {
            TokenKind::VariableIdentifier | TokenKind::FunctionIdentifier => {
                parser.advance();

                let typed = token.kind == TokenKind::VariableIdentifier
                    && !token.is_qualified()
                    && !ctx.stop_at_colon
                    && parser.current_token_kind() == TokenKind::Colon
                    && parser.peek_kind(1).is_identifier();

                if typed {
                    parser.advance();
                    let type_token = parser.advance().clone();
                    items.push(RunItem::Atom(Atom::TypedVar {
                        var: name_of(&token),
                        type_ident: identifier_of(&type_token),
                        span: token.span.to(&type_token.span),
                    }));
                } else {
                    items.push(RunItem::Atom(Atom::Ident {
                        ident: identifier_of(&token),
                        span: token.span,
                    }));
                }
            }
            TokenKind::Var => {
                parser.advance();
                let ident = parse_identifier(parser, "identifier after `var`")?;
                items.push(RunItem::Atom(Atom::VarDecl {
                    ident,
                    span: parser.span_from(&token.span.start),
                }));
            }
            TokenKind::Number => {
                parser.advance();
                let literal = parse_number(&token)?;
                items.push(RunItem::Atom(Atom::Number {
                    literal,
                    span: token.span,
                }));
            }
            TokenKind::String => {
                parser.advance();
                items.push(RunItem::Atom(Atom::String {
                    value: token.value,
                    span: token.span,
                }));
            }
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenCurly => {
                items.push(RunItem::Atom(parse_container(parser)?));
            }
            TokenKind::Backslash => {
                items.push(RunItem::Atom(parse_lambda(parser, ctx)?));
            }
            TokenKind::If => {
                if ctx.stop_at_guard && !items.is_empty() {
                    break;
                }
                parse_conditional(parser, ctx, &mut items)?;
            }
            TokenKind::Assignment if ctx.stop_at_assignment => break,
            TokenKind::Dot if ctx.stop_at_dot => break,
            // `\X.-X`: the lexer glued the `.` onto the body's operator.
            TokenKind::OperatorSymbol
                if ctx.stop_at_dot && token.module.is_none() && token.value.starts_with('.') =>
            {
                parser.split_current(1);
                break;
            }
            TokenKind::Error => return Err(parser.unexpected("expression")),
            kind if is_operator_start(kind) => {
                let op = parse_operator(parser);
                items.push(RunItem::Operator(op));
            }
            _ => break,
        }
    }

    let span = run_span(&items, &start);
    Ok(Run { items, span })
}

/// `if c then t [else e]`. With `else` the conditional is pushed as a
/// prefix item and the rest of the run is its else branch; without it the
/// then-branch items follow inline.
fn parse_conditional(
    parser: &mut Parser,
    ctx: RunContext,
    items: &mut Vec<RunItem>,
) -> Result<(), Error> {
    let start = parser.advance().span.clone();
    let condition = parse_run(parser, RunContext::default())?;
    parser.expect(TokenKind::Then)?;
    let then_branch = parse_run(parser, ctx)?;

    if parser.current_token_kind() == TokenKind::Else {
        let else_token = parser.advance().clone();
        items.push(RunItem::Conditional {
            condition,
            then_branch: Some(then_branch),
            span: start.to(&else_token.span),
        });
    } else {
        items.push(RunItem::Conditional {
            condition,
            then_branch: None,
            span: Span::new(start.start.clone(), then_branch.span.start.clone()),
        });
        items.extend(then_branch.items);
    }

    Ok(())
}

fn parse_lambda(parser: &mut Parser, ctx: RunContext) -> Result<Atom, Error> {
    let start = parser.advance().span.start.clone();

    let params = parse_run(
        parser,
        RunContext {
            stop_at_dot: true,
            ..Default::default()
        },
    )?;
    parser.expect(TokenKind::Dot)?;

    let body = parse_run(
        parser,
        RunContext {
            stop_at_dot: false,
            ..ctx
        },
    )?;

    Ok(Atom::Lambda {
        params: params.items,
        body,
        span: parser.span_from(&start),
    })
}

fn closing_spelling(close: TokenKind) -> &'static str {
    match close {
        TokenKind::CloseParen => ")",
        TokenKind::CloseBracket => "]",
        _ => "}",
    }
}

fn close_error(parser: &mut Parser, close: TokenKind) -> Error {
    let token = parser.current_token().clone();
    match token.kind {
        TokenKind::EOF | TokenKind::Error => parser.unexpected(closing_spelling(close)),
        _ => Error::new(
            ErrorImpl::MismatchedDelimiter {
                expected: closing_spelling(close).to_string(),
                found: token.qualified_value(),
            },
            token.span,
        ),
    }
}

fn expect_close(parser: &mut Parser, close: TokenKind) -> Result<(), Error> {
    if parser.accept(close) {
        Ok(())
    } else {
        Err(close_error(parser, close))
    }
}

/// Parses `( .. )`, `[ .. ]` or `{ .. }`. The token after the first element
/// decides the shape: `,`/`;` element list, `..` enumeration, `:`
/// comprehension, `|` tail.
pub fn parse_container(parser: &mut Parser) -> Result<Atom, Error> {
    let open = parser.advance().clone();
    let (kind, close) = match open.kind {
        TokenKind::OpenParen => (ContainerKind::Paren, TokenKind::CloseParen),
        TokenKind::OpenBracket => (ContainerKind::Bracket, TokenKind::CloseBracket),
        _ => (ContainerKind::Brace, TokenKind::CloseCurly),
    };

    if parser.accept(close) {
        return Ok(Atom::Container {
            kind,
            body: ContainerBody::Empty,
            span: parser.span_from(&open.span.start),
        });
    }

    let first = parse_run(parser, RunContext::default().with_colon())?;

    let current = parser.current_token_kind();
    let body = match current {
        TokenKind::DotDot => parse_enumeration(parser, vec![first], close)?,
        TokenKind::Colon => {
            parser.advance();
            let generators = parse_generators(parser)?;
            ContainerBody::Comprehension {
                template: first,
                generators,
            }
        }
        TokenKind::Comma | TokenKind::Semicolon => parse_elements(parser, first, close)?,
        TokenKind::Pipe => {
            parser.advance();
            let tail = parse_run(parser, RunContext::default())?;
            ContainerBody::Elements {
                items: vec![first],
                separator: None,
                trailing: false,
                tail: Some(tail),
            }
        }
        _ if current == close => ContainerBody::Elements {
            items: vec![first],
            separator: None,
            trailing: false,
            tail: None,
        },
        _ => return Err(close_error(parser, close)),
    };

    expect_close(parser, close)?;
    let span = parser.span_from(&open.span.start);

    if kind == ContainerKind::Paren {
        if let ContainerBody::Elements {
            items,
            separator: None,
            trailing: false,
            tail: None,
        } = &body
        {
            if let [run] = items.as_slice() {
                if let Some(atom) = operator_form(run, &span) {
                    return Ok(atom);
                }
            }
        }
    }

    Ok(Atom::Container { kind, body, span })
}

/// `(op)`, `(op x)` and `(x op)` for operator symbols. Alphabetic operators
/// are only known from the table and are recognized during resolution.
fn operator_form(run: &Run, span: &Span) -> Option<Atom> {
    match run.items.as_slice() {
        [RunItem::Operator(op)] => Some(Atom::OperatorLiteral {
            op: op.clone(),
            span: span.clone(),
        }),
        [RunItem::Operator(op), rest @ ..] => Some(Atom::Section {
            op: op.clone(),
            operand: Run {
                items: rest.to_vec(),
                span: run_span(rest, span),
            },
            side: SectionSide::LeftHole,
            span: span.clone(),
        }),
        [rest @ .., RunItem::Operator(op)] => Some(Atom::Section {
            op: op.clone(),
            operand: Run {
                items: rest.to_vec(),
                span: run_span(rest, span),
            },
            side: SectionSide::RightHole,
            span: span.clone(),
        }),
        _ => None,
    }
}

fn parse_elements(parser: &mut Parser, first: Run, close: TokenKind) -> Result<ContainerBody, Error> {
    let separator_kind = parser.current_token_kind();
    let (separator, other) = match separator_kind {
        TokenKind::Comma => (Separator::Comma, TokenKind::Semicolon),
        _ => (Separator::Semicolon, TokenKind::Comma),
    };

    let mut items = vec![first];
    let mut trailing = false;
    let mut tail = None;

    loop {
        let kind = parser.current_token_kind();

        if kind == separator_kind {
            parser.advance();
            if parser.current_token_kind() == close {
                trailing = true;
                break;
            }
            items.push(parse_run(parser, RunContext::default())?);
        } else if kind == other {
            return Err(Error::new(
                ErrorImpl::MixedSeparators,
                parser.current_token().span.clone(),
            ));
        } else if kind == TokenKind::DotDot {
            return parse_enumeration(parser, items, close);
        } else if kind == TokenKind::Pipe {
            parser.advance();
            tail = Some(parse_run(parser, RunContext::default())?);
            break;
        } else {
            break;
        }
    }

    Ok(ContainerBody::Elements {
        items,
        separator: Some(separator),
        trailing,
        tail,
    })
}

fn parse_enumeration(
    parser: &mut Parser,
    items: Vec<Run>,
    close: TokenKind,
) -> Result<ContainerBody, Error> {
    let dots = parser.advance().clone();

    if items.iter().any(Run::is_empty) {
        return Err(Error::new(ErrorImpl::MalformedEnumeration, dots.span));
    }

    let bound = if parser.current_token_kind() == close {
        None
    } else {
        Some(parse_run(parser, RunContext::default())?)
    };

    Ok(ContainerBody::Enumeration { items, bound })
}

fn parse_generators(parser: &mut Parser) -> Result<Vec<Run>, Error> {
    let mut generators = vec![parse_run(parser, RunContext::default())?];
    let mut separator: Option<TokenKind> = None;

    while matches!(
        parser.current_token_kind(),
        TokenKind::Comma | TokenKind::Semicolon
    ) {
        let kind = parser.current_token_kind();
        match separator {
            Some(previous) if previous != kind => {
                return Err(Error::new(
                    ErrorImpl::MixedSeparators,
                    parser.current_token().span.clone(),
                ))
            }
            _ => separator = Some(kind),
        }
        parser.advance();
        generators.push(parse_run(parser, RunContext::default())?);
    }

    Ok(generators)
}
