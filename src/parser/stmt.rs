use std::collections::BTreeSet;

use crate::{
    ast::{
        ast::{Identifier, OperatorName},
        expressions::NumberValue,
        statements::{
            Binding, Condition, Declaration, Definition, EquationClause, Header, HeaderName,
            ImportKind, Modifier, ModuleName, ModuleSpec, Parameter, PrecedenceSpec, Qualifier,
            Scope, Sign, Statement, SymbolName, SymbolSpec, TypeDefinition, TypeSection,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Position,
};

use super::{
    lookups::MAX_PRECEDENCE,
    parser::Parser,
    run::{
        is_operator_start, name_of, parse_identifier, parse_number,
        parse_operator, parse_run, parse_unqualified_name, RunContext,
    },
};

/// What a statement handler produced. Continuation clauses are attached to
/// the equation before them by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStmt {
    Statement(Statement),
    Clause(EquationClause),
}

impl From<Declaration> for ParsedStmt {
    fn from(declaration: Declaration) -> Self {
        ParsedStmt::Statement(Statement::Declaration(declaration))
    }
}

impl From<Definition> for ParsedStmt {
    fn from(definition: Definition) -> Self {
        ParsedStmt::Statement(Statement::Definition(definition))
    }
}

pub fn parse_stmt(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    let kind = parser.current_token_kind();
    if let Some(handler) = parser.get_stmt_lookup().get(&kind).copied() {
        return handler(parser);
    }

    parse_equation(parser)
}

fn parse_prefix(parser: &mut Parser) -> (Option<Scope>, BTreeSet<Modifier>) {
    let scope = match parser.current_token_kind() {
        TokenKind::Private => Some(Scope::Private),
        TokenKind::Public => Some(Scope::Public),
        _ => None,
    };
    if scope.is_some() {
        parser.advance();
    }

    let mut modifiers = BTreeSet::new();
    loop {
        let modifier = match parser.current_token_kind() {
            TokenKind::Const => Modifier::Const,
            TokenKind::Special => Modifier::Special,
            TokenKind::Extern => Modifier::Extern,
            TokenKind::Var => Modifier::Var,
            TokenKind::Virtual => Modifier::Virtual,
            _ => break,
        };
        parser.advance();
        modifiers.insert(modifier);
    }

    (scope, modifiers)
}

/// `[scope] [modifiers] headers;` or a `type` declaration behind a scope or
/// `extern`.
pub fn parse_prefixed_decl(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    let start = parser.get_position();
    let (scope, modifiers) = parse_prefix(parser);

    if parser.current_token_kind() == TokenKind::Type {
        let is_extern = match modifiers.len() {
            0 => false,
            1 if modifiers.contains(&Modifier::Extern) => true,
            _ => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: String::from("type"),
                        message: String::from("only `extern` may precede a type declaration"),
                    },
                    parser.current_token().span.clone(),
                ))
            }
        };
        return parse_type_body(parser, start, scope, is_extern);
    }

    let headers = parse_headers(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Declaration::OperatorHeader {
        scope,
        modifiers,
        headers,
        span: parser.span_from(&start),
    }
    .into())
}

/// Comma-separated headers. Each one is applied to the table before the
/// next is read; the driver rolls the table back if the statement fails.
fn parse_headers(parser: &mut Parser) -> Result<Vec<Header>, Error> {
    let mut headers = vec![];

    loop {
        let header = parse_header(parser)?;
        parser.table_mut().declare(&header)?;
        headers.push(header);

        if !parser.accept(TokenKind::Comma) {
            break;
        }
    }

    Ok(headers)
}

fn parse_header(parser: &mut Parser) -> Result<Header, Error> {
    let start = parser.get_position();

    if parser.accept(TokenKind::OpenParen) {
        let name = parse_operator_name(parser)?;
        parser.expect(TokenKind::CloseParen)?;
        let params = parse_params(parser);

        let precedence = if parser.accept(TokenKind::At) {
            Some(parse_precedence(parser)?)
        } else {
            None
        };
        let alias = parse_alias(parser)?;

        return Ok(Header::Symbol {
            name: HeaderName::Operator(name),
            params,
            precedence,
            alias,
            span: parser.span_from(&start),
        });
    }

    let ident = parse_identifier(parser, "name in declaration")?;

    if parser.current_token_kind() == TokenKind::Assignment {
        let name = match ident {
            Identifier::Unqualified(name) => name,
            Identifier::Qualified(..) => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: ident.to_string(),
                        message: String::from("a qualified name cannot be bound"),
                    },
                    parser.span_from(&start),
                ))
            }
        };
        parser.advance();

        let run = parse_run(parser, RunContext::default())?;
        let value = parser.resolve(run);

        return Ok(Header::Binding {
            name,
            value,
            span: parser.span_from(&start),
        });
    }

    let params = parse_params(parser);
    let alias = parse_alias(parser)?;

    Ok(Header::Symbol {
        name: HeaderName::Identifier(ident),
        params,
        precedence: None,
        alias,
        span: parser.span_from(&start),
    })
}

/// The symbol between the parentheses of an operator header.
fn parse_operator_name(parser: &mut Parser) -> Result<OperatorName, Error> {
    let token = parser.current_token().clone();

    if token.kind == TokenKind::FunctionIdentifier {
        parser.advance();
        return Ok(OperatorName {
            symbol: token.value,
            module: token.module,
        });
    }

    if is_operator_start(token.kind) {
        return Ok(parse_operator(parser).name);
    }

    Err(parser.unexpected("operator symbol"))
}

fn parse_params(parser: &mut Parser) -> Vec<Parameter> {
    let mut params = vec![];

    loop {
        let special = parser.current_token_kind() == TokenKind::Tilde;
        let offset = usize::from(special);
        let token = parser.peek(offset);

        if token.kind != TokenKind::VariableIdentifier || token.is_qualified() {
            break;
        }

        let name = name_of(token);
        for _ in 0..=offset {
            parser.advance();
        }
        params.push(Parameter { name, special });
    }

    params
}

fn parse_precedence(parser: &mut Parser) -> Result<PrecedenceSpec, Error> {
    if parser.accept(TokenKind::OpenParen) {
        let name = parse_operator_name(parser)?;
        parser.expect(TokenKind::CloseParen)?;
        return Ok(PrecedenceSpec::SameAs(name));
    }

    let token = parser.expect(TokenKind::Number)?;
    let literal = parse_number(&token)?;

    match literal.value {
        NumberValue::Integer(level) if level <= u128::from(MAX_PRECEDENCE) => {
            Ok(PrecedenceSpec::Level(level as u8))
        }
        _ => Err(Error::new(
            ErrorImpl::InvalidPrecedence {
                value: token.value,
            },
            token.span,
        )),
    }
}

/// `as name` or `as op`.
fn parse_alias(parser: &mut Parser) -> Result<Option<String>, Error> {
    if !parser.accept(TokenKind::As) {
        return Ok(None);
    }

    let token = parser.current_token().clone();
    if token.kind.is_identifier() && !token.is_qualified() {
        parser.advance();
        return Ok(Some(token.value));
    }
    if is_operator_start(token.kind) {
        return Ok(Some(parse_operator(parser).name.qualified()));
    }

    Err(parser.unexpected("alias"))
}

pub fn parse_type_decl(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    let start = parser.get_position();
    parse_type_body(parser, start, None, false)
}

fn parse_type_body(
    parser: &mut Parser,
    start: Position,
    scope: Option<Scope>,
    is_extern: bool,
) -> Result<ParsedStmt, Error> {
    parser.expect(TokenKind::Type)?;
    let ident = parse_identifier(parser, "type name")?;

    let name = match ident {
        Identifier::Qualified(..) => {
            let alias = if parser.accept(TokenKind::As) {
                Some(parse_unqualified_name(parser, "type alias")?)
            } else {
                None
            };
            parser.expect(TokenKind::Semicolon)?;

            return Ok(Declaration::TypeRename {
                scope,
                name: ident,
                alias,
                span: parser.span_from(&start),
            }
            .into());
        }
        Identifier::Unqualified(name) => name,
    };

    if parser.accept(TokenKind::Equals) {
        let target = parse_identifier(parser, "type name")?;
        parser.expect(TokenKind::Semicolon)?;

        return Ok(Declaration::TypeSynonym {
            scope,
            name,
            target,
            span: parser.span_from(&start),
        }
        .into());
    }

    let supertype = if parser.accept(TokenKind::Colon) {
        Some(parse_identifier(parser, "supertype name")?)
    } else {
        None
    };

    let mut sections = vec![];
    if parser.accept(TokenKind::Assignment) {
        loop {
            let section_start = parser.get_position();
            let (scope, modifiers) = parse_prefix(parser);
            let headers = parse_headers(parser)?;
            sections.push(TypeSection {
                scope,
                modifiers,
                headers,
                span: parser.span_from(&section_start),
            });

            if !parser.accept(TokenKind::Pipe) {
                break;
            }
        }
    }

    parser.expect(TokenKind::Semicolon)?;

    let definition = TypeDefinition {
        scope,
        name,
        supertype,
        sections,
    };
    let span = parser.span_from(&start);

    Ok(if is_extern {
        Declaration::ExternTypeDecl { definition, span }
    } else {
        Declaration::TypeDecl { definition, span }
    }
    .into())
}

fn parse_module_spec(parser: &mut Parser) -> Result<ModuleSpec, Error> {
    let start = parser.get_position();
    let token = parser.current_token().clone();

    let module = match token.kind {
        TokenKind::String => ModuleName::Path(token.value),
        kind if kind.is_identifier() && !token.is_qualified() => {
            ModuleName::Identifier(token.value)
        }
        _ => return Err(parser.unexpected("module name")),
    };
    parser.advance();

    let alias = if parser.accept(TokenKind::As) {
        Some(parse_unqualified_name(parser, "module alias")?)
    } else {
        None
    };

    Ok(ModuleSpec {
        module,
        alias,
        span: parser.span_from(&start),
    })
}

fn import_kind(parser: &mut Parser) -> Result<ImportKind, Error> {
    match parser.current_token_kind() {
        TokenKind::Import => {
            parser.advance();
            Ok(ImportKind::Import)
        }
        TokenKind::Include => {
            parser.advance();
            Ok(ImportKind::Include)
        }
        _ => Err(parser.unexpected("`import` or `include`")),
    }
}

/// `import M [as A], "path" [as B];`
pub fn parse_import(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    let start = parser.get_position();
    let kind = import_kind(parser)?;

    let mut specs = vec![parse_module_spec(parser)?];
    while parser.accept(TokenKind::Comma) {
        specs.push(parse_module_spec(parser)?);
    }
    parser.expect(TokenKind::Semicolon)?;

    Ok(Declaration::Import {
        kind,
        specs,
        span: parser.span_from(&start),
    }
    .into())
}

fn parse_symbol_name(parser: &mut Parser) -> Result<SymbolName, Error> {
    let token = parser.current_token().clone();

    if token.kind.is_identifier() && !token.is_qualified() {
        parser.advance();
        return Ok(SymbolName::Identifier(name_of(&token)));
    }
    if parser.accept(TokenKind::OpenParen) {
        let name = parse_operator_name(parser)?;
        parser.expect(TokenKind::CloseParen)?;
        return Ok(SymbolName::Operator(name.qualified()));
    }
    if is_operator_start(token.kind) {
        return Ok(SymbolName::Operator(parse_operator(parser).name.qualified()));
    }

    Err(parser.unexpected("imported symbol"))
}

/// `from M import [sym [as alias], ...];`
pub fn parse_qualified_import(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    let start = parser.advance().span.start.clone();
    let module = parse_module_spec(parser)?;
    let kind = import_kind(parser)?;

    let mut symbols = vec![];
    if parser.current_token_kind() != TokenKind::Semicolon {
        loop {
            let symbol_start = parser.get_position();
            let symbol = parse_symbol_name(parser)?;
            let alias = if parser.accept(TokenKind::As) {
                Some(parse_symbol_name(parser)?)
            } else {
                None
            };
            symbols.push(SymbolSpec {
                symbol,
                alias,
                span: parser.span_from(&symbol_start),
            });

            if !parser.accept(TokenKind::Comma) {
                break;
            }
        }
    }
    parser.expect(TokenKind::Semicolon)?;

    Ok(Declaration::QualifiedImport {
        module,
        kind,
        symbols,
        span: parser.span_from(&start),
    }
    .into())
}

/// `@ [+|-] n [;]`
pub fn parse_pragma(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    let start = parser.advance().span.start.clone();

    let token = parser.current_token();
    let sign = match (token.kind, token.value.as_str()) {
        (TokenKind::OperatorSymbol, "+") => Some(Sign::Plus),
        (TokenKind::OperatorSymbol, "-") => Some(Sign::Minus),
        _ => None,
    };
    if sign.is_some() {
        parser.advance();
    }

    let token = parser.expect(TokenKind::Number)?;
    let value = parse_number(&token)?;
    parser.accept(TokenKind::Semicolon);

    Ok(Declaration::PrecedencePragma {
        sign,
        value,
        span: parser.span_from(&start),
    }
    .into())
}

/// `def pattern = value, ...;`
pub fn parse_def(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    let start = parser.advance().span.start.clone();

    let mut pairs = vec![];
    loop {
        let run = parse_run(
            parser,
            RunContext {
                stop_at_assignment: true,
                ..Default::default()
            },
        )?;
        let pattern = parser.resolve(run);
        parser.expect(TokenKind::Assignment)?;
        let run = parse_run(parser, RunContext::default())?;
        let value = parser.resolve(run);
        pairs.push(Binding { pattern, value });

        if !parser.accept(TokenKind::Comma) {
            break;
        }
    }
    parser.expect(TokenKind::Semicolon)?;

    Ok(Definition::DefAlias {
        pairs,
        span: parser.span_from(&start),
    }
    .into())
}

/// `undef name, ...;`
pub fn parse_undef(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    let start = parser.advance().span.start.clone();

    let mut names = vec![parse_identifier(parser, "name to undefine")?];
    while parser.accept(TokenKind::Comma) {
        names.push(parse_identifier(parser, "name to undefine")?);
    }
    parser.expect(TokenKind::Semicolon)?;

    Ok(Definition::Undef {
        names,
        span: parser.span_from(&start),
    }
    .into())
}

pub fn parse_equation(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    let start = parser.get_position();

    let run = parse_run(parser, RunContext::pattern())?;
    if run.is_empty() {
        return Err(parser.unexpected("declaration or equation"));
    }
    let lhs = parser.resolve(run);
    let clause = parse_clause(parser, start.clone())?;

    Ok(Definition::Equation {
        lhs,
        clauses: vec![clause],
        span: parser.span_from(&start),
    }
    .into())
}

/// `= rhs [qualifiers];` optionally preceded by `qualifiers :`.
pub fn parse_continuation(parser: &mut Parser) -> Result<ParsedStmt, Error> {
    if !parser.previous_was_equation() {
        return Err(Error::new(
            ErrorImpl::OrphanContinuation,
            parser.current_token().span.clone(),
        ));
    }

    let start = parser.get_position();
    Ok(ParsedStmt::Clause(parse_clause(parser, start)?))
}

fn parse_clause(parser: &mut Parser, start: Position) -> Result<EquationClause, Error> {
    let leading_qualifiers = if matches!(
        parser.current_token_kind(),
        TokenKind::If | TokenKind::Otherwise | TokenKind::Where
    ) {
        let qualifiers = parse_qualifiers(parser, true)?;
        parser.expect(TokenKind::Colon)?;
        qualifiers
    } else {
        vec![]
    };

    parser.expect(TokenKind::Assignment)?;
    let run = parse_run(parser, RunContext::guarded())?;
    let rhs = parser.resolve(run);

    let trailing_qualifiers = parse_qualifiers(parser, false)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(EquationClause {
        leading_qualifiers,
        rhs,
        trailing_qualifiers,
        span: parser.span_from(&start),
    })
}

/// Guards and `where` groups. Leading qualifiers end at the `:` before `=`.
fn parse_qualifiers(parser: &mut Parser, leading: bool) -> Result<Vec<Qualifier>, Error> {
    let ctx = if leading {
        RunContext::guarded().with_colon()
    } else {
        RunContext::guarded()
    };

    let mut qualifiers = vec![];
    loop {
        let start = parser.get_position();

        match parser.current_token_kind() {
            TokenKind::If => {
                parser.advance();
                let run = parse_run(parser, ctx)?;
                let condition = parser.resolve(run);
                qualifiers.push(Qualifier::Condition {
                    condition: Condition::If(condition),
                    span: parser.span_from(&start),
                });
            }
            TokenKind::Otherwise => {
                parser.advance();
                qualifiers.push(Qualifier::Condition {
                    condition: Condition::Otherwise,
                    span: parser.span_from(&start),
                });
            }
            TokenKind::Where => {
                parser.advance();
                let bindings = parse_bindings(parser, ctx)?;
                qualifiers.push(Qualifier::Where {
                    bindings,
                    span: parser.span_from(&start),
                });
            }
            _ => break,
        }
    }

    Ok(qualifiers)
}

fn parse_bindings(parser: &mut Parser, ctx: RunContext) -> Result<Vec<Binding>, Error> {
    let mut bindings = vec![];

    loop {
        let run = parse_run(
            parser,
            RunContext {
                stop_at_assignment: true,
                ..ctx
            },
        )?;
        let pattern = parser.resolve(run);
        parser.expect(TokenKind::Assignment)?;
        let run = parse_run(parser, ctx)?;
        let value = parser.resolve(run);
        bindings.push(Binding { pattern, value });

        if !parser.accept(TokenKind::Comma) {
            break;
        }
    }

    Ok(bindings)
}

