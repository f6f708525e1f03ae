//! Parser implementation for building the Abstract Syntax Tree.
//!
//! This module contains the main Parser struct and the statement driver.
//! Declarations and definitions are parsed with a fixed grammar through a
//! lookup of statement handlers keyed by the leading token; expression
//! positions are collected as flat runs and resolved against the live
//! precedence table as soon as they are complete.
//!
//! The parser maintains:
//! - The statement handler lookup
//! - The unit's precedence table, mutated by operator headers
//! - The diagnostics gathered so far

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tracing::{debug, trace};

use crate::{
    ast::{
        expressions::Expr,
        runs::Run,
        statements::{Definition, Script, Statement},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{operator_kind, Token, TokenKind},
    Position, Span, MK_TOKEN,
};

use super::{
    lookups::{create_token_lookups, PrecedenceTable, StmtHandler, StmtLookup},
    resolve::resolve_run,
    stmt::{parse_stmt, ParsedStmt},
};

/// How a unit reacts to its first diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Report, resynchronize at the next `;`, keep going.
    #[default]
    Batch,
    /// Stop at the first diagnostic.
    FailFast,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub mode: ParseMode,
    /// Checked between statements; once set the parse stops.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ParseOptions {
    pub fn fail_fast() -> Self {
        ParseOptions {
            mode: ParseMode::FailFast,
            cancel: None,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// The main parser structure that maintains parsing state.
///
/// This struct holds the token stream, the statement lookup and the
/// precedence table of the unit being parsed. It tracks the current
/// position in the token stream and provides methods for token consumption.
pub struct Parser {
    /// The list of tokens to parse, always terminated by `EOF`
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// The name of the source file being parsed
    file: Arc<String>,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// Operator fixities as declared up to the current statement
    table: PrecedenceTable,
    /// Lexical diagnostics keyed by the index of their error token
    lex_errors: BTreeMap<usize, Error>,
    diagnostics: Vec<Error>,
    previous_was_equation: bool,
    cancelled: bool,
}

impl Parser {
    /// Creates a new Parser instance.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Vector of tokens to parse
    /// * `lex_errors` - Lexical diagnostics for the `Error` tokens in `tokens`
    /// * `file` - Shared string containing the source file name
    pub fn new(mut tokens: Vec<Token>, lex_errors: BTreeMap<usize, Error>, file: Arc<String>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::EOF) {
            let end = tokens
                .last()
                .map(|t| t.span.end.clone())
                .unwrap_or_else(|| Position(0, Arc::clone(&file)));
            tokens.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), Span::point(end)));
        }

        Parser {
            tokens,
            pos: 0,
            file,
            stmt_lookup: StmtLookup::new(),
            table: PrecedenceTable::new(),
            lex_errors,
            diagnostics: vec![],
            previous_was_equation: false,
            cancelled: false,
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        self.peek(0)
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Returns the token `offset` places ahead, clamped to `EOF`.
    pub fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    pub fn peek_kind(&self, offset: usize) -> TokenKind {
        self.peek(offset).kind
    }

    /// Advances to the next token and returns the previous token.
    /// The cursor never moves past `EOF`.
    pub fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.tokens[index].kind != TokenKind::EOF {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    /// Builds the diagnostic for the current token not being what the
    /// grammar requires. Lexical error tokens yield their own diagnostic.
    pub fn unexpected(&mut self, expected: &str) -> Error {
        let token = self.current_token().clone();
        match token.kind {
            TokenKind::Error => match self.lex_errors.remove(&self.pos) {
                Some(error) => error,
                None => Error::new(ErrorImpl::UnrecognisedToken { token: token.value }, token.span),
            },
            TokenKind::EOF => Error::new(
                ErrorImpl::UnexpectedEof {
                    expected: expected.to_string(),
                },
                token.span,
            ),
            _ => Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: token.qualified_value(),
                    message: format!("expected {}", expected),
                },
                token.span,
            ),
        }
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        if self.current_token_kind() != expected_kind {
            match error {
                Some(error) if self.current_token_kind() != TokenKind::Error => Err(error),
                _ => Err(self.unexpected(&format!("{}", expected_kind))),
            }
        } else {
            Ok(self.advance().clone())
        }
    }

    /// Expects a token of the specified kind with default error message.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Consumes the current token if it has the given kind.
    pub fn accept(&mut self, kind: TokenKind) -> bool {
        if self.current_token_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Splits the current operator token after `at` bytes, e.g. `.-` into
    /// `.` and `-`. Both halves are reclassified.
    pub fn split_current(&mut self, at: usize) {
        let token = self.current_token().clone();
        if at == 0 || at >= token.value.len() || !token.value.is_char_boundary(at) {
            return;
        }

        let (head, tail) = token.value.split_at(at);
        let middle = Position(token.span.start.0 + at as u32, Arc::clone(&token.span.start.1));
        let first = MK_TOKEN!(
            operator_kind(head),
            head.to_string(),
            Span::new(token.span.start.clone(), middle.clone())
        );
        let second = MK_TOKEN!(
            operator_kind(tail),
            tail.to_string(),
            Span::new(middle, token.span.end.clone())
        );

        self.tokens[self.pos] = first;
        self.tokens.insert(self.pos + 1, second);

        let pos = self.pos;
        self.lex_errors = std::mem::take(&mut self.lex_errors)
            .into_iter()
            .map(|(index, error)| (if index > pos { index + 1 } else { index }, error))
            .collect();
    }

    /// Checks if there are more tokens to parse.
    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    /// Returns a reference to the statement lookup table.
    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    pub fn table(&self) -> &PrecedenceTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut PrecedenceTable {
        &mut self.table
    }

    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Error> {
        self.diagnostics
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn previous_was_equation(&self) -> bool {
        self.previous_was_equation
    }

    /// Records a diagnostic without interrupting the current statement.
    pub fn report(&mut self, error: Error) {
        self.diagnostics.push(error);
    }

    /// Resolves a collected run against the table as it stands now.
    /// A run that fails becomes an `Expr::Error` and its diagnostic is
    /// reported.
    pub fn resolve(&mut self, run: Run) -> Expr {
        let span = run.span.clone();
        match resolve_run(run, &self.table) {
            Ok(expr) => expr,
            Err(error) => {
                self.report(error);
                Expr::Error { span }
            }
        }
    }

    /// Returns the current position in the source file.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    /// End of the most recently consumed token.
    pub fn previous_end(&self) -> Position {
        match self.pos.checked_sub(1) {
            Some(index) => self.tokens[index].span.end.clone(),
            None => Position(0, Arc::clone(&self.file)),
        }
    }

    /// Span from `start` to the end of the most recently consumed token.
    pub fn span_from(&self, start: &Position) -> Span {
        Span::new(start.clone(), self.previous_end())
    }

    /// Skips past the next `;`, the statement terminator.
    fn synchronize(&mut self) {
        let from = self.pos;
        while self.has_tokens() {
            if self.advance().kind == TokenKind::Semicolon {
                break;
            }
        }
        trace!(from, to = self.pos, "resynchronized");
    }

    fn finish(&mut self, mode: ParseMode) {
        if mode == ParseMode::Batch {
            let leftover = std::mem::take(&mut self.lex_errors);
            self.diagnostics.extend(leftover.into_values());
        }
        self.diagnostics.sort_by_key(|error| error.get_position().0);
    }
}

/// Parses a stream of tokens into a script.
///
/// This is the main entry point for parsing. It creates a parser instance,
/// initializes the lookup tables, and parses all statements until EOF,
/// resynchronizing at `;` after every error in batch mode.
///
/// # Returns
///
/// A tuple containing:
/// - The Parser instance (with its diagnostics and final precedence table)
/// - The root Script holding every statement that parsed
pub fn parse(
    tokens: Vec<Token>,
    lex_errors: BTreeMap<usize, Error>,
    file: Arc<String>,
    options: &ParseOptions,
) -> (Parser, Script) {
    let mut parser = Parser::new(tokens, lex_errors, Arc::clone(&file));
    create_token_lookups(&mut parser);

    let mut body: Vec<Statement> = vec![];

    while parser.has_tokens() {
        if options.is_cancelled() {
            debug!(file = %file, "parse cancelled");
            parser.cancelled = true;
            break;
        }

        // A statement that fails leaves no declarations behind.
        let table = parser.table.clone();

        match parse_stmt(&mut parser) {
            Ok(ParsedStmt::Statement(stmt)) => {
                parser.previous_was_equation = matches!(
                    stmt,
                    Statement::Definition(Definition::Equation { .. })
                );
                body.push(stmt);
            }
            Ok(ParsedStmt::Clause(clause)) => {
                if let Some(Statement::Definition(Definition::Equation { clauses, span, .. })) =
                    body.last_mut()
                {
                    span.end = clause.span.end.clone();
                    clauses.push(clause);
                }
            }
            Err(error) => {
                parser.table = table;
                parser.report(error);
                parser.previous_was_equation = false;
                parser.synchronize();
            }
        }

        if options.mode == ParseMode::FailFast && !parser.diagnostics.is_empty() {
            break;
        }
    }

    parser.finish(options.mode);

    let script = Script {
        body,
        span: Span::new(Position(0, Arc::clone(&file)), parser.get_position()),
    };

    (parser, script)
}
