use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::debug;

use crate::{
    ast::{
        ast::OperatorName,
        statements::{Header, HeaderName, PrecedenceSpec},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{parser::Parser, stmt::*};

/// Precedence bands of the fixed syntactic layer, lowest binding first.
#[derive(PartialEq, PartialOrd, Eq, Ord, Clone, Copy, Debug, Hash)]
pub enum BindingPower {
    Default = 0,
    Lambda = 1,
    Sequence = 2,
    Conditional = 3,
    InfixApplication = 4,
    Relational = 5,
    Additive = 6,
    Multiplicative = 7,
    Prefix = 8,
    Exponent = 9,
    Composition = 10,
    Application = 11,
    Quotation = 13,
}

pub const MAX_PRECEDENCE: u8 = BindingPower::Quotation as u8;

impl BindingPower {
    pub fn level(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Prefix,
    InfixLeft,
    InfixRight,
    InfixNone,
    Postfix,
}

/// The arity class a fixity lives under. A symbol may carry one entry per
/// role, e.g. `-` is both prefix and infix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorRole {
    Prefix,
    Infix,
    Postfix,
}

impl Fixity {
    pub fn role(self) -> OperatorRole {
        match self {
            Fixity::Prefix => OperatorRole::Prefix,
            Fixity::Postfix => OperatorRole::Postfix,
            Fixity::InfixLeft | Fixity::InfixRight | Fixity::InfixNone => OperatorRole::Infix,
        }
    }
}

/// Associativity an infix operator gets when declared at `level`.
pub fn band_fixity(level: u8) -> Fixity {
    match level {
        1 | 3 | 4 | 9 => Fixity::InfixRight,
        5 => Fixity::InfixNone,
        _ => Fixity::InfixLeft,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorEntry {
    pub symbol: String,
    pub precedence: u8,
    pub fixity: Fixity,
}

impl OperatorEntry {
    pub fn new(symbol: &str, power: BindingPower, fixity: Fixity) -> Self {
        OperatorEntry {
            symbol: symbol.to_string(),
            precedence: power.level(),
            fixity,
        }
    }
}

lazy_static! {
    pub static ref BUILTIN_OPERATORS: Vec<OperatorEntry> = {
        let mut entries = vec![];

        for marker in ["`", "'", "~", "&"] {
            entries.push(OperatorEntry::new(marker, BindingPower::Quotation, Fixity::Prefix));
        }
        entries.push(OperatorEntry::new(".", BindingPower::Composition, Fixity::InfixLeft));
        for op in ["^", "!"] {
            entries.push(OperatorEntry::new(op, BindingPower::Exponent, Fixity::InfixRight));
        }
        for op in ["-", "#", "not"] {
            entries.push(OperatorEntry::new(op, BindingPower::Prefix, Fixity::Prefix));
        }
        for op in ["*", "/", "div", "mod", "and", "and then"] {
            entries.push(OperatorEntry::new(op, BindingPower::Multiplicative, Fixity::InfixLeft));
        }
        for op in ["++", "+", "-", "or", "or else"] {
            entries.push(OperatorEntry::new(op, BindingPower::Additive, Fixity::InfixLeft));
        }
        for op in ["<", ">", "=", "<=", ">=", "<>", "=="] {
            entries.push(OperatorEntry::new(op, BindingPower::Relational, Fixity::InfixNone));
        }
        entries.push(OperatorEntry::new("$", BindingPower::InfixApplication, Fixity::InfixRight));
        entries.push(OperatorEntry::new("||", BindingPower::Sequence, Fixity::InfixLeft));

        entries
    };
}

/// Operator fixities live at the current point of one compilation unit.
///
/// Seeded from [`BUILTIN_OPERATORS`] and mutated in file order by operator
/// headers. Later declarations shadow earlier ones; nothing is ever reset.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceTable {
    entries: HashMap<(String, OperatorRole), OperatorEntry>,
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PrecedenceTable {
    pub fn new() -> Self {
        let mut table = PrecedenceTable {
            entries: HashMap::new(),
        };
        for entry in BUILTIN_OPERATORS.iter() {
            table.declare_entry(entry.clone());
        }
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, symbol: &str, role: OperatorRole) -> Option<&OperatorEntry> {
        self.entries.get(&(symbol.to_string(), role))
    }

    /// Qualified spelling first, then the bare symbol.
    pub fn lookup_name(&self, name: &OperatorName, role: OperatorRole) -> Option<&OperatorEntry> {
        if name.module.is_some() {
            if let Some(entry) = self.lookup(&name.qualified(), role) {
                return Some(entry);
            }
        }
        self.lookup(&name.symbol, role)
    }

    pub fn is_declared(&self, name: &OperatorName) -> bool {
        [OperatorRole::Prefix, OperatorRole::Infix, OperatorRole::Postfix]
            .iter()
            .any(|role| self.lookup_name(name, *role).is_some())
    }

    /// Registers an entry, returning the one it shadows.
    pub fn declare_entry(&mut self, entry: OperatorEntry) -> Option<OperatorEntry> {
        let key = (entry.symbol.clone(), entry.fixity.role());
        self.entries.insert(key, entry)
    }

    /// Applies an operator header. Headers without an `@` clause leave the
    /// table untouched.
    pub fn declare(&mut self, header: &Header) -> Result<Option<OperatorEntry>, Error> {
        let (name, params, precedence, alias, span) = match header {
            Header::Symbol {
                name: HeaderName::Operator(name),
                params,
                precedence: Some(precedence),
                alias,
                span,
            } => (name, params, precedence, alias, span),
            _ => return Ok(None),
        };

        let level = match precedence {
            PrecedenceSpec::Level(level) => *level,
            PrecedenceSpec::SameAs(other) => {
                let entry = [OperatorRole::Infix, OperatorRole::Prefix, OperatorRole::Postfix]
                    .iter()
                    .find_map(|role| self.lookup_name(other, *role));
                match entry {
                    Some(entry) => entry.precedence,
                    None => {
                        return Err(Error::new(
                            ErrorImpl::UndeclaredOperator {
                                operator: other.qualified(),
                            },
                            span.clone(),
                        ))
                    }
                }
            }
        };

        if level > MAX_PRECEDENCE {
            return Err(Error::new(
                ErrorImpl::InvalidPrecedence {
                    value: level.to_string(),
                },
                span.clone(),
            ));
        }

        let fixity = if params.len() == 1 {
            Fixity::Prefix
        } else {
            band_fixity(level)
        };

        debug!(
            symbol = %name.qualified(),
            precedence = level,
            fixity = ?fixity,
            "declared operator"
        );

        let previous = self.declare_entry(OperatorEntry {
            symbol: name.qualified(),
            precedence: level,
            fixity,
        });

        if let Some(alias) = alias {
            self.declare_entry(OperatorEntry {
                symbol: alias.clone(),
                precedence: level,
                fixity,
            });
        }

        Ok(previous)
    }
}

pub type StmtHandler = fn(&mut Parser) -> Result<ParsedStmt, Error>;

pub fn create_token_lookups(parser: &mut Parser) {
    // Declarations
    parser.stmt(TokenKind::Private, parse_prefixed_decl);
    parser.stmt(TokenKind::Public, parse_prefixed_decl);
    parser.stmt(TokenKind::Const, parse_prefixed_decl);
    parser.stmt(TokenKind::Special, parse_prefixed_decl);
    parser.stmt(TokenKind::Extern, parse_prefixed_decl);
    parser.stmt(TokenKind::Var, parse_prefixed_decl);
    parser.stmt(TokenKind::Virtual, parse_prefixed_decl);
    parser.stmt(TokenKind::Type, parse_type_decl);
    parser.stmt(TokenKind::Import, parse_import);
    parser.stmt(TokenKind::Include, parse_import);
    parser.stmt(TokenKind::From, parse_qualified_import);
    parser.stmt(TokenKind::At, parse_pragma);

    // Definitions
    parser.stmt(TokenKind::Def, parse_def);
    parser.stmt(TokenKind::Undef, parse_undef);

    // Continuation clauses of the preceding equation
    parser.stmt(TokenKind::Assignment, parse_continuation);
    parser.stmt(TokenKind::If, parse_continuation);
    parser.stmt(TokenKind::Otherwise, parse_continuation);
    parser.stmt(TokenKind::Where, parse_continuation);
}

pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
