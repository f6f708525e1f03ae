use std::fmt::Display;

use crate::Span;

/// Whether an identifier was spelled with a leading uppercase letter (or is
/// `_`) or not. Decided once by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierClass {
    Variable,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub text: String,
    pub class: IdentifierClass,
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Identifier
/// A possibly module-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Unqualified(Name),
    Qualified(String, Name),
}

impl Identifier {
    pub fn name(&self) -> &Name {
        match self {
            Identifier::Unqualified(name) | Identifier::Qualified(_, name) => name,
        }
    }

    pub fn module(&self) -> Option<&str> {
        match self {
            Identifier::Unqualified(_) => None,
            Identifier::Qualified(module, _) => Some(module),
        }
    }

    pub fn is_variable(&self) -> bool {
        self.name().class == IdentifierClass::Variable
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Unqualified(name) => write!(f, "{}", name),
            Identifier::Qualified(module, name) => write!(f, "{}::{}", module, name),
        }
    }
}

/// An operator symbol as written in a declaration, possibly qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorName {
    pub symbol: String,
    pub module: Option<String>,
}

impl OperatorName {
    pub fn new(symbol: &str) -> Self {
        OperatorName {
            symbol: symbol.to_string(),
            module: None,
        }
    }

    pub fn qualified(&self) -> String {
        match &self.module {
            Some(module) => format!("{}::{}", module, self.symbol),
            None => self.symbol.clone(),
        }
    }
}

impl Display for OperatorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// An occurrence of an operator inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorRef {
    pub name: OperatorName,
    pub span: Span,
}

impl OperatorRef {
    pub fn symbol(&self) -> &str {
        &self.name.symbol
    }
}

impl Display for OperatorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Paren,
    Bracket,
    Brace,
}

impl ContainerKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContainerKind::Paren => "tuple",
            ContainerKind::Bracket => "list",
            ContainerKind::Brace => "set",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Comma,
    Semicolon,
}

/// Which operand of a section is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionSide {
    /// `(+ 1)`: the hole is left of the operator.
    LeftHole,
    /// `(1 +)`: the hole is right of the operator.
    RightHole,
}
