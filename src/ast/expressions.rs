use std::fmt::Display;

use crate::Span;

use super::ast::{
    ContainerKind, Identifier, Name, OperatorRef, SectionSide, Separator,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Integer(u128),
    Float(f64),
}

/// Number Literal
/// Keeps the source spelling next to the decoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub text: String,
    pub radix: u32,
    pub value: NumberValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryFixity {
    Prefix,
    Postfix,
}

/// Resolved expression tree.
///
/// Every node owns its children exclusively. `Error` stands in for a run
/// that failed to resolve; its diagnostic is reported separately.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident {
        ident: Identifier,
        span: Span,
    },
    VarDecl {
        ident: Identifier,
        span: Span,
    },
    TypedVar {
        var: Name,
        type_ident: Identifier,
        span: Span,
    },
    NumberLit {
        literal: NumberLiteral,
        span: Span,
    },
    StringLit {
        value: String,
        span: Span,
    },
    /// Juxtaposition, `f x`.
    Application {
        function: Box<Expr>,
        argument: Box<Expr>,
        span: Span,
    },
    BinaryOp {
        op: OperatorRef,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    UnaryOp {
        op: OperatorRef,
        fixity: UnaryFixity,
        operand: Box<Expr>,
        span: Span,
    },
    Quotation {
        marker: OperatorRef,
        operand: Box<Expr>,
        span: Span,
    },
    Composition {
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
        span: Span,
    },
    Sequence {
        first: Box<Expr>,
        second: Box<Expr>,
        span: Span,
    },
    Lambda {
        params: Vec<Expr>,
        body: Box<Expr>,
        span: Span,
    },
    /// `f $ x`.
    InfixApply {
        function: Box<Expr>,
        argument: Box<Expr>,
        span: Span,
    },
    /// Tuple, list or set, depending on `kind`.
    Collection {
        kind: ContainerKind,
        elements: Vec<Expr>,
        separator: Option<Separator>,
        tail: Option<Box<Expr>>,
        span: Span,
    },
    Enumeration {
        kind: ContainerKind,
        elements: Vec<Expr>,
        bound: Option<Box<Expr>>,
        span: Span,
    },
    Comprehension {
        kind: ContainerKind,
        template: Box<Expr>,
        generators: Vec<Expr>,
        span: Span,
    },
    OperatorLiteral {
        op: OperatorRef,
        span: Span,
    },
    Section {
        op: OperatorRef,
        operand: Box<Expr>,
        side: SectionSide,
        span: Span,
    },
    Error {
        span: Span,
    },
}

impl Expr {
    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Ident { span, .. }
            | Expr::VarDecl { span, .. }
            | Expr::TypedVar { span, .. }
            | Expr::NumberLit { span, .. }
            | Expr::StringLit { span, .. }
            | Expr::Application { span, .. }
            | Expr::BinaryOp { span, .. }
            | Expr::UnaryOp { span, .. }
            | Expr::Quotation { span, .. }
            | Expr::Composition { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Sequence { span, .. }
            | Expr::Lambda { span, .. }
            | Expr::InfixApply { span, .. }
            | Expr::Collection { span, .. }
            | Expr::Enumeration { span, .. }
            | Expr::Comprehension { span, .. }
            | Expr::OperatorLiteral { span, .. }
            | Expr::Section { span, .. }
            | Expr::Error { span } => span,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expr::Error { .. })
    }

    /// True if this node or any node below it is an `Error`.
    pub fn contains_error(&self) -> bool {
        match self {
            Expr::Error { .. } => true,
            Expr::Ident { .. }
            | Expr::VarDecl { .. }
            | Expr::TypedVar { .. }
            | Expr::NumberLit { .. }
            | Expr::StringLit { .. }
            | Expr::OperatorLiteral { .. } => false,
            Expr::Application {
                function, argument, ..
            }
            | Expr::InfixApply {
                function, argument, ..
            } => function.contains_error() || argument.contains_error(),
            Expr::BinaryOp { left, right, .. } | Expr::Composition { left, right, .. } => {
                left.contains_error() || right.contains_error()
            }
            Expr::Sequence { first, second, .. } => {
                first.contains_error() || second.contains_error()
            }
            Expr::UnaryOp { operand, .. }
            | Expr::Quotation { operand, .. }
            | Expr::Section { operand, .. } => operand.contains_error(),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                condition.contains_error()
                    || then_branch.contains_error()
                    || else_branch.as_ref().is_some_and(|e| e.contains_error())
            }
            Expr::Lambda { params, body, .. } => {
                params.iter().any(Expr::contains_error) || body.contains_error()
            }
            Expr::Collection { elements, tail, .. } => {
                elements.iter().any(Expr::contains_error)
                    || tail.as_ref().is_some_and(|e| e.contains_error())
            }
            Expr::Enumeration {
                elements, bound, ..
            } => {
                elements.iter().any(Expr::contains_error)
                    || bound.as_ref().is_some_and(|e| e.contains_error())
            }
            Expr::Comprehension {
                template,
                generators,
                ..
            } => template.contains_error() || generators.iter().any(Expr::contains_error),
        }
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, items: &[Expr]) -> std::fmt::Result {
    for item in items {
        write!(f, " {}", item)?;
    }
    Ok(())
}

/// S-expression rendering, used by `--dump-ast` and the tests.
impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Ident { ident, .. } => write!(f, "{}", ident),
            Expr::VarDecl { ident, .. } => write!(f, "(var {})", ident),
            Expr::TypedVar {
                var, type_ident, ..
            } => write!(f, "{}:{}", var, type_ident),
            Expr::NumberLit { literal, .. } => write!(f, "{}", literal.text),
            Expr::StringLit { value, .. } => write!(f, "{:?}", value),
            Expr::Application {
                function, argument, ..
            } => write!(f, "(app {} {})", function, argument),
            Expr::BinaryOp {
                op, left, right, ..
            } => write!(f, "({} {} {})", op, left, right),
            Expr::UnaryOp {
                op,
                fixity: UnaryFixity::Prefix,
                operand,
                ..
            } => write!(f, "(pre {} {})", op, operand),
            Expr::UnaryOp {
                op,
                fixity: UnaryFixity::Postfix,
                operand,
                ..
            } => write!(f, "(post {} {})", op, operand),
            Expr::Quotation {
                marker, operand, ..
            } => write!(f, "({} {})", marker, operand),
            Expr::Composition { left, right, .. } => write!(f, "(. {} {})", left, right),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
                ..
            } => match else_branch {
                Some(else_branch) => {
                    write!(f, "(if {} {} {})", condition, then_branch, else_branch)
                }
                None => write!(f, "(if {} {})", condition, then_branch),
            },
            Expr::Sequence { first, second, .. } => write!(f, "(|| {} {})", first, second),
            Expr::Lambda { params, body, .. } => {
                write!(f, "(lambda [")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, "] {})", body)
            }
            Expr::InfixApply {
                function, argument, ..
            } => write!(f, "($ {} {})", function, argument),
            Expr::Collection {
                kind,
                elements,
                tail,
                ..
            } => {
                write!(f, "({}", kind.label())?;
                write_list(f, elements)?;
                if let Some(tail) = tail {
                    write!(f, " | {}", tail)?;
                }
                write!(f, ")")
            }
            Expr::Enumeration {
                kind,
                elements,
                bound,
                ..
            } => {
                write!(f, "({}", kind.label())?;
                write_list(f, elements)?;
                write!(f, " ..")?;
                if let Some(bound) = bound {
                    write!(f, " {}", bound)?;
                }
                write!(f, ")")
            }
            Expr::Comprehension {
                kind,
                template,
                generators,
                ..
            } => {
                write!(f, "({} {} :", kind.label(), template)?;
                write_list(f, generators)?;
                write!(f, ")")
            }
            Expr::OperatorLiteral { op, .. } => write!(f, "(op {})", op),
            Expr::Section {
                op,
                operand,
                side: SectionSide::LeftHole,
                ..
            } => write!(f, "(section _ {} {})", op, operand),
            Expr::Section {
                op,
                operand,
                side: SectionSide::RightHole,
                ..
            } => write!(f, "(section {} {} _)", operand, op),
            Expr::Error { .. } => write!(f, "<error>"),
        }
    }
}
