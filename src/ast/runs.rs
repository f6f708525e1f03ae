//! The unresolved skeleton handed from the structural parser to operator
//! resolution. A `Run` is a flat sequence of atoms and operators whose
//! nesting is not known until the live precedence table is consulted.

use crate::Span;

use super::{
    ast::{ContainerKind, Identifier, Name, OperatorRef, SectionSide, Separator},
    expressions::NumberLiteral,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub items: Vec<RunItem>,
    pub span: Span,
}

impl Run {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunItem {
    Atom(Atom),
    Operator(OperatorRef),
    /// `if c then t else`: behaves as a prefix operator of the conditional
    /// band whose operand is the rest of the run. Without `else` the
    /// then-branch is carried inline and `then_branch` is `None`.
    Conditional {
        condition: Run,
        then_branch: Option<Run>,
        span: Span,
    },
}

impl RunItem {
    pub fn get_span(&self) -> &Span {
        match self {
            RunItem::Atom(atom) => atom.get_span(),
            RunItem::Operator(op) => &op.span,
            RunItem::Conditional { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
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
    Number {
        literal: NumberLiteral,
        span: Span,
    },
    String {
        value: String,
        span: Span,
    },
    Container {
        kind: ContainerKind,
        body: ContainerBody,
        span: Span,
    },
    OperatorLiteral {
        op: OperatorRef,
        span: Span,
    },
    Section {
        op: OperatorRef,
        operand: Run,
        side: SectionSide,
        span: Span,
    },
    Lambda {
        params: Vec<RunItem>,
        body: Run,
        span: Span,
    },
}

impl Atom {
    pub fn get_span(&self) -> &Span {
        match self {
            Atom::Ident { span, .. }
            | Atom::VarDecl { span, .. }
            | Atom::TypedVar { span, .. }
            | Atom::Number { span, .. }
            | Atom::String { span, .. }
            | Atom::Container { span, .. }
            | Atom::OperatorLiteral { span, .. }
            | Atom::Section { span, .. }
            | Atom::Lambda { span, .. } => span,
        }
    }
}

/// What a pair of delimiters holds, decided by the separator that follows
/// the first element.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerBody {
    Empty,
    Elements {
        items: Vec<Run>,
        separator: Option<Separator>,
        trailing: bool,
        tail: Option<Run>,
    },
    Enumeration {
        items: Vec<Run>,
        bound: Option<Run>,
    },
    Comprehension {
        template: Run,
        generators: Vec<Run>,
    },
}
