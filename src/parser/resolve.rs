//! Operator resolution: turns a flat [`Run`] into a nested [`Expr`] using
//! the precedence table in force where the run was written.
//!
//! The algorithm is a shunting-yard over an operand stack and a stack of
//! pending operators. Juxtaposition is an invisible left-associative
//! operator of the application band, and a conditional with an `else` is a
//! prefix operator of the conditional band.

use crate::{
    ast::{
        ast::{ContainerKind, IdentifierClass, OperatorName, OperatorRef, SectionSide},
        expressions::{Expr, UnaryFixity},
        runs::{Atom, ContainerBody, Run, RunItem},
    },
    errors::errors::{Error, ErrorImpl, OperandSide},
    Span,
};

use super::lookups::{BindingPower, Fixity, OperatorEntry, OperatorRole, PrecedenceTable};

const QUOTATION_MARKERS: [&str; 4] = ["`", "'", "~", "&"];

enum Pending {
    Binary { op: OperatorRef, entry: OperatorEntry },
    Prefix { op: OperatorRef, entry: OperatorEntry },
    Application { span: Span },
    Conditional {
        condition: Expr,
        then_branch: Option<Expr>,
        span: Span,
    },
}

impl Pending {
    fn precedence(&self) -> u8 {
        match self {
            Pending::Binary { entry, .. } | Pending::Prefix { entry, .. } => entry.precedence,
            Pending::Application { .. } => BindingPower::Application.level(),
            Pending::Conditional { .. } => BindingPower::Conditional.level(),
        }
    }

    fn fixity(&self) -> Fixity {
        match self {
            Pending::Binary { entry, .. } | Pending::Prefix { entry, .. } => entry.fixity,
            Pending::Application { .. } => Fixity::InfixLeft,
            Pending::Conditional { .. } => Fixity::Prefix,
        }
    }

    fn symbol(&self) -> String {
        match self {
            Pending::Binary { op, .. } | Pending::Prefix { op, .. } => op.name.qualified(),
            Pending::Application { .. } => String::from("application"),
            Pending::Conditional { .. } => String::from("if"),
        }
    }

    fn span(&self) -> &Span {
        match self {
            Pending::Binary { op, .. } | Pending::Prefix { op, .. } => &op.span,
            Pending::Application { span } | Pending::Conditional { span, .. } => span,
        }
    }
}

enum Step {
    Operand(Expr),
    Operator(OperatorRef),
    Conditional {
        condition: Expr,
        then_branch: Option<Expr>,
        span: Span,
    },
}

fn undeclared(op: &OperatorRef) -> Error {
    Error::new(
        ErrorImpl::UndeclaredOperator {
            operator: op.name.qualified(),
        },
        op.span.clone(),
    )
}

fn missing_operand(operator: String, side: OperandSide, span: Span) -> Error {
    Error::new(ErrorImpl::MissingOperand { operator, side }, span)
}

struct Resolution<'a> {
    table: &'a PrecedenceTable,
    operands: Vec<Expr>,
    pending: Vec<Pending>,
}

impl Resolution<'_> {
    fn entry(&self, op: &OperatorRef, role: OperatorRole) -> Option<OperatorEntry> {
        self.table.lookup_name(&op.name, role).cloned()
    }

    fn pop_operand(&mut self, pending: &Pending) -> Result<Expr, Error> {
        self.operands.pop().ok_or_else(|| {
            missing_operand(pending.symbol(), OperandSide::Right, pending.span().clone())
        })
    }

    /// Reduces every pending operator that binds tighter than an incoming
    /// one of the given precedence and fixity.
    fn reduce_for(
        &mut self,
        precedence: u8,
        fixity: Fixity,
        symbol: &str,
        span: &Span,
    ) -> Result<(), Error> {
        while let Some(top) = self.pending.last() {
            let top_precedence = top.precedence();

            let pop = if top_precedence != precedence {
                top_precedence > precedence
            } else {
                match (top.fixity(), fixity) {
                    (Fixity::Prefix, Fixity::InfixRight) => false,
                    (Fixity::Prefix, _) => true,
                    (Fixity::InfixLeft, Fixity::InfixLeft | Fixity::Postfix) => true,
                    (Fixity::InfixRight, Fixity::InfixRight) => false,
                    (Fixity::InfixRight, Fixity::Postfix) => true,
                    _ => {
                        return Err(Error::new(
                            ErrorImpl::AmbiguousChain {
                                left: top.symbol(),
                                right: symbol.to_string(),
                            },
                            span.clone(),
                        ))
                    }
                }
            };

            if !pop {
                break;
            }

            if let Some(top) = self.pending.pop() {
                self.reduce(top)?;
            }
        }

        Ok(())
    }

    fn push_operator(&mut self, pending: Pending) -> Result<(), Error> {
        let symbol = pending.symbol();
        let span = pending.span().clone();
        self.reduce_for(pending.precedence(), pending.fixity(), &symbol, &span)?;
        self.pending.push(pending);
        Ok(())
    }

    fn apply_postfix(&mut self, op: OperatorRef, entry: OperatorEntry) -> Result<(), Error> {
        self.reduce_for(entry.precedence, Fixity::Postfix, &op.name.qualified(), &op.span)?;
        let operand = self.operands.pop().ok_or_else(|| {
            missing_operand(op.name.qualified(), OperandSide::Left, op.span.clone())
        })?;
        let span = operand.get_span().to(&op.span);
        self.operands.push(Expr::UnaryOp {
            op,
            fixity: UnaryFixity::Postfix,
            operand: Box::new(operand),
            span,
        });
        Ok(())
    }

    fn reduce(&mut self, pending: Pending) -> Result<(), Error> {
        let right = self.pop_operand(&pending)?;

        let expr = match pending {
            Pending::Binary { op, .. } => {
                let left = self.operands.pop().ok_or_else(|| {
                    missing_operand(op.name.qualified(), OperandSide::Left, op.span.clone())
                })?;
                binary_node(op, left, right)
            }
            Pending::Prefix { op, .. } => prefix_node(op, right),
            Pending::Application { span } => {
                let function = self.operands.pop().ok_or_else(|| {
                    Error::new(ErrorImpl::EmptyRun, span.clone())
                })?;
                let span = function.get_span().to(right.get_span());
                Expr::Application {
                    function: Box::new(function),
                    argument: Box::new(right),
                    span,
                }
            }
            Pending::Conditional {
                condition,
                then_branch,
                span,
            } => {
                let span = span.to(right.get_span());
                match then_branch {
                    Some(then_branch) => Expr::Conditional {
                        condition: Box::new(condition),
                        then_branch: Box::new(then_branch),
                        else_branch: Some(Box::new(right)),
                        span,
                    },
                    None => Expr::Conditional {
                        condition: Box::new(condition),
                        then_branch: Box::new(right),
                        else_branch: None,
                        span,
                    },
                }
            }
        };

        self.operands.push(expr);
        Ok(())
    }
}

fn binary_node(op: OperatorRef, left: Expr, right: Expr) -> Expr {
    let span = left.get_span().to(right.get_span());
    let (left, right) = (Box::new(left), Box::new(right));

    if op.name.module.is_some() {
        return Expr::BinaryOp {
            op,
            left,
            right,
            span,
        };
    }

    match op.symbol() {
        "." => Expr::Composition { left, right, span },
        "||" => Expr::Sequence {
            first: left,
            second: right,
            span,
        },
        "$" => Expr::InfixApply {
            function: left,
            argument: right,
            span,
        },
        _ => Expr::BinaryOp {
            op,
            left,
            right,
            span,
        },
    }
}

fn prefix_node(op: OperatorRef, operand: Expr) -> Expr {
    let span = op.span.to(operand.get_span());

    if op.name.module.is_none() && QUOTATION_MARKERS.contains(&op.symbol()) {
        Expr::Quotation {
            marker: op,
            operand: Box::new(operand),
            span,
        }
    } else {
        Expr::UnaryOp {
            op,
            fixity: UnaryFixity::Prefix,
            operand: Box::new(operand),
            span,
        }
    }
}

/// A function identifier that the table knows as an operator, e.g. a
/// user-declared `(plus) X Y @ 6`.
fn alphabetic_operator(item: &RunItem, table: &PrecedenceTable) -> Option<OperatorRef> {
    match item {
        RunItem::Atom(Atom::Ident { ident, span }) if ident.name().class == IdentifierClass::Function => {
            let name = OperatorName {
                symbol: ident.name().text.clone(),
                module: ident.module().map(str::to_string),
            };
            if table.is_declared(&name) {
                Some(OperatorRef {
                    name,
                    span: span.clone(),
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

fn classify(item: RunItem, table: &PrecedenceTable) -> Result<Step, Error> {
    if let Some(op) = alphabetic_operator(&item, table) {
        return Ok(Step::Operator(op));
    }

    match item {
        RunItem::Operator(op) => Ok(Step::Operator(op)),
        RunItem::Atom(atom) => Ok(Step::Operand(resolve_atom(atom, table)?)),
        RunItem::Conditional {
            condition,
            then_branch,
            span,
        } => Ok(Step::Conditional {
            condition: resolve_run(condition, table)?,
            then_branch: then_branch
                .map(|branch| resolve_run(branch, table))
                .transpose()?,
            span,
        }),
    }
}

/// Resolves a run into a single expression.
///
/// Fails with `EmptyRun`, `UndeclaredOperator`, `MissingOperand` or
/// `AmbiguousChain`; errors inside nested containers propagate.
pub fn resolve_run(run: Run, table: &PrecedenceTable) -> Result<Expr, Error> {
    if run.is_empty() {
        return Err(Error::new(ErrorImpl::EmptyRun, run.span));
    }

    let steps = run
        .items
        .into_iter()
        .map(|item| classify(item, table))
        .collect::<Result<Vec<_>, _>>()?;
    let count = steps.len();

    let mut state = Resolution {
        table,
        operands: vec![],
        pending: vec![],
    };
    let mut expect_operand = true;

    for (index, step) in steps.into_iter().enumerate() {
        let is_last = index + 1 == count;

        match step {
            Step::Operand(expr) => {
                if !expect_operand {
                    state.push_operator(Pending::Application {
                        span: expr.get_span().clone(),
                    })?;
                }
                state.operands.push(expr);
                expect_operand = false;
            }
            Step::Conditional {
                condition,
                then_branch,
                span,
            } => {
                if !expect_operand {
                    state.push_operator(Pending::Application { span: span.clone() })?;
                }
                state.pending.push(Pending::Conditional {
                    condition,
                    then_branch,
                    span,
                });
                expect_operand = true;
            }
            Step::Operator(op) if expect_operand => match state.entry(&op, OperatorRole::Prefix) {
                Some(entry) => state.pending.push(Pending::Prefix { op, entry }),
                None if table.is_declared(&op.name) => {
                    return Err(missing_operand(
                        op.name.qualified(),
                        OperandSide::Left,
                        op.span.clone(),
                    ))
                }
                None => return Err(undeclared(&op)),
            },
            Step::Operator(op) => {
                let infix = state.entry(&op, OperatorRole::Infix);
                let postfix = state.entry(&op, OperatorRole::Postfix);
                let prefix = state.entry(&op, OperatorRole::Prefix);

                match (infix, postfix, prefix) {
                    (_, Some(entry), _) if is_last => state.apply_postfix(op, entry)?,
                    (Some(entry), _, _) => {
                        state.push_operator(Pending::Binary { op, entry })?;
                        expect_operand = true;
                    }
                    (None, Some(entry), _) => state.apply_postfix(op, entry)?,
                    (None, None, Some(entry)) => {
                        state.push_operator(Pending::Application {
                            span: op.span.clone(),
                        })?;
                        state.pending.push(Pending::Prefix { op, entry });
                        expect_operand = true;
                    }
                    (None, None, None) => return Err(undeclared(&op)),
                }
            }
        }
    }

    if expect_operand {
        let (operator, span) = match state.pending.last() {
            Some(pending) => (pending.symbol(), pending.span().clone()),
            None => (String::new(), run.span.clone()),
        };
        return Err(missing_operand(operator, OperandSide::Right, span));
    }

    while let Some(top) = state.pending.pop() {
        state.reduce(top)?;
    }

    match (state.operands.pop(), state.operands.is_empty()) {
        (Some(expr), true) => Ok(expr),
        _ => Err(Error::new(ErrorImpl::EmptyRun, run.span)),
    }
}

fn resolve_atom(atom: Atom, table: &PrecedenceTable) -> Result<Expr, Error> {
    match atom {
        Atom::Ident { ident, span } => Ok(Expr::Ident { ident, span }),
        Atom::VarDecl { ident, span } => Ok(Expr::VarDecl { ident, span }),
        Atom::TypedVar {
            var,
            type_ident,
            span,
        } => Ok(Expr::TypedVar {
            var,
            type_ident,
            span,
        }),
        Atom::Number { literal, span } => Ok(Expr::NumberLit { literal, span }),
        Atom::String { value, span } => Ok(Expr::StringLit { value, span }),
        Atom::OperatorLiteral { op, span } => Ok(Expr::OperatorLiteral { op, span }),
        Atom::Section {
            op,
            operand,
            side,
            span,
        } => resolve_section(op, operand, side, span, table),
        Atom::Lambda { params, body, span } => resolve_lambda(params, body, span, table),
        Atom::Container { kind, body, span } => resolve_container(kind, body, span, table),
    }
}

fn resolve_section(
    op: OperatorRef,
    operand: Run,
    side: SectionSide,
    span: Span,
    table: &PrecedenceTable,
) -> Result<Expr, Error> {
    let prefix = table.lookup_name(&op.name, OperatorRole::Prefix).is_some();
    let infix = table.lookup_name(&op.name, OperatorRole::Infix).is_some();
    let postfix = table.lookup_name(&op.name, OperatorRole::Postfix).is_some();

    // `(- x)` is a prefix application, `(x!)` a postfix one.
    let plain = match side {
        SectionSide::LeftHole => prefix,
        SectionSide::RightHole => postfix && !infix,
    };
    if plain {
        let mut items = Vec::with_capacity(operand.len() + 1);
        match side {
            SectionSide::LeftHole => {
                items.push(RunItem::Operator(op));
                items.extend(operand.items);
            }
            SectionSide::RightHole => {
                items.extend(operand.items);
                items.push(RunItem::Operator(op));
            }
        }
        return resolve_run(Run { items, span }, table);
    }

    if !infix {
        if !table.is_declared(&op.name) {
            return Err(undeclared(&op));
        }
        let missing = match side {
            SectionSide::LeftHole => OperandSide::Left,
            SectionSide::RightHole => OperandSide::Right,
        };
        return Err(missing_operand(op.name.qualified(), missing, op.span));
    }

    let operand = resolve_run(operand, table)?;
    Ok(Expr::Section {
        op,
        operand: Box::new(operand),
        side,
        span,
    })
}

fn resolve_lambda(
    params: Vec<RunItem>,
    body: Run,
    span: Span,
    table: &PrecedenceTable,
) -> Result<Expr, Error> {
    if params.is_empty() {
        return Err(Error::new(
            ErrorImpl::MalformedLambda {
                reason: String::from("no parameters before `.`"),
            },
            span,
        ));
    }

    let mut resolved = Vec::with_capacity(params.len());
    for param in params {
        match param {
            RunItem::Atom(atom) => resolved.push(resolve_atom(atom, table)?),
            RunItem::Operator(op) => {
                return Err(Error::new(
                    ErrorImpl::MalformedLambda {
                        reason: format!("operator `{}` in parameter list", op),
                    },
                    op.span,
                ))
            }
            RunItem::Conditional { span, .. } => {
                return Err(Error::new(
                    ErrorImpl::MalformedLambda {
                        reason: String::from("conditional in parameter list"),
                    },
                    span,
                ))
            }
        }
    }

    let body = resolve_run(body, table)?;
    Ok(Expr::Lambda {
        params: resolved,
        body: Box::new(body),
        span,
    })
}

/// A parenthesized single run. Alphabetic operators get the same literal
/// and section forms symbols get during collection.
fn resolve_group(run: Run, span: Span, table: &PrecedenceTable) -> Result<Expr, Error> {
    let first = run.items.first().and_then(|item| alphabetic_operator(item, table));
    let last = run.items.last().and_then(|item| alphabetic_operator(item, table));

    if run.len() == 1 {
        if let Some(op) = first {
            return Ok(Expr::OperatorLiteral { op, span });
        }
    } else if let Some(op) = first {
        let mut items = run.items;
        items.remove(0);
        let operand = Run {
            span: items_span(&items, &span),
            items,
        };
        return resolve_section(op, operand, SectionSide::LeftHole, span, table);
    } else if let Some(op) = last {
        let mut items = run.items;
        items.pop();
        let operand = Run {
            span: items_span(&items, &span),
            items,
        };
        return resolve_section(op, operand, SectionSide::RightHole, span, table);
    }

    resolve_run(run, table)
}

fn items_span(items: &[RunItem], fallback: &Span) -> Span {
    match (items.first(), items.last()) {
        (Some(first), Some(last)) => first.get_span().to(last.get_span()),
        _ => fallback.clone(),
    }
}

fn resolve_all(runs: Vec<Run>, table: &PrecedenceTable) -> Result<Vec<Expr>, Error> {
    runs.into_iter().map(|run| resolve_run(run, table)).collect()
}

fn resolve_container(
    kind: ContainerKind,
    body: ContainerBody,
    span: Span,
    table: &PrecedenceTable,
) -> Result<Expr, Error> {
    match body {
        ContainerBody::Empty => Ok(Expr::Collection {
            kind,
            elements: vec![],
            separator: None,
            tail: None,
            span,
        }),
        ContainerBody::Elements {
            mut items,
            separator: None,
            trailing: false,
            tail: None,
        } if kind == ContainerKind::Paren && items.len() == 1 => match items.pop() {
            Some(run) => resolve_group(run, span, table),
            None => Err(Error::new(ErrorImpl::EmptyRun, span)),
        },
        ContainerBody::Elements {
            items,
            separator,
            tail,
            ..
        } => Ok(Expr::Collection {
            kind,
            elements: resolve_all(items, table)?,
            separator,
            tail: tail
                .map(|tail| resolve_run(tail, table).map(Box::new))
                .transpose()?,
            span,
        }),
        ContainerBody::Enumeration { items, bound } => Ok(Expr::Enumeration {
            kind,
            elements: resolve_all(items, table)?,
            bound: bound
                .map(|bound| resolve_run(bound, table).map(Box::new))
                .transpose()?,
            span,
        }),
        ContainerBody::Comprehension {
            template,
            generators,
        } => Ok(Expr::Comprehension {
            kind,
            template: Box::new(resolve_run(template, table)?),
            generators: resolve_all(generators, table)?,
            span,
        }),
    }
}
