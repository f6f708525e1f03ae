use std::{
    collections::BTreeSet,
    fmt::Display,
    slice::Iter,
};

use crate::Span;

use super::{
    ast::{Identifier, Name, OperatorName},
    expressions::{Expr, NumberLiteral},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Private,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Const,
    Special,
    Extern,
    Var,
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import`: names are visible qualified.
    Import,
    /// `include`: names are visible unqualified and re-exported.
    Include,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleName {
    Identifier(String),
    Path(String),
}

impl ModuleName {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleName::Identifier(name) | ModuleName::Path(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSpec {
    pub module: ModuleName,
    pub alias: Option<Name>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolName {
    Identifier(Name),
    Operator(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSpec {
    pub symbol: SymbolName,
    pub alias: Option<SymbolName>,
    pub span: Span,
}

/// A formal parameter marker in a header. `special` is the `~` prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Name,
    pub special: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrecedenceSpec {
    Level(u8),
    /// `@ (op)`: copy the precedence of an existing operator.
    SameAs(OperatorName),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderName {
    Identifier(Identifier),
    Operator(OperatorName),
}

impl HeaderName {
    pub fn text(&self) -> String {
        match self {
            HeaderName::Identifier(ident) => ident.to_string(),
            HeaderName::Operator(op) => op.qualified(),
        }
    }
}

/// Header
/// One declared name inside an operator/function declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    /// `name = expr`, only valid after `const` or `var`.
    Binding { name: Name, value: Expr, span: Span },
    Symbol {
        name: HeaderName,
        params: Vec<Parameter>,
        precedence: Option<PrecedenceSpec>,
        alias: Option<String>,
        span: Span,
    },
}

impl Header {
    pub fn get_span(&self) -> &Span {
        match self {
            Header::Binding { span, .. } | Header::Symbol { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSection {
    pub scope: Option<Scope>,
    pub modifiers: BTreeSet<Modifier>,
    pub headers: Vec<Header>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub scope: Option<Scope>,
    pub name: Name,
    pub supertype: Option<Identifier>,
    pub sections: Vec<TypeSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Import {
        kind: ImportKind,
        specs: Vec<ModuleSpec>,
        span: Span,
    },
    QualifiedImport {
        module: ModuleSpec,
        kind: ImportKind,
        /// Empty means every public symbol.
        symbols: Vec<SymbolSpec>,
        span: Span,
    },
    OperatorHeader {
        scope: Option<Scope>,
        modifiers: BTreeSet<Modifier>,
        headers: Vec<Header>,
        span: Span,
    },
    TypeDecl {
        definition: TypeDefinition,
        span: Span,
    },
    ExternTypeDecl {
        definition: TypeDefinition,
        span: Span,
    },
    TypeRename {
        scope: Option<Scope>,
        name: Identifier,
        alias: Option<Name>,
        span: Span,
    },
    TypeSynonym {
        scope: Option<Scope>,
        name: Name,
        target: Identifier,
        span: Span,
    },
    PrecedencePragma {
        sign: Option<Sign>,
        value: NumberLiteral,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    If(Expr),
    Otherwise,
}

/// `pattern = value` inside `where` and `def`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub pattern: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Qualifier {
    Condition { condition: Condition, span: Span },
    Where { bindings: Vec<Binding>, span: Span },
}

/// One `= rhs` of an equation, with the qualifiers around it.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationClause {
    pub leading_qualifiers: Vec<Qualifier>,
    pub rhs: Expr,
    pub trailing_qualifiers: Vec<Qualifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Equation {
        lhs: Expr,
        clauses: Vec<EquationClause>,
        span: Span,
    },
    DefAlias {
        pairs: Vec<Binding>,
        span: Span,
    },
    Undef {
        names: Vec<Identifier>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declaration(Declaration),
    Definition(Definition),
}

impl Statement {
    pub fn get_span(&self) -> &Span {
        match self {
            Statement::Declaration(declaration) => match declaration {
                Declaration::Import { span, .. }
                | Declaration::QualifiedImport { span, .. }
                | Declaration::OperatorHeader { span, .. }
                | Declaration::TypeDecl { span, .. }
                | Declaration::ExternTypeDecl { span, .. }
                | Declaration::TypeRename { span, .. }
                | Declaration::TypeSynonym { span, .. }
                | Declaration::PrecedencePragma { span, .. } => span,
            },
            Statement::Definition(definition) => match definition {
                Definition::Equation { span, .. }
                | Definition::DefAlias { span, .. }
                | Definition::Undef { span, .. } => span,
            },
        }
    }
}

/// Root of a parsed compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub body: Vec<Statement>,
    pub span: Span,
}

impl Script {
    pub fn iter(&self) -> Iter<'_, Statement> {
        self.body.iter()
    }

    pub fn equations(&self) -> impl Iterator<Item = &Definition> {
        self.body.iter().filter_map(|stmt| match stmt {
            Statement::Definition(definition @ Definition::Equation { .. }) => Some(definition),
            _ => None,
        })
    }
}

impl Display for SymbolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolName::Identifier(name) => write!(f, "{}", name),
            SymbolName::Operator(op) => write!(f, "({})", op),
        }
    }
}

impl Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Qualifier::Condition {
                condition: Condition::If(expr),
                ..
            } => write!(f, "if {}", expr),
            Qualifier::Condition {
                condition: Condition::Otherwise,
                ..
            } => write!(f, "otherwise"),
            Qualifier::Where { bindings, .. } => {
                write!(f, "where")?;
                for (i, binding) in bindings.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{}{} = {}", sep, binding.pattern, binding.value)?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Header::Binding { name, value, .. } => write!(f, "{} = {}", name, value),
            Header::Symbol {
                name,
                params,
                precedence,
                alias,
                ..
            } => {
                match name {
                    HeaderName::Identifier(ident) => write!(f, "{}", ident)?,
                    HeaderName::Operator(op) => write!(f, "({})", op)?,
                }
                for param in params {
                    let marker = if param.special { "~" } else { "" };
                    write!(f, " {}{}", marker, param.name)?;
                }
                match precedence {
                    Some(PrecedenceSpec::Level(level)) => write!(f, " @ {}", level)?,
                    Some(PrecedenceSpec::SameAs(op)) => write!(f, " @ ({})", op)?,
                    None => {}
                }
                if let Some(alias) = alias {
                    write!(f, " as {}", alias)?;
                }
                Ok(())
            }
        }
    }
}

fn write_headers(f: &mut std::fmt::Formatter<'_>, headers: &[Header]) -> std::fmt::Result {
    for (i, header) in headers.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        write!(f, "{}{}", sep, header)?;
    }
    Ok(())
}

fn write_prefix(
    f: &mut std::fmt::Formatter<'_>,
    scope: &Option<Scope>,
    modifiers: &BTreeSet<Modifier>,
) -> std::fmt::Result {
    if let Some(scope) = scope {
        write!(f, " {:?}", scope)?;
    }
    for modifier in modifiers {
        write!(f, " {:?}", modifier)?;
    }
    Ok(())
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Declaration(declaration) => match declaration {
                Declaration::Import { kind, specs, .. } => {
                    write!(f, "({:?}", kind)?;
                    for spec in specs {
                        write!(f, " {}", spec.module.as_str())?;
                        if let Some(alias) = &spec.alias {
                            write!(f, " as {}", alias)?;
                        }
                    }
                    write!(f, ")")
                }
                Declaration::QualifiedImport {
                    module,
                    kind,
                    symbols,
                    ..
                } => {
                    write!(f, "(from {} {:?}", module.module.as_str(), kind)?;
                    for symbol in symbols {
                        write!(f, " {}", symbol.symbol)?;
                        if let Some(alias) = &symbol.alias {
                            write!(f, " as {}", alias)?;
                        }
                    }
                    write!(f, ")")
                }
                Declaration::OperatorHeader {
                    scope,
                    modifiers,
                    headers,
                    ..
                } => {
                    write!(f, "(declare")?;
                    write_prefix(f, scope, modifiers)?;
                    write_headers(f, headers)?;
                    write!(f, ")")
                }
                Declaration::TypeDecl { definition, .. }
                | Declaration::ExternTypeDecl { definition, .. } => {
                    let keyword = match declaration {
                        Declaration::ExternTypeDecl { .. } => "extern type",
                        _ => "type",
                    };
                    write!(f, "({} {}", keyword, definition.name)?;
                    if let Some(supertype) = &definition.supertype {
                        write!(f, " : {}", supertype)?;
                    }
                    for section in &definition.sections {
                        write!(f, " |")?;
                        write_prefix(f, &section.scope, &section.modifiers)?;
                        write_headers(f, &section.headers)?;
                    }
                    write!(f, ")")
                }
                Declaration::TypeRename { name, alias, .. } => match alias {
                    Some(alias) => write!(f, "(type {} as {})", name, alias),
                    None => write!(f, "(type {})", name),
                },
                Declaration::TypeSynonym { name, target, .. } => {
                    write!(f, "(type {} == {})", name, target)
                }
                Declaration::PrecedencePragma { sign, value, .. } => {
                    let sign = match sign {
                        Some(Sign::Plus) => "+",
                        Some(Sign::Minus) => "-",
                        None => "",
                    };
                    write!(f, "(@ {}{})", sign, value.text)
                }
            },
            Statement::Definition(definition) => match definition {
                Definition::Equation { lhs, clauses, .. } => {
                    write!(f, "(equation {}", lhs)?;
                    for clause in clauses {
                        write!(f, " [")?;
                        for qualifier in &clause.leading_qualifiers {
                            write!(f, "{} ", qualifier)?;
                        }
                        write!(f, "= {}", clause.rhs)?;
                        for qualifier in &clause.trailing_qualifiers {
                            write!(f, " {}", qualifier)?;
                        }
                        write!(f, "]")?;
                    }
                    write!(f, ")")
                }
                Definition::DefAlias { pairs, .. } => {
                    write!(f, "(def")?;
                    for pair in pairs {
                        write!(f, " [{} = {}]", pair.pattern, pair.value)?;
                    }
                    write!(f, ")")
                }
                Definition::Undef { names, .. } => {
                    write!(f, "(undef")?;
                    for name in names {
                        write!(f, " {}", name)?;
                    }
                    write!(f, ")")
                }
            },
        }
    }
}
