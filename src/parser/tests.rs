//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Operator resolution against built-in and declared fixities
//! - Juxtaposition, lambdas, sections and conditionals
//! - Containers, enumerations and comprehensions
//! - Declarations, equations and continuation clauses
//! - Error recovery, fail-fast mode and cancellation

use std::sync::{atomic::AtomicBool, Arc};

use crate::{
    ast::{
        ast::{Identifier, IdentifierClass},
        expressions::{Expr, NumberValue},
        statements::{Declaration, Definition, Header, Script, Statement},
    },
    errors::errors::{ErrorImpl, ErrorKind},
    lexer::lexer::tokenize_with_trivia,
};

use super::{
    lookups::{BindingPower, Fixity, OperatorEntry, OperatorRole, PrecedenceTable},
    parser::{parse, ParseMode, ParseOptions, Parser},
    resolve::resolve_run,
    run::{parse_run, RunContext},
};

fn parse_with(source: &str, options: &ParseOptions) -> (Parser, Script) {
    let output = tokenize_with_trivia(source, Some("test.q".to_string())).unwrap();
    parse(output.tokens, output.errors, output.file, options)
}

fn parse_text(source: &str) -> (Parser, Script) {
    parse_with(source, &ParseOptions::default())
}

/// Right-hand side of the first clause of the `index`th statement.
fn rhs(script: &Script, index: usize) -> String {
    match &script.body[index] {
        Statement::Definition(Definition::Equation { clauses, .. }) => clauses[0].rhs.to_string(),
        other => panic!("expected an equation, got {}", other),
    }
}

/// Parses `x = <expr>;` and renders the resolved expression.
fn expr(source: &str) -> String {
    let (parser, script) = parse_text(&format!("x = {};", source));
    assert!(
        parser.diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        parser.diagnostics()
    );
    rhs(&script, 0)
}

fn first_error(source: &str) -> ErrorImpl {
    let (parser, _) = parse_text(source);
    parser
        .diagnostics()
        .first()
        .expect("expected a diagnostic")
        .get_error_impl()
        .clone()
}

#[test]
fn test_multiplicative_binds_tighter() {
    assert_eq!(expr("a + b * c"), "(+ a (* b c))");
    assert_eq!(expr("a * b + c"), "(+ (* a b) c)");
}

#[test]
fn test_associativity() {
    assert_eq!(expr("a - b - c"), "(- (- a b) c)");
    assert_eq!(expr("a ^ b ^ c"), "(^ a (^ b c))");
    assert_eq!(expr("a || b || c"), "(|| (|| a b) c)");
    assert_eq!(expr("f $ g $ y"), "($ f ($ g y))");
}

#[test]
fn test_relational_chain_is_ambiguous() {
    let (parser, script) = parse_text("x = a < b < c;");

    assert_eq!(rhs(&script, 0), "<error>");
    assert_eq!(parser.diagnostics().len(), 1);
    assert!(matches!(
        parser.diagnostics()[0].get_error_impl(),
        ErrorImpl::AmbiguousChain { left, right } if left == "<" && right == "<"
    ));
    assert_eq!(parser.diagnostics()[0].get_error_kind(), ErrorKind::Resolution);
}

#[test]
fn test_juxtaposition() {
    assert_eq!(expr("f x y"), "(app (app f x) y)");
    assert_eq!(expr("f a + g b"), "(+ (app f a) (app g b))");
    assert_eq!(expr("f (g x)"), "(app f (app g x))");
}

#[test]
fn test_prefix_operators() {
    assert_eq!(expr("- a * b"), "(* (pre - a) b)");
    assert_eq!(expr("a * - b"), "(* a (pre - b))");
    assert_eq!(expr("- a ^ 2"), "(pre - (^ a 2))");
    assert_eq!(expr("not a and b"), "(and (pre not a) b)");
    assert_eq!(expr("- f x"), "(pre - (app f x))");
}

#[test]
fn test_quotation_and_composition() {
    assert_eq!(expr("'f x"), "(app (' f) x)");
    assert_eq!(expr("f . g"), "(. f g)");
    assert_eq!(expr("f . g x"), "(. f (app g x))");
}

#[test]
fn test_keyword_operators() {
    assert_eq!(expr("a and then b or else c"), "(or else (and then a b) c)");
    assert_eq!(expr("a div b mod c"), "(mod (div a b) c)");
}

#[test]
fn test_declarations_take_effect_in_order() {
    let source = "public (|+|) X Y @ 6;\n\
                  a = x |+| y * z;\n\
                  public (|+|) X Y @ 10;\n\
                  b = x |+| y * z;";
    let (parser, script) = parse_text(source);

    assert!(parser.diagnostics().is_empty());
    assert_eq!(rhs(&script, 1), "(|+| x (* y z))");
    assert_eq!(rhs(&script, 3), "(* (|+| x y) z)");

    let entry = parser.table().lookup("|+|", OperatorRole::Infix).unwrap();
    assert_eq!(entry.precedence, 10);
    assert_eq!(entry.fixity, Fixity::InfixLeft);
}

#[test]
fn test_undeclared_operator() {
    let (parser, script) = parse_text("x = a |+| b;");

    assert_eq!(rhs(&script, 0), "<error>");
    assert!(matches!(
        parser.diagnostics()[0].get_error_impl(),
        ErrorImpl::UndeclaredOperator { operator } if operator == "|+|"
    ));
}

#[test]
fn test_header_without_precedence_keeps_table() {
    let (parser, _) = parse_text("public (|+|) X Y;\nx = a |+| b;");

    assert_eq!(parser.table(), &PrecedenceTable::new());
    assert!(matches!(
        parser.diagnostics()[0].get_error_impl(),
        ErrorImpl::UndeclaredOperator { .. }
    ));
}

#[test]
fn test_band_associativity_of_declared_operators() {
    let (parser, script) = parse_text("public (=>) X Y @ 4;\nx = a => b => c;");

    assert!(parser.diagnostics().is_empty());
    assert_eq!(rhs(&script, 1), "(=> a (=> b c))");
}

#[test]
fn test_alphabetic_operators() {
    let source = "public (plus) X Y @ 6, (neg) X @ 8;\n\
                  a = x plus y * z;\n\
                  b = neg x * y;\n\
                  c = (plus 1);\n\
                  d = (neg);";
    let (parser, script) = parse_text(source);

    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics());
    assert_eq!(rhs(&script, 1), "(plus x (* y z))");
    assert_eq!(rhs(&script, 2), "(* (pre neg x) y)");
    assert_eq!(rhs(&script, 3), "(section _ plus 1)");
    assert_eq!(rhs(&script, 4), "(op neg)");
}

#[test]
fn test_precedence_copied_from_operator() {
    let (parser, script) = parse_text("public (<+>) X Y @ (*);\nx = a <+> b + c;");

    assert!(parser.diagnostics().is_empty());
    assert_eq!(rhs(&script, 1), "(+ (<+> a b) c)");
    assert_eq!(
        parser.table().lookup("<+>", OperatorRole::Infix).unwrap().precedence,
        BindingPower::Multiplicative.level()
    );
}

#[test]
fn test_invalid_precedence_declarations() {
    assert!(matches!(
        first_error("public (<+>) X Y @ 14;"),
        ErrorImpl::InvalidPrecedence { value } if value == "14"
    ));
    assert!(matches!(
        first_error("public (<+>) X Y @ (nope);"),
        ErrorImpl::UndeclaredOperator { operator } if operator == "nope"
    ));
}

#[test]
fn test_failed_declaration_leaves_table_unchanged() {
    for source in [
        "public (<+>) X Y @ 6, (<->) X Y @ 99;\nx = a <+> b;",
        "type Num = (<+>) X Y @ 6, (<->) X Y @ 99;\nx = a <+> b;",
    ] {
        let (parser, script) = parse_text(source);

        assert_eq!(script.body.len(), 1);
        assert_eq!(rhs(&script, 0), "<error>");
        assert_eq!(parser.table(), &PrecedenceTable::new());
        assert!(matches!(
            parser.diagnostics()[0].get_error_impl(),
            ErrorImpl::InvalidPrecedence { value } if value == "99"
        ));
        assert!(matches!(
            parser.diagnostics()[1].get_error_impl(),
            ErrorImpl::UndeclaredOperator { operator } if operator == "<+>"
        ));
    }
}

#[test]
fn test_postfix_entries() {
    let output = tokenize_with_trivia("a ? + b ?", None).unwrap();
    let mut parser = Parser::new(output.tokens, output.errors, output.file);
    parser
        .table_mut()
        .declare_entry(OperatorEntry::new("?", BindingPower::Exponent, Fixity::Postfix));

    let run = parse_run(&mut parser, RunContext::default()).unwrap();
    let resolved = resolve_run(run, parser.table()).unwrap();

    assert_eq!(resolved.to_string(), "(+ (post ? a) (post ? b))");
}

#[test]
fn test_missing_operands() {
    assert!(matches!(
        first_error("x = a +;"),
        ErrorImpl::MissingOperand { operator, .. } if operator == "+"
    ));
    assert!(matches!(
        first_error("x = * a;"),
        ErrorImpl::MissingOperand { operator, .. } if operator == "*"
    ));
    assert!(matches!(first_error("x = ;"), ErrorImpl::EmptyRun));
}

#[test]
fn test_lambda() {
    assert_eq!(expr("\\X.X + 1 * Y"), "(lambda [X] (+ X (* 1 Y)))");
    assert_eq!(expr("\\X Y.X"), "(lambda [X Y] X)");
    assert_eq!(expr("1 + \\X.X"), "(+ 1 (lambda [X] X))");
    assert_eq!(expr("(\\X.X) y"), "(app (lambda [X] X) y)");
    assert_eq!(expr("\\X.-X"), "(lambda [X] (pre - X))");
    assert_eq!(expr("\\X.'X"), "(lambda [X] (' X))");
}

#[test]
fn test_malformed_lambda() {
    assert!(matches!(first_error("x = \\.X;"), ErrorImpl::MalformedLambda { .. }));
    assert!(matches!(first_error("x = \\X + Y.X;"), ErrorImpl::MalformedLambda { .. }));
}

#[test]
fn test_sections() {
    assert_eq!(expr("(+ 1)"), "(section _ + 1)");
    assert_eq!(expr("(1 +)"), "(section 1 + _)");
    assert_eq!(expr("(- 1)"), "(pre - 1)");
    assert_eq!(expr("(+)"), "(op +)");
    assert_eq!(expr("(* 2 . f)"), "(section _ * (. 2 f))");
}

#[test]
fn test_conditionals() {
    assert_eq!(expr("if a < 0 then - a else a"), "(if (< a 0) (pre - a) a)");
    assert_eq!(expr("if a then b"), "(if a b)");
    assert_eq!(expr("if a then b else c + 1"), "(if a b (+ c 1))");
    assert_eq!(expr("(f if a then b else c)"), "(app f (if a b c))");
}

#[test]
fn test_containers() {
    assert_eq!(expr("[1, 2, 3]"), "(list 1 2 3)");
    assert_eq!(expr("(1, 2)"), "(tuple 1 2)");
    assert_eq!(expr("()"), "(tuple)");
    assert_eq!(expr("(a,)"), "(tuple a)");
    assert_eq!(expr("{1; 2}"), "(set 1 2)");
    assert_eq!(expr("[X | Xs]"), "(list X | Xs)");
    assert_eq!(expr("[1, 2 | Xs]"), "(list 1 2 | Xs)");
    assert_eq!(expr("(a)"), "a");
    assert_eq!(expr("[1, 2,]"), "(list 1 2)");
}

#[test]
fn test_enumerations_and_comprehensions() {
    assert_eq!(expr("[1..5]"), "(list 1 .. 5)");
    assert_eq!(expr("[1, 3..9]"), "(list 1 3 .. 9)");
    assert_eq!(expr("[1..]"), "(list 1 ..)");
    assert_eq!(expr("[X * 2 : X = L]"), "(list (* X 2) : (= X L))");
    assert_eq!(expr("{X : X = L, X > 1}"), "(set X : (= X L) (> X 1))");
}

#[test]
fn test_container_errors() {
    assert!(matches!(first_error("x = [..5];"), ErrorImpl::MalformedEnumeration));
    assert!(matches!(first_error("x = [1, 2; 3];"), ErrorImpl::MixedSeparators));
    assert!(matches!(
        first_error("x = (1, 2];"),
        ErrorImpl::MismatchedDelimiter { expected, found } if expected == ")" && found == "]"
    ));
    assert!(matches!(
        first_error("x = (1, 2"),
        ErrorImpl::UnexpectedEof { expected } if expected == ")"
    ));
}

#[test]
fn test_typed_variables() {
    let (parser, script) = parse_text("f X:int = X;");

    assert!(parser.diagnostics().is_empty());
    assert_eq!(script.body[0].to_string(), "(equation (app f X:int) [= X])");
}

#[test]
fn test_identifier_casing() {
    let (_, script) = parse_text("f Foo = Mod::foo;");

    let Statement::Definition(Definition::Equation { lhs, clauses, .. }) = &script.body[0] else {
        panic!("expected an equation");
    };
    let Expr::Application { argument, .. } = lhs else {
        panic!("expected an application");
    };
    assert!(matches!(
        argument.as_ref(),
        Expr::Ident { ident, .. } if ident.is_variable()
    ));

    match &clauses[0].rhs {
        Expr::Ident {
            ident: Identifier::Qualified(module, name),
            ..
        } => {
            assert_eq!(module, "Mod");
            assert_eq!(name.class, IdentifierClass::Function);
        }
        other => panic!("expected a qualified identifier, got {}", other),
    }
}

#[test]
fn test_number_literals() {
    let (_, script) = parse_text("x = 0x1F;\ny = 017;\nz = 2.5E-3;");

    let values: Vec<NumberValue> = script
        .equations()
        .map(|definition| match definition {
            Definition::Equation { clauses, .. } => match &clauses[0].rhs {
                Expr::NumberLit { literal, .. } => literal.value.clone(),
                other => panic!("expected a number, got {}", other),
            },
            _ => unreachable!(),
        })
        .collect();

    assert_eq!(values[0], NumberValue::Integer(31));
    assert_eq!(values[1], NumberValue::Integer(15));
    assert_eq!(values[2], NumberValue::Float(2.5e-3));
}

#[test]
fn test_guards_and_continuations() {
    let source = "fact N = N * fact (N - 1) if N > 0;\n\
                  \x20    = 1 otherwise;";
    let (parser, script) = parse_text(source);

    assert!(parser.diagnostics().is_empty());
    assert_eq!(script.body.len(), 1);
    assert_eq!(
        script.body[0].to_string(),
        "(equation (app fact N) [= (* N (app fact (- N 1))) if (> N 0)] [= 1 otherwise])"
    );
    assert_eq!(script.body[0].get_span().end.0 as usize, source.len());
}

#[test]
fn test_where_and_leading_qualifiers() {
    let (parser, script) = parse_text("f X = Y * 2 where Y = X + 1;\ng X if X > 0 : = X;");

    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics());
    assert_eq!(
        script.body[0].to_string(),
        "(equation (app f X) [= (* Y 2) where Y = (+ X 1)])"
    );
    assert_eq!(script.body[1].to_string(), "(equation (app g X) [if (> X 0) = X])");
}

#[test]
fn test_orphan_continuation() {
    let (parser, script) = parse_text("= 1;\nf = 2;\n= 3;\nimport m;\n= 4;");

    assert_eq!(parser.diagnostics().len(), 2);
    assert!(parser
        .diagnostics()
        .iter()
        .all(|error| matches!(error.get_error_impl(), ErrorImpl::OrphanContinuation)));
    assert_eq!(script.body.len(), 2);
    assert_eq!(script.body[0].to_string(), "(equation f [= 2] [= 3])");
}

#[test]
fn test_def_and_undef() {
    let (parser, script) = parse_text("def X = 1, Y = 2;\nundef foo, Bar;");

    assert!(parser.diagnostics().is_empty());
    assert_eq!(script.body[0].to_string(), "(def [X = 1] [Y = 2])");
    assert_eq!(script.body[1].to_string(), "(undef foo Bar)");
}

#[test]
fn test_imports() {
    let (parser, script) =
        parse_text("import list as l, \"path/x.q\";\ninclude prelude;\nfrom dict import foo as bar, (++);");

    assert!(parser.diagnostics().is_empty());
    assert_eq!(script.body[0].to_string(), "(Import list as l path/x.q)");
    assert_eq!(script.body[1].to_string(), "(Include prelude)");
    assert_eq!(script.body[2].to_string(), "(from dict Import foo as bar (++))");
}

#[test]
fn test_headers() {
    let (parser, script) = parse_text(
        "var X = 1 + 2;\npublic foo X Y, (=>) X Y @ 4;\npublic special (?=) ~X Y @ 5;",
    );

    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics());
    assert_eq!(script.body[0].to_string(), "(declare Var X = (+ 1 2))");
    assert_eq!(script.body[1].to_string(), "(declare Public foo X Y, (=>) X Y @ 4)");
    assert_eq!(script.body[2].to_string(), "(declare Public Special (?=) ~X Y @ 5)");

    let Statement::Declaration(Declaration::OperatorHeader { headers, .. }) = &script.body[2] else {
        panic!("expected an operator header");
    };
    let Header::Symbol { params, .. } = &headers[0] else {
        panic!("expected a symbol header");
    };
    assert!(params[0].special);
    assert!(!params[1].special);
}

#[test]
fn test_type_declarations() {
    let source = "public type Bool = const false, true;\n\
                  extern type Handle;\n\
                  type Tree : Node = const leaf | public node X Y;\n\
                  type Mod::T as U;\n\
                  type T == U;";
    let (parser, script) = parse_text(source);

    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics());
    assert_eq!(script.body[0].to_string(), "(type Bool | Const false, true)");
    assert_eq!(script.body[1].to_string(), "(extern type Handle)");
    assert_eq!(
        script.body[2].to_string(),
        "(type Tree : Node | Const leaf | Public node X Y)"
    );
    assert_eq!(script.body[3].to_string(), "(type Mod::T as U)");
    assert_eq!(script.body[4].to_string(), "(type T == U)");
}

#[test]
fn test_type_sections_declare_operators() {
    let (parser, script) = parse_text("type Num = (<+>) X Y @ 6;\nx = a <+> b;");

    assert!(parser.diagnostics().is_empty());
    assert_eq!(rhs(&script, 1), "(<+> a b)");
}

#[test]
fn test_only_extern_may_prefix_type() {
    assert!(matches!(
        first_error("const type T;"),
        ErrorImpl::UnexpectedTokenDetailed { .. }
    ));
}

#[test]
fn test_pragma() {
    let (parser, script) = parse_text("@ -5;\n@ 2\nf = 1;");

    assert!(parser.diagnostics().is_empty());
    assert_eq!(script.body.len(), 3);
    assert_eq!(script.body[0].to_string(), "(@ -5)");
    assert_eq!(script.body[1].to_string(), "(@ 2)");
}

#[test]
fn test_resolution_errors_keep_statements() {
    let (parser, script) = parse_text("a = 1 < 2 < 3;\nb = 1 $$ 2;\nc = 3;");

    assert_eq!(script.body.len(), 3);
    assert_eq!(parser.diagnostics().len(), 2);
    assert!(matches!(
        parser.diagnostics()[0].get_error_impl(),
        ErrorImpl::AmbiguousChain { .. }
    ));
    assert!(matches!(
        parser.diagnostics()[1].get_error_impl(),
        ErrorImpl::UndeclaredOperator { .. }
    ));
    assert_eq!(rhs(&script, 2), "3");
}

#[test]
fn test_batch_resynchronizes_after_structural_errors() {
    let (parser, script) = parse_text("x = 019;\n) = 1;\ny = 2;");

    assert_eq!(parser.diagnostics().len(), 2);
    assert!(matches!(
        parser.diagnostics()[0].get_error_impl(),
        ErrorImpl::InvalidNumber { .. }
    ));
    assert_eq!(parser.diagnostics()[1].get_error_kind(), ErrorKind::Structural);
    assert_eq!(script.body.len(), 1);
    assert_eq!(rhs(&script, 0), "2");
}

#[test]
fn test_fail_fast_stops_at_first_diagnostic() {
    let (parser, script) = parse_with(
        "a = 1 < 2 < 3;\nb = 1 $$ 2;",
        &ParseOptions {
            mode: ParseMode::FailFast,
            cancel: None,
        },
    );

    assert_eq!(parser.diagnostics().len(), 1);
    assert_eq!(script.body.len(), 1);
}

#[test]
fn test_cancellation_between_statements() {
    let options = ParseOptions {
        mode: ParseMode::Batch,
        cancel: Some(Arc::new(AtomicBool::new(true))),
    };
    let (parser, script) = parse_with("a = 1;\nb = 2;", &options);

    assert!(parser.was_cancelled());
    assert!(script.body.is_empty());
}

#[test]
fn test_shebang_and_comments() {
    let (parser, script) = parse_text("#!/usr/bin/q\n// leading\nf = 1; /* trailing */");

    assert!(parser.diagnostics().is_empty());
    assert_eq!(script.body.len(), 1);
}
