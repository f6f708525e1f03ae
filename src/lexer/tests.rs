//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and casing-driven identifier classes
//! - Qualified identifiers and operator symbols
//! - Numeric literals (octal, hex, decimal)
//! - String literals with escape sequences
//! - Operator runs and punctuation
//! - Comments, shebang and error cases

use crate::errors::errors::ErrorImpl;

use super::{
    lexer::{tokenize, tokenize_with_trivia, TriviaKind},
    tokens::{TokenCategory, TokenKind},
};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source, Some("test.q".to_string()))
        .unwrap()
        .iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "if then else where otherwise var def undef import include from as type extern private public const special virtual div mod not and or";
    let tokens = tokenize(source, Some("test.q".to_string())).unwrap();

    assert_eq!(tokens.len(), 25);
    assert_eq!(tokens[0].kind, TokenKind::If);
    assert_eq!(tokens[3].kind, TokenKind::Where);
    assert_eq!(tokens[12].kind, TokenKind::Type);
    assert_eq!(tokens[19].kind, TokenKind::Div);
    assert_eq!(tokens[23].kind, TokenKind::Or);
    assert_eq!(tokens[24].kind, TokenKind::EOF);
    assert!(tokens[..24]
        .iter()
        .all(|t| t.category() == TokenCategory::Keyword));
}

#[test]
fn test_identifier_casing() {
    let tokens = tokenize("Foo foo _ _bar Émile ünter x1", None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::VariableIdentifier);
    assert_eq!(tokens[1].kind, TokenKind::FunctionIdentifier);
    assert_eq!(tokens[2].kind, TokenKind::VariableIdentifier);
    assert_eq!(tokens[3].kind, TokenKind::FunctionIdentifier);
    assert_eq!(tokens[4].kind, TokenKind::VariableIdentifier);
    assert_eq!(tokens[5].kind, TokenKind::FunctionIdentifier);
    assert_eq!(tokens[6].value, "x1");
}

#[test]
fn test_qualified_identifiers() {
    let tokens = tokenize("Mod::foo Mod::Bar Mod::++", None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::FunctionIdentifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[0].module.as_deref(), Some("Mod"));
    assert_eq!(tokens[1].kind, TokenKind::VariableIdentifier);
    assert_eq!(tokens[1].qualified_value(), "Mod::Bar");
    assert_eq!(tokens[2].kind, TokenKind::OperatorSymbol);
    assert_eq!(tokens[2].value, "++");
    assert!(tokens[2].is_qualified());
}

#[test]
fn test_typed_variable_is_not_qualified() {
    assert_eq!(
        kinds("X:int"),
        vec![
            TokenKind::VariableIdentifier,
            TokenKind::Colon,
            TokenKind::FunctionIdentifier,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize("42 3.14 0 017 0x1F 1e10 2.5E-3", None).unwrap();

    let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["42", "3.14", "0", "017", "0x1F", "1e10", "2.5E-3", "EOF"]);
    assert!(tokens[..7].iter().all(|t| t.kind == TokenKind::Number));
}

#[test]
fn test_enumeration_does_not_eat_dots() {
    assert_eq!(
        kinds("1..5"),
        vec![
            TokenKind::Number,
            TokenKind::DotDot,
            TokenKind::Number,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_invalid_octal_is_error_token() {
    let output = tokenize_with_trivia("x = 019;", None).unwrap();

    assert_eq!(output.tokens[2].kind, TokenKind::Error);
    assert_eq!(output.tokens[3].kind, TokenKind::Semicolon);
    assert!(matches!(
        output.errors.get(&2).map(|e| e.get_error_impl()),
        Some(ErrorImpl::InvalidNumber { .. })
    ));
}

#[test]
fn test_bare_hex_prefix_is_error_token() {
    let output = tokenize_with_trivia("x = 0x;\ny = 0X1f;", None).unwrap();

    assert_eq!(output.tokens[2].kind, TokenKind::Error);
    assert_eq!(output.tokens[3].kind, TokenKind::Semicolon);
    assert!(matches!(
        output.errors.get(&2).map(|e| e.get_error_impl()),
        Some(ErrorImpl::InvalidNumber { token }) if token == "0x"
    ));
    assert_eq!(output.tokens[6].kind, TokenKind::Number);
    assert_eq!(output.tokens[6].value, "0X1f");
}

#[test]
fn test_tokenize_strings() {
    let tokens = tokenize(r#""hello" "two words" """#, None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello");
    assert_eq!(tokens[1].value, "two words");
    assert_eq!(tokens[2].value, "");
    assert_eq!(tokens[3].kind, TokenKind::EOF);
}

#[test]
fn test_string_escapes() {
    let tokens = tokenize(r#""a\nb\t\"q\"\\ \x41\e""#, None).unwrap();

    assert_eq!(tokens[0].value, "a\nb\t\"q\"\\ A\u{1b}");
    assert_eq!(tokens[0].span.start.0, 0);
    assert_eq!(tokens[0].span.end.0, 22);
}

#[test]
fn test_invalid_escape_is_recoverable() {
    let output = tokenize_with_trivia(r#"x = "bad\q"; y = 1;"#, None).unwrap();

    assert_eq!(output.tokens[2].kind, TokenKind::Error);
    assert_eq!(output.tokens[3].kind, TokenKind::Semicolon);
    assert_eq!(output.errors.len(), 1);
    assert!(tokenize(r#""bad\q""#, None).is_err());
}

#[test]
fn test_newline_in_string_is_recoverable() {
    let output = tokenize_with_trivia("x = \"broken\ny = 1;", None).unwrap();

    assert_eq!(output.tokens[2].kind, TokenKind::Error);
    assert_eq!(output.tokens[3].value, "y");
    let error = output.errors.get(&2).unwrap();
    assert!(!error.is_fatal());
}

#[test]
fn test_unterminated_string_is_fatal() {
    let error = tokenize_with_trivia("x = \"never closed", None).unwrap_err();

    assert_eq!(error.get_error_name(), "UnterminatedString");
    assert!(error.is_fatal());
    assert_eq!(error.get_position().0, 4);
}

#[test]
fn test_unterminated_comment_is_fatal() {
    let error = tokenize_with_trivia("x = 1; /* open", None).unwrap_err();

    assert_eq!(error.get_error_name(), "UnterminatedComment");
    assert!(error.is_fatal());
}

#[test]
fn test_operator_runs() {
    let tokens = tokenize("a <= b ++ c |+| d == e = f", None).unwrap();

    assert_eq!(tokens[1].kind, TokenKind::OperatorSymbol);
    assert_eq!(tokens[1].value, "<=");
    assert_eq!(tokens[3].value, "++");
    assert_eq!(tokens[5].value, "|+|");
    assert_eq!(tokens[7].kind, TokenKind::Equals);
    assert_eq!(tokens[9].kind, TokenKind::Assignment);
}

#[test]
fn test_punctuation() {
    assert_eq!(
        kinds("( ) [ ] { } , ; : :: . .. @ ~ | ` ' & \\ $"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::DoubleColon,
            TokenKind::Dot,
            TokenKind::DotDot,
            TokenKind::At,
            TokenKind::Tilde,
            TokenKind::Pipe,
            TokenKind::Backquote,
            TokenKind::Quote,
            TokenKind::Ampersand,
            TokenKind::Backslash,
            TokenKind::Dollar,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_brackets_never_join_runs() {
    let tokens = tokenize("(+) [-1]", None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::OpenParen);
    assert_eq!(tokens[1].value, "+");
    assert_eq!(tokens[2].kind, TokenKind::CloseParen);
    assert_eq!(tokens[4].value, "-");
}

#[test]
fn test_at_splits_from_operator_run() {
    assert_eq!(
        kinds("@-5"),
        vec![
            TokenKind::At,
            TokenKind::OperatorSymbol,
            TokenKind::Number,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_lambda_sigil() {
    assert_eq!(
        kinds("\\X.X"),
        vec![
            TokenKind::Backslash,
            TokenKind::VariableIdentifier,
            TokenKind::Dot,
            TokenKind::VariableIdentifier,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_comments_are_trivia() {
    let output = tokenize_with_trivia("a // line\n/* block\n */ b +// tail", None).unwrap();

    let values: Vec<&str> = output.tokens.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["a", "b", "+", "EOF"]);
    assert_eq!(output.trivia.len(), 3);
    assert_eq!(output.trivia[0].kind, TriviaKind::LineComment);
    assert_eq!(output.trivia[1].kind, TriviaKind::BlockComment);
    assert_eq!(output.trivia[1].text, "/* block\n */");
    assert_eq!(output.trivia[2].text, "// tail");
}

#[test]
fn test_shebang_only_on_first_line() {
    let output = tokenize_with_trivia("#!/usr/bin/q\nfoo = 1;", None).unwrap();

    assert_eq!(output.trivia[0].kind, TriviaKind::Shebang);
    assert_eq!(output.trivia[0].text, "#!/usr/bin/q");
    assert_eq!(output.tokens[0].value, "foo");

    let later = tokenize("x\n#!y", None).unwrap();
    assert_eq!(later[1].kind, TokenKind::OperatorSymbol);
    assert_eq!(later[1].value, "#!");
}

#[test]
fn test_unrecognised_character() {
    let output = tokenize_with_trivia("a \u{1} b", None).unwrap();

    assert_eq!(output.tokens[1].kind, TokenKind::Error);
    assert_eq!(output.tokens[2].value, "b");
    assert_eq!(
        output.errors.get(&1).unwrap().get_error_name(),
        "UnrecognisedToken"
    );
}

#[test]
fn test_spans_track_byte_offsets() {
    let tokens = tokenize("foo  = 12;", Some("spans.q".to_string())).unwrap();

    assert_eq!(tokens[0].span.start.0, 0);
    assert_eq!(tokens[0].span.end.0, 3);
    assert_eq!(tokens[1].span.start.0, 5);
    assert_eq!(tokens[2].span.start.0, 7);
    assert_eq!(tokens[2].span.end.0, 9);
    assert_eq!(*tokens[3].span.start.1, "spans.q");
}

#[test]
fn test_default_file_name() {
    let tokens = tokenize("x", None).unwrap();
    assert_eq!(*tokens[0].span.start.1, "shell");
}
