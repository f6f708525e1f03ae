//! Token construction shorthands shared by the lexer and the parser.

/// `MK_TOKEN!(kind, value, span)` builds an unqualified [`Token`];
/// a fourth argument supplies the `Mod::` qualifier.
///
/// [`Token`]: crate::lexer::tokens::Token
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            module: None,
            span: $span,
        }
    };
    ($kind:expr, $value:expr, $span:expr, $module:expr) => {
        Token {
            kind: $kind,
            value: $value,
            module: $module,
            span: $span,
        }
    };
}

/// Handler for a fixed-spelling punctuation token: emits `$kind` with the
/// literal text and steps over it.
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| -> Result<(), Error> {
            let span = lexer.span_of($value.len());
            lexer.push(MK_TOKEN!($kind, String::from($value), span));
            lexer.advance_n($value.len());
            Ok(())
        }
    };
}
