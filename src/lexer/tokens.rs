use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("if", TokenKind::If);
        map.insert("then", TokenKind::Then);
        map.insert("else", TokenKind::Else);
        map.insert("where", TokenKind::Where);
        map.insert("otherwise", TokenKind::Otherwise);
        map.insert("var", TokenKind::Var);
        map.insert("def", TokenKind::Def);
        map.insert("undef", TokenKind::Undef);
        map.insert("import", TokenKind::Import);
        map.insert("include", TokenKind::Include);
        map.insert("from", TokenKind::From);
        map.insert("as", TokenKind::As);
        map.insert("type", TokenKind::Type);
        map.insert("extern", TokenKind::Extern);
        map.insert("private", TokenKind::Private);
        map.insert("public", TokenKind::Public);
        map.insert("const", TokenKind::Const);
        map.insert("special", TokenKind::Special);
        map.insert("virtual", TokenKind::Virtual);
        map.insert("div", TokenKind::Div);
        map.insert("mod", TokenKind::Mod);
        map.insert("not", TokenKind::Not);
        map.insert("and", TokenKind::And);
        map.insert("or", TokenKind::Or);
        map
    };

    /// Punctuation spellings. An operator run that spells exactly one of
    /// these is punctuation rather than a user operator symbol.
    pub static ref PUNCTUATION_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("(", TokenKind::OpenParen);
        map.insert(")", TokenKind::CloseParen);
        map.insert("[", TokenKind::OpenBracket);
        map.insert("]", TokenKind::CloseBracket);
        map.insert("{", TokenKind::OpenCurly);
        map.insert("}", TokenKind::CloseCurly);
        map.insert(",", TokenKind::Comma);
        map.insert(";", TokenKind::Semicolon);
        map.insert(":", TokenKind::Colon);
        map.insert("::", TokenKind::DoubleColon);
        map.insert(".", TokenKind::Dot);
        map.insert("..", TokenKind::DotDot);
        map.insert("=", TokenKind::Assignment);
        map.insert("==", TokenKind::Equals);
        map.insert("@", TokenKind::At);
        map.insert("~", TokenKind::Tilde);
        map.insert("|", TokenKind::Pipe);
        map.insert("`", TokenKind::Backquote);
        map.insert("'", TokenKind::Quote);
        map.insert("&", TokenKind::Ampersand);
        map.insert("\\", TokenKind::Backslash);
        map.insert("$", TokenKind::Dollar);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    /// Placeholder for a recoverable lexical error; the diagnostic itself is
    /// recorded alongside the token stream.
    Error,

    VariableIdentifier,
    FunctionIdentifier,
    OperatorSymbol,
    Number,
    String,

    // Punctuation
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    Comma,
    Semicolon,
    Colon,
    DoubleColon,
    Dot,
    DotDot,
    Assignment, // =
    Equals,     // ==
    At,
    Tilde,
    Pipe,
    Backquote,
    Quote,
    Ampersand,
    Backslash,
    Dollar,

    // Reserved
    If,
    Then,
    Else,
    Where,
    Otherwise,
    Var,
    Def,
    Undef,
    Import,
    Include,
    From,
    As,
    Type,
    Extern,
    Private,
    Public,
    Const,
    Special,
    Virtual,
    Div,
    Mod,
    Not,
    And,
    Or,
}

/// The coarse lexical classes a token falls into.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenCategory {
    VariableIdentifier,
    FunctionIdentifier,
    OperatorSymbol,
    Number,
    String,
    Keyword,
    Punctuation,
    Error,
    Eof,
}

impl TokenKind {
    pub fn category(&self) -> TokenCategory {
        match self {
            TokenKind::EOF => TokenCategory::Eof,
            TokenKind::Error => TokenCategory::Error,
            TokenKind::VariableIdentifier => TokenCategory::VariableIdentifier,
            TokenKind::FunctionIdentifier => TokenCategory::FunctionIdentifier,
            TokenKind::OperatorSymbol => TokenCategory::OperatorSymbol,
            TokenKind::Number => TokenCategory::Number,
            TokenKind::String => TokenCategory::String,
            TokenKind::OpenParen
            | TokenKind::CloseParen
            | TokenKind::OpenBracket
            | TokenKind::CloseBracket
            | TokenKind::OpenCurly
            | TokenKind::CloseCurly
            | TokenKind::Comma
            | TokenKind::Semicolon
            | TokenKind::Colon
            | TokenKind::DoubleColon
            | TokenKind::Dot
            | TokenKind::DotDot
            | TokenKind::Assignment
            | TokenKind::Equals
            | TokenKind::At
            | TokenKind::Tilde
            | TokenKind::Pipe
            | TokenKind::Backquote
            | TokenKind::Quote
            | TokenKind::Ampersand
            | TokenKind::Backslash
            | TokenKind::Dollar => TokenCategory::Punctuation,
            _ => TokenCategory::Keyword,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(
            self,
            TokenKind::VariableIdentifier | TokenKind::FunctionIdentifier
        )
    }

    /// Keywords that behave as operator symbols inside expressions.
    pub fn is_keyword_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Div | TokenKind::Mod | TokenKind::Not | TokenKind::And | TokenKind::Or
        )
    }

    /// Punctuation that doubles as a built-in operator inside expressions.
    pub fn is_operator_punctuation(&self) -> bool {
        matches!(
            self,
            TokenKind::Dot
                | TokenKind::Assignment
                | TokenKind::Equals
                | TokenKind::Tilde
                | TokenKind::Backquote
                | TokenKind::Quote
                | TokenKind::Ampersand
                | TokenKind::Dollar
        )
    }

}

/// Kind of an operator-character run: punctuation if it spells one,
/// otherwise a user operator symbol.
pub fn operator_kind(value: &str) -> TokenKind {
    PUNCTUATION_LOOKUP
        .get(value)
        .copied()
        .unwrap_or(TokenKind::OperatorSymbol)
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Module part of a qualified name (`Mod::foo`, `Mod::++`).
    pub module: Option<String>,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.module {
            Some(module) => write!(
                f,
                "Token {{\nkind: {},\nvalue: {}::{}}}",
                self.kind, module, self.value
            ),
            None => write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value),
        }
    }
}

impl Token {
    fn is_one_of_many(&self, tokens: &[TokenKind]) -> bool {
        tokens.contains(&self.kind)
    }

    pub fn category(&self) -> TokenCategory {
        self.kind.category()
    }

    pub fn is_qualified(&self) -> bool {
        self.module.is_some()
    }

    /// The source spelling, including any module qualifier.
    pub fn qualified_value(&self) -> String {
        match &self.module {
            Some(module) => format!("{}::{}", module, self.value),
            None => self.value.clone(),
        }
    }

    pub fn debug(&self) -> String {
        if self.is_one_of_many(&[
            TokenKind::String,
            TokenKind::VariableIdentifier,
            TokenKind::FunctionIdentifier,
            TokenKind::OperatorSymbol,
            TokenKind::Number,
            TokenKind::Error,
        ]) {
            format!("{} ({})", self.kind, self.qualified_value())
        } else {
            format!("{} ()", self.kind)
        }
    }
}
