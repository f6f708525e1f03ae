use std::{collections::BTreeMap, sync::Arc};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{operator_kind, Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex) -> Result<(), Error>;

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    // Order matters: the first pattern matching at the cursor wins.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new(r"^\s+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new(r"^//[^\n]*").unwrap(), handler: line_comment_handler },
        RegexPattern { regex: Regex::new(r"^/\*").unwrap(), handler: block_comment_handler },
        RegexPattern { regex: Regex::new(r"^\p{Lu}[\p{L}\p{N}_]*::[\p{L}_][\p{L}\p{N}_]*").unwrap(), handler: qualified_symbol_handler },
        RegexPattern { regex: Regex::new(r#"^\p{Lu}[\p{L}\p{N}_]*::[\p{P}\p{S}--[()\[\]{},;"_\\]]+"#).unwrap(), handler: qualified_operator_handler },
        RegexPattern { regex: Regex::new(r"^[\p{L}_][\p{L}\p{N}_]*").unwrap(), handler: symbol_handler },
        RegexPattern { regex: Regex::new(r"^(0[xX][0-9a-fA-F]*|[0-9]+(\.[0-9]+)?([eE]-?[0-9]+)?)").unwrap(), handler: number_handler },
        RegexPattern { regex: Regex::new("^\"").unwrap(), handler: string_handler },
        RegexPattern { regex: Regex::new(r"^\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(") },
        RegexPattern { regex: Regex::new(r"^\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")") },
        RegexPattern { regex: Regex::new(r"^\[").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[") },
        RegexPattern { regex: Regex::new(r"^\]").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]") },
        RegexPattern { regex: Regex::new(r"^\{").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{") },
        RegexPattern { regex: Regex::new(r"^\}").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}") },
        RegexPattern { regex: Regex::new(r"^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        RegexPattern { regex: Regex::new(r"^;").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";") },
        RegexPattern { regex: Regex::new(r"^\\").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Backslash, "\\") },
        RegexPattern { regex: Regex::new(r#"^[\p{P}\p{S}--[()\[\]{},;"_\\]]+"#).unwrap(), handler: operator_handler },
    ];

    static ref SHEBANG: Regex = Regex::new(r"^#![^\n]*").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriviaKind {
    LineComment,
    BlockComment,
    Shebang,
}

/// Source text the parser never sees but a pretty-printer could reuse.
#[derive(Debug, Clone, PartialEq)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub span: Span,
}

/// Everything the lexer produces for one unit.
///
/// `errors` is keyed by the index of the `TokenKind::Error` token standing
/// in for the offending text.
#[derive(Debug, Clone)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub trivia: Vec<Trivia>,
    pub errors: BTreeMap<usize, Error>,
    pub file: Arc<String>,
}

pub struct Lexer {
    tokens: Vec<Token>,
    trivia: Vec<Trivia>,
    errors: BTreeMap<usize, Error>,
    source: String,
    pos: usize,
    file: Arc<String>,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = match file {
            Some(file) => Arc::new(file),
            None => Arc::new(String::from("shell")),
        };

        Lexer {
            tokens: vec![],
            trivia: vec![],
            errors: BTreeMap::new(),
            source,
            pos: 0,
            file: file_name,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn position(&self, offset: usize) -> Position {
        Position(offset as u32, Arc::clone(&self.file))
    }

    /// Span from the cursor covering the next `len` bytes.
    pub fn span_of(&self, len: usize) -> Span {
        Span::new(self.position(self.pos), self.position(self.pos + len))
    }

    /// Emits an error token over the next `len` bytes and records its
    /// diagnostic, then moves past it.
    pub fn push_error(&mut self, error: ErrorImpl, len: usize) {
        let span = self.span_of(len);
        let text = self.remainder()[..len].to_string();
        self.errors
            .insert(self.tokens.len(), Error::new(error, span.clone()));
        self.push(MK_TOKEN!(TokenKind::Error, text, span));
        self.advance_n(len);
    }

    fn push_trivia(&mut self, kind: TriviaKind, len: usize) {
        let text = self.remainder()[..len].to_string();
        let span = self.span_of(len);
        self.trivia.push(Trivia { kind, text, span });
        self.advance_n(len);
    }
}

fn matched(lexer: &Lexer, regex: &Regex) -> String {
    regex
        .find(lexer.remainder())
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched(lexer, regex).len();
    lexer.advance_n(len);
    Ok(())
}

fn line_comment_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched(lexer, regex).len();
    lexer.push_trivia(TriviaKind::LineComment, len);
    Ok(())
}

fn block_comment_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    match lexer.remainder()[2..].find("*/") {
        Some(close) => {
            lexer.push_trivia(TriviaKind::BlockComment, close + 4);
            Ok(())
        }
        None => Err(Error::new(
            ErrorImpl::UnterminatedComment,
            lexer.span_of(2),
        )),
    }
}

fn identifier_kind(name: &str) -> TokenKind {
    match name.chars().next() {
        Some(first) if first.is_uppercase() => TokenKind::VariableIdentifier,
        _ if name == "_" => TokenKind::VariableIdentifier,
        _ => TokenKind::FunctionIdentifier,
    }
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let value = matched(lexer, regex);
    let span = lexer.span_of(value.len());

    let kind = match RESERVED_LOOKUP.get(value.as_str()) {
        Some(kind) => *kind,
        None => identifier_kind(&value),
    };

    lexer.advance_n(value.len());
    lexer.push(MK_TOKEN!(kind, value, span));
    Ok(())
}

fn qualified_symbol_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let value = matched(lexer, regex);
    let span = lexer.span_of(value.len());
    let len = value.len();

    if let Some((module, name)) = value.split_once("::") {
        let kind = identifier_kind(name);
        lexer.push(MK_TOKEN!(
            kind,
            name.to_string(),
            span,
            Some(module.to_string())
        ));
    }

    lexer.advance_n(len);
    Ok(())
}

fn qualified_operator_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let value = matched(lexer, regex);

    if let Some((module, symbol)) = value.split_once("::") {
        let symbol = cut_before_comment(symbol);
        let len = module.len() + 2 + symbol.len();
        let span = lexer.span_of(len);
        lexer.push(MK_TOKEN!(
            TokenKind::OperatorSymbol,
            symbol.to_string(),
            span,
            Some(module.to_string())
        ));
        lexer.advance_n(len);
    }

    Ok(())
}

fn cut_before_comment(run: &str) -> &str {
    let cut = [run.find("//"), run.find("/*")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(run.len());
    &run[..cut]
}

fn operator_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let run = matched(lexer, regex);
    let mut value = cut_before_comment(&run).to_string();

    // `@` never glues to what follows it
    if value.starts_with('@') {
        value = String::from("@");
    }

    let span = lexer.span_of(value.len());
    let kind = operator_kind(&value);

    lexer.advance_n(value.len());
    lexer.push(MK_TOKEN!(kind, value, span));
    Ok(())
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let value = matched(lexer, regex);
    let len = value.len();

    let is_octal = value.len() > 1
        && value.starts_with('0')
        && value.chars().all(|c| c.is_ascii_digit());

    let bare_hex = value.len() == 2 && value[1..].eq_ignore_ascii_case("x");

    if bare_hex || (is_octal && value.chars().any(|c| c == '8' || c == '9')) {
        lexer.push_error(ErrorImpl::InvalidNumber { token: value }, len);
        return Ok(());
    }

    let span = lexer.span_of(len);
    lexer.push(MK_TOKEN!(TokenKind::Number, value, span));
    lexer.advance_n(len);
    Ok(())
}

enum StringEnd {
    Closed(usize),
    Newline(usize),
}

fn string_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    let mut result = String::new();
    let mut invalid: Option<String> = None;
    let mut end = None;

    let mut chars = lexer.remainder().char_indices().skip(1).peekable();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '"' => {
                end = Some(StringEnd::Closed(index + 1));
                break;
            }
            '\n' => {
                end = Some(StringEnd::Newline(index));
                break;
            }
            '\\' => match chars.peek().copied() {
                Some((_, '\n')) | None => continue,
                Some((_, escape)) => {
                    chars.next();
                    match escape {
                        'n' => result.push('\n'),
                        't' => result.push('\t'),
                        'r' => result.push('\r'),
                        '\\' => result.push('\\'),
                        '"' => result.push('"'),
                        '\'' => result.push('\''),
                        '0' => result.push('\0'),
                        'a' => result.push('\u{7}'),
                        'b' => result.push('\u{8}'),
                        'f' => result.push('\u{c}'),
                        'v' => result.push('\u{b}'),
                        'e' => result.push('\u{1b}'),
                        'x' => {
                            let mut hex = String::new();
                            while hex.len() < 2 {
                                match chars.peek() {
                                    Some((_, digit)) if digit.is_ascii_hexdigit() => {
                                        hex.push(*digit);
                                        chars.next();
                                    }
                                    _ => break,
                                }
                            }

                            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                                Some(decoded) if hex.len() == 2 => result.push(decoded),
                                _ => {
                                    invalid.get_or_insert(format!("x{}", hex));
                                }
                            }
                        }
                        other => {
                            invalid.get_or_insert(other.to_string());
                        }
                    }
                }
            },
            _ => result.push(ch),
        }
    }

    match end {
        Some(StringEnd::Closed(len)) => {
            match invalid {
                Some(escape) => lexer.push_error(ErrorImpl::InvalidEscape { escape }, len),
                None => {
                    let span = lexer.span_of(len);
                    lexer.push(MK_TOKEN!(TokenKind::String, result, span));
                    lexer.advance_n(len);
                }
            }
            Ok(())
        }
        Some(StringEnd::Newline(len)) => {
            lexer.push_error(ErrorImpl::NewlineInString, len);
            Ok(())
        }
        None => Err(Error::new(
            ErrorImpl::UnterminatedString,
            lexer.span_of(1),
        )),
    }
}

/// Lexes a whole unit, keeping comments and the shebang line as trivia.
///
/// Recoverable problems become `TokenKind::Error` tokens with their
/// diagnostic in `LexOutput::errors`. Only an unterminated string or block
/// comment running into the end of input is returned as `Err`.
pub fn tokenize_with_trivia(source: &str, file: Option<String>) -> Result<LexOutput, Error> {
    let mut lex = Lexer::new(source.to_string(), file);

    if let Some(shebang) = SHEBANG.find(lex.remainder()) {
        let len = shebang.end();
        lex.push_trivia(TriviaKind::Shebang, len);
    }

    while !lex.at_eof() {
        let mut matched = false;

        for pattern in PATTERNS.iter() {
            if pattern.regex.is_match(lex.remainder()) {
                (pattern.handler)(&mut lex, &pattern.regex)?;
                matched = true;
                break;
            }
        }

        if !matched {
            let len = lex.remainder().chars().next().map_or(1, char::len_utf8);
            let token = lex.remainder()[..len].to_string();
            lex.push_error(ErrorImpl::UnrecognisedToken { token }, len);
        }
    }

    let eof = lex.span_of(0);
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), eof));

    Ok(LexOutput {
        tokens: lex.tokens,
        trivia: lex.trivia,
        errors: lex.errors,
        file: lex.file,
    })
}

/// Strict tokenization: fails on the first lexical error of any kind.
pub fn tokenize(source: &str, file: Option<String>) -> Result<Vec<Token>, Error> {
    let output = tokenize_with_trivia(source, file)?;

    match output.errors.into_values().next() {
        Some(error) => Err(error),
        None => Ok(output.tokens),
    }
}
