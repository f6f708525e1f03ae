#![allow(clippy::module_inception)]

use std::{panic, sync::Arc, thread};

use tracing::debug;

use crate::{
    ast::statements::Script,
    errors::errors::{Error, ErrorTip},
    lexer::lexer::{tokenize_with_trivia, Trivia},
    parser::parser::parse,
};

pub use crate::parser::parser::{ParseMode, ParseOptions};

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod modules;
pub mod parser;

extern crate regex;

/// A byte offset into a named source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(pub u32, pub Arc<String>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    pub fn point(position: Position) -> Self {
        Span {
            start: position.clone(),
            end: position,
        }
    }

    /// From the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}

/// One named source text to parse.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub name: String,
    pub source: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        SourceUnit {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// The result of parsing one unit. `script` holds every statement that
/// parsed; `diagnostics` everything that did not, in source order.
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub file: Arc<String>,
    pub script: Script,
    pub diagnostics: Vec<Error>,
    pub trivia: Vec<Trivia>,
    pub cancelled: bool,
}

impl ParsedUnit {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && !self.cancelled
    }
}

pub fn parse_source(source: &str, file: Option<String>) -> Result<ParsedUnit, Error> {
    parse_source_with(source, file, &ParseOptions::default())
}

/// Lexes and parses one unit with its own precedence table.
///
/// Returns `Err` only for the fatal lexical conditions (an unterminated
/// string or block comment at end of input); every other problem is a
/// diagnostic in the returned unit.
pub fn parse_source_with(
    source: &str,
    file: Option<String>,
    options: &ParseOptions,
) -> Result<ParsedUnit, Error> {
    let lexed = tokenize_with_trivia(source, file)?;
    let file = Arc::clone(&lexed.file);
    let token_count = lexed.tokens.len();

    let (parser, script) = parse(lexed.tokens, lexed.errors, Arc::clone(&file), options);
    let cancelled = parser.was_cancelled();
    let diagnostics = parser.into_diagnostics();

    debug!(
        file = %file,
        tokens = token_count,
        statements = script.body.len(),
        diagnostics = diagnostics.len(),
        "parsed unit"
    );

    Ok(ParsedUnit {
        file,
        script,
        diagnostics,
        trivia: lexed.trivia,
        cancelled,
    })
}

/// Parses independent units in parallel, one scoped thread per unit.
/// Results come back in input order.
pub fn parse_units(units: Vec<SourceUnit>, options: &ParseOptions) -> Vec<Result<ParsedUnit, Error>> {
    thread::scope(|scope| {
        let handles: Vec<_> = units
            .into_iter()
            .map(|unit| {
                scope.spawn(move || parse_source_with(&unit.source, Some(unit.name), options))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(payload) => panic::resume_unwind(payload),
            })
            .collect()
    })
}

/// Finds the line containing byte offset `position`.
///
/// Returns the 1-based line number, the line text and the offset of
/// `position` within the line. Offsets past the end land on the last line.
pub fn get_line_at_position(source: &str, position: u32) -> (usize, String, usize) {
    let pos = (position as usize).min(source.len());

    let mut start = 0;
    let mut line_number = 1;

    for line in source.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return (line_number, line.to_string(), pos - start);
        }

        if end == source.len() && !line.ends_with('\n') {
            return (line_number, line.to_string(), pos - start);
        }

        start = end;
        line_number += 1;
    }

    (line_number, String::new(), 0)
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_get_line_at_position() {
        let source = "Hello, world!\nfoo\n\nTesting { }\n";

        let (line_number, line, line_pos) = super::get_line_at_position(source, 10);
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(source, 27);
        assert_eq!(line_number, 4);
        assert_eq!(line, "Testing { }\n");
        assert_eq!(line_pos, 8);
    }

    #[test]
    fn test_get_line_at_end_of_input() {
        let (line_number, line, line_pos) = super::get_line_at_position("a = 1", 5);
        assert_eq!(line_number, 1);
        assert_eq!(line, "a = 1");
        assert_eq!(line_pos, 5);

        let (line_number, line, line_pos) = super::get_line_at_position("a;\n", 99);
        assert_eq!(line_number, 2);
        assert_eq!(line, "");
        assert_eq!(line_pos, 0);
    }

    #[test]
    fn test_render_error_counts_characters() {
        let source = "x = \"é\" |+| b;\n";
        let unit = super::parse_source(source, None).unwrap();
        let rendered = super::render_error(&unit.diagnostics[0], source, "main.q");

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[lines.len() - 2], "1 | x = \"é\" |+| b;");
        assert_eq!(lines[lines.len() - 1], "  | --------^");
    }

    #[test]
    fn test_span_to() {
        use super::{Position, Span};
        use std::sync::Arc;

        let file = Arc::new(String::from("t.q"));
        let a = Span::new(Position(0, Arc::clone(&file)), Position(2, Arc::clone(&file)));
        let b = Span::new(Position(5, Arc::clone(&file)), Position(9, Arc::clone(&file)));
        let joined = a.to(&b);
        assert_eq!(joined.start.0, 0);
        assert_eq!(joined.end.0, 9);
    }
}

/// Formats a diagnostic in caret style against its source text.
pub fn render_error(error: &Error, source: &str, file: &str) -> String {
    /*
        Error: name (tip)
        -> main.q
           |
        20 | foo X = X < 1 < 2;
           | --------------^
    */

    let position = error.get_position();
    let (line, line_text, line_pos) = get_line_at_position(source, position.0);

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    let mut out = String::new();
    match error.get_tip() {
        ErrorTip::None => out.push_str(&format!("Error: {}\n", error.get_error_name())),
        tip => out.push_str(&format!("Error: {} ({})\n", error.get_error_name(), tip)),
    }
    out.push_str(&format!("  {}\n", error.get_error_impl()));
    out.push_str(&format!("-> {}\n", file));
    out.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    out.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let column = line_text
        .get(..line_pos)
        .map_or(line_pos, |prefix| prefix.chars().count());
    let arrows = column.saturating_sub(removed_whitespace) + 1;
    out.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    out
}

pub fn display_error(error: &Error, source: &str, file: &str) {
    eprint!("{}", render_error(error, source, file));
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}
