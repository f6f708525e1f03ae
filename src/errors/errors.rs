use std::fmt::Display;

use thiserror::Error;

use crate::{Position, Span};

/// Which phase of the front end raised a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lexical,
    Structural,
    Resolution,
    Module,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    span: Span,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, span: Span) -> Self {
        Error {
            internal_error: error_impl,
            span,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.span.start
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    pub fn get_error_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_kind(&self) -> ErrorKind {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnterminatedString
            | ErrorImpl::UnterminatedComment
            | ErrorImpl::NewlineInString
            | ErrorImpl::InvalidEscape { .. }
            | ErrorImpl::InvalidNumber { .. } => ErrorKind::Lexical,
            ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::UnexpectedEof { .. }
            | ErrorImpl::MismatchedDelimiter { .. }
            | ErrorImpl::MixedSeparators
            | ErrorImpl::MalformedEnumeration
            | ErrorImpl::OrphanContinuation
            | ErrorImpl::InvalidPrecedence { .. }
            | ErrorImpl::NumberParseError { .. } => ErrorKind::Structural,
            ErrorImpl::UndeclaredOperator { .. }
            | ErrorImpl::AmbiguousChain { .. }
            | ErrorImpl::MissingOperand { .. }
            | ErrorImpl::EmptyRun
            | ErrorImpl::MalformedLambda { .. } => ErrorKind::Resolution,
            ErrorImpl::UnknownModule { .. } => ErrorKind::Module,
        }
    }

    /// Fatal errors abort the compilation unit; everything else is reported
    /// and parsing resumes at the next statement.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::UnterminatedString | ErrorImpl::UnterminatedComment
        )
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::UnterminatedComment => "UnterminatedComment",
            ErrorImpl::NewlineInString => "NewlineInString",
            ErrorImpl::InvalidEscape { .. } => "InvalidEscape",
            ErrorImpl::InvalidNumber { .. } => "InvalidNumber",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::UnexpectedEof { .. } => "UnexpectedEof",
            ErrorImpl::MismatchedDelimiter { .. } => "MismatchedDelimiter",
            ErrorImpl::MixedSeparators => "MixedSeparators",
            ErrorImpl::MalformedEnumeration => "MalformedEnumeration",
            ErrorImpl::OrphanContinuation => "OrphanContinuation",
            ErrorImpl::InvalidPrecedence { .. } => "InvalidPrecedence",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UndeclaredOperator { .. } => "UndeclaredOperator",
            ErrorImpl::AmbiguousChain { .. } => "AmbiguousChain",
            ErrorImpl::MissingOperand { .. } => "MissingOperand",
            ErrorImpl::EmptyRun => "EmptyRun",
            ErrorImpl::MalformedLambda { .. } => "MalformedLambda",
            ErrorImpl::UnknownModule { .. } => "UnknownModule",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnterminatedString => ErrorTip::Suggestion(String::from(
                "String literals must be closed with `\"` on the same line",
            )),
            ErrorImpl::UnterminatedComment => {
                ErrorTip::Suggestion(String::from("Block comment is missing its closing `*/`"))
            }
            ErrorImpl::NewlineInString => ErrorTip::Suggestion(String::from(
                "Use `\\n` for a line break inside a string literal",
            )),
            ErrorImpl::InvalidEscape { escape } => {
                ErrorTip::Suggestion(format!("Unknown escape sequence `\\{}`", escape))
            }
            ErrorImpl::InvalidNumber { token } if token.ends_with(['x', 'X']) => ErrorTip::Suggestion(
                format!("Invalid number: `{}`, hex literals need at least one digit", token),
            ),
            ErrorImpl::InvalidNumber { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, octal literals may only use the digits 0-7",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::UnexpectedEof { expected } => {
                ErrorTip::Suggestion(format!("Input ended while expecting {}", expected))
            }
            ErrorImpl::MismatchedDelimiter { expected, found } => ErrorTip::Suggestion(format!(
                "Expected `{}` to close the container, found `{}`",
                expected, found
            )),
            ErrorImpl::MixedSeparators => ErrorTip::Suggestion(String::from(
                "Use either `,` or `;` between the elements of one container",
            )),
            ErrorImpl::MalformedEnumeration => ErrorTip::Suggestion(String::from(
                "An enumeration needs at least one element before `..`",
            )),
            ErrorImpl::OrphanContinuation => ErrorTip::Suggestion(String::from(
                "A clause starting with `=` or a qualifier must directly follow an equation",
            )),
            ErrorImpl::InvalidPrecedence { value } => ErrorTip::Suggestion(format!(
                "Precedence `{}` must be an integer between 0 and 13",
                value
            )),
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UndeclaredOperator { operator } => ErrorTip::Suggestion(format!(
                "Operator `{}` has no fixity here, declare it with an `@` precedence clause first",
                operator
            )),
            ErrorImpl::AmbiguousChain { left, right } => ErrorTip::Suggestion(format!(
                "`{}` and `{}` cannot be chained without parentheses",
                left, right
            )),
            ErrorImpl::MissingOperand { operator, side } => {
                ErrorTip::Suggestion(format!("Operator `{}` is missing its {} operand", operator, side))
            }
            ErrorImpl::EmptyRun => ErrorTip::Suggestion(String::from("Expected an expression")),
            ErrorImpl::MalformedLambda { reason } => ErrorTip::Suggestion(format!(
                "Malformed lambda parameter list: {}",
                reason
            )),
            ErrorImpl::UnknownModule { module } => {
                ErrorTip::Suggestion(format!("Module `{}` could not be found", module))
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.span.start.1, self.span.start.0, self.internal_error
        )
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("newline in string literal")]
    NewlineInString,
    #[error("invalid escape sequence: \\{escape}")]
    InvalidEscape { escape: String },
    #[error("invalid number literal: {token:?}")]
    InvalidNumber { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("mismatched delimiter: expected {expected:?}, found {found:?}")]
    MismatchedDelimiter { expected: String, found: String },
    #[error("mixed `,` and `;` separators in one container")]
    MixedSeparators,
    #[error("enumeration without a left operand")]
    MalformedEnumeration,
    #[error("continuation clause without a preceding equation")]
    OrphanContinuation,
    #[error("invalid precedence: {value:?}")]
    InvalidPrecedence { value: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("undeclared operator: {operator:?}")]
    UndeclaredOperator { operator: String },
    #[error("ambiguous chain of non-associative operators {left:?} and {right:?}")]
    AmbiguousChain { left: String, right: String },
    #[error("operator {operator:?} is missing its {side} operand")]
    MissingOperand { operator: String, side: OperandSide },
    #[error("empty expression")]
    EmptyRun,
    #[error("malformed lambda parameter list: {reason}")]
    MalformedLambda { reason: String },
    #[error("unknown module {module:?}")]
    UnknownModule { module: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSide {
    Left,
    Right,
}

impl Display for OperandSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperandSide::Left => write!(f, "left"),
            OperandSide::Right => write!(f, "right"),
        }
    }
}
