//! Lexical analysis module for the front end.
//!
//! This module contains the lexer (tokenizer) that converts source code
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using regex patterns
//! - Case-driven classification of variable and function identifiers
//! - Maximal-munch operator symbols and qualified names
//! - Comments and shebang lines, kept aside as trivia

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
