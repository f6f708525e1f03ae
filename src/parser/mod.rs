//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into a [`Script`](crate::ast::statements::Script). Parsing happens in two
//! interleaved phases:
//!
//! - Statement parsing with a fixed grammar for declarations and definitions
//! - Run collection: expression positions are gathered as flat sequences of
//!   atoms and operators
//! - Operator resolution against the precedence table as it stands at the
//!   run's position in the file
//! - Error recovery at the next `;`
//!
//! Operator headers update the table as soon as they are parsed, so a
//! declaration only affects the code that follows it.

pub mod lookups;
pub mod parser;
pub mod resolve;
pub mod run;
pub mod stmt;

#[cfg(test)]
mod tests;
