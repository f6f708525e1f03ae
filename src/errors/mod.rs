//! Error types and error handling for the front end.
//!
//! This module defines the diagnostics produced while parsing a
//! compilation unit. It includes:
//!
//! - Error structures with source span information
//! - Specific error variants for the lexical, structural and resolution phases
//! - Error formatting and display functionality
//! - Helpful error messages and suggestions

pub mod errors;
