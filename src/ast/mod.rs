/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Identifiers, operator references and shared enums
/// - expressions: The resolved expression tree
/// - statements: Declarations, definitions and the script root
/// - runs: Flat operand/operator runs awaiting resolution
pub mod ast;
pub mod expressions;
pub mod runs;
pub mod statements;
