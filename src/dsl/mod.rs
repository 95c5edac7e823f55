//! Rules DSL front end: lexer, parser and syntax tree.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, MacroCall, Statement, call_summary, expr_summary};
pub use lexer::{LexDiagnostic, Lexer, Token, TokenKind};
pub use parser::{Parser, parse};
