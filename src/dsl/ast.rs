//! Rules DSL syntax tree.
//!
//! The parser builds this eagerly; nothing is evaluated until the resolver
//! walks it with a session configuration.

use crate::pattern::Modifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub op: Option<Modifier>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// "text"
    Literal(String),
    /// MACRO(args) or MACRO{args}
    Call(MacroCall),
    /// A bare identifier: a variable, or a macro invoked without arguments.
    Name {
        name: String,
        op: Option<Modifier>,
        line: usize,
    },
    /// {a, b, c}
    List(Vec<Expr>),
    /// a | b | c
    Either(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// pattern -> LABEL_MACRO
    Rule {
        pattern: Vec<Expr>,
        label: MacroCall,
        line: usize,
    },
    /// name = value
    Binding {
        name: String,
        value: Expr,
        line: usize,
    },
    /// !MACRO(args), or the older `MACRO(args) -> EXEC`
    Exec(MacroCall),
}

/// Short rendering of an expression, for logs.
pub fn expr_summary(expr: &Expr) -> String {
    fn join(items: &[Expr], sep: &str) -> String {
        items.iter().map(expr_summary).collect::<Vec<_>>().join(sep)
    }

    match expr {
        Expr::Literal(s) => format!("\"{s}\""),
        Expr::Call(call) => call_summary(call),
        Expr::Name { name, op, .. } => {
            format!("{name}{}", op.map(|m| m.as_str()).unwrap_or(""))
        }
        Expr::List(items) => format!("{{{}}}", join(items, ", ")),
        Expr::Either(alts) => join(alts, "|"),
    }
}

pub fn call_summary(call: &MacroCall) -> String {
    let args: Vec<String> = call.args.iter().map(expr_summary).collect();
    format!(
        "{}({}){}",
        call.name,
        args.join(", "),
        call.op.map(|m| m.as_str()).unwrap_or("")
    )
}
