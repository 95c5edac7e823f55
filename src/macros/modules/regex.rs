//! `REGEX(pattern)`: match single words against a regex.
//!
//! `^` and `$` anchor to the word, not the whole text: `REGEX("^a")` matches
//! every word starting with an `a`.

use crate::config::SessionConfig;
use crate::error::Result;
use crate::macros::{MacroFn, MacroOutput, MacroProvider, check_arity};
use crate::pattern::{Op, PatternKind, PatternToken};
use crate::value::Value;

pub struct Regex;

impl MacroProvider for Regex {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn resolve(&self, name: &str) -> Option<MacroFn> {
        match name {
            "REGEX" => Some(regex_macro),
            _ => None,
        }
    }
}

fn regex_macro(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("REGEX", args, 1, 1)?;
    let pattern = args[0].expect_str("REGEX")?;
    let op = Op {
        local_regex: true,
        ..op
    };
    Ok(MacroOutput::Value(Value::Token(PatternToken::with_op(
        PatternKind::Regex(pattern),
        op,
    ))))
}
