//! `ORTH(text)`: match the text exactly as written, even when the session
//! ignores case.

use crate::config::SessionConfig;
use crate::error::Result;
use crate::macros::{MacroFn, MacroOutput, MacroProvider, check_arity};
use crate::pattern::{Op, PatternKind, PatternToken};
use crate::value::Value;

pub struct Orth;

impl MacroProvider for Orth {
    fn name(&self) -> &'static str {
        "orth"
    }

    fn resolve(&self, name: &str) -> Option<MacroFn> {
        match name {
            "ORTH" => Some(orth),
            _ => None,
        }
    }
}

fn orth(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("ORTH", args, 1, 1)?;
    let text = args[0].expect_str("ORTH")?;
    let op = Op {
        case_sensitive: true,
        ..op
    };
    Ok(MacroOutput::Value(Value::Token(PatternToken::with_op(
        PatternKind::Orth(text),
        op,
    ))))
}
