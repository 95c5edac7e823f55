//! `NAMES(name | list)`: match personal names written in full or with
//! initials, e.g. `Roy Jones junior` also matches `Roy Jones jr.`.

use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Result, RitaError};
use crate::macros::{MacroFn, MacroOutput, MacroProvider, collect_unique};
use crate::pattern::{Op, PatternKind, PatternToken};
use crate::value::Value;

pub struct Names;

impl MacroProvider for Names {
    fn name(&self) -> &'static str {
        "names"
    }

    fn resolve(&self, name: &str) -> Option<MacroFn> {
        match name {
            "NAMES" => Some(names),
            _ => None,
        }
    }
}

/// Particles kept in full when abbreviating.
const STOP_NAMES: &[&str] = &["von", "van", "de", "dos"];

fn trim_name(name: &str) -> String {
    if STOP_NAMES.contains(&name) {
        return name.to_string();
    }
    match name.chars().next() {
        Some(first) => format!(r"{first}\."),
        None => String::new(),
    }
}

fn trim_seniority(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "junior" => r"jr\.".to_string(),
        "senior" => r"sr\.".to_string(),
        _ => name.to_string(),
    }
}

fn is_seniority(name: &str) -> bool {
    matches!(name.to_lowercase().as_str(), "junior" | "senior")
}

/// Variations of every name, as regex fragments:
/// `First Last` → `F\. Last`; `First Middle Last` → `First M\. Last`,
/// `F\. M\. Last`; `First Last junior` → `First Last jr\.`.
pub fn generate_names(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |variation: String| {
        if !out.contains(&variation) {
            out.push(variation);
        }
    };
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        push(name.to_string());

        let parts: Vec<&str> = name.split(' ').filter(|p| !p.is_empty()).collect();
        match parts.as_slice() {
            [first, last] => push(format!("{} {last}", trim_name(first))),
            [first, middle, last] if is_seniority(last) => {
                push(format!("{first} {middle} {}", trim_seniority(last)));
            }
            [first, middle, last] => {
                push(format!("{first} {} {last}", trim_name(middle)));
                push(format!("{} {} {last}", trim_name(first), trim_name(middle)));
            }
            _ => {}
        }
    }
    out
}

fn names(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    let initial = collect_unique("NAMES", args)?;
    if initial.is_empty() {
        return Err(RitaError::invalid_argument("NAMES", "expected at least one name"));
    }
    let variations = generate_names(&initial);
    debug!("Generated list of names: {variations:?}");

    let op = Op {
        case_sensitive: true,
        local_regex: true,
        ..op
    };
    let token = PatternToken::with_op(PatternKind::AnyOf(variations), op);
    Ok(MacroOutput::Value(Value::Token(token)))
}
