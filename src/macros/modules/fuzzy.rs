//! `FUZZY(word)`: tolerate doubled letters and common slang spellings.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::macros::{MacroFn, MacroOutput, MacroProvider, check_arity};
use crate::pattern::{Op, PatternKind, PatternToken};
use crate::value::Value;

pub struct Fuzzy;

impl MacroProvider for Fuzzy {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn resolve(&self, name: &str) -> Option<MacroFn> {
        match name {
            "FUZZY" => Some(fuzzy),
            _ => None,
        }
    }
}

/// `aa|bb|...|zz`; the `regex` crate has no backreferences.
static DOUBLE_LETTER: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = ('a'..='z').map(|c| format!("{c}{c}")).collect();
    Regex::new(&alternatives.join("|")).unwrap()
});

const SLANG: &[(&str, &str)] = &[
    ("you", "u"),
    ("for", "4"),
    ("are", "r"),
    ("you are", "ur"),
    ("you're", "ur"),
];

/// Spelling variants of `word`, as regex fragments. The first one is always
/// the word itself.
pub fn permutations(word: &str) -> Vec<String> {
    let initial = regex::escape(&word.to_lowercase());
    let mut variants = vec![initial.clone()];

    let relaxed = DOUBLE_LETTER
        .replace_all(&initial, |caps: &Captures<'_>| {
            let letter = &caps[0][..1];
            format!("{letter}{{1,2}}")
        })
        .into_owned();
    if relaxed != initial {
        variants.push(relaxed);
    }

    let lowered = word.to_lowercase();
    if let Some((_, slang)) = SLANG.iter().find(|(w, _)| *w == lowered) {
        variants.push(format!(r"\s{slang}\s"));
    }
    variants
}

fn fuzzy(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("FUZZY", args, 1, 1)?;
    let word = args[0].expect_str("FUZZY")?;
    let token = PatternToken::with_op(PatternKind::Fuzzy(permutations(&word)), op);
    Ok(MacroOutput::Value(Value::Token(token)))
}
