//! `PLURALIZE(word | list)`: match nouns in singular or plural form, even
//! where a lemmatizer would get them wrong.

use crate::config::SessionConfig;
use crate::error::{Result, RitaError};
use crate::macros::{MacroFn, MacroOutput, MacroProvider, collect_unique};
use crate::pattern::{Op, PatternKind, PatternToken};
use crate::value::Value;

pub struct Pluralize;

impl MacroProvider for Pluralize {
    fn name(&self) -> &'static str {
        "pluralize"
    }

    fn resolve(&self, name: &str) -> Option<MacroFn> {
        match name {
            "PLURALIZE" => Some(pluralize),
            _ => None,
        }
    }
}

const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

const UNCHANGED: &[&str] = &["deer", "fish", "series", "sheep", "species"];

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// English plural of a single noun. Multi-word nouns pluralize their last
/// word.
pub fn plural(word: &str) -> String {
    if let Some((head, last)) = word.rsplit_once(' ') {
        return format!("{head} {}", plural(last));
    }

    let lower = word.to_lowercase();
    if UNCHANGED.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, irregular)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return irregular.to_string();
    }

    let mut chars = lower.chars().rev();
    let last = chars.next();
    let before_last = chars.next();
    match (before_last, last) {
        (_, Some('s' | 'x' | 'z')) | (Some('c' | 's'), Some('h')) => format!("{word}es"),
        (Some(c), Some('y')) if !is_vowel(c) => format!("{}ies", &word[..word.len() - 1]),
        (Some('f'), Some('e')) => format!("{}ves", &word[..word.len() - 2]),
        _ => format!("{word}s"),
    }
}

fn pluralize(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    let nouns = collect_unique("PLURALIZE", args)?;
    if nouns.is_empty() {
        return Err(RitaError::invalid_argument("PLURALIZE", "expected at least one noun"));
    }
    let mut forms = nouns.clone();
    for noun in &nouns {
        let p = plural(noun);
        if !forms.contains(&p) {
            forms.push(p);
        }
    }
    Ok(MacroOutput::Value(Value::Token(PatternToken::with_op(
        PatternKind::AnyOf(forms),
        op,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_plurals() {
        assert_eq!(plural("car"), "cars");
        assert_eq!(plural("bicycle"), "bicycles");
        assert_eq!(plural("box"), "boxes");
        assert_eq!(plural("church"), "churches");
        assert_eq!(plural("city"), "cities");
        assert_eq!(plural("day"), "days");
        assert_eq!(plural("knife"), "knives");
    }

    #[test]
    fn irregular_plurals() {
        assert_eq!(plural("child"), "children");
        assert_eq!(plural("sheep"), "sheep");
        assert_eq!(plural("sports car"), "sports cars");
    }

    #[test]
    fn pluralize_single_word() {
        let mut cfg = SessionConfig::default();
        let out = pluralize(&["car".into()], &mut cfg, Op::default()).unwrap();
        assert_eq!(
            out,
            MacroOutput::Value(Value::Token(PatternToken::any_of(["car", "cars"])))
        );
    }

    #[test]
    fn pluralize_list() {
        let mut cfg = SessionConfig::default();
        let list = Value::from(vec!["bicycle", "ship"]);
        let out = pluralize(&[list], &mut cfg, Op::default()).unwrap();
        assert_eq!(
            out,
            MacroOutput::Value(Value::Token(PatternToken::any_of([
                "bicycle", "ship", "bicycles", "ships"
            ])))
        );
    }
}
