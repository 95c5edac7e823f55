//! `TAG(regex)` and `TAG_WORD(regex, word | list)`: part-of-speech tag
//! patterns, optionally tied to specific words.

use crate::config::SessionConfig;
use crate::error::{Result, RitaError};
use crate::macros::{MacroFn, MacroOutput, MacroProvider, check_arity, collect_unique};
use crate::pattern::{Op, PatternKind, PatternToken, TagSpec, TagTarget};
use crate::value::Value;

pub struct Tag;

impl MacroProvider for Tag {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn resolve(&self, name: &str) -> Option<MacroFn> {
        match name {
            "TAG" => Some(tag),
            "TAG_WORD" => Some(tag_word),
            _ => None,
        }
    }
}

fn token(spec: TagSpec, op: Op) -> MacroOutput {
    MacroOutput::Value(Value::Token(PatternToken::with_op(PatternKind::Tag(spec), op)))
}

fn tag(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("TAG", args, 1, 1)?;
    let spec = TagSpec {
        tag: args[0].expect_str("TAG")?,
        target: TagTarget::Any,
    };
    Ok(token(spec, op))
}

fn tag_word(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("TAG_WORD", args, 2, 2)?;
    let tag = args[0].expect_str("TAG_WORD")?;
    let target = match &args[1] {
        Value::Str(word) => TagTarget::Word(word.clone()),
        list @ Value::List(_) => {
            let words = collect_unique("TAG_WORD", std::slice::from_ref(list))?;
            if words.is_empty() {
                return Err(RitaError::invalid_argument("TAG_WORD", "word list must not be empty"));
            }
            TagTarget::List(words)
        }
        Value::Token(t) => {
            return Err(RitaError::invalid_argument(
                "TAG_WORD",
                format!("expected a word or a list of words, got {} pattern", t.name()),
            ));
        }
    };
    Ok(token(TagSpec { tag, target }, op))
}
