//! IR normalization.
//!
//! Stages run as a left fold in a fixed order; each one sees only what the
//! previous one produced. After the last stage every rule group is a plain
//! token sequence that a backend can translate one token at a time.

pub mod branch;

use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::config::SessionConfig;
use crate::pattern::{Modifier, Op, PatternKind, PatternToken, RuleGroup};

pub use branch::{handle_rule_branching, is_complex};

pub type Stage = fn(Vec<RuleGroup>, &SessionConfig) -> Vec<RuleGroup>;

/// Strip accents: `"Šarūnas"` → `"Sarunas"`.
pub fn deaccent(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Stages in the order they run for this session.
pub fn pipeline(config: &SessionConfig) -> Vec<(&'static str, Stage)> {
    let mut stages: Vec<(&'static str, Stage)> = vec![("expand_nested", expand_nested)];
    if config.deaccent {
        stages.push(("deaccent", handle_deaccent));
    }
    stages.push(("branching", handle_rule_branching));
    stages.push(("flatten_nested", flatten_nested));
    stages.push(("multi_word", handle_multi_word));
    stages.push(("prefix", handle_prefix));
    if config.implicit_hyphen {
        info!("Adding implicit hyphens");
        stages.push(("implicit_hyphen", add_implicit_hyphen));
    } else if config.implicit_punct {
        info!("Adding implicit punctuation");
        stages.push(("implicit_punct", add_implicit_punct));
    }
    stages
}

pub fn preprocess(rules: Vec<RuleGroup>, config: &SessionConfig) -> Vec<RuleGroup> {
    info!("Preprocessing {} rule group(s)", rules.len());
    pipeline(config).into_iter().fold(rules, |acc, (name, stage)| {
        let out = stage(acc, config);
        debug!("After {name}: {} rule group(s)", out.len());
        out
    })
}

fn map_tokens<F>(rules: Vec<RuleGroup>, mut f: F) -> Vec<RuleGroup>
where
    F: FnMut(Vec<PatternToken>) -> Vec<PatternToken>,
{
    rules
        .into_iter()
        .map(|group| RuleGroup::new(group.label, f(group.tokens)))
        .collect()
}

/// Inline the children of operator-less `nested` tokens, recursively.
pub(crate) fn inline_nested(tokens: Vec<PatternToken>) -> Vec<PatternToken> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token.kind {
            PatternKind::Nested(children) if token.op.is_empty() => {
                out.extend(inline_nested(children));
            }
            _ => out.push(token),
        }
    }
    out
}

/// Stage 1: patterns composed from other patterns (`PATTERN`, list
/// variables) are spliced into their parent.
pub fn expand_nested(rules: Vec<RuleGroup>, _config: &SessionConfig) -> Vec<RuleGroup> {
    map_tokens(rules, inline_nested)
}

fn deaccent_token(token: PatternToken) -> PatternToken {
    let op = token.op;
    match token.kind {
        PatternKind::Value(v) => {
            let plain = deaccent(&v);
            if plain != v {
                PatternToken::with_op(PatternKind::AnyOf(vec![v, plain]), op)
            } else {
                PatternToken::with_op(PatternKind::Value(v), op)
            }
        }
        PatternKind::AnyOf(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let plain = deaccent(&item);
                let differs = plain != item;
                out.push(item);
                if differs {
                    out.push(plain);
                }
            }
            PatternToken::with_op(PatternKind::AnyOf(out), op)
        }
        PatternKind::Either(alts) => PatternToken::with_op(
            PatternKind::Either(alts.into_iter().map(deaccent_token).collect()),
            op,
        ),
        PatternKind::Nested(children) => PatternToken::with_op(
            PatternKind::Nested(children.into_iter().map(deaccent_token).collect()),
            op,
        ),
        kind => PatternToken::with_op(kind, op),
    }
}

/// Stage 2: accented words also match their accent-free spelling.
pub fn handle_deaccent(rules: Vec<RuleGroup>, _config: &SessionConfig) -> Vec<RuleGroup> {
    map_tokens(rules, |tokens| tokens.into_iter().map(deaccent_token).collect())
}

/// Stage 4: `nested` tokens surfaced by branching (list alternatives).
pub fn flatten_nested(rules: Vec<RuleGroup>, _config: &SessionConfig) -> Vec<RuleGroup> {
    map_tokens(rules, inline_nested)
}

/// Stage 5: `WORD("knee-length")` becomes a phrase matched word by word.
pub fn handle_multi_word(rules: Vec<RuleGroup>, _config: &SessionConfig) -> Vec<RuleGroup> {
    map_tokens(rules, |tokens| {
        tokens
            .into_iter()
            .map(|token| match token.kind {
                PatternKind::Value(v) if is_complex(&v) => {
                    PatternToken::with_op(PatternKind::Phrase(v), token.op)
                }
                kind => PatternToken::with_op(kind, token.op),
            })
            .collect()
    })
}

fn apply_prefix(token: PatternToken, prefix: &str) -> PatternToken {
    match token.kind {
        PatternKind::Value(v) => {
            PatternToken::with_op(PatternKind::Value(format!("{prefix}{v}")), token.op)
        }
        PatternKind::AnyOf(items) => PatternToken::with_op(
            PatternKind::AnyOf(items.into_iter().map(|i| format!("{prefix}{i}")).collect()),
            token.op,
        ),
        kind => {
            let token = PatternToken::with_op(kind, token.op);
            warn!("Don't know how to apply prefix on: {}", token.name());
            token
        }
    }
}

/// Stage 6: `PREFIX("meta"), WORD("physics")` becomes `WORD("metaphysics")`.
pub fn handle_prefix(rules: Vec<RuleGroup>, _config: &SessionConfig) -> Vec<RuleGroup> {
    rules
        .into_iter()
        .map(|group| {
            let mut prefix: Option<String> = None;
            let mut tokens = Vec::with_capacity(group.tokens.len());
            for token in group.tokens {
                match token.kind {
                    PatternKind::Prefix(p) => prefix = Some(p),
                    _ => match prefix.take() {
                        Some(p) => tokens.push(apply_prefix(token, &p)),
                        None => tokens.push(token),
                    },
                }
            }
            if let Some(p) = prefix {
                warn!("Prefix '{p}' in {} has nothing to apply to", group.label);
            }
            RuleGroup::new(group.label, tokens)
        })
        .collect()
}

fn interleave(rules: Vec<RuleGroup>, separator: PatternToken) -> Vec<RuleGroup> {
    map_tokens(rules, |tokens| {
        if tokens.len() < 2 {
            return tokens;
        }
        let mut out = Vec::with_capacity(tokens.len() * 2 - 1);
        for (i, token) in tokens.into_iter().enumerate() {
            if i > 0 {
                out.push(separator.clone());
            }
            out.push(token);
        }
        out
    })
}

/// Stage 7a: optional punctuation between every pair of elements.
pub fn add_implicit_punct(rules: Vec<RuleGroup>, _config: &SessionConfig) -> Vec<RuleGroup> {
    interleave(rules, PatternToken::punct().optional())
}

/// Stage 7b: optional hyphen between every pair of elements.
pub fn add_implicit_hyphen(rules: Vec<RuleGroup>, _config: &SessionConfig) -> Vec<RuleGroup> {
    let hyphen = PatternToken::with_op(
        PatternKind::Value("-".to_string()),
        Op::new(Some(Modifier::Optional)),
    );
    interleave(rules, hyphen)
}
