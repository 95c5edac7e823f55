//! Branch expansion: one rule group per combination of alternatives.
//!
//! Every branching position becomes a slot holding its alternatives; every
//! other position is a slot of one. The output is the Cartesian product of
//! the slots, enumerated like an odometer with the first slot turning
//! fastest.

use tracing::debug;

use super::inline_nested;
use crate::config::SessionConfig;
use crate::pattern::{PatternKind, PatternToken, RuleGroup};

/// Text that a tokenizer would split: contains a space or a hyphen, unless
/// it is a lone hyphen.
pub fn is_complex(text: &str) -> bool {
    if text.trim() == "-" {
        return false;
    }
    text.contains(' ') || text.contains('-')
}

pub fn has_complex(items: &[String]) -> bool {
    items.iter().any(|item| is_complex(item))
}

fn is_branching(token: &PatternToken, config: &SessionConfig) -> bool {
    match &token.kind {
        PatternKind::Either(_) => true,
        PatternKind::AnyOf(items) => config.list_branching && has_complex(items),
        _ => false,
    }
}

/// Whether expanding `group` would change it.
pub fn needs_branching(group: &RuleGroup, config: &SessionConfig) -> bool {
    group.tokens.iter().any(|t| is_branching(t, config))
}

/// Alternatives for one position.
fn slot(token: &PatternToken, config: &SessionConfig) -> Vec<PatternToken> {
    match &token.kind {
        PatternKind::Either(alternatives) => alternatives
            .iter()
            .map(|alt| {
                let mut alt = alt.clone();
                if alt.op.is_empty() {
                    alt.op.modifier = token.op.modifier;
                }
                alt
            })
            .collect(),
        PatternKind::AnyOf(items) if config.list_branching && has_complex(items) => {
            let simple: Vec<String> = items.iter().filter(|i| !is_complex(i)).cloned().collect();
            let mut complex: Vec<&String> = items.iter().filter(|i| is_complex(i)).collect();
            complex.sort();
            complex.dedup();

            let mut alternatives = Vec::with_capacity(complex.len() + 1);
            if !simple.is_empty() {
                alternatives.push(PatternToken::with_op(PatternKind::AnyOf(simple), token.op));
            }
            alternatives.extend(
                complex
                    .into_iter()
                    .map(|c| PatternToken::with_op(PatternKind::Phrase(c.clone()), token.op)),
            );
            alternatives
        }
        _ => vec![token.clone()],
    }
}

/// Expand one rule group into every combination of its alternatives.
pub fn branch(group: &RuleGroup, config: &SessionConfig) -> Vec<RuleGroup> {
    if !needs_branching(group, config) {
        return vec![group.clone()];
    }

    let slots: Vec<Vec<PatternToken>> = group.tokens.iter().map(|t| slot(t, config)).collect();
    let total: usize = slots.iter().map(Vec::len).product();
    debug!("Branching {} into {total} variant(s)", group.label);

    let mut out = Vec::with_capacity(total);
    let mut counters = vec![0usize; slots.len()];
    for _ in 0..total {
        let tokens = slots
            .iter()
            .zip(&counters)
            .map(|(alternatives, &i)| alternatives[i].clone())
            .collect();
        // A sequence alternative is spliced in, so its own alternatives
        // are visible to the next expansion
        let variant = RuleGroup::new(group.label.clone(), inline_nested(tokens));
        out.extend(branch(&variant, config));

        for (counter, alternatives) in counters.iter_mut().zip(&slots) {
            *counter += 1;
            if *counter < alternatives.len() {
                break;
            }
            *counter = 0;
        }
    }
    out
}

/// Pipeline stage: expand every group.
pub fn handle_rule_branching(rules: Vec<RuleGroup>, config: &SessionConfig) -> Vec<RuleGroup> {
    rules.iter().flat_map(|group| branch(group, config)).collect()
}
