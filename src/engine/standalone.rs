//! Regex backend: one compiled regex per rule group, executed in parallel.
//!
//! Every rule group becomes `(?P<LABEL>(?P<s0>...)(?P<s1>...)...)`: the label
//! names the outer group and each token gets an indexed inner group, so a
//! match can report which token matched which span.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use fancy_regex::Regex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{Artifact, Backend};
use crate::config::SessionConfig;
use crate::error::{Result, RitaError};
use crate::pattern::{Modifier, Op, PatternKind, PatternToken, RuleGroup};

/// Worker threads used to run matchers.
pub const WORKER_THREADS: usize = 4;

const PUNCT_CLASS: &str = "[.,!;?:]";
const WS: &str = r"\s?";

pub struct StandaloneBackend;

impl Backend for StandaloneBackend {
    fn name(&self) -> &'static str {
        "standalone"
    }

    fn compile(&self, rules: &[RuleGroup], config: &mut SessionConfig) -> Result<Artifact> {
        let (executor, dropped) = compile_rules(rules, config)?;
        Ok(Artifact::Standalone { executor, dropped })
    }
}

/// A rule group left out of the executable set because its regex did not
/// build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRule {
    pub label: String,
    pub pattern: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub key: String,
}

/// One reported match. Offsets are byte offsets into the input and cover
/// `text`, which has surrounding whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submatches: Vec<Submatch>,
}

/// A persisted rule group: the label and one regex fragment per token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRule {
    pub label: String,
    pub rules: Vec<String>,
    #[serde(default = "default_ignore_case")]
    pub ignore_case: bool,
}

impl From<DroppedRule> for RitaError {
    fn from(dropped: DroppedRule) -> Self {
        RitaError::RegexCompile {
            label: dropped.label,
            pattern: dropped.pattern,
            message: dropped.reason,
        }
    }
}

fn default_ignore_case() -> bool {
    true
}

impl PersistedRule {
    /// The full regex source for this group.
    pub fn pattern(&self) -> String {
        let flags = if self.ignore_case { "(?si)" } else { "(?s)" };
        format!("{flags}(?P<{}>{})", self.label, self.rules.concat())
    }
}

#[derive(Debug)]
pub struct CompiledRule {
    pub source: PersistedRule,
    regex: Regex,
    /// Submatch group names, in token order.
    keys: Vec<String>,
}

impl CompiledRule {
    fn build(source: PersistedRule) -> std::result::Result<Self, DroppedRule> {
        let pattern = source.pattern();
        match Regex::new(&pattern) {
            Ok(regex) => {
                let keys = (0..source.rules.len()).map(group_name).collect();
                Ok(Self {
                    source,
                    regex,
                    keys,
                })
            }
            Err(e) => {
                error!("Failed to compile '{pattern}' for {}: {e}", source.label);
                Err(DroppedRule {
                    label: source.label,
                    pattern,
                    reason: e.to_string(),
                })
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.source.label
    }

    pub fn pattern(&self) -> String {
        self.source.pattern()
    }

    fn find_all(&self, text: &str, with_submatches: bool) -> Result<Vec<Match>> {
        let mut out = Vec::new();
        for caps in self.regex.captures_iter(text) {
            let caps = caps.map_err(|e| RitaError::Execution {
                label: self.source.label.clone(),
                message: e.to_string(),
            })?;
            let Some(whole) = caps.get(0) else { continue };
            let Some((start, end, matched)) = trimmed(text, whole.start(), whole.end()) else {
                continue;
            };

            let submatches = if with_submatches {
                self.keys
                    .iter()
                    .filter_map(|key| {
                        let m = caps.name(key)?;
                        let (start, end, text) = trimmed(text, m.start(), m.end())?;
                        Some(Submatch {
                            start,
                            end,
                            text: text.to_string(),
                            key: key.clone(),
                        })
                    })
                    .collect()
            } else {
                Vec::new()
            };

            out.push(Match {
                start,
                end,
                text: matched.to_string(),
                label: self.source.label.clone(),
                submatches,
            });
        }
        Ok(out)
    }
}

/// Span with surrounding whitespace removed; `None` when nothing is left.
fn trimmed(text: &str, start: usize, end: usize) -> Option<(usize, usize, &str)> {
    let raw = &text[start..end];
    let inner = raw.trim();
    if inner.is_empty() {
        return None;
    }
    let offset = raw.len() - raw.trim_start().len();
    Some((start + offset, start + offset + inner.len(), inner))
}

fn group_name(index: usize) -> String {
    format!("s{index}")
}

/// Runs a rule set against text.
#[derive(Debug)]
pub struct RuleExecutor {
    rules: Vec<CompiledRule>,
    pool: rayon::ThreadPool,
}

impl RuleExecutor {
    /// Build matchers from persisted rows. Rows whose regex does not build
    /// are returned instead of failing the whole set.
    pub fn from_rows(rows: Vec<PersistedRule>) -> Result<(Self, Vec<DroppedRule>)> {
        let mut rules = Vec::with_capacity(rows.len());
        let mut dropped = Vec::new();
        for row in rows {
            match CompiledRule::build(row) {
                Ok(rule) => rules.push(rule),
                Err(d) => dropped.push(d),
            }
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(WORKER_THREADS)
            .build()
            .map_err(|e| RitaError::Execution {
                label: "worker pool".to_string(),
                message: e.to_string(),
            })?;
        info!("Compiled {} rule(s), dropped {}", rules.len(), dropped.len());
        Ok((Self { rules, pool }, dropped))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    /// Regex source of every rule, in order.
    pub fn patterns(&self) -> Vec<String> {
        self.rules.iter().map(CompiledRule::pattern).collect()
    }

    pub fn execute(&self, text: &str) -> Result<Vec<Match>> {
        self.run(text, false)
    }

    /// Like [`execute`](Self::execute), with per-token submatches.
    pub fn execute_with_submatches(&self, text: &str) -> Result<Vec<Match>> {
        self.run(text, true)
    }

    fn run(&self, text: &str, with_submatches: bool) -> Result<Vec<Match>> {
        let per_rule: Vec<Result<Vec<Match>>> = self.pool.install(|| {
            self.rules
                .par_iter()
                .map(|rule| rule.find_all(text, with_submatches))
                .collect()
        });
        let mut all = Vec::new();
        for matches in per_rule {
            all.extend(matches?);
        }
        Ok(merge_matches(all))
    }

    pub fn write_jsonl<W: Write>(&self, out: &mut W) -> Result<()> {
        for rule in &self.rules {
            serde_json::to_writer(&mut *out, &rule.source)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_jsonl(&mut out)?;
        out.flush()?;
        debug!("Saved {} rule(s) to {}", self.rules.len(), path.display());
        Ok(())
    }

    /// Rebuild an executor from a file written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<(Self, Vec<DroppedRule>)> {
        let reader = BufReader::new(File::open(path)?);
        let mut rows = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(serde_json::from_str::<PersistedRule>(&line)?);
        }
        debug!("Loaded {} rule(s) from {}", rows.len(), path.display());
        Self::from_rows(rows)
    }
}

/// Sort by start offset; of the matches sharing a start, keep the one that
/// ends last (the first such on ties). Overlaps with different starts are
/// all kept.
pub fn merge_matches(mut matches: Vec<Match>) -> Vec<Match> {
    matches.sort_by_key(|m| m.start);
    let mut out: Vec<Match> = Vec::with_capacity(matches.len());
    for m in matches {
        match out.last_mut() {
            Some(prev) if prev.start == m.start => {
                if m.end > prev.end {
                    *prev = m;
                }
            }
            _ => out.push(m),
        }
    }
    out
}

/// Compile preprocessed rule groups. Unsupported tokens fail the whole
/// compile; groups whose regex does not build are dropped.
pub fn compile_rules(
    rules: &[RuleGroup],
    config: &mut SessionConfig,
) -> Result<(RuleExecutor, Vec<DroppedRule>)> {
    info!("Using standalone rule implementation");
    let rows = rules
        .iter()
        .map(|group| render_group(group, config))
        .collect::<Result<Vec<_>>>()?;
    RuleExecutor::from_rows(rows)
}

pub fn render_group(group: &RuleGroup, config: &mut SessionConfig) -> Result<PersistedRule> {
    let rules = group
        .tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let body = render_token(token, config)?;
            Ok(format!("(?P<{}>{body}){}", group_name(i), token.op.quantifier()))
        })
        .collect::<Result<Vec<_>>>()?;
    let row = PersistedRule {
        label: group.label.clone(),
        rules,
        ignore_case: config.ignore_case,
    };
    debug!("{} => {}", row.label, row.pattern());
    Ok(row)
}

fn escape_unless_regex(text: &str, op: &Op) -> String {
    if op.local_regex {
        text.to_string()
    } else {
        regex::escape(text)
    }
}

/// Pin a fragment to exact case when the token overrides the session.
fn with_case(fragment: String, op: &Op, config: &SessionConfig) -> String {
    if config.ignore_case && !op.ignore_case(config) {
        format!("(?-i:{fragment})")
    } else {
        fragment
    }
}

/// `^a` matches words starting with `a`, `a$` words ending with it, and
/// anything else words containing it.
fn local_regex(pattern: &str) -> String {
    let (starts, rest) = match pattern.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let (ends, core) = match rest.strip_suffix('$') {
        Some(core) if !core.ends_with('\\') => (true, core),
        _ => (false, rest),
    };
    let head = if starts { r"(?<!\w)" } else { r"\w*" };
    let tail = if ends { r"(?!\w)" } else { r"\w*" };
    format!("{head}(?:{core}){tail}")
}

/// Longest first, so a member is never shadowed by its own prefix.
fn alternation(items: &[String], op: &Op) -> String {
    let mut items: Vec<String> = items.iter().map(|i| escape_unless_regex(i, op)).collect();
    items.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    items.dedup();
    items.join("|")
}

fn render_phrase(text: &str, op: &Op) -> String {
    text.split_whitespace()
        .map(|word| {
            word.split('-')
                .map(|part| escape_unless_regex(part, op))
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect::<Vec<_>>()
        .join(r"\s+")
}

/// Body of a token's group: the match itself plus trailing optional
/// whitespace, before the quantifier.
fn render_token(token: &PatternToken, config: &mut SessionConfig) -> Result<String> {
    let op = &token.op;
    let core = match &token.kind {
        PatternKind::Value(v) => with_case(escape_unless_regex(v, op), op, config),
        PatternKind::Orth(v) => {
            if config.ignore_case {
                format!("(?-i:{})", regex::escape(v))
            } else {
                regex::escape(v)
            }
        }
        PatternKind::Regex(r) if op.local_regex => with_case(local_regex(r), op, config),
        PatternKind::Regex(r) => with_case(format!("(?:{r})"), op, config),
        PatternKind::AnyOf(items) => {
            let alts = with_case(format!("(?:{})", alternation(items, op)), op, config);
            format!(r"(?:^|(?<=\s)){alts}")
        }
        PatternKind::Phrase(text) => {
            with_case(format!("(?:{})", render_phrase(text, op)), op, config)
        }
        PatternKind::Fuzzy(variants) => format!("(?:{})[.,?;!]?", variants.join("|")),
        PatternKind::Punct => PUNCT_CLASS.to_string(),
        PatternKind::Any => ".*".to_string(),
        PatternKind::Nested(children) => {
            let id = config.new_nested_group_id();
            let inner = children
                .iter()
                .map(|c| Ok(format!("(?:{}){}", render_token(c, config)?, c.op.quantifier())))
                .collect::<Result<Vec<_>>>()?;
            return Ok(format!("(?P<g{id}>{})", inner.concat()));
        }
        PatternKind::Either(alternatives) => {
            let inner = alternatives
                .iter()
                .map(|c| Ok(format!("(?:{}){}", render_token(c, config)?, c.op.quantifier())))
                .collect::<Result<Vec<_>>>()?;
            return Ok(format!("(?:{})", inner.join("|")));
        }
        PatternKind::Entity(_)
        | PatternKind::Pos(_)
        | PatternKind::Lemma(_)
        | PatternKind::Tag(_)
        | PatternKind::Prefix(_) => {
            return Err(RitaError::unsupported(token.name(), "standalone"));
        }
    };

    if op.modifier == Some(Modifier::Not) {
        return Ok(format!(r"(?!{core})\w+{WS}"));
    }
    Ok(format!("{core}{WS}"))
}
