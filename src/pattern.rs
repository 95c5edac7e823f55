//! Intermediate representation shared by every backend.
//!
//! A rule compiles to a [`RuleGroup`]: a label plus an ordered list of
//! [`PatternToken`]s. Preprocessing rewrites groups into other groups, and the
//! engines only ever see the final, unambiguous form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    #[serde(rename = "?")]
    Optional,
    #[serde(rename = "*")]
    ZeroOrMore,
    #[serde(rename = "+")]
    OneOrMore,
    #[serde(rename = "!")]
    Not,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOrMore => "+",
            Modifier::Not => "!",
        }
    }

    pub fn parse(s: &str) -> Option<Modifier> {
        match s.trim() {
            "?" => Some(Modifier::Optional),
            "*" => Some(Modifier::ZeroOrMore),
            "+" => Some(Modifier::OneOrMore),
            "!" => Some(Modifier::Not),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator attached to a token, plus per-token overrides.
///
/// Travels with the token through every preprocessing stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Op {
    pub modifier: Option<Modifier>,
    /// Match exactly as written even when the session ignores case.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub case_sensitive: bool,
    /// The token's text is a regex fragment, not a literal.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub local_regex: bool,
}

impl Op {
    pub fn new(modifier: Option<Modifier>) -> Self {
        Self {
            modifier,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self::new(Some(Modifier::Optional))
    }

    pub fn is_empty(&self) -> bool {
        self.modifier.is_none()
    }

    pub fn ignore_case(&self, config: &SessionConfig) -> bool {
        !self.case_sensitive && config.ignore_case
    }

    /// Regex quantifier suffix, empty for no modifier and for `!`.
    pub fn quantifier(&self) -> &'static str {
        match self.modifier {
            Some(Modifier::Not) | None => "",
            Some(m) => m.as_str(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            Some(m) => write!(f, "{m}"),
            None => Ok(()),
        }
    }
}

/// What a `tag` token matches besides the tag regex itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagTarget {
    Any,
    Word(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagSpec {
    pub tag: String,
    pub target: TagTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PatternKind {
    Value(String),
    Regex(String),
    AnyOf(Vec<String>),
    Entity(Vec<String>),
    Pos(Vec<String>),
    Lemma(String),
    Punct,
    Any,
    Fuzzy(Vec<String>),
    Phrase(String),
    Prefix(String),
    Tag(TagSpec),
    Orth(String),
    Nested(Vec<PatternToken>),
    Either(Vec<PatternToken>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternToken {
    pub kind: PatternKind,
    #[serde(default)]
    pub op: Op,
}

impl PatternToken {
    pub fn new(kind: PatternKind) -> Self {
        Self {
            kind,
            op: Op::default(),
        }
    }

    pub fn with_op(kind: PatternKind, op: Op) -> Self {
        Self { kind, op }
    }

    pub fn value(text: impl Into<String>) -> Self {
        Self::new(PatternKind::Value(text.into()))
    }

    pub fn any_of<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PatternKind::AnyOf(items.into_iter().map(Into::into).collect()))
    }

    pub fn phrase(text: impl Into<String>) -> Self {
        Self::new(PatternKind::Phrase(text.into()))
    }

    pub fn punct() -> Self {
        Self::new(PatternKind::Punct)
    }

    pub fn optional(mut self) -> Self {
        self.op.modifier = Some(Modifier::Optional);
        self
    }

    /// Short type name, as used in diagnostics and error messages.
    pub fn name(&self) -> &'static str {
        match &self.kind {
            PatternKind::Value(_) => "value",
            PatternKind::Regex(_) => "regex",
            PatternKind::AnyOf(_) => "any_of",
            PatternKind::Entity(_) => "entity",
            PatternKind::Pos(_) => "pos",
            PatternKind::Lemma(_) => "lemma",
            PatternKind::Punct => "punct",
            PatternKind::Any => "any",
            PatternKind::Fuzzy(_) => "fuzzy",
            PatternKind::Phrase(_) => "phrase",
            PatternKind::Prefix(_) => "prefix",
            PatternKind::Tag(_) => "tag",
            PatternKind::Orth(_) => "orth",
            PatternKind::Nested(_) => "nested",
            PatternKind::Either(_) => "either",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleGroup {
    pub label: String,
    pub tokens: Vec<PatternToken>,
}

impl RuleGroup {
    pub fn new(label: impl Into<String>, tokens: Vec<PatternToken>) -> Self {
        Self {
            label: label.into(),
            tokens,
        }
    }
}
