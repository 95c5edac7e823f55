//! Token-pattern export for an external linguistic pipeline.
//!
//! Each rule group becomes one `{"label", "pattern"}` object in the format
//! an entity-ruler matcher loads. Nothing here executes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json, json};
use tracing::{debug, info};

use super::{Artifact, Backend};
use crate::config::SessionConfig;
use crate::error::{Result, RitaError};
use crate::pattern::{Modifier, Op, PatternKind, PatternToken, RuleGroup, TagTarget};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePattern {
    pub label: String,
    pub pattern: Vec<Json>,
}

pub struct SpacyBackend;

impl Backend for SpacyBackend {
    fn name(&self) -> &'static str {
        "spacy"
    }

    fn compile(&self, rules: &[RuleGroup], config: &mut SessionConfig) -> Result<Artifact> {
        info!("Using spaCy rules implementation");
        let patterns = rules
            .iter()
            .map(|group| rules_to_patterns(group, config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Artifact::Patterns(patterns))
    }
}

pub fn rules_to_patterns(group: &RuleGroup, config: &SessionConfig) -> Result<PipelinePattern> {
    let mut pattern = Vec::with_capacity(group.tokens.len());
    for token in &group.tokens {
        translate(token, config, &mut pattern)?;
    }
    debug!("{} => {} token pattern(s)", group.label, pattern.len());
    Ok(PipelinePattern {
        label: group.label.clone(),
        pattern,
    })
}

type Entry = Map<String, Json>;

fn finish(mut entry: Entry, op: &Op, out: &mut Vec<Json>) {
    if let Some(modifier) = op.modifier {
        entry.insert("OP".into(), json!(modifier.as_str()));
    }
    out.push(Json::Object(entry));
}

fn entry(key: &str, value: Json) -> Entry {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}

/// `LOWER` with lowercased text when matching ignores case, else the
/// exact-text attribute.
fn text_entry(text: &str, exact_key: &str, op: &Op, config: &SessionConfig) -> Entry {
    if op.ignore_case(config) {
        entry("LOWER", json!(text.to_lowercase()))
    } else {
        entry(exact_key, json!(text))
    }
}

fn sorted_members(
    items: &[String],
    op: &Op,
    config: &SessionConfig,
) -> (&'static str, Vec<String>) {
    let (key, mut members): (&str, Vec<String>) = if op.ignore_case(config) {
        ("LOWER", items.iter().map(|i| i.to_lowercase()).collect())
    } else {
        ("TEXT", items.to_vec())
    };
    members.sort();
    members.dedup();
    (key, members)
}

/// A single value renders plain; several render as an `IN` set.
fn one_or_in(values: &[String]) -> Json {
    match values {
        [single] => json!(single),
        many => json!({ "IN": many }),
    }
}

fn translate(token: &PatternToken, config: &SessionConfig, out: &mut Vec<Json>) -> Result<()> {
    let op = &token.op;
    match &token.kind {
        PatternKind::Value(v) | PatternKind::Orth(v) => {
            finish(text_entry(v, "ORTH", op, config), op, out);
        }
        PatternKind::AnyOf(items) => {
            let (key, members) = sorted_members(items, op, config);
            finish(entry(key, json!({ "IN": members })), op, out);
        }
        PatternKind::Regex(r) => {
            let key = if op.ignore_case(config) { "LOWER" } else { "TEXT" };
            finish(entry(key, json!({ "REGEX": r })), op, out);
        }
        PatternKind::Fuzzy(variants) => {
            let regex = format!("({})[.,?;!]?", variants.join("|"));
            finish(entry("LOWER", json!({ "REGEX": regex })), op, out);
        }
        PatternKind::Entity(types) => {
            let mut e = entry("ENT_TYPE", one_or_in(types));
            e.insert(
                "OP".into(),
                json!(op.modifier.unwrap_or(Modifier::OneOrMore).as_str()),
            );
            out.push(Json::Object(e));
        }
        PatternKind::Pos(tags) => finish(entry("POS", one_or_in(tags)), op, out),
        PatternKind::Lemma(lemma) => finish(entry("LEMMA", json!(lemma)), op, out),
        PatternKind::Punct => finish(entry("IS_PUNCT", json!(true)), op, out),
        PatternKind::Any => finish(Map::new(), op, out),
        PatternKind::Phrase(text) => {
            let plain = Op {
                modifier: None,
                ..*op
            };
            for word in text.split_whitespace() {
                for (i, part) in word.split('-').enumerate() {
                    if i > 0 {
                        out.push(Json::Object(text_entry("-", "ORTH", &plain, config)));
                    }
                    if !part.is_empty() {
                        out.push(Json::Object(text_entry(part, "ORTH", &plain, config)));
                    }
                }
            }
        }
        PatternKind::Tag(spec) => {
            let mut e = entry("TAG", json!({ "REGEX": spec.tag }));
            match &spec.target {
                TagTarget::Any => {}
                TagTarget::Word(word) => e.extend(text_entry(word, "TEXT", op, config)),
                TagTarget::List(words) => {
                    let (key, members) = sorted_members(words, op, config);
                    e.insert(
                        key.into(),
                        json!({ "REGEX": format!("^({})$", members.join("|")) }),
                    );
                }
            }
            finish(e, op, out);
        }
        PatternKind::Nested(children) => {
            for child in children {
                translate(child, config, out)?;
            }
        }
        PatternKind::Either(_) | PatternKind::Prefix(_) => {
            return Err(RitaError::unsupported(token.name(), "spacy"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::TagSpec;

    fn one(token: PatternToken, config: &SessionConfig) -> Json {
        let mut out = Vec::new();
        translate(&token, config, &mut out).unwrap();
        assert_eq!(out.len(), 1);
        out.remove(0)
    }

    fn case_sensitive() -> SessionConfig {
        let mut cfg = SessionConfig::default();
        cfg.ignore_case = false;
        cfg
    }

    fn with(token: PatternToken, modifier: Modifier) -> PatternToken {
        PatternToken::with_op(token.kind, Op::new(Some(modifier)))
    }

    #[test]
    fn list_ignoring_case() {
        let cfg = SessionConfig::default();
        assert_eq!(
            one(PatternToken::any_of(["Banana", "Apple"]), &cfg),
            json!({"LOWER": {"IN": ["apple", "banana"]}})
        );
    }

    #[test]
    fn list_case_sensitive() {
        assert_eq!(
            one(PatternToken::any_of(["Banana", "Apple"]), &case_sensitive()),
            json!({"TEXT": {"IN": ["Apple", "Banana"]}})
        );
    }

    #[test]
    fn operator_is_attached() {
        let cfg = SessionConfig::default();
        let token = with(PatternToken::any_of(["a", "b"]), Modifier::OneOrMore);
        assert_eq!(one(token, &cfg)["OP"], "+");
        let token = with(PatternToken::punct(), Modifier::Optional);
        assert_eq!(one(token, &cfg), json!({"IS_PUNCT": true, "OP": "?"}));
    }

    #[test]
    fn regex_by_case_setting() {
        let token = PatternToken::new(PatternKind::Regex(r"\d+".into()));
        assert_eq!(
            one(token.clone(), &SessionConfig::default()),
            json!({"LOWER": {"REGEX": r"\d+"}})
        );
        assert_eq!(one(token, &case_sensitive()), json!({"TEXT": {"REGEX": r"\d+"}}));
    }

    #[test]
    fn fuzzy_joins_variants() {
        let token =
            PatternToken::new(PatternKind::Fuzzy(vec!["squirrel".into(), "squirre1".into()]));
        assert_eq!(
            one(token, &SessionConfig::default()),
            json!({"LOWER": {"REGEX": "(squirrel|squirre1)[.,?;!]?"}})
        );
    }

    #[test]
    fn pos_single_and_many() {
        let cfg = SessionConfig::default();
        let single = PatternToken::new(PatternKind::Pos(vec!["VERB".into()]));
        assert_eq!(one(single, &cfg), json!({"POS": "VERB"}));
        let many = PatternToken::new(PatternKind::Pos(vec!["VERB".into(), "NOUN".into()]));
        assert_eq!(one(many, &cfg), json!({"POS": {"IN": ["VERB", "NOUN"]}}));
    }

    #[test]
    fn entity_defaults_to_one_or_more() {
        let cfg = SessionConfig::default();
        let token = PatternToken::new(PatternKind::Entity(vec!["PERSON".into()]));
        assert_eq!(one(token.clone(), &cfg), json!({"ENT_TYPE": "PERSON", "OP": "+"}));
        assert_eq!(
            one(with(token, Modifier::ZeroOrMore), &cfg),
            json!({"ENT_TYPE": "PERSON", "OP": "*"})
        );
    }

    #[test]
    fn any_is_empty_object() {
        let cfg = SessionConfig::default();
        assert_eq!(one(PatternToken::new(PatternKind::Any), &cfg), json!({}));
        assert_eq!(
            one(with(PatternToken::new(PatternKind::Any), Modifier::OneOrMore), &cfg),
            json!({"OP": "+"})
        );
    }

    #[test]
    fn phrase_splits_words_and_hyphens() {
        let cfg = SessionConfig::default();
        let mut out = Vec::new();
        translate(&PatternToken::phrase("knee-length"), &cfg, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                json!({"LOWER": "knee"}),
                json!({"LOWER": "-"}),
                json!({"LOWER": "length"})
            ]
        );

        out.clear();
        translate(&PatternToken::phrase("Hello world"), &cfg, &mut out).unwrap();
        assert_eq!(out, vec![json!({"LOWER": "hello"}), json!({"LOWER": "world"})]);
    }

    #[test]
    fn tag_with_word_and_list() {
        let cfg = SessionConfig::default();
        let tag = |target| {
            PatternToken::new(PatternKind::Tag(TagSpec {
                tag: "^VB".into(),
                target,
            }))
        };
        assert_eq!(one(tag(TagTarget::Any), &cfg), json!({"TAG": {"REGEX": "^VB"}}));
        assert_eq!(
            one(tag(TagTarget::Word("Proposed".into())), &cfg),
            json!({"TAG": {"REGEX": "^VB"}, "LOWER": "proposed"})
        );
        assert_eq!(
            one(tag(TagTarget::Word("Proposed".into())), &case_sensitive()),
            json!({"TAG": {"REGEX": "^VB"}, "TEXT": "Proposed"})
        );
        assert_eq!(
            one(
                tag(TagTarget::List(vec!["proposed".into(), "perceived".into()])),
                &cfg
            ),
            json!({"TAG": {"REGEX": "^VB"}, "LOWER": {"REGEX": "^(perceived|proposed)$"}})
        );
    }

    #[test]
    fn orth_keeps_case_when_overridden() {
        let cfg = SessionConfig::default();
        let mut op = Op::default();
        op.case_sensitive = true;
        let token = PatternToken::with_op(PatternKind::Orth("Hello".into()), op);
        assert_eq!(one(token, &cfg), json!({"ORTH": "Hello"}));
        assert_eq!(one(PatternToken::value("Hello"), &cfg), json!({"LOWER": "hello"}));
    }

    #[test]
    fn either_is_unsupported() {
        let cfg = SessionConfig::default();
        let token = PatternToken::new(PatternKind::Either(vec![PatternToken::value("a")]));
        let err = translate(&token, &cfg, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, RitaError::Unsupported { .. }));
    }

    #[test]
    fn group_keeps_label_and_order() {
        let mut cfg = SessionConfig::default();
        let group = RuleGroup::new(
            "COLORED_CAR",
            vec![PatternToken::any_of(["red", "blue"]), PatternToken::value("car")],
        );
        let artifact = SpacyBackend.compile(&[group], &mut cfg).unwrap();
        let patterns = artifact.patterns().unwrap();
        assert_eq!(patterns[0].label, "COLORED_CAR");
        assert_eq!(
            patterns[0].pattern,
            vec![json!({"LOWER": {"IN": ["blue", "red"]}}), json!({"LOWER": "car"})]
        );
    }
}
