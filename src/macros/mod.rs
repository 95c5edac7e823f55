//! Pattern-building macros.
//!
//! A macro takes its already-evaluated arguments, the session configuration
//! and the operator written after it, and yields a [`MacroOutput`]. Names are
//! resolved against the built-in set first, then against every registered
//! [`MacroProvider`] in registration order.

pub mod modules;

use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Result, RitaError};
use crate::pattern::{Op, PatternKind, PatternToken, RuleGroup};
use crate::value::Value;

/// Regex used by `WORD` without arguments. The lookahead keeps a repeated
/// `WORD` from splitting one word into several matches.
pub const WORD_REGEX: &str = r"(\w|['_-])+(?![\w'-])";
/// Regex used by `NUM` without arguments.
pub const NUM_REGEX: &str = r"\d+[.]?\d*(?!\d)";

pub type MacroFn = fn(&[Value], &mut SessionConfig, Op) -> Result<MacroOutput>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroOutput {
    /// A pattern element, a string or a list of either.
    Value(Value),
    /// A labelled rule, produced by `MARK`.
    Rule(RuleGroup),
    /// Directives that only touch the session.
    Unit,
}

impl MacroOutput {
    fn token(kind: PatternKind, op: Op) -> Self {
        MacroOutput::Value(Value::Token(PatternToken::with_op(kind, op)))
    }
}

/// A named group of macros that can be registered on a session.
pub trait MacroProvider: Send + Sync {
    /// The module name used by `IMPORT`, e.g. "fuzzy".
    fn name(&self) -> &'static str;

    /// Look up one of this module's macros.
    fn resolve(&self, name: &str) -> Option<MacroFn>;
}

/// The built-in macro set.
pub fn builtin(name: &str) -> Option<MacroFn> {
    let f: MacroFn = match name {
        "ANY" => any,
        "PUNCT" => punct,
        "MARK" => mark,
        "ASSIGN" => assign,
        "IN_LIST" => in_list,
        "PATTERN" => pattern,
        "NESTED" => nested,
        "WORD" => word,
        "NUM" => num,
        "POS" => pos,
        "ENTITY" => entity,
        "LEMMA" => lemma,
        "PREFIX" => prefix,
        "IMPORT" => import,
        "CONFIG" => configure,
        "EXEC" => exec,
        _ => return None,
    };
    Some(f)
}

/// Resolve a macro name: built-ins first, then registered modules in order.
pub fn resolve_macro(name: &str, config: &SessionConfig) -> Result<MacroFn> {
    if let Some(f) = builtin(name) {
        return Ok(f);
    }
    for module in config.modules() {
        if let Some(f) = module.resolve(name) {
            debug!("Macro {name} resolved from module {}", module.name());
            return Ok(f);
        }
    }
    Err(RitaError::UnresolvedMacro(name.to_string()))
}

/// Whether `name` resolves to any macro in this session.
pub fn is_macro(name: &str, config: &SessionConfig) -> bool {
    resolve_macro(name, config).is_ok()
}

pub(crate) fn check_arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        };
        return Err(RitaError::invalid_argument(
            name,
            format!("expected {expected} argument(s), got {}", args.len()),
        ));
    }
    Ok(())
}

/// Strings from every argument, flattened, with duplicates removed.
pub(crate) fn collect_unique(name: &str, args: &[Value]) -> Result<Vec<String>> {
    let mut items: Vec<String> = Vec::new();
    for arg in args {
        for s in arg.flatten_strings(name)? {
            if !items.contains(&s) {
                items.push(s);
            }
        }
    }
    Ok(items)
}

fn any(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("ANY", args, 0, 0)?;
    Ok(MacroOutput::token(PatternKind::Any, op))
}

fn punct(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("PUNCT", args, 0, 0)?;
    Ok(MacroOutput::token(PatternKind::Punct, op))
}

fn mark(args: &[Value], _config: &mut SessionConfig, _op: Op) -> Result<MacroOutput> {
    check_arity("MARK", args, 2, 2)?;
    let label = args[0].expect_str("MARK")?;
    let tokens = match &args[1] {
        Value::List(items) => items
            .iter()
            .cloned()
            .map(|item| item.into_token("MARK"))
            .collect::<Result<Vec<_>>>()?,
        other => vec![other.clone().into_token("MARK")?],
    };
    if tokens.is_empty() {
        return Err(RitaError::invalid_argument("MARK", "rule has no pattern"));
    }
    Ok(MacroOutput::Rule(RuleGroup::new(label, tokens)))
}

fn assign(args: &[Value], config: &mut SessionConfig, _op: Op) -> Result<MacroOutput> {
    check_arity("ASSIGN", args, 2, 2)?;
    let name = args[0].expect_str("ASSIGN")?;
    config.set_variable(name, args[1].clone());
    Ok(MacroOutput::Unit)
}

fn in_list(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    let items = collect_unique("IN_LIST", args)?;
    if items.is_empty() {
        return Err(RitaError::invalid_argument("IN_LIST", "list must not be empty"));
    }
    Ok(MacroOutput::token(PatternKind::AnyOf(items), op))
}

fn pattern(args: &[Value], _config: &mut SessionConfig, _op: Op) -> Result<MacroOutput> {
    let tokens = args
        .iter()
        .cloned()
        .map(|arg| arg.into_token("PATTERN").map(Value::Token))
        .collect::<Result<Vec<_>>>()?;
    Ok(MacroOutput::Value(Value::List(tokens)))
}

fn nested(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    let children = match args {
        [Value::List(items)] => items.clone(),
        _ => args.to_vec(),
    };
    let children = children
        .into_iter()
        .map(|child| child.into_token("NESTED"))
        .collect::<Result<Vec<_>>>()?;
    Ok(MacroOutput::token(PatternKind::Nested(children), op))
}

fn word(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("WORD", args, 0, 1)?;
    let kind = match args.first() {
        Some(arg) => PatternKind::Value(arg.expect_str("WORD")?),
        None => PatternKind::Regex(WORD_REGEX.to_string()),
    };
    Ok(MacroOutput::token(kind, op))
}

fn num(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("NUM", args, 0, 1)?;
    let kind = match args.first() {
        Some(arg) => PatternKind::Value(arg.expect_str("NUM")?),
        None => PatternKind::Regex(NUM_REGEX.to_string()),
    };
    Ok(MacroOutput::token(kind, op))
}

fn pos(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    let names = collect_unique("POS", args)?;
    if names.is_empty() {
        return Err(RitaError::invalid_argument("POS", "expected at least one tag"));
    }
    Ok(MacroOutput::token(PatternKind::Pos(names), op))
}

fn entity(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    let names = collect_unique("ENTITY", args)?;
    if names.is_empty() {
        return Err(RitaError::invalid_argument("ENTITY", "expected at least one entity type"));
    }
    Ok(MacroOutput::token(PatternKind::Entity(names), op))
}

fn lemma(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("LEMMA", args, 1, 1)?;
    Ok(MacroOutput::token(PatternKind::Lemma(args[0].expect_str("LEMMA")?), op))
}

fn prefix(args: &[Value], _config: &mut SessionConfig, op: Op) -> Result<MacroOutput> {
    check_arity("PREFIX", args, 1, 1)?;
    Ok(MacroOutput::token(PatternKind::Prefix(args[0].expect_str("PREFIX")?), op))
}

fn import(args: &[Value], config: &mut SessionConfig, _op: Op) -> Result<MacroOutput> {
    check_arity("IMPORT", args, 1, 1)?;
    config.register_module(&args[0].expect_str("IMPORT")?)?;
    Ok(MacroOutput::Unit)
}

fn configure(args: &[Value], config: &mut SessionConfig, _op: Op) -> Result<MacroOutput> {
    check_arity("CONFIG", args, 2, 2)?;
    let key = args[0].expect_str("CONFIG")?;
    let value = args[1].expect_str("CONFIG")?;
    config.set_config(&key, &value)?;
    Ok(MacroOutput::Unit)
}

fn exec(args: &[Value], _config: &mut SessionConfig, _op: Op) -> Result<MacroOutput> {
    check_arity("EXEC", args, 0, 1)?;
    Ok(match args.first() {
        Some(value) => MacroOutput::Value(value.clone()),
        None => MacroOutput::Unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Modifier;

    fn call(name: &str, args: &[Value]) -> MacroOutput {
        let mut cfg = SessionConfig::default();
        call_with(name, args, &mut cfg, Op::default())
    }

    fn call_with(name: &str, args: &[Value], cfg: &mut SessionConfig, op: Op) -> MacroOutput {
        let f = resolve_macro(name, cfg).unwrap();
        f(args, cfg, op).unwrap()
    }

    fn token(output: MacroOutput) -> PatternToken {
        match output {
            MacroOutput::Value(Value::Token(t)) => t,
            other => panic!("Expected token, got {other:?}"),
        }
    }

    #[test]
    fn any_and_punct() {
        assert_eq!(token(call("ANY", &[])).kind, PatternKind::Any);
        assert_eq!(token(call("PUNCT", &[])).kind, PatternKind::Punct);
    }

    #[test]
    fn any_with_op() {
        let mut cfg = SessionConfig::default();
        let t = token(call_with("ANY", &[], &mut cfg, Op::new(Some(Modifier::OneOrMore))));
        assert_eq!(t.op.modifier, Some(Modifier::OneOrMore));
    }

    #[test]
    fn word_with_and_without_arg() {
        assert_eq!(
            token(call("WORD", &["test".into()])).kind,
            PatternKind::Value("test".into())
        );
        match token(call("WORD", &[])).kind {
            PatternKind::Regex(r) => assert!(r.contains(r"(\w|['_-])")),
            other => panic!("Expected regex, got {other:?}"),
        }
    }

    #[test]
    fn num_without_arg() {
        match token(call("NUM", &[])).kind {
            PatternKind::Regex(r) => assert!(r.contains(r"\d+")),
            other => panic!("Expected regex, got {other:?}"),
        }
        assert_eq!(
            token(call("NUM", &["42".into()])).kind,
            PatternKind::Value("42".into())
        );
    }

    #[test]
    fn pos_and_entity_collect_names() {
        assert_eq!(
            token(call("POS", &["VERB".into()])).kind,
            PatternKind::Pos(vec!["VERB".into()])
        );
        assert_eq!(
            token(call("ENTITY", &["PERSON".into(), "ORG".into()])).kind,
            PatternKind::Entity(vec!["PERSON".into(), "ORG".into()])
        );
    }

    #[test]
    fn lemma_and_prefix() {
        assert_eq!(token(call("LEMMA", &["run".into()])).kind, PatternKind::Lemma("run".into()));
        assert_eq!(
            token(call("PREFIX", &["meta".into()])).kind,
            PatternKind::Prefix("meta".into())
        );
    }

    #[test]
    fn in_list_flattens_and_dedupes() {
        let args = [Value::from(vec!["a", "b"]), Value::from("a"), Value::from("c")];
        assert_eq!(
            token(call("IN_LIST", &args)).kind,
            PatternKind::AnyOf(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn in_list_rejects_empty() {
        let cfg = &mut SessionConfig::default();
        let f = resolve_macro("IN_LIST", cfg).unwrap();
        let err = f(&[Value::List(vec![])], cfg, Op::default()).unwrap_err();
        assert!(matches!(err, RitaError::InvalidArgument { .. }));
    }

    #[test]
    fn mark_builds_rule_group() {
        let data = Value::List(vec![Value::Token(PatternToken::value("test"))]);
        match call("MARK", &["LABEL".into(), data]) {
            MacroOutput::Rule(group) => {
                assert_eq!(group.label, "LABEL");
                assert_eq!(group.tokens, vec![PatternToken::value("test")]);
            }
            other => panic!("Expected rule, got {other:?}"),
        }
    }

    #[test]
    fn pattern_wraps_lists_as_nested() {
        let inner = Value::List(vec![Value::Token(PatternToken::value("test"))]);
        match call("PATTERN", &[inner]) {
            MacroOutput::Value(Value::List(items)) => {
                assert_eq!(
                    items,
                    vec![Value::Token(PatternToken::new(PatternKind::Nested(vec![
                        PatternToken::value("test")
                    ])))]
                );
            }
            other => panic!("Expected list, got {other:?}"),
        }
    }

    #[test]
    fn nested_keeps_op() {
        let mut cfg = SessionConfig::default();
        let children = Value::List(vec![Value::Token(PatternToken::value("a"))]);
        let t = token(call_with(
            "NESTED",
            &[children],
            &mut cfg,
            Op::new(Some(Modifier::OneOrMore)),
        ));
        assert_eq!(t.name(), "nested");
        assert_eq!(t.op.modifier, Some(Modifier::OneOrMore));
    }

    #[test]
    fn assign_and_config_mutate_session() {
        let mut cfg = SessionConfig::default();
        call_with("ASSIGN", &["myvar".into(), "myval".into()], &mut cfg, Op::default());
        assert_eq!(cfg.get_variable("myvar").unwrap(), Value::from("myval"));

        call_with("CONFIG", &["ignore_case".into(), "N".into()], &mut cfg, Op::default());
        assert!(!cfg.ignore_case);
        call_with("CONFIG", &["ignore_case".into(), "Y".into()], &mut cfg, Op::default());
        assert!(cfg.ignore_case);
    }

    #[test]
    fn import_registers_module_and_exposes_its_macros() {
        let mut cfg = SessionConfig::default();
        assert!(!is_macro("FUZZY", &cfg));
        call_with("IMPORT", &["rita.modules.fuzzy".into()], &mut cfg, Op::default());
        assert_eq!(cfg.modules().len(), 1);
        assert!(is_macro("FUZZY", &cfg));
    }

    #[test]
    fn exec_returns_its_argument() {
        assert_eq!(call("EXEC", &["hello".into()]), MacroOutput::Value("hello".into()));
    }

    #[test]
    fn unresolved_macro() {
        let cfg = SessionConfig::default();
        let err = resolve_macro("NOPE", &cfg).unwrap_err();
        assert_eq!(err.to_string(), "MACRO NOPE not loaded");
    }

    #[test]
    fn wrong_arity() {
        let cfg = &mut SessionConfig::default();
        let f = resolve_macro("LEMMA", cfg).unwrap();
        let err = f(&[], cfg, Op::default()).unwrap_err();
        assert!(err.to_string().contains("LEMMA"));
    }
}
