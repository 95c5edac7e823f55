//! Tree-walking evaluation of parsed statements into rule groups.
//!
//! Statements run in source order against one session: bindings store their
//! evaluated value (later uses see a copy), directives run for their side
//! effects, and each rule evaluates its pattern bottom-up before handing it
//! to its label macro.

use tracing::debug;

use crate::config::SessionConfig;
use crate::dsl::ast::{Expr, MacroCall, Statement, call_summary};
use crate::error::{Result, RitaError};
use crate::macros::{MacroOutput, resolve_macro};
use crate::pattern::{Modifier, Op, PatternKind, PatternToken, RuleGroup};
use crate::value::Value;

pub struct Resolver<'a> {
    config: &'a mut SessionConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a mut SessionConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&mut self, statements: &[Statement]) -> Result<Vec<RuleGroup>> {
        let mut groups = Vec::new();
        for statement in statements {
            if let Some(group) = self.statement(statement)? {
                groups.push(group);
            }
        }
        debug!("Resolved {} rule group(s)", groups.len());
        Ok(groups)
    }

    fn statement(&mut self, statement: &Statement) -> Result<Option<RuleGroup>> {
        match statement {
            Statement::Binding { name, value, .. } => {
                let value = self.expr(value)?;
                self.config.set_variable(name.clone(), value);
                Ok(None)
            }
            Statement::Exec(call) => {
                debug!("Exec {}", call_summary(call));
                self.call(call)?;
                Ok(None)
            }
            Statement::Rule { pattern, label, .. } => {
                let elements = pattern
                    .iter()
                    .map(|e| self.expr(e))
                    .collect::<Result<Vec<_>>>()?;
                let mut args = label
                    .args
                    .iter()
                    .map(|e| self.expr(e))
                    .collect::<Result<Vec<_>>>()?;
                args.push(Value::List(elements));

                let f = resolve_macro(&label.name, self.config)?;
                match f(&args, self.config, Op::new(label.op))? {
                    MacroOutput::Rule(group) => Ok(Some(group)),
                    _ => Err(RitaError::invalid_argument(
                        &label.name,
                        "cannot be used as a rule label",
                    )),
                }
            }
        }
    }

    fn call(&mut self, call: &MacroCall) -> Result<MacroOutput> {
        let f = resolve_macro(&call.name, self.config)?;
        let args = call
            .args
            .iter()
            .map(|e| self.expr(e))
            .collect::<Result<Vec<_>>>()?;
        f(&args, self.config, Op::new(call.op))
    }

    fn call_value(&mut self, call: &MacroCall) -> Result<Value> {
        match self.call(call)? {
            MacroOutput::Value(value) => Ok(value),
            MacroOutput::Rule(_) | MacroOutput::Unit => Err(RitaError::invalid_argument(
                &call.name,
                "does not produce a pattern",
            )),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(s) => Ok(Value::Str(s.clone())),
            Expr::Call(call) => self.call_value(call),
            Expr::Name { name, op, line } => self.name(name, *op, *line),
            Expr::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|e| self.expr(e))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Expr::Either(alternatives) => {
                let tokens = alternatives
                    .iter()
                    .map(|e| self.expr(e)?.into_token("either"))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Token(PatternToken::new(PatternKind::Either(tokens))))
            }
        }
    }

    /// A bare name is a variable if one is bound, otherwise a macro invoked
    /// without arguments.
    fn name(&mut self, name: &str, op: Option<Modifier>, line: usize) -> Result<Value> {
        if let Some(value) = self.config.variable(name) {
            return apply_modifier(value.clone(), op);
        }
        if resolve_macro(name, self.config).is_ok() {
            let call = MacroCall {
                name: name.to_string(),
                args: Vec::new(),
                op,
                line,
            };
            return self.call_value(&call);
        }
        debug!("Name {name} on line {line} is neither a variable nor a macro");
        if looks_like_macro(name) {
            Err(RitaError::UnresolvedMacro(name.to_string()))
        } else {
            Err(RitaError::UndefinedVariable(name.to_string()))
        }
    }
}

/// `x?` on a variable: patterns take the modifier, lists become a nested
/// group carrying it.
fn apply_modifier(value: Value, modifier: Option<Modifier>) -> Result<Value> {
    let Some(modifier) = modifier else {
        return Ok(value);
    };
    let mut token = match value {
        Value::List(items) => {
            let children = items
                .into_iter()
                .map(|item| item.into_token("variable"))
                .collect::<Result<Vec<_>>>()?;
            PatternToken::new(PatternKind::Nested(children))
        }
        other => other.into_token("variable")?,
    };
    token.op.modifier = Some(modifier);
    Ok(Value::Token(token))
}

fn looks_like_macro(name: &str) -> bool {
    name.chars().any(|c| c.is_alphabetic())
        && name
            .chars()
            .all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Evaluate statements against a session.
pub fn resolve(statements: &[Statement], config: &mut SessionConfig) -> Result<Vec<RuleGroup>> {
    Resolver::new(config).resolve(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse;

    fn resolve_source(source: &str) -> Result<Vec<RuleGroup>> {
        let mut cfg = SessionConfig::default();
        resolve(&parse(source)?, &mut cfg)
    }

    #[test]
    fn single_word_rule() {
        let groups = resolve_source(r#"WORD("Test")->MARK("LABEL")"#).unwrap();
        assert_eq!(groups, vec![RuleGroup::new("LABEL", vec![PatternToken::value("Test")])]);
    }

    #[test]
    fn directives_produce_no_groups() {
        let groups = resolve_source(
            r#"
            !CONFIG("implicit_punct", "N")
            x = "a"
            "#,
        )
        .unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn variable_list_feeds_in_list() {
        let groups = resolve_source(
            r#"
            colors = {"red", "green"}
            IN_LIST(colors)->MARK("COLOR")
            "#,
        )
        .unwrap();
        assert_eq!(groups[0].tokens, vec![PatternToken::any_of(["red", "green"])]);
    }

    #[test]
    fn bindings_are_copied() {
        let groups = resolve_source(
            r#"
            a = "first"
            b = a
            a = "second"
            WORD(b)->MARK("B")
            "#,
        )
        .unwrap();
        assert_eq!(groups[0].tokens, vec![PatternToken::value("first")]);
    }

    #[test]
    fn either_becomes_token() {
        let groups = resolve_source(r#"{WORD("a")|WORD("b")}->MARK("E")"#).unwrap();
        assert_eq!(
            groups[0].tokens,
            vec![PatternToken::new(PatternKind::Either(vec![
                PatternToken::value("a"),
                PatternToken::value("b"),
            ]))]
        );
    }

    #[test]
    fn pattern_variable_becomes_nested() {
        let groups = resolve_source(
            r#"
            p = PATTERN(WORD("a"), WORD("b"))
            {p, WORD("c")}->MARK("P")
            "#,
        )
        .unwrap();
        assert_eq!(
            groups[0].tokens,
            vec![
                PatternToken::new(PatternKind::Nested(vec![
                    PatternToken::value("a"),
                    PatternToken::value("b"),
                ])),
                PatternToken::value("c"),
            ]
        );
    }

    #[test]
    fn modifier_on_variable() {
        let groups = resolve_source(
            r#"
            w = WORD("x")
            {w?, WORD("y")}->MARK("M")
            "#,
        )
        .unwrap();
        assert_eq!(groups[0].tokens[0], PatternToken::value("x").optional());
    }

    #[test]
    fn zero_arg_macro_by_name() {
        let groups = resolve_source(r#"{NUM+, PUNCT}->MARK("N")"#).unwrap();
        assert_eq!(groups[0].tokens[0].op.modifier, Some(Modifier::OneOrMore));
        assert_eq!(groups[0].tokens[1], PatternToken::punct());
    }

    #[test]
    fn undefined_variable() {
        let err = resolve_source(r#"IN_LIST(missing)->MARK("X")"#).unwrap_err();
        assert!(matches!(err, RitaError::UndefinedVariable(ref n) if n == "missing"));
    }

    #[test]
    fn unresolved_macro() {
        let err = resolve_source(r#"FUZZY("x")->MARK("X")"#).unwrap_err();
        assert!(matches!(err, RitaError::UnresolvedMacro(ref n) if n == "FUZZY"));
    }

    #[test]
    fn imported_module_macro() {
        let groups = resolve_source(
            r#"
            !IMPORT("rita.modules.fuzzy")
            FUZZY("test")->MARK("FUZZY_MATCH")
            "#,
        )
        .unwrap();
        assert_eq!(groups[0].tokens[0].name(), "fuzzy");
    }

    #[test]
    fn label_must_be_mark() {
        let err = resolve_source(r#"WORD("a")->WORD("b")"#).unwrap_err();
        assert!(matches!(err, RitaError::InvalidArgument { .. }));
    }

    #[test]
    fn resolving_is_deterministic() {
        let source = r#"
            items = {"a", "b-c", "d"}
            {IN_LIST(items), WORD("x")|WORD("y"), NUM?}->MARK("D")
        "#;
        assert_eq!(resolve_source(source).unwrap(), resolve_source(source).unwrap());
    }
}
