//! Values produced while evaluating macro arguments and variable bindings.

use crate::error::{Result, RitaError};
use crate::pattern::{PatternKind, PatternToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    List(Vec<Value>),
    Token(PatternToken),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Expect a single string argument.
    pub fn expect_str(&self, macro_name: &str) -> Result<String> {
        self.as_str().map(str::to_string).ok_or_else(|| {
            RitaError::invalid_argument(
                macro_name,
                format!("expected a string, got {}", self.describe()),
            )
        })
    }

    /// Collect every string, descending into nested lists.
    pub fn flatten_strings(&self, macro_name: &str) -> Result<Vec<String>> {
        let mut out = Vec::new();
        self.collect_strings(macro_name, &mut out)?;
        Ok(out)
    }

    fn collect_strings(&self, macro_name: &str, out: &mut Vec<String>) -> Result<()> {
        match self {
            Value::Str(s) => out.push(s.clone()),
            Value::List(items) => {
                for item in items {
                    item.collect_strings(macro_name, out)?;
                }
            }
            Value::Token(token) => {
                return Err(RitaError::invalid_argument(
                    macro_name,
                    format!("expected text, got {} pattern", token.name()),
                ));
            }
        }
        Ok(())
    }

    /// Turn a value into one pattern element.
    ///
    /// Strings become literal words and lists become `nested` tokens.
    pub fn into_token(self, macro_name: &str) -> Result<PatternToken> {
        match self {
            Value::Token(token) => Ok(token),
            Value::Str(s) => Ok(PatternToken::value(s)),
            Value::List(items) => {
                let children = items
                    .into_iter()
                    .map(|item| item.into_token(macro_name))
                    .collect::<Result<Vec<_>>>()?;
                Ok(PatternToken::new(PatternKind::Nested(children)))
            }
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Token(_) => "pattern",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<PatternToken> for Value {
    fn from(token: PatternToken) -> Self {
        Value::Token(token)
    }
}
