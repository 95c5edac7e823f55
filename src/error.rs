use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a compile or an execution.
///
/// Recoverable conditions are not represented here: unknown characters are
/// reported as [`crate::dsl::LexDiagnostic`]s, and rule groups whose regex
/// fails to build are returned as [`crate::engine::standalone::DroppedRule`]s.
#[derive(Debug, Error)]
pub enum RitaError {
    #[error("syntax error on line {line}: unexpected {found}, expected {expected}")]
    Syntax {
        line: usize,
        found: String,
        expected: String,
    },

    #[error("MACRO {0} not loaded")]
    UnresolvedMacro(String),

    #[error("variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("invalid argument for {macro_name}: {message}")]
    InvalidArgument { macro_name: String, message: String },

    #[error("rule '{feature}' is not supported in {engine} mode")]
    Unsupported { feature: String, engine: String },

    #[error("failed to compile '{pattern}' for {label}: {message}")]
    RegexCompile {
        label: String,
        pattern: String,
        message: String,
    },

    #[error("maximum import depth {depth} reached at {}, check for cyclical imports", path.display())]
    CyclicImport { path: PathBuf, depth: usize },

    #[error("unknown engine '{0}'")]
    UnknownEngine(String),

    #[error("unknown macro module '{0}'")]
    UnknownModule(String),

    #[error("execution failed for {label}: {message}")]
    Execution { label: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RitaError {
    pub fn invalid_argument(macro_name: &str, message: impl Into<String>) -> Self {
        RitaError::InvalidArgument {
            macro_name: macro_name.to_string(),
            message: message.into(),
        }
    }

    pub fn unsupported(feature: impl Into<String>, engine: &str) -> Self {
        RitaError::Unsupported {
            feature: feature.into(),
            engine: engine.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RitaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_macro_names_the_macro() {
        let err = RitaError::UnresolvedMacro("FOO".to_string());
        assert_eq!(err.to_string(), "MACRO FOO not loaded");
    }

    #[test]
    fn syntax_error_carries_line_and_token() {
        let err = RitaError::Syntax {
            line: 3,
            found: "','".to_string(),
            expected: "'->'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "syntax error on line 3: unexpected ',', expected '->'"
        );
    }

    #[test]
    fn unsupported_mentions_engine() {
        let err = RitaError::unsupported("ENTITY", "standalone");
        assert_eq!(
            err.to_string(),
            "rule 'ENTITY' is not supported in standalone mode"
        );
    }
}
