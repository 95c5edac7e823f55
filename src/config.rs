//! Request-scoped session configuration.
//!
//! A fresh [`SessionConfig`] is created for every compile call and threaded
//! explicitly through the resolver, the macros, the preprocessing stages and
//! the backend. Nothing here is global.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Result, RitaError};
use crate::macros::MacroProvider;
use crate::macros::modules;
use crate::value::Value;

/// A `CONFIG` value after boolean coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    Text(String),
}

impl ConfigValue {
    /// `"1"/"T"/"Y"` → true, `"0"/"F"/"N"` → false, anything else verbatim.
    pub fn coerce(raw: &str) -> ConfigValue {
        match raw.trim().to_uppercase().as_str() {
            "1" | "T" | "Y" => ConfigValue::Bool(true),
            "0" | "F" | "N" => ConfigValue::Bool(false),
            _ => ConfigValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Text(s) => f.write_str(s),
        }
    }
}

pub struct SessionConfig {
    /// Case-insensitive matching (default: true).
    pub ignore_case: bool,
    /// Insert an optional punctuation token between rule elements (default: true).
    pub implicit_punct: bool,
    /// Insert an optional hyphen between rule elements; wins over `implicit_punct`.
    pub implicit_hyphen: bool,
    /// Split lists holding multi-word members into separate rules (default: true).
    pub list_branching: bool,
    /// Also match accent-free spellings of accented words (default: true).
    pub deaccent: bool,
    /// Backend selected for this compile.
    pub engine: String,
    variables: HashMap<String, Value>,
    modules: Vec<Arc<dyn MacroProvider>>,
    settings: BTreeMap<String, ConfigValue>,
    nested_group_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ignore_case: true,
            implicit_punct: true,
            implicit_hyphen: false,
            list_branching: true,
            deaccent: true,
            engine: crate::engine::DEFAULT_ENGINE.to_string(),
            variables: HashMap::new(),
            modules: Vec::new(),
            settings: BTreeMap::new(),
            nested_group_count: 0,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("ignore_case", &self.ignore_case)
            .field("implicit_punct", &self.implicit_punct)
            .field("implicit_hyphen", &self.implicit_hyphen)
            .field("list_branching", &self.list_branching)
            .field("deaccent", &self.deaccent)
            .field("engine", &self.engine)
            .field("variables", &self.variables.keys().collect::<Vec<_>>())
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("settings", &self.settings)
            .finish()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: &str) -> Self {
        Self {
            engine: engine.to_string(),
            ..Self::default()
        }
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        debug!("Variable {name} = {value:?}");
        self.variables.insert(name, value);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn get_variable(&self, name: &str) -> Result<Value> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| RitaError::UndefinedVariable(name.to_string()))
    }

    /// Apply a `CONFIG(key, value)` directive.
    pub fn set_config(&mut self, key: &str, raw: &str) -> Result<()> {
        let value = ConfigValue::coerce(raw);
        let flag = match key {
            "ignore_case" => &mut self.ignore_case,
            "implicit_punct" => &mut self.implicit_punct,
            "implicit_hyphen" | "implicit_hyphon" => &mut self.implicit_hyphen,
            "list_branching" => &mut self.list_branching,
            "deaccent" => &mut self.deaccent,
            _ => {
                debug!("Storing custom setting {key} = {value}");
                self.settings.insert(key.to_string(), value);
                return Ok(());
            }
        };
        match value {
            ConfigValue::Bool(b) => *flag = b,
            ConfigValue::Text(_) => {
                warn!("Config {key} expects 1/T/Y or 0/F/N, got '{raw}'; flag left as {flag}");
                self.settings.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    pub fn setting(&self, key: &str) -> Option<&ConfigValue> {
        self.settings.get(key)
    }

    /// Register one of the bundled macro modules by name
    /// (`"rita.modules.fuzzy"` or just `"fuzzy"`).
    pub fn register_module(&mut self, name: &str) -> Result<()> {
        let provider = modules::builtin_module(name)
            .ok_or_else(|| RitaError::UnknownModule(name.to_string()))?;
        self.register_provider(provider);
        Ok(())
    }

    /// Register a macro provider. Providers are consulted in registration order.
    pub fn register_provider(&mut self, provider: Arc<dyn MacroProvider>) {
        if self.modules.iter().any(|m| m.name() == provider.name()) {
            warn!("Module {} is already imported", provider.name());
            return;
        }
        debug!("Registered module {}", provider.name());
        self.modules.push(provider);
    }

    pub fn modules(&self) -> &[Arc<dyn MacroProvider>] {
        &self.modules
    }

    pub fn new_nested_group_id(&mut self) -> usize {
        let id = self.nested_group_count;
        self.nested_group_count += 1;
        id
    }
}
