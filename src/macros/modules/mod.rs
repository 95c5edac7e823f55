//! Macro modules that rules can pull in with `IMPORT("rita.modules.<name>")`.

pub mod fuzzy;
pub mod names;
pub mod orth;
pub mod pluralize;
pub mod regex;
pub mod tag;

use std::sync::Arc;

use super::MacroProvider;

const MODULE_PREFIX: &str = "rita.modules.";

/// Names of every bundled module.
pub const BUILTIN_MODULES: &[&str] = &["fuzzy", "names", "orth", "pluralize", "regex", "tag"];

/// Look up a bundled module by its full (`rita.modules.fuzzy`) or short
/// (`fuzzy`) name.
pub fn builtin_module(name: &str) -> Option<Arc<dyn MacroProvider>> {
    let short = name.strip_prefix(MODULE_PREFIX).unwrap_or(name);
    let module: Arc<dyn MacroProvider> = match short {
        "fuzzy" => Arc::new(fuzzy::Fuzzy),
        "names" => Arc::new(names::Names),
        "orth" => Arc::new(orth::Orth),
        "pluralize" => Arc::new(pluralize::Pluralize),
        "regex" => Arc::new(regex::Regex),
        "tag" => Arc::new(tag::Tag),
        _ => return None,
    };
    Some(module)
}
