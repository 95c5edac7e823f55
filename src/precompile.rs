//! Source-level directives handled before lexing.
//!
//! - `@import "path/to/rules.rita"` on its own line inlines another rules
//!   file. Paths are relative to the directory of the file doing the import.
//! - `@alias MACRO NAME` lets rules write `NAME` for `MACRO`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Result, RitaError};

/// Imports nested deeper than this are assumed to be cyclic.
pub const MAX_IMPORT_DEPTH: usize = 50;

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*@import[ \t]+["'](?P<path>(\w|[/\-.])+)["']"#).unwrap()
});

static ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*@alias[ \t]+(?P<target>\w+)[ \t]+(?P<alias>\w+)[ \t]*\r?\n?").unwrap()
});

/// Expand imports and aliases. `base_dir` anchors relative import paths;
/// `None` means the current directory.
pub fn precompile(raw: &str, base_dir: Option<&Path>) -> Result<String> {
    let base = base_dir.map(Path::to_path_buf).unwrap_or_default();
    let expanded = expand_imports(raw, &base, 0)?;
    Ok(apply_aliases(&expanded))
}

fn expand_imports(raw: &str, base: &Path, depth: usize) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for caps in IMPORT_RE.captures_iter(raw) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let path = base.join(&caps["path"]);
        if depth >= MAX_IMPORT_DEPTH {
            return Err(RitaError::CyclicImport {
                path,
                depth: MAX_IMPORT_DEPTH,
            });
        }
        debug!("Importing: {}", path.display());
        let content = fs::read_to_string(&path)?;
        let nested_base = path.parent().map(Path::to_path_buf).unwrap_or_else(PathBuf::new);

        out.push_str(&raw[last..whole.start]);
        out.push_str(&expand_imports(&content, &nested_base, depth + 1)?);
        last = whole.end;
    }
    out.push_str(&raw[last..]);
    Ok(out)
}

fn apply_aliases(raw: &str) -> String {
    let aliases: Vec<(String, String)> = ALIAS_RE
        .captures_iter(raw)
        .map(|caps| (caps["alias"].to_string(), caps["target"].to_string()))
        .collect();
    if aliases.is_empty() {
        return raw.to_string();
    }
    for (alias, target) in &aliases {
        debug!("Alias {alias} -> {target}");
    }

    let stripped = ALIAS_RE.replace_all(raw, "");
    replace_outside_literals(&stripped, |word| {
        aliases
            .iter()
            .find(|(alias, _)| alias == word)
            .map(|(_, target)| target.as_str())
    })
}

/// Rewrite identifiers found outside quoted literals and comments.
fn replace_outside_literals<'a, F>(source: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(source.len());
    let mut chars = source.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            '"' | '\'' => {
                out.push(c);
                let mut escaped = false;
                for (_, inner) in chars.by_ref() {
                    out.push(inner);
                    if escaped {
                        escaped = false;
                    } else if inner == '\\' {
                        escaped = true;
                    } else if inner == c {
                        break;
                    }
                }
            }
            '#' => {
                out.push(c);
                for (_, inner) in chars.by_ref() {
                    out.push(inner);
                    if inner == '\n' {
                        break;
                    }
                }
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !(next.is_alphanumeric() || next == '_') {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let word = &source[start..end];
                out.push_str(lookup(word).unwrap_or(word));
            }
            _ => out.push(c),
        }
    }
    out
}
