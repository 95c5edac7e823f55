pub mod cli;
pub mod config;
pub mod dsl;
pub mod engine;
pub mod error;
pub mod macros;
pub mod pattern;
pub mod precompile;
pub mod preprocess;
pub mod resolver;
pub mod value;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use tracing::{debug, info, warn};

use cli::Args;
use config::SessionConfig;
use dsl::Parser;
use engine::{Artifact, EngineRegistry};
use error::Result;
use pattern::RuleGroup;
use value::Value;

pub use engine::{Match, RuleExecutor, Submatch};
pub use error::RitaError;

/// Parse, resolve and preprocess a rules source into final rule groups.
///
/// `source` must already be precompiled (imports and aliases expanded).
pub fn compile_rules(source: &str, config: &mut SessionConfig) -> Result<Vec<RuleGroup>> {
    let mut parser = Parser::from_source(source);
    let statements = if source.trim().is_empty() {
        Vec::new()
    } else {
        parser.parse()?
    };
    if !parser.diagnostics().is_empty() {
        warn!("{} character(s) skipped while lexing", parser.diagnostics().len());
    }
    let groups = resolver::resolve(&statements, config)?;
    let groups = preprocess::preprocess(groups, config);
    debug!("{} rule group(s) after preprocessing", groups.len());
    Ok(groups)
}

fn session<I, K, V>(engine: &str, variables: I) -> SessionConfig
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let mut config = SessionConfig::with_engine(engine);
    for (name, value) in variables {
        config.set_variable(name, value.into());
    }
    config
}

fn compile_with(
    source: &str,
    base_dir: Option<&Path>,
    mut config: SessionConfig,
) -> Result<Artifact> {
    let registry = EngineRegistry::default_registry();
    let backend = registry.get(&config.engine)?;
    let source = precompile::precompile(source, base_dir)?;
    let groups = compile_rules(&source, &mut config)?;
    backend.compile(&groups, &mut config)
}

/// Compile rules text with the named engine. `variables` are bound before
/// parsing, so rules can reference them by name.
pub fn compile_string<I, K, V>(source: &str, engine: &str, variables: I) -> Result<Artifact>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    compile_with(source, None, session(engine, variables))
}

/// Compile a rules file. Imports resolve relative to the file's directory.
pub fn compile_file<I, K, V>(path: &Path, engine: &str, variables: I) -> Result<Artifact>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let source = fs::read_to_string(path)?;
    compile_with(&source, path.parent(), session(engine, variables))
}

/// No external variables, for the common case.
pub fn no_variables() -> Vec<(String, Value)> {
    Vec::new()
}

fn output(out: Option<&Path>) -> AnyResult<Box<dyn Write>> {
    Ok(match out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

/// Run the command line. Returns the exit code: 0 = every rule compiled,
/// 1 = some rule groups were dropped.
pub fn run(args: Args) -> AnyResult<i32> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    // --emit-ir: print the preprocessed rule groups and exit
    if args.emit_ir {
        let mut config = SessionConfig::with_engine(&args.engine);
        let source = precompile::precompile(&raw, args.file.parent())?;
        let groups = compile_rules(&source, &mut config)?;
        let mut out = output(args.out.as_deref())?;
        for group in &groups {
            serde_json::to_writer(&mut out, group)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        return Ok(0);
    }

    let artifact = compile_with(&raw, args.file.parent(), SessionConfig::with_engine(&args.engine))
        .with_context(|| format!("failed to compile {}", args.file.display()))?;
    for dropped in artifact.dropped() {
        warn!("Dropped rule group: {}", RitaError::from(dropped.clone()));
    }

    let mut out = output(args.out.as_deref())?;
    if let Some(ref input) = args.input {
        let text = fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;
        let matches = artifact.execute(&text)?;
        info!("{} match(es) in {}", matches.len(), input.display());
        for m in &matches {
            serde_json::to_writer(&mut out, m)?;
            out.write_all(b"\n")?;
        }
    } else {
        artifact.write_jsonl(&mut out)?;
    }
    out.flush()?;

    if artifact.dropped().is_empty() {
        Ok(0)
    } else {
        Ok(1)
    }
}
