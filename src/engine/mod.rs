//! Compile targets.
//!
//! A [`Backend`] turns the preprocessed rule groups into an [`Artifact`].
//! Backends are looked up by name in an [`EngineRegistry`] built once by
//! the caller.

pub mod spacy;
pub mod standalone;

use std::collections::HashMap;
use std::io::Write;

use crate::config::SessionConfig;
use crate::error::{Result, RitaError};
use crate::pattern::RuleGroup;

pub use spacy::{PipelinePattern, SpacyBackend};
pub use standalone::{DroppedRule, Match, RuleExecutor, StandaloneBackend, Submatch};

pub const DEFAULT_ENGINE: &str = "standalone";

pub trait Backend: Send + Sync {
    /// Name used to select this backend, e.g. "standalone".
    fn name(&self) -> &'static str;

    fn compile(&self, rules: &[RuleGroup], config: &mut SessionConfig) -> Result<Artifact>;
}

/// What a backend produced.
#[derive(Debug)]
pub enum Artifact {
    /// Executable regex rule set plus the groups that failed to build.
    Standalone {
        executor: RuleExecutor,
        dropped: Vec<DroppedRule>,
    },
    /// Patterns for an external pipeline matcher.
    Patterns(Vec<PipelinePattern>),
}

impl Artifact {
    pub fn engine(&self) -> &'static str {
        match self {
            Artifact::Standalone { .. } => "standalone",
            Artifact::Patterns(_) => "spacy",
        }
    }

    pub fn executor(&self) -> Option<&RuleExecutor> {
        match self {
            Artifact::Standalone { executor, .. } => Some(executor),
            Artifact::Patterns(_) => None,
        }
    }

    pub fn into_executor(self) -> Result<RuleExecutor> {
        match self {
            Artifact::Standalone { executor, .. } => Ok(executor),
            Artifact::Patterns(_) => Err(RitaError::unsupported("execute", "spacy")),
        }
    }

    pub fn patterns(&self) -> Option<&[PipelinePattern]> {
        match self {
            Artifact::Patterns(p) => Some(p),
            Artifact::Standalone { .. } => None,
        }
    }

    pub fn dropped(&self) -> &[DroppedRule] {
        match self {
            Artifact::Standalone { dropped, .. } => dropped,
            Artifact::Patterns(_) => &[],
        }
    }

    /// Run the artifact against text. Only standalone artifacts execute.
    pub fn execute(&self, text: &str) -> Result<Vec<Match>> {
        match self {
            Artifact::Standalone { executor, .. } => executor.execute(text),
            Artifact::Patterns(_) => Err(RitaError::unsupported("execute", "spacy")),
        }
    }

    /// One JSON object per line: persisted rules or pipeline patterns.
    pub fn write_jsonl<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            Artifact::Standalone { executor, .. } => executor.write_jsonl(out),
            Artifact::Patterns(patterns) => {
                for pattern in patterns {
                    serde_json::to_writer(&mut *out, pattern)?;
                    out.write_all(b"\n")?;
                }
                Ok(())
            }
        }
    }
}

pub struct EngineRegistry {
    engines: Vec<Box<dyn Backend>>,
    index: HashMap<&'static str, usize>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            engines: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registry with every bundled backend.
    pub fn default_registry() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(StandaloneBackend));
        registry.register(Box::new(SpacyBackend));
        registry
    }

    pub fn register(&mut self, engine: Box<dyn Backend>) {
        let name = engine.name();
        let idx = self.engines.len();
        self.engines.push(engine);
        self.index.insert(name, idx);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Backend> {
        self.index
            .get(name)
            .map(|&idx| &*self.engines[idx])
            .ok_or_else(|| RitaError::UnknownEngine(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::default_registry()
    }
}
