mod registry;
mod style_inject;

pub use registry::PluginBuild;
pub use style_inject::StyleInjectPlugin;

use crate::codegen::CodegenError;
use crate::engine::EngineError;
use crate::parser::ParseError;
use crate::types::FILE_NAMESPACE;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Error types for plugin setup
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Invalid filter: {0}")]
    Filter(#[from] regex::Error),
}

/// Error types for resolving and loading modules
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to generate module for {path}: {source}")]
    Codegen {
        path: PathBuf,
        #[source]
        source: CodegenError,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Could not resolve {specifier:?} from {importer}")]
    Resolve { specifier: String, importer: PathBuf },

    #[error("No loader matches {0}")]
    NoLoader(ModuleId),
}

/// A module as the pipeline knows it: a path inside a namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
    pub namespace: String,
    pub path: PathBuf,
}

impl ModuleId {
    pub fn new(namespace: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { namespace: namespace.into(), path: path.into() }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(FILE_NAMESPACE, path)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path.display())
    }
}

/// How the host should treat generated contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Json,
}

impl Loader {
    /// Loader for a file extension (without dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "mjs" | "cjs" => Some(Self::Js),
            "jsx" => Some(Self::Jsx),
            "ts" | "mts" | "cts" => Some(Self::Ts),
            "tsx" => Some(Self::Tsx),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Jsx => "jsx",
            Self::Ts => "ts",
            Self::Tsx => "tsx",
            Self::Json => "json",
        }
    }
}

/// Import about to be resolved
#[derive(Debug, Clone, Copy)]
pub struct ResolveArgs<'a> {
    /// Import specifier as written
    pub path: &'a str,
    /// Module containing the import, if any
    pub importer: Option<&'a Path>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    pub path: PathBuf,
    pub namespace: String,
}

impl From<ResolveResult> for ModuleId {
    fn from(result: ResolveResult) -> Self {
        ModuleId { namespace: result.namespace, path: result.path }
    }
}

/// Module about to be loaded
#[derive(Debug, Clone, Copy)]
pub struct LoadArgs<'a> {
    pub path: &'a Path,
    pub namespace: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub contents: String,
    pub loader: Loader,
}

pub type ResolveCallback = Box<dyn Fn(&ResolveArgs<'_>) -> Option<ResolveResult> + Send + Sync>;

pub type LoadCallback =
    Box<dyn Fn(&LoadArgs<'_>) -> Result<Option<LoadResult>, LoadError> + Send + Sync>;

/// Path pattern a resolve or load rule applies to
#[derive(Debug, Clone)]
pub struct Filter {
    include: Regex,
    exclude: Option<Regex>,
}

impl Filter {
    pub fn new(pattern: &str) -> Result<Self, PluginError> {
        Ok(Self { include: Regex::new(pattern)?, exclude: None })
    }

    /// Match one string exactly
    pub fn exact(value: &str) -> Result<Self, PluginError> {
        Self::new(&format!("^{}$", regex::escape(value)))
    }

    /// Additionally reject paths matching `pattern`
    pub fn excluding(mut self, pattern: &str) -> Result<Self, PluginError> {
        self.exclude = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.as_ref().is_some_and(|re| re.is_match(path))
    }
}

/// A plugin hooks into module resolution and loading
pub trait Plugin: Send + Sync {
    /// Plugin identifier (e.g., "css-inject")
    fn name(&self) -> &str;

    /// Register resolve and load rules
    fn setup(self: Arc<Self>, build: &mut PluginBuild) -> Result<(), PluginError>;
}
