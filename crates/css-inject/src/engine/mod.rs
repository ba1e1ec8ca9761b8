mod lightning;

pub use lightning::LightningCss;

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error types reported by a CSS engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("CSS input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Invalid engine options: {0}")]
    Options(String),

    #[error("Failed to parse CSS: {0}")]
    Parse(String),

    #[error("Failed to minify CSS: {0}")]
    Minify(String),

    #[error("Failed to print CSS: {0}")]
    Print(String),

    #[error("Source map error: {0}")]
    SourceMap(String),
}

/// A single CSS Modules export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleExport {
    /// Scoped class name generated by the engine
    pub name: String,
}

/// Original class name -> export
pub type ModuleExports = FxHashMap<String, ModuleExport>;

/// Everything the engine needs to transform one stylesheet
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
    pub filename: &'a str,
    pub code: &'a [u8],
    pub minify: bool,
    pub source_map: bool,
    pub css_modules: bool,
    /// Engine-specific options, untouched by the loader
    pub passthrough: &'a Map<String, Value>,
}

/// Result of transforming one stylesheet
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    /// Transformed CSS text
    pub code: String,
    /// Source map as JSON, when requested
    pub map: Option<String>,
    /// Class-name mapping, only present in CSS Modules mode
    pub exports: Option<ModuleExports>,
}

/// A CSS engine parses, transforms and prints stylesheets.
///
/// The loader treats it as opaque: bytes and options go in, CSS text and
/// optional CSS Modules exports come out. Errors are surfaced unchanged.
pub trait CssEngine: Send + Sync {
    /// Engine identifier (e.g., "lightningcss")
    fn name(&self) -> &str;

    /// Transform a single stylesheet
    fn transform(&self, request: TransformRequest<'_>) -> Result<TransformOutput, EngineError>;
}
