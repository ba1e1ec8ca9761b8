use super::{CssEngine, EngineError, ModuleExport, TransformOutput, TransformRequest};
use lightningcss::bundler::{Bundler, FileProvider, ResolveResult, SourceProvider};
use lightningcss::css_modules::{Config, Pattern};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Passthrough options understood by lightningcss. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LightningOptions {
    /// Browserslist queries used for prefixing and lowering
    targets: Vec<String>,
    error_recovery: bool,
    project_root: Option<String>,
    /// CSS Modules naming pattern, e.g. `[hash]_[local]`
    pattern: Option<String>,
    dashed_idents: bool,
}

impl LightningOptions {
    fn from_passthrough(passthrough: &Map<String, Value>) -> Result<Self, EngineError> {
        if passthrough.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_value(Value::Object(passthrough.clone()))
            .map_err(|e| EngineError::Options(e.to_string()))
    }

    fn targets(&self) -> Result<Targets, EngineError> {
        if self.targets.is_empty() {
            return Ok(Targets::default());
        }
        let browsers = Browsers::from_browserslist(&self.targets)
            .map_err(|e| EngineError::Options(format!("invalid targets: {e}")))?;
        Ok(Targets { browsers, ..Targets::default() })
    }
}

/// Serves the entry stylesheet from memory and every `@import`ed file from disk
struct EntryProvider<'a> {
    entry: &'a Path,
    code: &'a str,
    files: FileProvider,
}

impl SourceProvider for EntryProvider<'_> {
    type Error = std::io::Error;

    fn read<'a>(&'a self, file: &Path) -> Result<&'a str, Self::Error> {
        if file == self.entry {
            return Ok(self.code);
        }
        self.files.read(file)
    }

    fn resolve(&self, specifier: &str, originating_file: &Path) -> Result<ResolveResult, Self::Error> {
        self.files.resolve(specifier, originating_file)
    }
}

/// CSS engine backed by lightningcss
#[derive(Debug, Clone, Copy, Default)]
pub struct LightningCss;

impl LightningCss {
    pub fn new() -> Self {
        Self
    }
}

impl CssEngine for LightningCss {
    fn name(&self) -> &str {
        "lightningcss"
    }

    fn transform(&self, request: TransformRequest<'_>) -> Result<TransformOutput, EngineError> {
        let options = LightningOptions::from_passthrough(request.passthrough)?;
        let code = std::str::from_utf8(request.code)?;
        let targets = options.targets()?;

        debug!(
            filename = request.filename,
            css_modules = request.css_modules,
            minify = request.minify,
            "lightningcss transform"
        );

        let css_modules = if request.css_modules {
            let pattern = match options.pattern.as_deref() {
                Some(pattern) => Pattern::parse(pattern).map_err(|e| {
                    EngineError::Options(format!("invalid CSS Modules pattern {pattern:?}: {e}"))
                })?,
                None => Pattern::default(),
            };
            Some(Config { pattern, dashed_idents: options.dashed_idents, ..Config::default() })
        } else {
            None
        };

        // `@import` rules are inlined; imported sources land in the source map too
        let entry = Path::new(request.filename);
        let provider = EntryProvider { entry, code, files: FileProvider::new() };

        let parser_options = ParserOptions {
            filename: request.filename.to_string(),
            css_modules,
            error_recovery: options.error_recovery,
            ..ParserOptions::default()
        };

        let mut source_map = request
            .source_map
            .then(|| SourceMap::new(options.project_root.as_deref().unwrap_or("/")));

        let mut stylesheet = {
            let mut bundler = Bundler::new(&provider, source_map.as_mut(), parser_options);
            bundler.bundle(entry).map_err(|e| EngineError::Parse(e.to_string()))?
        };

        if request.minify {
            stylesheet
                .minify(MinifyOptions { targets: targets.clone(), ..MinifyOptions::default() })
                .map_err(|e| EngineError::Minify(e.to_string()))?;
        }

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: request.minify,
                source_map: source_map.as_mut(),
                project_root: options.project_root.as_deref(),
                targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| EngineError::Print(e.to_string()))?;

        let map = match source_map.as_mut() {
            Some(map) => {
                Some(map.to_json(None).map_err(|e| EngineError::SourceMap(format!("{e:?}")))?)
            }
            None => None,
        };

        let exports = result.exports.map(|exports| {
            exports
                .into_iter()
                .map(|(original, export)| (original, ModuleExport { name: export.name }))
                .collect()
        });

        Ok(TransformOutput { code: result.code, map, exports })
    }
}
