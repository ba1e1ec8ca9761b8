use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Import specifier of the virtual style-injection module
pub const INJECT_STYLE_ID: &str = "__inject_style__";

/// Namespace the virtual style-injection module lives in
pub const INJECT_STYLE_NAMESPACE: &str = "inject_style";

/// Namespace of modules backed by real files
pub const FILE_NAMESPACE: &str = "file";

/// Options for the CSS loader, fixed for the lifetime of the plugin
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderOptions {
    /// Logical filename handed to the CSS engine.
    /// Every load overrides it with the absolute path of the file being loaded.
    pub filename: Option<String>,

    /// Minify the transformed CSS
    pub minify: bool,

    /// Ask the CSS engine for a source map
    pub source_map: bool,

    /// Generate class-name exports for `*.module.css` files
    pub css_modules: bool,

    /// Engine-specific options, forwarded unchanged
    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            filename: None,
            minify: true,
            source_map: true,
            css_modules: true,
            passthrough: Map::new(),
        }
    }
}

impl LoaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_minify(mut self, enabled: bool) -> Self {
        self.minify = enabled;
        self
    }

    pub fn with_source_map(mut self, enabled: bool) -> Self {
        self.source_map = enabled;
        self
    }

    pub fn with_css_modules(mut self, enabled: bool) -> Self {
        self.css_modules = enabled;
        self
    }

    /// Add an engine-specific option
    pub fn with_passthrough(mut self, key: impl Into<String>, value: Value) -> Self {
        self.passthrough.insert(key.into(), value);
        self
    }

    /// Parse options from JSON, allowing comments (jsonc)
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let mut content = content.to_string();
        json_strip_comments::strip(&mut content)
            .map_err(|e| ConfigError::StripComments(e.to_string()))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load options from a `.json` or `.jsonc` file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&content)
    }
}

/// Error types for loading options
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to strip comments: {0}")]
    StripComments(String),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let options = LoaderOptions::default();
        assert!(options.minify);
        assert!(options.source_map);
        assert!(options.css_modules);
        assert!(options.filename.is_none());
        assert!(options.passthrough.is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = LoaderOptions::from_json_str(r#"{ "minify": false }"#).unwrap();
        assert!(!options.minify);
        assert!(options.source_map);
        assert!(options.css_modules);
    }

    #[test]
    fn test_unknown_keys_are_passed_through() {
        let options = LoaderOptions::from_json_str(
            r#"{
                "cssModules": false,
                "targets": ["chrome >= 90"],
                "errorRecovery": true
            }"#,
        )
        .unwrap();

        assert!(!options.css_modules);
        assert_eq!(options.passthrough.get("targets"), Some(&json!(["chrome >= 90"])));
        assert_eq!(options.passthrough.get("errorRecovery"), Some(&json!(true)));
        assert!(!options.passthrough.contains_key("cssModules"));
    }

    #[test]
    fn test_jsonc_comments() {
        let options = LoaderOptions::from_json_str(
            r#"{
                // keep output readable
                "minify": false,
                /* no maps */ "sourceMap": false
            }"#,
        )
        .unwrap();
        assert!(!options.minify);
        assert!(!options.source_map);
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("css-inject.jsonc");
        fs::write(&path, r#"{ "filename": "app.css", "sourceMap": false }"#).unwrap();

        let options = LoaderOptions::from_file(&path).unwrap();
        assert_eq!(options.filename.as_deref(), Some("app.css"));
        assert!(!options.source_map);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempdir().unwrap();
        let err = LoaderOptions::from_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let err = LoaderOptions::from_json_str("{ minify: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_builder() {
        let options = LoaderOptions::new()
            .with_minify(false)
            .with_css_modules(false)
            .with_filename("theme.css")
            .with_passthrough("dashedIdents", json!(true));

        assert!(!options.minify);
        assert!(!options.css_modules);
        assert_eq!(options.filename.as_deref(), Some("theme.css"));
        assert_eq!(options.passthrough.get("dashedIdents"), Some(&json!(true)));
    }
}
