pub mod codegen;
pub mod engine;
pub mod naming;
pub mod parser;
pub mod pipeline;
pub mod plugin;
pub mod resolver;
pub mod runtime;
pub mod types;

use std::sync::Arc;

pub use engine::{CssEngine, EngineError, LightningCss};
pub use pipeline::{BuildOutput, LoadedModule, Pipeline};
pub use plugin::{
    LoadError, LoadResult, Loader, ModuleId, Plugin, PluginBuild, PluginError, StyleInjectPlugin,
};
pub use types::{
    ConfigError, FILE_NAMESPACE, INJECT_STYLE_ID, INJECT_STYLE_NAMESPACE, LoaderOptions,
};

/// Create the CSS loader plugin backed by lightningcss
///
/// # Arguments
/// * `options` - Loader options; unspecified fields default to
///   `minify`, `sourceMap` and `cssModules` all enabled
///
/// # Example
/// ```no_run
/// use css_inject::{LoaderOptions, ModuleId, Pipeline, css_inject};
/// use std::path::Path;
///
/// let pipeline = Pipeline::new(Path::new("."))
///     .with_plugin(css_inject(LoaderOptions::default()))
///     .unwrap();
///
/// let module = pipeline.load(&ModuleId::file("src/button.module.css")).unwrap();
/// println!("{}", module.contents);
/// ```
pub fn css_inject(options: LoaderOptions) -> Arc<StyleInjectPlugin> {
    Arc::new(StyleInjectPlugin::new(options))
}
