use css_inject::plugin::{LoadArgs, ResolveArgs};
use css_inject::{
    FILE_NAMESPACE, INJECT_STYLE_ID, INJECT_STYLE_NAMESPACE, LoadResult, LoaderOptions,
    PluginBuild, StyleInjectPlugin,
};
use napi::bindgen_prelude::*;
use napi_derive::napi;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options for the CSS loader
#[napi(object)]
pub struct CssInjectOptions {
    /// Logical filename passed to lightningcss
    pub filename: Option<String>,

    /// Minify CSS (defaults to true)
    pub minify: Option<bool>,

    /// Generate source maps (defaults to true)
    pub source_map: Option<bool>,

    /// Export class names from `*.module.css` files (defaults to true)
    pub css_modules: Option<bool>,

    /// Extra lightningcss options, forwarded unchanged
    pub passthrough: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Result of resolving an import
#[napi(object)]
pub struct ResolvedModule {
    pub path: String,
    pub namespace: String,
}

/// Generated module for the host bundler
#[napi(object)]
pub struct LoadedModule {
    pub contents: String,

    /// Always "js"
    pub loader: String,
}

impl From<CssInjectOptions> for LoaderOptions {
    fn from(opts: CssInjectOptions) -> Self {
        let defaults = LoaderOptions::default();
        LoaderOptions {
            filename: opts.filename,
            minify: opts.minify.unwrap_or(defaults.minify),
            source_map: opts.source_map.unwrap_or(defaults.source_map),
            css_modules: opts.css_modules.unwrap_or(defaults.css_modules),
            passthrough: opts.passthrough.unwrap_or_default(),
        }
    }
}

impl From<LoadResult> for LoadedModule {
    fn from(result: LoadResult) -> Self {
        LoadedModule { contents: result.contents, loader: result.loader.as_str().to_string() }
    }
}

fn load_with(
    options: LoaderOptions,
    path: &Path,
    namespace: &str,
) -> Result<Option<LoadedModule>> {
    let plugin = StyleInjectPlugin::new(options);
    let mut build = PluginBuild::new();
    build
        .register(Arc::new(plugin))
        .map_err(|e| Error::from_reason(e.to_string()))?;

    let loaded = build
        .load(&LoadArgs { path, namespace })
        .map_err(|e| Error::from_reason(e.to_string()))?;
    Ok(loaded.map(LoadedModule::from))
}

/// Specifier of the virtual style-injection module
#[napi]
pub const INJECT_STYLE_SPECIFIER: &str = INJECT_STYLE_ID;

/// Namespace of the virtual style-injection module
#[napi]
pub const INJECT_STYLE_MODULE_NAMESPACE: &str = INJECT_STYLE_NAMESPACE;

/// Resolve an import handled by the loader
///
/// @param path - Import specifier
/// @returns The virtual module for `__inject_style__`, null otherwise
#[napi]
pub fn resolve_style_import(path: String) -> Option<ResolvedModule> {
    StyleInjectPlugin::<css_inject::LightningCss>::resolve_inject_style(&ResolveArgs {
        path: &path,
        importer: None,
    })
    .map(|resolved| ResolvedModule {
        path: resolved.path.to_string_lossy().to_string(),
        namespace: resolved.namespace,
    })
}

/// Load a CSS file or the virtual helper (async)
///
/// @param path - Absolute path of the module
/// @param namespace - Module namespace, defaults to "file"
/// @param options - Loader options
/// @returns Promise with the generated module, or null when the loader does not handle the path
#[napi]
pub async fn load_style_module(
    path: String,
    namespace: Option<String>,
    options: Option<CssInjectOptions>,
) -> Result<Option<LoadedModule>> {
    let options: LoaderOptions = options.map(Into::into).unwrap_or_default();
    let namespace = namespace.unwrap_or_else(|| FILE_NAMESPACE.to_string());
    let path = PathBuf::from(path);

    // Reading and transforming CSS is blocking work
    tokio::task::spawn_blocking(move || load_with(options, &path, &namespace))
        .await
        .map_err(|e| Error::from_reason(format!("Task panicked: {e}")))?
}

/// Load a CSS file or the virtual helper (sync)
///
/// @param path - Absolute path of the module
/// @param namespace - Module namespace, defaults to "file"
/// @param options - Loader options
/// @returns The generated module, or null when the loader does not handle the path
#[napi]
pub fn load_style_module_sync(
    path: String,
    namespace: Option<String>,
    options: Option<CssInjectOptions>,
) -> Result<Option<LoadedModule>> {
    let options: LoaderOptions = options.map(Into::into).unwrap_or_default();
    let namespace = namespace.as_deref().unwrap_or(FILE_NAMESPACE);
    load_with(options, Path::new(&path), namespace)
}

/// Read loader options from a `.json`/`.jsonc` file
///
/// @param path - Config file path
/// @returns Options object usable with `loadStyleModule`
#[napi]
pub fn load_options_file(path: String) -> Result<CssInjectOptions> {
    let options = LoaderOptions::from_file(Path::new(&path))
        .map_err(|e| Error::from_reason(e.to_string()))?;

    Ok(CssInjectOptions {
        filename: options.filename,
        minify: Some(options.minify),
        source_map: Some(options.source_map),
        css_modules: Some(options.css_modules),
        passthrough: Some(options.passthrough),
    })
}
