use super::{
    Filter, LoadError, LoadResult, Loader, Plugin, PluginBuild, PluginError, ResolveArgs,
    ResolveResult,
};
use crate::codegen::{INJECT_STYLE_MODULE, css_modules_module, plain_css_module};
use crate::engine::{CssEngine, LightningCss, TransformOutput, TransformRequest};
use crate::naming::class_name_map;
use crate::types::{INJECT_STYLE_ID, INJECT_STYLE_NAMESPACE, LoaderOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

const CSS_PATTERN: &str = r"\.css$";
const MODULE_CSS_PATTERN: &str = r"\.module\.css$";

/// Plugin that turns CSS imports into JavaScript modules injecting a `<style>`
/// element, with class-name exports for `*.module.css` files.
///
/// Rules registered by [`Plugin::setup`], in order:
/// 1. `__inject_style__` resolves to the virtual `inject_style` namespace
/// 2. anything in `inject_style` loads the injection helper
/// 3. `*.module.css` loads as CSS Modules (only when `css_modules` is enabled)
/// 4. every other `*.css` loads as plain CSS
pub struct StyleInjectPlugin<E = LightningCss> {
    options: LoaderOptions,
    engine: E,
}

impl StyleInjectPlugin<LightningCss> {
    pub fn new(options: LoaderOptions) -> Self {
        Self::with_engine(options, LightningCss::new())
    }
}

impl Default for StyleInjectPlugin<LightningCss> {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}

impl<E: CssEngine> StyleInjectPlugin<E> {
    pub fn with_engine(options: LoaderOptions, engine: E) -> Self {
        Self { options, engine }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Resolve the virtual helper; exact match only, never touches the filesystem
    pub fn resolve_inject_style(args: &ResolveArgs<'_>) -> Option<ResolveResult> {
        (args.path == INJECT_STYLE_ID).then(|| ResolveResult {
            path: PathBuf::from(INJECT_STYLE_ID),
            namespace: INJECT_STYLE_NAMESPACE.to_string(),
        })
    }

    /// The virtual helper module; identical on every call
    pub fn load_inject_style() -> LoadResult {
        LoadResult { contents: INJECT_STYLE_MODULE.to_string(), loader: Loader::Js }
    }

    /// Load a `*.module.css` file: inject the CSS and default-export its class names
    pub fn load_css_module(&self, path: &Path) -> Result<LoadResult, LoadError> {
        let output = self.transform(path, true)?;
        let classes = output.exports.as_ref().map(class_name_map).unwrap_or_default();
        trace!(path = %path.display(), classes = classes.len(), "css modules exports");

        let contents = css_modules_module(&output.code, &classes)
            .map_err(|source| LoadError::Codegen { path: path.to_path_buf(), source })?;
        Ok(LoadResult { contents, loader: Loader::Js })
    }

    /// Load a plain `*.css` file: inject the CSS, export nothing
    pub fn load_plain_css(&self, path: &Path) -> Result<LoadResult, LoadError> {
        let output = self.transform(path, false)?;

        let contents = plain_css_module(&output.code)
            .map_err(|source| LoadError::Codegen { path: path.to_path_buf(), source })?;
        Ok(LoadResult { contents, loader: Loader::Js })
    }

    fn transform(&self, path: &Path, css_modules: bool) -> Result<TransformOutput, LoadError> {
        let code = std::fs::read(path)
            .map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?;
        let filename = path.to_string_lossy();

        debug!(engine = self.engine.name(), path = %filename, css_modules, "transform");

        let output = self.engine.transform(TransformRequest {
            filename: &filename,
            code: &code,
            minify: self.options.minify,
            source_map: self.options.source_map,
            css_modules,
            passthrough: &self.options.passthrough,
        })?;

        trace!(
            path = %filename,
            bytes_in = code.len(),
            bytes_out = output.code.len(),
            has_map = output.map.is_some(),
            "transformed"
        );
        Ok(output)
    }
}

impl<E: CssEngine + 'static> Plugin for StyleInjectPlugin<E> {
    fn name(&self) -> &str {
        "css-inject"
    }

    fn setup(self: Arc<Self>, build: &mut PluginBuild) -> Result<(), PluginError> {
        build.on_resolve(Filter::exact(INJECT_STYLE_ID)?, Self::resolve_inject_style);

        build.on_load(Filter::new(".*")?, Some(INJECT_STYLE_NAMESPACE), |_| {
            Ok(Some(Self::load_inject_style()))
        });

        let mut plain_filter = Filter::new(CSS_PATTERN)?;

        if self.options.css_modules {
            let plugin = Arc::clone(&self);
            build.on_load(Filter::new(MODULE_CSS_PATTERN)?, None, move |args| {
                plugin.load_css_module(args.path).map(Some)
            });
            plain_filter = plain_filter.excluding(MODULE_CSS_PATTERN)?;
        }

        build.on_load(plain_filter, None, move |args| self.load_plain_css(args.path).map(Some));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, ModuleExport, ModuleExports};
    use crate::parser::analyze_module;
    use crate::plugin::LoadArgs;
    use crate::types::FILE_NAMESPACE;
    use serde_json::{Map, Value, json};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};

    #[derive(Debug, Clone)]
    struct Recorded {
        filename: String,
        css_modules: bool,
        minify: bool,
        source_map: bool,
        passthrough: Map<String, Value>,
    }

    /// Echoes the CSS back and scopes every listed class as `<name>_x1y2`
    #[derive(Default)]
    struct FakeEngine {
        classes: Vec<&'static str>,
        fail: bool,
        no_exports: bool,
        requests: Mutex<Vec<Recorded>>,
    }

    impl FakeEngine {
        fn with_classes(classes: &[&'static str]) -> Self {
            Self { classes: classes.to_vec(), ..Self::default() }
        }

        fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl CssEngine for FakeEngine {
        fn name(&self) -> &str {
            "fake"
        }

        fn transform(&self, request: TransformRequest<'_>) -> Result<TransformOutput, EngineError> {
            self.requests.lock().unwrap().push(Recorded {
                filename: request.filename.to_string(),
                css_modules: request.css_modules,
                minify: request.minify,
                source_map: request.source_map,
                passthrough: request.passthrough.clone(),
            });

            if self.fail {
                return Err(EngineError::Parse("Unexpected token CurlyBracketBlock".into()));
            }

            let exports = (request.css_modules && !self.no_exports).then(|| {
                self.classes
                    .iter()
                    .map(|class| {
                        (class.to_string(), ModuleExport { name: format!("{class}_x1y2") })
                    })
                    .collect::<ModuleExports>()
            });

            Ok(TransformOutput {
                code: std::str::from_utf8(request.code)?.to_string(),
                map: None,
                exports,
            })
        }
    }

    struct Fixture {
        dir: TempDir,
        plugin: Arc<StyleInjectPlugin<FakeEngine>>,
        build: PluginBuild,
    }

    impl Fixture {
        fn new(options: LoaderOptions, engine: FakeEngine) -> Self {
            let plugin = Arc::new(StyleInjectPlugin::with_engine(options, engine));
            let mut build = PluginBuild::new();
            build.register(plugin.clone()).unwrap();
            Self { dir: tempdir().unwrap(), plugin, build }
        }

        fn write(&self, name: &str, css: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, css).unwrap();
            path
        }

        fn load(&self, path: &Path) -> Result<Option<LoadResult>, LoadError> {
            self.build.load(&LoadArgs { path, namespace: FILE_NAMESPACE })
        }
    }

    #[test]
    fn test_resolves_sentinel_regardless_of_options() {
        for css_modules in [true, false] {
            let fixture = Fixture::new(
                LoaderOptions::default().with_css_modules(css_modules).with_minify(false),
                FakeEngine::default(),
            );
            let resolved = fixture
                .build
                .resolve(&ResolveArgs {
                    path: INJECT_STYLE_ID,
                    importer: Some(Path::new("/src/app.css")),
                })
                .unwrap();

            assert_eq!(resolved.path, PathBuf::from(INJECT_STYLE_ID));
            assert_eq!(resolved.namespace, INJECT_STYLE_NAMESPACE);
        }
    }

    #[test]
    fn test_sentinel_match_is_exact() {
        let fixture = Fixture::new(LoaderOptions::default(), FakeEngine::default());
        for specifier in ["./__inject_style__", "__inject_style__/x", "__inject_style", "inject_style"] {
            assert!(
                fixture.build.resolve(&ResolveArgs { path: specifier, importer: None }).is_none(),
                "{specifier} should not resolve"
            );
        }
    }

    #[test]
    fn test_virtual_module_is_constant() {
        let fixture = Fixture::new(LoaderOptions::default(), FakeEngine::default());

        let first = fixture
            .build
            .load(&LoadArgs { path: Path::new(INJECT_STYLE_ID), namespace: INJECT_STYLE_NAMESPACE })
            .unwrap()
            .unwrap();
        let second = fixture
            .build
            .load(&LoadArgs { path: Path::new("anything/at/all"), namespace: INJECT_STYLE_NAMESPACE })
            .unwrap()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.contents, INJECT_STYLE_MODULE);
        assert_eq!(first.loader, Loader::Js);
        assert!(fixture.plugin.engine().requests().is_empty());
    }

    #[test]
    fn test_plain_css() {
        let fixture = Fixture::new(LoaderOptions::default(), FakeEngine::default());
        let path = fixture.write("app.css", "body { color: red; }");

        let loaded = fixture.load(&path).unwrap().unwrap();
        let analysis = analyze_module(&loaded.contents).unwrap();

        assert_eq!(loaded.loader, Loader::Js);
        assert_eq!(analysis.imports[0].source, INJECT_STYLE_ID);
        assert_eq!(analysis.calls[0].argument, "body { color: red; }");
        assert!(analysis.default_export.is_none());

        let requests = fixture.plugin.engine().requests();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].css_modules);
        assert_eq!(requests[0].filename, path.to_string_lossy());
    }

    #[test]
    fn test_css_module_exports_camel_case() {
        let fixture = Fixture::new(
            LoaderOptions::default(),
            FakeEngine::with_classes(&["foo-bar", "title"]),
        );
        let path = fixture.write("button.module.css", ".foo-bar { color: red; }");

        let loaded = fixture.load(&path).unwrap().unwrap();
        let exports = analyze_module(&loaded.contents).unwrap().default_export.unwrap();

        assert_eq!(exports["fooBar"], "foo-bar_x1y2");
        assert_eq!(exports["title"], "title_x1y2");
        assert!(fixture.plugin.engine().requests()[0].css_modules);
    }

    #[test]
    fn test_css_module_without_engine_exports() {
        let engine = FakeEngine { no_exports: true, ..FakeEngine::default() };
        let fixture = Fixture::new(LoaderOptions::default(), engine);
        let path = fixture.write("empty.module.css", ".a {}");

        let loaded = fixture.load(&path).unwrap().unwrap();
        let exports = analyze_module(&loaded.contents).unwrap().default_export;

        assert_eq!(exports, Some(Default::default()));
    }

    #[test]
    fn test_css_modules_disabled_treats_module_files_as_plain() {
        let css = ".foo-bar { color: red; }";

        let disabled = Fixture::new(
            LoaderOptions::default().with_css_modules(false),
            FakeEngine::with_classes(&["foo-bar"]),
        );
        let module_path = disabled.write("button.module.css", css);
        let plain_path = disabled.write("button.css", css);

        let as_module = disabled.load(&module_path).unwrap().unwrap();
        let as_plain = disabled.load(&plain_path).unwrap().unwrap();

        assert_eq!(as_module, as_plain);
        assert!(analyze_module(&as_module.contents).unwrap().default_export.is_none());
        assert!(disabled.plugin.engine().requests().iter().all(|r| !r.css_modules));
    }

    #[test]
    fn test_options_forwarded_to_engine() {
        let options = LoaderOptions::default()
            .with_minify(false)
            .with_source_map(false)
            .with_filename("ignored.css")
            .with_passthrough("targets", json!(["chrome >= 90"]));
        let fixture = Fixture::new(options, FakeEngine::default());
        let path = fixture.write("app.css", "a{}");

        fixture.load(&path).unwrap();

        let request = &fixture.plugin.engine().requests()[0];
        assert!(!request.minify);
        assert!(!request.source_map);
        assert_eq!(request.filename, path.to_string_lossy());
        assert_eq!(request.passthrough.get("targets"), Some(&json!(["chrome >= 90"])));
    }

    #[test]
    fn test_non_css_paths_are_not_claimed() {
        let fixture = Fixture::new(LoaderOptions::default(), FakeEngine::default());
        let path = fixture.write("app.scss", "a{}");

        assert!(fixture.load(&path).unwrap().is_none());
        assert!(fixture.plugin.engine().requests().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let fixture = Fixture::new(LoaderOptions::default(), FakeEngine::default());
        let path = fixture.dir.path().join("missing.module.css");

        let err = fixture.load(&path).unwrap_err();
        match err {
            LoadError::Read { path: reported, source } => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(fixture.plugin.engine().requests().is_empty());
    }

    #[test]
    fn test_engine_error_propagates_unchanged() {
        let engine = FakeEngine { fail: true, ..FakeEngine::default() };
        let fixture = Fixture::new(LoaderOptions::default(), engine);
        let path = fixture.write("broken.css", "a { color: red; } }");

        let err = fixture.load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Engine(EngineError::Parse(_))));
        assert_eq!(err.to_string(), "Failed to parse CSS: Unexpected token CurlyBracketBlock");
        assert_eq!(fixture.plugin.engine().requests().len(), 1);
    }
}
