use oxc_resolver::{ResolveOptions, Resolver, TsconfigOptions, TsconfigReferences};
use std::path::{Path, PathBuf};

/// Extensions tried when an import omits one
pub const RESOLVE_EXTENSIONS: &[&str] =
    &[".js", ".mjs", ".cjs", ".jsx", ".ts", ".mts", ".cts", ".tsx", ".json", ".css"];

/// Filesystem resolution for imports no plugin claimed
pub struct ModuleResolver {
    resolver: Resolver,
}

impl ModuleResolver {
    pub fn new(cwd: &Path) -> Self {
        let tsconfig_path = cwd.join("tsconfig.json");
        let tsconfig = tsconfig_path.exists().then(|| TsconfigOptions {
            config_file: tsconfig_path,
            references: TsconfigReferences::Auto,
        });

        let options = ResolveOptions {
            tsconfig,
            extensions: RESOLVE_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            extension_alias: vec![
                (".js".into(), vec![".js".into(), ".ts".into(), ".tsx".into()]),
                (".jsx".into(), vec![".jsx".into(), ".tsx".into()]),
            ],
            condition_names: vec![
                "style".into(),
                "import".into(),
                "browser".into(),
                "default".into(),
            ],
            main_fields: vec!["style".into(), "module".into(), "browser".into(), "main".into()],
            ..Default::default()
        };

        Self { resolver: Resolver::new(options) }
    }

    /// Resolve `specifier` as imported from the file `from`
    pub fn resolve(&self, from: &Path, specifier: &str) -> Option<PathBuf> {
        let dir = from.parent()?;

        let resolution = self.resolver.resolve(dir, specifier).ok()?;
        resolution.into_path_buf().canonicalize().ok()
    }
}
