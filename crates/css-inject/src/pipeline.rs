use crate::parser::extract_imports;
use crate::plugin::{
    LoadArgs, LoadError, LoadResult, Loader, ModuleId, Plugin, PluginBuild, PluginError,
    ResolveArgs,
};
use crate::resolver::ModuleResolver;
use crate::types::FILE_NAMESPACE;
use dashmap::DashSet;
use oxc_span::SourceType;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A module after loading, with its imports already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub id: ModuleId,
    pub contents: String,
    pub loader: Loader,
    /// Resolved imports, in source order
    pub imports: Vec<ModuleId>,
    /// Bare specifiers nothing could resolve (packages left to the runtime)
    pub externals: Vec<String>,
}

/// Every module reachable from the entries, each loaded exactly once
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Sorted by module id
    pub modules: Vec<LoadedModule>,
}

impl BuildOutput {
    pub fn get(&self, id: &ModuleId) -> Option<&LoadedModule> {
        self.modules.binary_search_by(|m| m.id.cmp(id)).ok().map(|i| &self.modules[i])
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Minimal host: plugin rules first, then filesystem resolution and
/// verbatim loading of JS/TS sources
pub struct Pipeline {
    build: PluginBuild,
    resolver: ModuleResolver,
}

impl Pipeline {
    pub fn new(cwd: &Path) -> Self {
        Self { build: PluginBuild::new(), resolver: ModuleResolver::new(cwd) }
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Result<Self, PluginError> {
        self.build.register(plugin)?;
        Ok(self)
    }

    pub fn plugins(&self) -> &PluginBuild {
        &self.build
    }

    /// Resolve an import specifier
    pub fn resolve(&self, specifier: &str, importer: Option<&Path>) -> Result<ModuleId, LoadError> {
        if let Some(resolved) = self.build.resolve(&ResolveArgs { path: specifier, importer }) {
            return Ok(resolved.into());
        }

        let resolved = match importer {
            Some(importer) => self.resolver.resolve(importer, specifier),
            None => Path::new(specifier).canonicalize().ok(),
        };

        match resolved {
            Some(path) => Ok(ModuleId::file(path)),
            None => {
                warn!(specifier, importer = ?importer, "unresolved import");
                Err(LoadError::Resolve {
                    specifier: specifier.to_string(),
                    importer: importer.map(Path::to_path_buf).unwrap_or_default(),
                })
            }
        }
    }

    /// Load a module's contents
    pub fn load(&self, id: &ModuleId) -> Result<LoadResult, LoadError> {
        let args = LoadArgs { path: &id.path, namespace: &id.namespace };
        if let Some(result) = self.build.load(&args)? {
            return Ok(result);
        }

        let loader = (id.namespace == FILE_NAMESPACE)
            .then(|| id.path.extension().and_then(|ext| ext.to_str()).and_then(Loader::from_extension))
            .flatten()
            .ok_or_else(|| LoadError::NoLoader(id.clone()))?;

        let contents = std::fs::read_to_string(&id.path)
            .map_err(|source| LoadError::Read { path: id.path.clone(), source })?;
        Ok(LoadResult { contents, loader })
    }

    /// Load every module reachable from `entries`, in parallel waves.
    /// The first error aborts the build.
    pub fn build(&self, entries: &[PathBuf]) -> Result<BuildOutput, LoadError> {
        let visited: DashSet<ModuleId> = DashSet::new();
        let mut modules = Vec::new();

        let mut wave = entries
            .iter()
            .map(|entry| {
                entry
                    .canonicalize()
                    .map(ModuleId::file)
                    .map_err(|source| LoadError::Read { path: entry.clone(), source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        while !wave.is_empty() {
            debug!(modules = wave.len(), "loading wave");

            let loaded = wave
                .par_iter()
                .filter(|id| visited.insert((*id).clone()))
                .map(|id| self.load_module(id))
                .collect::<Result<Vec<_>, _>>()?;

            let mut next = FxHashSet::default();
            for module in &loaded {
                for import in &module.imports {
                    if !visited.contains(import) {
                        next.insert(import.clone());
                    }
                }
            }

            modules.extend(loaded);
            wave = next.into_iter().collect();
        }

        modules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(BuildOutput { modules })
    }

    fn load_module(&self, id: &ModuleId) -> Result<LoadedModule, LoadError> {
        let LoadResult { contents, loader } = self.load(id)?;

        let source_type = match loader {
            Loader::Js => SourceType::mjs(),
            Loader::Jsx => SourceType::jsx(),
            Loader::Ts => SourceType::ts(),
            Loader::Tsx => SourceType::tsx(),
            Loader::Json => {
                return Ok(LoadedModule {
                    id: id.clone(),
                    contents,
                    loader,
                    imports: Vec::new(),
                    externals: Vec::new(),
                });
            }
        };

        let mut imports = Vec::new();
        let mut externals = Vec::new();

        for import in extract_imports(&contents, source_type, &id.to_string())? {
            match self.resolve(&import.source, Some(&id.path)) {
                Ok(resolved) => imports.push(resolved),
                Err(_) if is_bare_specifier(&import.source) => externals.push(import.source),
                Err(e) => return Err(e),
            }
        }

        Ok(LoadedModule { id: id.clone(), contents, loader, imports, externals })
    }
}

fn is_bare_specifier(specifier: &str) -> bool {
    !(specifier.starts_with('.') || specifier.starts_with('/') || Path::new(specifier).is_absolute())
}
