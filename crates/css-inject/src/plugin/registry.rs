use super::{
    Filter, LoadArgs, LoadCallback, LoadError, LoadResult, Plugin, PluginError, ResolveArgs,
    ResolveCallback, ResolveResult,
};
use crate::types::FILE_NAMESPACE;
use std::sync::Arc;
use tracing::debug;

struct ResolveRule {
    plugin: String,
    filter: Filter,
    callback: ResolveCallback,
}

struct LoadRule {
    plugin: String,
    filter: Filter,
    namespace: String,
    callback: LoadCallback,
}

/// Resolve and load rules registered by plugins, in registration order
pub struct PluginBuild {
    plugins: Vec<String>,
    resolvers: Vec<ResolveRule>,
    loaders: Vec<LoadRule>,
}

impl PluginBuild {
    /// Create a new empty build
    pub fn new() -> Self {
        Self { plugins: Vec::new(), resolvers: Vec::new(), loaders: Vec::new() }
    }

    /// Run a plugin's setup, recording the rules it registers
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), PluginError> {
        self.plugins.push(plugin.name().to_string());
        plugin.setup(self)
    }

    /// Add a resolve rule for import specifiers matching `filter`
    pub fn on_resolve<F>(&mut self, filter: Filter, callback: F)
    where
        F: Fn(&ResolveArgs<'_>) -> Option<ResolveResult> + Send + Sync + 'static,
    {
        self.resolvers.push(ResolveRule {
            plugin: self.current_plugin(),
            filter,
            callback: Box::new(callback),
        });
    }

    /// Add a load rule for paths matching `filter` inside `namespace`
    /// (the file namespace when `None`)
    pub fn on_load<F>(&mut self, filter: Filter, namespace: Option<&str>, callback: F)
    where
        F: Fn(&LoadArgs<'_>) -> Result<Option<LoadResult>, LoadError> + Send + Sync + 'static,
    {
        self.loaders.push(LoadRule {
            plugin: self.current_plugin(),
            filter,
            namespace: namespace.unwrap_or(FILE_NAMESPACE).to_string(),
            callback: Box::new(callback),
        });
    }

    /// First resolve rule that matches and returns a result wins
    pub fn resolve(&self, args: &ResolveArgs<'_>) -> Option<ResolveResult> {
        self.resolvers.iter().filter(|rule| rule.filter.is_match(args.path)).find_map(|rule| {
            let result = (rule.callback)(args);
            if let Some(resolved) = &result {
                debug!(
                    plugin = %rule.plugin,
                    specifier = args.path,
                    namespace = %resolved.namespace,
                    "resolved"
                );
            }
            result
        })
    }

    /// First load rule in the module's namespace that matches and returns contents wins.
    /// Errors stop the search and are returned as-is.
    pub fn load(&self, args: &LoadArgs<'_>) -> Result<Option<LoadResult>, LoadError> {
        let path = args.path.to_string_lossy();

        for rule in &self.loaders {
            if rule.namespace != args.namespace || !rule.filter.is_match(&path) {
                continue;
            }

            debug!(plugin = %rule.plugin, path = %path, namespace = args.namespace, "load");
            if let Some(result) = (rule.callback)(args)? {
                return Ok(Some(result));
            }
        }

        Ok(None)
    }

    /// Get names of all registered plugins
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(String::as_str).collect()
    }

    fn current_plugin(&self) -> String {
        self.plugins.last().cloned().unwrap_or_default()
    }
}

impl Default for PluginBuild {
    fn default() -> Self {
        Self::new()
    }
}
