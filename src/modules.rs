//! Checking `import`/`include` declarations against the modules that exist.
//!
//! The parser records imports as plain data. A [`ModuleResolver`] answers
//! whether a named module can be found; loading and merging modules is left
//! to whatever consumes the tree.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    ast::statements::{Declaration, ModuleName, ModuleSpec, Script, Statement},
    errors::errors::{Error, ErrorImpl},
};

pub trait ModuleResolver {
    /// Source text of `name`, or `None` if no such module is known.
    fn module_source(&self, name: &ModuleName) -> Option<String>;
}

/// Modules held in memory, keyed by the name or path used to import them.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    modules: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.modules.insert(name.into(), source.into());
    }

    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }
}

impl ModuleResolver for MapResolver {
    fn module_source(&self, name: &ModuleName) -> Option<String> {
        self.modules.get(name.as_str()).cloned()
    }
}

/// Looks modules up on disk. `import foo` searches each directory for
/// `foo.q`; `import "lib/foo.q"` is tried as given and then relative to
/// each directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResolver {
    search_paths: Vec<PathBuf>,
}

impl DirectoryResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        DirectoryResolver { search_paths }
    }

    fn candidates(&self, name: &ModuleName) -> Vec<PathBuf> {
        match name {
            ModuleName::Identifier(ident) => self
                .search_paths
                .iter()
                .map(|dir| dir.join(format!("{}.q", ident)))
                .collect(),
            ModuleName::Path(path) => {
                let path = Path::new(path);
                let mut candidates = vec![path.to_path_buf()];
                if path.is_relative() {
                    candidates.extend(self.search_paths.iter().map(|dir| dir.join(path)));
                }
                candidates
            }
        }
    }
}

impl ModuleResolver for DirectoryResolver {
    fn module_source(&self, name: &ModuleName) -> Option<String> {
        self.candidates(name)
            .into_iter()
            .find_map(|path| fs::read_to_string(path).ok())
    }
}

fn imported_modules(script: &Script) -> Vec<&ModuleSpec> {
    script
        .iter()
        .flat_map(|stmt| match stmt {
            Statement::Declaration(Declaration::Import { specs, .. }) => specs.iter().collect(),
            Statement::Declaration(Declaration::QualifiedImport { module, .. }) => vec![module],
            _ => vec![],
        })
        .collect()
}

/// One `UnknownModule` diagnostic per import the resolver cannot find.
pub fn check_imports(script: &Script, resolver: &dyn ModuleResolver) -> Vec<Error> {
    let mut errors = vec![];

    for spec in imported_modules(script) {
        if resolver.module_source(&spec.module).is_none() {
            debug!(module = spec.module.as_str(), "module not found");
            errors.push(Error::new(
                ErrorImpl::UnknownModule {
                    module: spec.module.as_str().to_string(),
                },
                spec.span.clone(),
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_source;

    #[test]
    fn test_map_resolver_finds_known_modules() {
        let unit = parse_source("import list, \"util.q\";\nfrom dict import (++);\n", None).unwrap();
        let resolver = MapResolver::new()
            .with("list", "")
            .with("util.q", "")
            .with("dict", "");

        assert!(check_imports(&unit.script, &resolver).is_empty());
    }

    #[test]
    fn test_unknown_modules_are_reported() {
        let unit = parse_source("import list, missing;\ninclude gone;\n", None).unwrap();
        let resolver = MapResolver::new().with("list", "");

        let errors = check_imports(&unit.script, &resolver);
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0].get_error_impl(),
            ErrorImpl::UnknownModule { module } if module == "missing"
        ));
        assert_eq!(errors[1].get_error_name(), "UnknownModule");
    }

    #[test]
    fn test_directory_resolver_without_paths() {
        let resolver = DirectoryResolver::new(vec![]);
        assert!(resolver
            .module_source(&ModuleName::Identifier(String::from("nothing_here")))
            .is_none());
    }
}
