//! Module discovery.
//!
//! Starting from an entry file, parses every transitively imported module
//! exactly once. Imports are followed depth-first in source order; a module
//! already present in the registry is not read again, which is what makes
//! cyclic import graphs terminate.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{AggregateError, Result};
use crate::module::Module;
use crate::options::RewriteMode;

/// Build-time registry: resolved module key -> parsed module.
///
/// Keys are `/`-separated paths relative to the scan root (`js/user.js`).
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRegistry {
    entry: String,
    modules: HashMap<String, Module>,
    /// Keys in dependency-first (post-)order.
    order: Vec<String>,
    /// Every specifier spelling that resolved to a key.
    aliases: HashMap<String, BTreeSet<String>>,
}

impl ModuleRegistry {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn get(&self, key: &str) -> Option<&Module> {
        self.modules.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.modules.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Keys ordered so that every module comes after the modules it imports,
    /// except where an import cycle makes that impossible.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Modules in [`order`](Self::order).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Module)> {
        self.order
            .iter()
            .filter_map(|key| self.modules.get(key).map(|m| (key.as_str(), m)))
    }

    pub fn aliases(&self, key: &str) -> impl Iterator<Item = &str> {
        self.aliases
            .get(key)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }
}

/// Lexically normalize `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

pub struct ModuleScanner {
    root: PathBuf,
    rewrite: RewriteMode,
}

impl ModuleScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_rewrite(root, RewriteMode::default())
    }

    pub fn with_rewrite(root: impl Into<PathBuf>, rewrite: RewriteMode) -> Self {
        ModuleScanner {
            root: normalize_path(&root.into()),
            rewrite,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the entry file and everything it reaches. A relative `entry` is
    /// taken relative to the scan root.
    pub fn scan(&self, entry: impl AsRef<Path>) -> Result<ModuleRegistry> {
        let entry_path = normalize_path(&self.root.join(entry.as_ref()));
        let mut registry = ModuleRegistry::default();
        registry.entry = self.visit(&entry_path, &mut registry)?;
        log::debug!(
            "scanned {} module(s) from {}",
            registry.len(),
            registry.entry
        );
        Ok(registry)
    }

    fn key_for(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
            // Outside the root: keep the full path.
            Err(_) => path.to_string_lossy().replace('\\', "/"),
        }
    }

    /// Resolve `specifier` as written in the module at `importer`.
    pub fn resolve(&self, importer: &Path, importer_key: &str, specifier: &str) -> Result<PathBuf> {
        let joined = match specifier.strip_prefix('/') {
            Some(rooted) => self.root.join(rooted),
            None => importer
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(specifier),
        };
        let resolved = normalize_path(&joined);
        if resolved.is_file() {
            return Ok(resolved);
        }
        if resolved.extension().is_none() {
            let with_js = resolved.with_extension("js");
            if with_js.is_file() {
                return Ok(with_js);
            }
        }
        Err(AggregateError::Resolution {
            importer: importer_key.to_string(),
            specifier: specifier.to_string(),
            resolved,
        })
    }

    fn visit(&self, path: &Path, registry: &mut ModuleRegistry) -> Result<String> {
        let key = self.key_for(path);
        if registry.modules.contains_key(&key) {
            log::trace!("already scanned {}", key);
            return Ok(key);
        }

        let source = fs::read_to_string(path).map_err(|source| AggregateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let module = Module::parse_with(&key, &source, self.rewrite)?;
        log::debug!(
            "parsed {} ({} import(s), {} function(s))",
            key,
            module.imports.len(),
            module.joined_funcs().len()
        );

        let specifiers: Vec<String> = module
            .import_specifiers()
            .into_iter()
            .map(String::from)
            .collect();
        // Registered before recursing so a cycle back to this module stops here.
        registry.modules.insert(key.clone(), module);

        for specifier in specifiers {
            let resolved = self.resolve(path, &key, &specifier)?;
            let child = self.visit(&resolved, registry)?;
            registry.aliases.entry(child).or_default().insert(specifier);
        }

        registry.order.push(key.clone());
        Ok(key)
    }
}
