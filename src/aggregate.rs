//! Aggregation of a module tree into one script.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::emit::{emit_entry_invocation, emit_registration};
use crate::error::{AggregateError, Result};
use crate::options::AggregateOptions;
use crate::scanner::{ModuleRegistry, ModuleScanner};

/// Runtime registry bootstrap, copied verbatim to the head of every bundle.
pub const MODULE_REGISTRY_JS: &str = include_str!("runtime/module.registry.js");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Javascript,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Javascript => "javascript",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ContentType::Javascript => "text/javascript",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "javascript" | "js" => Some(ContentType::Javascript),
            _ => None,
        }
    }

    /// The aggregater that produces this content type.
    pub fn aggregater(self, options: AggregateOptions) -> Box<dyn Aggregater> {
        match self {
            ContentType::Javascript => Box::new(JsCompileAggregater::new(options)),
        }
    }
}

pub trait Aggregater: Send + Sync {
    /// Append the aggregate of `entry` (relative to `base_dir`) to `buffer`.
    /// On error `buffer` is left untouched.
    fn aggregate_from_file(
        &self,
        buffer: &mut String,
        base_dir: &Path,
        entry: &str,
        profiles: &[String],
    ) -> Result<()>;

    fn get_type(&self) -> ContentType;
}

/// Scans an ES6 module tree and emits it as registrations against the
/// bootstrap registry.
#[derive(Debug, Clone, Default)]
pub struct JsCompileAggregater {
    options: AggregateOptions,
}

impl JsCompileAggregater {
    pub fn new(options: AggregateOptions) -> Self {
        JsCompileAggregater { options }
    }

    /// Registration names per module key, in registry order: the key itself
    /// followed by every distinct specifier that resolved to it.
    pub fn registration_names(registry: &ModuleRegistry) -> Result<Vec<(String, Vec<String>)>> {
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut result = Vec::new();

        for key in registry.order() {
            let mut names = vec![key.clone()];
            names.extend(
                registry
                    .aliases(key)
                    .filter(|alias| *alias != key.as_str())
                    .map(String::from),
            );
            for name in &names {
                if let Some(previous) = owners.insert(name.clone(), key.clone()) {
                    if &previous != key {
                        return Err(AggregateError::AmbiguousSpecifier {
                            specifier: name.clone(),
                            first: previous,
                            second: key.clone(),
                        });
                    }
                }
            }
            result.push((key.clone(), names));
        }
        Ok(result)
    }

    /// Render a scanned registry: bootstrap, registrations, entry call.
    pub fn render(&self, registry: &ModuleRegistry) -> Result<String> {
        let mut out = String::from(MODULE_REGISTRY_JS);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        for (key, names) in Self::registration_names(registry)? {
            if let Some(module) = registry.get(&key) {
                out.push('\n');
                emit_registration(&mut out, module, &names);
            }
        }
        if self.options.invoke_entry {
            out.push('\n');
            emit_entry_invocation(&mut out, registry.entry());
        }
        Ok(out)
    }
}

impl Aggregater for JsCompileAggregater {
    fn aggregate_from_file(
        &self,
        buffer: &mut String,
        base_dir: &Path,
        entry: &str,
        profiles: &[String],
    ) -> Result<()> {
        // Profiles do not influence the output yet.
        log::trace!("aggregating {} with profiles {:?}", entry, profiles);

        let scanner = ModuleScanner::with_rewrite(base_dir, self.options.rewrite);
        let entry = entry.trim_start_matches('/');
        let registry = scanner.scan(entry)?;
        let rendered = self.render(&registry)?;

        log::debug!(
            "aggregated {} module(s) for {} ({} bytes)",
            registry.len(),
            entry,
            rendered.len()
        );
        buffer.push_str(&rendered);
        Ok(())
    }

    fn get_type(&self) -> ContentType {
        ContentType::Javascript
    }
}
