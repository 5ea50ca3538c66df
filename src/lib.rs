//! # Module Aggregator
//!
//! Flattens a tree of ES6-style modules into a single script that runs in an
//! environment with no native module loader.
//!
//! ## Pipeline
//!
//! 1. **Scan** ([`ModuleScanner`]): starting from the entry file, every
//!    transitively imported file is parsed exactly once into a [`Module`].
//! 2. **Rewrite**: inside each module, calls to imported names are rewritten
//!    to go through the runtime registry: `helper(x)` becomes
//!    `mr.get('./lib.js').helper(x)`.
//! 3. **Emit** ([`JsCompileAggregater`]): the registry bootstrap is written
//!    first, then one factory registration per module, then the call that
//!    runs the entry module.
//!
//! ## Limits
//!
//! Parsing is line and keyword driven, not a JavaScript grammar. A module
//! holds at most one class and it may not use `extends`. Rewriting is
//! textual unless [`RewriteMode::ShadowAware`] is selected. Every
//! `mr.get(...)` runs the target's factory again, so module-level state is
//! not shared between importers.

mod aggregate;
mod braces;
mod class;
mod emit;
mod error;
mod function;
mod import;
mod module;
mod options;
mod rewrite;
mod scanner;
mod service;

#[cfg(feature = "napi")]
mod bridge;

#[cfg(test)]
mod aggregate_tests;
#[cfg(test)]
mod module_tests;

pub use aggregate::{Aggregater, ContentType, JsCompileAggregater, MODULE_REGISTRY_JS};
pub use class::{JsClass, JsObjectType};
pub use error::{
    AggregateError, Result, ERR_AMBIGUOUS_SPECIFIER, ERR_IO, ERR_PARSE, ERR_RESOLUTION,
};
pub use function::JsFunction;
pub use import::{Import, ImportType};
pub use module::{module_name, ExportBinding, Module, MODULE_NAME_SUFFIX};
pub use options::{AggregateOptions, RewriteMode};
pub use rewrite::REGISTRY_VAR;
pub use scanner::{normalize_path, ModuleRegistry, ModuleScanner};
pub use service::{
    cache_key, parse_profiles, post_process, request_path, CachedContent, ContentCache,
    ContentService, ServiceConfig, CLEAR_CACHE, NO_CACHE, NO_COMPILE,
};

#[cfg(feature = "napi")]
pub use bridge::{aggregate_native, scan_modules_native};
