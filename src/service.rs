//! Content service: caching and profile handling in front of an aggregater.
//!
//! Nothing in the parsing or scanning layers depends on this module. It owns
//! the process-level cache, interprets the `clearcache`, `nocache` and
//! `nocompile` profile tokens, and post-processes aggregated output.

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::aggregate::{Aggregater, ContentType};
use crate::error::{AggregateError, Result};
use crate::options::AggregateOptions;
use crate::scanner::normalize_path;

pub const CLEAR_CACHE: &str = "clearcache";
pub const NO_CACHE: &str = "nocache";
pub const NO_COMPILE: &str = "nocompile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedContent {
    pub body: String,
    /// SHA-256 of `body`, hex encoded.
    pub digest: String,
}

impl CachedContent {
    pub fn new(body: String) -> Self {
        let digest = compute_hash(&body);
        CachedContent { body, digest }
    }
}

pub fn compute_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `/js/main.js[debug, nocache]`
pub fn cache_key(path: &str, profiles: &[String]) -> String {
    format!("{}[{}]", path, profiles.join(", "))
}

/// Split a comma-separated profile list, dropping empty entries.
pub fn parse_profiles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Whitespace normalization applied to aggregated output: trailing
/// whitespace removed from every line, exactly one final newline.
pub fn post_process(content: &str) -> String {
    let mut out = content
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string();
    out.push('\n');
    out
}

/// Normalize a request path relative to the base directory. Paths that would
/// leave the base directory are refused.
pub fn request_path(path: &str) -> Result<PathBuf> {
    let relative = normalize_path(Path::new(path.trim_start_matches('/')));
    match relative.components().next() {
        Some(Component::ParentDir | Component::RootDir | Component::Prefix(_)) => {
            Err(AggregateError::Io {
                path: relative,
                source: io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "request path escapes the base directory",
                ),
            })
        }
        _ => Ok(relative),
    }
}

/// Aggregated artifacts keyed by [`cache_key`]. Entries are shared as `Arc`s
/// so clearing the cache never invalidates content a reader already holds.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: RwLock<HashMap<String, Arc<CachedContent>>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<CachedContent>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn put(&self, key: String, content: Arc<CachedContent>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, content);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub base_dir: PathBuf,
    /// Profiles applied to every request before the request's own.
    pub base_profiles: Vec<String>,
    pub options: AggregateOptions,
}

impl ServiceConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        ServiceConfig {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_base_profiles(mut self, raw: &str) -> Self {
        self.base_profiles = parse_profiles(raw);
        self
    }
}

pub struct ContentService {
    config: ServiceConfig,
    aggregater: Box<dyn Aggregater>,
    cache: ContentCache,
}

impl ContentService {
    pub fn new(config: ServiceConfig, content_type: ContentType) -> Self {
        let aggregater = content_type.aggregater(config.options);
        ContentService {
            config,
            aggregater,
            cache: ContentCache::new(),
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.aggregater.get_type()
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    fn profiles_for(&self, request_profiles: Option<&str>) -> Vec<String> {
        let mut profiles = self.config.base_profiles.clone();
        if let Some(raw) = request_profiles {
            profiles.extend(parse_profiles(raw));
        }
        profiles
    }

    /// Serve `path` (relative to the base directory; a leading `/` is
    /// ignored). `request_profiles` is the raw comma-separated list supplied
    /// with the request.
    pub fn get_content(
        &self,
        path: &str,
        request_profiles: Option<&str>,
    ) -> Result<Arc<CachedContent>> {
        let profiles = self.profiles_for(request_profiles);
        let has = |token: &str| profiles.iter().any(|p| p == token);

        if has(CLEAR_CACHE) {
            log::debug!("clearing content cache ({} entries)", self.cache.len());
            self.cache.clear();
        }

        let relative = request_path(path)?;
        if has(NO_COMPILE) {
            let file = self.config.base_dir.join(relative);
            let raw = fs::read_to_string(&file)
                .map_err(|source| AggregateError::Io { path: file, source })?;
            return Ok(Arc::new(CachedContent::new(raw)));
        }

        let key = cache_key(path, &profiles);
        if !has(NO_CACHE) {
            if let Some(hit) = self.cache.get(&key) {
                log::trace!("returning {} from cache", path);
                return Ok(hit);
            }
        }

        log::debug!("profiles = {:?}", profiles);
        let entry = relative.to_string_lossy();
        let mut buffer = String::new();
        self.aggregater
            .aggregate_from_file(&mut buffer, &self.config.base_dir, &entry, &profiles)?;
        let content = Arc::new(CachedContent::new(post_process(&buffer)));
        self.cache.put(key, content.clone());

        log::info!("aggregation of {} complete", path);
        Ok(content)
    }

    /// Aggregate several paths in parallel, filling the cache.
    pub fn warm(&self, paths: &[String]) -> Vec<(String, Result<Arc<CachedContent>>)> {
        paths
            .par_iter()
            .map(|path| (path.clone(), self.get_content(path, None)))
            .collect()
    }
}
