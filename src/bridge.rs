//! Node bindings.

use napi_derive::napi;
use std::path::Path;

use crate::aggregate::{Aggregater, JsCompileAggregater};
use crate::options::{AggregateOptions, RewriteMode};
use crate::scanner::ModuleScanner;

fn to_napi(err: crate::error::AggregateError) -> napi::Error {
    napi::Error::from_reason(format!("[{}] {}", err.code(), err))
}

#[napi(object)]
#[derive(Default)]
pub struct NativeAggregateOptions {
    /// `"textual"` (default) or `"shadowAware"`.
    pub rewrite: Option<String>,
    pub invoke_entry: Option<bool>,
}

impl From<NativeAggregateOptions> for AggregateOptions {
    fn from(native: NativeAggregateOptions) -> Self {
        let defaults = AggregateOptions::default();
        AggregateOptions {
            rewrite: match native.rewrite.as_deref() {
                Some("shadowAware") => RewriteMode::ShadowAware,
                Some(_) | None => defaults.rewrite,
            },
            invoke_entry: native.invoke_entry.unwrap_or(defaults.invoke_entry),
        }
    }
}

#[napi]
pub fn aggregate_native(
    base_dir: String,
    entry: String,
    profiles: Option<Vec<String>>,
    options: Option<NativeAggregateOptions>,
) -> napi::Result<String> {
    let aggregater = JsCompileAggregater::new(options.unwrap_or_default().into());
    let mut buffer = String::new();
    aggregater
        .aggregate_from_file(
            &mut buffer,
            Path::new(&base_dir),
            &entry,
            &profiles.unwrap_or_default(),
        )
        .map_err(to_napi)?;
    Ok(buffer)
}

#[napi]
pub fn scan_modules_native(base_dir: String, entry: String) -> napi::Result<serde_json::Value> {
    let registry = ModuleScanner::new(base_dir)
        .scan(entry.trim_start_matches('/'))
        .map_err(to_napi)?;
    serde_json::to_value(registry).map_err(|e| napi::Error::from_reason(e.to_string()))
}
