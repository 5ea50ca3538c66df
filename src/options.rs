use serde::{Deserialize, Serialize};

/// How import call sites inside function bodies are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RewriteMode {
    /// Every `name(` is rewritten, even where a parameter or local
    /// declaration shadows the imported name.
    #[default]
    Textual,
    /// Skip a binding inside any function whose parameters or body declare
    /// the same identifier.
    ShadowAware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOptions {
    pub rewrite: RewriteMode,
    /// Append `mr.get('<entry>');` so the entry module runs when the bundle loads.
    pub invoke_entry: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            rewrite: RewriteMode::Textual,
            invoke_entry: true,
        }
    }
}
