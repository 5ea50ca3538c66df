use serde::{Deserialize, Serialize};

/// A parsed function declaration or class method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsFunction {
    pub name: String,
    /// Parameter list verbatim, parentheses included: `"()"`, `"(p1, p2)"`.
    pub params: String,
    pub exported: bool,
    pub is_async: bool,
    /// 1-based line of the declaration.
    pub line: usize,
    pub body_lines: Vec<String>,
}

impl JsFunction {
    pub fn is_constructor(&self) -> bool {
        self.name == "constructor"
    }

    /// Identifiers bound by the parameter list. Default-value expressions are
    /// scanned too, so this over-approximates.
    pub fn param_names(&self) -> Vec<&str> {
        self.params
            .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .filter(|s| !s.is_empty() && !s.starts_with(|c: char| c.is_ascii_digit()))
            .collect()
    }
}
