//! Call-site rewriting of import bindings into runtime registry lookups.
//!
//! `name(` becomes `mr.get('<source>').name(`. The match is textual: an
//! occurrence counts as a call site when it is not preceded by an identifier
//! character or `.` and is immediately followed by `(`. Scope is not
//! consulted unless [`RewriteMode::ShadowAware`] is selected.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::function::JsFunction;
use crate::import::Import;
use crate::options::RewriteMode;

/// Name of the runtime registry instance declared by the bootstrap script.
pub const REGISTRY_VAR: &str = "mr";

lazy_static! {
    static ref DECLARATION_RE: Regex =
        Regex::new(r"\b(?:let|const|var|function)\s+([A-Za-z_$][\w$]*)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    pub source_path: String,
    /// Member looked up on the registered module object.
    pub member: String,
    pub namespace: bool,
}

pub fn bindings_for(imports: &[Import]) -> Vec<ImportBinding> {
    imports
        .iter()
        .flat_map(|import| {
            import.names.iter().map(move |local| ImportBinding {
                local: local.clone(),
                source_path: import.source_path.clone(),
                member: import.exported_name(local).to_string(),
                namespace: import.import_type == crate::import::ImportType::Namespace,
            })
        })
        .collect()
}

/// `mr.get('<path>')`
pub fn registry_lookup(source_path: &str) -> String {
    format!(
        "{}.get('{}')",
        REGISTRY_VAR,
        source_path.replace('\\', "\\\\").replace('\'', "\\'")
    )
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Length of the identifier at the start of `s`, if any.
fn leading_ident_len(s: &str) -> usize {
    s.char_indices()
        .find(|&(i, c)| !(is_ident_char(c) && !(i == 0 && c.is_ascii_digit())))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn rewrite_binding(line: &str, binding: &ImportBinding) -> String {
    let name = binding.local.as_str();
    let lookup = registry_lookup(&binding.source_path);
    let mut out = String::with_capacity(line.len());
    let mut last = 0;

    for (idx, _) in line.match_indices(name) {
        let preceded = line[..idx]
            .chars()
            .next_back()
            .map_or(false, |c| is_ident_char(c) || c == '.');
        if preceded {
            continue;
        }

        let after = &line[idx + name.len()..];
        let replacement = if after.starts_with('(') {
            Some(format!("{}.{}", lookup, binding.member))
        } else if binding.namespace {
            // `ns.member(` -> `mr.get('p').member(`
            after.strip_prefix('.').and_then(|rest| {
                let len = leading_ident_len(rest);
                (len > 0 && rest[len..].starts_with('(')).then(|| lookup.clone())
            })
        } else {
            None
        };

        if let Some(replacement) = replacement {
            out.push_str(&line[last..idx]);
            out.push_str(&replacement);
            last = idx + name.len();
        }
    }

    out.push_str(&line[last..]);
    out
}

/// Rewrite every call site of every binding in `line`, except for names in `skip`.
pub fn rewrite_line(line: &str, bindings: &[ImportBinding], skip: &HashSet<String>) -> String {
    bindings
        .iter()
        .filter(|b| !skip.contains(&b.local))
        .fold(line.to_string(), |acc, binding| rewrite_binding(&acc, binding))
}

/// Names a function binds locally: its parameters plus any `let`, `const`,
/// `var` or `function` declaration in its body.
pub fn shadowed_names(func: &JsFunction) -> HashSet<String> {
    let mut names: HashSet<String> = func.param_names().into_iter().map(String::from).collect();
    for line in &func.body_lines {
        for caps in DECLARATION_RE.captures_iter(line) {
            names.insert(caps[1].to_string());
        }
    }
    names
}

pub fn rewrite_function(func: &mut JsFunction, bindings: &[ImportBinding], mode: RewriteMode) {
    if bindings.is_empty() {
        return;
    }
    let skip = match mode {
        RewriteMode::Textual => HashSet::new(),
        RewriteMode::ShadowAware => shadowed_names(func),
    };
    for line in func.body_lines.iter_mut() {
        *line = rewrite_line(line, bindings, &skip);
    }
}
