use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

lazy_static! {
    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap();
    static ref FROM_RE: Regex =
        Regex::new(r#"^import\s*(.+?)\s*from\s*(['"])([^'"]+)['"]\s*;?$"#).unwrap();
    static ref SIDE_EFFECT_RE: Regex = Regex::new(r#"^import\s*(['"])([^'"]+)['"]\s*;?$"#).unwrap();
    static ref NAMESPACE_RE: Regex = Regex::new(r"^\*\s*as\s+([A-Za-z_$][\w$]*)$").unwrap();
}

/// Property a module's default export is exposed under.
pub const DEFAULT_MEMBER: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportType {
    /// `import { a, b as c } from '...'`
    Named,
    /// `import a from '...'`
    Default,
    /// `import * as a from '...'`
    Namespace,
    /// `import '...'`
    SideEffect,
}

/// One import clause of one import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    #[serde(rename = "type")]
    pub import_type: ImportType,
    /// The specifier exactly as written between the quotes.
    pub source_path: String,
    /// Locally bound identifiers.
    pub names: BTreeSet<String>,
    /// Local name -> exported name, for `a as b` specifiers only.
    pub aliases: BTreeMap<String, String>,
    pub line: usize,
}

impl Import {
    /// The member looked up on the registered module for a local binding.
    /// A default import always reads the module's `default` property.
    pub fn exported_name<'a>(&'a self, local: &'a str) -> &'a str {
        if self.import_type == ImportType::Default {
            return DEFAULT_MEMBER;
        }
        self.aliases.get(local).map(String::as_str).unwrap_or(local)
    }
}

/// Whether a complete statement has been accumulated. Used to join import
/// statements whose clause spans several lines.
pub fn is_complete_import(statement: &str) -> bool {
    FROM_RE.is_match(statement) || SIDE_EFFECT_RE.is_match(statement)
}

/// Parse a single (possibly joined) import statement into its clauses.
/// Returns `None` if the text is not an import shape this crate understands.
pub fn parse_import_statement(statement: &str, line: usize) -> Option<Vec<Import>> {
    let statement = statement.trim();

    if let Some(caps) = SIDE_EFFECT_RE.captures(statement) {
        return Some(vec![Import {
            import_type: ImportType::SideEffect,
            source_path: caps[2].to_string(),
            names: BTreeSet::new(),
            aliases: BTreeMap::new(),
            line,
        }]);
    }

    let caps = FROM_RE.captures(statement)?;
    let clause = caps[1].trim();
    let source_path = caps[3].to_string();

    let mut imports = Vec::new();
    let rest = if clause.starts_with('{') || clause.starts_with('*') {
        clause
    } else {
        // `d` or `d, { ... }` / `d, * as ns`
        let (default_name, rest) = match clause.split_once(',') {
            Some((d, r)) => (d.trim(), r.trim()),
            None => (clause, ""),
        };
        if !IDENT_RE.is_match(default_name) {
            return None;
        }
        imports.push(Import {
            import_type: ImportType::Default,
            source_path: source_path.clone(),
            names: BTreeSet::from([default_name.to_string()]),
            aliases: BTreeMap::new(),
            line,
        });
        rest
    };

    if rest.is_empty() {
        return (!imports.is_empty()).then_some(imports);
    }

    if let Some(ns) = NAMESPACE_RE.captures(rest) {
        imports.push(Import {
            import_type: ImportType::Namespace,
            source_path,
            names: BTreeSet::from([ns[1].to_string()]),
            aliases: BTreeMap::new(),
            line,
        });
        return Some(imports);
    }

    let inner = rest.strip_prefix('{')?.strip_suffix('}')?;
    let mut names = BTreeSet::new();
    let mut aliases = BTreeMap::new();
    for specifier in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mut parts = specifier.split_whitespace();
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None, None) if IDENT_RE.is_match(name) => {
                names.insert(name.to_string());
            }
            (Some(exported), Some("as"), Some(local), None)
                if IDENT_RE.is_match(exported) && IDENT_RE.is_match(local) =>
            {
                names.insert(local.to_string());
                aliases.insert(local.to_string(), exported.to_string());
            }
            _ => return None,
        }
    }

    imports.push(Import {
        import_type: ImportType::Named,
        source_path,
        names,
        aliases,
        line,
    });
    Some(imports)
}
