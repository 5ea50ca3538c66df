//! Module parser.
//!
//! Turns the text of one ES6-style source file into a [`Module`]: its import
//! clauses, top-level functions, at most one class, and any remaining
//! top-level statements. There is no expression grammar here. Declarations
//! are recognized by their leading keywords, and block extents come from
//! brace depth (see [`crate::braces`]).
//!
//! Once the structure is known, every function body and top-level statement
//! is passed through [`crate::rewrite`] so that calls to imported names go
//! through the runtime registry.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::braces::BraceTracker;
use crate::class::JsClass;
use crate::error::{AggregateError, Result};
use crate::function::JsFunction;
use crate::import::{is_complete_import, parse_import_statement, Import};
use crate::options::RewriteMode;
use crate::rewrite::{bindings_for, rewrite_function, rewrite_line};

/// Appended to a file's stem to form the module's factory symbol.
pub const MODULE_NAME_SUFFIX: &str = "JS_Fn";

/// Local that holds the value of an `export default <expression>` statement.
pub const DEFAULT_EXPORT_LOCAL: &str = "__default";

lazy_static! {
    static ref IMPORT_START_RE: Regex = Regex::new(r#"^import(\s|\{|\*|'|")"#).unwrap();
    static ref FUNCTION_RE: Regex = Regex::new(
        r"^(export\s+(default\s+)?)?(async\s+)?function\s+([A-Za-z_$][\w$]*)\s*(\(.*)$"
    )
    .unwrap();
    static ref GENERATOR_RE: Regex =
        Regex::new(r"^(export\s+(default\s+)?)?(async\s+)?function\s*\*").unwrap();
    static ref CLASS_RE: Regex =
        Regex::new(r"^(export\s+(default\s+)?)?class\s+([A-Za-z_$][\w$]*)\s*(.*)$").unwrap();
    static ref METHOD_RE: Regex =
        Regex::new(r"^(static\s+)?(async\s+)?([A-Za-z_$][\w$]*)\s*(\(.*)$").unwrap();
    static ref ACCESSOR_RE: Regex =
        Regex::new(r"^(static\s+)?(async\s+)?(\*|(get|set)\s+[A-Za-z_$#\[])").unwrap();
    static ref PRIVATE_MEMBER_RE: Regex = Regex::new(r"^(static\s+)?(async\s+)?#").unwrap();
    static ref EXPORT_DECL_RE: Regex =
        Regex::new(r"^export\s+(const|let|var)\s+([A-Za-z_$][\w$]*)\s*(=|;|$)").unwrap();
    static ref EXPORT_LIST_RE: Regex = Regex::new(r"^export\s*\{([^}]*)\}\s*;?$").unwrap();
    static ref EXPORT_DEFAULT_RE: Regex = Regex::new(r"^export\s+default\s+").unwrap();
}

/// A name the module exposes through `export const`, `export let`,
/// `export var` or an `export { ... }` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBinding {
    pub exported: String,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub name: String,
    pub path: String,
    pub imports: Vec<Import>,
    pub js_class: Option<JsClass>,
    /// Top-level functions declared before the class (all of them when the
    /// file has no class).
    pub js_funcs: Vec<JsFunction>,
    /// Remaining top-level lines, rewritten like function bodies.
    pub statements: Vec<String>,
    pub exports: Vec<ExportBinding>,
    /// Local name of the default export, if any.
    pub default_export: Option<String>,
}

impl Module {
    /// Parse with the default textual rewrite.
    pub fn parse(path: &str, source: &str) -> Result<Self> {
        Self::parse_with(path, source, RewriteMode::default())
    }

    pub fn parse_with(path: &str, source: &str, mode: RewriteMode) -> Result<Self> {
        let mut module = ModuleParser::new(path, source).parse()?;

        let bindings = bindings_for(&module.imports);
        for func in module.js_funcs.iter_mut() {
            rewrite_function(func, &bindings, mode);
        }
        if let Some(class) = module.js_class.as_mut() {
            for func in class.functions_mut() {
                rewrite_function(func, &bindings, mode);
            }
        }
        if !bindings.is_empty() {
            let no_skip = HashSet::new();
            for line in module.statements.iter_mut() {
                *line = rewrite_line(line, &bindings, &no_skip);
            }
        }

        Ok(module)
    }

    /// Every function-like construct in source order: top-level functions,
    /// the constructor, class methods and trailing free functions.
    pub fn joined_funcs(&self) -> Vec<&JsFunction> {
        let mut funcs: Vec<&JsFunction> = self.js_funcs.iter().collect();
        if let Some(class) = &self.js_class {
            funcs.extend(class.functions());
        }
        funcs.sort_by_key(|f| f.line);
        funcs
    }

    /// Distinct import specifiers in source order.
    pub fn import_specifiers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.imports
            .iter()
            .map(|i| i.source_path.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }
}

/// `dir/test.js` -> `testJS_Fn`. Characters that cannot appear in a JS
/// identifier are replaced by `_`.
pub fn module_name(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name.push_str(MODULE_NAME_SUFFIX);
    name
}

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK EXTRACTION
// ═══════════════════════════════════════════════════════════════════════════════

type Line = (usize, String);

struct Block {
    body: Vec<Line>,
    /// Index of the line holding the closing brace.
    end: usize,
}

fn indentation(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

fn push_if_content(body: &mut Vec<Line>, line_no: usize, text: &str) {
    if !text.trim().is_empty() {
        body.push((line_no, text.to_string()));
    }
}

/// Collect the interior of the block whose `{` sits at byte `brace` of
/// `lines[start]`. Text after the matching `}` is dropped.
fn collect_block(file: &str, lines: &[Line], start: usize, brace: usize) -> Result<Block> {
    let mut tracker = BraceTracker::new();
    let mut body = Vec::new();

    for (idx, (line_no, text)) in lines.iter().enumerate().skip(start) {
        let from = if idx == start { brace } else { 0 };
        let segment = &text[from..];
        let events = tracker.feed(segment);
        let opened_here = if idx == start { 1 } else { 0 };

        if let Some(close) = events.iter().find(|e| !e.open && e.depth == 0) {
            push_if_content(&mut body, *line_no, &segment[opened_here..close.offset]);
            let tail = segment[close.offset + 1..].trim();
            if !(tail.is_empty() || tail == ";" || tail == ",") {
                log::warn!("{}:{}: dropping '{}' after closing brace", file, line_no, tail);
            }
            return Ok(Block { body, end: idx });
        }

        if idx == start {
            push_if_content(&mut body, *line_no, &segment[opened_here..]);
        } else {
            body.push((*line_no, text.clone()));
        }
    }

    Err(AggregateError::parse(
        file,
        lines[start].0,
        "unterminated block: no matching '}' before end of file",
    ))
}

/// Byte index just past the `)` matching the `(` that starts `text`.
fn close_paren(text: &str) -> Option<usize> {
    let mut depth = 0;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => in_string = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the next non-blank line at or after `from`.
fn next_content_line(lines: &[Line], from: usize) -> Option<usize> {
    (from..lines.len()).find(|&i| !lines[i].1.trim().is_empty())
}

/// Locate the `{` that opens a declaration's block: either on the header line
/// after `after` or leading the next non-blank line.
fn find_block_start(
    file: &str,
    lines: &[Line],
    idx: usize,
    after: usize,
    what: &str,
) -> Result<(usize, usize)> {
    let rest = &lines[idx].1[after..];
    let trimmed = rest.trim_start();
    if trimmed.starts_with('{') {
        return Ok((idx, after + rest.len() - trimmed.len()));
    }
    if trimmed.is_empty() {
        if let Some(next) = next_content_line(lines, idx + 1) {
            let text = &lines[next].1;
            if text.trim_start().starts_with('{') {
                return Ok((next, indentation(text)));
            }
        }
    }
    Err(AggregateError::parse(
        file,
        lines[idx].0,
        format!("expected '{{' to open {}", what),
    ))
}

/// Parse a function or method whose parameter list opens at byte `paren` of
/// `lines[idx]`. Returns the function and the index of the line after it.
fn parse_function_at(
    file: &str,
    lines: &[Line],
    idx: usize,
    paren: usize,
    name: &str,
    exported: bool,
    is_async: bool,
) -> Result<(JsFunction, usize)> {
    let line_no = lines[idx].0;

    // The parameter list may continue over several lines.
    let mut joined = lines[idx].1[paren..].to_string();
    let mut last = idx;
    let mut last_start = 0;
    let mut base = paren;
    let end = loop {
        if let Some(end) = close_paren(&joined) {
            break end;
        }
        last += 1;
        if last >= lines.len() {
            return Err(AggregateError::parse(
                file,
                line_no,
                format!("unterminated parameter list for '{}'", name),
            ));
        }
        joined.push('\n');
        last_start = joined.len();
        base = 0;
        joined.push_str(&lines[last].1);
    };

    let params = joined[..end].to_string();
    let after = base + (end - last_start);
    let (brace_line, brace) =
        find_block_start(file, lines, last, after, &format!("the body of '{}'", name))?;
    let block = collect_block(file, lines, brace_line, brace)?;

    let func = JsFunction {
        name: name.to_string(),
        params,
        exported,
        is_async,
        line: line_no,
        body_lines: block.body.into_iter().map(|(_, text)| text).collect(),
    };
    Ok((func, block.end + 1))
}

/// If `lines[idx]` starts with a comment, the line index and byte offset at
/// which code resumes after it.
fn skip_comment(file: &str, lines: &[Line], idx: usize) -> Result<Option<(usize, usize)>> {
    let text = &lines[idx].1;
    let lead = indentation(text);
    let trimmed = &text[lead..];
    if trimmed.starts_with("//") {
        return Ok(Some((idx + 1, 0)));
    }
    if trimmed.starts_with("/*") {
        if let Some(end) = trimmed[2..].find("*/") {
            return Ok(Some((idx, lead + 2 + end + 2)));
        }
        return match (idx + 1..lines.len())
            .find_map(|i| lines[i].1.find("*/").map(|end| (i, end + 2)))
        {
            Some(resume) => Ok(Some(resume)),
            None => Err(AggregateError::parse(
                file,
                lines[idx].0,
                "unterminated block comment",
            )),
        };
    }
    Ok(None)
}

/// Continue at `offset` of `lines[line]`. Code that shares a line with the
/// end of a comment stays in place, with the comment blanked out.
fn resume_after_comment(lines: &mut [Line], line: usize, offset: usize) -> usize {
    if offset == 0 || line >= lines.len() {
        return line;
    }
    let text = &mut lines[line].1;
    if text[offset..].trim().is_empty() {
        return line + 1;
    }
    text.replace_range(..offset, &" ".repeat(offset));
    line
}

/// `text` without a trailing `//` or `/* */` comment outside quotes.
fn strip_trailing_comment(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut in_string: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if let Some(quote) = in_string {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'\'' | b'"' | b'`' => in_string = Some(c),
            b'/' if bytes.get(i + 1) == Some(&b'/') => return text[..i].trim_end(),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let Some(end) = text[i + 2..].find("*/") else {
                    return text;
                };
                let after = i + 2 + end + 2;
                if strip_trailing_comment(&text[after..]).trim().is_empty() {
                    return text[..i].trim_end();
                }
                i = after;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    text
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSER
// ═══════════════════════════════════════════════════════════════════════════════

struct ModuleParser<'a> {
    file: &'a str,
    lines: Vec<Line>,
    imports: Vec<Import>,
    js_funcs: Vec<JsFunction>,
    js_class: Option<JsClass>,
    statements: Vec<String>,
    exports: Vec<ExportBinding>,
    default_export: Option<String>,
}

impl<'a> ModuleParser<'a> {
    fn new(file: &'a str, source: &str) -> Self {
        ModuleParser {
            file,
            lines: source
                .lines()
                .enumerate()
                .map(|(i, l)| (i + 1, l.to_string()))
                .collect(),
            imports: Vec::new(),
            js_funcs: Vec::new(),
            js_class: None,
            statements: Vec::new(),
            exports: Vec::new(),
            default_export: None,
        }
    }

    fn error(&self, idx: usize, message: impl Into<String>) -> AggregateError {
        AggregateError::parse(self.file, self.lines[idx].0, message)
    }

    fn parse(mut self) -> Result<Module> {
        let mut idx = 0;
        while idx < self.lines.len() {
            let trimmed = self.lines[idx].1.trim();
            if trimmed.is_empty() || trimmed == ";" {
                idx += 1;
                continue;
            }
            if let Some((line, offset)) = skip_comment(self.file, &self.lines, idx)? {
                idx = resume_after_comment(&mut self.lines, line, offset);
                continue;
            }

            idx = if IMPORT_START_RE.is_match(trimmed) {
                self.parse_import(idx)?
            } else if GENERATOR_RE.is_match(trimmed) {
                return Err(self.error(idx, "generator functions are not supported"));
            } else if FUNCTION_RE.is_match(trimmed) {
                self.parse_top_level_function(idx)?
            } else if CLASS_RE.is_match(trimmed) {
                self.parse_class(idx)?
            } else {
                self.parse_statement(idx)?
            };
        }

        Ok(Module {
            name: module_name(self.file),
            path: self.file.to_string(),
            imports: self.imports,
            js_class: self.js_class,
            js_funcs: self.js_funcs,
            statements: self.statements,
            exports: self.exports,
            default_export: self.default_export,
        })
    }

    fn parse_import(&mut self, idx: usize) -> Result<usize> {
        let mut statement = strip_trailing_comment(self.lines[idx].1.trim()).to_string();
        let mut end = idx;
        while !is_complete_import(&statement) {
            let open_clause = statement.contains('{') && !statement.contains('}');
            if !open_clause || end + 1 >= self.lines.len() {
                return Err(self.error(
                    idx,
                    format!("unrecognized import syntax: '{}'", statement),
                ));
            }
            end += 1;
            statement.push(' ');
            statement.push_str(strip_trailing_comment(self.lines[end].1.trim()));
        }

        let imports = parse_import_statement(&statement, self.lines[idx].0).ok_or_else(|| {
            self.error(idx, format!("unrecognized import syntax: '{}'", statement))
        })?;
        self.imports.extend(imports);
        Ok(end + 1)
    }

    fn parse_top_level_function(&mut self, idx: usize) -> Result<usize> {
        let text = &self.lines[idx].1;
        let indent = indentation(text);
        let caps = FUNCTION_RE
            .captures(text.trim())
            .ok_or_else(|| self.error(idx, "malformed function declaration"))?;

        let exported = caps.get(1).is_some();
        let is_default = caps.get(2).is_some();
        let is_async = caps.get(3).is_some();
        let name = caps[4].to_string();
        let paren = indent + caps.get(5).map_or(0, |m| m.start());

        let (func, next) =
            parse_function_at(self.file, &self.lines, idx, paren, &name, exported, is_async)?;
        if is_default {
            self.default_export = Some(name);
        }
        match self.js_class.as_mut() {
            Some(class) => class.none_class_functions.push(func),
            None => self.js_funcs.push(func),
        }
        Ok(next)
    }

    fn parse_class(&mut self, idx: usize) -> Result<usize> {
        if let Some(existing) = &self.js_class {
            return Err(self.error(
                idx,
                format!(
                    "only one class per module is supported ('{}' already declared at line {})",
                    existing.name, existing.line
                ),
            ));
        }

        let text = &self.lines[idx].1;
        let indent = indentation(text);
        let caps = CLASS_RE
            .captures(text.trim())
            .ok_or_else(|| self.error(idx, "malformed class declaration"))?;
        let exported = caps.get(1).is_some();
        let is_default = caps.get(2).is_some();
        let name = caps[3].to_string();
        let rest = caps.get(4).map_or("", |m| m.as_str());
        if rest.trim_start().starts_with("extends") {
            return Err(self.error(idx, format!("class '{}': inheritance is not supported", name)));
        }
        let after = indent + caps.get(4).map_or(0, |m| m.start());

        let (brace_line, brace) = find_block_start(
            self.file,
            &self.lines,
            idx,
            after,
            &format!("the body of class '{}'", name),
        )?;
        let block = collect_block(self.file, &self.lines, brace_line, brace)?;

        let mut class = JsClass::new(name.clone(), exported, self.lines[idx].0);
        self.parse_class_body(&mut class, block.body)?;

        if is_default {
            self.default_export = Some(name);
        }
        self.js_class = Some(class);
        Ok(block.end + 1)
    }

    fn parse_class_body(&self, class: &mut JsClass, mut body: Vec<Line>) -> Result<()> {
        let mut idx = 0;
        while idx < body.len() {
            let (line_no, text) = &body[idx];
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed == ";" {
                idx += 1;
                continue;
            }
            if let Some((line, offset)) = skip_comment(self.file, &body, idx)? {
                idx = resume_after_comment(&mut body, line, offset);
                continue;
            }
            if ACCESSOR_RE.is_match(trimmed) {
                return Err(AggregateError::parse(
                    self.file,
                    *line_no,
                    format!(
                        "class '{}': accessors and generator methods are not supported",
                        class.name
                    ),
                ));
            }

            if PRIVATE_MEMBER_RE.is_match(trimmed) {
                return Err(AggregateError::parse(
                    self.file,
                    *line_no,
                    format!("class '{}': private '#' members are not supported", class.name),
                ));
            }

            if let Some(caps) = METHOD_RE.captures(trimmed) {
                let paren = indentation(text) + caps.get(4).map_or(0, |m| m.start());
                let is_async = caps.get(2).is_some();
                let (func, next) =
                    parse_function_at(self.file, &body, idx, paren, &caps[3], false, is_async)?;
                if func.is_constructor() {
                    if class.constructor.is_some() {
                        return Err(AggregateError::parse(
                            self.file,
                            *line_no,
                            format!("class '{}' declares more than one constructor", class.name),
                        ));
                    }
                    class.constructor = Some(func);
                } else {
                    class.class_functions.push(func);
                }
                idx = next;
                continue;
            }

            // Field declaration, possibly with a multi-line initializer.
            let mut tracker = BraceTracker::new();
            let mut member = trimmed.to_string();
            tracker.feed(text);
            while tracker.depth() > 0 || tracker.is_mid_token() {
                idx += 1;
                let Some((_, next)) = body.get(idx) else {
                    return Err(AggregateError::parse(
                        self.file,
                        *line_no,
                        "unterminated class member initializer",
                    ));
                };
                tracker.feed(next);
                member.push(' ');
                member.push_str(next.trim());
            }
            if tracker.depth() < 0 {
                return Err(AggregateError::parse(
                    self.file,
                    body[idx].0,
                    "unbalanced '}' in class body",
                ));
            }
            class.class_members.push(member);
            idx += 1;
        }
        Ok(())
    }

    fn parse_statement(&mut self, idx: usize) -> Result<usize> {
        let text = self.lines[idx].1.clone();
        let trimmed = text.trim();
        let indent = &text[..indentation(&text)];

        let first = if let Some(caps) = EXPORT_LIST_RE.captures(trimmed) {
            self.record_export_list(idx, &caps[1])?;
            return Ok(idx + 1);
        } else if let Some(caps) = EXPORT_DECL_RE.captures(trimmed) {
            self.exports.push(ExportBinding {
                exported: caps[2].to_string(),
                local: caps[2].to_string(),
            });
            format!("{}{}", indent, trimmed["export".len()..].trim_start())
        } else if let Some(m) = EXPORT_DEFAULT_RE.find(trimmed) {
            self.default_export = Some(DEFAULT_EXPORT_LOCAL.to_string());
            format!("{}const {} = {}", indent, DEFAULT_EXPORT_LOCAL, &trimmed[m.end()..])
        } else if trimmed.starts_with("export ") || trimmed.starts_with("export{") {
            return Err(self.error(idx, format!("unsupported export form: '{}'", trimmed)));
        } else {
            text.clone()
        };

        let mut tracker = BraceTracker::new();
        tracker.feed(&first);
        if tracker.depth() < 0 {
            return Err(self.error(idx, "unbalanced '}' at top level"));
        }
        self.statements.push(first);

        let mut end = idx;
        while tracker.depth() > 0 || tracker.is_mid_token() {
            end += 1;
            if end >= self.lines.len() {
                return Err(self.error(
                    idx,
                    "unterminated block: no matching '}' before end of file",
                ));
            }
            let next = self.lines[end].1.clone();
            tracker.feed(&next);
            if tracker.depth() < 0 {
                return Err(self.error(end, "unbalanced '}' at top level"));
            }
            self.statements.push(next);
        }
        Ok(end + 1)
    }

    fn record_export_list(&mut self, idx: usize, list: &str) -> Result<()> {
        for specifier in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let parts: Vec<&str> = specifier.split_whitespace().collect();
            let binding = match parts.as_slice() {
                [name] => ExportBinding {
                    exported: name.to_string(),
                    local: name.to_string(),
                },
                [local, "as", exported] => ExportBinding {
                    exported: exported.to_string(),
                    local: local.to_string(),
                },
                _ => {
                    return Err(
                        self.error(idx, format!("unsupported export specifier: '{}'", specifier))
                    )
                }
            };
            if binding.exported == "default" {
                self.default_export = Some(binding.local);
            } else {
                self.exports.push(binding);
            }
        }
        Ok(())
    }
}
