//! Serialization of parsed modules into runtime registrations.
//!
//! Each module becomes a block-scoped factory that declares the module's
//! functions and class members as enclosed locals and returns an object
//! exposing only its exports:
//!
//! ```js
//! {
//!     let toolsJS_Fn = function() {
//!         function doubleIt(n) {
//!             return n * 2;
//!         }
//!         return {
//!             doubleIt: doubleIt,
//!         };
//!     };
//!     mr.register('js/tools.js', toolsJS_Fn);
//! }
//! ```
//!
//! Body lines are copied verbatim; only the generated scaffolding is indented.

use std::collections::HashSet;
use std::fmt::Write;

use crate::function::JsFunction;
use crate::import::DEFAULT_MEMBER;
use crate::module::Module;
use crate::rewrite::{registry_lookup, REGISTRY_VAR};

const INDENT: &str = "    ";

/// Single-quoted JS string literal.
pub fn js_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Turn a class field line into a local declaration:
/// `count = 0;` -> `let count = 0;`, `let p1;` stays as written.
pub fn member_declaration(member: &str) -> String {
    let member = member.trim();
    if ["let ", "const ", "var "].iter().any(|k| member.starts_with(k)) {
        return member.to_string();
    }
    let field = member.strip_prefix("static ").unwrap_or(member).trim_start();
    if field.ends_with(';') {
        format!("let {}", field)
    } else {
        format!("let {};", field)
    }
}

fn write_function(out: &mut String, name: &str, func: &JsFunction, returns_this: bool) {
    let prefix = if func.is_async { "async " } else { "" };
    let _ = writeln!(out, "{0}{0}{1}function {2}{3} {{", INDENT, prefix, name, func.params);
    for line in &func.body_lines {
        out.push_str(line);
        out.push('\n');
    }
    if returns_this {
        let _ = writeln!(out, "{0}{0}{0}return this;", INDENT);
    }
    let _ = writeln!(out, "{0}{0}}}", INDENT);
}

/// Properties of the object a module's factory returns, in emission order.
pub fn export_properties(module: &Module) -> Vec<(String, String)> {
    let mut props: Vec<(String, String)> = Vec::new();
    let mut seen = HashSet::new();
    let mut add = |key: &str, value: &str| {
        if seen.insert(key.to_string()) {
            props.push((key.to_string(), value.to_string()));
        }
    };

    for func in module.js_funcs.iter().filter(|f| f.exported) {
        add(&func.name, &func.name);
    }
    if let Some(class) = &module.js_class {
        let is_default = module.default_export.as_deref() == Some(class.name.as_str());
        if class.exported || is_default {
            add(&class.name, &class.name);
            for method in &class.class_functions {
                add(&method.name, &method.name);
            }
        }
        for func in class.none_class_functions.iter().filter(|f| f.exported) {
            add(&func.name, &func.name);
        }
    }
    for binding in &module.exports {
        add(&binding.exported, &binding.local);
    }
    if let Some(local) = &module.default_export {
        add(DEFAULT_MEMBER, local);
    }
    props
}

/// The factory function expression for one module.
pub fn emit_factory(out: &mut String, module: &Module) {
    let _ = writeln!(out, "{}let {} = function() {{", INDENT, module.name);

    if let Some(class) = &module.js_class {
        for member in &class.class_members {
            let _ = writeln!(out, "{0}{0}{1}", INDENT, member_declaration(member));
        }
    }
    for line in &module.statements {
        out.push_str(line);
        out.push('\n');
    }
    for func in &module.js_funcs {
        write_function(out, &func.name, func, false);
    }
    if let Some(class) = &module.js_class {
        match &class.constructor {
            Some(ctor) => write_function(out, &class.name, ctor, true),
            None => {
                let _ = writeln!(out, "{0}{0}function {1}() {{", INDENT, class.name);
                let _ = writeln!(out, "{0}{0}{0}return this;", INDENT);
                let _ = writeln!(out, "{0}{0}}}", INDENT);
            }
        }
        for method in &class.class_functions {
            write_function(out, &method.name, method, false);
        }
        for func in &class.none_class_functions {
            write_function(out, &func.name, func, false);
        }
    }

    let _ = writeln!(out, "{0}{0}return {{", INDENT);
    for (key, value) in export_properties(module) {
        let _ = writeln!(out, "{0}{0}{0}{1}: {2},", INDENT, key, value);
    }
    let _ = writeln!(out, "{0}{0}}};", INDENT);
    let _ = writeln!(out, "{}}};", INDENT);
}

/// A self-contained registration block registering the module's factory
/// under every name in `names`.
pub fn emit_registration(out: &mut String, module: &Module, names: &[String]) {
    out.push_str("{\n");
    emit_factory(out, module);
    for name in names {
        let _ = writeln!(
            out,
            "{}{}.register({}, {});",
            INDENT,
            REGISTRY_VAR,
            js_string(name),
            module.name
        );
    }
    out.push_str("}\n");
}

/// `mr.get('<entry>');`
pub fn emit_entry_invocation(out: &mut String, entry: &str) {
    let _ = writeln!(out, "{};", registry_lookup(entry));
}
