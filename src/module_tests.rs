#[cfg(test)]
mod tests {
    use crate::class::JsObjectType;
    use crate::error::AggregateError;
    use crate::import::ImportType;
    use crate::module::{module_name, Module, DEFAULT_EXPORT_LOCAL};
    use crate::options::RewriteMode;

    fn source(lines: &[&str]) -> String {
        lines.join("\n")
    }

    fn parse_error_line(result: crate::error::Result<Module>) -> (usize, String) {
        match result {
            Err(AggregateError::Parse { line, message, .. }) => (line, message),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_function_module() {
        let src = source(&[
            "import {myImport} from './js/import.js'; ",
            "",
            "export function myFun1() {",
            "console.log(something one...)",
            "};",
            "export function myFun2(p1, p2)",
            "{",
            "myImport(two);",
            "console.log(something two...)",
            "};",
            "function private(p1, p2, p3)",
            "{",
            "console.log(private...)",
            "};",
        ]);

        let module = Module::parse("test.js", &src).unwrap();
        assert_eq!(module.name, "testJS_Fn");
        assert_eq!(module.path, "test.js");

        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.imports[0].import_type, ImportType::Named);
        assert!(module.imports[0].names.contains("myImport"));

        assert_eq!(module.joined_funcs().len(), 3);
        assert_eq!(module.js_funcs.len(), 3);

        let f1 = &module.js_funcs[0];
        assert_eq!(f1.name, "myFun1");
        assert_eq!(f1.params, "()");
        assert!(f1.exported);
        assert_eq!(f1.body_lines, vec!["console.log(something one...)"]);

        let f2 = &module.js_funcs[1];
        assert_eq!(f2.name, "myFun2");
        assert_eq!(f2.params, "(p1, p2)");
        assert!(f2.exported);
        assert_eq!(
            f2.body_lines,
            vec![
                "mr.get('./js/import.js').myImport(two);",
                "console.log(something two...)"
            ]
        );

        let f3 = &module.js_funcs[2];
        assert_eq!(f3.name, "private");
        assert_eq!(f3.params, "(p1, p2, p3)");
        assert!(!f3.exported);
        assert_eq!(f3.body_lines, vec!["console.log(private...)"]);
    }

    #[test]
    fn test_class_module() {
        let src = source(&[
            "import {myImport} from './js/import.js'; ",
            "",
            "export class MyClass {",
            "    let p1;",
            "    let p2;",
            "",
            "    constructor (p1, p2) {",
            "        console.log(p1);",
            "        console.log(p2);",
            "    }",
            "    getP1() {",
            "        return myImport(p1);",
            "    }",
            "    getP2(show) {",
            "        return p2;",
            "    }",
            "};",
            "function addDot(value) {",
            "    return value + '.';",
            "};",
        ]);

        let module = Module::parse("MyClass.js", &src).unwrap();
        assert_eq!(module.name, "MyClassJS_Fn");
        assert_eq!(module.path, "MyClass.js");
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.joined_funcs().len(), 4);
        assert!(module.js_funcs.is_empty());

        let class = module.js_class.as_ref().unwrap();
        assert_eq!(class.object_type, JsObjectType::Class);
        assert_eq!(class.name, "MyClass");
        assert!(class.exported);

        let ctor = class.constructor.as_ref().unwrap();
        assert_eq!(ctor.name, "constructor");
        assert_eq!(ctor.params, "(p1, p2)");
        assert_eq!(ctor.body_lines.len(), 2);

        assert_eq!(class.class_functions.len(), 2);
        let get_p1 = &class.class_functions[0];
        assert_eq!(get_p1.name, "getP1");
        assert_eq!(get_p1.params, "()");
        assert_eq!(
            get_p1.body_lines[0].trim(),
            "return mr.get('./js/import.js').myImport(p1);"
        );
        let get_p2 = &class.class_functions[1];
        assert_eq!(get_p2.name, "getP2");
        assert_eq!(get_p2.params, "(show)");
        assert_eq!(get_p2.body_lines.len(), 1);

        assert_eq!(class.none_class_functions.len(), 1);
        let add_dot = &class.none_class_functions[0];
        assert_eq!(add_dot.name, "addDot");
        assert_eq!(add_dot.params, "(value)");
        assert_eq!(add_dot.body_lines.len(), 1);

        assert_eq!(class.class_members, vec!["let p1;", "let p2;"]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let src = source(&[
            "import { a, b as c } from './lib.js';",
            "export function f(x) {",
            "    return c(a(x));",
            "}",
        ]);
        assert_eq!(
            Module::parse("m.js", &src).unwrap(),
            Module::parse("m.js", &src).unwrap()
        );
    }

    #[test]
    fn test_joined_funcs_in_source_order() {
        let src = source(&[
            "function first() {",
            "}",
            "class Thing {",
            "    constructor() {",
            "    }",
            "    method() {",
            "    }",
            "}",
            "function last() {",
            "}",
        ]);
        let module = Module::parse("thing.js", &src).unwrap();
        let names: Vec<&str> = module.joined_funcs().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["first", "constructor", "method", "last"]);
        let lines: Vec<usize> = module.joined_funcs().iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![1, 4, 6, 9]);
    }

    #[test]
    fn test_second_class_is_rejected() {
        let src = source(&["class A {", "}", "class B {", "}"]);
        let (line, message) = parse_error_line(Module::parse("two.js", &src));
        assert_eq!(line, 3);
        assert!(message.contains("only one class"));
    }

    #[test]
    fn test_extends_is_rejected() {
        let src = source(&["export class A extends B {", "}"]);
        let (line, message) = parse_error_line(Module::parse("a.js", &src));
        assert_eq!(line, 1);
        assert!(message.contains("inheritance"));
    }

    #[test]
    fn test_unterminated_block_reports_opening_line() {
        let src = source(&[
            "",
            "function a() {",
            "    if (x) {",
            "        b();",
            "}",
        ]);
        let (line, message) = parse_error_line(Module::parse("a.js", &src));
        assert_eq!(line, 2);
        assert!(message.contains("unterminated"));
    }

    #[test]
    fn test_stray_closing_brace() {
        let src = source(&["function a() {", "}", "}"]);
        let (line, _) = parse_error_line(Module::parse("a.js", &src));
        assert_eq!(line, 3);
    }

    #[test]
    fn test_unrecognized_import() {
        let src = source(&["const x = 1;", "import from;"]);
        let (line, message) = parse_error_line(Module::parse("a.js", &src));
        assert_eq!(line, 2);
        assert!(message.contains("import"));
    }

    #[test]
    fn test_generators_and_accessors_rejected() {
        let src = source(&["function* gen() {", "}"]);
        assert!(Module::parse("g.js", &src).is_err());

        let src = source(&["class A {", "    get value() {", "        return 1;", "    }", "}"]);
        let (line, _) = parse_error_line(Module::parse("a.js", &src));
        assert_eq!(line, 2);
    }

    #[test]
    fn test_multi_line_import_with_alias() {
        let src = source(&[
            "import {",
            "    helper,",
            "    format as fmt",
            "} from './lib.js';",
            "export function run(v) {",
            "    return fmt(helper(v));",
            "}",
        ]);
        let module = Module::parse("run.js", &src).unwrap();
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.imports[0].line, 1);
        assert_eq!(
            module.js_funcs[0].body_lines,
            vec!["    return mr.get('./lib.js').format(mr.get('./lib.js').helper(v));"]
        );
    }

    #[test]
    fn test_braces_inside_strings_and_templates() {
        let src = source(&[
            "function t(x) {",
            "    const open = '{';",
            "    return `${x}}` + \"}\"; // }",
            "}",
            "function u() { return 1; }",
        ]);
        let module = Module::parse("t.js", &src).unwrap();
        assert_eq!(module.js_funcs.len(), 2);
        assert_eq!(module.js_funcs[0].body_lines.len(), 2);
        assert_eq!(module.js_funcs[1].body_lines.len(), 1);
        assert_eq!(module.js_funcs[1].body_lines[0].trim(), "return 1;");
    }

    #[test]
    fn test_statements_and_exports() {
        let src = source(&[
            "import { log } from './log.js';",
            "const table = {",
            "    a: 1,",
            "};",
            "log(table);",
            "export const VERSION = '1.0';",
            "export { table as lookup };",
            "export default VERSION;",
        ]);
        let module = Module::parse("cfg.js", &src).unwrap();
        assert_eq!(
            module.statements,
            vec![
                "const table = {",
                "    a: 1,",
                "};",
                "mr.get('./log.js').log(table);",
                "const VERSION = '1.0';",
                "const __default = VERSION;",
            ]
        );
        let exported: Vec<(&str, &str)> = module
            .exports
            .iter()
            .map(|b| (b.exported.as_str(), b.local.as_str()))
            .collect();
        assert_eq!(exported, vec![("VERSION", "VERSION"), ("lookup", "table")]);
        assert_eq!(module.default_export.as_deref(), Some(DEFAULT_EXPORT_LOCAL));
    }

    #[test]
    fn test_default_function_and_async_methods() {
        let src = source(&[
            "export default async function main() {",
            "}",
            "class Store {",
            "    static async load(id) {",
            "        return id;",
            "    }",
            "}",
        ]);
        let module = Module::parse("main.js", &src).unwrap();
        assert!(module.js_funcs[0].exported);
        assert!(module.js_funcs[0].is_async);
        assert_eq!(module.default_export.as_deref(), Some("main"));
        let load = &module.js_class.as_ref().unwrap().class_functions[0];
        assert_eq!(load.name, "load");
        assert!(load.is_async);
    }

    #[test]
    fn test_shadow_aware_rewrite() {
        let src = source(&[
            "import {a} from './a.js';",
            "function f(a) {",
            "    return a(1);",
            "}",
            "function g() {",
            "    return a(2);",
            "}",
        ]);

        let textual = Module::parse("m.js", &src).unwrap();
        assert_eq!(textual.js_funcs[0].body_lines[0], "    return mr.get('./a.js').a(1);");

        let aware = Module::parse_with("m.js", &src, RewriteMode::ShadowAware).unwrap();
        assert_eq!(aware.js_funcs[0].body_lines[0], "    return a(1);");
        assert_eq!(aware.js_funcs[1].body_lines[0], "    return mr.get('./a.js').a(2);");
    }

    #[test]
    fn test_imports_with_trailing_comments() {
        let src = source(&[
            "import {a} from './a.js'; // helpers",
            "import {b} from \"./b.js\"; /* tail */",
            "import {",
            "    d, // first",
            "} from './d.js';",
            "import {u} from 'https://cdn.example/u.js'; // remote",
            "export function f() {",
            "    return a(b(d()));",
            "}",
        ]);
        let module = Module::parse("m.js", &src).unwrap();
        let specifiers = module.import_specifiers();
        assert_eq!(
            specifiers,
            vec!["./a.js", "./b.js", "./d.js", "https://cdn.example/u.js"]
        );
        assert_eq!(
            module.js_funcs[0].body_lines,
            vec!["    return mr.get('./a.js').a(mr.get('./b.js').b(mr.get('./d.js').d()));"]
        );
    }

    #[test]
    fn test_code_after_block_comment_is_kept() {
        let src = source(&[
            "/* entry */ function f() {",
            "    return 1;",
            "}",
            "/*",
            " * banner",
            " */ function g() { return 2; }",
            "class A {",
            "    /* counter */ count = 0;",
            "    /** doc */ run() {",
            "        return count;",
            "    }",
            "}",
        ]);
        let module = Module::parse("m.js", &src).unwrap();
        let names: Vec<&str> = module.joined_funcs().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["f", "g", "run"]);
        assert_eq!(module.js_funcs[0].body_lines, vec!["    return 1;"]);
        assert_eq!(module.js_funcs[1].line, 6);
        assert_eq!(module.js_funcs[1].body_lines[0].trim(), "return 2;");

        let class = module.js_class.as_ref().unwrap();
        assert_eq!(class.class_members, vec!["count = 0;"]);
        assert!(module.statements.is_empty());
    }

    #[test]
    fn test_private_members_rejected() {
        let src = source(&["class Vault {", "    #secret = 1;", "}"]);
        let (line, message) = parse_error_line(Module::parse("vault.js", &src));
        assert_eq!(line, 2);
        assert!(message.contains("private"));

        let src = source(&[
            "class Vault {",
            "    open() {",
            "    }",
            "    static #seal() {",
            "    }",
            "}",
        ]);
        let (line, _) = parse_error_line(Module::parse("vault.js", &src));
        assert_eq!(line, 4);
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name("dir/test.js"), "testJS_Fn");
        assert_eq!(module_name("js/my-widget.js"), "my_widgetJS_Fn");
        assert_eq!(module_name("2d.js"), "_2dJS_Fn");
    }
}
