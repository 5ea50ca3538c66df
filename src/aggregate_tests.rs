#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    use crate::aggregate::{Aggregater, ContentType, JsCompileAggregater, MODULE_REGISTRY_JS};
    use crate::error::{AggregateError, ERR_AMBIGUOUS_SPECIFIER};
    use crate::options::AggregateOptions;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn greeting_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "main.js",
            "import {greet} from './greet.js';\n\
             export function start() {\n\
             \x20   greet('world');\n\
             }\n\
             start();\n",
        );
        write(
            dir.path(),
            "greet.js",
            "export function greet(name) {\n\
             \x20   console.log('hello ' + name);\n\
             }\n",
        );
        dir
    }

    #[test]
    fn test_aggregate_module_tree() {
        let dir = greeting_tree();
        let aggregater = JsCompileAggregater::default();
        let mut buffer = String::new();
        aggregater
            .aggregate_from_file(&mut buffer, dir.path(), "/main.js", &[])
            .unwrap();

        assert!(buffer.starts_with(MODULE_REGISTRY_JS));
        assert!(buffer.contains("    mr.register('greet.js', greetJS_Fn);\n"));
        assert!(buffer.contains("    mr.register('./greet.js', greetJS_Fn);\n"));
        assert!(buffer.contains("    mr.register('main.js', mainJS_Fn);\n"));
        assert!(buffer.contains("    mr.get('./greet.js').greet('world');\n"));
        assert!(buffer.contains("start();\n"));

        let greet_at = buffer.find("let greetJS_Fn").unwrap();
        let main_at = buffer.find("let mainJS_Fn").unwrap();
        assert!(greet_at < main_at);
        assert!(buffer.ends_with("mr.get('main.js');\n"));
    }

    #[test]
    fn test_entry_invocation_can_be_disabled() {
        let dir = greeting_tree();
        let aggregater = JsCompileAggregater::new(AggregateOptions {
            invoke_entry: false,
            ..AggregateOptions::default()
        });
        let mut buffer = String::new();
        aggregater
            .aggregate_from_file(&mut buffer, dir.path(), "main.js", &[])
            .unwrap();
        assert!(!buffer.contains("mr.get('main.js');"));
    }

    #[test]
    fn test_buffer_untouched_on_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.js", "import {x} from './missing.js';\n");

        let mut buffer = String::from("// existing\n");
        let err = JsCompileAggregater::default()
            .aggregate_from_file(&mut buffer, dir.path(), "main.js", &[])
            .unwrap_err();
        assert!(matches!(err, AggregateError::Resolution { .. }));
        assert_eq!(buffer, "// existing\n");
    }

    #[test]
    fn test_same_specifier_for_two_files_is_ambiguous() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "main.js",
            "import {m} from './one/m.js';\nimport {n} from './two/n.js';\n",
        );
        write(dir.path(), "one/m.js", "import {u} from './util.js';\n");
        write(dir.path(), "two/n.js", "import {u} from './util.js';\n");
        write(dir.path(), "one/util.js", "export function u() {\n}\n");
        write(dir.path(), "two/util.js", "export function u() {\n}\n");

        let mut buffer = String::new();
        let err = JsCompileAggregater::default()
            .aggregate_from_file(&mut buffer, dir.path(), "main.js", &[])
            .unwrap_err();
        assert_eq!(err.code(), ERR_AMBIGUOUS_SPECIFIER);
        match err {
            AggregateError::AmbiguousSpecifier {
                specifier,
                first,
                second,
            } => {
                assert_eq!(specifier, "./util.js");
                assert_eq!(first, "one/util.js");
                assert_eq!(second, "two/util.js");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_class_module_bundle() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "main.js",
            "import {Counter} from './counter.js';\n\
             const c = Counter(2);\n",
        );
        write(
            dir.path(),
            "counter.js",
            "export class Counter {\n\
             \x20   count;\n\
             \x20   constructor(start) {\n\
             \x20       count = start;\n\
             \x20   }\n\
             \x20   next() {\n\
             \x20       return ++count;\n\
             \x20   }\n\
             }\n",
        );

        let mut buffer = String::new();
        JsCompileAggregater::default()
            .aggregate_from_file(&mut buffer, dir.path(), "main.js", &[])
            .unwrap();
        assert!(buffer.contains("const c = mr.get('./counter.js').Counter(2);\n"));
        assert!(buffer.contains("        let count;\n"));
        assert!(buffer.contains("            Counter: Counter,\n"));
        assert!(buffer.contains("            next: next,\n"));
    }

    #[test]
    fn test_default_import_reads_default_property() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "tools.js",
            "export default function doubleIt(n) {\n\
             \x20   return n * 2;\n\
             }\n",
        );
        write(
            dir.path(),
            "index.js",
            "import twice from './tools.js';\n\
             console.log(twice(2));\n",
        );

        let mut buffer = String::new();
        JsCompileAggregater::default()
            .aggregate_from_file(&mut buffer, dir.path(), "index.js", &[])
            .unwrap();
        assert!(buffer.contains("console.log(mr.get('./tools.js').default(2));\n"));
        assert!(!buffer.contains(".twice("));
        assert!(buffer.contains("            doubleIt: doubleIt,\n"));
        assert!(buffer.contains("            default: doubleIt,\n"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(ContentType::from_name("js"), Some(ContentType::Javascript));
        assert_eq!(ContentType::from_name("css"), None);
        assert_eq!(ContentType::Javascript.mime_type(), "text/javascript");
        let aggregater = ContentType::Javascript.aggregater(AggregateOptions::default());
        assert_eq!(aggregater.get_type(), ContentType::Javascript);
    }

    #[test]
    fn test_bootstrap_registry_shape() {
        assert!(MODULE_REGISTRY_JS.contains("class ModuleRegistry"));
        assert!(MODULE_REGISTRY_JS.contains("register(name, factory)"));
        assert!(MODULE_REGISTRY_JS.contains("Module not registered: "));
        assert!(MODULE_REGISTRY_JS.trim_end().ends_with("let mr = new ModuleRegistry();"));
    }
}
