//! The built-in code-generation extension

use indexmap::IndexMap;
use std::sync::Arc;

use crate::extension::{Extension, Filter, Function, Operator};
use crate::filters::{CommentMultiLine, LinePrefix, PadRight, TextTransform, WrapIn};
use crate::functions::{FirstNonEmpty, GetOrDefault, JavadocInline, NewLine};
use crate::operators::StartsWith;

/// Filters, functions and operators used by the code-generation templates
///
/// Tests and global variables are not used and keep their empty defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodegenExtension;

impl Extension for CodegenExtension {
    fn filters(&self) -> IndexMap<&'static str, Arc<dyn Filter>> {
        let filters: [(&'static str, Arc<dyn Filter>); 13] = [
            ("padright", Arc::new(PadRight)),
            ("wrapin", Arc::new(WrapIn)),
            ("lineprefix", Arc::new(LinePrefix)),
            ("commentsingleline", Arc::new(TextTransform::CommentSingleLine)),
            ("commentmultiline", Arc::new(CommentMultiLine)),
            ("escapejavadoc", Arc::new(TextTransform::EscapeJavadoc)),
            ("upperfirst", Arc::new(TextTransform::UpperFirst)),
            ("lowerfirst", Arc::new(TextTransform::LowerFirst)),
            ("pascalcase", Arc::new(TextTransform::PascalCase)),
            ("camelcase", Arc::new(TextTransform::CamelCase)),
            ("snakecase", Arc::new(TextTransform::SnakeCase)),
            ("kebabcase", Arc::new(TextTransform::KebabCase)),
            ("tofilepath", Arc::new(TextTransform::FilePath)),
        ];
        filters.into_iter().collect()
    }

    fn functions(&self) -> IndexMap<&'static str, Arc<dyn Function>> {
        let functions: [(&'static str, Arc<dyn Function>); 4] = [
            ("newline", Arc::new(NewLine)),
            ("getOrDefault", Arc::new(GetOrDefault)),
            ("javadocInline", Arc::new(JavadocInline)),
            ("firstNonEmpty", Arc::new(FirstNonEmpty)),
        ];
        functions.into_iter().collect()
    }

    fn operators(&self) -> Vec<Arc<dyn Operator>> {
        vec![Arc::new(StartsWith)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionRegistry;
    use minijinja::Environment;

    fn env() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_formatter(crate::engine::format_value);
        ExtensionRegistry::codegen().install(&mut env);
        env
    }

    #[test]
    fn test_unused_categories_are_empty() {
        assert!(CodegenExtension.tests().is_empty());
        assert!(CodegenExtension.global_variables().is_empty());
        assert_eq!(CodegenExtension.operators().len(), 1);
    }

    #[test]
    fn test_registered_names() {
        let names = ExtensionRegistry::codegen().names();
        assert!(names.filters.contains(&"padright"));
        assert!(names.filters.contains(&"wrapin"));
        assert!(names.filters.contains(&"lineprefix"));
        assert!(names.functions.contains(&"newline"));
        assert!(names.functions.contains(&"getOrDefault"));
        assert_eq!(names.operators, vec!["startsWith"]);
        assert!(names.tests.is_empty());
    }

    #[test]
    fn test_filters_in_templates() {
        let env = env();
        assert_eq!(
            env.render_str(r#"{{ "id" | padright(5) }}|"#, ()).unwrap(),
            "id   |"
        );
        assert_eq!(
            env.render_str(r#"{{ "id" | padright(width=4, pad="-") }}"#, ()).unwrap(),
            "id--"
        );
        assert_eq!(
            env.render_str(r#"{{ "X" | wrapin("[", "]") }}"#, ()).unwrap(),
            "[X]"
        );
        assert_eq!(
            env.render_str(r#"{{ "a\nb" | lineprefix(">") }}"#, ()).unwrap(),
            ">a\r\n>b\r\n"
        );
        assert_eq!(
            env.render_str(r#"{{ "io.example.api" | tofilepath }}"#, ()).unwrap(),
            "io/example/api"
        );
    }

    #[test]
    fn test_functions_in_templates() {
        let env = env();
        assert_eq!(env.render_str("a{{ newline() }}b", ()).unwrap(), "a\r\nb");
        assert_eq!(
            env.render_str(r#"{{ getOrDefault({"a": 1}, "a", 9) }}"#, ()).unwrap(),
            "1"
        );
        assert_eq!(
            env.render_str(r#"{{ getOrDefault({}, "a", 9) }}"#, ()).unwrap(),
            "9"
        );
        assert_eq!(
            env.render_str(r#"{{ getOrDefault(none, "a", 9) }}"#, ()).unwrap(),
            "9"
        );
        assert_eq!(
            env.render_str(r#"{{ getOrDefault(map=none, key="a", default=9) }}"#, ())
                .unwrap(),
            "9"
        );
    }

    #[test]
    fn test_starts_with_operator() {
        let env = env();
        let tmpl = r#"{% if name is startsWith("he") %}yes{% else %}no{% endif %}"#;
        assert_eq!(env.render_str(tmpl, minijinja::context! { name => "hello" }).unwrap(), "yes");
        assert_eq!(env.render_str(tmpl, minijinja::context! { name => "hi" }).unwrap(), "no");
        assert_eq!(env.render_str(tmpl, minijinja::context! { name => () }).unwrap(), "no");
    }

    #[test]
    fn test_starts_with_combines_with_logic() {
        let env = env();
        let tmpl = r#"{% if a is startsWith("x") and b is startsWith("y") or not c %}t{% else %}f{% endif %}"#;
        let ctx = minijinja::context! { a => "xa", b => "yb", c => true };
        assert_eq!(env.render_str(tmpl, ctx).unwrap(), "t");
        let ctx = minijinja::context! { a => "xa", b => "zb", c => true };
        assert_eq!(env.render_str(tmpl, ctx).unwrap(), "f");
    }

    #[test]
    fn test_starts_with_function_form() {
        let env = env();
        assert_eq!(
            env.render_str(r#"{{ startsWith("hello", "he") }}"#, ()).unwrap(),
            "true"
        );
        assert_eq!(
            env.render_str(r#"{{ startsWith(true, "t") }}"#, ()).unwrap(),
            "true"
        );
        assert_eq!(
            env.render_str(r#"{{ startsWith("a" ~ "b", "ab") }}"#, ()).unwrap(),
            "true"
        );
    }

    #[test]
    fn test_starts_with_binds_to_postfix_operand() {
        let env = env();
        // the test applies to "b" alone and the concatenation wins
        assert_eq!(
            env.render_str(r#"{{ ("a" ~ "b" is startsWith("ab")) is string }}"#, ())
                .unwrap(),
            "true"
        );
        assert_eq!(
            env.render_str(r#"{{ ("a" ~ "b") is startsWith("ab") }}"#, ()).unwrap(),
            "true"
        );
        assert_eq!(
            env.render_str(r#"{{ (1 + 2) is startsWith("3") }}"#, ()).unwrap(),
            "true"
        );
    }

    #[test]
    fn test_booleans_render_lowercase() {
        let env = env();
        assert_eq!(env.render_str(r#"{{ "ab" == "ab" }}"#, ()).unwrap(), "true");
        assert_eq!(env.render_str(r#"{{ true | padright(6, ".") }}"#, ()).unwrap(), "true..");
        assert_eq!(env.render_str(r#"{{ false | wrapin("<", ">") }}"#, ()).unwrap(), "<false>");
    }
}
