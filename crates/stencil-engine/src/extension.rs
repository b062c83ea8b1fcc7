//! Extension surface: filters, functions, operators and the registry
//!
//! Every custom operation is a small trait object registered by name. An
//! [`Extension`] groups them by category; the [`ExtensionRegistry`] merges one or
//! more extensions once at engine construction and installs them into each
//! MiniJinja environment the engine creates.
//!
//! MiniJinja has no user-extensible infix grammar, so an [`Operator`] is
//! installed as a *test* (`left is startsWith(right)`) and, unless a function
//! already owns the name, as a function (`startsWith(left, right)`). A test
//! applies to the postfix expression on its left, not to a whole `~` or `+`
//! chain; `not`, `and` and `or` combine its result as usual.

use indexmap::IndexMap;
use minijinja::value::{Kwargs, Rest, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};
use std::sync::Arc;

/// Line terminator emitted by the line-oriented helpers, independent of the host
pub const CANONICAL_LINE_TERMINATOR: &str = "\r\n";

/// A named pipeline transform: `{{ value | name(args) }}`
pub trait Filter: Send + Sync {
    /// Accepted argument names, in positional order
    fn argument_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn apply(&self, input: Value, args: &Arguments) -> Result<Value, Error>;
}

/// A named value producer: `{{ name(args) }}`
pub trait Function: Send + Sync {
    /// Accepted argument names, in positional order
    fn argument_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether surplus positional arguments are collected instead of rejected
    fn variadic(&self) -> bool {
        false
    }

    fn invoke(&self, args: &Arguments) -> Result<Value, Error>;
}

/// A named predicate: `{% if value is name(args) %}`
pub trait Test: Send + Sync {
    fn argument_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn test(&self, input: &Value, args: &Arguments) -> Result<bool, Error>;
}

/// A named binary comparison
///
/// Written `left is symbol(right)` in templates. `is` binds tighter than the
/// arithmetic and `~` operators, so a compound left operand needs parentheses:
/// `(a ~ b) is startsWith(c)`. The function form `symbol(left, right)` needs
/// none.
pub trait Operator: Send + Sync {
    fn symbol(&self) -> &'static str;

    fn evaluate(&self, left: &Value, right: &Value) -> bool;
}

/// One group of extensions
///
/// Every category has an accessor; categories an extension does not use keep
/// the default, an empty container.
pub trait Extension {
    fn filters(&self) -> IndexMap<&'static str, Arc<dyn Filter>> {
        IndexMap::new()
    }

    fn functions(&self) -> IndexMap<&'static str, Arc<dyn Function>> {
        IndexMap::new()
    }

    fn operators(&self) -> Vec<Arc<dyn Operator>> {
        Vec::new()
    }

    fn tests(&self) -> IndexMap<&'static str, Arc<dyn Test>> {
        IndexMap::new()
    }

    fn global_variables(&self) -> IndexMap<&'static str, Value> {
        IndexMap::new()
    }
}

/// Call-site arguments bound to declared names
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    named: IndexMap<&'static str, Value>,
    rest: Vec<Value>,
}

impl Arguments {
    /// Bind positional and keyword arguments against `names`
    ///
    /// Positional argument `i` binds to `names[i]`; keywords bind by name.
    /// Surplus positionals are an error unless `variadic`, in which case they
    /// are kept in [`rest`](Self::rest). Unknown keywords and names bound twice
    /// are errors.
    pub fn bind(
        names: &'static [&'static str],
        variadic: bool,
        positional: &[Value],
        kwargs: &Kwargs,
    ) -> Result<Self, Error> {
        let mut named = IndexMap::new();
        let mut rest = Vec::new();

        for (idx, value) in positional.iter().enumerate() {
            match names.get(idx) {
                Some(name) => {
                    named.insert(*name, value.clone());
                }
                None if variadic => rest.push(value.clone()),
                None => {
                    return Err(Error::new(
                        ErrorKind::TooManyArguments,
                        format!(
                            "expected at most {} argument(s), got {}",
                            names.len(),
                            positional.len()
                        ),
                    ));
                }
            }
        }

        for name in names {
            if let Some(value) = kwargs.get::<Option<Value>>(name)? {
                if named.contains_key(name) {
                    return Err(Error::new(
                        ErrorKind::InvalidOperation,
                        format!("argument `{}` given both by position and by keyword", name),
                    ));
                }
                named.insert(*name, value);
            }
        }
        kwargs.assert_all_used()?;

        Ok(Self { named, rest })
    }

    /// Build directly from name/value pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self {
            named: pairs.into_iter().collect(),
            rest: Vec::new(),
        }
    }

    /// The bound value, if the caller supplied one
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    /// The bound value, or undefined
    pub fn value(&self, name: &str) -> Value {
        self.named.get(name).cloned().unwrap_or(Value::UNDEFINED)
    }

    /// String form of the bound value; `None` when absent or null
    pub fn string(&self, name: &str) -> Option<String> {
        self.named
            .get(name)
            .filter(|v| !is_null(v))
            .map(string_form)
    }

    /// Surplus positional arguments of a variadic call
    pub fn rest(&self) -> &[Value] {
        &self.rest
    }
}

/// True for `none` and undefined
pub fn is_null(value: &Value) -> bool {
    value.is_none() || value.is_undefined()
}

/// The text a value renders as (strings without quotes, booleans lowercase)
pub fn string_form(value: &Value) -> String {
    if let Some(s) = value.as_str() {
        return s.to_string();
    }
    match bool_form(value) {
        Some(b) => b.to_string(),
        None => value.to_string(),
    }
}

/// `"true"`/`"false"` for boolean values
///
/// MiniJinja displays booleans as `True`/`False`; generated code wants the
/// lowercase literals.
pub fn bool_form(value: &Value) -> Option<&'static str> {
    (value.kind() == ValueKind::Bool).then(|| if value.is_true() { "true" } else { "false" })
}

/// Registered names per category, used for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionNames {
    pub filters: Vec<&'static str>,
    pub functions: Vec<&'static str>,
    pub tests: Vec<&'static str>,
    pub operators: Vec<&'static str>,
    pub globals: Vec<&'static str>,
}

/// All extensions known to an engine
///
/// Built once and shared read-only. Names are independent per category: a
/// filter and a function may share a name. Within a category a later
/// registration replaces an earlier one.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    filters: IndexMap<&'static str, Arc<dyn Filter>>,
    functions: IndexMap<&'static str, Arc<dyn Function>>,
    operators: IndexMap<&'static str, Arc<dyn Operator>>,
    tests: IndexMap<&'static str, Arc<dyn Test>>,
    globals: IndexMap<&'static str, Value>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl ExtensionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in code-generation extension
    pub fn codegen() -> Self {
        Self::new().with_extension(&crate::codegen::CodegenExtension)
    }

    /// Add an extension (builder style)
    pub fn with_extension(mut self, extension: &dyn Extension) -> Self {
        self.register(extension);
        self
    }

    /// Merge every category of `extension` into the registry
    pub fn register(&mut self, extension: &dyn Extension) {
        for (name, filter) in extension.filters() {
            if self.filters.insert(name, filter).is_some() {
                tracing::warn!(filter = name, "filter registered twice, keeping the latest");
            }
        }
        for (name, function) in extension.functions() {
            if self.functions.insert(name, function).is_some() {
                tracing::warn!(function = name, "function registered twice, keeping the latest");
            }
        }
        for operator in extension.operators() {
            let symbol = operator.symbol();
            if self.operators.insert(symbol, operator).is_some() {
                tracing::warn!(operator = symbol, "operator registered twice, keeping the latest");
            }
        }
        for (name, test) in extension.tests() {
            if self.tests.insert(name, test).is_some() {
                tracing::warn!(test = name, "test registered twice, keeping the latest");
            }
        }
        for (name, value) in extension.global_variables() {
            self.globals.insert(name, value);
        }
    }

    pub fn filter(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    pub fn operator(&self, symbol: &str) -> Option<&Arc<dyn Operator>> {
        self.operators.get(symbol)
    }

    pub fn names(&self) -> ExtensionNames {
        ExtensionNames {
            filters: self.filters.keys().copied().collect(),
            functions: self.functions.keys().copied().collect(),
            tests: self.tests.keys().copied().collect(),
            operators: self.operators.keys().copied().collect(),
            globals: self.globals.keys().copied().collect(),
        }
    }

    /// Register everything into a MiniJinja environment
    pub fn install(&self, env: &mut Environment<'_>) {
        for (&name, filter) in &self.filters {
            let filter = Arc::clone(filter);
            env.add_filter(
                name,
                move |input: Value, args: Rest<Value>, kwargs: Kwargs| -> Result<Value, Error> {
                    let bound = Arguments::bind(filter.argument_names(), false, &args, &kwargs)?;
                    filter.apply(input, &bound)
                },
            );
        }

        for (&name, test) in &self.tests {
            let test = Arc::clone(test);
            env.add_test(
                name,
                move |input: Value, args: Rest<Value>, kwargs: Kwargs| -> Result<bool, Error> {
                    let bound = Arguments::bind(test.argument_names(), false, &args, &kwargs)?;
                    test.test(&input, &bound)
                },
            );
        }

        for (&symbol, operator) in &self.operators {
            let infix = Arc::clone(operator);
            env.add_test(symbol, move |left: Value, right: Value| -> bool {
                infix.evaluate(&left, &right)
            });

            if !self.functions.contains_key(symbol) {
                let call = Arc::clone(operator);
                env.add_function(symbol, move |left: Value, right: Value| -> bool {
                    call.evaluate(&left, &right)
                });
            }
        }

        for (&name, function) in &self.functions {
            let function = Arc::clone(function);
            env.add_function(
                name,
                move |args: Rest<Value>, kwargs: Kwargs| -> Result<Value, Error> {
                    let bound = Arguments::bind(
                        function.argument_names(),
                        function.variadic(),
                        &args,
                        &kwargs,
                    )?;
                    function.invoke(&bound)
                },
            );
        }

        for (&name, value) in &self.globals {
            env.add_global(name, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    impl Filter for Shout {
        fn argument_names(&self) -> &'static [&'static str] {
            &["suffix"]
        }

        fn apply(&self, input: Value, args: &Arguments) -> Result<Value, Error> {
            let suffix = args.string("suffix").unwrap_or_else(|| "!".to_string());
            Ok(Value::from(format!("{}{}", string_form(&input).to_uppercase(), suffix)))
        }
    }

    struct Answer;

    impl Function for Answer {
        fn invoke(&self, _args: &Arguments) -> Result<Value, Error> {
            Ok(Value::from(42))
        }
    }

    struct ShoutExtension;

    impl Extension for ShoutExtension {
        fn filters(&self) -> IndexMap<&'static str, Arc<dyn Filter>> {
            IndexMap::from([("shout", Arc::new(Shout) as Arc<dyn Filter>)])
        }

        // same name as the filter, different category
        fn functions(&self) -> IndexMap<&'static str, Arc<dyn Function>> {
            IndexMap::from([("shout", Arc::new(Answer) as Arc<dyn Function>)])
        }
    }

    struct EmptyExtension;

    impl Extension for EmptyExtension {}

    fn env_with(registry: &ExtensionRegistry) -> Environment<'static> {
        let mut env = Environment::new();
        registry.install(&mut env);
        env
    }

    #[test]
    fn test_empty_extension_categories() {
        let ext = EmptyExtension;
        assert!(ext.filters().is_empty());
        assert!(ext.functions().is_empty());
        assert!(ext.operators().is_empty());
        assert!(ext.tests().is_empty());
        assert!(ext.global_variables().is_empty());

        let registry = ExtensionRegistry::new().with_extension(&ext);
        assert_eq!(registry.names(), ExtensionNames::default());

        let env = env_with(&registry);
        assert_eq!(env.render_str("ok", ()).unwrap(), "ok");
    }

    #[test]
    fn test_namespaces_are_independent() {
        let registry = ExtensionRegistry::new().with_extension(&ShoutExtension);
        let env = env_with(&registry);

        assert_eq!(env.render_str("{{ 'hi' | shout }}", ()).unwrap(), "HI!");
        assert_eq!(env.render_str("{{ shout() }}", ()).unwrap(), "42");
    }

    #[test]
    fn test_positional_and_keyword_binding() {
        let registry = ExtensionRegistry::new().with_extension(&ShoutExtension);
        let env = env_with(&registry);

        assert_eq!(env.render_str("{{ 'hi' | shout('?') }}", ()).unwrap(), "HI?");
        assert_eq!(
            env.render_str("{{ 'hi' | shout(suffix='.') }}", ()).unwrap(),
            "HI."
        );
    }

    #[test]
    fn test_binding_errors() {
        let registry = ExtensionRegistry::new().with_extension(&ShoutExtension);
        let env = env_with(&registry);

        let err = env.render_str("{{ 'hi' | shout('a', 'b') }}", ()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyArguments);

        assert!(env.render_str("{{ 'hi' | shout(bogus='x') }}", ()).is_err());
        assert!(env.render_str("{{ 'hi' | shout('a', suffix='b') }}", ()).is_err());
    }

    #[test]
    fn test_later_registration_wins() {
        struct Quiet;
        impl Filter for Quiet {
            fn apply(&self, input: Value, _args: &Arguments) -> Result<Value, Error> {
                Ok(Value::from(string_form(&input).to_lowercase()))
            }
        }
        struct QuietExtension;
        impl Extension for QuietExtension {
            fn filters(&self) -> IndexMap<&'static str, Arc<dyn Filter>> {
                IndexMap::from([("shout", Arc::new(Quiet) as Arc<dyn Filter>)])
            }
        }

        let registry = ExtensionRegistry::new()
            .with_extension(&ShoutExtension)
            .with_extension(&QuietExtension);
        let env = env_with(&registry);
        assert_eq!(env.render_str("{{ 'HI' | shout }}", ()).unwrap(), "hi");
        assert_eq!(registry.names().filters, vec!["shout"]);
    }

    #[test]
    fn test_arguments_accessors() {
        let args = Arguments::from_pairs([("a", Value::from(1)), ("b", Value::from(()))]);
        assert_eq!(args.string("a").as_deref(), Some("1"));
        assert!(args.string("b").is_none());
        assert!(args.string("c").is_none());
        assert!(args.value("c").is_undefined());
        assert!(args.get("b").is_some());
        assert!(args.rest().is_empty());
    }

    #[test]
    fn test_string_form() {
        assert_eq!(string_form(&Value::from("x")), "x");
        assert_eq!(string_form(&Value::from(42)), "42");
        assert_eq!(string_form(&Value::from(true)), "true");
        assert_eq!(string_form(&Value::from(false)), "false");
        assert_eq!(bool_form(&Value::from(false)), Some("false"));
        assert_eq!(bool_form(&Value::from(1)), None);
        assert!(is_null(&Value::from(())));
        assert!(is_null(&Value::UNDEFINED));
        assert!(!is_null(&Value::from("")));
    }
}
