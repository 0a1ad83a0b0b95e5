//! Built-in TypeScript/Python to Rust rules
//!
//! Order matters. Each group lists its specific rules first: `optional_type`
//! before `union_type`, `self_param` before `param`, `record_with_defaults`
//! before `record`, and so on. A general rule registered earlier would
//! shadow them.

use crate::catalog::{Catalog, RuleSpec};
use crate::error::TranslateResult;
use crate::node::NodeKind;

const RECORD_DERIVE: &str = "#[derive(Debug, Clone, PartialEq)]";
const CLASS_DERIVE: &str = "#[derive(Debug, Clone)]";
const STRUCT_BODY: &str = "pub struct $name {\n{{INDENT:$fields}}}";
const DEFAULT_IMPL: &str = "impl Default for $name {\n    fn default() -> Self {\n        Self {\n{{INDENT:$initializers|12}}        }\n    }\n}";
const INHERENT_IMPL: &str = "impl $name {\n{{INDENT:$methods}}}";
const TRAIT_IMPL: &str = "impl $base for $name {\n{{INDENT:$methods}}}";

/// A struct definition followed by `impls`, separated by blank lines
fn shape(derive: &str, impls: &[&str]) -> String {
    let mut parts = vec![format!("{}\n{}", derive, STRUCT_BODY)];
    parts.extend(impls.iter().map(|i| i.to_string()));
    parts.join("\n\n")
}

fn type_rules() -> Vec<RuleSpec> {
    use NodeKind::{GenericType, TypeRef, UnionType};
    vec![
        RuleSpec::new("unit_type", TypeRef, "()").one_of(
            "name",
            &["None", "NoneType", "void", "null", "undefined"],
        ),
        RuleSpec::new("float_type", TypeRef, "f64").one_of("name", &["float", "number"]),
        RuleSpec::new("int_type", TypeRef, "i64").one_of("name", &["int", "bigint"]),
        RuleSpec::new("string_type", TypeRef, "String").one_of("name", &["str", "string", "String"]),
        RuleSpec::new("bool_type", TypeRef, "bool").one_of("name", &["bool", "boolean"]),
        RuleSpec::new("bytes_type", TypeRef, "Vec<u8>")
            .one_of("name", &["bytes", "bytearray", "Uint8Array"]),
        RuleSpec::new("dynamic_type", TypeRef, "serde_json::Value")
            .one_of("name", &["Any", "any", "object", "unknown"]),
        RuleSpec::new("named_type", TypeRef, "$name").present("name"),
        RuleSpec::new("option_type", GenericType, "Option<$args>").equals("base", "Optional"),
        RuleSpec::new("vec_type", GenericType, "Vec<$args>").one_of(
            "base",
            &["list", "List", "Array", "ReadonlyArray", "Sequence"],
        ),
        RuleSpec::new("map_type", GenericType, "HashMap<$args>").one_of(
            "base",
            &["dict", "Dict", "Record", "Map", "Mapping"],
        ),
        RuleSpec::new("set_type", GenericType, "HashSet<$args>").one_of(
            "base",
            &["set", "Set", "frozenset", "FrozenSet"],
        ),
        RuleSpec::new("tuple_type", GenericType, "($args)").one_of("base", &["tuple", "Tuple"]),
        RuleSpec::new("generic_type", GenericType, "$base<$args>").present("base"),
        RuleSpec::new("optional_type", UnionType, "Option<$members>")
            .equals("nullable", "true")
            .equals("arity", "1"),
        RuleSpec::new("optional_union_type", UnionType, "Option<Either<$members>>")
            .equals("nullable", "true")
            .equals("arity", "2"),
        RuleSpec::new("union_type", UnionType, "Either<$members>").equals("arity", "2"),
    ]
}

fn literal_rules() -> Vec<RuleSpec> {
    use NodeKind::Literal;
    vec![
        RuleSpec::new("none_literal", Literal, "None").equals("literal", "none"),
        RuleSpec::new("true_literal", Literal, "true")
            .equals("literal", "bool")
            .one_of("value", &["True", "true"]),
        RuleSpec::new("false_literal", Literal, "false").equals("literal", "bool"),
        RuleSpec::new("string_literal", Literal, "{{QUOTE:$text}}.to_string()")
            .equals("literal", "string"),
        RuleSpec::new("empty_list_literal", Literal, "Vec::new()").equals("literal", "list"),
        RuleSpec::new("empty_dict_literal", Literal, "HashMap::new()").equals("literal", "dict"),
        RuleSpec::new("float_literal", Literal, "$value.0")
            .equals("literal", "number")
            .equals("expected", "float"),
        RuleSpec::new("expression", Literal, "$value").present("value"),
    ]
}

fn function_rules() -> Vec<RuleSpec> {
    use NodeKind::{Function, Param};
    vec![
        RuleSpec::new("self_param", Param, "&self").equals("name", "self"),
        RuleSpec::new("param", Param, "{{SNAKE:$name}}: $type").has_children("type"),
        RuleSpec::new("untyped_param", Param, "{{SNAKE:$name}}: serde_json::Value"),
        RuleSpec::new(
            "async_method_with_return",
            Function,
            "async fn {{SNAKE:$name}}($params) -> $ret {\n    todo!()\n}",
        )
        .present("method")
        .present("async")
        .has_children("ret"),
        RuleSpec::new(
            "async_method",
            Function,
            "async fn {{SNAKE:$name}}($params) {\n    todo!()\n}",
        )
        .present("method")
        .present("async"),
        RuleSpec::new(
            "method_with_return",
            Function,
            "fn {{SNAKE:$name}}($params) -> $ret {\n    todo!()\n}",
        )
        .present("method")
        .has_children("ret"),
        RuleSpec::new(
            "method",
            Function,
            "fn {{SNAKE:$name}}($params) {\n    todo!()\n}",
        )
        .present("method"),
        RuleSpec::new(
            "async_function_with_return",
            Function,
            "pub async fn {{SNAKE:$name}}($params) -> $ret {\n    todo!()\n}",
        )
        .present("async")
        .has_children("ret"),
        RuleSpec::new(
            "async_function",
            Function,
            "pub async fn {{SNAKE:$name}}($params) {\n    todo!()\n}",
        )
        .present("async"),
        RuleSpec::new(
            "function_with_return",
            Function,
            "pub fn {{SNAKE:$name}}($params) -> $ret {\n    todo!()\n}",
        )
        .has_children("ret"),
        RuleSpec::new(
            "function",
            Function,
            "pub fn {{SNAKE:$name}}($params) {\n    todo!()\n}",
        ),
    ]
}

fn shape_rules() -> Vec<RuleSpec> {
    use NodeKind::{Class, Field, Initializer, Record};
    vec![
        RuleSpec::new("field", Field, "pub {{SNAKE:$name}}: $type,").has_children("type"),
        RuleSpec::new("initializer_value", Initializer, "{{SNAKE:$name}}: $value,")
            .has_children("value"),
        RuleSpec::new(
            "initializer_default",
            Initializer,
            "{{SNAKE:$name}}: Default::default(),",
        ),
        RuleSpec::new(
            "record_with_defaults_and_methods",
            Record,
            &shape(RECORD_DERIVE, &[DEFAULT_IMPL, INHERENT_IMPL]),
        )
        .has_children("initializers")
        .has_children("methods"),
        RuleSpec::new(
            "record_with_defaults",
            Record,
            &shape(RECORD_DERIVE, &[DEFAULT_IMPL]),
        )
        .has_children("initializers"),
        RuleSpec::new(
            "record_with_methods",
            Record,
            &shape(RECORD_DERIVE, &[INHERENT_IMPL]),
        )
        .has_children("methods"),
        RuleSpec::new("record", Record, &shape(RECORD_DERIVE, &[])),
        RuleSpec::new(
            "class_with_base_and_defaults",
            Class,
            &shape(CLASS_DERIVE, &[DEFAULT_IMPL, TRAIT_IMPL]),
        )
        .present("base")
        .has_children("initializers"),
        RuleSpec::new("class_with_base", Class, &shape(CLASS_DERIVE, &[TRAIT_IMPL]))
            .present("base"),
        RuleSpec::new(
            "class_with_defaults_and_methods",
            Class,
            &shape(CLASS_DERIVE, &[DEFAULT_IMPL, INHERENT_IMPL]),
        )
        .has_children("initializers")
        .has_children("methods"),
        RuleSpec::new(
            "class_with_defaults",
            Class,
            &shape(CLASS_DERIVE, &[DEFAULT_IMPL]),
        )
        .has_children("initializers"),
        RuleSpec::new(
            "class_with_methods",
            Class,
            &shape(CLASS_DERIVE, &[INHERENT_IMPL]),
        )
        .has_children("methods"),
        RuleSpec::new("class", Class, &shape(CLASS_DERIVE, &[])),
    ]
}

fn statement_rules() -> Vec<RuleSpec> {
    use NodeKind::{Annotation, Comprehension, Raise};
    vec![
        RuleSpec::new("bare_raise", Raise, "return Err(err.into());").absent("exception"),
        RuleSpec::new(
            "error_result",
            Raise,
            "return Err(Error::$exception({{QUOTE:$message}}.to_string()));",
        )
        .present("message"),
        RuleSpec::new(
            "error_result_from_value",
            Raise,
            "return Err(Error::$exception($argument.to_string()));",
        )
        .present("argument"),
        RuleSpec::new("error_variant", Raise, "return Err(Error::$exception);"),
        RuleSpec::new(
            "filtered_comprehension",
            Comprehension,
            "$iterable.iter().filter(|$filter_var| $condition).map(|$var| $element).collect::<Vec<_>>()",
        )
        .present("condition"),
        RuleSpec::new(
            "comprehension",
            Comprehension,
            "$iterable.iter().map(|$var| $element).collect::<Vec<_>>()",
        ),
        RuleSpec::new("constant", Annotation, "const $name: $type = $value;")
            .matches("name", "^[A-Z][A-Z0-9_]*$")
            .has_children("value"),
        RuleSpec::new(
            "mutable_binding",
            Annotation,
            "let mut {{SNAKE:$name}}: $type = $value;",
        )
        .present("mutable")
        .has_children("value"),
        RuleSpec::new("binding", Annotation, "let {{SNAKE:$name}}: $type = $value;")
            .has_children("value"),
        RuleSpec::new("declaration", Annotation, "let {{SNAKE:$name}}: $type;"),
    ]
}

/// Every built-in rule, in match order
pub fn builtin_rules() -> Vec<RuleSpec> {
    let mut rules = type_rules();
    rules.extend(literal_rules());
    rules.extend(function_rules());
    rules.extend(shape_rules());
    rules.extend(statement_rules());
    rules
}

impl Catalog {
    /// The built-in rule set
    pub fn builtin() -> TranslateResult<Catalog> {
        Catalog::try_from(builtin_rules())
    }
}
