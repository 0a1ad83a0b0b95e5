//! End-to-end tests: source fragments through the parser, matcher and
//! renderer with the built-in catalog.

#[cfg(test)]
mod tests {
    use crate::catalog::{Catalog, RuleSpec};
    use crate::error::TranslateError;
    use crate::loader::catalog_from_json_str;
    use crate::node::NodeKind;
    use crate::translator::{FallbackPolicy, TranslationResult, Translator};

    fn translator() -> Translator {
        Translator::new(Catalog::builtin().unwrap())
    }

    fn translate(fragment: &str) -> String {
        match translator().translate(fragment) {
            TranslationResult::Translated(text) => text,
            TranslationResult::Failed(failure) => {
                panic!("failed to translate {:?}: {}", fragment, failure.error)
            }
        }
    }

    // ============================================================================
    // Records and classes
    // ============================================================================

    #[test]
    fn test_dataclass_with_defaults() {
        let source = r#"
@dataclass
class Config:
    name: str
    retries: int = 3
    parent: Optional[str] = None
"#;
        let expected = "#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub name: String,
    pub retries: i64,
    pub parent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: Default::default(),
            retries: 3,
            parent: None,
        }
    }
}";
        assert_eq!(translate(source), expected);
    }

    #[test]
    fn test_float_defaults_are_float_literals() {
        let source = "@dataclass\nclass P:\n    x: float = 0\n    y: float = 1.5\n";
        let expected = "#[derive(Debug, Clone, PartialEq)]
pub struct P {
    pub x: f64,
    pub y: f64,
}

impl Default for P {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 1.5,
        }
    }
}";
        assert_eq!(translate(source), expected);
    }

    #[test]
    fn test_dataclass_with_methods() {
        let source = r#"
@dataclass
class Point:
    x: float
    y: float

    def norm(self) -> float:
        return (self.x ** 2 + self.y ** 2) ** 0.5
"#;
        let expected = "#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    fn norm(&self) -> f64 {
        todo!()
    }
}";
        assert_eq!(translate(source), expected);
    }

    #[test]
    fn test_interface_with_method_signature() {
        assert_eq!(
            translate("interface Shape { name: string; area(): number }"),
            "#[derive(Debug, Clone, PartialEq)]\npub struct Shape {\n    pub name: String,\n}\n\n\
             impl Shape {\n    fn area(&self) -> f64 {\n        todo!()\n    }\n}"
        );
    }

    #[test]
    fn test_class_field_defaults() {
        let expected = "#[derive(Debug, Clone)]
pub struct Config {
    pub retries: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retries: 3,
        }
    }
}";
        assert_eq!(translate("class Config:\n    retries: int = 3\n"), expected);
    }

    #[test]
    fn test_class_without_methods_is_struct_only() {
        assert_eq!(
            translate("class Settings:\n    name: str\n"),
            "#[derive(Debug, Clone)]\npub struct Settings {\n    pub name: String,\n}"
        );
    }

    #[test]
    fn test_unsupported_member_fails_whole_class() {
        let result = translator().translate("class Config:\n    retries = 3\n");
        assert!(matches!(
            result.failure().unwrap().error,
            TranslateError::Parse(_)
        ));
    }

    #[test]
    fn test_ts_interface() {
        assert_eq!(
            translate("interface Point { x: number; y: number }"),
            "#[derive(Debug, Clone, PartialEq)]\npub struct Point {\n    pub x: f64,\n    pub y: f64,\n}"
        );
    }

    #[test]
    fn test_python_class_with_base() {
        let source = r#"
class Dog(Animal):
    name: str

    def __init__(self, name: str):
        self.name = name

    def speak(self) -> str:
        return "Woof"
"#;
        let expected = "#[derive(Debug, Clone)]
pub struct Dog {
    pub name: String,
}

impl Animal for Dog {
    fn speak(&self) -> String {
        todo!()
    }
}";
        assert_eq!(translate(source), expected);
    }

    #[test]
    fn test_ts_class_with_static_method() {
        let source = r#"
export class Circle extends Shape {
    readonly radius: number;

    area(): number {
        return Math.PI * this.radius ** 2;
    }

    static unit(): Circle {
        return new Circle(1);
    }
}
"#;
        let output = translate(source);
        assert!(output.starts_with("#[derive(Debug, Clone)]\npub struct Circle {\n    pub radius: f64,\n}"));
        assert!(output.contains("impl Shape for Circle {\n    fn area(&self) -> f64 {\n"));
        assert!(output.contains("    fn unit() -> Circle {\n        todo!()\n    }\n}"));
    }

    // ============================================================================
    // Signatures
    // ============================================================================

    #[test]
    fn test_function_signatures() {
        assert_eq!(
            translate("def divide(a: float, b: float) -> float:"),
            "pub fn divide(a: f64, b: f64) -> f64 {\n    todo!()\n}"
        );
        assert_eq!(
            translate("export async function fetchUser(id: number): Promise<User> {"),
            "pub async fn fetch_user(id: f64) -> User {\n    todo!()\n}"
        );
        assert_eq!(
            translate("def log(message: str, level: int | None) -> None:"),
            "pub fn log(message: String, level: Option<i64>) {\n    todo!()\n}"
        );
    }

    // ============================================================================
    // Statements
    // ============================================================================

    #[test]
    fn test_raise_and_throw() {
        assert_eq!(
            translate("raise ValueError(\"Cannot divide by zero\")"),
            "return Err(Error::ValueError(\"Cannot divide by zero\".to_string()));"
        );
        assert_eq!(
            translate("throw new RangeError('out of range');"),
            "return Err(Error::RangeError(\"out of range\".to_string()));"
        );
        assert_eq!(translate("raise"), "return Err(err.into());");
    }

    #[test]
    fn test_escaped_messages_keep_their_meaning() {
        assert_eq!(
            translate(r#"raise ValueError("line1\nline2")"#),
            "return Err(Error::ValueError(\"line1\\nline2\".to_string()));"
        );
        assert_eq!(
            translate(r"raise ValueError('it\'s')"),
            "return Err(Error::ValueError(\"it's\".to_string()));"
        );
        assert_eq!(
            translate(r#"greeting: str = "say \"hi\"""#),
            "let greeting: String = \"say \\\"hi\\\"\".to_string();"
        );
    }

    #[test]
    fn test_comprehensions() {
        assert_eq!(
            translate("[x * 2 for x in values if x > 0]"),
            "values.iter().filter(|x| x > 0).map(|x| x * 2).collect::<Vec<_>>()"
        );
        assert_eq!(
            translate("items.map(item => item.name)"),
            "items.iter().map(|item| item.name).collect::<Vec<_>>()"
        );
    }

    #[test]
    fn test_bindings() {
        assert_eq!(translate("MAX_SIZE: int = 100"), "const MAX_SIZE: i64 = 100;");
        assert_eq!(translate("let count: number = 0;"), "let mut count: f64 = 0.0;");
        assert_eq!(translate("ratio: float = 0.5"), "let ratio: f64 = 0.5;");
        assert_eq!(
            translate("greeting: str = \"hi\""),
            "let greeting: String = \"hi\".to_string();"
        );
        assert_eq!(
            translate("const userIds: string[] = [];"),
            "let user_ids: Vec<String> = Vec::new();"
        );
    }

    // ============================================================================
    // Batches, fallbacks and custom rules
    // ============================================================================

    #[test]
    fn test_batch_with_comment_fallback() {
        let translator = translator().with_fallback(FallbackPolicy::Comment);
        let results = translator.translate_batch(&[
            "dict[str, list[int]]",
            "lambda x: x + 1",
            "tuple[int, str]",
        ]);
        let texts: Vec<_> = results.iter().map(|r| r.text().unwrap()).collect();
        assert_eq!(
            texts,
            vec![
                "HashMap<String, Vec<i64>>",
                "// unsupported: lambda x: x + 1",
                "(i64, String)",
            ]
        );
    }

    #[test]
    fn test_wide_union_fails_with_node() {
        let result = translator().translate("int | str | bytes");
        let failure = result.failure().unwrap();
        assert!(matches!(
            failure.error,
            TranslateError::NoMatch {
                kind: NodeKind::UnionType
            }
        ));
        assert_eq!(failure.node.as_ref().unwrap().text("arity"), Some("3"));
    }

    #[test]
    fn test_custom_rules_shadow_builtin_when_registered_first() {
        let custom = catalog_from_json_str(
            r#"[{ "name": "decimal_type", "kind": "TypeRef",
                  "when": [{ "equals": { "capture": "name", "value": "Decimal" } }],
                  "template": "rust_decimal::Decimal" }]"#,
            "inline",
        )
        .unwrap();
        let mut catalog = custom;
        catalog.extend(Catalog::builtin().unwrap()).unwrap();
        let translator = Translator::new(catalog);
        assert_eq!(
            translator.translate("list[Decimal]").text(),
            Some("Vec<rust_decimal::Decimal>")
        );
    }

    #[test]
    fn test_later_rule_does_not_shadow_builtin() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog
            .register_spec(
                RuleSpec::new(
                    "builder",
                    NodeKind::Record,
                    "impl {{PASCAL:$name}}Builder {\n{{INDENT:$fields}}}",
                )
                .equals("name", "request_options"),
            )
            .unwrap();
        let translator = Translator::new(catalog);
        // record is registered first and wins
        let output = translator
            .translate("type request_options = { timeout: number }")
            .into_result()
            .unwrap();
        assert!(output.starts_with("#[derive(Debug, Clone, PartialEq)]"));
    }
}
