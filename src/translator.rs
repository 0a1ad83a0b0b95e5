//! Fragment translation
//!
//! The translator owns a catalog and drives the other components: it parses
//! a fragment, translates child slots bottom-up, matches the node and renders
//! the chosen rule. Each fragment is independent. A failure in one fragment
//! of a batch never affects the others.
//!
//! # Example
//!
//! ```ignore
//! use pattern_translator::{Catalog, Translator};
//!
//! let translator = Translator::new(Catalog::builtin()?);
//! let result = translator.translate("dict[str, list[int]]");
//! assert_eq!(result.text(), Some("HashMap<String, Vec<i64>>"));
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::{TranslateError, TranslateResult};
use crate::matcher::{Match, Matcher};
use crate::node::{CaptureValue, SourceNode};
use crate::parser::parse_fragment;
use crate::renderer::render;

/// What to emit when a fragment holds a construct the catalog does not cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Report the fragment as failed
    #[default]
    Fail,
    /// Emit the source fragment unchanged
    PassThrough,
    /// Emit the source fragment as `// unsupported:` line comments
    Comment,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(FallbackPolicy::Fail),
            "pass-through" | "passthrough" => Ok(FallbackPolicy::PassThrough),
            "comment" => Ok(FallbackPolicy::Comment),
            _ => Err(format!(
                "Unknown fallback policy '{}' (expected fail, pass-through or comment)",
                s
            )),
        }
    }
}

/// A fragment that could not be translated
#[derive(Debug)]
pub struct Failure {
    pub fragment: String,
    /// The parsed node, when parsing succeeded
    pub node: Option<SourceNode>,
    pub error: TranslateError,
}

/// Outcome of translating one fragment
#[derive(Debug)]
pub enum TranslationResult {
    Translated(String),
    Failed(Failure),
}

impl TranslationResult {
    pub fn is_translated(&self) -> bool {
        matches!(self, TranslationResult::Translated(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            TranslationResult::Translated(text) => Some(text),
            TranslationResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            TranslationResult::Translated(_) => None,
            TranslationResult::Failed(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> TranslateResult<String> {
        match self {
            TranslationResult::Translated(text) => Ok(text),
            TranslationResult::Failed(failure) => Err(failure.error),
        }
    }
}

pub struct Translator {
    catalog: Catalog,
    fallback: FallbackPolicy,
}

impl Translator {
    pub fn new(catalog: Catalog) -> Self {
        Translator {
            catalog,
            fallback: FallbackPolicy::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.catalog)
    }

    /// Translate a node tree.
    ///
    /// Child slots are translated first and bound as list captures under the
    /// slot name, shadowing any capture of the same name. A node without a
    /// matching rule at any depth fails the whole tree.
    pub fn translate_node(&self, node: &SourceNode) -> TranslateResult<String> {
        let Match { rule, mut captures } = self
            .matcher()
            .match_node(node)
            .ok_or(TranslateError::NoMatch { kind: node.kind })?;

        for (slot, children) in &node.children {
            let rendered = children
                .iter()
                .map(|child| self.translate_node(child))
                .collect::<TranslateResult<Vec<_>>>()?;
            captures.insert(slot.clone(), CaptureValue::List(rendered));
        }

        let text = render(rule, &captures)?;
        debug!(rule = rule.name(), kind = %node.kind, "rendered node");
        Ok(text)
    }

    /// Parse and translate one fragment, applying the fallback policy to
    /// unsupported constructs
    pub fn translate(&self, fragment: &str) -> TranslationResult {
        let (node, outcome) = match parse_fragment(fragment) {
            Ok(node) => {
                let outcome = self.translate_node(&node);
                (Some(node), outcome)
            }
            Err(error) => (None, Err(error)),
        };
        self.finish(fragment, node, outcome)
    }

    /// Translate a pre-parsed node, applying the fallback policy on `NoMatch`.
    /// `fragment` is what pass-through and comment fallbacks emit.
    pub fn translate_parsed(&self, fragment: &str, node: SourceNode) -> TranslationResult {
        let outcome = self.translate_node(&node);
        self.finish(fragment, Some(node), outcome)
    }

    /// Translate every fragment independently, preserving order
    pub fn translate_batch<S: AsRef<str>>(&self, fragments: &[S]) -> Vec<TranslationResult> {
        fragments
            .iter()
            .map(|fragment| self.translate(fragment.as_ref()))
            .collect()
    }

    fn finish(
        &self,
        fragment: &str,
        node: Option<SourceNode>,
        outcome: TranslateResult<String>,
    ) -> TranslationResult {
        let error = match outcome {
            Ok(text) => return TranslationResult::Translated(text),
            Err(error) => error,
        };
        if error.is_recoverable() {
            match self.fallback {
                FallbackPolicy::Fail => {}
                FallbackPolicy::PassThrough => {
                    warn!(%error, "passing fragment through untranslated");
                    return TranslationResult::Translated(fragment.to_string());
                }
                FallbackPolicy::Comment => {
                    warn!(%error, "emitting fragment as a comment");
                    return TranslationResult::Translated(comment_out(fragment));
                }
            }
        }
        TranslationResult::Failed(Failure {
            fragment: fragment.to_string(),
            node,
            error,
        })
    }
}

fn comment_out(fragment: &str) -> String {
    fragment
        .trim_matches('\n')
        .lines()
        .map(|line| format!("// unsupported: {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RuleSpec;
    use crate::node::NodeKind;

    fn builtin() -> Translator {
        Translator::new(Catalog::builtin().unwrap())
    }

    #[test]
    fn test_translate_nested_generic() {
        let result = builtin().translate("dict[str, list[int]]");
        assert_eq!(result.text(), Some("HashMap<String, Vec<i64>>"));
    }

    #[test]
    fn test_translate_optional_forms() {
        let translator = builtin();
        assert_eq!(translator.translate("Optional[int]").text(), Some("Option<i64>"));
        assert_eq!(translator.translate("string | null").text(), Some("Option<String>"));
        assert_eq!(
            translator.translate("number | string | undefined").text(),
            Some("Option<Either<f64, String>>")
        );
    }

    #[test]
    fn test_record_scenario() {
        let node = SourceNode::new(NodeKind::Record)
            .with_capture("name", "Point")
            .with_child(
                "fields",
                SourceNode::new(NodeKind::Field).with_capture("name", "x").with_child(
                    "type",
                    SourceNode::new(NodeKind::TypeRef).with_capture("name", "number"),
                ),
            )
            .with_child(
                "fields",
                SourceNode::new(NodeKind::Field).with_capture("name", "y").with_child(
                    "type",
                    SourceNode::new(NodeKind::TypeRef).with_capture("name", "number"),
                ),
            );
        let translator = builtin();
        assert_eq!(
            translator.matcher().match_node(&node).unwrap().rule.name(),
            "record"
        );
        assert_eq!(
            translator.translate_node(&node).unwrap(),
            "#[derive(Debug, Clone, PartialEq)]\npub struct Point {\n    pub x: f64,\n    pub y: f64,\n}"
        );
    }

    #[test]
    fn test_error_result_scenario() {
        let translator = builtin();
        let node = SourceNode::new(NodeKind::Raise)
            .with_capture("exception", "ValueError")
            .with_capture("message", "Cannot divide by zero");
        assert_eq!(
            translator.matcher().match_node(&node).unwrap().rule.name(),
            "error_result"
        );
        let text = translator.translate_node(&node).unwrap();
        assert_eq!(
            text,
            "return Err(Error::ValueError(\"Cannot divide by zero\".to_string()));"
        );
        assert!(text.contains("Cannot divide by zero"));
    }

    #[test]
    fn test_no_match_fails_whole_tree() {
        let translator = builtin();
        let node = SourceNode::new(NodeKind::GenericType)
            .with_capture("base", "list")
            .with_child("args", SourceNode::new(NodeKind::UnionType).with_capture("arity", "3"));
        match translator.translate_node(&node) {
            Err(TranslateError::NoMatch { kind }) => assert_eq!(kind, NodeKind::UnionType),
            other => panic!("Expected NoMatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_capture_ignores_fallback() {
        let mut catalog = Catalog::new();
        catalog
            .register_spec(RuleSpec::new("broken", NodeKind::TypeRef, "$missing"))
            .unwrap();
        let translator = Translator::new(catalog).with_fallback(FallbackPolicy::PassThrough);
        let result = translator.translate("int");
        let failure = result.failure().unwrap();
        assert!(matches!(failure.error, TranslateError::MissingCapture { .. }));
        assert_eq!(failure.node.as_ref().map(|n| n.kind), Some(NodeKind::TypeRef));
    }

    #[test]
    fn test_fallback_policies() {
        let fragment = "print('hello')";
        let failed = builtin().translate(fragment);
        assert!(!failed.is_translated());
        assert!(failed.failure().unwrap().node.is_none());

        let passed = builtin()
            .with_fallback(FallbackPolicy::PassThrough)
            .translate(fragment);
        assert_eq!(passed.text(), Some(fragment));

        let commented = builtin()
            .with_fallback(FallbackPolicy::Comment)
            .translate("for x in xs:\n    print(x)");
        assert_eq!(
            commented.text(),
            Some("// unsupported: for x in xs:\n// unsupported:     print(x)")
        );
    }

    #[test]
    fn test_translate_parsed_node() {
        let node = SourceNode::new(NodeKind::GenericType)
            .with_capture("base", "Set")
            .with_child(
                "args",
                SourceNode::new(NodeKind::TypeRef).with_capture("name", "string"),
            );
        let result = builtin().translate_parsed("Set<string>", node);
        assert_eq!(result.into_result().unwrap(), "HashSet<String>");
    }

    #[test]
    fn test_translate_parsed_applies_fallback() {
        let node = SourceNode::new(NodeKind::UnionType).with_capture("arity", "4");
        let failed = builtin().translate_parsed("a | b | c | d", node.clone());
        let failure = failed.failure().unwrap();
        assert!(matches!(failure.error, TranslateError::NoMatch { .. }));
        assert_eq!(failure.node.as_ref(), Some(&node));

        let passed = builtin()
            .with_fallback(FallbackPolicy::PassThrough)
            .translate_parsed("a | b | c | d", node);
        assert_eq!(passed.text(), Some("a | b | c | d"));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let results = builtin().translate_batch(&["int", "print('x')", "bool"]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text(), Some("i64"));
        assert!(!results[1].is_translated());
        assert_eq!(results[2].text(), Some("bool"));
    }

    #[test]
    fn test_fallback_policy_from_str() {
        assert_eq!("fail".parse::<FallbackPolicy>(), Ok(FallbackPolicy::Fail));
        assert_eq!(
            "pass-through".parse::<FallbackPolicy>(),
            Ok(FallbackPolicy::PassThrough)
        );
        assert_eq!("comment".parse::<FallbackPolicy>(), Ok(FallbackPolicy::Comment));
        assert!("ignore".parse::<FallbackPolicy>().is_err());
    }
}
