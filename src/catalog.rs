use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TranslateError, TranslateResult};
use crate::node::{NodeKind, SourceNode};
use crate::template::Template;

/// A single test over a node's captures or child slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Present(String),
    Absent(String),
    Equals { capture: String, value: String },
    OneOf { capture: String, values: Vec<String> },
    /// The text capture matches a regular expression
    Matches { capture: String, pattern: String },
    /// The slot exists and holds at least one child
    HasChildren(String),
}

/// A condition ready for evaluation. Patterns are compiled once, at rule construction.
#[derive(Debug, Clone)]
enum CompiledCondition {
    Present(String),
    Absent(String),
    Equals(String, String),
    OneOf(String, Vec<String>),
    Matches(String, Regex),
    HasChildren(String),
}

impl CompiledCondition {
    fn compile(rule: &str, condition: Condition) -> TranslateResult<Self> {
        Ok(match condition {
            Condition::Present(capture) => CompiledCondition::Present(capture),
            Condition::Absent(capture) => CompiledCondition::Absent(capture),
            Condition::Equals { capture, value } => CompiledCondition::Equals(capture, value),
            Condition::OneOf { capture, values } => CompiledCondition::OneOf(capture, values),
            Condition::Matches { capture, pattern } => {
                let regex = Regex::new(&pattern).map_err(|e| TranslateError::InvalidPattern {
                    rule: rule.to_string(),
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                CompiledCondition::Matches(capture, regex)
            }
            Condition::HasChildren(slot) => CompiledCondition::HasChildren(slot),
        })
    }

    fn holds(&self, node: &SourceNode) -> bool {
        match self {
            CompiledCondition::Present(capture) => node.capture(capture).is_some(),
            CompiledCondition::Absent(capture) => node.capture(capture).is_none(),
            CompiledCondition::Equals(capture, value) => node.text(capture) == Some(value.as_str()),
            CompiledCondition::OneOf(capture, values) => node
                .text(capture)
                .is_some_and(|text| values.iter().any(|v| v == text)),
            CompiledCondition::Matches(capture, regex) => {
                node.text(capture).is_some_and(|text| regex.is_match(text))
            }
            CompiledCondition::HasChildren(slot) => {
                node.slot(slot).is_some_and(|children| !children.is_empty())
            }
        }
    }
}

/// The trigger predicate of a rule: a node kind plus conditions that must all hold
#[derive(Debug, Clone)]
pub struct Trigger {
    kind: NodeKind,
    conditions: Vec<CompiledCondition>,
}

impl Trigger {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn matches(&self, node: &SourceNode) -> bool {
        node.kind == self.kind && self.conditions.iter().all(|c| c.holds(node))
    }
}

/// Serializable description of a rule, as found in JSON rule files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub when: Vec<Condition>,
    pub template: String,
}

impl RuleSpec {
    pub fn new(name: &str, kind: NodeKind, template: &str) -> Self {
        RuleSpec {
            name: name.to_string(),
            kind,
            when: Vec::new(),
            template: template.to_string(),
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.when.push(condition);
        self
    }

    pub fn present(self, capture: &str) -> Self {
        self.when(Condition::Present(capture.to_string()))
    }

    pub fn absent(self, capture: &str) -> Self {
        self.when(Condition::Absent(capture.to_string()))
    }

    pub fn equals(self, capture: &str, value: &str) -> Self {
        self.when(Condition::Equals {
            capture: capture.to_string(),
            value: value.to_string(),
        })
    }

    pub fn one_of(self, capture: &str, values: &[&str]) -> Self {
        self.when(Condition::OneOf {
            capture: capture.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn matches(self, capture: &str, pattern: &str) -> Self {
        self.when(Condition::Matches {
            capture: capture.to_string(),
            pattern: pattern.to_string(),
        })
    }

    pub fn has_children(self, slot: &str) -> Self {
        self.when(Condition::HasChildren(slot.to_string()))
    }

    /// Compile patterns and parse the template
    pub fn build(self) -> TranslateResult<Rule> {
        // Template errors are reported before pattern errors
        let template = Template::parse(&self.template)?;
        let conditions = self
            .when
            .into_iter()
            .map(|c| CompiledCondition::compile(&self.name, c))
            .collect::<TranslateResult<Vec<_>>>()?;
        Ok(Rule {
            name: self.name,
            trigger: Trigger {
                kind: self.kind,
                conditions,
            },
            template,
        })
    }
}

/// A named mapping from a source construct to a target template
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    trigger: Trigger,
    template: Template,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn applies_to(&self, node: &SourceNode) -> bool {
        self.trigger.matches(node)
    }
}

impl TryFrom<RuleSpec> for Rule {
    type Error = TranslateError;

    fn try_from(spec: RuleSpec) -> TranslateResult<Self> {
        spec.build()
    }
}

/// An ordered collection of rules.
///
/// Insertion order is priority: the matcher returns the first rule whose
/// trigger holds, so specific rules must be registered before the general
/// rules they overlap with.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rules: Vec<Rule>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog { rules: Vec::new() }
    }

    pub fn register(&mut self, rule: Rule) -> TranslateResult<&mut Self> {
        // Names are unique across the whole catalog, including layered rule files
        if self.get(rule.name()).is_some() {
            return Err(TranslateError::DuplicateRuleName(rule.name));
        }
        debug!(rule = rule.name(), position = self.rules.len(), "registered rule");
        self.rules.push(rule);
        Ok(self)
    }

    /// Build and register a rule from its spec
    pub fn register_spec(&mut self, spec: RuleSpec) -> TranslateResult<&mut Self> {
        self.register(spec.build()?)
    }

    /// Append all rules of `other` after the rules already registered
    pub fn extend(&mut self, other: Catalog) -> TranslateResult<&mut Self> {
        for rule in other.rules {
            self.register(rule)?;
        }
        Ok(self)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Position of the named rule in match order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl TryFrom<Vec<RuleSpec>> for Catalog {
    type Error = TranslateError;

    fn try_from(specs: Vec<RuleSpec>) -> TranslateResult<Self> {
        let mut catalog = Catalog::new();
        for spec in specs {
            catalog.register_spec(spec)?;
        }
        Ok(catalog)
    }
}
