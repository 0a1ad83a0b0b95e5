use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The shape of a source construct.
///
/// Rules test these tags directly instead of inspecting runtime types, so
/// duck-typed or inherited source constructs all land on one closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A plain named type: `int`, `string`, `Point`
    TypeRef,
    /// A parameterized type: `list[int]`, `Array<string>`, `string[]`
    GenericType,
    /// A union of types: `int | None`, `string | undefined`
    UnionType,
    Param,
    Function,
    /// A field-only immutable shape: dataclass, interface, object type alias
    Record,
    Field,
    /// One entry of a generated `Default` implementation
    Initializer,
    Literal,
    /// A class, with or without a base class
    Class,
    /// `raise` / `throw`
    Raise,
    /// List comprehension or a `map`/`filter` chain
    Comprehension,
    /// An annotated variable binding
    Annotation,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A captured sub-value of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptureValue {
    Text(String),
    List(Vec<String>),
}

impl CaptureValue {
    /// Text form of the value. Lists are joined with `separator`.
    pub fn joined(&self, separator: &str) -> String {
        match self {
            CaptureValue::Text(text) => text.clone(),
            CaptureValue::List(items) => items.join(separator),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CaptureValue::Text(text) => Some(text.as_str()),
            CaptureValue::List(_) => None,
        }
    }
}

impl From<&str> for CaptureValue {
    fn from(value: &str) -> Self {
        CaptureValue::Text(value.to_string())
    }
}

impl From<String> for CaptureValue {
    fn from(value: String) -> Self {
        CaptureValue::Text(value)
    }
}

impl From<Vec<String>> for CaptureValue {
    fn from(value: Vec<String>) -> Self {
        CaptureValue::List(value)
    }
}

pub type Captures = HashMap<String, CaptureValue>;

/// One unit of parsed input.
///
/// `children` holds ordered slots of sub-nodes (the fields of a record, the
/// parameters of a function, the arguments of a generic type). Slots are
/// translated before their parent and bound as list captures under the slot name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub captures: Captures,
    #[serde(default)]
    pub children: BTreeMap<String, Vec<SourceNode>>,
}

impl SourceNode {
    pub fn new(kind: NodeKind) -> Self {
        SourceNode {
            kind,
            captures: HashMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn with_capture(mut self, name: &str, value: impl Into<CaptureValue>) -> Self {
        self.captures.insert(name.to_string(), value.into());
        self
    }

    /// Append `child` to the slot `slot`, creating the slot if needed
    pub fn with_child(mut self, slot: &str, child: SourceNode) -> Self {
        self.children.entry(slot.to_string()).or_default().push(child);
        self
    }

    /// Set the slot `slot` to `children`. An empty list still creates the slot.
    pub fn with_children(mut self, slot: &str, children: Vec<SourceNode>) -> Self {
        self.children.insert(slot.to_string(), children);
        self
    }

    pub fn capture(&self, name: &str) -> Option<&CaptureValue> {
        self.captures.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.captures.get(name).and_then(CaptureValue::as_text)
    }

    pub fn slot(&self, name: &str) -> Option<&[SourceNode]> {
        self.children.get(name).map(|nodes| nodes.as_slice())
    }

    /// Total number of nodes in this tree, including `self`
    pub fn size(&self) -> usize {
        1 + self
            .children
            .values()
            .flatten()
            .map(SourceNode::size)
            .sum::<usize>()
    }
}
