//! Fragment parser
//!
//! Turns one fragment of Python or TypeScript into a [`SourceNode`] tree.
//! Each fragment holds a single construct (a class, a signature, a raise, a
//! comprehension, an annotated binding or a bare type expression). This is a
//! line-oriented recognizer, not a grammar: anything it does not recognize is
//! reported as a parse error so the caller can apply its fallback.

use regex::{Captures as RegexCaptures, Regex};
use std::sync::LazyLock;

use crate::error::{TranslateError, TranslateResult};
use crate::node::{NodeKind, SourceNode};

static PY_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class\s+([A-Za-z_]\w*)\s*(?:\(\s*([A-Za-z_][\w.]*)?\s*\))?\s*:\s*$")
        .expect("valid class pattern")
});
static TS_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:export\s+)?(?:abstract\s+)?class\s+([A-Za-z_]\w*)(?:\s+extends\s+([\w.]+))?(?:\s+implements\s+[\w.,\s]+)?\s*\{",
    )
    .expect("valid class pattern")
});
static TS_INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?(?:interface\s+([A-Za-z_]\w*)|type\s+([A-Za-z_]\w*)\s*=)\s*\{")
        .expect("valid interface pattern")
});
static PY_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(async\s+)?def\s+([A-Za-z_]\w*)\s*\((.*)\)\s*(?:->\s*(.+?))?\s*:?\s*$")
        .expect("valid def pattern")
});
static TS_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:export\s+)?(async\s+)?function\s+([A-Za-z_]\w*)\s*(?:<[^>]*>)?\s*\((.*)\)\s*(?::\s*(.+?))?\s*\{?\s*$",
    )
    .expect("valid function pattern")
});
static TS_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:public|private|protected)\s+)?(static\s+)?(async\s+)?([A-Za-z_]\w*)\s*\((.*)\)\s*(?::\s*(.+?))?\s*\{",
    )
    .expect("valid method pattern")
});
static TS_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:readonly\s+)?([A-Za-z_]\w*)\??\s*(?:<[^>]*>)?\s*\((.*)\)\s*(?::\s*(.+?))?\s*$")
        .expect("valid signature pattern")
});
static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:public|private|protected|readonly)\s+)*([A-Za-z_]\w*)(\?)?\s*:\s*([^=;]+?)\s*(?:=\s*([^;]+?))?\s*[;,]?$",
    )
    .expect("valid field pattern")
});
static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\.\.\.|\*{1,2})?([A-Za-z_]\w*)(\?)?\s*(?::\s*(.+?))?\s*(?:=\s*(.+))?$")
        .expect("valid param pattern")
});
static PY_RAISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^raise(?:\s+([A-Za-z_][\w.]*)(?:\((.*)\))?(?:\s+from\s+\w+)?)?\s*$")
        .expect("valid raise pattern")
});
static TS_THROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^throw\s+(?:new\s+)?([A-Za-z_][\w.]*)\((.*)\)\s*;?$").expect("valid throw pattern")
});
static PY_COMPREHENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\s*(.+?)\s+for\s+([A-Za-z_]\w*)\s+in\s+(.+?)(?:\s+if\s+(.+?))?\s*\]$")
        .expect("valid comprehension pattern")
});
static TS_FILTER_MAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([\w.]+)\.filter\(\s*\(?(\w+)\)?\s*=>\s*(.+?)\)\.map\(\s*\(?(\w+)\)?\s*=>\s*(.+)\)\s*;?$",
    )
    .expect("valid filter/map pattern")
});
static TS_MAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w.]+)\.map\(\s*\(?(\w+)\)?\s*=>\s*(.+)\)\s*;?$").expect("valid map pattern")
});
static TS_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(const|let|var)\s+([A-Za-z_]\w*)\s*:\s*(.+?)(?:\s*=\s*(.+?))?\s*;?$")
        .expect("valid binding pattern")
});
static PY_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_]\w*)\s*:\s*(.+?)(?:\s*=\s*(.+))?$").expect("valid binding pattern")
});
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9][0-9_]*(?:\.[0-9_]+)?(?:[eE][-+]?[0-9]+)?$").expect("valid number pattern")
});

/// Type names that stand for "no value"
const NULL_TYPES: &[&str] = &["None", "null", "undefined", "void", "NoneType"];

/// A parser for single source fragments.
pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            input: input.trim_matches(|c| c == '\n' || c == '\r'),
        }
    }

    pub fn parse(&self) -> TranslateResult<SourceNode> {
        let text = self.input.trim();
        if text.is_empty() {
            return Err(TranslateError::Parse("Empty fragment".to_string()));
        }
        let first_line = text.lines().next().unwrap_or_default().trim();

        if first_line.starts_with('@') || PY_CLASS.is_match(first_line) {
            return parse_python_class(self.input);
        }
        if let Some(caps) = TS_CLASS.captures(first_line) {
            return parse_ts_class(&caps, text);
        }
        if let Some(caps) = TS_INTERFACE.captures(first_line) {
            return parse_ts_record(&caps, text);
        }
        if let Some(caps) = PY_DEF.captures(first_line) {
            return parse_function(&caps);
        }
        if let Some(caps) = TS_FUNCTION.captures(first_line) {
            return parse_function(&caps);
        }
        if text.lines().count() > 1 {
            return Err(unrecognized(text));
        }
        if let Some(node) = parse_raise(text)? {
            return Ok(node);
        }
        if let Some(node) = parse_comprehension(text) {
            return Ok(node);
        }
        if let Some(node) = parse_binding(text)? {
            return Ok(node);
        }
        TypeParser::new(text).parse_complete()
    }
}

/// Parse a fragment into a node tree
pub fn parse_fragment(fragment: &str) -> TranslateResult<SourceNode> {
    Parser::new(fragment).parse()
}

/// Parse a type expression such as `dict[str, list[int]]` or `string | null`
pub fn parse_type(input: &str) -> TranslateResult<SourceNode> {
    TypeParser::new(input.trim()).parse_complete()
}

fn unrecognized(text: &str) -> TranslateError {
    let first_line = text.lines().next().unwrap_or_default();
    TranslateError::Parse(format!("Unrecognized construct: \"{}\"", first_line.trim()))
}

fn group<'t>(caps: &RegexCaptures<'t>, index: usize) -> Option<&'t str> {
    caps.get(index)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn parse_python_class(input: &str) -> TranslateResult<SourceNode> {
    let mut lines = input.lines();
    let mut dataclass = false;
    let header = loop {
        let line = lines
            .next()
            .ok_or_else(|| TranslateError::Parse("Decorator without a class".to_string()))?
            .trim();
        if let Some(decorator) = line.strip_prefix('@') {
            dataclass |= decorator.starts_with("dataclass");
            continue;
        }
        break line;
    };
    let caps = PY_CLASS.captures(header).ok_or_else(|| unrecognized(header))?;
    let name = group(&caps, 1).unwrap_or_default();
    let base = group(&caps, 2).filter(|b| *b != "object");

    let mut fields = Vec::new();
    let mut methods = Vec::new();
    let mut body_indent: Option<usize> = None;
    let mut in_docstring = false;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let current = line.len() - line.trim_start().len();
        let indent = *body_indent.get_or_insert(current);
        let trimmed = line.trim();
        let quotes = trimmed.matches("\"\"\"").count();
        if in_docstring {
            in_docstring = quotes % 2 == 0;
            continue;
        }
        if quotes % 2 == 1 {
            in_docstring = true;
            continue;
        }
        if current != indent || quotes > 0 || is_python_filler(trimmed) {
            continue;
        }
        if let Some(caps) = PY_DEF.captures(trimmed) {
            let method = parse_function(&caps)?;
            if !is_constructor(&method) {
                methods.push(method.with_capture("method", "true"));
            }
        } else if let Some(caps) = FIELD.captures(trimmed) {
            fields.push(parse_field(&caps)?);
        } else {
            return Err(unsupported_member(name, trimmed));
        }
    }

    // A dataclass that inherits keeps its base, so it renders as a class
    let kind = if dataclass && base.is_none() {
        NodeKind::Record
    } else {
        NodeKind::Class
    };
    let node = shape_node(kind, name, fields, methods);
    Ok(match base {
        Some(base) => node.with_capture("base", base),
        None => node,
    })
}

/// Body lines that carry nothing to translate
fn is_python_filler(line: &str) -> bool {
    line == "pass" || line == "..." || line.starts_with('#') || line.starts_with('@')
}

fn is_ts_filler(line: &str) -> bool {
    matches!(line, "}" | "};")
        || line.starts_with("//")
        || line.starts_with("/*")
        || line.starts_with('*')
        || line.starts_with('@')
}

fn unsupported_member(owner: &str, member: &str) -> TranslateError {
    TranslateError::Parse(format!(
        "Unsupported member \"{}\" in \"{}\"",
        member, owner
    ))
}

/// Give a method node its receiver and mark it as a method
fn into_method(mut node: SourceNode, is_static: bool) -> SourceNode {
    if !is_static {
        let params = node.children.entry("params".to_string()).or_default();
        params.insert(
            0,
            SourceNode::new(NodeKind::Param).with_capture("name", "self"),
        );
    }
    node.with_capture("method", "true")
}

fn parse_ts_class(caps: &RegexCaptures, text: &str) -> TranslateResult<SourceNode> {
    let name = group(caps, 1).unwrap_or_default();
    let mut fields = Vec::new();
    let mut methods = Vec::new();
    let mut depth: i32 = 0;
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if i > 0 && depth == 1 && !trimmed.is_empty() && !is_ts_filler(trimmed) {
            if let Some(method) = TS_METHOD.captures(trimmed) {
                let node = parse_function_parts(
                    group(&method, 3).unwrap_or_default(),
                    method.get(2).is_some(),
                    method.get(4).map_or("", |m| m.as_str()),
                    group(&method, 5),
                )?;
                if !is_constructor(&node) {
                    methods.push(into_method(node, method.get(1).is_some()));
                }
            } else if let Some(field) = FIELD.captures(trimmed) {
                fields.push(parse_field(&field)?);
            } else {
                return Err(unsupported_member(name, trimmed));
            }
        }
        depth += brace_delta(trimmed);
    }

    let node = shape_node(NodeKind::Class, name, fields, methods);
    Ok(match group(caps, 2) {
        Some(base) => node.with_capture("base", base),
        None => node,
    })
}

fn parse_ts_record(caps: &RegexCaptures, text: &str) -> TranslateResult<SourceNode> {
    let name = group(caps, 1).or_else(|| group(caps, 2)).unwrap_or_default();
    let open = text.find('{').ok_or_else(|| unrecognized(text))?;
    let close = text.rfind('}').ok_or_else(|| {
        TranslateError::Parse(format!("Unterminated body for \"{}\"", name))
    })?;
    if close < open {
        return Err(TranslateError::Parse(format!(
            "Unterminated body for \"{}\"",
            name
        )));
    }
    let mut fields = Vec::new();
    let mut methods = Vec::new();
    for entry in split_top_level(&text[open + 1..close], &[';', ',', '\n']) {
        if entry.starts_with("//") {
            continue;
        }
        if let Some(field) = FIELD.captures(entry) {
            fields.push(parse_field(&field)?);
        } else if let Some(signature) = TS_SIGNATURE.captures(entry) {
            let node = parse_function_parts(
                group(&signature, 1).unwrap_or_default(),
                false,
                signature.get(2).map_or("", |m| m.as_str()),
                group(&signature, 3),
            )?;
            methods.push(into_method(node, false));
        } else {
            return Err(unsupported_member(name, entry));
        }
    }
    Ok(shape_node(NodeKind::Record, name, fields, methods))
}

/// A record or class node. When any field carries a default, every field
/// gets an initializer so a complete `Default` can be generated.
fn shape_node(
    kind: NodeKind,
    name: &str,
    fields: Vec<(SourceNode, Option<SourceNode>)>,
    methods: Vec<SourceNode>,
) -> SourceNode {
    let has_defaults = fields.iter().any(|(_, default)| default.is_some());
    let mut field_nodes = Vec::with_capacity(fields.len());
    let mut initializers = Vec::new();
    for (field, default) in fields {
        if has_defaults {
            let mut initializer = SourceNode::new(NodeKind::Initializer);
            if let Some(field_name) = field.text("name") {
                initializer = initializer.with_capture("name", field_name);
            }
            if let Some(value) = default {
                initializer = initializer.with_child("value", value);
            }
            initializers.push(initializer);
        }
        field_nodes.push(field);
    }
    let node = SourceNode::new(kind)
        .with_capture("name", name)
        .with_children("fields", field_nodes)
        .with_children("methods", methods);
    if has_defaults {
        node.with_children("initializers", initializers)
    } else {
        node
    }
}

/// A field node and its default value, if any
fn parse_field(caps: &RegexCaptures) -> TranslateResult<(SourceNode, Option<SourceNode>)> {
    let name = group(caps, 1).unwrap_or_default();
    let mut ty = parse_type(group(caps, 3).unwrap_or_default())?;
    if caps.get(2).is_some() {
        ty = make_optional(ty);
    }
    let default = group(caps, 4).map(|value| typed_literal(value, &ty));
    let field = SourceNode::new(NodeKind::Field)
        .with_capture("name", name)
        .with_child("type", ty);
    Ok((field, default))
}

fn parse_function(caps: &RegexCaptures) -> TranslateResult<SourceNode> {
    parse_function_parts(
        group(caps, 2).unwrap_or_default(),
        caps.get(1).is_some(),
        caps.get(3).map_or("", |m| m.as_str()),
        group(caps, 4),
    )
}

fn parse_function_parts(
    name: &str,
    is_async: bool,
    params: &str,
    ret: Option<&str>,
) -> TranslateResult<SourceNode> {
    let mut param_nodes = Vec::new();
    for param in split_top_level(params, &[',']) {
        if param == "*" || param == "/" {
            continue;
        }
        let caps = PARAM
            .captures(param)
            .ok_or_else(|| TranslateError::Parse(format!("Unrecognized parameter \"{}\"", param)))?;
        let mut node =
            SourceNode::new(NodeKind::Param).with_capture("name", group(&caps, 1).unwrap_or_default());
        if let Some(annotation) = group(&caps, 3) {
            let mut ty = parse_type(annotation)?;
            if caps.get(2).is_some() {
                ty = make_optional(ty);
            }
            node = node.with_child("type", ty);
        }
        param_nodes.push(node);
    }

    let mut node = SourceNode::new(NodeKind::Function)
        .with_capture("name", name)
        .with_children("params", param_nodes);
    if is_async {
        node = node.with_capture("async", "true");
    }
    if let Some(ret) = ret {
        let mut ty = parse_type(ret)?;
        if is_async {
            ty = unwrap_promise(ty);
        }
        if !is_unit(&ty) {
            node = node.with_child("ret", ty);
        }
    }
    Ok(node)
}

fn is_constructor(function: &SourceNode) -> bool {
    matches!(function.text("name"), Some("__init__") | Some("constructor"))
}

/// `Promise<T>` and `Awaitable[T]` become `T` for async functions
fn unwrap_promise(ty: SourceNode) -> SourceNode {
    let is_promise = ty.kind == NodeKind::GenericType
        && matches!(ty.text("base"), Some("Promise") | Some("Awaitable"))
        && ty.slot("args").is_some_and(|args| args.len() == 1);
    if !is_promise {
        return ty;
    }
    let mut ty = ty;
    ty.children
        .remove("args")
        .and_then(|mut args| args.pop())
        .unwrap_or(ty)
}

fn is_unit(ty: &SourceNode) -> bool {
    ty.kind == NodeKind::TypeRef && ty.text("name").is_some_and(|name| NULL_TYPES.contains(&name))
}

fn make_optional(ty: SourceNode) -> SourceNode {
    SourceNode::new(NodeKind::UnionType)
        .with_capture("nullable", "true")
        .with_capture("arity", "1")
        .with_child("members", ty)
}

fn parse_raise(text: &str) -> TranslateResult<Option<SourceNode>> {
    let caps = match PY_RAISE.captures(text).or_else(|| TS_THROW.captures(text)) {
        Some(caps) => caps,
        None => return Ok(None),
    };
    let mut node = SourceNode::new(NodeKind::Raise);
    if let Some(exception) = group(&caps, 1) {
        node = node.with_capture("exception", exception.rsplit('.').next().unwrap_or(exception));
    }
    if let Some(argument) = group(&caps, 2) {
        node = match unquote(argument) {
            Some(message) => node.with_capture("message", message),
            None => node.with_capture("argument", argument),
        };
    }
    Ok(Some(node))
}

fn parse_comprehension(text: &str) -> Option<SourceNode> {
    if let Some(caps) = PY_COMPREHENSION.captures(text) {
        let var = group(&caps, 2).unwrap_or_default();
        let mut node = SourceNode::new(NodeKind::Comprehension)
            .with_capture("element", group(&caps, 1).unwrap_or_default())
            .with_capture("var", var)
            .with_capture("iterable", group(&caps, 3).unwrap_or_default());
        if let Some(condition) = group(&caps, 4) {
            node = node
                .with_capture("condition", condition)
                .with_capture("filter_var", var);
        }
        return Some(node);
    }
    if let Some(caps) = TS_FILTER_MAP.captures(text) {
        return Some(
            SourceNode::new(NodeKind::Comprehension)
                .with_capture("iterable", group(&caps, 1).unwrap_or_default())
                .with_capture("filter_var", group(&caps, 2).unwrap_or_default())
                .with_capture("condition", group(&caps, 3).unwrap_or_default())
                .with_capture("var", group(&caps, 4).unwrap_or_default())
                .with_capture("element", group(&caps, 5).unwrap_or_default()),
        );
    }
    TS_MAP.captures(text).map(|caps| {
        SourceNode::new(NodeKind::Comprehension)
            .with_capture("iterable", group(&caps, 1).unwrap_or_default())
            .with_capture("var", group(&caps, 2).unwrap_or_default())
            .with_capture("element", group(&caps, 3).unwrap_or_default())
    })
}

fn parse_binding(text: &str) -> TranslateResult<Option<SourceNode>> {
    let (name, ty, value, mutable) = if let Some(caps) = TS_BINDING.captures(text) {
        let keyword = group(&caps, 1).unwrap_or_default();
        (
            group(&caps, 2).unwrap_or_default(),
            group(&caps, 3).unwrap_or_default(),
            group(&caps, 4),
            keyword != "const",
        )
    } else if let Some(caps) = PY_BINDING.captures(text) {
        (
            group(&caps, 1).unwrap_or_default(),
            group(&caps, 2).unwrap_or_default(),
            group(&caps, 3),
            false,
        )
    } else {
        return Ok(None);
    };

    let ty = parse_type(ty)?;
    let value = value.map(|value| typed_literal(value, &ty));
    let mut node = SourceNode::new(NodeKind::Annotation)
        .with_capture("name", name)
        .with_child("type", ty);
    if let Some(value) = value {
        node = node.with_child("value", value);
    }
    if mutable {
        node = node.with_capture("mutable", "true");
    }
    Ok(Some(node))
}

/// Classify a value expression. `literal` names the class, `value` keeps the source text.
pub fn parse_literal(text: &str) -> SourceNode {
    let text = text.trim().trim_end_matches(';').trim();
    let node = SourceNode::new(NodeKind::Literal).with_capture("value", text);
    let compact = text.replace(' ', "");
    let literal = match text {
        "None" | "null" | "undefined" => "none",
        "True" | "False" | "true" | "false" => "bool",
        "[]" | "list()" => "list",
        "{}" | "dict()" => "dict",
        _ if compact == "field(default_factory=list)" => "list",
        _ if compact == "field(default_factory=dict)" => "dict",
        _ if NUMBER.is_match(text) => "number",
        _ => match unquote(text) {
            Some(inner) => return node.with_capture("literal", "string").with_capture("text", inner),
            None => "expression",
        },
    };
    node.with_capture("literal", literal)
}

/// The value of a single- or double-quoted string literal with its escape
/// sequences decoded. `None` unless `text` is exactly one such literal.
fn unquote(text: &str) -> Option<String> {
    let text = text.trim();
    let quote = text.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let mut value = String::new();
    let mut chars = text[1..].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '0' => value.push('\0'),
                escaped @ ('\\' | '"' | '\'') => value.push(escaped),
                // Unknown escapes stay as written
                other => {
                    value.push('\\');
                    value.push(other);
                }
            },
            c if c == quote => return chars.as_str().is_empty().then_some(value),
            c => value.push(c),
        }
    }
    None
}

/// A value bound to a slot declared as `ty`. Integer literals bound to a
/// float type are marked `expected: float`.
fn typed_literal(text: &str, ty: &SourceNode) -> SourceNode {
    let literal = parse_literal(text);
    let integral = literal.text("literal") == Some("number")
        && literal
            .text("value")
            .is_some_and(|value| !value.contains(['.', 'e', 'E']));
    let float_type = ty.kind == NodeKind::TypeRef
        && matches!(ty.text("name"), Some("float") | Some("number"));
    if integral && float_type {
        literal.with_capture("expected", "float")
    } else {
        literal
    }
}

/// Net change in brace depth over a line
fn brace_delta(line: &str) -> i32 {
    line.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

/// Split on any of `separators` outside brackets and string literals.
/// Empty pieces are dropped.
pub fn split_top_level<'t>(text: &'t str, separators: &[char]) -> Vec<&'t str> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut prev = '\0';
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) => {
                if c == q && prev != '\\' {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' | '`' => quote = Some(c),
                '(' | '[' | '{' | '<' => depth += 1,
                '>' if prev == '=' => {}
                ')' | ']' | '}' | '>' => depth -= 1,
                _ if depth == 0 && separators.contains(&c) => {
                    parts.push(&text[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
        prev = c;
    }
    parts.push(&text[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// A recursive-descent parser for type expressions.
///
/// ```text
/// union   := postfix ('|' postfix)*
/// postfix := primary ('[' ']')*
/// primary := '(' union ')' | name ( '[' args ']' | '<' args '>' )?
/// args    := union (',' union)*
/// ```
struct TypeParser<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> TypeParser<'a> {
    fn new(input: &'a str) -> Self {
        TypeParser { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.consume();
        }
    }

    fn expect(&mut self, expected: char) -> TranslateResult<()> {
        self.skip_whitespace();
        match self.consume() {
            Some(c) if c == expected => Ok(()),
            found => Err(self.error(&format!("Expected '{}', found {:?}", expected, found))),
        }
    }

    fn error(&self, message: &str) -> TranslateError {
        TranslateError::Parse(format!("{} in type \"{}\"", message, self.input))
    }

    fn parse_complete(&mut self) -> TranslateResult<SourceNode> {
        let node = self.parse_union()?;
        self.skip_whitespace();
        if self.position < self.input.len() {
            return Err(unrecognized(self.input));
        }
        Ok(node)
    }

    fn parse_union(&mut self) -> TranslateResult<SourceNode> {
        let mut members = vec![self.parse_postfix()?];
        loop {
            self.skip_whitespace();
            if self.peek() != Some('|') {
                break;
            }
            self.consume();
            members.push(self.parse_postfix()?);
        }
        if members.len() == 1 {
            return Ok(members.remove(0));
        }

        let (nulls, rest): (Vec<SourceNode>, Vec<SourceNode>) =
            members.into_iter().partition(is_unit);
        if rest.is_empty() {
            return Ok(SourceNode::new(NodeKind::TypeRef).with_capture("name", "None"));
        }
        let mut node = SourceNode::new(NodeKind::UnionType)
            .with_capture("arity", rest.len().to_string())
            .with_children("members", rest);
        if !nulls.is_empty() {
            node = node.with_capture("nullable", "true");
        }
        Ok(node)
    }

    fn parse_postfix(&mut self) -> TranslateResult<SourceNode> {
        let mut node = self.parse_primary()?;
        loop {
            self.skip_whitespace();
            if !self.rest().starts_with("[]") {
                break;
            }
            self.position += 2;
            node = SourceNode::new(NodeKind::GenericType)
                .with_capture("base", "Array")
                .with_child("args", node);
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> TranslateResult<SourceNode> {
        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.consume();
            let inner = self.parse_union()?;
            self.expect(')')?;
            return Ok(inner);
        }

        let start = self.position;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.consume();
        }
        let name = &self.input[start..self.position];
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error("Expected a type name"));
        }
        let name = name
            .strip_prefix("typing.")
            .or_else(|| name.strip_prefix("t."))
            .unwrap_or(name);

        self.skip_whitespace();
        let close = match self.peek() {
            Some('[') if !self.rest().starts_with("[]") => ']',
            Some('<') => '>',
            _ => return Ok(SourceNode::new(NodeKind::TypeRef).with_capture("name", name)),
        };
        self.consume();
        let mut args = vec![self.parse_union()?];
        loop {
            self.skip_whitespace();
            if self.peek() != Some(',') {
                break;
            }
            self.consume();
            args.push(self.parse_union()?);
        }
        self.expect(close)?;
        Ok(SourceNode::new(NodeKind::GenericType)
            .with_capture("base", name)
            .with_children("args", args))
    }
}
