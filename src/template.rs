use crate::error::{TranslateError, TranslateResult};
use crate::node::CaptureValue;

/// A transform applied to a capture inside `{{NAME:$capture|arg}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Join a list capture with the argument (default `", "`)
    Join,
    Snake,
    Pascal,
    /// SCREAMING_SNAKE_CASE
    Upper,
    /// Render as an escaped Rust string literal
    Quote,
    /// Put each list item on its own indented line. The argument is the
    /// indentation width (default 4).
    Indent,
}

impl Transform {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "JOIN" => Some(Transform::Join),
            "SNAKE" => Some(Transform::Snake),
            "PASCAL" => Some(Transform::Pascal),
            "UPPER" => Some(Transform::Upper),
            "QUOTE" => Some(Transform::Quote),
            "INDENT" => Some(Transform::Indent),
            _ => None,
        }
    }

    pub fn apply(&self, value: &CaptureValue, arg: Option<&str>) -> String {
        match self {
            Transform::Join => value.joined(arg.unwrap_or(DEFAULT_SEPARATOR)),
            Transform::Snake => to_snake_case(&value.joined(DEFAULT_SEPARATOR)),
            Transform::Pascal => to_pascal_case(&value.joined(DEFAULT_SEPARATOR)),
            Transform::Upper => to_snake_case(&value.joined(DEFAULT_SEPARATOR)).to_uppercase(),
            Transform::Quote => format!("{:?}", value.joined(DEFAULT_SEPARATOR)),
            Transform::Indent => {
                let width = arg.and_then(|a| a.parse::<usize>().ok()).unwrap_or(4);
                indent_lines(value, width)
            }
        }
    }
}

/// Every line of every item, prefixed with `width` spaces and terminated by a
/// newline. Blank lines stay blank; an empty list renders as nothing.
fn indent_lines(value: &CaptureValue, width: usize) -> String {
    let items: Vec<&str> = match value {
        CaptureValue::Text(text) => vec![text.as_str()],
        CaptureValue::List(items) => items.iter().map(String::as_str).collect(),
    };
    let padding = " ".repeat(width);
    let mut result = String::new();
    for line in items.iter().flat_map(|item| item.lines()) {
        if !line.trim().is_empty() {
            result.push_str(&padding);
            result.push_str(line);
        }
        result.push('\n');
    }
    result
}

/// Separator used when a list capture is rendered without an explicit `JOIN`
pub const DEFAULT_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    Text(String),
    Placeholder(String),
    Transform {
        transform: Transform,
        placeholder: String,
        arg: Option<String>,
    },
}

impl TemplateNode {
    pub fn placeholder(&self) -> Option<&str> {
        match self {
            TemplateNode::Text(_) => None,
            TemplateNode::Placeholder(name) => Some(name.as_str()),
            TemplateNode::Transform { placeholder, .. } => Some(placeholder.as_str()),
        }
    }
}

/// A pre-parsed rule template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    nodes: Vec<TemplateNode>,
}

impl Template {
    pub fn parse(source: &str) -> TranslateResult<Self> {
        let nodes = TemplateParser::new(source).parse()?;
        Ok(Template {
            source: source.to_string(),
            nodes,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// Placeholder names in order of first appearance, without duplicates
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.nodes.iter().filter_map(TemplateNode::placeholder) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// A parser for rule templates.
///
/// Recognizes `$name` placeholders, `$$` escapes and `{{NAME:$capture|arg}}`
/// transforms. Everything else is literal target text.
struct TemplateParser<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> TemplateParser<'a> {
    fn new(input: &'a str) -> Self {
        TemplateParser { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Consumes the current character and advances the position.
    fn consume(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn error(&self, message: &str) -> TranslateError {
        TranslateError::Template(format!(
            "{} at offset {} in \"{}\"",
            message, self.position, self.input
        ))
    }

    fn parse_identifier(&mut self) -> String {
        let start = self.position;
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            self.consume();
        }
        self.input[start..self.position].to_string()
    }

    /// Parses `$name`. The caller guarantees an identifier start follows the `$`.
    fn parse_placeholder(&mut self) -> String {
        self.consume(); // Consume '$'
        self.parse_identifier()
    }

    fn parse_transform(&mut self) -> TranslateResult<TemplateNode> {
        self.consume();
        self.consume(); // Consume '{{'

        let name = self.parse_identifier();
        let transform = Transform::from_name(&name)
            .ok_or_else(|| self.error(&format!("Unknown transform '{}'", name)))?;

        if self.consume() != Some(':') {
            return Err(self.error("Expected ':' after transform name"));
        }
        if self.peek() != Some('$') || !self.peek_second().is_some_and(is_identifier_start) {
            return Err(self.error("Expected a $placeholder in transform"));
        }
        let placeholder = self.parse_placeholder();

        let mut arg = None;
        if self.peek() == Some('|') {
            self.consume(); // Consume '|'
            let end = self
                .rest()
                .find("}}")
                .ok_or_else(|| self.error("Unterminated transform"))?;
            arg = Some(self.rest()[..end].to_string());
            self.position += end;
        }

        if transform == Transform::Indent
            && arg.as_deref().is_some_and(|a| a.parse::<usize>().is_err())
        {
            return Err(self.error("INDENT width must be a number"));
        }

        if !self.rest().starts_with("}}") {
            return Err(self.error("Unterminated transform"));
        }
        self.position += 2;

        Ok(TemplateNode::Transform {
            transform,
            placeholder,
            arg,
        })
    }

    fn parse(&mut self) -> TranslateResult<Vec<TemplateNode>> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if self.rest().starts_with("{{") {
                flush_text(&mut text, &mut nodes);
                nodes.push(self.parse_transform()?);
            } else if c == '$' {
                match self.peek_second() {
                    Some('$') => {
                        self.consume();
                        self.consume();
                        text.push('$');
                    }
                    Some(next) if is_identifier_start(next) => {
                        flush_text(&mut text, &mut nodes);
                        let name = self.parse_placeholder();
                        nodes.push(TemplateNode::Placeholder(name));
                    }
                    _ => {
                        self.consume();
                        text.push('$');
                    }
                }
            } else {
                self.consume();
                text.push(c);
            }
        }
        flush_text(&mut text, &mut nodes);
        Ok(nodes)
    }
}

fn flush_text(text: &mut String, nodes: &mut Vec<TemplateNode>) {
    if !text.is_empty() {
        nodes.push(TemplateNode::Text(std::mem::take(text)));
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Split an identifier into lowercase words on `_`, `-` and case boundaries.
///
/// `getHTTPResponse` → `["get", "http", "response"]`
fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub fn to_snake_case(input: &str) -> String {
    split_words(input).join("_")
}

pub fn to_pascal_case(input: &str) -> String {
    split_words(input)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_placeholders_and_text() {
        let template = Template::parse("Vec<$inner>").unwrap();
        assert_eq!(
            template.nodes(),
            &[
                TemplateNode::Text("Vec<".to_string()),
                TemplateNode::Placeholder("inner".to_string()),
                TemplateNode::Text(">".to_string()),
            ]
        );
        assert_eq!(template.placeholders(), vec!["inner"]);
    }

    #[test]
    fn test_dollar_escapes() {
        let template = Template::parse("cost: $$5, $ alone, $1").unwrap();
        assert_eq!(
            template.nodes(),
            &[TemplateNode::Text("cost: $5, $ alone, $1".to_string())]
        );
        assert!(template.placeholders().is_empty());
    }

    #[test]
    fn test_parse_transform_with_arg() {
        let template = Template::parse("struct $name {\n{{JOIN:$fields|\n}}\n}").unwrap();
        assert_eq!(template.nodes().len(), 5);
        assert_eq!(
            template.nodes()[3],
            TemplateNode::Transform {
                transform: Transform::Join,
                placeholder: "fields".to_string(),
                arg: Some("\n".to_string()),
            }
        );
        assert_eq!(template.placeholders(), vec!["name", "fields"]);
    }

    #[test]
    fn test_single_braces_are_text() {
        let template = Template::parse("impl $name { }").unwrap();
        assert_eq!(template.placeholders(), vec!["name"]);
        assert_eq!(template.nodes().last(), Some(&TemplateNode::Text(" { }".to_string())));
    }

    #[test]
    fn test_duplicate_placeholders_listed_once() {
        let template = Template::parse("$a + $b + $a").unwrap();
        assert_eq!(template.placeholders(), vec!["a", "b"]);
    }

    #[test]
    fn test_template_errors() {
        assert!(matches!(
            Template::parse("{{SHOUT:$x}}"),
            Err(TranslateError::Template(_))
        ));
        assert!(matches!(
            Template::parse("{{JOIN:$x|, "),
            Err(TranslateError::Template(_))
        ));
        assert!(matches!(
            Template::parse("{{JOIN:x}}"),
            Err(TranslateError::Template(_))
        ));
        assert!(matches!(
            Template::parse("{{JOIN $x}}"),
            Err(TranslateError::Template(_))
        ));
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_snake_case("getUserName"), "get_user_name");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_pascal_case("user_account"), "UserAccount");
        assert_eq!(to_pascal_case("parseJSON"), "ParseJson");
        assert_eq!(
            Transform::Upper.apply(&CaptureValue::from("maxRetries"), None),
            "MAX_RETRIES"
        );
    }

    #[test]
    fn test_indent_transform() {
        let methods = CaptureValue::List(vec![
            "fn a(&self) {\n    todo!()\n}".to_string(),
            "fn b(&self) {}".to_string(),
        ]);
        assert_eq!(
            Transform::Indent.apply(&methods, None),
            "    fn a(&self) {\n        todo!()\n    }\n    fn b(&self) {}\n"
        );
        assert_eq!(Transform::Indent.apply(&CaptureValue::List(vec![]), None), "");
        assert_eq!(
            Transform::Indent.apply(&CaptureValue::from("x: 1,"), Some("8")),
            "        x: 1,\n"
        );
        assert!(Template::parse("{{INDENT:$body|wide}}").is_err());
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(
            Transform::Quote.apply(&CaptureValue::from("say \"hi\""), None),
            "\"say \\\"hi\\\"\""
        );
    }
}
