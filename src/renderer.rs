use crate::catalog::Rule;
use crate::error::{TranslateError, TranslateResult};
use crate::node::Captures;
use crate::template::{DEFAULT_SEPARATOR, TemplateNode};

/// Substitute `captures` into the template of `rule`.
///
/// Every placeholder is checked before any text is produced, so a missing
/// capture yields `MissingCapture` and no partial output. Rendering does no
/// matching of its own: list captures are expected to hold already
/// translated text.
pub fn render(rule: &Rule, captures: &Captures) -> TranslateResult<String> {
    let template = rule.template();
    if let Some(missing) = template
        .placeholders()
        .into_iter()
        .find(|name| !captures.contains_key(*name))
    {
        return Err(TranslateError::MissingCapture {
            rule: rule.name().to_string(),
            placeholder: missing.to_string(),
        });
    }

    let mut result = String::with_capacity(template.source().len());
    for node in template.nodes() {
        match node {
            TemplateNode::Text(text) => result.push_str(text),
            TemplateNode::Placeholder(name) => {
                if let Some(value) = captures.get(name) {
                    result.push_str(&value.joined(DEFAULT_SEPARATOR));
                }
            }
            TemplateNode::Transform {
                transform,
                placeholder,
                arg,
            } => {
                if let Some(value) = captures.get(placeholder) {
                    result.push_str(&transform.apply(value, arg.as_deref()));
                }
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RuleSpec;
    use crate::node::{CaptureValue, NodeKind};

    fn captures(pairs: &[(&str, CaptureValue)]) -> Captures {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_render_text_and_list() {
        let rule = RuleSpec::new("fn_sig", NodeKind::Function, "fn $name($params) -> $ret")
            .build()
            .unwrap();
        let values = captures(&[
            ("name", "area".into()),
            (
                "params",
                vec!["w: f64".to_string(), "h: f64".to_string()].into(),
            ),
            ("ret", "f64".into()),
        ]);
        assert_eq!(
            render(&rule, &values).unwrap(),
            "fn area(w: f64, h: f64) -> f64"
        );
    }

    #[test]
    fn test_render_transforms() {
        let rule = RuleSpec::new(
            "record",
            NodeKind::Record,
            "pub struct {{PASCAL:$name}} {\n{{JOIN:$fields|\n}}\n}",
        )
        .build()
        .unwrap();
        let values = captures(&[
            ("name", "user_account".into()),
            (
                "fields",
                vec!["    pub id: i64,".to_string(), "    pub name: String,".to_string()].into(),
            ),
        ]);
        assert_eq!(
            render(&rule, &values).unwrap(),
            "pub struct UserAccount {\n    pub id: i64,\n    pub name: String,\n}"
        );
    }

    #[test]
    fn test_missing_capture() {
        let rule = RuleSpec::new("error_result", NodeKind::Raise, "Err($exception($message))")
            .build()
            .unwrap();
        let values = captures(&[("exception", "ValueError".into())]);
        match render(&rule, &values) {
            Err(TranslateError::MissingCapture { rule, placeholder }) => {
                assert_eq!(rule, "error_result");
                assert_eq!(placeholder, "message");
            }
            other => panic!("Expected MissingCapture, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_capture_inside_transform() {
        let rule = RuleSpec::new("quoted", NodeKind::Literal, "{{QUOTE:$value}}")
            .build()
            .unwrap();
        assert!(matches!(
            render(&rule, &Captures::new()),
            Err(TranslateError::MissingCapture { .. })
        ));
    }

    #[test]
    fn test_render_is_deterministic() {
        let rule = RuleSpec::new("option", NodeKind::UnionType, "Option<$inner>")
            .build()
            .unwrap();
        let values = captures(&[("inner", "i64".into())]);
        let first = render(&rule, &values).unwrap();
        let second = render(&rule, &values).unwrap();
        assert_eq!(first, "Option<i64>");
        assert_eq!(first, second);
    }

    #[test]
    fn test_extra_captures_ignored() {
        let rule = RuleSpec::new("unit", NodeKind::TypeRef, "()").build().unwrap();
        let values = captures(&[("name", "None".into())]);
        assert_eq!(render(&rule, &values).unwrap(), "()");
    }
}
