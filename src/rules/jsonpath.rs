//! JSONPath templates in the Kubernetes style
//!
//! A template mixes literal text with `{...}` expressions, e.g.
//! `{.authentication.anonymous.enabled}` or `{.items[*].metadata.name}`.
//! Missing keys are tolerated: a step that does not apply simply yields no
//! nodes. Every matched leaf of one expression is rendered and joined with a
//! single space.
//!
//! Supported steps: `.name`, `['name']`, `[n]` (negative counts from the end),
//! `[start:end]`, `[*]`, `.*` and recursive descent `..name` / `..*`. A
//! leading `$` is accepted and ignored.

use serde_json::Value;

use crate::error::ExtractError;

/// A parsed JSONPath template
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Expr(Vec<Step>),
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Field(String),
    Index(i64),
    Slice(Option<i64>, Option<i64>),
    Wildcard,
    Descend(Box<Step>),
}

/// Result of evaluating a template against a document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathMatch {
    /// Rendered template output
    pub value: String,
    /// Number of nodes matched across all expressions
    pub matches: usize,
}

impl JsonPath {
    /// Parse a template, failing on malformed expressions
    pub fn parse(template: &str) -> Result<Self, ExtractError> {
        let invalid = |reason: String| ExtractError::InvalidPath {
            expression: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    let mut body = String::new();
                    let mut quote: Option<char> = None;
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        match (quote, c) {
                            (None, '}') => {
                                closed = true;
                                break;
                            }
                            (None, '\'' | '"') => quote = Some(c),
                            (Some(q), c) if c == q => quote = None,
                            _ => {}
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(invalid(format!("unclosed action at offset {offset}")));
                    }
                    let steps = parse_steps(body.trim()).map_err(invalid)?;
                    segments.push(Segment::Expr(steps));
                }
                '}' => return Err(invalid(format!("unexpected '}}' at offset {offset}"))),
                _ => text.push(c),
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate the template against a parsed document
    pub fn evaluate(&self, root: &Value) -> PathMatch {
        let mut result = PathMatch::default();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => result.value.push_str(text),
                Segment::Expr(steps) => {
                    let nodes = select(root, steps);
                    let rendered: Vec<String> = nodes.iter().filter_map(|n| render(n)).collect();
                    result.matches += rendered.len();
                    result.value.push_str(&rendered.join(" "));
                }
            }
        }

        result
    }
}

fn parse_steps(expr: &str) -> Result<Vec<Step>, String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut steps = Vec::new();
    let mut i = 0;

    if chars.first() == Some(&'$') {
        i = 1;
    }

    while i < chars.len() {
        match chars[i] {
            '.' => {
                let recursive = chars.get(i + 1) == Some(&'.');
                i += if recursive { 2 } else { 1 };

                let step = if chars.get(i) == Some(&'*') {
                    i += 1;
                    Step::Wildcard
                } else if chars.get(i) == Some(&'[') && recursive {
                    let (step, next) = parse_bracket(&chars, i)?;
                    i = next;
                    step
                } else {
                    let start = i;
                    while i < chars.len() && !matches!(chars[i], '.' | '[') {
                        i += 1;
                    }
                    let name: String = chars[start..i].iter().collect();
                    if name.is_empty() {
                        if recursive {
                            return Err("recursive descent requires a field name".to_string());
                        }
                        // A bare "." refers to the current node
                        continue;
                    }
                    if name.chars().any(char::is_whitespace) {
                        return Err(format!("invalid field name '{name}'"));
                    }
                    Step::Field(name)
                };

                steps.push(if recursive {
                    Step::Descend(Box::new(step))
                } else {
                    step
                });
            }
            '[' => {
                let (step, next) = parse_bracket(&chars, i)?;
                steps.push(step);
                i = next;
            }
            c => return Err(format!("unrecognized character '{c}' in expression '{expr}'")),
        }
    }

    Ok(steps)
}

/// Parse a `[...]` selector starting at `open`; returns the step and the
/// index just past the closing bracket.
fn parse_bracket(chars: &[char], open: usize) -> Result<(Step, usize), String> {
    let mut i = open + 1;
    let mut quote: Option<char> = None;
    let mut body = String::new();

    loop {
        let Some(&c) = chars.get(i) else {
            return Err("unterminated array index".to_string());
        };
        i += 1;
        match (quote, c) {
            (None, ']') => break,
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
        body.push(c);
    }

    let body = body.trim();
    if body.starts_with('?') {
        return Err("filter expressions are not supported".to_string());
    }
    if body == "*" {
        return Ok((Step::Wildcard, i));
    }
    if body.len() >= 2 {
        let first = body.as_bytes()[0];
        let last = body.as_bytes()[body.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            return Ok((Step::Field(body[1..body.len() - 1].to_string()), i));
        }
    }
    if let Some((start, end)) = body.split_once(':') {
        let bound = |s: &str| -> Result<Option<i64>, String> {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse()
                    .map(Some)
                    .map_err(|_| format!("invalid array slice '{body}'"))
            }
        };
        return Ok((Step::Slice(bound(start)?, bound(end)?), i));
    }

    body.parse::<i64>()
        .map(|n| (Step::Index(n), i))
        .map_err(|_| format!("invalid array index '{body}'"))
}

fn select<'a>(root: &'a Value, steps: &[Step]) -> Vec<&'a Value> {
    let mut nodes = vec![root];
    for step in steps {
        nodes = nodes.into_iter().flat_map(|n| apply(n, step)).collect();
    }
    nodes
}

fn apply<'a>(node: &'a Value, step: &Step) -> Vec<&'a Value> {
    match step {
        Step::Field(name) => node.get(name.as_str()).into_iter().collect(),
        Step::Index(index) => match node {
            Value::Array(items) => resolve_index(*index, items.len())
                .and_then(|i| items.get(i))
                .into_iter()
                .collect(),
            _ => Vec::new(),
        },
        Step::Slice(start, end) => match node {
            Value::Array(items) => {
                let len = items.len();
                let from = start.and_then(|s| clamp_index(s, len)).unwrap_or(0);
                let to = end.and_then(|e| clamp_index(e, len)).unwrap_or(len);
                if from >= to {
                    Vec::new()
                } else {
                    items[from..to].iter().collect()
                }
            }
            _ => Vec::new(),
        },
        Step::Wildcard => match node {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => Vec::new(),
        },
        Step::Descend(inner) => {
            let mut out = Vec::new();
            let mut stack = vec![node];
            while let Some(current) = stack.pop() {
                out.extend(apply(current, inner));
                match current {
                    Value::Array(items) => stack.extend(items.iter().rev()),
                    Value::Object(map) => {
                        let children: Vec<&Value> = map.values().collect();
                        stack.extend(children.into_iter().rev());
                    }
                    _ => {}
                }
            }
            out
        }
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    if index < 0 {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        len.checked_sub(back)
    } else {
        usize::try_from(index).ok()
    }
}

fn clamp_index(index: i64, len: usize) -> Option<usize> {
    if index < 0 {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        Some(len.saturating_sub(back))
    } else {
        usize::try_from(index).ok().map(|i| i.min(len))
    }
}

/// Render a matched node; nulls are treated as absent
fn render(node: &Value) -> Option<String> {
    match node {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(node).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(template: &str, doc: &Value) -> PathMatch {
        JsonPath::parse(template).unwrap().evaluate(doc)
    }

    #[test]
    fn test_nested_field() {
        let doc = json!({"authentication": {"anonymous": {"enabled": false}}});
        let result = eval("{.authentication.anonymous.enabled}", &doc);
        assert_eq!(result.value, "false");
        assert_eq!(result.matches, 1);
    }

    #[test]
    fn test_wildcard_joins_with_space() {
        let doc = json!({"items": [{"name": "a"}, {"name": "b"}, {"other": 1}]});
        let result = eval("{.items[*].name}", &doc);
        assert_eq!(result.value, "a b");
        assert_eq!(result.matches, 2);
    }

    #[test]
    fn test_missing_key_matches_nothing() {
        let doc = json!({"a": {"b": 1}});
        let result = eval("{.a.c.d}", &doc);
        assert_eq!(result.value, "");
        assert_eq!(result.matches, 0);
    }

    #[test]
    fn test_index_and_negative_index() {
        let doc = json!({"list": [10, 20, 30]});
        assert_eq!(eval("{.list[0]}", &doc).value, "10");
        assert_eq!(eval("{.list[-1]}", &doc).value, "30");
        assert_eq!(eval("{.list[5]}", &doc).matches, 0);
        assert_eq!(eval("{.list[1:]}", &doc).value, "20 30");
    }

    #[test]
    fn test_quoted_field_with_dots() {
        let doc = json!({"metadata": {"labels": {"app.kubernetes.io/name": "etcd"}}});
        let result = eval("{.metadata.labels['app.kubernetes.io/name']}", &doc);
        assert_eq!(result.value, "etcd");
    }

    #[test]
    fn test_recursive_descent() {
        let doc = json!({"a": {"port": 1}, "b": [{"port": 2}]});
        let result = eval("{..port}", &doc);
        assert_eq!(result.value, "1 2");
    }

    #[test]
    fn test_literal_text_and_dollar_prefix() {
        let doc = json!({"x": "y"});
        assert_eq!(eval("value={$.x}", &doc).value, "value=y");
    }

    #[test]
    fn test_objects_render_as_json() {
        let doc = json!({"a": {"b": [1, 2]}});
        assert_eq!(eval("{.a.b}", &doc).value, "[1,2]");
    }

    #[test]
    fn test_null_is_absent() {
        let doc = json!({"a": null});
        assert_eq!(eval("{.a}", &doc).matches, 0);
    }

    #[test]
    fn test_malformed_templates_are_errors() {
        assert!(JsonPath::parse("{.a.b").is_err());
        assert!(JsonPath::parse("{.a[0}").is_err());
        assert!(JsonPath::parse("{.a[x]}").is_err());
        assert!(JsonPath::parse("{.a[?(@.b)]}").is_err());
        assert!(JsonPath::parse("{abc}").is_err());
        assert!(JsonPath::parse(".a}").is_err());
    }

    #[test]
    fn test_error_message_names_expression() {
        let err = JsonPath::parse("{.a").unwrap_err();
        assert!(err.to_string().contains("unable to parse path expression \"{.a\""));
    }
}
