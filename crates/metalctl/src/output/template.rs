// Per-element templates with minijinja.
//
// Go-style field access (`{{ .id }}`, `{{ .meta.id }}`) is accepted and
// rewritten to plain minijinja variable access before compiling.

use minijinja::{Environment, Value};

use crate::error::CliError;

/// Render `source` once per element, one line each.
pub(super) fn render(source: &str, elements: &[serde_json::Value]) -> Result<String, CliError> {
    let translated = translate_go_fields(source);
    let mut env = Environment::new();
    env.add_template("line", &translated)?;
    let template = env.get_template("line")?;

    let lines = elements
        .iter()
        .map(|element| template.render(Value::from_serialize(element)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

/// Drop the leading dot of Go template field references inside `{{ }}`.
pub(super) fn translate_go_fields(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        let (before, tag) = rest.split_at(start);
        out.push_str(before);
        let end = tag.find("}}").map_or(tag.len(), |e| e + 2);
        let (expr, after) = tag.split_at(end);
        out.push_str(&strip_field_dots(expr));
        rest = after;
    }
    out.push_str(rest);
    out
}

// A dot starts a field reference when it follows a delimiter and
// precedes an identifier; dots inside paths and numbers stay.
fn strip_field_dots(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len());
    for (i, c) in chars.iter().enumerate() {
        if *c == '.' {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
            let next = chars.get(i + 1).copied();
            let after_delim = prev.is_none_or(|p| p.is_whitespace() || "{(|,-".contains(p));
            let before_ident = next.is_some_and(|n| n.is_alphabetic() || n == '_');
            if after_delim && before_ident {
                continue;
            }
        }
        out.push(*c);
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn go_fields_are_translated() {
        assert_eq!(translate_go_fields("{{ .id }} {{.name}}"), "{{ id }} {{name}}");
        assert_eq!(translate_go_fields("{{ .meta.id }}"), "{{ meta.id }}");
        assert_eq!(translate_go_fields("a.b {{ id }}"), "a.b {{ id }}");
    }

    #[test]
    fn renders_each_element() {
        let elements = vec![json!({"id": "1", "name": "project-1"})];
        let out = render("{{ .id }} {{ .name }}", &elements).unwrap();
        assert_eq!(out, "1 project-1");
    }

    #[test]
    fn native_syntax_still_works() {
        let elements = vec![json!({"tags": ["a", "b"]})];
        let out = render("{{ tags | join(',') }}", &elements).unwrap();
        assert_eq!(out, "a,b");
    }
}
