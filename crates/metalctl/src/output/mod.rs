//! Output formatting: table, wide, markdown, JSON, YAML, template.
//!
//! Renders payloads in the format selected by `--output-format`. Tables
//! come from per-entity [`TableRow`] impls (or a whole-list [`Tabular`]
//! impl for derived payloads), structured formats marshal the payload
//! as-is via serde, templates are evaluated once per top-level element.

pub mod glyphs;
pub mod humanize;
mod table;
mod template;

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Table traits ─────────────────────────────────────────────────────

/// Header plus rows, ready to be laid out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One entity as one table row. `wide` columns are a superset.
pub trait TableRow {
    fn header(wide: bool) -> Vec<&'static str>;
    fn row(&self, wide: bool, style: &Style) -> Vec<String>;
}

/// A whole payload as a table.
pub trait Tabular {
    fn header_and_rows(&self, wide: bool, style: &Style) -> Table;
}

impl<T: TableRow> Tabular for [T] {
    fn header_and_rows(&self, wide: bool, style: &Style) -> Table {
        Table {
            header: T::header(wide).into_iter().map(str::to_owned).collect(),
            rows: self.iter().map(|item| item.row(wide, style)).collect(),
        }
    }
}

impl<T: TableRow> Tabular for Vec<T> {
    fn header_and_rows(&self, wide: bool, style: &Style) -> Table {
        self.as_slice().header_and_rows(wide, style)
    }
}

// ── Color ────────────────────────────────────────────────────────────

/// Color decision: an explicit override wins, else color on a TTY
/// unless `NO_COLOR` is set.
pub fn should_color(force: Option<bool>) -> bool {
    force.unwrap_or_else(|| io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none())
}

/// ANSI styling for table cells; a no-op when color is off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn is_colored(self) -> bool {
        self.color
    }

    fn paint(self, text: &str, f: impl Fn(&str) -> String) -> String {
        if self.color && !text.is_empty() {
            f(text)
        } else {
            text.to_owned()
        }
    }

    pub fn red(self, text: &str) -> String {
        self.paint(text, |t| t.red().to_string())
    }

    pub fn green(self, text: &str) -> String {
        self.paint(text, |t| t.green().to_string())
    }

    pub fn yellow(self, text: &str) -> String {
        self.paint(text, |t| t.yellow().to_string())
    }

    pub fn bold(self, text: &str) -> String {
        self.paint(text, |t| t.bold().to_string())
    }

    pub fn dimmed(self, text: &str) -> String {
        self.paint(text, |t| t.dimmed().to_string())
    }
}

// ── Printer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub format: OutputFormat,
    pub template: Option<String>,
    pub no_headers: bool,
    pub color: bool,
}

/// Renders payloads according to one [`OutputSpec`]. Owns the color style.
#[derive(Debug, Clone)]
pub struct Printer {
    spec: OutputSpec,
    style: Style,
}

impl Printer {
    pub fn new(spec: OutputSpec) -> Self {
        // markdown and structured formats never carry escape codes
        let style = Style::new(
            spec.color && matches!(spec.format, OutputFormat::Table | OutputFormat::Wide),
        );
        Self { spec, style }
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Render a payload; lists render one row (or template line) per element.
    pub fn render<T: Serialize + Tabular + ?Sized>(&self, data: &T) -> Result<String, CliError> {
        match self.spec.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
            OutputFormat::Table | OutputFormat::Wide | OutputFormat::Markdown => {
                let wide = self.spec.format == OutputFormat::Wide;
                Ok(table::render(
                    &data.header_and_rows(wide, &self.style),
                    self.spec.format == OutputFormat::Markdown,
                    self.spec.no_headers,
                ))
            }
            OutputFormat::Template => {
                let value = serde_json::to_value(data)?;
                let elements = match value {
                    serde_json::Value::Array(items) => items,
                    other => vec![other],
                };
                template::render(self.template()?, &elements)
            }
        }
    }

    /// Render a single entity; structured formats emit the object itself.
    pub fn render_one<T: Serialize + TableRow>(&self, item: &T) -> Result<String, CliError> {
        match self.spec.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(item)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(item)?),
            _ => self.render(std::slice::from_ref(item)),
        }
    }

    pub fn print<T: Serialize + Tabular + ?Sized>(&self, data: &T) -> Result<(), CliError> {
        emit(&self.render(data)?)
    }

    pub fn print_one<T: Serialize + TableRow>(&self, item: &T) -> Result<(), CliError> {
        emit(&self.render_one(item)?)
    }

    fn template(&self) -> Result<&str, CliError> {
        self.spec
            .template
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CliError::validation("template", "-o template requires --template"))
    }
}

/// Write rendered output to stdout with exactly one trailing newline.
pub fn emit(output: &str) -> Result<(), CliError> {
    if output.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", output.trim_end_matches('\n'))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        id: String,
        name: String,
    }

    impl TableRow for Item {
        fn header(wide: bool) -> Vec<&'static str> {
            if wide { vec!["ID", "NAME", "LEN"] } else { vec!["ID", "NAME"] }
        }

        fn row(&self, wide: bool, style: &Style) -> Vec<String> {
            let mut row = vec![Style::bold(*style, &self.id), self.name.clone()];
            if wide {
                row.push(self.name.len().to_string());
            }
            row
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item { id: "1".into(), name: "project-1".into() },
            Item { id: "22".into(), name: "p".into() },
        ]
    }

    fn printer(format: OutputFormat) -> Printer {
        Printer::new(OutputSpec {
            format,
            template: Some("{{ .id }} {{ .name }}".into()),
            no_headers: false,
            color: false,
        })
    }

    #[test]
    fn table_left_aligns_without_borders() {
        let out = printer(OutputFormat::Table).render(&items()).unwrap();
        assert_eq!(out, "ID  NAME\n1   project-1\n22  p");
    }

    #[test]
    fn wide_adds_columns() {
        let out = printer(OutputFormat::Wide).render(&items()).unwrap();
        assert!(out.starts_with("ID  NAME       LEN"), "{out}");
    }

    #[test]
    fn markdown_has_pipes() {
        let out = printer(OutputFormat::Markdown).render(&items()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("| ID"), "{out}");
        assert!(lines[1].starts_with("|-"), "{out}");
    }

    #[test]
    fn template_renders_one_line_per_element() {
        let out = printer(OutputFormat::Template).render(&items()).unwrap();
        assert_eq!(out, "1 project-1\n22 p");
    }

    #[test]
    fn single_item_json_is_an_object() {
        let out = printer(OutputFormat::Json).render_one(&items()[0]).unwrap();
        assert!(out.starts_with('{'));
    }

    #[test]
    fn rendering_is_deterministic() {
        let p = printer(OutputFormat::Yaml);
        assert_eq!(p.render(&items()).unwrap(), p.render(&items()).unwrap());
    }

    #[test]
    fn markdown_is_never_colored() {
        let p = Printer::new(OutputSpec {
            format: OutputFormat::Markdown,
            template: None,
            no_headers: true,
            color: true,
        });
        assert!(!p.style().is_colored());
    }

    #[test]
    fn template_format_needs_a_template() {
        let p = Printer::new(OutputSpec {
            format: OutputFormat::Template,
            template: None,
            no_headers: false,
            color: false,
        });
        assert!(matches!(p.render(&items()), Err(CliError::Validation { .. })));
    }
}
