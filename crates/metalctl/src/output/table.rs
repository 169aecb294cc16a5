// Table and markdown layout via tabled.

use tabled::builder::Builder;
use tabled::settings::{Padding, Style};

use super::Table;

/// Plain tables are borderless, left-aligned and padded two spaces to the
/// right; trailing whitespace is trimmed from every line.
pub(super) fn render(table: &Table, markdown: bool, no_headers: bool) -> String {
    if table.rows.is_empty() && (no_headers || table.header.is_empty()) {
        return String::new();
    }

    let mut builder = Builder::default();
    if !no_headers {
        builder.push_record(table.header.iter().cloned());
    }
    for row in &table.rows {
        builder.push_record(row.iter().cloned());
    }
    let mut built = builder.build();
    if markdown {
        built.with(Style::markdown());
    } else {
        built.with(Style::empty()).with(Padding::new(0, 2, 0, 0));
    }

    built
        .to_string()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table {
            header: vec!["A".into(), "BB".into()],
            rows: vec![vec!["xxx".into(), "y".into()]],
        }
    }

    #[test]
    fn no_headers_drops_the_first_line() {
        assert_eq!(render(&sample(), false, true), "xxx  y");
    }

    #[test]
    fn empty_table_without_header_is_empty() {
        let empty = Table::default();
        assert_eq!(render(&empty, false, true), "");
    }
}
