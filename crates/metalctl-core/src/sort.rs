// ── Sorter registry ──
//
// Each entity registers comparators by lowercase column name. A list of
// keys composes into one stable multi-key sort: the first key that
// differs decides, full ties keep input order.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use crate::error::CoreError;

/// `(a, b, descending) -> Ordering`
pub type Comparator<T> = Box<dyn Fn(&T, &T, bool) -> Ordering + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Parse `col[:asc|:desc|:ascending|:descending]`, case-insensitive.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let (column, direction) = match raw.split_once(':') {
            Some((c, d)) => (c, Some(d)),
            None => (raw, None),
        };
        let column = column.trim().to_lowercase();
        if column.is_empty() {
            return Err(CoreError::InvalidArgument(format!(
                "invalid sort key '{raw}': empty column"
            )));
        }
        let descending = match direction.map(|d| d.trim().to_lowercase()).as_deref() {
            None | Some("asc" | "ascending") => false,
            Some("desc" | "descending") => true,
            Some(other) => {
                return Err(CoreError::InvalidArgument(format!(
                    "invalid sort direction '{other}' in '{raw}', expected asc or desc"
                )));
            }
        };
        Ok(Self { column, descending })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.descending { "desc" } else { "asc" };
        write!(f, "{}:{dir}", self.column)
    }
}

pub struct Sorter<T> {
    fields: BTreeMap<String, Comparator<T>>,
    default_keys: Vec<SortKey>,
}

impl<T> Default for Sorter<T> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
            default_keys: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for Sorter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sorter")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("default_keys", &self.default_keys)
            .finish()
    }
}

impl<T> Sorter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a comparator under `column` (stored lowercase).
    pub fn field(
        mut self,
        column: &str,
        cmp: impl Fn(&T, &T, bool) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(column.to_lowercase(), Box::new(cmp));
        self
    }

    /// Register a column compared by a string projection.
    pub fn str_field(self, column: &str, get: impl Fn(&T) -> &str + Send + Sync + 'static) -> Self {
        self.field(column, move |a, b, desc| cmp_dir(get(a).cmp(get(b)), desc))
    }

    pub fn default_keys(mut self, columns: &[&str]) -> Self {
        self.default_keys = columns.iter().map(|c| SortKey::asc(*c)).collect();
        self
    }

    pub fn available_keys(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Parse CLI keys; an empty list selects the defaults.
    pub fn parse_keys<S: AsRef<str>>(&self, raw: &[S]) -> Result<Vec<SortKey>, CoreError> {
        if raw.is_empty() {
            return Ok(self.default_keys.clone());
        }
        raw.iter()
            .map(|r| {
                let key = SortKey::parse(r.as_ref())?;
                if self.fields.contains_key(&key.column) {
                    Ok(key)
                } else {
                    Err(CoreError::InvalidArgument(format!(
                        "unknown sort column '{}', available: {}",
                        key.column,
                        self.available_keys().join(", ")
                    )))
                }
            })
            .collect()
    }

    /// Stable multi-key sort.
    pub fn sort(&self, items: &mut [T], keys: &[SortKey]) -> Result<(), CoreError> {
        let comparators = keys
            .iter()
            .map(|k| {
                self.fields
                    .get(&k.column)
                    .map(|c| (c, k.descending))
                    .ok_or_else(|| {
                        CoreError::InvalidArgument(format!("unknown sort column '{}'", k.column))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        items.sort_by(|a, b| {
            comparators
                .iter()
                .map(|(cmp, desc)| cmp(a, b, *desc))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Ok(())
    }

    /// Parse then sort; the usual entry point for `--sort-by`.
    pub fn sort_by_args<S: AsRef<str>>(&self, items: &mut [T], raw: &[S]) -> Result<(), CoreError> {
        let keys = self.parse_keys(raw)?;
        self.sort(items, &keys)
    }
}

// ── Comparator helpers ──────────────────────────────────────────────

pub fn cmp_dir(ordering: Ordering, descending: bool) -> Ordering {
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}

pub fn cmp_ord<V: Ord + ?Sized>(a: &V, b: &V, descending: bool) -> Ordering {
    cmp_dir(a.cmp(b), descending)
}

/// Missing values sort last regardless of direction.
pub fn cmp_opt<V: Ord>(a: Option<&V>, b: Option<&V>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp_ord(a, b, descending),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compare IP addresses numerically, falling back to text.
pub fn cmp_ip(a: &str, b: &str, descending: bool) -> Ordering {
    let ordering = match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    };
    cmp_dir(ordering, descending)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: &'static str,
        partition: &'static str,
        n: u32,
    }

    fn sorter() -> Sorter<Row> {
        Sorter::<Row>::new()
            .str_field("id", |r| r.id)
            .str_field("partition", |r| r.partition)
            .field("n", |a, b, d| cmp_ord(&a.n, &b.n, d))
            .default_keys(&["partition", "id"])
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: "c", partition: "p2", n: 1 },
            Row { id: "a", partition: "p1", n: 1 },
            Row { id: "b", partition: "p1", n: 2 },
            Row { id: "d", partition: "p2", n: 2 },
        ]
    }

    fn ids(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn defaults_apply_without_keys() {
        let mut items = rows();
        sorter().sort_by_args::<&str>(&mut items, &[]).unwrap();
        assert_eq!(ids(&items), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn descending_inverts() {
        let mut items = rows();
        sorter().sort_by_args(&mut items, &["id:desc"]).unwrap();
        assert_eq!(ids(&items), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let mut items = rows();
        sorter().sort_by_args(&mut items, &["n"]).unwrap();
        assert_eq!(ids(&items), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn later_keys_break_ties() {
        let mut items = rows();
        sorter()
            .sort_by_args(&mut items, &["N:Descending", "id:ASC"])
            .unwrap();
        assert_eq!(ids(&items), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn sorting_is_deterministic_across_input_orders() {
        let mut forward = rows();
        let mut backward = rows();
        backward.reverse();
        let s = sorter();
        s.sort_by_args(&mut forward, &["partition", "id"]).unwrap();
        s.sort_by_args(&mut backward, &["partition", "id"]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn unknown_column_and_direction_are_rejected() {
        let s = sorter();
        assert!(matches!(
            s.parse_keys(&["bogus"]),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            s.parse_keys(&["id:sideways"]),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn ip_comparison_is_numeric() {
        assert_eq!(cmp_ip("10.0.0.9", "10.0.0.10", false), Ordering::Less);
        assert_eq!(cmp_ip("10.0.0.9", "10.0.0.10", true), Ordering::Greater);
    }

    #[test]
    fn missing_values_sort_last() {
        assert_eq!(cmp_opt(Some(&1), None, true), Ordering::Less);
        assert_eq!(cmp_opt::<u32>(None, Some(&1), false), Ordering::Greater);
    }
}
