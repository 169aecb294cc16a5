// ── Multi-document YAML reader ──
//
// A source is a file, stdin (`-`) or an in-memory string. Documents are
// separated by `---`; empty documents are skipped and do not count
// towards the bulk index. Files are re-read on every decode, stdin is
// buffered on first read and replayed afterwards.

use std::cell::OnceCell;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Stdin,
    Memory(String),
}

impl Source {
    /// Interpret a `--file` argument: `-` is stdin, anything else a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }
}

#[derive(Debug)]
pub struct BulkReader {
    source: Source,
    buffer: OnceCell<String>,
}

impl BulkReader {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            buffer: OnceCell::new(),
        }
    }

    pub fn from_arg(arg: &str) -> Self {
        Self::new(Source::from_arg(arg))
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::new(Source::File(path.as_ref().to_path_buf()))
    }

    pub fn from_string(yaml: impl Into<String>) -> Self {
        Self::new(Source::Memory(yaml.into()))
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    fn read(&self) -> Result<String, CoreError> {
        match &self.source {
            Source::File(path) => std::fs::read_to_string(path)
                .map_err(|e| CoreError::io(format!("reading {}", path.display()), e)),
            Source::Memory(raw) => Ok(raw.clone()),
            Source::Stdin => {
                if let Some(buf) = self.buffer.get() {
                    return Ok(buf.clone());
                }
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| CoreError::io("reading stdin", e))?;
                debug!(bytes = buf.len(), "buffered stdin");
                Ok(self.buffer.get_or_init(|| buf).clone())
            }
        }
    }

    /// All non-empty documents as generic YAML values.
    pub fn values(&self) -> Result<Vec<Value>, CoreError> {
        let raw = self.read()?;
        let mut out = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(&raw) {
            let value = Value::deserialize(doc).map_err(|e| CoreError::Decode {
                index: out.len(),
                message: e.to_string(),
            })?;
            if !value.is_null() {
                out.push(value);
            }
        }
        Ok(out)
    }

    /// Decode every document as `T`.
    pub fn decode_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, CoreError> {
        self.values()?
            .into_iter()
            .enumerate()
            .map(|(index, value)| decode_value(index, value))
            .collect()
    }

    /// Decode the document at `index` as `T`, re-reading the source.
    pub fn decode_at<T: DeserializeOwned>(&self, index: usize) -> Result<T, CoreError> {
        let values = self.values()?;
        let len = values.len();
        let value = values
            .into_iter()
            .nth(index)
            .ok_or(CoreError::IndexOutOfRange { index, len })?;
        decode_value(index, value)
    }

    /// Ids of all documents, read from the first of `fields` that is set.
    /// Fails on the first document without one.
    pub fn ids(&self, fields: &[&str]) -> Result<Vec<String>, CoreError> {
        self.values()?
            .iter()
            .enumerate()
            .map(|(index, value)| {
                id_of(value, fields).ok_or_else(|| CoreError::MissingId {
                    index,
                    field: fields.join(" or "),
                })
            })
            .collect()
    }
}

fn decode_value<T: DeserializeOwned>(index: usize, value: Value) -> Result<T, CoreError> {
    serde_yaml::from_value(value).map_err(|e| CoreError::Decode {
        index,
        message: e.to_string(),
    })
}

/// The id of a document: the first non-empty value among `fields`.
///
/// Fields are dotted paths, so `meta.id` reads `{meta: {id: ..}}`.
pub fn id_of(value: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|path| {
        let found = path
            .split('.')
            .try_fold(value, |v, key| v.get(key))?;
        match found {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    })
}

/// Render items as a `---`-separated YAML stream.
pub fn encode_all<T: Serialize>(items: &[T]) -> Result<String, CoreError> {
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push_str("---\n");
        }
        let doc = serde_yaml::to_string(item).map_err(|e| CoreError::Decode {
            index,
            message: e.to_string(),
        })?;
        out.push_str(&doc);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        id: String,
        #[serde(default)]
        size: u32,
    }

    fn doc(id: &str, size: u32) -> Doc {
        Doc {
            id: id.into(),
            size,
        }
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let docs = vec![doc("a", 1), doc("b", 2), doc("c", 3)];
        let yaml = encode_all(&docs).unwrap();
        let back: Vec<Doc> = BulkReader::from_string(yaml).decode_all().unwrap();
        assert_eq!(back, docs);
    }

    #[test]
    fn empty_input_is_empty_sequence() {
        let reader = BulkReader::from_string("");
        assert!(reader.decode_all::<Doc>().unwrap().is_empty());
    }

    #[test]
    fn null_documents_are_not_counted() {
        let reader = BulkReader::from_string("---\nid: a\n---\n---\nid: b\n---\n");
        let docs: Vec<Doc> = reader.decode_all().unwrap();
        assert_eq!(docs, vec![doc("a", 0), doc("b", 0)]);
        assert_eq!(reader.decode_at::<Doc>(1).unwrap().id, "b");
    }

    #[test]
    fn decode_error_carries_index() {
        let reader = BulkReader::from_string("id: a\n---\nsize: 3\n");
        let err = reader.decode_all::<Doc>().unwrap_err();
        assert!(matches!(err, CoreError::Decode { index: 1, .. }), "{err:?}");
    }

    #[test]
    fn decode_at_past_end_is_out_of_range() {
        let reader = BulkReader::from_string("id: a\n");
        let err = reader.decode_at::<Doc>(1).unwrap_err();
        assert!(matches!(err, CoreError::IndexOutOfRange { index: 1, len: 1 }));
    }

    #[test]
    fn file_is_reread_on_every_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.yaml");
        std::fs::write(&path, "id: a\n").unwrap();
        let reader = BulkReader::file(&path);
        assert_eq!(reader.decode_at::<Doc>(0).unwrap().id, "a");

        std::fs::write(&path, "id: z\n").unwrap();
        assert_eq!(reader.decode_at::<Doc>(0).unwrap().id, "z");
    }

    #[test]
    fn ids_require_the_field() {
        let reader = BulkReader::from_string("id: a\n---\nid: b\n");
        assert_eq!(reader.ids(&["id"]).unwrap(), vec!["a", "b"]);

        let reader = BulkReader::from_string("id: a\n---\nname: nope\n");
        let err = reader.ids(&["id"]).unwrap_err();
        assert!(matches!(err, CoreError::MissingId { index: 1, .. }));
    }

    #[test]
    fn ids_fall_back_to_nested_fields() {
        let reader = BulkReader::from_string("id: ''\nmeta:\n  id: p1\n---\nid: p2\nmeta:\n  id: other\n");
        assert_eq!(reader.ids(&["id", "meta.id"]).unwrap(), vec!["p1", "p2"]);

        let reader = BulkReader::from_string("meta:\n  kind: project\n");
        let err = reader.ids(&["id", "meta.id"]).unwrap_err();
        assert!(
            matches!(&err, CoreError::MissingId { index: 0, field } if field == "id or meta.id"),
            "{err:?}"
        );
    }

    #[test]
    fn numeric_ids_are_rendered() {
        let value: Value = serde_yaml::from_str("rqid: 42\n").unwrap();
        assert_eq!(id_of(&value, &["rqid"]).as_deref(), Some("42"));
    }

    #[test]
    fn dash_means_stdin() {
        assert_eq!(Source::from_arg("-"), Source::Stdin);
        assert_eq!(Source::from_arg("x.yaml"), Source::File("x.yaml".into()));
    }
}
