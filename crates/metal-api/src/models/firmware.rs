use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Available firmware revisions, nested `kind → vendor → board → revisions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwaresResponse {
    #[serde(default)]
    pub revisions: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>,
}

/// One flattened firmware row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firmware {
    pub kind: String,
    pub vendor: String,
    pub board: String,
    pub revision: String,
}

impl FirmwaresResponse {
    /// Flatten the nested map into rows, ordered by kind, vendor, board, revision.
    pub fn flatten(&self) -> Vec<Firmware> {
        let mut out = Vec::new();
        for (kind, vendors) in &self.revisions {
            for (vendor, boards) in vendors {
                for (board, revisions) in boards {
                    for revision in revisions {
                        out.push(Firmware {
                            kind: kind.clone(),
                            vendor: vendor.clone(),
                            board: board.clone(),
                            revision: revision.clone(),
                        });
                    }
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirmwareFilter {
    pub kind: Option<String>,
    pub vendor: Option<String>,
    pub board: Option<String>,
    pub machineid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_is_sorted_and_complete() {
        let json = r#"{"revisions":{"bios":{"supermicro":{"X11":["2.1","1.0"]}},"bmc":{"dell":{"R6":["3.0"]}}}}"#;
        let parsed: FirmwaresResponse = serde_json::from_str(json).unwrap_or_default();
        let rows = parsed.flatten();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].kind, "bios");
        assert_eq!(rows[0].revision, "2.1");
        assert_eq!(rows[2].kind, "bmc");
    }
}
