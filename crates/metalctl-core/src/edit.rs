// ── Edit flow ──
//
// get -> update request as YAML in a temp file -> editor -> decode -> update.
// The temp file is removed when it goes out of scope, on every path.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::adapter::EntityAdapter;
use crate::bulk::BulkReader;
use crate::error::CoreError;

/// Fetch `id`, let the user edit its update request, and send it back.
///
/// `launch` receives the path of the temp file and must block until the
/// user is done; [`launch_editor`] is the interactive implementation.
pub async fn edit<A, F>(adapter: &A, id: &str, launch: F) -> Result<A::Response, CoreError>
where
    A: EntityAdapter,
    F: FnOnce(&Path) -> Result<(), CoreError>,
{
    let current = adapter.get(id).await?;
    let converted = adapter.convert(&current)?;
    let yaml = serde_yaml::to_string(&converted.update).map_err(|e| CoreError::Decode {
        index: 0,
        message: e.to_string(),
    })?;

    let mut tmp = tempfile::Builder::new()
        .prefix("metalctl")
        .suffix(".yaml")
        .tempfile()
        .map_err(|e| CoreError::io("creating temp file", e))?;
    tmp.write_all(yaml.as_bytes())
        .and_then(|()| tmp.flush())
        .map_err(|e| CoreError::io("writing temp file", e))?;
    debug!(path = %tmp.path().display(), "editing");

    launch(tmp.path())?;

    let update: A::UpdateRequest = BulkReader::file(tmp.path()).decode_at(0)?;
    adapter.update(&update).await
}

/// The editor command line: `$EDITOR` split on whitespace, else `vi`.
pub fn editor_command(editor: Option<&str>) -> Vec<String> {
    let parts: Vec<String> = editor
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_owned)
        .collect();
    if parts.is_empty() {
        vec!["vi".to_owned()]
    } else {
        parts
    }
}

/// Run `$EDITOR` (or `vi`) on `path` with inherited stdio.
pub fn launch_editor(path: &Path) -> Result<(), CoreError> {
    let editor = std::env::var("EDITOR").ok();
    let argv = editor_command(editor.as_deref());
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| CoreError::Editor("no editor configured".into()))?;

    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .map_err(|e| CoreError::Editor(format!("failed to start {program}: {e}")))?;
    if status.success() {
        Ok(())
    } else {
        Err(CoreError::Editor(format!("{program} exited with {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_defaults_to_vi() {
        assert_eq!(editor_command(None), vec!["vi"]);
        assert_eq!(editor_command(Some("  ")), vec!["vi"]);
    }

    #[test]
    fn editor_with_arguments_is_split() {
        assert_eq!(editor_command(Some("code --wait")), vec!["code", "--wait"]);
    }
}
