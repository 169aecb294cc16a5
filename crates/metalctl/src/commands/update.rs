//! `metalctl update`: replace the running binary with the latest release.

use std::io::Write;
use std::path::Path;

use clap::{ArgMatches, Command};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::Config;
use crate::error::CliError;

const LATEST_RELEASE: &str = "https://api.github.com/repos/metal-stack/metalctl/releases/latest";

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

/// Release asset name of this platform, e.g. `metalctl-linux-amd64`.
pub fn asset_name(os: &str, arch: &str) -> String {
    let arch = match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };
    let os = if os == "macos" { "darwin" } else { os };
    let suffix = if os == "windows" { ".exe" } else { "" };
    format!("metalctl-{os}-{arch}{suffix}")
}

/// Numeric components of `v1.2.3`; pre-release suffixes are ignored.
fn version_parts(raw: &str) -> Vec<u64> {
    raw.trim_start_matches('v')
        .split(['-', '+'])
        .next()
        .unwrap_or_default()
        .split('.')
        .map(|p| p.parse().unwrap_or(0))
        .collect()
}

pub fn is_newer(latest: &str, running: &str) -> bool {
    version_parts(latest) > version_parts(running)
}

impl Release {
    fn asset(&self, name: &str) -> Result<&Asset, CliError> {
        self.assets
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| CliError::Update(format!("release {} has no asset {name}", self.tag_name)))
    }
}

pub fn command() -> Command {
    Command::new("update")
        .about("Update metalctl to the latest release")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("check").about("Check whether a newer release exists"))
        .subcommand(Command::new("do").about("Download the latest release and replace this binary"))
}

async fn latest(http: &reqwest::Client) -> Result<Release, CliError> {
    debug!(url = LATEST_RELEASE, "fetching latest release");
    http.get(LATEST_RELEASE)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| CliError::Update(e.to_string()))?
        .json()
        .await
        .map_err(|e| CliError::Update(format!("unexpected release metadata: {e}")))
}

async fn download(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, CliError> {
    debug!(url, "downloading");
    let bytes = http
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| CliError::Update(e.to_string()))?
        .bytes()
        .await
        .map_err(|e| CliError::Update(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Check `binary` against a `<sha256> [name]` checksum file.
pub fn verify_checksum(binary: &[u8], checksum_file: &str) -> Result<(), CliError> {
    let expected = checksum_file
        .split_whitespace()
        .next()
        .ok_or_else(|| CliError::Update("empty checksum file".into()))?;
    let actual = format!("{:x}", Sha256::digest(binary));
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(CliError::Update(format!(
            "checksum mismatch: expected {expected}, got {actual}"
        )))
    }
}

/// Write `content` next to `target` and rename it over `target`.
fn replace_binary(target: &Path, content: &[u8]) -> Result<(), CliError> {
    let dir = target
        .parent()
        .ok_or_else(|| CliError::Update(format!("{} has no parent directory", target.display())))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o755))?;
    }
    tmp.persist(target).map_err(|e| CliError::Io(e.error))?;
    Ok(())
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let running = env!("CARGO_PKG_VERSION");
    let http = Config::transport().build_client()?;
    let release = latest(&http).await?;

    match m.subcommand() {
        Some(("check", _)) => {
            if is_newer(&release.tag_name, running) {
                println!(
                    "metalctl {} is available (running {running}), install it with: metalctl update do",
                    release.tag_name
                );
            } else {
                println!("metalctl {running} is up to date");
            }
            Ok(())
        }
        Some(("do", _)) => {
            if !is_newer(&release.tag_name, running) && !cfg.force() {
                println!("metalctl {running} is up to date");
                return Ok(());
            }
            let name = asset_name(std::env::consts::OS, std::env::consts::ARCH);
            let binary = download(&http, &release.asset(&name)?.browser_download_url).await?;
            let checksum = download(&http, &release.asset(&format!("{name}.sha256"))?.browser_download_url).await?;
            verify_checksum(&binary, &String::from_utf8_lossy(&checksum))?;

            let target = std::env::current_exe()?;
            replace_binary(&target, &binary)?;
            println!("updated {} to {}", target.display(), release.tag_name);
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn newer_versions_compare_numerically() {
        assert!(is_newer("v0.10.0", "0.9.12"));
        assert!(is_newer("v1.0.0", "0.99.0"));
        assert!(!is_newer("v0.9.12", "0.9.12"));
        assert!(!is_newer("v0.9.1-rc.1", "0.9.1"));
    }

    #[test]
    fn asset_names_follow_release_layout() {
        assert_eq!(asset_name("linux", "x86_64"), "metalctl-linux-amd64");
        assert_eq!(asset_name("macos", "aarch64"), "metalctl-darwin-arm64");
        assert_eq!(asset_name("windows", "x86_64"), "metalctl-windows-amd64.exe");
    }

    #[test]
    fn checksums_are_verified() {
        let sum = format!("{:x}  metalctl-linux-amd64\n", Sha256::digest(b"binary"));
        assert!(verify_checksum(b"binary", &sum).is_ok());
        assert!(verify_checksum(b"tampered", &sum).is_err());
        assert!(verify_checksum(b"binary", "").is_err());
    }

    #[test]
    fn binary_is_replaced_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("metalctl");
        std::fs::write(&target, b"old").unwrap();
        replace_binary(&target, b"new").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }
}
