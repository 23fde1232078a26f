//! External tool detection.
//!
//! The [`ToolRegistry`] discovers and caches the locations of `mplayer` and
//! `ffmpeg` and provides lookup methods for the drivers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::command::ToolCommand;

/// The disc reader used for probing and chapter dumps.
pub const MPLAYER: &str = "mplayer";
/// The transcoder used for every encode.
pub const FFMPEG: &str = "ffmpeg";

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &[MPLAYER, FFMPEG];

/// Version detection must not hang `check-tools` on a misbehaving binary.
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of the tool's version banner, if available.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool paths.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, PathBuf>,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// For each known tool, if the config supplies a custom path **and**
    /// that path exists, it is used directly. Otherwise [`which::which`] is
    /// used to locate the tool in `PATH`. Tools that are not found are
    /// omitted from the registry.
    pub fn discover(tools_config: &mb_core::config::ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                MPLAYER => tools_config.mplayer_path.as_deref(),
                FFMPEG => tools_config.ffmpeg_path.as_deref(),
                _ => None,
            };

            let resolved = match custom_path {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!("{name} override {} does not exist; searching PATH", p.display());
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match resolved {
                Some(path) => {
                    tracing::debug!("found {name} at {}", path.display());
                    tools.insert(name.to_string(), path);
                }
                None => tracing::debug!("{name} not found"),
            }
        }

        Self { tools }
    }

    /// Return the path of the given tool, or an [`mb_core::Error::Tool`] if
    /// it was not found during discovery.
    pub fn require(&self, name: &str) -> mb_core::Result<&Path> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| {
                mb_core::Error::tool(name, format!("{name} not found; is it installed and in PATH?"))
            })
    }

    /// Check all known tools and return availability information.
    pub async fn check_all(&self) -> Vec<ToolInfo> {
        let mut infos = Vec::with_capacity(KNOWN_TOOLS.len());
        for &name in KNOWN_TOOLS {
            let info = match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(name, path).await,
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            };
            infos.push(info);
        }
        infos
    }
}

/// Run the tool's version query and return the first non-empty line.
///
/// mplayer has no version flag; it prints its banner on any invocation,
/// including a bare one that exits with the usage text.
async fn detect_version(name: &str, path: &Path) -> Option<String> {
    let mut cmd = ToolCommand::new(path.to_path_buf());
    if name == FFMPEG {
        cmd.arg("-version");
    }
    cmd.timeout(VERSION_TIMEOUT);

    let output = cmd.output().await.ok()?;
    output
        .stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_core::config::ToolsConfig;

    #[test]
    fn discover_with_default_config() {
        let cfg = ToolsConfig::default();
        // We cannot guarantee any tool is installed in CI,
        // but the call itself must not panic.
        let _ = ToolRegistry::discover(&cfg);
    }

    #[test]
    fn require_missing_tool_returns_error() {
        let registry = ToolRegistry::default();
        let err = registry.require(FFMPEG).unwrap_err();
        assert!(err.to_string().contains("ffmpeg not found"));
    }

    #[test]
    fn existing_override_is_used() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let cfg = ToolsConfig {
            mplayer_path: Some(tmp.path().to_path_buf()),
            ffmpeg_path: None,
        };
        let registry = ToolRegistry::discover(&cfg);
        assert_eq!(registry.require(MPLAYER).unwrap(), tmp.path());
    }

    #[tokio::test]
    async fn check_all_returns_known_tools() {
        let registry = ToolRegistry::default();
        let infos = registry.check_all().await;
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["mplayer", "ffmpeg"]);
        assert!(infos.iter().all(|i| !i.available));
    }

    #[test]
    fn tool_info_serialization() {
        let info = ToolInfo {
            name: "ffmpeg".to_string(),
            available: true,
            version: Some("ffmpeg version 6.1".into()),
            path: Some(PathBuf::from("/usr/bin/ffmpeg")),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains(r#""name":"ffmpeg""#));
        assert!(json.contains(r#""available":true"#));
    }
}
