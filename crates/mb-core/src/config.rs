//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! tool overrides, log location, and the split and encode defaults. Every
//! section defaults sensibly so a completely empty `{}` file is valid.
//! Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::profile::{CodecProfile, H264Settings, Vp8Settings, Vp9Settings};
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    /// Run log location; relative paths resolve against the working directory.
    pub log_file: PathBuf,
    pub split: SplitConfig,
    pub encode: EncodeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: ToolsConfig::default(),
            log_file: PathBuf::from("encodings.log"),
            split: SplitConfig::default(),
            encode: EncodeConfig::default(),
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file. Unlike [`Config::load_or_default`]
    /// a missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.split.extension.is_empty() {
            warnings.push("split.extension is empty; dump files will have no extension".into());
        }

        if self.encode.input_extension.is_empty() {
            warnings.push("encode.input_extension is empty; every file will match".into());
        }

        for profile in self.encode.profiles() {
            if let Err(e) = profile.validate() {
                warnings.push(format!("encode.{}: {e}", profile.name()));
            }
        }

        for (name, path) in [
            ("mplayer_path", &self.tools.mplayer_path),
            ("ffmpeg_path", &self.tools.ffmpeg_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "tools.{name} {} does not exist; falling back to PATH",
                        p.display()
                    ));
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub mplayer_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
}

/// DVD chapter splitting defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Disc mount point or `VIDEO_TS` directory.
    pub device: PathBuf,
    /// Extension of the dumped stream files.
    pub extension: String,
    /// Where dump files go; defaults to the working directory.
    pub out_dir: Option<PathBuf>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("VIDEO_TS"),
            extension: "vob".into(),
            out_dir: None,
        }
    }
}

/// Batch encoding defaults, one settings block per codec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Extension of source files picked up by directory discovery.
    pub input_extension: String,
    /// Search subdirectories as well.
    pub recursive: bool,
    pub vp8: Vp8Settings,
    pub vp9: Vp9Settings,
    pub h264: H264Settings,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            input_extension: "avi".into(),
            recursive: false,
            vp8: Vp8Settings::default(),
            vp9: Vp9Settings::default(),
            h264: H264Settings::default(),
        }
    }
}

impl EncodeConfig {
    /// All configured profiles.
    pub fn profiles(&self) -> [CodecProfile; 3] {
        [
            CodecProfile::Vp8(self.vp8.clone()),
            CodecProfile::Vp9(self.vp9.clone()),
            CodecProfile::H264(self.h264.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.log_file, PathBuf::from("encodings.log"));
        assert_eq!(cfg.split.device, PathBuf::from("VIDEO_TS"));
        assert_eq!(cfg.split.extension, "vob");
        assert_eq!(cfg.encode.input_extension, "avi");
        assert_eq!(cfg.encode.vp9.crf, Some(33));
        assert!(cfg.encode.vp9.filters.enabled);
        assert!(!cfg.encode.vp8.filters.enabled);
    }

    #[test]
    fn default_config_no_warnings() {
        let cfg = Config::default();
        let warnings = cfg.validate();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn parse_json_config() {
        let json = r#"{
            "split": {"device": "/mnt/dvd", "extension": "mpg"},
            "encode": {"vp9": {"crf": 31, "threads": 6, "filters": {"deband": "1.0:16"}}}
        }"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.split.device, PathBuf::from("/mnt/dvd"));
        assert_eq!(cfg.split.extension, "mpg");
        assert_eq!(cfg.encode.vp9.crf, Some(31));
        assert_eq!(cfg.encode.vp9.threads, 6);
        assert_eq!(cfg.encode.vp9.filters.values.deband, "1.0:16");
        assert_eq!(cfg.encode.vp9.filters.values.sharpen, "5:5:1.0:3:3:0.0");
        assert_eq!(cfg.encode.vp9.video_bitrate, "1400K");
    }

    #[test]
    fn null_crf_selects_vod_mode() {
        let cfg = Config::from_json(r#"{"encode": {"vp9": {"crf": null}}}"#).unwrap();
        assert_eq!(cfg.encode.vp9.crf, None);
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.split.extension, "vob");
        assert_eq!(cfg.encode.h264.crf, 23);
    }

    #[test]
    fn malformed_json_is_validation_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.split.extension, "vob");
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/config.json")));
        assert_eq!(cfg.encode.input_extension, "avi");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"log_file": "/tmp/x.log"}"#).unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.log_file, PathBuf::from("/tmp/x.log"));
    }

    #[test]
    fn invalid_profile_warns() {
        let mut cfg = Config::default();
        cfg.encode.h264.crf = 80;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.starts_with("encode.h264")));
    }

    #[test]
    fn missing_tool_override_warns() {
        let mut cfg = Config::default();
        cfg.tools.ffmpeg_path = Some(PathBuf::from("/nonexistent/ffmpeg"));
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("ffmpeg_path")));
    }
}
