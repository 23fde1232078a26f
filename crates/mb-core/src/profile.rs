//! Codec profiles: named bundles of encoder parameters.
//!
//! A profile is read-only for the duration of a run. [`CodecProfile::validate`]
//! is called before any command is built so that bad values are rejected up
//! front rather than by ffmpeg halfway through a batch.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::filter::FilterChain;
use crate::{Error, Result};

/// One-pass VP8 (libvpx) / Vorbis WebM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vp8Settings {
    pub video_bitrate: String,
    pub threads: u32,
    pub filters: FilterChain,
}

impl Default for Vp8Settings {
    fn default() -> Self {
        Self {
            video_bitrate: "1M".into(),
            threads: 3,
            filters: FilterChain::disabled(),
        }
    }
}

/// Two-pass constrained-quality VP9 (libvpx-vp9) / Opus WebM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vp9Settings {
    /// Constant quality level (0-63). `None` selects plain bitrate-targeted
    /// VOD settings and omits `-crf`.
    pub crf: Option<u32>,
    pub video_bitrate: String,
    pub audio_bitrate: String,
    pub threads: u32,
    /// Second-pass `-speed`; the first pass always runs at speed 4.
    pub speed: u32,
    pub filters: FilterChain,
}

impl Default for Vp9Settings {
    fn default() -> Self {
        Self {
            crf: Some(33),
            video_bitrate: "1400K".into(),
            audio_bitrate: "64k".into(),
            threads: 4,
            speed: 2,
            filters: FilterChain::default(),
        }
    }
}

/// One-pass H.264 (libx264) / AAC MP4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct H264Settings {
    pub crf: u32,
    pub preset: String,
    pub audio_bitrate: String,
    pub threads: u32,
    pub filters: FilterChain,
}

impl Default for H264Settings {
    fn default() -> Self {
        Self {
            crf: 23,
            preset: "medium".into(),
            audio_bitrate: "128k".into(),
            threads: 4,
            filters: FilterChain::disabled(),
        }
    }
}

/// The encoder parameters for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "codec", rename_all = "lowercase")]
pub enum CodecProfile {
    Vp8(Vp8Settings),
    Vp9(Vp9Settings),
    H264(H264Settings),
}

impl CodecProfile {
    /// Short codec name used in log operation tags and file names.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vp8(_) => "vp8",
            Self::Vp9(_) => "vp9",
            Self::H264(_) => "h264",
        }
    }

    /// Output container extension.
    pub fn container(&self) -> &'static str {
        match self {
            Self::Vp8(_) | Self::Vp9(_) => "webm",
            Self::H264(_) => "mp4",
        }
    }

    /// Whether the profile runs a separate analysis pass.
    pub fn is_two_pass(&self) -> bool {
        matches!(self, Self::Vp9(_))
    }

    pub fn filters(&self) -> &FilterChain {
        match self {
            Self::Vp8(s) => &s.filters,
            Self::Vp9(s) => &s.filters,
            Self::H264(s) => &s.filters,
        }
    }

    pub fn filters_mut(&mut self) -> &mut FilterChain {
        match self {
            Self::Vp8(s) => &mut s.filters,
            Self::Vp9(s) => &mut s.filters,
            Self::H264(s) => &mut s.filters,
        }
    }

    /// File name fragment appended to the input stem when no explicit output
    /// is given. Every setting that changes the encoded stream is recorded,
    /// so distinct parameters yield distinct suffixes. Thread count is left
    /// out.
    pub fn output_suffix(&self) -> String {
        let quality = match self {
            Self::Vp8(s) => format!("_vp8_b{}", s.video_bitrate),
            Self::Vp9(s) => {
                let crf = s.crf.map_or_else(|| "no".to_string(), |c| c.to_string());
                format!(
                    "_vp9_crf{crf}_b{}_s{}_a{}",
                    s.video_bitrate, s.speed, s.audio_bitrate
                )
            }
            Self::H264(s) => format!("_h264_crf{}_p{}_a{}", s.crf, s.preset, s.audio_bitrate),
        };
        let filters = self.filters().name_suffix().unwrap_or_default();
        format!("{quality}{filters}")
    }

    /// Reject parameter values ffmpeg would refuse or misinterpret.
    pub fn validate(&self) -> Result<()> {
        let threads = match self {
            Self::Vp8(s) => {
                require_non_empty("video_bitrate", &s.video_bitrate)?;
                s.threads
            }
            Self::Vp9(s) => {
                require_non_empty("video_bitrate", &s.video_bitrate)?;
                require_non_empty("audio_bitrate", &s.audio_bitrate)?;
                if let Some(crf) = s.crf {
                    if crf > 63 {
                        return Err(Error::Validation(format!(
                            "vp9 crf must be within 0-63, got {crf}"
                        )));
                    }
                }
                if s.speed > 8 {
                    return Err(Error::Validation(format!(
                        "vp9 speed must be within 0-8, got {}",
                        s.speed
                    )));
                }
                s.threads
            }
            Self::H264(s) => {
                require_non_empty("preset", &s.preset)?;
                require_non_empty("audio_bitrate", &s.audio_bitrate)?;
                if s.crf > 51 {
                    return Err(Error::Validation(format!(
                        "h264 crf must be within 0-51, got {}",
                        s.crf
                    )));
                }
                s.threads
            }
        };

        if threads == 0 {
            return Err(Error::Validation("threads must be at least 1".into()));
        }

        let filters = self.filters();
        if filters.enabled {
            for kind in crate::FilterKind::ALL {
                require_non_empty(kind.filter_name(), filters.values.get(kind))?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for CodecProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterValues;

    #[test]
    fn defaults_are_valid() {
        CodecProfile::Vp8(Vp8Settings::default()).validate().unwrap();
        CodecProfile::Vp9(Vp9Settings::default()).validate().unwrap();
        CodecProfile::H264(H264Settings::default()).validate().unwrap();
    }

    #[test]
    fn containers() {
        assert_eq!(CodecProfile::Vp8(Vp8Settings::default()).container(), "webm");
        assert_eq!(CodecProfile::Vp9(Vp9Settings::default()).container(), "webm");
        assert_eq!(CodecProfile::H264(H264Settings::default()).container(), "mp4");
    }

    #[test]
    fn vp9_suffix_without_filters() {
        let mut s = Vp9Settings::default();
        s.crf = Some(31);
        s.filters.enabled = false;
        assert_eq!(CodecProfile::Vp9(s).output_suffix(), "_vp9_crf31_b1400K_s2_a64k");
    }

    #[test]
    fn vp9_suffix_with_filters() {
        let mut s = Vp9Settings::default();
        s.crf = Some(31);
        s.filters = s.filters.with_values(FilterValues {
            denoise: "luma_spatial=2".into(),
            deband: "1.0:16".into(),
            sharpen: "9:9:1.0:3:3:0.0".into(),
        });
        assert_eq!(
            CodecProfile::Vp9(s).output_suffix(),
            "_vp9_crf31_b1400K_s2_a64k_yadif_hqdnluma_spatial=2_gradfun1.0:16_unsharp9:9:1.0:3:3:0.0"
        );
    }

    #[test]
    fn vp9_vod_suffix_records_bitrate() {
        let mut s = Vp9Settings::default();
        s.crf = None;
        s.filters.enabled = false;
        assert_eq!(CodecProfile::Vp9(s).output_suffix(), "_vp9_crfno_b1400K_s2_a64k");
    }

    #[test]
    fn vp8_and_h264_suffixes() {
        assert_eq!(
            CodecProfile::Vp8(Vp8Settings::default()).output_suffix(),
            "_vp8_b1M"
        );
        assert_eq!(
            CodecProfile::H264(H264Settings::default()).output_suffix(),
            "_h264_crf23_pmedium_a128k"
        );
    }

    #[test]
    fn every_stream_setting_changes_the_suffix() {
        let vp9 = Vp9Settings::default();
        let h264 = H264Settings::default();
        let variants = [
            CodecProfile::Vp9(vp9.clone()),
            CodecProfile::Vp9(Vp9Settings {
                video_bitrate: "500K".into(),
                ..vp9.clone()
            }),
            CodecProfile::Vp9(Vp9Settings {
                speed: 1,
                ..vp9.clone()
            }),
            CodecProfile::Vp9(Vp9Settings {
                audio_bitrate: "96k".into(),
                ..vp9.clone()
            }),
            CodecProfile::Vp9(Vp9Settings {
                filters: FilterChain {
                    deinterlace: false,
                    ..vp9.filters.clone()
                },
                ..vp9.clone()
            }),
            CodecProfile::H264(h264.clone()),
            CodecProfile::H264(H264Settings {
                preset: "veryslow".into(),
                ..h264.clone()
            }),
            CodecProfile::H264(H264Settings {
                audio_bitrate: "192k".into(),
                ..h264.clone()
            }),
        ];
        let suffixes: std::collections::HashSet<_> =
            variants.iter().map(|p| p.output_suffix()).collect();
        assert_eq!(suffixes.len(), variants.len());
    }

    #[test]
    fn thread_count_does_not_change_the_suffix() {
        let a = Vp8Settings::default();
        let b = Vp8Settings {
            threads: 8,
            ..a.clone()
        };
        assert_eq!(
            CodecProfile::Vp8(a).output_suffix(),
            CodecProfile::Vp8(b).output_suffix()
        );
    }

    #[test]
    fn crf_out_of_range_rejected() {
        let mut s = Vp9Settings::default();
        s.crf = Some(64);
        let err = CodecProfile::Vp9(s).validate().unwrap_err();
        assert!(err.to_string().contains("0-63"));

        let mut h = H264Settings::default();
        h.crf = 52;
        assert!(CodecProfile::H264(h).validate().is_err());
    }

    #[test]
    fn zero_threads_rejected() {
        let mut s = Vp8Settings::default();
        s.threads = 0;
        let err = CodecProfile::Vp8(s).validate().unwrap_err();
        assert!(err.to_string().contains("threads"));
    }

    #[test]
    fn empty_filter_value_rejected_only_when_enabled() {
        let mut s = Vp9Settings::default();
        s.filters.values.deband = String::new();
        assert!(CodecProfile::Vp9(s.clone()).validate().is_err());

        s.filters.enabled = false;
        CodecProfile::Vp9(s).validate().unwrap();
    }

    #[test]
    fn profile_serde_is_tagged() {
        let json = r#"{"codec": "h264", "crf": 20}"#;
        let p: CodecProfile = serde_json::from_str(json).unwrap();
        match p {
            CodecProfile::H264(s) => {
                assert_eq!(s.crf, 20);
                assert_eq!(s.preset, "medium");
            }
            other => panic!("unexpected profile: {other}"),
        }
    }
}
