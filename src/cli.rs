use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use mb_core::config::EncodeConfig;
use mb_core::{CodecProfile, FilterChain};

#[derive(Parser)]
#[command(name = "mediabatch")]
#[command(author, version, about = "Batch DVD chapter splitting and video encoding")]
pub struct Cli {
    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Working directory for tool runs, pass statistics and the run log
    #[arg(short, long, global = true)]
    pub workdir: Option<PathBuf>,

    /// Run log file (overrides config)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a DVD into one stream file per chapter
    Split {
        /// Disc mount point or VIDEO_TS directory
        #[arg(short, long)]
        device: Option<PathBuf>,

        /// Directory for the chapter files (defaults to the working directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Extension of the dumped files
        #[arg(long)]
        ext: Option<String>,
    },

    /// Encode video files with a codec profile
    Encode {
        /// Files to encode; when empty, files are discovered in --dir
        inputs: Vec<PathBuf>,

        /// Directory to discover inputs in (defaults to the working directory)
        #[arg(long, conflicts_with = "inputs")]
        dir: Option<PathBuf>,

        /// Extension of discovered inputs
        #[arg(long)]
        ext: Option<String>,

        /// Discover inputs in subdirectories too
        #[arg(short, long)]
        recursive: bool,

        /// Codec profile
        #[arg(short, long, value_enum, default_value_t = ProfileArg::Vp9)]
        profile: ProfileArg,

        /// Explicit output file (single input only)
        #[arg(short = 'O', long, conflicts_with = "keep_name")]
        output: Option<PathBuf>,

        /// Write <stem>.<container> next to each input instead of a
        /// parameter-encoding name
        #[arg(long)]
        keep_name: bool,

        #[command(flatten)]
        quality: QualityArgs,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Encode one file once per combination of candidate filter values
    Sweep {
        /// File to encode
        input: PathBuf,

        /// Codec profile
        #[arg(short, long, value_enum, default_value_t = ProfileArg::Vp9)]
        profile: ProfileArg,

        /// Candidate hqdn3d values
        #[arg(long, required = true, num_args = 1..)]
        denoise: Vec<String>,

        /// Candidate gradfun values
        #[arg(long, required = true, num_args = 1..)]
        deband: Vec<String>,

        /// Candidate unsharp values
        #[arg(long, required = true, num_args = 1..)]
        sharpen: Vec<String>,

        /// Skip the yadif deinterlace step
        #[arg(long)]
        no_deinterlace: bool,

        #[command(flatten)]
        quality: QualityArgs,
    },

    /// Check that the external tools are available
    CheckTools {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    Vp8,
    Vp9,
    H264,
}

impl ProfileArg {
    /// The configured settings for this codec.
    pub fn profile(self, encode: &EncodeConfig) -> CodecProfile {
        match self {
            Self::Vp8 => CodecProfile::Vp8(encode.vp8.clone()),
            Self::Vp9 => CodecProfile::Vp9(encode.vp9.clone()),
            Self::H264 => CodecProfile::H264(encode.h264.clone()),
        }
    }
}

/// `--crf` value: a number, or `none` for bitrate-only VP9.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrfArg(pub Option<u32>);

impl FromStr for CrfArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("none") || s.eq_ignore_ascii_case("no") {
            return Ok(Self(None));
        }
        s.parse::<u32>()
            .map(|v| Self(Some(v)))
            .map_err(|_| format!("expected a number or 'none', got '{s}'"))
    }
}

#[derive(Args, Debug, Default)]
pub struct QualityArgs {
    /// Constant rate factor; 'none' disables it (VP9 only)
    #[arg(long)]
    pub crf: Option<CrfArg>,

    /// Target video bitrate, e.g. 1000K
    #[arg(long)]
    pub video_bitrate: Option<String>,

    /// Audio bitrate, e.g. 96k
    #[arg(long)]
    pub audio_bitrate: Option<String>,

    /// Encoder threads
    #[arg(long)]
    pub threads: Option<u32>,

    /// VP9 second-pass speed (0-8)
    #[arg(long)]
    pub speed: Option<u32>,

    /// x264 preset
    #[arg(long)]
    pub preset: Option<String>,
}

impl QualityArgs {
    /// Overlay the given flags onto `profile`, rejecting flags the codec has
    /// no use for.
    pub fn apply(&self, profile: &mut CodecProfile) -> anyhow::Result<()> {
        let codec = profile.name();
        let unsupported = |flag: &str| anyhow::anyhow!("--{flag} is not supported by the {codec} profile");

        match profile {
            CodecProfile::Vp8(s) => {
                if self.crf.is_some() {
                    return Err(unsupported("crf"));
                }
                if self.audio_bitrate.is_some() {
                    return Err(unsupported("audio-bitrate"));
                }
                if self.speed.is_some() {
                    return Err(unsupported("speed"));
                }
                if self.preset.is_some() {
                    return Err(unsupported("preset"));
                }
                if let Some(ref b) = self.video_bitrate {
                    s.video_bitrate = b.clone();
                }
                if let Some(t) = self.threads {
                    s.threads = t;
                }
            }
            CodecProfile::Vp9(s) => {
                if self.preset.is_some() {
                    return Err(unsupported("preset"));
                }
                if let Some(CrfArg(crf)) = self.crf {
                    s.crf = crf;
                }
                if let Some(ref b) = self.video_bitrate {
                    s.video_bitrate = b.clone();
                }
                if let Some(ref b) = self.audio_bitrate {
                    s.audio_bitrate = b.clone();
                }
                if let Some(t) = self.threads {
                    s.threads = t;
                }
                if let Some(sp) = self.speed {
                    s.speed = sp;
                }
            }
            CodecProfile::H264(s) => {
                if self.video_bitrate.is_some() {
                    return Err(unsupported("video-bitrate"));
                }
                if self.speed.is_some() {
                    return Err(unsupported("speed"));
                }
                match self.crf {
                    Some(CrfArg(Some(crf))) => s.crf = crf,
                    Some(CrfArg(None)) => return Err(unsupported("crf none")),
                    None => {}
                }
                if let Some(ref p) = self.preset {
                    s.preset = p.clone();
                }
                if let Some(ref b) = self.audio_bitrate {
                    s.audio_bitrate = b.clone();
                }
                if let Some(t) = self.threads {
                    s.threads = t;
                }
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// hqdn3d denoise value ('luma_spatial=0' disables it)
    #[arg(long)]
    pub denoise: Option<String>,

    /// gradfun debanding value ('0:0' disables it)
    #[arg(long)]
    pub deband: Option<String>,

    /// unsharp value ('0:0:0.0:0:0:0.0' disables it)
    #[arg(long)]
    pub sharpen: Option<String>,

    /// Skip the yadif deinterlace step
    #[arg(long)]
    pub no_deinterlace: bool,

    /// Disable the whole filter chain
    #[arg(long, conflicts_with_all = ["denoise", "deband", "sharpen"])]
    pub no_filter: bool,
}

impl FilterArgs {
    /// Overlay the flags onto `chain`. Giving any filter value switches the
    /// chain on.
    pub fn apply(&self, chain: &mut FilterChain) {
        if self.no_filter {
            chain.enabled = false;
            return;
        }
        for (flag, slot) in [
            (&self.denoise, &mut chain.values.denoise),
            (&self.deband, &mut chain.values.deband),
            (&self.sharpen, &mut chain.values.sharpen),
        ] {
            if let Some(v) = flag {
                *slot = v.clone();
                chain.enabled = true;
            }
        }
        if self.no_deinterlace {
            chain.deinterlace = false;
        }
    }
}
