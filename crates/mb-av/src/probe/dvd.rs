//! mplayer-based DVD structure probe.
//!
//! Runs `mplayer -dvd-device <disc>/ dvd://1 -identify -frames 0` and reads
//! the `ID_DVD_TITLES=<n>` and `ID_DVD_TITLE_<i>_CHAPTERS=<c>` lines from
//! its standard output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::command::ToolCommand;
use crate::runner::ToolRunner;

const TITLES_KEY: &str = "ID_DVD_TITLES";

/// DVD-Video allows at most 99 titles per disc and 999 chapters per title.
const MAX_TITLES: u32 = 99;
const MAX_CHAPTERS: u32 = 999;

/// Chapter count of one title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleInfo {
    /// 1-based title index.
    pub index: u32,
    pub chapters: u32,
}

/// Successful probe result.
///
/// Probe failures (no title count in the output) are reported as
/// [`mb_core::Error::Probe`], never as an empty layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscProbe {
    /// The disc has at least one title, in title order.
    Titles(Vec<TitleInfo>),
    /// The disc reports zero titles.
    Empty,
}

impl DiscProbe {
    pub fn titles(&self) -> &[TitleInfo] {
        match self {
            Self::Titles(t) => t,
            Self::Empty => &[],
        }
    }

    /// Total number of chapters across all titles.
    pub fn chapter_count(&self) -> u32 {
        self.titles().iter().map(|t| t.chapters).sum()
    }
}

/// Value of `-dvd-device`: the disc path with a trailing separator.
pub(crate) fn dvd_device_arg(device: &Path) -> String {
    let s = device.to_string_lossy();
    if s.ends_with('/') {
        s.into_owned()
    } else {
        format!("{s}/")
    }
}

/// A prober backed by the `mplayer` CLI.
#[derive(Debug, Clone)]
pub struct DvdProber {
    mplayer_path: PathBuf,
}

impl DvdProber {
    /// Create a new prober using the given mplayer path.
    pub fn new(mplayer_path: PathBuf) -> Self {
        Self { mplayer_path }
    }

    /// The metadata-only inspection command for `device`.
    pub fn identify_command(&self, device: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.mplayer_path.clone());
        cmd.arg("-dvd-device");
        cmd.arg(dvd_device_arg(device));
        cmd.args(["dvd://1", "-identify", "-frames", "0"]);
        cmd
    }

    /// Probe the disc at `device`.
    ///
    /// The exit status of mplayer is not consulted; it routinely exits
    /// non-zero after `-frames 0`. The presence of `ID_DVD_TITLES` decides
    /// success.
    pub async fn probe(
        &self,
        runner: &dyn ToolRunner,
        device: &Path,
    ) -> mb_core::Result<DiscProbe> {
        let cmd = self.identify_command(device);
        tracing::debug!("probing disc: {cmd}");
        let output = runner.capture(&cmd).await?;
        parse_identify(&output.stdout)
    }
}

/// Parse `mplayer -identify` output into a [`DiscProbe`].
pub fn parse_identify(stdout: &str) -> mb_core::Result<DiscProbe> {
    // First occurrence of each key wins.
    let mut values: HashMap<&str, &str> = HashMap::new();
    for line in stdout.lines() {
        if let Some((key, value)) = line.trim().split_once('=') {
            values.entry(key.trim()).or_insert(value.trim());
        }
    }

    let raw_titles = values.get(TITLES_KEY).ok_or_else(|| {
        mb_core::Error::Probe(format!("no titles found: {TITLES_KEY} missing from mplayer output"))
    })?;
    let title_count: u32 = raw_titles.parse().map_err(|_| {
        mb_core::Error::Probe(format!("{TITLES_KEY} is not a number: {raw_titles:?}"))
    })?;

    if title_count == 0 {
        return Ok(DiscProbe::Empty);
    }
    if title_count > MAX_TITLES {
        return Err(mb_core::Error::Probe(format!(
            "{TITLES_KEY}={title_count} exceeds the DVD limit of {MAX_TITLES}"
        )));
    }

    let mut titles = Vec::with_capacity(title_count as usize);
    for index in 1..=title_count {
        let key = format!("ID_DVD_TITLE_{index}_CHAPTERS");
        let raw = values.get(key.as_str()).ok_or_else(|| {
            mb_core::Error::Probe(format!("{key} missing from mplayer output"))
        })?;
        let chapters: u32 = raw.parse().map_err(|_| {
            mb_core::Error::Probe(format!("{key} is not a number: {raw:?}"))
        })?;
        if chapters > MAX_CHAPTERS {
            return Err(mb_core::Error::Probe(format!(
                "{key}={chapters} exceeds the DVD limit of {MAX_CHAPTERS}"
            )));
        }
        titles.push(TitleInfo { index, chapters });
    }

    Ok(DiscProbe::Titles(titles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;

    const SAMPLE: &str = "\
MPlayer 1.4 (Debian), built with gcc-10 (C) 2000-2019 MPlayer Team
Playing dvd://1.
ID_DVD_TITLES=2
ID_DVD_TITLE_1_CHAPTERS=3
ID_DVD_TITLE_1_ANGLES=1
ID_DVD_TITLE_1_LENGTH=1424.400
ID_DVD_TITLE_2_CHAPTERS=1
ID_DVD_TITLE_2_ANGLES=1
ID_DVD_DISC_ID=E1D5A6DCB4E1A5F0
Exiting... (End of file)
";

    #[test]
    fn parses_titles_and_chapters() {
        let probe = parse_identify(SAMPLE).unwrap();
        assert_eq!(
            probe,
            DiscProbe::Titles(vec![
                TitleInfo { index: 1, chapters: 3 },
                TitleInfo { index: 2, chapters: 1 },
            ])
        );
        assert_eq!(probe.chapter_count(), 4);
    }

    #[test]
    fn missing_title_count_is_probe_failure() {
        let err = parse_identify("MPlayer 1.4\nNo stream found.\n").unwrap_err();
        assert!(matches!(err, mb_core::Error::Probe(_)));
        assert!(err.to_string().contains("ID_DVD_TITLES"));
    }

    #[test]
    fn empty_output_is_probe_failure() {
        assert!(matches!(parse_identify(""), Err(mb_core::Error::Probe(_))));
    }

    #[test]
    fn zero_titles_is_empty() {
        let probe = parse_identify("ID_DVD_TITLES=0\n").unwrap();
        assert_eq!(probe, DiscProbe::Empty);
        assert!(probe.titles().is_empty());
    }

    #[test]
    fn missing_chapter_line_is_probe_failure() {
        let err = parse_identify("ID_DVD_TITLES=2\nID_DVD_TITLE_1_CHAPTERS=4\n").unwrap_err();
        assert!(err.to_string().contains("ID_DVD_TITLE_2_CHAPTERS"));
    }

    #[test]
    fn garbage_count_is_probe_failure() {
        let err = parse_identify("ID_DVD_TITLES=lots\n").unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn implausible_title_count_is_probe_failure() {
        let err = parse_identify("ID_DVD_TITLES=4000000000\n").unwrap_err();
        assert!(matches!(err, mb_core::Error::Probe(_)));
        assert!(err.to_string().contains("exceeds"));

        assert!(parse_identify("ID_DVD_TITLES=100\n").is_err());
    }

    #[test]
    fn implausible_chapter_count_is_probe_failure() {
        let err =
            parse_identify("ID_DVD_TITLES=1\nID_DVD_TITLE_1_CHAPTERS=4000000000\n").unwrap_err();
        assert!(err.to_string().contains("ID_DVD_TITLE_1_CHAPTERS"));
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn largest_valid_layout_parses() {
        let mut out = String::from("ID_DVD_TITLES=99\n");
        for i in 1..=99 {
            out.push_str(&format!("ID_DVD_TITLE_{i}_CHAPTERS=999\n"));
        }
        assert_eq!(parse_identify(&out).unwrap().titles().len(), 99);
    }

    #[test]
    fn similar_keys_do_not_collide() {
        // ID_DVD_TITLE_1_CHAPTERS must not be confused with ID_DVD_TITLE_11_CHAPTERS.
        let mut out = String::from("ID_DVD_TITLES=11\n");
        for i in 1..=11 {
            out.push_str(&format!("ID_DVD_TITLE_{i}_CHAPTERS={}\n", i * 2));
        }
        let probe = parse_identify(&out).unwrap();
        assert_eq!(probe.titles()[0].chapters, 2);
        assert_eq!(probe.titles()[10].chapters, 22);
    }

    #[test]
    fn device_arg_gets_trailing_slash_once() {
        assert_eq!(dvd_device_arg(Path::new("VIDEO_TS")), "VIDEO_TS/");
        assert_eq!(dvd_device_arg(Path::new("/mnt/dvd/")), "/mnt/dvd/");
    }

    #[tokio::test]
    async fn probe_runs_identify_command() {
        let runner = RecordingRunner::with_stdout(SAMPLE);
        let prober = DvdProber::new(PathBuf::from("mplayer"));
        let probe = prober.probe(&runner, Path::new("VIDEO_TS")).await.unwrap();
        assert_eq!(probe.titles().len(), 2);

        let captured = runner.captures.lock().clone();
        assert_eq!(captured.len(), 1);
        assert_eq!(
            captured[0].to_string(),
            "mplayer -dvd-device VIDEO_TS/ dvd://1 -identify -frames 0"
        );
        assert!(runner.runs().is_empty());
    }
}
