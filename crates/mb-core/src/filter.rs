//! Pre-encode filter chain: deinterlace, denoise, banding reduction, sharpen.
//!
//! Each tunable filter has a no-op sentinel value. A filter whose value
//! equals its sentinel is left out of the ffmpeg `-vf` expression entirely
//! instead of being applied with a degenerate strength.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// FilterKind
// ---------------------------------------------------------------------------

/// The three tunable filters, in the order they appear in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Temporal/spatial denoise (`hqdn3d`).
    Denoise,
    /// Gradient banding reduction (`gradfun`).
    Deband,
    /// Unsharp mask (`unsharp`).
    Sharpen,
}

impl FilterKind {
    /// All kinds in chain order.
    pub const ALL: [FilterKind; 3] = [FilterKind::Denoise, FilterKind::Deband, FilterKind::Sharpen];

    /// The ffmpeg filter name.
    pub fn filter_name(self) -> &'static str {
        match self {
            Self::Denoise => "hqdn3d",
            Self::Deband => "gradfun",
            Self::Sharpen => "unsharp",
        }
    }

    /// The value that makes this filter a no-op.
    pub fn noop(self) -> &'static str {
        match self {
            Self::Denoise => "luma_spatial=0",
            Self::Deband => "0:0",
            Self::Sharpen => "0:0:0.0:0:0:0.0",
        }
    }

    /// Short tag used in derived output file names.
    pub fn name_tag(self) -> &'static str {
        match self {
            Self::Denoise => "hqdn",
            Self::Deband => "gradfun",
            Self::Sharpen => "unsharp",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denoise => write!(f, "denoise"),
            Self::Deband => write!(f, "deband"),
            Self::Sharpen => write!(f, "sharpen"),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterValues
// ---------------------------------------------------------------------------

/// One value per tunable filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterValues {
    pub denoise: String,
    pub deband: String,
    pub sharpen: String,
}

impl FilterValues {
    /// The value configured for `kind`.
    pub fn get(&self, kind: FilterKind) -> &str {
        match kind {
            FilterKind::Denoise => &self.denoise,
            FilterKind::Deband => &self.deband,
            FilterKind::Sharpen => &self.sharpen,
        }
    }
}

impl Default for FilterValues {
    fn default() -> Self {
        Self {
            denoise: "2:1.5:3:2.25".into(),
            deband: "1:8".into(),
            sharpen: "5:5:1.0:3:3:0.0".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterChain
// ---------------------------------------------------------------------------

/// Filter settings attached to a codec profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterChain {
    /// Master switch; when false no `-vf` is passed at all.
    pub enabled: bool,
    /// Prepend `yadif` to the chain.
    pub deinterlace: bool,
    #[serde(flatten)]
    pub values: FilterValues,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self {
            enabled: true,
            deinterlace: true,
            values: FilterValues::default(),
        }
    }
}

impl FilterChain {
    /// Default values with the chain switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// A copy of this chain with `values` swapped in and filtering enabled.
    pub fn with_values(&self, values: FilterValues) -> Self {
        Self {
            enabled: true,
            deinterlace: self.deinterlace,
            values,
        }
    }

    /// Whether `kind` contributes a term to the expression.
    pub fn is_active(&self, kind: FilterKind) -> bool {
        self.values.get(kind) != kind.noop()
    }

    /// The `-vf` expression, or `None` when nothing would be applied.
    pub fn expression(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let mut terms = Vec::with_capacity(4);
        if self.deinterlace {
            terms.push("yadif".to_string());
        }
        for kind in FilterKind::ALL {
            if self.is_active(kind) {
                terms.push(format!("{}={}", kind.filter_name(), self.values.get(kind)));
            }
        }

        if terms.is_empty() {
            None
        } else {
            Some(terms.join(","))
        }
    }

    /// Output file name fragment recording the filter values, e.g.
    /// `_yadif_hqdn2:1.5:3:2.25_gradfun1:8_unsharp5:5:1.0:3:3:0.0`.
    pub fn name_suffix(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let mut suffix = String::new();
        if self.deinterlace {
            suffix.push_str("_yadif");
        }
        for kind in FilterKind::ALL {
            suffix.push_str(&format!("_{}{}", kind.name_tag(), self.values.get(kind)));
        }
        Some(suffix)
    }
}
