//! Cartesian sweep over candidate filter values.
//!
//! Used to compare encoder quality settings on a single source, not for
//! production batches. Iteration order is fixed: deband outermost, then
//! denoise, then sharpen innermost.

use crate::filter::FilterValues;

/// Candidate values for each tunable filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSweep {
    pub deband: Vec<String>,
    pub denoise: Vec<String>,
    pub sharpen: Vec<String>,
}

impl FilterSweep {
    /// Number of combinations the sweep produces.
    pub fn len(&self) -> usize {
        self.deband.len() * self.denoise.len() * self.sharpen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate every combination exactly once.
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            sweep: self,
            next: 0,
            total: self.len(),
        }
    }
}

/// Iterator returned by [`FilterSweep::combinations`].
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    sweep: &'a FilterSweep,
    next: usize,
    total: usize,
}

impl Iterator for Combinations<'_> {
    type Item = FilterValues;

    fn next(&mut self) -> Option<FilterValues> {
        if self.next >= self.total {
            return None;
        }

        // Mixed-radix decode of the flat index, sharpen varying fastest.
        let n_sharpen = self.sweep.sharpen.len();
        let n_denoise = self.sweep.denoise.len();
        let i = self.next;
        self.next += 1;

        let sharpen = &self.sweep.sharpen[i % n_sharpen];
        let denoise = &self.sweep.denoise[(i / n_sharpen) % n_denoise];
        let deband = &self.sweep.deband[i / (n_sharpen * n_denoise)];

        Some(FilterValues {
            denoise: denoise.clone(),
            deband: deband.clone(),
            sharpen: sharpen.clone(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}
