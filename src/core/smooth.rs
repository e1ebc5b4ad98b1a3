// Running-median smoothing of offsets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::core::error::{Result, TimingError};
use crate::core::run::TimingRun;
use crate::core::store::SampleStore;

/// How the window is filled past either end of the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedianMode {
    /// d c b a | a b c d | d c b a
    #[default]
    Reflect,
    /// 0 0 0 0 | a b c d | 0 0 0 0
    Constant,
    /// a a a a | a b c d | d d d d
    Nearest,
    /// d c b | a b c d | c b a
    Mirror,
    /// a b c d | a b c d | a b c d
    Wrap,
}

impl MedianMode {
    pub const ALL: [MedianMode; 5] = [
        MedianMode::Reflect,
        MedianMode::Constant,
        MedianMode::Nearest,
        MedianMode::Mirror,
        MedianMode::Wrap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MedianMode::Reflect => "reflect",
            MedianMode::Constant => "constant",
            MedianMode::Nearest => "nearest",
            MedianMode::Mirror => "mirror",
            MedianMode::Wrap => "wrap",
        }
    }

    /// Maps a possibly out-of-range position onto the data, `None` meaning
    /// the constant pad value.
    fn source_index(&self, pos: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if (0..n).contains(&pos) {
            return Some(pos as usize);
        }
        let idx = match self {
            MedianMode::Constant => return None,
            MedianMode::Nearest => pos.clamp(0, n - 1),
            MedianMode::Wrap => pos.rem_euclid(n),
            MedianMode::Reflect => {
                let m = pos.rem_euclid(2 * n);
                if m < n {
                    m
                } else {
                    2 * n - 1 - m
                }
            }
            MedianMode::Mirror => {
                if n == 1 {
                    0
                } else {
                    let period = 2 * n - 2;
                    let m = pos.rem_euclid(period);
                    if m < n {
                        m
                    } else {
                        period - m
                    }
                }
            }
        };
        Some(idx as usize)
    }
}

impl fmt::Display for MedianMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MedianMode {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self> {
        MedianMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s.to_ascii_lowercase())
            .ok_or_else(|| {
                TimingError::InvalidValue(format!(
                    "unknown median mode '{s}', expected one of reflect, constant, nearest, mirror, wrap"
                ))
            })
    }
}

/// Running median over a window of `size` values centred on each point.
///
/// For even sizes the window reaches one further to the left, and the upper
/// of the two middle values is taken. The input must be longer than the
/// window.
pub fn median_filter(values: &[f64], size: usize, mode: MedianMode) -> Result<Vec<f64>> {
    if size == 0 {
        return Err(TimingError::InvalidValue(
            "window size must be a positive integer".to_string(),
        ));
    }
    if values.len() <= size {
        return Err(TimingError::TooFewSamples {
            needed: size + 1,
            got: values.len(),
        });
    }

    let half = (size / 2) as isize;
    let mut window = Vec::with_capacity(size);
    let smoothed = (0..values.len() as isize)
        .map(|i| {
            window.clear();
            window.extend((i - half..i - half + size as isize).map(|pos| {
                mode.source_index(pos, values.len())
                    .map_or(0.0, |idx| values[idx])
            }));
            window.sort_by(|a, b| a.total_cmp(b));
            window[size / 2]
        })
        .collect();
    Ok(smoothed)
}

impl TimingRun {
    /// Replaces the offsets with their running median. Not tracked by the
    /// shift accumulators; `reset` undoes it.
    pub fn smooth(&mut self, size: usize, mode: MedianMode) -> Result<()> {
        let smoothed = median_filter(self.offset(), size, mode)?;
        self.replace_offsets(smoothed);
        debug!("smoothed {} offsets (size {}, mode {})", self.len(), size, mode);
        Ok(())
    }
}
