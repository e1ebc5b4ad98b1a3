// Joining several timing runs into one continuous run

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::constants::*;
use crate::core::error::{shift_timestamp, Result, TimingError};
use crate::core::format::RunHeader;
use crate::core::run::TimingRun;
use crate::core::store::{SampleColumns, SampleStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatOptions {
    /// Shift each appended run so its first offset meets the previous run's last.
    pub connect_offset: bool,
    /// Drop the first sample of every run after the first.
    pub skip_first: bool,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            connect_offset: true,
            skip_first: false,
        }
    }
}

/// Appends `runs[1..]` onto a copy of `runs[0]`.
///
/// Each appended run's time axis is offset by the merged run's current end
/// time, and its device timestamps are re-based so they continue from the
/// merged run's last timestamp. The result carries placeholder metadata
/// and a fresh snapshot; the inputs are never touched.
pub fn concat_runs<S: SampleStore>(runs: &[S], options: ConcatOptions) -> Result<TimingRun> {
    if runs.len() < 2 {
        warn!("concatenation needs at least two runs, got {}", runs.len());
        return Err(TimingError::TooFewRuns(runs.len()));
    }
    if let Some(pos) = runs.iter().position(|r| r.is_empty()) {
        warn!("run {} in concatenation is empty", pos);
        return Err(TimingError::TooFewSamples { needed: 1, got: 0 });
    }

    let first = &runs[0];
    let mut merged: SampleColumns = first.columns().clone();
    let skip = usize::from(options.skip_first);

    for (n, run) in runs.iter().enumerate().skip(1) {
        let columns = run.columns();

        let end_time = *merged.time.last().unwrap_or(&0.0);
        let end_timestamp = *merged.device_timestamp.last().unwrap_or(&0);
        // device clock reading at this run's time zero
        let run_zero = shift_timestamp(columns.device_timestamp[0], -columns.time[0])?;
        let delta = if options.connect_offset {
            columns.offset[0] - merged.offset.last().copied().unwrap_or(0.0)
        } else {
            0.0
        };

        for mut sample in columns.iter().skip(skip) {
            sample.time += end_time;
            sample.device_timestamp = sample
                .device_timestamp
                .checked_sub(run_zero)
                .and_then(|elapsed| end_timestamp.checked_add(elapsed))
                .ok_or_else(|| {
                    TimingError::InvalidValue(format!(
                        "run {n} device timestamps cannot continue from {end_timestamp}"
                    ))
                })?;
            sample.offset -= delta;
            merged.push(sample);
        }
        debug!(
            "appended run {} ({} samples, offset delta {})",
            n,
            columns.len().saturating_sub(skip),
            delta
        );
    }

    info!("merged {} runs into {} samples", runs.len(), merged.len());

    let header = RunHeader::merged(first.header().first_point.clone());
    Ok(TimingRun::new(header, merged)?.with_source(None, MERGED_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::run::tests::{run_from, T0};

    fn pair() -> (TimingRun, TimingRun) {
        let a = run_from(&[0.0, 1.0, 2.0], &[3.0, 4.0, 5.0]);
        let b = run_from(&[0.0, 1.0, 2.0], &[1.0, 1.5, 2.5]);
        (a, b)
    }

    #[test]
    fn test_needs_two_runs() {
        let (a, _) = pair();
        let err = concat_runs(&[a], ConcatOptions::default()).unwrap_err();
        assert!(matches!(err, TimingError::TooFewRuns(1)));
        let none: [TimingRun; 0] = [];
        assert!(concat_runs(&none, ConcatOptions::default()).is_err());
    }

    #[test]
    fn test_connect_offset_at_seam() {
        let (a, b) = pair();
        let merged = concat_runs(&[a.clone(), b.clone()], ConcatOptions::default()).unwrap();
        assert_eq!(merged.len(), 6);
        assert_eq!(merged.time()[3], a.time()[2]);
        assert_eq!(merged.offset()[3], 5.0);
        assert_eq!(&merged.offset()[3..], &[5.0, 5.5, 6.5]);
        assert_eq!(merged.time(), &[0.0, 1.0, 2.0, 2.0, 3.0, 4.0]);
        // inputs untouched
        assert_eq!(b.offset(), &[1.0, 1.5, 2.5]);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_without_connect_keeps_offsets() {
        let (a, b) = pair();
        let options = ConcatOptions {
            connect_offset: false,
            skip_first: false,
        };
        let merged = concat_runs(&[a, b], options).unwrap();
        assert_eq!(&merged.offset()[3..], &[1.0, 1.5, 2.5]);
    }

    #[test]
    fn test_skip_first() {
        let (a, b) = pair();
        let options = ConcatOptions {
            connect_offset: true,
            skip_first: true,
        };
        let merged = concat_runs(&[a, b], options).unwrap();
        assert_eq!(merged.len(), 5);
        assert_eq!(merged.time(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(&merged.offset()[3..], &[5.5, 6.5]);
    }

    #[test]
    fn test_metadata_and_timestamps() {
        let (a, b) = pair();
        let mut b = b;
        b.shift_offset(1.0).unwrap();
        let merged = concat_runs(&[a, b], ConcatOptions::default()).unwrap();
        assert_eq!(merged.header().watch_name, MERGED_WATCH);
        assert_eq!(merged.header().run_name, MERGED_RUN);
        assert_eq!(merged.header().run_comment, MERGED_RUN_COMMENT);
        assert_eq!(merged.file_name(), MERGED_FILE);
        assert_eq!((merged.cursor(), merged.offset_shift(), merged.time_shift()), (0, 0.0, 0.0));
        assert_eq!(merged.device_timestamp()[3], T0 + 2 * 86_400);
        assert_eq!(merged.device_timestamp()[5], T0 + 4 * 86_400);
        assert!(merged.time().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(merged.original().columns, *merged.columns());
    }

    #[test]
    fn test_timestamp_overflow_is_reported() {
        let (a, b) = pair();
        let mut late = a.clone();
        late.set_cursor(2).unwrap();
        late.set_device_timestamp(i64::MAX - 10).unwrap();
        let err = concat_runs(&[late, b], ConcatOptions::default()).unwrap_err();
        assert!(matches!(err, TimingError::InvalidValue(_)));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_three_runs_chain() {
        let a = run_from(&[0.0, 1.0], &[0.0, 1.0]);
        let b = run_from(&[0.0, 1.0], &[10.0, 12.0]);
        let c = run_from(&[0.0, 2.0], &[-4.0, -3.0]);
        let merged = concat_runs(&[a, b, c], ConcatOptions::default()).unwrap();
        assert_eq!(merged.time(), &[0.0, 1.0, 1.0, 2.0, 2.0, 4.0]);
        assert_eq!(merged.offset(), &[0.0, 1.0, 1.0, 3.0, 3.0, 4.0]);
    }
}
