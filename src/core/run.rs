// Timing run: owned sample columns, cursor, shift bookkeeping and snapshot

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::constants::*;
use crate::core::error::{ensure_finite, shift_timestamp, Result, TimingError};
use crate::core::format::{RunHeader, RunInfo, Sample};
use crate::core::store::{SampleColumns, SampleStore};

/// State captured when a run is created; `reset` returns to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSnapshot {
    pub header: RunHeader,
    pub columns: SampleColumns,
}

/// Accumulated uniform shifts since load or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ShiftState {
    time_days: f64,
    // whole seconds actually added to device timestamps
    timestamp_seconds: i64,
    offset_seconds: f64,
}

#[derive(Debug, Clone)]
pub struct TimingRun {
    source: Option<PathBuf>,
    file_name: String,
    header: RunHeader,
    columns: SampleColumns,
    cursor: usize,
    shifts: ShiftState,
    original: RunSnapshot,
}

impl SampleStore for TimingRun {
    fn header(&self) -> &RunHeader {
        &self.header
    }

    fn columns(&self) -> &SampleColumns {
        &self.columns
    }
}

impl TimingRun {
    /// Creates a run from already-parsed columns. The run must hold at
    /// least one sample and every column must have the same length.
    pub fn new(header: RunHeader, columns: SampleColumns) -> Result<Self> {
        columns.check_aligned()?;
        if columns.is_empty() {
            return Err(TimingError::TooFewSamples { needed: 1, got: 0 });
        }
        let original = RunSnapshot {
            header: header.clone(),
            columns: columns.clone(),
        };
        Ok(Self {
            source: None,
            file_name: String::new(),
            header,
            columns,
            cursor: 0,
            shifts: ShiftState::default(),
            original,
        })
    }

    pub(crate) fn with_source(mut self, source: Option<PathBuf>, file_name: impl Into<String>) -> Self {
        self.source = source;
        self.file_name = file_name.into();
        self
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn watch(&self) -> &str {
        &self.header.watch_name
    }

    pub fn original(&self) -> &RunSnapshot {
        &self.original
    }

    pub fn time(&self) -> &[f64] {
        self.columns.time()
    }

    pub fn offset(&self) -> &[f64] {
        self.columns.offset()
    }

    pub fn comment(&self) -> &[String] {
        self.columns.comment()
    }

    pub fn device_timestamp(&self) -> &[i64] {
        self.columns.device_timestamp()
    }

    pub fn error_a(&self) -> &[f64] {
        self.columns.error_a()
    }

    pub fn error_b(&self) -> &[f64] {
        self.columns.error_b()
    }

    pub fn info(&self) -> RunInfo {
        RunInfo {
            watch: self.header.watch_name.clone(),
            file: self.file_name.clone(),
            path: self
                .source
                .as_ref()
                .and_then(|p| p.parent())
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            start: self.start_label(),
            end: self.end_label(),
            duration: self.duration_days(),
            data_points: self.len(),
        }
    }

    /// One line per sample: index, time, device timestamp, offset, comment.
    pub fn list_points(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "{:3}  {:7.3}  {:10}  {:8.3}  {}",
                    i, s.time, s.device_timestamp, s.offset, s.comment
                )
            })
            .collect()
    }

    // ---- point editor ----

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get(&self, index: usize) -> Result<Sample> {
        self.columns.get(index).ok_or(TimingError::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// The sample under the cursor.
    pub fn point(&self) -> Sample {
        // cursor is kept in range by every mutation
        self.columns.sample_at(self.cursor)
    }

    pub fn point_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.columns.device_timestamp[self.cursor], 0)
    }

    pub fn set_cursor(&mut self, index: usize) -> Result<()> {
        if index >= self.len() {
            warn!("cursor {} rejected, run has {} samples", index, self.len());
            return Err(TimingError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// Moves the current sample in time; its device timestamp follows.
    pub fn set_time(&mut self, value: f64) -> Result<()> {
        let value = ensure_finite("time", value)?;
        let i = self.cursor;
        let timestamp =
            shift_timestamp(self.columns.device_timestamp[i], value - self.columns.time[i])?;
        self.columns.time[i] = value;
        self.columns.device_timestamp[i] = timestamp;
        debug!("point {} time set to {}", i, value);
        Ok(())
    }

    /// Moves the current device timestamp; the time axis follows.
    pub fn set_device_timestamp(&mut self, value: i64) -> Result<()> {
        let i = self.cursor;
        let delta = value.checked_sub(self.columns.device_timestamp[i]).ok_or_else(|| {
            TimingError::InvalidValue(format!("device timestamp {value} is too far from the current one"))
        })?;
        self.columns.device_timestamp[i] = value;
        self.columns.time[i] += seconds_to_days(delta);
        debug!("point {} device timestamp set to {}", i, value);
        Ok(())
    }

    pub fn set_offset(&mut self, value: f64) -> Result<()> {
        self.columns.offset[self.cursor] = ensure_finite("offset", value)?;
        Ok(())
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.columns.comment[self.cursor] = comment.into();
    }

    pub fn set_error_a(&mut self, value: f64) -> Result<()> {
        self.columns.error_a[self.cursor] = ensure_finite("error_a", value)?;
        Ok(())
    }

    pub fn set_error_b(&mut self, value: f64) -> Result<()> {
        self.columns.error_b[self.cursor] = ensure_finite("error_b", value)?;
        Ok(())
    }

    /// Removes the sample at `index` and returns it. A run never drops to
    /// zero samples; the cursor is pulled back if it falls off the end.
    pub fn delete(&mut self, index: usize) -> Result<Sample> {
        if self.len() <= 1 {
            warn!("refusing to delete the last sample");
            return Err(TimingError::LastSample);
        }
        if index >= self.len() {
            return Err(TimingError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        let removed = self.columns.remove(index);
        if self.cursor >= self.len() {
            self.cursor = self.len() - 1;
        }
        debug!("deleted point {}, {} left", index, self.len());
        Ok(removed)
    }

    pub fn delete_current(&mut self) -> Result<Sample> {
        self.delete(self.cursor)
    }

    /// Duplicates the current sample in place and moves the cursor onto
    /// the copy, ready to be overwritten.
    pub fn insert_duplicate(&mut self) -> Sample {
        let copy = self.point();
        self.columns.insert(self.cursor, copy);
        self.cursor += 1;
        self.point()
    }

    /// Inserts a new sample at the index of the existing sample closest in
    /// time. This does not guarantee chronological order for times outside
    /// the run. The device timestamp is extrapolated from the first sample
    /// and both error columns are zero. The cursor does not move.
    pub fn insert_at(&mut self, time: f64, offset: f64, comment: &str) -> Result<Sample> {
        let time = ensure_finite("time", time)?;
        let offset = ensure_finite("offset", offset)?;

        let index = nearest_index(&self.columns.time, time);
        let device_timestamp =
            shift_timestamp(self.columns.device_timestamp[0], time - self.columns.time[0])?;
        let sample = Sample {
            time,
            offset,
            comment: if comment.is_empty() {
                INSERTED_COMMENT.to_string()
            } else {
                comment.to_string()
            },
            device_timestamp,
            error_a: 0.0,
            error_b: 0.0,
        };
        self.columns.insert(index, sample.clone());
        debug!("inserted point at {} (time {}, offset {})", index, time, offset);
        Ok(sample)
    }

    // ---- shift tracker ----

    pub fn offset_shift(&self) -> f64 {
        self.shifts.offset_seconds
    }

    pub fn time_shift(&self) -> f64 {
        self.shifts.time_days
    }

    pub fn shift_offset(&mut self, delta: f64) -> Result<()> {
        let delta = ensure_finite("offset shift", delta)?;
        self.columns.offset.iter_mut().for_each(|o| *o += delta);
        self.shifts.offset_seconds += delta;
        Ok(())
    }

    /// Undoes every `shift_offset` since load or the last reset.
    pub fn reset_offset_shift(&mut self) {
        let total = self.shifts.offset_seconds;
        self.columns.offset.iter_mut().for_each(|o| *o -= total);
        self.shifts.offset_seconds = 0.0;
    }

    /// Shifts every time value by `delta_days` and every device timestamp
    /// by the same span. Nothing changes if any timestamp would leave the
    /// device clock range.
    pub fn shift_time(&mut self, delta_days: f64) -> Result<()> {
        let delta_days = ensure_finite("time shift", delta_days)?;
        let out_of_range =
            || TimingError::InvalidValue(format!("time shift of {delta_days} days leaves the clock range"));
        let delta_seconds = checked_days_to_seconds(delta_days).ok_or_else(out_of_range)?;
        let accumulated = self
            .shifts
            .timestamp_seconds
            .checked_add(delta_seconds)
            .ok_or_else(out_of_range)?;
        let shifted = self
            .columns
            .device_timestamp
            .iter()
            .map(|ts| ts.checked_add(delta_seconds))
            .collect::<Option<Vec<i64>>>()
            .ok_or_else(out_of_range)?;

        self.columns.time.iter_mut().for_each(|t| *t += delta_days);
        self.columns.device_timestamp = shifted;
        self.shifts.time_days += delta_days;
        self.shifts.timestamp_seconds = accumulated;
        Ok(())
    }

    /// Undoes every `shift_time` since load or the last reset.
    pub fn reset_time_shift(&mut self) {
        let ShiftState {
            time_days,
            timestamp_seconds,
            ..
        } = self.shifts;
        self.columns.time.iter_mut().for_each(|t| *t -= time_days);
        self.columns
            .device_timestamp
            .iter_mut()
            .for_each(|ts| *ts = ts.saturating_sub(timestamp_seconds));
        self.shifts.time_days = 0.0;
        self.shifts.timestamp_seconds = 0;
    }

    /// Restores everything captured at load, including header and cursor.
    pub fn reset(&mut self) {
        self.header = self.original.header.clone();
        self.columns = self.original.columns.clone();
        self.cursor = 0;
        self.shifts = ShiftState::default();
        debug!("run reset to {} loaded samples", self.len());
    }

    pub(crate) fn replace_offsets(&mut self, offsets: Vec<f64>) {
        debug_assert_eq!(offsets.len(), self.len());
        self.columns.offset = offsets;
    }
}

/// Index of the value closest to `target`; the first one wins on ties.
pub(crate) fn nearest_index(values: &[f64], target: f64) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, best_dist), (i, v)| {
            let dist = (v - target).abs();
            if dist < best_dist {
                (i, dist)
            } else {
                (best, best_dist)
            }
        })
        .0
}
