// Index-aligned sample columns and the read-only store interface

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TimingError};
use crate::core::format::{RateSeries, RunHeader, Sample};

/// The six per-sample columns of a timing run. Every column always has the
/// same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawColumns")]
pub struct SampleColumns {
    pub(crate) time: Vec<f64>,
    pub(crate) offset: Vec<f64>,
    pub(crate) comment: Vec<String>,
    pub(crate) device_timestamp: Vec<i64>,
    pub(crate) error_a: Vec<f64>,
    pub(crate) error_b: Vec<f64>,
}

// Deserialized shape before the length check
#[derive(Deserialize)]
struct RawColumns {
    time: Vec<f64>,
    offset: Vec<f64>,
    comment: Vec<String>,
    device_timestamp: Vec<i64>,
    error_a: Vec<f64>,
    error_b: Vec<f64>,
}

impl TryFrom<RawColumns> for SampleColumns {
    type Error = TimingError;

    fn try_from(raw: RawColumns) -> Result<Self> {
        Self::from_parts(
            raw.time,
            raw.offset,
            raw.comment,
            raw.device_timestamp,
            raw.error_a,
            raw.error_b,
        )
    }
}

impl SampleColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            time: Vec::with_capacity(cap),
            offset: Vec::with_capacity(cap),
            comment: Vec::with_capacity(cap),
            device_timestamp: Vec::with_capacity(cap),
            error_a: Vec::with_capacity(cap),
            error_b: Vec::with_capacity(cap),
        }
    }

    /// Builds columns from separate vectors, checking that they line up.
    pub fn from_parts(
        time: Vec<f64>,
        offset: Vec<f64>,
        comment: Vec<String>,
        device_timestamp: Vec<i64>,
        error_a: Vec<f64>,
        error_b: Vec<f64>,
    ) -> Result<Self> {
        let columns = Self {
            time,
            offset,
            comment,
            device_timestamp,
            error_a,
            error_b,
        };
        columns.check_aligned()?;
        Ok(columns)
    }

    /// Fails with [`TimingError::ColumnMismatch`] unless every column has
    /// as many values as `time`.
    pub fn check_aligned(&self) -> Result<()> {
        let len = self.time.len();
        let lengths = [
            ("offset", self.offset.len()),
            ("comment", self.comment.len()),
            ("device_timestamp", self.device_timestamp.len()),
            ("error_a", self.error_a.len()),
            ("error_b", self.error_b.len()),
        ];
        match lengths.iter().find(|(_, l)| *l != len) {
            Some((name, other)) => Err(TimingError::ColumnMismatch(format!(
                "time has {len} values but {name} has {other}"
            ))),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn offset(&self) -> &[f64] {
        &self.offset
    }

    pub fn comment(&self) -> &[String] {
        &self.comment
    }

    pub fn device_timestamp(&self) -> &[i64] {
        &self.device_timestamp
    }

    pub fn error_a(&self) -> &[f64] {
        &self.error_a
    }

    pub fn error_b(&self) -> &[f64] {
        &self.error_b
    }

    pub fn get(&self, index: usize) -> Option<Sample> {
        (index < self.len()).then(|| self.sample_at(index))
    }

    /// Panics if `index` is out of range.
    pub(crate) fn sample_at(&self, index: usize) -> Sample {
        Sample {
            time: self.time[index],
            offset: self.offset[index],
            comment: self.comment[index].clone(),
            device_timestamp: self.device_timestamp[index],
            error_a: self.error_a[index],
            error_b: self.error_b[index],
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.time.push(sample.time);
        self.offset.push(sample.offset);
        self.comment.push(sample.comment);
        self.device_timestamp.push(sample.device_timestamp);
        self.error_a.push(sample.error_a);
        self.error_b.push(sample.error_b);
    }

    /// Inserts into every column at once. `index` may equal `len()`.
    pub(crate) fn insert(&mut self, index: usize, sample: Sample) {
        self.time.insert(index, sample.time);
        self.offset.insert(index, sample.offset);
        self.comment.insert(index, sample.comment);
        self.device_timestamp.insert(index, sample.device_timestamp);
        self.error_a.insert(index, sample.error_a);
        self.error_b.insert(index, sample.error_b);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Sample {
        Sample {
            time: self.time.remove(index),
            offset: self.offset.remove(index),
            comment: self.comment.remove(index),
            device_timestamp: self.device_timestamp.remove(index),
            error_a: self.error_a.remove(index),
            error_b: self.error_b.remove(index),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).map(move |i| self.sample_at(i))
    }
}

impl FromIterator<Sample> for SampleColumns {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let mut columns = SampleColumns::new();
        for sample in iter {
            columns.push(sample);
        }
        columns
    }
}

pub(crate) fn format_local(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| {
        dt.with_timezone(&Local)
            .format("%Y-%m-%d,%H:%M:%S")
            .to_string()
    })
}

/// Read access to anything that holds a timing run. Exporters, plot series
/// and concatenation accept any implementor.
pub trait SampleStore {
    fn header(&self) -> &RunHeader;

    fn columns(&self) -> &SampleColumns;

    fn len(&self) -> usize {
        self.columns().len()
    }

    fn is_empty(&self) -> bool {
        self.columns().is_empty()
    }

    fn start(&self) -> Option<DateTime<Utc>> {
        let first = *self.columns().device_timestamp.first()?;
        DateTime::from_timestamp(first, 0)
    }

    fn end(&self) -> Option<DateTime<Utc>> {
        let last = *self.columns().device_timestamp.last()?;
        DateTime::from_timestamp(last, 0)
    }

    /// Local-time label for the first sample, as used in legends.
    fn start_label(&self) -> Option<String> {
        format_local(*self.columns().device_timestamp.first()?)
    }

    fn end_label(&self) -> Option<String> {
        format_local(*self.columns().device_timestamp.last()?)
    }

    fn duration_seconds(&self) -> i64 {
        let ts = &self.columns().device_timestamp;
        match (ts.first(), ts.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        }
    }

    /// Run length in days, rounded to two decimals.
    fn duration_days(&self) -> f64 {
        let days = self.duration_seconds() as f64 / crate::core::constants::SECONDS_PER_DAY;
        (days * 100.0).round() / 100.0
    }

    /// Drift rate between each pair of neighbouring samples.
    ///
    /// Samples sharing a time value give an infinite or NaN rate; those are
    /// passed through untouched.
    fn rate(&self) -> Result<RateSeries> {
        let columns = self.columns();
        if columns.len() < 2 {
            return Err(TimingError::TooFewSamples {
                needed: 2,
                got: columns.len(),
            });
        }
        let (time, rate) = columns
            .time
            .windows(2)
            .zip(columns.offset.windows(2))
            .map(|(t, o)| ((t[0] + t[1]) / 2.0, (o[1] - o[0]) / (t[1] - t[0])))
            .unzip();
        Ok(RateSeries {
            time,
            rate,
            start: self.start_label(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, offset: f64) -> Sample {
        Sample {
            time,
            offset,
            comment: String::new(),
            device_timestamp: 1_700_000_000 + (time * 86_400.0) as i64,
            error_a: 0.0,
            error_b: 0.0,
        }
    }

    #[test]
    fn test_from_parts_rejects_mismatch() {
        let err = SampleColumns::from_parts(
            vec![0.0, 1.0],
            vec![0.0],
            vec![String::new(); 2],
            vec![0; 2],
            vec![0.0; 2],
            vec![0.0; 2],
        )
        .unwrap_err();
        assert!(matches!(err, TimingError::ColumnMismatch(_)));
    }

    #[test]
    fn test_deserialize_checks_lengths() {
        let json = r#"{"time":[0.0,1.0],"offset":[0.0],"comment":["",""],"device_timestamp":[0,0],"error_a":[0.0,0.0],"error_b":[0.0,0.0]}"#;
        let err = serde_json::from_str::<SampleColumns>(json).unwrap_err();
        assert!(err.to_string().contains("offset has 1"));

        let columns: SampleColumns = [sample(0.0, 1.0), sample(1.0, 2.0)].into_iter().collect();
        let json = serde_json::to_string(&columns).unwrap();
        assert_eq!(serde_json::from_str::<SampleColumns>(&json).unwrap(), columns);
    }

    #[test]
    fn test_insert_remove_keep_alignment() {
        let mut columns: SampleColumns = (0..3).map(|i| sample(i as f64, i as f64)).collect();
        columns.insert(1, sample(0.5, 9.0));
        assert_eq!(columns.time(), &[0.0, 0.5, 1.0, 2.0]);
        assert_eq!(columns.offset(), &[0.0, 9.0, 1.0, 2.0]);
        assert_eq!(columns.comment().len(), 4);
        assert_eq!(columns.error_b().len(), 4);

        let removed = columns.remove(0);
        assert_eq!(removed.time, 0.0);
        assert_eq!(columns.len(), 3);
        assert_eq!(columns.device_timestamp().len(), 3);
        assert_eq!(columns.get(0).unwrap().offset, 9.0);
        assert!(columns.get(3).is_none());
    }
}
