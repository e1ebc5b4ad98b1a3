// Data structures for timing runs

use serde::{Deserialize, Serialize};

use crate::core::constants::*;

/// The five metadata rows at the top of a WatchTracker file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHeader {
    pub watch_name: String,
    pub watch_comment: String,
    pub run_name: String,
    pub run_comment: String,
    pub first_point: String,
}

impl RunHeader {
    pub fn new(watch_name: impl Into<String>) -> Self {
        Self {
            watch_name: watch_name.into(),
            watch_comment: String::new(),
            run_name: String::new(),
            run_comment: String::new(),
            first_point: String::new(),
        }
    }

    /// Header for a run stitched together from several files.
    pub fn merged(first_point: impl Into<String>) -> Self {
        Self {
            watch_name: MERGED_WATCH.to_string(),
            watch_comment: MERGED_WATCH_COMMENT.to_string(),
            run_name: MERGED_RUN.to_string(),
            run_comment: MERGED_RUN_COMMENT.to_string(),
            first_point: first_point.into(),
        }
    }

    pub fn from_fields(fields: [String; HEADER_ROWS]) -> Self {
        let [watch_name, watch_comment, run_name, run_comment, first_point] = fields;
        Self {
            watch_name,
            watch_comment,
            run_name,
            run_comment,
            first_point,
        }
    }

    pub fn fields(&self) -> [&str; HEADER_ROWS] {
        [
            &self.watch_name,
            &self.watch_comment,
            &self.run_name,
            &self.run_comment,
            &self.first_point,
        ]
    }
}

/// One row of a timing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Days since the run started.
    pub time: f64,
    /// Seconds ahead of (positive) or behind the reference clock.
    pub offset: f64,
    pub comment: String,
    /// Epoch seconds reported by the logging device.
    pub device_timestamp: i64,
    /// Error estimate of the reference (atomic) clock.
    pub error_a: f64,
    /// Offset of the device clock itself.
    pub error_b: f64,
}

/// Rate of drift between consecutive samples, in seconds per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSeries {
    pub time: Vec<f64>,
    pub rate: Vec<f64>,
    pub start: Option<String>,
}

impl RateSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time.iter().copied().zip(self.rate.iter().copied())
    }
}

/// Summary shown by `watchtrack info`.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub watch: String,
    pub file: String,
    pub path: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration: f64,
    pub data_points: usize,
}
