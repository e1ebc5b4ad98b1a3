// WatchTracker timing runs
// Main library entry point

pub mod core;

// Re-export main types
pub use crate::core::concat::{concat_runs, ConcatOptions};
pub use crate::core::error::{Coarseness, Result, TimingError};
pub use crate::core::format::{RateSeries, RunHeader, RunInfo, Sample};
pub use crate::core::reader::read_run;
pub use crate::core::resample::resample;
pub use crate::core::run::{RunSnapshot, TimingRun};
pub use crate::core::series::{plot_series, LegendMode, OffsetUnit, PlotData, PlotOptions, PlotSeries, TimeUnit};
pub use crate::core::smooth::{median_filter, MedianMode};
pub use crate::core::store::{SampleColumns, SampleStore};
pub use crate::core::writer::{save_csv, save_txt, write_csv, write_txt, CsvExportOptions};
