// Plot-ready series for external renderers

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::error::{Result, TimingError};
use crate::core::store::SampleStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hours,
    #[default]
    Days,
    Weeks,
}

impl TimeUnit {
    /// Multiplier from days.
    pub fn scale(&self) -> f64 {
        match self {
            TimeUnit::Hours => 24.0,
            TimeUnit::Days => 1.0,
            TimeUnit::Weeks => 1.0 / 7.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hours" => Ok(TimeUnit::Hours),
            "days" => Ok(TimeUnit::Days),
            "weeks" => Ok(TimeUnit::Weeks),
            _ => Err(TimingError::InvalidValue(format!(
                "unknown time unit '{s}', expected hours, days or weeks"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl OffsetUnit {
    /// Multiplier from seconds.
    pub fn scale(&self) -> f64 {
        match self {
            OffsetUnit::Seconds => 1.0,
            OffsetUnit::Minutes => 1.0 / 60.0,
            OffsetUnit::Hours => 1.0 / 3600.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetUnit::Seconds => "seconds",
            OffsetUnit::Minutes => "minutes",
            OffsetUnit::Hours => "hours",
        }
    }
}

impl FromStr for OffsetUnit {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "seconds" => Ok(OffsetUnit::Seconds),
            "minutes" => Ok(OffsetUnit::Minutes),
            "hours" => Ok(OffsetUnit::Hours),
            _ => Err(TimingError::InvalidValue(format!(
                "unknown offset unit '{s}', expected seconds, minutes or hours"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendMode {
    /// Start time only.
    #[default]
    Start,
    /// Watch name and start time.
    WatchAndStart,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    pub time_unit: TimeUnit,
    pub offset_unit: OffsetUnit,
    pub legend: LegendMode,
    /// Plot drift rate instead of raw offset.
    pub rate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSeries {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotData {
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<PlotSeries>,
}

/// Scales each run to the requested units and labels it for a legend.
pub fn plot_series<S: SampleStore>(runs: &[S], options: &PlotOptions) -> Result<PlotData> {
    if runs.is_empty() {
        return Err(TimingError::InvalidValue("nothing to plot".to_string()));
    }
    let xs = options.time_unit.scale();
    let ys = options.offset_unit.scale();

    let series = runs
        .iter()
        .map(|run| -> Result<PlotSeries> {
            let start = run.start_label().unwrap_or_default();
            let label = match options.legend {
                LegendMode::Start => start,
                LegendMode::WatchAndStart => format!("{}, {}", run.header().watch_name, start),
            };
            let (x, y): (Vec<f64>, Vec<f64>) = if options.rate {
                run.rate()?.pairs().map(|(t, r)| (t * xs, r * ys)).unzip()
            } else {
                let columns = run.columns();
                columns
                    .time()
                    .iter()
                    .zip(columns.offset())
                    .map(|(t, o)| (t * xs, o * ys))
                    .unzip()
            };
            Ok(PlotSeries { label, x, y })
        })
        .collect::<Result<Vec<_>>>()?;

    let quantity = if options.rate { "Rate" } else { "Offset" };
    let per_day = if options.rate { "/day" } else { "" };
    Ok(PlotData {
        x_label: format!("Time, {}", options.time_unit.as_str()),
        y_label: format!("{quantity}, {}{per_day}", options.offset_unit.as_str()),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::run::tests::run_from;

    #[test]
    fn test_offset_series_scaled() {
        let run = run_from(&[0.0, 1.0, 2.0], &[0.0, 60.0, 120.0]);
        let options = PlotOptions {
            time_unit: TimeUnit::Hours,
            offset_unit: OffsetUnit::Minutes,
            legend: LegendMode::WatchAndStart,
            rate: false,
        };
        let data = plot_series(&[run], &options).unwrap();
        assert_eq!(data.x_label, "Time, hours");
        assert_eq!(data.y_label, "Offset, minutes");
        assert_eq!(data.series[0].x, vec![0.0, 24.0, 48.0]);
        for (y, expected) in data.series[0].y.iter().zip([0.0, 1.0, 2.0]) {
            assert!((y - expected).abs() < 1e-12);
        }
        assert!(data.series[0].label.starts_with("Speedmaster, "));
    }

    #[test]
    fn test_rate_series() {
        let run = run_from(&[0.0, 1.0, 2.0], &[0.0, 2.0, 3.0]);
        let options = PlotOptions {
            rate: true,
            ..PlotOptions::default()
        };
        let data = plot_series(&[run], &options).unwrap();
        assert_eq!(data.y_label, "Rate, seconds/day");
        assert_eq!(data.series[0].x, vec![0.5, 1.5]);
        assert_eq!(data.series[0].y, vec![2.0, 1.0]);
    }

    #[test]
    fn test_rejects_empty_and_short_runs() {
        let none: [crate::core::run::TimingRun; 0] = [];
        assert!(plot_series(&none, &PlotOptions::default()).is_err());
        let single = run_from(&[0.0], &[0.0]);
        let options = PlotOptions {
            rate: true,
            ..PlotOptions::default()
        };
        assert!(plot_series(&[single], &options).is_err());
    }

    #[test]
    fn test_options_from_json() {
        let options: PlotOptions =
            serde_json::from_str(r#"{"time_unit":"weeks","legend":"watch_and_start"}"#).unwrap();
        assert_eq!(options.time_unit, TimeUnit::Weeks);
        assert_eq!(options.offset_unit, OffsetUnit::Seconds);
        assert_eq!(options.legend, LegendMode::WatchAndStart);
        assert_eq!("HOURS".parse::<OffsetUnit>().unwrap(), OffsetUnit::Hours);
    }
}
