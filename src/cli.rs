//! Command-line arguments for watchtrack

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use watchtrack::{MedianMode, OffsetUnit, TimeUnit};

#[derive(Parser, Debug)]
#[command(name = "watchtrack")]
#[command(version)]
#[command(about = "Inspect, edit, merge and resample WatchTracker timing runs", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./watchtrack.json when present)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summary of a timing run
    Info { file: PathBuf },

    /// List every sample
    Points { file: PathBuf },

    /// Drift rate in seconds per day between neighbouring samples
    Rate { file: PathBuf },

    /// Plot-ready series as JSON
    Series {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_name = "hours|days|weeks")]
        x_unit: Option<TimeUnit>,
        #[arg(long, value_name = "seconds|minutes|hours")]
        y_unit: Option<OffsetUnit>,
        /// Label each series with the watch name as well as the start time
        #[arg(long)]
        watch_legend: bool,
        /// Use drift rate instead of offset
        #[arg(long)]
        rate: bool,
    },

    /// Shift the time axis and/or the offsets
    Shift {
        file: PathBuf,
        /// Days to add to every time value
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        time: f64,
        /// Seconds to add to every offset
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        offset: f64,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Running-median smoothing of the offsets
    Smooth {
        file: PathBuf,
        #[arg(long)]
        size: Option<usize>,
        #[arg(long, value_name = "reflect|constant|nearest|mirror|wrap")]
        mode: Option<MedianMode>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Resample onto a uniform time grid
    Resample {
        file: PathBuf,
        /// Grid points per original sample
        #[arg(short, long)]
        density: usize,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Join runs end to end
    Concat {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
        /// Keep each run's own offsets instead of joining them at the seam
        #[arg(long)]
        no_connect_offset: bool,
        /// Drop the first sample of every run after the first
        #[arg(long)]
        skip_first: bool,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Re-export a run as WatchTracker CSV or plain text
    Export {
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output file; `.txt` writes plain text, anything else WatchTracker CSV
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Watch comment for the CSV metadata block
    #[arg(long)]
    pub watch_comment: Option<String>,

    /// Run comment for the CSV metadata block
    #[arg(long)]
    pub run_comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_concat() {
        let cli = Cli::try_parse_from(["watchtrack", "concat", "a.csv", "b.csv", "--skip-first", "-o", "ab.csv"])
            .unwrap();
        match cli.command {
            Command::Concat {
                files,
                no_connect_offset,
                skip_first,
                output,
            } => {
                assert_eq!(files.len(), 2);
                assert!(!no_connect_offset);
                assert!(skip_first);
                assert_eq!(output.output, Some(PathBuf::from("ab.csv")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_concat_needs_two_files() {
        assert!(Cli::try_parse_from(["watchtrack", "concat", "a.csv"]).is_err());
    }

    #[test]
    fn test_parse_units_and_negative_shift() {
        let cli = Cli::try_parse_from(["watchtrack", "series", "a.csv", "--x-unit", "weeks", "--rate"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Series {
                x_unit: Some(TimeUnit::Weeks),
                y_unit: None,
                rate: true,
                ..
            }
        ));

        let cli = Cli::try_parse_from(["watchtrack", "shift", "a.csv", "--offset", "-2.5"]).unwrap();
        assert!(matches!(cli.command, Command::Shift { offset, .. } if offset == -2.5));
        assert!(Cli::try_parse_from(["watchtrack", "series", "a.csv", "--x-unit", "years"]).is_err());
    }
}
