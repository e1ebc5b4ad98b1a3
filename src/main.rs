use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

mod cli;
mod models;
mod utils;

use crate::cli::{Cli, Command, OutputArgs};
use crate::models::config_model::TrackerConfig;
use crate::utils::conf_helper::{init_config, resolve_input, DEFAULT_CONFIG_FILE};
use watchtrack::{
    concat_runs, plot_series, resample, save_csv, save_txt, ConcatOptions, CsvExportOptions,
    LegendMode, RunHeader, SampleColumns, SampleStore, TimingRun,
};

#[derive(Serialize)]
struct RunDump<'a> {
    header: &'a RunHeader,
    samples: &'a SampleColumns,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = init_config(cli.config.as_deref())?;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    info!(
        "config {} with {} data folders, log level {}",
        cli.config
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE))
            .display(),
        config.data_dirs.len(),
        level
    );

    run(cli.command, config)
}

fn open(file: &Path, config: &TrackerConfig) -> Result<TimingRun> {
    let path = resolve_input(file, &config.data_dirs)?;
    TimingRun::open(&path).with_context(|| format!("loading {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `run` to the requested file, or dumps it as JSON on stdout.
fn emit(run: &TimingRun, output: &OutputArgs, config: &TrackerConfig) -> Result<()> {
    let Some(path) = &output.output else {
        return print_json(&RunDump {
            header: run.header(),
            samples: run.columns(),
        });
    };

    let is_txt = path
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("txt"));
    let written: PathBuf = if is_txt {
        save_txt(run, path)?
    } else {
        let options = CsvExportOptions {
            watch_comment: output
                .watch_comment
                .clone()
                .unwrap_or_else(|| config.export.watch_comment.clone()),
            run_name: String::new(),
            run_comment: output
                .run_comment
                .clone()
                .unwrap_or_else(|| config.export.run_comment.clone()),
        };
        save_csv(run, path, &options)?
    };
    info!("wrote {}", written.display());
    Ok(())
}

fn run(command: Command, config: &TrackerConfig) -> Result<()> {
    match command {
        Command::Info { file } => print_json(&open(&file, config)?.info()),

        Command::Points { file } => {
            for line in open(&file, config)?.list_points() {
                println!("{line}");
            }
            Ok(())
        }

        Command::Rate { file } => print_json(&open(&file, config)?.rate()?),

        Command::Series {
            files,
            x_unit,
            y_unit,
            watch_legend,
            rate,
        } => {
            let runs = files
                .iter()
                .map(|f| open(f, config))
                .collect::<Result<Vec<_>>>()?;
            let mut options = config.plot.clone();
            options.time_unit = x_unit.unwrap_or(options.time_unit);
            options.offset_unit = y_unit.unwrap_or(options.offset_unit);
            options.rate |= rate;
            if watch_legend {
                options.legend = LegendMode::WatchAndStart;
            }
            print_json(&plot_series(&runs, &options)?)
        }

        Command::Shift {
            file,
            time,
            offset,
            output,
        } => {
            let mut run = open(&file, config)?;
            run.shift_time(time)?;
            run.shift_offset(offset)?;
            emit(&run, &output, config)
        }

        Command::Smooth {
            file,
            size,
            mode,
            output,
        } => {
            let mut run = open(&file, config)?;
            run.smooth(
                size.unwrap_or(config.smoothing.size),
                mode.unwrap_or(config.smoothing.mode),
            )?;
            emit(&run, &output, config)
        }

        Command::Resample {
            file,
            density,
            output,
        } => {
            let run = open(&file, config)?;
            let resampled = resample(&run, density)
                .with_context(|| format!("resampling {} x{}", file.display(), density))?;
            emit(&resampled, &output, config)
        }

        Command::Concat {
            files,
            no_connect_offset,
            skip_first,
            output,
        } => {
            let runs = files
                .iter()
                .map(|f| open(f, config))
                .collect::<Result<Vec<_>>>()?;
            let options = ConcatOptions {
                connect_offset: !no_connect_offset,
                skip_first,
            };
            emit(&concat_runs(&runs, options)?, &output, config)
        }

        Command::Export { file, output } => emit(&open(&file, config)?, &output, config),
    }
}
