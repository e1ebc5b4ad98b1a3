use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use watchtrack::core::constants::DEFAULT_RUN_COMMENT;
use watchtrack::{MedianMode, PlotOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Folders searched, in order, for input files given by bare name.
    pub data_dirs: Vec<PathBuf>,
    pub log_level: String,
    pub plot: PlotOptions,
    pub smoothing: Smoothing,
    pub export: Export,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_dirs: Vec::new(),
            log_level: "info".to_string(),
            plot: PlotOptions::default(),
            smoothing: Smoothing::default(),
            export: Export::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Smoothing {
    pub size: usize,
    pub mode: MedianMode,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self {
            size: 3,
            mode: MedianMode::Reflect,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Export {
    pub watch_comment: String,
    pub run_comment: String,
}

impl Default for Export {
    fn default() -> Self {
        Self {
            watch_comment: String::new(),
            run_comment: DEFAULT_RUN_COMMENT.to_string(),
        }
    }
}
