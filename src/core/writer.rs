// Exporters: WatchTracker CSV and plain text

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::constants::*;
use crate::core::error::Result;
use crate::core::store::SampleStore;

/// Overrides for the metadata block of an exported CSV. Empty strings fall
/// back to the run's own header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvExportOptions {
    pub watch_comment: String,
    pub run_name: String,
    pub run_comment: String,
}

fn or_else<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn escape_header(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Writes the WatchTracker CSV layout. Commas inside sample comments become
/// semicolons.
pub fn write_csv<S: SampleStore, W: Write>(
    store: &S,
    mut out: W,
    options: &CsvExportOptions,
) -> Result<()> {
    let header = store.header();
    let run_comment = or_else(
        &options.run_comment,
        or_else(&header.run_comment, DEFAULT_RUN_COMMENT),
    );
    let values = [
        header.watch_name.as_str(),
        or_else(&options.watch_comment, &header.watch_comment),
        or_else(&options.run_name, &header.run_name),
        run_comment,
        header.first_point.as_str(),
    ];

    writeln!(out, "{FILE_TITLE}")?;
    writeln!(out, "{FILE_GENERATOR}")?;
    writeln!(out)?;
    for (label, value) in HEADER_LABELS.iter().zip(values) {
        writeln!(out, "{},{}", label, escape_header(value))?;
    }
    writeln!(out)?;
    writeln!(out, "{COLUMN_TITLES}")?;

    for s in store.columns().iter() {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            s.time,
            s.offset,
            s.comment.replace(',', ";"),
            s.device_timestamp,
            s.error_a,
            s.error_b
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Writes time, offset and device timestamp as tab-separated columns under
/// a short `#` comment block.
pub fn write_txt<S: SampleStore, W: Write>(store: &S, mut out: W) -> Result<()> {
    writeln!(out, "# watch    : {}", store.header().watch_name)?;
    writeln!(out, "# start    : {}", store.start_label().unwrap_or_default())?;
    writeln!(out, "# end      : {}", store.end_label().unwrap_or_default())?;
    writeln!(out, "# duration : {}", store.duration_days())?;
    writeln!(
        out,
        "# columns  : time from start (days), offset (s), unix time stamp"
    )?;
    let columns = store.columns();
    for ((t, o), ts) in columns
        .time()
        .iter()
        .zip(columns.offset())
        .zip(columns.device_timestamp())
    {
        writeln!(out, "{t:5.2}\t{o:5.1}\t{ts}")?;
    }
    out.flush()?;
    Ok(())
}

fn with_extension(path: &Path, ext: &str) -> PathBuf {
    let matches = path
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext));
    if matches {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Saves as CSV, appending `.csv` when missing. Returns the path written.
pub fn save_csv<S: SampleStore>(
    store: &S,
    path: impl AsRef<Path>,
    options: &CsvExportOptions,
) -> Result<PathBuf> {
    let path = with_extension(path.as_ref(), "csv");
    write_csv(store, BufWriter::new(File::create(&path)?), options)?;
    info!("saved {} samples to {}", store.len(), path.display());
    Ok(path)
}

/// Saves as text. A trailing `.csv` is replaced by `.txt`.
pub fn save_txt<S: SampleStore>(store: &S, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("csv"));
    let path = if is_csv {
        path.with_extension("txt")
    } else {
        with_extension(path, "txt")
    };
    write_txt(store, BufWriter::new(File::create(&path)?))?;
    info!("saved {} samples to {}", store.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reader::read_run;
    use crate::core::reader::tests::SAMPLE_FILE;
    use crate::core::run::TimingRun;
    use std::io::Cursor;

    fn loaded() -> TimingRun {
        read_run(Cursor::new(SAMPLE_FILE), "week12.csv").unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let mut run = loaded();
        run.set_comment("wound, set");
        let mut buf = Vec::new();
        write_csv(&run, &mut buf, &CsvExportOptions::default()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], FILE_TITLE);
        assert_eq!(lines[3], "Watch name,Seamaster 300");
        assert_eq!(lines[6], "Timing run comment,\"dial up, then crown down\"");
        assert_eq!(lines[9], COLUMN_TITLES);
        assert_eq!(lines[10], "0,1.2,wound; set,1710748800,0.01,-0.02");
        // every sample is written, including the last
        assert_eq!(lines.len(), 13);
    }

    #[test]
    fn test_csv_reloads() {
        let mut run = loaded();
        run.shift_offset(0.5).unwrap();
        let options = CsvExportOptions {
            run_comment: "shifted".to_string(),
            ..CsvExportOptions::default()
        };
        let mut buf = Vec::new();
        write_csv(&run, &mut buf, &options).unwrap();

        let back = read_run(Cursor::new(buf), "again.csv").unwrap();
        assert_eq!(back.offset(), run.offset());
        assert_eq!(back.device_timestamp(), run.device_timestamp());
        assert_eq!(back.header().run_comment, "shifted");
        assert_eq!(back.header().watch_comment, "Cal. 8800");
    }

    #[test]
    fn test_txt_layout() {
        let run = loaded();
        let mut buf = Vec::new();
        write_txt(&run, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# watch    : Seamaster 300");
        assert_eq!(lines[3], "# duration : 2.5");
        assert_eq!(lines[5], " 0.00\t  1.2\t1710748800");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_save_paths() {
        let dir = tempfile::tempdir().unwrap();
        let run = loaded();

        let csv = save_csv(&run, dir.path().join("merged"), &CsvExportOptions::default()).unwrap();
        assert_eq!(csv, dir.path().join("merged.csv"));
        assert!(csv.exists());

        let txt = save_txt(&run, dir.path().join("week12.csv")).unwrap();
        assert_eq!(txt, dir.path().join("week12.txt"));
        let reloaded = TimingRun::open(&csv).unwrap();
        assert_eq!(reloaded.len(), run.len());
    }
}
