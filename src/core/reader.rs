// WatchTracker CSV loader

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::core::constants::*;
use crate::core::error::{Result, TimingError};
use crate::core::format::{RunHeader, Sample};
use crate::core::run::TimingRun;
use crate::core::store::{SampleColumns, SampleStore};

impl TimingRun {
    /// Loads a WatchTracker CSV file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let run = read_run(BufReader::new(file), &file_name)?;
        info!("loaded {} ({} samples)", path.display(), run.columns().len());
        Ok(run.with_source(Some(path), file_name))
    }
}

/// Parses a WatchTracker CSV stream. Any malformed data row aborts the load.
pub fn read_run<R: BufRead>(reader: R, file_name: &str) -> Result<TimingRun> {
    let mut header: Vec<String> = Vec::with_capacity(HEADER_ROWS);
    let mut columns = SampleColumns::new();

    for (row, line) in reader.lines().enumerate() {
        let line = line?;
        let header_rows = HEADER_FIRST_ROW..HEADER_FIRST_ROW + HEADER_ROWS;
        if header_rows.contains(&row) {
            let fields = split_fields(&line);
            let value = fields.get(1).ok_or_else(|| {
                TimingError::MissingHeader(format!(
                    "line {} has no value for '{}'",
                    row + 1,
                    HEADER_LABELS[row - HEADER_FIRST_ROW]
                ))
            })?;
            header.push(value.clone());
        } else if row >= DATA_FIRST_ROW {
            if line.trim().is_empty() {
                continue;
            }
            columns.push(parse_row(&line, row + 1)?);
        }
    }

    let header: [String; HEADER_ROWS] = header.try_into().map_err(|got: Vec<String>| {
        TimingError::MissingHeader(format!(
            "expected {} metadata rows in {}, found {}",
            HEADER_ROWS,
            file_name,
            got.len()
        ))
    })?;

    debug!("parsed {} data rows from {}", columns.len(), file_name);
    let run = TimingRun::new(RunHeader::from_fields(header), columns)?;
    Ok(run.with_source(None, file_name))
}

fn parse_row(line: &str, line_no: usize) -> Result<Sample> {
    let fields = split_fields(line);
    if fields.len() < DATA_COLUMNS {
        return Err(TimingError::MalformedRow {
            line: line_no,
            reason: format!("expected {} fields, found {}", DATA_COLUMNS, fields.len()),
        });
    }

    let number = |idx: usize, name: &str| -> Result<f64> {
        fields[idx].trim().parse::<f64>().map_err(|e| TimingError::MalformedRow {
            line: line_no,
            reason: format!("{name} '{}': {e}", fields[idx]),
        })
    };
    let device_timestamp = fields[3]
        .trim()
        .parse::<i64>()
        .map_err(|e| TimingError::MalformedRow {
            line: line_no,
            reason: format!("unix time '{}': {e}", fields[3]),
        })?;

    Ok(Sample {
        time: number(0, "days")?,
        offset: number(1, "offset")?,
        comment: fields[2].clone(),
        device_timestamp,
        error_a: number(4, "atomic clock error")?,
        error_b: number(5, "iOS clock offset")?,
    })
}

/// Splits one CSV line. Double-quoted fields may contain commas; a doubled
/// quote inside them stands for one quote.
pub(crate) fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    pub(crate) const SAMPLE_FILE: &str = "Timing run file
Generated by WatchTracker

Watch name,Seamaster 300
Watch comment,Cal. 8800
Timing run name,Week 12
Timing run comment,\"dial up, then crown down\"
First data point,2024-03-18 08:00

Days,Offset,Comment,UNIX time,Atomic clock error,iOS clock offset
0.0,1.2,start,1710748800,0.01,-0.02
1.0,3.4,,1710835200,0.02,-0.01
2.5,6.1,\"worn, desk\",1710964800,0.01,0.0
";

    #[test]
    fn test_split_fields() {
        assert_eq!(split_fields("a,b,,c"), vec!["a", "b", "", "c"]);
        assert_eq!(split_fields("\"x, y\",\"say \"\"hi\"\"\""), vec!["x, y", "say \"hi\""]);
        assert_eq!(split_fields("1,2\r"), vec!["1", "2"]);
    }

    #[test]
    fn test_read_run() {
        let run = read_run(Cursor::new(SAMPLE_FILE), "week12.csv").unwrap();
        assert_eq!(run.len(), 3);
        assert_eq!(run.header().watch_name, "Seamaster 300");
        assert_eq!(run.header().run_comment, "dial up, then crown down");
        assert_eq!(run.header().first_point, "2024-03-18 08:00");
        assert_eq!(run.time(), &[0.0, 1.0, 2.5]);
        assert_eq!(run.comment()[2], "worn, desk");
        assert_eq!(run.device_timestamp()[1], 1_710_835_200);
        assert_eq!(run.error_b()[0], -0.02);
        assert_eq!(run.file_name(), "week12.csv");
        assert_eq!(run.duration_days(), 2.5);
    }

    #[test]
    fn test_malformed_number_aborts() {
        let broken = SAMPLE_FILE.replace("3.4", "fast");
        let err = read_run(Cursor::new(broken), "x.csv").unwrap_err();
        assert!(matches!(err, TimingError::MalformedRow { line: 12, .. }));
    }

    #[test]
    fn test_short_row_aborts() {
        let broken = SAMPLE_FILE.replace("0.01,0.0\n", "\n");
        let err = read_run(Cursor::new(broken), "x.csv").unwrap_err();
        assert!(matches!(err, TimingError::MalformedRow { line: 13, .. }));
    }

    #[test]
    fn test_missing_header_and_empty_data() {
        let err = read_run(Cursor::new("Timing run file\n\n\nWatch name,A\n"), "x.csv").unwrap_err();
        assert!(matches!(err, TimingError::MissingHeader(_)));

        let header_only: String = SAMPLE_FILE.lines().take(10).collect::<Vec<_>>().join("\n");
        let err = read_run(Cursor::new(header_only), "x.csv").unwrap_err();
        assert!(matches!(err, TimingError::TooFewSamples { .. }));
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_FILE.as_bytes()).unwrap();
        let run = TimingRun::open(file.path()).unwrap();
        assert_eq!(run.source(), Some(file.path()));
        assert_eq!(run.len(), 3);
        assert!(matches!(
            TimingRun::open(file.path().with_extension("missing")),
            Err(TimingError::Io(_))
        ));
    }
}
