//! Tab-separated daily log files.
//!
//! One file per local calendar day, named `YYYY_M_D.tsv` (no zero padding).
//! The header is `time` followed by the object names fixed at construction.
//! Reopening an existing day file appends rows without repeating the header.

use crate::monitor::sinks::CycleSink;
use crate::monitor::{CycleOutput, ValueMap};
use crate::trace::{trace_event, trace_warn};
use crate::util::InspectResult;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// File name used for the log of `date`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("{}_{}_{}.tsv", date.year(), date.month(), date.day())
}

/// One timestamped row.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub time: DateTime<Local>,
    pub values: ValueMap,
}

impl LogRecord {
    pub fn new(time: DateTime<Local>, values: ValueMap) -> Self {
        Self { time, values }
    }
}

impl From<&CycleOutput> for LogRecord {
    fn from(output: &CycleOutput) -> Self {
        Self::new(output.captured_at, output.values.clone())
    }
}

struct OpenLog {
    date: NaiveDate,
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Daily-rotating TSV writer.
pub struct TsvLogger {
    dir: PathBuf,
    names: Vec<String>,
    every: Duration,
    last_written: Option<DateTime<Local>>,
    current: Option<OpenLog>,
    rows: u64,
}

impl TsvLogger {
    /// Prepares a logger writing under `dir`, creating it when missing.
    ///
    /// Rows closer than `every` to the previously written row are dropped;
    /// `Duration::ZERO` keeps every row.
    pub fn new<P: AsRef<Path>>(dir: P, names: Vec<String>, every: Duration) -> InspectResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            trace_warn!(
                "log_dir_created",
                "log directory did not exist",
                path = dir.display().to_string().as_str()
            );
            fs::create_dir_all(&dir)?;
        }
        Ok(Self {
            dir,
            names,
            every,
            last_written: None,
            current: None,
            rows: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Path of the file currently open, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|log| log.path.as_path())
    }

    /// Number of rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Writes `record` unless throttled. Returns whether a row was written.
    ///
    /// Columns missing from the record are left empty; values for names that
    /// are not columns are ignored.
    pub fn write(&mut self, record: &LogRecord) -> InspectResult<bool> {
        if let Some(last) = self.last_written {
            // A clock that moved backwards never throttles.
            let throttled = (record.time - last)
                .to_std()
                .map(|gap| gap < self.every)
                .unwrap_or(false);
            if throttled {
                return Ok(false);
            }
        }

        let date = record.time.date_naive();
        let names = &self.names;
        let log = match &mut self.current {
            Some(log) if log.date == date => log,
            slot => {
                if let Some(mut old) = slot.take() {
                    old.writer.flush()?;
                    trace_event!("log_rotated", rows = self.rows);
                }
                slot.insert(open_day(&self.dir, date, names)?)
            }
        };

        let mut line = record.time.format(TIME_FORMAT).to_string();
        for name in names {
            line.push('\t');
            if let Some(value) = record.values.get(name) {
                line.push_str(&sanitize(&value.to_string()));
            }
        }
        writeln!(log.writer, "{line}")?;
        log.writer.flush()?;

        self.last_written = Some(record.time);
        self.rows += 1;
        Ok(true)
    }

    /// Flushes and closes the current file.
    pub fn close(&mut self) -> InspectResult<()> {
        if let Some(mut log) = self.current.take() {
            log.writer.flush()?;
        }
        Ok(())
    }
}

fn open_day(dir: &Path, date: NaiveDate, names: &[String]) -> InspectResult<OpenLog> {
    let path = dir.join(log_file_name(date));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let fresh = file.metadata()?.len() == 0;
    let mut writer = BufWriter::new(file);
    if fresh {
        let mut header = String::from("time");
        for name in names {
            header.push('\t');
            header.push_str(&sanitize(name));
        }
        writeln!(writer, "{header}")?;
    }
    Ok(OpenLog { date, path, writer })
}

fn sanitize(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

impl CycleSink for TsvLogger {
    fn consume(&mut self, output: &CycleOutput) -> InspectResult<()> {
        self.write(&LogRecord::from(output)).map(|_| ())
    }
}

impl Drop for TsvLogger {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::{log_file_name, sanitize};
    use chrono::NaiveDate;

    #[test]
    fn file_names_are_not_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(log_file_name(date), "2024_3_7.tsv");
        let date = NaiveDate::from_ymd_opt(2023, 12, 25).unwrap();
        assert_eq!(log_file_name(date), "2023_12_25.tsv");
    }

    #[test]
    fn separators_are_stripped_from_cells() {
        assert_eq!(sanitize("a\tb\nc"), "a b c");
    }
}
