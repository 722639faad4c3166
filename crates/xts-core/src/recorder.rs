//! Appending clocked time to sheets.
//!
//! A finished work session is written as one slashed interval line with the
//! hours worked as a trailing note, which the parser ignores:
//!
//! ```text
//! 2024/01/15 090000 -- 170000 ( 8.0)
//! ```
//!
//! Clocking in without clocking out leaves a start marker instead:
//!
//! ```text
//! 2024/01/15 090000 -- Start
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use fs2::FileExt;

use crate::calendar::midnight;
use crate::sheet::SheetError;
use crate::types::ValidationError;

/// Longest file stem produced by [`project_file_name`].
const MAX_FILE_STEM: usize = 250;

const LINE_TIMESTAMP: &str = "%Y/%m/%d %H%M%S";

/// Formats a finished interval as a sheet line, without the newline.
#[expect(clippy::cast_precision_loss, reason = "session lengths are far below 2^52 seconds")]
pub fn format_interval(start: DateTime<Utc>, stop: DateTime<Utc>) -> String {
    let hours = (stop.timestamp() - start.timestamp()) as f64 / 3600.0;
    format!(
        "{} -- {} ({hours:4.1})",
        start.with_timezone(&Local).format(LINE_TIMESTAMP),
        stop.with_timezone(&Local).format("%H%M%S"),
    )
}

/// Formats a start marker, without the newline.
pub fn format_start(start: DateTime<Utc>) -> String {
    format!("{} -- Start", start.with_timezone(&Local).format(LINE_TIMESTAMP))
}

/// Decodes a start marker line written by [`format_start`].
pub fn parse_start_marker(line: &str) -> Option<DateTime<Utc>> {
    let stamp = line.get(..17)?;
    let separator = line.get(17..21)?;
    let keyword = line.get(21..26)?;
    if separator != " -- " || !keyword.eq_ignore_ascii_case("start") {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(stamp, LINE_TIMESTAMP).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Appends a finished interval to the sheet.
///
/// A zero-length interval is still written, so it closes any start marker.
/// Returns `false` when nothing was written because `stop` is before `start`.
pub fn log_interval(path: &Path, start: DateTime<Utc>, stop: DateTime<Utc>) -> Result<bool, SheetError> {
    if stop.timestamp() < start.timestamp() {
        tracing::debug!(%start, %stop, "not logging a reversed interval");
        return Ok(false);
    }
    if midnight(start) != midnight(stop) {
        return Err(SheetError::SpansMidnight {
            path: path.to_path_buf(),
            start: start.with_timezone(&Local).format(LINE_TIMESTAMP).to_string(),
            stop: stop.with_timezone(&Local).format(LINE_TIMESTAMP).to_string(),
        });
    }
    append_line(path, &format_interval(start, stop))?;
    tracing::info!(path = %path.display(), %start, %stop, "logged interval");
    Ok(true)
}

/// Appends a start marker to the sheet.
pub fn note_start(path: &Path, start: DateTime<Utc>) -> Result<(), SheetError> {
    append_line(path, &format_start(start))?;
    tracing::info!(path = %path.display(), %start, "noted start");
    Ok(())
}

/// Appends one line under an exclusive lock.
fn append_line(path: &Path, line: &str) -> Result<(), SheetError> {
    let write_err = |source| SheetError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    file.lock_exclusive().map_err(write_err)?;
    writeln!(file, "{line}").map_err(write_err)?;
    Ok(())
}

/// File name for a project's sheet: lowercase, spaces become underscores,
/// non-printing characters are dropped.
pub fn project_file_name(project: &str) -> Result<String, ValidationError> {
    let mut stem: String = project
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_graphic() {
                Some(c.to_ascii_lowercase())
            } else {
                None
            }
        })
        .collect();
    if stem.is_empty() {
        return Err(ValidationError::Empty { field: "project name" });
    }
    if stem.len() > MAX_FILE_STEM {
        tracing::warn!(max = MAX_FILE_STEM, "truncating project file name");
        stem.truncate(MAX_FILE_STEM);
    }
    Ok(format!("{stem}.txt"))
}

/// Creates a sheet for a new project in `dir` with its name and rate.
///
/// Refuses to touch an existing file.
pub fn create_sheet(dir: &Path, project: &str, rate: &str) -> Result<PathBuf, SheetError> {
    let path = dir.join(project_file_name(project)?);
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(SheetError::AlreadyExists { path });
        }
        Err(source) => return Err(SheetError::Write { path, source }),
    };
    write!(file, "Project: {project}\nRate: {rate}\n").map_err(|source| SheetError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), project, "created sheet");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::line::{Line, TimeInterval, classify};

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn interval_line_format() {
        let line = format_interval(local(2024, 1, 15, 9, 0, 0), local(2024, 1, 15, 17, 0, 0));
        assert_eq!(line, "2024/01/15 090000 -- 170000 ( 8.0)");
    }

    #[test]
    fn interval_line_parses_back() {
        let start = local(2024, 1, 15, 9, 5, 30);
        let stop = local(2024, 1, 15, 10, 35, 30);
        let line = format_interval(start, stop);
        assert_eq!(
            classify(&line).unwrap(),
            Line::Interval(TimeInterval::Absolute { start, stop })
        );
    }

    #[test]
    fn start_marker_is_not_an_interval() {
        let start = local(2024, 1, 15, 9, 0, 0);
        let line = format_start(start);
        assert_eq!(line, "2024/01/15 090000 -- Start");
        assert_eq!(classify(&line).unwrap(), Line::Unrecognized);
        assert_eq!(parse_start_marker(&line), Some(start));
    }

    #[test]
    fn start_marker_rejects_other_lines() {
        assert_eq!(parse_start_marker("2024/01/15 090000 -- 170000"), None);
        assert_eq!(parse_start_marker("2024/01/15 0900 -- Start"), None);
        assert_eq!(parse_start_marker("Start"), None);
    }

    #[test]
    fn log_interval_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.txt");
        std::fs::write(&path, "Project: Test\n").unwrap();

        let written = log_interval(&path, local(2024, 1, 15, 9, 0, 0), local(2024, 1, 15, 9, 30, 0)).unwrap();

        assert!(written);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Project: Test\n2024/01/15 090000 -- 093000 ( 0.5)\n");
    }

    #[test]
    fn log_interval_writes_zero_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.txt");
        let when = local(2024, 1, 15, 9, 0, 0);

        assert!(log_interval(&path, when, when).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2024/01/15 090000 -- 090000 ( 0.0)\n");
        assert_eq!(
            classify(content.trim_end()).unwrap(),
            Line::Interval(TimeInterval::Absolute { start: when, stop: when })
        );
    }

    #[test]
    fn log_interval_skips_reversed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.txt");
        let when = local(2024, 1, 15, 9, 0, 0);

        assert!(!log_interval(&path, when, when - Duration::seconds(5)).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn log_interval_refuses_midnight_crossing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.txt");
        let start = local(2024, 1, 15, 23, 0, 0);

        let err = log_interval(&path, start, start + Duration::hours(2)).unwrap_err();
        assert!(matches!(err, SheetError::SpansMidnight { .. }));
    }

    #[test]
    fn note_start_appends_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.txt");
        note_start(&path, local(2024, 1, 15, 8, 15, 0)).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "2024/01/15 081500 -- Start\n"
        );
    }

    #[test]
    fn project_file_name_normalizes() {
        assert_eq!(project_file_name("Test Project").unwrap(), "test_project.txt");
        assert_eq!(project_file_name("ACME/42").unwrap(), "acme/42.txt");
        assert!(project_file_name("").is_err());
    }

    #[test]
    fn project_file_name_truncates() {
        let long = "x".repeat(300);
        assert_eq!(project_file_name(&long).unwrap().len(), MAX_FILE_STEM + 4);
    }

    #[test]
    fn create_sheet_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_sheet(dir.path(), "test project", "33.3").unwrap();

        assert_eq!(path, dir.path().join("test_project.txt"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Project: test project\nRate: 33.3\n"
        );
    }

    #[test]
    fn create_sheet_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        create_sheet(dir.path(), "alpha", "10").unwrap();
        let err = create_sheet(dir.path(), "Alpha", "20").unwrap_err();
        assert!(matches!(err, SheetError::AlreadyExists { .. }));
    }
}
