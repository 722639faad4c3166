//! Reading timesheet files.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::accumulate::{Accumulator, ReportSink};
use crate::line::ParseError;
use crate::types::ValidationError;

/// Errors reading or writing a sheet.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The sheet could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The sheet could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line failed its consistency check.
    #[error("{}:{line_number}: {source}", path.display())]
    Inconsistent {
        path: PathBuf,
        line_number: usize,
        #[source]
        source: ParseError,
    },

    /// A new sheet would overwrite an existing file.
    #[error("{} already exists, refusing to overwrite it", path.display())]
    AlreadyExists { path: PathBuf },

    /// A value intended for the sheet was rejected.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("already clocked in to {} since {since}", path.display())]
    AlreadyClockedIn { path: PathBuf, since: String },

    #[error("not clocked in to {}", path.display())]
    NotClockedIn { path: PathBuf },

    /// A clocked interval ran past midnight and cannot be written as one line.
    #[error("interval from {start} to {stop} crosses midnight, split it by hand in {}", path.display())]
    SpansMidnight {
        path: PathBuf,
        start: String,
        stop: String,
    },
}

/// Calls `f` for every line of the file at `path`, numbering from 1.
///
/// Lines are decoded lossily so a stray non-UTF-8 byte cannot hide the rest
/// of the sheet.
pub fn for_each_line<F>(path: &Path, f: F) -> Result<(), SheetError>
where
    F: FnMut(&str) -> Result<(), ParseError>,
{
    let file = File::open(path).map_err(|source| SheetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    for_each_line_in(BufReader::new(file), path, f)
}

/// Like [`for_each_line`], for any reader. `path` is only used in errors.
pub fn for_each_line_in<R, F>(mut reader: R, path: &Path, mut f: F) -> Result<(), SheetError>
where
    R: BufRead,
    F: FnMut(&str) -> Result<(), ParseError>,
{
    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| SheetError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            return Ok(());
        }
        line_number += 1;
        let line = String::from_utf8_lossy(&buf);
        let line = line.strip_suffix('\n').unwrap_or(&line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        f(line).map_err(|source| SheetError::Inconsistent {
            path: path.to_path_buf(),
            line_number,
            source,
        })?;
    }
}

/// Feeds one whole sheet through the accumulator as a single source.
pub fn load<S: ReportSink + ?Sized>(
    path: &Path,
    acc: &mut Accumulator,
    sink: &mut S,
) -> Result<(), SheetError> {
    acc.begin_source();
    for_each_line(path, |line| acc.feed_line(line, &mut *sink))?;
    acc.end_source(sink);
    let stats = acc.stats();
    tracing::debug!(
        path = %path.display(),
        lines = stats.lines,
        intervals = stats.intervals,
        excluded = stats.excluded,
        unrecognized = stats.unrecognized,
        "loaded sheet"
    );
    Ok(())
}

/// Like [`load`], for sheet text already in memory.
pub fn load_str<S: ReportSink + ?Sized>(
    text: &str,
    name: &Path,
    acc: &mut Accumulator,
    sink: &mut S,
) -> Result<(), SheetError> {
    acc.begin_source();
    for_each_line_in(text.as_bytes(), name, |line| acc.feed_line(line, &mut *sink))?;
    acc.end_source(sink);
    Ok(())
}
