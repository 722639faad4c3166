//! Core timesheet logic.
//!
//! This crate contains the fundamental types and logic for:
//! - Line parsing: classifying sheet lines into rates, projects, invoices and intervals
//! - Accumulation: bucketing intervals by day, month or run and rounding to tenths
//! - Recording: appending clocked intervals to a sheet
//! - Task lists: the set of sheets a user works on and their project names

pub mod accumulate;
pub mod calendar;
pub mod line;
pub mod recorder;
pub mod session;
pub mod sheet;
pub mod tasks;
pub mod types;

pub use accumulate::{
    Accumulator, AccumulatorConfig, Bucket, BucketKind, DEFAULT_RATE, ReportSink, Silent, Totals,
};
pub use calendar::{WeekStart, Window};
pub use line::{Line, ParseError, TimeInterval, classify};
pub use session::Session;
pub use sheet::SheetError;
pub use tasks::{ProjectIndex, TaskList};
pub use types::{Tenths, ValidationError, parse_rate};
