//! Bucketed reports: `xts by-day` and `xts by-month`.
//!
//! Both read every sheet named on the command line, in order, and print one
//! line per day (or month) with nonzero rounded hours, followed by the grand
//! total. The monthly report also honours invoice markers. Output is plain
//! text, `\Fee{..}` lines for a LaTeX invoice, or JSON.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use xts_core::sheet;
use xts_core::{Accumulator, AccumulatorConfig, Bucket, BucketKind, ReportSink, Tenths, Totals};

use crate::Config;

/// Output format for a bucketed report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Latex,
    Json,
}

impl OutputFormat {
    pub const fn from_flags(latex: bool, json: bool) -> Self {
        if json {
            Self::Json
        } else if latex {
            Self::Latex
        } else {
            Self::Text
        }
    }
}

/// One reported event, in the order the accumulator produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Bucket(Bucket),
    Invoice(Option<Tenths>),
}

/// Sink that keeps every event for rendering afterwards.
#[derive(Debug, Default)]
pub struct Collector {
    pub entries: Vec<Entry>,
}

impl ReportSink for Collector {
    fn bucket(&mut self, bucket: &Bucket) {
        self.entries.push(Entry::Bucket(bucket.clone()));
    }

    fn invoice(&mut self, amount: Option<Tenths>) {
        self.entries.push(Entry::Invoice(amount));
    }
}

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub kind: BucketKind,
    pub entries: Vec<Entry>,
    pub totals: Totals,
}

/// Reads the sheets and collects their buckets.
///
/// Any unreadable sheet aborts the report.
pub fn generate_report_data(
    files: &[PathBuf],
    kind: BucketKind,
    config: &Config,
    generated_at: DateTime<Utc>,
) -> Result<ReportData> {
    let mut settings = AccumulatorConfig::new(kind).with_rate(config.default_rate);
    if kind == BucketKind::Month {
        settings = settings.with_invoices();
    }
    let mut acc = Accumulator::new(settings);
    let mut collector = Collector::default();

    for file in files {
        sheet::load(file, &mut acc, &mut collector)
            .with_context(|| format!("failed to total {}", file.display()))?;
    }
    let totals = acc.finish(&mut collector);

    Ok(ReportData {
        generated_at,
        timezone: iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
        kind,
        entries: collector.entries,
        totals,
    })
}

/// Period label of a bucket: `YYYY/MM/DD` for days, `YYYY/MM` for months.
fn bucket_label(bucket: &Bucket) -> String {
    match bucket.kind {
        BucketKind::Month => bucket.date().format("%Y/%m").to_string(),
        BucketKind::Day | BucketKind::Run => bucket.date().format("%Y/%m/%d").to_string(),
    }
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();

    for entry in &data.entries {
        match entry {
            Entry::Bucket(bucket) if bucket.kind == BucketKind::Day => {
                writeln!(
                    output,
                    "{:>9} {}: {:4}",
                    bucket.weekday_name(),
                    bucket_label(bucket),
                    bucket.tenths
                )
                .unwrap();
            }
            Entry::Bucket(bucket) => {
                writeln!(output, "{}: {:4}", bucket_label(bucket), bucket.tenths).unwrap();
            }
            Entry::Invoice(Some(amount)) => writeln!(output, "INVOICE -- {amount}").unwrap(),
            Entry::Invoice(None) => writeln!(output, "INVOICE").unwrap(),
        }
    }

    if data.kind == BucketKind::Month && !data.totals.uninvoiced.is_zero() {
        writeln!(output, "NOT-YET INVOICED -- {}", data.totals.uninvoiced).unwrap();
    }
    writeln!(output, "Total: {} Hours", data.totals.total()).unwrap();

    output
}

/// Formats one `\Fee{label}{rate}{hours}{fee}` line per bucket.
///
/// Invoice markers and totals are left to the surrounding document.
pub fn format_report_latex(data: &ReportData) -> String {
    let mut output = String::new();

    for entry in &data.entries {
        let Entry::Bucket(bucket) = entry else {
            continue;
        };
        let label = match bucket.kind {
            BucketKind::Day => format!("{}, {}", bucket_label(bucket), bucket.weekday_name()),
            BucketKind::Month | BucketKind::Run => bucket_label(bucket),
        };
        writeln!(
            output,
            "\\Fee{{{label}}}{{{:.2}}}{{{:.1}}}{{{:.2}}}",
            bucket.rate,
            bucket.tenths.hours(),
            bucket.fee()
        )
        .unwrap();
    }

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub generated_at: String,
    pub timezone: String,
    pub kind: BucketKind,
    pub entries: Vec<JsonEntry>,
    pub totals: JsonTotals,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonEntry {
    Bucket {
        period: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        weekday: Option<&'static str>,
        project: Option<String>,
        rate: f64,
        hours: f64,
        fee: f64,
    },
    Invoice {
        hours: Option<f64>,
    },
}

#[derive(Debug, Serialize)]
pub struct JsonTotals {
    pub hours: f64,
    pub invoiced_hours: f64,
    pub uninvoiced_hours: f64,
    pub invoices: usize,
    pub buckets: usize,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let entries = data
        .entries
        .iter()
        .map(|entry| match entry {
            Entry::Bucket(bucket) => JsonEntry::Bucket {
                period: bucket_label(bucket),
                weekday: (bucket.kind == BucketKind::Day).then(|| bucket.weekday_name()),
                project: bucket.project.clone(),
                rate: bucket.rate,
                hours: bucket.tenths.hours(),
                fee: bucket.fee(),
            },
            Entry::Invoice(amount) => JsonEntry::Invoice {
                hours: amount.map(Tenths::hours),
            },
        })
        .collect();

    let report = JsonReport {
        generated_at: data.generated_at.to_rfc3339(),
        timezone: data.timezone.clone(),
        kind: data.kind,
        entries,
        totals: JsonTotals {
            hours: data.totals.total().hours(),
            invoiced_hours: data.totals.invoiced.hours(),
            uninvoiced_hours: data.totals.uninvoiced.hours(),
            invoices: data.totals.invoices,
            buckets: data.totals.buckets,
        },
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs `by-day` (`BucketKind::Day`) or `by-month` (`BucketKind::Month`).
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    kind: BucketKind,
    files: &[PathBuf],
    format: OutputFormat,
) -> Result<()> {
    let data = generate_report_data(files, kind, config, Utc::now())?;

    match format {
        OutputFormat::Json => writeln!(writer, "{}", format_report_json(&data)?)?,
        OutputFormat::Latex => write!(writer, "{}", format_report_latex(&data))?,
        OutputFormat::Text => write!(writer, "{}", format_report(&data))?,
    }

    Ok(())
}
