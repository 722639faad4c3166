//! `xts total`: every hour logged, and the hours since the last invoice.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use xts_core::{Accumulator, AccumulatorConfig, BucketKind, Silent, Totals};

use super::util::{SourceArg, classify_source, load_lenient, load_tasks};
use crate::Config;

/// Totals the sources. Unreadable sheets are skipped with a warning.
pub fn compute(config: &Config, sources: &[String]) -> Result<Totals> {
    let mut acc = Accumulator::new(
        AccumulatorConfig::new(BucketKind::Run)
            .with_rate(config.default_rate)
            .with_invoices(),
    );

    for arg in sources {
        match classify_source(arg, |_| None) {
            SourceArg::TaskList => {
                for path in load_tasks(config)?.sheets() {
                    load_lenient(path, &mut acc, &mut Silent)?;
                }
            }
            SourceArg::Sheet(path) => load_lenient(path, &mut acc, &mut Silent)?,
            SourceArg::Selector(_) => {}
        }
    }

    Ok(acc.finish(&mut Silent))
}

/// Formats the totals as printed by `xts total`.
pub fn format_totals(totals: &Totals) -> String {
    let mut output = String::new();
    writeln!(output, "{} Hours", totals.total()).unwrap();
    if !totals.invoiced.is_zero() && !totals.uninvoiced.is_zero() {
        writeln!(output, "{} Hours (since last invoice)", totals.uninvoiced).unwrap();
    }
    output
}

pub fn run<W: Write>(writer: &mut W, config: &Config, sources: &[String]) -> Result<()> {
    let totals = compute(config, sources)?;
    write!(writer, "{}", format_totals(&totals))?;
    Ok(())
}
