//! Run report output
//!
//! Text mode prints the transcript exactly as the callbacks recorded it.
//! JSON mode prints the whole [`RunReport`].

use crate::runner::RunReport;
use anyhow::{Context, Result};
use std::io::Write;

/// Write the transcript, one line per callback invocation
pub fn write_text<W: Write>(out: &mut W, report: &RunReport) -> Result<()> {
    for line in &report.transcript {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Write the full report as pretty-printed JSON
pub fn write_json<W: Write>(out: &mut W, report: &RunReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).context("Failed to serialize run report")?;
    writeln!(out)?;
    Ok(())
}
