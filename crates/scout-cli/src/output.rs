use std::io::Write;

use serde::Serialize;

use scout_types::{Result, ScoutError};

/// Write `value` to stdout as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| stdout_error(e.to_string()))?;
    writeln!(out).map_err(|e| stdout_error(e.to_string()))
}

pub fn print_line(line: impl std::fmt::Display) -> Result<()> {
    writeln!(std::io::stdout().lock(), "{line}").map_err(|e| stdout_error(e.to_string()))
}

fn stdout_error(reason: String) -> ScoutError {
    ScoutError::DiskWrite(format!("stdout: {reason}"))
}
