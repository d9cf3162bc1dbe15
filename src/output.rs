//! Result printing.

use crate::db::QueryResult;
use crate::error::Result;
use std::io::Write;

/// Writes `Result: <value>` for column 0 of every row, in row order.
pub fn print_first_column<W: Write>(result: &QueryResult, out: &mut W) -> Result<()> {
    for row in 0..result.row_count() {
        writeln!(out, "Result: {}", result.text(row, 0))?;
    }
    out.flush()?;
    Ok(())
}
