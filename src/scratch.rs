//! Fixed scratch values printed before any database work.
//!
//! Nothing else in the crate depends on this output.

use crate::error::{PgcolError, Result};
use std::collections::TryReserveError;
use std::io::Write;

const AGE: i32 = 25;
const HEIGHT: f32 = 1.75;
const INITIAL: char = 'M';
const YEAR_OF_BIRTH: i32 = 1982;

/// Reserves room for one heap integer without aborting on failure.
pub fn reserve_slot(slot: &mut Vec<i32>) -> std::result::Result<(), TryReserveError> {
    slot.try_reserve_exact(1)
}

/// Prints the scratch values, storing one of them in a heap slot.
///
/// `reserve` obtains the slot. If it fails, `Memory allocation failed` is
/// printed and an allocation error returned.
pub fn print_scratch_values<W, F>(out: &mut W, reserve: F) -> Result<()>
where
    W: Write,
    F: FnOnce(&mut Vec<i32>) -> std::result::Result<(), TryReserveError>,
{
    writeln!(out, "Age: {AGE}")?;
    writeln!(out, "Height: {HEIGHT:.2}")?;
    writeln!(out, "Initial: {INITIAL}")?;
    writeln!(out, "Hello, World2!")?;

    let mut year_of_born: Vec<i32> = Vec::new();
    if let Err(e) = reserve(&mut year_of_born) {
        writeln!(out, "Memory allocation failed")?;
        out.flush()?;
        return Err(PgcolError::allocation(e.to_string()));
    }

    year_of_born.push(YEAR_OF_BIRTH);
    if let Some(year) = year_of_born.first() {
        writeln!(out, "Age: {year}")?;
    }
    out.flush()?;

    Ok(())
}
