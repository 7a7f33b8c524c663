//! Text progress bar for the tracked value
//!
//! Renders `[#####     ] 5` for a value halfway through `[0, 10]`. Handy on
//! character LCDs and serial consoles.

use core::fmt::{self, Write};

use heapless::String;

/// Bar rendering errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BarError {
    /// Lower and upper bound are equal, so there is no scale
    EmptyRange,
    /// Output does not fit the string capacity
    Capacity,
}

impl fmt::Display for BarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarError::EmptyRange => f.write_str("bar needs lower < upper"),
            BarError::Capacity => f.write_str("bar does not fit the buffer"),
        }
    }
}

/// Render `value` on a `width`-cell bar spanning `[lower, upper]`
///
/// Values outside the bounds pin the bar to empty or full.
pub fn render<const S: usize>(
    value: i32,
    lower: i32,
    upper: i32,
    width: usize,
    fill: char,
    empty: char,
) -> Result<String<S>, BarError> {
    if lower == upper {
        return Err(BarError::EmptyRange);
    }
    // Every cell takes at least one byte
    if width > S {
        return Err(BarError::Capacity);
    }

    let span = i128::from(upper) - i128::from(lower);
    let offset = i128::from(value) - i128::from(lower);
    let cells = width as i128;
    let filled = (offset * cells / span).clamp(0, cells) as usize;

    let mut out = String::new();
    write_bar(&mut out, value, width, filled, fill, empty).map_err(|_| BarError::Capacity)?;
    Ok(out)
}

fn write_bar<const S: usize>(
    out: &mut String<S>,
    value: i32,
    width: usize,
    filled: usize,
    fill: char,
    empty: char,
) -> fmt::Result {
    out.write_char('[')?;
    for cell in 0..width {
        out.write_char(if cell < filled { fill } else { empty })?;
    }
    write!(out, "] {}", value)
}
