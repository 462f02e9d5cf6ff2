//! First-run prompt for the backend server count.

use cc_core::layout::{MAX_BACKENDS, MIN_BACKENDS};
use color_eyre::eyre::{bail, Result};
use std::io::{BufRead, Write};

/// Ask how many backend servers to manage until a valid answer is given.
///
/// # Errors
///
/// Fails when the user declines (blank answer, `q`, or end of input). The
/// panel cannot run without a count.
pub fn ask_backend_count(mut input: impl BufRead, mut output: impl Write) -> Result<u32> {
    loop {
        write!(
            output,
            "How many Paper servers should be managed? [{MIN_BACKENDS}-{MAX_BACKENDS}, blank to quit]: "
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("backend server count is required");
        }

        let answer = line.trim();
        if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
            bail!("backend server count is required");
        }

        match answer.parse::<u32>() {
            Ok(count) if (MIN_BACKENDS..=MAX_BACKENDS).contains(&count) => return Ok(count),
            _ => writeln!(output, "Please enter a number from {MIN_BACKENDS} to {MAX_BACKENDS}.")?,
        }
    }
}
