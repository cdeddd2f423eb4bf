//! Interactive yes/no confirmation.

use std::io::{BufRead, Write};

/// Only a full `yes` (any case, surrounding whitespace ignored) counts.
pub fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Print `question` and read one line; anything other than yes (including EOF) is no.
pub fn confirm<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    question: &str,
) -> std::io::Result<bool> {
    write!(writer, "{question} (yes/no): ")?;
    writer.flush()?;
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(is_yes(&line))
}
