//! JSON-lines output

use std::io::Write;

use adquery_core::value::DirectoryEntry;

use crate::error::CliResult;

/// Write each entry as one JSON object per line.
pub fn write_entries<W: Write>(mut out: W, entries: &[DirectoryEntry]) -> CliResult<()> {
    for entry in entries {
        serde_json::to_writer(&mut out, entry)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
