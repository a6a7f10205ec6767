// src/utils/logbook.rs
use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, io::Write, path::Path};

use crate::services::ledger::FilteredListingEntry;

#[derive(Serialize)]
struct ExportLine<'a> {
    exported_at: String,
    #[serde(flatten)]
    entry: &'a FilteredListingEntry,
}

/// Append each entry as one JSON line. Returns the number of lines written.
pub fn export_entries<'a, I>(path: &Path, entries: I, ts_rfc3339: &str) -> Result<usize>
where
    I: IntoIterator<Item = &'a FilteredListingEntry>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create_dir_all({:?})", parent))?;
    }
    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open logbook {}", path.display()))?;

    let mut written = 0usize;
    for entry in entries {
        let line = ExportLine {
            exported_at: ts_rfc3339.to_string(),
            entry,
        };
        let json = serde_json::to_string(&line)?;
        writeln!(f, "{}", json)?;
        written += 1;
    }
    Ok(written)
}
