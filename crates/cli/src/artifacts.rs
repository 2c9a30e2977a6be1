//! Build artifacts written by `specref build`.

use serde::Serialize;
use specref_core::BuildOutput;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const PARAGRAPH_IDS_FILE: &str = "paragraph-ids.json";
pub const OBJECTS_FILE: &str = "objects.json";
pub const DOCUMENTS_DIR: &str = "documents";

/// Write the paragraph-ids dump, the objects inventory and every resolved
/// tree under `out`.
pub fn write_all(out: &Path, result: &BuildOutput) -> io::Result<()> {
    let documents_dir = out.join(DOCUMENTS_DIR);
    fs::create_dir_all(&documents_dir)?;

    write_json(&out.join(PARAGRAPH_IDS_FILE), &result.paragraph_ids)?;
    write_json(&out.join(OBJECTS_FILE), &result.objects)?;
    for (name, document) in &result.documents {
        write_json(&documents_dir.join(format!("{}.json", name)), document)?;
    }
    tracing::debug!(out = %out.display(), "artifacts written");
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()
}
