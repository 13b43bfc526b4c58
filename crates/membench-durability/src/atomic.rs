//! Shared temp-then-rename write helper (spec.md 4.E), grounded on the
//! teacher's `copilot-benchmarks::io::BenchmarkIo::write_result`
//! `File::create` + `serde_json::to_writer_pretty` pattern, extended with a
//! temp-file rename so a crash never leaves a torn document.

use crate::error::DurabilityError;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), DurabilityError> {
    let dir = path.parent().ok_or_else(|| DurabilityError::InvalidPath(path.to_path_buf()))?;
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let tmp_path = dir.join(format!(".{file_name}.tmp"));

    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        use std::io::Write;
        writer.flush()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
