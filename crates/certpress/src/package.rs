//! Output packaging
//!
//! Collects all rendered certificates into one deflate-compressed zip,
//! flattened (no subdirectories), with a date-stamped name distinct from
//! the per-recipient file names.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// Archive name for a batch run on the given date
pub fn archive_name(date: chrono::NaiveDate) -> String {
    format!("certificates-{}.zip", date.format("%Y%m%d"))
}

/// Zip every PDF in `out_dir` into `archive_path`. Returns how many files
/// were packed.
pub fn zip_outputs(out_dir: &Path, archive_path: &Path) -> Result<usize> {
    let paths = pdf_files(out_dir)?;

    let file = File::create(archive_path)
        .with_context(|| format!("failed to create {}", archive_path.display()))?;
    let mut archive = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut buffer = Vec::new();
    for path in &paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("artifact has a non-UTF8 file name")?;

        buffer.clear();
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut buffer))
            .with_context(|| format!("failed to read {}", path.display()))?;

        archive.start_file(name, options)?;
        archive.write_all(&buffer)?;
    }

    archive.finish()?;
    Ok(paths.len())
}

fn pdf_files(out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(out_dir)
        .with_context(|| format!("failed to read {}", out_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == "pdf").unwrap_or(false))
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_name() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(archive_name(date), "certificates-20260806.zip");
    }

    #[test]
    fn test_zip_outputs_packs_pdfs_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Jane Doe.pdf"), b"%PDF-fake").unwrap();
        std::fs::write(dir.path().join("Bob Smith.pdf"), b"%PDF-fake").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not packed").unwrap();

        let archive_path = dir.path().join("certificates-test.zip");
        let packed = zip_outputs(dir.path(), &archive_path).unwrap();

        assert_eq!(packed, 2);
        assert!(archive_path.exists());

        let archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"Jane Doe.pdf"));
        assert!(names.contains(&"Bob Smith.pdf"));
        assert!(!names.contains(&"notes.txt"));
    }
}
