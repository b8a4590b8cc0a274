use crate::error::InboxError;
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A zip built in the temp dir. The file is removed when this value is dropped,
/// whether or not it was ever sent.
#[derive(Debug)]
pub struct MediaArchive {
    file: NamedTempFile,
    pub file_name: String,
    pub entries: usize,
}

impl MediaArchive {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let read_dir = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in read_dir {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Archive entry name: path relative to `root` with `/` separators.
fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Every file under `root`, sorted by entry name.
pub fn list_archive_entries(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    collect_files(root, &mut files)?;
    let mut entries = files
        .into_iter()
        .filter_map(|path| entry_name(root, &path).map(|name| (name, path)))
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Write a deflate zip of everything under `root` into `out`. Returns the entry count.
pub fn write_zip<W: Write + io::Seek>(root: &Path, out: W) -> Result<usize> {
    let entries = list_archive_entries(root)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(out);
    for (name, path) in &entries {
        zip.start_file(name.as_str(), options)
            .with_context(|| format!("failed to add {name} to archive"))?;
        let mut src =
            fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        io::copy(&mut src, &mut zip)
            .with_context(|| format!("failed to compress {}", path.display()))?;
    }
    zip.finish().context("failed to finish archive")?;
    Ok(entries.len())
}

fn ensure_archivable(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(InboxError::NothingToArchive(root.display().to_string()).into());
    }
    if list_archive_entries(root)?.is_empty() {
        return Err(InboxError::NothingToArchive(root.display().to_string()).into());
    }
    Ok(())
}

/// Zip `root` into a fresh temp file under `tmp_dir`.
///
/// A partially written file is removed on failure since the temp file is
/// dropped with the error.
pub fn build_media_archive(root: &Path, tmp_dir: &Path, file_name: &str) -> Result<MediaArchive> {
    ensure_archivable(root)?;
    fs::create_dir_all(tmp_dir)
        .with_context(|| format!("failed to create {}", tmp_dir.display()))?;

    let stem = file_name.trim_end_matches(".zip");
    let mut file = tempfile::Builder::new()
        .prefix(&format!("{stem}."))
        .suffix(".zip")
        .tempfile_in(tmp_dir)
        .with_context(|| format!("failed to create temp archive in {}", tmp_dir.display()))?;
    let entries = write_zip(root, file.as_file_mut())?;

    Ok(MediaArchive {
        file,
        file_name: file_name.to_string(),
        entries,
    })
}

/// Zip `root` straight to `dest`, removing `dest` again if writing fails.
pub fn export_media_archive(root: &Path, dest: &Path) -> Result<usize> {
    ensure_archivable(root)?;
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        fs::File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    match write_zip(root, file) {
        Ok(count) => Ok(count),
        Err(err) => {
            let _ = fs::remove_file(dest);
            Err(err)
        }
    }
}
