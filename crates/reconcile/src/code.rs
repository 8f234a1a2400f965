//! Function code payloads: encoding, bundling and equivalence.
//!
//! A function's code is uploaded as base64. It is either the text of a single
//! source file or a zip archive of a source directory. Archives are compared
//! by content so that re-bundling an unchanged directory is not a change.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

/// File names accepted as the bundle entrypoint.
pub const MAIN_FILE_NAMES: [&str; 2] = ["main.ts", "main.js"];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

static PRINTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}\p{P}\p{S}\p{Z}\p{C}]*$").expect("valid regex"));

/// Encode raw bytes as standard base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a standard base64 payload.
pub fn decode(payload: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::Decode(e.to_string()))
}

/// Whether a base64 payload holds plain source text rather than an archive.
pub fn is_plain_text(payload: &str) -> bool {
    let Ok(bytes) = decode(payload) else {
        return false;
    };
    if bytes.starts_with(ZIP_MAGIC) {
        return false;
    }
    match std::str::from_utf8(&bytes) {
        Ok(text) => PRINTABLE.is_match(text),
        Err(_) => false,
    }
}

/// Whether two base64 code payloads are equivalent.
///
/// Text must match exactly. Two archives are equivalent when they hold the
/// same entries (by name) with the same sizes and contents; timestamps and
/// entry order are ignored.
pub fn code_equals(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if is_plain_text(a) || is_plain_text(b) {
        return false;
    }
    match archives_equivalent(a, b) {
        Ok(equal) => equal,
        Err(e) => {
            log::warn!("Could not compare code archives: {}", e);
            false
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ArchiveEntry {
    name: String,
    size: u64,
    content: Vec<u8>,
}

/// Entries sorted by name. Duplicate names are all kept, in archive order.
fn read_archive(payload: &str) -> Result<Vec<ArchiveEntry>> {
    let bytes = decode(payload)?;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let mut content = Vec::new();
        if !file.is_dir() {
            file.read_to_end(&mut content)
                .map_err(|e| Error::Archive(format!("{}: {}", file.name(), e)))?;
        }
        entries.push(ArchiveEntry {
            name: file.name().to_string(),
            size: file.size(),
            content,
        });
    }

    Ok(sorted(entries))
}

fn sorted(mut entries: Vec<ArchiveEntry>) -> Vec<ArchiveEntry> {
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

fn archives_equivalent(a: &str, b: &str) -> Result<bool> {
    Ok(read_archive(a)? == read_archive(b)?)
}

/// Bundle a source directory into a zip archive.
///
/// Directories are added first, then files, both in sorted order and with a
/// fixed timestamp, so bundling the same tree twice yields identical bytes.
/// The tree must contain exactly one `main.ts` or `main.js`.
pub fn zip_directory(source: &Path) -> Result<Vec<u8>> {
    if !source.is_dir() {
        return Err(Error::Validation(format!(
            "Source folder {} does not exist",
            source.display()
        )));
    }

    let mut directories = Vec::new();
    let mut files = Vec::new();
    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Archive(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::Archive(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        if entry.file_type().is_dir() {
            directories.push(relative);
        } else {
            files.push((relative, entry.into_path()));
        }
    }

    let options = SimpleFileOptions::default().last_modified_time(zip::DateTime::default());
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

    for dir in &directories {
        writer.add_directory(format!("{dir}/"), options)?;
    }

    let mut main_file: Option<&str> = None;
    for (relative, path) in &files {
        let base_name = relative.rsplit('/').next().unwrap_or(relative);
        if MAIN_FILE_NAMES.contains(&base_name) {
            if let Some(existing) = main_file {
                return Err(Error::Validation(format!(
                    "Unable to add {relative} to bundled source folder, main entrypoint file {existing} already added"
                )));
            }
            main_file = Some(relative);
        }

        let content = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        writer.start_file(relative.as_str(), options)?;
        writer
            .write_all(&content)
            .map_err(|e| Error::Archive(format!("Error adding file {}: {}", path.display(), e)))?;
    }

    if main_file.is_none() {
        return Err(Error::Validation(format!(
            "No main file found in the source folder {}",
            source.display()
        )));
    }

    Ok(writer.finish()?.into_inner())
}
