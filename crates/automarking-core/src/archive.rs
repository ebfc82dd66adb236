//! Readers for the archive formats students submit.
//!
//! Every reader returns the regular file members of an archive in archive
//! order, with member paths normalised to `/` separators. Directory entries
//! are dropped.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// Archive formats accepted as submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    /// `.zip`
    Zip,
    /// `.tar.gz`
    TarGz,
    /// `.tar.bz2`
    TarBz2,
    /// `.rar`
    Rar,
}

impl ArchiveFormat {
    /// Detect the format from a file name (case-insensitive suffix check).
    ///
    /// ```
    /// use automarking_core::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::detect("a_12345678_attempt.TAR.GZ"), Some(ArchiveFormat::TarGz));
    /// assert_eq!(ArchiveFormat::detect("notes.txt"), None);
    /// ```
    pub fn detect(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".tar.bz2") {
            Some(ArchiveFormat::TarBz2)
        } else if lower.ends_with(".tar.gz") {
            Some(ArchiveFormat::TarGz)
        } else if lower.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if lower.ends_with(".rar") {
            Some(ArchiveFormat::Rar)
        } else {
            None
        }
    }

    /// Canonical file suffix, including the leading dot.
    pub fn suffix(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::TarGz => ".tar.gz",
            ArchiveFormat::TarBz2 => ".tar.bz2",
            ArchiveFormat::Rar => ".rar",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix().trim_start_matches('.'))
    }
}

/// A regular file read out of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Member path inside the archive, `/`-separated.
    pub path: String,
    /// Member contents.
    pub contents: Vec<u8>,
}

/// Read all regular file members of the archive at `path`.
pub fn read_members(path: &Path, format: ArchiveFormat) -> Result<Vec<ArchiveMember>> {
    match format {
        ArchiveFormat::Zip => read_zip(path),
        ArchiveFormat::TarGz | ArchiveFormat::TarBz2 => read_tar(path),
        ArchiveFormat::Rar => read_rar(path),
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::io_with_path(e, path))
}

fn read_zip(path: &Path) -> Result<Vec<ArchiveMember>> {
    let mut archive = zip::ZipArchive::new(open(path)?)?;
    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = normalise(entry.name());
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| Error::archive(path, format!("{name}: {e}")))?;
        members.push(ArchiveMember {
            path: name,
            contents,
        });
    }
    Ok(members)
}

/// Compression wrapped around a tar stream, sniffed from its magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TarCompression {
    Gzip,
    Bzip2,
    None,
}

impl TarCompression {
    fn sniff(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            TarCompression::Gzip
        } else if magic.starts_with(b"BZh") {
            TarCompression::Bzip2
        } else {
            TarCompression::None
        }
    }
}

// Students regularly mislabel compression, so the suffix only selects tar.
fn read_tar(path: &Path) -> Result<Vec<ArchiveMember>> {
    let mut magic = [0u8; 3];
    let read = open(path)?
        .read(&mut magic)
        .map_err(|e| Error::io_with_path(e, path))?;
    let file = open(path)?;
    match TarCompression::sniff(&magic[..read]) {
        TarCompression::Gzip => read_tar_stream(flate2::read::GzDecoder::new(file), path),
        TarCompression::Bzip2 => read_tar_stream(bzip2::read::BzDecoder::new(file), path),
        TarCompression::None => read_tar_stream(file, path),
    }
}

fn read_tar_stream<R: Read>(reader: R, path: &Path) -> Result<Vec<ArchiveMember>> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| Error::archive(path, e.to_string()))?;
    let mut members = Vec::new();
    for entry in entries {
        let mut entry = entry.map_err(|e| Error::archive(path, e.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = normalise(&String::from_utf8_lossy(&entry.path_bytes()));
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| Error::archive(path, format!("{name}: {e}")))?;
        members.push(ArchiveMember {
            path: name,
            contents,
        });
    }
    Ok(members)
}

fn read_rar(path: &Path) -> Result<Vec<ArchiveMember>> {
    let rar_error = |e: unrar::error::UnrarError| Error::archive(path, e.to_string());
    let mut archive = unrar::Archive::new(path)
        .open_for_processing()
        .map_err(rar_error)?;
    let mut members = Vec::new();
    while let Some(header) = archive.read_header().map_err(rar_error)? {
        let (is_file, name) = {
            let entry = header.entry();
            (entry.is_file(), normalise(&entry.filename.to_string_lossy()))
        };
        archive = if is_file {
            let (contents, rest) = header.read().map_err(rar_error)?;
            members.push(ArchiveMember {
                path: name,
                contents,
            });
            rest
        } else {
            header.skip().map_err(rar_error)?
        };
    }
    Ok(members)
}

fn normalise(name: &str) -> String {
    name.replace('\\', "/")
}
