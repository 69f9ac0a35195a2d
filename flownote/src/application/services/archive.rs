//! Zip packing and unpacking of dataset targets
//!
//! A packed directory keeps its own name as the first path component of every
//! entry, so unpacking next to the archive restores the original layout.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::domain::{self, DomainError};

/// Archive adapter.
///
/// Works on the real disk only: the zip writer and reader need seekable
/// files, so there is no `FileSystem` seam here.
#[derive(Debug, Clone, Default)]
pub struct ArchiveService;

impl ArchiveService {
    pub fn new() -> Self {
        Self
    }

    /// Pack a directory (recursively) or a single file into `path + ".zip"`.
    ///
    /// A failure midway leaves the partial archive on disk.
    ///
    /// # Returns
    /// Path of the written archive
    pub fn pack(&self, path: &Path) -> ApplicationResult<PathBuf> {
        let source = PathBuf::from(domain::trim_trailing_separator(&path.to_string_lossy()));
        let archive = domain::archive_path(&source);
        debug!("pack: {} -> {}", source.display(), archive.display());

        if !source.exists() {
            return Err(ApplicationError::NotFound(source.display().to_string()));
        }

        let file = File::create(&archive).with_path_context("create archive", &archive)?;
        let mut writer = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        if source.is_dir() {
            let base = source.parent().unwrap_or(Path::new(""));
            for entry in WalkDir::new(&source).sort_by_file_name() {
                let entry = entry.with_path_context("walk", &source)?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = entry_name(entry.path(), base);
                Self::write_entry(&mut writer, entry.path(), &name, options)?;
            }
        } else {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| ApplicationError::Invalid(format!("cannot pack {}", source.display())))?;
            Self::write_entry(&mut writer, &source, &name, options)?;
        }

        writer
            .finish()
            .with_path_context("finish archive", &archive)?;
        Ok(archive)
    }

    fn write_entry(
        writer: &mut ZipWriter<File>,
        path: &Path,
        name: &str,
        options: FileOptions,
    ) -> ApplicationResult<()> {
        debug!("pack: add {}", name);
        let mut input = File::open(path).with_path_context("open", path)?;
        let len = input.metadata().with_path_context("stat", path)?.len();
        writer
            .start_file(name, options.large_file(needs_zip64(len)))
            .with_path_context("add archive entry", path)?;
        io::copy(&mut input, writer).with_path_context("compress", path)?;
        Ok(())
    }

    /// Unpack each existing archive next to its base name.
    ///
    /// `data/images.zip` unpacks into `data/`; a bare `images.zip` into `.`.
    /// Missing archives are skipped.
    ///
    /// # Returns
    /// The archives that were unpacked
    pub fn unpack(&self, archives: &[PathBuf]) -> ApplicationResult<Vec<PathBuf>> {
        let mut unpacked = Vec::new();
        for archive in archives {
            if !archive.is_file() {
                debug!("unpack: skipping missing {}", archive.display());
                continue;
            }
            let target = domain::extraction_dir(archive);
            self.extract(archive, &target)?;
            unpacked.push(archive.clone());
        }
        Ok(unpacked)
    }

    /// Extract every entry of `archive` below `target`.
    pub fn extract(&self, archive: &Path, target: &Path) -> ApplicationResult<()> {
        debug!("extract: {} -> {}", archive.display(), target.display());
        let file = File::open(archive).with_path_context("open archive", archive)?;
        let mut zip = ZipArchive::new(file).with_path_context("read archive", archive)?;

        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .with_path_context("read archive entry", archive)?;
            let relative = entry
                .enclosed_name()
                .map(Path::to_path_buf)
                .ok_or_else(|| DomainError::UnsafeArchiveEntry(entry.name().to_string()))?;
            let destination = target.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&destination).with_path_context("create directory", &destination)?;
                continue;
            }
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).with_path_context("create directory", parent)?;
            }
            let mut output =
                File::create(&destination).with_path_context("create file", &destination)?;
            io::copy(&mut entry, &mut output).with_path_context("extract", &destination)?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&destination, fs::Permissions::from_mode(mode))
                    .with_path_context("set permissions", &destination)?;
            }
        }
        Ok(())
    }
}

/// Entries of 4 GiB and more need zip64 headers.
fn needs_zip64(len: u64) -> bool {
    len >= u64::from(u32::MAX)
}

/// Zip entry name: `path` relative to `base`, `/`-separated.
fn entry_name(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_nested_path_when_entry_name_then_relative_to_base() {
        let name = entry_name(Path::new("/tmp/x/data/a/b.csv"), Path::new("/tmp/x"));
        assert_eq!(name, "data/a/b.csv");
    }

    #[test]
    fn given_relative_dir_without_parent_when_entry_name_then_keeps_dir_name() {
        let name = entry_name(Path::new("data/b.csv"), Path::new(""));
        assert_eq!(name, "data/b.csv");
    }

    #[test]
    fn given_entry_sizes_when_needs_zip64_then_only_from_four_gib() {
        assert!(!needs_zip64(0));
        assert!(!needs_zip64(u64::from(u32::MAX) - 1));
        assert!(needs_zip64(u64::from(u32::MAX)));
        assert!(needs_zip64(5 * 1024 * 1024 * 1024));
    }
}
