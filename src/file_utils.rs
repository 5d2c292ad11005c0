use anyhow::{Context, Result};
use chrono::Local;
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::PersistenceError;

// @module: File and directory utilities

/// Number of output names tried before giving up on a locked destination
pub const MAX_SAVE_ATTEMPTS: usize = 5;

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Find files with a specific extension directly inside a directory.
    ///
    /// Subdirectories are not searched. Files come back ordered by name.
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let extension = extension.trim_start_matches('.');
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref())
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(ext) = path.extension() {
                if ext.to_string_lossy().eq_ignore_ascii_case(extension) {
                    result.push(path.to_path_buf());
                }
            }
        }

        Ok(result)
    }

    // @generates: Output path for a translated document
    // @params: attempt is 1-based; attempt 1 has no counter
    pub fn candidate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        attempt: usize,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let extension = input_file
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_else(|| "pptx".to_string());

        let file_name = if attempt <= 1 {
            format!("{}{}.{}", stem, suffix, extension)
        } else {
            format!("{}{}_{}.{}", stem, suffix, attempt, extension)
        };
        output_dir.as_ref().join(file_name)
    }

    /// Whether a write failed because another process holds the file
    pub fn is_locked_error(error: &io::Error) -> bool {
        if error.kind() == io::ErrorKind::PermissionDenied {
            return true;
        }
        // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
        cfg!(windows) && matches!(error.raw_os_error(), Some(32) | Some(33))
    }

    /// Write `data` to the first free output name for `input_file`.
    ///
    /// Tries `name<suffix>.ext`, then `name<suffix>_2.ext`, ... up to
    /// [`MAX_SAVE_ATTEMPTS`] names. Only a locked destination moves on to the next
    /// name; any other write error fails immediately.
    pub fn save_with_unique_name<W>(
        data: &[u8],
        input_file: &Path,
        output_dir: &Path,
        suffix: &str,
        mut write: W,
    ) -> Result<PathBuf, PersistenceError>
    where
        W: FnMut(&Path, &[u8]) -> io::Result<()>,
    {
        fs::create_dir_all(output_dir).map_err(|source| PersistenceError::Write {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let mut last_path = Self::candidate_output_path(input_file, output_dir, suffix, 1);
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let path = Self::candidate_output_path(input_file, output_dir, suffix, attempt);
            match write(&path, data) {
                Ok(()) => {
                    info!("Saved {:?}", path);
                    return Ok(path);
                }
                Err(e) if Self::is_locked_error(&e) => {
                    warn!(
                        "{:?} is locked ({}), trying another name ({}/{})",
                        path, e, attempt, MAX_SAVE_ATTEMPTS
                    );
                    last_path = path;
                }
                Err(source) => return Err(PersistenceError::Write { path, source }),
            }
        }

        Err(PersistenceError::Locked {
            attempts: MAX_SAVE_ATTEMPTS,
            last_path,
        })
    }

    /// Default writer for [`FileManager::save_with_unique_name`]
    pub fn write_bytes(path: &Path, data: &[u8]) -> io::Result<()> {
        fs::write(path, data)
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Session log file name, e.g. `translation_20240501_101500.log`
    pub fn session_log_path<P: AsRef<Path>>(log_dir: P) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        log_dir.as_ref().join(format!("translation_{}.log", timestamp))
    }
}
