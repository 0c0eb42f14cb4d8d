// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::ClutterError;

/// Create a directory (and any missing parents) unless it already exists
///
/// # Arguments
///
/// * `directory` - Path to directory
///
/// # Examples
///
/// ```
/// use clutter_core::ut::path::mkdir_if_missing;
///
/// let base = std::env::temp_dir().join("CLUTTER_DOC_MKDIR_IF_MISSING");
///
/// mkdir_if_missing(&base).unwrap();
/// mkdir_if_missing(&base).unwrap();
/// assert!(base.is_dir());
///
/// std::fs::remove_dir(&base).unwrap();
/// ```
pub fn mkdir_if_missing<P: AsRef<Path>>(directory: P) -> Result<PathBuf, ClutterError> {
    let directory = directory.as_ref();

    if directory.is_dir() {
        return Ok(directory.to_path_buf());
    }

    match std::fs::create_dir_all(directory) {
        Ok(()) => Ok(directory.to_path_buf()),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists && directory.is_dir() => {
            Ok(directory.to_path_buf())
        }
        Err(err) => Err(ClutterError::DirError(format!(
            "{} ({})",
            directory.display(),
            err
        ))),
    }
}

/// List directory entries in filesystem enumeration order
///
/// Entries are not sorted and include files of any extension as well as
/// subdirectories. Entries that cannot be read are skipped.
///
/// # Arguments
///
/// * `directory` - Path to directory
pub fn read_dir_entries<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>, ClutterError> {
    let directory = directory.as_ref();

    Ok(std::fs::read_dir(directory)
        .map_err(|err| ClutterError::DirError(format!("{} ({})", directory.display(), err)))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect())
}

/// Check if a path has one of the provided extensions (case-insensitive)
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use clutter_core::ut::path::has_extension;
///
/// assert!(has_extension(Path::new("a/image_000001.PNG"), &["png"]));
/// assert!(!has_extension(Path::new("a/notes.txt"), &["png"]));
/// ```
pub fn has_extension(path: &Path, valid_ext: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .is_some_and(|ext| valid_ext.contains(&ext.as_str()))
}

/// Collect file paths from a directory with an optional substring filter
///
/// # Arguments
///
/// * `directory` - Path to directory containing files
/// * `valid_ext` - Only include files with one of these extensions
/// * `substring` - Only include files containing this substring
///
/// # Examples
///
/// ```no_run
/// use clutter_core::ut::path::collect_file_paths;
/// let files = collect_file_paths("directory/", &["png"], None);
/// ```
pub fn collect_file_paths<P>(
    directory: P,
    valid_ext: &[&str],
    substring: Option<String>,
) -> Result<Vec<PathBuf>, ClutterError>
where
    P: AsRef<Path>,
{
    let mut files: Vec<PathBuf> = read_dir_entries(directory)?
        .into_iter()
        .filter(|path| path.is_file() && has_extension(path, valid_ext))
        .collect();

    if let Some(substring) = substring {
        files.retain(|f| {
            f.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.contains(&substring))
        });
    }

    Ok(files)
}

/// Collect file pairs that share a matching file stem
///
/// Returned pairs are sorted by their shared identifier.
///
/// # Arguments
///
/// * `files_a` - List of file paths
/// * `files_b` - List of file paths
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use clutter_core::ut::path::collect_file_pairs;
///
/// let images = [
///     PathBuf::from("depth_ims/image_000002.png"),
///     PathBuf::from("depth_ims/image_000001.png"),
///     PathBuf::from("depth_ims/image_000003.png"),
/// ];
///
/// let masks = [
///     PathBuf::from("modal_segmasks/image_000001.png"),
///     PathBuf::from("modal_segmasks/image_000002.png"),
/// ];
///
/// let pairs = collect_file_pairs(&images, &masks);
/// assert_eq!(pairs.len(), 2);
/// assert_eq!(pairs[0].0, "image_000001");
/// ```
pub fn collect_file_pairs(
    files_a: &[PathBuf],
    files_b: &[PathBuf],
) -> Vec<(String, PathBuf, PathBuf)> {
    let file_map: HashMap<String, &PathBuf> = files_a
        .iter()
        .filter_map(|file| {
            file.file_stem()
                .map(|stem| (stem.to_string_lossy().to_string(), file))
        })
        .collect();

    let mut pairs: Vec<(String, PathBuf, PathBuf)> = files_b
        .par_iter()
        .filter_map(|file_b| {
            file_b.file_stem().and_then(|stem| {
                let name = stem.to_string_lossy().to_string();
                file_map
                    .get(&name)
                    .map(|file_a| (name, (*file_a).clone(), file_b.clone()))
            })
        })
        .collect();

    pairs.sort_unstable();
    pairs
}
