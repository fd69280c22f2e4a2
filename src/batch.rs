//! Running the upload pipeline over files on disk.
//!
//! Each file is treated as an upload: declared size from file metadata,
//! content type from the extension. Files are validated against the field's
//! limits, then optimized; the outcome of every file is reported, and only
//! I/O failures abort the batch.
//!
//! Outputs mirror the inputs' layout: a file found at `a/photo.png` while
//! walking a directory is written to `<out_dir>/a/photo.webp`. Two inputs that
//! would still land on the same output (e.g. `photo.png` and `photo.jpg` side
//! by side) abort the batch before anything is written.
//!
//! Files are processed in parallel on the global rayon pool. Outcomes come
//! back in input order.

use crate::config::FieldConstraints;
use crate::imaging::{ImageCodec, RustCodec};
use crate::optimize::optimize_with_codec;
use crate::output::FileOutcome;
use crate::types::{UploadDescriptor, content_type_for_name, output_file_name};
use crate::validate::validate_upload;
use rayon::prelude::*;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{first} and {second} would both be written to {output}")]
    OutputConflict {
        output: String,
        first: String,
        second: String,
    },
}

/// A file to process and its path relative to the argument it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Path under the walked directory, or just the file name for files
    /// given directly.
    pub relative: PathBuf,
}

impl InputFile {
    /// Where the optimized output for this input goes under `out_dir`.
    pub fn output_path(&self, out_dir: &Path) -> PathBuf {
        let name = self
            .relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let file_name = output_file_name(name.as_deref(), "webp");
        match self.relative.parent() {
            Some(dir) => out_dir.join(dir).join(file_name),
            None => out_dir.join(file_name),
        }
    }
}

/// Expand the given paths into the list of files to process.
///
/// Files are taken as given. Directories are walked recursively in file-name
/// order, keeping only files with a recognised image extension.
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<InputFile> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|e| e.file_type().is_file())
                    .filter(|e| content_type_for_name(&e.file_name().to_string_lossy()).is_some())
                    .map(|e| {
                        let relative = e
                            .path()
                            .strip_prefix(path)
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|_| PathBuf::from(e.file_name()));
                        InputFile {
                            path: e.into_path(),
                            relative,
                        }
                    }),
            );
        } else {
            let relative = path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| path.clone());
            files.push(InputFile {
                path: path.clone(),
                relative,
            });
        }
    }
    files
}

/// Fail if two inputs map to the same output path.
fn check_output_conflicts(files: &[InputFile], out_dir: &Path) -> Result<(), BatchError> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for file in files {
        let output = file.output_path(out_dir);
        if let Some(first) = seen.get(&output) {
            return Err(BatchError::OutputConflict {
                output: output.display().to_string(),
                first: first.display().to_string(),
                second: file.path.display().to_string(),
            });
        }
        seen.insert(output, &file.path);
    }
    Ok(())
}

/// Validate and optimize every file, writing outputs into `out_dir`.
pub fn optimize_files(
    files: &[InputFile],
    field: &str,
    constraints: &FieldConstraints,
    out_dir: &Path,
) -> Result<Vec<FileOutcome>, BatchError> {
    optimize_files_with_codec(&RustCodec::new(), files, field, constraints, out_dir)
}

/// Like [`optimize_files`] with a specific codec (allows testing with mock).
pub fn optimize_files_with_codec(
    codec: &impl ImageCodec,
    files: &[InputFile],
    field: &str,
    constraints: &FieldConstraints,
    out_dir: &Path,
) -> Result<Vec<FileOutcome>, BatchError> {
    check_output_conflicts(files, out_dir)?;
    std::fs::create_dir_all(out_dir)?;
    let outcomes = files
        .par_iter()
        .map(|file| optimize_file(codec, file, field, constraints, out_dir))
        .collect::<io::Result<Vec<_>>>()?;
    Ok(outcomes)
}

fn optimize_file(
    codec: &impl ImageCodec,
    file: &InputFile,
    field: &str,
    constraints: &FieldConstraints,
    out_dir: &Path,
) -> io::Result<FileOutcome> {
    let source = file.path.display().to_string();
    let upload = UploadDescriptor::from_path(&file.path)?;

    if let Err(e) = validate_upload(field, &upload, constraints) {
        debug!(%source, "rejected: {e}");
        return Ok(FileOutcome::rejected(&source, &e));
    }

    match optimize_with_codec(codec, &upload, constraints) {
        Ok(image) => {
            let output = file.output_path(out_dir);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, &image.data)?;
            Ok(FileOutcome::optimized(
                &source,
                &output.display().to_string(),
                upload.size(),
                &image,
            ))
        }
        Err(decline) => Ok(FileOutcome::declined(&source, &decline)),
    }
}

/// Run pre-flight validation only.
pub fn check_files(
    files: &[InputFile],
    field: &str,
    constraints: &FieldConstraints,
) -> io::Result<Vec<FileOutcome>> {
    files
        .iter()
        .map(|file| {
            let source = file.path.display().to_string();
            let upload = UploadDescriptor::from_path(&file.path)?;
            Ok(match validate_upload(field, &upload, constraints) {
                Ok(()) => FileOutcome::Passed { source },
                Err(e) => FileOutcome::rejected(&source, &e),
            })
        })
        .collect()
}
