//! Staged writing of emitted files
//!
//! Files are first written into a staging directory created next to the output
//! directory. Only when every file of the run has been written are they moved into
//! place, so a failure partway through leaves the previous output untouched.
//! Hook-stub files belong to the user once they exist and are kept unless forced.

use crate::error::{EmissionError, EmissionResult};
use crate::render::{EmittedFile, FileKind};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// What a write pass did, paths relative to the output directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    /// Existing hook stubs left as they were
    pub kept: Vec<PathBuf>,
}

impl WriteReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.kept.len()
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> EmissionError + '_ {
    move |source| EmissionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `files` (paths relative to `out_dir`) through a staging directory
pub fn write_outputs(out_dir: &Path, files: &[EmittedFile], force: bool) -> EmissionResult<WriteReport> {
    let parent = match out_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(io_error(&parent))?;

    let staging = tempfile::Builder::new()
        .prefix(".polycli-staging-")
        .tempdir_in(&parent)
        .map_err(io_error(&parent))?;

    let mut report = WriteReport::default();
    let mut staged = Vec::new();
    for file in files {
        let target = out_dir.join(&file.path);
        if file.kind == FileKind::HookStub && !force && target.exists() {
            report.kept.push(file.path.clone());
            continue;
        }
        stage(&staging, file)?;
        staged.push(file.path.clone());
    }

    promote(&staging, out_dir, &staged)?;
    report.written = staged;
    Ok(report)
}

fn stage(staging: &TempDir, file: &EmittedFile) -> EmissionResult<()> {
    let path = staging.path().join(&file.path);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_error(dir))?;
    }
    let mut handle = fs::File::create(&path).map_err(io_error(&path))?;
    handle
        .write_all(file.content.as_bytes())
        .map_err(io_error(&path))?;
    handle.sync_all().map_err(io_error(&path))?;
    Ok(())
}

fn promote(staging: &TempDir, out_dir: &Path, files: &[PathBuf]) -> EmissionResult<()> {
    for relative in files {
        let from = staging.path().join(relative);
        let to = out_dir.join(relative);
        if let Some(dir) = to.parent() {
            fs::create_dir_all(dir).map_err(io_error(dir))?;
        }
        fs::rename(&from, &to).map_err(io_error(&to))?;
    }
    Ok(())
}
