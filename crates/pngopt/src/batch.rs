//! Target processing: a single file or a directory tree of files.
//!
//! Directory entries are processed one after another; a failing entry is
//! recorded and never stops its siblings. Files without a `.png` extension
//! are skipped and do not count as failures.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::optimize::{optimize_file, OptimizeOptions};
use crate::{clamp_color_limit, PngOptError};

/// Helper invoked as `<helper> -c <limit> <path>`; it has handled the file
/// iff it exits with status 0. Defaults to `standalone/draw_optimize_std.sh`.
pub const DEFAULT_FALLBACK_HELPER: &str = "standalone/draw_optimize_std.sh";

/// External helper tried when a single file cannot be decoded natively.
#[derive(Clone, Debug)]
pub struct Fallback {
    pub helper: Option<PathBuf>,
}

impl Default for Fallback {
    fn default() -> Self {
        Self {
            helper: Some(PathBuf::from(DEFAULT_FALLBACK_HELPER)),
        }
    }
}

impl Fallback {
    /// No helper: decode failures are reported as failures.
    pub fn disabled() -> Self {
        Self { helper: None }
    }

    /// Run the helper on `path`. Returns true only if it ran and exited 0.
    pub fn run(&self, path: &Path, color_limit: u16) -> bool {
        let Some(helper) = &self.helper else {
            return false;
        };
        if !is_executable(helper) {
            debug!(helper = %helper.display(), "fallback helper not executable");
            return false;
        }

        let limit = clamp_color_limit(color_limit);
        match Command::new(helper)
            .arg("-c")
            .arg(limit.to_string())
            .arg(path)
            .status()
        {
            Ok(status) => {
                debug!(helper = %helper.display(), path = %path.display(), %status, "fallback finished");
                status.success()
            }
            Err(e) => {
                warn!(helper = %helper.display(), error = %e, "failed to run fallback helper");
                false
            }
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// What happened to one attempted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Written to `output`
    Optimized { input: PathBuf, output: PathBuf },
    /// Native decode failed and the fallback helper succeeded
    FellBack { input: PathBuf },
    /// Not a PNG, left alone
    Skipped { input: PathBuf },
}

/// An entry that could not be processed.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: FailureKind,
}

/// Why an entry failed.
#[derive(Debug, Error)]
pub enum FailureKind {
    /// Processing the file failed
    #[error(transparent)]
    Optimize(#[from] PngOptError),
    /// The target does not exist or cannot be inspected
    #[error("not found: {0}")]
    NotFound(std::io::Error),
    /// A directory could not be listed
    #[error("cannot open dir: {0}")]
    ReadDir(std::io::Error),
    /// Neither a regular file nor a directory
    #[error("not a file or directory")]
    NotFileOrDir,
}

/// Aggregated result of processing a target.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
    pub failures: Vec<Failure>,
}

impl BatchReport {
    /// True when nothing failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn optimized(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Optimized { input, output } => Some((input.as_path(), output.as_path())),
            _ => None,
        })
    }

    fn fail(&mut self, path: &Path, error: FailureKind) {
        error!(path = %path.display(), "{error}");
        self.failures.push(Failure {
            path: path.to_path_buf(),
            error,
        });
    }
}

/// Process a file or directory.
///
/// A single-file target whose decode fails with a format error is handed to
/// `fallback`. Files reached through a directory are never handed to the
/// fallback; their failures are recorded and traversal continues.
pub fn process_target(target: &Path, opts: &OptimizeOptions, fallback: &Fallback) -> BatchReport {
    let mut report = BatchReport::default();
    match fs::metadata(target) {
        Ok(meta) if meta.is_dir() => process_dir(target, opts, &mut report),
        Ok(meta) if meta.is_file() => process_file(target, opts, Some(fallback), &mut report),
        Ok(_) => report.fail(target, FailureKind::NotFileOrDir),
        Err(e) => report.fail(target, FailureKind::NotFound(e)),
    }
    report
}

fn process_dir(dir: &Path, opts: &OptimizeOptions, report: &mut BatchReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => return report.fail(dir, FailureKind::ReadDir(e)),
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => report.fail(dir, FailureKind::ReadDir(e)),
        }
    }
    paths.sort();

    for path in paths {
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => process_dir(&path, opts, report),
            Ok(meta) if meta.is_file() => process_file(&path, opts, None, report),
            Ok(_) => report.fail(&path, FailureKind::NotFileOrDir),
            Err(e) => report.fail(&path, FailureKind::NotFound(e)),
        }
    }
}

fn process_file(
    path: &Path,
    opts: &OptimizeOptions,
    fallback: Option<&Fallback>,
    report: &mut BatchReport,
) {
    if !has_png_extension(path) {
        info!(path = %path.display(), "skip (not png)");
        report.outcomes.push(Outcome::Skipped {
            input: path.to_path_buf(),
        });
        return;
    }

    match optimize_file(path, opts) {
        Ok(output) => report.outcomes.push(Outcome::Optimized {
            input: path.to_path_buf(),
            output,
        }),
        Err(e) if e.is_format_error() && fallback.is_some_and(|f| f.run(path, opts.color_limit)) => {
            info!(path = %path.display(), error = %e, "handled by fallback helper");
            report.outcomes.push(Outcome::FellBack {
                input: path.to_path_buf(),
            });
        }
        Err(e) => report.fail(path, FailureKind::Optimize(e)),
    }
}

fn has_png_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}
