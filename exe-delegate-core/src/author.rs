//! Authoring operations: produce, inspect and refresh delegate binaries.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::codec::{self, write_delegate};
use crate::{CommandRecord, DelegateError, HostFormat, Result};

/// Appends `suffix` to `path` unless its file name already ends with it,
/// compared case-insensitively.
pub fn with_exe_suffix(path: &Path, suffix: &str) -> PathBuf {
    let name = path.as_os_str().to_string_lossy().to_lowercase();
    if suffix.is_empty() || name.ends_with(&suffix.to_lowercase()) {
        return path.to_path_buf();
    }
    let mut with_suffix = OsString::from(path.as_os_str());
    with_suffix.push(suffix);
    PathBuf::from(with_suffix)
}

fn log_host(host: &Path) {
    if !log::log_enabled!(log::Level::Info) {
        return;
    }
    match HostFormat::of_file(host) {
        Some(format) => log::info!("host binary {}: {format}", host.display()),
        None => log::warn!("host binary {} is not a recognized executable", host.display()),
    }
}

/// Writes a delegate for `command` to `output`, using `host` as the
/// executable part. Returns the path actually written, which carries the
/// platform executable suffix.
pub fn generate(host: &Path, output: &Path, command: Vec<String>) -> Result<PathBuf> {
    let record = CommandRecord::new(command)?;
    let output = with_exe_suffix(output, std::env::consts::EXE_SUFFIX);
    log::debug!("generating {} for {:?}", output.display(), record.command);

    log_host(host);
    codec::append(host, &record, &output)?;
    Ok(output)
}

/// Reads the record embedded in an existing delegate.
pub fn inspect(path: &Path) -> Result<CommandRecord> {
    codec::scan(path)
}

/// Rebuilds the delegate at `target` on top of `host`, keeping its record.
///
/// The new file is staged next to `target` and renamed over it, so the
/// target is replaced atomically. This also works when `target` is the
/// running executable.
pub fn update(host: &Path, target: &Path) -> Result<CommandRecord> {
    let record = codec::scan(target)?;
    log::debug!("refreshing {} with {:?}", target.display(), record.command);
    log_host(host);

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(DelegateError::io(format!(
        "failed to create staging file in {}",
        dir.display()
    )))?;
    write_delegate(host, &record, staged.as_file_mut())?;

    staged.persist(target).map_err(|err| DelegateError::Io {
        context: format!("failed to replace {}", target.display()),
        source: err.error,
    })?;
    Ok(record)
}
