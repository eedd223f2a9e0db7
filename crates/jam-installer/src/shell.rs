use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use jam_core::{JamError, Result};
use log::debug;

use crate::fs_utils::write_file_replacing;
use crate::ApplicationsLayout;

/// Shell line that sources `target` when it exists. The guard keeps
/// append-only include files valid after a package directory is deleted.
pub fn include_line(target: &Path) -> String {
    let target = target.display();
    format!("[ -f \"{target}\" ] && . \"{target}\"")
}

/// Appends `line` to `file` unless an identical line is already present.
/// Returns whether the file changed.
pub fn ensure_include_line(file: &Path, line: &str) -> Result<bool> {
    let existing = match fs::read_to_string(file) {
        Ok(existing) => existing,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(err) => {
            return Err(JamError::io(
                format!("failed to read {}", file.display()),
                err,
            ))
        }
    };
    let wanted = line.trim();
    if existing.lines().any(|candidate| candidate.trim() == wanted) {
        return Ok(false);
    }

    if let Some(parent) = file.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            JamError::io(format!("failed to create {}", parent.display()), source)
        })?;
    }

    let mut payload = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        payload.push('\n');
    }
    payload.push_str(wanted);
    payload.push('\n');

    let append_failed =
        |source: io::Error| JamError::io(format!("failed to append to {}", file.display()), source);
    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .map_err(append_failed)?;
    handle.write_all(payload.as_bytes()).map_err(append_failed)?;
    Ok(true)
}

/// Wires an installed cli package into the include chain: the package's
/// contributions file into the aggregator, and the aggregator into the root
/// alias file.
pub fn register_shell_contributions(
    layout: &ApplicationsLayout,
    contributions_file: &Path,
) -> Result<()> {
    let aggregator = layout.contributions_aggregator_path();
    if ensure_include_line(&aggregator, &include_line(contributions_file))? {
        debug!(
            "registered {} in {}",
            contributions_file.display(),
            aggregator.display()
        );
    }
    if ensure_include_line(layout.shell_alias_path(), &include_line(&aggregator))? {
        debug!(
            "registered {} in {}",
            aggregator.display(),
            layout.shell_alias_path().display()
        );
    }
    Ok(())
}

/// Drops every include line that sources a file under `package_dir`.
/// Returns how many lines were removed.
pub fn drop_include_lines_under(file: &Path, package_dir: &Path) -> Result<usize> {
    let existing = match fs::read_to_string(file) {
        Ok(existing) => existing,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => {
            return Err(JamError::io(
                format!("failed to read {}", file.display()),
                err,
            ))
        }
    };

    let marker = format!("\"{}/", package_dir.display());
    let mut dropped = 0_usize;
    let mut kept = String::with_capacity(existing.len());
    for line in existing.lines() {
        if line.contains(&marker) {
            dropped += 1;
            continue;
        }
        kept.push_str(line);
        kept.push('\n');
    }
    if dropped > 0 {
        write_file_replacing(file, kept.as_bytes())?;
    }
    Ok(dropped)
}

/// Stops sourcing the shell contributions of a package that was removed or
/// superseded.
pub fn unregister_shell_contributions(
    layout: &ApplicationsLayout,
    package_dir: &Path,
) -> Result<()> {
    let aggregator = layout.contributions_aggregator_path();
    let dropped = drop_include_lines_under(&aggregator, package_dir)?;
    if dropped > 0 {
        debug!(
            "dropped {dropped} include line(s) for {} from {}",
            package_dir.display(),
            aggregator.display()
        );
    }
    Ok(())
}
