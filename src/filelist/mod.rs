//! Recursive `.F` filelist expansion, per `SPEC_FULL.md` §6/§11.
//!
//! A source argument ending in `.F` is a newline-delimited list of further source
//! paths and `-I`/`-D` entries rather than an RTL source file itself; expansion is
//! recursive (a filelist may reference another filelist) with cycle detection.
//! Grounded in `original_source/main.py`'s filelist handling — source-file discovery
//! itself remains an external concern, but filelist expansion is a thin, deterministic
//! text operation appropriate for the CLI wrapper.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The flattened contents of one or more filelists/source arguments.
#[derive(Debug, Default, Clone)]
pub struct Expanded {
    pub sources: Vec<PathBuf>,
    pub includes: Vec<String>,
    pub defines: Vec<String>,
}

/// Expands `args` (a mix of plain source paths and `.F` filelist paths) into a flat
/// `Expanded` set, recursing into nested filelists and rejecting cycles.
pub fn expand(args: &[String]) -> Result<Expanded> {
    let mut out = Expanded::default();
    let mut stack = Vec::new();
    for arg in args {
        if arg.ends_with(".F") {
            expand_filelist(Path::new(arg), &mut stack, &mut out)?;
        } else {
            out.sources.push(PathBuf::from(arg));
        }
    }
    Ok(out)
}

fn expand_filelist(path: &Path, stack: &mut Vec<PathBuf>, out: &mut Expanded) -> Result<()> {
    let canonical = path.to_path_buf();
    if stack.contains(&canonical) {
        return Err(Error::FilelistCycle(canonical));
    }
    let text = std::fs::read_to_string(path).map_err(|_| Error::SourceNotFound(canonical.clone()))?;
    stack.push(canonical);

    for raw_line in text.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("-I") {
            out.includes.push(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("-D") {
            out.defines.push(rest.trim().to_string());
        } else if line.ends_with(".F") {
            expand_filelist(Path::new(line), stack, out)?;
        } else {
            out.sources.push(PathBuf::from(line));
        }
    }

    stack.pop();
    Ok(())
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}
