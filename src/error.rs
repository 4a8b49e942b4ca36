//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use std::path::PathBuf;

use crate::util::anyerror::Fault;

/// Fatal errors: anything that reaches here aborts the run with a non-zero exit code.
///
/// Non-fatal, path-local conditions (unsupported construct, infeasible path, solver
/// timeout, assertion violation) are never represented here; they are recorded on
/// [`crate::diagnostics::Diagnostics`] instead, per the propagation policy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("source file not found: {0:?}")]
    SourceNotFound(PathBuf),

    #[error("filelist {0:?} includes itself (directly or indirectly)")]
    FilelistCycle(PathBuf),

    #[error("unknown top module {0:?}")]
    UnknownTopModule(String),

    #[error("failed to load design from {0:?}: {1}")]
    DesignLoadFailed(PathBuf, Fault),

    #[error("failed to initialize SMT solver context: {0}")]
    SolverUnavailable(Fault),

    #[error("no source files given")]
    NoSourceFiles,

    #[error("explore-time budget of {0}s exceeded")]
    ExploreTimeExceeded(u64),

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("failed to read or write cache file {0:?}: {1}")]
    CacheIoFailed(PathBuf, Fault),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, Error>;
