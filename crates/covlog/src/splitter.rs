//! Coverage block splitter.
//!
//! A device flushing gcov counters over serial prints one window per
//! translation unit:
//!
//! ```text
//! Emitting coverage data
//! 00000000: 6164 6367 ...  adcg...
//! 00000010: ...
//! /home/dev/proj/Application/States/CMakeFiles/states.dir/Idle.cpp.gcda
//! ```
//!
//! The window opens on the emission marker and closes on the `.gcda` path
//! line. A `__gcov_init` line inside a window means the dump was cut short,
//! so the window is abandoned.

use crate::result::{CovlogError, CovlogResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Marker opening a dump window
pub const EMIT_MARKER: &str = "Emit";
/// Marker that aborts an open window
pub const INIT_MARKER: &str = "__gcov_init";
/// Suffix of counter file paths, closes a window
pub const COUNTER_SUFFIX: &str = ".gcda";
/// Extension given to staged dumps
pub const STAGED_EXTENSION: &str = "xxd";

/// One closed dump window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageBlock {
    /// Counter file name, e.g. `Idle.cpp.gcda`
    pub key: String,
    /// Hex dump lines, each newline-terminated
    pub dump: String,
}

/// A staged hex dump waiting to be routed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageArtifact {
    /// Counter file name the dump was emitted for
    pub key: String,
    /// Location of `<key>.xxd`
    pub path: PathBuf,
}

impl CoverageArtifact {
    /// Read the staged dump
    pub fn read_dump(&self) -> CovlogResult<String> {
        std::fs::read_to_string(&self.path).map_err(|e| CovlogError::file_io(&self.path, e))
    }
}

/// Splitter state
#[derive(Debug)]
enum SplitState {
    Idle,
    Collecting {
        buffer: String,
    },
}

/// Scan sanitized log text for dump windows
#[must_use]
pub fn split_blocks(text: &str) -> Vec<CoverageBlock> {
    let mut blocks = Vec::new();
    let mut state = SplitState::Idle;

    for (number, line) in text.lines().enumerate() {
        if line.contains(EMIT_MARKER) {
            if let SplitState::Collecting { buffer } = &state {
                if !buffer.is_empty() {
                    debug!(line = number + 1, "emission restarted, dropping open window");
                }
            }
            state = SplitState::Collecting {
                buffer: String::new(),
            };
            continue;
        }

        state = match state {
            SplitState::Idle => SplitState::Idle,
            SplitState::Collecting { .. } if line.contains(INIT_MARKER) => {
                debug!(line = number + 1, "gcov init inside window, dropping it");
                SplitState::Idle
            }
            SplitState::Collecting { buffer } if line.contains(COUNTER_SUFFIX) => {
                match counter_file_name(line) {
                    Some(key) => blocks.push(CoverageBlock { key, dump: buffer }),
                    None => debug!(line = number + 1, "path line without a file name"),
                }
                SplitState::Idle
            }
            SplitState::Collecting { buffer } if line.trim().is_empty() => {
                SplitState::Collecting { buffer }
            }
            SplitState::Collecting { mut buffer } => {
                buffer.push_str(line);
                buffer.push('\n');
                SplitState::Collecting { buffer }
            }
        };
    }

    if let SplitState::Collecting { buffer } = state {
        if !buffer.is_empty() {
            debug!("capture ended inside a window, dropping it");
        }
    }

    blocks
}

/// Base name of the last token on a path line
fn counter_file_name(line: &str) -> Option<String> {
    let token = line.split_whitespace().last()?;
    Path::new(token)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Write each block to `<work_dir>/<key>.xxd`
///
/// A key emitted twice keeps its last dump.
pub fn write_artifacts(blocks: Vec<CoverageBlock>, work_dir: &Path) -> CovlogResult<Vec<CoverageArtifact>> {
    let mut by_key: IndexMap<String, String> = IndexMap::new();
    for block in blocks {
        by_key.insert(block.key, block.dump);
    }

    let mut artifacts = Vec::with_capacity(by_key.len());
    for (key, dump) in by_key {
        let path = work_dir.join(format!("{key}.{STAGED_EXTENSION}"));
        std::fs::write(&path, dump).map_err(|e| CovlogError::file_io(&path, e))?;
        artifacts.push(CoverageArtifact { key, path });
    }

    info!(count = artifacts.len(), dir = %work_dir.display(), "staged coverage dumps");
    Ok(artifacts)
}

/// Split a sanitized capture on disk and stage its dumps
pub fn split_file(sanitized: &Path, work_dir: &Path) -> CovlogResult<Vec<CoverageArtifact>> {
    let text =
        std::fs::read_to_string(sanitized).map_err(|e| CovlogError::file_io(sanitized, e))?;
    write_artifacts(split_blocks(&text), work_dir)
}
